use std::path::Path;
use std::{fs, io};

pub fn ensure_directory_exists(path: &Path) -> io::Result<()> {
    if !path.is_dir() {
        fs::create_dir_all(path)?;
    }
    Ok(())
}
