use regex::Regex;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

/// 找出資料夾中符合 `<base_name>*.<extension>` 的檔案
///
/// 渲染器或編碼器可能在檔名後附加字尾，因此以前綴比對。
/// 資料夾不存在時回傳空清單。結果依路徑排序
pub fn find_existing_outputs(
    directory: &Path,
    base_name: &str,
    extension: &str,
) -> io::Result<Vec<PathBuf>> {
    if !directory.is_dir() {
        return Ok(Vec::new());
    }

    let pattern = output_pattern(base_name, extension);
    let mut matches = Vec::new();

    for entry in fs::read_dir(directory)? {
        let entry = entry?;
        if !entry.path().is_file() {
            continue;
        }
        let file_name = entry.file_name();
        if file_name.to_str().is_some_and(|name| pattern.is_match(name)) {
            matches.push(entry.path());
        }
    }

    matches.sort();
    Ok(matches)
}

fn output_pattern(base_name: &str, extension: &str) -> Regex {
    let source = format!(
        r"^{}.*\.{}$",
        regex::escape(base_name),
        regex::escape(extension)
    );
    Regex::new(&source).expect("Invalid regex")
}
