//! 來源檔案收集
//!
//! 將命令列給的檔案與資料夾展開為去重、排序過的可轉檔清單

use anyhow::{Context, Result};
use log::{debug, warn};
use std::collections::{BTreeSet, HashSet};
use std::fs;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

/// 單一待轉檔的來源檔案
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct SourceFile {
    /// 絕對路徑
    pub path: PathBuf,
    /// 不含副檔名的檔名，所有衍生檔案都以此命名
    pub base_name: String,
    /// 不含前導點的副檔名
    pub extension: String,
}

impl SourceFile {
    #[must_use]
    pub fn from_path(path: PathBuf) -> Option<Self> {
        let base_name = path.file_stem()?.to_str()?.to_string();
        let extension = path.extension()?.to_str()?.to_string();
        Some(Self {
            path,
            base_name,
            extension,
        })
    }

    #[must_use]
    pub fn parent_directory(&self) -> &Path {
        self.path.parent().unwrap_or(Path::new("."))
    }
}

/// 收集結果
#[derive(Debug, Default)]
pub struct CollectedSources {
    pub files: Vec<SourceFile>,
    /// 不存在而被略過的來源參數
    pub missing: Vec<PathBuf>,
    /// 找到但無法處理的路徑（檔名非 UTF-8、無法讀取的資料夾）
    pub skipped: Vec<PathBuf>,
}

/// 收集來源檔案
///
/// * 不存在的路徑：警告並略過
/// * 檔案：副檔名符合才收錄
/// * 資料夾：非遞迴只看直接子項目，遞迴則走訪整棵樹
///
/// 副檔名比對區分大小寫，`extensions` 內含前導點（例如 `.sid`）。
/// 結果以完整路徑字串排序
pub fn collect_sources(
    sources: &[PathBuf],
    recursive: bool,
    extensions: &HashSet<String>,
) -> Result<CollectedSources> {
    let mut files = BTreeSet::new();
    let mut missing = Vec::new();
    let mut skipped = Vec::new();

    for source in sources {
        if !source.exists() {
            warn!("來源不存在，略過: {}", source.display());
            missing.push(source.clone());
            continue;
        }

        let candidates = if source.is_dir() {
            walk_directory(source, recursive, &mut skipped)
        } else {
            vec![source.clone()]
        };

        for path in candidates {
            if !has_registered_extension(&path, extensions) {
                debug!("不支援的副檔名，略過: {}", path.display());
                continue;
            }
            let canonical = fs::canonicalize(&path)
                .with_context(|| format!("無法取得絕對路徑: {}", path.display()))?;
            match SourceFile::from_path(canonical) {
                Some(file) => {
                    files.insert(file);
                }
                None => {
                    warn!("檔名不是有效的 UTF-8，略過: {}", path.display());
                    skipped.push(path);
                }
            }
        }
    }

    // PathBuf 的 Ord 逐段比較，這裡需要整串路徑的順序
    let mut files: Vec<SourceFile> = files.into_iter().collect();
    files.sort_by(|a, b| a.path.as_os_str().cmp(b.path.as_os_str()));

    Ok(CollectedSources {
        files,
        missing,
        skipped,
    })
}

/// 列出資料夾中的檔案，無法讀取的項目記錄到 `skipped`
fn walk_directory(directory: &Path, recursive: bool, skipped: &mut Vec<PathBuf>) -> Vec<PathBuf> {
    let max_depth = if recursive { usize::MAX } else { 1 };
    let mut paths = Vec::new();

    for entry in WalkDir::new(directory)
        .min_depth(1)
        .max_depth(max_depth)
        .follow_links(false)
    {
        match entry {
            Ok(entry) if entry.path().is_file() => paths.push(entry.into_path()),
            Ok(_) => {}
            Err(e) => {
                let path = e.path().unwrap_or(directory).to_path_buf();
                warn!("無法讀取 {}，略過: {e}", path.display());
                skipped.push(path);
            }
        }
    }

    paths
}

fn has_registered_extension(path: &Path, extensions: &HashSet<String>) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| extensions.contains(&format!(".{ext}")))
}
