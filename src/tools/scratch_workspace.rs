//! 批次暫存工作區
//!
//! 整批轉檔共用一個以時間戳命名的暫存資料夾，
//! 每個任務在其中再取得自己的子資料夾，避免同名檔案互相覆蓋

use anyhow::{Context, Result};
use chrono::Local;
use log::{debug, warn};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use uuid::Uuid;

const WORKSPACE_PREFIX: &str = "chiptune-convert";

#[derive(Debug)]
pub struct ScratchWorkspace {
    root: PathBuf,
    released: bool,
}

impl ScratchWorkspace {
    /// 在 `parent` 下建立本次批次專用的資料夾
    pub fn acquire(parent: &Path) -> Result<Self> {
        fs::create_dir_all(parent)
            .with_context(|| format!("無法建立暫存上層資料夾: {}", parent.display()))?;

        let name = format!(
            "{WORKSPACE_PREFIX}-{}-{}",
            Local::now().format("%Y%m%d-%H%M%S%.3f"),
            std::process::id()
        );
        let root = parent.join(name);

        // 使用 create_dir 而非 create_dir_all，名稱衝突時直接報錯
        fs::create_dir(&root)
            .with_context(|| format!("無法建立暫存工作區: {}", root.display()))?;
        debug!("建立暫存工作區: {}", root.display());

        Ok(Self {
            root,
            released: false,
        })
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.root
    }

    /// 為單一任務建立私有子資料夾，離開作用域時自動刪除
    pub fn task_dir(&self, base_name: &str) -> io::Result<TaskDir> {
        let path = self
            .root
            .join(format!("{base_name}-{}", Uuid::new_v4().simple()));
        fs::create_dir(&path)?;
        Ok(TaskDir { path })
    }

    /// 遞迴刪除整個工作區
    pub fn release(mut self) -> Result<()> {
        self.released = true;
        fs::remove_dir_all(&self.root)
            .with_context(|| format!("無法刪除暫存工作區: {}", self.root.display()))?;
        debug!("已刪除暫存工作區: {}", self.root.display());
        Ok(())
    }
}

impl Drop for ScratchWorkspace {
    fn drop(&mut self) {
        if !self.released
            && self.root.exists()
            && let Err(e) = fs::remove_dir_all(&self.root)
        {
            warn!("無法刪除暫存工作區 {}: {e}", self.root.display());
        }
    }
}

/// 任務專用的暫存子資料夾
#[derive(Debug)]
pub struct TaskDir {
    path: PathBuf,
}

impl TaskDir {
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    #[must_use]
    pub fn join(&self, file_name: &str) -> PathBuf {
        self.path.join(file_name)
    }
}

impl Drop for TaskDir {
    fn drop(&mut self) {
        match fs::remove_dir_all(&self.path) {
            Ok(()) => {}
            Err(e) if e.kind() == io::ErrorKind::NotFound => {}
            Err(e) => warn!("無法刪除任務暫存資料夾 {}: {e}", self.path.display()),
        }
    }
}
