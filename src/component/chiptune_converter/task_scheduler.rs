use super::conversion_task::ConversionTask;
use super::error::TaskFailure;
use crate::tools::{ScratchWorkspace, SourceFile};
use anyhow::{Context, Result};
use console::style;
use indicatif::{ProgressBar, ProgressStyle};
use log::{error, info, warn};
use rayon::prelude::*;
use std::path::PathBuf;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TaskStatus {
    Completed,
    /// 所有要求的輸出都已存在
    UpToDate,
    Failed,
    /// 收到中斷信號時尚未開始
    Cancelled,
}

/// 單一來源檔案的執行結果
#[derive(Debug)]
pub struct TaskOutcome {
    pub source: PathBuf,
    pub status: TaskStatus,
    /// 已複製到輸出資料夾的檔案（失敗時也保留已完成的部分）
    pub published: Vec<PathBuf>,
    pub failure: Option<TaskFailure>,
}

impl TaskOutcome {
    fn cancelled(source: &SourceFile) -> Self {
        Self {
            source: source.path.clone(),
            status: TaskStatus::Cancelled,
            published: Vec::new(),
            failure: None,
        }
    }
}

/// 固定數量 worker 的排程器
///
/// 每個來源檔案一個任務，任務失敗不會取消其他任務，
/// 全部結束後才刪除暫存工作區
pub struct TaskScheduler {
    parallel: usize,
    shutdown_signal: Arc<AtomicBool>,
    show_progress: bool,
}

impl TaskScheduler {
    #[must_use]
    pub fn new(parallel: usize, shutdown_signal: Arc<AtomicBool>) -> Self {
        Self {
            parallel: parallel.max(1),
            shutdown_signal,
            show_progress: true,
        }
    }

    /// 子程序輸出直接顯示時關閉進度列，避免畫面混雜
    #[must_use]
    pub const fn with_progress(mut self, show_progress: bool) -> Self {
        self.show_progress = show_progress;
        self
    }

    /// 執行所有任務，回傳結果的順序與 `sources` 相同
    pub fn run(
        &self,
        sources: &[SourceFile],
        task: &ConversionTask<'_>,
        workspace: ScratchWorkspace,
    ) -> Result<Vec<TaskOutcome>> {
        info!(
            "開始轉檔任務，共 {} 個檔案，{} 個 worker",
            sources.len(),
            self.parallel
        );

        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(self.parallel)
            .thread_name(|index| format!("convert-worker-{index}"))
            .build()
            .context("無法建立 worker 執行緒池")?;

        let progress_bar = self.progress_bar(sources.len());

        let outcomes: Vec<TaskOutcome> = pool.install(|| {
            sources
                .par_iter()
                .with_max_len(1)
                .map(|source| {
                    if self.shutdown_signal.load(Ordering::SeqCst) {
                        return TaskOutcome::cancelled(source);
                    }

                    progress_bar.set_message(source.base_name.clone());
                    let outcome = task.run(source, &workspace);

                    if let Some(failure) = &outcome.failure {
                        error!("轉檔失敗 {}: {failure}", source.path.display());
                        progress_bar.println(format!(
                            "{} {} {}",
                            style("失敗").red().bold(),
                            source.path.display(),
                            failure
                        ));
                    }

                    progress_bar.inc(1);
                    outcome
                })
                .collect()
        });

        progress_bar.finish_and_clear();

        let workspace_path = workspace.path().to_path_buf();
        if let Err(e) = workspace.release() {
            warn!("{e:#}");
        } else {
            info!("已清除暫存工作區: {}", workspace_path.display());
        }

        info!("所有轉檔任務已結束");
        Ok(outcomes)
    }

    fn progress_bar(&self, len: usize) -> ProgressBar {
        if !self.show_progress {
            return ProgressBar::hidden();
        }

        let progress_bar = ProgressBar::new(len as u64);
        if let Ok(progress_style) = ProgressStyle::default_bar()
            .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} {msg}")
        {
            progress_bar.set_style(progress_style.progress_chars("#>-"));
        }
        progress_bar
    }
}
