use super::conversion_task::ConversionTask;
use super::error::ConversionError;
use super::format_registry::FormatRegistry;
use super::task_scheduler::{TaskOutcome, TaskScheduler, TaskStatus};
use super::tool_command::{ProcessRunner, ToolRunner};
use crate::config::{Config, ConversionRequest};
use crate::tools::{ScratchWorkspace, collect_sources};
use anyhow::Result;
use console::style;
use log::{info, warn};
use std::path::PathBuf;
use std::sync::Arc;
use std::sync::atomic::AtomicBool;

/// 整批轉檔的結果
#[derive(Debug)]
pub struct BatchReport {
    pub outcomes: Vec<TaskOutcome>,
    /// 不存在而被略過的來源參數
    pub missing_sources: Vec<PathBuf>,
    /// 找到但無法處理的路徑
    pub skipped_sources: Vec<PathBuf>,
    /// 本次使用的暫存工作區（結束時已刪除）
    pub workspace: Option<PathBuf>,
}

impl BatchReport {
    #[must_use]
    pub fn count(&self, status: TaskStatus) -> usize {
        self.outcomes.iter().filter(|o| o.status == status).count()
    }

    pub fn failures(&self) -> impl Iterator<Item = &TaskOutcome> {
        self.outcomes.iter().filter(|o| o.failure.is_some())
    }
}

/// 晶片音樂批次轉檔元件
pub struct ChiptuneConverter {
    config: Config,
    request: ConversionRequest,
    shutdown_signal: Arc<AtomicBool>,
}

impl ChiptuneConverter {
    pub const fn new(
        config: Config,
        request: ConversionRequest,
        shutdown_signal: Arc<AtomicBool>,
    ) -> Self {
        Self {
            config,
            request,
            shutdown_signal,
        }
    }

    /// 以實際的外部程式轉檔
    pub fn run(&self, sources: &[PathBuf]) -> Result<BatchReport> {
        let runner = ProcessRunner::new(self.request.verbose);
        self.run_with_runner(sources, &runner)
    }

    pub fn run_with_runner(
        &self,
        sources: &[PathBuf],
        runner: &dyn ToolRunner,
    ) -> Result<BatchReport> {
        let registry = FormatRegistry::new(
            self.config.format_table.clone(),
            self.config.settings.tools.clone(),
        );

        let collected = collect_sources(sources, self.request.recursive, &registry.extensions())?;
        for missing in &collected.missing {
            warn!("{}", ConversionError::SourceNotFound(missing.clone()));
        }

        if collected.files.is_empty() {
            info!("沒有可轉檔的來源檔案");
            return Ok(BatchReport {
                outcomes: Vec::new(),
                missing_sources: collected.missing,
                skipped_sources: collected.skipped,
                workspace: None,
            });
        }

        info!(
            "找到 {} 個來源檔案，輸出格式: {}",
            collected.files.len(),
            self.request
                .formats
                .iter()
                .map(ToString::to_string)
                .collect::<Vec<_>>()
                .join(", ")
        );

        let scratch_parent = self
            .config
            .settings
            .scratch_directory
            .clone()
            .unwrap_or_else(std::env::temp_dir);
        let workspace = ScratchWorkspace::acquire(&scratch_parent)?;
        let workspace_path = workspace.path().to_path_buf();

        let task = ConversionTask::new(&self.request, &registry, runner);
        let outcomes = TaskScheduler::new(self.request.parallel, Arc::clone(&self.shutdown_signal))
            .with_progress(!self.request.verbose)
            .run(&collected.files, &task, workspace)?;

        Ok(BatchReport {
            outcomes,
            missing_sources: collected.missing,
            skipped_sources: collected.skipped,
            workspace: Some(workspace_path),
        })
    }

    pub fn print_summary(&self, report: &BatchReport) {
        let completed = report.count(TaskStatus::Completed);
        let up_to_date = report.count(TaskStatus::UpToDate);
        let failed = report.count(TaskStatus::Failed);
        let cancelled = report.count(TaskStatus::Cancelled);

        println!();
        println!("{}", style("=== 轉檔任務摘要 ===").cyan().bold());
        println!("  總計: {} 個檔案", report.outcomes.len());
        println!("  成功: {} 個", style(completed).green());
        println!("  已是最新: {} 個", style(up_to_date).dim());
        if failed > 0 {
            println!("  失敗: {} 個", style(failed).red());
        }
        if cancelled > 0 {
            println!("  已取消: {} 個", style(cancelled).yellow());
        }
        if !report.missing_sources.is_empty() {
            println!(
                "  找不到的來源: {} 個",
                style(report.missing_sources.len()).yellow()
            );
        }
        if !report.skipped_sources.is_empty() {
            println!(
                "  無法處理的路徑: {} 個",
                style(report.skipped_sources.len()).yellow()
            );
        }

        let failures: Vec<_> = report.failures().collect();
        if !failures.is_empty() {
            println!();
            println!("{}", style("失敗的檔案：").red().bold());
            for outcome in failures {
                if let Some(failure) = &outcome.failure {
                    println!("  {} {}", style("✗").red(), outcome.source.display());
                    println!("      {failure}");
                }
            }
        }

        info!(
            "轉檔任務完成 - 成功: {completed}, 已是最新: {up_to_date}, 失敗: {failed}, 取消: {cancelled}"
        );
    }
}
