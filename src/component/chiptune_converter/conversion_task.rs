//! 單一來源檔案的轉檔流程
//!
//! 渲染（必要時）→ 各格式編碼 → 複製到輸出資料夾 → 清理暫存

use super::error::{ConversionError, Stage, TaskFailure};
use super::format_registry::FormatRegistry;
use super::rebuild_policy::plan_rebuild;
use super::task_scheduler::{TaskOutcome, TaskStatus};
use super::tool_command::ToolRunner;
use crate::config::{ConversionRequest, TargetFormat};
use crate::tools::{ScratchWorkspace, SourceFile, ensure_directory_exists};
use log::{debug, info};
use std::fs;
use std::path::{self, Path, PathBuf};

pub struct ConversionTask<'a> {
    request: &'a ConversionRequest,
    registry: &'a FormatRegistry,
    runner: &'a dyn ToolRunner,
}

impl<'a> ConversionTask<'a> {
    #[must_use]
    pub const fn new(
        request: &'a ConversionRequest,
        registry: &'a FormatRegistry,
        runner: &'a dyn ToolRunner,
    ) -> Self {
        Self {
            request,
            registry,
            runner,
        }
    }

    /// 執行轉檔，失敗不會 panic，而是記錄在回傳的結果中
    #[must_use]
    pub fn run(&self, source: &SourceFile, workspace: &ScratchWorkspace) -> TaskOutcome {
        let mut published = Vec::new();
        let result = self.execute(source, workspace, &mut published);

        match result {
            Ok(status) => TaskOutcome {
                source: source.path.clone(),
                status,
                published,
                failure: None,
            },
            Err(failure) => TaskOutcome {
                source: source.path.clone(),
                status: TaskStatus::Failed,
                published,
                failure: Some(failure),
            },
        }
    }

    fn execute(
        &self,
        source: &SourceFile,
        workspace: &ScratchWorkspace,
        published: &mut Vec<PathBuf>,
    ) -> Result<TaskStatus, TaskFailure> {
        // 外部工具在任務暫存資料夾中執行，傳給它們的路徑必須是絕對路徑
        let requested = self.request.destination_for(source.parent_directory());
        let destination = path::absolute(requested).map_err(|e| {
            ConversionError::DestinationUnwritable {
                path: requested.to_path_buf(),
                source: e,
            }
        })?;
        ensure_directory_exists(&destination).map_err(|e| {
            ConversionError::DestinationUnwritable {
                path: destination.clone(),
                source: e,
            }
        })?;

        let family = self.registry.family_for(&source.extension)?;

        let plan = plan_rebuild(
            &source.base_name,
            &self.request.formats,
            &destination,
            self.request.overwrite,
        )
        .map_err(|e| io_error(Stage::Prepare, &destination, e))?;

        if plan.is_up_to_date() {
            debug!("輸出皆已存在，略過: {}", source.path.display());
            return Ok(TaskStatus::UpToDate);
        }

        let task_dir = workspace
            .task_dir(&source.base_name)
            .map_err(|e| io_error(Stage::Prepare, workspace.path(), e))?;
        let wav_name = format!("{}.wav", source.base_name);
        let local_wav = task_dir.join(&wav_name);

        if plan.render {
            let invocation = self
                .registry
                .render_invocation(family, &source.path, &local_wav);
            self.runner.run(&invocation, task_dir.path())?;

            if !local_wav.is_file() {
                return Err(ConversionError::MissingOutput {
                    stage: Stage::Render,
                    path: local_wav,
                }
                .into());
            }
        }

        // 優先使用剛渲染的 WAV，否則沿用輸出資料夾中既有的 WAV
        let wav_input = if local_wav.is_file() {
            local_wav.clone()
        } else if let Some(existing) = &plan.existing_wav {
            debug!("沿用既有 WAV: {}", existing.display());
            existing.clone()
        } else {
            return Err(ConversionError::MissingOutput {
                stage: Stage::Render,
                path: local_wav,
            }
            .into());
        };

        if plan.needs(TargetFormat::Wav) {
            if wav_input == local_wav {
                let target = destination.join(&wav_name);
                publish(&local_wav, &target)?;
                published.push(target);
            } else {
                debug!("WAV 已在輸出資料夾中: {}", wav_input.display());
            }
        }

        for &format in &self.request.formats {
            if !plan.needs(format) {
                continue;
            }
            let file_name = format!("{}.{}", source.base_name, format.extension());
            let local_output = task_dir.join(&file_name);
            let Some(invocation) = self.registry.encode_invocation(
                family,
                format,
                self.request.quality,
                &wav_input,
                &local_output,
            ) else {
                continue;
            };

            self.runner.run(&invocation, task_dir.path())?;
            if !local_output.is_file() {
                return Err(ConversionError::MissingOutput {
                    stage: Stage::Encode(format),
                    path: local_output,
                }
                .into());
            }

            let target = destination.join(&file_name);
            publish(&local_output, &target)?;
            fs::remove_file(&local_output)
                .map_err(|e| io_error(Stage::Cleanup, &local_output, e))?;
            published.push(target);
        }

        if local_wav.exists() {
            fs::remove_file(&local_wav).map_err(|e| io_error(Stage::Cleanup, &local_wav, e))?;
        }

        info!(
            "轉檔完成: {} ({} 個輸出)",
            source.path.display(),
            published.len()
        );
        Ok(TaskStatus::Completed)
    }
}

fn publish(local: &Path, target: &Path) -> Result<(), ConversionError> {
    fs::copy(local, target).map_err(|e| io_error(Stage::Publish, target, e))?;
    info!("已輸出: {}", target.display());
    Ok(())
}

fn io_error(stage: Stage, path: &Path, source: std::io::Error) -> ConversionError {
    ConversionError::Io {
        stage,
        path: path.to_path_buf(),
        source,
    }
}
