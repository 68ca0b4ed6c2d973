//! 晶片音樂批次轉檔元件
//!
//! 使用外部播放器將 SID、SC68/SNDH、SAP 渲染為 WAV，
//! 再以外部編碼器轉為 OGG 或 FLAC

mod conversion_task;
mod error;
mod format_registry;
mod main;
mod rebuild_policy;
mod task_scheduler;
mod tool_command;

pub use conversion_task::ConversionTask;
pub use error::{ConversionError, Stage, TaskFailure};
pub use format_registry::{Arg, FormatRegistry, Recipe, Tool, encode_recipe, render_recipe};
pub use main::{BatchReport, ChiptuneConverter};
pub use rebuild_policy::{RebuildDecision, RebuildPlan, plan_rebuild};
pub use task_scheduler::{TaskOutcome, TaskScheduler, TaskStatus};
pub use tool_command::{ProcessRunner, ToolInvocation, ToolRunner};
