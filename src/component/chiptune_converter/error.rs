use crate::config::TargetFormat;
use std::fmt;
use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// 單一檔案轉檔流程中的階段
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Prepare,
    Render,
    Encode(TargetFormat),
    Publish,
    Cleanup,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Prepare => f.write_str("準備"),
            Self::Render => f.write_str("渲染"),
            Self::Encode(format) => write!(f, "編碼 {format}"),
            Self::Publish => f.write_str("輸出"),
            Self::Cleanup => f.write_str("清理"),
        }
    }
}

#[derive(Debug, Error)]
pub enum ConversionError {
    #[error("來源不存在: {}", .0.display())]
    SourceNotFound(PathBuf),

    #[error("未登錄的副檔名: .{extension}")]
    UnknownFormat { extension: String },

    #[error("{program} 執行失敗: {detail}")]
    ExternalToolFailure {
        stage: Stage,
        program: String,
        detail: String,
    },

    #[error("預期的輸出檔案未產生: {}", .path.display())]
    MissingOutput { stage: Stage, path: PathBuf },

    #[error("無法建立輸出資料夾 {}: {source}", .path.display())]
    DestinationUnwritable {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("檔案操作失敗 {}: {source}", .path.display())]
    Io {
        stage: Stage,
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

impl ConversionError {
    /// 錯誤發生的階段
    #[must_use]
    pub const fn stage(&self) -> Stage {
        match self {
            Self::SourceNotFound(_)
            | Self::UnknownFormat { .. }
            | Self::DestinationUnwritable { .. } => Stage::Prepare,
            Self::ExternalToolFailure { stage, .. }
            | Self::MissingOutput { stage, .. }
            | Self::Io { stage, .. } => *stage,
        }
    }
}

/// 任務層級的失敗，保留階段與原始錯誤供批次結束時回報
#[derive(Debug, Error)]
#[error("[{stage}] {error}")]
pub struct TaskFailure {
    pub stage: Stage,
    #[source]
    pub error: ConversionError,
}

impl From<ConversionError> for TaskFailure {
    fn from(error: ConversionError) -> Self {
        Self {
            stage: error.stage(),
            error,
        }
    }
}
