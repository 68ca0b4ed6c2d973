use super::error::{ConversionError, Stage};
use log::debug;
use std::ffi::OsString;
use std::fs::File;
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};

/// 保留的 stderr 行數，附加在失敗訊息中
const STDERR_TAIL_LINES: usize = 5;

/// 一次外部工具呼叫
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ToolInvocation {
    pub stage: Stage,
    pub program: String,
    pub args: Vec<OsString>,
    pub input: PathBuf,
    pub output: PathBuf,
    /// 為 true 時工具的標準輸出即為音訊資料，需寫入 `output`
    pub capture_stdout: bool,
}

impl ToolInvocation {
    #[must_use]
    pub fn build_command(&self, working_dir: &Path) -> Command {
        let mut cmd = Command::new(&self.program);
        cmd.args(&self.args);
        cmd.current_dir(working_dir);
        cmd.stdin(Stdio::null());
        cmd
    }

    /// 記錄用的命令列字串
    #[must_use]
    pub fn command_line(&self) -> String {
        let mut line = self.program.clone();
        for arg in &self.args {
            line.push(' ');
            line.push_str(&arg.to_string_lossy());
        }
        if self.capture_stdout {
            line.push_str(" > ");
            line.push_str(&self.output.to_string_lossy());
        }
        line
    }
}

/// 執行外部工具的介面
///
/// 呼叫是同步的：回傳時工具已結束
pub trait ToolRunner: Send + Sync {
    fn run(&self, invocation: &ToolInvocation, working_dir: &Path)
    -> Result<(), ConversionError>;
}

/// 以子程序執行外部工具
#[derive(Debug, Clone, Copy, Default)]
pub struct ProcessRunner {
    verbose: bool,
}

impl ProcessRunner {
    /// `verbose` 時子程序輸出直接顯示在終端機
    #[must_use]
    pub const fn new(verbose: bool) -> Self {
        Self { verbose }
    }

    fn failure(invocation: &ToolInvocation, detail: String) -> ConversionError {
        ConversionError::ExternalToolFailure {
            stage: invocation.stage,
            program: invocation.program.clone(),
            detail,
        }
    }
}

impl ToolRunner for ProcessRunner {
    fn run(
        &self,
        invocation: &ToolInvocation,
        working_dir: &Path,
    ) -> Result<(), ConversionError> {
        let mut command = invocation.build_command(working_dir);

        if invocation.capture_stdout {
            let file = File::create(&invocation.output).map_err(|source| ConversionError::Io {
                stage: invocation.stage,
                path: invocation.output.clone(),
                source,
            })?;
            command.stdout(Stdio::from(file));
        } else if self.verbose {
            command.stdout(Stdio::inherit());
        } else {
            command.stdout(Stdio::null());
        }

        if self.verbose {
            command.stderr(Stdio::inherit());
        } else {
            command.stderr(Stdio::piped());
        }

        debug!("執行 [{}]: {}", invocation.stage, invocation.command_line());

        let output = command
            .output()
            .map_err(|e| Self::failure(invocation, format!("無法啟動: {e}")))?;

        if output.status.success() {
            return Ok(());
        }

        let stderr = String::from_utf8_lossy(&output.stderr);
        let lines: Vec<&str> = stderr.lines().filter(|l| !l.trim().is_empty()).collect();
        let tail = lines[lines.len().saturating_sub(STDERR_TAIL_LINES)..].join("\n");
        let detail = if tail.is_empty() {
            format!("結束狀態 {}", output.status)
        } else {
            format!("結束狀態 {}: {tail}", output.status)
        };

        Err(Self::failure(invocation, detail))
    }
}
