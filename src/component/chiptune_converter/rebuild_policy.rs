//! 增量重建判斷
//!
//! 依輸出資料夾現有的檔案決定哪些階段需要執行

use crate::config::TargetFormat;
use crate::tools::find_existing_outputs;
use std::collections::BTreeSet;
use std::io;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RebuildDecision {
    /// 輸出已存在且未要求覆寫
    Skip,
    Rebuild,
}

/// 單一來源檔案的重建計畫
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RebuildPlan {
    /// 是否需要執行渲染器
    pub render: bool,
    /// 輸出資料夾中已存在、可直接當作編碼輸入的 WAV
    pub existing_wav: Option<PathBuf>,
    pub decisions: Vec<(TargetFormat, RebuildDecision)>,
}

impl RebuildPlan {
    #[must_use]
    pub fn decision(&self, format: TargetFormat) -> Option<RebuildDecision> {
        self.decisions
            .iter()
            .find(|(f, _)| *f == format)
            .map(|(_, decision)| *decision)
    }

    #[must_use]
    pub fn needs(&self, format: TargetFormat) -> bool {
        self.decision(format) == Some(RebuildDecision::Rebuild)
    }

    /// 沒有任何階段需要執行
    #[must_use]
    pub fn is_up_to_date(&self) -> bool {
        !self.render
            && self
                .decisions
                .iter()
                .all(|(_, decision)| *decision == RebuildDecision::Skip)
    }
}

/// 建立重建計畫
///
/// * 每個輸出格式獨立判斷：覆寫或輸出不存在時重建
/// * 輸出資料夾已有 `<base_name>*.wav` 時一律沿用，不再渲染；
///   即使其他格式仍缺，也不會檢查這個 WAV 是否過期
/// * 否則只要覆寫或任一格式缺少，就需要渲染
pub fn plan_rebuild(
    base_name: &str,
    formats: &BTreeSet<TargetFormat>,
    destination: &Path,
    overwrite: bool,
) -> io::Result<RebuildPlan> {
    let existing_wav = find_existing_outputs(destination, base_name, TargetFormat::Wav.extension())?
        .into_iter()
        .next();

    let mut decisions = Vec::with_capacity(formats.len());
    for &format in formats {
        let present = if format == TargetFormat::Wav {
            existing_wav.is_some()
        } else {
            !find_existing_outputs(destination, base_name, format.extension())?.is_empty()
        };

        let decision = if overwrite || !present {
            RebuildDecision::Rebuild
        } else {
            RebuildDecision::Skip
        };
        decisions.push((format, decision));
    }

    let anything_missing = decisions
        .iter()
        .any(|(_, decision)| *decision == RebuildDecision::Rebuild);
    let render = existing_wav.is_none() && (overwrite || anything_missing);

    Ok(RebuildPlan {
        render,
        existing_wav,
        decisions,
    })
}
