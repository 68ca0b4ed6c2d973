//! 格式登錄表
//!
//! 副檔名 → 格式家族，以及 (格式家族, 輸出格式) → 外部工具呼叫方式。
//! 呼叫方式以宣告式的配方表示，新增格式只需要補上配方

use super::error::{ConversionError, Stage};
use super::tool_command::ToolInvocation;
use crate::config::{FormatFamily, FormatTable, TargetFormat, ToolPaths};
use std::collections::HashSet;
use std::ffi::OsString;
use std::path::Path;

/// 外部工具種類，實際程式名稱由 [`ToolPaths`] 提供
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tool {
    SidPlayer,
    Sc68Player,
    SapConverter,
    OggEncoder,
    FlacEncoder,
}

impl Tool {
    #[must_use]
    pub fn program(self, tools: &ToolPaths) -> &str {
        match self {
            Self::SidPlayer => &tools.sid_player,
            Self::Sc68Player => &tools.sc68_player,
            Self::SapConverter => &tools.sap_converter,
            Self::OggEncoder => &tools.ogg_encoder,
            Self::FlacEncoder => &tools.flac_encoder,
        }
    }
}

/// 配方中的參數樣板
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Arg {
    Lit(&'static str),
    Input,
    Output,
    /// 前綴與輸出路徑黏在同一個參數，例如 `-w/tmp/tune.wav`
    OutputAttached(&'static str),
    Quality,
    /// 來源為原始 PCM 時才展開的參數
    RawPcm(&'static [&'static str]),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Recipe {
    pub tool: Tool,
    pub args: &'static [Arg],
    pub capture_stdout: bool,
}

const SC68_RAW_FLAC: &[&str] = &[
    "--force-raw-format",
    "--endian=little",
    "--sign=signed",
    "--channels=2",
    "--bps=16",
    "--sample-rate=44100",
];

const SID_RENDER_ARGS: &[Arg] = &[Arg::Lit("-q"), Arg::OutputAttached("-w"), Arg::Input];
const SC68_RENDER_ARGS: &[Arg] = &[Arg::Lit("-qqq"), Arg::Lit("--stdout"), Arg::Input];
const SAP_RENDER_ARGS: &[Arg] = &[Arg::Lit("-o"), Arg::Output, Arg::Input];

const OGG_ENCODE_ARGS: &[Arg] = &[
    Arg::Lit("-Q"),
    Arg::Lit("-q"),
    Arg::Quality,
    Arg::RawPcm(&["-r"]),
    Arg::Lit("-o"),
    Arg::Output,
    Arg::Input,
];
const FLAC_ENCODE_ARGS: &[Arg] = &[
    Arg::Lit("-s"),
    Arg::Lit("-f"),
    Arg::Lit("-8"),
    Arg::RawPcm(SC68_RAW_FLAC),
    Arg::Lit("-o"),
    Arg::Output,
    Arg::Input,
];

/// 各格式家族的渲染配方
#[must_use]
pub const fn render_recipe(family: FormatFamily) -> Recipe {
    match family {
        FormatFamily::Sid => Recipe {
            tool: Tool::SidPlayer,
            args: SID_RENDER_ARGS,
            capture_stdout: false,
        },
        FormatFamily::Sc68 => Recipe {
            tool: Tool::Sc68Player,
            args: SC68_RENDER_ARGS,
            capture_stdout: true,
        },
        FormatFamily::Sap => Recipe {
            tool: Tool::SapConverter,
            args: SAP_RENDER_ARGS,
            capture_stdout: false,
        },
    }
}

/// 各輸出格式的編碼配方，`wav` 直接複製中間檔不需要編碼器
#[must_use]
pub const fn encode_recipe(target: TargetFormat) -> Option<Recipe> {
    match target {
        TargetFormat::Wav => None,
        TargetFormat::Ogg => Some(Recipe {
            tool: Tool::OggEncoder,
            args: OGG_ENCODE_ARGS,
            capture_stdout: false,
        }),
        TargetFormat::Flac => Some(Recipe {
            tool: Tool::FlacEncoder,
            args: FLAC_ENCODE_ARGS,
            capture_stdout: false,
        }),
    }
}

/// 格式登錄表：副檔名查詢與配方展開，不做任何 I/O
#[derive(Debug, Clone)]
pub struct FormatRegistry {
    format_table: FormatTable,
    tools: ToolPaths,
}

impl FormatRegistry {
    #[must_use]
    pub const fn new(format_table: FormatTable, tools: ToolPaths) -> Self {
        Self {
            format_table,
            tools,
        }
    }

    #[must_use]
    pub fn extensions(&self) -> HashSet<String> {
        self.format_table.extensions_set()
    }

    pub fn family_for(&self, extension: &str) -> Result<FormatFamily, ConversionError> {
        self.format_table
            .family_for_extension(extension)
            .ok_or_else(|| ConversionError::UnknownFormat {
                extension: extension.to_string(),
            })
    }

    #[must_use]
    pub fn render_invocation(
        &self,
        family: FormatFamily,
        input: &Path,
        output: &Path,
    ) -> ToolInvocation {
        self.expand(
            render_recipe(family),
            Stage::Render,
            family,
            None,
            input,
            output,
        )
    }

    /// `target` 為 `wav` 時回傳 `None`
    #[must_use]
    pub fn encode_invocation(
        &self,
        family: FormatFamily,
        target: TargetFormat,
        quality: u8,
        input: &Path,
        output: &Path,
    ) -> Option<ToolInvocation> {
        encode_recipe(target).map(|recipe| {
            self.expand(
                recipe,
                Stage::Encode(target),
                family,
                Some(quality),
                input,
                output,
            )
        })
    }

    fn expand(
        &self,
        recipe: Recipe,
        stage: Stage,
        family: FormatFamily,
        quality: Option<u8>,
        input: &Path,
        output: &Path,
    ) -> ToolInvocation {
        let mut args: Vec<OsString> = Vec::with_capacity(recipe.args.len());

        for arg in recipe.args {
            match *arg {
                Arg::Lit(value) => args.push(value.into()),
                Arg::Input => args.push(input.into()),
                Arg::Output => args.push(output.into()),
                Arg::OutputAttached(prefix) => {
                    let mut joined = OsString::from(prefix);
                    joined.push(output);
                    args.push(joined);
                }
                Arg::Quality => {
                    if let Some(quality) = quality {
                        args.push(quality.to_string().into());
                    }
                }
                Arg::RawPcm(flags) => {
                    if family.emits_raw_pcm() {
                        args.extend(flags.iter().map(OsString::from));
                    }
                }
            }
        }

        ToolInvocation {
            stage,
            program: recipe.tool.program(&self.tools).to_string(),
            args,
            input: input.to_path_buf(),
            output: output.to_path_buf(),
            capture_stdout: recipe.capture_stdout,
        }
    }
}
