use clap::ValueEnum;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, HashSet};
use std::fmt;
use std::path::{Path, PathBuf};

/// 音樂來源的格式家族，決定使用哪一個渲染器
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum FormatFamily {
    Sid,
    Sc68,
    Sap,
}

impl FormatFamily {
    #[must_use]
    pub const fn display_name(self) -> &'static str {
        match self {
            Self::Sid => "SID",
            Self::Sc68 => "SC68",
            Self::Sap => "SAP",
        }
    }

    /// SC68 播放器輸出的是沒有 WAV 標頭的原始 PCM
    #[must_use]
    pub const fn emits_raw_pcm(self) -> bool {
        matches!(self, Self::Sc68)
    }
}

impl fmt::Display for FormatFamily {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.display_name())
    }
}

/// 輸出音訊格式
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, ValueEnum,
)]
#[serde(rename_all = "lowercase")]
pub enum TargetFormat {
    Wav,
    Ogg,
    Flac,
}

impl TargetFormat {
    #[must_use]
    pub const fn extension(self) -> &'static str {
        match self {
            Self::Wav => "wav",
            Self::Ogg => "ogg",
            Self::Flac => "flac",
        }
    }
}

impl fmt::Display for TargetFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.extension())
    }
}

/// 副檔名對應格式家族的表格（編譯時嵌入）
///
/// 副檔名包含前導點且區分大小寫，大小寫版本需各自列出
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FormatTable {
    #[serde(rename = "SID")]
    pub sid: Vec<String>,
    #[serde(rename = "SC68")]
    pub sc68: Vec<String>,
    #[serde(rename = "SAP")]
    pub sap: Vec<String>,
}

impl FormatTable {
    fn entries(&self) -> [(FormatFamily, &[String]); 3] {
        [
            (FormatFamily::Sid, &self.sid),
            (FormatFamily::Sc68, &self.sc68),
            (FormatFamily::Sap, &self.sap),
        ]
    }

    #[must_use]
    pub fn extensions_set(&self) -> HashSet<String> {
        self.entries()
            .into_iter()
            .flat_map(|(_, extensions)| extensions.iter().cloned())
            .collect()
    }

    /// `extension` 不含前導點，例如 `"sid"`
    #[must_use]
    pub fn family_for_extension(&self, extension: &str) -> Option<FormatFamily> {
        let dotted = format!(".{extension}");
        self.entries()
            .into_iter()
            .find(|(_, extensions)| extensions.iter().any(|e| *e == dotted))
            .map(|(family, _)| family)
    }

    #[must_use]
    pub fn family_for_path(&self, path: &Path) -> Option<FormatFamily> {
        path.extension()
            .and_then(|ext| ext.to_str())
            .and_then(|ext| self.family_for_extension(ext))
    }
}

/// 外部工具的程式名稱或路徑
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ToolPaths {
    pub sid_player: String,
    pub sc68_player: String,
    pub sap_converter: String,
    pub ogg_encoder: String,
    pub flac_encoder: String,
}

impl Default for ToolPaths {
    fn default() -> Self {
        Self {
            sid_player: "sidplayfp".to_string(),
            sc68_player: "sc68".to_string(),
            sap_converter: "asapconv".to_string(),
            ogg_encoder: "oggenc".to_string(),
            flac_encoder: "flac".to_string(),
        }
    }
}

pub const DEFAULT_QUALITY: u8 = 8;
pub const MAX_QUALITY: u8 = 10;

/// 使用者設定（settings.json），所有欄位皆可省略
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct UserSettings {
    pub formats: Vec<TargetFormat>,
    pub quality: u8,
    pub parallel: usize,
    pub tools: ToolPaths,
    pub scratch_directory: Option<PathBuf>,
}

impl Default for UserSettings {
    fn default() -> Self {
        Self {
            formats: vec![TargetFormat::Ogg],
            quality: DEFAULT_QUALITY,
            parallel: 1,
            tools: ToolPaths::default(),
            scratch_directory: None,
        }
    }
}

#[derive(Debug, Clone)]
pub struct Config {
    pub format_table: FormatTable,
    pub settings: UserSettings,
}

/// 整批轉檔的參數，建立後不再變動，所有 worker 共用唯讀參考
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConversionRequest {
    pub formats: BTreeSet<TargetFormat>,
    pub overwrite: bool,
    pub quality: u8,
    /// `None` 表示輸出到來源檔案所在的資料夾
    pub destination: Option<PathBuf>,
    pub parallel: usize,
    pub recursive: bool,
    pub verbose: bool,
}

impl ConversionRequest {
    #[must_use]
    pub fn from_settings(settings: &UserSettings) -> Self {
        Self {
            formats: settings.formats.iter().copied().collect(),
            overwrite: false,
            quality: settings.quality,
            destination: None,
            parallel: settings.parallel.max(1),
            recursive: false,
            verbose: false,
        }
    }

    #[must_use]
    pub fn destination_for<'a>(&'a self, source_directory: &'a Path) -> &'a Path {
        self.destination.as_deref().unwrap_or(source_directory)
    }
}
