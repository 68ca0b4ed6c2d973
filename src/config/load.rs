use crate::config::types::{Config, FormatTable, MAX_QUALITY, UserSettings};
use anyhow::{Context, Result, bail};
use std::fs;
use std::path::Path;

/// 編譯時嵌入的副檔名對應表（不需要外部檔案）
const FORMAT_TABLE_JSON: &str = include_str!("../data/format_table.json");

/// 未指定 `--config` 時讀取的設定檔
pub const DEFAULT_SETTINGS_FILE: &str = "settings.json";

impl Config {
    /// 載入設定
    ///
    /// 指定路徑時檔案必須存在；未指定時讀取目前目錄的 settings.json，
    /// 不存在則使用預設值
    pub fn load(settings_path: Option<&Path>) -> Result<Self> {
        let format_table = Self::load_embedded_format_table()?;
        let settings = match settings_path {
            Some(path) => Self::load_settings(path)?,
            None => {
                let path = Path::new(DEFAULT_SETTINGS_FILE);
                if path.exists() {
                    Self::load_settings(path)?
                } else {
                    UserSettings::default()
                }
            }
        };

        validate_settings(&settings)?;

        Ok(Self {
            format_table,
            settings,
        })
    }

    /// 使用嵌入的對應表與給定的設定，不讀取任何檔案
    pub fn with_settings(settings: UserSettings) -> Result<Self> {
        validate_settings(&settings)?;
        Ok(Self {
            format_table: Self::load_embedded_format_table()?,
            settings,
        })
    }

    fn load_settings(path: &Path) -> Result<UserSettings> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("無法讀取設定檔 {}", path.display()))?;

        serde_json::from_str(&content)
            .with_context(|| format!("無法解析設定檔 {}", path.display()))
    }

    /// 從編譯時嵌入的 JSON 載入副檔名對應表
    fn load_embedded_format_table() -> Result<FormatTable> {
        serde_json::from_str(FORMAT_TABLE_JSON).context("無法解析嵌入的格式對應表")
    }
}

fn validate_settings(settings: &UserSettings) -> Result<()> {
    if settings.formats.is_empty() {
        bail!("設定檔的 formats 不可為空");
    }
    if settings.quality > MAX_QUALITY {
        bail!("quality 必須介於 0 到 {MAX_QUALITY}，目前為 {}", settings.quality);
    }
    if settings.parallel == 0 {
        bail!("parallel 至少為 1");
    }
    Ok(())
}
