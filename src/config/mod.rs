pub mod load;
pub mod types;

pub use load::DEFAULT_SETTINGS_FILE;
pub use types::{
    Config, ConversionRequest, DEFAULT_QUALITY, FormatFamily, FormatTable, MAX_QUALITY,
    TargetFormat, ToolPaths, UserSettings,
};
