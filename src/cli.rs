use crate::config::{ConversionRequest, MAX_QUALITY, TargetFormat, UserSettings};
use clap::Parser;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "chiptune-convert")]
#[command(author, version, about = "將 SID、SC68/SNDH、SAP 晶片音樂批次轉為 WAV/OGG/FLAC")]
pub struct Cli {
    /// 來源檔案或資料夾
    #[arg(required = true)]
    pub sources: Vec<PathBuf>,

    /// 輸出資料夾（預設為來源檔案所在的資料夾）
    #[arg(short, long)]
    pub destination: Option<PathBuf>,

    /// 輸出格式，以逗號分隔（預設 ogg）
    #[arg(short, long, value_enum, value_delimiter = ',')]
    pub formats: Option<Vec<TargetFormat>>,

    /// 同時執行的任務數（預設 1）
    #[arg(short = 'j', long, value_parser = parse_worker_count)]
    pub parallel: Option<usize>,

    /// 覆寫已存在的輸出
    #[arg(short, long)]
    pub overwrite: bool,

    /// 有損編碼品質 0-10（預設 8）
    #[arg(short, long, value_parser = clap::value_parser!(u8).range(0..=i64::from(MAX_QUALITY)))]
    pub quality: Option<u8>,

    /// 遞迴處理子資料夾
    #[arg(short, long)]
    pub recursive: bool,

    /// 顯示外部工具的輸出
    #[arg(short, long)]
    pub verbose: bool,

    /// 設定檔路徑（預設為目前目錄的 settings.json）
    #[arg(long)]
    pub config: Option<PathBuf>,
}

impl Cli {
    /// 以命令列參數覆蓋設定檔的預設值
    #[must_use]
    pub fn to_request(&self, settings: &UserSettings) -> ConversionRequest {
        let mut request = ConversionRequest::from_settings(settings);

        if let Some(formats) = &self.formats {
            request.formats = formats.iter().copied().collect();
        }
        if let Some(parallel) = self.parallel {
            request.parallel = parallel;
        }
        if let Some(quality) = self.quality {
            request.quality = quality;
        }
        request.destination.clone_from(&self.destination);
        request.overwrite = self.overwrite;
        request.recursive = self.recursive;
        request.verbose = self.verbose;

        request
    }
}

fn parse_worker_count(raw: &str) -> Result<usize, String> {
    match raw.parse::<usize>() {
        Ok(0) => Err("至少需要 1 個 worker".to_string()),
        Ok(count) => Ok(count),
        Err(e) => Err(format!("無效的數字 {raw}: {e}")),
    }
}
