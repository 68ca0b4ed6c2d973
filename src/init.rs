use env_logger::Env;

/// 初始化日誌，`RUST_LOG` 可覆蓋預設等級
///
/// 重複初始化時保留原本的 logger，回傳 false
pub fn init(verbose: bool) -> bool {
    let default_level = if verbose { "debug" } else { "warn" };
    match env_logger::Builder::from_env(Env::default().default_filter_or(default_level))
        .format_timestamp_secs()
        .try_init()
    {
        Ok(()) => true,
        Err(e) => {
            eprintln!("日誌已初始化，沿用既有設定: {e}");
            false
        }
    }
}
