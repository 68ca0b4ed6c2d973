use anyhow::Result;
use chiptune_convert::cli::Cli;
use chiptune_convert::component::ChiptuneConverter;
use chiptune_convert::config::Config;
use chiptune_convert::init;
use chiptune_convert::signal::setup_shutdown_signal;
use clap::Parser;
use log::info;

fn main() -> Result<()> {
    let cli = Cli::parse();
    init::init(cli.verbose);
    let shutdown_signal = setup_shutdown_signal()?;

    let config = Config::load(cli.config.as_deref())?;
    let request = cli.to_request(&config.settings);

    let converter = ChiptuneConverter::new(config, request, shutdown_signal);
    let report = converter.run(&cli.sources)?;
    converter.print_summary(&report);

    // 個別檔案失敗只回報，不影響結束碼
    info!("程式正常結束");
    Ok(())
}
