use anyhow::{Context, Result};
use auto_video_publish::component::pipeline_driver::{
    DescriptorSource, LineSource, PipelineDriver, PromptSource,
};
use auto_video_publish::component::publish_session::{
    ConnectionHolder, PublishSession, TelegramBot,
};
use auto_video_publish::component::transfer_session::{TransferSession, TransmissionClient};
use auto_video_publish::config::{Config, DEFAULT_CONFIG_FILE};
use auto_video_publish::init;
use auto_video_publish::signal::setup_shutdown_signal;
use auto_video_publish::tools::{
    Clock, FfmpegAvailability, FfmpegTool, ProgressDisplay, ProgressReporter, SystemClock,
    resolve_directory,
};
use clap::Parser;
use console::style;
use log::info;
use std::path::PathBuf;
use std::sync::Arc;
use std::sync::atomic::Ordering;

#[derive(Parser)]
#[command(
    name = "auto_video_publish",
    about = "下載 magnet 內容並發布到 Telegram 頻道"
)]
struct Cli {
    /// 設定檔路徑
    #[arg(long, env = "AUTO_VIDEO_PUBLISH_CONFIG", default_value = DEFAULT_CONFIG_FILE)]
    config: PathBuf,
    /// 使用的 profile，預設取設定檔中的 `profile`
    #[arg(long)]
    profile: Option<String>,
}

fn main() -> Result<()> {
    init::init();
    let cli = Cli::parse();
    let shutdown_signal = setup_shutdown_signal()?;

    let config = Config::load(&cli.config)?;
    let profile_name = cli.profile.unwrap_or_else(|| config.profile.clone());
    let (profile, mut settings) = config.pipeline_settings(&profile_name)?;
    settings.download_root = resolve_directory(&settings.download_root).with_context(|| {
        format!("無法建立下載資料夾: {}", settings.download_root.display())
    })?;

    println!("{}", style("=== 自動影片發布 ===").cyan().bold());
    info!(
        "profile: {}, 頻道: {}, 下載路徑: {}",
        profile.name,
        settings.channel_id,
        settings.download_root.display()
    );

    let clock: Arc<dyn Clock> = Arc::new(SystemClock);
    let reporter: Arc<dyn ProgressReporter> = Arc::new(ProgressDisplay::detect());

    let messenger = Arc::new(TelegramBot::new(
        &profile,
        Arc::clone(&clock),
        Arc::clone(&shutdown_signal),
    )?);
    let holder = ConnectionHolder::spawn(Arc::clone(&messenger), Arc::clone(&shutdown_signal))?;
    holder.wait_ready()?;

    let transfer = TransferSession::new(
        TransmissionClient::new(
            &config.transmission,
            &settings.download_root,
            Arc::clone(&clock),
            settings.poll_interval,
            Arc::clone(&shutdown_signal),
        )?,
        &settings,
        Arc::clone(&clock),
        Arc::clone(&reporter),
        Arc::clone(&shutdown_signal),
    );
    let publisher = PublishSession::new(
        messenger,
        settings,
        Arc::new(FfmpegTool),
        Arc::new(FfmpegAvailability),
        reporter,
        clock,
    )?;

    let mut source: Box<dyn DescriptorSource> = if console::user_attended() {
        Box::new(PromptSource)
    } else {
        Box::new(LineSource::stdin())
    };

    let mut driver = PipelineDriver::new(transfer, publisher, Arc::clone(&shutdown_signal));
    let summaries = driver.run(source.as_mut());

    shutdown_signal.store(true, Ordering::SeqCst);
    holder.join();

    println!(
        "\n{}",
        style(format!("結束，共處理 {} 個 descriptor", summaries.len()))
            .green()
            .bold()
    );
    info!("Program exited normally");
    Ok(())
}
