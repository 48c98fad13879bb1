use anyhow::{Context, Result};
use env_logger::Env;
use log::info;

use co2_monitor::azure_read::AzureReadService;
use co2_monitor::frame_source::FfmpegFrameSource;
use co2_monitor::monitor::Monitor;
use co2_monitor::monitor_config::MonitorConfig;
use co2_monitor::pipeline::SamplePipeline;
use co2_monitor::reading::ReadingLog;
use co2_monitor::recognition::{worst_case_wait, RecognitionClient};
use co2_monitor::schedule::{SystemClock, TokioSleeper};

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    // Initialize logging
    env_logger::Builder::from_env(Env::default().default_filter_or("info")).init();

    info!("Starting CO2 monitor");

    // Load environment variables from .env file
    dotenv::dotenv().ok();

    let config = MonitorConfig::from_env().context("Invalid monitor configuration")?;
    info!(
        "Recognition endpoint {}, waiting at most {:?} per job",
        config.recognition.endpoint,
        worst_case_wait(&config.recognition.poll)
    );

    let mut log = ReadingLog::open(&config.log_path)?;

    let service = AzureReadService::new(&config.recognition)?;
    let recognizer = RecognitionClient::new(
        service,
        TokioSleeper,
        config.recognition.language.clone(),
        config.recognition.poll.clone(),
    );
    let pipeline = SamplePipeline::new(
        FfmpegFrameSource::new(config.camera.clone()),
        recognizer,
        SystemClock,
        config.accepted_range,
    )
    .with_frame_snapshot(config.frame_snapshot.clone());

    {
        let mut monitor = Monitor::new(pipeline, &mut log, TokioSleeper, config.sample_interval);
        tokio::select! {
            _ = monitor.run() => {}
            signal = tokio::signal::ctrl_c() => {
                signal.context("Failed to listen for shutdown signal")?;
            }
        }

        let stats = monitor.stats();
        info!(
            "Shutdown requested after {} cycles ({} logged, {} skipped)",
            stats.cycles, stats.logged, stats.skipped
        );
    }

    let appended = log.appended();
    log.into_inner().context("Failed to flush reading log")?;
    info!("Reading log closed with {appended} new entries");
    Ok(())
}
