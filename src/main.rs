use std::io::Write;
use std::process::ExitCode;

use chrono::Local;
use dotenv::dotenv;
use log::{LevelFilter, error, info};
use proxyjobs::{RunError, ScrapingContext};

fn init_logger() {
    env_logger::Builder::new()
        .format(|buf, record| {
            writeln!(
                buf,
                "{} [{}] - {}",
                Local::now().format("%Y-%m-%d %H:%M:%S"),
                record.level(),
                record.args()
            )
        })
        .filter_level(LevelFilter::Info)
        // RUST_LOG still wins when set.
        .parse_default_env()
        .init();
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    dotenv().ok();
    init_logger();

    let context = match ScrapingContext::new() {
        Ok(context) => context,
        Err(e) => {
            error!("Invalid configuration: {e:#}");
            return ExitCode::FAILURE;
        }
    };

    match context.run().await {
        Ok(report) => {
            info!(
                "Wrote {} jobs to {} ({} batches written, {} abandoned)",
                report.records_written,
                context.scraping_config.output_path.display(),
                report.batches_completed,
                report.batches_abandoned
            );
            ExitCode::SUCCESS
        }
        Err(e) if matches!(e.downcast_ref::<RunError>(), Some(RunError::EmptyPool)) => {
            error!("No valid proxies found. Exiting.");
            ExitCode::FAILURE
        }
        Err(e) => {
            error!("Error during job scraping: {e:#}");
            ExitCode::FAILURE
        }
    }
}
