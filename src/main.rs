use clap::Parser;
use log::{info, warn};
use simplelog::{ConfigBuilder, LevelFilter, WriteLogger};
use std::fs::File;
use std::path::PathBuf;

use pushbox::core::config::{self, CliOverrides};
use pushbox::core::state::App;
use pushbox::tui::{self, RunOutcome};
use pushbox::{messaging, updates};

#[derive(Parser)]
#[command(name = "pushbox", about = "Push notification inbox with over-the-air updates")]
struct Args {
    /// Push gateway base URL (overrides config and PUSHBOX_PUSH_URL)
    #[arg(long)]
    push_url: Option<String>,

    /// Update manifest URL (overrides config and PUSHBOX_UPDATE_URL)
    #[arg(long)]
    update_url: Option<String>,

    /// Config file to read instead of ~/.pushbox/config.toml
    #[arg(short, long)]
    config: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> std::io::Result<()> {
    let args = Args::parse();
    dotenv::dotenv().ok();

    // Initialize file logger - writes to pushbox.log in current directory
    let log_config = ConfigBuilder::new()
        .set_time_format_rfc3339()
        .build();

    if let Ok(log_file) = File::create("pushbox.log") {
        let _ = WriteLogger::init(LevelFilter::Debug, log_config, log_file);
    }

    info!("pushbox {} starting up", env!("CARGO_PKG_VERSION"));

    // Resolved now: after an update replaces the binary this path may no
    // longer be readable through /proc/self/exe.
    let exe = std::env::current_exe()?;

    let file_config = config::load_config(args.config.as_deref()).map_err(|e| {
        warn!("Config load failed: {}", e);
        std::io::Error::other(e)
    })?;
    let resolved = config::resolve(
        &file_config,
        &CliOverrides {
            push_url: args.push_url.as_deref(),
            update_url: args.update_url.as_deref(),
        },
    );
    info!("Resolved config: {:?}", resolved);

    let messaging = messaging::from_config(&resolved);
    let updater = updates::from_config(&resolved, &exe);
    let app = App::from_config(updater, &resolved);

    match tui::run(app, messaging)? {
        RunOutcome::Quit => {
            info!("Exiting");
            Ok(())
        }
        RunOutcome::Restart => updates::restart_process(&exe),
    }
}
