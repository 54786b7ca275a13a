//! nowbar - waybar now-playing module
//!
//! Watches allowlisted MPRIS players on the session bus and prints one
//! waybar JSON object per track change. Runs until killed.

mod config;
mod format;
mod output;

use log::error;
use nowbar_mpris::PlayerWatcher;

#[tokio::main(flavor = "current_thread")]
async fn main() {
    // Diagnostics go to stderr; the bar only ever reads stdout.
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();

    let watcher = match PlayerWatcher::connect(config::SUPPORTED_PLAYERS).await {
        Ok(watcher) => watcher,
        Err(e) => {
            error!("Error connecting to the session bus: {e}");
            std::process::exit(1);
        }
    };

    if let Err(e) = watcher.run(output::emit).await {
        error!("Error watching players: {e}");
        std::process::exit(1);
    }
}
