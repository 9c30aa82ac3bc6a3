//! Ballpit entry point
//!
//! Reads settings, opens the window and runs the game loop until it closes.

use ballpit::Settings;
use ballpit::platform;

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    log::info!("Ballpit starting...");

    let settings = Settings::load();

    if let Err(e) = platform::run(settings) {
        log::error!("Fatal: {e:#}");
        std::process::exit(1);
    }

    log::info!("Ballpit exiting");
}
