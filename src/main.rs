use duoedge::app::{App, Config};
use duoedge::error::Error;
use tokio::signal;
use tracing::{error, info};

#[tokio::main]
async fn main() {
    let _ = dotenvy::dotenv();

    let config = match Config::load("config.toml") {
        Ok(c) => c,
        Err(e) => {
            eprintln!("failed to load config: {e}");
            std::process::exit(1);
        }
    };

    config.logging.init();
    info!(dry_run = config.dry_run, "duoedge starting");

    let app = match App::bootstrap(config) {
        Ok(app) => app,
        Err(e) => {
            error!(error = %e, "failed to bootstrap application");
            std::process::exit(1);
        }
    };

    tokio::select! {
        result = app.run() => {
            match result {
                Ok(()) => info!("duoedge stopped"),
                Err(Error::FeedUnrecoverable(reason)) => {
                    error!(reason, "feed unrecoverable, exiting");
                    std::process::exit(2);
                }
                Err(e) => {
                    error!(error = %e, "fatal error");
                    std::process::exit(1);
                }
            }
        }
        _ = signal::ctrl_c() => {
            info!("shutdown signal received");
        }
    }
}
