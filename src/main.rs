use std::process::ExitCode;

use api::core::{settings::AppSettings, telemetry};
use tracing::{error, info};

#[tokio::main]
async fn main() -> ExitCode {
    // A missing .env is fine; real deployments inject the environment.
    let dotenv = dotenvy::dotenv();

    let settings = match AppSettings::from_env() {
        Ok(s) => s,
        Err(e) => {
            eprintln!("configuration error: {e}");
            return ExitCode::FAILURE;
        }
    };

    telemetry::init(&settings.log_level);
    if let Ok(path) = dotenv {
        info!(path = %path.display(), "loaded .env");
    }
    info!(
        app = %settings.app_name,
        version = settings.version,
        environment = %settings.environment,
        "starting"
    );

    match api::start(settings).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            let detail = std::error::Error::source(&e)
                .map(ToString::to_string)
                .unwrap_or_default();
            error!(error = %e, %detail, "server terminated");
            ExitCode::FAILURE
        }
    }
}
