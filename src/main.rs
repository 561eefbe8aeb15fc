use clap::Parser;
use std::process::ExitCode;
use swapi_harvest::app::App;
use swapi_harvest::cli::Args;
use swapi_harvest::config::Config;
use swapi_harvest::logging::setup_logging;
use tracing::info;

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    dotenvy::dotenv().ok();

    let args = Args::parse();

    // Load config and setup logging before App::new() so startup logs are never silently dropped
    let config = Config::load().expect("Failed to load config");
    setup_logging(&config, args.tracing);

    info!(
        version = env!("CARGO_PKG_VERSION"),
        environment = if cfg!(debug_assertions) {
            "development"
        } else {
            "production"
        },
        "starting swapi-harvest"
    );

    let app = App::new(config, args.dry_run)
        .await
        .expect("Failed to initialize application");
    app.run().await
}
