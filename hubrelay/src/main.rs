use clap::Parser;
use hubrelay::config::{Args, Directory};
use hubrelay::{Application, Config, telemetry};
use tokio::signal;

/// Resolves once the process is asked to stop.
async fn shutdown_signal() {
    let interrupt = async {
        if let Err(e) = signal::ctrl_c().await {
            tracing::warn!(error = %e, "Ctrl+C handler unavailable");
            std::future::pending::<()>().await;
        }
        "SIGINT"
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                tracing::warn!(error = %e, "SIGTERM handler unavailable");
                std::future::pending::<()>().await;
            }
        }
        "SIGTERM"
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<&'static str>();

    let received = tokio::select! {
        name = interrupt => name,
        name = terminate => name,
    };
    tracing::info!(signal = received, "Shutting down relay");
}

/// `--validate`: the server config must load, and so must the account
/// directory it points at, even though that is re-read on every request.
fn validate(config: &Config) -> anyhow::Result<()> {
    let directory = Directory::load(&config.directory.path)?;
    println!(
        "Configuration is valid ({} accounts in {}).",
        directory.accounts.len(),
        config.directory.path.display()
    );
    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // reqwest is built without a bundled TLS provider
    rustls::crypto::aws_lc_rs::default_provider()
        .install_default()
        .expect("Failed to install rustls crypto provider");

    let args = Args::parse();
    let config = Config::load(&args)?;
    if args.validate {
        return validate(&config);
    }

    telemetry::init_telemetry(config.enable_otel_export)?;
    tracing::debug!(config_file = %args.config, "Loaded configuration");

    Application::new(config)?.serve(shutdown_signal()).await
}
