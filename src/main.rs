use clap::Parser;
use post_archiver::cli::Cli;
use post_archiver::shutdown::ShutdownSignal;
use tracing::error;
use tracing_subscriber::EnvFilter;

/// Initialize tracing; `LOG_FORMAT=json` switches to JSON lines.
/// Logs go to stderr so command output on stdout stays machine readable.
fn init_tracing() {
    let json_format = std::env::var("LOG_FORMAT")
        .map(|v| v.to_lowercase() == "json")
        .unwrap_or(false);

    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("post_archiver=info"));

    if json_format {
        tracing_subscriber::fmt()
            .json()
            .with_env_filter(filter)
            .with_writer(std::io::stderr)
            .init();
    } else {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_writer(std::io::stderr)
            .init();
    }
}

#[tokio::main]
async fn main() {
    // Settings may live in a .env file next to the binary's working directory
    dotenv::dotenv().ok();

    init_tracing();

    let cli = Cli::parse();

    let shutdown = ShutdownSignal::shared();
    tokio::spawn({
        let shutdown = shutdown.clone();
        async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                tracing::warn!("Ctrl+C received - finishing current post, then writing metadata");
                shutdown.request_shutdown();
            }
        }
    });

    let result: anyhow::Result<()> = cli.execute(shutdown).await.map_err(anyhow::Error::from);

    if let Err(e) = result {
        error!("Command failed: {:#}", e);
        std::process::exit(1);
    }
}
