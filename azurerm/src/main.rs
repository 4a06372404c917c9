use azurerm::AzureRmProvider;
use tfkit::ServerConfig;

fn log_level() -> tracing::Level {
    match std::env::var("TF_LOG").unwrap_or_default().to_uppercase().as_str() {
        "TRACE" => tracing::Level::TRACE,
        "DEBUG" => tracing::Level::DEBUG,
        "WARN" => tracing::Level::WARN,
        "ERROR" => tracing::Level::ERROR,
        _ => tracing::Level::INFO,
    }
}

#[tokio::main]
async fn main() -> tfkit::Result<()> {
    // The handshake goes to stdout; everything else must stay on stderr.
    tracing_subscriber::fmt()
        .with_max_level(log_level())
        .with_writer(std::io::stderr)
        .init();

    tfkit::serve(AzureRmProvider::new(), ServerConfig::from_env()).await
}
