use tokio::net::TcpListener;
use tracing_subscriber::{EnvFilter, FmtSubscriber};

fn init_logging() {
    let filter = std::env::var("MOCK_SERVER_LOG")
        .or_else(|_| std::env::var("RUST_LOG"))
        .map_or_else(
            |_| EnvFilter::new("info"),
            |value| EnvFilter::try_new(value).unwrap_or_else(|_| EnvFilter::new("info")),
        );
    let subscriber = FmtSubscriber::builder().with_env_filter(filter).finish();
    if let Err(err) = tracing::subscriber::set_global_default(subscriber) {
        eprintln!("Failed to set global default subscriber: {err}");
    }
}

#[tokio::main]
async fn main() -> Result<(), std::io::Error> {
    init_logging();
    let port = std::env::var("PORT").unwrap_or_else(|_| "8080".to_string());
    let addr = format!("127.0.0.1:{port}");
    let listener = TcpListener::bind(&addr).await?;
    tracing::info!(%addr, user = mock_server::USERNAME, "mock LoadTest service listening");
    mock_server::run(listener).await
}
