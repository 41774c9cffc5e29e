use mock_server::Account;
use tokio::net::TcpListener;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<(), std::io::Error> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "mock_server=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let port = std::env::var("PORT").unwrap_or_else(|_| "3000".to_string());
    let mut account = Account::default();
    if let Ok(email) = std::env::var("MOCK_EMAIL") {
        account.email = email;
    }
    if let Ok(password) = std::env::var("MOCK_PASSWORD") {
        account.password = password;
    }

    let addr = format!("127.0.0.1:{port}");
    let listener = TcpListener::bind(&addr).await?;
    tracing::info!(%addr, email = %account.email, "listening");
    mock_server::run_with_account(listener, account).await
}
