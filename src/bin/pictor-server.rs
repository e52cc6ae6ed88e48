use clap::Parser;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use pictor::{GradioClient, RelayState, SPACE_ID};

#[derive(Debug, Parser)]
#[command(
    name = "pictor-server",
    about = "HTTP relay in front of a Gradio-hosted image-generation Space"
)]
struct Args {
    /// Address to bind.
    #[arg(long, default_value = "0.0.0.0:5000")]
    listen: String,

    /// Space identifier to relay to.
    #[arg(long, default_value = SPACE_ID)]
    space: String,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let args = Args::parse();

    info!(space = %args.space, "initializing Space client");
    let mut client = GradioClient::new(&args.space);
    match std::env::var("HF_TOKEN") {
        Ok(token) if !token.is_empty() => {
            info!("using HF_TOKEN for authentication");
            client = client.with_token(token);
        }
        _ => info!("no HF_TOKEN found, using anonymous access"),
    }

    // Initialization failure is not fatal: the static page is still served
    // and /generate reports the missing backend per request.
    let state = match client.connect().await {
        Ok(client) => RelayState::new(client),
        Err(err) => {
            warn!(space = %args.space, error = %err, "failed to initialize Space client");
            RelayState::empty()
        }
    };

    let app = pictor::router(state);
    let listener = tokio::net::TcpListener::bind(&args.listen).await?;
    info!(listen = %args.listen, "serving");
    axum::serve(listener, app).await?;
    Ok(())
}
