use clap::{Parser, Subcommand};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod cli;
mod codec;
mod config;
mod enhance;
mod error;
mod server;

#[derive(Parser, Debug)]
#[command(name = "wallpaper-enhancer")]
#[command(about = "Adaptive post-processing for generated wallpapers")]
#[command(version)]
pub struct Cli {
    /// Log level (trace, debug, info, warn, error)
    #[arg(long, env = "RUST_LOG", default_value = "info", global = true)]
    pub log_level: String,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Enhance image files, one per display
    Enhance(cli::EnhanceArgs),
    /// Serve the enhancement pipeline over HTTP
    Serve(ServeArgs),
}

#[derive(clap::Args, Debug)]
pub struct ServeArgs {
    /// Host address to bind to
    #[arg(long, env = "ENHANCER_HOST", default_value = "127.0.0.1")]
    pub host: String,

    /// Port to listen on
    #[arg(long, env = "ENHANCER_PORT", default_value = "9393")]
    pub port: u16,

    /// Maximum upload size in bytes (default: 50MB)
    #[arg(long, env = "ENHANCER_MAX_FILE_SIZE", default_value = "52428800")]
    pub max_file_size: usize,

    /// Maximum number of images enhanced at the same time
    #[arg(long, env = "ENHANCER_MAX_CONCURRENT", default_value = "4")]
    pub max_concurrent: usize,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Cli::parse();

    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| args.log_level.clone().into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    match args.command {
        Command::Enhance(enhance_args) => cli::run(enhance_args).await,
        Command::Serve(serve_args) => {
            let config = config::Config::from(serve_args);

            tracing::info!(
                "Starting wallpaper-enhancer v{}",
                env!("CARGO_PKG_VERSION")
            );
            tracing::info!("Binding to {}:{}", config.host, config.port);

            server::run(config).await
        }
    }
}
