use clap::Parser;
use fundraiser_ledger::cli::{self, Cli, Commands};
use fundraiser_ledger::config::{Config, LogFormat};
use fundraiser_ledger::{AppState, create_app};
use std::net::SocketAddr;
use tokio::net::TcpListener;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = Config::from_env()?;
    init_tracing(config.log_format);

    let cli = Cli::parse();
    match cli.command.unwrap_or(Commands::Serve) {
        Commands::Serve => serve(config).await,
        Commands::Campaigns(command) => cli::handle_campaigns(&config, command).await,
        Commands::Donations(command) => cli::handle_donations(&config, command).await,
        Commands::Summary => cli::handle_summary(&config).await,
        Commands::Config => cli::handle_config_validate(&config),
    }
}

fn init_tracing(format: LogFormat) {
    let filter =
        tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into());

    match format {
        LogFormat::Json => tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer().json())
            .init(),
        LogFormat::Text => tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer())
            .init(),
    }
}

async fn serve(config: Config) -> anyhow::Result<()> {
    let store = cli::open_store(&config).await?;
    let stats = store.stats().await;
    tracing::info!(
        data_file = %config.data_file.display(),
        campaigns = stats.campaigns,
        donations = stats.donations,
        "Campaign store loaded"
    );

    let app = create_app(AppState::new(store, &config));

    let addr = SocketAddr::from(([0, 0, 0, 0], config.server_port));
    tracing::info!("listening on {}", addr);

    let listener = TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
