use clap::Parser;
use std::net::SocketAddr;
use tracing_subscriber::EnvFilter;

use scribe::auth::accounts;
use scribe::config::{Cli, Command, Config};
use scribe::error::AppError;
use scribe::state::AppState;
use scribe::{db, routes};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    // Parse CLI args and load config
    let cli = Cli::parse();
    let data_dir = Config::data_dir(&cli)?;
    std::fs::create_dir_all(&data_dir)?;
    tracing::info!("Data directory: {}", data_dir.display());

    let config = Config::load(&cli)?;

    // Initialize database
    let pool = db::create_pool(&config.db_path())?;
    db::run_migrations(&pool)?;

    match cli.command.clone().unwrap_or(Command::Serve) {
        Command::Serve => serve(AppState::new(pool, config)).await,
        Command::CreateSuperuser {
            username,
            email,
            password,
        } => {
            let mut conn = pool.get()?;
            match accounts::create_superuser(
                &mut conn,
                &username,
                &email,
                &password,
                config.auth.bcrypt_cost,
            ) {
                Ok(user) => {
                    tracing::info!("Superuser {} created", user.username);
                    Ok(())
                }
                Err(AppError::Validation(errors)) => anyhow::bail!("Invalid superuser: {}", errors),
                Err(e) => Err(e.into()),
            }
        }
    }
}

async fn serve(state: AppState) -> anyhow::Result<()> {
    let addr: SocketAddr =
        format!("{}:{}", state.config.server.host, state.config.server.port).parse()?;
    let app = routes::app(state);

    tracing::info!("Listening on http://{}", addr);
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
