use std::io;
use std::net::SocketAddr;

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use ssr_db::db::init_db;
use ssr_panel::config::PanelConfig;
use ssr_panel::utils::mb_to_bytes;
use ssr_panel::{AppState, build_router, cli};

#[derive(Parser)]
#[command(name = "ssr-panel")]
#[command(about = "SSR user dashboard", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the web server (default)
    Serve,
    /// Account management
    User {
        #[command(subcommand)]
        subcommand: UserCommands,
    },
}

#[derive(Subcommand)]
enum UserCommands {
    /// Create a dashboard account with a fresh proxy port and password
    Create {
        #[arg(long)]
        email: String,
        #[arg(long)]
        password: String,
        /// Proxy port, defaults to the next free one
        #[arg(long)]
        port: Option<i64>,
        /// Initial traffic quota in MB
        #[arg(long, default_value_t = 0)]
        transfer_mb: i64,
    },
    /// Issue invite codes to a user
    Invite {
        #[arg(long)]
        email: String,
        #[arg(long, default_value_t = 1)]
        count: u32,
    },
    /// Reset a user's login password
    Passwd {
        #[arg(long)]
        email: String,
        #[arg(long)]
        password: String,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    if let Err(e) = dotenvy::dotenv() {
        println!("Warning: no .env loaded: {}", e);
    }

    let cli = Cli::parse();

    let file_appender = tracing_appender::rolling::never(".", "server.log");
    let (non_blocking, _guard) = tracing_appender::non_blocking(file_appender);

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                "ssr_panel=debug,ssr_db=debug,tower_http=info,sqlx=warn".into()
            }),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(io::stdout))
        .with(tracing_subscriber::fmt::layer().with_writer(non_blocking).with_ansi(false))
        .init();

    let config = PanelConfig::load()?;
    let pool = init_db(&config.database_url).await?;

    match cli.command.unwrap_or(Commands::Serve) {
        Commands::Serve => run_server(pool, config).await?,
        Commands::User { subcommand } => match subcommand {
            UserCommands::Create {
                email,
                password,
                port,
                transfer_mb,
            } => {
                let transfer_enable = mb_to_bytes(transfer_mb)?;
                cli::create_user(&pool, &email, &password, port, transfer_enable).await?;
            }
            UserCommands::Invite { email, count } => {
                cli::issue_invites(&pool, &email, count).await?;
            }
            UserCommands::Passwd { email, password } => {
                cli::reset_password(&pool, &email, &password).await?;
            }
        },
    }

    Ok(())
}

async fn run_server(pool: sqlx::SqlitePool, config: PanelConfig) -> Result<()> {
    let port = config.listen_port;
    let state = AppState::new(pool, config);

    let purged = state.sessions.purge_expired(chrono::Utc::now()).await?;
    if purged > 0 {
        tracing::info!("Removed {} expired sessions", purged);
    }

    let app = build_router(state);

    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    tracing::info!("Listening on {}", addr);
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
