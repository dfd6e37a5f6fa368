//! Quiz Leaderboard - Google sign-in, score submission and ranking API
//!
//! Usage:
//!   quiz-leaderboard serve --port 8000 --backend sqlite   - Launch the HTTP API
//!   quiz-leaderboard leaderboard --top 10                 - Print the ranking

mod config;
mod error;
mod routes;

use clap::{Parser, Subcommand, ValueEnum};
use config::AppConfig;
use persistence::{Database, SqliteStore};
use quiz_core::{GoogleTokenVerifier, LeaderboardEntry, MemoryStore, QuizService, QuizStore};
use routes::AppState;
use std::sync::Arc;
use tracing::{error, info};

const APP_VERSION: &str = concat!(env!("CARGO_PKG_VERSION"), "-", env!("GIT_HASH"));

#[derive(Parser)]
#[command(name = "quiz-leaderboard")]
#[command(about = "Quiz leaderboard backend with Google sign-in", long_about = None)]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum Backend {
    /// Relational store (SQLite file)
    Sqlite,
    /// Document store (MongoDB, needs the `mongo` feature)
    Mongo,
    /// Volatile in-process store
    Memory,
}

#[derive(Subcommand)]
enum Commands {
    /// Launch the HTTP API
    Serve {
        /// Host to bind to
        #[arg(long, default_value = "0.0.0.0")]
        host: String,
        /// Port to listen on
        #[arg(short, long, default_value_t = 8000)]
        port: u16,
        /// Storage backend
        #[arg(long, value_enum, default_value_t = Backend::Sqlite)]
        backend: Backend,
    },
    /// Print the current leaderboard
    Leaderboard {
        /// Number of rows to print
        #[arg(long, default_value_t = 10)]
        top: usize,
        /// Only each user's best result
        #[arg(long)]
        best_per_user: bool,
        /// Storage backend
        #[arg(long, value_enum, default_value_t = Backend::Sqlite)]
        backend: Backend,
    },
}

fn init_logging(verbose: bool) {
    use tracing_subscriber::{fmt, prelude::*, EnvFilter};

    let filter = if verbose {
        EnvFilter::new("debug,quiz_core=debug,persistence=debug,quiz_leaderboard=debug,tower_http=debug")
    } else {
        EnvFilter::new("info,quiz_core=info,persistence=info,quiz_leaderboard=info")
    };

    tracing_subscriber::registry()
        .with(fmt::layer().with_target(false).compact())
        .with(filter)
        .init();
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);
    dotenvy::dotenv().ok();

    let config = AppConfig::from_env();

    match cli.command {
        Commands::Serve {
            host,
            port,
            backend,
        } => {
            cmd_serve(&config, &host, port, backend).await?;
        }
        Commands::Leaderboard {
            top,
            best_per_user,
            backend,
        } => {
            cmd_leaderboard(&config, top, best_per_user, backend).await?;
        }
    }

    Ok(())
}

async fn open_store(config: &AppConfig, backend: Backend) -> anyhow::Result<Arc<dyn QuizStore>> {
    match backend {
        Backend::Sqlite => {
            let db = match &config.database_url {
                Some(url) => Database::from_url(url).await,
                None => Database::new(&config.db_path).await,
            }
            .map_err(|e| {
                error!("Failed to initialize database: {}", e);
                anyhow::anyhow!("Database initialization failed: {}", e)
            })?;
            info!("Database initialized: {}", config.sqlite_location());
            Ok(Arc::new(SqliteStore::new(&db)))
        }
        Backend::Mongo => open_mongo(config).await,
        Backend::Memory => {
            info!("Using in-memory store; data is lost on exit");
            Ok(Arc::new(MemoryStore::new()))
        }
    }
}

#[cfg(feature = "mongo")]
async fn open_mongo(config: &AppConfig) -> anyhow::Result<Arc<dyn QuizStore>> {
    let uri = config
        .mongodb_uri
        .as_deref()
        .ok_or_else(|| anyhow::anyhow!("MONGODB_URI must be set for the mongo backend"))?;
    let store = persistence::MongoStore::connect(uri, &config.mongodb_database)
        .await
        .map_err(|e| anyhow::anyhow!("MongoDB initialization failed: {}", e))?;
    Ok(Arc::new(store))
}

#[cfg(not(feature = "mongo"))]
async fn open_mongo(_config: &AppConfig) -> anyhow::Result<Arc<dyn QuizStore>> {
    anyhow::bail!("this binary was built without the `mongo` feature")
}

// ============================================================================
// Serve command - Axum web server
// ============================================================================

async fn cmd_serve(config: &AppConfig, host: &str, port: u16, backend: Backend) -> anyhow::Result<()> {
    info!("Quiz-Leaderboard v{} starting...", APP_VERSION);

    let store = open_store(config, backend).await?;
    let verifier = GoogleTokenVerifier::with_url(&config.tokeninfo_url, config.google_client_id.clone())?;
    if config.google_client_id.is_none() {
        info!("GOOGLE_CLIENT_ID not set; token audience is not checked");
    }

    let state = AppState {
        quiz: Arc::new(QuizService::new(store, Arc::new(verifier))),
    };
    let app = routes::router(state, config.cors_origins.layer());

    let addr: std::net::SocketAddr = format!("{}:{}", host, port).parse()?;
    println!("\n=== Quiz-Leaderboard v{} ===", APP_VERSION);
    println!("Listening on http://{}", addr);
    println!("\nEndpoints:");
    println!("  GET  /health                  - Health check");
    println!("  POST /auth/google             - Sign in with a Google ID token");
    println!("  POST /result                  - Submit a quiz result");
    println!("  GET  /leaderboard             - Ranked results");
    println!("  GET  /user/has-taken-quiz     - Whether a user has submitted");
    println!("\n  Backend: {:?}", backend);
    println!("  CORS: {:?}", config.cors_origins);
    println!("\nPress Ctrl+C to stop\n");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(async {
            tokio::signal::ctrl_c().await.ok();
            info!("Ctrl+C received, shutting down...");
        })
        .await?;

    Ok(())
}

// ============================================================================
// Leaderboard command - print ranking from the store
// ============================================================================

async fn cmd_leaderboard(
    config: &AppConfig,
    top: usize,
    best_per_user: bool,
    backend: Backend,
) -> anyhow::Result<()> {
    let store = open_store(config, backend).await?;
    // Printing needs no sign-in; the verifier is never called
    let verifier = GoogleTokenVerifier::with_url(&config.tokeninfo_url, None)?;
    let quiz = QuizService::new(store, Arc::new(verifier));

    let entries = if best_per_user {
        quiz.leaderboard_best_per_user().await?
    } else {
        quiz.leaderboard().await?
    };

    if entries.is_empty() {
        println!("\nNo results yet.");
        return Ok(());
    }
    print_leaderboard(&entries, top);
    Ok(())
}

fn print_leaderboard(entries: &[LeaderboardEntry], top: usize) {
    println!("\nTop {} of {} results:", entries.len().min(top), entries.len());
    println!("  {:>3}  {:<24} {:>8} {:>10}", "#", "Name", "Points", "Time (s)");
    println!("  {}", "-".repeat(50));
    for (i, e) in entries.iter().take(top).enumerate() {
        println!(
            "  {:>3}  {:<24} {:>8} {:>10.2}",
            i + 1,
            e.name,
            e.points,
            e.time_taken,
        );
    }
}
