//! Circles - Main Server
//!
//! Social graph backend with Neo4j and push notifications.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use circles::auth::jwt::encode_jwt;
use circles::neo4j::{CardNode, Neo4jClient};
use circles::notifications::NoopNotifier;
use circles::social::{NewUser, SocialService};
use circles::Config;
use std::sync::Arc;
use serde::Deserialize;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use uuid::Uuid;

#[derive(Parser)]
#[command(name = "circles")]
#[command(about = "Circles social graph server")]
struct Cli {
    /// Path to the YAML config file (default: ./config.yaml)
    #[arg(short, long, global = true)]
    config: Option<std::path::PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the API server
    Serve {
        /// Port to listen on (overrides config.yaml and SERVER_PORT)
        #[arg(short, long)]
        port: Option<u16>,
    },

    /// Load catalog cards from a YAML file into the graph
    SeedCards {
        /// YAML file with a top-level `cards` list
        #[arg(short, long)]
        path: std::path::PathBuf,
    },

    /// Register users from a YAML file, printing each id and id code
    SeedUsers {
        /// YAML file with a top-level `users` list
        #[arg(short, long)]
        path: std::path::PathBuf,
    },

    /// Mint a bearer token for a user id (local testing)
    Token {
        /// User UUID to put in the token subject
        user_id: Uuid,
    },
}

#[derive(Deserialize)]
struct CardSeedFile {
    cards: Vec<CardNode>,
}

#[derive(Deserialize)]
struct UserSeedFile {
    users: Vec<NewUser>,
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file
    dotenvy::dotenv().ok();

    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,circles=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let cli = Cli::parse();

    let mut config = Config::from_yaml_and_env(cli.config.as_deref())?;

    match cli.command {
        Commands::Serve { port } => {
            if let Some(port) = port {
                config.server_port = port;
            }
            circles::start_server(config).await
        }
        Commands::SeedCards { path } => seed_cards(config, &path).await,
        Commands::SeedUsers { path } => seed_users(config, &path).await,
        Commands::Token { user_id } => {
            let auth = config
                .auth_config
                .context("No auth section or JWT_SECRET configured")?;
            let token = encode_jwt(user_id, &auth.jwt_secret, auth.jwt_expiry_secs)?;
            println!("{}", token);
            Ok(())
        }
    }
}

async fn seed_cards(config: Config, path: &std::path::Path) -> Result<()> {
    tracing::info!("Seeding cards from {}", path.display());

    let contents = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read {}", path.display()))?;
    let seed: CardSeedFile = serde_yaml::from_str(&contents)
        .with_context(|| format!("Failed to parse {}", path.display()))?;

    let client = Neo4jClient::new(
        &config.neo4j_uri,
        &config.neo4j_user,
        &config.neo4j_password,
    )
    .await?;
    tracing::info!("Connected to Neo4j");

    for card in &seed.cards {
        client.create_card(card).await?;
    }

    tracing::info!("Seed complete: {} cards written", seed.cards.len());
    Ok(())
}

async fn seed_users(config: Config, path: &std::path::Path) -> Result<()> {
    tracing::info!("Seeding users from {}", path.display());

    let contents = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read {}", path.display()))?;
    let seed: UserSeedFile = serde_yaml::from_str(&contents)
        .with_context(|| format!("Failed to parse {}", path.display()))?;

    let client = Neo4jClient::new(
        &config.neo4j_uri,
        &config.neo4j_user,
        &config.neo4j_password,
    )
    .await?;
    let social = SocialService::new(Arc::new(client), Arc::new(NoopNotifier), config.social);

    for new in seed.users {
        let name = new.name.clone();
        let user = social
            .users()
            .register(new)
            .await
            .with_context(|| format!("Failed to register {}", name))?;
        println!("{}\t{}\t{}", user.id, user.id_code, user.name);
    }

    tracing::info!("Seed complete");
    Ok(())
}
