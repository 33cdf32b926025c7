//! Circles
//!
//! Social graph backend for a card-sharing community:
//! - Neo4j relationship graph for users, symmetric friendships and card ownership
//! - Friend and card-access request lifecycles with push notifications
//! - Two-hop cardholder search over the friendship graph
//! - HTTP API authenticated by HS256 bearer tokens

pub mod api;
pub mod auth;
pub mod neo4j;
pub mod notifications;
pub mod social;

#[cfg(test)]
pub(crate) mod test_helpers;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::net::SocketAddr;
use std::path::Path;
use std::sync::Arc;

// ============================================================================
// YAML config structs (deserialization targets)
// ============================================================================

/// Top-level YAML configuration file structure
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct YamlConfig {
    pub server: ServerYamlConfig,
    pub neo4j: Neo4jYamlConfig,
    /// Auth section; if absent, auth_config will be None (deny-by-default)
    pub auth: Option<AuthConfig>,
    pub notifications: NotificationsYamlConfig,
    pub social: SocialConfig,
}

/// Server configuration section
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ServerYamlConfig {
    pub port: u16,
}

impl Default for ServerYamlConfig {
    fn default() -> Self {
        Self { port: 8080 }
    }
}

/// Neo4j configuration section
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct Neo4jYamlConfig {
    pub uri: String,
    pub user: String,
    pub password: String,
}

impl Default for Neo4jYamlConfig {
    fn default() -> Self {
        Self {
            uri: "bolt://localhost:7687".into(),
            user: "neo4j".into(),
            password: "circles123".into(),
        }
    }
}

/// Push notification section
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct NotificationsYamlConfig {
    /// Push gateway endpoint; intents are only logged when unset
    pub push_gateway_url: Option<String>,
    pub queue_capacity: usize,
}

impl Default for NotificationsYamlConfig {
    fn default() -> Self {
        Self {
            push_gateway_url: None,
            queue_capacity: notifications::DEFAULT_QUEUE_CAPACITY,
        }
    }
}

/// Bearer token verification settings
#[derive(Debug, Clone, Deserialize)]
pub struct AuthConfig {
    /// JWT signing secret (HS256, minimum 32 characters)
    pub jwt_secret: String,
    /// Lifetime of tokens minted by `circles token` (default: 28800 = 8h)
    #[serde(default = "default_jwt_expiry")]
    pub jwt_expiry_secs: u64,
}

fn default_jwt_expiry() -> u64 {
    28800 // 8 hours
}

/// Request-engine policy knobs
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SocialConfig {
    /// Let a resolved request be answered the opposite way later
    pub allow_resolution_flip: bool,
    /// Friend cap applied on accept when the caller passes none
    pub default_friend_limit: Option<u32>,
}

impl Default for SocialConfig {
    fn default() -> Self {
        Self {
            allow_resolution_flip: true,
            default_friend_limit: None,
        }
    }
}

// ============================================================================
// Runtime config (what the application actually uses)
// ============================================================================

/// Application configuration
#[derive(Debug, Clone)]
pub struct Config {
    pub neo4j_uri: String,
    pub neo4j_user: String,
    pub neo4j_password: String,
    pub server_port: u16,
    /// Auth config; None means deny-by-default (no auth section in YAML)
    pub auth_config: Option<AuthConfig>,
    pub push_gateway_url: Option<String>,
    pub notification_queue_capacity: usize,
    pub social: SocialConfig,
}

impl Config {
    /// Equivalent to from_yaml_and_env(None).
    pub fn from_env() -> Result<Self> {
        Self::from_yaml_and_env(None)
    }

    /// Load configuration from an optional YAML file, then override with env vars.
    ///
    /// Priority: env var > YAML > default
    ///
    /// If `yaml_path` is None, tries "config.yaml" in CWD. A missing file
    /// falls back to env vars and defaults.
    pub fn from_yaml_and_env(yaml_path: Option<&Path>) -> Result<Self> {
        let yaml = Self::load_yaml(yaml_path);

        // JWT_SECRET alone is enough to enable auth
        let auth_config = match (std::env::var("JWT_SECRET").ok(), yaml.auth) {
            (Some(secret), Some(auth)) => Some(AuthConfig {
                jwt_secret: secret,
                ..auth
            }),
            (Some(secret), None) => Some(AuthConfig {
                jwt_secret: secret,
                jwt_expiry_secs: default_jwt_expiry(),
            }),
            (None, auth) => auth,
        };

        Ok(Self {
            neo4j_uri: std::env::var("NEO4J_URI").unwrap_or(yaml.neo4j.uri),
            neo4j_user: std::env::var("NEO4J_USER").unwrap_or(yaml.neo4j.user),
            neo4j_password: std::env::var("NEO4J_PASSWORD").unwrap_or(yaml.neo4j.password),
            server_port: std::env::var("SERVER_PORT")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(yaml.server.port),
            auth_config,
            push_gateway_url: std::env::var("PUSH_GATEWAY_URL")
                .ok()
                .filter(|s| !s.is_empty())
                .or(yaml.notifications.push_gateway_url),
            notification_queue_capacity: std::env::var("NOTIFICATION_QUEUE_CAPACITY")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(yaml.notifications.queue_capacity)
                .max(1),
            social: yaml.social,
        })
    }

    /// Try to load and parse a YAML config file. Returns defaults on any failure.
    fn load_yaml(yaml_path: Option<&Path>) -> YamlConfig {
        let default_path = Path::new("config.yaml");
        let path = yaml_path.unwrap_or(default_path);

        match std::fs::read_to_string(path) {
            Ok(contents) => match serde_yaml::from_str(&contents) {
                Ok(config) => {
                    tracing::info!("Loaded config from {}", path.display());
                    config
                }
                Err(e) => {
                    tracing::warn!("Failed to parse {}: {}. Using defaults.", path.display(), e);
                    YamlConfig::default()
                }
            },
            Err(_) => {
                tracing::debug!(
                    "No config file at {}, using env vars / defaults",
                    path.display()
                );
                YamlConfig::default()
            }
        }
    }
}

// ============================================================================
// Application state
// ============================================================================

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub social: Arc<social::SocialService>,
    pub config: Arc<Config>,
}

impl AppState {
    /// Connect to Neo4j and start the notification worker.
    ///
    /// Must be called inside a Tokio runtime.
    pub async fn new(config: Config) -> Result<Self> {
        let store = Arc::new(
            neo4j::Neo4jClient::new(
                &config.neo4j_uri,
                &config.neo4j_user,
                &config.neo4j_password,
            )
            .await?,
        );

        let transport: Arc<dyn notifications::PushTransport> = match &config.push_gateway_url {
            Some(url) => {
                let webhook = notifications::WebhookTransport::new(url)?;
                tracing::info!(url = webhook.url(), "Push gateway configured");
                Arc::new(webhook)
            }
            None => {
                tracing::warn!("No push gateway configured, notifications will only be logged");
                Arc::new(notifications::LogTransport)
            }
        };
        tracing::info!(transport = transport.name(), "Notification transport ready");

        let (queue, _worker) =
            notifications::NotificationQueue::spawn(transport, config.notification_queue_capacity);

        let social = Arc::new(social::SocialService::new(
            store,
            Arc::new(queue),
            config.social.clone(),
        ));

        Ok(Self {
            social,
            config: Arc::new(config),
        })
    }
}

/// Build the state, bind the listener and serve the API until Ctrl-C
pub async fn start_server(config: Config) -> Result<()> {
    let port = config.server_port;
    let state = AppState::new(config).await?;
    tracing::info!("Connected to Neo4j");

    if state.config.auth_config.is_none() {
        tracing::warn!("No auth section configured: every /api request will be rejected");
    }

    let app = api::create_router(Arc::new(api::handlers::ServerState::from(&state)));

    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind {}", addr))?;
    tracing::info!("Listening on http://{}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(async {
            let _ = tokio::signal::ctrl_c().await;
            tracing::info!("Shutdown signal received");
        })
        .await?;

    Ok(())
}

// ============================================================================
// Tests
// ============================================================================
