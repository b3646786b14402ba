use std::env;
use std::path::PathBuf;

use iroh::NodeId;
use url::Url;

use common::crypto::SecretKey;

/// Portal used when neither `--portal` nor `PORTAL_URL` is given
pub const PORTAL_URL_DEFAULT: &str = "https://s5.ninja";

/// Errors for malformed or missing configuration input
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("PORTAL_PRIVATE_KEY is required")]
    MissingPortalKey,
    #[error("PORTAL_PRIVATE_KEY must be a 64-character hex string")]
    MalformedPortalKey,
    #[error("no directory to publish; pass --dir or set DIR")]
    MissingDir,
    #[error("parallel uploads must be a positive integer, got {0:?}")]
    InvalidParallelism(String),
    #[error("invalid portal url: {0}")]
    InvalidPortalUrl(#[from] url::ParseError),
    #[error("invalid bootstrap node id: {0:?}")]
    InvalidBootstrapPeer(String),
    #[error("{0}")]
    InvalidSeed(#[from] common::crypto::SeedError),
    #[error("error page must be CODE=PATH, got {0:?}")]
    InvalidErrorPage(String),
}

/// Raw configuration read from the environment at startup.
///
/// Values stay unparsed here; ops validate whichever ones they use after
/// applying flag precedence. Empty variables count as unset.
#[derive(Debug, Clone, Default)]
pub struct EnvConfig {
    pub portal_private_key: Option<String>,
    pub dir: Option<PathBuf>,
    pub parallel_uploads: Option<String>,
    pub app_seed: Option<String>,
    pub portal_url: Option<String>,
    pub bootstrap: Option<String>,
}

impl EnvConfig {
    pub fn load() -> Self {
        Self {
            portal_private_key: non_empty_var("PORTAL_PRIVATE_KEY"),
            dir: non_empty_var("DIR").map(PathBuf::from),
            parallel_uploads: non_empty_var("PARALLEL_UPLOADS"),
            app_seed: non_empty_var("APP_SEED"),
            portal_url: non_empty_var("PORTAL_URL"),
            bootstrap: non_empty_var("APP_BOOTSTRAP"),
        }
    }
}

fn non_empty_var(name: &str) -> Option<String> {
    env::var(name).ok().filter(|value| !value.is_empty())
}

/// Validate the portal private key: exactly 64 hex characters.
pub fn portal_key(raw: Option<&str>) -> Result<SecretKey, ConfigError> {
    let raw = raw.ok_or(ConfigError::MissingPortalKey)?;
    if raw.len() != 64 {
        return Err(ConfigError::MalformedPortalKey);
    }
    SecretKey::from_hex(raw).map_err(|_| ConfigError::MalformedPortalKey)
}

pub fn portal_url(raw: Option<&str>) -> Result<Url, ConfigError> {
    Ok(Url::parse(raw.unwrap_or(PORTAL_URL_DEFAULT))?)
}

pub fn parse_parallelism(raw: &str) -> Result<usize, ConfigError> {
    match raw.parse::<usize>() {
        Ok(n) if n >= 1 => Ok(n),
        _ => Err(ConfigError::InvalidParallelism(raw.to_string())),
    }
}

/// Parse a `CODE=PATH` error page mapping.
pub fn parse_error_page(raw: &str) -> Result<(String, String), ConfigError> {
    match raw.split_once('=') {
        Some((code, path)) if !code.is_empty() && !path.is_empty() => {
            Ok((code.to_string(), path.to_string()))
        }
        _ => Err(ConfigError::InvalidErrorPage(raw.to_string())),
    }
}

/// Resolve the bootstrap peer list: flags win, otherwise the environment's
/// comma-separated list. Node ids parse as z-base32 or hex.
pub fn resolve_bootstrap(flags: &[String], env: Option<&str>) -> Result<Vec<NodeId>, ConfigError> {
    let raw: Vec<String> = if !flags.is_empty() {
        flags.to_vec()
    } else {
        env.map(|value| {
            value
                .split(',')
                .map(|part| part.trim().to_string())
                .filter(|part| !part.is_empty())
                .collect()
        })
        .unwrap_or_default()
    };

    raw.iter().map(|id| parse_node_id(id)).collect()
}

fn parse_node_id(raw: &str) -> Result<NodeId, ConfigError> {
    if let Ok(node_id) = raw.parse::<NodeId>() {
        return Ok(node_id);
    }
    common::crypto::PublicKey::from_hex(raw)
        .map(|key| *key)
        .map_err(|_| ConfigError::InvalidBootstrapPeer(raw.to_string()))
}
