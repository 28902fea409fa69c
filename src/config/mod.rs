//! Configuration for fleetlink.
//!
//! Settings come from environment variables, with `./.env` loaded through
//! dotenvy first (it never overwrites variables that are already set).
//! `resolve_with` takes an explicit lookup so callers and tests can supply
//! values without touching the process environment.

pub(crate) mod helpers;

use secrecy::SecretString;

use crate::auth::AuthConfig;
use crate::config::helpers::{optional_env, parse_bool_env, required_env};
use crate::error::ConfigError;

/// Address pair of the fleet service.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EndpointConfig {
    /// Streaming/bidirectional address nodes connect to.
    pub wsrpc: Option<String>,
    /// Request/response address this client calls.
    pub grpc: Option<String>,
}

impl EndpointConfig {
    pub fn new(wsrpc: impl Into<String>, grpc: impl Into<String>) -> Self {
        Self {
            wsrpc: Some(wsrpc.into()),
            grpc: Some(grpc.into()),
        }
    }

    /// Both addresses, or `None` if either is missing.
    pub fn pair(&self) -> Option<(&str, &str)> {
        match (self.wsrpc.as_deref(), self.grpc.as_deref()) {
            (Some(wsrpc), Some(grpc)) if !wsrpc.is_empty() && !grpc.is_empty() => {
                Some((wsrpc, grpc))
            }
            _ => None,
        }
    }
}

/// Fleet client configuration.
#[derive(Debug, Clone)]
pub struct FleetConfig {
    /// Deployment domain, e.g. "keystone". Doubles as the `product` selector.
    pub domain: String,
    /// Environment name. [`crate::job::JobProposal::for_config`] uses it as
    /// the `environment` selector.
    pub environment: Option<String>,
    pub endpoints: EndpointConfig,
    pub auth: Option<AuthConfig>,
    pub dry_run: bool,
}

impl FleetConfig {
    pub fn new(domain: impl Into<String>, endpoints: EndpointConfig) -> Self {
        Self {
            domain: domain.into(),
            environment: None,
            endpoints,
            auth: None,
            dry_run: false,
        }
    }

    /// Load from the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        let _ = dotenvy::dotenv();
        Self::resolve_with(|key| std::env::var(key).ok())
    }

    /// Load using `lookup` for each variable name.
    pub fn resolve_with<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        Ok(Self {
            domain: required_env(&lookup, "FLEET_DOMAIN")?,
            environment: optional_env(&lookup, "FLEET_ENVIRONMENT")?,
            endpoints: EndpointConfig {
                wsrpc: optional_env(&lookup, "FLEET_WSRPC_URL")?,
                grpc: optional_env(&lookup, "FLEET_GRPC_URL")?,
            },
            auth: resolve_auth(&lookup)?,
            dry_run: parse_bool_env(&lookup, "FLEET_DRY_RUN", false)?,
        })
    }
}

const AUTH_VARS: [&str; 5] = [
    "FLEET_AUTH_CLIENT_ID",
    "FLEET_AUTH_CLIENT_SECRET",
    "FLEET_AUTH_USERNAME",
    "FLEET_AUTH_PASSWORD",
    "FLEET_AUTH_REGION",
];

/// The auth block is all-or-nothing.
fn resolve_auth<F>(lookup: &F) -> Result<Option<AuthConfig>, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    let mut values = Vec::with_capacity(AUTH_VARS.len());
    for key in AUTH_VARS {
        values.push(optional_env(lookup, key)?);
    }
    if values.iter().all(Option::is_none) {
        return Ok(None);
    }
    if let Some(pos) = values.iter().position(Option::is_none) {
        return Err(ConfigError::IncompleteAuth(AUTH_VARS[pos].to_string()));
    }

    let mut values = values.into_iter().flatten();
    let mut next = || values.next().unwrap_or_default();
    Ok(Some(AuthConfig {
        app_client_id: next(),
        app_client_secret: SecretString::from(next()),
        username: next(),
        password: SecretString::from(next()),
        region: next(),
    }))
}
