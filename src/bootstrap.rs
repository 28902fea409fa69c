//! Fleet client bootstrap.
//!
//! ```text
//!  defaults ─▶ overrides ─▶ endpoint check ─┬─▶ Skipped (exempt domain)
//!                                           └─▶ authenticate ─▶ initialize ─▶ probe ─▶ Ready
//! ```
//!
//! Every step is attempted once. Failures go straight back to the caller.

use std::sync::Arc;

use tracing::Instrument;

use crate::auth::{Authenticator, TokenSource};
use crate::config::FleetConfig;
use crate::error::{BootstrapError, ConfigError};
use crate::fleet::{
    DryRunClient, FleetClient, FleetProvider, HttpFleetProvider, TransportCredentials,
};

/// Domain allowed to run without a configured endpoint pair while it
/// migrates onto the fleet service.
pub const ENDPOINT_EXEMPT_DOMAIN: &str = "data-streams";

/// Overrides applied on top of the bootstrap defaults.
pub struct BootstrapOptions {
    pub dry_run: bool,
    /// Span every bootstrap event is recorded under.
    pub span: tracing::Span,
    pub transport: TransportCredentials,
    pub authenticator: Option<Arc<dyn Authenticator>>,
    /// Pre-built token source. Takes precedence over `authenticator`.
    pub token_source: Option<Arc<dyn TokenSource>>,
    /// Replaces the HTTP provider. Intended for tests.
    pub provider: Option<Arc<dyn FleetProvider>>,
}

impl Default for BootstrapOptions {
    fn default() -> Self {
        Self {
            dry_run: false,
            span: tracing::info_span!("fleet"),
            transport: TransportCredentials::default(),
            authenticator: None,
            token_source: None,
            provider: None,
        }
    }
}

impl BootstrapOptions {
    pub fn with_dry_run(mut self, dry_run: bool) -> Self {
        self.dry_run = dry_run;
        self
    }

    pub fn with_span(mut self, span: tracing::Span) -> Self {
        self.span = span;
        self
    }

    pub fn with_transport(mut self, transport: TransportCredentials) -> Self {
        self.transport = transport;
        self
    }

    pub fn with_authenticator(mut self, authenticator: Arc<dyn Authenticator>) -> Self {
        self.authenticator = Some(authenticator);
        self
    }

    pub fn with_token_source(mut self, token_source: Arc<dyn TokenSource>) -> Self {
        self.token_source = Some(token_source);
        self
    }

    pub fn with_provider(mut self, provider: Arc<dyn FleetProvider>) -> Self {
        self.provider = Some(provider);
        self
    }
}

/// Successful bootstrap outcome.
pub enum Bootstrapped {
    /// Client initialized and the liveness probe succeeded.
    Ready(Arc<dyn FleetClient>),
    /// No client: the domain is exempt and its endpoints are not configured.
    Skipped,
}

impl Bootstrapped {
    pub fn client(&self) -> Option<&Arc<dyn FleetClient>> {
        match self {
            Self::Ready(client) => Some(client),
            Self::Skipped => None,
        }
    }

    pub fn into_client(self) -> Option<Arc<dyn FleetClient>> {
        match self {
            Self::Ready(client) => Some(client),
            Self::Skipped => None,
        }
    }
}

impl std::fmt::Debug for Bootstrapped {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Ready(_) => write!(f, "Ready(<fleet client>)"),
            Self::Skipped => write!(f, "Skipped"),
        }
    }
}

/// Build, authenticate and probe a fleet client for `config`.
///
/// `config.dry_run` or `options.dry_run` enables dry-run, which applies to
/// injected providers as well as the HTTP one. A failed probe
/// returns [`BootstrapError::ProbeFailed`], which still carries the client.
pub async fn bootstrap(
    config: &FleetConfig,
    options: BootstrapOptions,
) -> Result<Bootstrapped, BootstrapError> {
    let span = options.span.clone();
    bootstrap_inner(config, options).instrument(span).await
}

async fn bootstrap_inner(
    config: &FleetConfig,
    options: BootstrapOptions,
) -> Result<Bootstrapped, BootstrapError> {
    let Some((_, grpc)) = config.endpoints.pair() else {
        if config.domain == ENDPOINT_EXEMPT_DOMAIN {
            tracing::warn!(
                domain = %config.domain,
                "Fleet endpoints not configured, continuing without a fleet client"
            );
            return Ok(Bootstrapped::Skipped);
        }
        return Err(ConfigError::MissingEndpoints {
            wsrpc: config.endpoints.wsrpc.clone(),
            grpc: config.endpoints.grpc.clone(),
        }
        .into());
    };

    let token_source = resolve_token_source(config, &options)?;
    if let Some(ref source) = token_source {
        source.authenticate().await?;
        tracing::debug!("Authenticated with fleet identity provider");
    }

    let dry_run = options.dry_run || config.dry_run;
    let provider: Arc<dyn FleetProvider> = match options.provider {
        Some(provider) => provider,
        None => Arc::new(HttpFleetProvider::new(grpc, options.transport, token_source)),
    };

    let client = provider
        .initialize()
        .await
        .map_err(BootstrapError::Initialize)?;
    let client: Arc<dyn FleetClient> = if dry_run {
        Arc::new(DryRunClient::new(client))
    } else {
        client
    };

    match client.list_keypairs().await {
        Ok(keypairs) => {
            tracing::info!(
                domain = %config.domain,
                dry_run,
                keypairs = keypairs.len(),
                "Connected to fleet service"
            );
            Ok(Bootstrapped::Ready(client))
        }
        Err(e) => {
            tracing::warn!(error = %e, "Fleet service liveness probe failed");
            Err(BootstrapError::ProbeFailed { client, source: e })
        }
    }
}

fn resolve_token_source(
    config: &FleetConfig,
    options: &BootstrapOptions,
) -> Result<Option<Arc<dyn TokenSource>>, BootstrapError> {
    if let Some(ref source) = options.token_source {
        return Ok(Some(Arc::clone(source)));
    }
    let Some(ref auth) = config.auth else {
        return Ok(None);
    };
    let authenticator = options
        .authenticator
        .as_ref()
        .ok_or(ConfigError::MissingAuthenticator)?;
    Ok(Some(authenticator.token_source(auth)?))
}
