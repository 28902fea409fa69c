//! Error types for fleetlink.

use std::fmt;
use std::sync::Arc;

use crate::fleet::FleetClient;

/// Top-level error type.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Authentication error: {0}")]
    Auth(#[from] AuthError),

    #[error("Fleet service error: {0}")]
    Fleet(#[from] FleetError),

    #[error(transparent)]
    NotFound(#[from] NodeNotFound),

    #[error("Bootstrap error: {0}")]
    Bootstrap(#[from] BootstrapError),

    #[error("Job proposal error: {0}")]
    Job(#[from] JobError),

    #[error("Node update error: {0}")]
    Update(#[from] UpdateError),
}

/// Configuration and input-construction errors. Never retried internally.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    MissingEnvVar(String),

    #[error("Invalid value for {key}: {message}")]
    InvalidValue { key: String, message: String },

    #[error("both the streaming (wsrpc) and request/response (grpc) endpoints are required; got wsrpc={wsrpc:?}, grpc={grpc:?}")]
    MissingEndpoints {
        wsrpc: Option<String>,
        grpc: Option<String>,
    },

    #[error("auth configuration is present but no authenticator or token source was supplied")]
    MissingAuthenticator,

    #[error("incomplete auth configuration: {0} is not set")]
    IncompleteAuth(String),

    #[error("node key type 'label' requires a label name")]
    MissingLabelName,

    #[error("unknown node key type '{0}', expected one of: id, public_key, name, label")]
    UnknownNodeKey(String),

    #[error("node key type 'id' cannot be derived from desired node state; identifiers are assigned by the fleet service")]
    IdentifierNotDerivable,

    #[error("desired node state has no label '{0}' to derive a lookup value from")]
    LabelNotDeclared(String),
}

/// Failures reported by the authentication collaborator.
#[derive(Debug, Clone, thiserror::Error)]
pub enum AuthError {
    #[error("authentication failed for user '{username}': {reason}")]
    Failed { username: String, reason: String },

    #[error("token unavailable: {0}")]
    TokenUnavailable(String),
}

/// A failed fleet-service RPC (the RemoteCallError kind).
#[derive(Debug, Clone, thiserror::Error)]
pub enum FleetError {
    #[error("{operation} failed: {reason}")]
    RequestFailed { operation: String, reason: String },

    #[error("{operation} returned status {status}: {body}")]
    Status {
        operation: String,
        status: u16,
        body: String,
    },

    #[error("{operation} returned an invalid response: {reason}")]
    InvalidResponse { operation: String, reason: String },

    #[error("{operation} not authorized: {source}")]
    Unauthorized {
        operation: String,
        #[source]
        source: AuthError,
    },
}

impl FleetError {
    /// Name of the RPC that failed.
    pub fn operation(&self) -> &str {
        match self {
            Self::RequestFailed { operation, .. }
            | Self::Status { operation, .. }
            | Self::InvalidResponse { operation, .. }
            | Self::Unauthorized { operation, .. } => operation,
        }
    }
}

/// No node in a snapshot matched the lookup key.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("no node found with {key} = '{value}'")]
pub struct NodeNotFound {
    /// Rendered key type, e.g. `public_key` or `label(region)`.
    pub key: String,
    pub value: String,
}

/// Bootstrap failures.
#[derive(thiserror::Error)]
pub enum BootstrapError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Auth(#[from] AuthError),

    /// The provider could not build a client. Displays as the underlying
    /// error.
    #[error(transparent)]
    Initialize(FleetError),

    /// The client was built but the liveness probe failed. The handle is kept
    /// so the caller can retry the probe without bootstrapping again.
    #[error("fleet service liveness probe failed: {source}")]
    ProbeFailed {
        client: Arc<dyn FleetClient>,
        #[source]
        source: FleetError,
    },
}

impl BootstrapError {
    /// The partially-constructed client, if the failure happened after
    /// initialization.
    pub fn client(&self) -> Option<&Arc<dyn FleetClient>> {
        match self {
            Self::ProbeFailed { client, .. } => Some(client),
            _ => None,
        }
    }
}

impl fmt::Debug for BootstrapError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Config(e) => f.debug_tuple("Config").field(e).finish(),
            Self::Auth(e) => f.debug_tuple("Auth").field(e).finish(),
            Self::Initialize(e) => f.debug_tuple("Initialize").field(e).finish(),
            Self::ProbeFailed { source, .. } => f
                .debug_struct("ProbeFailed")
                .field("client", &"<fleet client>")
                .field("source", source)
                .finish(),
        }
    }
}

/// One node's failed proposal.
#[derive(Debug, Clone, thiserror::Error)]
#[error("failed to propose job to node {node_id}: {source}")]
pub struct ProposalFailure {
    pub node_id: String,
    #[source]
    pub source: FleetError,
}

/// Every proposal failure observed during one fan-out, in observation order.
#[derive(Debug, Clone, Default)]
pub struct ProposalErrors {
    failures: Vec<ProposalFailure>,
}

impl ProposalErrors {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, failure: ProposalFailure) {
        self.failures.push(failure);
    }

    pub fn is_empty(&self) -> bool {
        self.failures.is_empty()
    }

    pub fn len(&self) -> usize {
        self.failures.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = &ProposalFailure> {
        self.failures.iter()
    }

    /// `Ok(())` when nothing failed.
    pub fn into_result(self) -> Result<(), Self> {
        if self.is_empty() { Ok(()) } else { Err(self) }
    }
}

impl fmt::Display for ProposalErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, failure) in self.failures.iter().enumerate() {
            if i > 0 {
                writeln!(f)?;
            }
            write!(f, "{}", failure)?;
        }
        Ok(())
    }
}

impl std::error::Error for ProposalErrors {}

/// Job proposal fan-out errors.
#[derive(Debug, thiserror::Error)]
pub enum JobError {
    #[error("invalid job proposal: {0}")]
    Invalid(String),

    #[error("failed to list nodes for job proposal: {0}")]
    ListNodes(#[source] FleetError),

    #[error("{n} of the job proposals failed:\n{errs}", n = .0.len(), errs = .0)]
    Proposals(ProposalErrors),
}

/// Node reconciliation errors. Any of these aborts the remaining batch.
#[derive(Debug, thiserror::Error)]
pub enum UpdateError {
    #[error("failed to list nodes: {0}")]
    ListNodes(#[source] FleetError),

    #[error("failed to resolve node: {0}")]
    Unresolved(#[from] NodeNotFound),

    #[error("failed to update node {node_id} (name '{name}', public key '{public_key}'): {source}")]
    UpdateFailed {
        node_id: String,
        name: String,
        public_key: String,
        #[source]
        source: FleetError,
    },

    #[error("failed to register node '{name}' (public key '{public_key}'): {source}")]
    RegisterFailed {
        name: String,
        public_key: String,
        #[source]
        source: FleetError,
    },
}
