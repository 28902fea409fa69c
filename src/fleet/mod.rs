//! Fleet service client surface.
//!
//! The fleet service owns node and job-proposal state; this crate only calls
//! it. [`FleetClient`] is the RPC seam, [`FleetProvider`] builds a live
//! client from transport settings.
//!
//! ```text
//!  FleetProvider::initialize()
//!      └─▶ Arc<dyn FleetClient>
//!            ├─ HttpFleetClient      (JSON over HTTPS, bearer auth)
//!            └─ DryRunClient<C>      (reads pass through, writes suppressed)
//! ```

pub mod dry_run;
pub mod http;
#[cfg(test)]
pub(crate) mod mock;

pub use dry_run::DryRunClient;
pub use http::{HttpFleetClient, HttpFleetProvider, TlsVersion, TransportCredentials};

use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::FleetError;
pub use crate::labels::Label;

/// A worker node as the fleet service reports it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Node {
    /// Fleet-assigned identifier.
    pub id: String,
    /// Stable identity key of the node.
    pub public_key: String,
    /// Display name. Mutable.
    pub name: String,
    #[serde(default)]
    pub labels: Vec<Label>,
}

impl Node {
    /// The label with the given key, if present.
    pub fn label(&self, key: &str) -> Option<&Label> {
        self.labels.iter().find(|l| l.key == key)
    }
}

/// Comparison performed by a [`Selector`]. Only equality is sent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SelectorOp {
    Eq,
}

/// A server-side filter term sent with a listing request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Selector {
    pub key: String,
    pub op: SelectorOp,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<String>,
}

impl Selector {
    pub fn equals(key: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            op: SelectorOp::Eq,
            value: Some(value.into()),
        }
    }
}

/// Node listing filter, applied by the fleet service. An empty filter lists
/// the whole fleet.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NodeFilter {
    pub selectors: Vec<Selector>,
}

/// A job proposed to one node.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Proposal {
    pub id: String,
    pub node_id: String,
    #[serde(default)]
    pub revision: u64,
}

/// A signing keypair held by the fleet service.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Keypair {
    pub id: String,
    pub public_key: String,
}

/// RPC interface of the fleet service.
#[async_trait]
pub trait FleetClient: Send + Sync {
    /// List nodes, filtered server-side when `filter` is given.
    async fn list_nodes(&self, filter: Option<&NodeFilter>) -> Result<Vec<Node>, FleetError>;

    async fn register_node(
        &self,
        name: &str,
        public_key: &str,
        labels: &[Label],
    ) -> Result<Node, FleetError>;

    async fn update_node(
        &self,
        id: &str,
        name: &str,
        public_key: &str,
        labels: &[Label],
    ) -> Result<(), FleetError>;

    async fn propose_job(
        &self,
        node_id: &str,
        spec: &str,
        labels: &[Label],
    ) -> Result<Proposal, FleetError>;

    async fn list_keypairs(&self) -> Result<Vec<Keypair>, FleetError>;
}

#[async_trait]
impl<T: FleetClient + ?Sized> FleetClient for Arc<T> {
    async fn list_nodes(&self, filter: Option<&NodeFilter>) -> Result<Vec<Node>, FleetError> {
        (**self).list_nodes(filter).await
    }

    async fn register_node(
        &self,
        name: &str,
        public_key: &str,
        labels: &[Label],
    ) -> Result<Node, FleetError> {
        (**self).register_node(name, public_key, labels).await
    }

    async fn update_node(
        &self,
        id: &str,
        name: &str,
        public_key: &str,
        labels: &[Label],
    ) -> Result<(), FleetError> {
        (**self).update_node(id, name, public_key, labels).await
    }

    async fn propose_job(
        &self,
        node_id: &str,
        spec: &str,
        labels: &[Label],
    ) -> Result<Proposal, FleetError> {
        (**self).propose_job(node_id, spec, labels).await
    }

    async fn list_keypairs(&self) -> Result<Vec<Keypair>, FleetError> {
        (**self).list_keypairs().await
    }
}

/// Produces a live [`FleetClient`].
#[async_trait]
pub trait FleetProvider: Send + Sync {
    async fn initialize(&self) -> Result<Arc<dyn FleetClient>, FleetError>;
}
