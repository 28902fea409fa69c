//! Dry-run wrapper: reads reach the fleet service, writes do not.

use async_trait::async_trait;
use uuid::Uuid;

use crate::error::FleetError;
use crate::fleet::{FleetClient, Keypair, Label, Node, NodeFilter, Proposal};

/// Wraps a client so mutating calls are logged and answered locally.
pub struct DryRunClient<C> {
    inner: C,
}

impl<C: FleetClient> DryRunClient<C> {
    pub fn new(inner: C) -> Self {
        Self { inner }
    }

    pub fn inner(&self) -> &C {
        &self.inner
    }
}

#[async_trait]
impl<C: FleetClient> FleetClient for DryRunClient<C> {
    async fn list_nodes(&self, filter: Option<&NodeFilter>) -> Result<Vec<Node>, FleetError> {
        self.inner.list_nodes(filter).await
    }

    async fn register_node(
        &self,
        name: &str,
        public_key: &str,
        labels: &[Label],
    ) -> Result<Node, FleetError> {
        tracing::info!(
            name = %name,
            public_key = %public_key,
            labels = labels.len(),
            "Dry run: skipping RegisterNode"
        );
        Ok(Node {
            id: format!("dry-run-{}", Uuid::new_v4()),
            public_key: public_key.to_string(),
            name: name.to_string(),
            labels: labels.to_vec(),
        })
    }

    async fn update_node(
        &self,
        id: &str,
        name: &str,
        public_key: &str,
        labels: &[Label],
    ) -> Result<(), FleetError> {
        tracing::info!(
            node_id = %id,
            name = %name,
            public_key = %public_key,
            labels = labels.len(),
            "Dry run: skipping UpdateNode"
        );
        Ok(())
    }

    async fn propose_job(
        &self,
        node_id: &str,
        spec: &str,
        labels: &[Label],
    ) -> Result<Proposal, FleetError> {
        tracing::info!(
            node_id = %node_id,
            spec_bytes = spec.len(),
            labels = labels.len(),
            "Dry run: skipping ProposeJob"
        );
        Ok(Proposal {
            id: format!("dry-run-{}", Uuid::new_v4()),
            node_id: node_id.to_string(),
            revision: 0,
        })
    }

    async fn list_keypairs(&self) -> Result<Vec<Keypair>, FleetError> {
        self.inner.list_keypairs().await
    }
}
