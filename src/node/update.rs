//! Node update reconciliation.

use std::collections::{BTreeMap, HashMap};

use crate::error::{ConfigError, UpdateError};
use crate::fleet::{FleetClient, Label};
use crate::labels::{build_labels, decode_labels, sanitize_label_value};
use crate::node::NodeKey;
use crate::node::resolver::find_node;

pub const LABEL_P2P_ID: &str = "p2p_id";
pub const LABEL_NOP: &str = "nop";
pub const LABEL_ADMIN_ADDR: &str = "admin_addr";
pub const LABEL_MULTI_ADDR: &str = "multi_addr";

/// Desired configuration of one node.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NodeSpec {
    pub name: String,
    pub public_key: String,
    pub p2p_id: String,
    pub admin_addr: String,
    /// Node operator.
    pub nop: String,
    pub multi_addr: Option<String>,
    /// Free-form tags. Values have whitespace replaced with underscores on
    /// the wire.
    pub tags: HashMap<String, String>,
}

impl NodeSpec {
    /// The full label set sent to the fleet service, sorted by key.
    ///
    /// Tags come first and the reserved keys are written over them, so a tag
    /// can never shadow `p2p_id`, `nop`, `admin_addr` or `multi_addr`.
    pub fn labels(&self) -> Vec<Label> {
        let mut pairs: BTreeMap<String, String> = self
            .tags
            .iter()
            .map(|(k, v)| (k.clone(), sanitize_label_value(v)))
            .collect();

        let mut reserved = vec![
            (LABEL_P2P_ID, &self.p2p_id),
            (LABEL_NOP, &self.nop),
            (LABEL_ADMIN_ADDR, &self.admin_addr),
        ];
        if let Some(ref multi_addr) = self.multi_addr {
            reserved.push((LABEL_MULTI_ADDR, multi_addr));
        }
        for (key, value) in reserved {
            if pairs.insert(key.to_string(), value.clone()).is_some() {
                tracing::warn!(node = %self.name, label = key, "Tag overridden by reserved node label");
            }
        }

        build_labels(&pairs)
    }
}

/// A desired node state paired with how to find the node it applies to.
/// The wire label set and the lookup value are derived once at construction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UpdateNodeRequest {
    spec: NodeSpec,
    key: NodeKey,
    labels: Vec<Label>,
    lookup_value: String,
}

impl UpdateNodeRequest {
    /// Fails for [`NodeKey::Id`]: identifiers are assigned by the fleet
    /// service and cannot be read from desired state.
    pub fn new(spec: NodeSpec, key: NodeKey) -> Result<Self, ConfigError> {
        let labels = spec.labels();
        let lookup_value = match &key {
            NodeKey::Id => return Err(ConfigError::IdentifierNotDerivable),
            NodeKey::PublicKey => spec.public_key.clone(),
            NodeKey::Name => spec.name.clone(),
            NodeKey::Label(name) => decode_labels(&labels)
                .remove(name.as_str())
                .ok_or_else(|| ConfigError::LabelNotDeclared(name.to_string()))?,
        };
        Ok(Self {
            spec,
            key,
            labels,
            lookup_value,
        })
    }

    pub fn spec(&self) -> &NodeSpec {
        &self.spec
    }

    pub fn key(&self) -> &NodeKey {
        &self.key
    }

    /// Labels sent with the update, as built from the spec.
    pub fn labels(&self) -> &[Label] {
        &self.labels
    }

    pub fn lookup_value(&self) -> &str {
        &self.lookup_value
    }
}

/// Apply `requests` in order against one snapshot of the fleet.
///
/// Stops at the first node that cannot be resolved or fails to update.
/// Updates issued before the failure are not rolled back.
pub async fn update_nodes(
    client: &dyn FleetClient,
    requests: &[UpdateNodeRequest],
) -> Result<(), UpdateError> {
    if requests.is_empty() {
        return Ok(());
    }

    let snapshot = client.list_nodes(None).await.map_err(UpdateError::ListNodes)?;
    tracing::debug!(nodes = snapshot.len(), requests = requests.len(), "Fetched fleet snapshot");

    for request in requests {
        let node = find_node(&snapshot, &request.key, &request.lookup_value)?;
        let spec = &request.spec;

        client
            .update_node(&node.id, &spec.name, &spec.public_key, &request.labels)
            .await
            .map_err(|e| UpdateError::UpdateFailed {
                node_id: node.id.clone(),
                name: spec.name.clone(),
                public_key: spec.public_key.clone(),
                source: e,
            })?;

        tracing::info!(node_id = %node.id, name = %spec.name, "Updated node");
    }

    Ok(())
}
