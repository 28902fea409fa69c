//! Idempotent node registration.

use crate::error::UpdateError;
use crate::fleet::{FleetClient, Node};
use crate::node::update::NodeSpec;

/// Register each desired node that the fleet does not already know by public
/// key. Returns the registered or pre-existing node for every spec, in order.
///
/// One snapshot is fetched for the batch; the first registration failure
/// aborts the rest.
pub async fn register_nodes(
    client: &dyn FleetClient,
    specs: &[NodeSpec],
) -> Result<Vec<Node>, UpdateError> {
    if specs.is_empty() {
        return Ok(Vec::new());
    }

    let snapshot = client.list_nodes(None).await.map_err(UpdateError::ListNodes)?;
    let mut nodes = Vec::with_capacity(specs.len());

    for spec in specs {
        if let Some(existing) = snapshot.iter().find(|n| n.public_key == spec.public_key) {
            tracing::debug!(
                node_id = %existing.id,
                public_key = %spec.public_key,
                "Node already registered, skipping"
            );
            nodes.push(existing.clone());
            continue;
        }

        let node = client
            .register_node(&spec.name, &spec.public_key, &spec.labels())
            .await
            .map_err(|e| UpdateError::RegisterFailed {
                name: spec.name.clone(),
                public_key: spec.public_key.clone(),
                source: e,
            })?;

        tracing::info!(node_id = %node.id, name = %spec.name, "Registered node");
        nodes.push(node);
    }

    Ok(nodes)
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;
    use crate::fleet::mock::{Call, MockFleetClient, node};

    fn spec(name: &str, public_key: &str) -> NodeSpec {
        NodeSpec {
            name: name.to_string(),
            public_key: public_key.to_string(),
            p2p_id: format!("p2p_{}", name),
            admin_addr: "0xadmin".to_string(),
            nop: "acme".to_string(),
            multi_addr: None,
            tags: HashMap::new(),
        }
    }

    #[tokio::test]
    async fn test_registers_only_unknown_nodes() {
        let client = MockFleetClient::with_nodes(vec![node("1", "k1", "n1", vec![])]);
        let nodes = register_nodes(&client, &[spec("n1", "k1"), spec("n2", "k2")])
            .await
            .unwrap();

        assert_eq!(nodes.len(), 2);
        assert_eq!(nodes[0].id, "1");
        assert_eq!(nodes[1].id, "new-k2");

        let registered: Vec<Call> = client
            .calls()
            .into_iter()
            .filter(|c| matches!(c, Call::RegisterNode { .. }))
            .collect();
        assert_eq!(
            registered,
            vec![Call::RegisterNode {
                name: "n2".to_string(),
                public_key: "k2".to_string(),
                labels: spec("n2", "k2").labels(),
            }]
        );
    }

    #[tokio::test]
    async fn test_registration_failure_aborts() {
        let mut client = MockFleetClient::default();
        client.fail_register_for.insert("k1".to_string());

        let err = register_nodes(&client, &[spec("n1", "k1"), spec("n2", "k2")])
            .await
            .unwrap_err();
        assert!(matches!(err, UpdateError::RegisterFailed { ref public_key, .. } if public_key == "k1"));
        assert_eq!(client.count(|c| matches!(c, Call::RegisterNode { .. })), 1);
    }

    #[tokio::test]
    async fn test_empty_registration_makes_no_calls() {
        let client = MockFleetClient::default();
        assert!(register_nodes(&client, &[]).await.unwrap().is_empty());
        assert!(client.calls().is_empty());
    }
}
