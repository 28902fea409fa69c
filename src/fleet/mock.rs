//! In-memory fleet client for unit tests.

use std::collections::HashSet;
use std::sync::Mutex;

use async_trait::async_trait;

use crate::error::FleetError;
use crate::fleet::{FleetClient, Keypair, Label, Node, NodeFilter, Proposal, SelectorOp};

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum Call {
    ListNodes(Option<NodeFilter>),
    RegisterNode {
        name: String,
        public_key: String,
        labels: Vec<Label>,
    },
    UpdateNode {
        id: String,
        name: String,
        public_key: String,
        labels: Vec<Label>,
    },
    ProposeJob {
        node_id: String,
        spec: String,
        labels: Vec<Label>,
    },
    ListKeypairs,
}

/// Serves a fixed node list, filters it like the fleet service does, and
/// records every call.
#[derive(Default)]
pub(crate) struct MockFleetClient {
    pub nodes: Vec<Node>,
    pub fail_list: bool,
    pub fail_keypairs: bool,
    pub fail_propose_for: HashSet<String>,
    pub fail_update_for: HashSet<String>,
    pub fail_register_for: HashSet<String>,
    pub calls: Mutex<Vec<Call>>,
}

impl MockFleetClient {
    pub fn with_nodes(nodes: Vec<Node>) -> Self {
        Self {
            nodes,
            ..Self::default()
        }
    }

    pub fn calls(&self) -> Vec<Call> {
        self.calls.lock().unwrap().clone()
    }

    pub fn count(&self, pred: impl Fn(&Call) -> bool) -> usize {
        self.calls.lock().unwrap().iter().filter(|c| pred(c)).count()
    }

    fn record(&self, call: Call) {
        self.calls.lock().unwrap().push(call);
    }
}

fn unavailable(operation: &str) -> FleetError {
    FleetError::RequestFailed {
        operation: operation.to_string(),
        reason: "unavailable".to_string(),
    }
}

/// Equality on node labels, as the fleet service filters listings.
pub(crate) fn filter_matches(filter: &NodeFilter, node: &Node) -> bool {
    filter.selectors.iter().all(|s| match s.op {
        SelectorOp::Eq => node.label(&s.key).is_some_and(|l| l.value == s.value),
    })
}

pub(crate) fn node(id: &str, public_key: &str, name: &str, labels: Vec<Label>) -> Node {
    Node {
        id: id.to_string(),
        public_key: public_key.to_string(),
        name: name.to_string(),
        labels,
    }
}

#[async_trait]
impl FleetClient for MockFleetClient {
    async fn list_nodes(&self, filter: Option<&NodeFilter>) -> Result<Vec<Node>, FleetError> {
        self.record(Call::ListNodes(filter.cloned()));
        if self.fail_list {
            return Err(unavailable("ListNodes"));
        }
        Ok(self
            .nodes
            .iter()
            .filter(|n| filter.is_none_or(|f| filter_matches(f, n)))
            .cloned()
            .collect())
    }

    async fn register_node(
        &self,
        name: &str,
        public_key: &str,
        labels: &[Label],
    ) -> Result<Node, FleetError> {
        self.record(Call::RegisterNode {
            name: name.to_string(),
            public_key: public_key.to_string(),
            labels: labels.to_vec(),
        });
        if self.fail_register_for.contains(public_key) {
            return Err(unavailable("RegisterNode"));
        }
        Ok(node(&format!("new-{}", public_key), public_key, name, labels.to_vec()))
    }

    async fn update_node(
        &self,
        id: &str,
        name: &str,
        public_key: &str,
        labels: &[Label],
    ) -> Result<(), FleetError> {
        self.record(Call::UpdateNode {
            id: id.to_string(),
            name: name.to_string(),
            public_key: public_key.to_string(),
            labels: labels.to_vec(),
        });
        if self.fail_update_for.contains(id) {
            return Err(unavailable("UpdateNode"));
        }
        Ok(())
    }

    async fn propose_job(
        &self,
        node_id: &str,
        spec: &str,
        labels: &[Label],
    ) -> Result<Proposal, FleetError> {
        self.record(Call::ProposeJob {
            node_id: node_id.to_string(),
            spec: spec.to_string(),
            labels: labels.to_vec(),
        });
        if self.fail_propose_for.contains(node_id) {
            return Err(unavailable("ProposeJob"));
        }
        Ok(Proposal {
            id: format!("proposal-{}", node_id),
            node_id: node_id.to_string(),
            revision: 1,
        })
    }

    async fn list_keypairs(&self) -> Result<Vec<Keypair>, FleetError> {
        self.record(Call::ListKeypairs);
        if self.fail_keypairs {
            return Err(unavailable("ListKeypairs"));
        }
        Ok(vec![Keypair {
            id: "csa-1".to_string(),
            public_key: "csa-pub".to_string(),
        }])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fleet::Selector;

    #[test]
    fn test_filter_matches_label_values() {
        let n = node("1", "k1", "n1", vec![Label::new("product", "keystone"), Label::key_only("drain")]);
        let filter = |selectors| NodeFilter { selectors };

        assert!(filter_matches(&filter(vec![]), &n));
        assert!(filter_matches(&filter(vec![Selector::equals("product", "keystone")]), &n));
        assert!(!filter_matches(&filter(vec![Selector::equals("product", "feeds")]), &n));
        assert!(!filter_matches(&filter(vec![Selector::equals("environment", "testnet")]), &n));
        assert!(!filter_matches(&filter(vec![Selector::equals("drain", "")]), &n));
    }
}
