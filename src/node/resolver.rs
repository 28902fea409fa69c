//! Find a node in a fleet snapshot.

use crate::error::NodeNotFound;
use crate::fleet::Node;
use crate::node::NodeKey;

/// Return the first node in `snapshot` whose `key` field equals `value`.
///
/// Label lookups match only nodes carrying the named label with exactly
/// `value`; a node with the label but a different (or no) value is skipped.
pub fn find_node<'a>(
    snapshot: &'a [Node],
    key: &NodeKey,
    value: &str,
) -> Result<&'a Node, NodeNotFound> {
    snapshot
        .iter()
        .find(|node| matches(node, key, value))
        .ok_or_else(|| NodeNotFound {
            key: key.to_string(),
            value: value.to_string(),
        })
}

fn matches(node: &Node, key: &NodeKey, value: &str) -> bool {
    match key {
        NodeKey::Id => node.id == value,
        NodeKey::PublicKey => node.public_key == value,
        NodeKey::Name => node.name == value,
        NodeKey::Label(name) => node
            .labels
            .iter()
            .any(|l| l.key == name.as_str() && l.value.as_deref() == Some(value)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fleet::Label;

    fn snapshot() -> Vec<Node> {
        vec![
            Node {
                id: "1".to_string(),
                public_key: "k1".to_string(),
                name: "n1".to_string(),
                labels: vec![Label::new("region", "us")],
            },
            Node {
                id: "2".to_string(),
                public_key: "k2".to_string(),
                name: "n2".to_string(),
                labels: vec![Label::new("region", "eu")],
            },
        ]
    }

    #[test]
    fn test_find_by_every_field() {
        let nodes = snapshot();
        for node in &nodes {
            assert_eq!(find_node(&nodes, &NodeKey::Id, &node.id).unwrap(), node);
            assert_eq!(find_node(&nodes, &NodeKey::PublicKey, &node.public_key).unwrap(), node);
            assert_eq!(find_node(&nodes, &NodeKey::Name, &node.name).unwrap(), node);
        }
    }

    #[test]
    fn test_find_by_label() {
        let nodes = snapshot();
        let region = NodeKey::label("region").unwrap();
        assert_eq!(find_node(&nodes, &region, "eu").unwrap().id, "2");
    }

    #[test]
    fn test_label_not_found_names_key_and_value() {
        let nodes = snapshot();
        let err = find_node(&nodes, &NodeKey::label("region").unwrap(), "ap").unwrap_err();
        assert_eq!(err.key, "label(region)");
        assert_eq!(err.value, "ap");
        let msg = err.to_string();
        assert!(msg.contains("region"), "got: {}", msg);
        assert!(msg.contains("ap"), "got: {}", msg);
    }

    #[test]
    fn test_value_is_not_matched_across_fields() {
        let nodes = snapshot();
        // "k1" is a public key, not a name.
        assert!(find_node(&nodes, &NodeKey::Name, "k1").is_err());
        assert!(find_node(&nodes, &NodeKey::Id, "n1").is_err());
    }

    #[test]
    fn test_label_without_value_does_not_match() {
        let nodes = vec![Node {
            id: "3".to_string(),
            public_key: "k3".to_string(),
            name: "n3".to_string(),
            labels: vec![Label::key_only("region")],
        }];
        assert!(find_node(&nodes, &NodeKey::label("region").unwrap(), "").is_err());
    }

    #[test]
    fn test_first_match_wins() {
        let mut nodes = snapshot();
        nodes.push(Node {
            id: "3".to_string(),
            public_key: "k3".to_string(),
            name: "n1".to_string(),
            labels: vec![],
        });
        assert_eq!(find_node(&nodes, &NodeKey::Name, "n1").unwrap().id, "1");
    }

    #[test]
    fn test_empty_snapshot() {
        assert!(find_node(&[], &NodeKey::PublicKey, "k1").is_err());
    }
}
