//! Node identity resolution and reconciliation.
//!
//! A [`NodeKey`] says how a node is found in a fleet snapshot. Both
//! [`update_nodes`] and [`register_nodes`] fetch exactly one snapshot per
//! batch and stop at the first failure; requests already sent stay applied.

pub mod register;
pub mod resolver;
pub mod update;

pub use register::register_nodes;
pub use resolver::find_node;
pub use update::{NodeSpec, UpdateNodeRequest, update_nodes};

use std::fmt;
use std::str::FromStr;

use crate::error::ConfigError;

/// Which field identifies a node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NodeKeyKind {
    Id,
    PublicKey,
    Name,
    Label,
}

impl NodeKeyKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Id => "id",
            Self::PublicKey => "public_key",
            Self::Name => "name",
            Self::Label => "label",
        }
    }
}

impl FromStr for NodeKeyKind {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "id" | "identifier" => Ok(Self::Id),
            "public_key" | "publickey" | "csa_key" => Ok(Self::PublicKey),
            "name" | "display_name" => Ok(Self::Name),
            "label" => Ok(Self::Label),
            _ => Err(ConfigError::UnknownNodeKey(s.to_string())),
        }
    }
}

impl fmt::Display for NodeKeyKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Name of the label a [`NodeKey::Label`] lookup matches on. Never empty.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct LabelName(String);

impl LabelName {
    /// Trims `name`; fails with [`ConfigError::MissingLabelName`] if nothing
    /// is left.
    pub fn new(name: impl Into<String>) -> Result<Self, ConfigError> {
        let name = name.into();
        let trimmed = name.trim();
        if trimmed.is_empty() {
            return Err(ConfigError::MissingLabelName);
        }
        Ok(Self(trimmed.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for LabelName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// How to find a node. Only the label strategy carries a payload, and
/// [`LabelName`] cannot be empty, so a label lookup without a label name
/// cannot be constructed.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum NodeKey {
    Id,
    PublicKey,
    Name,
    Label(LabelName),
}

impl NodeKey {
    /// Shorthand for `NodeKey::Label(LabelName::new(name)?)`.
    pub fn label(name: impl Into<String>) -> Result<Self, ConfigError> {
        LabelName::new(name).map(Self::Label)
    }

    /// Build from a kind and an optional label name, as read from config.
    /// The label name is ignored for non-label kinds.
    pub fn from_parts(kind: NodeKeyKind, label: Option<&str>) -> Result<Self, ConfigError> {
        match kind {
            NodeKeyKind::Id => Ok(Self::Id),
            NodeKeyKind::PublicKey => Ok(Self::PublicKey),
            NodeKeyKind::Name => Ok(Self::Name),
            NodeKeyKind::Label => label
                .ok_or(ConfigError::MissingLabelName)
                .and_then(LabelName::new)
                .map(Self::Label),
        }
    }

    pub fn kind(&self) -> NodeKeyKind {
        match self {
            Self::Id => NodeKeyKind::Id,
            Self::PublicKey => NodeKeyKind::PublicKey,
            Self::Name => NodeKeyKind::Name,
            Self::Label(_) => NodeKeyKind::Label,
        }
    }
}

impl fmt::Display for NodeKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Label(name) => write!(f, "label({})", name),
            other => write!(f, "{}", other.kind()),
        }
    }
}
