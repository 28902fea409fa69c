//! fleetlink: node and job reconciliation against a remote fleet service.
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────┐
//! │ bootstrap()  config ─▶ auth ─▶ provider ─▶ probe          │
//! │                  └────────────▶ Arc<dyn FleetClient>      │
//! │                                                          │
//! │ job::propose_job()     list(selectors) ─▶ propose × N     │
//! │                        best effort, failures aggregated  │
//! │                                                          │
//! │ node::update_nodes()   list ─▶ resolve ─▶ update, in order│
//! │                        stops at the first failure        │
//! └──────────────────────────────────────────────────────────┘
//! ```
//!
//! Nothing here retries or spawns tasks. Dropping an operation's future
//! (e.g. under `tokio::time::timeout`) cancels the in-flight call and every
//! call after it.

pub mod auth;
pub mod bootstrap;
pub mod config;
pub mod error;
pub mod fleet;
pub mod job;
pub mod labels;
pub mod node;

pub use bootstrap::{BootstrapOptions, Bootstrapped, bootstrap};
pub use config::{EndpointConfig, FleetConfig};
pub use error::Error;
pub use fleet::{FleetClient, FleetProvider, Node};
pub use job::{JobProposal, propose_job};
pub use node::{
    LabelName, NodeKey, NodeKeyKind, NodeSpec, UpdateNodeRequest, register_nodes, update_nodes,
};
