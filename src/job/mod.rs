//! Job proposal fan-out.
//!
//! Lists the nodes matching a domain/environment selector and proposes the
//! job to every one of them. A failed proposal does not stop the others;
//! all failures are collected and returned together.

use std::collections::HashMap;

use tracing::Instrument;

use crate::config::FleetConfig;
use crate::error::{JobError, ProposalErrors, ProposalFailure};
use crate::fleet::{FleetClient, NodeFilter, Selector};
use crate::labels::build_labels;

pub const SELECTOR_PRODUCT: &str = "product";
pub const SELECTOR_ENVIRONMENT: &str = "environment";

/// A job spec and where it should go.
#[derive(Debug, Clone, Default)]
pub struct JobProposal {
    /// Job specification text, opaque to this crate.
    pub spec: String,
    /// Matched against the `product` node label.
    pub domain: String,
    /// Matched against the `environment` node label.
    pub environment: String,
    /// Extra equality selectors on node labels.
    pub node_labels: HashMap<String, String>,
    /// Labels attached to each created proposal.
    pub job_labels: HashMap<String, String>,
}

impl JobProposal {
    pub fn new(
        spec: impl Into<String>,
        domain: impl Into<String>,
        environment: impl Into<String>,
    ) -> Self {
        Self {
            spec: spec.into(),
            domain: domain.into(),
            environment: environment.into(),
            ..Self::default()
        }
    }

    /// Target the domain and environment `config` was loaded with. A config
    /// without an environment yields a proposal that fails validation.
    pub fn for_config(config: &FleetConfig, spec: impl Into<String>) -> Self {
        Self::new(
            spec,
            config.domain.as_str(),
            config.environment.clone().unwrap_or_default(),
        )
    }

    pub fn with_node_label(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.node_labels.insert(key.into(), value.into());
        self
    }

    pub fn with_job_label(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.job_labels.insert(key.into(), value.into());
        self
    }

    fn validate(&self) -> Result<(), JobError> {
        if self.spec.trim().is_empty() {
            return Err(JobError::Invalid("job spec is empty".to_string()));
        }
        if self.domain.trim().is_empty() {
            return Err(JobError::Invalid("domain is empty".to_string()));
        }
        if self.environment.trim().is_empty() {
            return Err(JobError::Invalid("environment is empty".to_string()));
        }
        Ok(())
    }

    /// `product` and `environment` first, then extra node labels by key.
    pub fn node_filter(&self) -> NodeFilter {
        let mut selectors = vec![
            Selector::equals(SELECTOR_PRODUCT, self.domain.as_str()),
            Selector::equals(SELECTOR_ENVIRONMENT, self.environment.as_str()),
        ];
        selectors.extend(
            build_labels(&self.node_labels)
                .into_iter()
                .map(|l| Selector::equals(l.key, l.value.unwrap_or_default())),
        );
        NodeFilter { selectors }
    }
}

/// Propose `job` to every node the fleet service matches, under `span`.
///
/// Matching zero nodes is a success. Every matched node is attempted; the
/// error, if any, lists each failed node.
pub async fn propose_job(
    client: &dyn FleetClient,
    job: &JobProposal,
    span: tracing::Span,
) -> Result<(), JobError> {
    job.validate()?;
    propose_job_inner(client, job).instrument(span).await
}

async fn propose_job_inner(client: &dyn FleetClient, job: &JobProposal) -> Result<(), JobError> {
    let filter = job.node_filter();
    let nodes = client
        .list_nodes(Some(&filter))
        .await
        .map_err(JobError::ListNodes)?;

    if nodes.is_empty() {
        tracing::info!(domain = %job.domain, environment = %job.environment, "No nodes matched job proposal");
        return Ok(());
    }

    let labels = build_labels(&job.job_labels);
    let mut errors = ProposalErrors::new();

    for node in &nodes {
        match client.propose_job(&node.id, &job.spec, &labels).await {
            Ok(proposal) => {
                tracing::info!(node_id = %node.id, proposal_id = %proposal.id, "Proposed job");
            }
            Err(e) => {
                tracing::error!(node_id = %node.id, error = %e, "Failed to propose job");
                errors.push(ProposalFailure {
                    node_id: node.id.clone(),
                    source: e,
                });
            }
        }
    }

    tracing::info!(
        nodes = nodes.len(),
        failed = errors.len(),
        "Job proposal fan-out finished"
    );
    errors.into_result().map_err(JobError::Proposals)
}
