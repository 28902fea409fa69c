//! JSON-over-HTTPS fleet client.
//!
//! Each RPC is a POST of a JSON body to `{grpc}/{service}/{method}` on the
//! request/response address, authorized with a bearer token from the
//! configured [`TokenSource`]. Transport security defaults to TLS 1.2 or
//! newer; plaintext endpoints are refused unless explicitly allowed.
//!
//! No request timeout is set here. Calls run until the fleet service answers
//! or the caller drops the future.

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use secrecy::ExposeSecret;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::auth::TokenSource;
use crate::error::FleetError;
use crate::fleet::{FleetClient, FleetProvider, Keypair, Label, Node, NodeFilter, Proposal};

const NODE_SERVICE: &str = "node.v1.NodeService";
const JOB_SERVICE: &str = "job.v1.JobService";
const CSA_SERVICE: &str = "csa.v1.CSAService";

/// Minimum TLS protocol version accepted by the transport.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TlsVersion {
    #[default]
    Tls12,
    Tls13,
}

impl TlsVersion {
    fn to_reqwest(self) -> reqwest::tls::Version {
        match self {
            Self::Tls12 => reqwest::tls::Version::TLS_1_2,
            Self::Tls13 => reqwest::tls::Version::TLS_1_3,
        }
    }
}

/// Transport security settings.
#[derive(Clone, Default)]
pub struct TransportCredentials {
    pub min_tls_version: TlsVersion,
    /// Extra PEM-encoded root certificate to trust.
    pub root_certificate_pem: Option<Vec<u8>>,
    /// Permit `http://` endpoints. Local development only.
    pub allow_plaintext: bool,
    /// Bound on establishing a connection. Unset means no bound.
    pub connect_timeout: Option<Duration>,
}

impl TransportCredentials {
    /// Plaintext transport for local fleet services.
    pub fn insecure() -> Self {
        Self {
            allow_plaintext: true,
            ..Self::default()
        }
    }
}

impl fmt::Debug for TransportCredentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TransportCredentials")
            .field("min_tls_version", &self.min_tls_version)
            .field("root_certificate", &self.root_certificate_pem.is_some())
            .field("allow_plaintext", &self.allow_plaintext)
            .field("connect_timeout", &self.connect_timeout)
            .finish()
    }
}

/// Builds [`HttpFleetClient`]s for the request/response address.
pub struct HttpFleetProvider {
    grpc_url: String,
    transport: TransportCredentials,
    token_source: Option<Arc<dyn TokenSource>>,
}

impl HttpFleetProvider {
    pub fn new(
        grpc_url: impl Into<String>,
        transport: TransportCredentials,
        token_source: Option<Arc<dyn TokenSource>>,
    ) -> Self {
        Self {
            grpc_url: grpc_url.into(),
            transport,
            token_source,
        }
    }

    fn base_url(&self) -> Result<String, FleetError> {
        let raw = self.grpc_url.trim().trim_end_matches('/');
        let url = if raw.contains("://") {
            raw.to_string()
        } else if self.transport.allow_plaintext {
            format!("http://{}", raw)
        } else {
            format!("https://{}", raw)
        };

        if url.starts_with("http://") && !self.transport.allow_plaintext {
            return Err(FleetError::RequestFailed {
                operation: "Initialize".to_string(),
                reason: format!("plaintext endpoint {} requires allow_plaintext", url),
            });
        }
        Ok(url)
    }

    fn build_http_client(&self) -> Result<Client, FleetError> {
        let init_err = |reason: String| FleetError::RequestFailed {
            operation: "Initialize".to_string(),
            reason,
        };

        let mut builder = Client::builder()
            .min_tls_version(self.transport.min_tls_version.to_reqwest())
            .https_only(!self.transport.allow_plaintext);

        if let Some(connect_timeout) = self.transport.connect_timeout {
            builder = builder.connect_timeout(connect_timeout);
        }

        if let Some(ref pem) = self.transport.root_certificate_pem {
            let cert = reqwest::Certificate::from_pem(pem)
                .map_err(|e| init_err(format!("invalid root certificate: {}", e)))?;
            builder = builder.add_root_certificate(cert);
        }

        builder
            .build()
            .map_err(|e| init_err(format!("failed to build HTTP client: {}", e)))
    }
}

#[async_trait]
impl FleetProvider for HttpFleetProvider {
    async fn initialize(&self) -> Result<Arc<dyn FleetClient>, FleetError> {
        let client = HttpFleetClient {
            client: self.build_http_client()?,
            base_url: self.base_url()?,
            token_source: self.token_source.clone(),
        };
        tracing::debug!(base_url = %client.base_url, "Initialized fleet client");
        Ok(Arc::new(client))
    }
}

/// Fleet client speaking JSON over HTTPS.
pub struct HttpFleetClient {
    client: Client,
    base_url: String,
    token_source: Option<Arc<dyn TokenSource>>,
}

impl HttpFleetClient {
    fn method_url(&self, service: &str, method: &str) -> String {
        format!("{}/{}/{}", self.base_url, service, method)
    }

    async fn call<T: Serialize + Sync, R: DeserializeOwned>(
        &self,
        service: &str,
        method: &str,
        body: &T,
    ) -> Result<R, FleetError> {
        let url = self.method_url(service, method);
        let mut request = self.client.post(&url).json(body);

        if let Some(ref source) = self.token_source {
            let token = source
                .token()
                .await
                .map_err(|e| FleetError::Unauthorized {
                    operation: method.to_string(),
                    source: e,
                })?;
            request = request.header(
                "Authorization",
                format!("Bearer {}", token.expose_secret()),
            );
        }

        tracing::debug!("Calling fleet service: {}", url);

        let response = request.send().await.map_err(|e| FleetError::RequestFailed {
            operation: method.to_string(),
            reason: e.to_string(),
        })?;

        let status = response.status();
        let text = response.text().await.map_err(|e| FleetError::RequestFailed {
            operation: method.to_string(),
            reason: format!("failed to read response body: {}", e),
        })?;

        if !status.is_success() {
            return Err(FleetError::Status {
                operation: method.to_string(),
                status: status.as_u16(),
                body: truncate_for_preview(&text, 512),
            });
        }

        serde_json::from_str(&text).map_err(|e| FleetError::InvalidResponse {
            operation: method.to_string(),
            reason: format!("JSON parse error: {}. Raw: {}", e, truncate_for_preview(&text, 512)),
        })
    }
}

#[derive(Serialize)]
struct ListNodesRequest<'a> {
    #[serde(skip_serializing_if = "Option::is_none")]
    filter: Option<&'a NodeFilter>,
}

#[derive(Deserialize)]
struct ListNodesResponse {
    #[serde(default)]
    nodes: Vec<Node>,
}

#[derive(Serialize)]
struct NodeWriteRequest<'a> {
    #[serde(skip_serializing_if = "Option::is_none")]
    id: Option<&'a str>,
    name: &'a str,
    public_key: &'a str,
    labels: &'a [Label],
}

#[derive(Deserialize)]
struct NodeResponse {
    node: Node,
}

#[derive(Deserialize)]
struct EmptyResponse {}

#[derive(Serialize)]
struct ProposeJobRequest<'a> {
    node_id: &'a str,
    spec: &'a str,
    labels: &'a [Label],
}

#[derive(Deserialize)]
struct ProposeJobResponse {
    proposal: Proposal,
}

#[derive(Serialize)]
struct ListKeypairsRequest {}

#[derive(Deserialize)]
struct ListKeypairsResponse {
    #[serde(default)]
    keypairs: Vec<Keypair>,
}

#[async_trait]
impl FleetClient for HttpFleetClient {
    async fn list_nodes(&self, filter: Option<&NodeFilter>) -> Result<Vec<Node>, FleetError> {
        let response: ListNodesResponse = self
            .call(NODE_SERVICE, "ListNodes", &ListNodesRequest { filter })
            .await?;
        Ok(response.nodes)
    }

    async fn register_node(
        &self,
        name: &str,
        public_key: &str,
        labels: &[Label],
    ) -> Result<Node, FleetError> {
        let body = NodeWriteRequest {
            id: None,
            name,
            public_key,
            labels,
        };
        let response: NodeResponse = self.call(NODE_SERVICE, "RegisterNode", &body).await?;
        Ok(response.node)
    }

    async fn update_node(
        &self,
        id: &str,
        name: &str,
        public_key: &str,
        labels: &[Label],
    ) -> Result<(), FleetError> {
        let body = NodeWriteRequest {
            id: Some(id),
            name,
            public_key,
            labels,
        };
        let _: EmptyResponse = self.call(NODE_SERVICE, "UpdateNode", &body).await?;
        Ok(())
    }

    async fn propose_job(
        &self,
        node_id: &str,
        spec: &str,
        labels: &[Label],
    ) -> Result<Proposal, FleetError> {
        let body = ProposeJobRequest {
            node_id,
            spec,
            labels,
        };
        let response: ProposeJobResponse = self.call(JOB_SERVICE, "ProposeJob", &body).await?;
        Ok(response.proposal)
    }

    async fn list_keypairs(&self) -> Result<Vec<Keypair>, FleetError> {
        let response: ListKeypairsResponse = self
            .call(CSA_SERVICE, "ListKeypairs", &ListKeypairsRequest {})
            .await?;
        Ok(response.keypairs)
    }
}

/// Cut `text` to at most `max` bytes on a char boundary.
fn truncate_for_preview(text: &str, max: usize) -> String {
    if text.len() <= max {
        return text.to_string();
    }
    let mut end = max;
    while !text.is_char_boundary(end) {
        end -= 1;
    }
    format!("{}...", &text[..end])
}
