//! HTTP adapter for the tenant's OData API.
//!
//! # Responsibilities
//! - Authenticate with static credentials from settings
//! - Fetch a CSRF token once, before the first mutating call
//! - Map the six remote capabilities onto API resources

use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::{HeaderValue, ACCEPT, CONTENT_TYPE};
use reqwest::{Client, RequestBuilder, Response, StatusCode};
use serde::Deserialize;
use tokio::sync::OnceCell;
use url::Url;

use crate::config::ServiceConfig;
use crate::manifest::ArtifactType;
use crate::remote::batch::{configuration_path, decode_chunk, encode_chunk, odata_literal, partition};
use crate::remote::{
    BatchOperation, OperationOutcome, RemoteApi, RemoteError, RemoteParameter, RemoteResult,
    RuntimeStatus, NOT_DEPLOYED,
};

const CSRF_HEADER: &str = "X-CSRF-Token";

/// `RemoteApi` implementation over HTTPS.
pub struct HttpRemote {
    client: Client,
    api_root: Url,
    username: String,
    password: String,
    csrf_token: OnceCell<String>,
}

#[derive(Deserialize)]
struct Envelope<T> {
    d: T,
}

#[derive(Deserialize)]
struct Results<T> {
    results: Vec<T>,
}

#[derive(Deserialize)]
#[serde(rename_all = "PascalCase")]
struct ConfigurationEntry {
    parameter_key: String,
    #[serde(default)]
    parameter_value: String,
}

#[derive(Deserialize)]
#[serde(rename_all = "PascalCase")]
struct RuntimeEntry {
    #[serde(default)]
    version: String,
    #[serde(default)]
    status: String,
}

impl HttpRemote {
    /// Create a client for the tenant described by `config`.
    pub fn new(config: &ServiceConfig) -> RemoteResult<Self> {
        let mut base = config.base_url.trim_end_matches('/').to_string();
        base.push_str("/api/v1/");
        let api_root = Url::parse(&base)
            .map_err(|e| RemoteError::Transport(format!("invalid base URL '{}': {}", config.base_url, e)))?;

        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .cookie_store(true)
            .build()?;

        tracing::debug!(api_root = %api_root, "HTTP remote initialised");

        Ok(Self {
            client,
            api_root,
            username: config.username.clone(),
            password: config.password.clone(),
            csrf_token: OnceCell::new(),
        })
    }

    fn url(&self, path: &str) -> RemoteResult<Url> {
        self.api_root
            .join(path)
            .map_err(|e| RemoteError::Transport(format!("invalid resource path '{}': {}", path, e)))
    }

    fn authed(&self, builder: RequestBuilder) -> RequestBuilder {
        builder
            .basic_auth(&self.username, Some(&self.password))
            .header(ACCEPT, HeaderValue::from_static("application/json"))
    }

    async fn csrf_token(&self) -> RemoteResult<&str> {
        let token = self
            .csrf_token
            .get_or_try_init(|| async {
                let response = self
                    .authed(self.client.get(self.api_root.clone()))
                    .header(CSRF_HEADER, "Fetch")
                    .send()
                    .await?;
                let response = check(response).await?;
                let token = response
                    .headers()
                    .get(CSRF_HEADER)
                    .and_then(|v| v.to_str().ok())
                    .map(str::to_string)
                    .ok_or_else(|| RemoteError::Decode("CSRF token missing from response".into()))?;
                tracing::debug!("CSRF token fetched");
                Ok::<_, RemoteError>(token)
            })
            .await?;
        Ok(token.as_str())
    }

    async fn mutating(&self, builder: RequestBuilder) -> RemoteResult<Response> {
        let token = self.csrf_token().await?;
        let response = self.authed(builder).header(CSRF_HEADER, token).send().await?;
        check(response).await
    }
}

/// Turn non-success statuses into `RemoteError::Status`.
async fn check(response: Response) -> RemoteResult<Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let body = response.text().await.unwrap_or_default();
    Err(RemoteError::Status {
        status: status.as_u16(),
        body,
    })
}

fn deploy_resource(artifact_type: ArtifactType) -> &'static str {
    match artifact_type {
        ArtifactType::Integration => "DeployIntegrationDesigntimeArtifact",
        ArtifactType::MessageMapping => "DeployMessageMappingDesigntimeArtifact",
        ArtifactType::ScriptCollection => "DeployScriptCollectionDesigntimeArtifact",
        ArtifactType::ValueMapping => "DeployValueMappingDesigntimeArtifact",
    }
}

#[async_trait]
impl RemoteApi for HttpRemote {
    async fn read_parameters(
        &self,
        artifact_id: &str,
        version: &str,
    ) -> RemoteResult<Vec<RemoteParameter>> {
        let url = self.url(&format!(
            "IntegrationDesigntimeArtifacts(Id={},Version={})/Configurations",
            odata_literal(artifact_id),
            odata_literal(version)
        ))?;
        let response = check(self.authed(self.client.get(url)).send().await?).await?;
        let envelope: Envelope<Results<ConfigurationEntry>> = response.json().await?;

        Ok(envelope
            .d
            .results
            .into_iter()
            .map(|entry| RemoteParameter {
                key: entry.parameter_key,
                value: entry.parameter_value,
            })
            .collect())
    }

    async fn set_parameter(
        &self,
        artifact_id: &str,
        version: &str,
        key: &str,
        value: &str,
    ) -> RemoteResult<()> {
        let url = self.url(&configuration_path(artifact_id, version, key))?;
        let body = serde_json::json!({ "ParameterValue": value });
        self.mutating(self.client.put(url).json(&body)).await?;
        Ok(())
    }

    async fn execute_batch(
        &self,
        operations: Vec<BatchOperation>,
        chunk_size: usize,
    ) -> RemoteResult<Vec<OperationOutcome>> {
        let url = self.url("$batch")?;
        let mut outcomes = Vec::with_capacity(operations.len());

        for (index, chunk) in partition(&operations, chunk_size).into_iter().enumerate() {
            let request = encode_chunk(chunk)?;
            tracing::debug!(chunk = index + 1, operations = chunk.len(), "Sending batch chunk");

            let builder = self
                .client
                .post(url.clone())
                .header(CONTENT_TYPE, request.content_type())
                .body(request.body);
            let response = self.mutating(builder).await?;
            let text = response.text().await?;
            outcomes.extend(decode_chunk(chunk, &text)?);
        }

        Ok(outcomes)
    }

    async fn trigger_deployment(
        &self,
        artifact_id: &str,
        artifact_type: ArtifactType,
    ) -> RemoteResult<()> {
        let mut url = self.url(deploy_resource(artifact_type))?;
        url.query_pairs_mut()
            .append_pair("Id", &odata_literal(artifact_id))
            .append_pair("Version", &odata_literal("active"));
        self.mutating(self.client.post(url)).await?;
        Ok(())
    }

    async fn runtime_status(&self, artifact_id: &str) -> RemoteResult<RuntimeStatus> {
        let url = self.url(&format!("IntegrationRuntimeArtifacts({})", odata_literal(artifact_id)))?;
        let response = self.authed(self.client.get(url)).send().await?;

        if response.status() == StatusCode::NOT_FOUND {
            return Ok(RuntimeStatus {
                version: NOT_DEPLOYED.to_string(),
                status: String::new(),
            });
        }

        let envelope: Envelope<RuntimeEntry> = check(response).await?.json().await?;
        Ok(RuntimeStatus {
            version: envelope.d.version,
            status: envelope.d.status,
        })
    }

    async fn error_information(&self, artifact_id: &str) -> RemoteResult<String> {
        let url = self.url(&format!(
            "IntegrationRuntimeArtifacts({})/ErrorInformation/$value",
            odata_literal(artifact_id)
        ))?;
        let response = check(self.authed(self.client.get(url)).send().await?).await?;
        let text = response.text().await?;

        // The payload is JSON when the tenant has structured detail.
        let detail = serde_json::from_str::<serde_json::Value>(&text)
            .ok()
            .and_then(|json| {
                json.pointer("/parameter")
                    .and_then(|p| p.as_array())
                    .map(|items| {
                        items
                            .iter()
                            .filter_map(|item| item.as_str())
                            .collect::<Vec<_>>()
                            .join("; ")
                    })
            })
            .filter(|detail| !detail.is_empty());

        Ok(detail.unwrap_or_else(|| text.trim().to_string()))
    }
}
