//! Fleet API HTTP client.

use reqwest::{Client, RequestBuilder, Response, StatusCode};
use std::time::Duration;
use urlencoding::encode;

use super::FleetConfig;
use super::error::{FleetError, FleetResult};
use super::types::*;

/// Client for the scheduler's desired/actual record REST API.
#[derive(Debug, Clone)]
pub struct FleetClient {
    /// HTTP client.
    client: Client,
    /// Base URL of the scheduler (e.g., "http://receptor.example.com").
    base_url: String,
}

impl FleetClient {
    /// Create a new client from configuration.
    pub fn new(config: &FleetConfig) -> FleetResult<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(FleetError::transport)?;

        Ok(Self {
            client,
            base_url: config.url.trim_end_matches('/').to_string(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Fetch the desired record with the given process guid.
    pub async fn get_desired(&self, process_guid: &str) -> FleetResult<DesiredLrp> {
        let url = format!("{}/v1/desired_lrps/{}", self.base_url, encode(process_guid));
        let response = self.send(self.client.get(&url)).await?;

        if response.status() == StatusCode::NOT_FOUND {
            return Err(FleetError::NotFound(process_guid.to_string()));
        }
        self.handle_response(response).await
    }

    /// Submit a new desired record.
    pub async fn create_desired(&self, request: &DesiredLrpCreateRequest) -> FleetResult<()> {
        let url = format!("{}/v1/desired_lrps", self.base_url);
        let response = self.send(self.client.post(&url).json(request)).await?;

        self.handle_empty_response(response, &request.process_guid)
            .await
    }

    /// Remove a desired record. Instances are reaped by the scheduler.
    pub async fn delete_desired(&self, process_guid: &str) -> FleetResult<()> {
        let url = format!("{}/v1/desired_lrps/{}", self.base_url, encode(process_guid));
        let response = self.send(self.client.delete(&url)).await?;

        self.handle_empty_response(response, process_guid).await
    }

    /// List all desired records in a domain.
    pub async fn list_desired(&self, domain: &str) -> FleetResult<Vec<DesiredLrp>> {
        let url = format!("{}/v1/domains/{}/desired_lrps", self.base_url, encode(domain));
        let response = self.send(self.client.get(&url)).await?;

        self.handle_response(response).await
    }

    /// List all actual instances in a domain.
    pub async fn list_actual(&self, domain: &str) -> FleetResult<Vec<ActualLrp>> {
        let url = format!("{}/v1/domains/{}/actual_lrps", self.base_url, encode(domain));
        let response = self.send(self.client.get(&url)).await?;

        self.handle_response(response).await
    }

    /// List the actual instances of one desired record.
    pub async fn list_actual_by_name(&self, process_guid: &str) -> FleetResult<Vec<ActualLrp>> {
        let url = format!(
            "{}/v1/desired_lrps/{}/actual_lrps",
            self.base_url,
            encode(process_guid)
        );
        let response = self.send(self.client.get(&url)).await?;

        self.handle_response(response).await
    }

    async fn send(&self, request: RequestBuilder) -> FleetResult<Response> {
        request.send().await.map_err(FleetError::transport)
    }

    /// Handle response and parse JSON or error.
    async fn handle_response<T: serde::de::DeserializeOwned>(
        &self,
        response: Response,
    ) -> FleetResult<T> {
        if response.status().is_success() {
            response
                .json()
                .await
                .map_err(|e| FleetError::ParseError(e.without_url().to_string()))
        } else {
            Err(Self::error_from_response(response, None).await)
        }
    }

    async fn handle_empty_response(
        &self,
        response: Response,
        process_guid: &str,
    ) -> FleetResult<()> {
        if response.status().is_success() {
            Ok(())
        } else {
            Err(Self::error_from_response(response, Some(process_guid)).await)
        }
    }

    async fn error_from_response(response: Response, subject: Option<&str>) -> FleetError {
        let status = response.status();
        if status == StatusCode::NOT_FOUND
            && let Some(subject) = subject
        {
            return FleetError::NotFound(subject.to_string());
        }

        match response.json::<FleetErrorBody>().await {
            Ok(body) if !body.name.is_empty() => FleetError::Api {
                name: body.name,
                message: body.message,
            },
            _ => FleetError::Status {
                status: status.as_u16(),
            },
        }
    }
}
