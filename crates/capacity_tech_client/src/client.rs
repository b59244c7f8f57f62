//! reqwest implementation of [`TechnologiesGateway`].

use anyhow::Context;
use async_trait::async_trait;
use reqwest::{Client, RequestBuilder, Response};
use serde::Serialize;

use capacity_core::error::CapacityError;
use capacity_core::model::{CapacityTechnologies, SortOrder};
use capacity_core::page::CustomPage;
use capacity_core::ports::{Result, TechnologiesGateway};

use crate::config::TechnologyClientConfig;
use crate::error::{fallback, GatewayError, NO_ADDITIONAL_ERROR_DETAILS};
use crate::resilience::{CircuitStatus, ResiliencePolicy};

const PATH_ASSIGN: &str = "/assign";
const PATH_BY_CAPABILITIES_IDS: &str = "/capabilities_ids";
const PATH_CAPABILITIES: &str = "/capabilities";

const CIRCUIT_NAME: &str = "technologyMngr";

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct TechnologyAssign<'a> {
    capacity_id: i64,
    technologies_ids: &'a [i64],
}

#[derive(Debug, Serialize)]
struct SortQuery {
    sort: &'static str,
    page: i64,
    size: i64,
}

/// HTTP client for the technology management service. Every call goes
/// through the shared resilience policy.
pub struct HttpTechnologiesGateway {
    http: Client,
    base_url: String,
    policy: ResiliencePolicy<GatewayError>,
}

impl HttpTechnologiesGateway {
    pub fn new(config: TechnologyClientConfig) -> anyhow::Result<Self> {
        let http = Client::builder()
            .timeout(config.timeout)
            .build()
            .context("Failed to create HTTP client")?;

        Ok(Self {
            http,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            policy: ResiliencePolicy::new(
                CIRCUIT_NAME,
                config.circuit_breaker,
                config.bulkhead,
                config.retry,
                fallback,
            ),
        })
    }

    pub fn circuit_status(&self) -> CircuitStatus {
        self.policy.circuit_status()
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }
}

/// Send a request and turn non-2xx responses into [`GatewayError::Status`].
async fn send(request: RequestBuilder) -> std::result::Result<Response, GatewayError> {
    let response = request.send().await?;
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let body = response
        .text()
        .await
        .ok()
        .filter(|body| !body.is_empty())
        .unwrap_or_else(|| NO_ADDITIONAL_ERROR_DETAILS.to_string());
    tracing::error!(status = status.as_u16(), body = %body, "technology service error response");
    Err(GatewayError::Status {
        status: status.as_u16(),
        body,
    })
}

fn log_failure(operation: &'static str, e: &GatewayError) {
    tracing::error!(operation, error = %e, "technology service call failed");
}

#[async_trait]
impl TechnologiesGateway for HttpTechnologiesGateway {
    async fn assign_technologies_to_capacity(
        &self,
        capacity_id: i64,
        technology_ids: &[i64],
    ) -> Result<()> {
        tracing::info!(capacity_id, ?technology_ids, "assigning technologies to capacity");
        let http = &self.http;
        let url = self.url(PATH_ASSIGN);
        let url = url.as_str();
        let body = TechnologyAssign {
            capacity_id,
            technologies_ids: technology_ids,
        };
        let body = &body;

        self.policy
            .call(move || async move {
                send(http.post(url).json(body)).await?;
                Ok::<_, GatewayError>(())
            })
            .await
            .map_err(|e| {
                log_failure("assign_technologies_to_capacity", &e);
                CapacityError::from(e)
            })?;

        tracing::info!(capacity_id, "completed assign technologies in capacity");
        Ok(())
    }

    async fn get_technologies_by_capabilities_ids(
        &self,
        capability_ids: &[i64],
    ) -> Result<Vec<CapacityTechnologies>> {
        tracing::info!(?capability_ids, "getting technologies by capabilities ids");
        let http = &self.http;
        let url = self.url(PATH_BY_CAPABILITIES_IDS);
        let url = url.as_str();

        let technologies = self
            .policy
            .call(move || async move {
                let response = send(http.post(url).json(capability_ids)).await?;
                Ok::<_, GatewayError>(response.json::<Vec<CapacityTechnologies>>().await?)
            })
            .await
            .map_err(|e| {
                log_failure("get_technologies_by_capabilities_ids", &e);
                CapacityError::from(e)
            })?;

        tracing::info!(found = technologies.len(), "completed getting technologies by capabilities");
        Ok(technologies)
    }

    async fn get_sort_technologies_by_capabilities(
        &self,
        order: SortOrder,
        size: i64,
        page: i64,
    ) -> Result<CustomPage<CapacityTechnologies>> {
        tracing::info!(order = order.as_str(), page, size, "getting capabilities sorted by technologies");
        let http = &self.http;
        let url = self.url(PATH_CAPABILITIES);
        let url = url.as_str();
        let query = SortQuery {
            sort: order.as_str(),
            page,
            size,
        };
        let query = &query;

        let page = self
            .policy
            .call(move || async move {
                let response = send(http.get(url).query(query)).await?;
                Ok::<_, GatewayError>(response.json::<CustomPage<CapacityTechnologies>>().await?)
            })
            .await
            .map_err(|e| {
                log_failure("get_sort_technologies_by_capabilities", &e);
                CapacityError::from(e)
            })?;

        tracing::info!(
            items = page.data.len(),
            total_items = page.total_items,
            "completed getting capabilities sorted by technologies"
        );
        Ok(page)
    }

    async fn delete_technologies_by_capabilities_ids(&self, capability_ids: &[i64]) -> Result<()> {
        tracing::info!(?capability_ids, "deleting technologies by capabilities ids");
        let http = &self.http;
        let url = self.url(PATH_CAPABILITIES);
        let url = url.as_str();

        self.policy
            .call(move || async move {
                send(http.delete(url).json(capability_ids)).await?;
                Ok::<_, GatewayError>(())
            })
            .await
            .map_err(|e| {
                log_failure("delete_technologies_by_capabilities_ids", &e);
                CapacityError::from(e)
            })?;

        tracing::info!("completed deleting technologies by capabilities");
        Ok(())
    }
}
