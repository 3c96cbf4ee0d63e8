//! Admin API client for both environments
//!
//! One `reqwest::Client` is shared; each environment gets its own endpoint,
//! access token and `governor` rate limiter, so a slow store never eats the
//! other side's request budget.

use anyhow::{Context, Result};
use async_trait::async_trait;
use governor::{
    Quota, RateLimiter,
    clock::DefaultClock,
    state::{InMemoryState, direct::NotKeyed},
};
use reqwest::{
    Client,
    header::{CONTENT_TYPE, HeaderMap, HeaderValue, USER_AGENT},
};
use serde_json::Value;
use std::num::NonZeroU32;
use std::time::Duration;
use tracing::{debug, warn};

use crate::domain::entities::{DetailedEntity, EntityKind, EntityPage};
use crate::domain::environment::Environment;
use crate::domain::errors::RemoteError;
use crate::domain::mutations::{Mutation, MutationOutcome};
use crate::domain::repositories::RemoteEntityClient;
use crate::infrastructure::config::{EnvironmentConfig, EnvironmentsConfig, HttpConfig};
use crate::infrastructure::graphql::{self, GraphQlRequest, GraphQlResponse};

const ACCESS_TOKEN_HEADER: &str = "X-Shopify-Access-Token";

struct Endpoint {
    url: String,
    access_token: String,
    rate_limiter: RateLimiter<NotKeyed, InMemoryState, DefaultClock>,
}

impl Endpoint {
    fn new(config: &EnvironmentConfig, quota: Quota) -> Option<Self> {
        config.is_configured().then(|| Self {
            url: config.graphql_url.trim().to_string(),
            access_token: config.access_token.trim().to_string(),
            rate_limiter: RateLimiter::direct(quota),
        })
    }
}

pub struct ShopifyClient {
    client: Client,
    production: Option<Endpoint>,
    staging: Option<Endpoint>,
}

impl ShopifyClient {
    /// Build the client; environments without credentials fail per call with `NotConfigured`
    pub fn new(environments: &EnvironmentsConfig, http: &HttpConfig) -> Result<Self> {
        let mut headers = HeaderMap::new();
        headers.insert(
            USER_AGENT,
            HeaderValue::from_str(&http.user_agent).context("Invalid user agent")?,
        );
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));

        let client = Client::builder()
            .timeout(Duration::from_secs(http.request_timeout_seconds))
            .default_headers(headers)
            .gzip(true)
            .build()
            .context("Failed to create HTTP client")?;

        let per_second = NonZeroU32::new(http.max_requests_per_second).unwrap_or(NonZeroU32::MIN);
        let quota = Quota::per_second(per_second);

        for environment in Environment::ALL {
            if !environments.get(environment).is_configured() {
                warn!("No credentials configured for {}", environment);
            }
        }

        Ok(Self {
            client,
            production: Endpoint::new(&environments.production, quota),
            staging: Endpoint::new(&environments.staging, quota),
        })
    }

    fn endpoint(&self, environment: Environment) -> Result<&Endpoint, RemoteError> {
        let endpoint = match environment {
            Environment::Production => self.production.as_ref(),
            Environment::Staging => self.staging.as_ref(),
        };
        endpoint.ok_or(RemoteError::NotConfigured(environment))
    }

    /// Post one document and return its `data` object
    async fn post(&self, environment: Environment, request: &GraphQlRequest) -> Result<Value, RemoteError> {
        let endpoint = self.endpoint(environment)?;
        endpoint.rate_limiter.until_ready().await;

        debug!(environment = %environment, root = request.root, "GraphQL request");
        let response = self
            .client
            .post(&endpoint.url)
            .header(ACCESS_TOKEN_HEADER, &endpoint.access_token)
            .json(&request.body())
            .send()
            .await?;

        let status = response.status();
        let bytes = response.bytes().await?;
        if !status.is_success() {
            return Err(RemoteError::Status {
                status: status.as_u16(),
                body: String::from_utf8_lossy(&bytes).into_owned(),
            });
        }

        let envelope: GraphQlResponse = serde_json::from_slice(&bytes)?;
        envelope.into_data()
    }
}

#[async_trait]
impl RemoteEntityClient for ShopifyClient {
    async fn list_page(
        &self,
        environment: Environment,
        kind: EntityKind,
        cursor: Option<&str>,
    ) -> Result<EntityPage, RemoteError> {
        let request = graphql::list_request(kind, cursor);
        let data = self.post(environment, &request).await?;
        graphql::decode_list(kind, data)
    }

    async fn get_detail(
        &self,
        environment: Environment,
        kind: EntityKind,
        id: &str,
    ) -> Result<DetailedEntity, RemoteError> {
        let request = graphql::detail_request(kind, id);
        let data = self.post(environment, &request).await?;
        graphql::decode_detail(kind, data)
    }

    async fn mutate(&self, environment: Environment, mutation: Mutation) -> Result<MutationOutcome, RemoteError> {
        let request = graphql::mutation_request(&mutation)?;
        let data = self.post(environment, &request).await?;
        let outcome = graphql::decode_mutation(request.root, data)?;
        if outcome.is_rejected() {
            debug!(
                environment = %environment,
                operation = mutation.operation(),
                errors = ?outcome.messages(),
                "Mutation rejected"
            );
        }
        Ok(outcome)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn unconfigured_environment_fails_before_any_request() {
        let environments = EnvironmentsConfig {
            production: EnvironmentConfig {
                graphql_url: "https://prod.example.com/admin/api/2024-07/graphql.json".into(),
                access_token: "shpat_prod".into(),
            },
            staging: EnvironmentConfig::default(),
        };
        let client = ShopifyClient::new(&environments, &HttpConfig::default()).unwrap();

        let result = client.list_page(Environment::Staging, EntityKind::Page, None).await;
        assert!(matches!(result, Err(RemoteError::NotConfigured(Environment::Staging))));
        assert!(client.endpoint(Environment::Production).is_ok());
    }

    #[test]
    fn zero_rate_falls_back_to_one_request_per_second() {
        let http = HttpConfig {
            max_requests_per_second: 0,
            ..HttpConfig::default()
        };
        assert!(ShopifyClient::new(&EnvironmentsConfig::default(), &http).is_ok());
    }
}
