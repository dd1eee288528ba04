use crate::client::traits::{ClientError, EventSource};
use crate::config::types::ScalewayConfig;
use crate::event::{ListEventsRequest, ListEventsResponse};
use async_trait::async_trait;
use chrono::SecondsFormat;
use reqwest::Url;

const AUTH_HEADER: &str = "X-Auth-Token";
const USER_AGENT: &str = concat!("audit-trail-receiver/", env!("CARGO_PKG_VERSION"));

pub type Result<T> = std::result::Result<T, ClientError>;

/// HTTP client for the Scaleway audit trail events endpoint
#[derive(Debug)]
pub struct AuditTrailClient {
    events_url: Url,
    secret_key: String,
    client: reqwest::Client,
}

impl AuditTrailClient {
    pub fn new(config: &ScalewayConfig) -> Result<Self> {
        let events_url = events_url(&config.api_url, &config.region)?;

        let client = reqwest::Client::builder()
            .timeout(config.timeout)
            .user_agent(USER_AGENT)
            .build()?;

        Ok(Self {
            events_url,
            secret_key: config.secret_key.clone(),
            client,
        })
    }

    pub fn events_url(&self) -> &Url {
        &self.events_url
    }
}

fn events_url(api_url: &str, region: &str) -> Result<Url> {
    let base = Url::parse(api_url).map_err(|e| ClientError::InvalidUrl {
        url: api_url.to_string(),
        reason: e.to_string(),
    })?;

    let path = format!(
        "{}/audit-trail/v1alpha1/regions/{}/events",
        base.path().trim_end_matches('/'),
        region
    );

    let mut url = base;
    url.set_path(&path);
    Ok(url)
}

fn query_params(request: &ListEventsRequest) -> Vec<(&'static str, String)> {
    let mut params = vec![
        ("organization_id", request.organization_id.clone()),
        ("page_size", request.page_size.to_string()),
        ("order_by", request.order_by.as_str().to_string()),
        (
            "recorded_after",
            request
                .recorded_after
                .to_rfc3339_opts(SecondsFormat::Nanos, true),
        ),
        (
            "recorded_before",
            request
                .recorded_before
                .to_rfc3339_opts(SecondsFormat::Nanos, true),
        ),
    ];

    if let Some(token) = request.page_token.as_deref().filter(|t| !t.is_empty()) {
        params.push(("page_token", token.to_string()));
    }

    params
}

#[async_trait]
impl EventSource for AuditTrailClient {
    async fn list_events(&self, request: &ListEventsRequest) -> Result<ListEventsResponse> {
        let response = self
            .client
            .get(self.events_url.clone())
            .header(AUTH_HEADER, &self.secret_key)
            .query(&query_params(request))
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(ClientError::Api {
                status: response.status().as_u16(),
                message: response.text().await.unwrap_or_default(),
            });
        }

        let body = response.bytes().await?;
        let events = serde_json::from_slice(&body)?;
        Ok(events)
    }
}
