//! AbuseIPDB v2 `check` endpoint.

use std::net::IpAddr;
use std::time::Duration;

use chrono::{DateTime, Utc};
use reqwest::StatusCode;
use reqwest::blocking::Client;
use reqwest::header::ACCEPT;
use serde::Deserialize;

use super::{ReputationError, ReputationProvider, ReputationReport};

pub const DEFAULT_BASE_URL: &str = "https://api.abuseipdb.com/api/v2";
const MAX_AGE_IN_DAYS: &str = "90";

pub struct AbuseIpDbClient {
    client: Client,
    api_key: String,
    base_url: String,
}

impl AbuseIpDbClient {
    pub fn new(api_key: impl Into<String>) -> Result<Self, ReputationError> {
        Self::with_base_url(api_key, DEFAULT_BASE_URL)
    }

    pub fn with_base_url(
        api_key: impl Into<String>,
        base_url: impl Into<String>,
    ) -> Result<Self, ReputationError> {
        let api_key = api_key.into();
        if api_key.trim().is_empty() {
            return Err(ReputationError::MissingApiKey);
        }
        let client = Client::builder()
            .build()
            .map_err(|err| ReputationError::Transport(err.to_string()))?;
        Ok(Self {
            client,
            api_key,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        })
    }
}

impl ReputationProvider for AbuseIpDbClient {
    fn check_ip(&self, ip: &str, timeout: Duration) -> Result<ReputationReport, ReputationError> {
        // rejected before any request is made
        let ip = ip
            .trim()
            .parse::<IpAddr>()
            .map_err(|_| ReputationError::InvalidIp(ip.to_string()))?
            .to_string();

        let response = self
            .client
            .get(format!("{}/check", self.base_url))
            .query(&[("ipAddress", ip.as_str()), ("maxAgeInDays", MAX_AGE_IN_DAYS)])
            .header("Key", &self.api_key)
            .header(ACCEPT, "application/json")
            .timeout(timeout)
            .send()
            .map_err(transport_error)?;

        let status = response.status();
        if status == StatusCode::TOO_MANY_REQUESTS {
            return Err(ReputationError::RateLimited);
        }
        if !status.is_success() {
            return Err(ReputationError::Http {
                status: status.as_u16(),
            });
        }
        let body = response.text().map_err(transport_error)?;
        parse_check_response(&body)
    }
}

fn transport_error(err: reqwest::Error) -> ReputationError {
    if err.is_timeout() {
        ReputationError::Timeout
    } else {
        ReputationError::Transport(err.to_string())
    }
}

#[derive(Debug, Deserialize)]
struct CheckResponse {
    data: CheckData,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CheckData {
    ip_address: String,
    is_whitelisted: Option<bool>,
    abuse_confidence_score: u8,
    #[serde(default)]
    total_reports: u32,
    country_code: Option<String>,
    isp: Option<String>,
    domain: Option<String>,
    last_reported_at: Option<DateTime<Utc>>,
}

pub(crate) fn parse_check_response(body: &str) -> Result<ReputationReport, ReputationError> {
    let parsed: CheckResponse =
        serde_json::from_str(body).map_err(|err| ReputationError::Decode(err.to_string()))?;
    let data = parsed.data;
    Ok(ReputationReport {
        ip: data.ip_address,
        confidence_score: data.abuse_confidence_score.min(100),
        total_reports: data.total_reports,
        is_whitelisted: data.is_whitelisted.unwrap_or(false),
        country_code: data.country_code,
        isp: data.isp,
        domain: data.domain,
        last_reported_at: data.last_reported_at,
    })
}
