use async_trait::async_trait;
use chrono::{DateTime, Utc};
use reqwest::Client;
use serde_json::Value;
use std::time::Duration as StdDuration;

use crate::config::Config;
use crate::constants::polling;
use crate::donations::types::Donation;
use crate::error::{Error, Result};
use crate::poller::PollSource;
use crate::types::EventId;

const SERVICE: &str = "donation";

/// Client for the donation platform's recent-donations endpoint
#[derive(Clone)]
pub struct DonationClient {
    base_url: String,
    token: String,
    client: Client,
}

impl DonationClient {
    /// Create a new donation client from config
    pub fn new(config: &Config) -> Self {
        Self {
            base_url: config.donation_api_url.trim_end_matches('/').to_string(),
            token: config.donation_api_token.clone(),
            client: Client::builder()
                .timeout(StdDuration::from_secs(polling::REQUEST_TIMEOUT_SECS))
                .build()
                .unwrap_or_default(),
        }
    }

    /// Check if credentials are configured
    fn is_configured(&self) -> bool {
        !self.token.is_empty()
    }

    /// Make an authenticated GET request with query parameters
    async fn get_with_query(&self, path: &str, query: &[(&str, &str)]) -> Result<Value> {
        let url = format!("{}{}", self.base_url, path);
        let resp = self.client
            .get(&url)
            .bearer_auth(&self.token)
            .header("Accept", "application/json")
            .query(query)
            .send()
            .await
            .map_err(|e| Error::Network(format!("Request to {} failed: {}", path, e)))?;

        let status = resp.status();
        if !status.is_success() {
            return Err(Error::api_status(
                SERVICE,
                format!("Request to {} returned {}", path, status),
                status.as_u16(),
            ));
        }

        resp.json().await
            .map_err(|e| Error::parse(format!("Invalid JSON from {}: {}", path, e), None))
    }

    /// Fetch recent donations, oldest first
    pub async fn recent_donations(&self, limit: usize) -> Result<Vec<Donation>> {
        if !self.is_configured() {
            return Err(Error::config(
                "Donation client not configured",
                "Set DONATION_API_TOKEN environment variable",
            ));
        }

        let limit = limit.to_string();
        let json = self.get_with_query("/donations", &[("limit", limit.as_str())]).await?;
        parse_donations(&json)
    }
}

#[async_trait]
impl PollSource for DonationClient {
    type Item = Donation;

    fn name(&self) -> &'static str {
        "donations"
    }

    async fn fetch(&self) -> Result<Vec<Donation>> {
        self.recent_donations(polling::FETCH_LIMIT).await
    }

    fn item_id(&self, item: &Donation) -> String {
        item.id.to_string()
    }
}

/// Parse a donations listing (newest first on the wire) into oldest-first order
pub fn parse_donations(json: &Value) -> Result<Vec<Donation>> {
    if let Some(message) = json["error"].as_str() {
        return Err(Error::api(SERVICE, message));
    }
    let data = json["data"].as_array()
        .ok_or_else(|| Error::parse("Missing 'data' array in donations response", None))?;

    let mut donations: Vec<Donation> = data.iter().filter_map(|d| {
        let id = match &d["donation_id"] {
            Value::String(s) => s.clone(),
            Value::Number(n) => n.to_string(),
            _ => return None,
        };
        // Amounts arrive as decimal strings or numbers depending on API version
        let amount = match &d["amount"] {
            Value::String(s) => s.parse().ok()?,
            Value::Number(n) => n.as_f64()?,
            _ => return None,
        };
        let created_at = d["created_at"].as_i64()
            .and_then(|secs| DateTime::from_timestamp(secs, 0))
            .unwrap_or_else(Utc::now);

        Some(Donation {
            id: EventId::new(id),
            amount,
            currency: d["currency"].as_str().unwrap_or("USD").to_string(),
            name: d["name"].as_str().unwrap_or("Anonymous").to_string(),
            message: d["message"].as_str().unwrap_or_default().to_string(),
            created_at,
        })
    }).collect();

    donations.reverse();
    Ok(donations)
}

#[cfg(test)]
mod tests {
    #![allow(clippy::expect_used, clippy::unwrap_used)]

    use super::*;
    use serde_json::json;

    #[test]
    fn parses_listing_oldest_first() {
        let json = json!({
            "data": [
                {"donation_id": 902, "created_at": 1_714_600_200, "currency": "USD",
                 "amount": "12.5000000000", "name": "Kim", "message": "gg"},
                {"donation_id": "901", "created_at": 1_714_600_100, "currency": "EUR",
                 "amount": 3, "name": "Lee", "message": null}
            ]
        });

        let donations = parse_donations(&json).unwrap();
        assert_eq!(donations.len(), 2);
        assert_eq!(donations[0].id, EventId::new("901"));
        assert_eq!(donations[0].message, "");
        assert!((donations[0].amount - 3.0).abs() < f64::EPSILON);
        assert_eq!(donations[1].name, "Kim");
        assert!((donations[1].amount - 12.5).abs() < f64::EPSILON);
        assert_eq!(donations[1].created_at.timestamp(), 1_714_600_200);
    }

    #[test]
    fn skips_entries_without_amount() {
        let json = json!({"data": [{"donation_id": "1", "name": "x"}]});
        assert!(parse_donations(&json).unwrap().is_empty());
    }

    #[test]
    fn rejects_payload_without_data() {
        assert!(matches!(
            parse_donations(&json!({"data": null})),
            Err(Error::Parse { .. })
        ));
    }

    #[test]
    fn error_body_becomes_api_error() {
        let err = parse_donations(&json!({"error": "invalid access token"})).unwrap_err();
        assert!(matches!(err, Error::Api { service: "donation", status: None, .. }));
        assert_eq!(err.to_string(), "donation API error: invalid access token");
    }

    #[tokio::test]
    async fn unconfigured_client_reports_config_error() {
        let client = DonationClient::new(&Config::default());
        match client.fetch().await {
            Err(Error::Config { .. }) => {}
            other => unreachable!("expected config error, got {other:?}"),
        }
    }
}
