use async_trait::async_trait;
use chrono::{DateTime, Utc};
use reqwest::Client;
use serde_json::Value;
use std::time::Duration as StdDuration;

use crate::config::Config;
use crate::constants::polling;
use crate::error::{Error, Result};
use crate::poller::PollSource;
use crate::tips::types::Tip;
use crate::types::EventId;

const SERVICE: &str = "tip";

/// Client for the tip platform's per-channel tip listing
#[derive(Clone)]
pub struct TipClient {
    base_url: String,
    token: String,
    channel_id: String,
    client: Client,
}

impl TipClient {
    /// Create a new tip client from config
    pub fn new(config: &Config) -> Self {
        Self {
            base_url: config.tip_api_url.trim_end_matches('/').to_string(),
            token: config.tip_api_token.clone(),
            channel_id: config.tip_channel_id.clone(),
            client: Client::builder()
                .timeout(StdDuration::from_secs(polling::REQUEST_TIMEOUT_SECS))
                .build()
                .unwrap_or_default(),
        }
    }

    fn is_configured(&self) -> bool {
        !self.token.is_empty() && !self.channel_id.is_empty()
    }

    /// Fetch recent tips, oldest first
    pub async fn recent_tips(&self, limit: usize) -> Result<Vec<Tip>> {
        if !self.is_configured() {
            return Err(Error::config(
                "Tip client not configured",
                "Set TIP_API_TOKEN and TIP_CHANNEL_ID environment variables",
            ));
        }

        let path = format!("/tips/{}", self.channel_id);
        let url = format!("{}{}", self.base_url, path);
        let limit = limit.to_string();
        let resp = self.client
            .get(&url)
            .bearer_auth(&self.token)
            .header("Accept", "application/json")
            .query(&[("limit", limit.as_str()), ("sort", "-createdAt")])
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

        let json: Value = resp.json().await
            .map_err(|e| Error::parse(format!("Invalid JSON from {}: {}", path, e), None))?;
        parse_tips(&json)
    }
}

#[async_trait]
impl PollSource for TipClient {
    type Item = Tip;

    fn name(&self) -> &'static str {
        "tips"
    }

    async fn fetch(&self) -> Result<Vec<Tip>> {
        self.recent_tips(polling::FETCH_LIMIT).await
    }

    fn item_id(&self, item: &Tip) -> String {
        item.id.to_string()
    }
}

/// Parse a tip listing (newest first on the wire) into oldest-first order
pub fn parse_tips(json: &Value) -> Result<Vec<Tip>> {
    if let Some(message) = json["error"].as_str() {
        return Err(Error::api(SERVICE, message));
    }
    let docs = json["docs"].as_array()
        .ok_or_else(|| Error::parse("Missing 'docs' array in tips response", None))?;

    let mut tips: Vec<Tip> = docs.iter().filter_map(|doc| {
        let id = doc["_id"].as_str()?.to_string();
        let donation = &doc["donation"];
        let amount = donation["amount"].as_f64()?;
        let created_at = doc["createdAt"].as_str()
            .and_then(|s| DateTime::parse_from_rfc3339(s).ok())
            .map_or_else(Utc::now, |d| d.with_timezone(&Utc));

        Some(Tip {
            id: EventId::new(id),
            amount,
            currency: donation["currency"].as_str().unwrap_or("USD").to_string(),
            name: donation["user"]["username"].as_str().unwrap_or("Anonymous").to_string(),
            message: donation["message"].as_str().unwrap_or_default().to_string(),
            created_at,
        })
    }).collect();

    tips.reverse();
    Ok(tips)
}

#[cfg(test)]
mod tests {
    #![allow(clippy::expect_used, clippy::unwrap_used)]

    use super::*;
    use serde_json::json;

    #[test]
    fn parses_docs_oldest_first() {
        let json = json!({
            "docs": [
                {"_id": "t2", "createdAt": "2024-05-01T20:05:00.000Z",
                 "donation": {"user": {"username": "mika"}, "amount": 10.0,
                              "currency": "USD", "message": "for the goal"}},
                {"_id": "t1", "createdAt": "2024-05-01T20:00:00.000Z",
                 "donation": {"user": {"username": "jo"}, "amount": 2.5, "currency": "USD"}}
            ]
        });

        let tips = parse_tips(&json).unwrap();
        assert_eq!(tips.len(), 2);
        assert_eq!(tips[0].id, EventId::new("t1"));
        assert_eq!(tips[0].message, "");
        assert_eq!(tips[1].name, "mika");
        assert_eq!(tips[1].created_at.to_rfc3339(), "2024-05-01T20:05:00+00:00");
    }

    #[test]
    fn skips_docs_without_id() {
        let json = json!({"docs": [{"donation": {"amount": 1.0}}]});
        assert!(parse_tips(&json).unwrap().is_empty());
    }

    #[test]
    fn rejects_payload_without_docs() {
        assert!(parse_tips(&json!({"data": []})).is_err());
    }

    #[test]
    fn error_body_becomes_api_error() {
        let err = parse_tips(&json!({"error": "Unauthorized"})).unwrap_err();
        assert!(matches!(err, Error::Api { service: "tip", .. }));
    }
}
