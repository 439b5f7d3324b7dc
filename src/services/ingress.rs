//! JSON-lines event ingress.
//!
//! Glue processes (chat bridge, pub/sub bridge) write one JSON object per
//! line; each is decoded into an [`IngressEvent`] and forwarded to the
//! matching [`AlertService`] port. Undecodable lines are logged and skipped.

use chrono::{DateTime, Utc};
use serde::Deserialize;
use tokio::io::{AsyncBufRead, AsyncBufReadExt};
use tracing::{debug, info, warn};

use crate::error::{Error, Result};
use crate::goals::SubTier;
use crate::services::alerts::AlertService;
use crate::shutdown::ShutdownListener;
use crate::types::{EventId, RedemptionEvent};

/// One inbound platform event.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum IngressEvent {
    /// A chat line.
    ChatMessage {
        /// Raw message text, cheer tokens included.
        text: String,
        /// Sender.
        display_name: String,
        /// Bits cheered with the message.
        #[serde(default)]
        bits: u32,
        /// Sent by the channel owner.
        #[serde(default)]
        is_broadcaster: bool,
    },
    /// A channel-point redemption.
    RewardRedeemed(RedemptionEvent),
    /// A donation-platform payment.
    Donation(Payment),
    /// A tip-platform payment.
    Tip(Payment),
    /// A new or renewed subscription.
    Subscription {
        /// Subscriber.
        name: String,
        /// Platform plan code (`1000`, `2000`, `3000`, `Prime`).
        #[serde(default)]
        plan: String,
    },
}

/// Donation or tip payload.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Payment {
    /// Platform id, shared with the poller so each payment alerts once.
    pub id: EventId,
    /// Amount in currency units.
    pub amount: f64,
    /// Payer display name.
    pub name: String,
    /// Note left with the payment.
    #[serde(default)]
    pub message: String,
    /// When it was made; now if absent.
    #[serde(default = "Utc::now")]
    pub timestamp: DateTime<Utc>,
}

impl IngressEvent {
    /// Decode one line.
    pub fn parse(line: &str) -> Result<Self> {
        serde_json::from_str(line).map_err(|e| Error::parse(format!("Invalid ingress event: {e}"), None))
    }

    /// Forward to the matching ingestion port.
    pub async fn dispatch(self, service: &AlertService) {
        match self {
            Self::ChatMessage {
                text,
                display_name,
                bits,
                is_broadcaster,
            } => service.on_chat_message(&text, &display_name, bits, is_broadcaster).await,
            Self::RewardRedeemed(event) => service.on_reward_redeemed(event).await,
            Self::Donation(p) => {
                service
                    .on_donation(&p.id, p.amount, &p.name, &p.message, p.timestamp)
                    .await;
            }
            Self::Tip(p) => service.on_tip(&p.id, p.amount, &p.name, &p.message, p.timestamp).await,
            Self::Subscription { name, plan } => {
                service.on_subscription(&name, SubTier::from_plan(&plan)).await;
            }
        }
    }
}

/// Read events from `reader` until EOF or shutdown. Returns how many were dispatched.
pub async fn pump<R>(reader: R, service: &AlertService, mut shutdown: ShutdownListener) -> usize
where
    R: AsyncBufRead + Unpin,
{
    let mut lines = reader.lines();
    let mut dispatched = 0;

    loop {
        let line = tokio::select! {
            line = lines.next_line() => line,
            () = shutdown.triggered() => break,
        };
        let line = match line {
            Ok(Some(line)) => line,
            Ok(None) => {
                info!("ingress closed");
                break;
            }
            Err(e) => {
                warn!("Failed to read ingress: {e}");
                break;
            }
        };
        if line.trim().is_empty() {
            continue;
        }
        match IngressEvent::parse(&line) {
            Ok(event) => {
                debug!(?event, "ingress event");
                event.dispatch(service).await;
                dispatched += 1;
            }
            Err(e) => warn!("{e}"),
        }
    }
    dispatched
}

#[cfg(test)]
mod tests {
    #![allow(clippy::expect_used, clippy::unwrap_used)]

    use super::*;

    #[test]
    fn decodes_chat_with_defaults() {
        let event = IngressEvent::parse(r#"{"type":"chat_message","text":"!hype","display_name":"kim"}"#).unwrap();
        assert_eq!(
            event,
            IngressEvent::ChatMessage {
                text: "!hype".into(),
                display_name: "kim".into(),
                bits: 0,
                is_broadcaster: false,
            }
        );
    }

    #[test]
    fn decodes_redemption_inline() {
        let line = r#"{"type":"reward_redeemed","id":"r-9","display_name":"Mika",
                       "reward_title":"Hydrate","cost":300}"#;
        match IngressEvent::parse(line).unwrap() {
            IngressEvent::RewardRedeemed(event) => {
                assert_eq!(event.id, EventId::new("r-9"));
                assert_eq!(event.cost, 300);
                assert!(event.message.is_empty());
            }
            other => unreachable!("unexpected {other:?}"),
        }
    }

    #[test]
    fn decodes_tip_with_timestamp() {
        let line = r#"{"type":"tip","id":"t1","amount":4.5,"name":"jo","timestamp":"2024-05-01T20:00:00Z"}"#;
        match IngressEvent::parse(line).unwrap() {
            IngressEvent::Tip(p) => {
                assert!((p.amount - 4.5).abs() < f64::EPSILON);
                assert_eq!(p.timestamp.to_rfc3339(), "2024-05-01T20:00:00+00:00");
            }
            other => unreachable!("unexpected {other:?}"),
        }
    }

    #[test]
    fn rejects_unknown_type() {
        assert!(IngressEvent::parse(r#"{"type":"raid","from":"x"}"#).is_err());
        assert!(IngressEvent::parse("not json").is_err());
    }
}
