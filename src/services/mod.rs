//! Orchestration layer.
//!
//! [`AlertService`] owns the feature state and exposes the ingestion ports;
//! [`ingress`] feeds it from a JSON-lines stream.

pub mod alerts;
pub mod ingress;

pub use alerts::AlertService;
pub use ingress::IngressEvent;
