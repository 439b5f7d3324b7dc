//! Channel-point redemptions: the alert catalog, routing and the giveaway pool.

pub mod catalog;
pub mod giveaway;
pub mod router;

pub use catalog::{AlertDefinition, MoneyAlert, RedemptionCatalog, TriggerGate};
pub use giveaway::Giveaway;
pub use router::{route, RouteAction};
