//! Services module
//!
//! Contains the Cosmos DB control-plane client and the throughput
//! adjustment sequence built on top of it.

pub mod cosmos;
pub mod scaler;

pub use cosmos::{Collection, CosmosClient, CosmosError, Offer};
pub use scaler::{adjust_throughput, ScaleError, ScaleOutcome, ThroughputControl};
