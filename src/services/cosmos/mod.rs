//! Cosmos DB control-plane REST client
//!
//! Implements the three collaborator operations the service needs: list
//! the collections of a database, query the offer (throughput record) of
//! a collection, and replace an offer. Requests are authorized with the
//! account master key (HMAC-SHA256 over the canonical request fields).

pub mod auth;
pub mod client;
pub mod models;

pub use auth::MasterKey;
pub use client::{CosmosClient, CosmosError};
pub use models::{Collection, Offer, OfferContent};
