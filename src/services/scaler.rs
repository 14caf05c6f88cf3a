//! Throughput adjustment sequence
//!
//! One linear read-modify-write per request: resolve the collection,
//! fetch its offer, add the configured RU increment, write the offer
//! back. There is exactly one external write on the success path and
//! none on any failure path; nothing is retried.

use async_trait::async_trait;
use thiserror::Error;

use super::cosmos::{Collection, CosmosClient, CosmosError, Offer};

/// Errors of the adjustment sequence
#[derive(Error, Debug)]
pub enum ScaleError {
    #[error("Collection '{container}' was not found in database '{database}'")]
    CollectionNotFound { database: String, container: String },

    #[error("No throughput offer found for collection '{0}'")]
    OfferNotFound(String),

    #[error("Throughput increment '{0}' is not an integer")]
    InvalidIncrement(String),

    #[error(transparent)]
    Cosmos(#[from] CosmosError),
}

/// Before/after throughput of a successful adjustment
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScaleOutcome {
    pub previous: i64,
    pub current: i64,
}

/// Control-plane operations the adjustment sequence needs.
///
/// `CosmosClient` is the production implementation; tests drive the
/// sequence against an in-memory fake.
#[async_trait]
pub trait ThroughputControl: Send + Sync {
    async fn find_collection(
        &self,
        database_id: &str,
        container_id: &str,
    ) -> Result<Option<Collection>, CosmosError>;

    async fn offer_for(
        &self,
        collection_self_link: &str,
    ) -> Result<Option<Offer>, CosmosError>;

    async fn replace_offer(&self, offer: &Offer) -> Result<Offer, CosmosError>;
}

#[async_trait]
impl ThroughputControl for CosmosClient {
    async fn find_collection(
        &self,
        database_id: &str,
        container_id: &str,
    ) -> Result<Option<Collection>, CosmosError> {
        CosmosClient::find_collection(self, database_id, container_id).await
    }

    async fn offer_for(
        &self,
        collection_self_link: &str,
    ) -> Result<Option<Offer>, CosmosError> {
        CosmosClient::offer_for(self, collection_self_link).await
    }

    async fn replace_offer(&self, offer: &Offer) -> Result<Offer, CosmosError> {
        CosmosClient::replace_offer(self, offer).await
    }
}

/// Run one throughput adjustment.
///
/// The increment is parsed here, per request, so a bad configuration
/// value fails this request without touching the offer. The new value is
/// not bounds-checked; the control plane rejects values it does not
/// accept.
pub async fn adjust_throughput(
    control: &dyn ThroughputControl,
    database_id: &str,
    container_id: &str,
    increment_raw: &str,
) -> Result<ScaleOutcome, ScaleError> {
    let collection = control
        .find_collection(database_id, container_id)
        .await?
        .ok_or_else(|| ScaleError::CollectionNotFound {
            database: database_id.to_string(),
            container: container_id.to_string(),
        })?;

    let offer = control
        .offer_for(&collection.self_link)
        .await?
        .ok_or_else(|| ScaleError::OfferNotFound(collection.id.clone()))?;

    let current = offer.throughput();
    tracing::info!(throughput_ru = current, "Current provisioned throughput");

    let increment: i64 = increment_raw
        .trim()
        .parse()
        .map_err(|_| ScaleError::InvalidIncrement(increment_raw.to_string()))?;

    let target = current + increment;
    let updated = control.replace_offer(&offer.with_throughput(target)).await?;

    tracing::info!(
        previous_ru = current,
        throughput_ru = updated.throughput(),
        "New provisioned throughput"
    );

    Ok(ScaleOutcome {
        previous: current,
        current: updated.throughput(),
    })
}
