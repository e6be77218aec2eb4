//! Port traits consumed by the USSD core.
//!
//! The state machine and committer only ever reach storage through these two
//! narrow interfaces. `MemoryStore` implements both for tests and demos; the
//! `safiri_postgres` crate implements them against Postgres.

use async_trait::async_trait;
use uuid::Uuid;

use crate::error::SafiriError;
use crate::types::{Crop, EntityKind, Location, LocationFilter, NewOrder, Order, Transporter};

pub type Result<T> = std::result::Result<T, SafiriError>;

/// Read-mostly catalogue of crops, locations and transporters.
///
/// List methods must return a total order: by name, ties broken by id.
/// Menu indices are re-resolved against these lists on every request.
#[async_trait]
pub trait ReferenceData: Send + Sync {
    /// Active crops ordered by `(name, id)`.
    async fn list_active_crops(&self) -> Result<Vec<Crop>>;

    /// Active locations admitted by `filter`, ordered by `(name, id)`.
    async fn list_locations(&self, filter: LocationFilter) -> Result<Vec<Location>>;

    /// Uniform random pick across all transporters. `None` when there are none.
    async fn pick_random_transporter(&self) -> Result<Option<Transporter>>;

    /// Display name of a referenced entity, if it still exists.
    async fn entity_name(&self, kind: EntityKind, id: Uuid) -> Result<Option<String>>;

    /// Contact details for a transporter.
    async fn get_transporter(&self, id: Uuid) -> Result<Option<Transporter>>;
}

#[async_trait]
pub trait OrderStore: Send + Sync {
    /// Single-row insert. Returns the stored order.
    async fn insert_order(&self, order: &NewOrder) -> Result<Order>;

    async fn find_by_tracking_number(&self, tracking_number: &str) -> Result<Option<Order>>;

    /// Newest first.
    async fn list_orders(&self, limit: u32) -> Result<Vec<Order>>;

    /// Replace the status text and bump `status_updated_at`.
    async fn update_status(&self, tracking_number: &str, status: &str) -> Result<Order>;
}
