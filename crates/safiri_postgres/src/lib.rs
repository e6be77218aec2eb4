//! Safiri PostgreSQL adapter.
//!
//! Implements the `safiri_core` port traits over a shared `PgPool`.

pub mod store;

use sqlx::PgPool;

pub use store::{PgOrderStore, PgReferenceData};

/// All Postgres port implementations, built from one pool.
pub struct PgStores {
    pub reference: PgReferenceData,
    pub orders: PgOrderStore,
}

impl PgStores {
    pub fn new(pool: PgPool) -> Self {
        Self {
            reference: PgReferenceData::new(pool.clone()),
            orders: PgOrderStore::new(pool),
        }
    }
}
