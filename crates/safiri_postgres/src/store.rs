//! Postgres implementations of the safiri_core port traits.
//!
//! All SQL is runtime-checked (sqlx::query_as, not sqlx::query!) so the
//! crate builds without a database. Expected tables, schema `safiri`:
//!
//! ```text
//! crops         (crop_id uuid pk, name text, active bool)
//! locations     (location_id uuid pk, name text, role text, region text null, active bool)
//! transporters  (transporter_id uuid pk, name text, phone text, rating text null,
//!                vehicle_type text null, vehicle_number text null, notes text null)
//! orders        (order_id uuid pk, tracking_number text unique, phone_number text,
//!                crop_id uuid null, quantity int4, pickup_location_id uuid null,
//!                destination_location_id uuid null, transporter_id uuid null,
//!                status text, created_at timestamptz, status_updated_at timestamptz,
//!                crop_name, pickup_name, destination_name,
//!                transporter_name, transporter_phone  text null)
//! ```
//!
//! `role` holds `pickup`, `destination` or `both`.

use anyhow::anyhow;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use safiri_core::error::SafiriError;
use safiri_core::ports::{OrderStore, ReferenceData, Result};
use safiri_core::types::*;

// ── Row types ─────────────────────────────────────────────────

#[derive(Debug, sqlx::FromRow)]
struct PgCropRow {
    crop_id: Uuid,
    name: String,
    active: bool,
}

impl From<PgCropRow> for Crop {
    fn from(r: PgCropRow) -> Self {
        Crop {
            id: r.crop_id,
            name: r.name,
            active: r.active,
        }
    }
}

#[derive(Debug, sqlx::FromRow)]
struct PgLocationRow {
    location_id: Uuid,
    name: String,
    role: String,
    region: Option<String>,
    active: bool,
}

impl TryFrom<PgLocationRow> for Location {
    type Error = String;

    fn try_from(r: PgLocationRow) -> std::result::Result<Self, Self::Error> {
        Ok(Location {
            id: r.location_id,
            name: r.name,
            role: r.role.parse()?,
            region: r.region,
            active: r.active,
        })
    }
}

#[derive(Debug, sqlx::FromRow)]
struct PgTransporterRow {
    transporter_id: Uuid,
    name: String,
    phone: String,
    rating: Option<String>,
    vehicle_type: Option<String>,
    vehicle_number: Option<String>,
    notes: Option<String>,
}

impl From<PgTransporterRow> for Transporter {
    fn from(r: PgTransporterRow) -> Self {
        Transporter {
            id: r.transporter_id,
            name: r.name,
            phone: r.phone,
            rating: r.rating,
            vehicle_type: r.vehicle_type,
            vehicle_number: r.vehicle_number,
            notes: r.notes,
        }
    }
}

#[derive(Debug, sqlx::FromRow)]
struct PgOrderRow {
    order_id: Uuid,
    tracking_number: String,
    phone_number: String,
    crop_id: Option<Uuid>,
    quantity: i32,
    pickup_location_id: Option<Uuid>,
    destination_location_id: Option<Uuid>,
    transporter_id: Option<Uuid>,
    status: String,
    created_at: DateTime<Utc>,
    status_updated_at: DateTime<Utc>,
    crop_name: Option<String>,
    pickup_name: Option<String>,
    destination_name: Option<String>,
    transporter_name: Option<String>,
    transporter_phone: Option<String>,
}

impl From<PgOrderRow> for Order {
    fn from(r: PgOrderRow) -> Self {
        Order {
            order_id: r.order_id,
            tracking_number: r.tracking_number,
            phone_number: r.phone_number,
            crop_id: r.crop_id,
            quantity: r.quantity,
            pickup_location_id: r.pickup_location_id,
            destination_location_id: r.destination_location_id,
            transporter_id: r.transporter_id,
            status: r.status,
            created_at: r.created_at,
            status_updated_at: r.status_updated_at,
            crop_name: r.crop_name,
            pickup_name: r.pickup_name,
            destination_name: r.destination_name,
            transporter_name: r.transporter_name,
            transporter_phone: r.transporter_phone,
        }
    }
}

const ORDER_COLUMNS: &str = r#"
    order_id, tracking_number, phone_number, crop_id, quantity,
    pickup_location_id, destination_location_id, transporter_id,
    status, created_at, status_updated_at,
    crop_name, pickup_name, destination_name,
    transporter_name, transporter_phone
"#;

const TRANSPORTER_COLUMNS: &str =
    "transporter_id, name, phone, rating, vehicle_type, vehicle_number, notes";

// ── PgReferenceData ───────────────────────────────────────────

/// Postgres-backed crops, locations and transporters.
pub struct PgReferenceData {
    pool: PgPool,
}

impl PgReferenceData {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl ReferenceData for PgReferenceData {
    async fn list_active_crops(&self) -> Result<Vec<Crop>> {
        let rows = sqlx::query_as::<_, PgCropRow>(
            r#"
            SELECT crop_id, name, active
            FROM safiri.crops
            WHERE active
            ORDER BY name, crop_id
            "#,
        )
        .fetch_all(&self.pool)
        .await
        .map_err(|e| anyhow!(e))?;
        Ok(rows.into_iter().map(Crop::from).collect())
    }

    async fn list_locations(&self, filter: LocationFilter) -> Result<Vec<Location>> {
        let roles: Vec<String> = filter
            .roles()
            .iter()
            .map(|r| r.as_str().to_string())
            .collect();
        let rows = sqlx::query_as::<_, PgLocationRow>(
            r#"
            SELECT location_id, name, role, region, active
            FROM safiri.locations
            WHERE active
              AND role = ANY($1)
            ORDER BY name, location_id
            "#,
        )
        .bind(&roles)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| anyhow!(e))?;
        rows.into_iter()
            .map(|r| Location::try_from(r).map_err(|e| SafiriError::Internal(anyhow!(e))))
            .collect()
    }

    async fn pick_random_transporter(&self) -> Result<Option<Transporter>> {
        let query = format!(
            "SELECT {TRANSPORTER_COLUMNS} FROM safiri.transporters ORDER BY random() LIMIT 1"
        );
        let row = sqlx::query_as::<_, PgTransporterRow>(&query)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| anyhow!(e))?;
        Ok(row.map(Transporter::from))
    }

    async fn entity_name(&self, kind: EntityKind, id: Uuid) -> Result<Option<String>> {
        let (table, key) = match kind {
            EntityKind::Crop => ("safiri.crops", "crop_id"),
            EntityKind::Location => ("safiri.locations", "location_id"),
            EntityKind::Transporter => ("safiri.transporters", "transporter_id"),
        };
        let query = format!("SELECT name FROM {table} WHERE {key} = $1");
        let name: Option<(String,)> = sqlx::query_as(&query)
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| anyhow!(e))?;
        Ok(name.map(|(n,)| n))
    }

    async fn get_transporter(&self, id: Uuid) -> Result<Option<Transporter>> {
        let query =
            format!("SELECT {TRANSPORTER_COLUMNS} FROM safiri.transporters WHERE transporter_id = $1");
        let row = sqlx::query_as::<_, PgTransporterRow>(&query)
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| anyhow!(e))?;
        Ok(row.map(Transporter::from))
    }
}

// ── PgOrderStore ──────────────────────────────────────────────

/// Postgres-backed transport orders.
pub struct PgOrderStore {
    pool: PgPool,
}

impl PgOrderStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl OrderStore for PgOrderStore {
    async fn insert_order(&self, order: &NewOrder) -> Result<Order> {
        let query = format!(
            r#"
            INSERT INTO safiri.orders (
                order_id, tracking_number, phone_number, crop_id, quantity,
                pickup_location_id, destination_location_id, transporter_id,
                status, created_at, status_updated_at,
                crop_name, pickup_name, destination_name,
                transporter_name, transporter_phone
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, now(), now(),
                    $10, $11, $12, $13, $14)
            RETURNING {ORDER_COLUMNS}
            "#
        );
        let row = sqlx::query_as::<_, PgOrderRow>(&query)
            .bind(Uuid::new_v4())
            .bind(&order.tracking_number)
            .bind(&order.phone_number)
            .bind(order.crop.id)
            .bind(order.quantity)
            .bind(order.pickup.id)
            .bind(order.destination.id)
            .bind(order.transporter.id)
            .bind(&order.status)
            .bind(&order.crop.name)
            .bind(&order.pickup.name)
            .bind(&order.destination.name)
            .bind(&order.transporter.name)
            .bind(&order.transporter.phone)
            .fetch_one(&self.pool)
            .await
            .map_err(|e| match e {
                sqlx::Error::Database(ref db) if db.is_unique_violation() => {
                    SafiriError::Conflict(format!(
                        "tracking number {} already exists",
                        order.tracking_number
                    ))
                }
                other => SafiriError::Internal(anyhow!(other)),
            })?;
        tracing::debug!(tracking_number = %row.tracking_number, "order row inserted");
        Ok(row.into())
    }

    async fn find_by_tracking_number(&self, tracking_number: &str) -> Result<Option<Order>> {
        let query = format!("SELECT {ORDER_COLUMNS} FROM safiri.orders WHERE tracking_number = $1");
        let row = sqlx::query_as::<_, PgOrderRow>(&query)
            .bind(tracking_number)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| anyhow!(e))?;
        Ok(row.map(Order::from))
    }

    async fn list_orders(&self, limit: u32) -> Result<Vec<Order>> {
        let query = format!(
            "SELECT {ORDER_COLUMNS} FROM safiri.orders ORDER BY created_at DESC LIMIT $1"
        );
        let rows = sqlx::query_as::<_, PgOrderRow>(&query)
            .bind(i64::from(limit))
            .fetch_all(&self.pool)
            .await
            .map_err(|e| anyhow!(e))?;
        Ok(rows.into_iter().map(Order::from).collect())
    }

    async fn update_status(&self, tracking_number: &str, status: &str) -> Result<Order> {
        let query = format!(
            r#"
            UPDATE safiri.orders
            SET status = $2, status_updated_at = now()
            WHERE tracking_number = $1
            RETURNING {ORDER_COLUMNS}
            "#
        );
        let row = sqlx::query_as::<_, PgOrderRow>(&query)
            .bind(tracking_number)
            .bind(status)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| anyhow!(e))?;
        row.map(Order::from)
            .ok_or_else(|| SafiriError::NotFound(format!("order {tracking_number}")))
    }
}

#[cfg(test)]
mod tests {
    //! Run with: DATABASE_URL="postgresql:///safiri" cargo test -p safiri_postgres -- --ignored

    use super::*;
    use safiri_core::committer::generate_tracking_number;
    use sqlx::postgres::PgPoolOptions;

    async fn stores() -> crate::PgStores {
        let database_url =
            std::env::var("DATABASE_URL").expect("DATABASE_URL must be set for postgres tests");
        let pool = PgPoolOptions::new()
            .max_connections(2)
            .connect(&database_url)
            .await
            .expect("failed to connect to test database");
        crate::PgStores::new(pool)
    }

    #[tokio::test]
    #[ignore] // requires DATABASE_URL
    async fn active_crops_are_name_ordered() {
        let stores = stores().await;
        let crops = stores.reference.list_active_crops().await.unwrap();
        let keys: Vec<(&str, Uuid)> = crops.iter().map(|c| (c.name.as_str(), c.id)).collect();
        let mut sorted = keys.clone();
        sorted.sort();
        assert_eq!(keys, sorted);
        assert!(crops.iter().all(|c| c.active));
    }

    #[tokio::test]
    #[ignore] // requires DATABASE_URL
    async fn location_views_respect_roles() {
        let stores = stores().await;
        let pickups = stores
            .reference
            .list_locations(LocationFilter::PickupEligible)
            .await
            .unwrap();
        assert!(pickups
            .iter()
            .all(|l| LocationFilter::PickupEligible.admits(l.role)));
    }

    #[tokio::test]
    #[ignore] // requires DATABASE_URL
    async fn order_insert_lookup_and_status_update() {
        let stores = stores().await;
        let reference = &stores.reference;
        let crop = reference.list_active_crops().await.unwrap().remove(0);
        let pickup = reference
            .list_locations(LocationFilter::PickupEligible)
            .await
            .unwrap()
            .remove(0);
        let destination = reference
            .list_locations(LocationFilter::DestinationEligible)
            .await
            .unwrap()
            .into_iter()
            .find(|l| l.id != pickup.id)
            .expect("need a destination distinct from the pickup");
        let transporter = reference.pick_random_transporter().await.unwrap().unwrap();

        let tracking_number = generate_tracking_number(Utc::now(), &mut rand::thread_rng());
        let new_order = NewOrder {
            tracking_number: tracking_number.clone(),
            phone_number: "+255700000000".into(),
            crop,
            quantity: 12,
            pickup,
            destination,
            transporter,
            status: INITIAL_ORDER_STATUS.into(),
        };
        let inserted = stores.orders.insert_order(&new_order).await.unwrap();
        assert_eq!(inserted.quantity, 12);

        let dup = stores.orders.insert_order(&new_order).await.unwrap_err();
        assert_eq!(dup.http_status(), 409);

        let found = stores
            .orders
            .find_by_tracking_number(&tracking_number)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(found.order_id, inserted.order_id);

        let updated = stores
            .orders
            .update_status(&tracking_number, "Imesafirishwa")
            .await
            .unwrap();
        assert_eq!(updated.status, "Imesafirishwa");
        assert!(updated.status_updated_at >= inserted.status_updated_at);
    }
}
