//! In-memory implementation of the port traits.
//!
//! Used by the test suites and by the server when no database is configured.

use std::collections::HashMap;

use anyhow::anyhow;
use async_trait::async_trait;
use chrono::Utc;
use rand::seq::SliceRandom;
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::error::SafiriError;
use crate::ports::{OrderStore, ReferenceData, Result};
use crate::types::*;

/// Reference entities held by a [`MemoryStore`].
#[derive(Clone, Debug, Default)]
pub struct Catalog {
    pub crops: Vec<Crop>,
    pub locations: Vec<Location>,
    pub transporters: Vec<Transporter>,
}

impl Catalog {
    pub fn crop(mut self, name: &str) -> Self {
        self.crops.push(Crop {
            id: Uuid::new_v4(),
            name: name.to_string(),
            active: true,
        });
        self
    }

    pub fn location(mut self, name: &str, role: LocationRole, region: Option<&str>) -> Self {
        self.locations.push(Location {
            id: Uuid::new_v4(),
            name: name.to_string(),
            role,
            region: region.map(str::to_string),
            active: true,
        });
        self
    }

    pub fn transporter(mut self, name: &str, phone: &str, rating: &str) -> Self {
        self.transporters.push(Transporter {
            id: Uuid::new_v4(),
            name: name.to_string(),
            phone: phone.to_string(),
            rating: Some(rating.to_string()),
            vehicle_type: None,
            vehicle_number: None,
            notes: None,
        });
        self
    }

    /// Mbeya-region catalogue used for local runs.
    pub fn demo() -> Self {
        Catalog::default()
            .crop("Mahindi")
            .crop("Viazi")
            .crop("Mpunga")
            .crop("Maharage")
            .location("Mbalali", LocationRole::Pickup, Some("Mbeya"))
            .location("Uyole", LocationRole::Both, Some("Mbeya"))
            .location("Kyela", LocationRole::Pickup, Some("Mbeya"))
            .location("Tunduma", LocationRole::Pickup, Some("Songwe"))
            .location("Soweto", LocationRole::Destination, Some("Mbeya"))
            .location("Mwanjelwa", LocationRole::Destination, Some("Mbeya"))
            .location("Igurusi", LocationRole::Destination, Some("Mbeya"))
            .transporter("Juma Mwalimu", "0754123456", "4.8/5")
            .transporter("Fatuma Hassan", "0765234567", "4.9/5")
            .transporter("Grace Mapunda", "0713345678", "4.6/5")
    }
}

fn by_name_then_id<T>(items: &mut [T], key: impl Fn(&T) -> (&str, Uuid)) {
    items.sort_by(|a, b| key(a).cmp(&key(b)));
}

pub struct MemoryStore {
    catalog: RwLock<Catalog>,
    orders: RwLock<HashMap<String, Order>>,
}

impl MemoryStore {
    pub fn new(catalog: Catalog) -> Self {
        Self {
            catalog: RwLock::new(catalog),
            orders: RwLock::new(HashMap::new()),
        }
    }

    /// Deactivate a crop, as an administrator editing the catalogue would.
    pub async fn deactivate_crop(&self, id: Uuid) {
        let mut catalog = self.catalog.write().await;
        if let Some(crop) = catalog.crops.iter_mut().find(|c| c.id == id) {
            crop.active = false;
        }
    }

    pub async fn deactivate_location(&self, id: Uuid) {
        let mut catalog = self.catalog.write().await;
        if let Some(location) = catalog.locations.iter_mut().find(|l| l.id == id) {
            location.active = false;
        }
    }

    pub async fn order_count(&self) -> usize {
        self.orders.read().await.len()
    }

    /// Store a row as-is, including legacy rows without reference ids.
    pub async fn import_order(&self, order: Order) {
        self.orders
            .write()
            .await
            .insert(order.tracking_number.clone(), order);
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new(Catalog::default())
    }
}

#[async_trait]
impl ReferenceData for MemoryStore {
    async fn list_active_crops(&self) -> Result<Vec<Crop>> {
        let catalog = self.catalog.read().await;
        let mut crops: Vec<Crop> = catalog.crops.iter().filter(|c| c.active).cloned().collect();
        by_name_then_id(&mut crops, |c| (c.name.as_str(), c.id));
        Ok(crops)
    }

    async fn list_locations(&self, filter: LocationFilter) -> Result<Vec<Location>> {
        let catalog = self.catalog.read().await;
        let mut locations: Vec<Location> = catalog
            .locations
            .iter()
            .filter(|l| l.active && filter.admits(l.role))
            .cloned()
            .collect();
        by_name_then_id(&mut locations, |l| (l.name.as_str(), l.id));
        Ok(locations)
    }

    async fn pick_random_transporter(&self) -> Result<Option<Transporter>> {
        let catalog = self.catalog.read().await;
        let picked = catalog.transporters.choose(&mut rand::thread_rng()).cloned();
        Ok(picked)
    }

    async fn entity_name(&self, kind: EntityKind, id: Uuid) -> Result<Option<String>> {
        let catalog = self.catalog.read().await;
        let name = match kind {
            EntityKind::Crop => catalog.crops.iter().find(|c| c.id == id).map(|c| &c.name),
            EntityKind::Location => catalog
                .locations
                .iter()
                .find(|l| l.id == id)
                .map(|l| &l.name),
            EntityKind::Transporter => catalog
                .transporters
                .iter()
                .find(|t| t.id == id)
                .map(|t| &t.name),
        };
        Ok(name.cloned())
    }

    async fn get_transporter(&self, id: Uuid) -> Result<Option<Transporter>> {
        let catalog = self.catalog.read().await;
        Ok(catalog.transporters.iter().find(|t| t.id == id).cloned())
    }
}

#[async_trait]
impl OrderStore for MemoryStore {
    async fn insert_order(&self, order: &NewOrder) -> Result<Order> {
        let mut orders = self.orders.write().await;
        if orders.contains_key(&order.tracking_number) {
            return Err(SafiriError::Conflict(format!(
                "tracking number {} already exists",
                order.tracking_number
            )));
        }
        let stored = order.clone().into_order(Uuid::new_v4(), Utc::now());
        orders.insert(stored.tracking_number.clone(), stored.clone());
        Ok(stored)
    }

    async fn find_by_tracking_number(&self, tracking_number: &str) -> Result<Option<Order>> {
        Ok(self.orders.read().await.get(tracking_number).cloned())
    }

    async fn list_orders(&self, limit: u32) -> Result<Vec<Order>> {
        let orders = self.orders.read().await;
        let mut list: Vec<Order> = orders.values().cloned().collect();
        list.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        list.truncate(limit as usize);
        Ok(list)
    }

    async fn update_status(&self, tracking_number: &str, status: &str) -> Result<Order> {
        let mut orders = self.orders.write().await;
        let order = orders
            .get_mut(tracking_number)
            .ok_or_else(|| SafiriError::NotFound(format!("order {tracking_number}")))?;
        order.status = status.to_string();
        order.status_updated_at = Utc::now();
        Ok(order.clone())
    }
}

/// Store whose every call fails; exercises the store-failure paths.
pub struct UnavailableStore;

#[async_trait]
impl ReferenceData for UnavailableStore {
    async fn list_active_crops(&self) -> Result<Vec<Crop>> {
        Err(anyhow!("store unavailable").into())
    }

    async fn list_locations(&self, _filter: LocationFilter) -> Result<Vec<Location>> {
        Err(anyhow!("store unavailable").into())
    }

    async fn pick_random_transporter(&self) -> Result<Option<Transporter>> {
        Err(anyhow!("store unavailable").into())
    }

    async fn entity_name(&self, _kind: EntityKind, _id: Uuid) -> Result<Option<String>> {
        Err(anyhow!("store unavailable").into())
    }

    async fn get_transporter(&self, _id: Uuid) -> Result<Option<Transporter>> {
        Err(anyhow!("store unavailable").into())
    }
}

#[async_trait]
impl OrderStore for UnavailableStore {
    async fn insert_order(&self, _order: &NewOrder) -> Result<Order> {
        Err(anyhow!("store unavailable").into())
    }

    async fn find_by_tracking_number(&self, _tracking_number: &str) -> Result<Option<Order>> {
        Err(anyhow!("store unavailable").into())
    }

    async fn list_orders(&self, _limit: u32) -> Result<Vec<Order>> {
        Err(anyhow!("store unavailable").into())
    }

    async fn update_status(&self, _tracking_number: &str, _status: &str) -> Result<Order> {
        Err(anyhow!("store unavailable").into())
    }
}
