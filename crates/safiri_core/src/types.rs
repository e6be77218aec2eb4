use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

// ─── Constants ────────────────────────────────────────────────

/// Status written on every newly committed order.
pub const INITIAL_ORDER_STATUS: &str =
    "Ombi limepokelewa na Msafirishaji atawasiliana na wewe hivi karibuni";

/// Prefix shared by every tracking number.
pub const TRACKING_PREFIX: &str = "TRK";

/// Shortest code accepted at the tracking prompt.
pub const TRACKING_MIN_LEN: usize = 9;

// ─── Reference data ───────────────────────────────────────────

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Crop {
    pub id: Uuid,
    pub name: String,
    pub active: bool,
}

/// Which end of a trip a location may serve.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LocationRole {
    Pickup,
    Destination,
    Both,
}

impl LocationRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pickup => "pickup",
            Self::Destination => "destination",
            Self::Both => "both",
        }
    }
}

impl fmt::Display for LocationRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for LocationRole {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pickup" => Ok(Self::Pickup),
            "destination" => Ok(Self::Destination),
            "both" => Ok(Self::Both),
            other => Err(format!("unknown location role '{other}'")),
        }
    }
}

/// The two derived location views offered by the menu.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LocationFilter {
    PickupEligible,
    DestinationEligible,
}

impl LocationFilter {
    pub fn admits(&self, role: LocationRole) -> bool {
        matches!(
            (self, role),
            (_, LocationRole::Both)
                | (Self::PickupEligible, LocationRole::Pickup)
                | (Self::DestinationEligible, LocationRole::Destination)
        )
    }

    /// Roles admitted by this view, for stores that filter in SQL.
    pub fn roles(&self) -> [LocationRole; 2] {
        match self {
            Self::PickupEligible => [LocationRole::Pickup, LocationRole::Both],
            Self::DestinationEligible => [LocationRole::Destination, LocationRole::Both],
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Location {
    pub id: Uuid,
    pub name: String,
    pub role: LocationRole,
    pub region: Option<String>,
    pub active: bool,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Transporter {
    pub id: Uuid,
    pub name: String,
    pub phone: String,
    pub rating: Option<String>,
    pub vehicle_type: Option<String>,
    pub vehicle_number: Option<String>,
    pub notes: Option<String>,
}

/// Kinds of reference entity an order points at.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum EntityKind {
    Crop,
    Location,
    Transporter,
}

// ─── Orders ───────────────────────────────────────────────────

/// A committed transport request.
///
/// Reference ids are optional because rows imported from the flat-file era
/// carry only the denormalized names.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Order {
    pub order_id: Uuid,
    pub tracking_number: String,
    pub phone_number: String,
    pub crop_id: Option<Uuid>,
    pub quantity: i32,
    pub pickup_location_id: Option<Uuid>,
    pub destination_location_id: Option<Uuid>,
    pub transporter_id: Option<Uuid>,
    pub status: String,
    pub created_at: DateTime<Utc>,
    pub status_updated_at: DateTime<Utc>,
    pub crop_name: Option<String>,
    pub pickup_name: Option<String>,
    pub destination_name: Option<String>,
    pub transporter_name: Option<String>,
    pub transporter_phone: Option<String>,
}

/// Insert payload produced by the order committer.
#[derive(Clone, Debug, PartialEq)]
pub struct NewOrder {
    pub tracking_number: String,
    pub phone_number: String,
    pub crop: Crop,
    pub quantity: i32,
    pub pickup: Location,
    pub destination: Location,
    pub transporter: Transporter,
    pub status: String,
}

impl NewOrder {
    /// The row as it will read back from the store.
    pub fn into_order(self, order_id: Uuid, now: DateTime<Utc>) -> Order {
        Order {
            order_id,
            tracking_number: self.tracking_number,
            phone_number: self.phone_number,
            crop_id: Some(self.crop.id),
            quantity: self.quantity,
            pickup_location_id: Some(self.pickup.id),
            destination_location_id: Some(self.destination.id),
            transporter_id: Some(self.transporter.id),
            status: self.status,
            created_at: now,
            status_updated_at: now,
            crop_name: Some(self.crop.name),
            pickup_name: Some(self.pickup.name),
            destination_name: Some(self.destination.name),
            transporter_name: Some(self.transporter.name),
            transporter_phone: Some(self.transporter.phone),
        }
    }
}
