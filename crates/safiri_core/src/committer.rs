//! Order commit: tracking number, transporter assignment, single insert.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use rand::Rng;
use thiserror::Error;

use crate::error::SafiriError;
use crate::ports::{OrderStore, ReferenceData};
use crate::types::{Crop, Location, NewOrder, INITIAL_ORDER_STATUS, TRACKING_PREFIX};

/// `TRK` + `yyMMdd` + four random digits.
pub fn generate_tracking_number<R: Rng + ?Sized>(now: DateTime<Utc>, rng: &mut R) -> String {
    format!(
        "{TRACKING_PREFIX}{}{:04}",
        now.format("%y%m%d"),
        rng.gen_range(0..10_000)
    )
}

/// True for strings the generator could have produced.
pub fn is_generated_tracking_number(code: &str) -> bool {
    code.strip_prefix(TRACKING_PREFIX)
        .is_some_and(|rest| rest.len() == 10 && rest.bytes().all(|b| b.is_ascii_digit()))
}

#[derive(Debug, Error)]
pub enum CommitError {
    #[error("no transporter available")]
    NoTransporter,

    #[error(transparent)]
    Store(#[from] SafiriError),
}

/// Fully resolved transport request, ready to persist.
#[derive(Clone, Debug)]
pub struct CommitRequest {
    pub phone_number: String,
    pub crop: Crop,
    pub quantity: i32,
    pub pickup: Location,
    pub destination: Location,
}

/// What the requester is told once the order is stored.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Confirmation {
    pub tracking_number: String,
    pub crop: String,
    pub quantity: i32,
    pub pickup: String,
    pub destination: String,
    pub transporter_name: String,
    pub transporter_phone: String,
}

pub struct OrderCommitter {
    reference: Arc<dyn ReferenceData>,
    orders: Arc<dyn OrderStore>,
}

impl OrderCommitter {
    pub fn new(reference: Arc<dyn ReferenceData>, orders: Arc<dyn OrderStore>) -> Self {
        Self { reference, orders }
    }

    pub async fn commit(&self, request: CommitRequest) -> Result<Confirmation, CommitError> {
        let transporter = self
            .reference
            .pick_random_transporter()
            .await?
            .ok_or(CommitError::NoTransporter)?;

        let tracking_number = generate_tracking_number(Utc::now(), &mut rand::thread_rng());
        let new_order = NewOrder {
            tracking_number,
            phone_number: request.phone_number,
            crop: request.crop,
            quantity: request.quantity,
            pickup: request.pickup,
            destination: request.destination,
            transporter,
            status: INITIAL_ORDER_STATUS.to_string(),
        };

        let stored = self.orders.insert_order(&new_order).await?;
        tracing::info!(
            tracking_number = %stored.tracking_number,
            transporter_id = %new_order.transporter.id,
            quantity = stored.quantity,
            "order committed"
        );

        Ok(Confirmation {
            tracking_number: stored.tracking_number,
            crop: new_order.crop.name,
            quantity: new_order.quantity,
            pickup: new_order.pickup.name,
            destination: new_order.destination.name,
            transporter_name: new_order.transporter.name,
            transporter_phone: new_order.transporter.phone,
        })
    }
}
