//! The menu state machine.
//!
//! Position is keyed by token count and the leading token. Every list a
//! numeric choice points into is re-fetched and re-indexed on each request,
//! so a fixed reference snapshot always resolves a path to the same entities.
//!
//! ```text
//! ""            root
//! 1             crop list
//! 1*c           quantity prompt          (c: crop position)
//! 1*c*q         pickup list              (q: bags)
//! 1*c*q*p       destination list         (p: pickup position)
//! 1*c*q*p*d     commit                   (d: destination position)
//! 2             tracking prompt
//! 2*code        order status
//! 3             contact
//! 0             goodbye
//! ```

use std::sync::Arc;

use crate::committer::{CommitError, CommitRequest, OrderCommitter};
use crate::ports::{OrderStore, ReferenceData, Result};
use crate::settings::UssdSettings;
use crate::types::{Crop, EntityKind, Location, LocationFilter, Order};

use super::menus::{self, OrderStatusView, INVALID_CHOICE_BANNER, INVALID_QUANTITY_BANNER};
use super::path::{
    is_tracking_code_shaped, normalize_tracking_code, parse_index, parse_quantity, BACK, CONTACT,
    EXIT, REQUEST_TRANSPORT, TRACK_ORDER,
};
use super::UssdReply;

const NOT_AVAILABLE: &str = "N/A";

/// Resolution of an earlier, already-answered menu choice.
enum Earlier<T> {
    Resolved(T),
    /// The choice no longer maps into the live list.
    Stale,
}

fn is_corrected_index(earlier: &str, next: &str, len: usize) -> bool {
    parse_index(earlier, len).is_none() && parse_index(next, len).is_some()
}

macro_rules! resolve_or_restart {
    ($expr:expr) => {
        match $expr {
            Earlier::Resolved(value) => value,
            Earlier::Stale => return Ok(menus::restart_required()),
        }
    };
}

pub struct StepResolver {
    reference: Arc<dyn ReferenceData>,
    orders: Arc<dyn OrderStore>,
    committer: OrderCommitter,
    settings: UssdSettings,
}

impl StepResolver {
    pub fn new(
        reference: Arc<dyn ReferenceData>,
        orders: Arc<dyn OrderStore>,
        settings: UssdSettings,
    ) -> Self {
        let committer = OrderCommitter::new(Arc::clone(&reference), Arc::clone(&orders));
        Self {
            reference,
            orders,
            committer,
            settings,
        }
    }

    pub fn settings(&self) -> &UssdSettings {
        &self.settings
    }

    /// Answer the request whose effective tokens are `tokens`.
    ///
    /// Store failures propagate as `Err`; every other outcome, including
    /// invalid input and stale choices, is a rendered reply.
    pub async fn resolve(&self, tokens: &[&str], phone_number: &str) -> Result<UssdReply> {
        match tokens {
            [] => Ok(menus::root()),
            [REQUEST_TRANSPORT, rest @ ..] => self.request_transport(rest, phone_number).await,
            [TRACK_ORDER] => Ok(menus::tracking_prompt()),
            [TRACK_ORDER, code] => self.track(code).await,
            [CONTACT] => Ok(menus::contact()),
            [EXIT] => Ok(menus::goodbye()),
            [_, .., last] if *last == BACK => Ok(menus::root()),
            _ => Ok(menus::invalid_option()),
        }
    }

    // ── Transport request ─────────────────────────────────────

    async fn request_transport(&self, rest: &[&str], phone_number: &str) -> Result<UssdReply> {
        let rest = self.drop_corrected_indices(rest).await?;
        match rest.as_slice() {
            [] => self.crop_menu(None).await,

            [c] => {
                if *c == BACK {
                    return Ok(menus::root());
                }
                let crops = self.reference.list_active_crops().await?;
                match parse_index(c, crops.len()) {
                    Some(i) => Ok(menus::quantity_prompt(&crops[i], &self.settings, None)),
                    None => self.crop_menu(Some(INVALID_CHOICE_BANNER)).await,
                }
            }

            [c, q] => {
                if *q == BACK {
                    return self.crop_menu(None).await;
                }
                let crop = resolve_or_restart!(self.earlier_crop(c).await?);
                if parse_quantity(q, &self.settings).is_none() {
                    return Ok(menus::quantity_prompt(
                        &crop,
                        &self.settings,
                        Some(INVALID_QUANTITY_BANNER),
                    ));
                }
                self.pickup_menu(None).await
            }

            [c, q, p] => {
                let crop = resolve_or_restart!(self.earlier_crop(c).await?);
                if *p == BACK {
                    return Ok(menus::quantity_prompt(&crop, &self.settings, None));
                }
                resolve_or_restart!(self.earlier_quantity(q));
                let pickups = self
                    .reference
                    .list_locations(LocationFilter::PickupEligible)
                    .await?;
                if pickups.is_empty() {
                    return Ok(menus::no_pickup_locations());
                }
                match parse_index(p, pickups.len()) {
                    Some(i) => self.destination_menu(&pickups[i], None).await,
                    None => Ok(menus::pickup_list(&pickups, Some(INVALID_CHOICE_BANNER))),
                }
            }

            [c, q, p, d] => {
                let crop = resolve_or_restart!(self.earlier_crop(c).await?);
                let quantity = resolve_or_restart!(self.earlier_quantity(q));
                if *d == BACK {
                    return self.pickup_menu(None).await;
                }
                let pickup = resolve_or_restart!(
                    self.earlier_location(LocationFilter::PickupEligible, p)
                        .await?
                );
                let destinations = self
                    .reference
                    .list_locations(LocationFilter::DestinationEligible)
                    .await?;
                if destinations.is_empty() {
                    return Ok(menus::no_destinations());
                }
                let Some(i) = parse_index(d, destinations.len()) else {
                    return Ok(menus::destination_list(
                        &destinations,
                        &pickup,
                        Some(INVALID_CHOICE_BANNER),
                    ));
                };
                let destination = destinations[i].clone();

                if pickup.id == destination.id {
                    tracing::debug!(location_id = %pickup.id, "pickup equals destination");
                    return Ok(menus::same_location());
                }

                self.commit(CommitRequest {
                    phone_number: phone_number.to_string(),
                    crop,
                    quantity,
                    pickup,
                    destination,
                })
                .await
            }

            _ => Ok(menus::invalid_option()),
        }
    }

    /// Remove earlier out-of-range choices the user already corrected.
    ///
    /// An out-of-range index at the crop or pickup slot answered with the
    /// error banner is followed by another entry for the same slot. When
    /// that next entry resolves in the live list, the first one was a typo.
    /// Anything else stays in place and is judged stale further down.
    async fn drop_corrected_indices<'a>(&self, rest: &[&'a str]) -> Result<Vec<&'a str>> {
        let mut tokens = rest.to_vec();
        if tokens.len() >= 2 {
            let crops = self.reference.list_active_crops().await?.len();
            if is_corrected_index(tokens[0], tokens[1], crops) {
                tracing::debug!(token = tokens[0], "dropping corrected crop choice");
                tokens.remove(0);
            }
        }
        if tokens.len() >= 4 {
            let pickups = self
                .reference
                .list_locations(LocationFilter::PickupEligible)
                .await?
                .len();
            if is_corrected_index(tokens[2], tokens[3], pickups) {
                tracing::debug!(token = tokens[2], "dropping corrected pickup choice");
                tokens.remove(2);
            }
        }
        Ok(tokens)
    }

    async fn commit(&self, request: CommitRequest) -> Result<UssdReply> {
        match self.committer.commit(request).await {
            Ok(confirmation) => Ok(menus::confirmation(&confirmation)),
            Err(CommitError::NoTransporter) => {
                tracing::error!("order not committed: no transporters registered");
                Ok(menus::service_failure())
            }
            Err(CommitError::Store(e)) => Err(e),
        }
    }

    async fn crop_menu(&self, banner: Option<&str>) -> Result<UssdReply> {
        let crops = self.reference.list_active_crops().await?;
        if crops.is_empty() {
            return Ok(menus::no_crops());
        }
        Ok(menus::crop_list(&crops, banner))
    }

    async fn pickup_menu(&self, banner: Option<&str>) -> Result<UssdReply> {
        let pickups = self
            .reference
            .list_locations(LocationFilter::PickupEligible)
            .await?;
        if pickups.is_empty() {
            return Ok(menus::no_pickup_locations());
        }
        Ok(menus::pickup_list(&pickups, banner))
    }

    async fn destination_menu(&self, pickup: &Location, banner: Option<&str>) -> Result<UssdReply> {
        let destinations = self
            .reference
            .list_locations(LocationFilter::DestinationEligible)
            .await?;
        if destinations.is_empty() {
            return Ok(menus::no_destinations());
        }
        Ok(menus::destination_list(&destinations, pickup, banner))
    }

    async fn earlier_crop(&self, token: &str) -> Result<Earlier<Crop>> {
        let mut crops = self.reference.list_active_crops().await?;
        Ok(match parse_index(token, crops.len()) {
            Some(i) => Earlier::Resolved(crops.swap_remove(i)),
            None => {
                tracing::warn!(token, available = crops.len(), "crop choice no longer resolves");
                Earlier::Stale
            }
        })
    }

    fn earlier_quantity(&self, token: &str) -> Earlier<i32> {
        match parse_quantity(token, &self.settings) {
            Some(q) => Earlier::Resolved(q),
            None => Earlier::Stale,
        }
    }

    async fn earlier_location(
        &self,
        filter: LocationFilter,
        token: &str,
    ) -> Result<Earlier<Location>> {
        let mut locations = self.reference.list_locations(filter).await?;
        Ok(match parse_index(token, locations.len()) {
            Some(i) => Earlier::Resolved(locations.swap_remove(i)),
            None => {
                tracing::warn!(
                    token,
                    ?filter,
                    available = locations.len(),
                    "location choice no longer resolves"
                );
                Earlier::Stale
            }
        })
    }

    // ── Tracking ──────────────────────────────────────────────

    async fn track(&self, token: &str) -> Result<UssdReply> {
        if token == BACK {
            return Ok(menus::root());
        }
        let code = normalize_tracking_code(token);
        if !is_tracking_code_shaped(&code) {
            return Ok(menus::tracking_retry());
        }
        match self.orders.find_by_tracking_number(&code).await? {
            Some(order) => {
                let view = self.status_view(order).await?;
                Ok(menus::order_status(&view))
            }
            None => Ok(menus::order_not_found()),
        }
    }

    /// Resolve stored references to names, falling back to the
    /// denormalized text kept on older rows.
    async fn status_view(&self, order: Order) -> Result<OrderStatusView> {
        let crop = self
            .name_or_legacy(EntityKind::Crop, order.crop_id, order.crop_name)
            .await?;
        let pickup = self
            .name_or_legacy(
                EntityKind::Location,
                order.pickup_location_id,
                order.pickup_name,
            )
            .await?;
        let destination = self
            .name_or_legacy(
                EntityKind::Location,
                order.destination_location_id,
                order.destination_name,
            )
            .await?;

        let transporter = match order.transporter_id {
            Some(id) => self.reference.get_transporter(id).await?,
            None => None,
        };
        let (transporter_name, transporter_phone) = match transporter {
            Some(t) => (t.name, t.phone),
            None => (
                order
                    .transporter_name
                    .unwrap_or_else(|| NOT_AVAILABLE.to_string()),
                order
                    .transporter_phone
                    .unwrap_or_else(|| NOT_AVAILABLE.to_string()),
            ),
        };

        Ok(OrderStatusView {
            tracking_number: order.tracking_number,
            crop,
            quantity: order.quantity,
            pickup,
            destination,
            status: order.status,
            transporter_name,
            transporter_phone,
        })
    }

    async fn name_or_legacy(
        &self,
        kind: EntityKind,
        id: Option<uuid::Uuid>,
        legacy: Option<String>,
    ) -> Result<String> {
        let resolved = match id {
            Some(id) => self.reference.entity_name(kind, id).await?,
            None => None,
        };
        Ok(resolved
            .or(legacy)
            .unwrap_or_else(|| NOT_AVAILABLE.to_string()))
    }
}
