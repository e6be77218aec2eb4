//! UssdService — the single entry point the HTTP layer calls.
//!
//! Wraps the step resolver and guarantees that every request gets a reply:
//! store failures are logged and turned into a generic terminal message.

use std::sync::Arc;

use crate::ports::{OrderStore, ReferenceData};
use crate::settings::UssdSettings;
use crate::ussd::machine::StepResolver;
use crate::ussd::menus;
use crate::ussd::path::SessionPath;
use crate::ussd::{UssdReply, UssdRequest};

pub struct UssdService {
    resolver: StepResolver,
}

impl UssdService {
    pub fn new(
        reference: Arc<dyn ReferenceData>,
        orders: Arc<dyn OrderStore>,
        settings: UssdSettings,
    ) -> Self {
        Self {
            resolver: StepResolver::new(reference, orders, settings),
        }
    }

    pub async fn handle(&self, request: &UssdRequest) -> UssdReply {
        tracing::info!(
            session_id = %request.session_id,
            phone_number = %request.phone_number,
            text = %request.text,
            "ussd request"
        );

        let path = SessionPath::parse(&request.text);
        let tokens = path.effective(self.resolver.settings());

        let reply = match self
            .resolver
            .resolve(&tokens, &request.phone_number)
            .await
        {
            Ok(reply) => reply,
            Err(e) => {
                tracing::error!(
                    session_id = %request.session_id,
                    error = %e,
                    "ussd request failed"
                );
                menus::service_failure()
            }
        };

        tracing::info!(
            session_id = %request.session_id,
            kind = reply.kind(),
            length = reply.body().len(),
            "ussd response"
        );
        reply
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::committer::is_generated_tracking_number;
    use crate::memory::{Catalog, MemoryStore, UnavailableStore};
    use crate::ports::OrderStore;
    use crate::types::{LocationFilter, LocationRole, Order, INITIAL_ORDER_STATUS};
    use chrono::Utc;
    use uuid::Uuid;
    use crate::ussd::menus::{INVALID_CHOICE_BANNER, INVALID_QUANTITY_BANNER, INVALID_TRACKING_BANNER};

    const PHONE: &str = "+255754000001";

    fn service_over(store: &Arc<MemoryStore>) -> UssdService {
        UssdService::new(store.clone(), store.clone(), UssdSettings::default())
    }

    fn demo() -> (Arc<MemoryStore>, UssdService) {
        let store = Arc::new(MemoryStore::new(Catalog::demo()));
        let service = service_over(&store);
        (store, service)
    }

    async fn send(service: &UssdService, text: &str) -> UssdReply {
        service
            .handle(&UssdRequest {
                session_id: "ATUid_test".into(),
                service_code: "*384*1#".into(),
                phone_number: PHONE.into(),
                text: text.into(),
            })
            .await
    }

    fn tracking_number_of(reply: &UssdReply) -> String {
        reply
            .body()
            .lines()
            .find_map(|l| l.strip_prefix("Namba ya Ufuatiliaji: "))
            .expect("confirmation carries a tracking number")
            .to_string()
    }

    // ── Root and static branches ─────────────────────────────────

    #[tokio::test]
    async fn root_menu_is_stable_across_calls() {
        let (_, service) = demo();
        let first = send(&service, "").await;
        let second = send(&service, "").await;
        assert_eq!(first, second);
        assert_eq!(first, menus::root());
        assert!(first.to_wire().starts_with("CON "));
    }

    #[tokio::test]
    async fn contact_and_exit_are_terminal() {
        let (_, service) = demo();
        assert_eq!(send(&service, "3").await, menus::contact());
        assert_eq!(send(&service, "0").await, menus::goodbye());
    }

    #[tokio::test]
    async fn unknown_choice_is_recoverable() {
        let (_, service) = demo();
        let reply = send(&service, "7").await;
        assert_eq!(reply, menus::invalid_option());
        assert!(!reply.is_terminal());
        assert_eq!(send(&service, "7*0").await, menus::root());
    }

    // ── Transport request ────────────────────────────────────────

    #[tokio::test]
    async fn crop_list_is_numbered_in_name_order() {
        let (_, service) = demo();
        let reply = send(&service, "1").await;
        assert_eq!(
            reply.body(),
            "CHAGUA ZAO UNALOTAKA KUSAFIRISHA:\n\n\
             1. Maharage\n2. Mahindi\n3. Mpunga\n4. Viazi\n\n0. Rudi Nyuma"
        );
    }

    #[tokio::test]
    async fn no_active_crops_ends_session() {
        let store = Arc::new(MemoryStore::default());
        let service = service_over(&store);
        assert_eq!(send(&service, "1").await, menus::no_crops());
    }

    #[tokio::test]
    async fn invalid_crop_index_reshows_list_with_banner() {
        let (_, service) = demo();
        for bad in ["9", "x", ""] {
            let reply = send(&service, &format!("1*{bad}")).await;
            assert!(!reply.is_terminal());
            assert!(reply.body().starts_with(INVALID_CHOICE_BANNER), "{reply}");
            assert!(reply.body().contains("1. Maharage"));
        }
    }

    #[tokio::test]
    async fn valid_crop_asks_for_quantity() {
        let (_, service) = demo();
        let reply = send(&service, "1*2").await;
        assert!(reply.body().starts_with("WEKA KIASI CHA MAHINDI:"));
    }

    #[tokio::test]
    async fn bad_quantities_reshow_prompt_for_same_crop() {
        let (_, service) = demo();
        for bad in ["abc", "1001", "-3", "2.5", "99999999999"] {
            let reply = send(&service, &format!("1*2*{bad}")).await;
            assert!(!reply.is_terminal(), "{bad}: {reply}");
            assert!(reply.body().starts_with(INVALID_QUANTITY_BANNER));
            assert!(reply.body().contains("WEKA KIASI CHA MAHINDI:"));
        }
    }

    #[tokio::test]
    async fn quantity_bounds_follow_settings() {
        let store = Arc::new(MemoryStore::new(Catalog::demo()));
        let settings = UssdSettings {
            min_quantity: 10,
            max_quantity: 20,
        };
        let service = UssdService::new(store.clone(), store.clone(), settings);
        assert!(send(&service, "1*1*9").await.body().starts_with(INVALID_QUANTITY_BANNER));
        assert!(send(&service, "1*1*20")
            .await
            .body()
            .starts_with("CHAGUA MAHALI PA KUCHUKUA MIZIGO:"));
    }

    #[tokio::test]
    async fn invalid_pickup_reshows_pickup_list() {
        let (_, service) = demo();
        let reply = send(&service, "1*2*50*9").await;
        assert!(!reply.is_terminal());
        assert!(reply.body().starts_with(INVALID_CHOICE_BANNER));
        assert!(reply.body().contains("CHAGUA MAHALI PA KUCHUKUA MIZIGO:"));
    }

    #[tokio::test]
    async fn destination_list_names_the_pickup() {
        let (_, service) = demo();
        let reply = send(&service, "1*2*50*2").await;
        assert!(reply
            .body()
            .starts_with("CHAGUA MAHALI MZIGO UNAPOENDA:\n(Kutoka: Mbalali)"));
    }

    #[tokio::test]
    async fn full_request_commits_order_and_is_trackable() {
        let (store, service) = demo();
        let reply = send(&service, "1*2*50*1*2").await;
        assert!(reply.is_terminal(), "{reply}");
        assert!(reply.body().starts_with("UTHIBITISHO - OMBI LIMEPOKELEWA!"));

        let tracking_number = tracking_number_of(&reply);
        assert!(is_generated_tracking_number(&tracking_number));

        let order = store
            .find_by_tracking_number(&tracking_number)
            .await
            .unwrap()
            .expect("order persisted");
        let pickup = store
            .list_locations(LocationFilter::PickupEligible)
            .await
            .unwrap()[0]
            .clone();
        let destination = store
            .list_locations(LocationFilter::DestinationEligible)
            .await
            .unwrap()[1]
            .clone();
        assert_eq!(order.quantity, 50);
        assert_eq!(order.phone_number, PHONE);
        assert_eq!(order.pickup_location_id, Some(pickup.id));
        assert_eq!(order.destination_location_id, Some(destination.id));
        assert_ne!(order.pickup_location_id, order.destination_location_id);

        let status = send(&service, &format!("2*{}", tracking_number.to_lowercase())).await;
        assert!(status.is_terminal());
        let body = status.body();
        assert!(body.starts_with(&format!("HALI YA OMBI: {tracking_number}")));
        assert!(body.contains("Zao: Mahindi"));
        assert!(body.contains("Kiasi: 50 Magunia"));
        assert!(body.contains(&format!("Kutoka: {}", pickup.name)));
        assert!(body.contains(&format!("Kwenda: {}", destination.name)));
        assert!(body.contains(&format!("Hali: {INITIAL_ORDER_STATUS}")));
    }

    #[tokio::test]
    async fn same_pickup_and_destination_is_refused() {
        let (store, service) = demo();
        // Uyole serves both ends and is last in both views.
        let reply = send(&service, "1*1*10*4*4").await;
        assert_eq!(reply, menus::same_location());
        assert_eq!(store.order_count().await, 0);
    }

    #[tokio::test]
    async fn back_from_any_depth_equals_parent_screen() {
        let (_, service) = demo();
        for (path, parent) in [
            ("1*0", ""),
            ("1*2*0", "1"),
            ("1*2*50*0", "1*2"),
            ("1*2*50*1*0", "1*2*50"),
            ("2*0", ""),
            ("1*2*abc*0", "1"),
        ] {
            assert_eq!(
                send(&service, path).await,
                send(&service, parent).await,
                "{path} vs {parent}"
            );
        }
    }

    #[tokio::test]
    async fn history_after_back_is_replayed() {
        let (_, service) = demo();
        assert_eq!(send(&service, "1*0*3").await, menus::contact());
        assert_eq!(send(&service, "1*2*0*3").await, send(&service, "1*3").await);
    }

    #[tokio::test]
    async fn retry_after_rejected_quantity_continues() {
        let (_, service) = demo();
        let reply = send(&service, "1*2*lots*50").await;
        assert!(reply.body().starts_with("CHAGUA MAHALI PA KUCHUKUA MIZIGO:"));
    }

    #[tokio::test]
    async fn crop_removed_mid_session_requires_restart() {
        let (store, service) = demo();
        assert!(!send(&service, "1*4*50*1").await.is_terminal());

        let viazi = store.list_active_crops().await.unwrap()[3].id;
        store.deactivate_crop(viazi).await;

        let reply = send(&service, "1*4*50*1*2").await;
        assert_eq!(reply, menus::restart_required());
        assert_eq!(store.order_count().await, 0);
    }

    #[tokio::test]
    async fn pickup_removed_mid_session_requires_restart() {
        let catalog = Catalog::default()
            .crop("Mahindi")
            .location("Chunya", LocationRole::Pickup, None)
            .location("Kyela", LocationRole::Pickup, None)
            .location("Igurusi", LocationRole::Destination, None)
            .location("Ilomba", LocationRole::Destination, None)
            .location("Isyesye", LocationRole::Destination, None)
            .transporter("Juma Mwalimu", "0754123456", "4.8/5");
        let store = Arc::new(MemoryStore::new(catalog));
        let service = service_over(&store);
        assert!(!send(&service, "1*1*5*2").await.is_terminal());

        let kyela = store
            .list_locations(LocationFilter::PickupEligible)
            .await
            .unwrap()[1]
            .id;
        store.deactivate_location(kyela).await;

        let reply = send(&service, "1*1*5*2*3").await;
        assert_eq!(reply, menus::restart_required());
        assert_eq!(store.order_count().await, 0);
    }

    #[tokio::test]
    async fn corrected_crop_typo_continues() {
        let (_, service) = demo();
        assert!(send(&service, "1*9")
            .await
            .body()
            .starts_with(INVALID_CHOICE_BANNER));

        let reply = send(&service, "1*9*2").await;
        assert!(!reply.is_terminal(), "{reply}");
        assert!(reply.body().starts_with("WEKA KIASI CHA MAHINDI:"));
        assert_eq!(reply, send(&service, "1*2").await);
    }

    #[tokio::test]
    async fn corrected_pickup_typo_continues() {
        let (store, service) = demo();
        let reply = send(&service, "1*2*50*9*1").await;
        assert!(!reply.is_terminal(), "{reply}");
        assert!(reply
            .body()
            .starts_with("CHAGUA MAHALI MZIGO UNAPOENDA:\n(Kutoka: Kyela)"));

        let placed = send(&service, "1*9*2*50*9*1*2").await;
        assert!(placed.body().starts_with("UTHIBITISHO - OMBI LIMEPOKELEWA!"), "{placed}");
        let order = store
            .find_by_tracking_number(&tracking_number_of(&placed))
            .await
            .unwrap()
            .expect("order persisted");
        assert_eq!(order.crop_name.as_deref(), Some("Mahindi"));
        assert_eq!(order.pickup_name.as_deref(), Some("Kyela"));
        assert_eq!(order.destination_name.as_deref(), Some("Mwanjelwa"));
    }

    #[tokio::test]
    async fn invalid_destination_reshows_destination_list() {
        let (store, service) = demo();
        for bad in ["9", "x"] {
            let reply = send(&service, &format!("1*2*50*1*{bad}")).await;
            assert!(!reply.is_terminal(), "{bad}: {reply}");
            assert!(reply.to_wire().starts_with("CON "));
            assert!(reply.body().starts_with(INVALID_CHOICE_BANNER));
            assert!(reply.body().contains("(Kutoka: Kyela)"));
        }
        assert_eq!(store.order_count().await, 0);
    }

    #[tokio::test]
    async fn missing_transporters_end_with_failure_message() {
        let catalog = Catalog::default()
            .crop("Mahindi")
            .location("Mbalali", LocationRole::Pickup, None)
            .location("Soweto", LocationRole::Destination, None);
        let store = Arc::new(MemoryStore::new(catalog));
        let service = service_over(&store);

        assert_eq!(send(&service, "1*1*5*1*1").await, menus::service_failure());
        assert_eq!(store.order_count().await, 0);
    }

    #[tokio::test]
    async fn empty_location_views_end_session() {
        let pickup_only = Catalog::default()
            .crop("Mahindi")
            .location("Mbalali", LocationRole::Pickup, None);
        let store = Arc::new(MemoryStore::new(pickup_only));
        let service = service_over(&store);
        assert_eq!(send(&service, "1*1*5*1").await, menus::no_destinations());

        let no_locations = Arc::new(MemoryStore::new(Catalog::default().crop("Mahindi")));
        let service = service_over(&no_locations);
        assert_eq!(send(&service, "1*1*5").await, menus::no_pickup_locations());
    }

    // ── Tracking ─────────────────────────────────────────────────

    #[tokio::test]
    async fn tracking_prompt_and_malformed_code() {
        let (_, service) = demo();
        assert_eq!(send(&service, "2").await, menus::tracking_prompt());

        let retry = send(&service, "2*ABC").await;
        assert!(!retry.is_terminal());
        assert!(retry.body().starts_with(INVALID_TRACKING_BANNER));
    }

    #[tokio::test]
    async fn unknown_well_formed_code_is_not_found() {
        let (_, service) = demo();
        assert_eq!(send(&service, "2*TRK0000000000").await, menus::order_not_found());
    }

    #[tokio::test]
    async fn code_after_malformed_attempt_is_looked_up() {
        let (_, service) = demo();
        let placed = send(&service, "1*1*5*2*1").await;
        let tracking_number = tracking_number_of(&placed);

        let reply = send(&service, &format!("2*oops*{tracking_number}")).await;
        assert!(reply.body().starts_with("HALI YA OMBI:"));
    }

    #[tokio::test]
    async fn status_view_shows_stored_status_verbatim() {
        let (store, service) = demo();
        let tracking_number = tracking_number_of(&send(&service, "1*3*7*3*4").await);
        store
            .update_status(&tracking_number, "Mizigo iko njiani - Makambako")
            .await
            .unwrap();

        for _ in 0..3 {
            let reply = send(&service, &format!("2*{tracking_number}")).await;
            assert!(reply.body().contains("Hali: Mizigo iko njiani - Makambako"));
        }
    }

    fn legacy_order(tracking_number: &str) -> Order {
        let now = Utc::now();
        Order {
            order_id: Uuid::new_v4(),
            tracking_number: tracking_number.into(),
            phone_number: PHONE.into(),
            // Reference that no longer exists in the catalogue.
            crop_id: Some(Uuid::new_v4()),
            quantity: 30,
            pickup_location_id: None,
            destination_location_id: None,
            transporter_id: None,
            status: "Imefika".into(),
            created_at: now,
            status_updated_at: now,
            crop_name: Some("Mtama".into()),
            pickup_name: Some("Chunya".into()),
            destination_name: None,
            transporter_name: Some("Ally Mbwana".into()),
            transporter_phone: None,
        }
    }

    #[tokio::test]
    async fn legacy_rows_fall_back_to_stored_names_then_na() {
        let (store, service) = demo();
        store.import_order(legacy_order("TRK2301050042")).await;

        let reply = send(&service, "2*TRK2301050042").await;
        assert!(reply.is_terminal());
        let body = reply.body();
        assert!(body.contains("Zao: Mtama"), "{body}");
        assert!(body.contains("Kiasi: 30 Magunia"));
        assert!(body.contains("Kutoka: Chunya"));
        assert!(body.contains("Kwenda: N/A"));
        assert!(body.contains("Hali: Imefika"));
        assert!(body.contains("Msafirishaji: Ally Mbwana"));
        assert!(body.contains("Mawasiliano: N/A"));
    }

    // ── Failures ─────────────────────────────────────────────────

    #[tokio::test]
    async fn store_failure_becomes_generic_terminal_reply() {
        let store = Arc::new(UnavailableStore);
        let service = UssdService::new(store.clone(), store, UssdSettings::default());
        assert_eq!(send(&service, "1").await, menus::service_failure());
        assert_eq!(send(&service, "2*TRK2410190001").await, menus::service_failure());
        assert_eq!(send(&service, "").await, menus::root());
    }
}
