use crate::app::AppState;
use convodeck_core::{
    build_shareable_message, build_summary, can_checkout, can_proceed_to_card_back,
    can_proceed_to_preview, checkout_payment, confirm_payment, messaging_link, normalize_phone,
    order_total, send_order_emails, validate_order_request, validation_messages, CardBackColors,
    Category, DeckConfig, Mutation, NewOrder, OrderError, OrderRequest, OrderStatus,
    PaymentError, PaymentOutcome, StorageError,
};
use serde::Deserialize;
use serde_json::{json, Value};
use tiny_http::Method;
use tracing::{error, warn};
use uuid::Uuid;

#[derive(Debug, Clone, PartialEq)]
pub struct ApiResponse {
    pub status: u16,
    pub body: Value,
}

impl ApiResponse {
    fn ok(body: Value) -> Self {
        Self { status: 200, body }
    }

    fn created(body: Value) -> Self {
        Self { status: 201, body }
    }

    fn error(status: u16, message: &str) -> Self {
        Self {
            status,
            body: json!({ "error": message }),
        }
    }

    fn error_with_details(status: u16, message: &str, details: Value) -> Self {
        Self {
            status,
            body: json!({ "error": message, "details": details }),
        }
    }

    fn storage(err: StorageError) -> Self {
        error!(error = %err, "storage failure");
        Self::error(500, "Storage unavailable")
    }
}

#[derive(Debug, Deserialize)]
#[serde(tag = "action", rename_all = "snake_case")]
enum DeckAction {
    Adjust {
        category: Category,
        value: i64,
    },
    Set {
        category: Category,
        value: i64,
    },
    CardBack {
        design: String,
        #[serde(default)]
        hue: i64,
        #[serde(default)]
        colors: Option<CardBackColors>,
    },
    Reset,
}

#[derive(Debug, Default, Deserialize)]
struct ShareRequest {
    #[serde(default)]
    quantity: Option<u32>,
}

#[derive(Debug, Deserialize)]
struct VerifyRequest {
    #[serde(default)]
    reference: Option<String>,
}

#[derive(Debug, Deserialize)]
struct StatusUpdate {
    status: String,
    #[serde(default)]
    notes: Option<String>,
}

pub fn handle(state: &mut AppState, method: &Method, url: &str, body: &str) -> ApiResponse {
    let (path, query) = url.split_once('?').unwrap_or((url, ""));
    let segments: Vec<&str> = path.trim_matches('/').split('/').collect();
    match (method, segments.as_slice()) {
        (Method::Get, ["api", "deck"]) => deck_state(state),
        (Method::Post, ["api", "deck", "action"]) => deck_action(state, body),
        (Method::Get, ["api", "deck", "summary"]) => {
            let quantity = query_param(query, "quantity").and_then(|q| q.parse().ok());
            deck_summary(state, quantity.unwrap_or(1))
        }
        (Method::Post, ["api", "deck", "share"]) => deck_share(state, body),
        (Method::Get, ["api", "payment", "config"]) => payment_config(state),
        (Method::Post, ["api", "create-payment"]) => create_payment(state, body),
        (Method::Post, ["api", "verify-payment"]) => verify_payment(state, body),
        (Method::Post, ["api", "orders"]) => create_order(state, body),
        (Method::Get, ["api", "orders", id]) => get_order(state, id),
        (Method::Get, ["api", "admin", "orders"]) => list_orders(state),
        (Method::Patch, ["api", "admin", "orders", id, "status"]) => {
            update_order_status(state, id, body)
        }
        _ => ApiResponse::error(404, "Not found"),
    }
}

fn query_param<'a>(query: &'a str, name: &str) -> Option<&'a str> {
    query
        .split('&')
        .filter_map(|pair| pair.split_once('='))
        .find(|(key, _)| *key == name)
        .map(|(_, value)| value)
}

fn parse_body<T: for<'de> Deserialize<'de>>(body: &str) -> Result<T, ApiResponse> {
    let raw = if body.trim().is_empty() { "{}" } else { body };
    serde_json::from_str(raw).map_err(|err| {
        ApiResponse::error_with_details(400, "Validation failed", json!([err.to_string()]))
    })
}

fn deck_view(config: &DeckConfig) -> Value {
    json!({
        "deck": config,
        "total": config.total(),
        "remaining": config.remaining(),
        "canProceedToCardBack": can_proceed_to_card_back(config),
        "canProceedToPreview": can_proceed_to_preview(config),
        "canCheckout": can_checkout(config),
        "issues": validation_messages(config),
    })
}

fn deck_state(state: &mut AppState) -> ApiResponse {
    match state.deck.read() {
        Ok(config) => ApiResponse::ok(deck_view(&config)),
        Err(err) => ApiResponse::storage(err),
    }
}

fn deck_action(state: &mut AppState, body: &str) -> ApiResponse {
    let action: DeckAction = match parse_body(body) {
        Ok(action) => action,
        Err(response) => return response,
    };
    let result = match action {
        DeckAction::Adjust { category, value } => state.deck.adjust_category(category, value),
        DeckAction::Set { category, value } => state.deck.set_category(category, value),
        DeckAction::CardBack {
            design,
            hue,
            colors,
        } => {
            let Some(index) = state.store.card_back_index(&design) else {
                return ApiResponse::error(400, "Unknown card-back design");
            };
            if colors.as_ref().is_some_and(|colors| !colors.is_valid()) {
                return ApiResponse::error(400, "Card-back colors must be #RRGGBB");
            }
            state
                .deck
                .set_card_back(&design, index, hue, colors)
                .map(|config| {
                    if config.card_back.is_none() {
                        warn!(design = %design, "card back ignored for unfinished deck");
                    }
                    Mutation::Applied(config)
                })
        }
        DeckAction::Reset => state
            .deck
            .reset()
            .map(|()| Mutation::Applied(DeckConfig::empty())),
    };
    let mutation = match result {
        Ok(mutation) => mutation,
        Err(err) => return ApiResponse::storage(err),
    };
    let config = match &mutation {
        Mutation::Applied(config) => config.clone(),
        Mutation::Rejected(_) => match state.deck.read() {
            Ok(config) => config,
            Err(err) => return ApiResponse::storage(err),
        },
    };
    let mut body = deck_view(&config);
    body["applied"] = json!(mutation.is_applied());
    body["rejection"] = json!(mutation.rejection().map(|rejection| rejection.to_string()));
    ApiResponse::ok(body)
}

fn deck_summary(state: &mut AppState, quantity: u32) -> ApiResponse {
    let config = match state.deck.read() {
        Ok(config) => config,
        Err(err) => return ApiResponse::storage(err),
    };
    let now = state.now();
    match build_summary(&config, &state.store, quantity, now, &mut state.rng) {
        Ok(summary) => ApiResponse::ok(json!(summary)),
        Err(incomplete) => ApiResponse::error_with_details(
            400,
            "Deck is not ready to order",
            json!(incomplete.messages()),
        ),
    }
}

fn deck_share(state: &mut AppState, body: &str) -> ApiResponse {
    let request: ShareRequest = match parse_body(body) {
        Ok(request) => request,
        Err(response) => return response,
    };
    let config = match state.deck.read() {
        Ok(config) => config,
        Err(err) => return ApiResponse::storage(err),
    };
    let now = state.now();
    let quantity = request.quantity.unwrap_or(1);
    let summary = match build_summary(&config, &state.store, quantity, now, &mut state.rng) {
        Ok(summary) => summary,
        Err(incomplete) => {
            return ApiResponse::error_with_details(
                400,
                "Deck is not ready to order",
                json!(incomplete.messages()),
            )
        }
    };
    let message = build_shareable_message(&summary);
    let rule = &state.store.messaging;
    let phone = normalize_phone(&rule.phone, &rule.country_code);
    let link = messaging_link(&rule.base_url, &phone, &message);
    ApiResponse::ok(json!({
        "summary": summary,
        "message": message,
        "link": link,
    }))
}

fn payment_config(state: &AppState) -> ApiResponse {
    ApiResponse::ok(json!({
        "configured": state.gateway.is_some(),
        "currency": state.store.currency.code,
        "deckPrice": state.store.pricing.deck_price,
        "maxQuantity": state.store.pricing.max_quantity,
    }))
}

fn order_error(err: OrderError) -> ApiResponse {
    match err {
        OrderError::Validation(errors) => {
            ApiResponse::error_with_details(400, "Validation failed", json!(errors))
        }
        OrderError::DeckSize { .. } | OrderError::MissingCardBack => {
            ApiResponse::error(400, &err.to_string())
        }
        OrderError::Storage(err) => ApiResponse::storage(err),
    }
}

fn create_payment(state: &mut AppState, body: &str) -> ApiResponse {
    if state.gateway.is_none() {
        return ApiResponse::error(503, "Payment system not configured");
    }
    let request: OrderRequest = match parse_body(body) {
        Ok(request) => request,
        Err(response) => return response,
    };
    let now = state.now();
    let init = match checkout_payment(&request, &state.store, &state.public_url, now, &mut state.rng)
    {
        Ok(init) => init,
        Err(err) => return order_error(err),
    };
    let Some(gateway) = state.gateway.as_deref() else {
        return ApiResponse::error(503, "Payment system not configured");
    };
    match gateway.initialize(&init) {
        Ok(session) => ApiResponse::ok(json!({
            "url": session.authorization_url,
            "reference": session.reference,
        })),
        Err(err) => {
            error!(reference = %init.reference, error = %err, "payment initialization failed");
            ApiResponse::error(500, "Failed to initialize payment")
        }
    }
}

fn verify_payment(state: &mut AppState, body: &str) -> ApiResponse {
    let request: VerifyRequest = match parse_body(body) {
        Ok(request) => request,
        Err(response) => return response,
    };
    let Some(reference) = request.reference.filter(|r| !r.trim().is_empty()) else {
        return ApiResponse::error(400, "Payment reference required");
    };
    let now = state.now();
    let Some(gateway) = state.gateway.as_deref() else {
        return match state.orders.get_by_reference(&reference) {
            Ok(Some(order)) => ApiResponse::ok(json!(order)),
            Ok(None) => ApiResponse::error(503, "Payment system not configured"),
            Err(err) => ApiResponse::storage(err),
        };
    };
    match confirm_payment(&mut *state.orders, gateway, &reference, now) {
        Ok(PaymentOutcome::Existing(order)) => ApiResponse::ok(json!(order)),
        Ok(PaymentOutcome::Created(order)) => {
            send_order_emails(&*state.notifier, &order, &state.store);
            ApiResponse::created(json!(order))
        }
        Err(PaymentError::NotSuccessful(status)) => {
            warn!(reference = %reference, ?status, "payment not successful");
            ApiResponse::error(400, "Payment not successful")
        }
        Err(err) => {
            error!(reference = %reference, error = %err, "payment verification failed");
            ApiResponse::error(500, "Failed to verify payment")
        }
    }
}

fn create_order(state: &mut AppState, body: &str) -> ApiResponse {
    let request: OrderRequest = match parse_body(body) {
        Ok(request) => request,
        Err(response) => return response,
    };
    if let Err(err) = validate_order_request(&request, &state.store) {
        return order_error(err);
    }
    let total = order_total(state.store.pricing.deck_price, request.quantity);
    let now = state.now();
    match state.orders.create(NewOrder::from_request(request, total), now) {
        Ok(order) => ApiResponse::created(json!(order)),
        Err(err) => ApiResponse::storage(err),
    }
}

fn get_order(state: &AppState, id: &str) -> ApiResponse {
    let Ok(id) = Uuid::parse_str(id) else {
        return ApiResponse::error(404, "Order not found");
    };
    match state.orders.get(id) {
        Ok(Some(order)) => ApiResponse::ok(json!(order)),
        Ok(None) => ApiResponse::error(404, "Order not found"),
        Err(err) => ApiResponse::storage(err),
    }
}

fn list_orders(state: &AppState) -> ApiResponse {
    match state.orders.list() {
        Ok(orders) => ApiResponse::ok(json!(orders)),
        Err(err) => ApiResponse::storage(err),
    }
}

fn update_order_status(state: &mut AppState, id: &str, body: &str) -> ApiResponse {
    let update: StatusUpdate = match parse_body(body) {
        Ok(update) => update,
        Err(response) => return response,
    };
    let Ok(status) = update.status.parse::<OrderStatus>() else {
        return ApiResponse::error(400, "Invalid status");
    };
    let Ok(id) = Uuid::parse_str(id) else {
        return ApiResponse::error(404, "Order not found");
    };
    let now = state.now();
    match state.orders.update_status(id, status, update.notes, now) {
        Ok(Some(order)) => ApiResponse::ok(json!(order)),
        Ok(None) => ApiResponse::error(404, "Order not found"),
        Err(err) => ApiResponse::storage(err),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use convodeck_core::{
        CheckoutMetadata, IdRng, MemoryStorage, NotifyError, OrderBook, OrderEmail,
        OrderNotifier, PaymentGateway, PaymentInit, PaymentSession, PaymentStatus, StoreConfig,
        VerifiedPayment,
    };
    use std::cell::RefCell;
    use std::rc::Rc;
    use time::macros::datetime;

    struct FakeGateway {
        initialized: Rc<RefCell<Vec<PaymentInit>>>,
    }

    impl PaymentGateway for FakeGateway {
        fn initialize(&self, init: &PaymentInit) -> Result<PaymentSession, PaymentError> {
            self.initialized.borrow_mut().push(init.clone());
            Ok(PaymentSession {
                authorization_url: format!("https://checkout.example/{}", init.reference),
                reference: init.reference.clone(),
            })
        }

        fn verify(&self, reference: &str) -> Result<VerifiedPayment, PaymentError> {
            let initialized = self.initialized.borrow();
            let Some(init) = initialized.iter().find(|init| init.reference == reference) else {
                return Err(PaymentError::Gateway("unknown reference".to_string()));
            };
            Ok(VerifiedPayment {
                reference: reference.to_string(),
                status: PaymentStatus::Success,
                amount: init.amount,
                currency: init.currency.clone(),
                customer_email: init.email.clone(),
                metadata: CheckoutMetadata {
                    deck_config: init.metadata.deck_config.clone(),
                    quantity: init.metadata.quantity,
                    shipping: init.metadata.shipping.clone(),
                },
            })
        }
    }

    #[derive(Clone, Default)]
    struct Outbox(Rc<RefCell<Vec<OrderEmail>>>);

    impl OrderNotifier for Outbox {
        fn send(&self, email: &OrderEmail) -> Result<(), NotifyError> {
            self.0.borrow_mut().push(email.clone());
            Ok(())
        }
    }

    fn app(outbox: &Outbox, with_gateway: bool) -> AppState {
        let state = AppState::new(
            StoreConfig::builtin(),
            Box::new(MemoryStorage::new()),
            Box::new(OrderBook::new()),
            Box::new(outbox.clone()),
        )
        .with_public_url("https://shop.example")
        .with_rng(IdRng::from_seed(42))
        .with_clock(Box::new(|| datetime!(2026-10-18 12:00 UTC)));
        if with_gateway {
            state.with_gateway(Box::new(FakeGateway {
                initialized: Rc::default(),
            }))
        } else {
            state
        }
    }

    fn post(state: &mut AppState, url: &str, body: Value) -> ApiResponse {
        handle(state, &Method::Post, url, &body.to_string())
    }

    fn checkout_body(state: &mut AppState) -> Value {
        let deck = handle(state, &Method::Get, "/api/deck", "").body["deck"].clone();
        json!({
            "deckConfig": deck,
            "quantity": 2,
            "shippingName": "Ngozi Okafor",
            "shippingEmail": "ngozi@example.com",
            "shippingAddress": "22 Awolowo Road",
            "shippingCity": "Ikoyi",
            "shippingState": "Lagos",
            "shippingZip": "106104",
            "shippingCountry": "Nigeria"
        })
    }

    fn finish_deck(state: &mut AppState) {
        for (category, value) in [("romantic", 30), ("deep", 22)] {
            let response = post(
                state,
                "/api/deck/action",
                json!({"action": "adjust", "category": category, "value": value}),
            );
            assert_eq!(response.body["applied"], true);
        }
        let response = post(
            state,
            "/api/deck/action",
            json!({"action": "card_back", "design": "origin", "hue": 200}),
        );
        assert_eq!(response.body["deck"]["cardBackIndex"], 1);
        assert_eq!(response.body["canCheckout"], true);
    }

    #[test]
    fn deck_actions_report_rejections() {
        let outbox = Outbox::default();
        let mut state = app(&outbox, false);
        let response = post(
            &mut state,
            "/api/deck/action",
            json!({"action": "adjust", "category": "deep", "value": -1}),
        );
        assert_eq!(response.status, 200);
        assert_eq!(response.body["applied"], false);
        assert!(response.body["rejection"].as_str().is_some());
        assert_eq!(response.body["issues"].as_array().map(Vec::len), Some(3));

        let response = post(
            &mut state,
            "/api/deck/action",
            json!({"action": "adjust", "category": "spicy", "value": 1}),
        );
        assert_eq!(response.status, 400);
    }

    #[test]
    fn huge_adjustments_are_rejected() {
        let outbox = Outbox::default();
        let mut state = app(&outbox, false);
        post(
            &mut state,
            "/api/deck/action",
            json!({"action": "adjust", "category": "deep", "value": 5}),
        );
        for value in [i64::MAX, i64::MIN] {
            let response = post(
                &mut state,
                "/api/deck/action",
                json!({"action": "adjust", "category": "deep", "value": value}),
            );
            assert_eq!(response.status, 200);
            assert_eq!(response.body["applied"], false);
            assert_eq!(response.body["total"], 5);
        }
    }

    #[test]
    fn summary_waits_for_a_finished_deck() {
        let outbox = Outbox::default();
        let mut state = app(&outbox, false);
        let response = handle(&mut state, &Method::Get, "/api/deck/summary?quantity=2", "");
        assert_eq!(response.status, 400);
        assert_eq!(response.body["details"][0], "Please select at least one category");

        finish_deck(&mut state);
        let response = handle(&mut state, &Method::Get, "/api/deck/summary?quantity=2", "");
        assert_eq!(response.status, 200);
        assert_eq!(response.body["quantity"], 2);
        assert_eq!(response.body["formattedTotalPrice"], "₦50,000.00");
        assert_eq!(response.body["estimatedDelivery"], "Sunday, October 25, 2026");
    }

    #[test]
    fn share_links_point_at_the_store_number() {
        let outbox = Outbox::default();
        let mut state = app(&outbox, false);
        finish_deck(&mut state);
        let response = post(&mut state, "/api/deck/share", json!({}));
        assert_eq!(response.status, 200);
        let link = response.body["link"].as_str().unwrap_or_default();
        assert!(link.starts_with("https://wa.me/2348165429119?text="));
        let message = response.body["message"].as_str().unwrap_or_default();
        assert!(message.contains("Card back: Origin (Hue: 200)"));
    }

    #[test]
    fn payments_need_a_gateway() {
        let outbox = Outbox::default();
        let mut state = app(&outbox, false);
        let config = handle(&mut state, &Method::Get, "/api/payment/config", "");
        assert_eq!(config.body["configured"], false);
        assert_eq!(config.body["deckPrice"], 2_500_000);
        let response = post(&mut state, "/api/create-payment", json!({}));
        assert_eq!(response.status, 503);
    }

    #[test]
    fn paid_checkout_creates_one_order_and_sends_emails() {
        let outbox = Outbox::default();
        let mut state = app(&outbox, true);
        finish_deck(&mut state);
        let body = checkout_body(&mut state);

        let response = post(&mut state, "/api/create-payment", body);
        assert_eq!(response.status, 200);
        let reference = response.body["reference"].as_str().unwrap_or_default().to_string();
        assert!(reference.starts_with("DK_"));

        let verify = json!({ "reference": reference });
        let first = post(&mut state, "/api/verify-payment", verify.clone());
        assert_eq!(first.status, 201);
        assert_eq!(first.body["totalAmount"], 5_000_000);
        assert_eq!(first.body["status"], "pending");
        assert_eq!(outbox.0.borrow().len(), 2);

        let again = post(&mut state, "/api/verify-payment", verify);
        assert_eq!(again.status, 200);
        assert_eq!(again.body["id"], first.body["id"]);
        assert_eq!(outbox.0.borrow().len(), 2);

        let missing = post(&mut state, "/api/verify-payment", json!({}));
        assert_eq!(missing.status, 400);
    }

    #[test]
    fn checkout_rejects_bad_shipping_and_unfinished_decks() {
        let outbox = Outbox::default();
        let mut state = app(&outbox, true);
        let body = checkout_body(&mut state);
        let response = post(&mut state, "/api/create-payment", body);
        assert_eq!(response.status, 400);
        assert_eq!(response.body["error"], "Deck must have exactly 52 cards");

        finish_deck(&mut state);
        let mut body = checkout_body(&mut state);
        body["shippingEmail"] = json!("nope");
        let response = post(&mut state, "/api/create-payment", body);
        assert_eq!(response.status, 400);
        assert_eq!(response.body["details"][0]["field"], "shippingEmail");
    }

    #[test]
    fn admin_can_move_orders_along() {
        let outbox = Outbox::default();
        let mut state = app(&outbox, false);
        finish_deck(&mut state);
        let body = checkout_body(&mut state);
        let created = post(&mut state, "/api/orders", body);
        assert_eq!(created.status, 201);
        let id = created.body["id"].as_str().unwrap_or_default().to_string();

        let url = format!("/api/admin/orders/{id}/status");
        let bad = handle(&mut state, &Method::Patch, &url, r#"{"status":"lost"}"#);
        assert_eq!(bad.status, 400);

        let shipped = handle(
            &mut state,
            &Method::Patch,
            &url,
            r#"{"status":"shipped","notes":"tracking 123"}"#,
        );
        assert_eq!(shipped.status, 200);
        assert_eq!(shipped.body["status"], "shipped");

        let fetched = handle(&mut state, &Method::Get, &format!("/api/orders/{id}"), "");
        assert_eq!(fetched.body["notes"], "tracking 123");

        let listed = handle(&mut state, &Method::Get, "/api/admin/orders", "");
        assert_eq!(listed.body.as_array().map(Vec::len), Some(1));

        let unknown = format!("/api/admin/orders/{}/status", Uuid::nil());
        let missing = handle(&mut state, &Method::Patch, &unknown, r#"{"status":"shipped"}"#);
        assert_eq!(missing.status, 404);
        let missing = handle(&mut state, &Method::Get, "/api/orders/not-a-uuid", "");
        assert_eq!(missing.status, 404);
    }
}
