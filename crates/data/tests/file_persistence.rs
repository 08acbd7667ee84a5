use convodeck_core::{
    CardBackSelection, Category, DeckConfig, DeckStore, KeyValueStorage, Mutation, NewOrder,
    OrderRepository, OrderStatus, ShippingDetails, STORAGE_KEY,
};
use convodeck_data::{JsonFileStorage, JsonOrderBook};
use std::fs;
use time::macros::datetime;

fn new_order(reference: &str) -> NewOrder {
    let mut deck = DeckConfig::empty();
    deck.counts.set(Category::Deep, 52);
    deck.card_back = Some(CardBackSelection::new("origin", 1));
    NewOrder {
        deck_config: deck,
        quantity: 1,
        total_amount: 2_500_000,
        shipping: ShippingDetails {
            name: "Chidi Eze".to_string(),
            email: "chidi@example.com".to_string(),
            phone: None,
            address: "7 Broad Street".to_string(),
            city: "Lagos".to_string(),
            state: "Lagos".to_string(),
            zip: "102273".to_string(),
            country: "Nigeria".to_string(),
        },
        payment_reference: Some(reference.to_string()),
        payment_provider: Some("paystack".to_string()),
    }
}

#[test]
fn deck_survives_a_new_session() {
    let dir = tempfile::tempdir().expect("tempdir");
    {
        let mut store = DeckStore::new(JsonFileStorage::new(dir.path()));
        let mutation = store.set_category(Category::Romantic, 20).expect("set");
        assert!(matches!(mutation, Mutation::Applied(_)));
    }
    let store = DeckStore::new(JsonFileStorage::new(dir.path()));
    assert_eq!(store.read().expect("read").count(Category::Romantic), 20);
    assert!(dir.path().join(format!("{STORAGE_KEY}.json")).exists());
}

#[test]
fn missing_slot_reads_as_none_and_remove_is_quiet() {
    let dir = tempfile::tempdir().expect("tempdir");
    let mut storage = JsonFileStorage::new(dir.path().join("nested"));
    assert_eq!(storage.get("deckConfigV1").expect("get"), None);
    storage.remove("deckConfigV1").expect("remove missing");
    storage.set("deckConfigV1", "{}").expect("set creates dir");
    assert_eq!(storage.get("deckConfigV1").expect("get").as_deref(), Some("{}"));
}

#[test]
fn corrupt_slot_falls_back_to_empty_deck() {
    let dir = tempfile::tempdir().expect("tempdir");
    fs::write(dir.path().join("deckConfigV1.json"), "{not json").expect("write");
    let store = DeckStore::new(JsonFileStorage::new(dir.path()));
    assert_eq!(store.read().expect("read"), DeckConfig::empty());
}

#[test]
fn orders_are_reloaded_from_disk() {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = dir.path().join("orders.json");
    let first_at = datetime!(2026-10-18 09:00 UTC);
    let second_at = datetime!(2026-10-18 10:00 UTC);

    let (first, second) = {
        let mut book = JsonOrderBook::open(&path).expect("open");
        assert!(book.is_empty());
        let first = book.create(new_order("DK_1_aaaaaaa"), first_at).expect("create");
        let second = book.create(new_order("DK_2_bbbbbbb"), second_at).expect("create");
        book.update_status(
            first.id,
            OrderStatus::Shipped,
            Some("via GIG".to_string()),
            second_at,
        )
        .expect("update")
        .expect("found");
        (first, second)
    };

    let book = JsonOrderBook::open(&path).expect("reopen");
    assert_eq!(book.len(), 2);
    let listed: Vec<_> = book.list().expect("list").into_iter().map(|o| o.id).collect();
    assert_eq!(listed, vec![second.id, first.id]);

    let reloaded = book.get(first.id).expect("get").expect("found");
    assert_eq!(reloaded.status, OrderStatus::Shipped);
    assert_eq!(reloaded.notes.as_deref(), Some("via GIG"));
    assert_eq!(reloaded.updated_at, second_at);
    assert_eq!(
        book.get_by_reference("DK_2_bbbbbbb").expect("get").map(|o| o.id),
        Some(second.id)
    );
}

#[test]
fn failed_status_save_leaves_the_order_untouched() {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = dir.path().join("orders.json");
    let created_at = datetime!(2026-10-18 09:00 UTC);
    let mut book = JsonOrderBook::open(&path).expect("open");
    let order = book
        .create(new_order("DK_3_ccccccc"), created_at)
        .expect("create");

    fs::remove_file(&path).expect("remove");
    fs::create_dir(&path).expect("block the orders file");
    let err = book.update_status(
        order.id,
        OrderStatus::Cancelled,
        Some("customer changed their mind".to_string()),
        datetime!(2026-10-18 11:00 UTC),
    );
    assert!(err.is_err());

    let current = book.get(order.id).expect("get").expect("found");
    assert_eq!(current, order);
    assert_eq!(current.status, OrderStatus::Pending);
    assert_eq!(current.notes, None);
    assert_eq!(current.updated_at, created_at);
}

#[test]
fn unknown_order_file_versions_are_refused() {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = dir.path().join("orders.json");
    fs::write(&path, r#"{"version": 9, "orders": []}"#).expect("write");
    let err = JsonOrderBook::open(&path).expect_err("version");
    assert!(err.to_string().contains("unsupported orders version 9"));
}
