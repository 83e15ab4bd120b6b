#![forbid(unsafe_code)]

use paymock_contracts::item::{property_bag, ItemId, ItemSchema, PropertyBag, PropertyValue};
use paymock_contracts::UnixTimeSecs;
use paymock_storage::{ErrorKind, FixtureStore, StorageError, StoreKind};

const GAME: &str = "com.example.game";
const PACKAGES: &str = "click-scope";

fn sword(schema: ItemSchema) -> PropertyBag {
    let mut bag = property_bag([("title", "Sword"), ("price", "$2")]);
    bag.insert(schema.id_key().to_string(), "sword".into());
    bag
}

fn shield(schema: ItemSchema) -> PropertyBag {
    let mut bag = property_bag([("title", "Shield")]);
    bag.insert(schema.id_key().to_string(), "shield".into());
    bag
}

fn store_with_items(schema: ItemSchema) -> FixtureStore {
    let mut s = FixtureStore::new_in_memory(schema);
    s.add_store(GAME, &[sword(schema), shield(schema)]).unwrap();
    s
}

fn now() -> UnixTimeSecs {
    UnixTimeSecs(1_700_000_000)
}

#[test]
fn at_fixture_db_01_added_item_reads_back_merged_onto_defaults() {
    for schema in [ItemSchema::PayStore, ItemSchema::Libpay] {
        let s = store_with_items(schema);
        let got = s.store(GAME).unwrap().get("sword").unwrap();
        let mut expected = schema.default_properties(&ItemId::new("sword").unwrap());
        expected.insert("title".to_string(), "Sword".into());
        expected.insert("price".to_string(), "$2".into());
        assert_eq!(got, expected);
    }
}

#[test]
fn at_fixture_db_02_duplicate_id_is_already_exists() {
    let mut s = store_with_items(ItemSchema::PayStore);
    let err = s.add_item(GAME, &sword(ItemSchema::PayStore)).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::AlreadyExists);
    assert_eq!(err.to_string(), "store com.example.game already has item sword");
}

#[test]
fn at_fixture_db_03_missing_id_is_invalid_argument() {
    let mut s = store_with_items(ItemSchema::Libpay);
    let err = s
        .add_item(GAME, &property_bag([("title", "Nameless")]))
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::InvalidArgument);

    // A pay-store id key does not identify a libpay item.
    let err = s
        .add_item(GAME, &property_bag([("sku", "wrong_schema")]))
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::InvalidArgument);
}

#[test]
fn at_fixture_db_04_unknown_property_key_fails_and_changes_nothing() {
    let mut s = store_with_items(ItemSchema::PayStore);
    let mut updates = property_bag([("title", "Renamed")]);
    updates.insert("colour".to_string(), "red".into());
    let err = s
        .store_mut(GAME)
        .unwrap()
        .set_properties("sword", &updates)
        .unwrap_err();
    assert_eq!(err, StorageError::UnknownProperty("colour".to_string()));
    let got = s.store(GAME).unwrap().get("sword").unwrap();
    assert_eq!(got.get("title"), Some(&PropertyValue::from("Sword")));

    let mut new_item = sword(ItemSchema::PayStore);
    new_item.insert("sku".to_string(), "axe".into());
    new_item.insert("weight".to_string(), PropertyValue::U64(3));
    assert!(s.add_item(GAME, &new_item).is_err());
    assert!(s.store(GAME).unwrap().item("axe").is_none());
}

#[test]
fn at_fixture_db_05_unknown_item_and_store_are_not_found() {
    let mut s = store_with_items(ItemSchema::PayStore);
    let err = s.store(GAME).unwrap().get("bow").unwrap_err();
    assert_eq!(err.kind(), ErrorKind::NotFound);
    let err = s.add_item("com.example.other", &sword(ItemSchema::PayStore)).unwrap_err();
    assert_eq!(err, StorageError::StoreNotFound("com.example.other".to_string()));
}

#[test]
fn at_fixture_db_06_purchase_lists_item_and_libpay_refund_removes_it() {
    let mut s = store_with_items(ItemSchema::Libpay);
    let store = s.store_mut(GAME).unwrap();
    assert!(store.list_purchased().is_empty());

    let bought = store.purchase("sword", now()).unwrap();
    assert_eq!(bought.get("status"), Some(&PropertyValue::from("purchased")));
    assert_eq!(bought.get("purchased_time"), Some(&PropertyValue::U64(now().0)));
    let listed = store.list_purchased();
    assert_eq!(listed.len(), 1);
    assert_eq!(listed[0].get("id"), Some(&PropertyValue::from("sword")));

    let refunded = store.refund("sword", now()).unwrap();
    assert_eq!(
        refunded.get("status"),
        Some(&PropertyValue::from("not purchased"))
    );
    assert_eq!(refunded.get("purchased_time"), Some(&PropertyValue::U64(0)));
    assert!(store.list_purchased().is_empty());
}

#[test]
fn at_fixture_db_07_pay_store_purchase_is_approved_and_listed() {
    let mut s = store_with_items(ItemSchema::PayStore);
    let store = s.store_mut(GAME).unwrap();
    let bought = store.purchase("shield", now()).unwrap();
    assert_eq!(bought.get("state"), Some(&PropertyValue::from("approved")));
    assert_eq!(store.list_purchased().len(), 1);

    // Hand-set "purchased" also counts; anything else does not.
    store
        .set_properties("sword", &property_bag([("state", "purchased")]))
        .unwrap();
    assert_eq!(store.list_purchased().len(), 2);
    store
        .set_properties("sword", &property_bag([("state", "pending")]))
        .unwrap();
    assert_eq!(store.list_purchased().len(), 1);
}

#[test]
fn at_fixture_db_08_pay_store_in_app_refund_is_rejected() {
    let mut s = store_with_items(ItemSchema::PayStore);
    let store = s.store_mut(GAME).unwrap();
    store.purchase("sword", now()).unwrap();
    let err = store.refund("sword", now()).unwrap_err();
    assert_eq!(err.to_string(), "Refunds are only available for packages");
    assert_eq!(err.kind(), ErrorKind::InvalidArgument);
}

#[test]
fn at_fixture_db_09_acknowledge_sets_flag_and_time() {
    let mut s = store_with_items(ItemSchema::PayStore);
    let store = s.store_mut(GAME).unwrap();
    let acked = store.acknowledge("sword", now()).unwrap();
    assert_eq!(acked.get("acknowledged"), Some(&PropertyValue::Bool(true)));
    assert_eq!(
        acked.get("acknowledged_time"),
        Some(&PropertyValue::U64(now().0))
    );
    assert_eq!(
        store.acknowledge("bow", now()).unwrap_err().kind(),
        ErrorKind::NotFound
    );
}

#[test]
fn at_fixture_db_10_package_store_answers_unknown_packages_as_available() {
    let mut s = FixtureStore::new_in_memory(ItemSchema::PayStore);
    let store = s.add_store(PACKAGES, &[]).unwrap();
    assert_eq!(store.kind(), StoreKind::Package);
    let got = store.get("com.example.app").unwrap();
    assert_eq!(
        got,
        property_bag([("package_name", "com.example.app"), ("state", "available")])
    );
}

#[test]
fn at_fixture_db_11_package_purchase_replaces_entry_with_refund_window() {
    let mut s = FixtureStore::new_in_memory(ItemSchema::PayStore);
    s.add_store(PACKAGES, &[]).unwrap();
    let store = s.store_mut(PACKAGES).unwrap();
    let bought = store.purchase("com.example.app", now()).unwrap();
    assert_eq!(bought.len(), 3);
    assert_eq!(bought.get("state"), Some(&PropertyValue::from("Complete")));
    assert_eq!(
        bought.get("refund_timeout"),
        Some(&PropertyValue::U64(now().0 + 15 * 60))
    );
    assert!(store.list_purchased().is_empty());
}

// Regression guard: package refunds read the deadline from `refund_tiemout`, which
// purchases never write. The refund answers "available" and the entry stays.
#[test]
fn at_fixture_db_12_package_refund_keeps_entry_because_of_misspelled_deadline_key() {
    let mut s = FixtureStore::new_in_memory(ItemSchema::PayStore);
    s.add_store(PACKAGES, &[]).unwrap();
    let store = s.store_mut(PACKAGES).unwrap();
    store.purchase("com.example.app", now()).unwrap();

    let refunded = store.refund("com.example.app", now()).unwrap();
    assert_eq!(
        refunded,
        property_bag([("package_name", "com.example.app"), ("state", "available")])
    );
    let after = store.get("com.example.app").unwrap();
    assert_eq!(after.get("state"), Some(&PropertyValue::from("Complete")));

    // The lookup key cannot be written either: it is not in the entry's key set.
    let err = store
        .set_properties(
            "com.example.app",
            &property_bag([("refund_tiemout", PropertyValue::U64(u64::MAX))]),
        )
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::InvalidArgument);
}

#[test]
fn at_fixture_db_13_package_items_cannot_be_acknowledged() {
    let mut s = FixtureStore::new_in_memory(ItemSchema::PayStore);
    s.add_store(PACKAGES, &[]).unwrap();
    let store = s.store_mut(PACKAGES).unwrap();
    store.purchase("com.example.app", now()).unwrap();
    let err = store.acknowledge("com.example.app", now()).unwrap_err();
    assert_eq!(
        err.to_string(),
        "Only in-app purchase items can be acknowledged"
    );
}

#[test]
fn at_fixture_db_14_store_registration_is_atomic_and_unique() {
    let mut s = FixtureStore::new_in_memory(ItemSchema::PayStore);
    let bad = property_bag([("title", "no sku")]);
    assert!(s.add_store(GAME, &[sword(ItemSchema::PayStore), bad]).is_err());
    assert!(s.store_names().is_empty());

    s.add_store(GAME, &[]).unwrap();
    let err = s.add_store(GAME, &[]).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::AlreadyExists);
    s.add_store(PACKAGES, &[]).unwrap();
    assert_eq!(
        s.store_names(),
        vec![PACKAGES.to_string(), GAME.to_string()]
    );
}

#[test]
fn at_fixture_db_15_set_item_finds_target_through_id_in_properties() {
    let mut s = store_with_items(ItemSchema::PayStore);
    let mut update = property_bag([("price", "$9")]);
    update.insert("sku".to_string(), "shield".into());
    let out = s.set_item(GAME, &update).unwrap();
    assert_eq!(out.get("price"), Some(&PropertyValue::from("$9")));
    assert!(s
        .set_item(GAME, &property_bag([("price", "$1")]))
        .is_err());
}

#[test]
fn at_fixture_db_16_remove_drops_item() {
    let mut s = store_with_items(ItemSchema::PayStore);
    let store = s.store_mut(GAME).unwrap();
    assert!(store.remove("sword").is_some());
    assert!(store.remove("sword").is_none());
    assert_eq!(store.len(), 1);
}
