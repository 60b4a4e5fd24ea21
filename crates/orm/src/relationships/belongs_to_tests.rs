//! BelongsTo Tests
//!
//! Lazy loading, replacement, type checks and counter cache maintenance of
//! the belongs-to slot, run against the in-memory store.

use serde::{Deserialize, Serialize};
use serde_json::json;

use crate::error::ModelError;
use crate::model::{Attributes, Model, PrimaryKey, Record};
use crate::relationships::{Assignable, BelongsTo, BelongsToConfig, ForeignKeyAccess};
use crate::store::{Condition, FindOptions, MemoryStore, StoreCall};

fn firm_config() -> BelongsToConfig {
    BelongsToConfig::new("firm", "Firm")
}

fn counted_config() -> BelongsToConfig {
    firm_config().with_counter_cache("clients_count")
}

fn persisted_client() -> Record {
    Record::persisted("Client", 100, Attributes::new()).with_attribute("name", "Jane")
}

fn firm(store: &MemoryStore, id: i64) -> Record {
    firm_with_count(store, id, 0)
}

fn firm_with_count(store: &MemoryStore, id: i64, count: i64) -> Record {
    store.insert(
        Record::persisted("Firm", id, Attributes::new())
            .with_attribute("clients_count", count)
            .with_attribute("items_count", count),
    )
}

fn key(id: i64) -> PrimaryKey {
    PrimaryKey::Integer(id)
}

#[test]
fn test_new_slot_is_not_loaded() {
    let slot = BelongsTo::new(persisted_client(), firm_config()).unwrap();

    assert!(!slot.is_loaded());
    assert!(!slot.updated());
    assert!(slot.target().is_none());
    assert!(!slot.foreign_key_present());
}

#[test]
fn test_new_slot_rejects_invalid_config() {
    let err = BelongsTo::new(persisted_client(), BelongsToConfig::new("firm", "")).unwrap_err();
    assert!(matches!(err, ModelError::Configuration(_)));
}

#[tokio::test]
async fn test_resolve_without_foreign_key_skips_store() {
    let store = MemoryStore::new();
    let mut slot = BelongsTo::new(persisted_client(), firm_config()).unwrap();

    assert!(slot.resolve(&store).await.unwrap().is_none());
    assert!(slot.is_loaded());
    assert_eq!(store.find_count(), 0);
}

#[tokio::test]
async fn test_resolve_loads_once() {
    let store = MemoryStore::new();
    firm(&store, 1);
    let client = persisted_client().with_attribute("firm_id", 1);
    let mut slot = BelongsTo::new(client, firm_config()).unwrap();

    let first = slot.resolve(&store).await.unwrap().cloned();
    let second = slot.resolve(&store).await.unwrap().cloned();

    assert_eq!(first.as_ref().and_then(|r| r.id()), Some(&key(1)));
    assert_eq!(first, second);
    assert_eq!(store.find_count(), 1);
    assert!(!slot.updated());
}

#[tokio::test]
async fn test_resolve_passes_config_to_store() {
    let store = MemoryStore::new();
    firm(&store, 3);
    let config = firm_config()
        .with_condition(Condition::eq("clients_count", 0))
        .with_include("address")
        .with_readonly(true);
    let client = persisted_client().with_attribute("firm_id", 3);
    let mut slot = BelongsTo::new(client, config).unwrap();

    let target = slot.resolve(&store).await.unwrap().cloned().unwrap();
    assert!(target.is_readonly());

    let expected = FindOptions::new()
        .with_condition(Condition::eq("clients_count", 0))
        .with_include("address")
        .readonly(true);
    assert_eq!(
        store.calls(),
        vec![StoreCall::Find {
            model: "Firm".to_string(),
            id: key(3),
            options: expected,
        }]
    );
}

#[tokio::test]
async fn test_resolve_missing_target_is_absent_unless_required() {
    let store = MemoryStore::new();
    let client = persisted_client().with_attribute("firm_id", 42);

    let mut optional = BelongsTo::new(client.clone(), firm_config()).unwrap();
    assert!(optional.resolve(&store).await.unwrap().is_none());
    assert!(optional.is_loaded());

    let mut required = BelongsTo::new(client, firm_config().with_required(true)).unwrap();
    let err = required.resolve(&store).await.unwrap_err();
    assert_eq!(err, ModelError::NotFound("Firm(42)".to_string()));
    assert!(required.is_loaded());

    // Loaded after the failure, so no second query
    assert!(required.resolve(&store).await.unwrap().is_none());
    assert_eq!(store.find_count(), 2);
}

#[tokio::test]
async fn test_replace_with_none_clears_target_and_decrements() {
    let store = MemoryStore::new();
    firm_with_count(&store, 1, 1);
    let client = persisted_client().with_attribute("firm_id", 1);
    let mut slot = BelongsTo::new(client, counted_config()).unwrap();
    slot.resolve(&store).await.unwrap();
    store.clear_calls();

    let result = slot.replace(&store, None).await.unwrap();
    assert!(result.is_none());

    assert!(slot.target().is_none());
    assert_eq!(slot.owner().foreign_key("firm_id"), None);
    assert!(slot.is_loaded());
    assert_eq!(
        store.calls(),
        vec![StoreCall::Decrement {
            model: "Firm".to_string(),
            counter: "clients_count".to_string(),
            id: key(1),
        }]
    );
    assert_eq!(store.counter("Firm", "clients_count", &key(1)), Some(0));
}

#[tokio::test]
async fn test_replace_with_none_on_empty_slot_makes_no_calls() {
    let store = MemoryStore::new();
    let mut slot = BelongsTo::new(persisted_client(), counted_config()).unwrap();

    slot.clear(&store).await.unwrap();

    assert!(slot.is_loaded());
    assert!(!slot.updated());
    assert!(store.calls().is_empty());
}

#[tokio::test]
async fn test_replace_with_incompatible_type_changes_nothing() {
    let store = MemoryStore::new();
    firm(&store, 1);
    let client = persisted_client().with_attribute("firm_id", 1);
    let mut slot = BelongsTo::new(client, counted_config()).unwrap();

    let account = Record::persisted("Account", 9, Attributes::new());
    let err = slot.replace(&store, Some(account.into())).await.unwrap_err();

    assert_eq!(
        err,
        ModelError::TypeMismatch {
            expected: "Firm".to_string(),
            actual: "Account".to_string(),
        }
    );
    assert!(slot.target().is_none());
    assert!(!slot.is_loaded());
    assert!(!slot.updated());
    assert_eq!(slot.foreign_key_value(), Some(key(1)));
    assert!(store.calls().is_empty());
}

#[tokio::test]
async fn test_replace_accepts_compatible_subtype() {
    let store = MemoryStore::new();
    let config = firm_config().with_compatible_model("LawFirm");
    let mut slot = BelongsTo::new(persisted_client(), config).unwrap();

    let law_firm = store.insert(Record::new("LawFirm", Attributes::new()));
    slot.replace(&store, Some(law_firm.clone().into())).await.unwrap();

    assert_eq!(slot.target(), Some(&law_firm));
    assert_eq!(slot.foreign_key_value(), law_firm.id().cloned());
}

#[tokio::test]
async fn test_replace_with_unsaved_target_keeps_foreign_key() {
    let store = MemoryStore::new();
    let client = persisted_client().with_attribute("firm_id", 5);
    let mut slot = BelongsTo::new(client, firm_config()).unwrap();

    let draft = Record::new("Firm", Attributes::new()).with_attribute("name", "Draft & Co");
    slot.replace(&store, Some(draft.clone().into())).await.unwrap();

    assert_eq!(slot.target(), Some(&draft));
    assert_eq!(slot.foreign_key_value(), Some(key(5)));
    assert!(slot.updated());
    assert!(slot.is_loaded());
}

#[tokio::test]
async fn test_unsaved_target_skips_increment() {
    let store = MemoryStore::new();
    firm(&store, 1);
    let client = persisted_client().with_attribute("firm_id", 1);
    let mut slot = BelongsTo::new(client, counted_config()).unwrap();

    let draft = Record::new("Firm", Attributes::new());
    slot.replace(&store, Some(draft.into())).await.unwrap();

    assert_eq!(
        store.calls(),
        vec![StoreCall::Decrement {
            model: "Firm".to_string(),
            counter: "clients_count".to_string(),
            id: key(1),
        }]
    );
}

#[tokio::test]
async fn test_replace_unwraps_reference_handle() {
    let store = MemoryStore::new();
    firm(&store, 7);

    let colleague = persisted_client().with_attribute("firm_id", 7);
    let mut colleague_slot = BelongsTo::new(colleague, firm_config()).unwrap();
    colleague_slot.resolve(&store).await.unwrap();
    let handle = colleague_slot.handle().unwrap();
    assert_eq!(handle.association(), "firm");

    let mut slot = BelongsTo::new(persisted_client(), firm_config()).unwrap();
    slot.replace(&store, Some(Assignable::Handle(handle))).await.unwrap();

    assert_eq!(slot.target().and_then(|r| r.id()), Some(&key(7)));
    assert_eq!(slot.foreign_key_value(), Some(key(7)));
}

#[tokio::test]
async fn test_swap_increments_new_before_decrementing_old() {
    let store = MemoryStore::new();
    firm_with_count(&store, 1, 1);
    let firm_b = firm(&store, 2);

    let client = persisted_client().with_attribute("firm_id", 1);
    let mut slot = BelongsTo::new(client, firm_config().with_counter_cache("items_count")).unwrap();
    slot.resolve(&store).await.unwrap();
    store.clear_calls();

    slot.replace(&store, Some(firm_b.into())).await.unwrap();

    assert_eq!(
        store.calls(),
        vec![
            StoreCall::Increment {
                model: "Firm".to_string(),
                counter: "items_count".to_string(),
                id: key(2),
            },
            StoreCall::Decrement {
                model: "Firm".to_string(),
                counter: "items_count".to_string(),
                id: key(1),
            },
        ]
    );
    assert_eq!(slot.foreign_key_value(), Some(key(2)));
    assert!(slot.updated());
}

#[tokio::test]
async fn test_first_reference_only_increments() {
    let store = MemoryStore::new();
    let target = firm(&store, 4);
    let mut slot = BelongsTo::new(persisted_client(), counted_config()).unwrap();

    slot.replace(&store, Some(target.into())).await.unwrap();

    assert_eq!(
        store.calls(),
        vec![StoreCall::Increment {
            model: "Firm".to_string(),
            counter: "clients_count".to_string(),
            id: key(4),
        }]
    );
    assert_eq!(store.counter("Firm", "clients_count", &key(4)), Some(1));
}

#[tokio::test]
async fn test_new_owner_does_not_touch_counters() {
    let store = MemoryStore::new();
    let target = firm(&store, 4);
    let owner = Record::new("Client", Attributes::new()).with_attribute("firm_id", 1);
    let mut slot = BelongsTo::new(owner, counted_config()).unwrap();

    slot.replace(&store, Some(target.into())).await.unwrap();
    slot.replace(&store, None).await.unwrap();

    assert!(store.calls().is_empty());
    assert_eq!(slot.foreign_key_value(), None);
}

#[tokio::test]
async fn test_failed_decrement_leaves_slot_unchanged() {
    let store = MemoryStore::new();
    firm(&store, 1);
    let firm_b = firm(&store, 2);
    let client = persisted_client().with_attribute("firm_id", 1);
    let mut slot = BelongsTo::new(client, counted_config()).unwrap();

    store.fail_next_decrement();
    let err = slot.replace(&store, Some(firm_b.into())).await.unwrap_err();

    assert!(matches!(err, ModelError::Store(_)));
    assert_eq!(slot.foreign_key_value(), Some(key(1)));
    assert!(!slot.is_loaded());
    assert!(!slot.updated());
    // Over-counted until a recount
    assert_eq!(store.counter("Firm", "clients_count", &key(2)), Some(1));
    assert_eq!(store.counter("Firm", "clients_count", &key(1)), Some(0));
}

#[tokio::test]
async fn test_create_assigns_created_target() {
    let store = MemoryStore::new();
    let mut slot = BelongsTo::new(persisted_client(), firm_config()).unwrap();

    let mut attributes = Attributes::new();
    attributes.insert("name".to_string(), json!("Initech"));
    let created = slot.create(&store, attributes.clone()).await.unwrap();

    assert_eq!(
        store.calls(),
        vec![StoreCall::Create {
            model: "Firm".to_string(),
            attributes,
        }]
    );
    assert_eq!(slot.target(), Some(&created));
    assert_eq!(slot.foreign_key_value(), created.id().cloned());
    assert!(slot.updated());
    assert!(slot.is_loaded());
}

#[tokio::test]
async fn test_build_assigns_unsaved_target() {
    let store = MemoryStore::new();
    let mut slot = BelongsTo::new(persisted_client(), counted_config()).unwrap();

    let built = slot.build(&store, Attributes::new()).await.unwrap();

    assert!(built.is_new_record());
    assert_eq!(slot.target(), Some(&built));
    assert_eq!(slot.foreign_key_value(), None);
    assert!(slot.updated());
    assert_eq!(store.calls(), vec![StoreCall::Build { model: "Firm".to_string() }]);
    assert_eq!(store.count("Firm"), 0);
}

#[tokio::test]
async fn test_updated_is_sticky() {
    let store = MemoryStore::new();
    let target = firm(&store, 1);
    let mut slot = BelongsTo::new(persisted_client(), firm_config()).unwrap();

    slot.replace(&store, Some(target.into())).await.unwrap();
    slot.replace(&store, None).await.unwrap();

    assert!(slot.updated());
    assert!(slot.is_loaded());
    assert!(slot.target().is_none());
}

#[tokio::test]
async fn test_reload_queries_current_foreign_key() {
    let store = MemoryStore::new();
    firm(&store, 1);
    firm(&store, 2);
    let client = persisted_client().with_attribute("firm_id", 1);
    let mut slot = BelongsTo::new(client, firm_config()).unwrap();
    slot.resolve(&store).await.unwrap();

    slot.owner_mut().set_foreign_key("firm_id", Some(key(2)));
    // Cached target is kept until reloaded
    assert_eq!(slot.target().and_then(|r| r.id()), Some(&key(1)));

    let reloaded = slot.reload(&store).await.unwrap().cloned();
    assert_eq!(reloaded.and_then(|r| r.id().cloned()), Some(key(2)));
    assert_eq!(store.find_count(), 2);
    assert!(!slot.updated());
}

#[tokio::test]
async fn test_text_and_uuid_keyed_targets_reload() {
    let store = MemoryStore::new();
    let shared = "550e8400-e29b-41d4-a716-446655440000";
    let text_firm = store.insert(Record::persisted("Firm", PrimaryKey::Text(shared.to_string()), Attributes::new()));
    let uuid_firm = store.insert(Record::persisted(
        "Firm",
        uuid::Uuid::parse_str(shared).unwrap(),
        Attributes::new(),
    ));

    for target in [text_firm, uuid_firm] {
        let mut slot = BelongsTo::new(persisted_client(), firm_config().with_required(true)).unwrap();
        slot.replace(&store, Some(target.clone().into())).await.unwrap();
        assert_eq!(slot.foreign_key_value(), target.id().cloned());

        let reloaded = slot.reload(&store).await.unwrap().cloned();
        assert_eq!(reloaded, Some(target));
    }
    assert_eq!(store.count("Firm"), 2);
}

#[derive(Debug, PartialEq, Serialize, Deserialize)]
struct Firm {
    id: i64,
    #[serde(default)]
    clients_count: i64,
}

impl Model for Firm {
    fn model_name() -> &'static str {
        "Firm"
    }
}

#[tokio::test]
async fn test_target_as_typed_model() {
    let store = MemoryStore::new();
    firm(&store, 6);
    let client = persisted_client().with_attribute("firm_id", 6);
    let mut slot = BelongsTo::new(client, firm_config()).unwrap();

    assert_eq!(slot.target_as::<Firm>().unwrap(), None);
    slot.resolve(&store).await.unwrap();
    assert_eq!(
        slot.target_as::<Firm>().unwrap(),
        Some(Firm { id: 6, clients_count: 0 })
    );

    let owner = slot.into_owner();
    assert_eq!(owner.get("name"), Some(&json!("Jane")));
}

#[test]
fn test_resolve_with_blocking_executor() {
    let store = MemoryStore::new();
    firm(&store, 1);
    let client = persisted_client().with_attribute("firm_id", 1);
    let mut slot = BelongsTo::new(client, firm_config()).unwrap();

    let found = tokio_test::block_on(slot.resolve(&store)).unwrap().cloned();
    assert!(found.is_some());
}
