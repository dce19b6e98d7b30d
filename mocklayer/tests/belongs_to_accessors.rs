//! Singular association reads behave the same whatever the child and parent states.

mod common;

use mocklayer::prelude::*;
use serde_json::json;

fn saved_child_no_parent(schema: &Schema) -> (Record, Option<Record>) {
    let address = schema.create("address", json!({ "street": "Lost Woods" })).unwrap();
    (address, None)
}

fn saved_child_new_parent(schema: &Schema) -> (Record, Option<Record>) {
    let address = schema.create("address", json!({ "street": "Lost Woods" })).unwrap();
    let user = schema.new_record("user", json!({ "name": "Link" })).unwrap();
    address.set_related("user", Some(&user)).unwrap();
    (address, Some(user))
}

fn saved_child_saved_parent(schema: &Schema) -> (Record, Option<Record>) {
    let user = schema.create("user", json!({ "name": "Link" })).unwrap();
    let address = schema
        .create("address", json!({ "street": "Lost Woods", "user_id": user.id() }))
        .unwrap();
    (address, Some(user))
}

fn new_child_no_parent(schema: &Schema) -> (Record, Option<Record>) {
    let address = schema.new_record("address", json!({ "street": "Lost Woods" })).unwrap();
    (address, None)
}

fn new_child_new_parent(schema: &Schema) -> (Record, Option<Record>) {
    let address = schema.new_record("address", json!({ "street": "Lost Woods" })).unwrap();
    let user = schema.new_record("user", json!({ "name": "Link" })).unwrap();
    address.set_related("user", Some(&user)).unwrap();
    (address, Some(user))
}

fn new_child_saved_parent(schema: &Schema) -> (Record, Option<Record>) {
    let user = schema.create("user", json!({ "name": "Link" })).unwrap();
    let address = schema.new_record("address", json!({ "street": "Lost Woods" })).unwrap();
    address.set_related("user", Some(&user)).unwrap();
    (address, Some(user))
}

type Setup = fn(&Schema) -> (Record, Option<Record>);

const STATES: [(&str, Setup); 6] = [
    ("saved child, no parent", saved_child_no_parent),
    ("saved child, new parent", saved_child_new_parent),
    ("saved child, saved parent", saved_child_saved_parent),
    ("new child, no parent", new_child_no_parent),
    ("new child, new parent", new_child_new_parent),
    ("new child, saved parent", new_child_saved_parent),
];

#[test]
fn references_are_correct_in_every_state() {
    for (state, setup) in STATES {
        let schema = common::address_schema();
        let (address, user) = setup(&schema);

        assert_eq!(address.get_related("user").unwrap(), user, "model reference of {state}");
        assert_eq!(
            address.related_id("user").unwrap(),
            user.as_ref().and_then(Record::id),
            "id reference of {state}"
        );
    }
}

#[test]
fn saving_the_parent_fills_in_the_foreign_key() {
    for (state, setup) in [STATES[1], STATES[4]] {
        let schema = common::address_schema();
        let (address, user) = setup(&schema);
        let user = user.unwrap();

        assert!(matches!(address.foreign_key("user").unwrap(), ForeignKey::Pending(_)));
        assert_eq!(address.attr("user_id").unwrap(), Some(json!(null)), "{state}");

        user.save().unwrap();

        assert_eq!(address.related_id("user").unwrap(), user.id(), "{state}");
        assert_eq!(address.foreign_key("user").unwrap(), ForeignKey::Id(1));
        assert_eq!(address.get_related("user").unwrap(), Some(user.clone()));
    }
}

#[test]
fn saved_child_is_updated_in_the_store() {
    let schema = common::address_schema();
    let (address, user) = saved_child_new_parent(&schema);

    user.unwrap().save().unwrap();

    let reloaded = schema.find("address", address.id().unwrap()).unwrap().unwrap();
    assert_eq!(reloaded.attr("user_id").unwrap(), Some(json!(1)));
}

#[test]
fn new_child_keeps_the_resolved_key_when_saved() {
    let schema = common::address_schema();
    let (address, user) = new_child_new_parent(&schema);

    user.unwrap().save().unwrap();
    address.save().unwrap();

    let reloaded = schema.first("address").unwrap().unwrap();
    assert_eq!(reloaded.related_id("user").unwrap(), Some(1));
}

#[test]
fn reassigning_before_save_discards_the_pending_parent() {
    let schema = common::address_schema();
    let address = schema.create("address", json!({})).unwrap();
    let first = schema.new_record("user", json!({ "name": "Link" })).unwrap();
    let second = schema.create("user", json!({ "name": "Zelda" })).unwrap();

    address.set_related("user", Some(&first)).unwrap();
    address.set_related("user", Some(&second)).unwrap();
    first.save().unwrap();

    assert_eq!(address.related_id("user").unwrap(), second.id());
    assert_eq!(address.get_related("user").unwrap(), Some(second));
}

#[test]
fn clearing_the_parent_unsets_the_key() {
    let schema = common::address_schema();
    let (address, _) = saved_child_saved_parent(&schema);

    address.set_related("user", None).unwrap();

    assert_eq!(address.foreign_key("user").unwrap(), ForeignKey::Unset);
    assert_eq!(address.get_related("user").unwrap(), None);
}

#[test]
fn dangling_foreign_keys_read_as_none() {
    let schema = common::address_schema();
    let address = schema.create("address", json!({ "user_id": 42 })).unwrap();

    assert_eq!(address.related_id("user").unwrap(), Some(42));
    assert_eq!(address.get_related("user").unwrap(), None);
}

#[test]
fn writing_the_key_directly_drops_the_pending_parent() {
    let schema = common::address_schema();
    let address = schema.new_record("address", json!({})).unwrap();
    let user = schema.new_record("user", json!({})).unwrap();
    let other = schema.create("user", json!({})).unwrap();

    address.set_related("user", Some(&user)).unwrap();
    address.set("user_id", other.id()).unwrap();
    user.save().unwrap();

    assert_eq!(address.related_id("user").unwrap(), other.id());
}

#[test]
fn wrong_model_and_kind_are_rejected() {
    let schema = common::address_schema();
    let address = schema.create("address", json!({})).unwrap();
    let other = schema.create("address", json!({})).unwrap();

    assert_eq!(
        address.set_related("user", Some(&other)),
        Err(DataLayerError::AssociationTarget(
            "address.user".into(),
            "user".into(),
            "address".into()
        ))
    );
    assert!(matches!(
        address.get_related_many("user"),
        Err(DataLayerError::AssociationKind(..))
    ));
    assert!(matches!(
        address.get_related("owner"),
        Err(DataLayerError::UnknownAssociation(..))
    ));
}

#[test]
fn create_related_saves_and_links_a_parent() {
    let schema = common::address_schema();
    let address = schema.new_record("address", json!({})).unwrap();

    let user = address.create_related("user", json!({ "name": "Link" })).unwrap();

    assert!(user.is_saved());
    assert_eq!(address.related_id("user").unwrap(), user.id());
}
