//! Shared fixtures for integration tests.

#![allow(dead_code)]

use mocklayer::{memory::InMemoryDb, prelude::*};
use serde_json::{Value, json};

/// Authors have many posts, posts have many comments; photos stand alone.
pub fn blog_schema() -> Schema {
    Schema::builder()
        .model("author", [has_many("posts")])
        .model("post", [belongs_to("author"), has_many("comments")])
        .model("comment", [belongs_to("post")])
        .model("photo", [])
        .build(InMemoryDb::new())
        .unwrap()
}

/// Three authors, two posts by Link and two photos, loaded with fixed ids.
pub fn seeded_blog() -> Schema {
    let schema = blog_schema();

    schema
        .load_data(json!({
            "authors": [
                { "id": 1, "name": "Link" },
                { "id": 2, "name": "Zelda" },
                { "id": 3, "name": "Epona" }
            ],
            "posts": [
                { "id": 1, "title": "Lorem", "author_id": 1 },
                { "id": 2, "title": "Ipsum", "author_id": 1 }
            ],
            "photos": [
                { "id": 1, "title": "Amazing", "location": "Hyrule" },
                { "id": 2, "title": "Photo", "location": "Goron City" }
            ]
        }))
        .unwrap();

    schema
}

/// Addresses belong to users.
pub fn address_schema() -> Schema {
    Schema::builder()
        .model("user", [])
        .model("address", [belongs_to("user")])
        .build(InMemoryDb::new())
        .unwrap()
}

/// Reads one attribute of every member, in order.
pub fn pluck(collection: &Collection, attr: &str) -> Vec<Value> {
    collection
        .iter()
        .map(|record| record.attr(attr).unwrap().unwrap_or(Value::Null))
        .collect()
}
