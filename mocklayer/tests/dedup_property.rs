//! Sideloaded sections hold each related record exactly once.

mod common;

use mocklayer::prelude::*;
use proptest::prelude::*;
use serde_json::{Value, json};
use std::collections::BTreeSet;

fn section_ids(document: &Value, key: &str) -> Vec<u64> {
    document
        .get(key)
        .and_then(Value::as_array)
        .map(|records| records.iter().filter_map(|record| record["id"].as_u64()).collect())
        .unwrap_or_default()
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn sideloads_are_deduplicated_in_discovery_order(
        author_count in 1usize..5,
        assignments in prop::collection::vec((0usize..5, 0usize..3), 0..12),
    ) {
        let schema = common::blog_schema();
        let authors: Vec<Record> = (0..author_count)
            .map(|index| {
                schema
                    .create("author", json!({ "name": format!("author {index}") }))
                    .unwrap()
            })
            .collect();

        let mut expected_authors = Vec::new();
        let mut expected_comments = 0;
        for (author, comments) in &assignments {
            let author = &authors[author % author_count];
            let post = author.create_related("posts", json!({ "title": "post" })).unwrap();
            for _ in 0..*comments {
                post.create_related("comments", json!({ "text": "comment" })).unwrap();
            }

            let id = author.id().unwrap();
            if !expected_authors.contains(&id) {
                expected_authors.push(id);
            }
            expected_comments += comments;
        }

        let registry = SerializerRegistry::from_json(
            schema.clone(),
            json!({
                "post": { "relationships": ["author", "comments"] },
                "comment": { "relationships": ["post"] },
                "author": { "relationships": ["posts"] }
            }),
        )
        .unwrap();

        let document = registry.serialize(schema.all("post").unwrap()).unwrap();

        let posts = section_ids(&document, "posts");
        let sideloaded_authors = section_ids(&document, "authors");
        let comments = section_ids(&document, "comments");

        prop_assert_eq!(posts.len(), assignments.len());
        prop_assert_eq!(posts.iter().collect::<BTreeSet<_>>().len(), posts.len());
        prop_assert_eq!(sideloaded_authors, expected_authors);
        prop_assert_eq!(comments.len(), expected_comments);
        prop_assert_eq!(comments.iter().collect::<BTreeSet<_>>().len(), comments.len());
    }
}
