//! Plural association reads and writes.

mod common;

use mocklayer::prelude::*;
use serde_json::json;

#[test]
fn saved_owner_reads_children_by_foreign_key() {
    let schema = common::seeded_blog();
    let link = schema.find("author", 1).unwrap().unwrap();
    let zelda = schema.find("author", 2).unwrap().unwrap();

    let posts = link.get_related_many("posts").unwrap();

    assert_eq!(posts.model_name(), "post");
    assert_eq!(posts.ids(), vec![1, 2]);
    assert_eq!(common::pluck(&posts, "title"), vec![json!("Lorem"), json!("Ipsum")]);
    assert!(zelda.get_related_many("posts").unwrap().is_empty());
    assert_eq!(link.related_ids("posts").unwrap(), vec![1, 2]);
}

#[test]
fn create_related_presets_the_foreign_key() {
    let schema = common::blog_schema();
    let author = schema.create("author", json!({ "name": "Link" })).unwrap();

    let post = author.create_related("posts", json!({ "title": "Lorem" })).unwrap();

    assert!(post.is_saved());
    assert_eq!(post.attr("author_id").unwrap(), Some(json!(1)));
    assert_eq!(post.get_related("author").unwrap(), Some(author.clone()));
    assert_eq!(author.related_ids("posts").unwrap(), post.id().into_iter().collect::<Vec<_>>());
}

#[test]
fn unsaved_owner_lists_pending_children_until_saved() {
    let schema = common::blog_schema();
    let author = schema.new_record("author", json!({ "name": "Zelda" })).unwrap();

    let first = author.new_related("posts", json!({ "title": "Lorem" })).unwrap();
    let second = author.create_related("posts", json!({ "title": "Ipsum" })).unwrap();

    let pending = author.get_related_many("posts").unwrap();
    assert_eq!(pending.len(), 2);
    assert!(pending[0].ptr_eq(&first));
    assert!(pending[1].ptr_eq(&second));
    assert_eq!(second.attr("author_id").unwrap(), Some(json!(null)));

    author.save().unwrap();
    first.save().unwrap();

    assert_eq!(author.related_ids("posts").unwrap(), vec![1, 2]);
    assert_eq!(
        common::pluck(&schema.all("post").unwrap(), "author_id"),
        vec![json!(1), json!(1)]
    );
}

#[test]
fn set_related_many_relinks_children() {
    let schema = common::seeded_blog();
    let link = schema.find("author", 1).unwrap().unwrap();
    let zelda = schema.find("author", 2).unwrap().unwrap();
    let lorem = schema.find("post", 1).unwrap().unwrap();
    let extra = schema.create("post", json!({ "title": "Dolor" })).unwrap();

    link.set_related_many("posts", &[extra.clone()]).unwrap();

    assert_eq!(link.related_ids("posts").unwrap(), vec![3]);
    assert_eq!(lorem.related_id("author").unwrap(), None);

    zelda.set_related_many("posts", &[lorem.clone(), extra]).unwrap();

    assert_eq!(zelda.related_ids("posts").unwrap(), vec![1, 3]);
    assert!(link.get_related_many("posts").unwrap().is_empty());
}

#[test]
fn related_dispatches_on_association_kind() {
    let schema = common::seeded_blog();
    let post = schema.find("post", 1).unwrap().unwrap();

    match post.related("author").unwrap() {
        Related::One(Some(author)) => assert_eq!(author.id(), Some(1)),
        other => panic!("expected a parent, got {other:?}"),
    }
    match post.related("comments").unwrap() {
        Related::Many(comments) => assert!(comments.is_empty()),
        other => panic!("expected children, got {other:?}"),
    }
}

#[test]
fn plural_accessors_reject_singular_associations() {
    let schema = common::seeded_blog();
    let author = schema.find("author", 1).unwrap().unwrap();
    let post = schema.find("post", 1).unwrap().unwrap();

    assert_eq!(
        author.get_related("posts"),
        Err(DataLayerError::AssociationKind("author".into(), "posts".into()))
    );
    assert!(matches!(
        author.set_related_many("posts", &[author.clone()]),
        Err(DataLayerError::AssociationTarget(..))
    ));
    assert!(post.set_related_many("author", &[]).is_err());
}

#[test]
fn destroy_removes_the_row_and_keeps_attributes() {
    let schema = common::seeded_blog();
    let post = schema.find("post", 2).unwrap().unwrap();

    post.destroy().unwrap();

    assert!(post.is_new());
    assert_eq!(post.attr("title").unwrap(), Some(json!("Ipsum")));
    assert_eq!(post.attr("id").unwrap(), None);
    assert_eq!(schema.find("post", 2).unwrap(), None);
    assert_eq!(schema.find("author", 1).unwrap().unwrap().related_ids("posts").unwrap(), vec![1]);
}

#[test]
fn handles_observe_each_others_writes() {
    let schema = common::seeded_blog();
    let one = schema.find("author", 1).unwrap().unwrap();
    let other = schema.find("author", 1).unwrap().unwrap();

    one.set("name", "Link the Hero").unwrap();

    assert_eq!(one, other);
    assert_eq!(other.attr("name").unwrap(), Some(json!("Link the Hero")));
    assert_eq!(
        one.set("id", 9),
        Err(DataLayerError::InvalidAttribute(
            "id is assigned by the record store and cannot be written".into()
        ))
    );
}

#[test]
fn custom_target_and_foreign_key() {
    let schema = Schema::builder()
        .model("user", [has_many("articles").model("post").foreign_key("writer_id")])
        .model("post", [belongs_to("writer").model("user")])
        .build(mocklayer::memory::InMemoryDb::new())
        .unwrap();

    let user = schema.create("user", json!({ "name": "Link" })).unwrap();
    let post = user.create_related("articles", json!({ "title": "Lorem" })).unwrap();

    assert_eq!(post.attr("writer_id").unwrap(), Some(json!(1)));
    assert_eq!(post.get_related("writer").unwrap(), Some(user));
}
