//! Schema queries and collection bulk operations.

mod common;

use mocklayer::prelude::*;
use serde_json::json;

#[test]
fn schema_queries_follow_store_order() {
    let schema = common::seeded_blog();

    assert_eq!(schema.all("author").unwrap().ids(), vec![1, 2, 3]);
    assert_eq!(schema.find_many("author", &[3, 1]).unwrap().ids(), vec![1, 3]);
    assert_eq!(schema.first("photo").unwrap().unwrap().id(), Some(1));
    assert_eq!(schema.find("photo", 7).unwrap(), None);

    let filter = Filter::any_of("name", ["Epona", "Link"]);
    let names = common::pluck(&schema.filter("author", &filter).unwrap(), "name");
    assert_eq!(names, vec![json!("Link"), json!("Epona")]);
}

#[test]
fn filter_and_index() {
    let schema = common::seeded_blog();
    let authors = schema.all("author").unwrap();

    let short = authors.filter(|author| {
        author
            .attr("name")
            .unwrap()
            .and_then(|name| name.as_str().map(str::len))
            .is_some_and(|len| len == 4)
    });

    assert_eq!(short.ids(), vec![1]);
    assert_eq!(authors[2].attr("name").unwrap(), Some(json!("Epona")));
    assert_eq!(authors.get(3), None);
    assert_eq!((&authors).into_iter().count(), 3);
}

#[test]
fn related_unions_without_duplicates() {
    let schema = common::seeded_blog();

    let authors = schema.all("post").unwrap().related("author").unwrap();
    assert_eq!(authors.model_name(), "author");
    assert_eq!(authors.ids(), vec![1]);

    let posts = schema.all("author").unwrap().related("posts").unwrap();
    assert_eq!(posts.ids(), vec![1, 2]);
}

#[test]
fn update_all_writes_every_member() {
    let schema = common::seeded_blog();
    let photos = schema.all("photo").unwrap();

    photos.update_all(json!({ "location": "Kakariko" })).unwrap();

    assert_eq!(
        common::pluck(&schema.all("photo").unwrap(), "location"),
        vec![json!("Kakariko"), json!("Kakariko")]
    );
    assert!(photos.update_all(json!({ "id": 4 })).is_err());
}

#[test]
fn save_all_and_destroy_all() {
    let schema = common::blog_schema();
    let photos = schema
        .collection(
            "photo",
            vec![
                schema.new_record("photo", json!({ "title": "Amazing" })).unwrap(),
                schema.new_record("photo", json!({ "title": "Photo" })).unwrap(),
            ],
        )
        .unwrap();

    photos.save_all().unwrap();
    assert_eq!(photos.ids(), vec![1, 2]);
    assert_eq!(schema.all("photo").unwrap().len(), 2);

    photos.destroy_all().unwrap();
    assert!(schema.all("photo").unwrap().is_empty());
    assert!(photos.iter().all(Record::is_new));
    assert_eq!(
        photos.attrs().unwrap().iter().map(|attrs| attrs["title"].clone()).collect::<Vec<_>>(),
        vec![json!("Amazing"), json!("Photo")]
    );
}

#[test]
fn collections_hold_one_model() {
    let schema = common::seeded_blog();
    let post = schema.find("post", 1).unwrap().unwrap();

    assert!(matches!(
        schema.collection("author", vec![post]),
        Err(DataLayerError::AssociationTarget(..))
    ));
}

#[test]
fn fixtures_can_be_emptied_and_reloaded() {
    let schema = common::seeded_blog();

    schema.empty_data().unwrap();
    assert!(schema.all("author").unwrap().is_empty());

    let created = schema.create("author", json!({ "name": "Impa" })).unwrap();
    assert_eq!(created.id(), Some(1));

    assert_eq!(
        schema.load_data(json!({ "authors": [{ "id": 1, "name": "Link" }] })),
        Err(DataLayerError::RecordAlreadyExists(1, "authors".into()))
    );
    assert!(schema.load_data(json!([1])).is_err());
}

#[test]
fn schema_declarations_are_validated() {
    let duplicate = Schema::builder()
        .model("author", [])
        .model("author", [])
        .build(mocklayer::memory::InMemoryDb::new());
    assert!(matches!(duplicate, Err(DataLayerError::InvalidSchema(_))));

    let dangling = Schema::builder()
        .model("post", [belongs_to("author")])
        .build(mocklayer::memory::InMemoryDb::new());
    assert!(matches!(dangling, Err(DataLayerError::InvalidSchema(_))));

    let twice = Schema::builder()
        .model("author", [has_many("posts"), has_many("posts")])
        .model("post", [])
        .build(mocklayer::memory::InMemoryDb::new());
    assert!(matches!(twice, Err(DataLayerError::InvalidSchema(_))));
}

#[test]
fn schema_creates_a_table_per_model() {
    let db = mocklayer::memory::InMemoryDb::new();
    let schema = Schema::builder()
        .model("person", [])
        .model("category", [])
        .build(db.clone())
        .unwrap();

    assert_eq!(db.list_tables().unwrap(), vec!["categories".to_string(), "people".to_string()]);
    assert_eq!(schema.model("person").unwrap().table(), "people");
    assert_eq!(
        schema.new_record("animal", json!({})).unwrap_err(),
        DataLayerError::UnknownModel("animal".into())
    );
}

#[test]
fn table_names_map_back_to_their_models() {
    let schema = Schema::builder()
        .model("quiz", [])
        .model("person", [has_many("quizes")])
        .build(mocklayer::memory::InMemoryDb::new())
        .unwrap();

    assert_eq!(schema.model_name_for("quizes"), "quiz");
    assert_eq!(schema.model_name_for("quiz"), "quiz");
    assert_eq!(schema.model_name_for("people"), "person");
    assert_eq!(schema.model_name_for("books"), "book");
    assert_eq!(schema.association("person", "quizes").unwrap().target(), "quiz");
}
