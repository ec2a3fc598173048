mod fixtures;

use fixtures::*;
use jsonapi::prelude::*;
use jsonapi::{FormatError, ValueError};

const BLOG_PAYLOAD: &str = r#"{
    "data": {
        "type": "blogs",
        "id": "5",
        "attributes": {
            "title": "Title 1",
            "current_post_id": 1,
            "created_at": "2016-07-01T12:00:00Z",
            "view_count": 1000
        },
        "relationships": {
            "posts": {"data": [{"type": "posts", "id": "1"}, {"type": "posts", "id": "2"}]},
            "current_post": {"data": {"type": "posts", "id": "1"}}
        }
    },
    "included": [
        {
            "type": "posts",
            "id": "1",
            "attributes": {"blog_id": 5, "title": "Foo", "body": "body of Foo"},
            "relationships": {"comments": {"data": [{"type": "comments", "id": "1"}]}}
        },
        {
            "type": "comments",
            "id": "1",
            "attributes": {"post_id": 1, "body": "foo"}
        }
    ]
}"#;

#[test]
fn decodes_attributes_and_included_relations() {
    let blog: Blog = jsonapi::unmarshal_payload(BLOG_PAYLOAD.as_bytes()).unwrap();
    assert_eq!(blog.id, 5);
    assert_eq!(blog.title, "Title 1");
    assert_eq!(blog.created_at, created_at());
    assert_eq!(blog.view_count, 1000);

    let first = blog.posts[0].get().unwrap();
    assert_eq!(first.title, "Foo");
    assert_eq!(first.comments[0].get().map(|c| c.body.as_str()), Some("foo"));

    let current = blog.current_post.as_ref().and_then(Related::get).unwrap();
    assert_eq!(current.id, 1);
}

#[test]
fn linkage_missing_from_included_stays_a_reference() {
    let blog: Blog = jsonapi::unmarshal_payload(BLOG_PAYLOAD.as_bytes()).unwrap();
    assert_eq!(blog.posts[1], Related::reference("posts", "2"));
}

#[test]
fn sideloaded_round_trip_restores_the_graph() {
    let blog = sample_blog();
    let mut out = Vec::new();
    jsonapi::marshal_one_payload(&mut out, &blog).unwrap();

    let back: Blog = jsonapi::unmarshal_payload(out.as_slice()).unwrap();
    assert_eq!(back, blog);
}

#[test]
fn embedded_round_trip_restores_the_graph() {
    let blog = sample_blog();
    let mut out = Vec::new();
    jsonapi::marshal_one_embedded_payload(&mut out, &blog).unwrap();

    let back: Blog = jsonapi::unmarshal_payload(out.as_slice()).unwrap();
    assert_eq!(back, blog);
}

#[test]
fn collection_round_trip() {
    let posts = vec![
        post(1, "Foo", vec![comment(1, 1, "foo")]),
        post(2, "Bar", vec![comment(1, 1, "foo"), comment(3, 2, "baz")]),
    ];
    let mut out = Vec::new();
    jsonapi::marshal_many_payload(&mut out, &posts).unwrap();

    let back: Vec<Post> = jsonapi::unmarshal_many_payload(out.as_slice()).unwrap();
    assert_eq!(back, posts);
}

#[test]
fn cyclic_document_decodes_back_edge_as_reference() {
    let payload = r#"{
        "data": {"type": "people", "id": "ann", "attributes": {"name": "Ann"},
                 "relationships": {"friends": {"data": [{"type": "people", "id": "bob"}]}}},
        "included": [
            {"type": "people", "id": "bob", "attributes": {"name": "Bob"},
             "relationships": {"friends": {"data": [{"type": "people", "id": "ann"}]}}}
        ]
    }"#;
    let ann: Person = jsonapi::unmarshal_payload(payload.as_bytes()).unwrap();
    let bob = ann.friends[0].get().unwrap();
    assert_eq!(bob.name, "Bob");
    assert_eq!(bob.friends[0], Related::reference("people", "ann"));
    assert_eq!(ann.scratch, "");
}

#[test]
fn record_without_id_decodes_into_optional_identifier() {
    let payload = r#"{"data": {"type": "comments", "attributes": {"body": "draft"}}}"#;
    let draft: NewComment = jsonapi::unmarshal_payload(payload.as_bytes()).unwrap();
    assert_eq!(draft.id, None);
    assert_eq!(draft.body, "draft");
}

#[test]
fn shape_mismatches_are_format_errors() {
    let many = r#"{"data": [{"type": "comments", "id": "1"}]}"#;
    let err = jsonapi::unmarshal_payload::<Comment, _>(many.as_bytes()).unwrap_err();
    assert!(matches!(
        err,
        Error::Format(FormatError::DataShape { expected: "object", .. })
    ));

    let one = r#"{"data": {"type": "comments", "id": "1"}}"#;
    let err = jsonapi::unmarshal_many_payload::<Comment, _>(one.as_bytes()).unwrap_err();
    assert!(matches!(
        err,
        Error::Format(FormatError::DataShape { expected: "array", .. })
    ));

    let err = jsonapi::unmarshal_payload::<Comment, _>(r#"{"meta": {}}"#.as_bytes()).unwrap_err();
    assert!(matches!(err, Error::Format(FormatError::MissingData)));

    let err = jsonapi::unmarshal_payload::<Comment, _>("[1, 2".as_bytes()).unwrap_err();
    assert!(matches!(err, Error::Format(FormatError::Json(_))));
}

#[test]
fn wrong_attribute_type_names_the_field() {
    let payload = r#"{"data": {"type": "blogs", "id": "1", "attributes": {"view_count": "lots"}}}"#;
    match jsonapi::unmarshal_payload::<Blog, _>(payload.as_bytes()).unwrap_err() {
        Error::Conversion(e) => {
            assert_eq!(e.resource_type, "blogs");
            assert_eq!(e.field, "view_count");
            assert!(matches!(e.reason, ValueError::Mismatch { .. }));
        }
        other => panic!("unexpected error: {other:?}"),
    }
}

#[test]
fn timestamps_accept_unix_seconds() {
    let payload = r#"{"data": {"type": "blogs", "id": "1", "attributes": {"created_at": 1467374400}}}"#;
    let blog: Blog = jsonapi::unmarshal_payload(payload.as_bytes()).unwrap();
    assert_eq!(blog.created_at, created_at());
}

#[test]
fn document_api_decodes_without_reparsing() {
    let document = Document::from_str(BLOG_PAYLOAD).unwrap();
    let blog: Blog = jsonapi::unmarshal_one(&document).unwrap();
    assert_eq!(blog.posts.len(), 2);
    assert_eq!(document.included.len(), 2);
}
