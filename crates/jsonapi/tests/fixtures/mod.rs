//! Test fixtures for jsonapi integration tests.
#![allow(dead_code)]

use chrono::{DateTime, TimeZone, Utc};
use jsonapi::prelude::*;

#[derive(Debug, Clone, Default, PartialEq, Resource)]
pub struct Blog {
    #[jsonapi(primary = "blogs")]
    pub id: u64,
    #[jsonapi(attr)]
    pub title: String,
    #[jsonapi(relation)]
    pub posts: Vec<Related<Post>>,
    #[jsonapi(relation = "current_post")]
    pub current_post: Option<Related<Post>>,
    #[jsonapi(attr = "current_post_id")]
    pub current_post_id: u64,
    #[jsonapi(attr = "created_at")]
    pub created_at: DateTime<Utc>,
    #[jsonapi(attr = "view_count")]
    pub view_count: i64,
}

#[derive(Debug, Clone, Default, PartialEq, Resource)]
pub struct Post {
    #[jsonapi(primary = "posts")]
    pub id: u64,
    #[jsonapi(attr = "blog_id")]
    pub blog_id: u64,
    #[jsonapi(attr)]
    pub title: String,
    #[jsonapi(attr)]
    pub body: String,
    #[jsonapi(relation)]
    pub comments: Vec<Related<Comment>>,
}

#[derive(Debug, Clone, Default, PartialEq, Resource)]
pub struct Comment {
    #[jsonapi(primary = "comments")]
    pub id: u64,
    #[jsonapi(attr = "post_id", omitempty)]
    pub post_id: u64,
    #[jsonapi(attr)]
    pub body: String,
}

/// A comment that has not been saved yet: no id on the wire.
#[derive(Debug, Clone, Default, PartialEq, Resource)]
pub struct NewComment {
    #[jsonapi(primary = "comments")]
    pub id: Option<u64>,
    #[jsonapi(attr)]
    pub body: String,
}

/// A thread collecting unsaved comments.
#[derive(Debug, Clone, Default, PartialEq, Resource)]
pub struct Thread {
    #[jsonapi(primary = "threads")]
    pub id: u64,
    #[jsonapi(relation)]
    pub drafts: Vec<Related<NewComment>>,
}

/// Self-referencing type with string ids.
#[derive(Debug, Clone, Default, PartialEq, Resource)]
pub struct Person {
    #[jsonapi(primary = "people")]
    pub id: String,
    #[jsonapi(attr)]
    pub name: String,
    #[jsonapi(relation, embedded)]
    pub pets: Vec<Related<Pet>>,
    #[jsonapi(relation)]
    pub friends: Vec<Related<Person>>,
    /// Not part of the resource.
    pub scratch: String,
}

/// Derived against the core crate directly.
#[derive(Debug, Clone, Default, PartialEq, Resource)]
#[jsonapi(crate = "jsonapi_core")]
pub struct Pet {
    #[jsonapi(primary = "pets")]
    pub id: u32,
    #[jsonapi(attr)]
    pub name: String,
}

pub fn comment(id: u64, post_id: u64, body: &str) -> Comment {
    Comment {
        id,
        post_id,
        body: body.to_string(),
    }
}

pub fn post(id: u64, title: &str, comments: Vec<Comment>) -> Post {
    Post {
        id,
        blog_id: 5,
        title: title.to_string(),
        body: format!("body of {title}"),
        comments: comments.into_iter().map(Related::new).collect(),
    }
}

pub fn created_at() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2016, 7, 1, 12, 0, 0)
        .single()
        .unwrap_or_default()
}

/// A blog with two posts sharing comment 2; the current post is post 1.
pub fn sample_blog() -> Blog {
    let first = post(
        1,
        "Foo",
        vec![comment(1, 1, "foo"), comment(2, 1, "bar")],
    );
    let second = post(2, "Fuubar", vec![comment(2, 1, "bar")]);
    Blog {
        id: 5,
        title: "Title 1".to_string(),
        posts: vec![Related::new(first.clone()), Related::new(second)],
        current_post: Some(Related::new(first)),
        current_post_id: 1,
        created_at: created_at(),
        view_count: 1000,
    }
}
