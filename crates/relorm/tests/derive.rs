mod common;

use relorm::prelude::*;
use relorm::{Cardinality, Row};

#[derive(Debug, Clone, Default, Record)]
struct BlogPost {
    #[orm(id)]
    post_id: i64,
    #[orm(column = "headline")]
    title: String,
    published: bool,
    #[orm(skip)]
    draft_notes: String,
    #[orm(relation = "post_id,post_id")]
    comments: Vec<Comment>,
}

#[derive(Debug, Clone, Default, Record)]
#[orm(table = "comments")]
struct Comment {
    id: i64,
    post_id: i64,
    body: Option<String>,
}

#[test]
fn table_and_primary_key() {
    common::assert_table::<BlogPost>("blog_post", "post_id");
    common::assert_table::<Comment>("comments", "id");
    common::assert_table::<common::User>("users", "id");
}

#[test]
fn columns_follow_attributes() {
    let columns: Vec<&str> = BlogPost::fields().iter().map(|f| f.column).collect();
    assert_eq!(columns, vec!["post_id", "headline", "published"]);
}

#[test]
fn relations_are_described() {
    let relations = BlogPost::relations();
    assert_eq!(relations.len(), 1);
    let desc = relations[0].descriptor().unwrap();
    assert_eq!(desc.field, "comments");
    assert_eq!(desc.local, "post_id");
    assert_eq!(desc.foreign, "post_id");
    assert_eq!(desc.cardinality, Cardinality::Many);
    assert_eq!(desc.connection, None);
}

#[test]
fn from_row_uses_column_names() {
    let row = Row::new()
        .with("post_id", 3)
        .with("headline", "hello")
        .with("published", true)
        .with("unrelated", 1);
    let post = BlogPost::from_row(&row).unwrap();
    assert_eq!(post.post_id, 3);
    assert_eq!(post.title, "hello");
    assert!(post.published);
    assert!(post.draft_notes.is_empty());
}

#[test]
fn from_row_reports_the_bad_column() {
    let row = Row::new().with("id", "not a number");
    let err = Comment::from_row(&row).unwrap_err();
    assert!(matches!(err, OrmError::Decode { ref column, .. } if column == "id"), "{err}");
}

#[test]
fn nullable_column_round_trips_null() {
    let row = Row::new().with("id", 1).with("body", Value::Null);
    let comment = Comment::from_row(&row).unwrap();
    assert_eq!(comment.body, None);

    let field = Comment::field("body").unwrap();
    assert!((field.is_zero)(&comment));
    assert_eq!((field.get)(&comment), Value::Null);
}
