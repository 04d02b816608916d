//! Engine tests against an in-memory SQLite database: statement lookup,
//! placeholder binding, select materialization, and execute round trips.

use pretty_assertions::assert_eq;
use serde::{Deserialize, Serialize};
use serde_json::json;
use sqlweave::prelude::*;
use sqlx::any::AnyPoolOptions;

fn definition_root() -> Node {
    Node::new("mapper")
        .with_attr("namespace", "user")
        .with_child(Element::Node(
            Node::new("select")
                .with_id("find_all")
                .with_attr("result_type", "structs")
                .with_text("SELECT id, name, mail FROM users ORDER BY id"),
        ))
        .with_child(Element::Node(
            Node::new("select")
                .with_id("count")
                .with_attr("result_type", "value")
                .with_text("SELECT count(*) FROM users"),
        ))
        .with_child(Element::Node(
            Node::new("select")
                .with_id("name_of")
                .with_attr("result_type", "value")
                .with_text("SELECT name FROM users WHERE id = ?"),
        ))
        .with_child(Element::Node(
            Node::new("insert")
                .with_id("add")
                .with_text("INSERT INTO users (id, name, mail) VALUES (?, ?, ?)"),
        ))
        .with_child(Element::Node(
            Node::new("delete")
                .with_id("remove")
                .with_text("DELETE FROM users WHERE id = {{ id }}"),
        ))
}

#[derive(Debug, Default, PartialEq, Serialize, Deserialize)]
struct User {
    id: i64,
    name: String,
    mail: String,
}

/// One pooled connection so every statement sees the same in-memory
/// database.
async fn connect() -> MapperDb {
    sqlx::any::install_default_drivers();
    let pool = AnyPoolOptions::new()
        .max_connections(1)
        .connect("sqlite::memory:")
        .await
        .expect("in-memory sqlite should connect");

    sqlx::query("CREATE TABLE users (id INTEGER PRIMARY KEY, name TEXT NOT NULL, mail TEXT)")
        .execute(&pool)
        .await
        .expect("schema should apply");

    let mapper = Mapper::from_root(&definition_root()).expect("definition should register");
    MapperDb::with_pool(pool, mapper)
}

async fn seed(db: &MapperDb) {
    let added = db
        .statement("user.add")
        .unwrap()
        .bind(1i64)
        .bind("ada")
        .bind("ada@example.com")
        .execute(&json!({}))
        .await
        .unwrap();
    assert_eq!(added, 1);

    db.statement("user.add")
        .unwrap()
        .bind(2i64)
        .bind("grace")
        .bind(BindValue::Null)
        .execute(&json!({}))
        .await
        .unwrap();
}

#[tokio::test]
async fn select_materializes_structs_with_null_column() {
    let db = connect().await;
    seed(&db).await;

    let mut users: Vec<User> = Vec::new();
    db.statement("user.find_all")
        .unwrap()
        .select(&json!({}), &mut users)
        .await
        .unwrap();

    // grace's mail is NULL in the database and lands as the zero value.
    assert_eq!(
        users,
        vec![
            User {
                id: 1,
                name: "ada".into(),
                mail: "ada@example.com".into(),
            },
            User {
                id: 2,
                name: "grace".into(),
                mail: String::new(),
            },
        ]
    );
}

#[tokio::test]
async fn select_with_placeholder_binding_yields_scalar() {
    let db = connect().await;
    seed(&db).await;

    let mut count = 0i64;
    db.statement("user.count")
        .unwrap()
        .select(&json!({}), &mut count)
        .await
        .unwrap();
    assert_eq!(count, 2);

    let mut name = String::new();
    db.statement("user.name_of")
        .unwrap()
        .bind(2i64)
        .select(&json!({}), &mut name)
        .await
        .unwrap();
    assert_eq!(name, "grace");
}

#[tokio::test]
async fn execute_reports_affected_rows() {
    let db = connect().await;
    seed(&db).await;

    let removed = db
        .statement("user.remove")
        .unwrap()
        .execute(&json!({"id": 1}))
        .await
        .unwrap();
    assert_eq!(removed, 1);

    let mut count = 0i64;
    db.statement("user.count")
        .unwrap()
        .select(&json!({}), &mut count)
        .await
        .unwrap();
    assert_eq!(count, 1);
}

#[tokio::test]
async fn statement_kind_misuse_is_a_definition_error() {
    let db = connect().await;

    let mut users: Vec<User> = Vec::new();
    let err = db
        .statement("user.add")
        .unwrap()
        .select(&json!({}), &mut users)
        .await
        .unwrap_err();
    assert!(matches!(err, MapperError::Definition(_)));

    let err = db
        .statement("user.find_all")
        .unwrap()
        .execute(&json!({}))
        .await
        .unwrap_err();
    assert!(matches!(err, MapperError::Definition(_)));

    match db.statement("user.missing") {
        Err(MapperError::Definition(msg)) => assert!(msg.contains("user.missing")),
        _ => panic!("unregistered id should be a definition error"),
    }
}
