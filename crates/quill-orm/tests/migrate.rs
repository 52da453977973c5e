//! Migration tests.

mod common;

use common::{engine, seeded_engine, User};
use quill_orm::{MigrationPlan, Record, SqlValue};

async fn live_columns(engine: &quill_orm::Engine, table: &str) -> Vec<String> {
    let mut session = engine.new_session();
    session
        .raw(&format!("SELECT * FROM {table} LIMIT 1"), [])
        .query_rows()
        .await
        .unwrap()
        .columns()
        .to_vec()
}

#[tokio::test]
async fn test_migrate_creates_missing_table() {
    let engine = engine().await;
    let plan = engine.migrate::<User>().await.unwrap();
    assert_eq!(
        plan,
        MigrationPlan {
            created: true,
            ..MigrationPlan::default()
        }
    );
    assert_eq!(live_columns(&engine, "User").await, vec!["name", "age"]);
}

#[tokio::test]
async fn test_migrate_noop_when_columns_match() {
    let engine = seeded_engine().await;
    let plan = engine.migrate::<User>().await.unwrap();
    assert!(plan.is_noop());

    let mut session = engine.new_session();
    assert_eq!(session.model::<User>().count().await.unwrap(), 2);
}

#[tokio::test]
async fn test_migrate_adds_and_removes_columns() {
    let engine = engine().await;
    let mut session = engine.new_session();
    session
        .raw("CREATE TABLE User (name text PRIMARY KEY, XXX integer)", [])
        .exec()
        .await
        .unwrap();
    session
        .raw("INSERT INTO User (name, XXX) VALUES (?, ?), (?, ?)", [
            SqlValue::Text("Tom".into()),
            SqlValue::Int(1),
            SqlValue::Text("Sam".into()),
            SqlValue::Int(2),
        ])
        .exec()
        .await
        .unwrap();

    let plan = engine.migrate::<User>().await.unwrap();
    assert!(!plan.created);
    assert_eq!(plan.added, vec!["age"]);
    assert_eq!(plan.removed, vec!["XXX"]);

    assert_eq!(live_columns(&engine, "User").await, vec!["name", "age"]);

    let rows = session
        .raw("SELECT name, age FROM User ORDER BY name", [])
        .query_rows()
        .await
        .unwrap();
    let names: Vec<String> = rows
        .iter()
        .map(|row| row.get::<String>("name").unwrap())
        .collect();
    assert_eq!(names, vec!["Sam", "Tom"]);
    assert!(rows.iter().all(|row| row.value("age") == Some(&SqlValue::Null)));
}

#[tokio::test]
async fn test_migrate_add_only_keeps_rows() {
    let engine = engine().await;
    let mut session = engine.new_session();
    session
        .raw("CREATE TABLE User (name text PRIMARY KEY)", [])
        .exec()
        .await
        .unwrap();
    session
        .raw("INSERT INTO User (name) VALUES (?)", [SqlValue::Text("Tom".into())])
        .exec()
        .await
        .unwrap();

    let plan = engine.migrate::<User>().await.unwrap();
    assert_eq!(plan.added, vec!["age"]);
    assert!(plan.removed.is_empty());

    // Added columns start out NULL
    let row = session
        .raw("SELECT name, age FROM User", [])
        .query_row()
        .await
        .unwrap()
        .unwrap();
    assert_eq!(row.get::<Option<i32>>("age").unwrap(), None);
    session
        .model::<User>()
        .update([("age", 18)])
        .await
        .unwrap();
    let tom: User = session.first().await.unwrap();
    assert_eq!(tom, User::new("Tom", 18));
}

#[tokio::test]
async fn test_migrate_works_on_empty_table() {
    let engine = engine().await;
    let mut session = engine.new_session();
    session
        .raw("CREATE TABLE User (legacy text, name text)", [])
        .exec()
        .await
        .unwrap();

    let plan = engine.migrate::<User>().await.unwrap();
    assert_eq!(plan.added, vec!["age"]);
    assert_eq!(plan.removed, vec!["legacy"]);
    assert_eq!(
        live_columns(&engine, User::TABLE_NAME).await,
        vec!["name", "age"]
    );
}

#[tokio::test]
async fn test_failed_migration_rolls_back() {
    let engine = engine().await;
    let mut session = engine.new_session();
    session
        .raw("CREATE TABLE User (name text, XXX integer)", [])
        .exec()
        .await
        .unwrap();
    // Occupies the name the rebuild needs
    session
        .raw("CREATE TABLE tmp_User (x integer)", [])
        .exec()
        .await
        .unwrap();

    assert!(engine.migrate::<User>().await.is_err());
    // The added column was rolled back with the rest
    assert_eq!(live_columns(&engine, "User").await, vec!["name", "XXX"]);
}
