//! Session integration tests against in-memory SQLite.

mod common;

use std::collections::{BTreeMap, HashMap};
use std::sync::atomic::{AtomicUsize, Ordering};

use common::{engine, seeded_engine, User};
use quill_orm::{HookResult, Hooks, OrmError, Record, SqlValue};

#[tokio::test]
async fn test_create_and_has_table() {
    let engine = engine().await;
    let mut session = engine.new_session();
    session.model::<User>();
    assert!(!session.has_table().await.unwrap());
    session.create_table().await.unwrap();
    assert!(session.has_table().await.unwrap());

    // The declared constraint is part of the table
    let err = session
        .raw("INSERT INTO User (name, age) VALUES (?, ?), (?, ?)", [
            SqlValue::Text("Tom".into()),
            SqlValue::Int(1),
            SqlValue::Text("Tom".into()),
            SqlValue::Int(2),
        ])
        .exec()
        .await
        .unwrap_err();
    assert!(matches!(err, OrmError::Database(_)));
}

#[tokio::test]
async fn test_insert_and_count() {
    let engine = seeded_engine().await;
    let mut session = engine.new_session();
    assert_eq!(session.model::<User>().count().await.unwrap(), 2);
}

#[tokio::test]
async fn test_insert_empty_slice() {
    let engine = engine().await;
    let mut session = engine.new_session();
    let mut users: Vec<User> = Vec::new();
    // No table exists: an empty insert never reaches the store
    assert_eq!(session.insert(&mut users).await.unwrap(), 0);
}

#[tokio::test]
async fn test_empty_insert_clears_pending_conditions() {
    let engine = seeded_engine().await;
    let mut session = engine.new_session();
    let mut none: Vec<User> = Vec::new();
    let written = session
        .model::<User>()
        .where_clause("age > ?", [SqlValue::Int(100)])
        .insert(&mut none)
        .await
        .unwrap();
    assert_eq!(written, 0);
    // The WHERE set before the empty insert must not filter the count
    assert_eq!(session.count().await.unwrap(), 2);
}

#[tokio::test]
async fn test_find_all() {
    let engine = seeded_engine().await;
    let mut session = engine.new_session();
    let mut users: Vec<User> = Vec::new();
    session.order_by("age").find(&mut users).await.unwrap();
    assert_eq!(users, vec![User::new("Tom", 18), User::new("Sam", 25)]);
}

#[tokio::test]
async fn test_find_appends() {
    let engine = seeded_engine().await;
    let mut session = engine.new_session();
    let mut users = vec![User::new("Kept", 1)];
    session
        .where_clause("name = ?", [SqlValue::Text("Sam".into())])
        .find(&mut users)
        .await
        .unwrap();
    assert_eq!(users, vec![User::new("Kept", 1), User::new("Sam", 25)]);
}

#[tokio::test]
async fn test_where_order_limit() {
    let engine = seeded_engine().await;
    let mut session = engine.new_session();
    let mut users: Vec<User> = Vec::new();
    session
        .where_clause("age > ?", [SqlValue::Int(20)])
        .order_by("age DESC")
        .limit(10)
        .find(&mut users)
        .await
        .unwrap();
    assert_eq!(users, vec![User::new("Sam", 25)]);
}

#[tokio::test]
async fn test_first() {
    let engine = seeded_engine().await;
    let mut session = engine.new_session();
    let tom: User = session
        .where_clause("name = ?", [SqlValue::Text("Tom".into())])
        .first()
        .await
        .unwrap();
    assert_eq!(tom, User::new("Tom", 18));

    let err = session
        .where_clause("age > ?", [SqlValue::Int(100)])
        .first::<User>()
        .await
        .unwrap_err();
    assert!(matches!(err, OrmError::NotFound));
}

#[tokio::test]
async fn test_conditions_do_not_leak_between_statements() {
    let engine = seeded_engine().await;
    let mut session = engine.new_session();
    let _: User = session
        .where_clause("name = ?", [SqlValue::Text("Tom".into())])
        .first()
        .await
        .unwrap();
    // The previous WHERE and LIMIT were consumed
    assert_eq!(session.count().await.unwrap(), 2);
}

#[tokio::test]
async fn test_update() {
    let engine = seeded_engine().await;
    let mut session = engine.new_session();
    let affected = session
        .model::<User>()
        .where_clause("name = ?", [SqlValue::Text("Tom".into())])
        .update([("age", 30)])
        .await
        .unwrap();
    assert_eq!(affected, 1);

    let tom: User = session
        .where_clause("name = ?", [SqlValue::Text("Tom".into())])
        .first()
        .await
        .unwrap();
    assert_eq!(tom.age, 30);
}

#[tokio::test]
async fn test_update_accepts_maps() {
    let engine = seeded_engine().await;
    let mut session = engine.new_session();
    session.model::<User>();

    let mut changes = HashMap::new();
    changes.insert("age", SqlValue::Int(40));
    assert_eq!(session.update(changes).await.unwrap(), 2);

    let mut changes = BTreeMap::new();
    changes.insert("age".to_string(), 41_i64);
    assert_eq!(
        session
            .where_clause("name = ?", [SqlValue::Text("Sam".into())])
            .update(changes)
            .await
            .unwrap(),
        1
    );

    let mut users: Vec<User> = Vec::new();
    session.order_by("name").find(&mut users).await.unwrap();
    assert_eq!(users, vec![User::new("Sam", 41), User::new("Tom", 40)]);
}

#[tokio::test]
async fn test_update_without_assignments() {
    let engine = seeded_engine().await;
    let mut session = engine.new_session();
    let err = session
        .model::<User>()
        .where_clause("name = ?", [SqlValue::Text("Tom".into())])
        .update(Vec::<(String, SqlValue)>::new())
        .await
        .unwrap_err();
    assert!(matches!(err, OrmError::Query(_)));
    // The abandoned WHERE does not apply to the next statement
    assert_eq!(session.count().await.unwrap(), 2);
}

#[tokio::test]
async fn test_operations_require_model() {
    let engine = engine().await;
    let mut session = engine.new_session();
    assert!(matches!(session.count().await, Err(OrmError::ModelNotSet)));
    assert!(matches!(session.delete().await, Err(OrmError::ModelNotSet)));
    assert!(matches!(
        session.update([("age", 1)]).await,
        Err(OrmError::ModelNotSet)
    ));
    assert!(matches!(
        session.has_table().await,
        Err(OrmError::ModelNotSet)
    ));
}

#[tokio::test]
async fn test_delete() {
    let engine = seeded_engine().await;
    let mut session = engine.new_session();
    let removed = session
        .model::<User>()
        .where_clause("name = ?", [SqlValue::Text("Tom".into())])
        .delete()
        .await
        .unwrap();
    assert_eq!(removed, 1);
    assert_eq!(session.count().await.unwrap(), 1);

    assert_eq!(session.delete().await.unwrap(), 1);
    assert_eq!(session.count().await.unwrap(), 0);
}

#[tokio::test]
async fn test_count_with_condition() {
    let engine = seeded_engine().await;
    let mut session = engine.new_session();
    let adults = session
        .model::<User>()
        .where_clause("age >= ?", [SqlValue::Int(21)])
        .count()
        .await
        .unwrap();
    assert_eq!(adults, 1);
}

#[tokio::test]
async fn test_raw_query_rows() {
    let engine = seeded_engine().await;
    let mut session = engine.new_session();
    let rows = session
        .raw("SELECT name, age FROM User", [])
        .raw("WHERE age < ?", [SqlValue::Int(20)])
        .query_rows()
        .await
        .unwrap();
    assert_eq!(rows.columns(), &["name", "age"]);
    assert_eq!(rows.len(), 1);
    let row = rows.first().unwrap();
    assert_eq!(row.get::<String>("name").unwrap(), "Tom");
    assert_eq!(User::from_row(row).unwrap(), User::new("Tom", 18));
}

#[tokio::test]
async fn test_failed_statement_leaves_session_usable() {
    let engine = seeded_engine().await;
    let mut session = engine.new_session();
    let err = session
        .raw("SELECT nope FROM User WHERE age > ?", [SqlValue::Int(1)])
        .query_rows()
        .await
        .unwrap_err();
    assert!(matches!(err, OrmError::Database(_)));
    assert_eq!(session.pending_sql(), "");
    assert!(session.pending_values().is_empty());

    assert_eq!(session.model::<User>().count().await.unwrap(), 2);
}

#[tokio::test]
async fn test_drop_table() {
    let engine = seeded_engine().await;
    let mut session = engine.new_session();
    session.model::<User>().drop_table().await.unwrap();
    assert!(!session.has_table().await.unwrap());
}

// =============================================================================
// Hooks
// =============================================================================

static AFTER_INSERT_CALLS: AtomicUsize = AtomicUsize::new(0);

#[derive(Debug, Clone, PartialEq, Record)]
#[record(hooks)]
pub struct Account {
    #[record(tag = "PRIMARY KEY")]
    pub id: i64,
    pub password: String,
}

impl Hooks for Account {
    fn before_insert(&mut self) -> HookResult {
        self.id += 1000;
        Ok(())
    }

    fn after_insert() -> HookResult {
        AFTER_INSERT_CALLS.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    fn after_query(&mut self) -> HookResult {
        self.password = "******".to_string();
        Ok(())
    }

    fn before_delete() -> HookResult {
        Err("accounts are never deleted".into())
    }
}

#[tokio::test]
async fn test_hooks_run_around_operations() {
    let engine = engine().await;
    let mut session = engine.new_session();
    session.model::<Account>().create_table().await.unwrap();

    let mut accounts = vec![
        Account {
            id: 1,
            password: "secret".to_string(),
        },
        Account {
            id: 2,
            password: "hunter2".to_string(),
        },
    ];
    let before = AFTER_INSERT_CALLS.load(Ordering::SeqCst);
    session.insert(&mut accounts).await.unwrap();
    assert!(AFTER_INSERT_CALLS.load(Ordering::SeqCst) > before);
    // before_insert mutated the caller's records
    assert_eq!(accounts[0].id, 1001);

    let mut found: Vec<Account> = Vec::new();
    session.order_by("id").find(&mut found).await.unwrap();
    assert_eq!(
        found,
        vec![
            Account {
                id: 1001,
                password: "******".to_string(),
            },
            Account {
                id: 1002,
                password: "******".to_string(),
            },
        ]
    );

    // The store still holds the original value
    let row = session
        .raw("SELECT password FROM Account WHERE id = ?", [SqlValue::Int(1001)])
        .query_row()
        .await
        .unwrap()
        .unwrap();
    assert_eq!(row.get::<String>("password").unwrap(), "secret");
}

#[tokio::test]
async fn test_failing_hook_aborts_operation() {
    let engine = engine().await;
    let mut session = engine.new_session();
    session.model::<Account>().create_table().await.unwrap();
    let mut accounts = vec![Account {
        id: 1,
        password: "secret".to_string(),
    }];
    session.insert(&mut accounts).await.unwrap();

    let err = session
        .where_clause("id = ?", [SqlValue::Int(1001)])
        .delete()
        .await
        .unwrap_err();
    assert!(matches!(err, OrmError::Hook { hook: "before_delete", .. }));
    assert_eq!(session.count().await.unwrap(), 1);
}

// =============================================================================
// Records declared through the quill-orm re-export
// =============================================================================

#[derive(Debug, Clone, PartialEq, Record)]
#[record(crate = "quill_orm::quill_core", table = "Book")]
pub struct Book {
    #[record(tag = "PRIMARY KEY")]
    pub title: String,
    pub pages: i64,
}

#[tokio::test]
async fn test_record_through_orm_reexport() {
    let engine = engine().await;
    let mut session = engine.new_session();
    session.model::<Book>().create_table().await.unwrap();
    assert_eq!(session.ref_table().unwrap().field_names(), &["title", "pages"]);

    let mut books = vec![Book {
        title: "Dune".to_string(),
        pages: 412,
    }];
    assert_eq!(session.insert(&mut books).await.unwrap(), 1);

    let found: Book = session
        .where_clause("pages > ?", [SqlValue::Int(400)])
        .first()
        .await
        .unwrap();
    assert_eq!(found, books[0]);
}
