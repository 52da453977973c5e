//! Shared fixtures for integration tests.

#![allow(dead_code)]

use quill_orm::{DialectRegistry, Engine, EngineOptions, Record};

#[derive(Debug, Clone, PartialEq, Record)]
pub struct User {
    #[record(tag = "PRIMARY KEY")]
    pub name: String,
    pub age: i32,
}

impl User {
    pub fn new(name: &str, age: i32) -> Self {
        Self {
            name: name.to_string(),
            age,
        }
    }
}

pub fn registry() -> DialectRegistry {
    let mut registry = DialectRegistry::new();
    quill_orm::sqlite::register(&mut registry);
    registry
}

/// In-memory engine with a single connection, so every session sees the same
/// database.
pub async fn engine() -> Engine {
    let options = EngineOptions::new("sqlite::memory:").max_connections(1);
    Engine::connect(&options, &registry()).await.unwrap()
}

/// Engine with a `User` table holding Tom (18) and Sam (25).
pub async fn seeded_engine() -> Engine {
    let engine = engine().await;
    let mut session = engine.new_session();
    session.model::<User>().create_table().await.unwrap();
    let mut users = vec![User::new("Tom", 18), User::new("Sam", 25)];
    assert_eq!(session.insert(&mut users).await.unwrap(), 2);
    engine
}
