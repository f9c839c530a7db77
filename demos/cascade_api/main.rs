//! Cascade API example
//!
//! Seeds an in-memory store with a small organisation and serves the
//! cascade routes on port 3000.
//!
//! ```bash
//! curl -X POST localhost:3000/user/deleteMany \
//!     -H 'content-type: application/json' \
//!     -d '{"ids": ["alice"], "isWarning": true}'
//! ```

use anyhow::Result;
use cascade::prelude::*;
use tracing_subscriber::EnvFilter;

fn seed(store: &InMemoryStore) -> Result<()> {
    store.insert("company", json!({"id": "acme", "name": "Acme"}))?;
    store.insert_many(
        "user",
        vec![
            json!({"id": "alice", "user_company": "acme"}),
            json!({"id": "bob", "user_company": "acme"}),
        ],
    )?;

    store.insert("space", json!({"id": "hq", "name": "Head office"}))?;
    store.insert(
        "meeting",
        json!({"id": "standup", "space_id": "hq", "user_id": "alice"}),
    )?;
    store.insert_many(
        "user_x_meeting",
        vec![
            json!({"meeting_id": "standup", "user_id": "alice"}),
            json!({"meeting_id": "standup", "user_id": "bob"}),
        ],
    )?;

    store.insert("bulletin", json!({"addedBy": "alice", "title": "Welcome"}))?;
    store.insert("role", json!({"id": "admin", "addedBy": "alice"}))?;
    store.insert("userRole", json!({"userId": "bob", "roleId": "admin"}))?;

    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let store = InMemoryStore::new();
    seed(&store)?;

    tracing::info!("Seeded demo data");
    tracing::info!("Try: DELETE /space/delete/hq with body {{\"isWarning\": true}}");

    ServerBuilder::new()
        .with_accessor(store)
        .with_options(EngineOptions {
            concurrent_fanout: true,
        })
        .serve("127.0.0.1:3000")
        .await
}
