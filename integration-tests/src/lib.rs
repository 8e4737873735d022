//! Shared fixtures for the live-server test suite.
//!
//! Every test in `tests/` talks to a real PostgreSQL instance configured
//! through the usual `DB_*` environment variables (a `.env` file works) and
//! is marked `#[ignore]`, so `cargo test` stays green without a server and
//! `cargo test -- --ignored` runs the full suite against one.

use std::sync::Once;

use pg_curator_engine::prelude::{
    ConnectionConfig, Curator, StorageLayout, ToolingConfig,
};

static TRACING: Once = Once::new();

pub fn init_tracing() {
    TRACING.call_once(|| {
        tracing_subscriber::fmt()
            .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
            .with_test_writer()
            .init();
    });
}

/// A connected service whose storage directories live in a temp dir that is
/// deleted when the fixture drops.
pub struct TestDb {
    pub curator: Curator,
    pub storage_root: tempfile::TempDir,
}

impl TestDb {
    pub async fn connect() -> anyhow::Result<Self> {
        init_tracing();
        let storage_root = tempfile::tempdir()?;
        let curator = Curator::connect_with(
            ConnectionConfig::from_env(),
            ToolingConfig::default(),
            StorageLayout::under(storage_root.path()),
        )
        .await?;
        Ok(Self {
            curator,
            storage_root,
        })
    }

    async fn execute(&self, statement: &str) -> anyhow::Result<()> {
        self.curator.executor().execute(statement, Vec::new()).await?;
        Ok(())
    }

    /// Drops and recreates a two-table fixture with a foreign key:
    /// `customers (id, name)` referenced by `orders (id, customer_id, note)`.
    pub async fn seed_linked_tables(&self) -> anyhow::Result<()> {
        self.execute("DROP TABLE IF EXISTS orders CASCADE").await?;
        self.execute("DROP TABLE IF EXISTS customers CASCADE").await?;
        self.execute(
            "CREATE TABLE customers (id INTEGER PRIMARY KEY, name TEXT NOT NULL)",
        )
        .await?;
        self.execute(
            "CREATE TABLE orders (
                id SERIAL PRIMARY KEY,
                customer_id INTEGER REFERENCES customers (id),
                note TEXT
            )",
        )
        .await?;
        self.execute("INSERT INTO customers (id, name) VALUES (1, 'Alice'), (2, 'Bob')")
            .await?;
        self.execute(
            "INSERT INTO orders (customer_id, note) \
             VALUES (1, 'first'), (1, NULL), (2, 'second')",
        )
        .await?;
        Ok(())
    }

    /// Removes the fixture tables.
    pub async fn teardown(&self) -> anyhow::Result<()> {
        self.execute("DROP TABLE IF EXISTS orders CASCADE").await?;
        self.execute("DROP TABLE IF EXISTS customers CASCADE").await?;
        Ok(())
    }
}
