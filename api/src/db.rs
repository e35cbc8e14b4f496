//! Database connection module for `ClickHouse`.
//!
//! This module provides the shared client the count sources use. It supports
//! creating client instances from environment variables and hands out one
//! [`ClickHouseCountSource`] per monitored collection.

use anyhow::{Context, Result};
use clickhouse::Client;
use shared::source::ClickHouseCountSource;
use std::sync::Arc;

/// Database configuration loaded from environment variables.
#[derive(Debug, Clone)]
pub struct DatabaseConfig {
    /// `ClickHouse` database URL (e.g., <http://localhost:8123>)
    pub url: String,
    /// Database name to use
    pub database: String,
    /// Username for authentication
    pub user: String,
    /// Password for authentication
    pub password: String,
}

impl DatabaseConfig {
    /// Load database configuration from environment variables.
    ///
    /// # Environment Variables
    ///
    /// - `TALLYVANE_DB_URL`: Database URL (default: <http://localhost:8123>)
    /// - `TALLYVANE_DB_NAME`: Database name (default: "tallyvane")
    /// - `TALLYVANE_DB_USER`: Database user (default: "tallyvane")
    /// - `TALLYVANE_DB_PASSWORD`: Database password (default: "`tallyvane_dev`")
    ///
    /// # Errors
    ///
    /// Returns an error if required environment variables cannot be read.
    pub fn from_env() -> Result<Self> {
        Ok(Self {
            url: std::env::var("TALLYVANE_DB_URL")
                .unwrap_or_else(|_| "http://localhost:8123".to_string()),
            database: std::env::var("TALLYVANE_DB_NAME")
                .unwrap_or_else(|_| "tallyvane".to_string()),
            user: std::env::var("TALLYVANE_DB_USER").unwrap_or_else(|_| "tallyvane".to_string()),
            password: std::env::var("TALLYVANE_DB_PASSWORD")
                .unwrap_or_else(|_| "tallyvane_dev".to_string()),
        })
    }
}

/// Database client wrapper shared by every count source.
#[derive(Clone)]
pub struct Database {
    client: Arc<Client>,
}

impl Database {
    /// Create a new database client from configuration.
    ///
    /// # Arguments
    ///
    /// * `config` - Database configuration
    ///
    /// # Returns
    ///
    /// A new Database instance with configured client.
    ///
    /// # Examples
    ///
    /// ```
    /// # use api::db::{Database, DatabaseConfig};
    /// # fn example() -> anyhow::Result<()> {
    /// let config = DatabaseConfig::from_env()?;
    /// let db = Database::new(&config);
    /// let source = db.collection_source("items");
    /// # Ok(())
    /// # }
    /// ```
    #[must_use]
    pub fn new(config: &DatabaseConfig) -> Self {
        let client = Client::default()
            .with_url(&config.url)
            .with_database(&config.database)
            .with_user(&config.user)
            .with_password(&config.password);

        Self {
            client: Arc::new(client),
        }
    }

    /// Get a reference to the underlying `ClickHouse` client.
    ///
    /// # Returns
    ///
    /// An Arc-wrapped `ClickHouse` client.
    #[must_use]
    pub fn client(&self) -> Arc<Client> {
        Arc::clone(&self.client)
    }

    /// Build a count source reading the row count of one collection.
    ///
    /// The source shares this database's client; dropping the `Database`
    /// keeps existing sources working.
    #[must_use]
    pub fn collection_source(&self, collection: &str) -> ClickHouseCountSource {
        ClickHouseCountSource::new(Arc::clone(&self.client), collection)
    }

    /// Test database connectivity by executing a simple query.
    ///
    /// # Returns
    ///
    /// Ok(()) if the connection is successful, or an error describing the failure.
    ///
    /// # Errors
    ///
    /// Returns an error if the database cannot be reached or the query fails.
    pub async fn ping(&self) -> Result<()> {
        self.client
            .query("SELECT 1")
            .fetch_one::<u8>()
            .await
            .context("Failed to ping database")?;
        Ok(())
    }
}
