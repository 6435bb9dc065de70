//! The database session a grading run works against.
//!
//! One connection per run. It is opened before the dump is imported, handed
//! to every check, and closed after the schema has been dropped.

use camino::Utf8Path;
use spotcheck_config::DatabaseConfig;
use tokio::task::JoinHandle;
use tokio_postgres::{Client, NoTls};

use crate::catalog::Verifier;
use crate::sql::quote_ident;
use crate::traced::ConnectionExt;
use crate::{Error, Result};

pub struct Database {
    client: Client,
    schema: String,
    connection: JoinHandle<()>,
}

impl Database {
    /// Connect using `config`. Does not touch the schema yet.
    pub async fn connect(config: &DatabaseConfig) -> Result<Self> {
        let mut pg = tokio_postgres::Config::new();
        pg.user(config.user())
            .host(config.host())
            .port(config.port())
            .dbname(config.dbname());
        if let Some(password) = config.password() {
            pg.password(password);
        }

        tracing::debug!(
            host = config.host(),
            port = config.port(),
            dbname = config.dbname(),
            "connecting"
        );
        let (client, connection) = pg.connect(NoTls).await?;

        let connection = tokio::spawn(async move {
            if let Err(e) = connection.await {
                tracing::error!("database connection error: {e}");
            }
        });

        Ok(Self {
            client,
            schema: config.schema().to_string(),
            connection,
        })
    }

    /// Name of the schema the submission lives in.
    pub fn schema(&self) -> &str {
        &self.schema
    }

    pub fn verifier(&self) -> Verifier<'_, Client> {
        Verifier::new(&self.client, &self.schema)
    }

    /// Drop and recreate the schema, then make it the default for this
    /// session.
    pub async fn reset_schema(&self) -> Result<()> {
        let schema = quote_ident(&self.schema);
        tracing::info!(schema = %self.schema, "recreating schema");
        self.client
            .traced()
            .batch_execute(&format!(
                "DROP SCHEMA IF EXISTS {schema} CASCADE; CREATE SCHEMA {schema};"
            ))
            .await?;
        self.client
            .traced()
            .execute(&format!("SET search_path TO {schema}"), &[])
            .await?;
        Ok(())
    }

    /// Load a SQL dump into the schema.
    ///
    /// A failed dump is rolled back, so the session can still tear down.
    pub async fn import(&self, path: &Utf8Path) -> Result<()> {
        let sql = std::fs::read_to_string(path).map_err(|e| Error::io(path, e))?;
        tracing::info!(%path, bytes = sql.len(), "importing dump");
        self.client.traced().batch_execute_or_rollback(&sql).await?;
        Ok(())
    }

    /// Drop the schema and close the connection.
    ///
    /// A transaction a script left open is rolled back first, otherwise the
    /// drop would be discarded along with it when the connection closes.
    pub async fn teardown(self) -> Result<()> {
        let schema = quote_ident(&self.schema);
        tracing::info!(schema = %self.schema, "dropping schema");
        let conn = self.client.traced();
        conn.rollback().await;
        let dropped = conn
            .batch_execute(&format!("DROP SCHEMA IF EXISTS {schema} CASCADE;"))
            .await;

        drop(self.client);
        if let Err(e) = self.connection.await {
            tracing::warn!("connection task failed: {e}");
        }

        dropped.map_err(Error::from)
    }
}
