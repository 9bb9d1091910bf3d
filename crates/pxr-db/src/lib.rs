//! pxr-db
//!
//! MySQL-protocol [`AdminChannel`] for the ProxySQL admin interface.
//!
//! The admin interface does not implement server-side prepared statements, so
//! every statement travels over the text protocol with its values rendered
//! inline by [`render_literal`]. The pool holds a single connection; statements
//! therefore reach the server in the order they were issued.

use anyhow::{anyhow, Context, Result};
use async_trait::async_trait;
use pxr_config::AdminTarget;
use pxr_reconcile::{AdminChannel, ChannelError, Statement};
use pxr_schemas::StoredRecord;
use sqlx::mysql::{MySqlConnectOptions, MySqlPool, MySqlPoolOptions, MySqlRow};
use sqlx::{Column, ConnectOptions, Connection, Executor, Row};
use tokio::time::timeout;
use tracing::{debug, info, warn};

mod literal;

pub use literal::render_literal;

/// `host:port` of a disposable admin interface for the ignored live tests.
pub const ENV_TEST_ADMIN_ADDR: &str = "PXR_TEST_ADMIN_ADDR";

/// Open a connection to the admin interface described by `target`.
///
/// One direct connection is made first, bounded by `connect_timeout`, so a
/// refused or rejected login fails at once with the server's own error text.
/// The pool behind the returned handle then connects lazily.
pub async fn connect(target: &AdminTarget) -> Result<AdminConnection> {
    let mut opts = MySqlConnectOptions::new()
        .host(&target.host)
        .port(target.port);
    if let Some(sock) = &target.unix_socket {
        opts = opts.socket(sock);
    }
    if let Some(user) = &target.user {
        opts = opts.username(user);
    }
    if let Some(password) = &target.password {
        opts = opts.password(password);
    }

    let first = match timeout(target.connect_timeout, opts.connect()).await {
        Ok(res) => res.map_err(anyhow::Error::from),
        Err(_) => Err(anyhow!(
            "no response within {} ms",
            target.connect_timeout.as_millis()
        )),
    }
    .with_context(|| {
        format!(
            "unable to connect to ProxySQL admin interface at {}",
            target.address()
        )
    })?;
    if let Err(e) = first.close().await {
        warn!(error = %e, "closing the initial admin connection failed");
    }

    let pool = MySqlPoolOptions::new()
        .max_connections(1)
        .acquire_timeout(target.connect_timeout)
        .connect_lazy_with(opts);

    info!(address = %target.address(), "connected to admin interface");
    Ok(AdminConnection { pool })
}

/// Live admin session.
#[derive(Clone, Debug)]
pub struct AdminConnection {
    pool: MySqlPool,
}

impl AdminConnection {
    pub async fn close(self) {
        self.pool.close().await;
    }
}

#[async_trait]
impl AdminChannel for AdminConnection {
    async fn query(&self, stmt: &Statement) -> Result<Vec<StoredRecord>, ChannelError> {
        // Log the placeholder form; rendered text may carry a password.
        debug!(sql = %stmt, "admin query");
        let sql = render_literal(stmt);
        let rows = self
            .pool
            .fetch_all(sql.as_str())
            .await
            .map_err(channel_error)?;
        rows.iter().map(decode_row).collect()
    }

    async fn execute(&self, stmt: &Statement) -> Result<u64, ChannelError> {
        debug!(sql = %stmt, "admin execute");
        let sql = render_literal(stmt);
        let done = self
            .pool
            .execute(sql.as_str())
            .await
            .map_err(channel_error)?;
        Ok(done.rows_affected())
    }
}

/// The admin interface returns every cell as text.
fn decode_row(row: &MySqlRow) -> Result<StoredRecord, ChannelError> {
    let mut out = StoredRecord::new();
    for (idx, column) in row.columns().iter().enumerate() {
        let cell: Option<String> = row.try_get_unchecked(idx).map_err(|e| {
            ChannelError::Transport(format!("decode column '{}': {e}", column.name()))
        })?;
        out.insert(column.name().to_string(), cell);
    }
    Ok(out)
}

fn channel_error(err: sqlx::Error) -> ChannelError {
    match err {
        sqlx::Error::Database(db) => ChannelError::Rejected(db.message().to_string()),
        other => ChannelError::Transport(other.to_string()),
    }
}
