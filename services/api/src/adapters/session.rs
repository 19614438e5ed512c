//! services/api/src/adapters/session.rs
//!
//! Owns the single MongoDB connection used by the whole process.
//!
//! The connection is opened lazily on the first `connect()` and memoized.
//! Callers that arrive while an attempt is running share its outcome; a failed
//! attempt is not cached, so the next caller after it starts a fresh one.
//! `close()` is called by the entry point once the server has drained.

use crate::config::Config;
use futures::future::{BoxFuture, FutureExt, Shared, TryFutureExt};
use mongodb::{
    bson::doc,
    options::{ClientOptions, ServerApi, ServerApiVersion},
    Client, Database, IndexModel,
};
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{Mutex, OnceCell};
use tracing::info;

pub const LESSONS_COLLECTION: &str = "lessons";
pub const ORDERS_COLLECTION: &str = "order";

//=========================================================================================
// Memoized Handle
//=========================================================================================

type Attempt<T, E> = Shared<BoxFuture<'static, Result<Arc<T>, E>>>;

/// A value initialized at most once, even under concurrent first access.
///
/// Concurrent callers join the in-flight initialization instead of queueing
/// behind it, so they all see the same success or the same error.
pub struct SharedHandle<T, E> {
    cell: OnceCell<Arc<T>>,
    in_flight: Mutex<Option<Attempt<T, E>>>,
}

impl<T, E> SharedHandle<T, E>
where
    T: Send + Sync + 'static,
    E: Clone + Send + Sync + 'static,
{
    pub fn new() -> Self {
        Self {
            cell: OnceCell::new(),
            in_flight: Mutex::new(None),
        }
    }

    pub async fn get_or_try_init<F, Fut>(&self, init: F) -> Result<Arc<T>, E>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T, E>> + Send + 'static,
    {
        if let Some(value) = self.cell.get() {
            return Ok(Arc::clone(value));
        }

        let attempt = {
            let mut in_flight = self.in_flight.lock().await;
            if let Some(value) = self.cell.get() {
                return Ok(Arc::clone(value));
            }
            match in_flight.as_ref() {
                Some(attempt) => attempt.clone(),
                None => {
                    let attempt = init().map_ok(Arc::new).boxed().shared();
                    *in_flight = Some(attempt.clone());
                    attempt
                }
            }
        };

        let result = attempt.clone().await;

        let mut in_flight = self.in_flight.lock().await;
        if let Ok(value) = &result {
            // Already set when another waiter of this attempt got here first.
            let _ = self.cell.set(Arc::clone(value));
        }
        if in_flight.as_ref().is_some_and(|current| current.ptr_eq(&attempt)) {
            *in_flight = None;
        }
        result
    }

    pub fn get(&self) -> Option<Arc<T>> {
        self.cell.get().cloned()
    }
}

impl<T, E> Default for SharedHandle<T, E>
where
    T: Send + Sync + 'static,
    E: Clone + Send + Sync + 'static,
{
    fn default() -> Self {
        Self::new()
    }
}

//=========================================================================================
// Database Session
//=========================================================================================

/// Connection settings taken from [`Config`].
#[derive(Clone, Debug)]
pub struct SessionSettings {
    pub url: String,
    pub database_name: String,
    pub max_pool_size: u32,
    pub min_pool_size: u32,
    pub connect_timeout: Duration,
    pub server_selection_timeout: Duration,
}

impl From<&Config> for SessionSettings {
    fn from(config: &Config) -> Self {
        Self {
            url: config.database_url.clone(),
            database_name: config.database_name.clone(),
            max_pool_size: config.db_max_pool_size,
            min_pool_size: config.db_min_pool_size,
            connect_timeout: config.db_connect_timeout,
            server_selection_timeout: config.db_server_selection_timeout,
        }
    }
}

/// A live connection: the client (for shutdown) and the selected database.
#[derive(Debug)]
pub struct DatabaseHandle {
    client: Client,
    db: Database,
}

impl DatabaseHandle {
    pub fn db(&self) -> &Database {
        &self.db
    }
}

pub struct DatabaseSession {
    settings: SessionSettings,
    handle: SharedHandle<DatabaseHandle, mongodb::error::Error>,
}

impl DatabaseSession {
    pub fn new(settings: SessionSettings) -> Self {
        Self {
            settings,
            handle: SharedHandle::new(),
        }
    }

    /// Returns the shared handle, connecting first if nobody has yet.
    pub async fn connect(&self) -> mongodb::error::Result<Arc<DatabaseHandle>> {
        let settings = self.settings.clone();
        self.handle
            .get_or_try_init(move || async move { open(&settings).await })
            .await
    }

    pub fn is_connected(&self) -> bool {
        self.handle.get().is_some()
    }

    /// Closes the connection pool if one was ever opened.
    pub async fn close(&self) {
        if let Some(handle) = self.handle.get() {
            info!("Closing database connection...");
            handle.client.clone().shutdown().await;
            info!("Database connection closed.");
        }
    }
}

async fn open(settings: &SessionSettings) -> mongodb::error::Result<DatabaseHandle> {
    info!("Connecting to database '{}'...", settings.database_name);
    let mut options = ClientOptions::parse(&settings.url).await?;
    options.server_api = Some(ServerApi::builder().version(ServerApiVersion::V1).build());
    options.max_pool_size = Some(settings.max_pool_size);
    options.min_pool_size = Some(settings.min_pool_size);
    options.connect_timeout = Some(settings.connect_timeout);
    options.server_selection_timeout = Some(settings.server_selection_timeout);

    let client = Client::with_options(options)?;
    let db = client.database(&settings.database_name);
    db.run_command(doc! { "ping": 1 }).await?;
    info!("Database connected.");

    // Re-declaring an identical index is a no-op on the server.
    let text_index = IndexModel::builder()
        .keys(doc! { "subject": "text", "location": "text" })
        .build();
    db.collection::<mongodb::bson::Document>(LESSONS_COLLECTION)
        .create_index(text_index)
        .await?;
    info!("Text index on '{}' is in place.", LESSONS_COLLECTION);

    Ok(DatabaseHandle { client, db })
}
