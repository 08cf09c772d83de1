//! Models and types related to the database.

use std::fmt::Debug;
use std::ops::DerefMut;
use std::time::Duration;

use chrono::{Local, NaiveDateTime, SubsecRound};

use diesel::connection::SimpleConnection;
use diesel::prelude::*;
use diesel::Connection as _;
use diesel::r2d2::{ConnectionManager, CustomizeConnection, Pool};

use diesel_migrations::{embed_migrations, EmbeddedMigrations, MigrationHarness};

use log::debug;

use crate::{Error, Result};

pub mod alloc;
pub mod board;
pub mod post;
pub mod seed;
pub mod user;

pub use alloc::*;
pub use board::*;
pub use post::*;
pub use seed::*;
pub use user::*;

const MIGRATIONS: EmbeddedMigrations = embed_migrations!();

/// The format every timestamp is stored and sent in.
pub const TIME_STAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// The current local time, truncated to whole seconds.
pub fn now() -> NaiveDateTime {
    Local::now().naive_local().trunc_subsecs(0)
}

/// Serde helpers for `YYYY-MM-DD HH:MM:SS` timestamps.
pub mod time_stamp {
    use chrono::NaiveDateTime;

    use serde::{de, Deserialize, Deserializer, Serializer};

    use super::TIME_STAMP_FORMAT;

    pub fn serialize<S>(
        time: &NaiveDateTime,
        se: S,
    ) -> std::result::Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        se.collect_str(&time.format(TIME_STAMP_FORMAT))
    }

    pub fn deserialize<'de, D>(de: D) -> std::result::Result<NaiveDateTime, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(de)?;
        NaiveDateTime::parse_from_str(&s, TIME_STAMP_FORMAT).map_err(de::Error::custom)
    }

    /// The same format for optional values; `None` is `null`.
    pub mod option {
        use chrono::NaiveDateTime;

        use serde::{de, Deserialize, Deserializer, Serializer};

        use super::TIME_STAMP_FORMAT;

        pub fn serialize<S>(
            time: &Option<NaiveDateTime>,
            se: S,
        ) -> std::result::Result<S::Ok, S::Error>
        where
            S: Serializer,
        {
            match time {
                Some(time) => se.collect_str(&time.format(TIME_STAMP_FORMAT)),
                None => se.serialize_none(),
            }
        }

        pub fn deserialize<'de, D>(
            de: D,
        ) -> std::result::Result<Option<NaiveDateTime>, D::Error>
        where
            D: Deserializer<'de>,
        {
            Option::<String>::deserialize(de)?
                .map(|s| {
                    NaiveDateTime::parse_from_str(&s, TIME_STAMP_FORMAT)
                        .map_err(de::Error::custom)
                })
                .transpose()
        }
    }
}

/// Anything that can hand out a SQLite connection.
pub trait InnerConnection {
    fn sqlite(&mut self) -> &mut SqliteConnection;
}

impl InnerConnection for SqliteConnection {
    fn sqlite(&mut self) -> &mut SqliteConnection {
        self
    }
}

impl InnerConnection
    for diesel::r2d2::PooledConnection<ConnectionManager<SqliteConnection>>
{
    fn sqlite(&mut self) -> &mut SqliteConnection {
        self.deref_mut()
    }
}

/// A connection to the database. Used for creating and retrieving data.
pub struct Connection<C> {
    inner: C,
}

/// A connection borrowed from the pool for the length of one request.
pub type PooledConnection =
    Connection<diesel::r2d2::PooledConnection<ConnectionManager<SqliteConnection>>>;

/// A standalone connection, used by the command line tools.
pub type SingleConnection = Connection<SqliteConnection>;

impl<C> Debug for Connection<C> {
    fn fmt(&self, fmt: &mut std::fmt::Formatter) -> std::fmt::Result {
        write!(fmt, "<#Connection>")
    }
}

impl<C> Connection<C>
where
    C: InnerConnection,
{
    /// Run `f` inside one `BEGIN IMMEDIATE` transaction.
    ///
    /// SQLite hands out the write lock when the transaction begins, so reads
    /// made inside `f` (such as identifier allocation) cannot be raced by
    /// another writer before `f`'s inserts commit. Any error rolls the whole
    /// transaction back.
    pub fn write<T, F>(&mut self, f: F) -> Result<T>
    where
        F: FnOnce(&mut SqliteConnection) -> Result<T>,
    {
        self.inner.sqlite().immediate_transaction::<_, Error, _>(f)
    }

    /// The raw connection, for queries outside a write transaction.
    pub fn raw(&mut self) -> &mut SqliteConnection {
        self.inner.sqlite()
    }
}

impl SingleConnection {
    /// Open a single connection and bring the schema up to date.
    pub fn establish<S>(url: S) -> Result<SingleConnection>
    where
        S: AsRef<str>,
    {
        let mut inner = SqliteConnection::establish(url.as_ref())?;

        ConnectionOptions::default().apply(&mut inner)?;
        run_migrations(&mut inner)?;

        Ok(Connection { inner })
    }
}

fn run_migrations(conn: &mut SqliteConnection) -> Result<()> {
    let applied = conn
        .run_pending_migrations(MIGRATIONS)
        .map_err(|e| Error::DatabaseMigrationError {
            cause: e.to_string(),
        })?;

    for version in applied {
        debug!("applied migration {}", version);
    }

    Ok(())
}

/// Pragmas applied to every connection we hand out.
#[derive(Debug, Clone, Copy)]
pub struct ConnectionOptions {
    /// How long a writer waits for the lock before giving up.
    pub busy_timeout: Duration,
}

impl Default for ConnectionOptions {
    fn default() -> ConnectionOptions {
        ConnectionOptions {
            busy_timeout: Duration::from_millis(5000),
        }
    }
}

impl ConnectionOptions {
    fn apply(&self, conn: &mut SqliteConnection) -> QueryResult<()> {
        conn.batch_execute(&format!(
            "PRAGMA busy_timeout = {}; PRAGMA foreign_keys = ON;",
            self.busy_timeout.as_millis()
        ))
    }
}

impl CustomizeConnection<SqliteConnection, diesel::r2d2::Error>
    for ConnectionOptions
{
    fn on_acquire(
        &self,
        conn: &mut SqliteConnection,
    ) -> std::result::Result<(), diesel::r2d2::Error> {
        self.apply(conn).map_err(diesel::r2d2::Error::QueryError)
    }
}

/// A pool of connections to the database. Clones share the pool.
#[derive(Clone)]
pub struct Database {
    pool: Pool<ConnectionManager<SqliteConnection>>,
}

impl Debug for Database {
    fn fmt(&self, fmt: &mut std::fmt::Formatter) -> std::fmt::Result {
        let state = self.pool.state();

        write!(
            fmt,
            "<#Database connections={} idle_connections={}>",
            state.connections, state.idle_connections,
        )?;

        Ok(())
    }
}

impl Database {
    /// Open a connection pool to the database file at `url`, creating the
    /// schema if it does not exist yet.
    pub fn open<S>(url: S, pool_size: u32, options: ConnectionOptions) -> Result<Database>
    where
        S: AsRef<str>,
    {
        let pool = Pool::builder()
            .max_size(pool_size)
            .connection_customizer(Box::new(options))
            .build(ConnectionManager::new(url.as_ref()))?;

        run_migrations(&mut *pool.get()?)?;

        Ok(Database { pool })
    }

    /// Borrow a connection from the pool. This blocks until one is free.
    pub fn get(&self) -> Result<PooledConnection> {
        Ok(Connection {
            inner: self.pool.get()?,
        })
    }
}
