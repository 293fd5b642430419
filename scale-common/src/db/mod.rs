use diesel::pg::{Pg, PgConnection};
use diesel::r2d2::{ConnectionManager, PooledConnection};
use diesel::sql_types::{Double, Text};
use diesel::RunQueryDsl;
use std::fmt;
use std::time::Duration;

use crate::messages::BudgetView;

pub mod budget;
pub mod upsert;

#[cfg(any(test, feature = "testing"))]
pub mod testing;

pub type DbThreadPool = diesel::r2d2::Pool<ConnectionManager<PgConnection>>;
pub type DbConnection = PooledConnection<ConnectionManager<PgConnection>>;

pub fn create_db_thread_pool(
    database_uri: &str,
    max_db_connections: u32,
    idle_timeout: Duration,
) -> Result<DbThreadPool, DaoError> {
    Ok(r2d2::Pool::builder()
        .max_size(max_db_connections)
        .idle_timeout(Some(idle_timeout))
        .build(ConnectionManager::<PgConnection>::new(database_uri))?)
}

#[derive(Debug)]
pub enum DaoError {
    DbThreadPoolFailure(r2d2::Error),
    QueryFailure(diesel::result::Error),
}

impl std::error::Error for DaoError {}

impl fmt::Display for DaoError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DaoError::DbThreadPoolFailure(e) => {
                write!(f, "DaoError: Failed to obtain DB connection: {e}")
            }
            DaoError::QueryFailure(e) => {
                write!(f, "DaoError: Query failed: {e}")
            }
        }
    }
}

impl From<r2d2::Error> for DaoError {
    fn from(error: r2d2::Error) -> Self {
        DaoError::DbThreadPoolFailure(error)
    }
}

impl From<diesel::result::Error> for DaoError {
    fn from(error: diesel::result::Error) -> Self {
        DaoError::QueryFailure(error)
    }
}

/// A positional statement parameter.
#[derive(Clone, Debug, PartialEq)]
pub enum BindValue {
    Text(String),
    Double(f64),
}

/// Runs a parameterized statement. Placeholders are numbered (`$1`, `$2`, ...) and are
/// bound from `binds` in order.
pub trait SqlExecutor: Send + Sync + 'static {
    fn execute(&self, statement: &str, binds: &[BindValue]) -> Result<usize, DaoError>;
}

/// Reads back everything stored for one user.
pub trait BudgetLoader: Send + Sync + 'static {
    fn load_budget(&self, user_id: &str) -> Result<BudgetView, DaoError>;
}

impl SqlExecutor for DbThreadPool {
    fn execute(&self, statement: &str, binds: &[BindValue]) -> Result<usize, DaoError> {
        let mut query = diesel::sql_query(statement).into_boxed::<Pg>();

        for bind in binds {
            query = match bind {
                BindValue::Text(v) => query.bind::<Text, _>(v.clone()),
                BindValue::Double(v) => query.bind::<Double, _>(*v),
            };
        }

        Ok(query.execute(&mut self.get()?)?)
    }
}
