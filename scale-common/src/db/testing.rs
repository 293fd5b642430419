use diesel::result::{DatabaseErrorKind, Error as DieselError};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use std::time::Duration;

use crate::db::{
    create_db_thread_pool, BindValue, BudgetLoader, DaoError, DbThreadPool, SqlExecutor,
};
use crate::messages::BudgetView;

const DB_USERNAME_VAR: &str = "SCALE_DB_USERNAME";
const DB_PASSWORD_VAR: &str = "SCALE_DB_PASSWORD";
const DB_HOSTNAME_VAR: &str = "SCALE_DB_HOSTNAME";
const DB_PORT_VAR: &str = "SCALE_DB_PORT";
const DB_NAME_VAR: &str = "SCALE_DB_NAME";

#[derive(Clone, Debug, PartialEq)]
pub struct ExecutedStatement {
    pub sql: String,
    pub binds: Vec<BindValue>,
}

#[derive(Debug, Default)]
struct Recording {
    statements: Vec<ExecutedStatement>,
    fail_at_call: Option<usize>,
    budget: BudgetView,
    loads: Vec<String>,
    fail_loads: bool,
}

/// An executor that records every statement it is asked to run instead of touching a
/// database, and answers budget loads with a fixed view. Clones share the same recording.
#[derive(Clone, Debug, Default)]
pub struct RecordingExecutor {
    recording: Arc<Mutex<Recording>>,
}

impl RecordingExecutor {
    pub fn new() -> Self {
        Self::default()
    }

    /// The call with the given zero-based index is recorded and then fails.
    pub fn failing_at_call(call: usize) -> Self {
        let executor = Self::default();
        executor.lock().fail_at_call = Some(call);
        executor
    }

    pub fn with_budget(budget: BudgetView) -> Self {
        let executor = Self::default();
        executor.lock().budget = budget;
        executor
    }

    /// Every budget load is recorded and then fails.
    pub fn failing_loads() -> Self {
        let executor = Self::default();
        executor.lock().fail_loads = true;
        executor
    }

    /// The user ids budgets were loaded for, in order.
    pub fn loads(&self) -> Vec<String> {
        self.lock().loads.clone()
    }

    pub fn statements(&self) -> Vec<ExecutedStatement> {
        self.lock().statements.clone()
    }

    pub fn call_count(&self) -> usize {
        self.lock().statements.len()
    }

    fn lock(&self) -> MutexGuard<'_, Recording> {
        self.recording
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }
}

impl SqlExecutor for RecordingExecutor {
    fn execute(&self, statement: &str, binds: &[BindValue]) -> Result<usize, DaoError> {
        let mut recording = self.lock();
        let call = recording.statements.len();

        recording.statements.push(ExecutedStatement {
            sql: String::from(statement),
            binds: binds.to_vec(),
        });

        if recording.fail_at_call == Some(call) {
            return Err(connection_lost());
        }

        Ok(0)
    }
}

impl BudgetLoader for RecordingExecutor {
    fn load_budget(&self, user_id: &str) -> Result<BudgetView, DaoError> {
        let mut recording = self.lock();
        recording.loads.push(String::from(user_id));

        if recording.fail_loads {
            return Err(connection_lost());
        }

        Ok(recording.budget.clone())
    }
}

fn connection_lost() -> DaoError {
    DaoError::QueryFailure(DieselError::DatabaseError(
        DatabaseErrorKind::UnableToSendCommand,
        Box::new(String::from("connection lost")),
    ))
}

/// Connects to the database described by the `SCALE_DB_*` environment variables.
pub fn db_thread_pool() -> DbThreadPool {
    let db_uri = format!(
        "postgres://{}:{}@{}:{}/{}",
        env_or_panic(DB_USERNAME_VAR),
        env_or_panic(DB_PASSWORD_VAR),
        env_or_panic(DB_HOSTNAME_VAR),
        env_or_panic(DB_PORT_VAR),
        env_or_panic(DB_NAME_VAR),
    );

    create_db_thread_pool(&db_uri, 4, Duration::from_secs(30))
        .expect("Failed to create DB thread pool for tests")
}

fn env_or_panic(key: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| panic!("Environment variable {key} must be set"))
}
