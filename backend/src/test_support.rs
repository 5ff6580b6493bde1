//! Scripted engines for unit and integration tests.
//!
//! Only compiled for tests or with the `test-support` feature. Each engine
//! counts its calls so tests can assert which backend was touched.

use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use chrono::{DateTime, Local, Utc};
use mockable::Clock;
use serde_json::Value;

use crate::domain::ports::{
    RecordSets, RelationalEngine, RelationalEngineError, RemoteEngine, RemoteEngineError,
    RemoteReturn,
};
use crate::domain::{DatabaseName, NormalizedPayload, ProcedureCall};

fn lock<T>(mutex: &Mutex<T>) -> std::sync::MutexGuard<'_, T> {
    mutex
        .lock()
        .unwrap_or_else(std::sync::PoisonError::into_inner)
}

/// A call observed by a scripted engine.
#[derive(Debug, Clone, PartialEq)]
pub struct ObservedCall {
    pub database: Option<DatabaseName>,
    pub procedure: String,
    pub payload: NormalizedPayload,
}

/// Relational engine whose pools are the database names they target.
#[derive(Debug)]
pub struct ScriptedRelationalEngine {
    connect_error: Mutex<Option<RelationalEngineError>>,
    execute_result: Mutex<Result<RecordSets, RelationalEngineError>>,
    connects: AtomicUsize,
    executes: AtomicUsize,
    calls: Mutex<Vec<ObservedCall>>,
}

impl ScriptedRelationalEngine {
    /// Engine that connects and returns `sets` for every call.
    pub fn healthy(sets: Vec<Vec<Value>>) -> Self {
        Self {
            connect_error: Mutex::new(None),
            execute_result: Mutex::new(Ok(RecordSets(sets))),
            connects: AtomicUsize::new(0),
            executes: AtomicUsize::new(0),
            calls: Mutex::new(Vec::new()),
        }
    }

    /// Engine whose server cannot be reached.
    pub fn unreachable() -> Self {
        let engine = Self::healthy(Vec::new());
        engine.set_connect_error(Some(RelationalEngineError::connect(
            "could not connect to server: Connection refused",
        )));
        engine
    }

    /// Engine that connects but fails every call with `sqlstate`.
    pub fn failing(sqlstate: &str, message: &str) -> Self {
        let engine = Self::healthy(Vec::new());
        engine.set_execute_result(Err(RelationalEngineError::database(
            Some(sqlstate.to_owned()),
            message,
        )));
        engine
    }

    pub fn set_connect_error(&self, error: Option<RelationalEngineError>) {
        *lock(&self.connect_error) = error;
    }

    pub fn set_execute_result(&self, result: Result<RecordSets, RelationalEngineError>) {
        *lock(&self.execute_result) = result;
    }

    /// Number of pool creation attempts.
    pub fn connect_count(&self) -> usize {
        self.connects.load(Ordering::SeqCst)
    }

    /// Number of procedure executions attempted on a pool.
    pub fn execute_count(&self) -> usize {
        self.executes.load(Ordering::SeqCst)
    }

    pub fn calls(&self) -> Vec<ObservedCall> {
        lock(&self.calls).clone()
    }
}

#[async_trait]
impl RelationalEngine for ScriptedRelationalEngine {
    type Pool = DatabaseName;

    async fn connect(&self, database: &DatabaseName) -> Result<DatabaseName, RelationalEngineError> {
        self.connects.fetch_add(1, Ordering::SeqCst);
        match lock(&self.connect_error).clone() {
            Some(error) => Err(error),
            None => Ok(database.clone()),
        }
    }

    async fn execute(
        &self,
        pool: &DatabaseName,
        call: &ProcedureCall<'_>,
    ) -> Result<RecordSets, RelationalEngineError> {
        self.executes.fetch_add(1, Ordering::SeqCst);
        lock(&self.calls).push(ObservedCall {
            database: Some(pool.clone()),
            procedure: call.procedure.to_string(),
            payload: call.payload.clone(),
        });
        lock(&self.execute_result).clone()
    }
}

/// Remote engine replaying a fixed reply.
#[derive(Debug)]
pub struct ScriptedRemoteEngine {
    enabled: bool,
    result: Mutex<Result<RemoteReturn, RemoteEngineError>>,
    invocations: AtomicUsize,
    calls: Mutex<Vec<ObservedCall>>,
}

impl ScriptedRemoteEngine {
    /// Engine answering every call with `reply`.
    pub fn healthy(reply: RemoteReturn) -> Self {
        Self {
            enabled: true,
            result: Mutex::new(Ok(reply)),
            invocations: AtomicUsize::new(0),
            calls: Mutex::new(Vec::new()),
        }
    }

    /// Engine failing every call with `error`.
    pub fn failing(error: RemoteEngineError) -> Self {
        let engine = Self::healthy(RemoteReturn::Raw(Value::Null));
        engine.set_result(Err(error));
        engine
    }

    /// Engine reporting itself as not configured.
    pub fn disabled() -> Self {
        Self {
            enabled: false,
            ..Self::failing(RemoteEngineError::not_configured())
        }
    }

    pub fn set_result(&self, result: Result<RemoteReturn, RemoteEngineError>) {
        *lock(&self.result) = result;
    }

    pub fn call_count(&self) -> usize {
        self.invocations.load(Ordering::SeqCst)
    }

    pub fn calls(&self) -> Vec<ObservedCall> {
        lock(&self.calls).clone()
    }
}

#[async_trait]
impl RemoteEngine for ScriptedRemoteEngine {
    fn is_enabled(&self) -> bool {
        self.enabled
    }

    async fn call(&self, call: &ProcedureCall<'_>) -> Result<RemoteReturn, RemoteEngineError> {
        self.invocations.fetch_add(1, Ordering::SeqCst);
        lock(&self.calls).push(ObservedCall {
            database: None,
            procedure: call.procedure.to_string(),
            payload: call.payload.clone(),
        });
        lock(&self.result).clone()
    }
}

/// Clock frozen at one instant, for deterministic envelope timestamps.
#[derive(Debug, Clone, Copy)]
pub struct FixedClock(pub DateTime<Utc>);

impl FixedClock {
    /// 2026-01-01T00:00:00Z.
    pub fn new_year() -> Self {
        Self(DateTime::<Utc>::from_timestamp(1_767_225_600, 0).unwrap_or_default())
    }
}

impl Clock for FixedClock {
    fn local(&self) -> DateTime<Local> {
        self.0.with_timezone(&Local)
    }

    fn utc(&self) -> DateTime<Utc> {
        self.0
    }
}
