use crate::error::EngineError;
use crate::row::{Bind, Row};
use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;

/// One engine connection, supplied by the embedding application's driver
/// adapter.
#[async_trait]
pub trait Connection: Send {
    /// Executes one administrative or DML command.
    async fn execute(&mut self, command: &str) -> Result<(), EngineError>;

    /// Runs a read-only catalog query with named binds.
    async fn query(&mut self, sql: &str, binds: &[Bind]) -> Result<Vec<Row>, EngineError>;

    async fn commit(&mut self) -> Result<(), EngineError>;

    async fn rollback(&mut self) -> Result<(), EngineError>;
}

#[async_trait]
pub trait ConnectionPool: Send + Sync {
    /// Fails with [`crate::error::EngineErrorKind::Connectivity`] on
    /// exhaustion or misconfiguration.
    async fn acquire(&self) -> Result<Box<dyn Connection>, EngineError>;

    fn release(&self, conn: Box<dyn Connection>);
}

/// Shared handle to the pool with the acquire deadline applied. Each logical
/// operation takes exactly one connection from here.
#[derive(Clone)]
pub struct Database {
    pool: Arc<dyn ConnectionPool>,
    acquire_timeout: Duration,
}

impl Database {
    pub fn new(pool: Arc<dyn ConnectionPool>, acquire_timeout: Duration) -> Self {
        Self {
            pool,
            acquire_timeout,
        }
    }

    pub async fn connection(&self) -> Result<PooledConnection, EngineError> {
        match tokio::time::timeout(self.acquire_timeout, self.pool.acquire()).await {
            Ok(Ok(conn)) => Ok(PooledConnection {
                pool: Arc::clone(&self.pool),
                conn: Some(conn),
            }),
            Ok(Err(err)) => Err(err),
            Err(_) => Err(EngineError::connectivity(format!(
                "timed out after {}ms waiting for a pooled connection",
                self.acquire_timeout.as_millis()
            ))),
        }
    }
}

/// A connection checked out of the pool. Released on drop, which covers early
/// returns, errors and cancellation of the surrounding future.
///
/// Administrative DDL commits implicitly inside the engine, so `rollback`
/// only discards uncommitted DML issued on this connection. It never undoes
/// a GRANT, REVOKE, CREATE, ALTER or DROP that already executed.
pub struct PooledConnection {
    pool: Arc<dyn ConnectionPool>,
    conn: Option<Box<dyn Connection>>,
}

impl PooledConnection {
    fn inner(&mut self) -> Result<&mut Box<dyn Connection>, EngineError> {
        self.conn
            .as_mut()
            .ok_or_else(|| EngineError::connectivity("connection already released"))
    }

    pub async fn execute(&mut self, command: &str) -> Result<(), EngineError> {
        self.inner()?.execute(command).await
    }

    pub async fn query(&mut self, sql: &str, binds: &[Bind]) -> Result<Vec<Row>, EngineError> {
        self.inner()?.query(sql, binds).await
    }

    pub async fn commit(&mut self) -> Result<(), EngineError> {
        self.inner()?.commit().await
    }

    pub async fn rollback(&mut self) -> Result<(), EngineError> {
        self.inner()?.rollback().await
    }
}

impl Drop for PooledConnection {
    fn drop(&mut self) {
        if let Some(conn) = self.conn.take() {
            self.pool.release(conn);
        }
    }
}
