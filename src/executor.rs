use crate::error::EngineError;
use crate::pool::{Database, PooledConnection};
use tracing::{debug, warn};

/// Sends generated command text to the engine.
///
/// GRANT/REVOKE/CREATE/ALTER/DROP commit implicitly in the engine. The
/// rollback issued after a failed command therefore cannot undo an earlier
/// administrative command; it only clears DML left pending on the
/// connection. Commands are never retried.
#[derive(Clone)]
pub struct CommandExecutor {
    db: Database,
}

impl CommandExecutor {
    pub fn new(db: Database) -> Self {
        Self { db }
    }

    /// Runs one command on a freshly checked-out connection.
    pub async fn execute(&self, command: &str) -> Result<(), EngineError> {
        let mut conn = self.db.connection().await?;
        self.execute_on(&mut conn, command).await
    }

    /// Runs one command on a connection the caller already holds, so that
    /// catalog pre-checks and the command share a single checkout. Commits on
    /// success and rolls back on failure.
    pub async fn execute_on(
        &self,
        conn: &mut PooledConnection,
        command: &str,
    ) -> Result<(), EngineError> {
        let statement = statement_kind(command);
        debug!(statement, "dispatching administrative command");
        if let Err(err) = conn.execute(command).await {
            if let Err(rollback_err) = self.rollback(conn).await {
                warn!(statement, error = %rollback_err, "rollback after failed command also failed");
            }
            return Err(err);
        }
        self.commit(conn).await
    }

    pub async fn commit(&self, conn: &mut PooledConnection) -> Result<(), EngineError> {
        conn.commit().await
    }

    /// Discards uncommitted DML on `conn`. Never undoes administrative DDL.
    pub async fn rollback(&self, conn: &mut PooledConnection) -> Result<(), EngineError> {
        conn.rollback().await
    }
}

/// Leading keywords of a command, safe to log (never includes operands such
/// as role passwords).
fn statement_kind(command: &str) -> &str {
    let words = match command.split(' ').next() {
        Some("CREATE" | "ALTER" | "DROP") => 2,
        _ => 1,
    };
    command
        .match_indices(' ')
        .nth(words - 1)
        .map_or(command, |(end, _)| &command[..end])
}
