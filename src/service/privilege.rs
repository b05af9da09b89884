use crate::command::{
    ColumnList, ColumnPrivilege, GrantAction, ObjectPrivilege, ObjectRef, PrivilegeClass,
    PrivilegeCommand,
};
use crate::error::AdminError;
use crate::executor::CommandExecutor;
use crate::validate::{Identifier, SystemPrivilege};
use tracing::{info, warn};

/// System privileges offered first in grant forms.
pub const COMMON_SYSTEM_PRIVILEGES: &[&str] = &[
    "CREATE SESSION",
    "CREATE TABLE",
    "CREATE VIEW",
    "CREATE PROCEDURE",
    "CREATE SEQUENCE",
    "CREATE TRIGGER",
    "CREATE TYPE",
    "CREATE SYNONYM",
    "CREATE PUBLIC SYNONYM",
    "DROP ANY TABLE",
    "SELECT ANY TABLE",
    "INSERT ANY TABLE",
    "UPDATE ANY TABLE",
    "DELETE ANY TABLE",
    "ALTER ANY TABLE",
    "CREATE USER",
    "ALTER USER",
    "DROP USER",
    "CREATE ROLE",
    "DROP ANY ROLE",
    "GRANT ANY ROLE",
    "CREATE PROFILE",
    "ALTER PROFILE",
    "DROP PROFILE",
    "UNLIMITED TABLESPACE",
];

/// Grant/revoke orchestration for system, role, object and column
/// privileges.
///
/// Each operation validates its operands before any I/O, renders exactly one
/// command and executes it. Re-granting a held privilege succeeds; revoking
/// an unheld one surfaces the engine's error as [`AdminError::RevokeFailed`].
#[derive(Clone)]
pub struct PrivilegeService {
    executor: CommandExecutor,
}

impl PrivilegeService {
    pub fn new(executor: CommandExecutor) -> Self {
        Self { executor }
    }

    pub fn common_system_privileges(&self) -> &'static [&'static str] {
        COMMON_SYSTEM_PRIVILEGES
    }

    pub async fn grant_system_privilege(
        &self,
        privilege: &str,
        grantee: &str,
        with_admin: bool,
    ) -> Result<(), AdminError> {
        let grantee = Identifier::parse("grantee", grantee)?;
        let privilege = SystemPrivilege::parse(privilege)?;
        self.apply(PrivilegeCommand::System {
            action: GrantAction::Grant,
            privilege,
            grantee,
            with_admin,
        })
        .await
    }

    pub async fn revoke_system_privilege(
        &self,
        privilege: &str,
        grantee: &str,
    ) -> Result<(), AdminError> {
        let grantee = Identifier::parse("grantee", grantee)?;
        let privilege = SystemPrivilege::parse(privilege)?;
        self.apply(PrivilegeCommand::System {
            action: GrantAction::Revoke,
            privilege,
            grantee,
            with_admin: false,
        })
        .await
    }

    pub async fn grant_role(
        &self,
        role: &str,
        grantee: &str,
        with_admin: bool,
    ) -> Result<(), AdminError> {
        let grantee = Identifier::parse("grantee", grantee)?;
        let role = parse_role(role)?;
        self.apply(PrivilegeCommand::Role {
            action: GrantAction::Grant,
            role,
            grantee,
            with_admin,
        })
        .await
    }

    pub async fn revoke_role(&self, role: &str, grantee: &str) -> Result<(), AdminError> {
        let grantee = Identifier::parse("grantee", grantee)?;
        let role = parse_role(role)?;
        self.apply(PrivilegeCommand::Role {
            action: GrantAction::Revoke,
            role,
            grantee,
            with_admin: false,
        })
        .await
    }

    pub async fn grant_object_privilege(
        &self,
        privilege: &str,
        owner: &str,
        table_name: &str,
        grantee: &str,
        with_grant_option: bool,
    ) -> Result<(), AdminError> {
        let grantee = Identifier::parse("grantee", grantee)?;
        let privilege = ObjectPrivilege::parse(privilege)?;
        let object = parse_object(owner, table_name)?;
        self.apply(PrivilegeCommand::Object {
            action: GrantAction::Grant,
            privilege,
            object,
            grantee,
            with_grant_option,
        })
        .await
    }

    pub async fn revoke_object_privilege(
        &self,
        privilege: &str,
        owner: &str,
        table_name: &str,
        grantee: &str,
    ) -> Result<(), AdminError> {
        let grantee = Identifier::parse("grantee", grantee)?;
        let privilege = ObjectPrivilege::parse(privilege)?;
        let object = parse_object(owner, table_name)?;
        self.apply(PrivilegeCommand::Object {
            action: GrantAction::Revoke,
            privilege,
            object,
            grantee,
            with_grant_option: false,
        })
        .await
    }

    pub async fn grant_column_privilege<S: AsRef<str>>(
        &self,
        privilege: &str,
        owner: &str,
        table_name: &str,
        columns: &[S],
        grantee: &str,
    ) -> Result<(), AdminError> {
        let grantee = Identifier::parse("grantee", grantee)?;
        let privilege = ColumnPrivilege::parse(privilege)?;
        let object = parse_object(owner, table_name)?;
        let columns = parse_columns(columns)?;
        self.apply(PrivilegeCommand::Column {
            action: GrantAction::Grant,
            privilege,
            object,
            columns,
            grantee,
        })
        .await
    }

    pub async fn revoke_column_privilege<S: AsRef<str>>(
        &self,
        privilege: &str,
        owner: &str,
        table_name: &str,
        columns: &[S],
        grantee: &str,
    ) -> Result<(), AdminError> {
        let grantee = Identifier::parse("grantee", grantee)?;
        let privilege = ColumnPrivilege::parse(privilege)?;
        let object = parse_object(owner, table_name)?;
        let columns = parse_columns(columns)?;
        self.apply(PrivilegeCommand::Column {
            action: GrantAction::Revoke,
            privilege,
            object,
            columns,
            grantee,
        })
        .await
    }

    async fn apply(&self, command: PrivilegeCommand) -> Result<(), AdminError> {
        let class = command.class();
        let action = command.action();
        let grantee = command.grantee().as_str();
        match self.executor.execute(&command.to_sql()).await {
            Ok(()) => {
                info!(%class, %action, grantee, "privilege command applied");
                Ok(())
            }
            Err(err) => {
                warn!(%class, %action, grantee, error = %err, "privilege command failed");
                Err(match action {
                    GrantAction::Grant => AdminError::grant_failed(err),
                    GrantAction::Revoke => AdminError::revoke_failed(err),
                })
            }
        }
    }
}

fn parse_role(role: &str) -> Result<Identifier, AdminError> {
    if role.is_empty() {
        return Err(AdminError::MissingOperand("role"));
    }
    Identifier::parse("role", role).map_err(|_| AdminError::InvalidPrivilege {
        class: PrivilegeClass::Role,
        privilege: role.to_string(),
        allowed: "a role name".to_string(),
    })
}

fn parse_object(owner: &str, table_name: &str) -> Result<ObjectRef, AdminError> {
    if owner.is_empty() {
        return Err(AdminError::MissingOperand("owner"));
    }
    if table_name.is_empty() {
        return Err(AdminError::MissingOperand("table_name"));
    }
    Ok(ObjectRef {
        owner: Identifier::parse("owner", owner)?,
        table: Identifier::parse("table_name", table_name)?,
    })
}

fn parse_columns<S: AsRef<str>>(columns: &[S]) -> Result<ColumnList, AdminError> {
    let columns = columns
        .iter()
        .map(|c| Identifier::parse("column", c.as_ref()))
        .collect::<Result<Vec<_>, _>>()?;
    ColumnList::new(columns)
}
