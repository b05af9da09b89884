use crate::error::AdminError;
use crate::validate::{Identifier, Password, Quota, ResourceLimit, SystemPrivilege};
use serde::Serialize;
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum PrivilegeClass {
    System,
    Role,
    Object,
    Column,
}

impl PrivilegeClass {
    pub fn as_str(self) -> &'static str {
        match self {
            PrivilegeClass::System => "SYSTEM",
            PrivilegeClass::Role => "ROLE",
            PrivilegeClass::Object => "OBJECT",
            PrivilegeClass::Column => "COLUMN",
        }
    }
}

impl fmt::Display for PrivilegeClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GrantAction {
    Grant,
    Revoke,
}

impl GrantAction {
    fn keyword(self) -> &'static str {
        match self {
            GrantAction::Grant => "GRANT",
            GrantAction::Revoke => "REVOKE",
        }
    }

    fn preposition(self) -> &'static str {
        match self {
            GrantAction::Grant => "TO",
            GrantAction::Revoke => "FROM",
        }
    }
}

impl fmt::Display for GrantAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.keyword())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum ObjectPrivilege {
    Select,
    Insert,
    Update,
    Delete,
}

impl ObjectPrivilege {
    pub const ALL: [ObjectPrivilege; 4] = [
        ObjectPrivilege::Select,
        ObjectPrivilege::Insert,
        ObjectPrivilege::Update,
        ObjectPrivilege::Delete,
    ];

    pub fn parse(value: &str) -> Result<Self, AdminError> {
        Self::ALL
            .into_iter()
            .find(|p| value.eq_ignore_ascii_case(p.as_str()))
            .ok_or_else(|| AdminError::InvalidPrivilege {
                class: PrivilegeClass::Object,
                privilege: value.to_string(),
                allowed: join_names(Self::ALL.iter().map(|p| p.as_str())),
            })
    }

    pub fn as_str(self) -> &'static str {
        match self {
            ObjectPrivilege::Select => "SELECT",
            ObjectPrivilege::Insert => "INSERT",
            ObjectPrivilege::Update => "UPDATE",
            ObjectPrivilege::Delete => "DELETE",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum ColumnPrivilege {
    Select,
    Insert,
}

impl ColumnPrivilege {
    pub const ALL: [ColumnPrivilege; 2] = [ColumnPrivilege::Select, ColumnPrivilege::Insert];

    pub fn parse(value: &str) -> Result<Self, AdminError> {
        Self::ALL
            .into_iter()
            .find(|p| value.eq_ignore_ascii_case(p.as_str()))
            .ok_or_else(|| AdminError::InvalidPrivilege {
                class: PrivilegeClass::Column,
                privilege: value.to_string(),
                allowed: join_names(Self::ALL.iter().map(|p| p.as_str())),
            })
    }

    pub fn as_str(self) -> &'static str {
        match self {
            ColumnPrivilege::Select => "SELECT",
            ColumnPrivilege::Insert => "INSERT",
        }
    }
}

fn join_names<'a>(names: impl Iterator<Item = &'a str>) -> String {
    names.collect::<Vec<_>>().join(", ")
}

/// `<owner>.<table>`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ObjectRef {
    pub owner: Identifier,
    pub table: Identifier,
}

impl fmt::Display for ObjectRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.owner, self.table)
    }
}

/// Non-empty column list, rendered as `(A,B,C)`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnList(Vec<Identifier>);

impl ColumnList {
    pub fn new(columns: Vec<Identifier>) -> Result<Self, AdminError> {
        if columns.is_empty() {
            return Err(AdminError::MissingOperand("columns"));
        }
        Ok(Self(columns))
    }
}

impl fmt::Display for ColumnList {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("(")?;
        for (i, column) in self.0.iter().enumerate() {
            if i > 0 {
                f.write_str(",")?;
            }
            write!(f, "{column}")?;
        }
        f.write_str(")")
    }
}

/// One GRANT or REVOKE of a single privilege class. Operands are validated
/// identifiers, already upper-case, so they are emitted bare.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PrivilegeCommand {
    System {
        action: GrantAction,
        privilege: SystemPrivilege,
        grantee: Identifier,
        with_admin: bool,
    },
    Role {
        action: GrantAction,
        role: Identifier,
        grantee: Identifier,
        with_admin: bool,
    },
    Object {
        action: GrantAction,
        privilege: ObjectPrivilege,
        object: ObjectRef,
        grantee: Identifier,
        with_grant_option: bool,
    },
    Column {
        action: GrantAction,
        privilege: ColumnPrivilege,
        object: ObjectRef,
        columns: ColumnList,
        grantee: Identifier,
    },
}

impl PrivilegeCommand {
    pub fn class(&self) -> PrivilegeClass {
        match self {
            PrivilegeCommand::System { .. } => PrivilegeClass::System,
            PrivilegeCommand::Role { .. } => PrivilegeClass::Role,
            PrivilegeCommand::Object { .. } => PrivilegeClass::Object,
            PrivilegeCommand::Column { .. } => PrivilegeClass::Column,
        }
    }

    pub fn action(&self) -> GrantAction {
        match self {
            PrivilegeCommand::System { action, .. }
            | PrivilegeCommand::Role { action, .. }
            | PrivilegeCommand::Object { action, .. }
            | PrivilegeCommand::Column { action, .. } => *action,
        }
    }

    pub fn grantee(&self) -> &Identifier {
        match self {
            PrivilegeCommand::System { grantee, .. }
            | PrivilegeCommand::Role { grantee, .. }
            | PrivilegeCommand::Object { grantee, .. }
            | PrivilegeCommand::Column { grantee, .. } => grantee,
        }
    }

    pub fn to_sql(&self) -> String {
        let action = self.action();
        let (kw, prep) = (action.keyword(), action.preposition());
        let granting = action == GrantAction::Grant;
        match self {
            PrivilegeCommand::System {
                privilege,
                grantee,
                with_admin,
                ..
            } => with_option(
                format!("{kw} {privilege} {prep} {grantee}"),
                granting && *with_admin,
                "WITH ADMIN OPTION",
            ),
            PrivilegeCommand::Role {
                role,
                grantee,
                with_admin,
                ..
            } => with_option(
                format!("{kw} {role} {prep} {grantee}"),
                granting && *with_admin,
                "WITH ADMIN OPTION",
            ),
            PrivilegeCommand::Object {
                privilege,
                object,
                grantee,
                with_grant_option,
                ..
            } => with_option(
                format!("{kw} {} ON {object} {prep} {grantee}", privilege.as_str()),
                granting && *with_grant_option,
                "WITH GRANT OPTION",
            ),
            PrivilegeCommand::Column {
                privilege,
                object,
                columns,
                grantee,
                ..
            } => format!(
                "{kw} {}{columns} ON {object} {prep} {grantee}",
                privilege.as_str()
            ),
        }
    }
}

fn with_option(mut sql: String, enabled: bool, clause: &str) -> String {
    if enabled {
        sql.push(' ');
        sql.push_str(clause);
    }
    sql
}

/// Resources a profile limits.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub enum ProfileResource {
    SessionsPerUser,
    ConnectTime,
    IdleTime,
}

impl ProfileResource {
    pub fn as_str(self) -> &'static str {
        match self {
            ProfileResource::SessionsPerUser => "SESSIONS_PER_USER",
            ProfileResource::ConnectTime => "CONNECT_TIME",
            ProfileResource::IdleTime => "IDLE_TIME",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProfileLimits {
    pub sessions_per_user: ResourceLimit,
    pub connect_time: ResourceLimit,
    pub idle_time: ResourceLimit,
}

impl Default for ProfileLimits {
    fn default() -> Self {
        Self {
            sessions_per_user: ResourceLimit::Default,
            connect_time: ResourceLimit::Default,
            idle_time: ResourceLimit::Default,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProfileCommand {
    Create {
        name: Identifier,
        limits: ProfileLimits,
    },
    /// Only the listed resources change; the list is never empty when built by
    /// [`crate::service::ProfileService`].
    Alter {
        name: Identifier,
        changes: Vec<(ProfileResource, ResourceLimit)>,
    },
    Drop {
        name: Identifier,
        cascade: bool,
    },
}

impl ProfileCommand {
    pub fn to_sql(&self) -> String {
        match self {
            ProfileCommand::Create { name, limits } => format!(
                "CREATE PROFILE {name} LIMIT SESSIONS_PER_USER {} CONNECT_TIME {} IDLE_TIME {}",
                limits.sessions_per_user, limits.connect_time, limits.idle_time
            ),
            ProfileCommand::Alter { name, changes } => {
                let mut sql = format!("ALTER PROFILE {name} LIMIT");
                for (resource, limit) in changes {
                    sql.push_str(&format!(" {} {limit}", resource.as_str()));
                }
                sql
            }
            ProfileCommand::Drop { name, cascade } => {
                with_option(format!("DROP PROFILE {name}"), *cascade, "CASCADE")
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RoleAuth {
    NotIdentified,
    Password(Password),
}

impl fmt::Display for RoleAuth {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RoleAuth::NotIdentified => f.write_str("NOT IDENTIFIED"),
            RoleAuth::Password(password) => write!(f, "IDENTIFIED BY \"{}\"", password.expose()),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RoleCommand {
    Create { name: Identifier, auth: RoleAuth },
    Alter { name: Identifier, auth: RoleAuth },
    Drop { name: Identifier },
}

impl RoleCommand {
    pub fn to_sql(&self) -> String {
        match self {
            RoleCommand::Create { name, auth } => format!("CREATE ROLE {name} {auth}"),
            RoleCommand::Alter { name, auth } => format!("ALTER ROLE {name} {auth}"),
            RoleCommand::Drop { name } => format!("DROP ROLE {name}"),
        }
    }
}

/// One attribute change inside `ALTER USER`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UserChange {
    Password(Password),
    DefaultTablespace(Identifier),
    TemporaryTablespace(Identifier),
    Quota { quota: Quota, tablespace: Identifier },
    Profile(Identifier),
    Lock,
    Unlock,
}

impl fmt::Display for UserChange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            UserChange::Password(password) => {
                write!(f, "IDENTIFIED BY \"{}\"", password.expose())
            }
            UserChange::DefaultTablespace(tablespace) => write!(f, "DEFAULT TABLESPACE {tablespace}"),
            UserChange::TemporaryTablespace(tablespace) => {
                write!(f, "TEMPORARY TABLESPACE {tablespace}")
            }
            UserChange::Quota { quota, tablespace } => write!(f, "QUOTA {quota} ON {tablespace}"),
            UserChange::Profile(profile) => write!(f, "PROFILE {profile}"),
            UserChange::Lock => f.write_str("ACCOUNT LOCK"),
            UserChange::Unlock => f.write_str("ACCOUNT UNLOCK"),
        }
    }
}

/// Account DDL. Every variant renders one statement; `Alter` folds all of its
/// changes into a single `ALTER USER`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UserCommand {
    Create {
        name: Identifier,
        password: Password,
        default_tablespace: Identifier,
        temporary_tablespace: Option<Identifier>,
        quota: Option<Quota>,
        profile: Option<Identifier>,
    },
    Alter {
        name: Identifier,
        changes: Vec<UserChange>,
    },
    Drop {
        name: Identifier,
        cascade: bool,
    },
}

impl UserCommand {
    pub fn name(&self) -> &Identifier {
        match self {
            UserCommand::Create { name, .. }
            | UserCommand::Alter { name, .. }
            | UserCommand::Drop { name, .. } => name,
        }
    }

    pub fn to_sql(&self) -> String {
        match self {
            UserCommand::Create {
                name,
                password,
                default_tablespace,
                temporary_tablespace,
                quota,
                profile,
            } => {
                let mut sql = format!(
                    "CREATE USER {name} IDENTIFIED BY \"{}\" DEFAULT TABLESPACE {default_tablespace}",
                    password.expose()
                );
                if let Some(tablespace) = temporary_tablespace {
                    sql.push_str(&format!(" TEMPORARY TABLESPACE {tablespace}"));
                }
                if let Some(quota) = quota {
                    sql.push_str(&format!(" QUOTA {quota} ON {default_tablespace}"));
                }
                if let Some(profile) = profile {
                    sql.push_str(&format!(" PROFILE {profile}"));
                }
                sql
            }
            UserCommand::Alter { name, changes } => {
                let mut sql = format!("ALTER USER {name}");
                for change in changes {
                    sql.push_str(&format!(" {change}"));
                }
                sql
            }
            UserCommand::Drop { name, cascade } => {
                with_option(format!("DROP USER {name}"), *cascade, "CASCADE")
            }
        }
    }
}
