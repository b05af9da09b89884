use crate::command::PrivilegeClass;
use crate::row::RowDecodeError;
use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResourceType {
    Profile,
    Role,
    User,
}

impl std::fmt::Display for ResourceType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ResourceType::Profile => write!(f, "profile"),
            ResourceType::Role => write!(f, "role"),
            ResourceType::User => write!(f, "user"),
        }
    }
}

/// How the database engine (or the pool in front of it) failed a call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EngineErrorKind {
    /// The engine refused the command: unknown object, missing privilege of
    /// the connecting account, duplicate create, and so on.
    Rejected,
    /// The engine could not be reached: pool exhaustion, acquire timeout,
    /// broken network connection.
    Connectivity,
}

/// Failure reported by a [`crate::pool::Connection`] or
/// [`crate::pool::ConnectionPool`]. The message is the engine diagnostic
/// verbatim.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{message}")]
pub struct EngineError {
    pub kind: EngineErrorKind,
    pub message: String,
}

impl EngineError {
    pub fn rejected(message: impl Into<String>) -> Self {
        Self {
            kind: EngineErrorKind::Rejected,
            message: message.into(),
        }
    }

    pub fn connectivity(message: impl Into<String>) -> Self {
        Self {
            kind: EngineErrorKind::Connectivity,
            message: message.into(),
        }
    }

    pub fn is_connectivity(&self) -> bool {
        self.kind == EngineErrorKind::Connectivity
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AdminErrorCode {
    Io,
    InvalidConfig,
    InvalidIdentifier,
    InvalidPrivilege,
    InvalidResourceLimit,
    InvalidPassword,
    InvalidQuota,
    TablespaceConflict,
    MissingOperand,
    UnknownAction,
    ProfileAlreadyExists,
    RoleAlreadyExists,
    UserAlreadyExists,
    ProfileNotFound,
    RoleNotFound,
    UserNotFound,
    ProfileReserved,
    RoleReserved,
    UserReserved,
    ProfileInUse,
    GrantFailed,
    RevokeFailed,
    EngineRejected,
    PermissionDenied,
    ConnectivityFailure,
    Decode,
}

impl AdminErrorCode {
    pub fn as_str(self) -> &'static str {
        match self {
            AdminErrorCode::Io => "io",
            AdminErrorCode::InvalidConfig => "invalid_config",
            AdminErrorCode::InvalidIdentifier => "invalid_identifier",
            AdminErrorCode::InvalidPrivilege => "invalid_privilege",
            AdminErrorCode::InvalidResourceLimit => "invalid_resource_limit",
            AdminErrorCode::InvalidPassword => "invalid_password",
            AdminErrorCode::InvalidQuota => "invalid_quota",
            AdminErrorCode::TablespaceConflict => "tablespace_conflict",
            AdminErrorCode::MissingOperand => "missing_operand",
            AdminErrorCode::UnknownAction => "unknown_action",
            AdminErrorCode::ProfileAlreadyExists => "profile_already_exists",
            AdminErrorCode::RoleAlreadyExists => "role_already_exists",
            AdminErrorCode::UserAlreadyExists => "user_already_exists",
            AdminErrorCode::ProfileNotFound => "profile_not_found",
            AdminErrorCode::RoleNotFound => "role_not_found",
            AdminErrorCode::UserNotFound => "user_not_found",
            AdminErrorCode::ProfileReserved => "profile_reserved",
            AdminErrorCode::RoleReserved => "role_reserved",
            AdminErrorCode::UserReserved => "user_reserved",
            AdminErrorCode::ProfileInUse => "profile_in_use",
            AdminErrorCode::GrantFailed => "grant_failed",
            AdminErrorCode::RevokeFailed => "revoke_failed",
            AdminErrorCode::EngineRejected => "engine_rejected",
            AdminErrorCode::PermissionDenied => "permission_denied",
            AdminErrorCode::ConnectivityFailure => "connectivity_failure",
            AdminErrorCode::Decode => "decode",
        }
    }
}

#[derive(Debug, Error)]
pub enum AdminError {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("invalid config: {message}")]
    InvalidConfig { message: String },
    #[error("invalid {field} identifier {value:?}")]
    InvalidIdentifier { field: &'static str, value: String },
    #[error("invalid {class} privilege {privilege:?}, expected one of: {allowed}")]
    InvalidPrivilege {
        class: PrivilegeClass,
        privilege: String,
        allowed: String,
    },
    #[error("invalid {resource} value {value:?}: must be UNLIMITED, DEFAULT or a positive integer")]
    InvalidResourceLimit {
        resource: &'static str,
        value: String,
    },
    #[error("invalid password: {0}")]
    InvalidPassword(&'static str),
    #[error("invalid quota {value:?}: must be UNLIMITED or a positive size with optional K, M, G or T unit")]
    InvalidQuota { value: String },
    #[error("default tablespace and temporary tablespace must differ, both are {tablespace}")]
    TablespaceConflict { tablespace: String },
    #[error("missing operand: {0}")]
    MissingOperand(&'static str),
    #[error("unknown action '{0}'")]
    UnknownAction(String),
    #[error("{resource_type} '{name}' already exists")]
    AlreadyExists {
        resource_type: ResourceType,
        name: String,
    },
    #[error("{resource_type} '{name}' not found")]
    NotFound {
        resource_type: ResourceType,
        name: String,
    },
    #[error("{resource_type} '{name}' is reserved and cannot be modified")]
    Reserved {
        resource_type: ResourceType,
        name: String,
    },
    #[error(
        "profile '{name}' is assigned to {user_count} user(s); drop with cascade to move them to DEFAULT"
    )]
    ProfileInUse { name: String, user_count: usize },
    #[error("grant failed: {message}")]
    GrantFailed { message: String },
    #[error("revoke failed: {message}")]
    RevokeFailed { message: String },
    #[error("engine rejected command: {message}")]
    EngineRejected { message: String },
    #[error("permission denied for action '{action}', requires one of: {required}")]
    PermissionDenied { action: String, required: String },
    #[error("connectivity failure: {message}")]
    ConnectivityFailure { message: String },
    #[error(transparent)]
    Decode(#[from] RowDecodeError),
}

impl From<EngineError> for AdminError {
    fn from(err: EngineError) -> Self {
        match err.kind {
            EngineErrorKind::Connectivity => AdminError::ConnectivityFailure {
                message: err.message,
            },
            EngineErrorKind::Rejected => AdminError::EngineRejected {
                message: err.message,
            },
        }
    }
}

impl AdminError {
    pub fn grant_failed(err: EngineError) -> Self {
        if err.is_connectivity() {
            return err.into();
        }
        AdminError::GrantFailed {
            message: err.message,
        }
    }

    pub fn revoke_failed(err: EngineError) -> Self {
        if err.is_connectivity() {
            return err.into();
        }
        AdminError::RevokeFailed {
            message: err.message,
        }
    }

    pub fn code(&self) -> AdminErrorCode {
        match self {
            AdminError::Io(_) => AdminErrorCode::Io,
            AdminError::InvalidConfig { .. } => AdminErrorCode::InvalidConfig,
            AdminError::InvalidIdentifier { .. } => AdminErrorCode::InvalidIdentifier,
            AdminError::InvalidPrivilege { .. } => AdminErrorCode::InvalidPrivilege,
            AdminError::InvalidResourceLimit { .. } => AdminErrorCode::InvalidResourceLimit,
            AdminError::InvalidPassword(_) => AdminErrorCode::InvalidPassword,
            AdminError::InvalidQuota { .. } => AdminErrorCode::InvalidQuota,
            AdminError::TablespaceConflict { .. } => AdminErrorCode::TablespaceConflict,
            AdminError::MissingOperand(_) => AdminErrorCode::MissingOperand,
            AdminError::UnknownAction(_) => AdminErrorCode::UnknownAction,
            AdminError::AlreadyExists { resource_type, .. } => match resource_type {
                ResourceType::Profile => AdminErrorCode::ProfileAlreadyExists,
                ResourceType::Role => AdminErrorCode::RoleAlreadyExists,
                ResourceType::User => AdminErrorCode::UserAlreadyExists,
            },
            AdminError::NotFound { resource_type, .. } => match resource_type {
                ResourceType::Profile => AdminErrorCode::ProfileNotFound,
                ResourceType::Role => AdminErrorCode::RoleNotFound,
                ResourceType::User => AdminErrorCode::UserNotFound,
            },
            AdminError::Reserved { resource_type, .. } => match resource_type {
                ResourceType::Profile => AdminErrorCode::ProfileReserved,
                ResourceType::Role => AdminErrorCode::RoleReserved,
                ResourceType::User => AdminErrorCode::UserReserved,
            },
            AdminError::ProfileInUse { .. } => AdminErrorCode::ProfileInUse,
            AdminError::GrantFailed { .. } => AdminErrorCode::GrantFailed,
            AdminError::RevokeFailed { .. } => AdminErrorCode::RevokeFailed,
            AdminError::EngineRejected { .. } => AdminErrorCode::EngineRejected,
            AdminError::PermissionDenied { .. } => AdminErrorCode::PermissionDenied,
            AdminError::ConnectivityFailure { .. } => AdminErrorCode::ConnectivityFailure,
            AdminError::Decode(_) => AdminErrorCode::Decode,
        }
    }

    pub fn code_str(&self) -> &'static str {
        self.code().as_str()
    }

    /// True for errors raised before any I/O because the caller supplied bad
    /// input. The presentation layer reports these as input errors.
    pub fn is_validation(&self) -> bool {
        matches!(
            self,
            AdminError::InvalidIdentifier { .. }
                | AdminError::InvalidPrivilege { .. }
                | AdminError::InvalidResourceLimit { .. }
                | AdminError::InvalidPassword(_)
                | AdminError::InvalidQuota { .. }
                | AdminError::TablespaceConflict { .. }
                | AdminError::MissingOperand(_)
                | AdminError::UnknownAction(_)
                | AdminError::Reserved { .. }
        )
    }
}
