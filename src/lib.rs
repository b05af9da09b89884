pub mod access;
pub mod catalog;
pub mod command;
pub mod config;
pub mod error;
pub mod executor;
pub mod pool;
pub mod row;
pub mod service;
pub mod validate;

use crate::access::PermissionChecker;
use crate::catalog::CatalogReader;
use crate::config::AdminConfig;
use crate::error::AdminError;
use crate::executor::CommandExecutor;
use crate::pool::{ConnectionPool, Database};
use crate::service::{PrivilegeService, ProfileService, RoleService, UserService};
use std::sync::Arc;
use tracing::info;

pub use crate::access::{AccessDecision, AppAction};
pub use crate::error::{AdminErrorCode, EngineError, EngineErrorKind, ResourceType};
pub use crate::service::{
    COMMON_SYSTEM_PRIVILEGES, NewUser, ProfileUpdate, RoleDetail, UserDetail, UserUpdate,
};

/// The administration core wired over one connection pool.
///
/// Every component shares the same pool and configuration. Construct one per
/// target database and hand out clones of the component handles; nothing is
/// held in process-global state.
pub struct AdminCore {
    config: AdminConfig,
    catalog: Arc<CatalogReader>,
    privileges: PrivilegeService,
    profiles: ProfileService,
    roles: RoleService,
    users: UserService,
    permissions: PermissionChecker,
}

impl AdminCore {
    pub fn new(pool: Arc<dyn ConnectionPool>, config: AdminConfig) -> Result<Self, AdminError> {
        config.validate()?;
        let db = Database::new(pool, config.acquire_timeout());
        let catalog = Arc::new(CatalogReader::new(db.clone(), &config));
        let executor = CommandExecutor::new(db);
        let core = Self {
            privileges: PrivilegeService::new(executor.clone()),
            profiles: ProfileService::new(Arc::clone(&catalog), executor.clone()),
            roles: RoleService::new(Arc::clone(&catalog), executor.clone(), &config),
            users: UserService::new(Arc::clone(&catalog), executor, &config),
            permissions: PermissionChecker::new(Arc::clone(&catalog), &config),
            catalog,
            config,
        };
        info!(
            super_admins = core.config.super_admins.len(),
            reserved_roles = core.config.reserved_roles.len(),
            acquire_timeout_ms = core.config.acquire_timeout_ms,
            "admin core initialized"
        );
        Ok(core)
    }

    pub fn config(&self) -> &AdminConfig {
        &self.config
    }

    pub fn catalog(&self) -> &Arc<CatalogReader> {
        &self.catalog
    }

    pub fn privileges(&self) -> &PrivilegeService {
        &self.privileges
    }

    pub fn profiles(&self) -> &ProfileService {
        &self.profiles
    }

    pub fn roles(&self) -> &RoleService {
        &self.roles
    }

    pub fn users(&self) -> &UserService {
        &self.users
    }

    pub fn permissions(&self) -> &PermissionChecker {
        &self.permissions
    }
}
