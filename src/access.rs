use crate::catalog::{CatalogReader, CatalogSession};
use crate::config::{AdminConfig, name_set};
use crate::error::AdminError;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;
use tracing::{debug, warn};

/// Application actions that are gated by a system privilege.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AppAction {
    CreateUser,
    AlterUser,
    DropUser,
    CreateProfile,
    AlterProfile,
    DropProfile,
    CreateRole,
    AlterRole,
    DropRole,
    GrantRole,
    Login,
    SelectAnyTable,
    GrantSystemPrivilege,
    ViewOwnAccount,
}

impl AppAction {
    pub const ALL: [AppAction; 14] = [
        AppAction::CreateUser,
        AppAction::AlterUser,
        AppAction::DropUser,
        AppAction::CreateProfile,
        AppAction::AlterProfile,
        AppAction::DropProfile,
        AppAction::CreateRole,
        AppAction::AlterRole,
        AppAction::DropRole,
        AppAction::GrantRole,
        AppAction::Login,
        AppAction::SelectAnyTable,
        AppAction::GrantSystemPrivilege,
        AppAction::ViewOwnAccount,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            AppAction::CreateUser => "create_user",
            AppAction::AlterUser => "alter_user",
            AppAction::DropUser => "drop_user",
            AppAction::CreateProfile => "create_profile",
            AppAction::AlterProfile => "alter_profile",
            AppAction::DropProfile => "drop_profile",
            AppAction::CreateRole => "create_role",
            AppAction::AlterRole => "alter_role",
            AppAction::DropRole => "drop_role",
            AppAction::GrantRole => "grant_role",
            AppAction::Login => "login",
            AppAction::SelectAnyTable => "select_any_table",
            AppAction::GrantSystemPrivilege => "grant_system_privilege",
            AppAction::ViewOwnAccount => "view_own_account",
        }
    }

    /// Acceptable privileges, any one of which permits the action. Empty means
    /// no privilege is required.
    pub fn required_privileges(self) -> &'static [&'static str] {
        match self {
            AppAction::CreateUser => &["CREATE USER"],
            AppAction::AlterUser => &["ALTER USER"],
            AppAction::DropUser => &["DROP USER"],
            AppAction::CreateProfile => &["CREATE PROFILE"],
            AppAction::AlterProfile => &["ALTER PROFILE"],
            AppAction::DropProfile => &["DROP PROFILE"],
            AppAction::CreateRole => &["CREATE ROLE"],
            AppAction::AlterRole => &["ALTER ANY ROLE"],
            AppAction::DropRole => &["DROP ANY ROLE"],
            AppAction::GrantRole => &["GRANT ANY ROLE"],
            AppAction::Login => &["CREATE SESSION"],
            AppAction::SelectAnyTable => &["SELECT ANY TABLE"],
            AppAction::GrantSystemPrivilege => &["GRANT ANY PRIVILEGE"],
            AppAction::ViewOwnAccount => &[],
        }
    }
}

impl fmt::Display for AppAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AppAction {
    type Err = AdminError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|a| a.as_str() == s)
            .ok_or_else(|| AdminError::UnknownAction(s.to_string()))
    }
}

/// Outcome of one permission evaluation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "decision", rename_all = "snake_case")]
pub enum AccessDecision {
    NoPrivilegeRequired,
    SuperAdmin,
    Direct { privilege: String },
    ViaRole { role: String, privilege: String },
    Denied,
}

impl AccessDecision {
    pub fn is_permitted(&self) -> bool {
        !matches!(self, AccessDecision::Denied)
    }
}

/// Gates application actions behind live system-privilege checks.
///
/// A principal may perform an action when the action requires nothing, when
/// the principal is a configured super-admin account, or when it holds any of
/// the action's privileges directly or through a role granted directly to it.
/// Roles granted to roles are not followed.
#[derive(Clone)]
pub struct PermissionChecker {
    catalog: Arc<CatalogReader>,
    super_admins: BTreeSet<String>,
}

impl PermissionChecker {
    pub fn new(catalog: Arc<CatalogReader>, config: &AdminConfig) -> Self {
        Self {
            catalog,
            super_admins: name_set(&config.super_admins),
        }
    }

    /// Decides whether `principal` may perform `action`. Catalog failures are
    /// returned as errors and never read as a grant.
    pub async fn evaluate(
        &self,
        principal: &str,
        action: AppAction,
    ) -> Result<AccessDecision, AdminError> {
        let principal = principal.trim().to_ascii_uppercase();
        if let Some(decision) = self.settle_without_lookup(&principal, action) {
            return Ok(decision);
        }
        let mut session = self.catalog.session().await?;
        lookup(&mut session, &principal, action).await
    }

    /// `Ok(false)` or [`AdminError::PermissionDenied`] on denial depending on
    /// `raise_error`.
    pub async fn check_permission(
        &self,
        principal: &str,
        action: AppAction,
        raise_error: bool,
    ) -> Result<bool, AdminError> {
        let decision = match self.evaluate(principal, action).await {
            Ok(decision) => decision,
            Err(err) => {
                warn!(principal, %action, error = %err, "permission check failed");
                return Err(err);
            }
        };
        debug!(principal, %action, ?decision, "permission evaluated");
        if decision.is_permitted() {
            return Ok(true);
        }
        if raise_error {
            return Err(AdminError::PermissionDenied {
                action: action.to_string(),
                required: action.required_privileges().join(", "),
            });
        }
        Ok(false)
    }

    /// Evaluates every action over at most one pooled connection.
    pub async fn check_multiple_permissions(
        &self,
        principal: &str,
        actions: &[AppAction],
    ) -> Result<BTreeMap<AppAction, bool>, AdminError> {
        let canonical = principal.trim().to_ascii_uppercase();
        let mut results = BTreeMap::new();
        let mut pending = Vec::new();
        for &action in actions {
            match self.settle_without_lookup(&canonical, action) {
                Some(decision) => {
                    results.insert(action, decision.is_permitted());
                }
                None => pending.push(action),
            }
        }
        if pending.is_empty() {
            return Ok(results);
        }
        let mut session = match self.catalog.session().await {
            Ok(session) => session,
            Err(err) => {
                warn!(principal, error = %err, "permission check failed");
                return Err(err);
            }
        };
        for action in pending {
            let decision = match lookup(&mut session, &canonical, action).await {
                Ok(decision) => decision,
                Err(err) => {
                    warn!(principal, %action, error = %err, "permission check failed");
                    return Err(err);
                }
            };
            debug!(principal, %action, ?decision, "permission evaluated");
            results.insert(action, decision.is_permitted());
        }
        Ok(results)
    }

    /// Every action mapped to whether `principal` may perform it.
    pub async fn get_user_capabilities(
        &self,
        principal: &str,
    ) -> Result<BTreeMap<AppAction, bool>, AdminError> {
        self.check_multiple_permissions(principal, &AppAction::ALL)
            .await
    }

    /// Decisions that need no catalog read.
    fn settle_without_lookup(&self, principal: &str, action: AppAction) -> Option<AccessDecision> {
        if action.required_privileges().is_empty() {
            return Some(AccessDecision::NoPrivilegeRequired);
        }
        if self.super_admins.contains(principal) {
            return Some(AccessDecision::SuperAdmin);
        }
        None
    }
}

/// Direct grants for every acceptable privilege first, then roles granted
/// directly to the principal.
async fn lookup(
    session: &mut CatalogSession<'_>,
    principal: &str,
    action: AppAction,
) -> Result<AccessDecision, AdminError> {
    let required = action.required_privileges();
    for privilege in required {
        if session
            .has_direct_system_privilege(principal, privilege)
            .await?
        {
            return Ok(AccessDecision::Direct {
                privilege: privilege.to_string(),
            });
        }
    }
    for privilege in required {
        let roles = session
            .roles_granting_system_privilege(principal, privilege)
            .await?;
        if let Some(role) = roles.into_iter().next() {
            return Ok(AccessDecision::ViaRole {
                role,
                privilege: privilege.to_string(),
            });
        }
    }
    Ok(AccessDecision::Denied)
}
