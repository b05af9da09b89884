use crate::catalog::{
    CatalogReader, CatalogSession, GrantedRole, GranteePrivilege, PrincipalInfo, TablespaceQuota,
    UserInfo,
};
use crate::command::{UserChange, UserCommand};
use crate::config::{AdminConfig, name_set};
use crate::error::{AdminError, ResourceType};
use crate::executor::CommandExecutor;
use crate::validate::{Identifier, Password, Quota};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::sync::Arc;
use tracing::{info, warn};

/// Input for [`UserService::create_user`]. Blank optional fields count as
/// not supplied.
#[derive(Clone, Default, PartialEq, Eq, Deserialize)]
pub struct NewUser {
    pub username: String,
    pub password: String,
    pub default_tablespace: String,
    pub temporary_tablespace: Option<String>,
    pub quota: Option<String>,
    pub profile: Option<String>,
}

/// Partial account change for [`UserService::update_user`]. `None` or blank
/// leaves the attribute untouched.
#[derive(Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct UserUpdate {
    pub password: Option<String>,
    pub default_tablespace: Option<String>,
    pub temporary_tablespace: Option<String>,
    pub quota: Option<String>,
    pub profile: Option<String>,
}

/// An account with its grants and tablespace quotas.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UserDetail {
    #[serde(flatten)]
    pub user: UserInfo,
    pub privileges: Vec<GranteePrivilege>,
    pub roles: Vec<GrantedRole>,
    pub quotas: Vec<TablespaceQuota>,
}

/// Account management. The configured super-admin accounts are refused
/// before any I/O; every other operation runs its checks and its command
/// over one pooled connection.
#[derive(Clone)]
pub struct UserService {
    catalog: Arc<CatalogReader>,
    executor: CommandExecutor,
    super_admins: BTreeSet<String>,
}

impl UserService {
    pub fn new(
        catalog: Arc<CatalogReader>,
        executor: CommandExecutor,
        config: &AdminConfig,
    ) -> Self {
        Self {
            catalog,
            executor,
            super_admins: name_set(&config.super_admins),
        }
    }

    pub async fn users(&self) -> Result<Vec<PrincipalInfo>, AdminError> {
        self.catalog.principals().await
    }

    pub async fn user_detail(&self, username: &str) -> Result<Option<UserDetail>, AdminError> {
        let mut session = self.catalog.session().await?;
        let Some(user) = session.user_detail(username).await? else {
            return Ok(None);
        };
        let privileges = session.grantee_privileges(&user.username).await?;
        let roles = session.user_roles(&user.username).await?;
        let quotas = session.user_quotas(&user.username).await?;
        Ok(Some(UserDetail {
            user,
            privileges,
            roles,
            quotas,
        }))
    }

    pub async fn create_user(&self, new_user: &NewUser) -> Result<(), AdminError> {
        let name = Identifier::parse_object_name("username", &new_user.username)?;
        self.refuse_reserved(&name)?;
        let password = Password::parse(&new_user.password)?;
        let default_tablespace = match non_blank(&new_user.default_tablespace) {
            Some(tablespace) => Identifier::parse("default_tablespace", tablespace)?,
            None => return Err(AdminError::MissingOperand("default_tablespace")),
        };
        let temporary_tablespace = parse_tablespace(
            "temporary_tablespace",
            &new_user.temporary_tablespace,
        )?;
        refuse_same_tablespace(Some(&default_tablespace), temporary_tablespace.as_ref())?;
        let quota = supplied(&new_user.quota).map(Quota::parse).transpose()?;
        let profile = parse_profile(&new_user.profile)?;

        let mut session = self.catalog.session().await?;
        if session.user_exists(name.as_str()).await? {
            return Err(AdminError::AlreadyExists {
                resource_type: ResourceType::User,
                name: name.to_string(),
            });
        }
        if let Some(profile) = &profile {
            require_profile(&mut session, profile).await?;
        }
        let command = UserCommand::Create {
            name,
            password,
            default_tablespace,
            temporary_tablespace,
            quota,
            profile,
        };
        self.apply(&mut session, "create", command).await
    }

    /// Changes the supplied attributes in one `ALTER USER`. A quota without a
    /// new default tablespace applies to the account's current default
    /// tablespace. Nothing supplied is a no-op once the user is known to exist.
    pub async fn update_user(&self, username: &str, update: &UserUpdate) -> Result<(), AdminError> {
        let name = Identifier::parse_object_name("username", username)?;
        self.refuse_reserved(&name)?;
        let password = supplied(&update.password).map(Password::parse).transpose()?;
        let default_tablespace = parse_tablespace("default_tablespace", &update.default_tablespace)?;
        let temporary_tablespace =
            parse_tablespace("temporary_tablespace", &update.temporary_tablespace)?;
        refuse_same_tablespace(default_tablespace.as_ref(), temporary_tablespace.as_ref())?;
        let quota = supplied(&update.quota).map(Quota::parse).transpose()?;
        let profile = parse_profile(&update.profile)?;

        let mut session = self.catalog.session().await?;
        let current = require_user(&mut session, &name).await?;
        if let Some(profile) = &profile {
            require_profile(&mut session, profile).await?;
        }

        let mut changes = Vec::new();
        if let Some(password) = password {
            changes.push(UserChange::Password(password));
        }
        if let Some(quota) = quota {
            let tablespace = match &default_tablespace {
                Some(tablespace) => tablespace.clone(),
                None => Identifier::parse("default_tablespace", &current.default_tablespace)?,
            };
            changes.push(UserChange::Quota { quota, tablespace });
        }
        if let Some(tablespace) = default_tablespace {
            changes.push(UserChange::DefaultTablespace(tablespace));
        }
        if let Some(tablespace) = temporary_tablespace {
            changes.push(UserChange::TemporaryTablespace(tablespace));
        }
        if let Some(profile) = profile {
            changes.push(UserChange::Profile(profile));
        }
        if changes.is_empty() {
            return Ok(());
        }
        self.apply(&mut session, "alter", UserCommand::Alter { name, changes })
            .await
    }

    /// Without `cascade` the engine refuses to drop an account that still owns
    /// objects.
    pub async fn delete_user(&self, username: &str, cascade: bool) -> Result<(), AdminError> {
        let name = Identifier::parse_object_name("username", username)?;
        self.refuse_reserved(&name)?;
        let mut session = self.catalog.session().await?;
        require_user(&mut session, &name).await?;
        self.apply(&mut session, "drop", UserCommand::Drop { name, cascade })
            .await
    }

    pub async fn lock_user(&self, username: &str) -> Result<(), AdminError> {
        self.alter_one(username, "lock", UserChange::Lock).await
    }

    pub async fn unlock_user(&self, username: &str) -> Result<(), AdminError> {
        self.alter_one(username, "unlock", UserChange::Unlock).await
    }

    pub async fn update_quota(
        &self,
        username: &str,
        tablespace: &str,
        quota: &str,
    ) -> Result<(), AdminError> {
        let tablespace = match non_blank(tablespace) {
            Some(tablespace) => Identifier::parse("tablespace", tablespace)?,
            None => return Err(AdminError::MissingOperand("tablespace")),
        };
        let quota = Quota::parse(quota)?;
        self.alter_one(username, "quota", UserChange::Quota { quota, tablespace })
            .await
    }

    async fn alter_one(
        &self,
        username: &str,
        verb: &'static str,
        change: UserChange,
    ) -> Result<(), AdminError> {
        let name = Identifier::parse_object_name("username", username)?;
        self.refuse_reserved(&name)?;
        let mut session = self.catalog.session().await?;
        require_user(&mut session, &name).await?;
        let command = UserCommand::Alter {
            name,
            changes: vec![change],
        };
        self.apply(&mut session, verb, command).await
    }

    fn refuse_reserved(&self, name: &Identifier) -> Result<(), AdminError> {
        if self.super_admins.contains(name.as_str()) {
            return Err(AdminError::Reserved {
                resource_type: ResourceType::User,
                name: name.to_string(),
            });
        }
        Ok(())
    }

    async fn apply(
        &self,
        session: &mut CatalogSession<'_>,
        verb: &'static str,
        command: UserCommand,
    ) -> Result<(), AdminError> {
        let user = command.name().as_str();
        match self
            .executor
            .execute_on(session.connection(), &command.to_sql())
            .await
        {
            Ok(()) => {
                info!(verb, user, "user command applied");
                Ok(())
            }
            Err(err) => {
                warn!(verb, user, error = %err, "user command failed");
                Err(err.into())
            }
        }
    }
}

fn non_blank(value: &str) -> Option<&str> {
    let value = value.trim();
    (!value.is_empty()).then_some(value)
}

fn supplied(value: &Option<String>) -> Option<&str> {
    value.as_deref().and_then(non_blank)
}

fn parse_tablespace(
    field: &'static str,
    value: &Option<String>,
) -> Result<Option<Identifier>, AdminError> {
    supplied(value)
        .map(|tablespace| Identifier::parse(field, tablespace))
        .transpose()
}

fn parse_profile(value: &Option<String>) -> Result<Option<Identifier>, AdminError> {
    supplied(value)
        .map(|profile| Identifier::parse("profile", profile))
        .transpose()
}

fn refuse_same_tablespace(
    default: Option<&Identifier>,
    temporary: Option<&Identifier>,
) -> Result<(), AdminError> {
    match (default, temporary) {
        (Some(default), Some(temporary)) if default == temporary => {
            Err(AdminError::TablespaceConflict {
                tablespace: default.to_string(),
            })
        }
        _ => Ok(()),
    }
}

async fn require_user(
    session: &mut CatalogSession<'_>,
    name: &Identifier,
) -> Result<UserInfo, AdminError> {
    session
        .user_detail(name.as_str())
        .await?
        .ok_or_else(|| AdminError::NotFound {
            resource_type: ResourceType::User,
            name: name.to_string(),
        })
}

async fn require_profile(
    session: &mut CatalogSession<'_>,
    profile: &Identifier,
) -> Result<(), AdminError> {
    if session.profile_exists(profile.as_str()).await? {
        return Ok(());
    }
    Err(AdminError::NotFound {
        resource_type: ResourceType::Profile,
        name: profile.to_string(),
    })
}
