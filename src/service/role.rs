use crate::catalog::{CatalogReader, CatalogSession, GranteePrivilege, RoleGrantee, RoleInfo};
use crate::command::{RoleAuth, RoleCommand};
use crate::config::{AdminConfig, name_set};
use crate::error::{AdminError, ResourceType};
use crate::executor::CommandExecutor;
use crate::validate::{Identifier, Password};
use serde::Serialize;
use std::collections::BTreeSet;
use std::sync::Arc;
use tracing::{info, warn};

/// A role with its own privileges and the principals holding it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RoleDetail {
    #[serde(flatten)]
    pub role: RoleInfo,
    pub privileges: Vec<GranteePrivilege>,
    pub grantees: Vec<RoleGrantee>,
}

/// Create/alter/drop of application roles. Engine-defined roles listed in
/// [`AdminConfig::reserved_roles`] are refused before any I/O.
#[derive(Clone)]
pub struct RoleService {
    catalog: Arc<CatalogReader>,
    executor: CommandExecutor,
    reserved_roles: BTreeSet<String>,
}

impl RoleService {
    pub fn new(
        catalog: Arc<CatalogReader>,
        executor: CommandExecutor,
        config: &AdminConfig,
    ) -> Self {
        Self {
            catalog,
            executor,
            reserved_roles: name_set(&config.reserved_roles),
        }
    }

    pub async fn roles(&self) -> Result<Vec<RoleInfo>, AdminError> {
        self.catalog.roles().await
    }

    pub async fn role_detail(&self, name: &str) -> Result<Option<RoleDetail>, AdminError> {
        let mut session = self.catalog.session().await?;
        let Some(role) = session.role_detail(name).await? else {
            return Ok(None);
        };
        let privileges = session.grantee_privileges(&role.role).await?;
        let grantees = session.role_grantees(&role.role).await?;
        Ok(Some(RoleDetail {
            role,
            privileges,
            grantees,
        }))
    }

    pub async fn create_role(&self, name: &str, password: Option<&str>) -> Result<(), AdminError> {
        let name = Identifier::parse_object_name("role", name)?;
        self.refuse_reserved(&name)?;
        let auth = match password {
            Some(password) => RoleAuth::Password(Password::parse(password)?),
            None => RoleAuth::NotIdentified,
        };
        let mut session = self.catalog.session().await?;
        if session.role_exists(name.as_str()).await? {
            return Err(AdminError::AlreadyExists {
                resource_type: ResourceType::Role,
                name: name.to_string(),
            });
        }
        self.apply(&mut session, RoleCommand::Create { name, auth })
            .await
    }

    /// `remove_password` wins over a supplied password. Neither is a no-op.
    pub async fn update_role(
        &self,
        name: &str,
        password: Option<&str>,
        remove_password: bool,
    ) -> Result<(), AdminError> {
        let name = Identifier::parse_object_name("role", name)?;
        self.refuse_reserved(&name)?;
        let auth = match (remove_password, password) {
            (true, _) => Some(RoleAuth::NotIdentified),
            (false, Some(password)) => Some(RoleAuth::Password(Password::parse(password)?)),
            (false, None) => None,
        };
        let mut session = self.catalog.session().await?;
        require_existing(&mut session, &name).await?;
        match auth {
            Some(auth) => {
                self.apply(&mut session, RoleCommand::Alter { name, auth })
                    .await
            }
            None => Ok(()),
        }
    }

    pub async fn delete_role(&self, name: &str) -> Result<(), AdminError> {
        let name = Identifier::parse_object_name("role", name)?;
        self.refuse_reserved(&name)?;
        let mut session = self.catalog.session().await?;
        require_existing(&mut session, &name).await?;
        self.apply(&mut session, RoleCommand::Drop { name }).await
    }

    fn refuse_reserved(&self, name: &Identifier) -> Result<(), AdminError> {
        if self.reserved_roles.contains(name.as_str()) {
            return Err(AdminError::Reserved {
                resource_type: ResourceType::Role,
                name: name.to_string(),
            });
        }
        Ok(())
    }

    async fn apply(
        &self,
        session: &mut CatalogSession<'_>,
        command: RoleCommand,
    ) -> Result<(), AdminError> {
        let (verb, name) = match &command {
            RoleCommand::Create { name, .. } => ("create", name),
            RoleCommand::Alter { name, .. } => ("alter", name),
            RoleCommand::Drop { name } => ("drop", name),
        };
        match self
            .executor
            .execute_on(session.connection(), &command.to_sql())
            .await
        {
            Ok(()) => {
                info!(verb, role = name.as_str(), "role command applied");
                Ok(())
            }
            Err(err) => {
                warn!(verb, role = name.as_str(), error = %err, "role command failed");
                Err(err.into())
            }
        }
    }
}

async fn require_existing(
    session: &mut CatalogSession<'_>,
    name: &Identifier,
) -> Result<(), AdminError> {
    if !session.role_exists(name.as_str()).await? {
        return Err(AdminError::NotFound {
            resource_type: ResourceType::Role,
            name: name.to_string(),
        });
    }
    Ok(())
}
