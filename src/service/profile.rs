use crate::catalog::{CatalogReader, CatalogSession, ProfileDetail, ProfileSummary, ProfileUser};
use crate::command::{ProfileCommand, ProfileLimits, ProfileResource};
use crate::error::{AdminError, ResourceType};
use crate::executor::CommandExecutor;
use crate::validate::{Identifier, ResourceLimit};
use serde::Deserialize;
use std::sync::Arc;
use tracing::{info, warn};

const DEFAULT_PROFILE: &str = "DEFAULT";

/// Partial limit change for [`ProfileService::update_profile`]. `None` leaves
/// the resource untouched.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct ProfileUpdate {
    pub sessions_per_user: Option<String>,
    pub connect_time: Option<String>,
    pub idle_time: Option<String>,
}

impl ProfileUpdate {
    fn changes(&self) -> Result<Vec<(ProfileResource, ResourceLimit)>, AdminError> {
        let supplied = [
            (ProfileResource::SessionsPerUser, &self.sessions_per_user),
            (ProfileResource::ConnectTime, &self.connect_time),
            (ProfileResource::IdleTime, &self.idle_time),
        ];
        supplied
            .into_iter()
            .filter_map(|(resource, value)| value.as_deref().map(|v| (resource, v)))
            .map(|(resource, value)| {
                ResourceLimit::parse(resource.as_str(), value).map(|limit| (resource, limit))
            })
            .collect()
    }
}

/// Profile management. Each operation runs its existence checks and its
/// command over one pooled connection.
#[derive(Clone)]
pub struct ProfileService {
    catalog: Arc<CatalogReader>,
    executor: CommandExecutor,
}

impl ProfileService {
    pub fn new(catalog: Arc<CatalogReader>, executor: CommandExecutor) -> Self {
        Self { catalog, executor }
    }

    pub async fn profiles(&self) -> Result<Vec<ProfileSummary>, AdminError> {
        self.catalog.profiles().await
    }

    pub async fn profile_detail(&self, name: &str) -> Result<Option<ProfileDetail>, AdminError> {
        self.catalog.profile_detail(name).await
    }

    pub async fn profile_users(&self, name: &str) -> Result<Vec<ProfileUser>, AdminError> {
        self.catalog.profile_users(name).await
    }

    pub async fn create_profile(
        &self,
        name: &str,
        sessions_per_user: &str,
        connect_time: &str,
        idle_time: &str,
    ) -> Result<(), AdminError> {
        let name = Identifier::parse_object_name("profile", name)?;
        if name.as_str() == DEFAULT_PROFILE {
            return Err(reserved(&name));
        }
        let limits = ProfileLimits {
            sessions_per_user: ResourceLimit::parse("SESSIONS_PER_USER", sessions_per_user)?,
            connect_time: ResourceLimit::parse("CONNECT_TIME", connect_time)?,
            idle_time: ResourceLimit::parse("IDLE_TIME", idle_time)?,
        };
        let mut session = self.catalog.session().await?;
        if session.profile_exists(name.as_str()).await? {
            return Err(AdminError::AlreadyExists {
                resource_type: ResourceType::Profile,
                name: name.to_string(),
            });
        }
        self.apply(&mut session, ProfileCommand::Create { name, limits })
            .await
    }

    /// Changes only the supplied limits. Nothing supplied is a no-op once the
    /// profile is known to exist.
    pub async fn update_profile(
        &self,
        name: &str,
        update: &ProfileUpdate,
    ) -> Result<(), AdminError> {
        let name = Identifier::parse_object_name("profile", name)?;
        let changes = update.changes()?;
        let mut session = self.catalog.session().await?;
        require_existing(&mut session, &name).await?;
        if changes.is_empty() {
            return Ok(());
        }
        self.apply(&mut session, ProfileCommand::Alter { name, changes })
            .await
    }

    /// Without `cascade` a profile still assigned to users is refused; with it
    /// the engine moves those users to `DEFAULT`.
    pub async fn delete_profile(&self, name: &str, cascade: bool) -> Result<(), AdminError> {
        let name = Identifier::parse_object_name("profile", name)?;
        if name.as_str() == DEFAULT_PROFILE {
            return Err(reserved(&name));
        }
        let mut session = self.catalog.session().await?;
        require_existing(&mut session, &name).await?;
        if !cascade {
            let users = session.profile_users(name.as_str()).await?;
            if !users.is_empty() {
                return Err(AdminError::ProfileInUse {
                    name: name.to_string(),
                    user_count: users.len(),
                });
            }
        }
        self.apply(&mut session, ProfileCommand::Drop { name, cascade })
            .await
    }

    async fn apply(
        &self,
        session: &mut CatalogSession<'_>,
        command: ProfileCommand,
    ) -> Result<(), AdminError> {
        let (verb, name) = match &command {
            ProfileCommand::Create { name, .. } => ("create", name),
            ProfileCommand::Alter { name, .. } => ("alter", name),
            ProfileCommand::Drop { name, .. } => ("drop", name),
        };
        match self
            .executor
            .execute_on(session.connection(), &command.to_sql())
            .await
        {
            Ok(()) => {
                info!(verb, profile = name.as_str(), "profile command applied");
                Ok(())
            }
            Err(err) => {
                warn!(verb, profile = name.as_str(), error = %err, "profile command failed");
                Err(err.into())
            }
        }
    }
}

async fn require_existing(
    session: &mut CatalogSession<'_>,
    name: &Identifier,
) -> Result<(), AdminError> {
    if session.profile_exists(name.as_str()).await? {
        Ok(())
    } else {
        Err(AdminError::NotFound {
            resource_type: ResourceType::Profile,
            name: name.to_string(),
        })
    }
}

fn reserved(name: &Identifier) -> AdminError {
    AdminError::Reserved {
        resource_type: ResourceType::Profile,
        name: name.to_string(),
    }
}
