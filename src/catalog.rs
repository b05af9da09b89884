use crate::command::PrivilegeClass;
use crate::config::{AdminConfig, name_set};
use crate::error::AdminError;
use crate::pool::{Database, PooledConnection};
use crate::row::{
    Bind, Row, RowDecodeError, TryFromRow, decode_rows, flag_at, i64_at, opt_text_at, text_at,
};
use compact_str::CompactString;
use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet};

/// Catalog query text. Column order of each SELECT list is the positional
/// layout the matching record decoder expects.
pub mod sql {
    pub const SYSTEM_PRIVILEGES: &str = "SELECT name FROM system_privilege_map ORDER BY name";

    pub const ROLES: &str = "SELECT r.role, r.password_required, r.authentication_type, \
        (SELECT COUNT(*) FROM dba_role_privs rp WHERE rp.granted_role = r.role) AS grantee_count \
        FROM dba_roles r ORDER BY r.role";

    pub const ROLE_DETAIL: &str = "SELECT r.role, r.password_required, r.authentication_type, \
        (SELECT COUNT(*) FROM dba_role_privs rp WHERE rp.granted_role = r.role) AS grantee_count \
        FROM dba_roles r WHERE r.role = :role";

    pub const ROLE_EXISTS: &str = "SELECT COUNT(*) FROM dba_roles WHERE role = :role";

    pub const ROLE_GRANTEES: &str = "SELECT grantee, admin_option, default_role \
        FROM dba_role_privs WHERE granted_role = :role ORDER BY grantee";

    pub const PRINCIPALS: &str =
        "SELECT username, account_status, profile FROM dba_users ORDER BY username";

    pub const GRANTEE_PRIVILEGES: &str = "SELECT privilege, 'SYSTEM' AS privilege_class, admin_option \
        FROM dba_sys_privs WHERE grantee = :grantee \
        UNION ALL \
        SELECT granted_role, 'ROLE' AS privilege_class, admin_option \
        FROM dba_role_privs WHERE grantee = :grantee \
        ORDER BY 2 DESC, 1";

    pub const OBJECT_PRIVILEGES: &str = "SELECT owner, table_name, privilege, grantable \
        FROM dba_tab_privs WHERE grantee = :grantee AND type = 'TABLE' \
        ORDER BY owner, table_name, privilege";

    pub const COLUMN_PRIVILEGES: &str = "SELECT owner, table_name, column_name, privilege, grantable \
        FROM dba_col_privs WHERE grantee = :grantee \
        ORDER BY owner, table_name, column_name, privilege";

    pub const TABLES: &str = "SELECT owner, table_name FROM dba_tables ORDER BY owner, table_name";

    pub const TABLES_BY_OWNER: &str =
        "SELECT owner, table_name FROM dba_tables WHERE owner = :owner ORDER BY table_name";

    pub const TABLE_COLUMNS: &str = "SELECT column_name, data_type, nullable \
        FROM dba_tab_columns WHERE owner = :owner AND table_name = :table_name \
        ORDER BY column_id";

    pub const PROFILES: &str = "SELECT p.profile, \
        MAX(CASE WHEN p.resource_name = 'SESSIONS_PER_USER' THEN p.limit END) AS sessions_per_user, \
        MAX(CASE WHEN p.resource_name = 'CONNECT_TIME' THEN p.limit END) AS connect_time, \
        MAX(CASE WHEN p.resource_name = 'IDLE_TIME' THEN p.limit END) AS idle_time, \
        (SELECT COUNT(*) FROM dba_users u WHERE u.profile = p.profile) AS user_count \
        FROM dba_profiles p \
        WHERE p.resource_name IN ('SESSIONS_PER_USER', 'CONNECT_TIME', 'IDLE_TIME') \
        GROUP BY p.profile ORDER BY p.profile";

    pub const PROFILE_DETAIL: &str = "SELECT resource_name, resource_type, limit \
        FROM dba_profiles WHERE profile = :profile ORDER BY resource_name";

    pub const PROFILE_EXISTS: &str = "SELECT COUNT(*) FROM dba_profiles WHERE profile = :profile";

    pub const PROFILE_USERS: &str = "SELECT username, account_status \
        FROM dba_users WHERE profile = :profile ORDER BY username";

    pub const DIRECT_SYSTEM_PRIVILEGE: &str = "SELECT COUNT(*) FROM dba_sys_privs \
        WHERE grantee = :principal AND privilege = :privilege";

    pub const USER_DETAIL: &str = "SELECT username, account_status, default_tablespace, \
        temporary_tablespace, profile, created, lock_date \
        FROM dba_users WHERE username = :username";

    pub const USER_EXISTS: &str = "SELECT COUNT(*) FROM dba_users WHERE username = :username";

    pub const USER_ROLES: &str = "SELECT granted_role, admin_option, default_role \
        FROM dba_role_privs WHERE grantee = :username ORDER BY granted_role";

    pub const USER_QUOTAS: &str = "SELECT tablespace_name, bytes, max_bytes \
        FROM dba_ts_quotas WHERE username = :username ORDER BY tablespace_name";

    pub const ROLES_GRANTING_SYSTEM_PRIVILEGE: &str = "SELECT rp.granted_role \
        FROM dba_role_privs rp JOIN dba_sys_privs sp ON sp.grantee = rp.granted_role \
        WHERE rp.grantee = :principal AND sp.privilege = :privilege \
        ORDER BY rp.granted_role";
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RoleInfo {
    pub role: String,
    pub password_required: String,
    pub authentication_type: String,
    pub grantee_count: i64,
}

impl TryFromRow for RoleInfo {
    fn try_from_row(row: Row) -> Result<Self, RowDecodeError> {
        Ok(Self {
            role: text_at(&row, 0, "role")?.to_string(),
            password_required: text_at(&row, 1, "password_required")?.to_string(),
            authentication_type: text_at(&row, 2, "authentication_type")?.to_string(),
            grantee_count: i64_at(&row, 3, "grantee_count")?,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PrincipalInfo {
    pub username: String,
    pub account_status: String,
    pub profile: String,
}

impl TryFromRow for PrincipalInfo {
    fn try_from_row(row: Row) -> Result<Self, RowDecodeError> {
        Ok(Self {
            username: text_at(&row, 0, "username")?.to_string(),
            account_status: text_at(&row, 1, "account_status")?.to_string(),
            profile: text_at(&row, 2, "profile")?.to_string(),
        })
    }
}

/// A system privilege or role held by a grantee.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GranteePrivilege {
    pub privilege: String,
    pub class: PrivilegeClass,
    pub admin_option: String,
}

impl GranteePrivilege {
    pub fn has_admin_option(&self) -> bool {
        self.admin_option == "YES"
    }
}

impl TryFromRow for GranteePrivilege {
    fn try_from_row(row: Row) -> Result<Self, RowDecodeError> {
        let class = match text_at(&row, 1, "privilege_class")? {
            "SYSTEM" => PrivilegeClass::System,
            "ROLE" => PrivilegeClass::Role,
            _ => {
                return Err(RowDecodeError::TypeMismatch {
                    column: "privilege_class".into(),
                    expected: "SYSTEM or ROLE",
                    actual: "Text",
                });
            }
        };
        Ok(Self {
            privilege: text_at(&row, 0, "privilege")?.to_string(),
            class,
            admin_option: text_at(&row, 2, "admin_option")?.to_string(),
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ObjectGrant {
    pub owner: String,
    pub table_name: String,
    pub privilege: String,
    pub grantable: String,
}

impl TryFromRow for ObjectGrant {
    fn try_from_row(row: Row) -> Result<Self, RowDecodeError> {
        Ok(Self {
            owner: text_at(&row, 0, "owner")?.to_string(),
            table_name: text_at(&row, 1, "table_name")?.to_string(),
            privilege: text_at(&row, 2, "privilege")?.to_string(),
            grantable: text_at(&row, 3, "grantable")?.to_string(),
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ColumnGrant {
    pub owner: String,
    pub table_name: String,
    pub column_name: String,
    pub privilege: String,
    pub grantable: String,
}

impl TryFromRow for ColumnGrant {
    fn try_from_row(row: Row) -> Result<Self, RowDecodeError> {
        Ok(Self {
            owner: text_at(&row, 0, "owner")?.to_string(),
            table_name: text_at(&row, 1, "table_name")?.to_string(),
            column_name: text_at(&row, 2, "column_name")?.to_string(),
            privilege: text_at(&row, 3, "privilege")?.to_string(),
            grantable: text_at(&row, 4, "grantable")?.to_string(),
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TableInfo {
    pub owner: String,
    pub table_name: String,
}

impl TryFromRow for TableInfo {
    fn try_from_row(row: Row) -> Result<Self, RowDecodeError> {
        Ok(Self {
            owner: text_at(&row, 0, "owner")?.to_string(),
            table_name: text_at(&row, 1, "table_name")?.to_string(),
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ColumnInfo {
    pub column_name: String,
    pub data_type: String,
    pub nullable: bool,
}

impl TryFromRow for ColumnInfo {
    fn try_from_row(row: Row) -> Result<Self, RowDecodeError> {
        Ok(Self {
            column_name: text_at(&row, 0, "column_name")?.to_string(),
            data_type: text_at(&row, 1, "data_type")?.to_string(),
            nullable: flag_at(&row, 2, "nullable")?,
        })
    }
}

/// One profile with the three limits the application manages.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ProfileSummary {
    pub profile: String,
    pub sessions_per_user: Option<String>,
    pub connect_time: Option<String>,
    pub idle_time: Option<String>,
    pub user_count: i64,
}

impl TryFromRow for ProfileSummary {
    fn try_from_row(row: Row) -> Result<Self, RowDecodeError> {
        Ok(Self {
            profile: text_at(&row, 0, "profile")?.to_string(),
            sessions_per_user: opt_text_at(&row, 1, "sessions_per_user")?.map(str::to_string),
            connect_time: opt_text_at(&row, 2, "connect_time")?.map(str::to_string),
            idle_time: opt_text_at(&row, 3, "idle_time")?.map(str::to_string),
            user_count: i64_at(&row, 4, "user_count")?,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ResourceSetting {
    pub resource_type: String,
    pub limit: String,
}

struct ProfileResourceRow {
    resource_name: String,
    setting: ResourceSetting,
}

impl TryFromRow for ProfileResourceRow {
    fn try_from_row(row: Row) -> Result<Self, RowDecodeError> {
        Ok(Self {
            resource_name: text_at(&row, 0, "resource_name")?.to_string(),
            setting: ResourceSetting {
                resource_type: text_at(&row, 1, "resource_type")?.to_string(),
                limit: text_at(&row, 2, "limit")?.to_string(),
            },
        })
    }
}

/// Every resource limit of one profile, keyed by lower-case resource name.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ProfileDetail {
    pub profile: String,
    pub resources: BTreeMap<String, ResourceSetting>,
    pub sessions_per_user: String,
    pub connect_time: String,
    pub idle_time: String,
}

impl ProfileDetail {
    fn from_resources(profile: String, rows: Vec<ProfileResourceRow>) -> Self {
        let resources: BTreeMap<String, ResourceSetting> = rows
            .into_iter()
            .map(|r| (r.resource_name.to_ascii_lowercase(), r.setting))
            .collect();
        let limit_of = |key: &str| {
            resources
                .get(key)
                .map(|s| s.limit.clone())
                .unwrap_or_else(|| "DEFAULT".to_string())
        };
        Self {
            sessions_per_user: limit_of("sessions_per_user"),
            connect_time: limit_of("connect_time"),
            idle_time: limit_of("idle_time"),
            profile,
            resources,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ProfileUser {
    pub username: String,
    pub account_status: String,
}

impl TryFromRow for ProfileUser {
    fn try_from_row(row: Row) -> Result<Self, RowDecodeError> {
        Ok(Self {
            username: text_at(&row, 0, "username")?.to_string(),
            account_status: text_at(&row, 1, "account_status")?.to_string(),
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RoleGrantee {
    pub grantee: String,
    pub admin_option: String,
    pub default_role: String,
}

impl TryFromRow for RoleGrantee {
    fn try_from_row(row: Row) -> Result<Self, RowDecodeError> {
        Ok(Self {
            grantee: text_at(&row, 0, "grantee")?.to_string(),
            admin_option: text_at(&row, 1, "admin_option")?.to_string(),
            default_role: text_at(&row, 2, "default_role")?.to_string(),
        })
    }
}

/// One account as the engine describes it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UserInfo {
    pub username: String,
    pub account_status: String,
    pub default_tablespace: String,
    pub temporary_tablespace: String,
    pub profile: String,
    pub created: Option<String>,
    pub lock_date: Option<String>,
}

impl UserInfo {
    pub fn is_locked(&self) -> bool {
        self.account_status.contains("LOCKED")
    }
}

impl TryFromRow for UserInfo {
    fn try_from_row(row: Row) -> Result<Self, RowDecodeError> {
        Ok(Self {
            username: text_at(&row, 0, "username")?.to_string(),
            account_status: text_at(&row, 1, "account_status")?.to_string(),
            default_tablespace: text_at(&row, 2, "default_tablespace")?.to_string(),
            temporary_tablespace: text_at(&row, 3, "temporary_tablespace")?.to_string(),
            profile: text_at(&row, 4, "profile")?.to_string(),
            created: opt_text_at(&row, 5, "created")?.map(str::to_string),
            lock_date: opt_text_at(&row, 6, "lock_date")?.map(str::to_string),
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GrantedRole {
    pub granted_role: String,
    pub admin_option: String,
    pub default_role: String,
}

impl TryFromRow for GrantedRole {
    fn try_from_row(row: Row) -> Result<Self, RowDecodeError> {
        Ok(Self {
            granted_role: text_at(&row, 0, "granted_role")?.to_string(),
            admin_option: text_at(&row, 1, "admin_option")?.to_string(),
            default_role: text_at(&row, 2, "default_role")?.to_string(),
        })
    }
}

/// Space charged to a user on one tablespace. `max_bytes` is `-1` when the
/// quota is unlimited.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TablespaceQuota {
    pub tablespace_name: String,
    pub bytes: i64,
    pub max_bytes: i64,
}

impl TablespaceQuota {
    pub fn is_unlimited(&self) -> bool {
        self.max_bytes < 0
    }
}

impl TryFromRow for TablespaceQuota {
    fn try_from_row(row: Row) -> Result<Self, RowDecodeError> {
        Ok(Self {
            tablespace_name: text_at(&row, 0, "tablespace_name")?.to_string(),
            bytes: i64_at(&row, 1, "bytes")?,
            max_bytes: i64_at(&row, 2, "max_bytes")?,
        })
    }
}

struct Name(String);

impl TryFromRow for Name {
    fn try_from_row(row: Row) -> Result<Self, RowDecodeError> {
        Ok(Self(text_at(&row, 0, "name")?.to_string()))
    }
}

struct Count(i64);

impl TryFromRow for Count {
    fn try_from_row(row: Row) -> Result<Self, RowDecodeError> {
        Ok(Self(i64_at(&row, 0, "count")?))
    }
}

fn canonical(name: &str) -> CompactString {
    name.trim().to_ascii_uppercase().into()
}

/// Live, uncached reads of the engine's privilege and schema catalog views.
/// Absence is an empty list, `None` or `false`; errors only come from the
/// engine or the pool.
///
/// Each method here checks out one connection for its single read. Callers
/// composing several reads, or reads followed by a command, open a
/// [`CatalogSession`] instead so the whole operation uses one connection.
pub struct CatalogReader {
    db: Database,
    super_admins: BTreeSet<String>,
    internal_schemas: BTreeSet<String>,
}

impl CatalogReader {
    pub fn new(db: Database, config: &AdminConfig) -> Self {
        Self {
            db,
            super_admins: name_set(&config.super_admins),
            internal_schemas: name_set(&config.internal_schemas),
        }
    }

    pub async fn session(&self) -> Result<CatalogSession<'_>, AdminError> {
        let conn = self.db.connection().await?;
        Ok(CatalogSession { reader: self, conn })
    }

    /// Every system privilege the engine knows about.
    pub async fn system_privileges(&self) -> Result<Vec<String>, AdminError> {
        self.session().await?.system_privileges().await
    }

    pub async fn roles(&self) -> Result<Vec<RoleInfo>, AdminError> {
        self.session().await?.roles().await
    }

    /// All user accounts except the configured super-admin accounts.
    pub async fn principals(&self) -> Result<Vec<PrincipalInfo>, AdminError> {
        self.session().await?.principals().await
    }

    /// System privileges and roles granted to `grantee`, system grants first.
    pub async fn grantee_privileges(
        &self,
        grantee: &str,
    ) -> Result<Vec<GranteePrivilege>, AdminError> {
        self.session().await?.grantee_privileges(grantee).await
    }

    pub async fn object_privileges(&self, grantee: &str) -> Result<Vec<ObjectGrant>, AdminError> {
        self.session().await?.object_privileges(grantee).await
    }

    pub async fn column_privileges(&self, grantee: &str) -> Result<Vec<ColumnGrant>, AdminError> {
        self.session().await?.column_privileges(grantee).await
    }

    /// Tables outside the engine-internal schemas, optionally for one owner.
    pub async fn tables(&self, owner: Option<&str>) -> Result<Vec<TableInfo>, AdminError> {
        self.session().await?.tables(owner).await
    }

    pub async fn table_columns(
        &self,
        owner: &str,
        table_name: &str,
    ) -> Result<Vec<ColumnInfo>, AdminError> {
        self.session().await?.table_columns(owner, table_name).await
    }

    pub async fn profile_exists(&self, profile: &str) -> Result<bool, AdminError> {
        self.session().await?.profile_exists(profile).await
    }

    pub async fn role_exists(&self, role: &str) -> Result<bool, AdminError> {
        self.session().await?.role_exists(role).await
    }

    pub async fn user_exists(&self, username: &str) -> Result<bool, AdminError> {
        self.session().await?.user_exists(username).await
    }

    pub async fn profiles(&self) -> Result<Vec<ProfileSummary>, AdminError> {
        self.session().await?.profiles().await
    }

    pub async fn profile_detail(&self, profile: &str) -> Result<Option<ProfileDetail>, AdminError> {
        self.session().await?.profile_detail(profile).await
    }

    pub async fn profile_users(&self, profile: &str) -> Result<Vec<ProfileUser>, AdminError> {
        self.session().await?.profile_users(profile).await
    }

    pub async fn role_detail(&self, role: &str) -> Result<Option<RoleInfo>, AdminError> {
        self.session().await?.role_detail(role).await
    }

    pub async fn role_grantees(&self, role: &str) -> Result<Vec<RoleGrantee>, AdminError> {
        self.session().await?.role_grantees(role).await
    }

    pub async fn user_detail(&self, username: &str) -> Result<Option<UserInfo>, AdminError> {
        self.session().await?.user_detail(username).await
    }

    pub async fn user_roles(&self, username: &str) -> Result<Vec<GrantedRole>, AdminError> {
        self.session().await?.user_roles(username).await
    }

    pub async fn user_quotas(&self, username: &str) -> Result<Vec<TablespaceQuota>, AdminError> {
        self.session().await?.user_quotas(username).await
    }
}

/// One pooled connection held across a sequence of catalog reads and,
/// optionally, the command that follows them. The connection goes back to
/// the pool when the session drops.
pub struct CatalogSession<'a> {
    reader: &'a CatalogReader,
    conn: PooledConnection,
}

impl CatalogSession<'_> {
    /// The underlying connection, for running a command after the reads.
    pub fn connection(&mut self) -> &mut PooledConnection {
        &mut self.conn
    }

    async fn fetch<T: TryFromRow>(
        &mut self,
        sql: &str,
        binds: &[Bind],
    ) -> Result<Vec<T>, AdminError> {
        let rows = self.conn.query(sql, binds).await?;
        Ok(decode_rows(rows)?)
    }

    async fn count(&mut self, sql: &str, binds: &[Bind]) -> Result<i64, AdminError> {
        let rows: Vec<Count> = self.fetch(sql, binds).await?;
        Ok(rows.first().map_or(0, |c| c.0))
    }

    async fn names(&mut self, sql: &str, binds: &[Bind]) -> Result<Vec<String>, AdminError> {
        let rows: Vec<Name> = self.fetch(sql, binds).await?;
        Ok(rows.into_iter().map(|n| n.0).collect())
    }

    pub async fn system_privileges(&mut self) -> Result<Vec<String>, AdminError> {
        self.names(sql::SYSTEM_PRIVILEGES, &[]).await
    }

    pub async fn roles(&mut self) -> Result<Vec<RoleInfo>, AdminError> {
        self.fetch(sql::ROLES, &[]).await
    }

    pub async fn principals(&mut self) -> Result<Vec<PrincipalInfo>, AdminError> {
        let users: Vec<PrincipalInfo> = self.fetch(sql::PRINCIPALS, &[]).await?;
        Ok(users
            .into_iter()
            .filter(|u| !self.reader.super_admins.contains(&u.username))
            .collect())
    }

    pub async fn grantee_privileges(
        &mut self,
        grantee: &str,
    ) -> Result<Vec<GranteePrivilege>, AdminError> {
        self.fetch(
            sql::GRANTEE_PRIVILEGES,
            &[Bind::text("grantee", canonical(grantee))],
        )
        .await
    }

    pub async fn object_privileges(
        &mut self,
        grantee: &str,
    ) -> Result<Vec<ObjectGrant>, AdminError> {
        self.fetch(
            sql::OBJECT_PRIVILEGES,
            &[Bind::text("grantee", canonical(grantee))],
        )
        .await
    }

    pub async fn column_privileges(
        &mut self,
        grantee: &str,
    ) -> Result<Vec<ColumnGrant>, AdminError> {
        self.fetch(
            sql::COLUMN_PRIVILEGES,
            &[Bind::text("grantee", canonical(grantee))],
        )
        .await
    }

    pub async fn tables(&mut self, owner: Option<&str>) -> Result<Vec<TableInfo>, AdminError> {
        let tables: Vec<TableInfo> = match owner {
            Some(owner) => {
                self.fetch(sql::TABLES_BY_OWNER, &[Bind::text("owner", canonical(owner))])
                    .await?
            }
            None => self.fetch(sql::TABLES, &[]).await?,
        };
        Ok(tables
            .into_iter()
            .filter(|t| !self.reader.internal_schemas.contains(&t.owner))
            .collect())
    }

    pub async fn table_columns(
        &mut self,
        owner: &str,
        table_name: &str,
    ) -> Result<Vec<ColumnInfo>, AdminError> {
        self.fetch(
            sql::TABLE_COLUMNS,
            &[
                Bind::text("owner", canonical(owner)),
                Bind::text("table_name", canonical(table_name)),
            ],
        )
        .await
    }

    pub async fn profile_exists(&mut self, profile: &str) -> Result<bool, AdminError> {
        let count = self
            .count(
                sql::PROFILE_EXISTS,
                &[Bind::text("profile", canonical(profile))],
            )
            .await?;
        Ok(count > 0)
    }

    pub async fn role_exists(&mut self, role: &str) -> Result<bool, AdminError> {
        let count = self
            .count(sql::ROLE_EXISTS, &[Bind::text("role", canonical(role))])
            .await?;
        Ok(count > 0)
    }

    pub async fn user_exists(&mut self, username: &str) -> Result<bool, AdminError> {
        let count = self
            .count(
                sql::USER_EXISTS,
                &[Bind::text("username", canonical(username))],
            )
            .await?;
        Ok(count > 0)
    }

    pub async fn profiles(&mut self) -> Result<Vec<ProfileSummary>, AdminError> {
        self.fetch(sql::PROFILES, &[]).await
    }

    pub async fn profile_detail(
        &mut self,
        profile: &str,
    ) -> Result<Option<ProfileDetail>, AdminError> {
        let profile = canonical(profile);
        let rows: Vec<ProfileResourceRow> = self
            .fetch(sql::PROFILE_DETAIL, &[Bind::text("profile", profile.clone())])
            .await?;
        if rows.is_empty() {
            return Ok(None);
        }
        Ok(Some(ProfileDetail::from_resources(
            profile.to_string(),
            rows,
        )))
    }

    pub async fn profile_users(&mut self, profile: &str) -> Result<Vec<ProfileUser>, AdminError> {
        self.fetch(
            sql::PROFILE_USERS,
            &[Bind::text("profile", canonical(profile))],
        )
        .await
    }

    pub async fn role_detail(&mut self, role: &str) -> Result<Option<RoleInfo>, AdminError> {
        let mut rows: Vec<RoleInfo> = self
            .fetch(sql::ROLE_DETAIL, &[Bind::text("role", canonical(role))])
            .await?;
        Ok(rows.pop())
    }

    pub async fn role_grantees(&mut self, role: &str) -> Result<Vec<RoleGrantee>, AdminError> {
        self.fetch(sql::ROLE_GRANTEES, &[Bind::text("role", canonical(role))])
            .await
    }

    pub async fn user_detail(&mut self, username: &str) -> Result<Option<UserInfo>, AdminError> {
        let mut rows: Vec<UserInfo> = self
            .fetch(
                sql::USER_DETAIL,
                &[Bind::text("username", canonical(username))],
            )
            .await?;
        Ok(rows.pop())
    }

    pub async fn user_roles(&mut self, username: &str) -> Result<Vec<GrantedRole>, AdminError> {
        self.fetch(
            sql::USER_ROLES,
            &[Bind::text("username", canonical(username))],
        )
        .await
    }

    pub async fn user_quotas(
        &mut self,
        username: &str,
    ) -> Result<Vec<TablespaceQuota>, AdminError> {
        self.fetch(
            sql::USER_QUOTAS,
            &[Bind::text("username", canonical(username))],
        )
        .await
    }

    pub async fn has_direct_system_privilege(
        &mut self,
        principal: &str,
        privilege: &str,
    ) -> Result<bool, AdminError> {
        let count = self
            .count(
                sql::DIRECT_SYSTEM_PRIVILEGE,
                &[
                    Bind::text("principal", canonical(principal)),
                    Bind::text("privilege", privilege),
                ],
            )
            .await?;
        Ok(count > 0)
    }

    /// Roles granted directly to `principal` that themselves hold `privilege`
    /// directly. Role-of-role chains are not followed.
    pub async fn roles_granting_system_privilege(
        &mut self,
        principal: &str,
        privilege: &str,
    ) -> Result<Vec<String>, AdminError> {
        self.names(
            sql::ROLES_GRANTING_SYSTEM_PRIVILEGE,
            &[
                Bind::text("principal", canonical(principal)),
                Bind::text("privilege", privilege),
            ],
        )
        .await
    }
}
