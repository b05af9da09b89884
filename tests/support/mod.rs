// In-memory stand-in for the database engine behind the pool traits. Applies
// the generated GRANT/REVOKE/CREATE/ALTER/DROP text to a small catalog model
// and answers the queries in `grantdesk::catalog::sql` with Oracle-style
// diagnostics.

#![allow(dead_code)]

use async_trait::async_trait;
use grantdesk::catalog::sql;
use grantdesk::config::AdminConfig;
use grantdesk::error::EngineError;
use grantdesk::pool::{Connection, ConnectionPool};
use grantdesk::row::{Bind, Row, Value};
use grantdesk::{AdminCore, COMMON_SYSTEM_PRIVILEGES};
use parking_lot::Mutex;
use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

const EXTRA_SYSTEM_PRIVILEGES: &[&str] = &[
    "ALTER ANY ROLE",
    "ALTER SYSTEM",
    "CREATE ANY TABLE",
    "GRANT ANY OBJECT PRIVILEGE",
    "GRANT ANY PRIVILEGE",
];

const MANAGED_RESOURCES: [&str; 3] = ["SESSIONS_PER_USER", "CONNECT_TIME", "IDLE_TIME"];

const PERMANENT_TABLESPACES: [&str; 3] = ["SYSTEM", "SYSAUX", "USERS"];
const TEMPORARY_TABLESPACES: [&str; 1] = ["TEMP"];

#[derive(Clone)]
struct Account {
    status: String,
    profile: String,
    password: Option<String>,
    default_tablespace: String,
    temporary_tablespace: String,
    // tablespace -> quota as written in the command
    quotas: BTreeMap<String, String>,
}

impl Account {
    fn open(profile: &str) -> Self {
        Self {
            status: "OPEN".into(),
            profile: profile.into(),
            password: None,
            default_tablespace: "USERS".into(),
            temporary_tablespace: "TEMP".into(),
            quotas: BTreeMap::new(),
        }
    }
}

enum UserClause {
    DefaultTablespace(String),
    TemporaryTablespace(String),
    Quota { quota: String, tablespace: String },
    Profile(String),
    Lock,
    Unlock,
}

#[derive(Default)]
struct Catalog {
    system_privileges: BTreeSet<String>,
    users: BTreeMap<String, Account>,
    // role -> password
    roles: BTreeMap<String, Option<String>>,
    // (grantee, privilege) -> admin option
    sys_privs: BTreeMap<(String, String), bool>,
    // (grantee, role) -> admin option
    role_grants: BTreeMap<(String, String), bool>,
    // (owner, table) -> [(column, data_type, nullable)]
    tables: BTreeMap<(String, String), Vec<(String, String, bool)>>,
    // (grantee, owner, table, privilege) -> grantable
    tab_privs: BTreeMap<(String, String, String, String), bool>,
    // (grantee, owner, table, column, privilege)
    col_privs: BTreeSet<(String, String, String, String, String)>,
    // profile -> resource -> limit
    profiles: BTreeMap<String, BTreeMap<String, String>>,
}

#[derive(Default)]
struct State {
    catalog: Catalog,
    executed: Vec<String>,
    queries: Vec<String>,
    offline: bool,
    next_execute_error: Option<EngineError>,
    next_query_error: Option<EngineError>,
    commits: usize,
    rollbacks: usize,
}

struct Shared {
    state: Mutex<State>,
    acquired: AtomicUsize,
    released: AtomicUsize,
}

#[derive(Clone)]
pub struct FakeEngine {
    shared: Arc<Shared>,
}

impl FakeEngine {
    /// Engine with the DEFAULT profile, the SYS/SYSTEM accounts, the DBA,
    /// CONNECT and RESOURCE roles and one internal SYS table.
    pub fn new() -> Self {
        let mut catalog = Catalog::default();
        catalog.system_privileges = COMMON_SYSTEM_PRIVILEGES
            .iter()
            .chain(EXTRA_SYSTEM_PRIVILEGES)
            .map(|p| p.to_string())
            .collect();
        catalog.profiles.insert(
            "DEFAULT".into(),
            MANAGED_RESOURCES
                .iter()
                .map(|r| (r.to_string(), "UNLIMITED".to_string()))
                .collect(),
        );
        for user in ["SYS", "SYSTEM"] {
            let mut account = Account::open("DEFAULT");
            account.default_tablespace = "SYSTEM".into();
            catalog.users.insert(user.into(), account);
        }
        for role in ["DBA", "CONNECT", "RESOURCE"] {
            catalog.roles.insert(role.into(), None);
        }
        catalog.tables.insert(
            ("SYS".into(), "OBJ$".into()),
            vec![("OBJ#".into(), "NUMBER".into(), false)],
        );
        Self {
            shared: Arc::new(Shared {
                state: Mutex::new(State {
                    catalog,
                    ..State::default()
                }),
                acquired: AtomicUsize::new(0),
                released: AtomicUsize::new(0),
            }),
        }
    }

    pub fn with_user(self, name: &str) -> Self {
        self.shared
            .state
            .lock()
            .catalog
            .users
            .insert(name.into(), Account::open("DEFAULT"));
        self
    }

    pub fn with_role(self, name: &str) -> Self {
        self.shared.state.lock().catalog.roles.insert(name.into(), None);
        self
    }

    pub fn with_table(self, owner: &str, table: &str, columns: &[(&str, &str, bool)]) -> Self {
        let columns = columns
            .iter()
            .map(|(c, t, n)| (c.to_string(), t.to_string(), *n))
            .collect();
        self.shared
            .state
            .lock()
            .catalog
            .tables
            .insert((owner.into(), table.into()), columns);
        self
    }

    pub fn with_system_grant(self, grantee: &str, privilege: &str) -> Self {
        self.shared
            .state
            .lock()
            .catalog
            .sys_privs
            .insert((grantee.into(), privilege.into()), false);
        self
    }

    pub fn with_role_grant(self, grantee: &str, role: &str) -> Self {
        self.shared
            .state
            .lock()
            .catalog
            .role_grants
            .insert((grantee.into(), role.into()), false);
        self
    }

    pub fn with_profile(self, name: &str, limits: &[(&str, &str)]) -> Self {
        self.shared.state.lock().catalog.profiles.insert(
            name.into(),
            limits
                .iter()
                .map(|(r, l)| (r.to_string(), l.to_string()))
                .collect(),
        );
        self
    }

    pub fn with_user_profile(self, user: &str, profile: &str) -> Self {
        self.shared
            .state
            .lock()
            .catalog
            .users
            .insert(user.into(), Account::open(profile));
        self
    }

    pub fn with_user_quota(self, user: &str, tablespace: &str, quota: &str) -> Self {
        if let Some(account) = self.shared.state.lock().catalog.users.get_mut(user) {
            account.quotas.insert(tablespace.into(), quota.into());
        }
        self
    }

    pub fn set_offline(&self, offline: bool) {
        self.shared.state.lock().offline = offline;
    }

    pub fn fail_next_execute(&self, err: EngineError) {
        self.shared.state.lock().next_execute_error = Some(err);
    }

    pub fn fail_next_query(&self, err: EngineError) {
        self.shared.state.lock().next_query_error = Some(err);
    }

    pub fn executed(&self) -> Vec<String> {
        self.shared.state.lock().executed.clone()
    }

    pub fn query_count(&self) -> usize {
        self.shared.state.lock().queries.len()
    }

    pub fn acquired(&self) -> usize {
        self.shared.acquired.load(Ordering::SeqCst)
    }

    pub fn released(&self) -> usize {
        self.shared.released.load(Ordering::SeqCst)
    }

    pub fn commits(&self) -> usize {
        self.shared.state.lock().commits
    }

    pub fn rollbacks(&self) -> usize {
        self.shared.state.lock().rollbacks
    }

    pub fn has_system_grant(&self, grantee: &str, privilege: &str) -> bool {
        self.shared
            .state
            .lock()
            .catalog
            .sys_privs
            .contains_key(&(grantee.into(), privilege.into()))
    }

    pub fn has_role_grant(&self, grantee: &str, role: &str) -> bool {
        self.shared
            .state
            .lock()
            .catalog
            .role_grants
            .contains_key(&(grantee.into(), role.into()))
    }

    pub fn object_grant(
        &self,
        grantee: &str,
        owner: &str,
        table: &str,
        privilege: &str,
    ) -> Option<bool> {
        self.shared
            .state
            .lock()
            .catalog
            .tab_privs
            .get(&(grantee.into(), owner.into(), table.into(), privilege.into()))
            .copied()
    }

    pub fn has_column_grant(
        &self,
        grantee: &str,
        owner: &str,
        table: &str,
        column: &str,
        privilege: &str,
    ) -> bool {
        self.shared.state.lock().catalog.col_privs.contains(&(
            grantee.into(),
            owner.into(),
            table.into(),
            column.into(),
            privilege.into(),
        ))
    }

    pub fn role_password(&self, role: &str) -> Option<Option<String>> {
        self.shared.state.lock().catalog.roles.get(role).cloned()
    }

    pub fn profile_limit(&self, profile: &str, resource: &str) -> Option<String> {
        self.shared
            .state
            .lock()
            .catalog
            .profiles
            .get(profile)
            .and_then(|limits| limits.get(resource).cloned())
    }

    pub fn user_profile(&self, user: &str) -> Option<String> {
        self.shared
            .state
            .lock()
            .catalog
            .users
            .get(user)
            .map(|account| account.profile.clone())
    }

    pub fn has_user(&self, user: &str) -> bool {
        self.shared.state.lock().catalog.users.contains_key(user)
    }

    pub fn has_table(&self, owner: &str, table: &str) -> bool {
        self.shared
            .state
            .lock()
            .catalog
            .tables
            .contains_key(&(owner.into(), table.into()))
    }

    pub fn user_status(&self, user: &str) -> Option<String> {
        self.shared
            .state
            .lock()
            .catalog
            .users
            .get(user)
            .map(|account| account.status.clone())
    }

    pub fn user_password(&self, user: &str) -> Option<String> {
        self.shared
            .state
            .lock()
            .catalog
            .users
            .get(user)
            .and_then(|account| account.password.clone())
    }

    /// (default, temporary) tablespace of an account.
    pub fn user_tablespaces(&self, user: &str) -> Option<(String, String)> {
        self.shared
            .state
            .lock()
            .catalog
            .users
            .get(user)
            .map(|account| {
                (
                    account.default_tablespace.clone(),
                    account.temporary_tablespace.clone(),
                )
            })
    }

    pub fn user_quota(&self, user: &str, tablespace: &str) -> Option<String> {
        self.shared
            .state
            .lock()
            .catalog
            .users
            .get(user)
            .and_then(|account| account.quotas.get(tablespace).cloned())
    }
}

/// An [`AdminCore`] over `engine` with the default configuration.
pub fn admin_core(engine: &FakeEngine) -> AdminCore {
    AdminCore::new(Arc::new(engine.clone()), AdminConfig::default()).expect("admin core")
}

#[async_trait]
impl ConnectionPool for FakeEngine {
    async fn acquire(&self) -> Result<Box<dyn Connection>, EngineError> {
        if self.shared.state.lock().offline {
            return Err(EngineError::connectivity(
                "ORA-12541: TNS:no listener",
            ));
        }
        self.shared.acquired.fetch_add(1, Ordering::SeqCst);
        Ok(Box::new(FakeConnection {
            shared: Arc::clone(&self.shared),
        }))
    }

    fn release(&self, _conn: Box<dyn Connection>) {
        self.shared.released.fetch_add(1, Ordering::SeqCst);
    }
}

struct FakeConnection {
    shared: Arc<Shared>,
}

#[async_trait]
impl Connection for FakeConnection {
    async fn execute(&mut self, command: &str) -> Result<(), EngineError> {
        let mut state = self.shared.state.lock();
        state.executed.push(command.to_string());
        if let Some(err) = state.next_execute_error.take() {
            return Err(err);
        }
        state.catalog.apply(command)
    }

    async fn query(&mut self, sql: &str, binds: &[Bind]) -> Result<Vec<Row>, EngineError> {
        let mut state = self.shared.state.lock();
        state.queries.push(sql.to_string());
        if let Some(err) = state.next_query_error.take() {
            return Err(err);
        }
        state.catalog.answer(sql, binds)
    }

    async fn commit(&mut self) -> Result<(), EngineError> {
        self.shared.state.lock().commits += 1;
        Ok(())
    }

    async fn rollback(&mut self) -> Result<(), EngineError> {
        self.shared.state.lock().rollbacks += 1;
        Ok(())
    }
}

fn rejected(message: String) -> EngineError {
    EngineError::rejected(message)
}

fn strip_option<'a>(body: &'a str, clause: &str) -> (&'a str, bool) {
    match body.strip_suffix(clause) {
        Some(stripped) => (stripped, true),
        None => (body, false),
    }
}

fn syntax_error(command: &str) -> EngineError {
    rejected(format!("ORA-00900: invalid SQL statement: {command}"))
}

impl Catalog {
    fn apply(&mut self, command: &str) -> Result<(), EngineError> {
        if let Some(body) = command.strip_prefix("GRANT ") {
            return self.grant(body).ok_or_else(|| syntax_error(command))?;
        }
        if let Some(body) = command.strip_prefix("REVOKE ") {
            return self.revoke(body).ok_or_else(|| syntax_error(command))?;
        }
        if let Some(body) = command.strip_prefix("CREATE ROLE ") {
            let (name, auth) = body.split_once(' ').ok_or_else(|| syntax_error(command))?;
            let password = parse_role_auth(auth).ok_or_else(|| syntax_error(command))?;
            return self.create_role(name, password);
        }
        if let Some(body) = command.strip_prefix("ALTER ROLE ") {
            let (name, auth) = body.split_once(' ').ok_or_else(|| syntax_error(command))?;
            let password = parse_role_auth(auth).ok_or_else(|| syntax_error(command))?;
            return match self.roles.get_mut(name) {
                Some(stored) => {
                    *stored = password;
                    Ok(())
                }
                None => Err(rejected(format!("ORA-01919: role '{name}' does not exist"))),
            };
        }
        if let Some(body) = command.strip_prefix("CREATE USER ") {
            let (name, rest) = body.split_once(' ').ok_or_else(|| syntax_error(command))?;
            let (password, clauses) = parse_user_body(rest).ok_or_else(|| syntax_error(command))?;
            let password = password.ok_or_else(|| syntax_error(command))?;
            return self.create_user(name, password, clauses);
        }
        if let Some(body) = command.strip_prefix("ALTER USER ") {
            let (name, rest) = body.split_once(' ').ok_or_else(|| syntax_error(command))?;
            let (password, clauses) = parse_user_body(rest).ok_or_else(|| syntax_error(command))?;
            return self.alter_user(name, password, clauses);
        }
        let words: Vec<&str> = command.split_whitespace().collect();
        match words.as_slice() {
            ["DROP", "USER", name] => self.drop_user(name, false),
            ["DROP", "USER", name, "CASCADE"] => self.drop_user(name, true),
            ["DROP", "ROLE", name] => self.drop_role(name),
            ["CREATE", "PROFILE", name, "LIMIT", limits @ ..] => {
                if self.profiles.contains_key(*name) {
                    return Err(rejected(format!("ORA-02379: profile {name} already exists")));
                }
                let mut resources: BTreeMap<String, String> = MANAGED_RESOURCES
                    .iter()
                    .map(|r| (r.to_string(), "DEFAULT".to_string()))
                    .collect();
                for pair in limits.chunks(2) {
                    let [resource, limit] = pair else {
                        return Err(syntax_error(command));
                    };
                    resources.insert(resource.to_string(), limit.to_string());
                }
                self.profiles.insert(name.to_string(), resources);
                Ok(())
            }
            ["ALTER", "PROFILE", name, "LIMIT", limits @ ..] => {
                let Some(resources) = self.profiles.get_mut(*name) else {
                    return Err(rejected(format!("ORA-02380: profile {name} does not exist")));
                };
                for pair in limits.chunks(2) {
                    let [resource, limit] = pair else {
                        return Err(syntax_error(command));
                    };
                    resources.insert(resource.to_string(), limit.to_string());
                }
                Ok(())
            }
            ["DROP", "PROFILE", name] => self.drop_profile(name, false),
            ["DROP", "PROFILE", name, "CASCADE"] => self.drop_profile(name, true),
            _ => Err(syntax_error(command)),
        }
    }

    fn require_grantee(&self, grantee: &str) -> Result<(), EngineError> {
        if self.users.contains_key(grantee) || self.roles.contains_key(grantee) {
            Ok(())
        } else {
            Err(rejected(format!(
                "ORA-01917: user or role '{grantee}' does not exist"
            )))
        }
    }

    fn require_table(&self, object: &str) -> Result<(String, String), EngineError> {
        let missing = || rejected("ORA-00942: table or view does not exist".to_string());
        let (owner, table) = object.split_once('.').ok_or_else(missing)?;
        let key = (owner.to_string(), table.to_string());
        if self.tables.contains_key(&key) {
            Ok(key)
        } else {
            Err(missing())
        }
    }

    fn require_columns(
        &self,
        key: &(String, String),
        columns: &str,
    ) -> Result<Vec<String>, EngineError> {
        let known = self.tables.get(key).map(Vec::as_slice).unwrap_or_default();
        columns
            .split(',')
            .map(|column| {
                if known.iter().any(|(c, _, _)| c == column) {
                    Ok(column.to_string())
                } else {
                    Err(rejected(format!("ORA-00904: \"{column}\": invalid identifier")))
                }
            })
            .collect()
    }

    fn grant(&mut self, body: &str) -> Option<Result<(), EngineError>> {
        let (body, with_admin) = strip_option(body, " WITH ADMIN OPTION");
        let (body, with_grant) = strip_option(body, " WITH GRANT OPTION");
        let (what, grantee) = body.rsplit_once(" TO ")?;
        Some(self.apply_grant(what, grantee, with_admin, with_grant))
    }

    fn apply_grant(
        &mut self,
        what: &str,
        grantee: &str,
        with_admin: bool,
        with_grant: bool,
    ) -> Result<(), EngineError> {
        self.require_grantee(grantee)?;
        if let Some((privileges, object)) = what.split_once(" ON ") {
            let (owner, table) = self.require_table(object)?;
            match privileges.split_once('(') {
                Some((privilege, columns)) => {
                    let columns = columns.strip_suffix(')').unwrap_or(columns);
                    for column in self.require_columns(&(owner.clone(), table.clone()), columns)? {
                        self.col_privs.insert((
                            grantee.into(),
                            owner.clone(),
                            table.clone(),
                            column,
                            privilege.into(),
                        ));
                    }
                }
                None => {
                    let grantable = self
                        .tab_privs
                        .entry((grantee.into(), owner, table, privileges.into()))
                        .or_insert(false);
                    *grantable |= with_grant;
                }
            }
            return Ok(());
        }
        if self.roles.contains_key(what) {
            let admin = self
                .role_grants
                .entry((grantee.into(), what.into()))
                .or_insert(false);
            *admin |= with_admin;
            return Ok(());
        }
        if self.system_privileges.contains(what) {
            let admin = self
                .sys_privs
                .entry((grantee.into(), what.into()))
                .or_insert(false);
            *admin |= with_admin;
            return Ok(());
        }
        if what.contains(' ') {
            Err(rejected("ORA-00990: missing or invalid privilege".to_string()))
        } else {
            Err(rejected(format!("ORA-01919: role '{what}' does not exist")))
        }
    }

    fn revoke(&mut self, body: &str) -> Option<Result<(), EngineError>> {
        let (what, grantee) = body.rsplit_once(" FROM ")?;
        Some(self.apply_revoke(what, grantee))
    }

    fn apply_revoke(&mut self, what: &str, grantee: &str) -> Result<(), EngineError> {
        self.require_grantee(grantee)?;
        let not_granted =
            || rejected("ORA-01927: cannot REVOKE privileges you did not grant".to_string());
        if let Some((privileges, object)) = what.split_once(" ON ") {
            let (owner, table) = self.require_table(object)?;
            return match privileges.split_once('(') {
                Some((privilege, columns)) => {
                    let columns = columns.strip_suffix(')').unwrap_or(columns);
                    let mut removed = false;
                    for column in self.require_columns(&(owner.clone(), table.clone()), columns)? {
                        removed |= self.col_privs.remove(&(
                            grantee.into(),
                            owner.clone(),
                            table.clone(),
                            column,
                            privilege.into(),
                        ));
                    }
                    if removed {
                        Ok(())
                    } else {
                        Err(not_granted())
                    }
                }
                None => self
                    .tab_privs
                    .remove(&(grantee.into(), owner, table, privileges.into()))
                    .map(|_| ())
                    .ok_or_else(not_granted),
            };
        }
        if self.roles.contains_key(what) {
            return self
                .role_grants
                .remove(&(grantee.into(), what.into()))
                .map(|_| ())
                .ok_or_else(|| {
                    rejected(format!("ORA-01951: ROLE '{what}' not granted to '{grantee}'"))
                });
        }
        if self.system_privileges.contains(what) {
            return self
                .sys_privs
                .remove(&(grantee.into(), what.into()))
                .map(|_| ())
                .ok_or_else(|| {
                    rejected(format!(
                        "ORA-01952: system privileges not granted to '{grantee}'"
                    ))
                });
        }
        if what.contains(' ') {
            Err(rejected("ORA-00990: missing or invalid privilege".to_string()))
        } else {
            Err(rejected(format!("ORA-01919: role '{what}' does not exist")))
        }
    }

    fn create_role(&mut self, name: &str, password: Option<String>) -> Result<(), EngineError> {
        if self.roles.contains_key(name) || self.users.contains_key(name) {
            return Err(rejected(format!(
                "ORA-01921: role name '{name}' conflicts with another user or role name"
            )));
        }
        self.roles.insert(name.into(), password);
        Ok(())
    }

    fn drop_role(&mut self, name: &str) -> Result<(), EngineError> {
        if self.roles.remove(name).is_none() {
            return Err(rejected(format!("ORA-01919: role '{name}' does not exist")));
        }
        self.role_grants
            .retain(|(grantee, role), _| grantee != name && role != name);
        self.sys_privs.retain(|(grantee, _), _| grantee != name);
        self.tab_privs.retain(|(grantee, ..), _| grantee != name);
        self.col_privs.retain(|(grantee, ..)| grantee != name);
        Ok(())
    }

    fn require_user(&mut self, name: &str) -> Result<&mut Account, EngineError> {
        self.users
            .get_mut(name)
            .ok_or_else(|| rejected(format!("ORA-01918: user '{name}' does not exist")))
    }

    fn check_default_tablespace(tablespace: &str) -> Result<(), EngineError> {
        if TEMPORARY_TABLESPACES.contains(&tablespace) {
            return Err(rejected(
                "ORA-12910: cannot specify temporary tablespace as default tablespace".to_string(),
            ));
        }
        Self::check_tablespace_exists(tablespace)
    }

    fn check_temporary_tablespace(tablespace: &str) -> Result<(), EngineError> {
        if PERMANENT_TABLESPACES.contains(&tablespace) {
            return Err(rejected(
                "ORA-12911: permanent tablespace cannot be temporary tablespace".to_string(),
            ));
        }
        Self::check_tablespace_exists(tablespace)
    }

    fn check_tablespace_exists(tablespace: &str) -> Result<(), EngineError> {
        if PERMANENT_TABLESPACES.contains(&tablespace) || TEMPORARY_TABLESPACES.contains(&tablespace)
        {
            Ok(())
        } else {
            Err(rejected(format!(
                "ORA-00959: tablespace '{tablespace}' does not exist"
            )))
        }
    }

    fn apply_user_clause(
        &self,
        account: &mut Account,
        clause: UserClause,
    ) -> Result<(), EngineError> {
        match clause {
            UserClause::DefaultTablespace(tablespace) => {
                Self::check_default_tablespace(&tablespace)?;
                account.default_tablespace = tablespace;
            }
            UserClause::TemporaryTablespace(tablespace) => {
                Self::check_temporary_tablespace(&tablespace)?;
                account.temporary_tablespace = tablespace;
            }
            UserClause::Quota { quota, tablespace } => {
                Self::check_tablespace_exists(&tablespace)?;
                account.quotas.insert(tablespace, quota);
            }
            UserClause::Profile(profile) => {
                if !self.profiles.contains_key(&profile) {
                    return Err(rejected(format!("ORA-02380: profile {profile} does not exist")));
                }
                account.profile = profile;
            }
            UserClause::Lock => account.status = "LOCKED".into(),
            UserClause::Unlock => account.status = "OPEN".into(),
        }
        Ok(())
    }

    fn create_user(
        &mut self,
        name: &str,
        password: String,
        clauses: Vec<UserClause>,
    ) -> Result<(), EngineError> {
        if self.users.contains_key(name) || self.roles.contains_key(name) {
            return Err(rejected(format!(
                "ORA-01920: user name '{name}' conflicts with another user or role name"
            )));
        }
        let mut account = Account::open("DEFAULT");
        account.password = Some(password);
        for clause in clauses {
            self.apply_user_clause(&mut account, clause)?;
        }
        self.users.insert(name.into(), account);
        Ok(())
    }

    fn alter_user(
        &mut self,
        name: &str,
        password: Option<String>,
        clauses: Vec<UserClause>,
    ) -> Result<(), EngineError> {
        let mut account = self.require_user(name)?.clone();
        if password.is_some() {
            account.password = password;
        }
        for clause in clauses {
            self.apply_user_clause(&mut account, clause)?;
        }
        self.users.insert(name.into(), account);
        Ok(())
    }

    fn drop_user(&mut self, name: &str, cascade: bool) -> Result<(), EngineError> {
        self.require_user(name)?;
        let owns_objects = self.tables.keys().any(|(owner, _)| owner == name);
        if owns_objects && !cascade {
            return Err(rejected(format!(
                "ORA-01922: CASCADE must be specified to drop '{name}'"
            )));
        }
        self.tables.retain(|(owner, _), _| owner != name);
        self.users.remove(name);
        self.role_grants.retain(|(grantee, _), _| grantee != name);
        self.sys_privs.retain(|(grantee, _), _| grantee != name);
        self.tab_privs
            .retain(|(grantee, owner, ..), _| grantee != name && owner != name);
        self.col_privs
            .retain(|(grantee, owner, ..)| grantee != name && owner != name);
        Ok(())
    }

    fn drop_profile(&mut self, name: &str, cascade: bool) -> Result<(), EngineError> {
        if name == "DEFAULT" {
            return Err(rejected("ORA-02381: cannot drop PUBLIC_DEFAULT profile".to_string()));
        }
        if !self.profiles.contains_key(name) {
            return Err(rejected(format!("ORA-02380: profile {name} does not exist")));
        }
        let assigned = self.users.values().any(|account| account.profile == name);
        if assigned && !cascade {
            return Err(rejected(format!(
                "ORA-02382: profile {name} has users assigned, cannot drop without CASCADE"
            )));
        }
        for account in self.users.values_mut() {
            if account.profile == name {
                account.profile = "DEFAULT".into();
            }
        }
        self.profiles.remove(name);
        Ok(())
    }

    fn answer(&self, query: &str, binds: &[Bind]) -> Result<Vec<Row>, EngineError> {
        let rows: Vec<Row> = match query {
            sql::SYSTEM_PRIVILEGES => self
                .system_privileges
                .iter()
                .map(|p| row(vec![text(p)]))
                .collect(),
            sql::ROLES => self.roles.keys().map(|r| self.role_row(r)).collect(),
            sql::ROLE_DETAIL => {
                let role = bind(binds, "role");
                if self.roles.contains_key(role) {
                    vec![self.role_row(role)]
                } else {
                    Vec::new()
                }
            }
            sql::ROLE_EXISTS => count(self.roles.contains_key(bind(binds, "role")) as usize),
            sql::ROLE_GRANTEES => {
                let role = bind(binds, "role");
                self.role_grants
                    .iter()
                    .filter(|((_, r), _)| r == role)
                    .map(|((grantee, _), admin)| {
                        row(vec![text(grantee), yes_no(*admin), text("YES")])
                    })
                    .collect()
            }
            sql::PRINCIPALS => self
                .users
                .iter()
                .map(|(name, account)| {
                    row(vec![text(name), text(&account.status), text(&account.profile)])
                })
                .collect(),
            sql::GRANTEE_PRIVILEGES => {
                let grantee = bind(binds, "grantee");
                let system = self
                    .sys_privs
                    .iter()
                    .filter(|((g, _), _)| g == grantee)
                    .map(|((_, p), admin)| row(vec![text(p), text("SYSTEM"), yes_no(*admin)]));
                let roles = self
                    .role_grants
                    .iter()
                    .filter(|((g, _), _)| g == grantee)
                    .map(|((_, r), admin)| row(vec![text(r), text("ROLE"), yes_no(*admin)]));
                system.chain(roles).collect()
            }
            sql::OBJECT_PRIVILEGES => {
                let grantee = bind(binds, "grantee");
                self.tab_privs
                    .iter()
                    .filter(|((g, ..), _)| g == grantee)
                    .map(|((_, owner, table, privilege), grantable)| {
                        row(vec![text(owner), text(table), text(privilege), yes_no(*grantable)])
                    })
                    .collect()
            }
            sql::COLUMN_PRIVILEGES => {
                let grantee = bind(binds, "grantee");
                self.col_privs
                    .iter()
                    .filter(|(g, ..)| g == grantee)
                    .map(|(_, owner, table, column, privilege)| {
                        row(vec![
                            text(owner),
                            text(table),
                            text(column),
                            text(privilege),
                            text("NO"),
                        ])
                    })
                    .collect()
            }
            sql::TABLES => self
                .tables
                .keys()
                .map(|(owner, table)| row(vec![text(owner), text(table)]))
                .collect(),
            sql::TABLES_BY_OWNER => {
                let owner = bind(binds, "owner");
                self.tables
                    .keys()
                    .filter(|(o, _)| o == owner)
                    .map(|(owner, table)| row(vec![text(owner), text(table)]))
                    .collect()
            }
            sql::TABLE_COLUMNS => {
                let key = (
                    bind(binds, "owner").to_string(),
                    bind(binds, "table_name").to_string(),
                );
                self.tables
                    .get(&key)
                    .map(|columns| {
                        columns
                            .iter()
                            .map(|(c, t, nullable)| {
                                row(vec![text(c), text(t), text(if *nullable { "Y" } else { "N" })])
                            })
                            .collect()
                    })
                    .unwrap_or_default()
            }
            sql::PROFILES => self
                .profiles
                .iter()
                .map(|(name, limits)| {
                    let limit = |r: &str| limits.get(r).map_or(Value::Null, |l| text(l));
                    row(vec![
                        text(name),
                        limit("SESSIONS_PER_USER"),
                        limit("CONNECT_TIME"),
                        limit("IDLE_TIME"),
                        Value::Integer(self.users_with_profile(name).len() as i64),
                    ])
                })
                .collect(),
            sql::PROFILE_DETAIL => self
                .profiles
                .get(bind(binds, "profile"))
                .map(|limits| {
                    limits
                        .iter()
                        .map(|(r, l)| row(vec![text(r), text("KERNEL"), text(l)]))
                        .collect()
                })
                .unwrap_or_default(),
            sql::PROFILE_EXISTS => count(self.profiles.contains_key(bind(binds, "profile")) as usize),
            sql::PROFILE_USERS => self
                .users_with_profile(bind(binds, "profile"))
                .into_iter()
                .map(|(name, status)| row(vec![text(&name), text(&status)]))
                .collect(),
            sql::USER_DETAIL => {
                let username = bind(binds, "username");
                self.users
                    .get(username)
                    .map(|account| {
                        let lock_date = if account.status == "LOCKED" {
                            text("2026-01-01")
                        } else {
                            Value::Null
                        };
                        vec![row(vec![
                            text(username),
                            text(&account.status),
                            text(&account.default_tablespace),
                            text(&account.temporary_tablespace),
                            text(&account.profile),
                            Value::Null,
                            lock_date,
                        ])]
                    })
                    .unwrap_or_default()
            }
            sql::USER_EXISTS => count(self.users.contains_key(bind(binds, "username")) as usize),
            sql::USER_ROLES => {
                let username = bind(binds, "username");
                self.role_grants
                    .iter()
                    .filter(|((g, _), _)| g == username)
                    .map(|((_, role), admin)| row(vec![text(role), yes_no(*admin), text("YES")]))
                    .collect()
            }
            sql::USER_QUOTAS => self
                .users
                .get(bind(binds, "username"))
                .map(|account| {
                    account
                        .quotas
                        .iter()
                        .map(|(tablespace, quota)| {
                            row(vec![
                                text(tablespace),
                                Value::Integer(0),
                                Value::Integer(quota_bytes(quota)),
                            ])
                        })
                        .collect::<Vec<_>>()
                })
                .unwrap_or_default(),
            sql::DIRECT_SYSTEM_PRIVILEGE => {
                let key = (
                    bind(binds, "principal").to_string(),
                    bind(binds, "privilege").to_string(),
                );
                count(self.sys_privs.contains_key(&key) as usize)
            }
            sql::ROLES_GRANTING_SYSTEM_PRIVILEGE => {
                let principal = bind(binds, "principal");
                let privilege = bind(binds, "privilege");
                self.role_grants
                    .keys()
                    .filter(|(g, role)| {
                        g == principal
                            && self
                                .sys_privs
                                .contains_key(&(role.clone(), privilege.to_string()))
                    })
                    .map(|(_, role)| row(vec![text(role)]))
                    .collect()
            }
            _ => {
                return Err(rejected(
                    "ORA-00942: table or view does not exist".to_string(),
                ));
            }
        };
        Ok(rows)
    }

    fn role_row(&self, role: &str) -> Row {
        let password = self.roles.get(role).cloned().flatten();
        let grantees = self.role_grants.keys().filter(|(_, r)| r == role).count();
        row(vec![
            text(role),
            yes_no(password.is_some()),
            text(if password.is_some() { "PASSWORD" } else { "NONE" }),
            Value::Integer(grantees as i64),
        ])
    }

    fn users_with_profile(&self, profile: &str) -> Vec<(String, String)> {
        self.users
            .iter()
            .filter(|(_, account)| account.profile == profile)
            .map(|(name, account)| (name.clone(), account.status.clone()))
            .collect()
    }
}

fn parse_role_auth(auth: &str) -> Option<Option<String>> {
    if auth == "NOT IDENTIFIED" {
        return Some(None);
    }
    auth.strip_prefix("IDENTIFIED BY \"")
        .and_then(|rest| rest.strip_suffix('"'))
        .map(|password| Some(password.to_string()))
}

/// Splits `[IDENTIFIED BY "<pw>"] <clauses>` of CREATE/ALTER USER.
fn parse_user_body(body: &str) -> Option<(Option<String>, Vec<UserClause>)> {
    let (password, rest) = match body.strip_prefix("IDENTIFIED BY \"") {
        Some(rest) => {
            let (password, rest) = rest.split_once('"')?;
            (Some(password.to_string()), rest)
        }
        None => (None, body),
    };
    let mut tokens = rest.split_whitespace();
    let mut clauses = Vec::new();
    while let Some(token) = tokens.next() {
        let clause = match (token, tokens.next()?) {
            ("DEFAULT", "TABLESPACE") => UserClause::DefaultTablespace(tokens.next()?.into()),
            ("TEMPORARY", "TABLESPACE") => UserClause::TemporaryTablespace(tokens.next()?.into()),
            ("QUOTA", quota) => {
                if tokens.next()? != "ON" {
                    return None;
                }
                UserClause::Quota {
                    quota: quota.into(),
                    tablespace: tokens.next()?.into(),
                }
            }
            ("PROFILE", profile) => UserClause::Profile(profile.into()),
            ("ACCOUNT", "LOCK") => UserClause::Lock,
            ("ACCOUNT", "UNLOCK") => UserClause::Unlock,
            _ => return None,
        };
        clauses.push(clause);
    }
    Some((password, clauses))
}

fn quota_bytes(quota: &str) -> i64 {
    if quota == "UNLIMITED" {
        return -1;
    }
    let (digits, multiplier) = match quota.chars().last() {
        Some('K') => (&quota[..quota.len() - 1], 1_i64 << 10),
        Some('M') => (&quota[..quota.len() - 1], 1 << 20),
        Some('G') => (&quota[..quota.len() - 1], 1 << 30),
        Some('T') => (&quota[..quota.len() - 1], 1 << 40),
        _ => (quota, 1),
    };
    digits.parse::<i64>().unwrap_or(0).saturating_mul(multiplier)
}

fn bind<'a>(binds: &'a [Bind], name: &str) -> &'a str {
    binds
        .iter()
        .find(|b| b.name == name)
        .and_then(|b| match &b.value {
            Value::Text(v) => Some(v.as_str()),
            _ => None,
        })
        .unwrap_or_default()
}

fn row(values: Vec<Value>) -> Row {
    Row::from_values(values)
}

fn text(value: &str) -> Value {
    Value::text(value)
}

fn yes_no(flag: bool) -> Value {
    text(if flag { "YES" } else { "NO" })
}

fn count(n: usize) -> Vec<Row> {
    vec![row(vec![Value::Integer(n as i64)])]
}
