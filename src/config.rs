use crate::error::AdminError;
use crate::validate::validate_identifier;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

/// Runtime configuration for the administration core.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AdminConfig {
    /// Accounts that bypass permission checks and are hidden from principal
    /// listings.
    pub super_admins: Vec<String>,
    /// Engine-maintained schemas hidden from table listings.
    pub internal_schemas: Vec<String>,
    /// Engine-defined roles that role management refuses to create, alter or
    /// drop.
    pub reserved_roles: Vec<String>,
    pub acquire_timeout_ms: u64,
}

impl Default for AdminConfig {
    fn default() -> Self {
        Self {
            super_admins: to_names(&["SYS", "SYSTEM"]),
            internal_schemas: to_names(&[
                "SYS",
                "SYSTEM",
                "AUDSYS",
                "CTXSYS",
                "DBSNMP",
                "DVSYS",
                "GSMADMIN_INTERNAL",
                "LBACSYS",
                "MDSYS",
                "OJVMSYS",
                "OLAPSYS",
                "ORDDATA",
                "ORDSYS",
                "OUTLN",
                "WMSYS",
                "XDB",
            ]),
            reserved_roles: to_names(&[
                "DBA",
                "CONNECT",
                "RESOURCE",
                "PUBLIC",
                "SELECT_CATALOG_ROLE",
                "EXECUTE_CATALOG_ROLE",
                "DELETE_CATALOG_ROLE",
                "EXP_FULL_DATABASE",
                "IMP_FULL_DATABASE",
                "RECOVERY_CATALOG_OWNER",
                "AQ_ADMINISTRATOR_ROLE",
                "AQ_USER_ROLE",
                "DATAPUMP_EXP_FULL_DATABASE",
                "DATAPUMP_IMP_FULL_DATABASE",
            ]),
            acquire_timeout_ms: 5_000,
        }
    }
}

fn to_names(names: &[&str]) -> Vec<String> {
    names.iter().map(|n| n.to_string()).collect()
}

impl AdminConfig {
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self, AdminError> {
        let raw = std::fs::read(path.as_ref())?;
        let config: Self = serde_json::from_slice(&raw).map_err(|e| AdminError::InvalidConfig {
            message: format!("{}: {e}", path.as_ref().display()),
        })?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), AdminError> {
        if self.acquire_timeout_ms == 0 {
            return Err(AdminError::InvalidConfig {
                message: "acquire_timeout_ms must be > 0".into(),
            });
        }
        let lists = [
            ("super_admins", &self.super_admins),
            ("internal_schemas", &self.internal_schemas),
            ("reserved_roles", &self.reserved_roles),
        ];
        for (field, names) in lists {
            if let Some(bad) = names.iter().find(|n| !validate_identifier(n)) {
                return Err(AdminError::InvalidConfig {
                    message: format!("{field} contains invalid name {bad:?}"),
                });
            }
        }
        Ok(())
    }

    pub fn acquire_timeout(&self) -> Duration {
        Duration::from_millis(self.acquire_timeout_ms)
    }
}

/// Upper-cased set view over one of the configured name lists.
pub(crate) fn name_set(names: &[String]) -> std::collections::BTreeSet<String> {
    names.iter().map(|n| n.to_ascii_uppercase()).collect()
}
