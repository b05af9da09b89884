use crate::error::AdminError;
use compact_str::CompactString;
use serde::Serialize;
use std::fmt;

const MAX_PASSWORD_LEN: usize = 128;

/// Unquoted identifier grammar: a letter, then letters, digits, `_`, `$`, `#`.
pub fn validate_identifier(name: &str) -> bool {
    let mut chars = name.chars();
    match chars.next() {
        Some(first) if first.is_ascii_alphabetic() => {}
        _ => return false,
    }
    chars.all(|c| c.is_ascii_alphanumeric() || matches!(c, '_' | '$' | '#'))
}

/// Stricter grammar for names the core itself creates (roles, profiles):
/// a letter, then letters, digits and `_`.
pub fn validate_object_name(name: &str) -> bool {
    validate_identifier(name) && !name.contains(['$', '#'])
}

/// `UNLIMITED`, `DEFAULT` (any case) or a strictly positive base-10 integer.
pub fn validate_resource_limit(value: &str) -> bool {
    parse_limit(value).is_some()
}

fn parse_limit(value: &str) -> Option<ResourceLimit> {
    let value = value.trim();
    if value.eq_ignore_ascii_case("UNLIMITED") {
        return Some(ResourceLimit::Unlimited);
    }
    if value.eq_ignore_ascii_case("DEFAULT") {
        return Some(ResourceLimit::Default);
    }
    positive_integer(value).map(|digits| ResourceLimit::Value(digits.into()))
}

/// Digits of a strictly positive base-10 integer of any magnitude, with an
/// optional leading `+` and leading zeros removed.
fn positive_integer(value: &str) -> Option<&str> {
    let digits = value.strip_prefix('+').unwrap_or(value);
    if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    let significant = digits.trim_start_matches('0');
    (!significant.is_empty()).then_some(significant)
}

/// A validated identifier in canonical upper-case form.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub struct Identifier(CompactString);

impl Identifier {
    pub fn parse(field: &'static str, value: &str) -> Result<Self, AdminError> {
        if !validate_identifier(value) {
            return Err(AdminError::InvalidIdentifier {
                field,
                value: value.to_string(),
            });
        }
        Ok(Self(value.to_ascii_uppercase().into()))
    }

    /// Parses a role or profile name under [`validate_object_name`].
    pub fn parse_object_name(field: &'static str, value: &str) -> Result<Self, AdminError> {
        let ident = Self::parse(field, value)?;
        if !validate_object_name(value) {
            return Err(AdminError::InvalidIdentifier {
                field,
                value: value.to_string(),
            });
        }
        Ok(ident)
    }

    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }
}

impl fmt::Display for Identifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A system privilege name such as `CREATE SESSION` or `SELECT ANY TABLE`:
/// one or more identifier words, upper-cased and joined by single spaces.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct SystemPrivilege(String);

impl SystemPrivilege {
    pub fn parse(value: &str) -> Result<Self, AdminError> {
        let words: Vec<&str> = value.split_whitespace().collect();
        if words.is_empty() {
            return Err(AdminError::MissingOperand("privilege"));
        }
        if !words.iter().all(|w| validate_identifier(w)) {
            return Err(AdminError::InvalidPrivilege {
                class: crate::command::PrivilegeClass::System,
                privilege: value.to_string(),
                allowed: "space-separated identifier words".to_string(),
            });
        }
        Ok(Self(words.join(" ").to_ascii_uppercase()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for SystemPrivilege {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Value of one profile resource limit. `Value` holds canonical digits.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum ResourceLimit {
    Unlimited,
    Default,
    Value(CompactString),
}

impl ResourceLimit {
    pub fn parse(resource: &'static str, value: &str) -> Result<Self, AdminError> {
        parse_limit(value).ok_or_else(|| AdminError::InvalidResourceLimit {
            resource,
            value: value.to_string(),
        })
    }
}

impl fmt::Display for ResourceLimit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ResourceLimit::Unlimited => f.write_str("UNLIMITED"),
            ResourceLimit::Default => f.write_str("DEFAULT"),
            ResourceLimit::Value(digits) => f.write_str(digits),
        }
    }
}

/// Tablespace quota: `UNLIMITED` or a size such as `500K`, `100M`, `2G`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum Quota {
    Unlimited,
    Size { amount: CompactString, unit: Option<char> },
}

impl Quota {
    pub fn parse(value: &str) -> Result<Self, AdminError> {
        let trimmed = value.trim();
        if trimmed.eq_ignore_ascii_case("UNLIMITED") {
            return Ok(Quota::Unlimited);
        }
        let invalid = || AdminError::InvalidQuota {
            value: value.to_string(),
        };
        let (amount, unit) = match trimmed.char_indices().last() {
            Some((at, unit)) if unit.is_ascii_alphabetic() => {
                let unit = unit.to_ascii_uppercase();
                if !QUOTA_UNITS.contains(&unit) {
                    return Err(invalid());
                }
                (&trimmed[..at], Some(unit))
            }
            _ => (trimmed, None),
        };
        let amount = positive_integer(amount).ok_or_else(invalid)?;
        Ok(Quota::Size {
            amount: amount.into(),
            unit,
        })
    }
}

const QUOTA_UNITS: [char; 4] = ['K', 'M', 'G', 'T'];

impl fmt::Display for Quota {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Quota::Unlimited => f.write_str("UNLIMITED"),
            Quota::Size { amount, unit } => {
                f.write_str(amount)?;
                match unit {
                    Some(unit) => write!(f, "{unit}"),
                    None => Ok(()),
                }
            }
        }
    }
}

/// Role or account password, rendered inside a double-quoted literal.
#[derive(Clone, PartialEq, Eq)]
pub struct Password(String);

impl Password {
    pub fn parse(value: &str) -> Result<Self, AdminError> {
        if value.is_empty() {
            return Err(AdminError::InvalidPassword("must not be empty"));
        }
        if value.len() > MAX_PASSWORD_LEN {
            return Err(AdminError::InvalidPassword("must be at most 128 bytes"));
        }
        if value.contains('"') || value.chars().any(char::is_control) {
            return Err(AdminError::InvalidPassword(
                "must not contain double quotes or control characters",
            ));
        }
        Ok(Self(value.to_string()))
    }

    pub(crate) fn expose(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for Password {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Password(<redacted>)")
    }
}
