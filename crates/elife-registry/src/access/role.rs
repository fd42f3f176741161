use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Administrator privilege levels, totally ordered by [`AdminRole::rank`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AdminRole {
    SuperAdmin,
    LocalAdmin,
    UserAdmin,
}

impl AdminRole {
    pub const ALL: [AdminRole; 3] = [Self::SuperAdmin, Self::LocalAdmin, Self::UserAdmin];

    pub const fn rank(self) -> u8 {
        match self {
            AdminRole::SuperAdmin => 3,
            AdminRole::LocalAdmin => 2,
            AdminRole::UserAdmin => 1,
        }
    }

    pub const fn label(self) -> &'static str {
        match self {
            AdminRole::SuperAdmin => "super_admin",
            AdminRole::LocalAdmin => "local_admin",
            AdminRole::UserAdmin => "user_admin",
        }
    }

    pub const fn satisfies(self, required: AdminRole) -> bool {
        self.rank() >= required.rank()
    }
}

impl fmt::Display for AdminRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown admin role '{0}'")]
pub struct UnknownRole(pub String);

impl FromStr for AdminRole {
    type Err = UnknownRole;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let normalized = value.trim();
        AdminRole::ALL
            .into_iter()
            .find(|role| role.label().eq_ignore_ascii_case(normalized))
            .ok_or_else(|| UnknownRole(normalized.to_string()))
    }
}

/// Pure role gate: unauthenticated callers never pass.
pub fn check_access(actor: Option<AdminRole>, required: AdminRole) -> bool {
    match actor {
        Some(role) => role.satisfies(required),
        None => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn higher_roles_pass_lower_gates() {
        assert!(check_access(
            Some(AdminRole::SuperAdmin),
            AdminRole::LocalAdmin
        ));
        assert!(check_access(
            Some(AdminRole::LocalAdmin),
            AdminRole::LocalAdmin
        ));
        assert!(!check_access(
            Some(AdminRole::UserAdmin),
            AdminRole::SuperAdmin
        ));
        assert!(!check_access(
            Some(AdminRole::UserAdmin),
            AdminRole::LocalAdmin
        ));
    }

    #[test]
    fn absent_actor_is_always_denied() {
        for required in AdminRole::ALL {
            assert!(!check_access(None, required));
        }
    }

    #[test]
    fn parses_wire_labels() {
        assert_eq!(
            "local_admin".parse::<AdminRole>(),
            Ok(AdminRole::LocalAdmin)
        );
        assert_eq!(
            " SUPER_ADMIN ".parse::<AdminRole>(),
            Ok(AdminRole::SuperAdmin)
        );
        assert_eq!(
            "owner".parse::<AdminRole>(),
            Err(UnknownRole("owner".to_string()))
        );
    }

    #[test]
    fn serde_uses_snake_case_labels() {
        let encoded = serde_json::to_string(&AdminRole::UserAdmin).expect("serializes");
        assert_eq!(encoded, "\"user_admin\"");
    }
}
