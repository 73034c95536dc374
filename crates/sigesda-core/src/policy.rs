//! Creation policy: which status a new reservation starts in.

use serde::{Deserialize, Serialize};

use crate::models::{ReservationStatus, Role};

/// Decides the initial status of a new reservation from the requester's role.
///
/// Reservations made by a role in `auto_confirm_roles` start Confirmed, all
/// others start Pending and wait for approval. The default confirms nothing.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreationPolicy {
    pub auto_confirm_roles: Vec<Role>,
}

impl CreationPolicy {
    pub fn new(auto_confirm_roles: Vec<Role>) -> Self {
        let mut roles = auto_confirm_roles;
        roles.sort();
        roles.dedup();
        Self {
            auto_confirm_roles: roles,
        }
    }

    pub fn auto_confirms(&self, role: Role) -> bool {
        self.auto_confirm_roles.contains(&role)
    }

    pub fn initial_status(&self, role: Role) -> ReservationStatus {
        if self.auto_confirms(role) {
            ReservationStatus::Confirmed
        } else {
            ReservationStatus::Pending
        }
    }
}

/// Parse a comma-separated role list such as `"administrador,secretaria"`.
/// Empty entries are skipped; unknown roles are an error.
pub fn parse_role_list(value: &str) -> Result<Vec<Role>, anyhow::Error> {
    value
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::parse)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_policy_starts_everything_pending() {
        let policy = CreationPolicy::default();
        for role in [
            Role::Administrator,
            Role::Secretary,
            Role::Teacher,
            Role::Student,
        ] {
            assert_eq!(policy.initial_status(role), ReservationStatus::Pending);
        }
    }

    #[test]
    fn listed_roles_start_confirmed() {
        let policy = CreationPolicy::new(vec![Role::Secretary, Role::Administrator, Role::Secretary]);
        assert_eq!(policy.auto_confirm_roles.len(), 2);
        assert_eq!(
            policy.initial_status(Role::Administrator),
            ReservationStatus::Confirmed
        );
        assert_eq!(
            policy.initial_status(Role::Teacher),
            ReservationStatus::Pending
        );
    }

    #[test]
    fn role_list_parsing() {
        assert_eq!(
            parse_role_list("administrador, secretaria,").unwrap(),
            vec![Role::Administrator, Role::Secretary]
        );
        assert!(parse_role_list("").unwrap().is_empty());
        assert!(parse_role_list("admin,conductor").is_err());
    }
}
