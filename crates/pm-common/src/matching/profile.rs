use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// The four contribution areas a student can sign up for within a pod.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    strum::Display,
    strum::AsRefStr,
    strum::EnumString,
)]
#[strum(ascii_case_insensitive)]
pub enum Role {
    Frontend,
    Backend,
    Matching,
    Platform,
}

impl Role {
    pub const ALL: [Role; 4] = [Role::Frontend, Role::Backend, Role::Matching, Role::Platform];
}

/// Parse a list of raw role strings, dropping anything outside the enum.
/// Order is preserved; the first surviving entry is the primary role.
pub fn normalize_roles(raw: &[String]) -> Vec<Role> {
    raw.iter()
        .filter_map(|value| Role::from_str(value.trim()).ok())
        .collect()
}

/// A student profile as the ranker consumes it. Field validation and
/// defaulting happen at the data-store boundary; the scoring functions
/// assume this shape is already populated.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Profile {
    pub user_id: String,
    pub display_name: String,
    pub role_prefs: Vec<String>,
    pub skills: Vec<String>,
    pub availability: Vec<String>,
    pub last_active_at: Option<DateTime<Utc>>,
}

impl Profile {
    pub fn primary_role(&self) -> Option<Role> {
        normalize_roles(&self.role_prefs).first().copied()
    }
}

/// The requester's current pod, in one of the two shapes callers supply.
///
/// `Roles` is the legacy shape: just the roles covered by the pod's members.
/// It cannot express a member count, so normalization approximates one
/// member when the list is non-empty and none otherwise. An empty legacy
/// list is therefore indistinguishable from having no pod at all.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum PodState {
    Roles(Vec<String>),
    Detailed {
        #[serde(rename = "memberRoles", default)]
        member_roles: Vec<String>,
        #[serde(rename = "memberCount", default)]
        member_count: u32,
    },
}

/// Normalized pod state: covered roles plus a member count.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PodSnapshot {
    pub roles: Vec<Role>,
    pub member_count: u32,
}

impl PodSnapshot {
    pub fn from_state(state: Option<&PodState>) -> Self {
        match state {
            None => Self::default(),
            Some(PodState::Roles(raw)) => {
                let roles = normalize_roles(raw);
                let member_count = if roles.is_empty() { 0 } else { 1 };
                Self {
                    roles,
                    member_count,
                }
            }
            Some(PodState::Detailed {
                member_roles,
                member_count,
            }) => Self {
                roles: normalize_roles(member_roles),
                member_count: *member_count,
            },
        }
    }

    /// Role scoring only sees a pod through its members' declared roles;
    /// a pod whose members declared nothing scores like having no pod.
    pub fn in_pod(&self) -> bool {
        !self.roles.is_empty()
    }

    /// Roles the pod still lacks, in enum order. Empty when there is no
    /// pod to speak of (`member_count == 0`).
    pub fn missing_roles(&self) -> Vec<Role> {
        if self.member_count == 0 {
            return Vec::new();
        }
        Role::ALL
            .iter()
            .filter(|role| !self.roles.contains(role))
            .copied()
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn strings(values: &[&str]) -> Vec<String> {
        values.iter().map(|v| v.to_string()).collect()
    }

    #[test]
    fn normalize_roles_accepts_any_case_and_drops_unknowns() {
        let raw = strings(&["Backend", "frontend", "MATCHING", "DevRel", " platform "]);
        assert_eq!(
            normalize_roles(&raw),
            vec![Role::Backend, Role::Frontend, Role::Matching, Role::Platform]
        );
    }

    #[test]
    fn primary_role_is_first_surviving_pref() {
        let profile = Profile {
            role_prefs: strings(&["Designer", "Backend", "Frontend"]),
            ..Profile::default()
        };
        assert_eq!(profile.primary_role(), Some(Role::Backend));
    }

    #[test]
    fn legacy_role_list_implies_single_member() {
        let state = PodState::Roles(strings(&["Frontend"]));
        let snapshot = PodSnapshot::from_state(Some(&state));
        assert_eq!(snapshot.member_count, 1);
        assert!(snapshot.in_pod());
        assert_eq!(
            snapshot.missing_roles(),
            vec![Role::Backend, Role::Matching, Role::Platform]
        );
    }

    #[test]
    fn empty_legacy_list_reads_as_no_pod() {
        let state = PodState::Roles(Vec::new());
        let snapshot = PodSnapshot::from_state(Some(&state));
        assert_eq!(snapshot.member_count, 0);
        assert!(!snapshot.in_pod());
        assert!(snapshot.missing_roles().is_empty());
    }

    #[test]
    fn detailed_state_keeps_member_count_separate_from_roles() {
        let state = PodState::Detailed {
            member_roles: Vec::new(),
            member_count: 2,
        };
        let snapshot = PodSnapshot::from_state(Some(&state));
        assert_eq!(snapshot.member_count, 2);
        assert!(!snapshot.in_pod());
        assert_eq!(snapshot.missing_roles(), Role::ALL.to_vec());
    }

    #[test]
    fn missing_roles_follow_enum_order() {
        let state = PodState::Detailed {
            member_roles: strings(&["Platform", "Frontend"]),
            member_count: 2,
        };
        let snapshot = PodSnapshot::from_state(Some(&state));
        assert_eq!(snapshot.missing_roles(), vec![Role::Backend, Role::Matching]);
    }

    #[test]
    fn pod_state_deserializes_both_shapes() {
        let legacy: PodState = serde_json::from_str(r#"["Backend", "Frontend"]"#).unwrap();
        assert_eq!(legacy, PodState::Roles(strings(&["Backend", "Frontend"])));

        let detailed: PodState =
            serde_json::from_str(r#"{"memberRoles": ["Backend"], "memberCount": 3}"#).unwrap();
        assert_eq!(
            detailed,
            PodState::Detailed {
                member_roles: strings(&["Backend"]),
                member_count: 3,
            }
        );
    }
}
