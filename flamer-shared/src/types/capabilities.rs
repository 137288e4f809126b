use serde::{Deserialize, Serialize};

/// Action names understood by the policy gate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PolicyAction {
    #[serde(rename = "view")]
    View,
    #[serde(rename = "viewfull")]
    ViewFull,
    #[serde(rename = "viewlimited")]
    ViewLimited,
}

/// Resource names understood by the policy gate. `Liked` keeps the
/// gate-side capitalization.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PolicyResource {
    #[serde(rename = "profile")]
    Profile,
    #[serde(rename = "Liked")]
    Liked,
}

/// The viewer's permissions, resolved from the policy gate at the start
/// of a page view. Short-lived, never persisted.
///
/// "Checked and false" and "check failed" are deliberately the same
/// value: any gate failure yields `denied()` wholesale, and call sites
/// cannot tell the two apart.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CapabilitySnapshot {
    pub can_view_profiles: bool,
    pub can_view_full_profiles: bool,
    pub can_view_limited_profiles: bool,
    pub can_view_likes: bool,
    pub can_view_full_likes: bool,
    pub can_view_limited_likes: bool,
}

impl CapabilitySnapshot {
    /// The most restrictive snapshot. Used both for "all checks came
    /// back false" and for "the gate could not be reached".
    pub fn denied() -> Self {
        Self::default()
    }

    /// Premium entitlement: unlimited swipes and full-photo visibility.
    pub fn is_premium(&self) -> bool {
        self.can_view_full_profiles
    }

    /// Single source of truth for the likes-inbox gate.
    ///
    /// The inbox is keyed off the *profile* capability, not the
    /// dedicated likes capability (`can_view_full_likes` is resolved
    /// and reported but grants nothing). This mirrors the shipped
    /// product behavior; flagged for product clarification.
    pub fn can_open_likes_inbox(&self) -> bool {
        self.can_view_full_profiles
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn denied_grants_nothing() {
        let caps = CapabilitySnapshot::denied();
        assert!(!caps.can_view_profiles);
        assert!(!caps.can_view_full_profiles);
        assert!(!caps.is_premium());
        assert!(!caps.can_open_likes_inbox());
    }

    #[test]
    fn likes_inbox_keys_off_profile_capability() {
        // can_view_full_likes alone does not open the inbox.
        let caps = CapabilitySnapshot {
            can_view_full_likes: true,
            ..CapabilitySnapshot::denied()
        };
        assert!(!caps.can_open_likes_inbox());

        let caps = CapabilitySnapshot {
            can_view_full_profiles: true,
            ..CapabilitySnapshot::denied()
        };
        assert!(caps.can_open_likes_inbox());
    }

    #[test]
    fn wire_names_match_gate_configuration() {
        assert_eq!(serde_json::to_string(&PolicyAction::ViewFull).unwrap(), "\"viewfull\"");
        assert_eq!(serde_json::to_string(&PolicyResource::Liked).unwrap(), "\"Liked\"");
        assert_eq!(serde_json::to_string(&PolicyResource::Profile).unwrap(), "\"profile\"");
    }

    #[test]
    fn snapshot_serializes_camel_case() {
        let caps = CapabilitySnapshot::denied();
        let json = serde_json::to_value(caps).unwrap();
        assert!(json.get("canViewFullProfiles").is_some());
        assert!(json.get("canViewLimitedLikes").is_some());
    }
}
