use chrono::Utc;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Role synced to the policy gate when a viewer selects a plan.
/// The wire names are fixed by the gate's role configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PlanRole {
    FreeUser,
    PremiumUser,
}

impl std::fmt::Display for PlanRole {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PlanRole::FreeUser => write!(f, "FreeUser"),
            PlanRole::PremiumUser => write!(f, "PremiumUser"),
        }
    }
}

impl std::str::FromStr for PlanRole {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "FreeUser" => Ok(PlanRole::FreeUser),
            "PremiumUser" => Ok(PlanRole::PremiumUser),
            _ => Err(format!("unknown plan role: {s}")),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    pub sub: Uuid,
    pub email: String,
    pub iat: i64,
    pub exp: i64,
    pub jti: Uuid,
}

impl Claims {
    pub fn new(user_id: Uuid, email: impl Into<String>, duration_secs: i64) -> Self {
        let now = Utc::now().timestamp();
        Self {
            sub: user_id,
            email: email.into(),
            iat: now,
            exp: now + duration_secs,
            jti: Uuid::now_v7(),
        }
    }

    pub fn is_expired(&self) -> bool {
        Utc::now().timestamp() > self.exp
    }
}

/// The authenticated viewer, extracted from the bearer token issued by
/// the external identity provider. The subject id doubles as the
/// profile id.
#[derive(Debug, Clone)]
pub struct AuthUser {
    pub id: Uuid,
    pub email: String,
    pub token_id: Uuid,
}

impl From<Claims> for AuthUser {
    fn from(claims: Claims) -> Self {
        Self {
            id: claims.sub,
            email: claims.email,
            token_id: claims.jti,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn plan_role_round_trips_wire_names() {
        assert_eq!(PlanRole::from_str("FreeUser").unwrap(), PlanRole::FreeUser);
        assert_eq!(PlanRole::from_str("PremiumUser").unwrap(), PlanRole::PremiumUser);
        assert_eq!(PlanRole::PremiumUser.to_string(), "PremiumUser");
        assert!(PlanRole::from_str("premiumuser").is_err());
    }

    #[test]
    fn fresh_claims_are_not_expired() {
        let claims = Claims::new(Uuid::new_v4(), "a@b.c", 900);
        assert!(!claims.is_expired());
    }
}
