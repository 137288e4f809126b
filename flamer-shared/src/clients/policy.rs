use rand::distributions::{Alphanumeric, DistString};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use uuid::Uuid;

use crate::types::capabilities::{CapabilitySnapshot, PolicyAction, PolicyResource};

/// Client for the external policy-decision service.
///
/// One configured instance lives in `AppState` and is reused across
/// requests; the credential comes from process configuration and never
/// reaches response payloads. Every check fails closed: a transport or
/// decode error is indistinguishable from "denied" for callers.
#[derive(Clone)]
pub struct PolicyClient {
    http: reqwest::Client,
    base_url: String,
    api_key: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct CheckRequest {
    user_id: Uuid,
    action: PolicyAction,
    resource: PolicyResource,
}

#[derive(Debug, Deserialize)]
struct CheckResponse {
    permitted: bool,
}

#[derive(Debug, Serialize)]
struct SyncUserRequest<'a> {
    user: SyncUserBody<'a>,
    role: &'a str,
}

#[derive(Debug, Serialize)]
struct SyncUserBody<'a> {
    id: Uuid,
    email: &'a str,
}

#[derive(Debug, Deserialize)]
struct SyncUserResponse {
    success: bool,
}

impl PolicyClient {
    pub fn new(base_url: &str, api_key: &str) -> anyhow::Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(5))
            .build()?;

        Ok(Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key: api_key.to_string(),
        })
    }

    /// Single permission check. Any failure yields `false`.
    pub async fn check(
        &self,
        user_id: Uuid,
        action: PolicyAction,
        resource: PolicyResource,
    ) -> bool {
        let request_id = Alphanumeric.sample_string(&mut rand::thread_rng(), 7);

        let result = self
            .http
            .post(format!("{}/check", self.base_url))
            .bearer_auth(&self.api_key)
            .json(&CheckRequest { user_id, action, resource })
            .send()
            .await;

        match result {
            Ok(resp) => match resp.json::<CheckResponse>().await {
                Ok(body) => body.permitted,
                Err(e) => {
                    tracing::warn!(%request_id, %user_id, error = %e, "policy check decode failed, denying");
                    false
                }
            },
            Err(e) => {
                tracing::warn!(%request_id, %user_id, error = %e, "policy check failed, denying");
                false
            }
        }
    }

    /// Resolve the viewer's full capability snapshot (six checks).
    /// Individual failures already fail closed, so the snapshot can
    /// never be more permissive than what the gate granted.
    pub async fn resolve_capabilities(&self, user_id: Uuid) -> CapabilitySnapshot {
        let caps = CapabilitySnapshot {
            can_view_profiles: self.check(user_id, PolicyAction::View, PolicyResource::Profile).await,
            can_view_full_profiles: self.check(user_id, PolicyAction::ViewFull, PolicyResource::Profile).await,
            can_view_limited_profiles: self.check(user_id, PolicyAction::ViewLimited, PolicyResource::Profile).await,
            can_view_likes: self.check(user_id, PolicyAction::View, PolicyResource::Liked).await,
            can_view_full_likes: self.check(user_id, PolicyAction::ViewFull, PolicyResource::Liked).await,
            can_view_limited_likes: self.check(user_id, PolicyAction::ViewLimited, PolicyResource::Liked).await,
        };

        tracing::debug!(%user_id, ?caps, "capabilities resolved");
        caps
    }

    /// Sync a viewer's plan role to the gate. Called once on plan
    /// selection. Returns `false` on any failure.
    pub async fn sync_user(&self, user_id: Uuid, email: &str, role: crate::types::auth::PlanRole) -> bool {
        let role = role.to_string();
        let result = self
            .http
            .post(format!("{}/sync-user", self.base_url))
            .bearer_auth(&self.api_key)
            .json(&SyncUserRequest {
                user: SyncUserBody { id: user_id, email },
                role: &role,
            })
            .send()
            .await;

        match result {
            Ok(resp) => match resp.json::<SyncUserResponse>().await {
                Ok(body) => body.success,
                Err(e) => {
                    tracing::warn!(%user_id, error = %e, "role sync decode failed");
                    false
                }
            },
            Err(e) => {
                tracing::warn!(%user_id, error = %e, "role sync failed");
                false
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn check_request_uses_gate_wire_shape() {
        let req = CheckRequest {
            user_id: Uuid::nil(),
            action: PolicyAction::ViewFull,
            resource: PolicyResource::Liked,
        };
        let json = serde_json::to_value(&req).unwrap();
        assert_eq!(json["action"], "viewfull");
        assert_eq!(json["resource"], "Liked");
        assert_eq!(json["userId"], "00000000-0000-0000-0000-000000000000");
    }

    #[test]
    fn check_response_parses_permitted_flag() {
        let body: CheckResponse = serde_json::from_str(r#"{"permitted":true}"#).unwrap();
        assert!(body.permitted);
    }

    #[test]
    fn base_url_trailing_slash_is_trimmed() {
        let client = PolicyClient::new("https://pdp.example.com/", "key").unwrap();
        assert_eq!(client.base_url, "https://pdp.example.com");
    }
}
