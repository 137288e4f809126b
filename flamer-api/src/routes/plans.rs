use axum::extract::State;
use axum::Json;
use chrono::{DateTime, Months, Utc};
use diesel::prelude::*;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use flamer_shared::errors::{AppError, AppResult, ErrorCode};
use flamer_shared::types::auth::{AuthUser, PlanRole};
use flamer_shared::types::ApiResponse;

use crate::schema::profiles;
use crate::AppState;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Plan {
    Free,
    Premium,
}

impl Plan {
    fn role(self) -> PlanRole {
        match self {
            Plan::Free => PlanRole::FreeUser,
            Plan::Premium => PlanRole::PremiumUser,
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct SelectPlanRequest {
    pub plan: Plan,
}

#[derive(Debug, Serialize)]
pub struct SelectPlanResponse {
    pub plan: Plan,
    pub premium_until: Option<DateTime<Utc>>,
}

/// POST /plans/select - pick a plan. Checkout is simulated: the role is
/// synced to the policy gate and, for premium, the entitlement window
/// is stamped on the profile. Entitlement enforcement stays with the
/// gate; `premium_until` is local bookkeeping.
pub async fn select_plan(
    user: AuthUser,
    State(state): State<Arc<AppState>>,
    Json(req): Json<SelectPlanRequest>,
) -> AppResult<Json<ApiResponse<SelectPlanResponse>>> {
    let role = req.plan.role();

    let synced = state.policy.sync_user(user.id, &user.email, role).await;
    if !synced {
        return Err(AppError::new(
            ErrorCode::RoleSyncFailed,
            "could not sync plan role to the policy service",
        ));
    }

    let mut conn = state.db.get().map_err(|e| AppError::internal(e.to_string()))?;

    let premium_until = match req.plan {
        Plan::Premium => {
            let now = Utc::now();
            let until = now
                .checked_add_months(Months::new(1))
                .ok_or_else(|| AppError::internal("entitlement window overflow"))?;

            diesel::update(profiles::table.find(user.id))
                .set((
                    profiles::premium_until.eq(Some(until)),
                    profiles::updated_at.eq(now),
                ))
                .execute(&mut conn)?;

            Some(until)
        }
        Plan::Free => None,
    };

    tracing::info!(user_id = %user.id, plan = ?req.plan, "plan selected");

    Ok(Json(ApiResponse::ok(SelectPlanResponse {
        plan: req.plan,
        premium_until,
    })))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn plans_parse_from_wire_names() {
        let req: SelectPlanRequest = serde_json::from_str(r#"{"plan":"premium"}"#).unwrap();
        assert_eq!(req.plan, Plan::Premium);
        let req: SelectPlanRequest = serde_json::from_str(r#"{"plan":"free"}"#).unwrap();
        assert_eq!(req.plan, Plan::Free);
        assert!(serde_json::from_str::<SelectPlanRequest>(r#"{"plan":"gold"}"#).is_err());
    }

    #[test]
    fn plans_map_to_gate_roles() {
        assert_eq!(Plan::Free.role(), PlanRole::FreeUser);
        assert_eq!(Plan::Premium.role(), PlanRole::PremiumUser);
    }
}
