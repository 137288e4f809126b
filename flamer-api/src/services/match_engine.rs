//! Swipe accounting and mutual-like (match) detection.
//!
//! Everything here operates on a single checked-out connection. The
//! match-closing step runs inside one transaction that first takes a
//! `pg_advisory_xact_lock` keyed on the unordered pair: two users
//! liking each other in the same instant serialize on that lock, so
//! the second closure always sees the first's committed like row and
//! the pair cannot end up mutually liked but unmatched. (A plain
//! `FOR UPDATE` is not enough under READ COMMITTED — it cannot lock a
//! row the other transaction has not committed yet.)

use chrono::{NaiveDate, Utc};
use diesel::prelude::*;
use diesel::sql_types::Integer;
use diesel::PgConnection;
use serde::Serialize;
use uuid::Uuid;

use flamer_shared::errors::{AppError, AppResult, ErrorCode};
use flamer_shared::types::capabilities::CapabilitySnapshot;

use crate::models::{Like, NewDailySwipeCount, NewLike, NewSwipe};
use crate::schema::{daily_swipe_counts, likes, swipes};

/// Free-tier swipes per calendar day. Premium viewers are unlimited.
pub const FREE_DAILY_SWIPE_LIMIT: i32 = 10;

#[derive(Debug, Clone, Copy, Serialize)]
pub struct SwipeOutcome {
    pub matched: bool,
    /// True when the pair was already in the ledger and this call was a
    /// no-op (the uniqueness conflict is expected, not an error).
    #[serde(skip)]
    pub already_swiped: bool,
}

#[derive(Debug, Clone, Copy, Serialize)]
pub struct Quota {
    pub used: i32,
    /// None = unlimited (premium).
    pub limit: Option<i32>,
    pub remaining: Option<i32>,
}

impl Quota {
    pub fn exhausted(&self) -> bool {
        self.remaining == Some(0)
    }
}

/// Quota math, separated from storage so it is testable on its own.
pub fn quota_for(used: i32, caps: &CapabilitySnapshot) -> Quota {
    if caps.is_premium() {
        Quota { used, limit: None, remaining: None }
    } else {
        Quota {
            used,
            limit: Some(FREE_DAILY_SWIPE_LIMIT),
            remaining: Some((FREE_DAILY_SWIPE_LIMIT - used).max(0)),
        }
    }
}

/// Photo redaction: premium viewers see the full ordered set, everyone
/// else at most the primary photo. The only field-level redaction rule.
pub fn visible_photos(photos: &[String], caps: &CapabilitySnapshot) -> Vec<String> {
    if caps.can_view_full_profiles {
        photos.to_vec()
    } else {
        photos.iter().take(1).cloned().collect()
    }
}

/// What one swipe does to the ledger, decided from the facts the
/// queries establish. Keeping the decision separate from the queries
/// makes the closure rules checkable without a database.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SwipeEffect {
    /// Pair already in the ledger: no writes at all, not even the
    /// counter; report the outcome the earlier call settled.
    AlreadySettled { matched: bool },
    /// Pass: swipe row and counter only, no like row ever.
    RecordPass,
    /// Like with no reverse like yet: like row stays `is_match=false`.
    RecordLike,
    /// Like whose reverse exists: flip `is_match` on both rows.
    RecordLikeAndClose,
}

impl SwipeEffect {
    pub fn matched(&self) -> bool {
        matches!(
            self,
            SwipeEffect::AlreadySettled { matched: true } | SwipeEffect::RecordLikeAndClose
        )
    }

    pub fn counts_against_quota(&self) -> bool {
        !matches!(self, SwipeEffect::AlreadySettled { .. })
    }
}

/// Decision table for one swipe.
///
/// `settled_match` is the stored `is_match` of the actor's existing
/// like row (false when the earlier swipe was a pass); it only matters
/// when `already_swiped`. `reverse_exists` only matters for a fresh
/// like.
pub fn swipe_effect(
    already_swiped: bool,
    settled_match: bool,
    liked: bool,
    reverse_exists: bool,
) -> SwipeEffect {
    if already_swiped {
        SwipeEffect::AlreadySettled { matched: settled_match }
    } else if !liked {
        SwipeEffect::RecordPass
    } else if reverse_exists {
        SwipeEffect::RecordLikeAndClose
    } else {
        SwipeEffect::RecordLike
    }
}

/// Calendar day used for swipe accounting (server clock, UTC).
pub fn swipe_day() -> NaiveDate {
    Utc::now().date_naive()
}

pub fn todays_count(conn: &mut PgConnection, user_id: Uuid) -> AppResult<i32> {
    let count = daily_swipe_counts::table
        .find((user_id, swipe_day()))
        .select(daily_swipe_counts::count)
        .first::<i32>(conn)
        .optional()?
        .unwrap_or(0);

    Ok(count)
}

pub fn check_quota(
    conn: &mut PgConnection,
    user_id: Uuid,
    caps: &CapabilitySnapshot,
) -> AppResult<Quota> {
    let used = todays_count(conn, user_id)?;
    Ok(quota_for(used, caps))
}

/// Record one swipe and report whether it closed a mutual pair.
///
/// Order of effects (quota gate first, so an exhausted viewer writes
/// nothing):
/// 1. insert the swipe, uniqueness conflict swallowed; on conflict the
///    previously established outcome is returned and nothing else runs
/// 2. a pass stops here
/// 3. a like inserts the like row, checks the reverse row, and flips
///    `is_match` on both sides, all inside one pair-locked transaction
/// 4. the daily counter is upserted for every accepted swipe
///
/// The swipe insert deliberately stays outside the transaction: a swipe
/// row surviving a failed like insert is accepted behavior, and there
/// is no rollback of committed steps on later failure.
pub fn record_swipe(
    conn: &mut PgConnection,
    actor: Uuid,
    target: Uuid,
    liked: bool,
    caps: &CapabilitySnapshot,
) -> AppResult<SwipeOutcome> {
    if actor == target {
        return Err(AppError::new(ErrorCode::CannotSwipeSelf, "cannot swipe on yourself"));
    }

    let quota = check_quota(conn, actor, caps)?;
    if quota.exhausted() {
        return Err(AppError::with_details(
            ErrorCode::SwipeLimitReached,
            "daily swipe limit reached",
            serde_json::json!({ "limit": quota.limit, "used": quota.used }),
        ));
    }

    let inserted = diesel::insert_into(swipes::table)
        .values(&NewSwipe {
            user_id: actor,
            swiped_profile_id: target,
            liked,
        })
        .on_conflict((swipes::user_id, swipes::swiped_profile_id))
        .do_nothing()
        .execute(conn)?;

    let effect = if inserted == 0 {
        // Already swiped: the earlier call settled the like/match rows,
        // so the stored state is the answer.
        let settled_match = likes::table
            .filter(likes::liker_id.eq(actor))
            .filter(likes::liked_user_id.eq(target))
            .select(likes::is_match)
            .first::<bool>(conn)
            .optional()?
            .unwrap_or(false);

        tracing::debug!(%actor, %target, settled_match, "duplicate swipe swallowed");
        swipe_effect(true, settled_match, liked, false)
    } else if liked {
        let reverse_exists = close_match_pair(conn, actor, target)?;
        swipe_effect(false, false, true, reverse_exists)
    } else {
        swipe_effect(false, false, false, false)
    };

    if effect.counts_against_quota() {
        diesel::insert_into(daily_swipe_counts::table)
            .values(&NewDailySwipeCount {
                user_id: actor,
                date: swipe_day(),
                count: 1,
            })
            .on_conflict((daily_swipe_counts::user_id, daily_swipe_counts::date))
            .do_update()
            .set(daily_swipe_counts::count.eq(daily_swipe_counts::count + 1))
            .execute(conn)?;
    }

    if effect.matched() && effect.counts_against_quota() {
        tracing::info!(%actor, %target, "mutual like, match created");
    }

    Ok(SwipeOutcome {
        matched: effect.matched(),
        already_swiped: !effect.counts_against_quota(),
    })
}

/// Advisory-lock key for a pair, identical for both directions so both
/// members contend on the same lock. Collisions across unrelated pairs
/// only cost extra serialization, never correctness.
fn pair_lock_key(a: Uuid, b: Uuid) -> (i32, i32) {
    let (lo, hi) = if a.as_bytes() <= b.as_bytes() { (a, b) } else { (b, a) };
    let lo = lo.as_bytes();
    let hi = hi.as_bytes();
    (
        i32::from_le_bytes([lo[0], lo[1], lo[2], lo[3]]),
        i32::from_le_bytes([hi[0], hi[1], hi[2], hi[3]]),
    )
}

/// Insert the directed like and close the pair if the reverse like
/// exists. Returns whether the reverse existed.
///
/// The transaction opens by taking `pg_advisory_xact_lock` on the
/// unordered pair, held until commit. Concurrent closures of the same
/// pair run one after the other, so whichever transaction goes second
/// is guaranteed to see the first's committed like row in its reverse
/// lookup.
fn close_match_pair(conn: &mut PgConnection, actor: Uuid, target: Uuid) -> AppResult<bool> {
    let (k1, k2) = pair_lock_key(actor, target);

    let matched = conn.transaction::<bool, diesel::result::Error, _>(|conn| {
        diesel::sql_query("SELECT pg_advisory_xact_lock($1, $2)")
            .bind::<Integer, _>(k1)
            .bind::<Integer, _>(k2)
            .execute(conn)?;

        diesel::insert_into(likes::table)
            .values(&NewLike {
                liker_id: actor,
                liked_user_id: target,
                is_match: false,
            })
            .on_conflict((likes::liker_id, likes::liked_user_id))
            .do_nothing()
            .execute(conn)?;

        let reverse = likes::table
            .filter(likes::liker_id.eq(target))
            .filter(likes::liked_user_id.eq(actor))
            .first::<Like>(conn)
            .optional()?;

        if swipe_effect(false, false, true, reverse.is_some()) != SwipeEffect::RecordLikeAndClose {
            return Ok(false);
        }

        diesel::update(
            likes::table.filter(
                likes::liker_id
                    .eq(actor)
                    .and(likes::liked_user_id.eq(target))
                    .or(likes::liker_id.eq(target).and(likes::liked_user_id.eq(actor))),
            ),
        )
        .set(likes::is_match.eq(true))
        .execute(conn)?;

        Ok(true)
    })?;

    Ok(matched)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn free() -> CapabilitySnapshot {
        CapabilitySnapshot::denied()
    }

    fn premium() -> CapabilitySnapshot {
        CapabilitySnapshot {
            can_view_full_profiles: true,
            ..CapabilitySnapshot::denied()
        }
    }

    fn photos(n: usize) -> Vec<String> {
        (0..n).map(|i| format!("user/{i}.jpg")).collect()
    }

    #[test]
    fn free_viewer_sees_at_most_primary_photo() {
        for n in 0..=5 {
            let p = photos(n);
            let visible = visible_photos(&p, &free());
            assert_eq!(visible.len(), n.min(1));
            if n > 0 {
                assert_eq!(visible[0], p[0]);
            }
        }
    }

    #[test]
    fn premium_viewer_sees_all_photos_in_order() {
        for n in 0..=5 {
            let p = photos(n);
            assert_eq!(visible_photos(&p, &premium()), p);
        }
    }

    #[test]
    fn free_quota_counts_down_to_zero() {
        let q = quota_for(0, &free());
        assert_eq!(q.limit, Some(10));
        assert_eq!(q.remaining, Some(10));
        assert!(!q.exhausted());

        let q = quota_for(9, &free());
        assert_eq!(q.remaining, Some(1));
        assert!(!q.exhausted());

        let q = quota_for(10, &free());
        assert_eq!(q.remaining, Some(0));
        assert!(q.exhausted());
    }

    #[test]
    fn free_quota_clamps_overshoot_at_zero() {
        // A count above the limit (e.g. limit lowered after the fact)
        // never reports negative remaining.
        let q = quota_for(37, &free());
        assert_eq!(q.remaining, Some(0));
        assert!(q.exhausted());
    }

    #[test]
    fn premium_quota_is_unlimited() {
        let q = quota_for(1000, &premium());
        assert_eq!(q.limit, None);
        assert_eq!(q.remaining, None);
        assert!(!q.exhausted());
    }

    #[test]
    fn ninth_to_tenth_swipe_exhausts_the_free_quota() {
        // Count 9 -> one more swipe allowed, count 10 -> the next
        // attempt must be rejected before anything is written.
        assert!(!quota_for(9, &free()).exhausted());
        assert!(quota_for(10, &free()).exhausted());
    }

    #[test]
    fn quota_serializes_nulls_when_unlimited() {
        let json = serde_json::to_value(quota_for(3, &premium())).unwrap();
        assert_eq!(json["limit"], serde_json::Value::Null);
        assert_eq!(json["remaining"], serde_json::Value::Null);
        assert_eq!(json["used"], 3);
    }

    #[test]
    fn like_without_reverse_stays_unmatched() {
        // A likes B, B has no like on A: the like row is created open
        // and the caller reports no match.
        let effect = swipe_effect(false, false, true, false);
        assert_eq!(effect, SwipeEffect::RecordLike);
        assert!(!effect.matched());
        assert!(effect.counts_against_quota());
    }

    #[test]
    fn reverse_like_closes_both_sides() {
        // B likes A while Like(A,B) already exists: both rows flip to
        // matched and the caller reports the match.
        let effect = swipe_effect(false, false, true, true);
        assert_eq!(effect, SwipeEffect::RecordLikeAndClose);
        assert!(effect.matched());
        assert!(effect.counts_against_quota());
    }

    #[test]
    fn pass_never_creates_a_like() {
        // A reverse like changes nothing about a pass.
        for reverse_exists in [false, true] {
            let effect = swipe_effect(false, false, false, reverse_exists);
            assert_eq!(effect, SwipeEffect::RecordPass);
            assert!(!effect.matched());
            assert!(effect.counts_against_quota());
        }
    }

    #[test]
    fn repeat_swipe_is_a_noop_with_settled_outcome() {
        // Second swipe on the same pair: no writes, counter untouched,
        // outcome mirrors what the first call settled.
        let effect = swipe_effect(true, true, true, false);
        assert_eq!(effect, SwipeEffect::AlreadySettled { matched: true });
        assert!(effect.matched());
        assert!(!effect.counts_against_quota());

        let effect = swipe_effect(true, false, true, false);
        assert!(!effect.matched());
        assert!(!effect.counts_against_quota());

        // A repeated pass has no like row; stored state reads false.
        let effect = swipe_effect(true, false, false, false);
        assert_eq!(effect, SwipeEffect::AlreadySettled { matched: false });
    }

    #[test]
    fn pair_lock_key_is_direction_independent() {
        let a = Uuid::new_v4();
        let b = Uuid::new_v4();
        assert_eq!(pair_lock_key(a, b), pair_lock_key(b, a));
    }

    #[test]
    fn distinct_pairs_get_distinct_lock_keys() {
        let a = Uuid::from_u128(0x1111_0000_0000_0000_0000_0000_0000_0001);
        let b = Uuid::from_u128(0x2222_0000_0000_0000_0000_0000_0000_0002);
        let c = Uuid::from_u128(0x3333_0000_0000_0000_0000_0000_0000_0003);
        assert_ne!(pair_lock_key(a, b), pair_lock_key(a, c));
        assert_ne!(pair_lock_key(a, b), pair_lock_key(b, c));
    }
}
