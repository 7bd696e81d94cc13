//! Attendance state transitions
//!
//! Two entry points write visits:
//!
//! - [`resolve_check_in`]: browser-driven, always records a check-in
//! - [`apply_tap`]: reader-driven, toggles between check-in and check-out
//!
//! Both go through the visit repository's locked transactions.

use shared::models::{CheckInSnapshot, Member, VisitTransition};
use shared::relay::{CardUid, InvalidUid};
use shared::util::{millis_to_datetime, now_millis};
use shared::{AppError, AppResult, ErrorCode};
use sqlx::SqlitePool;

use crate::db::repository::{RepoResult, member, visit};

/// Look the card up and record a check-in for its member.
///
/// The UID is folded to its canonical form first, so it matches whatever
/// case the card was entered or read in. A malformed UID cannot belong to
/// any member and is reported as an unknown card.
pub async fn resolve_check_in(pool: &SqlitePool, uid: Option<&str>) -> AppResult<CheckInSnapshot> {
    let uid = match CardUid::new(uid.unwrap_or_default()) {
        Ok(uid) => uid,
        Err(InvalidUid::Empty) => return Err(AppError::required("UID is required")),
        Err(e) => {
            tracing::info!("Check-in with malformed UID: {e}");
            return Err(AppError::new(ErrorCode::CardNotFound));
        }
    };

    let Some(member) = member::find_by_card(pool, &uid).await? else {
        tracing::info!(%uid, "Check-in for unknown card");
        return Err(AppError::new(ErrorCode::CardNotFound));
    };

    let visit = visit::check_in(pool, member.id, now_millis()).await?;
    tracing::info!(%uid, member_id = member.id, visit_id = visit.id, "Member checked in");

    Ok(CheckInSnapshot::new(uid, &member, millis_to_datetime(visit.check_in)))
}

/// Member and visit change produced by one reader tap
#[derive(Debug, Clone)]
pub struct TapApplied {
    pub member: Member,
    pub transition: VisitTransition,
}

/// Toggle the visit state of the member holding `uid`.
///
/// `Ok(None)` when no member holds the card; nothing is written then.
pub async fn apply_tap(pool: &SqlitePool, uid: &CardUid, now: i64) -> RepoResult<Option<TapApplied>> {
    let Some(member) = member::find_by_card(pool, uid).await? else {
        return Ok(None);
    };
    let transition = visit::toggle(pool, member.id, now).await?;
    tracing::debug!(%uid, member_id = member.id, transition = transition.label(), "Tap applied");
    Ok(Some(TapApplied { member, transition }))
}
