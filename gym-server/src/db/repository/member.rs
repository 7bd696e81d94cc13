//! Member Repository

use super::{RepoError, RepoResult};
use shared::models::{Member, MemberCreate, MemberUpdate};
use shared::relay::CardUid;
use sqlx::{SqliteExecutor, SqlitePool};

const MEMBER_SELECT: &str = "SELECT id, name, contact_number, membership_type, start_date, expiration_date, is_frozen, card_id, created_at, updated_at FROM member";

pub async fn find_all(pool: &SqlitePool) -> RepoResult<Vec<Member>> {
    let sql = format!("{MEMBER_SELECT} ORDER BY created_at, id");
    let rows = sqlx::query_as::<_, Member>(&sql).fetch_all(pool).await?;
    Ok(rows)
}

pub async fn find_by_id(pool: &SqlitePool, id: i64) -> RepoResult<Option<Member>> {
    let sql = format!("{MEMBER_SELECT} WHERE id = ?");
    let row = sqlx::query_as::<_, Member>(&sql)
        .bind(id)
        .fetch_optional(pool)
        .await?;
    Ok(row)
}

/// Member holding the card. Stored card ids are canonical, so this is an
/// exact match.
pub async fn find_by_card<'e, E>(exec: E, card_id: &CardUid) -> RepoResult<Option<Member>>
where
    E: SqliteExecutor<'e>,
{
    let sql = format!("{MEMBER_SELECT} WHERE card_id = ?");
    let row = sqlx::query_as::<_, Member>(&sql)
        .bind(card_id.as_str())
        .fetch_optional(exec)
        .await?;
    Ok(row)
}

/// Insert a member. `data` must already be normalized.
pub async fn create(pool: &SqlitePool, data: MemberCreate) -> RepoResult<Member> {
    let now = shared::util::now_millis();
    let sql = "INSERT INTO member (name, contact_number, membership_type, start_date, expiration_date, is_frozen, card_id, created_at, updated_at) VALUES (?1, ?2, ?3, ?4, ?5, 0, ?6, ?7, ?7) RETURNING id";
    let id: i64 = sqlx::query_scalar(sql)
        .bind(&data.name)
        .bind(&data.contact_number)
        .bind(data.membership_type.as_str())
        .bind(data.start_date)
        .bind(data.expiration_date)
        .bind(&data.card_id)
        .bind(now)
        .fetch_one(pool)
        .await
        .map_err(|e| card_conflict(e.into(), data.card_id.as_deref()))?;
    find_by_id(pool, id)
        .await?
        .ok_or_else(|| RepoError::Database("Failed to create member".into()))
}

/// Apply a partial update.
///
/// `card_id`: `None` leaves the card alone, `Some("")` clears it, anything
/// else assigns it.
pub async fn update(pool: &SqlitePool, id: i64, data: MemberUpdate) -> RepoResult<Member> {
    let now = shared::util::now_millis();
    let set_card = data.card_id.is_some();
    let card_id = data.card_id.filter(|c| !c.is_empty());
    let rows = sqlx::query(
        "UPDATE member SET membership_type = COALESCE(?1, membership_type), expiration_date = COALESCE(?2, expiration_date), is_frozen = COALESCE(?3, is_frozen), card_id = CASE WHEN ?4 THEN ?5 ELSE card_id END, updated_at = ?6 WHERE id = ?7",
    )
    .bind(data.membership_type.map(|t| t.as_str()))
    .bind(data.expiration_date)
    .bind(data.is_frozen)
    .bind(set_card)
    .bind(&card_id)
    .bind(now)
    .bind(id)
    .execute(pool)
    .await
    .map_err(|e| card_conflict(e.into(), card_id.as_deref()))?;
    if rows.rows_affected() == 0 {
        return Err(RepoError::NotFound(format!("Member {id} not found")));
    }
    find_by_id(pool, id)
        .await?
        .ok_or_else(|| RepoError::NotFound(format!("Member {id} not found")))
}

/// The only unique column on `member` is `card_id`
fn card_conflict(err: RepoError, card_id: Option<&str>) -> RepoError {
    match (err, card_id) {
        (RepoError::Duplicate(_), Some(card)) => {
            RepoError::Duplicate(format!("Card {card} is already assigned to another client"))
        }
        (err, _) => err,
    }
}
