//! Visit Repository
//!
//! Every read-then-write on a member's visits runs in one transaction whose
//! first statement is a write, so SQLite hands out the write lock before any
//! visit is read. Two taps for the same member therefore serialize,
//! whether they come from the HTTP server or the card bridge process.

use super::{RepoError, RepoResult};
use shared::models::{MemberSummary, MembershipType, Visit, VisitLog, VisitTransition};
use sqlx::{SqliteConnection, SqlitePool};

const VISIT_COLUMNS: &str = "id, member_id, check_in, check_out";

/// Take the database write lock for the current transaction
async fn lock_member(conn: &mut SqliteConnection, member_id: i64) -> RepoResult<()> {
    sqlx::query("UPDATE member SET updated_at = updated_at WHERE id = ?")
        .bind(member_id)
        .execute(&mut *conn)
        .await?;
    Ok(())
}

/// The member's open visit; the partial unique index allows at most one
async fn find_open(conn: &mut SqliteConnection, member_id: i64) -> RepoResult<Option<Visit>> {
    let sql = format!(
        "SELECT {VISIT_COLUMNS} FROM visit WHERE member_id = ? AND check_out IS NULL LIMIT 1"
    );
    let row = sqlx::query_as::<_, Visit>(&sql)
        .bind(member_id)
        .fetch_optional(&mut *conn)
        .await?;
    Ok(row)
}

async fn open_visit(conn: &mut SqliteConnection, member_id: i64, now: i64) -> RepoResult<Visit> {
    let sql =
        format!("INSERT INTO visit (member_id, check_in) VALUES (?, ?) RETURNING {VISIT_COLUMNS}");
    let visit = sqlx::query_as::<_, Visit>(&sql)
        .bind(member_id)
        .bind(now)
        .fetch_one(&mut *conn)
        .await?;
    Ok(visit)
}

async fn close_open(conn: &mut SqliteConnection, member_id: i64, now: i64) -> RepoResult<Vec<Visit>> {
    let sql = format!(
        "UPDATE visit SET check_out = MAX(?, check_in) WHERE member_id = ? AND check_out IS NULL RETURNING {VISIT_COLUMNS}"
    );
    let closed = sqlx::query_as::<_, Visit>(&sql)
        .bind(now)
        .bind(member_id)
        .fetch_all(&mut *conn)
        .await?;
    Ok(closed)
}

/// Bridge semantics: close the open visit if there is one, otherwise open a new one.
///
/// Only the newest visit can be open, so this is "toggle the latest visit".
pub async fn toggle(pool: &SqlitePool, member_id: i64, now: i64) -> RepoResult<VisitTransition> {
    let mut tx = pool.begin().await?;
    lock_member(&mut tx, member_id).await?;

    let transition = match find_open(&mut tx, member_id).await? {
        Some(visit) => {
            let closed = close_open(&mut tx, member_id, now).await?;
            let visit = closed
                .into_iter()
                .find(|v| v.id == visit.id)
                .ok_or_else(|| RepoError::Database(format!("Visit {} vanished", visit.id)))?;
            VisitTransition::CheckedOut(visit)
        }
        None => VisitTransition::CheckedIn(open_visit(&mut tx, member_id, now).await?),
    };

    tx.commit().await?;
    Ok(transition)
}

/// Resolver semantics: always record a new check-in.
///
/// A visit still open from an earlier tap is closed at the same instant so
/// the member never has two open visits.
pub async fn check_in(pool: &SqlitePool, member_id: i64, now: i64) -> RepoResult<Visit> {
    let mut tx = pool.begin().await?;
    lock_member(&mut tx, member_id).await?;

    let superseded = close_open(&mut tx, member_id, now).await?;
    if !superseded.is_empty() {
        tracing::debug!(member_id, count = superseded.len(), "Closed open visit before check-in");
    }
    let visit = open_visit(&mut tx, member_id, now).await?;

    tx.commit().await?;
    Ok(visit)
}

pub async fn find_by_member(pool: &SqlitePool, member_id: i64) -> RepoResult<Vec<Visit>> {
    let sql = format!(
        "SELECT {VISIT_COLUMNS} FROM visit WHERE member_id = ? ORDER BY check_in DESC, id DESC"
    );
    let rows = sqlx::query_as::<_, Visit>(&sql)
        .bind(member_id)
        .fetch_all(pool)
        .await?;
    Ok(rows)
}

pub async fn count_open(pool: &SqlitePool, member_id: i64) -> RepoResult<i64> {
    let count: i64 =
        sqlx::query_scalar("SELECT COUNT(*) FROM visit WHERE member_id = ? AND check_out IS NULL")
            .bind(member_id)
            .fetch_one(pool)
            .await?;
    Ok(count)
}

#[derive(sqlx::FromRow)]
struct VisitLogRow {
    id: i64,
    member_id: i64,
    check_in: i64,
    check_out: Option<i64>,
    name: String,
    contact_number: String,
    #[sqlx(try_from = "String")]
    membership_type: MembershipType,
}

impl From<VisitLogRow> for VisitLog {
    fn from(row: VisitLogRow) -> Self {
        let visit = Visit {
            id: row.id,
            member_id: row.member_id,
            check_in: row.check_in,
            check_out: row.check_out,
        };
        VisitLog::new(
            &visit,
            MemberSummary {
                id: row.member_id,
                name: row.name,
                contact_number: row.contact_number,
                membership_type: row.membership_type,
            },
        )
    }
}

/// Most recent visits (newest check-in first) with the member embedded
pub async fn find_latest_logs(pool: &SqlitePool, limit: i64) -> RepoResult<Vec<VisitLog>> {
    let rows = sqlx::query_as::<_, VisitLogRow>(
        "SELECT v.id, v.member_id, v.check_in, v.check_out, m.name, m.contact_number, m.membership_type FROM visit v JOIN member m ON m.id = v.member_id ORDER BY v.check_in DESC, v.id DESC LIMIT ?",
    )
    .bind(limit)
    .fetch_all(pool)
    .await?;
    Ok(rows.into_iter().map(VisitLog::from).collect())
}
