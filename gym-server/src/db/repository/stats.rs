//! Attendance aggregation queries
//!
//! Buckets are UTC calendar days / months of the check-in timestamp. A
//! member counts once per bucket no matter how many visits they made.

use super::RepoResult;
use std::collections::HashMap;

use chrono::{Datelike, Months, NaiveDate};
use shared::models::{DailyCount, DashboardOverview, MonthlyCount, MonthlySignups};
use sqlx::SqlitePool;

/// Days shown on the dashboard
pub const DAILY_WINDOW: i64 = 7;
/// Months shown on the dashboard
pub const MONTHLY_WINDOW: i64 = 12;
/// Months in the signup chart, current month included
pub const SIGNUP_WINDOW: u32 = 7;

/// Distinct visitors per day, most recent `limit` days with any visit, newest first
pub async fn daily_counts(pool: &SqlitePool, limit: i64) -> RepoResult<Vec<DailyCount>> {
    let rows = sqlx::query_as::<_, DailyCount>(
        "SELECT strftime('%Y-%m-%d', check_in / 1000, 'unixepoch') AS date, COUNT(DISTINCT member_id) AS count FROM visit GROUP BY date ORDER BY date DESC LIMIT ?",
    )
    .bind(limit)
    .fetch_all(pool)
    .await?;
    Ok(rows)
}

/// Distinct visitors per month, most recent `limit` months, newest first
pub async fn monthly_counts(pool: &SqlitePool, limit: i64) -> RepoResult<Vec<MonthlyCount>> {
    let rows = sqlx::query_as::<_, MonthlyCount>(
        "SELECT strftime('%Y-%m', check_in / 1000, 'unixepoch') AS month, COUNT(DISTINCT member_id) AS count FROM visit GROUP BY month ORDER BY month DESC LIMIT ?",
    )
    .bind(limit)
    .fetch_all(pool)
    .await?;
    Ok(rows)
}

fn start_of_day_millis(date: NaiveDate) -> i64 {
    date.and_hms_opt(0, 0, 0)
        .map(|dt| dt.and_utc().timestamp_millis())
        .unwrap_or_default()
}

fn month_key(date: NaiveDate) -> String {
    date.format("%Y-%m").to_string()
}

/// Signups (by membership start date) for the `months` calendar months
/// ending with the one containing `today`, oldest first
pub async fn monthly_signups(
    pool: &SqlitePool,
    today: NaiveDate,
    months: u32,
) -> RepoResult<Vec<MonthlySignups>> {
    let month_start = today.with_day(1).unwrap_or(today);
    let keys: Vec<String> = (0..months)
        .rev()
        .filter_map(|back| month_start.checked_sub_months(Months::new(back)))
        .map(month_key)
        .collect();
    let Some(first) = keys.first() else {
        return Ok(Vec::new());
    };

    let rows: Vec<(String, i64)> = sqlx::query_as(
        "SELECT strftime('%Y-%m', start_date) AS month, COUNT(*) FROM member WHERE strftime('%Y-%m', start_date) BETWEEN ?1 AND ?2 GROUP BY month",
    )
    .bind(first)
    .bind(month_key(today))
    .fetch_all(pool)
    .await?;
    let counts: HashMap<String, i64> = rows.into_iter().collect();

    Ok(keys
        .into_iter()
        .map(|month| MonthlySignups {
            signups: counts.get(&month).copied().unwrap_or(0),
            month,
        })
        .collect())
}

/// Member counters for the dashboard header, evaluated on `today`
pub async fn overview(pool: &SqlitePool, today: NaiveDate) -> RepoResult<DashboardOverview> {
    let (total, active, frozen, signups): (i64, i64, i64, i64) = sqlx::query_as(
        "SELECT COUNT(*), COALESCE(SUM(expiration_date > ?1), 0), COALESCE(SUM(is_frozen), 0), COALESCE(SUM(strftime('%Y-%m', start_date) = ?2), 0) FROM member",
    )
    .bind(today)
    .bind(month_key(today))
    .fetch_one(pool)
    .await?;

    let today_visits: i64 =
        sqlx::query_scalar("SELECT COUNT(DISTINCT member_id) FROM visit WHERE check_in >= ?")
            .bind(start_of_day_millis(today))
            .fetch_one(pool)
            .await?;

    Ok(DashboardOverview {
        total_members: total,
        active_members: active,
        expired_members: total - active,
        frozen_members: frozen,
        signups_this_month: signups,
        today_visits,
        monthly_signups: monthly_signups(pool, today, SIGNUP_WINDOW).await?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::DbService;
    use crate::db::repository::{member, visit};
    use shared::models::{MemberCreate, MemberUpdate, MembershipType};

    const DAY: i64 = 86_400_000;
    // 2025-01-01T00:00:00Z
    const JAN_1: i64 = 1_735_689_600_000;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    async fn add_member(pool: &SqlitePool, name: &str, expires: NaiveDate) -> i64 {
        add_member_from(pool, name, date(2024, 1, 1), expires).await
    }

    async fn add_member_from(
        pool: &SqlitePool,
        name: &str,
        start: NaiveDate,
        expires: NaiveDate,
    ) -> i64 {
        member::create(
            pool,
            MemberCreate {
                name: name.into(),
                contact_number: "1".into(),
                membership_type: MembershipType::Basic,
                start_date: start,
                expiration_date: expires,
                card_id: None,
            },
        )
        .await
        .unwrap()
        .id
    }

    #[tokio::test]
    async fn daily_counts_distinct_members_per_day() {
        let pool = DbService::in_memory().await.unwrap().pool;
        let far = NaiveDate::from_ymd_opt(2030, 1, 1).unwrap();
        let a = add_member(&pool, "A", far).await;
        let b = add_member(&pool, "B", far).await;

        // A visits twice on Jan 1, B once; only A on Jan 2
        visit::check_in(&pool, a, JAN_1 + 1_000).await.unwrap();
        visit::check_in(&pool, a, JAN_1 + 5_000).await.unwrap();
        visit::check_in(&pool, b, JAN_1 + 9_000).await.unwrap();
        visit::check_in(&pool, a, JAN_1 + DAY + 1_000).await.unwrap();

        let daily = daily_counts(&pool, DAILY_WINDOW).await.unwrap();
        assert_eq!(
            daily,
            vec![
                DailyCount { date: "2025-01-02".into(), count: 1 },
                DailyCount { date: "2025-01-01".into(), count: 2 },
            ]
        );

        let monthly = monthly_counts(&pool, MONTHLY_WINDOW).await.unwrap();
        assert_eq!(monthly, vec![MonthlyCount { month: "2025-01".into(), count: 2 }]);

        // Idempotent without intervening writes
        assert_eq!(daily_counts(&pool, DAILY_WINDOW).await.unwrap(), daily);
    }

    #[tokio::test]
    async fn daily_window_keeps_most_recent_days() {
        let pool = DbService::in_memory().await.unwrap().pool;
        let a = add_member(&pool, "A", NaiveDate::from_ymd_opt(2030, 1, 1).unwrap()).await;
        for day in 0..10 {
            visit::check_in(&pool, a, JAN_1 + day * DAY).await.unwrap();
        }

        let daily = daily_counts(&pool, DAILY_WINDOW).await.unwrap();
        assert_eq!(daily.len(), 7);
        assert_eq!(daily[0].date, "2025-01-10");
        assert_eq!(daily[6].date, "2025-01-04");
    }

    #[tokio::test]
    async fn overview_counts_members() {
        let pool = DbService::in_memory().await.unwrap().pool;
        let today = shared::util::today();
        let a = add_member_from(&pool, "A", today, today + chrono::Days::new(30)).await;
        add_member_from(&pool, "B", today, today).await;
        // entered long ago, not a signup this month
        add_member(&pool, "C", date(2024, 6, 1)).await;
        member::update(
            &pool,
            a,
            MemberUpdate {
                is_frozen: Some(true),
                ..Default::default()
            },
        )
        .await
        .unwrap();
        visit::check_in(&pool, a, shared::util::now_millis()).await.unwrap();

        let o = overview(&pool, today).await.unwrap();
        assert_eq!(o.total_members, 3);
        assert_eq!(o.active_members, 1);
        assert_eq!(o.expired_members, 2);
        assert_eq!(o.frozen_members, 1);
        assert_eq!(o.signups_this_month, 2);
        assert_eq!(o.today_visits, 1);
        assert_eq!(o.monthly_signups.len(), SIGNUP_WINDOW as usize);
        assert_eq!(o.monthly_signups.last().unwrap().signups, 2);
    }

    #[tokio::test]
    async fn signups_follow_start_date_not_entry_date() {
        let pool = DbService::in_memory().await.unwrap().pool;
        let far = date(2030, 1, 1);
        let today = date(2025, 3, 15);
        add_member_from(&pool, "A", date(2025, 3, 1), far).await;
        add_member_from(&pool, "B", date(2025, 3, 20), far).await;
        add_member_from(&pool, "C", date(2025, 1, 10), far).await;
        // outside the window on both sides
        add_member_from(&pool, "D", date(2024, 8, 31), far).await;
        add_member_from(&pool, "E", date(2025, 4, 1), far).await;

        let series = monthly_signups(&pool, today, SIGNUP_WINDOW).await.unwrap();
        let months: Vec<_> = series.iter().map(|m| m.month.as_str()).collect();
        assert_eq!(
            months,
            ["2024-09", "2024-10", "2024-11", "2024-12", "2025-01", "2025-02", "2025-03"]
        );
        let counts: Vec<_> = series.iter().map(|m| m.signups).collect();
        assert_eq!(counts, [0, 0, 0, 0, 1, 0, 2]);

        let o = overview(&pool, today).await.unwrap();
        assert_eq!(o.signups_this_month, 2);
        assert_eq!(o.monthly_signups, series);
    }
}
