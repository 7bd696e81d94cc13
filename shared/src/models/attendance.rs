//! Attendance API payloads

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use super::member::{Member, MembershipType};
use crate::util::flexible_date;

/// `POST /api/attendance` body
///
/// `uid` is optional at the serde level so that a missing field yields the
/// same "UID is required" error as a blank one.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CheckInRequest {
    #[serde(default)]
    pub uid: Option<String>,
}

/// Profile snapshot returned after a successful check-in
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CheckInSnapshot {
    pub uid: String,
    pub name: String,
    pub membership_type: MembershipType,
    #[serde(with = "flexible_date")]
    pub start_date: NaiveDate,
    #[serde(with = "flexible_date")]
    pub expiration_date: NaiveDate,
    pub is_frozen: bool,
    pub last_visit: DateTime<Utc>,
}

impl CheckInSnapshot {
    pub fn new(uid: impl Into<String>, member: &Member, last_visit: DateTime<Utc>) -> Self {
        Self {
            uid: uid.into(),
            name: member.name.clone(),
            membership_type: member.membership_type,
            start_date: member.start_date,
            expiration_date: member.expiration_date,
            is_frozen: member.is_frozen,
            last_visit,
        }
    }
}

/// Distinct visitors on one calendar day
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "db", derive(sqlx::FromRow))]
pub struct DailyCount {
    /// `YYYY-MM-DD`
    pub date: String,
    pub count: i64,
}

/// Distinct visitors in one calendar month
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "db", derive(sqlx::FromRow))]
pub struct MonthlyCount {
    /// `YYYY-MM`
    pub month: String,
    pub count: i64,
}

/// Members whose membership started in one calendar month
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MonthlySignups {
    /// `YYYY-MM`
    pub month: String,
    pub signups: i64,
}

/// Dashboard time series
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AttendanceSummary {
    pub daily: Vec<DailyCount>,
    pub monthly: Vec<MonthlyCount>,
}

impl AttendanceSummary {
    /// Re-sort both series oldest-first (chart order)
    pub fn into_ascending(mut self) -> Self {
        self.daily.sort_by(|a, b| a.date.cmp(&b.date));
        self.monthly.sort_by(|a, b| a.month.cmp(&b.month));
        self
    }
}

/// Member counters shown on the dashboard header
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardOverview {
    pub total_members: i64,
    pub active_members: i64,
    pub expired_members: i64,
    pub frozen_members: i64,
    /// Members whose start date falls in the current month
    pub signups_this_month: i64,
    pub today_visits: i64,
    /// Signups per month, oldest first, current month last. Months without
    /// signups are present with zero.
    pub monthly_signups: Vec<MonthlySignups>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn check_in_request_tolerates_missing_uid() {
        let req: CheckInRequest = serde_json::from_str("{}").unwrap();
        assert!(req.uid.is_none());
        let req: CheckInRequest = serde_json::from_str(r#"{"uid":"ABC123"}"#).unwrap();
        assert_eq!(req.uid.as_deref(), Some("ABC123"));
    }

    #[test]
    fn summary_ascending_sort() {
        let summary = AttendanceSummary {
            daily: vec![
                DailyCount { date: "2025-01-03".into(), count: 1 },
                DailyCount { date: "2025-01-01".into(), count: 4 },
            ],
            monthly: vec![
                MonthlyCount { month: "2025-01".into(), count: 5 },
                MonthlyCount { month: "2024-12".into(), count: 2 },
            ],
        }
        .into_ascending();
        assert_eq!(summary.daily[0].date, "2025-01-01");
        assert_eq!(summary.monthly[0].month, "2024-12");
    }
}
