//! Visit (attendance interval) Model

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::member::MemberSummary;
use crate::util::millis_to_datetime;

/// One attendance interval for a member
///
/// `check_out == None` means the member is still inside.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "db", derive(sqlx::FromRow))]
#[serde(rename_all = "camelCase")]
pub struct Visit {
    pub id: i64,
    pub member_id: i64,
    /// Epoch millis
    pub check_in: i64,
    /// Epoch millis
    pub check_out: Option<i64>,
}

impl Visit {
    pub fn is_open(&self) -> bool {
        self.check_out.is_none()
    }
}

/// Result of applying one card tap to a member's visit state
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VisitTransition {
    /// No open visit existed; a new one was opened
    CheckedIn(Visit),
    /// The latest visit was open and has been closed
    CheckedOut(Visit),
}

impl VisitTransition {
    pub fn visit(&self) -> &Visit {
        match self {
            Self::CheckedIn(v) | Self::CheckedOut(v) => v,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Self::CheckedIn(_) => "check_in",
            Self::CheckedOut(_) => "check_out",
        }
    }
}

/// Attendance log row (visit + member summary), newest first in listings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VisitLog {
    pub id: i64,
    pub check_in: DateTime<Utc>,
    pub check_out: Option<DateTime<Utc>>,
    pub client: MemberSummary,
}

impl VisitLog {
    pub fn new(visit: &Visit, client: MemberSummary) -> Self {
        Self {
            id: visit.id,
            check_in: millis_to_datetime(visit.check_in),
            check_out: visit.check_out.map(millis_to_datetime),
            client,
        }
    }
}
