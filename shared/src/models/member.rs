//! Member Model

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::{AppError, ErrorCode};
use crate::relay::{CardUid, InvalidUid};
use crate::util::flexible_date;

/// Membership tier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String")]
pub enum MembershipType {
    Basic,
    Premium,
    Elite,
}

impl MembershipType {
    pub const ALL: [MembershipType; 3] = [Self::Basic, Self::Premium, Self::Elite];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Basic => "Basic",
            Self::Premium => "Premium",
            Self::Elite => "Elite",
        }
    }
}

impl fmt::Display for MembershipType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown membership type: {0}")]
pub struct ParseMembershipTypeError(pub String);

impl FromStr for MembershipType {
    type Err = ParseMembershipTypeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        Self::ALL
            .into_iter()
            .find(|t| t.as_str().eq_ignore_ascii_case(trimmed))
            .ok_or_else(|| ParseMembershipTypeError(s.to_string()))
    }
}

impl TryFrom<String> for MembershipType {
    type Error = ParseMembershipTypeError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

/// Member entity (gym client)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "db", derive(sqlx::FromRow))]
#[serde(rename_all = "camelCase")]
pub struct Member {
    pub id: i64,
    pub name: String,
    pub contact_number: String,
    #[cfg_attr(feature = "db", sqlx(try_from = "String"))]
    pub membership_type: MembershipType,
    #[serde(with = "flexible_date")]
    pub start_date: NaiveDate,
    #[serde(with = "flexible_date")]
    pub expiration_date: NaiveDate,
    pub is_frozen: bool,
    pub card_id: Option<String>,
    pub created_at: i64,
    pub updated_at: i64,
}

impl Member {
    /// Membership has not yet expired on `today`
    pub fn is_active(&self, today: NaiveDate) -> bool {
        self.expiration_date > today
    }
}

/// Create member payload (intake form)
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MemberCreate {
    pub name: String,
    pub contact_number: String,
    pub membership_type: MembershipType,
    #[serde(with = "flexible_date")]
    pub start_date: NaiveDate,
    #[serde(with = "flexible_date")]
    pub expiration_date: NaiveDate,
    #[serde(default)]
    pub card_id: Option<String>,
}

impl MemberCreate {
    /// Trim text fields, drop a blank card id and check field rules
    pub fn normalized(mut self) -> Result<Self, AppError> {
        self.name = self.name.trim().to_string();
        self.contact_number = self.contact_number.trim().to_string();
        self.card_id = normalize_card_id(self.card_id.as_deref())?;

        if self.name.is_empty() {
            return Err(AppError::required("Name is required"));
        }
        if self.contact_number.is_empty() {
            return Err(AppError::required("Contact number is required"));
        }
        check_period(self.start_date, self.expiration_date)?;
        Ok(self)
    }
}

/// Partial update payload (renewal, freeze toggle, card reassignment)
///
/// Absent fields are left unchanged. `cardId: ""` clears the card.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MemberUpdate {
    #[serde(default)]
    pub membership_type: Option<MembershipType>,
    #[serde(
        default,
        deserialize_with = "flexible_date::option::deserialize",
        skip_serializing_if = "Option::is_none"
    )]
    pub expiration_date: Option<NaiveDate>,
    #[serde(default)]
    pub is_frozen: Option<bool>,
    #[serde(default)]
    pub card_id: Option<String>,
}

impl MemberUpdate {
    pub fn is_empty(&self) -> bool {
        self.membership_type.is_none()
            && self.expiration_date.is_none()
            && self.is_frozen.is_none()
            && self.card_id.is_none()
    }
}

/// Member fields embedded in attendance logs
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "db", derive(sqlx::FromRow))]
#[serde(rename_all = "camelCase")]
pub struct MemberSummary {
    pub id: i64,
    pub name: String,
    pub contact_number: String,
    #[cfg_attr(feature = "db", sqlx(try_from = "String"))]
    pub membership_type: MembershipType,
}

/// Blank → `None`; otherwise the canonical [`CardUid`] form
pub fn normalize_card_id(raw: Option<&str>) -> Result<Option<String>, AppError> {
    let Some(raw) = raw else {
        return Ok(None);
    };
    match CardUid::new(raw) {
        Ok(uid) => Ok(Some(uid.into())),
        Err(InvalidUid::Empty) => Ok(None),
        Err(e) => Err(AppError::validation(format!("Invalid card id: {e}"))),
    }
}

/// A membership must not expire before it starts
pub fn check_period(start: NaiveDate, expiration: NaiveDate) -> Result<(), AppError> {
    if start > expiration {
        return Err(AppError::new(ErrorCode::InvalidMembershipPeriod));
    }
    Ok(())
}
