//! Domain models shared by the server and the card bridge

pub mod attendance;
pub mod member;
pub mod visit;

pub use attendance::{
    AttendanceSummary, CheckInRequest, CheckInSnapshot, DailyCount, DashboardOverview,
    MonthlyCount, MonthlySignups,
};
pub use member::{
    Member, MemberCreate, MemberSummary, MemberUpdate, MembershipType, ParseMembershipTypeError,
};
pub use visit::{Visit, VisitLog, VisitTransition};
