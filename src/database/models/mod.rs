pub mod preference;
pub mod shift;
pub mod user;

pub use preference::{PreferenceRow, PreferenceView, StaffPreferenceView, WeekCounts, WeekSlots};
pub use shift::{ShiftRow, ShiftView};
pub use user::{Role, UserRef, UserRow, UserSummary, UserView};
