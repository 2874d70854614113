pub mod auth_service;
pub mod preference_service;
pub mod shift_service;
pub mod user_service;

pub use auth_service::{AuthError, AuthService};
pub use preference_service::{PreferenceError, PreferenceService};
pub use shift_service::{NewShiftRecord, ShiftError, ShiftService, UpdateShift};
pub use user_service::{NewUser, UpdateUser, UserError, UserService};
