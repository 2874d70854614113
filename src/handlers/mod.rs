pub mod ai_schedule;
pub mod auth;
pub mod preferences;
pub mod profile;
pub mod shifts;
pub mod users;

use std::sync::Arc;

use crate::schedule::ScheduleGenerator;

/// Shared application state. The generator is behind a trait object so
/// tests can swap in a scripted implementation.
#[derive(Clone)]
pub struct AppState {
    pub generator: Arc<dyn ScheduleGenerator>,
}
