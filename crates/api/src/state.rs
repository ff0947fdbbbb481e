use crate::counters::Counters;

#[derive(Clone)]
pub struct AppState {
    /// Presence and catch counters (backend may be unconfigured).
    pub counters: Counters,
}
