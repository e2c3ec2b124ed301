pub mod config;
pub mod controller;
pub mod state;
pub mod timers;

pub use config::TrackerConfig;
pub use controller::{PostureTracker, TrackerEvent};
pub use state::{TrackerSnapshot, TrackerState, TrackingStatus};
pub use timers::{AlertDecision, AlertTimer, InactivityMonitor};
