pub mod classifier;
pub mod config;

pub use classifier::classify;
pub use config::PostureThresholds;
