pub mod tracker;

pub use tracker::{DayTracker, TrackerError};
