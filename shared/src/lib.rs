pub mod models;

pub use models::{StatusSnapshot, ThreatLevel};
