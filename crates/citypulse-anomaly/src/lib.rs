//! # citypulse-anomaly
//!
//! The Anomaly Scoring Engine: blends rule-based deviation checks against
//! zone baselines with an optional trained isolation forest. The engine is
//! fully operational in rule-only mode before any training has happened;
//! model inference failures degrade the affected call silently instead of
//! surfacing.

mod engine;
mod explain;
mod forest;
mod scaler;

pub use engine::{AnomalyEngine, ModelPass};
pub use forest::{ForestConfig, IsolationForest};
pub use scaler::StandardScaler;
