//! The Anomaly Scoring Engine.
//!
//! `detect` fuses a rule pass (absolute criticals and relative deviation
//! margins against the zone baseline) with an optional isolation-forest
//! pass, then synthesizes a deterministic explanation. The model lifecycle
//! is a two-state tagged value: `Untrained` (rule-only mode) until `train`
//! fits and persists artifacts, after which the state swaps atomically
//! under a write lock so in-flight detects never observe a partial model.

use crate::explain;
use crate::forest::{ForestConfig, IsolationForest, FEATURES};
use crate::scaler::StandardScaler;
use chrono::{DateTime, Datelike, Local, Timelike};
use citypulse_core::{
    AnomalyVerdict, CityConfig, Deviation, PulseError, Reading, Result, SignalKind, TimeSlot,
};
use parking_lot::RwLock;
use rand::Rng;
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Relative deviation margins that raise a signal even below the absolute
/// critical cutoffs.
const NOISE_MARGIN_DB: f64 = 15.0;
const HEAT_MARGIN_C: f64 = 5.0;
const AQI_MARGIN: f64 = 30.0;
const CROWD_MARGIN: f64 = 10.0;

/// Model-score blend when the forest flags an outlier.
const MODEL_WEIGHT: f64 = 0.6;
const STRESS_WEIGHT: f64 = 0.4;

/// Perturbation sigmas for synthetic training samples, per axis.
const TRAIN_SIGMA: [f64; FEATURES] = [0.15, 0.10, 0.20, 0.25];
/// Synthetic samples drawn around each (zone, slot) baseline.
const SAMPLES_PER_BASELINE: usize = 100;

const MODEL_FILE: &str = "anomaly_model.bin";
const SCALER_FILE: &str = "scaler.bin";

/// Outcome of the model pass for one call.
///
/// `Skipped` covers both the untrained state and a per-call inference
/// failure; either way the verdict falls back to rule-only scoring.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ModelPass {
    Scored { outlier: bool, magnitude: f64 },
    Skipped,
}

#[derive(Debug)]
struct TrainedModel {
    forest: IsolationForest,
    scaler: StandardScaler,
}

impl TrainedModel {
    fn classify(&self, features: [f64; FEATURES]) -> ModelPass {
        let scored = self.scaler.transform(features).and_then(|scaled| {
            Ok(ModelPass::Scored {
                outlier: self.forest.is_outlier(&scaled)?,
                magnitude: self.forest.magnitude(&scaled)?,
            })
        });
        match scored {
            Ok(pass) => pass,
            Err(err) => {
                tracing::warn!(error = %err, "model inference failed, degrading to rule-only");
                ModelPass::Skipped
            }
        }
    }
}

#[derive(Debug)]
enum ModelState {
    Untrained,
    Trained(TrainedModel),
}

/// Anomaly Scoring Engine for one artifact location.
///
/// Safe to share across threads: `detect` takes a read lock on the model
/// state, `train` swaps it under the write lock.
#[derive(Debug)]
pub struct AnomalyEngine {
    config: Arc<CityConfig>,
    model_dir: PathBuf,
    state: RwLock<ModelState>,
}

impl AnomalyEngine {
    /// Build an engine, loading previously persisted artifacts if both are
    /// present. A decodable-but-corrupt artifact fails construction; absent
    /// artifacts start the engine in rule-only mode.
    pub fn new(config: Arc<CityConfig>, model_dir: impl Into<PathBuf>) -> Result<Self> {
        let model_dir = model_dir.into();
        let state = Self::load_state(&model_dir)?;
        Ok(Self {
            config,
            model_dir,
            state: RwLock::new(state),
        })
    }

    fn load_state(model_dir: &Path) -> Result<ModelState> {
        let model_path = model_dir.join(MODEL_FILE);
        let scaler_path = model_dir.join(SCALER_FILE);
        if !model_path.exists() || !scaler_path.exists() {
            return Ok(ModelState::Untrained);
        }

        let forest: IsolationForest = decode_artifact(&model_path)?;
        let scaler: StandardScaler = decode_artifact(&scaler_path)?;
        tracing::info!(path = %model_dir.display(), "loaded trained anomaly model");
        Ok(ModelState::Trained(TrainedModel { forest, scaler }))
    }

    /// Whether a trained model is currently active.
    pub fn is_trained(&self) -> bool {
        matches!(*self.state.read(), ModelState::Trained(_))
    }

    /// Score one reading against its baseline at the current wall clock.
    pub fn detect(&self, reading: &Reading) -> Result<AnomalyVerdict> {
        self.detect_at(reading, Local::now())
    }

    /// Score one reading as of an explicit instant.
    pub fn detect_at(&self, reading: &Reading, when: DateTime<Local>) -> Result<AnomalyVerdict> {
        reading.validate()?;

        let hour = when.hour();
        let baseline = self
            .config
            .baseline(&reading.node_id, hour, Some(when.month()));
        let slot = TimeSlot::from_hour(hour);
        let thresholds = self.config.thresholds();

        // Rule pass: absolute criticals or relative margins over baseline.
        let mut signals = Vec::new();
        let mut deviations = BTreeMap::new();
        let mut raise = |signal: SignalKind, value: f64, base: f64| {
            signals.push(signal);
            deviations.insert(signal, Deviation::new(value, base));
        };

        if reading.noise > thresholds.noise_critical
            || reading.noise - baseline.noise > NOISE_MARGIN_DB
        {
            raise(SignalKind::Noise, reading.noise, baseline.noise);
        }
        if reading.temperature > thresholds.temp_critical
            || reading.temperature - baseline.temp > HEAT_MARGIN_C
        {
            raise(SignalKind::Heat, reading.temperature, baseline.temp);
        }
        if reading.air_quality > thresholds.aqi_critical
            || reading.air_quality - baseline.aqi > AQI_MARGIN
        {
            raise(SignalKind::AirQuality, reading.air_quality, baseline.aqi);
        }
        if reading.crowd_density > thresholds.crowd_critical
            || reading.crowd_density - baseline.crowd > CROWD_MARGIN
        {
            raise(SignalKind::Crowd, reading.crowd_density, baseline.crowd);
        }

        // Model pass: only with a trained model, never fatal.
        let pass = match &*self.state.read() {
            ModelState::Untrained => ModelPass::Skipped,
            ModelState::Trained(model) => model.classify(reading.features()),
        };

        let stress_norm = (f64::from(reading.stress_index) / 100.0).min(0.99);
        let (model_outlier, score) = match pass {
            ModelPass::Scored {
                outlier: true,
                magnitude,
            } => (true, MODEL_WEIGHT * magnitude + STRESS_WEIGHT * stress_norm),
            _ => (false, stress_norm),
        };

        let is_anomaly = model_outlier
            || reading.stress_index > thresholds.stress_critical
            || signals.len() >= 2;

        let explanation = explain::render(
            self.config.node_name(&reading.node_id),
            slot,
            &signals,
            &deviations,
            reading.stress_index,
            thresholds,
        );

        Ok(AnomalyVerdict {
            is_anomaly,
            anomaly_score: (score * 1000.0).round() / 1000.0,
            signals,
            deviations,
            explanation,
            baseline,
            time_context: slot,
            stress_index: reading.stress_index,
        })
    }

    /// Fit the outlier model on synthetically perturbed baselines, persist
    /// both artifacts, and swap them in. Idempotent.
    pub fn train(&self) -> Result<()> {
        let samples = self.synthesize_training_rows()?;
        self.train_with(&samples)
    }

    /// Fit on caller-supplied feature rows instead of synthesized ones.
    pub fn train_with(&self, rows: &[[f64; FEATURES]]) -> Result<()> {
        let mut scaler = StandardScaler::new();
        scaler.fit(rows)?;
        let scaled: Vec<[f64; FEATURES]> = rows
            .iter()
            .map(|&row| scaler.transform(row))
            .collect::<Result<_>>()?;

        let mut forest = IsolationForest::new(ForestConfig::default())?;
        forest.fit(&scaled)?;

        self.persist(&forest, &scaler)?;
        *self.state.write() = ModelState::Trained(TrainedModel { forest, scaler });
        tracing::info!(rows = rows.len(), "anomaly model trained and persisted");
        Ok(())
    }

    /// Multiplicative Gaussian perturbations around every (zone, slot)
    /// baseline: a distribution of typical readings, so the forest learns
    /// the shape of "normal" rather than rare events.
    fn synthesize_training_rows(&self) -> Result<Vec<[f64; FEATURES]>> {
        let mut perturbations = Vec::with_capacity(FEATURES);
        for sigma in TRAIN_SIGMA {
            perturbations.push(rand_distr::Normal::new(0.0, sigma).map_err(|err| {
                PulseError::InvalidParameter {
                    name: "train_sigma".to_string(),
                    reason: err.to_string(),
                }
            })?);
        }

        let mut rng = rand::thread_rng();
        let mut rows = Vec::new();
        for baseline in self.config.slot_baselines() {
            let center = [baseline.noise, baseline.temp, baseline.aqi, baseline.crowd];
            for _ in 0..SAMPLES_PER_BASELINE {
                let mut row = [0.0; FEATURES];
                for axis in 0..FEATURES {
                    let noise: f64 = rng.sample(perturbations[axis]);
                    row[axis] = center[axis] * (1.0 + noise);
                }
                // Crowd counts cannot go negative
                row[3] = row[3].max(0.0);
                rows.push(row);
            }
        }
        Ok(rows)
    }

    fn persist(&self, forest: &IsolationForest, scaler: &StandardScaler) -> Result<()> {
        fs::create_dir_all(&self.model_dir)?;
        write_artifact(&self.model_dir.join(MODEL_FILE), forest)?;
        write_artifact(&self.model_dir.join(SCALER_FILE), scaler)?;
        Ok(())
    }
}

fn decode_artifact<T: serde::de::DeserializeOwned>(path: &Path) -> Result<T> {
    let bytes = fs::read(path)?;
    bincode::deserialize(&bytes).map_err(|err| PulseError::CorruptArtifact {
        path: path.to_path_buf(),
        detail: err.to_string(),
    })
}

/// Write via a temp file and rename, so a crash mid-write never leaves a
/// half-written artifact at the load path.
fn write_artifact<T: serde::Serialize>(path: &Path, value: &T) -> Result<()> {
    let bytes = bincode::serialize(value).map_err(|err| {
        PulseError::Persistence(std::io::Error::new(std::io::ErrorKind::Other, err))
    })?;
    let tmp = path.with_extension("bin.tmp");
    fs::write(&tmp, bytes)?;
    fs::rename(&tmp, path)?;
    Ok(())
}
