//! Shared prediction service with single-flight background training.

use std::panic::{AssertUnwindSafe, catch_unwind};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Condvar, Mutex, MutexGuard, PoisonError};
use std::thread;
use std::time::{Duration, Instant};

use serde::Serialize;
use tracing::{info, warn};

use super::PriorityError;
use super::pipeline::{TrainedScorer, TrainingReport, train_from_source};
use super::result::{ComplaintPayload, PriorityResult};
use crate::config::{ConfigError, Settings};
use crate::dataset::{BundledTestData, CsvFileSource, SampleSource};
use crate::ml::regressor::TrainOptions;

const TRAINING_THREAD_NAME: &str = "priority-training";

enum TrainingState {
    Absent { last_error: Option<String> },
    Training,
    Ready {
        scorer: Arc<TrainedScorer>,
        report: Arc<TrainingReport>,
    },
}

struct Shared {
    state: Mutex<TrainingState>,
    ready: Condvar,
    source: Arc<dyn SampleSource>,
    options: TrainOptions,
    timeout: Duration,
    training_runs: AtomicU64,
    predictions: AtomicU64,
    fallbacks: AtomicU64,
}

impl Shared {
    fn lock_state(&self) -> MutexGuard<'_, TrainingState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn run_training(&self) {
        let outcome = catch_unwind(AssertUnwindSafe(|| {
            train_from_source(self.source.as_ref(), &self.options)
        }));
        let next = match outcome {
            Ok(Ok((scorer, report))) => TrainingState::Ready {
                scorer: Arc::new(scorer),
                report: Arc::new(report),
            },
            Ok(Err(err)) => {
                warn!("Priority model training failed: {err}");
                TrainingState::Absent {
                    last_error: Some(err.to_string()),
                }
            }
            Err(_) => {
                warn!("Priority model training panicked");
                TrainingState::Absent {
                    last_error: Some("training thread panicked".to_string()),
                }
            }
        };
        *self.lock_state() = next;
        self.ready.notify_all();
    }
}

/// Counters exposed to operators.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ServiceStats {
    pub training_runs: u64,
    pub predictions: u64,
    pub fallbacks: u64,
    pub ready: bool,
}

/// Owns the trained scorer and hands out predictions.
///
/// Training starts on the first [`warmup`](Self::warmup) or prediction and runs
/// once on a background thread; concurrent callers wait on the same run. A
/// failed run leaves the service untrained so a later call retries.
#[derive(Clone)]
pub struct PriorityService {
    shared: Arc<Shared>,
}

impl PriorityService {
    pub fn new(source: impl SampleSource + 'static, options: TrainOptions, timeout: Duration) -> Self {
        Self::with_source(Arc::new(source), options, timeout)
    }

    pub fn with_source(source: Arc<dyn SampleSource>, options: TrainOptions, timeout: Duration) -> Self {
        Self {
            shared: Arc::new(Shared {
                state: Mutex::new(TrainingState::Absent { last_error: None }),
                ready: Condvar::new(),
                source,
                options,
                timeout,
                training_runs: AtomicU64::new(0),
                predictions: AtomicU64::new(0),
                fallbacks: AtomicU64::new(0),
            }),
        }
    }

    /// Service reading the CSV dataset chosen by `settings`.
    ///
    /// When the test dataset is selected but not installed in the data
    /// directory, the copy compiled into the binary is used instead.
    pub fn from_settings(settings: &Settings) -> Result<Self, ConfigError> {
        let csv = CsvFileSource::new(settings.dataset_path()?);
        let source: Arc<dyn SampleSource> = if settings.uses_test_data() && !csv.path().exists() {
            info!(
                "Priority dataset {} not found, using the bundled test dataset",
                csv.path().display()
            );
            Arc::new(BundledTestData)
        } else {
            info!("Priority dataset: {}", csv.path().display());
            Arc::new(csv)
        };
        Ok(Self::with_source(
            source,
            settings.training.to_options(),
            settings.service.training_timeout(),
        ))
    }

    /// Start training in the background unless it is running or done.
    ///
    /// Returns true when this call started a run.
    pub fn warmup(&self) -> bool {
        let mut state = self.shared.lock_state();
        self.start_if_absent(&mut state)
    }

    /// Block until the model is trained, starting training if needed.
    pub fn wait_until_ready(&self, timeout: Duration) -> Result<(), PriorityError> {
        self.scorer_within(timeout).map(|_| ())
    }

    pub fn is_ready(&self) -> bool {
        matches!(*self.shared.lock_state(), TrainingState::Ready { .. })
    }

    /// Diagnostics of the run that produced the current model.
    pub fn training_report(&self) -> Option<Arc<TrainingReport>> {
        match &*self.shared.lock_state() {
            TrainingState::Ready { report, .. } => Some(Arc::clone(report)),
            _ => None,
        }
    }

    pub fn stats(&self) -> ServiceStats {
        ServiceStats {
            training_runs: self.shared.training_runs.load(Ordering::Relaxed),
            predictions: self.shared.predictions.load(Ordering::Relaxed),
            fallbacks: self.shared.fallbacks.load(Ordering::Relaxed),
            ready: self.is_ready(),
        }
    }

    /// Score a complaint. Never fails: any error yields [`PriorityResult::fallback`].
    pub fn predict(&self, payload: &ComplaintPayload) -> PriorityResult {
        match self.score(payload) {
            Ok(score) => {
                self.shared.predictions.fetch_add(1, Ordering::Relaxed);
                PriorityResult::from_score(score, payload)
            }
            Err(err) => {
                warn!("Priority prediction failed, using fallback: {err}");
                self.shared.fallbacks.fetch_add(1, Ordering::Relaxed);
                PriorityResult::fallback(payload)
            }
        }
    }

    /// Raw model score, waiting up to the configured timeout for training.
    pub fn score(&self, payload: &ComplaintPayload) -> Result<f32, PriorityError> {
        let scorer = self.scorer_within(self.shared.timeout)?;
        scorer.score(payload)
    }

    fn scorer_within(&self, timeout: Duration) -> Result<Arc<TrainedScorer>, PriorityError> {
        // A deadline past the clock's range means "wait for the run to finish".
        let deadline = Instant::now().checked_add(timeout);
        let mut state = self.shared.lock_state();
        self.start_if_absent(&mut state);
        loop {
            match &*state {
                TrainingState::Ready { scorer, .. } => return Ok(Arc::clone(scorer)),
                TrainingState::Absent { last_error } => {
                    return Err(PriorityError::Training(
                        last_error
                            .clone()
                            .unwrap_or_else(|| "training did not start".to_string()),
                    ));
                }
                TrainingState::Training => {}
            }
            state = match deadline {
                Some(deadline) => {
                    let now = Instant::now();
                    if now >= deadline {
                        return Err(PriorityError::NotReady(timeout));
                    }
                    self.shared
                        .ready
                        .wait_timeout(state, deadline - now)
                        .unwrap_or_else(PoisonError::into_inner)
                        .0
                }
                None => self
                    .shared
                    .ready
                    .wait(state)
                    .unwrap_or_else(PoisonError::into_inner),
            };
        }
    }

    fn start_if_absent(&self, state: &mut MutexGuard<'_, TrainingState>) -> bool {
        if !matches!(**state, TrainingState::Absent { .. }) {
            return false;
        }
        let run = self.shared.training_runs.fetch_add(1, Ordering::Relaxed) + 1;
        info!(
            "Starting priority model training run {run} from {}",
            self.shared.source.describe()
        );
        let shared = Arc::clone(&self.shared);
        let spawned = thread::Builder::new()
            .name(TRAINING_THREAD_NAME.to_string())
            .spawn(move || shared.run_training());
        match spawned {
            Ok(_) => {
                **state = TrainingState::Training;
                true
            }
            Err(err) => {
                warn!("Failed to spawn priority training thread: {err}");
                **state = TrainingState::Absent {
                    last_error: Some(err.to_string()),
                };
                false
            }
        }
    }
}
