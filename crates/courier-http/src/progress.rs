//! Upload progress reporting
//!
//! Callers supply a [`ProgressDelegate`] per call. Transports never see the
//! delegate directly: they get a [`ProgressReporter`], which clamps values
//! into `[0.0, 1.0]` and drops anything lower than what was already
//! reported, so delegates observe a non-decreasing sequence even across
//! retries. Callbacks run on whatever thread the transport is using.

use std::{
    fmt,
    sync::{
        atomic::{AtomicU64, Ordering},
        Arc,
    },
};

/// Receives the fraction of the request body sent so far
pub trait ProgressDelegate: Send + Sync {
    fn on_progress(&self, fraction: f64);
}

impl<F> ProgressDelegate for F
where
    F: Fn(f64) + Send + Sync,
{
    fn on_progress(&self, fraction: f64) {
        self(fraction)
    }
}

/// Monotonic wrapper handed to transports
#[derive(Clone)]
pub struct ProgressReporter {
    delegate: Arc<dyn ProgressDelegate>,
    // f64 bits of the highest fraction delivered; u64::MAX until the first report
    last: Arc<AtomicU64>,
}

const NOTHING_REPORTED: u64 = u64::MAX;

impl ProgressReporter {
    pub fn new(delegate: Arc<dyn ProgressDelegate>) -> Self {
        Self {
            delegate,
            last: Arc::new(AtomicU64::new(NOTHING_REPORTED)),
        }
    }

    /// Report a fraction; NaN and regressions are ignored
    pub fn report(&self, fraction: f64) {
        if fraction.is_nan() {
            return;
        }
        let fraction = fraction.clamp(0.0, 1.0);
        let bits = fraction.to_bits();

        let accepted = self
            .last
            .fetch_update(Ordering::AcqRel, Ordering::Acquire, |prev| {
                if prev == NOTHING_REPORTED || f64::from_bits(prev) <= fraction {
                    Some(bits)
                } else {
                    None
                }
            })
            .is_ok();

        if accepted {
            self.delegate.on_progress(fraction);
        }
    }

    /// Report `sent / total` bytes; an empty body counts as complete
    pub fn report_bytes(&self, sent: u64, total: u64) {
        if total == 0 {
            self.report(1.0);
        } else {
            self.report(sent as f64 / total as f64);
        }
    }

    pub fn complete(&self) {
        self.report(1.0);
    }

    /// Highest fraction delivered so far
    pub fn last_reported(&self) -> Option<f64> {
        match self.last.load(Ordering::Acquire) {
            NOTHING_REPORTED => None,
            bits => Some(f64::from_bits(bits)),
        }
    }
}

impl fmt::Debug for ProgressReporter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ProgressReporter")
            .field("last_reported", &self.last_reported())
            .finish()
    }
}
