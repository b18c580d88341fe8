//! Tumbling-window lifecycle around `LinearCounter`.
//!
//! `WindowManager` owns exactly one live estimator. Event time decides when a
//! window closes: the first event mapping to a later window index emits the
//! previous window's estimate and swaps in a fresh, empty estimator. Windows
//! skipped entirely (no events) are not emitted. End of stream is signalled
//! with `flush`, which emits the last open window.
//!
//! ```text
//! Uninitialized --observe--> Active(w) --observe(w2 > w)--> Active(w2)
//!                                |
//!                              flush
//!                                v
//!                             Closing
//! ```
use std::hash::{Hash, Hasher};
use std::mem;

use log::{debug, warn};
#[cfg(feature = "with_serde")]
use serde::{Deserialize, Serialize};
use wyhash::WyHash;

use crate::error::{Error, Result};
use crate::estimator::LinearCounter;

/// Default tumbling window length in seconds
pub const DEFAULT_WINDOW_LENGTH_SECONDS: i64 = 60;
/// Default number of bitmap cells per window
pub const DEFAULT_ESTIMATOR_CAPACITY: usize = 60_000;
/// Default fill ratio above which a closing window logs a sizing warning
pub const DEFAULT_FILL_WARNING_RATIO: f64 = 0.7;

#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "with_serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "with_serde", serde(default))]
pub struct WindowConfig {
    pub window_length_seconds: i64,
    /// Bitmap cells (`m`) for every window's estimator. Size it for the
    /// expected peak distinct count per window: too small saturates, too
    /// large wastes memory.
    pub estimator_capacity: usize,
    pub fill_warning_ratio: f64,
}

impl WindowConfig {
    pub fn new(window_length_seconds: i64, estimator_capacity: usize) -> Result<Self> {
        let config = Self {
            window_length_seconds,
            estimator_capacity,
            ..Self::default()
        };
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.window_length_seconds <= 0 {
            return Err(Error::InvalidWindowLength {
                seconds: self.window_length_seconds,
            });
        }
        if self.estimator_capacity == 0 {
            return Err(Error::InvalidCapacity {
                capacity: self.estimator_capacity,
            });
        }
        if !(self.fill_warning_ratio > 0.0 && self.fill_warning_ratio <= 1.0) {
            return Err(Error::InvalidFillWarningRatio {
                ratio: self.fill_warning_ratio,
            });
        }
        Ok(())
    }
}

impl Default for WindowConfig {
    fn default() -> Self {
        Self {
            window_length_seconds: DEFAULT_WINDOW_LENGTH_SECONDS,
            estimator_capacity: DEFAULT_ESTIMATOR_CAPACITY,
            fill_warning_ratio: DEFAULT_FILL_WARNING_RATIO,
        }
    }
}

/// Observable lifecycle state of a `WindowManager`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WindowState {
    Uninitialized,
    Active(i64),
    /// Terminal, reached through `flush`
    Closing,
}

/// Distinct count of a closed window
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "with_serde", derive(Serialize, Deserialize))]
pub enum Cardinality {
    Estimated(f64),
    /// All `capacity` cells were set; only a lower bound is known.
    Saturated { capacity: usize },
}

impl Cardinality {
    fn of<H: Hasher + Default>(counter: &LinearCounter<H>) -> Self {
        match counter.estimate() {
            Ok(estimate) => Cardinality::Estimated(estimate),
            Err(_) => Cardinality::Saturated {
                capacity: counter.capacity(),
            },
        }
    }

    /// Return estimate, or `None` when saturated
    #[inline]
    pub fn value(&self) -> Option<f64> {
        match self {
            Cardinality::Estimated(estimate) => Some(*estimate),
            Cardinality::Saturated { .. } => None,
        }
    }

    /// Return estimate, or `m * ln(m)` when saturated
    #[inline]
    pub fn lower_bound(&self) -> f64 {
        match self {
            Cardinality::Estimated(estimate) => *estimate,
            Cardinality::Saturated { capacity } => {
                let m = *capacity as f64;
                m * m.ln()
            }
        }
    }
}

/// Result emitted once per closed window
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "with_serde", derive(Serialize, Deserialize))]
pub struct WindowEstimate {
    pub window_index: i64,
    /// `window_index * window_length_seconds`
    pub window_start: i64,
    pub cardinality: Cardinality,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
#[cfg_attr(feature = "with_serde", derive(Serialize, Deserialize))]
pub struct WindowStats {
    /// Events added to an estimator
    pub observed: u64,
    /// Events rejected with `Error::LateEvent`
    pub late: u64,
    /// Windows emitted through `observe` or `flush`
    pub emitted: u64,
}

enum Slot<H: Hasher + Default> {
    Uninitialized,
    Active {
        window_index: i64,
        counter: LinearCounter<H>,
    },
    Closing,
}

/// Single-consumer tumbling window manager. Not internally synchronized;
/// run one instance per stream partition.
pub struct WindowManager<H: Hasher + Default = WyHash> {
    config: WindowConfig,
    slot: Slot<H>,
    stats: WindowStats,
}

impl<H: Hasher + Default> WindowManager<H> {
    pub fn new(config: WindowConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            config,
            slot: Slot::Uninitialized,
            stats: WindowStats::default(),
        })
    }

    /// Map timestamp (seconds) to its window index, flooring for negative timestamps.
    #[inline]
    pub fn window_index(&self, timestamp: i64) -> i64 {
        timestamp.div_euclid(self.config.window_length_seconds)
    }

    /// Route an event into its window.
    ///
    /// Returns the previous window's estimate when `timestamp` crosses into a
    /// later window, at most one per call. Events behind the current window are
    /// rejected with `Error::LateEvent` and leave every estimator untouched.
    pub fn observe<T: Hash + ?Sized>(
        &mut self,
        timestamp: i64,
        item: &T,
    ) -> Result<Option<WindowEstimate>> {
        let window_index = self.window_index(timestamp);
        let current_window_index = match &self.slot {
            Slot::Closing => return Err(Error::Closed),
            Slot::Uninitialized => None,
            Slot::Active { window_index, .. } => Some(*window_index),
        };
        // emitted `window_start` must stay representable
        if window_index
            .checked_mul(self.config.window_length_seconds)
            .is_none()
        {
            return Err(Error::WindowOutOfRange {
                timestamp,
                window_index,
            });
        }

        let emitted = match current_window_index {
            Some(current) if current == window_index => None,
            Some(current) if window_index < current => {
                self.stats.late += 1;
                warn!(
                    "late event at ts {} for window {}, current window is {}",
                    timestamp, window_index, current
                );
                return Err(Error::LateEvent {
                    timestamp,
                    window_index,
                    current_window_index: current,
                });
            }
            _ => self.open(window_index)?,
        };

        if let Slot::Active { counter, .. } = &mut self.slot {
            counter.insert(item);
            self.stats.observed += 1;
        }
        Ok(emitted)
    }

    /// Emit the open window and stop accepting events.
    ///
    /// No-op when no event was observed yet or when already flushed.
    pub fn flush(&mut self) -> Option<WindowEstimate> {
        match mem::replace(&mut self.slot, Slot::Closing) {
            Slot::Active {
                window_index,
                counter,
            } => Some(self.emit(window_index, counter)),
            Slot::Uninitialized => {
                self.slot = Slot::Uninitialized;
                None
            }
            Slot::Closing => None,
        }
    }

    /// Estimate of the open window without closing it
    pub fn current_estimate(&self) -> Option<WindowEstimate> {
        match &self.slot {
            Slot::Active {
                window_index,
                counter,
            } => Some(self.window_estimate(*window_index, counter)),
            _ => None,
        }
    }

    pub fn state(&self) -> WindowState {
        match &self.slot {
            Slot::Uninitialized => WindowState::Uninitialized,
            Slot::Active { window_index, .. } => WindowState::Active(*window_index),
            Slot::Closing => WindowState::Closing,
        }
    }

    pub fn current_window_index(&self) -> Option<i64> {
        match self.state() {
            WindowState::Active(window_index) => Some(window_index),
            _ => None,
        }
    }

    pub fn stats(&self) -> WindowStats {
        self.stats
    }

    pub fn config(&self) -> &WindowConfig {
        &self.config
    }

    /// Swap in a fresh estimator for `window_index`, emitting the replaced one if any
    fn open(&mut self, window_index: i64) -> Result<Option<WindowEstimate>> {
        let counter = LinearCounter::new(self.config.estimator_capacity)?;
        debug!("opening window {}", window_index);
        match mem::replace(
            &mut self.slot,
            Slot::Active {
                window_index,
                counter,
            },
        ) {
            Slot::Active {
                window_index,
                counter,
            } => Ok(Some(self.emit(window_index, counter))),
            _ => Ok(None),
        }
    }

    /// Capture final estimate of `counter`, which is dropped afterwards
    fn emit(&mut self, window_index: i64, counter: LinearCounter<H>) -> WindowEstimate {
        let estimate = self.window_estimate(window_index, &counter);
        self.stats.emitted += 1;

        match estimate.cardinality {
            Cardinality::Saturated { capacity } => warn!(
                "window {} saturated all {} cells, increase estimator capacity",
                window_index, capacity
            ),
            Cardinality::Estimated(_) if counter.fill_ratio() > self.config.fill_warning_ratio => {
                warn!(
                    "window {} filled {:.1}% of {} cells, estimate accuracy is degraded",
                    window_index,
                    counter.fill_ratio() * 100.0,
                    counter.capacity()
                )
            }
            Cardinality::Estimated(_) => {}
        }
        debug!(
            "closing window {} with estimate {:?}",
            window_index, estimate.cardinality
        );
        estimate
    }

    fn window_estimate(&self, window_index: i64, counter: &LinearCounter<H>) -> WindowEstimate {
        WindowEstimate {
            window_index,
            window_start: window_index * self.config.window_length_seconds,
            cardinality: Cardinality::of(counter),
        }
    }
}
