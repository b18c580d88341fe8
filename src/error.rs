use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

/// Errors surfaced by `LinearCounter` and `WindowManager`.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum Error {
    #[error("estimator capacity must be positive, got {capacity}")]
    InvalidCapacity { capacity: usize },
    /// Serialized bitmap does not match its declared capacity.
    #[error("bitmap of {words} words is invalid for capacity {capacity}")]
    InvalidBitmap { capacity: usize, words: usize },
    #[error("window length must be positive, got {seconds}s")]
    InvalidWindowLength { seconds: i64 },
    #[error("fill warning ratio must be in (0, 1], got {ratio}")]
    InvalidFillWarningRatio { ratio: f64 },
    /// Every bitmap cell is set, so `-m * ln(0)` has no finite value.
    #[error("bitmap of {capacity} cells is saturated")]
    Saturated { capacity: usize },
    /// Event maps to a window that was already emitted.
    #[error(
        "late event at ts {timestamp}: window {window_index} is behind current window {current_window_index}"
    )]
    LateEvent {
        timestamp: i64,
        window_index: i64,
        current_window_index: i64,
    },
    /// Window start of the event does not fit in `i64` seconds.
    #[error("ts {timestamp} maps to window {window_index} whose start is out of range")]
    WindowOutOfRange { timestamp: i64, window_index: i64 },
    #[error("window manager was flushed and accepts no more events")]
    Closed,
}
