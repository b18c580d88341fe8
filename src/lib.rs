//! `windowed-cardinality` estimates the number of distinct identifiers observed per
//! fixed-length tumbling window of an event stream.
//!
//! Each window is counted with a fixed-size linear counting bitmap (`LinearCounter`), so
//! memory per window stays constant regardless of the true distinct count.
//! `WindowManager` maps event timestamps to windows, swaps in a fresh estimator when a
//! later window starts, and emits one `WindowEstimate` per closed window.
mod error;
pub mod estimator;
#[cfg(feature = "with_serde")]
mod serde;
pub mod window;

pub use error::{Error, Result};
pub use estimator::LinearCounter;
pub use window::{Cardinality, WindowConfig, WindowEstimate, WindowManager, WindowState, WindowStats};
