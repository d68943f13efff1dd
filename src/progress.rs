//! Progress-callback trait for conversion stage events.
//!
//! Inject an [`Arc<dyn ConversionProgressCallback>`] via
//! [`crate::config::ConversionConfigBuilder::progress_callback`] to observe a
//! conversion move through its stages:
//!
//! ```text
//! Validating ─▶ Decoding ─▶ Encoding ─▶ Done
//!      │            │           │
//!      └────────────┴───────────┴──▶ on_failure(kind, message)
//! ```
//!
//! A UI shell forwards these to a spinner or status line. The core is
//! synchronous, so every event fires on the thread that called
//! [`crate::convert::convert`].
//!
//! # Example
//!
//! ```rust
//! use fileconv::{ConversionConfig, ConversionProgressCallback, Stage};
//! use std::sync::Arc;
//!
//! struct PrintStages;
//!
//! impl ConversionProgressCallback for PrintStages {
//!     fn on_stage(&self, stage: Stage) {
//!         eprintln!("{stage}");
//!     }
//! }
//!
//! let config = ConversionConfig::builder()
//!     .progress_callback(Arc::new(PrintStages))
//!     .build();
//! ```

use crate::error::FailureKind;
use crate::output::ConversionOutput;
use serde::Serialize;
use std::fmt;
use std::sync::Arc;

/// The dispatcher's states, in order. There are no retries and no loops.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    Validating,
    Decoding,
    Encoding,
    Done,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Stage::Validating => "validating",
            Stage::Decoding => "decoding",
            Stage::Encoding => "encoding",
            Stage::Done => "done",
        };
        f.write_str(s)
    }
}

/// Called by the dispatcher as a conversion advances.
///
/// All methods default to no-ops so implementations override only what they
/// need.
pub trait ConversionProgressCallback: Send + Sync {
    /// Called on entry to each stage, `Done` included.
    fn on_stage(&self, stage: Stage) {
        let _ = stage;
    }

    /// Called once after the output file is in place.
    fn on_complete(&self, output: &ConversionOutput) {
        let _ = output;
    }

    /// Called once when the conversion stops with an error.
    fn on_failure(&self, kind: FailureKind, message: &str) {
        let _ = (kind, message);
    }
}

/// A no-op implementation, the default when no callback is configured.
pub struct NoopProgressCallback;

impl ConversionProgressCallback for NoopProgressCallback {}

/// Convenience alias matching the type stored in [`crate::config::ConversionConfig`].
pub type ProgressCallback = Arc<dyn ConversionProgressCallback>;

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    #[derive(Default)]
    struct Recorder {
        stages: Mutex<Vec<Stage>>,
        failures: Mutex<Vec<FailureKind>>,
    }

    impl ConversionProgressCallback for Recorder {
        fn on_stage(&self, stage: Stage) {
            self.stages.lock().unwrap().push(stage);
        }

        fn on_failure(&self, kind: FailureKind, _message: &str) {
            self.failures.lock().unwrap().push(kind);
        }
    }

    #[test]
    fn noop_callback_does_not_panic() {
        let cb = NoopProgressCallback;
        cb.on_stage(Stage::Validating);
        cb.on_failure(FailureKind::DecodeError, "bad");
    }

    #[test]
    fn recorder_receives_events() {
        let rec = Recorder::default();
        rec.on_stage(Stage::Validating);
        rec.on_stage(Stage::Decoding);
        rec.on_failure(FailureKind::DecodeError, "bad csv");
        assert_eq!(
            *rec.stages.lock().unwrap(),
            vec![Stage::Validating, Stage::Decoding]
        );
        assert_eq!(*rec.failures.lock().unwrap(), vec![FailureKind::DecodeError]);
    }

    #[test]
    fn arc_dyn_callback_works() {
        let cb: ProgressCallback = Arc::new(NoopProgressCallback);
        cb.on_stage(Stage::Done);
    }

    #[test]
    fn stage_display() {
        assert_eq!(Stage::Encoding.to_string(), "encoding");
    }
}
