//! Progress-callback trait for generation events.
//!
//! Inject an [`Arc<dyn GenerationProgressCallback>`] via
//! [`crate::config::GenerationConfigBuilder::progress_callback`] to follow
//! the run: one pair of events per stage plus one event per scanned page.
//! The CLI uses it to drive an `indicatif` bar; a service could forward the
//! same events to a websocket.
//!
//! # Example
//!
//! ```rust
//! use automag::{GenerationProgressCallback, GenerationConfig, Stage};
//! use std::sync::Arc;
//!
//! struct Log;
//!
//! impl GenerationProgressCallback for Log {
//!     fn on_stage_start(&self, stage: Stage) {
//!         eprintln!("→ {stage}");
//!     }
//! }
//!
//! let config = GenerationConfig::builder()
//!     .progress_callback(Arc::new(Log))
//!     .build()
//!     .unwrap();
//! ```

use serde::Serialize;
use std::fmt;
use std::path::Path;
use std::sync::Arc;

/// A step of the generation pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Stage {
    /// Section extraction of source document 1 or 2.
    Extract { document: usize },
    /// Technical article text and image.
    Article,
    /// Template filling.
    Fill,
    /// Writing the output file.
    Write,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Stage::Extract { document } => write!(f, "extracting document {document}"),
            Stage::Article => f.write_str("writing technical article"),
            Stage::Fill => f.write_str("filling template"),
            Stage::Write => f.write_str("writing magazine"),
        }
    }
}

/// Called by the pipeline as it runs. All methods default to no-ops.
///
/// Page events arrive from the blocking extraction thread, so
/// implementations must be `Send + Sync`.
pub trait GenerationProgressCallback: Send + Sync {
    fn on_stage_start(&self, stage: Stage) {
        let _ = stage;
    }

    /// One page of `document` (1 or 2) has been scanned.
    fn on_page_scanned(&self, document: usize, page_num: usize, total_pages: usize) {
        let _ = (document, page_num, total_pages);
    }

    fn on_stage_complete(&self, stage: Stage) {
        let _ = stage;
    }

    /// The magazine has been written to `output`.
    fn on_generation_complete(&self, output: &Path) {
        let _ = output;
    }
}

/// A no-op implementation; the default when no callback is configured.
pub struct NoopProgressCallback;

impl GenerationProgressCallback for NoopProgressCallback {}

/// Convenience alias matching the type stored in [`crate::config::GenerationConfig`].
pub type ProgressCallback = Arc<dyn GenerationProgressCallback>;

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    #[derive(Default)]
    struct Recorder {
        events: Mutex<Vec<String>>,
    }

    impl GenerationProgressCallback for Recorder {
        fn on_stage_start(&self, stage: Stage) {
            self.events.lock().unwrap().push(format!("start {stage}"));
        }

        fn on_page_scanned(&self, document: usize, page_num: usize, total_pages: usize) {
            self.events
                .lock()
                .unwrap()
                .push(format!("page {document}:{page_num}/{total_pages}"));
        }
    }

    #[test]
    fn noop_callback_does_not_panic() {
        let cb = NoopProgressCallback;
        cb.on_stage_start(Stage::Article);
        cb.on_page_scanned(1, 1, 3);
        cb.on_stage_complete(Stage::Fill);
        cb.on_generation_complete(Path::new("out.docx"));
    }

    #[test]
    fn overridden_methods_receive_events() {
        let rec = Arc::new(Recorder::default());
        let cb: ProgressCallback = rec.clone();
        cb.on_stage_start(Stage::Extract { document: 2 });
        cb.on_page_scanned(2, 1, 4);
        cb.on_stage_complete(Stage::Extract { document: 2 });

        let events = rec.events.lock().unwrap();
        assert_eq!(
            *events,
            vec!["start extracting document 2", "page 2:1/4"]
        );
    }
}
