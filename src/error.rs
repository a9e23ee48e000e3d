use parking_lot::Mutex;
use std::process::ExitStatus;
use thiserror::Error;

/// Result type for filter stream operations
pub type Result<T> = std::result::Result<T, PipelineError>;

/// Errors that can occur while building or running a pipeline
#[derive(Error, Debug)]
pub enum PipelineError {
    /// No stages in pipeline
    #[error("Cannot build a pipeline with no stages")]
    NoStages,

    /// A stage was configured with an argument it cannot accept
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// A regular expression failed to compile
    #[error("Invalid pattern: {0}")]
    Pattern(#[from] regex::Error),

    /// Reading or writing failed
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// An external process exited abnormally
    #[error("Command `{program}` failed: {status}")]
    Command { program: String, status: ExitStatus },

    /// Every consumer of the output channel has gone away
    #[error("Output channel closed")]
    ChannelClosed,

    /// A stage thread panicked
    #[error("Stage {0} panicked")]
    StagePanicked(String),

    /// Stage execution error
    #[error("Stage execution failed: {0}")]
    Stage(String),

    /// Several concurrently running stages failed
    #[error("{} stages failed{}", .0.len(), first_failure(.0))]
    Aggregate(Vec<PipelineError>),
}

fn first_failure(errors: &[PipelineError]) -> String {
    errors
        .first()
        .map(|e| format!("; first: {}", e))
        .unwrap_or_default()
}

/// Failures recorded by concurrently running stages.
///
/// Stage threads record into a shared `ErrorSet` without coordinating with
/// each other; the owner reads it once every writer has been joined.
#[derive(Debug, Default)]
pub struct ErrorSet {
    errors: Mutex<Vec<PipelineError>>,
}

impl ErrorSet {
    /// Create an empty error set
    pub fn new() -> Self {
        Self::default()
    }

    /// Record the outcome of one stage. `Ok` is a no-op.
    pub fn record(&self, result: Result<()>) {
        if let Err(e) = result {
            self.errors.lock().push(e);
        }
    }

    /// Whether any failure has been recorded so far
    pub fn has_failed(&self) -> bool {
        !self.errors.lock().is_empty()
    }

    /// Number of recorded failures
    pub fn len(&self) -> usize {
        self.errors.lock().len()
    }

    /// Check if no failure has been recorded
    pub fn is_empty(&self) -> bool {
        self.errors.lock().is_empty()
    }

    /// Collapse the recorded failures into a single result.
    ///
    /// One failure is returned as-is; several are wrapped in
    /// [`PipelineError::Aggregate`] in recording order.
    pub fn into_result(self) -> Result<()> {
        let mut errors = self.errors.into_inner();
        match errors.len() {
            0 => Ok(()),
            1 => Err(errors.remove(0)),
            _ => Err(PipelineError::Aggregate(errors)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::thread;

    #[test]
    fn test_empty_set_is_ok() {
        let set = ErrorSet::new();
        set.record(Ok(()));
        set.record(Ok(()));
        assert!(set.is_empty());
        assert!(set.into_result().is_ok());
    }

    #[test]
    fn test_single_failure_is_returned_unwrapped() {
        let set = ErrorSet::new();
        set.record(Ok(()));
        set.record(Err(PipelineError::Stage("boom".into())));
        let err = set.into_result().unwrap_err();
        assert!(matches!(err, PipelineError::Stage(ref msg) if msg == "boom"));
    }

    #[test]
    fn test_multiple_failures_are_aggregated() {
        let set = ErrorSet::new();
        set.record(Err(PipelineError::Stage("first".into())));
        set.record(Err(PipelineError::ChannelClosed));
        match set.into_result() {
            Err(PipelineError::Aggregate(errors)) => {
                assert_eq!(errors.len(), 2);
                assert!(matches!(errors[0], PipelineError::Stage(_)));
            }
            other => panic!("expected aggregate, got {:?}", other),
        }
    }

    #[test]
    fn test_aggregate_display_names_first_failure() {
        let err = PipelineError::Aggregate(vec![
            PipelineError::Stage("a".into()),
            PipelineError::Stage("b".into()),
        ]);
        assert_eq!(err.to_string(), "2 stages failed; first: Stage execution failed: a");
    }

    #[test]
    fn test_empty_aggregate_display() {
        let err = PipelineError::Aggregate(Vec::new());
        assert_eq!(err.to_string(), "0 stages failed");
    }

    #[test]
    fn test_concurrent_recording() {
        let set = Arc::new(ErrorSet::new());
        let handles: Vec<_> = (0..8)
            .map(|i| {
                let set = Arc::clone(&set);
                thread::spawn(move || {
                    for _ in 0..100 {
                        if i % 2 == 0 {
                            set.record(Err(PipelineError::Stage(format!("worker {}", i))));
                        } else {
                            set.record(Ok(()));
                        }
                    }
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }
        assert!(set.has_failed());
        assert_eq!(set.len(), 400);
    }
}
