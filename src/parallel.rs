use crate::error::{ErrorSet, PipelineError, Result};
use crate::stage::{Arg, Filter};
use std::thread;
use tracing::{trace, warn};

/// Runs several copies of one filter against a shared input.
///
/// Each input item is taken by exactly one replica; replica outputs are
/// merged onto the shared output in no particular order. The combinator
/// returns once every replica has returned. A failing replica does not stop
/// the others, and every failure is kept.
#[derive(Debug)]
pub struct Parallel<F> {
    replicas: usize,
    filter: F,
}

impl<F> Parallel<F> {
    /// Number of concurrent copies
    pub fn replicas(&self) -> usize {
        self.replicas
    }
}

/// Run `replicas` copies of `filter` as a single filter
pub fn parallel<F>(replicas: usize, filter: F) -> Parallel<F> {
    Parallel { replicas, filter }
}

impl<T, F> Filter<T> for Parallel<F>
where
    T: Send,
    F: Filter<T>,
{
    fn run(&self, arg: Arg<T>) -> Result<()> {
        if self.replicas == 0 {
            return Err(PipelineError::InvalidArgument(
                "parallel needs at least one replica".to_string(),
            ));
        }

        let errors = ErrorSet::new();
        thread::scope(|scope| {
            let handles: Vec<_> = (0..self.replicas)
                .map(|replica| {
                    let arg = arg.clone();
                    let errors = &errors;
                    let handle = scope.spawn(move || {
                        trace!(filter = self.filter.name(), replica, "Replica started");
                        errors.record(self.filter.run(arg));
                    });
                    (replica, handle)
                })
                .collect();
            drop(arg);

            for (replica, handle) in handles {
                if handle.join().is_err() {
                    warn!(filter = self.filter.name(), replica, "Replica panicked");
                    errors.record(Err(PipelineError::StagePanicked(format!(
                        "{} (replica {})",
                        self.filter.name(),
                        replica
                    ))));
                }
            }
        });
        errors.into_result()
    }

    fn name(&self) -> &str {
        "parallel"
    }
}
