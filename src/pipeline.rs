use crate::error::{ErrorSet, PipelineError, Result};
use crate::stage::{Arg, Filter};
use crossbeam::channel::{bounded, Receiver};
use std::thread::{self, ScopedJoinHandle};
use tracing::{debug, warn};

/// Capacity of each channel between adjacent stages unless configured otherwise
pub const DEFAULT_CHANNEL_CAPACITY: usize = 1000;

/// A named stage in the pipeline
struct PipelineStage<T> {
    name: String,
    filter: Box<dyn Filter<T>>,
}

/// Builder for constructing pipelines
pub struct PipelineBuilder<T> {
    stages: Vec<PipelineStage<T>>,
    capacity: usize,
}

impl<T: Send + 'static> PipelineBuilder<T> {
    /// Create a new pipeline builder
    pub fn new() -> Self {
        Self {
            stages: Vec::new(),
            capacity: DEFAULT_CHANNEL_CAPACITY,
        }
    }

    /// Append a stage, named after the filter and its position
    pub fn add_stage<F>(self, filter: F) -> Self
    where
        F: Filter<T> + 'static,
    {
        let name = format!("{}#{}", filter.name(), self.stages.len());
        self.add_named_stage(name, filter)
    }

    /// Append a stage with an explicit name
    pub fn add_named_stage<F>(mut self, name: impl Into<String>, filter: F) -> Self
    where
        F: Filter<T> + 'static,
    {
        self.stages.push(PipelineStage {
            name: name.into(),
            filter: Box::new(filter),
        });
        self
    }

    /// Set the capacity of every inter-stage channel (at least 1)
    pub fn with_capacity(mut self, capacity: usize) -> Self {
        self.capacity = capacity.max(1);
        self
    }

    /// Build the pipeline
    pub fn build(self) -> Result<Pipeline<T>> {
        if self.stages.is_empty() {
            return Err(PipelineError::NoStages);
        }

        Ok(Pipeline {
            stages: self.stages,
            capacity: self.capacity,
        })
    }
}

impl<T: Send + 'static> Default for PipelineBuilder<T> {
    fn default() -> Self {
        Self::new()
    }
}

/// An ordered chain of filters where each stage's output feeds the next stage's input.
///
/// Every call to [`run`](Pipeline::run) or [`collect`](Pipeline::collect)
/// allocates fresh channels, runs each stage on its own thread and returns
/// once all of them have finished.
pub struct Pipeline<T> {
    stages: Vec<PipelineStage<T>>,
    capacity: usize,
}

impl<T: Send + 'static> Pipeline<T> {
    /// Start building a pipeline
    pub fn builder() -> PipelineBuilder<T> {
        PipelineBuilder::new()
    }

    /// Number of stages
    pub fn len(&self) -> usize {
        self.stages.len()
    }

    /// Always false; a built pipeline has at least one stage
    pub fn is_empty(&self) -> bool {
        self.stages.is_empty()
    }

    /// Channel capacity used between stages
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Stage names in pipeline order
    pub fn stage_names(&self) -> Vec<&str> {
        self.stages.iter().map(|s| s.name.as_str()).collect()
    }

    /// Run every stage to completion, discarding whatever the last stage emits
    pub fn run(&self) -> Result<()> {
        let (result, _) = self.execute(|output| output.iter().count());
        result
    }

    /// Run every stage to completion and return what the last stage emitted
    pub fn collect(&self) -> Result<Vec<T>> {
        let (result, items) = self.execute(|output| output.iter().collect::<Vec<T>>());
        result.map(|()| items)
    }

    /// Wire the stages together, run them and hand the final output to `sink`.
    fn execute<R, S>(&self, sink: S) -> (Result<()>, R)
    where
        R: Send,
        S: FnOnce(Receiver<T>) -> R + Send,
    {
        debug!(
            stages = self.stages.len(),
            capacity = self.capacity,
            "Starting pipeline"
        );

        let errors = ErrorSet::new();

        // The first stage reads from a channel that is closed before anything is sent
        let (head, mut input) = bounded::<T>(0);
        drop(head);

        let sunk = thread::scope(|scope| {
            let mut handles = Vec::with_capacity(self.stages.len());
            for (index, stage) in self.stages.iter().enumerate() {
                let (output, next_input) = bounded(self.capacity);
                let arg = Arg::new(input, output);
                input = next_input;
                handles.push((
                    stage.name.as_str(),
                    scope.spawn(move || run_stage(index, stage, arg)),
                ));
            }

            let drain = scope.spawn(move || sink(input));

            for (name, handle) in handles {
                errors.record(join_stage(name, handle));
            }

            match drain.join() {
                Ok(sunk) => sunk,
                Err(panic) => std::panic::resume_unwind(panic),
            }
        });

        let result = errors.into_result();
        match &result {
            Ok(()) => debug!("Pipeline finished"),
            Err(e) => warn!(error = %e, "Pipeline failed"),
        }
        (result, sunk)
    }
}

/// Run a list of filters as a pipeline, discarding the final output
pub fn run<T: Send + 'static>(filters: Vec<Box<dyn Filter<T>>>) -> Result<()> {
    filters
        .into_iter()
        .fold(PipelineBuilder::new(), |builder, filter| builder.add_stage(filter))
        .build()?
        .run()
}

/// Consumes whatever is left on a stage's input once the stage has returned,
/// so upstream producers are never left blocked on a full channel.
struct DrainGuard<T>(Receiver<T>);

impl<T> Drop for DrainGuard<T> {
    fn drop(&mut self) {
        let dropped = self.0.iter().count();
        if dropped > 0 {
            debug!(dropped, "Drained unconsumed input");
        }
    }
}

fn run_stage<T>(index: usize, stage: &PipelineStage<T>, arg: Arg<T>) -> Result<()> {
    let _drain = DrainGuard(arg.input.clone());
    debug!(stage = %stage.name, index, "Stage started");

    let result = stage.filter.run(arg);
    match &result {
        Ok(()) => debug!(stage = %stage.name, index, "Stage finished"),
        Err(e) => warn!(stage = %stage.name, index, error = %e, "Stage failed"),
    }
    result
}

fn join_stage(name: &str, handle: ScopedJoinHandle<'_, Result<()>>) -> Result<()> {
    match handle.join() {
        Ok(result) => result,
        Err(_) => {
            warn!(stage = %name, "Stage panicked");
            Err(PipelineError::StagePanicked(name.to_string()))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::stage::filter_fn;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    fn source(items: Vec<i32>) -> impl Filter<i32> {
        filter_fn(move |arg: Arg<i32>| {
            for &item in &items {
                arg.emit(item)?;
            }
            Ok(())
        })
    }

    fn identity() -> impl Filter<i32> {
        filter_fn(|arg: Arg<i32>| {
            for item in arg.iter() {
                arg.emit(item)?;
            }
            Ok(())
        })
    }

    #[test]
    fn test_pipeline_builder() {
        let result = PipelineBuilder::new()
            .add_stage(source(vec![1]))
            .add_named_stage("copy", identity())
            .build();
        let pipeline = result.unwrap();
        assert_eq!(pipeline.len(), 2);
        assert_eq!(pipeline.stage_names(), vec!["filter#0", "copy"]);
        assert_eq!(pipeline.capacity(), DEFAULT_CHANNEL_CAPACITY);
    }

    #[test]
    fn test_no_stages_error() {
        let result = PipelineBuilder::<i32>::new().build();
        assert!(matches!(result, Err(PipelineError::NoStages)));
    }

    #[test]
    fn test_capacity_is_clamped() {
        let pipeline = PipelineBuilder::new()
            .add_stage(identity())
            .with_capacity(0)
            .build()
            .unwrap();
        assert_eq!(pipeline.capacity(), 1);
    }

    #[test]
    fn test_first_stage_input_is_closed() {
        let pipeline = PipelineBuilder::new().add_stage(identity()).build().unwrap();
        assert_eq!(pipeline.collect().unwrap(), Vec::<i32>::new());
    }

    #[test]
    fn test_identity_chain_preserves_order() {
        let input: Vec<i32> = (0..5000).collect();
        let pipeline = PipelineBuilder::new()
            .add_stage(source(input.clone()))
            .add_stage(identity())
            .add_stage(identity())
            .with_capacity(4)
            .build()
            .unwrap();
        assert_eq!(pipeline.collect().unwrap(), input);
    }

    #[test]
    fn test_pipeline_can_run_twice() {
        let pipeline = PipelineBuilder::new()
            .add_stage(source(vec![1, 2, 3]))
            .build()
            .unwrap();
        assert_eq!(pipeline.collect().unwrap(), vec![1, 2, 3]);
        assert_eq!(pipeline.collect().unwrap(), vec![1, 2, 3]);
    }

    #[test]
    fn test_early_exit_does_not_block_upstream() {
        let stop = filter_fn(|arg: Arg<i32>| {
            if let Ok(item) = arg.input.recv() {
                arg.emit(item)?;
            }
            Ok(())
        });
        let pipeline = PipelineBuilder::new()
            .add_stage(source((0..10_000).collect()))
            .add_stage(stop)
            .with_capacity(2)
            .build()
            .unwrap();
        assert_eq!(pipeline.collect().unwrap(), vec![0]);
    }

    #[test]
    fn test_failure_lets_other_stages_finish() {
        let seen = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&seen);
        let count = filter_fn(move |arg: Arg<i32>| {
            for item in arg.iter() {
                counter.fetch_add(1, Ordering::SeqCst);
                arg.emit(item)?;
            }
            Ok(())
        });
        let fail = filter_fn(|_: Arg<i32>| Err(PipelineError::Stage("bad".into())));

        let pipeline = PipelineBuilder::new()
            .add_stage(source((0..100).collect()))
            .add_stage(count)
            .add_stage(fail)
            .build()
            .unwrap();
        let err = pipeline.run().unwrap_err();
        assert!(matches!(err, PipelineError::Stage(ref msg) if msg == "bad"));
        assert_eq!(seen.load(Ordering::SeqCst), 100);
    }

    #[test]
    fn test_panicking_stage_is_reported() {
        let explode = filter_fn(|_: Arg<i32>| -> Result<()> { panic!("stage exploded") });
        let pipeline = PipelineBuilder::new()
            .add_stage(source((0..50).collect()))
            .add_named_stage("explode", explode)
            .with_capacity(1)
            .build()
            .unwrap();
        let err = pipeline.run().unwrap_err();
        assert!(matches!(err, PipelineError::StagePanicked(ref name) if name == "explode"));
    }

    #[test]
    fn test_run_list_of_filters() {
        let filters: Vec<Box<dyn Filter<i32>>> =
            vec![Box::new(source(vec![1, 2])), Box::new(identity())];
        assert!(run(filters).is_ok());
        assert!(matches!(run::<i32>(Vec::new()), Err(PipelineError::NoStages)));
    }
}
