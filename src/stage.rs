use crate::error::{PipelineError, Result};
use crossbeam::channel::{Iter, Receiver, Sender};

/// The channel pairing handed to a filter when it runs.
///
/// A filter reads `input` until every upstream sender is gone and writes
/// to `output`. Dropping the `Arg` (which happens when the filter returns)
/// releases this filter's hold on the output channel.
#[derive(Debug)]
pub struct Arg<T> {
    pub input: Receiver<T>,
    pub output: Sender<T>,
}

impl<T> Clone for Arg<T> {
    fn clone(&self) -> Self {
        Self {
            input: self.input.clone(),
            output: self.output.clone(),
        }
    }
}

impl<T> Arg<T> {
    /// Pair an input receiver with an output sender
    pub fn new(input: Receiver<T>, output: Sender<T>) -> Self {
        Self { input, output }
    }

    /// Iterate over the input until it is closed and empty
    pub fn iter(&self) -> Iter<'_, T> {
        self.input.iter()
    }

    /// Send an item downstream, blocking while the output channel is full
    pub fn emit(&self, item: T) -> Result<()> {
        self.output
            .send(item)
            .map_err(|_| PipelineError::ChannelClosed)
    }

    /// Consume and discard the rest of the input. Returns how many items were dropped.
    pub fn drain(&self) -> usize {
        self.input.iter().count()
    }
}

/// A unit of pipeline work: consumes `arg.input`, produces on `arg.output`.
///
/// `run` takes `&self` so one filter can be run by several threads at once
/// (see [`Parallel`](crate::parallel::Parallel)); per-run state belongs
/// inside `run`.
pub trait Filter<T>: Send + Sync {
    /// Run the filter to completion
    fn run(&self, arg: Arg<T>) -> Result<()>;

    /// Get a human-readable name for this filter
    fn name(&self) -> &str {
        "filter"
    }
}

impl<T, F: Filter<T> + ?Sized> Filter<T> for Box<F> {
    fn run(&self, arg: Arg<T>) -> Result<()> {
        (**self).run(arg)
    }

    fn name(&self) -> &str {
        (**self).name()
    }
}

impl<T, F: Filter<T> + ?Sized> Filter<T> for &F {
    fn run(&self, arg: Arg<T>) -> Result<()> {
        (**self).run(arg)
    }

    fn name(&self) -> &str {
        (**self).name()
    }
}

/// A filter backed by a plain function or closure
pub struct FilterFn<F> {
    name: String,
    func: F,
}

impl<F> FilterFn<F> {
    /// Replace the name shown in logs and errors
    pub fn named(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }
}

impl<F> std::fmt::Debug for FilterFn<F> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FilterFn").field("name", &self.name).finish()
    }
}

impl<T, F> Filter<T> for FilterFn<F>
where
    F: Fn(Arg<T>) -> Result<()> + Send + Sync,
{
    fn run(&self, arg: Arg<T>) -> Result<()> {
        (self.func)(arg)
    }

    fn name(&self) -> &str {
        &self.name
    }
}

/// Wrap a function as a filter
pub fn filter_fn<T, F>(func: F) -> FilterFn<F>
where
    F: Fn(Arg<T>) -> Result<()> + Send + Sync,
{
    FilterFn {
        name: "filter".to_string(),
        func,
    }
}
