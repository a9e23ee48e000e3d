//! Composable, concurrent pipelines of filters in the spirit of Unix pipes.
//!
//! A [`Filter`] reads items from an input channel and writes items to an
//! output channel. A [`Pipeline`] chains filters together with bounded
//! channels, runs every filter on its own thread and reports the combined
//! outcome once all of them have finished.
//!
//! # Features
//!
//! - Bounded crossbeam channels between stages; a full channel is the only backpressure
//! - Fan-out/fan-in with [`parallel`]: N replicas of one filter over a shared input
//! - Windowing stages (`first`, `last`, `drop_first`, `drop_last`) over a ring buffer
//! - Single-pass reservoir sampling with an injectable random source
//! - Line-oriented text, regex, file and subprocess stages
//! - Failures from concurrent stages are aggregated, never lost
//!
//! # Example
//!
//! ```
//! use filter_stream::{items, uniq_with_count, PipelineBuilder};
//!
//! let lines = ["a", "a", "b", "b", "b", "c"].map(String::from).to_vec();
//! let counts = PipelineBuilder::new()
//!     .add_stage(items(lines))
//!     .add_stage(uniq_with_count())
//!     .build()?
//!     .collect()?;
//!
//! assert_eq!(counts, ["2 a", "3 b", "1 c"]);
//! # Ok::<(), filter_stream::PipelineError>(())
//! ```

pub mod buffer;
pub mod command;
pub mod error;
pub mod filters;
pub mod grep;
pub mod io;
pub mod parallel;
pub mod pipeline;
pub mod sample;
pub mod stage;
pub mod window;

// Re-exports for convenience
pub use buffer::RingBuffer;
pub use command::{command, xargs, Xargs, DEFAULT_XARGS_LIMIT};
pub use error::{ErrorSet, PipelineError, Result};
pub use filters::{
    columns, identity, items, keep_if, map, number_lines, numbers, repeat, reverse, sort, uniq,
    uniq_with_count, Sort,
};
pub use grep::{grep, grep_not, substitute};
pub use io::{cat, read_lines, write_lines, Cat};
pub use parallel::{parallel, Parallel};
pub use pipeline::{run, Pipeline, PipelineBuilder, DEFAULT_CHANNEL_CAPACITY};
pub use sample::{sample, sample_with_rng, sample_with_seed, Reservoir};
pub use stage::{filter_fn, Arg, Filter, FilterFn};
pub use window::{drop_first, drop_last, first, last};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
