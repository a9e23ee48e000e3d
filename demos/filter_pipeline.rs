//! Number processing pipeline demonstrating filtering and transformations
//!
//! Pipeline:
//! 1. Generate: Produces numbers 1-100
//! 2. Filter: Keep only even numbers
//! 3. Transform: Multiply by 10, on four parallel workers
//! 4. Aggregate: Sum all numbers
//!
//! Usage: cargo run --example filter_pipeline --release

use filter_stream::{
    keep_if, map, numbers, parallel, Arg, Filter, PipelineBuilder, Result as PipelineResult,
};
use std::time::Instant;
use tracing_subscriber::EnvFilter;

/// Aggregator stage that sums all numbers and emits a report once the input ends
struct SumAggregator;

impl Filter<String> for SumAggregator {
    fn run(&self, arg: Arg<String>) -> PipelineResult<()> {
        let mut sum = 0u64;
        let mut count = 0u64;
        for num in arg.iter().filter_map(|s| s.parse::<u64>().ok()) {
            sum += num;
            count += 1;
        }
        arg.emit(format!("Total numbers processed: {}", count))?;
        arg.emit(format!("Sum of all numbers: {}", sum))?;
        if count > 0 {
            arg.emit(format!("Average: {:.2}", sum as f64 / count as f64))?;
        }
        Ok(())
    }

    fn name(&self) -> &str {
        "sum_aggregator"
    }
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    println!("Number Processing Pipeline");
    println!("==========================");
    println!("Generating numbers 1-100, filtering evens, multiplying by 10, and summing");
    println!();

    let start = Instant::now();

    let report = PipelineBuilder::new()
        .add_named_stage("generator", numbers(1, 100))
        .add_named_stage(
            "filter",
            keep_if(|s: &String| s.parse::<u32>().map(|n| n % 2 == 0).unwrap_or(false)),
        )
        .add_named_stage(
            "transform",
            parallel(
                4,
                map(|s: String| match s.parse::<u64>() {
                    Ok(n) => (n * 10).to_string(),
                    Err(_) => s,
                }),
            ),
        )
        .add_named_stage("aggregate", SumAggregator)
        .with_capacity(50)
        .build()?
        .collect()?;

    println!("=== Final Results ===");
    for line in report {
        println!("{}", line);
    }

    let elapsed = start.elapsed();
    println!("\nPipeline execution time: {:.3}s", elapsed.as_secs_f64());

    Ok(())
}
