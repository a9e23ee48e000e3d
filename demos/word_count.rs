//! Word frequency counter pipeline
//!
//! Reads lines from stdin, splits into words, counts frequencies, and prints top-N words.
//!
//! Usage: cargo run --example word_count --release
//!        (Then type lines of text and press Ctrl-D to finish)

use filter_stream::{
    filter_fn, map, read_lines, sort, uniq_with_count, write_lines, Arg, Filter, PipelineBuilder,
    Result as PipelineResult,
};
use std::io::{self, BufReader};
use tracing_subscriber::EnvFilter;

/// Stage that splits lines into cleaned words
fn words() -> impl Filter<String> {
    filter_fn(|arg: Arg<String>| {
        for line in arg.iter() {
            for word in line.split_whitespace() {
                let cleaned: String = word.chars().filter(|c| c.is_alphanumeric()).collect();
                if cleaned.len() > 2 {
                    arg.emit(cleaned)?;
                }
            }
        }
        Ok(())
    })
    .named("words")
}

/// Stage that keeps the `n` most frequent `"<count> <word>"` lines
struct TopN {
    n: usize,
}

impl Filter<String> for TopN {
    fn run(&self, arg: Arg<String>) -> PipelineResult<()> {
        let mut counted: Vec<(usize, String)> = arg
            .iter()
            .filter_map(|line| {
                let (count, word) = line.split_once(' ')?;
                Some((count.parse().ok()?, word.to_string()))
            })
            .collect();
        counted.sort_by(|a, b| b.0.cmp(&a.0).then_with(|| a.1.cmp(&b.1)));
        for (rank, (count, word)) in counted.into_iter().take(self.n).enumerate() {
            arg.emit(format!("{:2}. {} ({})", rank + 1, word, count))?;
        }
        Ok(())
    }

    fn name(&self) -> &str {
        "top_n"
    }
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(io::stderr)
        .init();

    println!("Word Frequency Counter Pipeline");
    println!("================================");
    println!("Enter lines of text (Ctrl-D to finish):");
    println!();

    PipelineBuilder::new()
        .add_stage(read_lines(BufReader::new(io::stdin())))
        .add_stage(words())
        .add_stage(map(|w: String| w.to_lowercase()))
        .add_stage(sort())
        .add_stage(uniq_with_count())
        .add_stage(TopN { n: 10 })
        .add_stage(write_lines(io::stdout()))
        .build()?
        .run()?;

    Ok(())
}
