//! Sources and simple per-item transforms.

use crate::error::{PipelineError, Result};
use crate::stage::{filter_fn, Arg, Filter};
use std::cmp::Ordering;

/// Emit the given items, in order
pub fn items<T: Clone + Send + Sync>(items: Vec<T>) -> impl Filter<T> {
    filter_fn(move |arg: Arg<T>| {
        for item in &items {
            arg.emit(item.clone())?;
        }
        Ok(())
    })
    .named("items")
}

/// Emit `n` copies of `item`
pub fn repeat<T: Clone + Send + Sync>(item: T, n: usize) -> impl Filter<T> {
    filter_fn(move |arg: Arg<T>| {
        for _ in 0..n {
            arg.emit(item.clone())?;
        }
        Ok(())
    })
    .named("repeat")
}

/// Emit the integers `x..=y` as decimal strings
pub fn numbers(x: i64, y: i64) -> impl Filter<String> {
    filter_fn(move |arg: Arg<String>| {
        for i in x..=y {
            arg.emit(i.to_string())?;
        }
        Ok(())
    })
    .named("numbers")
}

/// Forward every input item unchanged
pub fn identity<T: Send>() -> impl Filter<T> {
    filter_fn(|arg: Arg<T>| {
        for item in arg.iter() {
            arg.emit(item)?;
        }
        Ok(())
    })
    .named("identity")
}

/// Emit `func(x)` for every input item `x`
pub fn map<T, F>(func: F) -> impl Filter<T>
where
    T: Send,
    F: Fn(T) -> T + Send + Sync,
{
    filter_fn(move |arg: Arg<T>| {
        for item in arg.iter() {
            arg.emit(func(item))?;
        }
        Ok(())
    })
    .named("map")
}

/// Emit every input item for which `predicate` holds
pub fn keep_if<T, F>(predicate: F) -> impl Filter<T>
where
    T: Send,
    F: Fn(&T) -> bool + Send + Sync,
{
    filter_fn(move |arg: Arg<T>| {
        for item in arg.iter() {
            if predicate(&item) {
                arg.emit(item)?;
            }
        }
        Ok(())
    })
    .named("keep_if")
}

/// Squash runs of adjacent equal items into one
pub fn uniq<T: PartialEq + Clone + Send>() -> impl Filter<T> {
    filter_fn(|arg: Arg<T>| {
        let mut previous: Option<T> = None;
        for item in arg.iter() {
            if previous.as_ref() != Some(&item) {
                previous = Some(item.clone());
                arg.emit(item)?;
            }
        }
        Ok(())
    })
    .named("uniq")
}

/// Squash runs of adjacent equal lines into `"<count> <line>"`
pub fn uniq_with_count() -> impl Filter<String> {
    filter_fn(|arg: Arg<String>| {
        let mut current: Option<(String, usize)> = None;
        for line in arg.iter() {
            if let Some((text, count)) = current.as_mut() {
                if *text == line {
                    *count += 1;
                    continue;
                }
            }
            if let Some((text, count)) = current.replace((line, 1)) {
                arg.emit(format!("{} {}", count, text))?;
            }
        }
        if let Some((text, count)) = current {
            arg.emit(format!("{} {}", count, text))?;
        }
        Ok(())
    })
    .named("uniq_with_count")
}

/// Emit the input in reverse order.
///
/// Holds the whole input in memory.
pub fn reverse<T: Send>() -> impl Filter<T> {
    filter_fn(|arg: Arg<T>| {
        let mut data: Vec<T> = arg.iter().collect();
        while let Some(item) = data.pop() {
            arg.emit(item)?;
        }
        Ok(())
    })
    .named("reverse")
}

/// One comparison key of a [`Sort`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum SortKey {
    Text { column: usize, descending: bool },
    Num { column: usize, descending: bool },
}

/// Sorts lines by a sequence of column keys.
///
/// Columns are whitespace-separated and numbered from 1; column 0 is the
/// whole line and a missing column compares as an empty string. Keys are
/// tried in the order they were added. With no keys the whole line is
/// compared as text. The sort is stable and holds the whole input in memory.
#[derive(Debug, Clone, Default)]
pub struct Sort {
    keys: Vec<SortKey>,
}

/// Build a [`Sort`]; add keys with [`Sort::text`] and [`Sort::num`]
pub fn sort() -> Sort {
    Sort::default()
}

impl Sort {
    /// Compare `column` as text, ascending
    pub fn text(mut self, column: usize) -> Self {
        self.keys.push(SortKey::Text {
            column,
            descending: false,
        });
        self
    }

    /// Compare `column` as text, descending
    pub fn text_decreasing(mut self, column: usize) -> Self {
        self.keys.push(SortKey::Text {
            column,
            descending: true,
        });
        self
    }

    /// Compare `column` numerically, ascending.
    ///
    /// Values that do not parse as numbers sort before all numbers, by text.
    pub fn num(mut self, column: usize) -> Self {
        self.keys.push(SortKey::Num {
            column,
            descending: false,
        });
        self
    }

    /// Compare `column` numerically, descending
    pub fn num_decreasing(mut self, column: usize) -> Self {
        self.keys.push(SortKey::Num {
            column,
            descending: true,
        });
        self
    }

    fn compare(&self, a: &str, b: &str) -> Ordering {
        if self.keys.is_empty() {
            return a.cmp(b);
        }
        for key in &self.keys {
            let (order, descending) = match *key {
                SortKey::Text { column, descending } => {
                    (field(a, column).cmp(field(b, column)), descending)
                }
                SortKey::Num { column, descending } => {
                    (compare_numeric(field(a, column), field(b, column)), descending)
                }
            };
            let order = if descending { order.reverse() } else { order };
            if order != Ordering::Equal {
                return order;
            }
        }
        Ordering::Equal
    }
}

impl Filter<String> for Sort {
    fn run(&self, arg: Arg<String>) -> Result<()> {
        let mut data: Vec<String> = arg.iter().collect();
        data.sort_by(|a, b| self.compare(a, b));
        for line in data {
            arg.emit(line)?;
        }
        Ok(())
    }

    fn name(&self) -> &str {
        "sort"
    }
}

fn field(line: &str, column: usize) -> &str {
    match column {
        0 => line,
        c => line.split_whitespace().nth(c - 1).unwrap_or(""),
    }
}

fn compare_numeric(a: &str, b: &str) -> Ordering {
    match (a.parse::<f64>(), b.parse::<f64>()) {
        (Ok(x), Ok(y)) => x.total_cmp(&y),
        (Ok(_), Err(_)) => Ordering::Greater,
        (Err(_), Ok(_)) => Ordering::Less,
        (Err(_), Err(_)) => a.cmp(b),
    }
}

/// Prefix each line with its 1-based position, right-aligned to five columns
pub fn number_lines() -> impl Filter<String> {
    filter_fn(|arg: Arg<String>| {
        for (index, line) in arg.iter().enumerate() {
            arg.emit(format!("{:5} {}", index + 1, line))?;
        }
        Ok(())
    })
    .named("number_lines")
}

/// Emit the listed whitespace-separated columns of each line, joined by a space.
///
/// Columns are numbered from 1. A column past the end of a line is skipped.
/// Any column number below 1 makes the stage fail as soon as it runs.
pub fn columns(columns: &[i64]) -> impl Filter<String> {
    let columns = columns.to_vec();
    filter_fn(move |arg: Arg<String>| {
        if let Some(bad) = columns.iter().find(|&&c| c <= 0) {
            return Err(PipelineError::InvalidArgument(format!(
                "invalid column number {}",
                bad
            )));
        }
        for line in arg.iter() {
            let fields: Vec<&str> = line.split_whitespace().collect();
            let selected: Vec<&str> = columns
                .iter()
                .filter_map(|&c| fields.get(c as usize - 1).copied())
                .collect();
            arg.emit(selected.join(" "))?;
        }
        Ok(())
    })
    .named("columns")
}
