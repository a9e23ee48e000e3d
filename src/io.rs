//! Stages that move lines between the pipeline and files, readers and writers.

use crate::error::Result;
use crate::stage::{filter_fn, Arg, Filter};
use parking_lot::Mutex;
use std::fs::File;
use std::io::{BufRead, BufReader, Write};
use std::path::PathBuf;
use tracing::debug;

/// Emits every line of every file, in order.
///
/// With no files, copies the input to the output instead.
#[derive(Debug, Clone)]
pub struct Cat {
    paths: Vec<PathBuf>,
}

/// Build a [`Cat`] over `paths`
pub fn cat<P: Into<PathBuf>>(paths: impl IntoIterator<Item = P>) -> Cat {
    Cat {
        paths: paths.into_iter().map(Into::into).collect(),
    }
}

impl Filter<String> for Cat {
    fn run(&self, arg: Arg<String>) -> Result<()> {
        if self.paths.is_empty() {
            for line in arg.iter() {
                arg.emit(line)?;
            }
            return Ok(());
        }
        for path in &self.paths {
            debug!(path = %path.display(), "Reading file");
            let file = File::open(path)?;
            emit_lines(BufReader::new(file), &arg)?;
        }
        Ok(())
    }

    fn name(&self) -> &str {
        "cat"
    }
}

/// Emit every line read from `reader`.
///
/// The reader is consumed by the first run; later runs emit nothing.
pub fn read_lines<R: BufRead + Send>(reader: R) -> impl Filter<String> {
    let reader = Mutex::new(Some(reader));
    filter_fn(move |arg: Arg<String>| {
        let taken = reader.lock().take();
        match taken {
            Some(reader) => emit_lines(reader, &arg),
            None => Ok(()),
        }
    })
    .named("read_lines")
}

/// Write each item followed by a newline to `writer`, and also forward it.
pub fn write_lines<W: Write + Send>(writer: W) -> impl Filter<String> {
    let writer = Mutex::new(writer);
    filter_fn(move |arg: Arg<String>| {
        for line in arg.iter() {
            {
                let mut writer = writer.lock();
                writer.write_all(line.as_bytes())?;
                writer.write_all(b"\n")?;
            }
            arg.emit(line)?;
        }
        writer.lock().flush()?;
        Ok(())
    })
    .named("write_lines")
}

fn emit_lines<R: BufRead>(reader: R, arg: &Arg<String>) -> Result<()> {
    for line in reader.lines() {
        arg.emit(line?)?;
    }
    Ok(())
}
