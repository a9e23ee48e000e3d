use crate::error::{PipelineError, Result};
use crate::stage::{filter_fn, Arg, Filter};
use std::io::{self, BufRead, BufReader, BufWriter, Write};
use std::process::{Command, Stdio};
use std::thread;
use tracing::debug;

/// Pipe the input through an external program.
///
/// Each input item is written to the program's stdin followed by a newline;
/// each line the program prints becomes an output item. A non-zero exit
/// status fails the stage after its output has been forwarded.
pub fn command(program: &str, args: &[&str]) -> impl Filter<String> {
    let program = program.to_string();
    let args: Vec<String> = args.iter().map(|a| a.to_string()).collect();
    filter_fn(move |arg: Arg<String>| run_command(&program, &args, arg)).named("command")
}

fn run_command(program: &str, args: &[String], arg: Arg<String>) -> Result<()> {
    let mut child = Command::new(program)
        .args(args)
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .spawn()?;
    debug!(program, pid = child.id(), "Spawned command");

    let stdin = child
        .stdin
        .take()
        .ok_or_else(|| io::Error::other("child stdin unavailable"))?;
    let stdout = child
        .stdout
        .take()
        .ok_or_else(|| io::Error::other("child stdout unavailable"))?;

    let input = arg.input.clone();
    let (emitted, fed) = thread::scope(|scope| {
        let feeder = scope.spawn(move || -> io::Result<()> {
            let mut stdin = BufWriter::new(stdin);
            for line in input.iter() {
                writeln!(stdin, "{}", line)?;
            }
            stdin.flush()
        });

        // Dropping stdout when done lets a child still writing see a broken pipe
        let emitted = (|| -> Result<()> {
            for line in BufReader::new(stdout).lines() {
                arg.emit(line?)?;
            }
            Ok(())
        })();

        let fed = feeder
            .join()
            .map_err(|_| PipelineError::StagePanicked(format!("{} stdin writer", program)));
        (emitted, fed)
    });

    let status = child.wait()?;
    emitted?;
    match fed? {
        // The program may legitimately exit without reading all of its input
        Err(e) if e.kind() == io::ErrorKind::BrokenPipe => {}
        other => other?,
    }
    if !status.success() {
        return Err(PipelineError::Command {
            program: program.to_string(),
            status,
        });
    }
    debug!(program, "Command finished");
    Ok(())
}

/// Default cap on the number of items passed to one [`Xargs`] invocation
pub const DEFAULT_XARGS_LIMIT: usize = 4096;

/// Runs a program with input items appended to its argument list.
///
/// Items are gathered into batches of at most `limit_args` and the program
/// is run once per batch, in input order; each line it prints becomes an
/// output item. Empty input runs nothing. A non-zero exit status fails the
/// stage and stops further batches.
#[derive(Debug, Clone)]
pub struct Xargs {
    program: String,
    args: Vec<String>,
    limit: usize,
}

/// Build an [`Xargs`] stage for `program` with fixed leading `args`
pub fn xargs(program: &str, args: &[&str]) -> Xargs {
    Xargs {
        program: program.to_string(),
        args: args.iter().map(|a| a.to_string()).collect(),
        limit: DEFAULT_XARGS_LIMIT,
    }
}

impl Xargs {
    /// Pass at most `n` items per invocation (at least one)
    pub fn limit_args(mut self, n: usize) -> Self {
        self.limit = n.max(1);
        self
    }

    fn invoke(&self, batch: &[String], arg: &Arg<String>) -> Result<()> {
        let mut child = Command::new(&self.program)
            .args(&self.args)
            .args(batch)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .spawn()?;
        debug!(
            program = %self.program,
            pid = child.id(),
            items = batch.len(),
            "Spawned xargs batch"
        );

        let stdout = child
            .stdout
            .take()
            .ok_or_else(|| io::Error::other("child stdout unavailable"))?;
        let emitted = (|| -> Result<()> {
            for line in BufReader::new(stdout).lines() {
                arg.emit(line?)?;
            }
            Ok(())
        })();

        let status = child.wait()?;
        emitted?;
        if !status.success() {
            return Err(PipelineError::Command {
                program: self.program.clone(),
                status,
            });
        }
        Ok(())
    }
}

impl Filter<String> for Xargs {
    fn run(&self, arg: Arg<String>) -> Result<()> {
        let mut batch = Vec::with_capacity(self.limit.min(DEFAULT_XARGS_LIMIT));
        for item in arg.iter() {
            batch.push(item);
            if batch.len() >= self.limit {
                self.invoke(&batch, &arg)?;
                batch.clear();
            }
        }
        if !batch.is_empty() {
            self.invoke(&batch, &arg)?;
        }
        Ok(())
    }

    fn name(&self) -> &str {
        "xargs"
    }
}
