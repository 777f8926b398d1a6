use std::fmt;
use std::fs::{self, File};
use std::path::{Path, PathBuf};
use std::process::{Child, Command, ExitStatus, Stdio};
use std::thread;
use std::time::{Duration, Instant};

use crate::errors::StageError;

const POLL_INTERVAL: Duration = Duration::from_millis(5);

/// The two external tools a case can run through
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Stage {
    Compile,
    Execute,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Stage::Compile => write!(f, "compiler"),
            Stage::Execute => write!(f, "vm"),
        }
    }
}

/// How a stage process ended
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum StageExit {
    Code(i32),
    /// Terminated without an exit code (killed by a signal on unix).
    Signaled,
    TimedOut,
}

impl StageExit {
    pub fn success(self) -> bool {
        self == StageExit::Code(0)
    }

    fn from_status(status: ExitStatus) -> Self {
        match status.code() {
            Some(code) => StageExit::Code(code),
            None => StageExit::Signaled,
        }
    }
}

impl fmt::Display for StageExit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StageExit::Code(code) => write!(f, "exited with status {}", code),
            StageExit::Signaled => write!(f, "was terminated by a signal"),
            StageExit::TimedOut => write!(f, "timed out"),
        }
    }
}

#[derive(Debug)]
pub struct StageOutput {
    pub exit: StageExit,
    pub stderr: String,
    pub elapsed: Duration,
}

/// One run of an external executable with file-bound standard streams.
///
/// Arguments are passed as a list, never through a shell. Standard output
/// and standard error each go to their own file; standard input comes from
/// a file or is closed.
#[derive(Debug, Clone)]
pub struct Invocation {
    program: PathBuf,
    args: Vec<PathBuf>,
    stdin: Option<PathBuf>,
    stdout: PathBuf,
    stderr: PathBuf,
    timeout: Duration,
}

impl Invocation {
    pub fn new(program: &Path, stdout: &Path, stderr: &Path, timeout: Duration) -> Self {
        Self {
            program: program.to_path_buf(),
            args: Vec::new(),
            stdin: None,
            stdout: stdout.to_path_buf(),
            stderr: stderr.to_path_buf(),
            timeout,
        }
    }

    pub fn arg(mut self, arg: &Path) -> Self {
        self.args.push(arg.to_path_buf());
        self
    }

    pub fn stdin_from(mut self, path: &Path) -> Self {
        self.stdin = Some(path.to_path_buf());
        self
    }

    /// Run to completion (or timeout). The stdout file exists afterwards
    /// even when the child wrote nothing or failed to start.
    pub fn run(&self) -> Result<StageOutput, StageError> {
        let stdout = create_redirect(&self.stdout)?;
        let stderr = create_redirect(&self.stderr)?;
        let stdin = match &self.stdin {
            Some(path) => Stdio::from(File::open(path).map_err(|source| {
                StageError::Redirect {
                    path: path.clone(),
                    source,
                }
            })?),
            None => Stdio::null(),
        };

        let start = Instant::now();
        let child = Command::new(&self.program)
            .args(&self.args)
            .stdin(stdin)
            .stdout(stdout)
            .stderr(stderr)
            .spawn()
            .map_err(|source| StageError::Spawn {
                program: self.program.clone(),
                source,
            })?;

        let exit = self.wait(child, start)?;
        let elapsed = start.elapsed();

        // Capture is best effort; a missing stderr file only loses detail.
        let stderr = fs::read(&self.stderr)
            .map(|bytes| String::from_utf8_lossy(&bytes).to_string())
            .unwrap_or_default();

        Ok(StageOutput {
            exit,
            stderr,
            elapsed,
        })
    }

    fn wait(&self, mut child: Child, start: Instant) -> Result<StageExit, StageError> {
        let wait_err = |source| StageError::Wait {
            program: self.program.clone(),
            source,
        };

        loop {
            if let Some(status) = child.try_wait().map_err(wait_err)? {
                return Ok(StageExit::from_status(status));
            }
            if start.elapsed() >= self.timeout {
                // The child may exit between try_wait and kill; reaping covers both.
                let _ = child.kill();
                child.wait().map_err(wait_err)?;
                return Ok(StageExit::TimedOut);
            }
            thread::sleep(POLL_INTERVAL);
        }
    }
}

fn create_redirect(path: &Path) -> Result<File, StageError> {
    File::create(path).map_err(|source| StageError::Redirect {
        path: path.to_path_buf(),
        source,
    })
}
