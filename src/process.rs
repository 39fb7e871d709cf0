//! External tool invocation.
//!
//! [`ToolCommand`] holds a program and its argument list and runs it without
//! a shell, so untrusted input such as a URL is never parsed as a command
//! line. Runs are blocking, bounded by an optional timeout, and observe a
//! [`CancellationToken`]. Stdout and stderr are drained on helper threads so
//! a chatty tool cannot stall on a full pipe.

use std::ffi::{OsStr, OsString};
use std::io::Read;
use std::path::{Path, PathBuf};
use std::process::{Child, Command, Stdio};
use std::sync::mpsc::{self, Receiver};
use std::thread;
use std::time::{Duration, Instant};

use crate::error::Video2PdfError;
use crate::progress::CancellationToken;

const POLL_INTERVAL: Duration = Duration::from_millis(50);
/// How long to wait for pipe readers after the child has been killed.
const KILL_GRACE: Duration = Duration::from_secs(2);

/// A program plus a structured argument list.
///
/// # Example
///
/// ```
/// use video2pdf::ToolCommand;
///
/// let command = ToolCommand::new("ffmpeg")
///     .arg("-i")
///     .arg("my video.mp4");
/// assert_eq!(command.render(), "ffmpeg -i 'my video.mp4'");
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ToolCommand {
    program: PathBuf,
    args: Vec<OsString>,
}

/// What a finished tool run left behind.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ToolOutput {
    /// Rendered command line that was run.
    pub command: String,
    /// Exit code. `None` when the process was terminated by a signal.
    pub exit_code: Option<i32>,
    /// Stdout followed by stderr, lossily decoded as UTF-8.
    pub output: String,
}

impl ToolOutput {
    /// `true` when the tool exited with status zero.
    pub fn success(&self) -> bool {
        self.exit_code == Some(0)
    }
}

impl ToolCommand {
    /// Start a command for `program` with no arguments.
    pub fn new(program: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
        }
    }

    /// Append one argument.
    #[must_use]
    pub fn arg(mut self, argument: impl Into<OsString>) -> Self {
        self.args.push(argument.into());
        self
    }

    /// Append several arguments.
    #[must_use]
    pub fn args<I, S>(mut self, arguments: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<OsString>,
    {
        self.args.extend(arguments.into_iter().map(Into::into));
        self
    }

    /// The program that will be launched.
    pub fn program(&self) -> &Path {
        &self.program
    }

    /// The argument list, in order.
    pub fn arguments(&self) -> &[OsString] {
        &self.args
    }

    /// Short tool name for messages, e.g. `ffmpeg` for `/usr/bin/ffmpeg`.
    pub fn tool_name(&self) -> String {
        self.program
            .file_stem()
            .unwrap_or(self.program.as_os_str())
            .to_string_lossy()
            .into_owned()
    }

    /// Render the command as a POSIX-shell-quoted line for logs and reports.
    ///
    /// The rendering is informational only; it is never executed.
    pub fn render(&self) -> String {
        std::iter::once(self.program.as_os_str())
            .chain(self.args.iter().map(OsString::as_os_str))
            .map(quote)
            .collect::<Vec<_>>()
            .join(" ")
    }

    /// Run to completion, blocking the calling thread.
    ///
    /// A non-zero exit is **not** an error here: it is reported through
    /// [`ToolOutput::exit_code`] for the caller to classify. Errors are
    /// reserved for failing to start the tool
    /// ([`Video2PdfError::ToolUnavailable`]), exceeding `timeout`
    /// ([`Video2PdfError::ToolTimeout`]), and cancellation
    /// ([`Video2PdfError::Cancelled`]). In the last two cases the process is
    /// killed before returning.
    pub fn run(
        &self,
        timeout: Option<Duration>,
        cancellation: Option<&CancellationToken>,
    ) -> Result<ToolOutput, Video2PdfError> {
        let command_line = self.render();
        log::debug!("Running: {command_line}");

        if cancellation.is_some_and(CancellationToken::is_cancelled) {
            return Err(Video2PdfError::Cancelled);
        }

        let mut child = Command::new(&self.program)
            .args(&self.args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|error| Video2PdfError::ToolUnavailable {
                tool: self.program.display().to_string(),
                reason: error.to_string(),
                command: command_line.clone(),
            })?;

        let stdout = child.stdout.take().map(PipeReader::spawn);
        let stderr = child.stderr.take().map(PipeReader::spawn);
        let deadline = timeout.map(|limit| Instant::now() + limit);

        let status = loop {
            match child.try_wait() {
                Ok(Some(status)) => break status,
                Ok(None) => {}
                Err(error) => {
                    terminate(&mut child);
                    return Err(error.into());
                }
            }

            if cancellation.is_some_and(CancellationToken::is_cancelled) {
                log::warn!("Cancelling {}", self.tool_name());
                terminate(&mut child);
                return Err(Video2PdfError::Cancelled);
            }

            if let (Some(deadline), Some(limit)) = (deadline, timeout) {
                if Instant::now() >= deadline {
                    log::warn!("{} exceeded {limit:?}, killing it", self.tool_name());
                    terminate(&mut child);
                    return Err(Video2PdfError::ToolTimeout {
                        tool: self.tool_name(),
                        timeout: limit,
                        command: command_line,
                        output: combine(stdout, stderr, Some(KILL_GRACE)),
                    });
                }
            }

            thread::sleep(POLL_INTERVAL);
        };

        let output = combine(stdout, stderr, None);
        let exit_code = status.code();
        log::debug!("{} exited with {:?}", self.tool_name(), exit_code);

        Ok(ToolOutput {
            command: command_line,
            exit_code,
            output,
        })
    }
}

fn terminate(child: &mut Child) {
    if let Err(error) = child.kill() {
        log::debug!("kill failed (process already gone?): {error}");
    }
    if let Err(error) = child.wait() {
        log::debug!("wait after kill failed: {error}");
    }
}

/// Reads a pipe to the end on its own thread.
struct PipeReader {
    receiver: Receiver<Vec<u8>>,
}

impl PipeReader {
    fn spawn<R: Read + Send + 'static>(mut pipe: R) -> Self {
        let (sender, receiver) = mpsc::channel();
        thread::spawn(move || {
            let mut buffer = Vec::new();
            if let Err(error) = pipe.read_to_end(&mut buffer) {
                buffer.extend_from_slice(format!("<failed to read tool output: {error}>").as_bytes());
            }
            // The receiver may have given up waiting; nothing to do then.
            let _ = sender.send(buffer);
        });
        Self { receiver }
    }

    /// Collect everything read. With `grace`, give up after that long; a
    /// grandchild process can keep the pipe open after the child is killed.
    fn finish(self, grace: Option<Duration>) -> Vec<u8> {
        let received = match grace {
            Some(grace) => self.receiver.recv_timeout(grace).ok(),
            None => self.receiver.recv().ok(),
        };
        received.unwrap_or_default()
    }
}

fn combine(stdout: Option<PipeReader>, stderr: Option<PipeReader>, grace: Option<Duration>) -> String {
    let parts: Vec<String> = [stdout, stderr]
        .into_iter()
        .flatten()
        .map(|pipe| String::from_utf8_lossy(&pipe.finish(grace)).into_owned())
        .filter(|text| !text.is_empty())
        .collect();
    parts.join("\n")
}

fn quote(piece: &OsStr) -> String {
    let text = piece.to_string_lossy();
    let is_plain = !text.is_empty()
        && text
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || "-_./:=,%+@".contains(c));
    if is_plain {
        text.into_owned()
    } else {
        format!("'{}'", text.replace('\'', r"'\''"))
    }
}
