//! Spawns an MCP server as a child process and talks to it over its
//! stdin/stdout, framed the same way as [`super::io::stdio`].
//!
//! The child is spawned into its own process group via [`process_wrap`] so
//! that dropping (or explicitly killing) the [`TokioChildProcess`] tears down
//! any grandchildren it spawned too - a bare `tokio::process::Child::kill`
//! only kills the direct child, leaving orphans behind.

use std::process::Stdio;

use process_wrap::tokio::{ProcessGroup, TokioChildWrapper, TokioCommandWrap};
use tokio::process::{ChildStdin, ChildStdout};

use super::async_rw::into_transport;

/// A running child process, framed as an MCP transport over its piped
/// stdin/stdout.
///
/// Dropping this kills the child's whole process group. Use
/// [`TokioChildProcess::id`] to inspect the child's PID, or
/// [`TokioChildProcess::wait`] to await its exit without killing it first.
pub struct TokioChildProcess {
    child: Box<dyn TokioChildWrapper>,
}

impl TokioChildProcess {
    /// Spawns `command` with stdin/stdout piped and stderr inherited (so the
    /// child's diagnostics land on this process's stderr rather than being
    /// silently swallowed), and returns the child together with the
    /// `(Sink, Stream)` pair framing its stdio as MCP messages.
    pub fn new<Rx, Tx>(
        mut command: tokio::process::Command,
    ) -> std::io::Result<(
        Self,
        (
            impl futures::Sink<Tx, Error = std::io::Error> + Send,
            impl futures::Stream<Item = Rx> + Send,
        ),
    )>
    where
        Rx: serde::de::DeserializeOwned + Send + 'static,
        Tx: serde::Serialize + Send + 'static,
    {
        command
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::inherit());

        let mut wrapped = TokioCommandWrap::from(command);
        wrapped.wrap(ProcessGroup::leader());
        let mut child = wrapped.spawn()?;

        let stdin: ChildStdin = child
            .stdin()
            .take()
            .ok_or_else(|| std::io::Error::other("child process stdin was not piped"))?;
        let stdout: ChildStdout = child
            .stdout()
            .take()
            .ok_or_else(|| std::io::Error::other("child process stdout was not piped"))?;

        let transport = into_transport(stdout, stdin);
        Ok((Self { child }, transport))
    }

    /// The OS process ID of the child, if it's still running.
    pub fn id(&self) -> Option<u32> {
        self.child.id()
    }

    /// Waits for the child to exit without killing it.
    pub async fn wait(&mut self) -> std::io::Result<std::process::ExitStatus> {
        self.child.wait().await
    }

    /// Kills the child's entire process group.
    pub async fn kill(&mut self) -> std::io::Result<()> {
        self.child.start_kill()?;
        self.child.wait().await.map(|_| ())
    }
}

impl Drop for TokioChildProcess {
    fn drop(&mut self) {
        if let Err(error) = self.child.start_kill() {
            tracing::warn!(%error, "failed to kill child process on drop");
        }
    }
}

#[cfg(feature = "which-command")]
/// Resolves `command` on `PATH` before spawning - useful when the command
/// name alone (`"npx"`, `"uvx"`) is ambiguous about which installation will
/// actually run, and you want a clear error up front rather than an opaque
/// "No such file or directory" from `exec`.
pub fn resolve_command(command: &str) -> std::io::Result<std::path::PathBuf> {
    which::which(command).map_err(std::io::Error::other)
}
