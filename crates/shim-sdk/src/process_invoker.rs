use crate::trace::TraceWriter;
use bytes::Bytes;
use std::ffi::OsStr;
use std::io::Write;
use std::path::Path;
use std::process::{ExitStatus, Stdio};
use std::sync::Arc;
use std::time::Duration;
use tokio::io::{AsyncRead, AsyncReadExt};
use tokio::process::Command;
use tokio::sync::mpsc;
use tokio::task::JoinError;

/// Size of the buffer used for each read from a child pipe.
const READ_CHUNK_SIZE: usize = 8 * 1024;

/// Which child stream a chunk of output came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputStream {
    Stdout,
    Stderr,
}

/// Receives child output as it arrives, before it lands in the combined buffer.
pub trait OutputForwarder: Send + Sync {
    fn forward(&self, stream: OutputStream, chunk: &[u8]);
}

/// Mirrors child output onto this process's own stdout / stderr.
#[derive(Debug, Clone, Default)]
pub struct StdioForwarder;

impl OutputForwarder for StdioForwarder {
    fn forward(&self, stream: OutputStream, chunk: &[u8]) {
        // A closed parent stream must not abort the child; drop the chunk.
        let _ = match stream {
            OutputStream::Stdout => {
                let mut out = std::io::stdout().lock();
                out.write_all(chunk).and_then(|_| out.flush())
            }
            OutputStream::Stderr => {
                let mut err = std::io::stderr().lock();
                err.write_all(chunk).and_then(|_| err.flush())
            }
        };
    }
}

/// Discards child output. Useful for tests.
#[derive(Debug, Clone, Default)]
pub struct NullForwarder;

impl OutputForwarder for NullForwarder {
    fn forward(&self, _stream: OutputStream, _chunk: &[u8]) {}
}

/// How a child process ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProcessTermination {
    /// Normal exit with the given code.
    Exited(i32),
    /// Killed by the given signal number (Unix only).
    Signaled(i32),
}

impl ProcessTermination {
    pub fn success(&self) -> bool {
        matches!(self, ProcessTermination::Exited(0))
    }

    pub fn exit_code(&self) -> Option<i32> {
        match self {
            ProcessTermination::Exited(code) => Some(*code),
            ProcessTermination::Signaled(_) => None,
        }
    }

    /// Symbolic signal name, e.g. `SIGTERM`, when the process was signaled.
    pub fn signal_name(&self) -> Option<String> {
        match self {
            ProcessTermination::Exited(_) => None,
            ProcessTermination::Signaled(sig) => Some(signal_name(*sig)),
        }
    }
}

impl From<ExitStatus> for ProcessTermination {
    fn from(status: ExitStatus) -> Self {
        if let Some(code) = status.code() {
            return ProcessTermination::Exited(code);
        }
        #[cfg(unix)]
        {
            use std::os::unix::process::ExitStatusExt;
            if let Some(sig) = status.signal() {
                return ProcessTermination::Signaled(sig);
            }
        }
        ProcessTermination::Exited(-1)
    }
}

#[cfg(unix)]
fn signal_name(sig: i32) -> String {
    nix::sys::signal::Signal::try_from(sig)
        .map(|s| s.as_str().to_string())
        .unwrap_or_else(|_| sig.to_string())
}

#[cfg(not(unix))]
fn signal_name(sig: i32) -> String {
    sig.to_string()
}

/// Everything observed from one finished child process.
#[derive(Debug, Clone)]
pub struct ProcessOutput {
    pub pid: u32,
    pub termination: ProcessTermination,
    /// stdout and stderr interleaved in the order the chunks were read.
    pub combined: Vec<u8>,
    pub elapsed: Duration,
}

impl ProcessOutput {
    /// The combined output decoded as UTF-8, replacing invalid sequences.
    pub fn combined_text(&self) -> String {
        String::from_utf8_lossy(&self.combined).into_owned()
    }
}

/// Failures that prevent a process from running to completion.
#[derive(Debug, thiserror::Error)]
pub enum ProcessError {
    #[error("Failed to start process '{file_name}': {source}")]
    Spawn {
        file_name: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to wait for process '{file_name}': {source}")]
    Wait {
        file_name: String,
        #[source]
        source: std::io::Error,
    },
}

/// Spawns a child with an explicit environment, forwards its stdout/stderr
/// live and buffers both into one combined byte stream.
///
/// The call suspends until the child exits. There is no timeout.
pub struct ProcessInvoker {
    trace: Arc<dyn TraceWriter>,
    forwarder: Arc<dyn OutputForwarder>,
}

impl ProcessInvoker {
    pub fn new(trace: Arc<dyn TraceWriter>, forwarder: Arc<dyn OutputForwarder>) -> Self {
        Self { trace, forwarder }
    }

    /// Execute `file_name` with `arguments`.
    ///
    /// The child sees exactly `environment`; nothing is inherited implicitly.
    /// A non-zero exit is not an error here, callers inspect `termination`.
    pub async fn execute<I, K, V>(
        &self,
        working_directory: Option<&Path>,
        file_name: &Path,
        arguments: &[String],
        environment: I,
    ) -> Result<ProcessOutput, ProcessError>
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<OsStr>,
        V: AsRef<OsStr>,
    {
        let display_name = file_name.display().to_string();

        self.trace.info("Starting process:");
        self.trace.info(&format!("  File name: '{display_name}'"));
        self.trace
            .info(&format!("  Arguments: '{}'", arguments.join(" ")));
        if let Some(dir) = working_directory {
            self.trace
                .info(&format!("  Working directory: '{}'", dir.display()));
        }

        let mut cmd = Command::new(file_name);
        cmd.args(arguments)
            .env_clear()
            .envs(environment)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped());

        if let Some(dir) = working_directory.filter(|d| d.is_dir()) {
            cmd.current_dir(dir);
        }

        let start = std::time::Instant::now();
        let mut child = cmd.spawn().map_err(|source| ProcessError::Spawn {
            file_name: display_name.clone(),
            source,
        })?;

        let pid = child.id().unwrap_or(0);
        self.trace.info(&format!(
            "Process started with process id {pid}, waiting for process exit."
        ));

        let (tx, mut rx) = mpsc::unbounded_channel::<(OutputStream, Bytes)>();
        let mut readers = Vec::with_capacity(2);
        if let Some(stdout) = child.stdout.take() {
            let reader = tokio::spawn(pump(stdout, OutputStream::Stdout, tx.clone()));
            readers.push((OutputStream::Stdout, reader));
        }
        if let Some(stderr) = child.stderr.take() {
            let reader = tokio::spawn(pump(stderr, OutputStream::Stderr, tx.clone()));
            readers.push((OutputStream::Stderr, reader));
        }
        drop(tx);

        // Ends once both readers hit EOF and drop their senders.
        let mut combined = Vec::new();
        while let Some((stream, chunk)) = rx.recv().await {
            self.forwarder.forward(stream, &chunk);
            combined.extend_from_slice(&chunk);
        }
        for (stream, reader) in readers {
            self.report_reader(pid, stream, reader.await);
        }

        let status = child.wait().await.map_err(|source| ProcessError::Wait {
            file_name: display_name.clone(),
            source,
        })?;
        let termination = ProcessTermination::from(status);
        let elapsed = start.elapsed();

        match termination {
            ProcessTermination::Exited(code) => self.trace.info(&format!(
                "Finished process {pid} with exit code {code}, and elapsed time {elapsed:.2?}."
            )),
            ProcessTermination::Signaled(_) => self.trace.info(&format!(
                "Process {pid} terminated by signal {}, after {elapsed:.2?}.",
                termination.signal_name().unwrap_or_default()
            )),
        }

        Ok(ProcessOutput {
            pid,
            termination,
            combined,
            elapsed,
        })
    }

    /// A reader that stopped early leaves the captured output truncated.
    fn report_reader(
        &self,
        pid: u32,
        stream: OutputStream,
        joined: Result<std::io::Result<()>, JoinError>,
    ) {
        match joined {
            Ok(Ok(())) => {}
            Ok(Err(e)) => self.trace.warning(&format!(
                "Reading {stream:?} of process {pid} failed, output may be incomplete: {e}"
            )),
            Err(e) => self.trace.warning(&format!(
                "{stream:?} reader of process {pid} did not finish, output may be incomplete: {e}"
            )),
        }
    }
}

/// Read raw chunks from one child pipe until EOF or a read error.
async fn pump<R>(
    mut reader: R,
    stream: OutputStream,
    tx: mpsc::UnboundedSender<(OutputStream, Bytes)>,
) -> std::io::Result<()>
where
    R: AsyncRead + Unpin,
{
    let mut buf = vec![0u8; READ_CHUNK_SIZE];
    loop {
        let n = reader.read(&mut buf).await?;
        if n == 0 {
            return Ok(());
        }
        if tx.send((stream, Bytes::copy_from_slice(&buf[..n]))).is_err() {
            return Ok(());
        }
    }
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;
    use crate::trace::{CollectingTraceWriter, NullTraceWriter};
    use std::path::PathBuf;

    #[derive(Default)]
    struct RecordingForwarder {
        chunks: parking_lot::Mutex<Vec<(OutputStream, Vec<u8>)>>,
    }

    impl OutputForwarder for RecordingForwarder {
        fn forward(&self, stream: OutputStream, chunk: &[u8]) {
            self.chunks.lock().push((stream, chunk.to_vec()));
        }
    }

    fn base_env() -> std::collections::BTreeMap<String, String> {
        let mut env = std::collections::BTreeMap::new();
        env.insert("PATH".to_string(), "/usr/bin:/bin".to_string());
        env
    }

    fn sh() -> PathBuf {
        PathBuf::from("/bin/sh")
    }

    fn args(script: &str) -> Vec<String> {
        vec!["-c".to_string(), script.to_string()]
    }

    fn make_invoker() -> ProcessInvoker {
        ProcessInvoker::new(Arc::new(NullTraceWriter), Arc::new(NullForwarder))
    }

    #[tokio::test]
    async fn captures_stdout_and_stderr() {
        let output = make_invoker()
            .execute(None, &sh(), &args("echo out; echo err 1>&2"), &base_env())
            .await
            .unwrap();

        assert!(output.termination.success());
        let text = output.combined_text();
        assert!(text.contains("out\n"));
        assert!(text.contains("err\n"));
    }

    #[tokio::test]
    async fn forwards_each_stream_separately() {
        let forwarder = Arc::new(RecordingForwarder::default());
        let invoker = ProcessInvoker::new(Arc::new(NullTraceWriter), forwarder.clone());

        invoker
            .execute(None, &sh(), &args("printf a; printf b 1>&2"), &base_env())
            .await
            .unwrap();

        let chunks = forwarder.chunks.lock().clone();
        let stdout: Vec<u8> = chunks
            .iter()
            .filter(|(s, _)| *s == OutputStream::Stdout)
            .flat_map(|(_, c)| c.clone())
            .collect();
        let stderr: Vec<u8> = chunks
            .iter()
            .filter(|(s, _)| *s == OutputStream::Stderr)
            .flat_map(|(_, c)| c.clone())
            .collect();
        assert_eq!(stdout, b"a");
        assert_eq!(stderr, b"b");
    }

    #[tokio::test]
    async fn child_sees_only_the_given_environment() {
        let mut env = base_env();
        env.insert("SHIM_TEST_VALUE".to_string(), "abc".to_string());

        let output = make_invoker()
            .execute(
                None,
                &sh(),
                &args("printf '%s|%s' \"$SHIM_TEST_VALUE\" \"${HOME:-unset}\""),
                &env,
            )
            .await
            .unwrap();

        assert_eq!(output.combined_text(), "abc|unset");
    }

    #[tokio::test]
    async fn non_zero_exit_is_reported_not_raised() {
        let output = make_invoker()
            .execute(None, &sh(), &args("echo partial; exit 3"), &base_env())
            .await
            .unwrap();

        assert_eq!(output.termination, ProcessTermination::Exited(3));
        assert_eq!(output.termination.exit_code(), Some(3));
        assert!(!output.termination.success());
        assert_eq!(output.combined_text(), "partial\n");
    }

    #[tokio::test]
    async fn signal_termination_is_named() {
        let output = make_invoker()
            .execute(None, &sh(), &args("kill -TERM $$"), &base_env())
            .await
            .unwrap();

        assert_eq!(output.termination.exit_code(), None);
        assert_eq!(output.termination.signal_name().as_deref(), Some("SIGTERM"));
    }

    #[tokio::test]
    async fn missing_executable_is_a_spawn_error() {
        let result = make_invoker()
            .execute(
                None,
                Path::new("/nonexistent/command_xyz_123"),
                &[],
                &base_env(),
            )
            .await;

        assert!(matches!(result, Err(ProcessError::Spawn { .. })));
    }

    #[tokio::test]
    async fn logs_start_and_finish() {
        let trace = Arc::new(CollectingTraceWriter::new());
        let invoker = ProcessInvoker::new(trace.clone(), Arc::new(NullForwarder));

        invoker
            .execute(Some(Path::new("/")), &sh(), &args("true"), &base_env())
            .await
            .unwrap();

        assert!(trace.contains("Starting process:"));
        assert!(trace.contains("Working directory: '/'"));
        assert!(trace.contains("with exit code 0"));
    }

    /// Yields one chunk, then fails.
    struct BrokenPipe {
        served: bool,
    }

    impl AsyncRead for BrokenPipe {
        fn poll_read(
            mut self: std::pin::Pin<&mut Self>,
            _cx: &mut std::task::Context<'_>,
            buf: &mut tokio::io::ReadBuf<'_>,
        ) -> std::task::Poll<std::io::Result<()>> {
            if self.served {
                return std::task::Poll::Ready(Err(std::io::Error::other("pipe broke")));
            }
            self.served = true;
            buf.put_slice(b"head");
            std::task::Poll::Ready(Ok(()))
        }
    }

    #[tokio::test]
    async fn pump_surfaces_read_errors_after_forwarding_earlier_chunks() {
        let (tx, mut rx) = mpsc::unbounded_channel();

        let result = pump(BrokenPipe { served: false }, OutputStream::Stdout, tx).await;

        assert_eq!(result.unwrap_err().to_string(), "pipe broke");
        let (stream, chunk) = rx.recv().await.unwrap();
        assert_eq!(stream, OutputStream::Stdout);
        assert_eq!(&chunk[..], b"head");
    }

    #[tokio::test]
    async fn truncated_output_is_traced_as_warning() {
        let trace = Arc::new(CollectingTraceWriter::new());
        let invoker = ProcessInvoker::new(trace.clone(), Arc::new(NullForwarder));

        let failed: Result<std::io::Result<()>, JoinError> =
            tokio::spawn(async { Err(std::io::Error::other("pipe broke")) }).await;
        invoker.report_reader(7, OutputStream::Stdout, failed);
        let panicked: Result<std::io::Result<()>, JoinError> =
            tokio::spawn(async { panic!("reader panicked") }).await;
        invoker.report_reader(7, OutputStream::Stderr, panicked);

        assert!(trace.contains("Reading Stdout of process 7 failed"));
        assert!(trace.contains("pipe broke"));
        assert!(trace.contains("Stderr reader of process 7 did not finish"));
    }
}
