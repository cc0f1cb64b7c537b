//! yt-dlp based worker implementation.

use async_trait::async_trait;
use std::path::Path;
use std::process::Stdio;
use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, AsyncRead, BufReader};
use tokio::process::{Child, Command};
use tokio::sync::{mpsc, Mutex};
use tokio::time::{sleep, Duration};
use tracing::debug;

use super::config::WorkerConfig;
use super::error::WorkerError;
use super::traits::{KillSwitch, ProcessKiller, Worker, WorkerProcess};

/// Process handle shared between the supervising task and the kill switch.
type SharedChild = Arc<Mutex<Option<Child>>>;

/// yt-dlp backed worker.
pub struct YtdlpWorker {
    config: WorkerConfig,
}

impl YtdlpWorker {
    /// Creates a new worker with the given configuration.
    pub fn new(config: WorkerConfig) -> Self {
        Self { config }
    }

    /// Creates a worker with default configuration.
    pub fn with_defaults() -> Self {
        Self::new(WorkerConfig::default())
    }

    /// Builds the yt-dlp invocation for one source.
    fn build_args(&self, source: &str, target_dir: &Path) -> Vec<String> {
        let mut args = vec![
            "-f".to_string(),
            format!(
                "bestvideo[height<={}]+bestaudio/best",
                self.config.max_height
            ),
            "--merge-output-format".to_string(),
            self.config.merge_output_format.clone(),
            "--newline".to_string(),
            "-o".to_string(),
            target_dir
                .join(&self.config.output_template)
                .to_string_lossy()
                .to_string(),
        ];
        args.extend(self.config.extra_args.iter().cloned());
        args.push(source.to_string());
        args
    }
}

#[async_trait]
impl Worker for YtdlpWorker {
    fn name(&self) -> &str {
        "yt-dlp"
    }

    async fn validate(&self) -> Result<(), WorkerError> {
        let result = Command::new(&self.config.binary_path)
            .arg("--version")
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .status()
            .await;

        match result {
            Ok(_) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                Err(WorkerError::BinaryNotFound {
                    path: self.config.binary_path.clone(),
                })
            }
            Err(e) => Err(WorkerError::Io(e)),
        }
    }

    async fn spawn(
        &self,
        source: &str,
        target_dir: &Path,
    ) -> Result<Box<dyn WorkerProcess>, WorkerError> {
        tokio::fs::create_dir_all(target_dir)
            .await
            .map_err(|_| WorkerError::TargetDirFailed {
                path: target_dir.to_path_buf(),
            })?;

        let args = self.build_args(source, target_dir);
        debug!(worker = self.name(), source, "spawning worker process");

        let mut child = Command::new(&self.config.binary_path)
            .args(&args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| {
                if e.kind() == std::io::ErrorKind::NotFound {
                    WorkerError::BinaryNotFound {
                        path: self.config.binary_path.clone(),
                    }
                } else {
                    WorkerError::spawn_failed(e.to_string())
                }
            })?;

        // Fan both pipes into one channel; the channel closes once both
        // forwarders hit EOF, which ends the job's line stream.
        let (tx, rx) = mpsc::channel(64);
        if let Some(stdout) = child.stdout.take() {
            forward_lines(stdout, tx.clone());
        }
        if let Some(stderr) = child.stderr.take() {
            forward_lines(stderr, tx);
        }

        Ok(Box::new(YtdlpProcess {
            lines: rx,
            child: Arc::new(Mutex::new(Some(child))),
        }))
    }
}

/// Forwards one pipe into the shared line channel until it closes.
fn forward_lines(pipe: impl AsyncRead + Send + Unpin + 'static, tx: mpsc::Sender<String>) {
    tokio::spawn(async move {
        let mut lines = BufReader::new(pipe).lines();
        while let Ok(Some(line)) = lines.next_line().await {
            if tx.send(line).await.is_err() {
                break;
            }
        }
    });
}

/// A live yt-dlp process.
#[derive(Debug)]
struct YtdlpProcess {
    lines: mpsc::Receiver<String>,
    child: SharedChild,
}

#[async_trait]
impl WorkerProcess for YtdlpProcess {
    async fn next_line(&mut self) -> Option<String> {
        self.lines.recv().await
    }

    async fn wait(&mut self) -> Result<bool, WorkerError> {
        // Polled via try_wait so the kill switch can take the lock between
        // checks instead of blocking behind a held-across-await wait().
        loop {
            {
                let mut guard = self.child.lock().await;
                let Some(child) = guard.as_mut() else {
                    return Ok(false);
                };
                if let Some(status) = child.try_wait()? {
                    *guard = None;
                    return Ok(status.success());
                }
            }
            sleep(Duration::from_millis(50)).await;
        }
    }

    fn killer(&self) -> ProcessKiller {
        Arc::new(ChildKiller {
            child: self.child.clone(),
        })
    }
}

/// Kill switch over the shared child handle.
struct ChildKiller {
    child: SharedChild,
}

#[async_trait]
impl KillSwitch for ChildKiller {
    async fn kill(&self) {
        let mut guard = self.child.lock().await;
        if let Some(child) = guard.as_mut() {
            if let Err(e) = child.start_kill() {
                // Process already exited between the check and the signal.
                debug!(error = %e, "kill signal ignored");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn test_build_args_selects_quality_and_output() {
        let worker = YtdlpWorker::with_defaults();
        let args = worker.build_args("https://example.com/v", Path::new("/downloads"));

        assert!(args.contains(&"-f".to_string()));
        assert!(args.contains(&"bestvideo[height<=2160]+bestaudio/best".to_string()));
        assert!(args.contains(&"--merge-output-format".to_string()));
        assert!(args.contains(&"mp4".to_string()));
        assert!(args.contains(&"--newline".to_string()));
        assert!(args.contains(&"/downloads/%(title)s.%(ext)s".to_string()));
        assert_eq!(args.last(), Some(&"https://example.com/v".to_string()));
    }

    #[test]
    fn test_build_args_honors_config() {
        let worker = YtdlpWorker::new(WorkerConfig {
            max_height: 1080,
            merge_output_format: "mkv".to_string(),
            extra_args: vec!["--no-playlist".to_string()],
            ..WorkerConfig::default()
        });
        let args = worker.build_args("url", Path::new("/d"));

        assert!(args.contains(&"bestvideo[height<=1080]+bestaudio/best".to_string()));
        assert!(args.contains(&"mkv".to_string()));
        assert!(args.contains(&"--no-playlist".to_string()));
    }

    #[tokio::test]
    async fn test_validate_missing_binary() {
        let worker = YtdlpWorker::new(WorkerConfig {
            binary_path: PathBuf::from("/nonexistent/tuberack-test-binary"),
            ..WorkerConfig::default()
        });
        let err = worker.validate().await.unwrap_err();
        assert!(matches!(err, WorkerError::BinaryNotFound { .. }));
    }

    #[tokio::test]
    async fn test_spawn_missing_binary() {
        let worker = YtdlpWorker::new(WorkerConfig {
            binary_path: PathBuf::from("/nonexistent/tuberack-test-binary"),
            ..WorkerConfig::default()
        });
        let dir = tempfile::tempdir().unwrap();
        let err = worker.spawn("url", dir.path()).await.unwrap_err();
        assert!(matches!(err, WorkerError::BinaryNotFound { .. }));
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_spawn_streams_lines_and_reports_exit() {
        // `echo` prints its arguments and exits 0, standing in for a worker
        // with a one-line feed.
        let worker = YtdlpWorker::new(WorkerConfig {
            binary_path: PathBuf::from("echo"),
            ..WorkerConfig::default()
        });
        let dir = tempfile::tempdir().unwrap();
        let mut process = worker.spawn("https://example.com/v", dir.path()).await.unwrap();

        let line = process.next_line().await.unwrap();
        assert!(line.contains("bestaudio"));
        assert!(line.ends_with("https://example.com/v"));
        assert!(process.next_line().await.is_none());
        assert!(process.wait().await.unwrap());
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_spawn_reports_nonzero_exit() {
        let worker = YtdlpWorker::new(WorkerConfig {
            binary_path: PathBuf::from("false"),
            ..WorkerConfig::default()
        });
        let dir = tempfile::tempdir().unwrap();
        let mut process = worker.spawn("url", dir.path()).await.unwrap();

        while process.next_line().await.is_some() {}
        assert!(!process.wait().await.unwrap());
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_kill_switch_terminates_live_process() {
        // `yes` echoes its arguments forever until killed.
        let worker = YtdlpWorker::new(WorkerConfig {
            binary_path: PathBuf::from("yes"),
            ..WorkerConfig::default()
        });
        let dir = tempfile::tempdir().unwrap();
        let mut process = worker.spawn("url", dir.path()).await.unwrap();

        assert!(process.next_line().await.is_some());
        process.killer().kill().await;
        while process.next_line().await.is_some() {}
        assert!(!process.wait().await.unwrap());
    }
}
