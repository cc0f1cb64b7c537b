//! Worker module: the seam around the external download tool.
//!
//! One job owns one worker process. The [`Worker`] trait spawns processes and
//! the [`WorkerProcess`] trait exposes their combined output as a finite line
//! stream plus an exit status, so the manager can be exercised against a
//! scripted fake instead of a real yt-dlp binary.

mod config;
mod error;
mod traits;
mod ytdlp;

pub use config::WorkerConfig;
pub use error::WorkerError;
pub use traits::{KillSwitch, ProcessKiller, Worker, WorkerProcess};
pub use ytdlp::YtdlpWorker;
