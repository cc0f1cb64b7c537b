pub mod config;
pub mod manager;
pub mod progress;
pub mod worker;

pub use config::{load_config, load_config_from_str, Config, ConfigError};
pub use manager::{
    DownloadManager, Job, JobRegistry, JobSnapshot, JobState, ManagerError, STATUS_COMPLETE,
    STATUS_ERROR, STATUS_STOPPED,
};
pub use progress::{parse_line, ProgressEvent, SpeedTracker};
pub use worker::{
    KillSwitch, ProcessKiller, Worker, WorkerConfig, WorkerError, WorkerProcess, YtdlpWorker,
};
