use std::{
    fmt,
    fs::{create_dir_all, File, OpenOptions},
    io::{self, Write},
    path::{Path, PathBuf},
    sync::mpsc::{Receiver, RecvTimeoutError},
    thread::{self, JoinHandle},
    time::Duration,
};

use chrono::{DateTime, Utc};

use crate::{
    threads::DATE_TIME_FMT,
    utils::sync_flag::{new_sync_flag, FlagHolder, FlagWatch},
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogTag {
    /// Command sent to the device.
    Tx,
    /// Telemetry accepted from the device.
    Rx,
    /// Connection and session events.
    Ev,
}

impl fmt::Display for LogTag {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            LogTag::Tx => write!(f, "tx"),
            LogTag::Rx => write!(f, "rx"),
            LogTag::Ev => write!(f, "ev"),
        }
    }
}

#[derive(Debug, Clone)]
pub struct LogLine {
    pub instant: DateTime<Utc>,
    pub tag: LogTag,
    pub text: String,
}

impl LogLine {
    pub fn new(tag: LogTag, text: impl Into<String>) -> Self {
        Self {
            instant: Utc::now(),
            tag,
            text: text.into(),
        }
    }
}

impl fmt::Display for LogLine {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(
            f,
            "{} {} {}",
            self.instant.format(DATE_TIME_FMT),
            self.tag,
            self.text.trim_end()
        )
    }
}

pub struct FileLoggerThread {
    running: FlagHolder,
    path: PathBuf,
    join_handle: JoinHandle<io::Result<()>>,
}

impl FileLoggerThread {
    /// Opens a fresh `pump_<timestamp>.log` in `dir` and starts draining
    /// `line_receiver` into it.
    pub fn spawn(dir: &Path, line_receiver: Receiver<LogLine>) -> io::Result<Self> {
        create_dir_all(dir)?;

        let fmt = "%y%m%d_%H%M%S";
        let file_name = format!("pump_{}.log", Utc::now().format(fmt));
        let path = dir.join(file_name);
        let file = match OpenOptions::new().create(true).append(true).open(&path) {
            Ok(opened_file) => {
                println!("> [file_logger_task] opened {:?}", path);
                opened_file
            }
            Err(e) => {
                tracing::error!(path = ?path, error = %e, "cannot open session log");
                return Err(e);
            }
        };

        let (watch, holder) = new_sync_flag();
        Ok(Self {
            running: holder,
            path,
            join_handle: thread::spawn(move || file_logger_task(watch, file, line_receiver)),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Stops the thread once it has written everything already queued.
    pub fn join(self) -> io::Result<()> {
        self.running.lower();
        match self.join_handle.join() {
            Ok(res) => res,
            Err(_) => Err(io::Error::new(
                io::ErrorKind::Other,
                "file logger thread panicked",
            )),
        }
    }
}

fn write_line(file: &mut File, line: &LogLine) -> io::Result<()> {
    writeln!(file, "{}", line).map_err(|e| {
        println!("> [file_logger_task] write error {:#?}", e);
        e
    })
}

fn file_logger_task(
    running: FlagWatch,
    mut file: File,
    line_receiver: Receiver<LogLine>,
) -> io::Result<()> {
    let mut synced = true;
    let duration = Duration::from_millis(100);
    while running.is_raised() {
        match line_receiver.recv_timeout(duration) {
            Ok(line) => {
                write_line(&mut file, &line)?;
                synced = false;
            }
            Err(RecvTimeoutError::Timeout) if !synced => {
                file.sync_all()?;
                synced = true;
            }
            Err(RecvTimeoutError::Timeout) => {}
            Err(RecvTimeoutError::Disconnected) => break,
        }
    }
    for line in line_receiver.try_iter() {
        write_line(&mut file, &line)?;
    }
    file.sync_all()
}
