use crate::{
    link::LinkReader,
    protocol::parse_flow_line,
    status_label::StatusLabel,
    threads::{
        file_logger_thread::{LogLine, LogTag},
        set_thread_priority, TELEMETRY_THREAD_PRIORITY,
    },
    utils::sync_flag::{new_sync_flag, FlagHolder, FlagWatch},
};
use std::{
    sync::mpsc::Sender,
    thread::{self, JoinHandle},
    time::Duration,
};

/// Why the telemetry loop returned.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TelemetryExit {
    Disconnected,
    TransportError,
}

/// Background reader publishing flow readings to the status label while
/// the link is connected.
pub struct TelemetryThread {
    connected: FlagHolder,
    join_handle: Option<JoinHandle<TelemetryExit>>,
}

impl TelemetryThread {
    pub fn spawn(
        reader: LinkReader,
        label: StatusLabel,
        poll_interval: Duration,
        log_sender: Option<Sender<LogLine>>,
    ) -> Self {
        let (watch, holder) = new_sync_flag();
        Self {
            connected: holder,
            join_handle: Some(thread::spawn(move || {
                set_thread_priority::<TELEMETRY_THREAD_PRIORITY>();
                telemetry_task(watch, reader, label, poll_interval, log_sender)
            })),
        }
    }

    /// True while the loop is still polling.
    pub fn is_running(&self) -> bool {
        match &self.join_handle {
            Some(handle) => !handle.is_finished(),
            None => false,
        }
    }

    /// Marks the link disconnected and waits for the loop to notice.
    pub fn stop(&mut self) -> Option<TelemetryExit> {
        self.connected.lower();
        let handle = self.join_handle.take()?;
        match handle.join() {
            Ok(exit) => Some(exit),
            Err(_) => {
                tracing::error!("telemetry thread panicked");
                None
            }
        }
    }
}

impl Drop for TelemetryThread {
    fn drop(&mut self) {
        self.stop();
    }
}

/// Polls `reader` until `connected` is lowered or the transport fails.
///
/// Lines that are not valid UTF-8 or not a parsable `FLOW,` reading are
/// dropped without a trace.
pub fn telemetry_task(
    connected: FlagWatch,
    mut reader: LinkReader,
    label: StatusLabel,
    poll_interval: Duration,
    log_sender: Option<Sender<LogLine>>,
) -> TelemetryExit {
    tracing::debug!("telemetry start");
    while connected.is_raised() {
        let waiting = match reader.bytes_waiting() {
            Ok(waiting) => waiting,
            Err(e) => {
                tracing::debug!(error = %e, "telemetry stopped on transport error");
                return TelemetryExit::TransportError;
            }
        };
        if waiting == 0 {
            thread::sleep(poll_interval);
            continue;
        }

        let bytes = match reader.read_line() {
            Ok(Some(bytes)) => bytes,
            Ok(None) => continue,
            Err(e) => {
                tracing::debug!(error = %e, "telemetry stopped on transport error");
                return TelemetryExit::TransportError;
            }
        };
        let Ok(text) = std::str::from_utf8(&bytes) else {
            continue;
        };
        let line = text.trim();
        if let Some(value) = parse_flow_line(line) {
            label.publish_reading(value);
            if let Some(log_sender) = &log_sender {
                let _ = log_sender.send(LogLine::new(LogTag::Rx, line));
            }
        }
    }
    tracing::debug!("telemetry end");
    TelemetryExit::Disconnected
}
