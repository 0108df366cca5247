use crate::{
    config::Config,
    error::AppError,
    session::{open_session, SystemConnector},
    status_label::StatusLabel,
    threads::file_logger_thread::FileLoggerThread,
    user_console_thread::user_console_task,
    utils::user_io::ConsoleOperator,
};
use std::{path::Path, sync::mpsc::channel};
use thread_priority::{set_current_thread_priority, ThreadPriority};

pub mod file_logger_thread;
pub mod telemetry_thread;

pub const DATE_TIME_FMT: &str = "%y-%m-%d %H:%M:%S%.3f";

pub const TELEMETRY_THREAD_PRIORITY: u8 = 50;

/// Best effort: most desktop accounts may not raise thread priority.
pub fn set_thread_priority<const PRIORITY: u8>() {
    let priority = match PRIORITY.try_into() {
        Ok(value) => ThreadPriority::Crossplatform(value),
        Err(e) => {
            tracing::debug!(priority = PRIORITY, error = ?e, "invalid thread priority");
            return;
        }
    };
    if let Err(e) = set_current_thread_priority(priority) {
        tracing::debug!(priority = PRIORITY, error = ?e, "thread priority unchanged");
    }
}

pub fn main_task() -> Result<(), AppError> {
    println!("Microfluidic Pump Controller\n");

    let cfg = Config::load_or_default(Path::new("."))?;

    let (file_logger_thread, log_sender) = match &cfg.session_log_dir {
        Some(dir) => {
            let (line_sender, line_receiver) = channel();
            let thread = FileLoggerThread::spawn(dir, line_receiver)?;
            (Some(thread), Some(line_sender))
        }
        None => (None, None),
    };

    let mut operator = ConsoleOperator::new()?;
    let mut connector = SystemConnector::new(&cfg);
    let label = StatusLabel::with_echo(operator.label_echo());

    if let Some(mut session) = open_session(&mut connector, &mut operator, &cfg, label, log_sender)
    {
        user_console_task(&mut session, &mut operator);
        session.close();
    } else {
        println!("> [main_task] terminated without a device");
    }

    if let Some(file_logger_thread) = file_logger_thread {
        if let Err(e) = file_logger_thread.join() {
            tracing::error!(error = %e, "session log incomplete");
        }
    }

    Ok(println!("> [main_task] end"))
}
