//! In-memory stand-ins for the serial port, the operator and port
//! discovery. Used by the unit and integration tests.

use crate::{
    error::LinkError,
    link::{DeviceLink, PortRead},
    session::Connector,
    utils::user_io::Operator,
};
use std::{
    collections::VecDeque,
    io::{self, ErrorKind, Read, Write},
    sync::{Arc, Mutex, MutexGuard},
};

#[derive(Default)]
struct MockPortState {
    inbound: VecDeque<u8>,
    outbound: Vec<u8>,
    read_failure: Option<ErrorKind>,
}

/// A full-duplex port backed by two byte buffers. Clones share the buffers,
/// so a test can keep one clone to feed and inspect the port.
#[derive(Clone, Default)]
pub struct MockPort {
    state: Arc<Mutex<MockPortState>>,
}

impl MockPort {
    pub fn new() -> Self {
        Self::default()
    }

    fn state(&self) -> MutexGuard<'_, MockPortState> {
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Queues bytes as if the device had sent them.
    pub fn push_str(&self, text: &str) {
        self.state().inbound.extend(text.as_bytes());
    }

    pub fn push_bytes(&self, bytes: &[u8]) {
        self.state().inbound.extend(bytes);
    }

    /// Every following read fails with `kind`, as a closed or unplugged
    /// port would.
    pub fn fail_reads(&self, kind: ErrorKind) {
        self.state().read_failure = Some(kind);
    }

    /// Everything written to the port so far, as text.
    pub fn written(&self) -> String {
        String::from_utf8_lossy(&self.state().outbound).into_owned()
    }

    pub fn pending(&self) -> usize {
        self.state().inbound.len()
    }
}

impl Read for MockPort {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        let mut state = self.state();
        if let Some(kind) = state.read_failure {
            return Err(io::Error::new(kind, "mock read failure"));
        }
        if state.inbound.is_empty() {
            return Err(io::Error::new(ErrorKind::TimedOut, "mock read timeout"));
        }
        let mut count = 0;
        while count < buf.len() {
            match state.inbound.pop_front() {
                Some(byte) => {
                    buf[count] = byte;
                    count += 1;
                }
                None => break,
            }
        }
        Ok(count)
    }
}

impl Write for MockPort {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.state().outbound.extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

impl PortRead for MockPort {
    fn bytes_waiting(&self) -> io::Result<u32> {
        let state = self.state();
        if state.read_failure.is_some() {
            return Ok(1);
        }
        Ok(state.inbound.len() as u32)
    }
}

/// A writer whose every write fails.
pub struct BrokenWriter;

impl Write for BrokenWriter {
    fn write(&mut self, _buf: &[u8]) -> io::Result<usize> {
        Err(io::Error::new(ErrorKind::BrokenPipe, "device unplugged"))
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoticeKind {
    Question,
    Warning,
    Error,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notice {
    pub kind: NoticeKind,
    pub title: String,
    pub message: String,
}

/// An operator that answers from a script and records what it was shown.
#[derive(Default)]
pub struct ScriptedOperator {
    answers: VecDeque<bool>,
    commands: VecDeque<String>,
    pub notices: Vec<Notice>,
}

impl ScriptedOperator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn answering(mut self, answer: bool) -> Self {
        self.answers.push_back(answer);
        self
    }

    pub fn typing(mut self, command: &str) -> Self {
        self.commands.push_back(command.to_string());
        self
    }

    pub fn titles(&self) -> Vec<&str> {
        self.notices.iter().map(|n| n.title.as_str()).collect()
    }

    fn record(&mut self, kind: NoticeKind, title: &str, message: &str) {
        self.notices.push(Notice {
            kind,
            title: title.to_string(),
            message: message.to_string(),
        });
    }
}

impl Operator for ScriptedOperator {
    fn ask_yes_no(&mut self, title: &str, message: &str) -> bool {
        self.record(NoticeKind::Question, title, message);
        self.answers.pop_front().unwrap_or(false)
    }

    fn warn(&mut self, title: &str, message: &str) {
        self.record(NoticeKind::Warning, title, message);
    }

    fn error(&mut self, title: &str, message: &str) {
        self.record(NoticeKind::Error, title, message);
    }

    fn read_command(&mut self) -> Option<String> {
        self.commands.pop_front()
    }
}

enum OpenOutcome {
    Port(MockPort),
    Fail(String),
}

/// Discovery and link opening without hardware.
pub struct MockConnector {
    found: Option<String>,
    outcome: OpenOutcome,
    pub open_attempts: Vec<String>,
}

impl MockConnector {
    /// Discovery finds nothing.
    pub fn no_device() -> Self {
        Self {
            found: None,
            outcome: OpenOutcome::Fail("no device".into()),
            open_attempts: vec![],
        }
    }

    /// Discovery finds `port_name` and opening it yields `port`.
    pub fn with_port(port_name: &str, port: MockPort) -> Self {
        Self {
            found: Some(port_name.to_string()),
            outcome: OpenOutcome::Port(port),
            open_attempts: vec![],
        }
    }

    /// Discovery finds `port_name` but opening it fails with `reason`.
    pub fn failing(port_name: &str, reason: &str) -> Self {
        Self {
            found: Some(port_name.to_string()),
            outcome: OpenOutcome::Fail(reason.to_string()),
            open_attempts: vec![],
        }
    }
}

impl Connector for MockConnector {
    fn discover(&mut self) -> Option<String> {
        self.found.clone()
    }

    fn open(&mut self, port_name: &str) -> Result<DeviceLink, LinkError> {
        self.open_attempts.push(port_name.to_string());
        match &self.outcome {
            OpenOutcome::Port(port) => Ok(DeviceLink::from_parts(
                port_name,
                Box::new(port.clone()),
                Box::new(port.clone()),
            )),
            OpenOutcome::Fail(reason) => Err(LinkError::Open {
                port: port_name.to_string(),
                source: serialport::Error::new(serialport::ErrorKind::NoDevice, reason.as_str()),
            }),
        }
    }
}
