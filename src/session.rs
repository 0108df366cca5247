use crate::{
    config::Config,
    discovery::{available_candidates, find_device_port},
    error::{Field, InputError, LinkError},
    link::{DeviceLink, LinkWriter},
    protocol::{encode_settings, PumpSettings},
    status_label::StatusLabel,
    threads::{
        file_logger_thread::{LogLine, LogTag},
        telemetry_thread::TelemetryThread,
    },
    utils::user_io::Operator,
};
use std::{io, sync::mpsc::Sender};

pub const NOT_FOUND_TITLE: &str = "Arduino Not Found";
pub const NOT_FOUND_MESSAGE: &str =
    "Arduino not found. Would you like to continue without Arduino?";
pub const CONNECT_FAILED_TITLE: &str = "Connection Failed";
pub const NO_DEVICE_TITLE: &str = "No Arduino";
pub const NO_DEVICE_MESSAGE: &str = "Arduino not connected.";
pub const INPUT_ERROR_TITLE: &str = "Input Error";
pub const INPUT_ERROR_MESSAGE: &str = "Please enter numeric values.";
pub const WRITE_FAILED_TITLE: &str = "Send Failed";

/// Finds and opens the pump controller.
pub trait Connector {
    fn discover(&mut self) -> Option<String>;
    fn open(&mut self, port_name: &str) -> Result<DeviceLink, LinkError>;
}

/// Discovery over the OS port list and real serial links.
pub struct SystemConnector {
    config: Config,
}

impl SystemConnector {
    pub fn new(config: &Config) -> Self {
        Self {
            config: config.clone(),
        }
    }
}

impl Connector for SystemConnector {
    fn discover(&mut self) -> Option<String> {
        let candidates = available_candidates();
        tracing::debug!(count = candidates.len(), "serial ports enumerated");
        find_device_port(
            &candidates,
            &self.config.path_token,
            &self.config.vendor_token,
        )
        .map(|candidate| candidate.port_name.clone())
    }

    fn open(&mut self, port_name: &str) -> Result<DeviceLink, LinkError> {
        println!("> [session] connecting to {}", port_name);
        DeviceLink::open(port_name, &self.config)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LinkState {
    Connected,
    Disconnected,
}

/// Outcome of the startup handshake.
pub enum Startup {
    Connected(DeviceLink),
    Degraded,
    Terminate,
}

/// Discovers and opens the device. On a miss or an open failure the
/// operator chooses between degraded mode and terminating.
pub fn establish_link<C: Connector, O: Operator>(connector: &mut C, operator: &mut O) -> Startup {
    let Some(port_name) = connector.discover() else {
        tracing::info!("no candidate port found");
        return ask_degraded(operator, NOT_FOUND_TITLE, NOT_FOUND_MESSAGE);
    };
    match connector.open(&port_name) {
        Ok(link) => Startup::Connected(link),
        Err(e) => {
            tracing::warn!(port = %port_name, error = %e, "link open failed");
            let message = format!(
                "Error connecting to Arduino:\n{}\nContinue without Arduino?",
                e
            );
            ask_degraded(operator, CONNECT_FAILED_TITLE, &message)
        }
    }
}

fn ask_degraded<O: Operator>(operator: &mut O, title: &str, message: &str) -> Startup {
    if operator.ask_yes_no(title, message) {
        Startup::Degraded
    } else {
        Startup::Terminate
    }
}

/// Free-form texts of the three form fields.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SettingsForm {
    pub flow: String,
    pub on_secs: String,
    pub off_secs: String,
}

impl SettingsForm {
    pub fn from_config(cfg: &Config) -> Self {
        Self {
            flow: cfg.default_flow.to_string(),
            on_secs: cfg.default_on_secs.to_string(),
            off_secs: cfg.default_off_secs.to_string(),
        }
    }

    pub fn set(&mut self, field: Field, text: &str) {
        let slot = match field {
            Field::Flow => &mut self.flow,
            Field::OnInterval => &mut self.on_secs,
            Field::OffInterval => &mut self.off_secs,
        };
        *slot = text.trim().to_string();
    }

    pub fn encode(&self) -> Result<PumpSettings, InputError> {
        encode_settings(&self.flow, &self.on_secs, &self.off_secs)
    }
}

#[derive(Debug)]
pub enum SendOutcome {
    Sent(PumpSettings),
    NotConnected,
    InvalidInput(InputError),
    WriteFailed(io::Error),
}

// Field order is drop order: the reader is joined before the writer
// releases the port.
struct Connected {
    telemetry: TelemetryThread,
    writer: LinkWriter,
    port_name: String,
}

/// One run of the control panel, connected or degraded.
pub struct Session {
    connection: Option<Connected>,
    form: SettingsForm,
    label: StatusLabel,
    log_sender: Option<Sender<LogLine>>,
}

impl Session {
    /// Takes ownership of `link` and starts the telemetry thread on its
    /// read half.
    pub fn connected(
        link: DeviceLink,
        cfg: &Config,
        label: StatusLabel,
        log_sender: Option<Sender<LogLine>>,
    ) -> Self {
        let DeviceLink {
            port_name,
            reader,
            writer,
        } = link;
        println!("> [session] connected to {}", port_name);
        log_event(&log_sender, format!("connected {}", port_name));
        let telemetry = TelemetryThread::spawn(
            reader,
            label.clone(),
            cfg.poll_interval(),
            log_sender.clone(),
        );
        Self {
            connection: Some(Connected {
                telemetry,
                writer,
                port_name,
            }),
            form: SettingsForm::from_config(cfg),
            label,
            log_sender,
        }
    }

    pub fn degraded(cfg: &Config, label: StatusLabel, log_sender: Option<Sender<LogLine>>) -> Self {
        label.set_disconnected();
        log_event(&log_sender, "degraded mode");
        Self {
            connection: None,
            form: SettingsForm::from_config(cfg),
            label,
            log_sender,
        }
    }

    pub fn state(&self) -> LinkState {
        match self.connection {
            Some(_) => LinkState::Connected,
            None => LinkState::Disconnected,
        }
    }

    pub fn port_name(&self) -> Option<&str> {
        self.connection.as_ref().map(|c| c.port_name.as_str())
    }

    pub fn form(&self) -> &SettingsForm {
        &self.form
    }

    pub fn form_mut(&mut self) -> &mut SettingsForm {
        &mut self.form
    }

    pub fn label(&self) -> &StatusLabel {
        &self.label
    }

    pub fn telemetry_running(&self) -> bool {
        match &self.connection {
            Some(connected) => connected.telemetry.is_running(),
            None => false,
        }
    }

    /// Encodes the form and writes it to the device. Nothing is written
    /// when disconnected or when a field does not validate; the operator
    /// is told why.
    pub fn send_settings<O: Operator>(&mut self, operator: &mut O) -> SendOutcome {
        let Some(connected) = self.connection.as_mut() else {
            operator.warn(NO_DEVICE_TITLE, NO_DEVICE_MESSAGE);
            return SendOutcome::NotConnected;
        };
        let settings = match self.form.encode() {
            Ok(settings) => settings,
            Err(e) => {
                tracing::debug!(error = %e, "settings rejected");
                operator.error(
                    INPUT_ERROR_TITLE,
                    &format!("{}\n{}", INPUT_ERROR_MESSAGE, e),
                );
                return SendOutcome::InvalidInput(e);
            }
        };
        let line = settings.to_line();
        match connected.writer.write_line(&line) {
            Ok(()) => {
                tracing::info!(command = %settings, "settings sent");
                log_line(&self.log_sender, LogLine::new(LogTag::Tx, line));
                SendOutcome::Sent(settings)
            }
            Err(e) => {
                tracing::error!(error = %e, "settings write failed");
                operator.error(
                    WRITE_FAILED_TITLE,
                    &format!("Error sending settings:\n{}", e),
                );
                SendOutcome::WriteFailed(e)
            }
        }
    }

    /// Stops telemetry and releases the link, in that order.
    pub fn close(mut self) {
        self.release();
    }

    fn release(&mut self) {
        if let Some(mut connected) = self.connection.take() {
            connected.telemetry.stop();
            println!("> [session] closing {}", connected.port_name);
            log_event(&self.log_sender, format!("closed {}", connected.port_name));
        }
    }
}

impl Drop for Session {
    fn drop(&mut self) {
        self.release();
    }
}

fn log_line(log_sender: &Option<Sender<LogLine>>, line: LogLine) {
    if let Some(log_sender) = log_sender {
        let _ = log_sender.send(line);
    }
}

fn log_event(log_sender: &Option<Sender<LogLine>>, text: impl Into<String>) {
    log_line(log_sender, LogLine::new(LogTag::Ev, text));
}

/// Runs the startup handshake and builds the session, or `None` when the
/// operator chose to terminate.
pub fn open_session<C: Connector, O: Operator>(
    connector: &mut C,
    operator: &mut O,
    cfg: &Config,
    label: StatusLabel,
    log_sender: Option<Sender<LogLine>>,
) -> Option<Session> {
    match establish_link(connector, operator) {
        Startup::Connected(link) => Some(Session::connected(link, cfg, label, log_sender)),
        Startup::Degraded => Some(Session::degraded(cfg, label, log_sender)),
        Startup::Terminate => {
            log_event(&log_sender, "terminated at startup");
            None
        }
    }
}

