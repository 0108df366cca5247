use crate::{config::Config, error::LinkError};
use serialport::SerialPort;
use std::{
    io::{self, ErrorKind, Read, Write},
    thread,
};

/// A readable port that can say how many bytes the driver has queued.
pub trait PortRead: Read + Send {
    fn bytes_waiting(&self) -> io::Result<u32>;
}

impl PortRead for Box<dyn SerialPort> {
    fn bytes_waiting(&self) -> io::Result<u32> {
        Ok(self.bytes_to_read()?)
    }
}

/// Read half of the device link, owned by the telemetry thread.
pub struct LinkReader {
    port: Box<dyn PortRead>,
}

impl LinkReader {
    pub fn new(port: Box<dyn PortRead>) -> Self {
        Self { port }
    }

    pub fn bytes_waiting(&self) -> io::Result<u32> {
        self.port.bytes_waiting()
    }

    /// Reads up to and including the next `\n`. A read timeout ends the
    /// line early; `None` means nothing arrived before the timeout.
    /// Any other I/O error is returned as is.
    pub fn read_line(&mut self) -> io::Result<Option<Vec<u8>>> {
        let mut line = Vec::new();
        let mut byte = [0u8; 1];
        loop {
            match self.port.read(&mut byte) {
                Ok(0) => break,
                Ok(_) => {
                    line.push(byte[0]);
                    if byte[0] == b'\n' {
                        break;
                    }
                }
                Err(e) if e.kind() == ErrorKind::TimedOut => break,
                Err(e) if e.kind() == ErrorKind::Interrupted => continue,
                Err(e) => return Err(e),
            }
        }
        Ok(if line.is_empty() { None } else { Some(line) })
    }
}

/// Write half of the device link, owned by the console session.
pub struct LinkWriter {
    port: Box<dyn Write + Send>,
}

impl LinkWriter {
    pub fn new(port: Box<dyn Write + Send>) -> Self {
        Self { port }
    }

    pub fn write_line(&mut self, line: &str) -> io::Result<()> {
        self.port.write_all(line.as_bytes())?;
        self.port.flush()
    }
}

/// An open connection to the pump controller. The underlying handle closes
/// once both halves have been dropped.
pub struct DeviceLink {
    pub port_name: String,
    pub reader: LinkReader,
    pub writer: LinkWriter,
}

impl DeviceLink {
    /// Opens `port_name` and waits out the board's reset before returning.
    pub fn open(port_name: &str, cfg: &Config) -> Result<Self, LinkError> {
        let open_err = |source| LinkError::Open {
            port: port_name.to_string(),
            source,
        };
        let port = serialport::new(port_name, cfg.baud_rate)
            .timeout(cfg.read_timeout())
            .open()
            .map_err(open_err)?;
        tracing::info!(port = port_name, baud = cfg.baud_rate, "link opened");

        // Opening the port resets the board.
        thread::sleep(cfg.settle_delay());

        let read_port = port.try_clone().map_err(open_err)?;
        Ok(Self::from_parts(
            port_name,
            Box::new(read_port),
            Box::new(port),
        ))
    }

    pub fn from_parts(
        port_name: &str,
        read_port: Box<dyn PortRead>,
        write_port: Box<dyn Write + Send>,
    ) -> Self {
        Self {
            port_name: port_name.to_string(),
            reader: LinkReader::new(read_port),
            writer: LinkWriter::new(write_port),
        }
    }
}
