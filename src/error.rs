use std::fmt;

use thiserror::Error;

/// Which form field a value came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Field {
    Flow,
    OnInterval,
    OffInterval,
}

impl fmt::Display for Field {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Field::Flow => write!(f, "flow rate"),
            Field::OnInterval => write!(f, "on interval"),
            Field::OffInterval => write!(f, "off interval"),
        }
    }
}

#[derive(Debug, Error)]
pub enum LinkError {
    #[error("could not open {port}: {source}")]
    Open {
        port: String,
        #[source]
        source: serialport::Error,
    },
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum InputError {
    #[error("{field} {text:?} is not a number")]
    NotNumeric { field: Field, text: String },
    #[error("{field} must be finite")]
    NotFinite { field: Field },
}

impl InputError {
    pub fn field(&self) -> Field {
        match self {
            InputError::NotNumeric { field, .. }
            | InputError::NotFinite { field } => *field,
        }
    }
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("config io: {0}")]
    Io(#[from] std::io::Error),
    #[error("config parse: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("invalid config: {0}")]
    Invalid(String),
}

#[derive(Debug, Error)]
pub enum AppError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error("console: {0}")]
    Console(#[from] rustyline::error::ReadlineError),
    #[error("io: {0}")]
    Io(#[from] std::io::Error),
}
