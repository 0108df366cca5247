use crate::error::{Field, InputError};
use if_chain::if_chain;
use std::fmt;

pub const SET_COMMAND: &str = "SET";
pub const FLOW_PREFIX: &str = "FLOW,";

pub const FLOW_PLACEHOLDER: &str = "Current Flow Rate: --- µL/min";
pub const DISCONNECTED_LABEL: &str = "Arduino Disconnected";

/// Pump settings as they go on the wire. Values are sent as entered:
/// no range checks, the firmware decides what to do with them.
#[derive(Debug, Clone, PartialEq)]
pub struct PumpSettings {
    pub flow: f64,
    pub on_ms: i64,
    pub off_ms: i64,
}

impl PumpSettings {
    /// The command line including its terminator.
    pub fn to_line(&self) -> String {
        format!("{}\n", self)
    }
}

impl fmt::Display for PumpSettings {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(
            f,
            "{},{},{},{}",
            SET_COMMAND,
            format_flow(self.flow),
            self.on_ms,
            self.off_ms
        )
    }
}

/// Shortest round-trip decimal, keeping a `.0` on integral values so the
/// firmware always sees a decimal flow rate. Always positional: `1e20`
/// goes out as `100000000000000000000.0`, never in exponent form.
fn format_flow(flow: f64) -> String {
    if flow.is_nan() {
        "nan".to_string()
    } else if flow.is_finite() && flow.fract() == 0.0 {
        format!("{:.1}", flow)
    } else {
        format!("{}", flow)
    }
}

fn parse_number(field: Field, text: &str) -> Result<f64, InputError> {
    text.trim()
        .parse::<f64>()
        .map_err(|_| InputError::NotNumeric {
            field,
            text: text.to_string(),
        })
}

/// Whole milliseconds, rounded. Values past the `i64` range saturate.
fn seconds_to_ms(field: Field, text: &str) -> Result<i64, InputError> {
    let secs = parse_number(field, text)?;
    if !secs.is_finite() {
        return Err(InputError::NotFinite { field });
    }
    Ok((secs * 1000.0).round() as i64)
}

/// Turns the three form texts into settings. Intervals are entered in
/// seconds and rounded to whole milliseconds.
pub fn encode_settings(
    flow_text: &str,
    on_text: &str,
    off_text: &str,
) -> Result<PumpSettings, InputError> {
    Ok(PumpSettings {
        flow: parse_number(Field::Flow, flow_text)?,
        on_ms: seconds_to_ms(Field::OnInterval, on_text)?,
        off_ms: seconds_to_ms(Field::OffInterval, off_text)?,
    })
}

/// Parses a trimmed `FLOW,<value>` line. Anything else is `None`.
pub fn parse_flow_line(line: &str) -> Option<f64> {
    if_chain! {
        if let Some(rest) = line.strip_prefix(FLOW_PREFIX);
        if let Some(field) = rest.split(',').next();
        if let Ok(value) = field.trim().parse::<f64>();
        then {
            Some(value)
        } else {
            None
        }
    }
}

pub fn render_flow(value: f64) -> String {
    format!("Current Flow Rate: {:.2} µL/min", value)
}
