use crate::protocol::{render_flow, DISCONNECTED_LABEL, FLOW_PLACEHOLDER};
use std::sync::{Arc, Mutex, MutexGuard};

/// Where label changes are shown as they happen.
///
/// Updates arrive from the telemetry thread, so a console sink must not
/// print over a line the operator is typing.
pub trait LabelEcho: Send {
    fn echo(&mut self, text: &str);
}

struct LabelState {
    text: String,
    reading: Option<f64>,
}

/// The live status line and the latest flow reading behind it.
///
/// Clones share state: the telemetry thread publishes, the console reads.
#[derive(Clone)]
pub struct StatusLabel {
    inner: Arc<Mutex<LabelState>>,
    echo: Option<Arc<Mutex<Box<dyn LabelEcho>>>>,
}

impl Default for StatusLabel {
    fn default() -> Self {
        Self::new()
    }
}

impl StatusLabel {
    /// A silent label showing the placeholder.
    pub fn new() -> Self {
        Self {
            inner: Arc::new(Mutex::new(LabelState {
                text: FLOW_PLACEHOLDER.to_string(),
                reading: None,
            })),
            echo: None,
        }
    }

    /// Like [`StatusLabel::new`], but every change is also handed to `echo`.
    pub fn with_echo(echo: Box<dyn LabelEcho>) -> Self {
        Self {
            echo: Some(Arc::new(Mutex::new(echo))),
            ..Self::new()
        }
    }

    fn state(&self) -> MutexGuard<'_, LabelState> {
        self.inner.lock().unwrap_or_else(|e| e.into_inner())
    }

    pub fn text(&self) -> String {
        self.state().text.clone()
    }

    pub fn reading(&self) -> Option<f64> {
        self.state().reading
    }

    pub fn set_disconnected(&self) {
        self.set_text(DISCONNECTED_LABEL.to_string());
    }

    /// Stores `value` as the latest reading and renders it.
    pub fn publish_reading(&self, value: f64) {
        let text = render_flow(value);
        {
            let mut state = self.state();
            state.reading = Some(value);
            state.text = text.clone();
        }
        self.echo_text(&text);
    }

    fn set_text(&self, text: String) {
        self.state().text = text.clone();
        self.echo_text(&text);
    }

    fn echo_text(&self, text: &str) {
        if let Some(echo) = &self.echo {
            echo.lock().unwrap_or_else(|e| e.into_inner()).echo(text);
        }
    }
}
