use crate::status_label::LabelEcho;
use chrono::Utc;
use rustyline::{error::ReadlineError, DefaultEditor, ExternalPrinter};

/// The human at the console: yes/no prompts, notices, and commands.
pub trait Operator {
    /// Blocking yes/no question. Anything but an explicit yes reads as no.
    fn ask_yes_no(&mut self, title: &str, message: &str) -> bool;
    fn warn(&mut self, title: &str, message: &str);
    fn error(&mut self, title: &str, message: &str);
    /// Next command line, or `None` when the operator closed the console.
    fn read_command(&mut self) -> Option<String>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum YesNo {
    Yes,
    No,
}

pub fn parse_yes_no(user_entry: &str) -> Option<YesNo> {
    match user_entry.trim().to_ascii_lowercase().as_str() {
        "y" | "yes" => Some(YesNo::Yes),
        "n" | "no" => Some(YesNo::No),
        _ => None,
    }
}

pub const COMMAND_PROMPT: &str = "pump> ";

fn status_line(text: &str) -> String {
    format!("> [status] {} {}", Utc::now().format("%M:%S%.3f"), text)
}

/// Prints label changes above the prompt instead of through it.
struct PromptPrinter<P>(P);

impl<P: ExternalPrinter + Send> LabelEcho for PromptPrinter<P> {
    fn echo(&mut self, text: &str) {
        if let Err(e) = self.0.print(status_line(text)) {
            tracing::debug!(error = %e, "external print failed");
        }
    }
}

struct StdoutEcho;

impl LabelEcho for StdoutEcho {
    fn echo(&mut self, text: &str) {
        println!("{}", status_line(text));
    }
}

pub struct ConsoleOperator {
    editor: DefaultEditor,
}

impl ConsoleOperator {
    pub fn new() -> Result<Self, ReadlineError> {
        Ok(Self {
            editor: DefaultEditor::new()?,
        })
    }

    /// Echo sink for the status label that keeps the operator's line intact.
    pub fn label_echo(&mut self) -> Box<dyn LabelEcho> {
        match self.editor.create_external_printer() {
            Ok(printer) => Box::new(PromptPrinter(printer)),
            Err(e) => {
                tracing::debug!(error = %e, "no external printer, echoing to stdout");
                Box::new(StdoutEcho)
            }
        }
    }
}

fn print_boxed(marker: &str, title: &str, message: &str) {
    println!("\n{} {}", marker, title);
    for line in message.lines() {
        println!("  {}", line);
    }
}

impl Operator for ConsoleOperator {
    fn ask_yes_no(&mut self, title: &str, message: &str) -> bool {
        print_boxed("[?]", title, message);
        loop {
            match self.editor.readline("[y/n]: ") {
                Ok(user_entry) => match parse_yes_no(&user_entry) {
                    Some(YesNo::Yes) => return true,
                    Some(YesNo::No) => return false,
                    None => println!("> Invalid entry {:?}, enter y or n", user_entry),
                },
                Err(ReadlineError::Interrupted) | Err(ReadlineError::Eof) => return false,
                Err(e) => {
                    tracing::error!(error = %e, "prompt read failed");
                    return false;
                }
            }
        }
    }

    fn warn(&mut self, title: &str, message: &str) {
        print_boxed("[!]", title, message);
    }

    fn error(&mut self, title: &str, message: &str) {
        print_boxed("[x]", title, message);
    }

    fn read_command(&mut self) -> Option<String> {
        match self.editor.readline(COMMAND_PROMPT) {
            Ok(line) => {
                if !line.trim().is_empty() {
                    let _ = self.editor.add_history_entry(line.as_str());
                }
                Some(line)
            }
            Err(ReadlineError::Interrupted) | Err(ReadlineError::Eof) => None,
            Err(e) => {
                println!("> [user_console_task] error: {:#?}", e);
                None
            }
        }
    }
}
