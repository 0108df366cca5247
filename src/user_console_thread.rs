use crate::{error::Field, session::Session, utils::user_io::Operator};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConsoleCommand {
    Set(Field, String),
    Show,
    Send,
    Exit,
    Help,
    Empty,
    Unknown(String),
}

pub fn parse_console_command(line: &str) -> ConsoleCommand {
    let line = line.trim();
    let (word, rest) = match line.split_once(char::is_whitespace) {
        Some((word, rest)) => (word, rest.trim()),
        None => (line, ""),
    };
    match word.to_ascii_lowercase().as_str() {
        "" => ConsoleCommand::Empty,
        "flow" => ConsoleCommand::Set(Field::Flow, rest.to_string()),
        "on" => ConsoleCommand::Set(Field::OnInterval, rest.to_string()),
        "off" => ConsoleCommand::Set(Field::OffInterval, rest.to_string()),
        "show" => ConsoleCommand::Show,
        "send" => ConsoleCommand::Send,
        "exit" | "quit" => ConsoleCommand::Exit,
        "help" | "?" => ConsoleCommand::Help,
        _ => ConsoleCommand::Unknown(word.to_string()),
    }
}

fn print_help() {
    println!("Commands:");
    println!("  flow <uL/min>   desired flow rate");
    println!("  on <sec>        pump ON interval");
    println!("  off <sec>       pump OFF interval");
    println!("  show            print settings and status");
    println!("  send            send settings to the pump");
    println!("  exit            quit (also Ctrl-C / Ctrl-D)");
}

fn print_form(session: &Session) {
    let form = session.form();
    println!("Desired Flow Rate (µL/min): {}", form.flow);
    println!("Pump ON Interval (sec):     {}", form.on_secs);
    println!("Pump OFF Interval (sec):    {}", form.off_secs);
    println!("{}", session.label().text());
}

/// Runs the command loop until the operator exits.
pub fn user_console_task<O: Operator>(session: &mut Session, operator: &mut O) {
    print_help();
    print_form(session);
    while let Some(line) = operator.read_command() {
        match parse_console_command(&line) {
            ConsoleCommand::Set(field, text) => session.form_mut().set(field, &text),
            ConsoleCommand::Show => print_form(session),
            ConsoleCommand::Send => {
                session.send_settings(operator);
            }
            ConsoleCommand::Exit => break,
            ConsoleCommand::Help => print_help(),
            ConsoleCommand::Empty => {}
            ConsoleCommand::Unknown(word) => {
                println!("> unknown command {:?}, try `help`", word)
            }
        }
    }
    println!("> [user_console_task] end");
}
