use pumpconsole::{
    config::Config,
    error::Field,
    mocks::{BrokenWriter, MockConnector, MockPort, NoticeKind, ScriptedOperator},
    session::{
        establish_link, open_session, LinkState, SendOutcome, Session, Startup,
        CONNECT_FAILED_TITLE, INPUT_ERROR_TITLE, NOT_FOUND_MESSAGE, NOT_FOUND_TITLE,
        NO_DEVICE_MESSAGE, NO_DEVICE_TITLE, WRITE_FAILED_TITLE,
    },
    link::DeviceLink,
    status_label::StatusLabel,
    threads::file_logger_thread::LogTag,
    user_console_thread::user_console_task,
};
use std::{
    sync::mpsc::channel,
    thread,
    time::{Duration, Instant},
};

fn test_config() -> Config {
    Config {
        poll_interval_ms: 5,
        settle_delay_ms: 0,
        ..Config::default()
    }
}

fn wait_until(timeout: Duration, mut done: impl FnMut() -> bool) -> bool {
    let start = Instant::now();
    while start.elapsed() < timeout {
        if done() {
            return true;
        }
        thread::sleep(Duration::from_millis(5));
    }
    done()
}

#[test]
fn missing_device_accepted_runs_degraded() {
    let cfg = test_config();
    let mut connector = MockConnector::no_device();
    let mut operator = ScriptedOperator::new().answering(true);

    let mut session = open_session(
        &mut connector,
        &mut operator,
        &cfg,
        StatusLabel::new(),
        None,
    )
    .expect("degraded session");

    assert!(connector.open_attempts.is_empty());
    assert_eq!(operator.notices[0].title, NOT_FOUND_TITLE);
    assert_eq!(operator.notices[0].message, NOT_FOUND_MESSAGE);
    assert_eq!(session.state(), LinkState::Disconnected);
    assert_eq!(session.label().text(), "Arduino Disconnected");

    let outcome = session.send_settings(&mut operator);
    assert!(matches!(outcome, SendOutcome::NotConnected));
    let last = operator.notices.last().unwrap();
    assert_eq!(last.kind, NoticeKind::Warning);
    assert_eq!(last.title, NO_DEVICE_TITLE);
    assert_eq!(last.message, NO_DEVICE_MESSAGE);

    session.close();
}

#[test]
fn missing_device_declined_terminates() {
    let cfg = test_config();
    let mut connector = MockConnector::no_device();
    let mut operator = ScriptedOperator::new().answering(false);

    let session = open_session(
        &mut connector,
        &mut operator,
        &cfg,
        StatusLabel::new(),
        None,
    );
    assert!(session.is_none());
    assert_eq!(operator.titles(), vec![NOT_FOUND_TITLE]);
}

#[test]
fn open_failure_prompt_carries_error_text() {
    let mut connector = MockConnector::failing("/dev/ttyUSB0", "Permission denied");
    let mut operator = ScriptedOperator::new().answering(true);

    let startup = establish_link(&mut connector, &mut operator);
    assert!(matches!(startup, Startup::Degraded));
    assert_eq!(connector.open_attempts, vec!["/dev/ttyUSB0".to_string()]);

    let notice = &operator.notices[0];
    assert_eq!(notice.kind, NoticeKind::Question);
    assert_eq!(notice.title, CONNECT_FAILED_TITLE);
    assert!(notice.message.starts_with("Error connecting to Arduino:\n"));
    assert!(notice.message.contains("Permission denied"));
    assert!(notice.message.ends_with("\nContinue without Arduino?"));
}

#[test]
fn open_failure_declined_terminates() {
    let mut connector = MockConnector::failing("COM3", "Access is denied.");
    let mut operator = ScriptedOperator::new().answering(false);
    let startup = establish_link(&mut connector, &mut operator);
    assert!(matches!(startup, Startup::Terminate));
}

#[test]
fn connected_session_streams_and_sends() {
    let cfg = test_config();
    let port = MockPort::new();
    let mut connector = MockConnector::with_port("/dev/ttyACM0", port.clone());
    let mut operator = ScriptedOperator::new();

    let mut session = open_session(
        &mut connector,
        &mut operator,
        &cfg,
        StatusLabel::new(),
        None,
    )
    .expect("connected session");
    assert!(operator.notices.is_empty());
    assert_eq!(session.state(), LinkState::Connected);
    assert_eq!(session.port_name(), Some("/dev/ttyACM0"));
    assert_eq!(session.label().text(), "Current Flow Rate: --- µL/min");
    assert!(session.telemetry_running());

    port.push_str("FLOW,10.0\nGARBAGE\nFLOW,10.4\n");
    assert!(wait_until(Duration::from_secs(2), || {
        session.label().reading() == Some(10.4)
    }));
    assert_eq!(session.label().text(), "Current Flow Rate: 10.40 µL/min");

    session.form_mut().set(Field::Flow, "12.5");
    session.form_mut().set(Field::OnInterval, "3");
    session.form_mut().set(Field::OffInterval, "7");
    let outcome = session.send_settings(&mut operator);
    assert!(matches!(outcome, SendOutcome::Sent(_)));
    assert_eq!(port.written(), "SET,12.5,3000,7000\n");

    session.close();
}

#[test]
fn defaults_are_sent_untouched() {
    let cfg = test_config();
    let port = MockPort::new();
    let link = DeviceLink::from_parts("COM4", Box::new(port.clone()), Box::new(port.clone()));
    let mut session = Session::connected(link, &cfg, StatusLabel::new(), None);
    let mut operator = ScriptedOperator::new();

    assert_eq!(session.form().flow, "10");
    assert_eq!(session.form().on_secs, "5");
    assert_eq!(session.form().off_secs, "5");
    session.send_settings(&mut operator);
    assert_eq!(port.written(), "SET,10.0,5000,5000\n");
}

#[test]
fn invalid_field_writes_nothing() {
    let cfg = test_config();
    let port = MockPort::new();
    let link = DeviceLink::from_parts("COM4", Box::new(port.clone()), Box::new(port.clone()));
    let mut session = Session::connected(link, &cfg, StatusLabel::new(), None);
    let mut operator = ScriptedOperator::new();

    session.form_mut().set(Field::OnInterval, "abc");
    let outcome = session.send_settings(&mut operator);
    assert!(matches!(outcome, SendOutcome::InvalidInput(_)));
    assert_eq!(port.written(), "");
    let notice = &operator.notices[0];
    assert_eq!(notice.kind, NoticeKind::Error);
    assert_eq!(notice.title, INPUT_ERROR_TITLE);
    assert!(notice.message.starts_with("Please enter numeric values."));

    // The operator can fix the field and retry straight away.
    session.form_mut().set(Field::OnInterval, "2");
    assert!(matches!(
        session.send_settings(&mut operator),
        SendOutcome::Sent(_)
    ));
    assert_eq!(port.written(), "SET,10.0,2000,5000\n");
}

#[test]
fn disconnected_send_ignores_field_contents() {
    let cfg = test_config();
    let mut session = Session::degraded(&cfg, StatusLabel::new(), None);
    let mut operator = ScriptedOperator::new();
    session.form_mut().set(Field::Flow, "not a number");
    assert!(matches!(
        session.send_settings(&mut operator),
        SendOutcome::NotConnected
    ));
    assert_eq!(operator.titles(), vec![NO_DEVICE_TITLE]);
}

#[test]
fn write_failure_is_reported() {
    let cfg = test_config();
    let port = MockPort::new();
    let link = DeviceLink::from_parts("COM4", Box::new(port), Box::new(BrokenWriter));
    let mut session = Session::connected(link, &cfg, StatusLabel::new(), None);
    let mut operator = ScriptedOperator::new();

    assert!(matches!(
        session.send_settings(&mut operator),
        SendOutcome::WriteFailed(_)
    ));
    assert_eq!(operator.titles(), vec![WRITE_FAILED_TITLE]);
    assert_eq!(session.state(), LinkState::Connected);
}

#[test]
fn close_stops_telemetry_before_release() {
    let cfg = test_config();
    let port = MockPort::new();
    let link = DeviceLink::from_parts("COM4", Box::new(port.clone()), Box::new(port.clone()));
    let session = Session::connected(link, &cfg, StatusLabel::new(), None);
    let label = session.label().clone();

    session.close();
    port.push_str("FLOW,99.0\n");
    thread::sleep(Duration::from_millis(30));
    assert_eq!(label.reading(), None);
    assert_eq!(port.pending(), "FLOW,99.0\n".len());
}

#[test]
fn console_exit_ends_degraded_session_cleanly() {
    let cfg = test_config();
    let mut connector = MockConnector::no_device();
    let mut operator = ScriptedOperator::new()
        .answering(true)
        .typing("flow 20")
        .typing("send")
        .typing("exit")
        .typing("send");

    let mut session = open_session(
        &mut connector,
        &mut operator,
        &cfg,
        StatusLabel::new(),
        None,
    )
    .expect("degraded session");
    user_console_task(&mut session, &mut operator);

    assert_eq!(session.form().flow, "20");
    // Only the send before `exit` ran.
    assert_eq!(operator.titles(), vec![NOT_FOUND_TITLE, NO_DEVICE_TITLE]);
    session.close();
}

#[test]
fn session_events_reach_the_log_channel() {
    let cfg = test_config();
    let port = MockPort::new();
    let (log_sender, log_receiver) = channel();
    let link = DeviceLink::from_parts("COM4", Box::new(port.clone()), Box::new(port.clone()));
    let mut session = Session::connected(link, &cfg, StatusLabel::new(), Some(log_sender));
    let mut operator = ScriptedOperator::new();

    session.send_settings(&mut operator);
    session.close();

    let lines: Vec<_> = log_receiver.try_iter().collect();
    let tags: Vec<LogTag> = lines.iter().map(|l| l.tag).collect();
    assert_eq!(tags, vec![LogTag::Ev, LogTag::Tx, LogTag::Ev]);
    assert_eq!(lines[0].text, "connected COM4");
    assert_eq!(lines[1].text, "SET,10.0,5000,5000\n");
    assert_eq!(lines[2].text, "closed COM4");
}

#[test]
fn negative_interval_is_written_as_entered() {
    let cfg = test_config();
    let port = MockPort::new();
    let link = DeviceLink::from_parts("COM4", Box::new(port.clone()), Box::new(port.clone()));
    let mut session = Session::connected(link, &cfg, StatusLabel::new(), None);
    let mut operator = ScriptedOperator::new();

    session.form_mut().set(Field::OffInterval, "-1");
    assert!(matches!(
        session.send_settings(&mut operator),
        SendOutcome::Sent(_)
    ));
    assert!(operator.notices.is_empty());
    assert_eq!(port.written(), "SET,10.0,5000,-1000\n");
}
