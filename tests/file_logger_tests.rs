use pumpconsole::threads::file_logger_thread::{FileLoggerThread, LogLine, LogTag};
use std::{fs, sync::mpsc::channel};

#[test]
fn writes_timestamped_tagged_lines() {
    let dir = tempfile::tempdir().unwrap();
    let log_dir = dir.path().join("session");
    let (line_sender, line_receiver) = channel();
    let logger = FileLoggerThread::spawn(&log_dir, line_receiver).expect("open log");
    let path = logger.path().to_path_buf();
    assert!(path.starts_with(&log_dir));
    assert!(path
        .file_name()
        .and_then(|n| n.to_str())
        .is_some_and(|n| n.starts_with("pump_") && n.ends_with(".log")));

    line_sender
        .send(LogLine::new(LogTag::Ev, "connected COM4"))
        .unwrap();
    line_sender
        .send(LogLine::new(LogTag::Tx, "SET,10.0,5000,5000\n"))
        .unwrap();
    line_sender.send(LogLine::new(LogTag::Rx, "FLOW,9.8")).unwrap();
    logger.join().expect("clean shutdown");

    let contents = fs::read_to_string(&path).unwrap();
    let lines: Vec<&str> = contents.lines().collect();
    assert_eq!(lines.len(), 3);
    assert!(lines[0].ends_with(" ev connected COM4"));
    assert!(lines[1].ends_with(" tx SET,10.0,5000,5000"));
    assert!(lines[2].ends_with(" rx FLOW,9.8"));
    // "yy-mm-dd HH:MM:SS.mmm"
    assert_eq!(lines[0].split(' ').next().map(str::len), Some(8));
}

#[test]
fn stops_when_senders_are_gone() {
    let dir = tempfile::tempdir().unwrap();
    let (line_sender, line_receiver) = channel::<LogLine>();
    let logger = FileLoggerThread::spawn(dir.path(), line_receiver).unwrap();
    drop(line_sender);
    logger.join().expect("clean shutdown");
}
