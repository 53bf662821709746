use rca_core::ingestion::text::{parse_text, TextFormat};
use rca_core::level::Level;

#[test]
fn apache_error_log_parses_level_and_message() {
    let raw = "[Sun Dec 04 04:47:44 2005] [error] mod_jk child workerEnv in error state 6";
    let events = parse_text(raw, Some(TextFormat::Apache));

    assert_eq!(events.len(), 1);
    let event = &events[0];
    assert_eq!(
        event.message.as_deref(),
        Some("mod_jk child workerEnv in error state 6")
    );
    assert_eq!(event.level, Some(Level::Error));
    assert!(event.timestamp.is_some());
}

#[test]
fn apache_access_log_infers_level_from_status() {
    let raw = r#"192.168.1.50 - alice [10/Feb/2026:14:30:45 +0000] "GET /api/users/123 HTTP/1.1" 500 1234 "-" "Mozilla/5.0""#;
    let events = parse_text(raw, Some(TextFormat::Apache));

    assert_eq!(events.len(), 1);
    assert_eq!(events[0].level, Some(Level::Error));
    assert_eq!(events[0].service.as_deref(), Some("apache"));
}

#[test]
fn nginx_error_log_parses() {
    let raw = "2026/02/10 14:30:45 [error] 1234#0: *5 connect() failed (111: Connection refused) while connecting to upstream";
    let events = parse_text(raw, Some(TextFormat::Nginx));

    assert_eq!(events.len(), 1);
    assert_eq!(events[0].level, Some(Level::Error));
}

#[test]
fn syslog_line_parses_priority_and_service() {
    let raw = "Feb 10 14:30:45 server-01 sshd[12345]: Failed password for invalid user admin from 10.0.0.1 port 22";
    let events = parse_text(raw, Some(TextFormat::Syslog));

    assert_eq!(events.len(), 1);
    assert_eq!(events[0].service.as_deref(), Some("sshd"));
}

#[test]
fn unrecognized_line_falls_back_to_generic() {
    let raw = "this is just some freeform text that matches no known format";
    let events = parse_text(raw, Some(TextFormat::Generic));

    assert_eq!(events.len(), 1);
    assert_eq!(events[0].message.as_deref(), Some(raw));
}

#[test]
fn auto_detection_tries_every_known_format_in_order() {
    let text = format!(
        "{}\n{}\n{}\n",
        "Feb 10 14:30:45 server-01 sshd[12345]: auth failure",
        r#"192.168.1.50 - alice [10/Feb/2026:14:30:45 +0000] "GET / HTTP/1.1" 200 512 "-" "curl/8.0""#,
        "just plain text with no recognizable structure",
    );
    let events = parse_text(&text, None);
    assert_eq!(events.len(), 3);
}

#[test]
fn blank_lines_are_skipped() {
    let raw = "\n\n   \n";
    let events = parse_text(raw, Some(TextFormat::Generic));
    assert!(events.is_empty());
}
