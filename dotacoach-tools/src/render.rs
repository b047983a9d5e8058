use dotacoach::session::SessionEvent;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    Info,
    Warn,
    Error,
}

/// Fixed-width text gauge, e.g. `[#####     ]` for 50% at width 10.
pub fn gauge(percent: u8, width: usize) -> String {
    let filled = (usize::from(percent.min(100)) * width + 50) / 100;
    format!("[{}{}]", "#".repeat(filled), " ".repeat(width - filled))
}

/// One log line for a session event.
pub fn format_event(event: &SessionEvent) -> (String, Severity) {
    match event {
        SessionEvent::Connected => ("CONNECTED".to_string(), Severity::Info),
        SessionEvent::Snapshot(s) => (s.to_string(), Severity::Info),
        SessionEvent::FrameRejected(err) => {
            (format!("FRAME DROPPED: {}", err), Severity::Warn)
        }
        SessionEvent::Disconnected(reason) => {
            (format!("DISCONNECTED: {}", reason), Severity::Error)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use dotacoach::data::decode;
    use dotacoach::feed::CloseReason;

    #[test]
    fn test_gauge() {
        assert_eq!(gauge(0, 10), "[          ]");
        assert_eq!(gauge(50, 10), "[#####     ]");
        assert_eq!(gauge(100, 10), "[##########]");
        assert_eq!(gauge(25, 4), "[#   ]");
        assert_eq!(gauge(99, 20).len(), 22);
    }

    #[test]
    fn test_format_event() {
        let err = decode("[]").unwrap_err();
        let (line, sev) = format_event(&SessionEvent::FrameRejected(err));
        assert_eq!(line, "FRAME DROPPED: frame is not a JSON object");
        assert_eq!(sev, Severity::Warn);

        let (line, sev) = format_event(&SessionEvent::Disconnected(CloseReason::Local));
        assert_eq!(line, "DISCONNECTED: closed locally");
        assert_eq!(sev, Severity::Error);
    }
}
