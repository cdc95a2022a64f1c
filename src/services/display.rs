//! Render sink that traces the countdown as it changes

use std::sync::Mutex;
use tracing::debug;

use crate::timer::{RenderSink, TimerKind};

/// Logs each new `M:SS` value once; percent-only repaints are dropped
pub struct DisplayLog {
    kind: TimerKind,
    last: Mutex<String>,
}

impl DisplayLog {
    pub fn new(kind: TimerKind) -> Self {
        Self {
            kind,
            last: Mutex::new(String::new()),
        }
    }

    pub fn last_shown(&self) -> String {
        self.last.lock().map(|s| s.clone()).unwrap_or_default()
    }
}

impl RenderSink for DisplayLog {
    fn render(&self, text: &str, percent: f64) {
        let Ok(mut last) = self.last.lock() else {
            return;
        };
        if *last != text {
            debug!("{} display {} ({:.1}%)", self.kind.as_str(), text, percent);
            *last = text.to_string();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn keeps_the_latest_text() {
        let display = DisplayLog::new(TimerKind::Match);
        display.render("1:45", 100.0);
        display.render("1:45", 99.9);
        display.render("1:44", 99.0);
        assert_eq!(display.last_shown(), "1:44");
    }
}
