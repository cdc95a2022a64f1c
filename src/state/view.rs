//! Panel views

use serde::{Deserialize, Serialize};

use crate::timer::TimerKind;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum View {
    #[default]
    Control,
    Match,
    Skills,
}

impl View {
    pub fn from_name(name: &str) -> Option<Self> {
        match name.to_ascii_lowercase().as_str() {
            "control" => Some(View::Control),
            "match" => Some(View::Match),
            "skills" => Some(View::Skills),
            _ => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            View::Control => "control",
            View::Match => "match",
            View::Skills => "skills",
        }
    }

    /// Timer owned by this view, if any
    pub fn timer_kind(self) -> Option<TimerKind> {
        match self {
            View::Control => None,
            View::Match => Some(TimerKind::Match),
            View::Skills => Some(TimerKind::Skills),
        }
    }
}
