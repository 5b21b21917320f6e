//! Switches for the assignment/solution workflow.
//!
//! # Environment Variables
//!
//! - `ALLOW_MULTIPLE_SUBMISSIONS`: when `false`, a student may hold at most
//!   one solution per assignment (default: `true`)

use std::env;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct WorkflowConfig {
    pub allow_multiple_submissions: bool,
}

impl Default for WorkflowConfig {
    fn default() -> Self {
        Self {
            allow_multiple_submissions: true,
        }
    }
}

impl WorkflowConfig {
    pub fn from_env() -> Self {
        Self {
            allow_multiple_submissions: env::var("ALLOW_MULTIPLE_SUBMISSIONS")
                .ok()
                .and_then(|s| parse_flag(&s))
                .unwrap_or(true),
        }
    }
}

fn parse_flag(value: &str) -> Option<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}
