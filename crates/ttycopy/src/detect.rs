#![forbid(unsafe_code)]

//! Multiplexer detection from the environment.
//!
//! | `TERM`       | `TMUX` set | Result |
//! |--------------|------------|--------|
//! | `screen*`    | yes        | tmux   |
//! | `screen*`    | no         | screen |
//! | `tmux*`      | –          | tmux   |
//! | anything else| –          | none   |
//!
//! tmux sets `TERM=screen` by default, hence the `TMUX` check.

use std::env;

use ttycopy_core::config::Multiplexer;

#[derive(Debug, Clone, Default)]
pub struct DetectInputs {
    pub term: String,
    pub in_tmux: bool,
}

impl DetectInputs {
    pub fn from_env() -> Self {
        Self {
            term: env::var("TERM").unwrap_or_default(),
            in_tmux: env::var_os("TMUX").is_some(),
        }
    }
}

/// Guess the multiplexer between us and the terminal.
#[must_use]
pub fn detect_multiplexer(env: &DetectInputs) -> Multiplexer {
    let term = env.term.as_str();
    if term.starts_with("screen") {
        if env.in_tmux {
            Multiplexer::Tmux
        } else {
            Multiplexer::Screen
        }
    } else if term.starts_with("tmux") {
        Multiplexer::Tmux
    } else {
        Multiplexer::None
    }
}
