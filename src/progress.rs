//! Terminal surfaces for aggregated runs: a progress bar and the
//! continue/stop prompt shown when an item fails.

use async_trait::async_trait;
use indicatif::{ProgressBar, ProgressStyle};
use std::io::{self, BufRead, IsTerminal, Write};
use tracing::debug;

use crate::config::FailurePolicy;
use crate::sequence::{FailureAction, FailureDecider, FixedDecision, ProgressSink, RunState};

const BAR_TEMPLATE: &str = "[{elapsed_precise}] {prefix:.bold}▕{bar:30.blue}▏{wide_msg}";

/// Progress on stderr. Draws nothing when stderr is not a terminal, but
/// warnings are still printed.
pub struct BarProgress {
    bar: ProgressBar,
}

impl BarProgress {
    pub fn new() -> Self {
        let bar = ProgressBar::new(0);
        bar.set_style(
            ProgressStyle::with_template(BAR_TEMPLATE)
                .unwrap_or_else(|_| ProgressStyle::default_bar())
                .progress_chars("█▉▊▋▌▍▎▏ "),
        );
        Self { bar }
    }

    pub fn bar(&self) -> ProgressBar {
        self.bar.clone()
    }
}

impl Default for BarProgress {
    fn default() -> Self {
        Self::new()
    }
}

impl ProgressSink for BarProgress {
    fn begin(&self, config: &str, total: usize) {
        self.bar.set_length(total as u64);
        self.bar.set_position(0);
        self.bar.set_prefix(config.to_string());
    }

    fn step(&self, index: usize, total: usize, item: &str) {
        self.bar.set_position(index.saturating_sub(1) as u64);
        self.bar.set_message(format!("{index}/{total} {item}"));
    }

    fn warn(&self, message: &str) {
        self.bar.suspend(|| eprintln!("warning: {message}"));
    }

    fn finish(&self, state: RunState) {
        let label = match state {
            RunState::Idle => "nothing to launch",
            RunState::Running => "running",
            RunState::Completed => "completed",
            RunState::Cancelled => "cancelled",
            RunState::AbortedOnFailure => "stopped after failure",
        };
        if state == RunState::Completed {
            self.bar.set_position(self.bar.length().unwrap_or(0));
        }
        self.bar.finish_with_message(label);
    }
}

/// `c`/`continue` or `s`/`stop`; empty input means stop.
pub fn parse_choice(input: &str) -> Option<FailureAction> {
    match input.trim().to_lowercase().as_str() {
        "c" | "continue" => Some(FailureAction::Continue),
        "" | "s" | "stop" => Some(FailureAction::Stop),
        _ => None,
    }
}

fn prompt_failure(item: &str, reason: &str) -> io::Result<FailureAction> {
    let stdin = io::stdin();
    let mut input = String::new();

    loop {
        input.clear();
        eprint!("Launch of '{item}' failed: {reason}\n[c]ontinue / [s]top (default: stop): ");
        io::stderr().flush()?;

        if stdin.lock().read_line(&mut input)? == 0 {
            return Ok(FailureAction::Stop);
        }
        if let Some(action) = parse_choice(&input) {
            return Ok(action);
        }
    }
}

/// Asks on the terminal after each failure.
pub struct PromptDecider {
    bar: Option<ProgressBar>,
}

impl PromptDecider {
    pub fn new(bar: Option<ProgressBar>) -> Self {
        Self { bar }
    }
}

#[async_trait]
impl FailureDecider for PromptDecider {
    async fn decide(&self, item: &str, reason: &str) -> FailureAction {
        let item = item.to_string();
        let reason = reason.to_string();
        let bar = self.bar.clone();

        let answer = tokio::task::spawn_blocking(move || match bar {
            Some(bar) => bar.suspend(|| prompt_failure(&item, &reason)),
            None => prompt_failure(&item, &reason),
        })
        .await;

        match answer {
            Ok(Ok(action)) => action,
            Ok(Err(err)) => {
                debug!(error = %err, "prompt failed; stopping");
                FailureAction::Stop
            }
            Err(err) => {
                debug!(error = %err, "prompt task failed; stopping");
                FailureAction::Stop
            }
        }
    }
}

/// `ask` falls back to `stop` when stdin is not a terminal.
pub fn decider_for(policy: FailurePolicy, bar: Option<ProgressBar>) -> Box<dyn FailureDecider> {
    match policy {
        FailurePolicy::Continue => Box::new(FixedDecision(FailureAction::Continue)),
        FailurePolicy::Stop => Box::new(FixedDecision(FailureAction::Stop)),
        FailurePolicy::Ask if io::stdin().is_terminal() => Box::new(PromptDecider::new(bar)),
        FailurePolicy::Ask => {
            debug!("stdin is not a terminal; failures stop the run");
            Box::new(FixedDecision(FailureAction::Stop))
        }
    }
}
