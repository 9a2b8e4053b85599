//! Scenario replay for booking frame sessions.
//!
//! Loads a JSON [`Scenario`], runs it through the real [`bookframe_app::Runtime`]
//! on the simulated platform, and renders what the platform saw.

#![forbid(unsafe_code)]
#![deny(missing_docs)]

use std::{fmt, path::Path, time::Duration};

use bookframe_app::{RuntimeError, SessionReport};
use bookframe_core::FrameConfig;
use bookframe_harness::{InvariantRegistry, Scenario, SimDriverError, SimEnv, SimState, Violation};
use thiserror::Error;

/// Errors from loading or replaying a scenario.
#[derive(Error, Debug)]
pub enum ReplayError {
    /// Scenario file could not be read
    #[error("failed to read {path}: {source}")]
    Io {
        /// File that failed
        path: String,
        /// Underlying error
        #[source]
        source: std::io::Error,
    },

    /// Scenario file is not a valid scenario
    #[error("invalid scenario: {0}")]
    Parse(#[from] serde_json::Error),

    /// Session failed to run
    #[error("session failed: {0}")]
    Runtime(#[from] RuntimeError<SimDriverError>),
}

/// Command-line overrides applied on top of a scenario's config.
#[derive(Debug, Clone, Default)]
pub struct Overrides {
    /// Load watchdog timeout in milliseconds.
    pub load_timeout_ms: Option<u64>,
    /// Trusted provider domain.
    pub trusted_domain: Option<String>,
    /// Support contact shown in the error view.
    pub support_contact: Option<String>,
}

impl Overrides {
    /// Apply to `config`, leaving unset fields alone.
    pub fn apply(&self, config: &mut FrameConfig) {
        if let Some(ms) = self.load_timeout_ms {
            config.load_timeout = Duration::from_millis(ms);
        }
        if let Some(domain) = &self.trusted_domain {
            config.trusted_domain.clone_from(domain);
        }
        if let Some(contact) = &self.support_contact {
            config.support_contact = Some(contact.clone());
        }
    }
}

/// Result of one replayed scenario.
#[derive(Debug, Clone)]
pub struct Replay {
    /// Scenario name.
    pub name: String,
    /// Final session report.
    pub report: SessionReport,
    /// Everything the simulated platform recorded.
    pub state: SimState,
    /// Virtual time the session took.
    pub elapsed: Duration,
    /// Lifecycle invariants broken at the end of the session.
    pub violations: Vec<Violation>,
}

/// Human-readable timeline and summary.
impl fmt::Display for Replay {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = if self.name.is_empty() { "unnamed" } else { &self.name };
        writeln!(f, "scenario: {name}")?;

        for (at, call) in &self.state.timeline {
            writeln!(f, "{:>9.3}s  {call:?}", at.as_secs_f64())?;
        }

        writeln!(f, "---")?;
        writeln!(f, "status:   {}", self.report.status.name())?;
        writeln!(f, "retries:  {}", self.report.retry_nonce)?;
        writeln!(f, "signals:  {}", self.report.signals.len())?;
        match &self.report.fallback {
            Some(outcome) => writeln!(f, "fallback: {outcome:?}")?,
            None => writeln!(f, "fallback: none")?,
        }
        writeln!(f, "elapsed:  {:.3}s", self.elapsed.as_secs_f64())?;
        for violation in &self.violations {
            writeln!(f, "violation: {violation}")?;
        }
        Ok(())
    }
}

/// Read and parse a scenario file.
pub fn load_scenario(path: &Path) -> Result<Scenario, ReplayError> {
    let json = std::fs::read_to_string(path)
        .map_err(|source| ReplayError::Io { path: path.display().to_string(), source })?;
    Ok(Scenario::from_json(&json)?)
}

/// Run `scenario` to completion on a fresh virtual clock.
pub async fn replay(scenario: &Scenario) -> Result<Replay, ReplayError> {
    let env = SimEnv::new();
    let runtime = scenario.runtime(&env);

    tracing::info!(name = %scenario.name, steps = scenario.steps.len(), "replaying scenario");
    let (report, driver) = runtime.run().await?;

    let observer = driver.observer();
    let violations = match InvariantRegistry::standard().check_all(&observer.snapshot()) {
        Ok(()) => Vec::new(),
        Err(violations) => violations,
    };
    if !violations.is_empty() {
        tracing::warn!(count = violations.len(), "invariants violated");
    }

    Ok(Replay {
        name: scenario.name.clone(),
        report,
        state: observer.state(),
        elapsed: env.elapsed(),
        violations,
    })
}
