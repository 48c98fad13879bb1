//! # Monitor Loop Module
//!
//! Drives a [`Sampler`] on a fixed cadence forever. A cycle either appends one
//! reading to the log or is skipped with its error reported; either way the
//! loop then idles for the sample interval. No failure ends the loop.

use std::io::Write;
use std::time::Duration;

use log::{info, warn};

use crate::pipeline::Sampler;
use crate::reading::{Reading, ReadingLog};
use crate::sample_errors::SampleError;
use crate::schedule::Sleeper;

/// Result of one cycle
#[derive(Debug)]
pub enum CycleOutcome {
    /// The reading was appended to the log
    Logged(Reading),
    /// The cycle failed and nothing was written
    Skipped(SampleError),
}

impl CycleOutcome {
    pub fn is_logged(&self) -> bool {
        matches!(self, CycleOutcome::Logged(_))
    }
}

/// Running counters over the lifetime of a monitor
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CycleStats {
    pub cycles: u64,
    pub logged: u64,
    pub skipped: u64,
    pub consecutive_failures: u64,
}

impl CycleStats {
    fn record(&mut self, outcome: &CycleOutcome) {
        self.cycles += 1;
        if outcome.is_logged() {
            self.logged += 1;
            self.consecutive_failures = 0;
        } else {
            self.skipped += 1;
            self.consecutive_failures += 1;
        }
    }
}

pub struct Monitor<'a, P, W: Write, Z> {
    sampler: P,
    log: &'a mut ReadingLog<W>,
    sleeper: Z,
    interval: Duration,
    stats: CycleStats,
}

impl<'a, P: Sampler, W: Write, Z: Sleeper> Monitor<'a, P, W, Z> {
    pub fn new(sampler: P, log: &'a mut ReadingLog<W>, sleeper: Z, interval: Duration) -> Self {
        Self {
            sampler,
            log,
            sleeper,
            interval,
            stats: CycleStats::default(),
        }
    }

    pub fn stats(&self) -> CycleStats {
        self.stats
    }

    /// Sample once and log the reading; does not idle
    pub async fn run_cycle(&mut self) -> CycleOutcome {
        let outcome = match self.sampler.sample().await {
            Ok(reading) => match self.log.append(&reading) {
                Ok(()) => CycleOutcome::Logged(reading),
                Err(e) => CycleOutcome::Skipped(SampleError::Log(e)),
            },
            Err(e) => CycleOutcome::Skipped(e),
        };
        self.stats.record(&outcome);

        match &outcome {
            CycleOutcome::Logged(reading) => info!("Logged reading {reading}"),
            CycleOutcome::Skipped(e) => warn!(
                "Cycle {} skipped ({}): {e}; {} consecutive failures",
                self.stats.cycles,
                e.kind(),
                self.stats.consecutive_failures
            ),
        }
        outcome
    }

    /// Run `count` cycles, idling after each one
    pub async fn run_cycles(&mut self, count: usize) -> Vec<CycleOutcome> {
        let mut outcomes = Vec::with_capacity(count);
        for _ in 0..count {
            outcomes.push(self.run_cycle().await);
            self.sleeper.sleep(self.interval).await;
        }
        outcomes
    }

    /// Run cycles until the future is dropped
    pub async fn run(&mut self) {
        info!("Sampling every {:?}", self.interval);
        loop {
            self.run_cycle().await;
            self.sleeper.sleep(self.interval).await;
        }
    }
}
