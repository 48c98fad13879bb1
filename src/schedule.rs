//! # Scheduling Primitives Module
//!
//! Wall-clock and sleep abstractions shared by the recognition poller and the
//! monitor loop. Production code uses [`SystemClock`] and [`TokioSleeper`];
//! tests swap in fakes so many cycles run without real delays.

use std::time::Duration;

use chrono::{Local, NaiveDateTime};

/// Source of the wall-clock time stamped on readings
pub trait Clock {
    fn now(&self) -> NaiveDateTime;
}

/// Local time of the host
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> NaiveDateTime {
        Local::now().naive_local()
    }
}

/// Asynchronous sleep used between polls and between cycles
#[allow(async_fn_in_trait)]
pub trait Sleeper {
    async fn sleep(&self, duration: Duration);
}

/// Sleeps on the tokio timer
#[derive(Debug, Clone, Copy, Default)]
pub struct TokioSleeper;

impl Sleeper for TokioSleeper {
    async fn sleep(&self, duration: Duration) {
        tokio::time::sleep(duration).await;
    }
}

impl<T: Clock> Clock for &T {
    fn now(&self) -> NaiveDateTime {
        (**self).now()
    }
}

impl<T: Sleeper> Sleeper for &T {
    async fn sleep(&self, duration: Duration) {
        (**self).sleep(duration).await;
    }
}
