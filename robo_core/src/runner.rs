//! Fixed-rate tick loop.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use robo_traits::clock::Clock;

use crate::error::Result;
use crate::robot::{Intent, Robot};
use crate::status::TickReport;
use crate::util::period_us;

/// When the loop should stop on its own.
#[derive(Debug, Clone, Default)]
pub struct RunOptions {
    /// Stop after this many ticks of this run.
    pub max_ticks: Option<u64>,
    /// Stop at the next tick boundary once set.
    pub shutdown: Option<Arc<AtomicBool>>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopReason {
    TickBudget,
    Shutdown,
}

#[derive(Debug, Clone)]
pub struct RunSummary {
    pub ticks: u64,
    pub stopped_by: StopReason,
    /// Ticks whose work took longer than one period.
    pub overruns: u64,
    pub last: Option<TickReport>,
}

/// Drive `robot` at its tick rate until the options say stop.
///
/// Each tick pulls an [`Intent`], applies it, ticks the robot and hands the
/// report to `on_tick`. All actuators are stopped before returning, also
/// when a tick fails.
pub fn run<C, I, T>(
    robot: &mut Robot,
    clock: &C,
    opts: &RunOptions,
    mut intent: I,
    mut on_tick: T,
) -> Result<RunSummary>
where
    C: Clock + ?Sized,
    I: FnMut(u64, &Robot) -> Intent,
    T: FnMut(&TickReport),
{
    let period = Duration::from_micros(period_us(robot.rate_hz()));
    let mut ticks = 0u64;
    let mut overruns = 0u64;
    let mut last = None;

    let stopped_by = loop {
        if opts
            .shutdown
            .as_ref()
            .is_some_and(|flag| flag.load(Ordering::Relaxed))
        {
            break StopReason::Shutdown;
        }
        if opts.max_ticks.is_some_and(|max| ticks >= max) {
            break StopReason::TickBudget;
        }

        let started = clock.now();
        let wanted = intent(robot.ticks(), robot);
        if let Err(e) = robot.apply(&wanted) {
            tracing::warn!(error = %e, "intent rejected");
        }
        let report = match robot.tick() {
            Ok(report) => report,
            Err(e) => {
                robot.stop_all();
                return Err(e.wrap_err(format!("tick {}", robot.ticks() + 1)));
            }
        };
        on_tick(&report);
        last = Some(report);
        ticks += 1;

        let spent = clock.elapsed_since(started);
        if spent < period {
            clock.sleep(period - spent);
        } else {
            overruns += 1;
            tracing::trace!(spent_us = spent.as_micros() as u64, "tick overran its period");
        }
    };

    robot.stop_all();
    tracing::debug!(ticks, ?stopped_by, overruns, "run finished");
    Ok(RunSummary {
        ticks,
        stopped_by,
        overruns,
        last,
    })
}
