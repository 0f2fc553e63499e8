// The command-line front end: one-shot queries, actions and the monitor loop.

use anyhow::{Result, bail};
use std::io::{self, Write};
use std::thread;
use std::time::{Duration, Instant};

pub mod render;

use crate::supervisor::{Connector, Error, NormalizedStatus, ServiceAction, Supervisor};

pub struct App<C: Connector> {
    supervisor: Supervisor<C>,
    tick_rate: Duration,
}

fn timestamp() -> String {
    chrono::Local::now().format("%Y-%m-%d %H:%M:%S").to_string()
}

impl<C: Connector> App<C> {
    pub fn new(supervisor: Supervisor<C>, tick_rate: Duration) -> Self {
        Self {
            supervisor,
            tick_rate,
        }
    }

    /// Resolves the status and prints it. The outer error is a failed write,
    /// the inner one a failed resolution that has already been printed.
    fn report_status<W: Write>(
        &self,
        out: &mut W,
    ) -> io::Result<Result<NormalizedStatus, Error>> {
        let result = self.supervisor.resolve_status();
        render::render_status(out, &timestamp(), self.supervisor.service(), &result)?;
        Ok(result)
    }

    fn report_action<W: Write>(
        &self,
        out: &mut W,
        action: ServiceAction,
    ) -> io::Result<Result<(), Error>> {
        let result = self.supervisor.dispatch(action);
        render::render_action(out, action.verb(), self.supervisor.service(), &result)?;
        Ok(result)
    }

    /// Resolves and prints the status once. Fails when it cannot be resolved.
    pub fn status<W: Write>(&self, out: &mut W) -> Result<NormalizedStatus> {
        Ok(self.report_status(out)??)
    }

    pub fn perform_action<W: Write>(&self, out: &mut W, action: ServiceAction) -> Result<()> {
        Ok(self.report_action(out, action)??)
    }

    /// Polls the status every tick, printing one line per poll. Failed polls
    /// are printed and the loop carries on. Runs forever unless `limit` is set.
    pub fn monitor<W: Write>(&self, out: &mut W, limit: Option<u64>) -> Result<()> {
        log::info!(
            "monitoring {} every {:?}",
            self.supervisor.service(),
            self.tick_rate
        );
        let mut polls = 0;
        let mut last_tick: Option<Instant> = None;

        loop {
            if limit.is_some_and(|limit| polls >= limit) {
                return Ok(());
            }

            if let Some(last_tick) = last_tick {
                let timeout = self
                    .tick_rate
                    .checked_sub(last_tick.elapsed())
                    .unwrap_or(Duration::ZERO);
                thread::sleep(timeout);
            }

            last_tick = Some(Instant::now());
            self.report_status(out)?.ok();
            polls += 1;
        }
    }

    /// Starts the service, holds it for `hold`, then stops it, reporting the
    /// status around each step. Ends after the stop.
    pub fn cycle<W: Write>(&self, out: &mut W, hold: Duration) -> Result<()> {
        let mut failed = Vec::new();
        self.report_status(out)?.ok();

        for (index, action) in [ServiceAction::Start, ServiceAction::Stop]
            .into_iter()
            .enumerate()
        {
            if index > 0 {
                thread::sleep(hold);
            }
            match self.report_action(out, action)? {
                Ok(()) => {
                    self.report_status(out)?.ok();
                }
                Err(_) => failed.push(action.verb()),
            }
        }

        if !failed.is_empty() {
            bail!("failed to {} {}", failed.join(" and "), self.supervisor.service());
        }
        Ok(())
    }

    /// Runs [`cycle`](Self::cycle), then keeps monitoring whatever its outcome.
    /// A failed cycle is logged; write errors end the run.
    pub fn cycle_then_monitor<W: Write>(
        &self,
        out: &mut W,
        hold: Duration,
        limit: Option<u64>,
    ) -> Result<()> {
        if let Err(err) = self.cycle(out, hold) {
            if err.downcast_ref::<io::Error>().is_some() {
                return Err(err);
            }
            log::error!("{err:#}");
        }
        self.monitor(out, limit)
    }
}
