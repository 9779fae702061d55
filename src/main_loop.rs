//! Main loop - drain events, render the alert, re-arm the tick, sleep.

use crate::dispatcher::{FindMe, Phase};
use crate::error::{Error, TransportError};
use crate::events::EventSink;
use crate::indicator::{Indicators, Signal};
use crate::indicator_logic::alert_command;
use crate::power::PowerControl;
use crate::transport::BleTransport;

/// Outcome of one main loop iteration.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Flow {
    /// Sleep until the next event, then iterate again.
    Continue,
    /// The stack is down, enter System OFF.
    Hibernate,
    /// A fatal error is being shown, stop.
    Halt(Error),
}

impl<T, I> FindMe<T, I>
where
    T: BleTransport,
    I: Indicators,
{
    /// Run one iteration without the final sleep.
    ///
    /// Order matters: events first, so rendering sees the alert level they
    /// left behind; the tick is re-armed last so a mild alert toggles
    /// exactly once per expiry.
    pub fn poll(&mut self) -> Flow {
        self.pump_events();
        if let Some(flow) = self.terminal_flow() {
            return flow;
        }

        self.render_alert();

        if let Err(e) = self.rearm_tick() {
            self.fail(e);
            return Flow::Halt(e);
        }

        Flow::Continue
    }

    /// Iterate forever, sleeping between iterations.
    pub async fn run<P: PowerControl>(&mut self, power: &mut P) -> ! {
        loop {
            match self.poll() {
                Flow::Continue => power.wait_for_event().await,
                Flow::Hibernate => power.enter_hibernate(),
                Flow::Halt(_) => power.halt(),
            }
        }
    }

    /// Pop and dispatch every pending event, stopping early once a handler
    /// reaches a terminal phase.
    pub fn pump_events(&mut self) {
        while !self.phase.is_terminal() {
            let Some(event) = self.transport.pop_event() else {
                break;
            };
            self.dispatch(event);
        }
    }

    /// Drive the ALERT indicator from the current alert level.
    pub fn render_alert(&mut self) {
        if let Some(command) = alert_command(self.alert_level, self.tick_due) {
            command.apply(&mut self.indicators, Signal::Alert);
        }
    }

    fn rearm_tick(&mut self) -> Result<(), Error> {
        if !self.tick_due {
            return Ok(());
        }

        let timer = self
            .timer
            .ok_or(Error::Timer(TransportError::InvalidState))?;
        self.tick_due = false;
        self.transport.start_timer(timer).map_err(Error::Timer)
    }

    fn terminal_flow(&self) -> Option<Flow> {
        match self.phase {
            Phase::Hibernating => Some(Flow::Hibernate),
            Phase::Failed(e) => Some(Flow::Halt(e)),
            _ => None,
        }
    }
}
