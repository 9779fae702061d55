use crate::alert::AlertLevel;
use crate::indicator::{Indicators, Level, Signal};

/// What to do with one indicator.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Command {
    Set(Level),
    Toggle,
}

impl Command {
    pub fn apply<I: Indicators>(self, indicators: &mut I, signal: Signal) {
        match self {
            Command::Set(level) => indicators.set(signal, level),
            Command::Toggle => indicators.toggle(signal),
        }
    }
}

/// Decide the ALERT output for the current alert level.
///
/// Mild alerts blink at the tick cadence, so they only change on a tick.
/// Reserved levels leave the output untouched.
pub fn alert_command(level: AlertLevel, tick_due: bool) -> Option<Command> {
    match level {
        AlertLevel::NoAlert => Some(Command::Set(Level::Off)),
        AlertLevel::MildAlert if tick_due => Some(Command::Toggle),
        AlertLevel::MildAlert => None,
        AlertLevel::HighAlert => Some(Command::Set(Level::On)),
        AlertLevel::Reserved(_) => None,
    }
}

/// Indicator pattern shown on every tick.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct StatusPattern {
    pub connection: Command,
    /// `None` leaves ALERT to the alert-level render step.
    pub alert: Option<Command>,
}

/// Decide the tick pattern from advertising and link state.
pub fn status_on_tick(advertising: bool, active_connections: u8) -> StatusPattern {
    if advertising {
        StatusPattern {
            connection: Command::Toggle,
            alert: Some(Command::Set(Level::Off)),
        }
    } else if active_connections == 0 {
        StatusPattern {
            connection: Command::Set(Level::On),
            alert: Some(Command::Set(Level::Off)),
        }
    } else {
        StatusPattern {
            connection: Command::Set(Level::Off),
            alert: None,
        }
    }
}
