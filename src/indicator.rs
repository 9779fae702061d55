//! Indicator driver - the two status LEDs.
//!
//! The core only talks to the [`Indicators`] trait. [`PinIndicators`] is the
//! GPIO implementation used on target; it works with any `embedded-hal` 1.0
//! stateful output pin, so host tests can drive it with plain mock pins.

use embedded_hal::digital::{Error as _, PinState, StatefulOutputPin};

/// Logical indicator outputs.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Signal {
    /// Advertising / connection status.
    Connection,
    /// Immediate Alert output.
    Alert,
}

/// Logical indicator level (independent of LED polarity).
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Level {
    Off,
    On,
}

/// Write-side port for the indicator outputs.
pub trait Indicators {
    fn set(&mut self, signal: Signal, level: Level);

    fn toggle(&mut self, signal: Signal);
}

/// Two GPIO-driven LEDs.
pub struct PinIndicators<C, A> {
    connection: C,
    alert: A,
    active_low: bool,
}

impl<C, A> PinIndicators<C, A>
where
    C: StatefulOutputPin,
    A: StatefulOutputPin,
{
    /// Wrap the pins and switch both LEDs off.
    pub fn new(connection: C, alert: A, active_low: bool) -> Self {
        let mut leds = Self {
            connection,
            alert,
            active_low,
        };
        leds.set(Signal::Connection, Level::Off);
        leds.set(Signal::Alert, Level::Off);
        leds
    }

    fn pin_state(&self, level: Level) -> PinState {
        let high = matches!(level, Level::On) != self.active_low;
        PinState::from(high)
    }
}

impl<C, A> Indicators for PinIndicators<C, A>
where
    C: StatefulOutputPin,
    A: StatefulOutputPin,
{
    fn set(&mut self, signal: Signal, level: Level) {
        let state = self.pin_state(level);
        let result = match signal {
            Signal::Connection => self.connection.set_state(state).map_err(|e| e.kind()),
            Signal::Alert => self.alert.set_state(state).map_err(|e| e.kind()),
        };
        if let Err(kind) = result {
            warn!("{} LED write failed: {}", signal, kind);
        }
    }

    fn toggle(&mut self, signal: Signal) {
        let result = match signal {
            Signal::Connection => self.connection.toggle().map_err(|e| e.kind()),
            Signal::Alert => self.alert.toggle().map_err(|e| e.kind()),
        };
        if let Err(kind) = result {
            warn!("{} LED toggle failed: {}", signal, kind);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use core::convert::Infallible;
    use embedded_hal::digital::{ErrorKind, ErrorType, OutputPin};

    #[derive(Default)]
    struct MockPin {
        high: bool,
        writes: usize,
    }

    impl ErrorType for MockPin {
        type Error = Infallible;
    }

    impl OutputPin for MockPin {
        fn set_low(&mut self) -> Result<(), Infallible> {
            self.high = false;
            self.writes += 1;
            Ok(())
        }

        fn set_high(&mut self) -> Result<(), Infallible> {
            self.high = true;
            self.writes += 1;
            Ok(())
        }
    }

    impl StatefulOutputPin for MockPin {
        fn is_set_high(&mut self) -> Result<bool, Infallible> {
            Ok(self.high)
        }

        fn is_set_low(&mut self) -> Result<bool, Infallible> {
            Ok(!self.high)
        }
    }

    #[test]
    fn new_switches_both_leds_off() {
        let leds = PinIndicators::new(MockPin::default(), MockPin::default(), true);
        // Active-low: off means the pin idles high.
        assert!(leds.connection.high);
        assert!(leds.alert.high);
        assert_eq!(leds.connection.writes, 1);
        assert_eq!(leds.alert.writes, 1);
    }

    #[test]
    fn active_low_inverts_levels() {
        let mut leds = PinIndicators::new(MockPin::default(), MockPin::default(), true);
        leds.set(Signal::Alert, Level::On);
        assert!(!leds.alert.high);
        assert!(leds.connection.high);
    }

    #[test]
    fn active_high_follows_levels() {
        let mut leds = PinIndicators::new(MockPin::default(), MockPin::default(), false);
        assert!(!leds.connection.high);
        leds.set(Signal::Connection, Level::On);
        assert!(leds.connection.high);
        leds.set(Signal::Connection, Level::Off);
        assert!(!leds.connection.high);
    }

    #[test]
    fn toggle_flips_only_the_addressed_pin() {
        let mut leds = PinIndicators::new(MockPin::default(), MockPin::default(), false);
        leds.toggle(Signal::Connection);
        assert!(leds.connection.high);
        assert!(!leds.alert.high);
        leds.toggle(Signal::Connection);
        assert!(!leds.connection.high);
    }

    /// Pin whose every write fails.
    struct BrokenPin;

    #[derive(Debug)]
    struct PinFault;

    impl embedded_hal::digital::Error for PinFault {
        fn kind(&self) -> ErrorKind {
            ErrorKind::Other
        }
    }

    impl ErrorType for BrokenPin {
        type Error = PinFault;
    }

    impl OutputPin for BrokenPin {
        fn set_low(&mut self) -> Result<(), PinFault> {
            Err(PinFault)
        }

        fn set_high(&mut self) -> Result<(), PinFault> {
            Err(PinFault)
        }
    }

    impl StatefulOutputPin for BrokenPin {
        fn is_set_high(&mut self) -> Result<bool, PinFault> {
            Err(PinFault)
        }

        fn is_set_low(&mut self) -> Result<bool, PinFault> {
            Err(PinFault)
        }
    }

    #[test]
    fn failing_pin_does_not_affect_the_other_led() {
        let mut leds = PinIndicators::new(BrokenPin, MockPin::default(), false);
        leds.set(Signal::Connection, Level::On);
        leds.toggle(Signal::Connection);

        leds.set(Signal::Alert, Level::On);
        assert!(leds.alert.high);
        leds.toggle(Signal::Alert);
        assert!(!leds.alert.high);
    }
}
