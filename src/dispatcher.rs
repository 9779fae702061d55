//! Find Me event dispatcher.
//!
//! [`FindMe`] owns the alert level, the tick flag and the tick timer handle,
//! together with the transport and indicator ports it commands. Stack events
//! drive a small lifecycle state machine:
//!
//! ```text
//!  Initial ──StackOn──▶ Advertising ──Connected──▶ Connected
//!                        │    ▲                        │
//!           adv stopped  │    └──confirmed disconnect──┘
//!                        ▼
//!                   ShuttingDown ──ShutdownComplete──▶ Hibernating
//!
//!  any ──HardwareError / fatal command failure──▶ Failed
//! ```
//!
//! Handlers run only from the main loop's event pump, never from interrupt
//! context, so no locking is needed around the owned state.

use crate::alert::AlertLevel;
use crate::config::{PERIPHERAL_CONFIG_INDEX, TICK_PERIOD_SECS};
use crate::error::Error;
use crate::events::{
    EventSink, IasCharacteristic, IasEvent, StackEvent, TimeoutParam, TimeoutReason,
};
use crate::indicator::{Indicators, Level, Signal};
use crate::indicator_logic::status_on_tick;
use crate::transport::{
    AdvertisementState, AdvertisingMode, BleTransport, ConnHandle, ConnectionState, TimerHandle,
};

/// Lifecycle phase of the peripheral.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Phase {
    /// Waiting for the stack to come up.
    Initial,
    Advertising,
    Connected,
    /// Advertising timed out, waiting for the stack to shut down.
    ShuttingDown,
    /// Stack is off, the device is about to enter System OFF.
    Hibernating,
    /// A fatal error occurred, the error pattern is shown.
    Failed(Error),
}

impl Phase {
    /// No further events are processed in a terminal phase.
    pub fn is_terminal(self) -> bool {
        matches!(self, Phase::Hibernating | Phase::Failed(_))
    }
}

/// The Find Me target state machine.
pub struct FindMe<T, I> {
    pub(crate) transport: T,
    pub(crate) indicators: I,
    pub(crate) alert_level: AlertLevel,
    pub(crate) tick_due: bool,
    pub(crate) timer: Option<TimerHandle>,
    connection: Option<ConnHandle>,
    pub(crate) phase: Phase,
}

impl<T, I> FindMe<T, I>
where
    T: BleTransport,
    I: Indicators,
{
    pub fn new(transport: T, indicators: I) -> Self {
        Self {
            transport,
            indicators,
            alert_level: AlertLevel::NoAlert,
            tick_due: true,
            timer: None,
            connection: None,
            phase: Phase::Initial,
        }
    }

    /// Bring up the stack and allocate the tick timer.
    ///
    /// A failure here is fatal: the error pattern is shown and the next
    /// main loop iteration halts.
    pub fn init(&mut self) -> Result<(), Error> {
        info!("BLE Find Me target");

        self.indicators.set(Signal::Connection, Level::Off);
        self.indicators.set(Signal::Alert, Level::Off);

        self.bring_up().inspect_err(|&e| self.fail(e))
    }

    fn bring_up(&mut self) -> Result<(), Error> {
        match self.transport.enable() {
            Ok(()) => info!("BLE stack enabled"),
            Err(e) => {
                error!("BLE stack enable failed: {}", e);
                return Err(Error::StackInit(e));
            }
        }

        match self.transport.stack_version() {
            Ok(v) => info!(
                "Stack version: LL {} company {:#x} firmware {:#x}",
                v.link_layer,
                v.company_id,
                v.firmware_id
            ),
            Err(e) => warn!("Stack version query failed: {}", e),
        }

        let timer = self
            .transport
            .create_timer(TICK_PERIOD_SECS)
            .map_err(Error::Timer)?;
        self.timer = Some(timer);
        Ok(())
    }

    pub fn alert_level(&self) -> AlertLevel {
        self.alert_level
    }

    pub fn tick_due(&self) -> bool {
        self.tick_due
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    /// Handle of the current link, if a central is connected.
    pub fn connection(&self) -> Option<ConnHandle> {
        self.connection
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    pub fn transport_mut(&mut self) -> &mut T {
        &mut self.transport
    }

    pub fn indicators(&self) -> &I {
        &self.indicators
    }

    pub fn indicators_mut(&mut self) -> &mut I {
        &mut self.indicators
    }

    /// Show the error pattern and stop processing.
    pub(crate) fn fail(&mut self, error: Error) {
        error!("Fatal: {}", error);
        self.indicators.set(Signal::Connection, Level::On);
        self.indicators.set(Signal::Alert, Level::On);
        self.phase = Phase::Failed(error);
    }

    fn start_advertising(&mut self) -> Result<(), Error> {
        self.transport
            .start_advertising(AdvertisingMode::Fast, PERIPHERAL_CONFIG_INDEX)
            .map_err(Error::Advertising)?;
        self.phase = Phase::Advertising;
        Ok(())
    }

    fn handle_stack_event(&mut self, event: StackEvent) -> Result<(), Error> {
        match event {
            StackEvent::StackOn => {
                info!("Stack on, starting fast advertising");
                self.start_advertising()?;
            }
            StackEvent::HardwareError => {
                error!("Stack hardware error");
                return Err(Error::HardwareFault);
            }
            StackEvent::StackShutdownComplete if self.phase == Phase::ShuttingDown => {
                info!("Stack shutdown complete, entering hibernate");
                self.phase = Phase::Hibernating;
            }
            StackEvent::StackShutdownComplete => {
                warn!("Unexpected stack shutdown in {}, ignored", self.phase);
            }
            StackEvent::AdvertisementStartStop => self.on_advertisement_start_stop(),
            StackEvent::DeviceConnected { handle } => {
                info!("Device connected (handle {})", handle.0);
                self.connection = Some(handle);
                self.phase = Phase::Connected;
            }
            StackEvent::DeviceDisconnected { handle } => self.on_disconnected(handle)?,
            StackEvent::Timeout(param) => self.on_timeout(param),
        }
        Ok(())
    }

    fn on_advertisement_start_stop(&mut self) {
        if self.phase != Phase::Advertising {
            debug!("Advertisement start/stop in {}, ignored", self.phase);
            return;
        }

        if self.transport.advertisement_state() == AdvertisementState::Advertising {
            info!("Started advertising");
            return;
        }

        if self.transport.active_connection_count() > 0 {
            // Advertising ends when a central connects.
            debug!("Advertising stopped by connection");
            return;
        }

        info!("Advertising timed out, shutting the stack down");
        self.transport.disable();
        self.phase = Phase::ShuttingDown;
    }

    fn on_disconnected(&mut self, handle: ConnHandle) -> Result<(), Error> {
        // The notification can precede the stack's own state update.
        let state = self.transport.connection_state(handle);
        if state != ConnectionState::Disconnected {
            debug!("Disconnect for handle {} not confirmed ({})", handle.0, state);
            return Ok(());
        }

        info!("Device disconnected (handle {})", handle.0);
        self.alert_level = AlertLevel::NoAlert;
        self.connection = None;
        self.start_advertising()?;
        info!("Advertising restarted");
        Ok(())
    }

    fn on_timeout(&mut self, param: TimeoutParam) {
        let ours = param.reason == TimeoutReason::GenericApp
            && param.timer.is_some()
            && param.timer == self.timer;
        if !ours {
            trace!("Ignoring foreign timeout {}", param);
            return;
        }

        self.tick_due = true;

        let advertising = self.transport.advertisement_state() == AdvertisementState::Advertising;
        let pattern = status_on_tick(advertising, self.transport.active_connection_count());
        pattern
            .connection
            .apply(&mut self.indicators, Signal::Connection);
        if let Some(alert) = pattern.alert {
            alert.apply(&mut self.indicators, Signal::Alert);
        }
    }
}

impl<T, I> EventSink for FindMe<T, I>
where
    T: BleTransport,
    I: Indicators,
{
    fn on_stack_event(&mut self, event: StackEvent) {
        if self.phase.is_terminal() {
            trace!("Dropping {} in {}", event, self.phase);
            return;
        }

        if let Err(e) = self.handle_stack_event(event) {
            self.fail(e);
        }
    }

    fn on_ias_event(&mut self, event: IasEvent) {
        if self.phase.is_terminal() {
            return;
        }

        let IasEvent::WriteCommand {
            characteristic: IasCharacteristic::AlertLevel,
            value,
        } = event;

        match value.first().copied().map(AlertLevel::from_byte) {
            Some(level @ AlertLevel::Reserved(b)) => {
                warn!("Reserved alert level {}, ALERT left as is", b);
                self.alert_level = level;
            }
            Some(level) => {
                info!("Alert level: {}", level);
                self.alert_level = level;
            }
            None => warn!("Ignoring empty alert level write"),
        }
    }
}
