//! BLE transport port - everything the core needs from the BLE stack.
//!
//! The stack owns connection establishment, the GATT database and the
//! advertising payload. The core only starts/stops advertising, asks for
//! state, arms its tick timer and pops events. On target this is backed by
//! the SoftDevice tasks in `ble/`; tests use a recording fake.

use crate::error::TransportError;
use crate::events::BleEvent;

/// Stack-assigned connection handle.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct ConnHandle(pub u16);

/// Opaque id of a stack timer.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct TimerHandle(pub u8);

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum AdvertisingMode {
    /// Short interval, limited duration; falls back to `Slow` when it expires.
    Fast,
    /// Long interval, limited duration.
    Slow,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum AdvertisementState {
    Stopped,
    Advertising,
}

/// Link state of one connection handle as seen by the stack.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ConnectionState {
    /// No link, possibly advertising.
    Idle,
    Connecting,
    Connected,
    Disconnected,
}

/// BLE version information of the running stack.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct StackVersion {
    /// Link Layer version number (Bluetooth core assigned number).
    pub link_layer: u8,
    /// Bluetooth SIG company identifier of the stack vendor.
    pub company_id: u16,
    /// Vendor-specific firmware id.
    pub firmware_id: u16,
}

/// Port to the BLE stack.
///
/// All methods are non-blocking. Completion of `enable`, `start_advertising`
/// and `disable` is reported later through [`BleTransport::pop_event`].
pub trait BleTransport {
    /// Start the stack. "Stack on" is delivered as an event.
    fn enable(&mut self) -> Result<(), TransportError>;

    fn stack_version(&self) -> Result<StackVersion, TransportError>;

    fn start_advertising(
        &mut self,
        mode: AdvertisingMode,
        config_index: u8,
    ) -> Result<(), TransportError>;

    /// Shut the stack down. "Shutdown complete" is delivered as an event.
    fn disable(&mut self);

    fn advertisement_state(&self) -> AdvertisementState;

    fn connection_state(&self, handle: ConnHandle) -> ConnectionState;

    fn active_connection_count(&self) -> u8;

    /// Allocate a one-shot timer with a fixed period.
    fn create_timer(&mut self, period_secs: u16) -> Result<TimerHandle, TransportError>;

    /// Arm `timer` once. Its expiry arrives as a generic application timeout
    /// event; the caller re-arms after each firing.
    fn start_timer(&mut self, timer: TimerHandle) -> Result<(), TransportError>;

    /// Non-blocking pop from the stack's event queue (FIFO).
    fn pop_event(&mut self) -> Option<BleEvent>;
}
