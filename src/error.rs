//! Unified error type for findme.
//!
//! We avoid `alloc` - all error variants carry only fixed-size data.
//! Every variant of [`Error`] is fatal: the device shows the error pattern
//! and stops. Recoverable conditions (stale events, foreign timers) are not
//! errors and never reach this type.

/// Top-level error type used across the application.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Error {
    // Stack bring-up
    /// The BLE stack could not be enabled.
    StackInit(TransportError),

    /// The one-second tick timer could not be created or re-armed.
    Timer(TransportError),

    // Advertising
    /// Advertising could not be (re)started, the device is undiscoverable.
    Advertising(TransportError),

    // Hardware
    /// The stack reported a hardware error.
    HardwareFault,
}

/// Errors reported by the BLE transport (keeps the enum `Copy`-friendly).
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum TransportError {
    /// Raw error code from the stack.
    Raw(u32),
    /// The stack's command queue is full.
    Busy,
    /// The request is not valid in the stack's current state.
    InvalidState,
}
