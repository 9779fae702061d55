//! Power-mode port.
//!
//! nRF52840 power modes used by the firmware:
//! - System ON idle: CPU sleeping in WFE until the next interrupt (~3 µA + BLE)
//! - System OFF: everything off, wake only through reset (~0.4 µA)

/// Low-power primitives used by the main loop.
#[allow(async_fn_in_trait)]
pub trait PowerControl {
    /// Sleep until the next interrupt-driven event is pending.
    async fn wait_for_event(&mut self);

    /// Enter the deepest power-down mode. Only a reset wakes the device.
    fn enter_hibernate(&mut self) -> !;

    /// Stop all progress after a fatal error, leaving outputs as they are.
    fn halt(&mut self) -> !;
}
