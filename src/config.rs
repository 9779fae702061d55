//! Application-wide constants and compile-time configuration.
//!
//! All pin assignments, timing parameters, and protocol constants live
//! here so they can be tuned in one place.

// Tick timer

/// Period of the status/blink timer (seconds).
pub const TICK_PERIOD_SECS: u16 = 1;

// BLE advertising

/// Peripheral (GAP) configuration used for every advertising start.
pub const PERIPHERAL_CONFIG_INDEX: u8 = 0;

/// GAP device name, also carried in the advertising payload.
pub const DEVICE_NAME: &str = "Find Me Target";

/// Fast advertising interval (in 0.625 ms units). 32 = 20 ms.
pub const ADV_FAST_INTERVAL: u32 = 32;

/// Fast advertising duration before falling back to slow advertising (seconds).
pub const ADV_FAST_TIMEOUT_SECS: u16 = 30;

/// Slow advertising interval (in 0.625 ms units). 1600 = 1 s.
pub const ADV_SLOW_INTERVAL: u32 = 1600;

/// Slow advertising duration before advertising stops for good (seconds).
pub const ADV_SLOW_TIMEOUT_SECS: u16 = 150;

/// Connection interval range (in 1.25 ms units). 80 = 100 ms, 160 = 200 ms.
pub const BLE_CONN_INTERVAL_MIN: u16 = 80;
pub const BLE_CONN_INTERVAL_MAX: u16 = 160;

/// Peripheral latency (number of connection events the peripheral can skip).
pub const BLE_SLAVE_LATENCY: u16 = 0;

/// Supervision timeout (in 10 ms units). 400 = 4 s.
pub const BLE_SUP_TIMEOUT: u16 = 400;

// Event plumbing

/// Depth of the stack -> main loop event queue.
pub const EVENT_QUEUE_DEPTH: usize = 16;

/// Event-queue slots kept free for stack and timer events. Alert Level
/// writes arriving with fewer free slots are coalesced instead of queued.
pub const EVENT_QUEUE_HEADROOM: usize = 4;

/// Depth of the main loop -> advertising task command queue.
pub const COMMAND_QUEUE_DEPTH: usize = 4;

// GPIO pin assignments (nRF52840-DK defaults)
//
// These are logical names; actual `embassy_nrf::peripherals::*` types are
// selected in `main.rs`.  Adjust for your custom PCB.
//
//   CONNECTION LED → P0.13 (LED1)
//   ALERT LED      → P0.14 (LED2)

/// The DK LEDs are wired to VDD, a low pin lights them.
pub const LED_ACTIVE_LOW: bool = true;
