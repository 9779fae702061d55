//! Find Me target core.
//!
//! Everything in this library is hardware-independent: the event
//! dispatcher, the main loop, and the ports (traits) they drive. It builds
//! `no_std` for the nRF52840 binary and with `std` for host tests.
//!
//! Usage: `cargo test` on the host.
//!
//! Note: The embedded binary uses main.rs with #![no_std] and #![no_main]
//! and plugs the SoftDevice, GPIO and power adapters into these ports.

#![cfg_attr(not(test), no_std)]

#[macro_use]
mod fmt;

pub mod alert;
pub mod config;
pub mod dispatcher;
pub mod error;
pub mod events;
pub mod indicator;
pub mod indicator_logic;
pub mod main_loop;
pub mod power;
pub mod transport;

pub use alert::AlertLevel;
pub use dispatcher::{FindMe, Phase};
pub use error::{Error, TransportError};
pub use events::{BleEvent, EventSink, IasEvent, StackEvent};
pub use indicator::{Indicators, Level, PinIndicators, Signal};
pub use main_loop::Flow;
pub use power::PowerControl;
pub use transport::BleTransport;
