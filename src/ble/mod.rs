//! Bluetooth Low Energy subsystem.
//!
//! This module drives the Nordic SoftDevice S140 in **Peripheral** role:
//!
//! 1. **GATT server** - the Immediate Alert Service with its Alert Level
//!    characteristic.
//! 2. **Advertiser** - runs advertising on command from the main loop and
//!    serves the single connection until the link drops.
//! 3. **Timer** - the one-shot application tick timer.
//! 4. **Transport** - the `BleTransport` port the core talks to.
//!
//! Tasks never call into the core. They publish events on [`EVENTS`],
//! which the main loop drains, and keep [`LINK`] up to date so the core can
//! query advertising and connection state. Async tasks wait for a free
//! queue slot. The GATT write callback cannot wait, so its writes are
//! coalesced in [`ALERT_WRITE`] once the queue is down to its headroom.

pub mod advertiser;
pub mod gatt;
pub mod timer;
pub mod transport;

use core::mem;
use core::sync::atomic::{AtomicBool, AtomicU16, AtomicU8, Ordering};

use defmt::{warn, Format};
use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use embassy_sync::channel::Channel;
use findme::config::{COMMAND_QUEUE_DEPTH, DEVICE_NAME, EVENT_QUEUE_DEPTH};
use findme::events::{AlertWriteSlot, BleEvent};
use findme::transport::{AdvertisingMode, ConnectionState};
use nrf_softdevice::{raw, Softdevice};

/// Stack -> main loop events.
pub static EVENTS: Channel<CriticalSectionRawMutex, BleEvent, EVENT_QUEUE_DEPTH> = Channel::new();

/// Main loop -> advertiser commands.
pub static COMMANDS: Channel<CriticalSectionRawMutex, BleCommand, COMMAND_QUEUE_DEPTH> =
    Channel::new();

/// Advertising and link state shared with the transport.
pub static LINK: LinkState = LinkState::new();

/// Commands the transport sends to the advertiser task.
#[derive(Clone, Copy, Format)]
pub enum BleCommand {
    /// Start connectable advertising in the given mode.
    StartAdvertising(AdvertisingMode),
    /// Stop all BLE activity and report shutdown complete.
    Shutdown,
}

/// Alert Level writes parked while the event queue is down to its headroom.
pub static ALERT_WRITE: AlertWriteSlot = AlertWriteSlot::new();

/// Publish an event for the main loop, waiting for a free slot.
pub async fn publish(event: impl Into<BleEvent>) {
    EVENTS.send(event.into()).await
}

/// Publish from a synchronous context. Only valid while the queue is known
/// to have room.
pub fn push_event(event: impl Into<BleEvent>) {
    if EVENTS.try_send(event.into()).is_err() {
        warn!("BLE event queue full, dropping event");
    }
}

/// Publish an Alert Level write from the GATT callback without blocking.
pub fn push_alert_write(level: u8) {
    if let Some(event) = ALERT_WRITE.offer(level, EVENTS.free_capacity()) {
        push_event(event);
    }
}

/// Link bookkeeping written by the BLE tasks, read by the transport.
pub struct LinkState {
    advertising: AtomicBool,
    handle: AtomicU16,
    state: AtomicU8,
}

impl LinkState {
    const fn new() -> Self {
        Self {
            advertising: AtomicBool::new(false),
            handle: AtomicU16::new(raw::BLE_CONN_HANDLE_INVALID as u16),
            state: AtomicU8::new(encode_state(ConnectionState::Idle)),
        }
    }

    pub fn set_advertising(&self, on: bool) {
        self.advertising.store(on, Ordering::SeqCst);
    }

    pub fn advertising(&self) -> bool {
        self.advertising.load(Ordering::SeqCst)
    }

    pub fn set_connection(&self, handle: u16, state: ConnectionState) {
        self.handle.store(handle, Ordering::SeqCst);
        self.state.store(encode_state(state), Ordering::SeqCst);
    }

    /// State of `handle`; handles other than the current link are gone.
    pub fn connection_state(&self, handle: u16) -> ConnectionState {
        if self.handle.load(Ordering::SeqCst) != handle {
            return ConnectionState::Disconnected;
        }
        decode_state(self.state.load(Ordering::SeqCst))
    }

    pub fn connected(&self) -> bool {
        decode_state(self.state.load(Ordering::SeqCst)) == ConnectionState::Connected
    }
}

const fn encode_state(state: ConnectionState) -> u8 {
    match state {
        ConnectionState::Idle => 0,
        ConnectionState::Connecting => 1,
        ConnectionState::Connected => 2,
        ConnectionState::Disconnected => 3,
    }
}

fn decode_state(value: u8) -> ConnectionState {
    match value {
        1 => ConnectionState::Connecting,
        2 => ConnectionState::Connected,
        3 => ConnectionState::Disconnected,
        _ => ConnectionState::Idle,
    }
}

/// SoftDevice configuration: one peripheral link, no central role.
pub fn softdevice_config() -> nrf_softdevice::Config {
    nrf_softdevice::Config {
        clock: Some(raw::nrf_clock_lf_cfg_t {
            source: raw::NRF_CLOCK_LF_SRC_XTAL as u8,
            rc_ctiv: 0,
            rc_temp_ctiv: 0,
            accuracy: raw::NRF_CLOCK_LF_ACCURACY_20_PPM as u8,
        }),
        conn_gap: Some(raw::ble_gap_conn_cfg_t {
            conn_count: 1,
            event_length: 24,
        }),
        conn_gatt: Some(raw::ble_gatt_conn_cfg_t { att_mtu: 23 }),
        gatts_attr_tab_size: Some(raw::ble_gatts_cfg_attr_tab_size_t {
            attr_tab_size: raw::BLE_GATTS_ATTR_TAB_SIZE_DEFAULT,
        }),
        gap_role_count: Some(raw::ble_gap_cfg_role_count_t {
            adv_set_count: 1,
            periph_role_count: 1,
            central_role_count: 0,
            central_sec_count: 0,
            _bitfield_1: raw::ble_gap_cfg_role_count_t::new_bitfield_1(0),
        }),
        gap_device_name: Some(raw::ble_gap_cfg_device_name_t {
            p_value: DEVICE_NAME.as_ptr() as _,
            current_len: DEVICE_NAME.len() as u16,
            max_len: DEVICE_NAME.len() as u16,
            write_perm: unsafe { mem::zeroed() },
            _bitfield_1: raw::ble_gap_cfg_device_name_t::new_bitfield_1(
                raw::BLE_GATTS_VLOC_STACK as u8,
            ),
        }),
        ..Default::default()
    }
}

/// Runs the SoftDevice event loop. Must be spawned before any BLE call.
#[embassy_executor::task]
pub async fn softdevice_task(sd: &'static Softdevice) -> ! {
    sd.run().await
}
