//! `BleTransport` implementation on top of the SoftDevice tasks.
//!
//! Commands are queued to the advertiser task and never block; state
//! queries read [`LINK`]; events come off [`EVENTS`], then [`ALERT_WRITE`].

use defmt::warn;
use findme::config::PERIPHERAL_CONFIG_INDEX;
use findme::error::TransportError;
use findme::events::{BleEvent, StackEvent};
use findme::transport::{
    AdvertisementState, AdvertisingMode, BleTransport, ConnHandle, ConnectionState, StackVersion,
    TimerHandle,
};
use nrf_softdevice::raw;

use super::timer::TIMER_ARM;
use super::{push_event, BleCommand, ALERT_WRITE, COMMANDS, EVENTS, LINK};

/// The only application timer the timer task serves.
const TICK_TIMER: TimerHandle = TimerHandle(0);

pub struct SoftdeviceTransport {
    tick_period_secs: Option<u16>,
}

impl SoftdeviceTransport {
    pub fn new() -> Self {
        Self {
            tick_period_secs: None,
        }
    }
}

fn check(ret: u32) -> Result<(), TransportError> {
    if ret == raw::NRF_SUCCESS {
        Ok(())
    } else {
        Err(TransportError::Raw(ret))
    }
}

impl BleTransport for SoftdeviceTransport {
    fn enable(&mut self) -> Result<(), TransportError> {
        // The SoftDevice is enabled in `main` before the BLE tasks start, and
        // the queue is still empty here.
        let mut enabled: u8 = 0;
        check(unsafe { raw::sd_softdevice_is_enabled(&mut enabled) })?;
        if enabled == 0 {
            return Err(TransportError::InvalidState);
        }
        push_event(StackEvent::StackOn);
        Ok(())
    }

    fn stack_version(&self) -> Result<StackVersion, TransportError> {
        let mut version: raw::ble_version_t = unsafe { core::mem::zeroed() };
        check(unsafe { raw::sd_ble_version_get(&mut version) })?;
        Ok(StackVersion {
            link_layer: version.version_number,
            company_id: version.company_id,
            firmware_id: version.subversion_number,
        })
    }

    fn start_advertising(
        &mut self,
        mode: AdvertisingMode,
        config_index: u8,
    ) -> Result<(), TransportError> {
        if config_index != PERIPHERAL_CONFIG_INDEX || LINK.advertising() || LINK.connected() {
            return Err(TransportError::InvalidState);
        }
        COMMANDS
            .try_send(BleCommand::StartAdvertising(mode))
            .map_err(|_| TransportError::Busy)?;
        // Reported as advertising from the moment the request is queued.
        LINK.set_advertising(true);
        Ok(())
    }

    fn disable(&mut self) {
        if COMMANDS.try_send(BleCommand::Shutdown).is_err() {
            warn!("BLE command queue full, shutdown dropped");
        }
    }

    fn advertisement_state(&self) -> AdvertisementState {
        if LINK.advertising() {
            AdvertisementState::Advertising
        } else {
            AdvertisementState::Stopped
        }
    }

    fn connection_state(&self, handle: ConnHandle) -> ConnectionState {
        LINK.connection_state(handle.0)
    }

    fn active_connection_count(&self) -> u8 {
        u8::from(LINK.connected())
    }

    fn create_timer(&mut self, period_secs: u16) -> Result<TimerHandle, TransportError> {
        if self.tick_period_secs.is_some() {
            return Err(TransportError::InvalidState);
        }
        self.tick_period_secs = Some(period_secs);
        Ok(TICK_TIMER)
    }

    fn start_timer(&mut self, timer: TimerHandle) -> Result<(), TransportError> {
        match self.tick_period_secs {
            Some(period) if timer == TICK_TIMER => {
                TIMER_ARM.signal((timer, period));
                Ok(())
            }
            _ => Err(TransportError::InvalidState),
        }
    }

    fn pop_event(&mut self) -> Option<BleEvent> {
        // A parked write is newer than every write still queued.
        EVENTS
            .try_receive()
            .ok()
            .or_else(|| ALERT_WRITE.take().map(BleEvent::from))
    }
}
