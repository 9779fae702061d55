//! nRF52840 power modes.
//!
//! - System ON idle: the thread-mode executor sleeps in WFE while the main
//!   loop waits for the event queue (~3 µA plus radio activity).
//! - System OFF: everything powered down, wake only through reset (~0.4 µA).

use defmt::{error, info};
use findme::power::PowerControl;
use nrf_softdevice::raw;

use crate::ble::EVENTS;

pub struct NrfPower;

impl PowerControl for NrfPower {
    async fn wait_for_event(&mut self) {
        EVENTS.ready_to_receive().await
    }

    fn enter_hibernate(&mut self) -> ! {
        info!("Entering System OFF");
        // With the SoftDevice enabled, System OFF must go through its API.
        let ret = unsafe { raw::sd_power_system_off() };
        error!("sd_power_system_off returned {}", ret);
        loop {
            cortex_m::asm::wfe();
        }
    }

    fn halt(&mut self) -> ! {
        error!("Halted, power cycle to recover");
        loop {
            cortex_m::asm::wfe();
        }
    }
}
