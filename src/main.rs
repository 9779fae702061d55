//! findme - BLE Find Me target firmware for the nRF52840.
//!
//! Advertises the Immediate Alert Service, accepts one central, and shows
//! the requested alert level on LED2 while LED1 reports advertising and
//! connection status.
//!
//! Task layout:
//! - `softdevice_task` - SoftDevice event loop
//! - `ble_task`        - advertising + GATT server, driven by commands
//! - `timer_task`      - one-shot tick timer
//! - `main`            - the Find Me main loop (event pump, LEDs, sleep)

#![no_std]
#![no_main]

mod ble;
mod board;

use defmt::{info, unwrap};
use defmt_rtt as _;
use embassy_executor::Spawner;
use embassy_nrf::gpio::{Level, Output, OutputDrive};
use embassy_nrf::interrupt::Priority;
use findme::{config, FindMe, PinIndicators};
use nrf_softdevice::Softdevice;
use panic_probe as _;

#[embassy_executor::main]
async fn main(spawner: Spawner) {
    info!("findme starting");

    // Keep embassy interrupts off the priority levels the SoftDevice reserves (0, 1, 4).
    let mut nrf_config = embassy_nrf::config::Config::default();
    nrf_config.gpiote_interrupt_priority = Priority::P2;
    nrf_config.time_interrupt_priority = Priority::P2;
    let p = embassy_nrf::init(nrf_config);

    // Both LEDs start dark: active-low pins idle high.
    let leds = PinIndicators::new(
        Output::new(p.P0_13, Level::High, OutputDrive::Standard),
        Output::new(p.P0_14, Level::High, OutputDrive::Standard),
        config::LED_ACTIVE_LOW,
    );

    let sd = Softdevice::enable(&ble::softdevice_config());
    let server = unwrap!(ble::gatt::Server::new(sd));
    let sd: &'static Softdevice = sd;

    unwrap!(spawner.spawn(ble::softdevice_task(sd)));
    unwrap!(spawner.spawn(ble::advertiser::ble_task(sd, server)));
    unwrap!(spawner.spawn(ble::timer::timer_task()));

    let mut app = FindMe::new(ble::transport::SoftdeviceTransport::new(), leds);
    // A failed bring-up is already showing the error pattern; the first
    // iteration of `run` halts.
    let _ = app.init();

    app.run(&mut board::NrfPower).await
}
