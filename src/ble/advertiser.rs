//! Advertising and connection task.
//!
//! Waits for commands from the transport. A start command advertises
//! FAST, falls back to SLOW when the fast window expires, and reports
//! "stopped" when the slow window expires too. A connection runs the GATT
//! server until the link drops; the link state is updated *before* the
//! matching event is published so the core's confirmation check sees it.

use defmt::{error, info, warn};
use embassy_futures::select::{select, Either};
use findme::config::{
    ADV_FAST_INTERVAL, ADV_FAST_TIMEOUT_SECS, ADV_SLOW_INTERVAL, ADV_SLOW_TIMEOUT_SECS,
    BLE_CONN_INTERVAL_MAX, BLE_CONN_INTERVAL_MIN, BLE_SLAVE_LATENCY, BLE_SUP_TIMEOUT, DEVICE_NAME,
};
use findme::events::StackEvent;
use findme::transport::{AdvertisingMode, ConnHandle, ConnectionState};
use nrf_softdevice::ble::advertisement_builder::{
    Flag, LegacyAdvertisementBuilder, LegacyAdvertisementPayload, ServiceList, ServiceUuid16,
};
use nrf_softdevice::ble::peripheral::{self, AdvertiseError, ConnectableAdvertisement};
use nrf_softdevice::ble::{gatt_server, Connection};
use nrf_softdevice::{raw, Softdevice};

use super::gatt::{alert_level_byte, Server};
use super::{publish, push_alert_write, BleCommand, ALERT_WRITE, COMMANDS, LINK};

/// Immediate Alert Service.
const IMMEDIATE_ALERT_UUID: u16 = 0x1802;

static ADV_DATA: LegacyAdvertisementPayload = LegacyAdvertisementBuilder::new()
    .flags(&[Flag::GeneralDiscovery, Flag::LE_Only])
    .services_16(ServiceList::Complete, &[ServiceUuid16::from_u16(IMMEDIATE_ALERT_UUID)])
    .full_name(DEVICE_NAME)
    .build();

static SCAN_DATA: LegacyAdvertisementPayload = LegacyAdvertisementBuilder::new().build();

#[embassy_executor::task]
pub async fn ble_task(sd: &'static Softdevice, server: Server) -> ! {
    let mut pending_cmd: Option<BleCommand> = None;

    loop {
        let cmd = match pending_cmd.take() {
            Some(cmd) => cmd,
            None => COMMANDS.receive().await,
        };

        match cmd {
            BleCommand::StartAdvertising(mode) => {
                pending_cmd = advertise(sd, &server, mode).await;
            }
            BleCommand::Shutdown => {
                info!("BLE shutdown");
                LINK.set_advertising(false);
                publish(StackEvent::StackShutdownComplete).await;
            }
        }
    }
}

/// Advertise until a central connects, both windows expire, or another
/// command arrives. An interrupting command is returned to the caller.
async fn advertise(
    sd: &'static Softdevice,
    server: &Server,
    mut mode: AdvertisingMode,
) -> Option<BleCommand> {
    LINK.set_advertising(true);
    publish(StackEvent::AdvertisementStartStop).await;

    loop {
        info!("Advertising ({})", mode);
        let config = adv_config(mode);
        let adv = ConnectableAdvertisement::ScannableUndirected {
            adv_data: &ADV_DATA,
            scan_data: &SCAN_DATA,
        };

        match select(
            peripheral::advertise_connectable(sd, adv, &config),
            COMMANDS.receive(),
        )
        .await
        {
            Either::First(Ok(conn)) => {
                LINK.set_advertising(false);
                serve(server, conn).await;
                return None;
            }
            Either::First(Err(AdvertiseError::Timeout)) if mode == AdvertisingMode::Fast => {
                info!("Fast advertising expired, falling back to slow");
                mode = AdvertisingMode::Slow;
            }
            Either::First(Err(AdvertiseError::Timeout)) => {
                LINK.set_advertising(false);
                publish(StackEvent::AdvertisementStartStop).await;
                return None;
            }
            Either::First(Err(e)) => {
                error!("Advertising failed: {}", e);
                LINK.set_advertising(false);
                publish(StackEvent::HardwareError).await;
                return None;
            }
            Either::Second(cmd) => {
                // Dropping the advertise future stops advertising.
                LINK.set_advertising(false);
                return Some(cmd);
            }
        }
    }
}

/// Run the GATT server on `conn` until the link drops.
async fn serve(server: &Server, conn: Connection) {
    let handle = conn.handle().unwrap_or(raw::BLE_CONN_HANDLE_INVALID as u16);
    LINK.set_connection(handle, ConnectionState::Connected);
    publish(StackEvent::DeviceConnected {
        handle: ConnHandle(handle),
    })
    .await;

    let conn_params = raw::ble_gap_conn_params_t {
        min_conn_interval: BLE_CONN_INTERVAL_MIN,
        max_conn_interval: BLE_CONN_INTERVAL_MAX,
        slave_latency: BLE_SLAVE_LATENCY,
        conn_sup_timeout: BLE_SUP_TIMEOUT,
    };
    if let Err(e) = conn.set_conn_params(conn_params) {
        warn!("set_conn_params error: {}", e);
    }

    // Returns when the central disconnects.
    let _ = gatt_server::run(&conn, server, |e| push_alert_write(alert_level_byte(e))).await;

    // A write parked during the link belongs before its disconnect.
    if let Some(write) = ALERT_WRITE.take() {
        publish(write).await;
    }

    LINK.set_connection(handle, ConnectionState::Disconnected);
    publish(StackEvent::DeviceDisconnected {
        handle: ConnHandle(handle),
    })
    .await;
}

fn adv_config(mode: AdvertisingMode) -> peripheral::Config {
    let (interval, timeout_secs) = match mode {
        AdvertisingMode::Fast => (ADV_FAST_INTERVAL, ADV_FAST_TIMEOUT_SECS),
        AdvertisingMode::Slow => (ADV_SLOW_INTERVAL, ADV_SLOW_TIMEOUT_SECS),
    };
    peripheral::Config {
        interval,
        // 10 ms units.
        timeout: Some(timeout_secs * 100),
        ..Default::default()
    }
}
