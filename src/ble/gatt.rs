//! GATT server - Immediate Alert Service (0x1802).
//!
//! The `#[nrf_softdevice::gatt_service]` macro registers the attributes and
//! generates `ImmediateAlertServiceEvent`; `#[nrf_softdevice::gatt_server]`
//! wraps it into `ServerEvent` for `gatt_server::run`. Writes leave here as
//! raw bytes and are queued by `push_alert_write`.

#[nrf_softdevice::gatt_service(uuid = "1802")]
pub struct ImmediateAlertService {
    /// Alert Level (0x2A06) - written by the central without response.
    #[characteristic(uuid = "2a06", write_without_response)]
    pub alert_level: u8,
}

#[nrf_softdevice::gatt_server]
pub struct Server {
    pub ias: ImmediateAlertService,
}

/// Byte written to the Alert Level characteristic.
pub fn alert_level_byte(event: ServerEvent) -> u8 {
    match event {
        ServerEvent::Ias(ImmediateAlertServiceEvent::AlertLevelWrite(level)) => level,
    }
}
