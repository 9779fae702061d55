//! Events delivered by the BLE stack and the Immediate Alert Service.
//!
//! Interrupt and stack contexts only ever push these onto the event queue.
//! The main loop pops them and hands each one to an [`EventSink`].

use core::sync::atomic::{AtomicU16, Ordering};

use heapless::Vec;

use crate::config::EVENT_QUEUE_HEADROOM;
use crate::transport::{ConnHandle, TimerHandle};

/// Longest characteristic write carried by an event.
pub const MAX_WRITE_LEN: usize = 4;

/// Why a stack timeout fired.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum TimeoutReason {
    Advertising,
    GattProcedure,
    /// A timer armed by the application through `start_timer`.
    GenericApp,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct TimeoutParam {
    pub reason: TimeoutReason,
    /// Set for application timers only.
    pub timer: Option<TimerHandle>,
}

/// Generic, GAP and timer events from the stack.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum StackEvent {
    /// Stack initialised and ready for commands.
    StackOn,
    HardwareError,
    StackShutdownComplete,
    /// Advertising started or stopped; query the state for which.
    AdvertisementStartStop,
    DeviceConnected { handle: ConnHandle },
    /// May arrive before the stack has updated the connection state.
    DeviceDisconnected { handle: ConnHandle },
    Timeout(TimeoutParam),
}

/// Characteristics of the Immediate Alert Service.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum IasCharacteristic {
    AlertLevel,
}

/// Immediate Alert Service events.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum IasEvent {
    /// Write-without-response from the central.
    WriteCommand {
        characteristic: IasCharacteristic,
        value: Vec<u8, MAX_WRITE_LEN>,
    },
}

impl IasEvent {
    /// Alert Level write carrying a single byte.
    pub fn alert_level_write(level: u8) -> Self {
        let mut value = Vec::new();
        // Capacity is never zero.
        let _ = value.push(level);
        IasEvent::WriteCommand {
            characteristic: IasCharacteristic::AlertLevel,
            value,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum BleEvent {
    Stack(StackEvent),
    Ias(IasEvent),
}

impl From<StackEvent> for BleEvent {
    fn from(e: StackEvent) -> Self {
        BleEvent::Stack(e)
    }
}

impl From<IasEvent> for BleEvent {
    fn from(e: IasEvent) -> Self {
        BleEvent::Ias(e)
    }
}

/// Holding slot for Alert Level writes that must not take the last free
/// event-queue slots.
///
/// Once a write is parked here every later write overwrites it until the
/// consumer takes it, so the queue never carries a write older than the
/// parked one and only the latest value survives a burst.
pub struct AlertWriteSlot {
    value: AtomicU16,
}

const SLOT_EMPTY: u16 = u16::MAX;

impl AlertWriteSlot {
    pub const fn new() -> Self {
        Self {
            value: AtomicU16::new(SLOT_EMPTY),
        }
    }

    pub fn is_pending(&self) -> bool {
        self.value.load(Ordering::SeqCst) != SLOT_EMPTY
    }

    /// Route a written byte. Returns the event to queue, or `None` when the
    /// write was parked because the queue is down to its headroom or an
    /// earlier write is already parked.
    pub fn offer(&self, level: u8, free_queue_slots: usize) -> Option<IasEvent> {
        if self.is_pending() || free_queue_slots <= EVENT_QUEUE_HEADROOM {
            self.value.store(u16::from(level), Ordering::SeqCst);
            return None;
        }
        Some(IasEvent::alert_level_write(level))
    }

    /// Take the parked write, if any.
    pub fn take(&self) -> Option<IasEvent> {
        match self.value.swap(SLOT_EMPTY, Ordering::SeqCst) {
            SLOT_EMPTY => None,
            // Only `offer` stores, always from a `u8`.
            v => Some(IasEvent::alert_level_write(v as u8)),
        }
    }
}

impl Default for AlertWriteSlot {
    fn default() -> Self {
        Self::new()
    }
}

/// Receiver of stack events, one method per event category.
pub trait EventSink {
    fn on_stack_event(&mut self, event: StackEvent);

    fn on_ias_event(&mut self, event: IasEvent);

    fn dispatch(&mut self, event: BleEvent) {
        match event {
            BleEvent::Stack(e) => self.on_stack_event(e),
            BleEvent::Ias(e) => self.on_ias_event(e),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn writes_with_room_go_straight_to_the_queue() {
        let slot = AlertWriteSlot::new();
        assert_eq!(
            slot.offer(2, EVENT_QUEUE_HEADROOM + 1),
            Some(IasEvent::alert_level_write(2))
        );
        assert!(!slot.is_pending());
        assert_eq!(slot.take(), None);
    }

    #[test]
    fn burst_at_headroom_keeps_only_latest_write() {
        let slot = AlertWriteSlot::new();
        assert_eq!(slot.offer(1, EVENT_QUEUE_HEADROOM), None);
        assert_eq!(slot.offer(0, 0), None);
        assert_eq!(slot.offer(2, EVENT_QUEUE_HEADROOM), None);

        assert_eq!(slot.take(), Some(IasEvent::alert_level_write(2)));
        assert_eq!(slot.take(), None);
    }

    #[test]
    fn parked_write_holds_later_writes_back_until_taken() {
        let slot = AlertWriteSlot::new();
        assert_eq!(slot.offer(1, 0), None);

        // Room again, but queuing now would overtake the parked value.
        assert_eq!(slot.offer(0, 16), None);
        assert_eq!(slot.take(), Some(IasEvent::alert_level_write(0)));

        assert_eq!(slot.offer(2, 16), Some(IasEvent::alert_level_write(2)));
    }

    #[test]
    fn reserved_bytes_survive_the_slot() {
        let slot = AlertWriteSlot::new();
        slot.offer(0xFF, 0);
        assert_eq!(slot.take(), Some(IasEvent::alert_level_write(0xFF)));
    }
}
