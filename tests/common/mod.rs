//! Host fakes for the transport and indicator ports.

#![allow(dead_code)]

use std::cell::RefCell;
use std::collections::VecDeque;
use std::rc::Rc;

use findme::error::TransportError;
use findme::events::{BleEvent, StackEvent, TimeoutParam, TimeoutReason};
use findme::indicator::{Indicators, Level, Signal};
use findme::transport::{
    AdvertisementState, AdvertisingMode, BleTransport, ConnHandle, ConnectionState, StackVersion,
    TimerHandle,
};
use findme::{FindMe, PowerControl};

pub const TICK_TIMER: TimerHandle = TimerHandle(7);
pub const CONN: ConnHandle = ConnHandle(3);

/// Transport command recorded by [`FakeTransport`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Call {
    Enable,
    StartAdvertising(AdvertisingMode, u8),
    Disable,
    CreateTimer(u16),
    StartTimer(TimerHandle),
}

/// Scripted stack: events are queued by the test, state is set directly,
/// commands are recorded.
pub struct FakeTransport {
    pub events: VecDeque<BleEvent>,
    /// Events delivered by [`FakePower`] on wakeup, popped after `events`.
    pub inbox: Inbox,
    pub calls: Vec<Call>,
    pub advertising: AdvertisementState,
    pub connection: ConnectionState,
    pub connections: u8,
    pub enable_error: Option<TransportError>,
    pub version_error: Option<TransportError>,
    pub advertising_error: Option<TransportError>,
    pub timer_error: Option<TransportError>,
}

impl FakeTransport {
    pub fn new() -> Self {
        Self {
            events: VecDeque::new(),
            inbox: Inbox::default(),
            calls: Vec::new(),
            advertising: AdvertisementState::Stopped,
            connection: ConnectionState::Idle,
            connections: 0,
            enable_error: None,
            version_error: None,
            advertising_error: None,
            timer_error: None,
        }
    }

    pub fn push(&mut self, event: impl Into<BleEvent>) {
        self.events.push_back(event.into());
    }

    pub fn count(&self, call: Call) -> usize {
        self.calls.iter().filter(|&&c| c == call).count()
    }

    pub fn advertising_starts(&self) -> usize {
        self.calls
            .iter()
            .filter(|c| matches!(c, Call::StartAdvertising(..)))
            .count()
    }

    pub fn timer_arms(&self) -> usize {
        self.count(Call::StartTimer(TICK_TIMER))
    }
}

impl BleTransport for FakeTransport {
    fn enable(&mut self) -> Result<(), TransportError> {
        self.calls.push(Call::Enable);
        self.enable_error.map_or(Ok(()), Err)
    }

    fn stack_version(&self) -> Result<StackVersion, TransportError> {
        match self.version_error {
            Some(e) => Err(e),
            None => Ok(StackVersion {
                link_layer: 12,
                company_id: 0x0059,
                firmware_id: 0x0123,
            }),
        }
    }

    fn start_advertising(
        &mut self,
        mode: AdvertisingMode,
        config_index: u8,
    ) -> Result<(), TransportError> {
        self.calls.push(Call::StartAdvertising(mode, config_index));
        if let Some(e) = self.advertising_error {
            return Err(e);
        }
        self.advertising = AdvertisementState::Advertising;
        Ok(())
    }

    fn disable(&mut self) {
        self.calls.push(Call::Disable);
    }

    fn advertisement_state(&self) -> AdvertisementState {
        self.advertising
    }

    fn connection_state(&self, _handle: ConnHandle) -> ConnectionState {
        self.connection
    }

    fn active_connection_count(&self) -> u8 {
        self.connections
    }

    fn create_timer(&mut self, period_secs: u16) -> Result<TimerHandle, TransportError> {
        self.calls.push(Call::CreateTimer(period_secs));
        Ok(TICK_TIMER)
    }

    fn start_timer(&mut self, timer: TimerHandle) -> Result<(), TransportError> {
        self.calls.push(Call::StartTimer(timer));
        self.timer_error.map_or(Ok(()), Err)
    }

    fn pop_event(&mut self) -> Option<BleEvent> {
        self.events
            .pop_front()
            .or_else(|| self.inbox.borrow_mut().pop_front())
    }
}

pub type Inbox = Rc<RefCell<VecDeque<BleEvent>>>;

/// Power port that delivers one scripted batch of events per wakeup.
///
/// The terminal modes panic with a message naming the mode and the number
/// of wakeups before it, so tests observe them with `#[should_panic]`.
pub struct FakePower {
    inbox: Inbox,
    wakeups: VecDeque<Vec<BleEvent>>,
    pub waits: usize,
}

impl FakePower {
    pub fn new(inbox: Inbox) -> Self {
        Self {
            inbox,
            wakeups: VecDeque::new(),
            waits: 0,
        }
    }

    pub fn then(mut self, events: impl IntoIterator<Item = BleEvent>) -> Self {
        self.wakeups.push_back(events.into_iter().collect());
        self
    }
}

impl PowerControl for FakePower {
    async fn wait_for_event(&mut self) {
        self.waits += 1;
        let Some(batch) = self.wakeups.pop_front() else {
            panic!("idle after {} waits", self.waits - 1);
        };
        self.inbox.borrow_mut().extend(batch);
    }

    fn enter_hibernate(&mut self) -> ! {
        panic!("hibernate after {} waits", self.waits);
    }

    fn halt(&mut self) -> ! {
        panic!("halt after {} waits", self.waits);
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Op {
    Set(Signal, Level),
    Toggle(Signal),
}

/// Tracks both LED levels and every write made to them.
pub struct RecordingIndicators {
    pub connection: Level,
    pub alert: Level,
    pub ops: Vec<Op>,
}

impl RecordingIndicators {
    pub fn new() -> Self {
        Self {
            connection: Level::Off,
            alert: Level::Off,
            ops: Vec::new(),
        }
    }

    fn slot(&mut self, signal: Signal) -> &mut Level {
        match signal {
            Signal::Connection => &mut self.connection,
            Signal::Alert => &mut self.alert,
        }
    }

    pub fn ops_on(&self, signal: Signal) -> Vec<Op> {
        self.ops
            .iter()
            .copied()
            .filter(|op| matches!(op, Op::Set(s, _) | Op::Toggle(s) if *s == signal))
            .collect()
    }
}

impl Indicators for RecordingIndicators {
    fn set(&mut self, signal: Signal, level: Level) {
        self.ops.push(Op::Set(signal, level));
        *self.slot(signal) = level;
    }

    fn toggle(&mut self, signal: Signal) {
        self.ops.push(Op::Toggle(signal));
        let slot = self.slot(signal);
        *slot = match *slot {
            Level::Off => Level::On,
            Level::On => Level::Off,
        };
    }
}

pub type App = FindMe<FakeTransport, RecordingIndicators>;

/// Initialised app with the call and write logs cleared.
pub fn started() -> App {
    let mut app = FindMe::new(FakeTransport::new(), RecordingIndicators::new());
    app.init().expect("init");
    app.transport_mut().calls.clear();
    app.indicators_mut().ops.clear();
    app
}

/// App past stack-on and the first iteration: advertising, tick armed.
pub fn advertising() -> App {
    let mut app = started();
    app.transport_mut().push(StackEvent::StackOn);
    app.poll();
    app.transport_mut().calls.clear();
    app.indicators_mut().ops.clear();
    app
}

/// App with one central connected and advertising stopped.
pub fn connected() -> App {
    let mut app = advertising();
    {
        let t = app.transport_mut();
        t.advertising = AdvertisementState::Stopped;
        t.connection = ConnectionState::Connected;
        t.connections = 1;
        t.push(StackEvent::DeviceConnected { handle: CONN });
        t.push(StackEvent::AdvertisementStartStop);
    }
    app.poll();
    app.transport_mut().calls.clear();
    app.indicators_mut().ops.clear();
    app
}

pub fn tick(timer: TimerHandle) -> StackEvent {
    StackEvent::Timeout(TimeoutParam {
        reason: TimeoutReason::GenericApp,
        timer: Some(timer),
    })
}
