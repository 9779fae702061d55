//! One-shot application timer.
//!
//! The transport arms the timer through [`TIMER_ARM`]; on expiry the task
//! publishes a generic application timeout carrying the timer's handle.
//! An armed timer cannot be cancelled.

use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use embassy_sync::signal::Signal;
use embassy_time::Timer;
use findme::events::{StackEvent, TimeoutParam, TimeoutReason};
use findme::transport::TimerHandle;

use super::publish;

/// Arm request: which timer, and its period in seconds.
pub static TIMER_ARM: Signal<CriticalSectionRawMutex, (TimerHandle, u16)> = Signal::new();

#[embassy_executor::task]
pub async fn timer_task() -> ! {
    loop {
        let (timer, period_secs) = TIMER_ARM.wait().await;
        Timer::after_secs(period_secs.into()).await;
        publish(StackEvent::Timeout(TimeoutParam {
            reason: TimeoutReason::GenericApp,
            timer: Some(timer),
        }))
        .await;
    }
}
