//! Loop event queue.
//!
//! Events are produced by:
//! - The temperature driver (a new validated reading is available)
//! - Timer callbacks (servo step cadence, alarm half-period, watchdog sweep)
//! - The presentation layer (manual override switched)
//! - The application core itself (servo motion completed)
//!
//! Events are consumed by the main loop, which hands them to
//! [`AppService::dispatch`](crate::app::service::AppService::dispatch)
//! one at a time in arrival order.
//!
//! ```text
//! ┌──────────────┐     ┌──────────────┐     ┌──────────────┐
//! │ Temp driver  │────▶│              │     │              │
//! │ Timers       │────▶│  Event Queue │────▶│  Main Loop   │
//! │ Display/UI   │────▶│  (lock-free) │     │  (consumer)  │
//! └──────────────┘     └──────────────┘     └──────────────┘
//! ```

use core::sync::atomic::{AtomicU8, Ordering};

/// Maximum number of pending events.
/// Power of 2 for efficient ring buffer modulo.
const EVENT_QUEUE_CAP: usize = 32;

/// Loop event types.  Bare signals: payloads are read from ports on dispatch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum Event {
    /// A new accepted temperature reading is available.
    SampleArrived   = 0,
    /// The servo reached its target.
    MotionComplete  = 1,
    /// 30 s sweep so an active watchdog is evaluated without new samples.
    PeriodicSweep   = 2,
    /// Servo stepping cadence.
    ServoStep       = 10,
    /// Alarm half-period.
    AlarmTick       = 11,
    /// The manual-override switch changed.
    OverrideChanged = 20,
}

impl Event {
    fn from_u8(raw: u8) -> Option<Self> {
        match raw {
            0  => Some(Self::SampleArrived),
            1  => Some(Self::MotionComplete),
            2  => Some(Self::PeriodicSweep),
            10 => Some(Self::ServoStep),
            11 => Some(Self::AlarmTick),
            20 => Some(Self::OverrideChanged),
            _  => None,
        }
    }
}

// ── Lock-free SPSC ring buffer ────────────────────────────────
//
// Timer / driver contexts write (produce), the main loop reads (consume).
// Slots are atomics themselves, so no `static mut` is needed.

static EVENT_HEAD: AtomicU8 = AtomicU8::new(0);
static EVENT_TAIL: AtomicU8 = AtomicU8::new(0);
static EVENT_BUFFER: [AtomicU8; EVENT_QUEUE_CAP] = [const { AtomicU8::new(0) }; EVENT_QUEUE_CAP];

/// Push an event into the queue.
/// Safe to call from a timer callback (lock-free).
/// Returns `false` if the queue is full (event dropped).
pub fn push_event(event: Event) -> bool {
    let head = EVENT_HEAD.load(Ordering::Relaxed);
    let tail = EVENT_TAIL.load(Ordering::Acquire);
    let next_head = (head + 1) % EVENT_QUEUE_CAP as u8;

    if next_head == tail {
        return false; // Queue full, drop event.
    }

    EVENT_BUFFER[head as usize].store(event as u8, Ordering::Relaxed);
    EVENT_HEAD.store(next_head, Ordering::Release);
    true
}

/// Pop the next event from the queue.
/// Called from the main loop (single consumer).
/// Returns `None` if the queue is empty.
pub fn pop_event() -> Option<Event> {
    let tail = EVENT_TAIL.load(Ordering::Relaxed);
    let head = EVENT_HEAD.load(Ordering::Acquire);

    if tail == head {
        return None; // Empty.
    }

    let raw = EVENT_BUFFER[tail as usize].load(Ordering::Relaxed);
    EVENT_TAIL.store((tail + 1) % EVENT_QUEUE_CAP as u8, Ordering::Release);

    Event::from_u8(raw)
}

/// Drain all pending events into a callback.
/// Processes events in FIFO order.
pub fn drain_events(mut handler: impl FnMut(Event)) {
    while let Some(event) = pop_event() {
        handler(event);
    }
}

/// Check if the event queue is empty.
pub fn queue_is_empty() -> bool {
    let tail = EVENT_TAIL.load(Ordering::Relaxed);
    let head = EVENT_HEAD.load(Ordering::Acquire);
    tail == head
}

/// Number of pending events.
pub fn queue_len() -> usize {
    let head = EVENT_HEAD.load(Ordering::Relaxed) as usize;
    let tail = EVENT_TAIL.load(Ordering::Relaxed) as usize;
    (head + EVENT_QUEUE_CAP - tail) % EVENT_QUEUE_CAP
}
