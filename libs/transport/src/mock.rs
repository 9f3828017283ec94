//! In-memory stand-ins for the serial driver and the clock.
//!
//! [`MockStream`] queues reception bytes as `i16` cells so tests can place a
//! "gap" (any value outside 0..=255) in the middle of a packet: the stream
//! then reports nothing available without consuming the gap, which is exactly
//! how a stalled line looks to the transport and lets the timeout paths run
//! deterministically. Written bytes are captured for inspection.
//!
//! [`MockClock`] advances by a fixed step on every reading, so busy-wait
//! loops that poll it terminate without real time passing.

use core::cell::Cell;

use heapless::{Deque, Vec};

use crate::stream::{ByteStream, Clock};

/// A queued cell that does not look like a byte, used to model line stalls.
const GAP: i16 = -1;

/// Byte-stream double with an injectable reception queue and a transmission
/// capture buffer.
pub struct MockStream<const N: usize = 512> {
    rx: Deque<i16, N>,
    tx: Vec<u8, N>,
}

impl<const N: usize> MockStream<N> {
    pub const fn new() -> Self {
        Self { rx: Deque::new(), tx: Vec::new() }
    }

    /// Queues bytes for the transport to receive. Bytes past the queue
    /// capacity are dropped.
    pub fn feed(&mut self, bytes: &[u8]) {
        for &byte in bytes {
            let _ = self.rx.push_back(byte as i16);
        }
    }

    /// Queues a stall marker. Reads stop there until the queue is rebuilt,
    /// which the transport perceives as a silent line.
    pub fn feed_gap(&mut self) {
        let _ = self.rx.push_back(GAP);
    }

    /// Everything the transport has written so far.
    pub fn transmitted(&self) -> &[u8] {
        &self.tx
    }

    /// Clears the transmission capture, keeping queued reception bytes.
    pub fn clear_transmitted(&mut self) {
        self.tx.clear();
    }

    /// Drops all queued and captured bytes.
    pub fn reset(&mut self) {
        self.rx.clear();
        self.tx.clear();
    }
}

impl<const N: usize> Default for MockStream<N> {
    fn default() -> Self {
        Self::new()
    }
}

impl<const N: usize> ByteStream for MockStream<N> {
    fn available(&self) -> usize {
        self.rx.iter().take_while(|&&cell| (0..=255).contains(&cell)).count()
    }

    fn read_one(&mut self) -> Option<u8> {
        match self.rx.front() {
            Some(&cell) if (0..=255).contains(&cell) => {
                self.rx.pop_front();
                Some(cell as u8)
            }
            _ => None,
        }
    }

    fn peek(&self) -> Option<u8> {
        match self.rx.front() {
            Some(&cell) if (0..=255).contains(&cell) => Some(cell as u8),
            _ => None,
        }
    }

    fn write(&mut self, bytes: &[u8]) -> usize {
        let mut written = 0;
        for &byte in bytes {
            if self.tx.push(byte).is_err() {
                break;
            }
            written += 1;
        }
        written
    }
}

/// Deterministic clock that moves forward by `step` microseconds each time it
/// is read. Pass it to the transport by reference so the test keeps a handle:
///
/// ```
/// use bytelink_transport::mock::MockClock;
/// use bytelink_transport::Clock;
///
/// let clock = MockClock::with_step(100);
/// let first = (&clock).now_us();
/// assert!(clock.now_us() > first);
/// ```
pub struct MockClock {
    now: Cell<u64>,
    step: u64,
}

impl MockClock {
    pub const fn new() -> Self {
        Self::with_step(1)
    }

    pub const fn with_step(step: u64) -> Self {
        Self { now: Cell::new(0), step }
    }

    /// Jumps the clock forward, on top of the per-reading step.
    pub fn advance(&self, micros: u64) {
        self.now.set(self.now.get() + micros);
    }
}

impl Default for MockClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for MockClock {
    fn now_us(&self) -> u64 {
        let now = self.now.get();
        self.now.set(now + self.step);
        now
    }
}
