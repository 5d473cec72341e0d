//! Configure serials
//!
//! Every configure sent to a client carries a serial the client echoes back
//! when it acknowledges. Serials are allocated per client connection and are
//! strictly increasing, so "has the client caught up to request N" is a plain
//! integer comparison.

use serde::{Deserialize, Serialize};

/// A configure serial. Never zero.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Serial(u32);

impl Serial {
    /// Wrap a raw serial received from a client. Zero is not a valid serial.
    pub fn from_raw(raw: u32) -> Option<Self> {
        (raw != 0).then_some(Self(raw))
    }

    /// Get the raw value
    pub fn get(self) -> u32 {
        self.0
    }
}

impl std::fmt::Display for Serial {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Serial allocator for one client connection
#[derive(Debug)]
pub struct SerialCounter {
    next: u32,
}

impl Default for SerialCounter {
    fn default() -> Self {
        Self::new()
    }
}

impl SerialCounter {
    pub fn new() -> Self {
        Self { next: 1 }
    }

    /// Allocate the next serial.
    ///
    /// Saturates at `u32::MAX` rather than wrapping back to issued values.
    pub fn next_serial(&mut self) -> Serial {
        let serial = Serial(self.next);
        self.next = self.next.saturating_add(1);
        serial
    }

    /// The most recently allocated serial, if any
    pub fn last(&self) -> Option<Serial> {
        Serial::from_raw(self.next - 1)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn counter_starts_at_one() {
        let mut counter = SerialCounter::new();
        assert_eq!(counter.last(), None);
        assert_eq!(counter.next_serial().get(), 1);
        assert_eq!(counter.last().map(Serial::get), Some(1));
    }

    #[test]
    fn serials_strictly_increase() {
        let mut counter = SerialCounter::new();
        let mut previous = counter.next_serial();
        for _ in 0..100 {
            let serial = counter.next_serial();
            assert!(serial > previous);
            previous = serial;
        }
    }

    #[test]
    fn zero_is_not_a_serial() {
        assert_eq!(Serial::from_raw(0), None);
        assert_eq!(Serial::from_raw(7).map(Serial::get), Some(7));
    }
}
