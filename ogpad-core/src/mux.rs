//! Multiplex counter: which analog channel and which shift-chain bit the
//! next conversion tick belongs to.

use crate::report::AXIS_COUNT;

/// Result of advancing the counter by one tick.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[must_use]
pub struct Advance {
    /// The analog index went from the last channel back to 0.
    pub analog_wrapped: bool,
    /// The digital index went from the last bit back to 0. This is the
    /// decode point of the shift cycle.
    pub digital_wrapped: bool,
}

/// Two independent bounded counters.
///
/// `analog` walks the four axis slots, `digital` walks the bit positions of
/// the shift chain. Each wraps at its own bound, so the phase between them
/// drifts whenever the chain length is not a multiple of four.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct MuxCounter {
    analog: u8,
    digital: u8,
    digital_bits: u8,
}

impl MuxCounter {
    /// Number of analog slots.
    pub const ANALOG_CHANNELS: u8 = AXIS_COUNT as u8;

    /// Create a counter at position zero for a chain of `digital_bits` bits.
    ///
    /// A zero-length chain is treated as one bit so the counter always has a
    /// reachable decode point.
    #[must_use]
    pub const fn new(digital_bits: u8) -> Self {
        Self {
            analog: 0,
            digital: 0,
            digital_bits: if digital_bits == 0 { 1 } else { digital_bits },
        }
    }

    #[inline]
    #[must_use]
    pub const fn analog_index(&self) -> u8 {
        self.analog
    }

    #[inline]
    #[must_use]
    pub const fn digital_index(&self) -> u8 {
        self.digital
    }

    /// Length of one shift cycle in ticks.
    #[inline]
    #[must_use]
    pub const fn digital_bits(&self) -> u8 {
        self.digital_bits
    }

    /// Step both counters by one tick.
    pub fn advance(&mut self) -> Advance {
        self.analog += 1;
        let analog_wrapped = self.analog >= Self::ANALOG_CHANNELS;
        if analog_wrapped {
            self.analog = 0;
        }

        self.digital += 1;
        let digital_wrapped = self.digital >= self.digital_bits;
        if digital_wrapped {
            self.digital = 0;
        }

        Advance {
            analog_wrapped,
            digital_wrapped,
        }
    }

    /// Return both counters to zero.
    pub fn reset(&mut self) {
        self.analog = 0;
        self.digital = 0;
    }
}
