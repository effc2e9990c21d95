//! Acquisition engine: the conversion-complete tick handler.
//!
//! Every tick does, in order:
//!
//! 1. toggle the clock line (shifts the PISO chain and steps the analog mux),
//! 2. store the finished conversion into `axes[analog_index]`,
//! 3. sample the serial line into the pending bitstream at `digital_index`,
//! 4. start the next conversion,
//! 5. advance the multiplex counter and, when the digital index wraps, fold
//!    the pending bitstream into the button state.
//!
//! Steps 2 through 5 run inside one critical section of the [`ReportStore`].

use embedded_hal::digital::{InputPin, StatefulOutputPin};

use crate::mux::MuxCounter;
use crate::report::{axis_from_raw, ReportLayout};
use crate::store::ReportStore;

/// ADC seam of the engine.
///
/// Implementations must not block: `read_high_byte` is only called after the
/// converter signalled completion.
pub trait AnalogConverter {
    /// Top 8 bits of the most recently completed conversion.
    fn read_high_byte(&mut self) -> u8;

    /// Launch the next conversion.
    fn start_conversion(&mut self);
}

/// Bits of the shift cycle in progress, most significant first.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct PendingBits {
    bits: u32,
}

impl PendingBits {
    #[must_use]
    pub const fn new() -> Self {
        Self { bits: 0 }
    }

    /// Record the bit sampled at `position` of a `len` bit cycle.
    ///
    /// The first bit clocked out of the chain is the highest button.
    #[inline]
    pub fn push(&mut self, position: u8, len: u8, high: bool) {
        if high && position < len && len <= 24 {
            self.bits |= 1 << (len - 1 - position);
        }
    }

    /// Cycle word collected so far, button *i* at bit *i*.
    #[inline]
    #[must_use]
    pub const fn word(&self) -> u32 {
        self.bits
    }

    /// Return the collected word and clear the accumulator.
    #[inline]
    pub fn take(&mut self) -> u32 {
        core::mem::take(&mut self.bits)
    }
}

/// The two digital lines the engine owns.
pub struct ShiftLines<C, S> {
    /// Bit-banged clock output.
    pub clock: C,
    /// Serial data output of the last shift register in the chain.
    pub serial: S,
}

/// Interrupt-context acquisition state machine.
///
/// Owns the clock pin, the serial pin and the converter exclusively. The
/// engine never blocks and starts the next conversion on every path through
/// [`Acquisition::on_conversion_complete`].
pub struct Acquisition<'a, C, S, A> {
    lines: ShiftLines<C, S>,
    adc: A,
    mux: MuxCounter,
    pending: PendingBits,
    pin_faults: u32,
    store: &'a ReportStore,
}

impl<'a, C, S, A> Acquisition<'a, C, S, A>
where
    C: StatefulOutputPin,
    S: InputPin,
    A: AnalogConverter,
{
    /// Create an engine writing into `store`, with a shift chain as long as
    /// the button count of `layout`.
    pub fn new(lines: ShiftLines<C, S>, adc: A, store: &'a ReportStore, layout: ReportLayout) -> Self {
        Self {
            lines,
            adc,
            mux: MuxCounter::new(layout.button_count()),
            pending: PendingBits::new(),
            pin_faults: 0,
            store,
        }
    }

    /// Launch the first conversion. Every later one is started by the tick.
    pub fn start(&mut self) {
        self.mux.reset();
        self.pending = PendingBits::new();
        self.adc.start_conversion();
    }

    /// Current multiplex position.
    #[inline]
    #[must_use]
    pub fn mux(&self) -> MuxCounter {
        self.mux
    }

    /// Bits collected so far in the current cycle.
    #[inline]
    #[must_use]
    pub fn pending(&self) -> PendingBits {
        self.pending
    }

    /// Clock and serial line errors seen so far (wrapping).
    ///
    /// A failed toggle skips that edge and a failed read samples as low;
    /// the tick itself always completes.
    #[inline]
    #[must_use]
    pub fn pin_faults(&self) -> u32 {
        self.pin_faults
    }

    /// Handle one conversion-complete event.
    pub fn on_conversion_complete(&mut self) {
        if self.lines.clock.toggle().is_err() {
            self.pin_faults = self.pin_faults.wrapping_add(1);
        }

        let Self {
            lines,
            adc,
            mux,
            pending,
            pin_faults,
            store,
        } = self;

        store.update(|report| {
            let raw = adc.read_high_byte();
            report.axes[usize::from(mux.analog_index())] = axis_from_raw(raw);

            let high = lines.serial.is_high().unwrap_or_else(|_| {
                *pin_faults = pin_faults.wrapping_add(1);
                false
            });
            pending.push(mux.digital_index(), mux.digital_bits(), high);

            adc.start_conversion();

            if mux.advance().digital_wrapped {
                report.fold_buttons(pending.take(), mux.digital_bits());
            }
        });
    }

    /// Give back the owned hardware.
    pub fn release(self) -> (ShiftLines<C, S>, A) {
        (self.lines, self.adc)
    }
}

#[cfg(test)]
mod tests {
    extern crate std;

    use super::*;
    use crate::report::Report;
    use core::convert::Infallible;
    use std::collections::VecDeque;
    use std::sync::Arc;
    use std::vec::Vec;

    #[derive(Default)]
    struct MockClock {
        high: bool,
        toggles: usize,
    }

    impl embedded_hal::digital::ErrorType for MockClock {
        type Error = Infallible;
    }

    impl embedded_hal::digital::OutputPin for MockClock {
        fn set_low(&mut self) -> Result<(), Self::Error> {
            self.high = false;
            Ok(())
        }

        fn set_high(&mut self) -> Result<(), Self::Error> {
            self.high = true;
            Ok(())
        }
    }

    impl StatefulOutputPin for MockClock {
        fn is_set_high(&mut self) -> Result<bool, Self::Error> {
            Ok(self.high)
        }

        fn is_set_low(&mut self) -> Result<bool, Self::Error> {
            Ok(!self.high)
        }

        fn toggle(&mut self) -> Result<(), Self::Error> {
            self.high = !self.high;
            self.toggles += 1;
            Ok(())
        }
    }

    /// Serial line replaying a fixed bit pattern, repeated forever.
    struct MockSerial {
        bits: Vec<bool>,
        pos: usize,
    }

    impl MockSerial {
        fn repeating(bits: Vec<bool>) -> Self {
            Self { bits, pos: 0 }
        }
    }

    impl embedded_hal::digital::ErrorType for MockSerial {
        type Error = Infallible;
    }

    impl InputPin for MockSerial {
        fn is_high(&mut self) -> Result<bool, Self::Error> {
            let bit = self.bits[self.pos % self.bits.len()];
            self.pos += 1;
            Ok(bit)
        }

        fn is_low(&mut self) -> Result<bool, Self::Error> {
            self.is_high().map(|b| !b)
        }
    }

    /// Serial line that always fails.
    struct BrokenSerial;

    #[derive(Debug)]
    struct PinFault;

    impl embedded_hal::digital::Error for PinFault {
        fn kind(&self) -> embedded_hal::digital::ErrorKind {
            embedded_hal::digital::ErrorKind::Other
        }
    }

    impl embedded_hal::digital::ErrorType for BrokenSerial {
        type Error = PinFault;
    }

    impl InputPin for BrokenSerial {
        fn is_high(&mut self) -> Result<bool, Self::Error> {
            Err(PinFault)
        }

        fn is_low(&mut self) -> Result<bool, Self::Error> {
            Err(PinFault)
        }
    }

    #[derive(Default)]
    struct MockAdc {
        samples: VecDeque<u8>,
        started: usize,
    }

    impl MockAdc {
        fn with_samples(samples: &[u8]) -> Self {
            Self {
                samples: samples.iter().copied().collect(),
                started: 0,
            }
        }
    }

    impl AnalogConverter for MockAdc {
        fn read_high_byte(&mut self) -> u8 {
            self.samples.pop_front().unwrap_or(128)
        }

        fn start_conversion(&mut self) {
            self.started += 1;
        }
    }

    fn engine<'a, S: InputPin>(
        serial: S,
        adc: MockAdc,
        store: &'a ReportStore,
        layout: ReportLayout,
    ) -> Acquisition<'a, MockClock, S, MockAdc> {
        let lines = ShiftLines {
            clock: MockClock::default(),
            serial,
        };
        Acquisition::new(lines, adc, store, layout)
    }

    /// Serial pattern that clocks out `word` MSB first over `len` ticks.
    fn pattern(word: u32, len: u8) -> Vec<bool> {
        (0..len).rev().map(|bit| word & (1 << bit) != 0).collect()
    }

    #[test]
    fn test_pending_bits_msb_first() {
        let mut pending = PendingBits::new();
        pending.push(0, 8, true);
        pending.push(7, 8, true);
        assert_eq!(pending.word(), 0b1000_0001);
        assert_eq!(pending.take(), 0b1000_0001);
        assert_eq!(pending.word(), 0);
    }

    #[test]
    fn test_pending_bits_ignore_out_of_range() {
        let mut pending = PendingBits::new();
        pending.push(8, 8, true);
        pending.push(0, 25, true);
        assert_eq!(pending.word(), 0);
    }

    #[test]
    fn test_exactly_one_fold_per_cycle() {
        let store = ReportStore::new();
        let word = 0x2_8001;
        let serial = MockSerial::repeating(pattern(word, 18));
        let mut acq = engine(serial, MockAdc::default(), &store, ReportLayout::Buttons18);
        acq.start();

        for tick in 0..17 {
            acq.on_conversion_complete();
            assert_eq!(
                store.snapshot().button_word(),
                0,
                "fold happened early at tick {tick}"
            );
        }
        acq.on_conversion_complete();
        assert_eq!(store.snapshot().button_word(), word);
        assert_eq!(acq.pending().word(), 0);
        assert_eq!(acq.mux().digital_index(), 0);
    }

    #[test]
    fn test_fold_is_non_destructive() {
        // One 8-bit shift register: bits outside its window are kept.
        let store = ReportStore::new();
        store.update(|r| r.button_mask = 1 << 12);

        let word = (1 << 2) | (1 << 5) | (1 << 7);
        let lines = ShiftLines {
            clock: MockClock::default(),
            serial: MockSerial::repeating(pattern(word, 8)),
        };
        let mut acq = Acquisition {
            lines,
            adc: MockAdc::default(),
            mux: MuxCounter::new(8),
            pending: PendingBits::new(),
            pin_faults: 0,
            store: &store,
        };
        acq.start();
        for _ in 0..8 {
            acq.on_conversion_complete();
        }

        let mask = store.snapshot().button_mask;
        assert_eq!(mask & 0x00FF, word as u16);
        assert_eq!(mask, (1 << 12) | word as u16);
    }

    #[test]
    fn test_button_reflects_last_completed_cycle() {
        let store = ReportStore::new();
        let mut bits = pattern(0xFFFF, 16);
        bits.extend(pattern(0x0001, 16));
        let serial = MockSerial::repeating(bits);
        let mut acq = engine(serial, MockAdc::default(), &store, ReportLayout::Buttons16);
        acq.start();

        for _ in 0..16 {
            acq.on_conversion_complete();
        }
        assert_eq!(store.snapshot().button_mask, 0xFFFF);

        // Mid-cycle the old state is still reported
        for _ in 0..8 {
            acq.on_conversion_complete();
        }
        assert_eq!(store.snapshot().button_mask, 0xFFFF);

        for _ in 0..8 {
            acq.on_conversion_complete();
        }
        assert_eq!(store.snapshot().button_mask, 0x0001);
    }

    #[test]
    fn test_axes_follow_analog_index() {
        let store = ReportStore::new();
        let adc = MockAdc::with_samples(&[138, 108, 255, 0, 129]);
        let serial = MockSerial::repeating(std::vec![false]);
        let mut acq = engine(serial, adc, &store, ReportLayout::Buttons18);
        acq.start();

        for _ in 0..4 {
            acq.on_conversion_complete();
        }
        assert_eq!(acq.mux().analog_index(), 0);
        assert_eq!(store.snapshot().axes, [10, -20, 127, -127]);

        acq.on_conversion_complete();
        assert_eq!(store.snapshot().axes, [1, -20, 127, -127]);
    }

    #[test]
    fn test_axes_independent_of_digital_phase() {
        // 18-bit chain: after one full cycle the analog index sits at 2,
        // and the next four samples still land in slots 2, 3, 0, 1.
        let store = ReportStore::new();
        let mut samples = std::vec![128u8; 18];
        samples.extend([148, 158, 168, 178]);
        let adc = MockAdc::with_samples(&samples);
        let serial = MockSerial::repeating(std::vec![true]);
        let mut acq = engine(serial, adc, &store, ReportLayout::Buttons18);
        acq.start();

        for _ in 0..18 {
            acq.on_conversion_complete();
        }
        assert_eq!(acq.mux().analog_index(), 2);
        assert_eq!(acq.mux().digital_index(), 0);

        for _ in 0..4 {
            acq.on_conversion_complete();
        }
        assert_eq!(store.snapshot().axes, [40, 50, 20, 30]);
    }

    #[test]
    fn test_every_tick_restarts_conversion_and_toggles_clock() {
        let store = ReportStore::new();
        let mut acq = engine(BrokenSerial, MockAdc::default(), &store, ReportLayout::Buttons16);
        acq.start();
        for _ in 0..40 {
            acq.on_conversion_complete();
        }

        // Broken serial line samples as released
        assert_eq!(store.snapshot().button_mask, 0);
        assert_eq!(acq.pin_faults(), 40);

        let (lines, adc) = acq.release();
        assert_eq!(adc.started, 41);
        assert_eq!(lines.clock.toggles, 40);
    }

    #[test]
    fn test_healthy_lines_report_no_faults() {
        let store = ReportStore::new();
        let serial = MockSerial::repeating(pattern(0b1010, 4));
        let mut acq = engine(serial, MockAdc::default(), &store, ReportLayout::Buttons18);
        acq.start();
        for _ in 0..36 {
            acq.on_conversion_complete();
        }
        assert_eq!(acq.pin_faults(), 0);
    }

    #[test]
    fn test_start_resets_cycle() {
        let store = ReportStore::new();
        let serial = MockSerial::repeating(std::vec![true]);
        let mut acq = engine(serial, MockAdc::default(), &store, ReportLayout::Buttons16);
        acq.start();
        for _ in 0..5 {
            acq.on_conversion_complete();
        }
        acq.start();
        assert_eq!(acq.mux().digital_index(), 0);
        assert_eq!(acq.pending().word(), 0);
    }

    #[test]
    fn test_snapshots_only_see_tick_boundaries() {
        use std::collections::HashSet;
        use std::sync::atomic::{AtomicBool, Ordering};
        use std::sync::Mutex as StdMutex;
        use std::thread;

        const TICKS: usize = 20_000;

        let store = Arc::new(ReportStore::new());
        let boundaries = Arc::new(StdMutex::new(Vec::<Report>::new()));
        let done = Arc::new(AtomicBool::new(false));

        let writer = {
            let store = Arc::clone(&store);
            let boundaries = Arc::clone(&boundaries);
            let done = Arc::clone(&done);
            thread::spawn(move || {
                let samples: Vec<u8> = (0..TICKS).map(|i| (i % 251) as u8).collect();
                let serial = MockSerial::repeating(pattern(0x1_2345, 18));
                let mut acq = engine(
                    serial,
                    MockAdc::with_samples(&samples),
                    &store,
                    ReportLayout::Buttons18,
                );
                acq.start();

                let mut seen = Vec::with_capacity(TICKS + 1);
                seen.push(store.snapshot());
                for _ in 0..TICKS {
                    acq.on_conversion_complete();
                    seen.push(store.snapshot());
                }
                boundaries.lock().unwrap().extend(seen);
                done.store(true, Ordering::SeqCst);
            })
        };

        let mut observed = Vec::new();
        while !done.load(Ordering::SeqCst) {
            let snap = store.snapshot();
            if observed.len() < 100_000 {
                observed.push(snap);
            }
        }
        writer.join().unwrap();

        let boundaries: HashSet<Report> = boundaries.lock().unwrap().iter().copied().collect();
        for snap in &observed {
            assert!(
                boundaries.contains(snap),
                "snapshot {snap:?} never existed at a tick boundary"
            );
        }
    }
}
