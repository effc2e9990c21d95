//! RP2040 ADC as the tick source of the acquisition engine.
//!
//! The ADC free-runs at [`ADC_SAMPLE_RATE_HZ`](crate::config::ADC_SAMPLE_RATE_HZ)
//! with the FIFO in byte mode, so every FIFO entry is already the top 8 bits
//! of a conversion. A FIFO level of one raises `ADC_IRQ_FIFO`, and the
//! handler runs one engine tick per entry.

use embassy_rp::adc::{Adc, Blocking, Channel};
use embassy_rp::pac;
use ogpad_core::AnalogConverter;

use crate::config::{ADC_CLOCK_HZ, ANALOG_CHANNEL};

/// Integer part of the ADC clock divider for `sample_rate_hz`.
///
/// A conversion takes 96 ADC clocks, which bounds the divider from below.
const fn clock_divider(sample_rate_hz: u32) -> u16 {
    let div = ADC_CLOCK_HZ / sample_rate_hz;
    if div < 96 {
        0
    } else if div - 1 > u16::MAX as u32 {
        u16::MAX
    } else {
        (div - 1) as u16
    }
}

/// Free-running single channel converter.
pub struct RpConverter<'d> {
    // Keeps the ADC block and the analog pad configured for our lifetime.
    _adc: Adc<'d, Blocking>,
    _channel: Channel<'d>,
}

impl<'d> RpConverter<'d> {
    /// Take over the enabled ADC and configure paced byte-wide conversions.
    ///
    /// Nothing is converted until [`AnalogConverter::start_conversion`].
    pub fn new(adc: Adc<'d, Blocking>, channel: Channel<'d>, sample_rate_hz: u32) -> Self {
        let r = pac::ADC;
        r.cs().modify(|w| {
            w.set_start_many(false);
            w.set_rrobin(0);
            w.set_ainsel(ANALOG_CHANNEL);
        });
        r.div().write(|w| {
            w.set_int(clock_divider(sample_rate_hz));
            w.set_frac(0);
        });
        r.fcs().write(|w| {
            w.set_en(true);
            w.set_shift(true);
            w.set_dreq_en(false);
            w.set_thresh(1);
        });
        r.inte().write(|w| w.set_fifo(true));

        Self {
            _adc: adc,
            _channel: channel,
        }
    }
}

impl AnalogConverter for RpConverter<'_> {
    #[inline]
    fn read_high_byte(&mut self) -> u8 {
        pac::ADC.fifo().read().val() as u8
    }

    /// Keep the paced conversions running; restarts them if anything
    /// cleared START_MANY.
    #[inline]
    fn start_conversion(&mut self) {
        pac::ADC.cs().modify(|w| w.set_start_many(true));
    }
}

