//! Acquisition glue: owns the engine and runs it from the ADC interrupt.
//!
//! The engine lives in [`ACQUISITION`] and is only mutated by [`install`]
//! (once, before the interrupt is unmasked) and by [`on_adc_irq`].
//! [`pin_faults`] reads it from the foreground.

mod adc;

use core::cell::RefCell;

use embassy_rp::gpio::{Input, Output};
use embassy_rp::interrupt::{self, InterruptExt, Priority};
use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use embassy_sync::blocking_mutex::Mutex;
use ogpad_core::Acquisition;

pub use adc::RpConverter;

/// The engine with this board's pins and converter.
pub type PadAcquisition = Acquisition<'static, Output<'static>, Input<'static>, RpConverter<'static>>;

static ACQUISITION: Mutex<CriticalSectionRawMutex, RefCell<Option<PadAcquisition>>> =
    Mutex::new(RefCell::new(None));

/// Hand the engine to interrupt context and start acquiring.
pub fn install(acquisition: PadAcquisition) {
    ACQUISITION.lock(|cell| {
        let mut slot = cell.borrow_mut();
        slot.insert(acquisition).start();
    });

    interrupt::ADC_IRQ_FIFO.unpend();
    interrupt::ADC_IRQ_FIFO.set_priority(Priority::P1);
    // SAFETY: The engine is installed, so the handler has something to run
    // and will drain the FIFO on every entry.
    unsafe { interrupt::ADC_IRQ_FIFO.enable() };
}

/// Pin faults counted by the engine, 0 before [`install`].
pub fn pin_faults() -> u32 {
    ACQUISITION.lock(|cell| cell.borrow().as_ref().map_or(0, |acq| acq.pin_faults()))
}

/// Body of the `ADC_IRQ_FIFO` handler: one engine tick.
#[inline]
pub fn on_adc_irq() {
    ACQUISITION.lock(|cell| {
        if let Some(acquisition) = cell.borrow_mut().as_mut() {
            acquisition.on_conversion_complete();
        }
    });
}
