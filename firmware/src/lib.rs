//! Open Game Pad firmware for RP2040.
//!
//! Reads a chain of PISO shift registers and four multiplexed analog stick
//! axes through one ADC channel, and presents them as a USB HID game pad.
//!
//! # Architecture
//!
//! Two actors share one [`ReportStore`]:
//!
//! - **ADC interrupt** (`ADC_IRQ_FIFO`): runs one tick of the
//!   [`Acquisition`](ogpad_core::Acquisition) engine per conversion, see
//!   [`input`].
//! - **Foreground loop**: a [`Foreground`](ogpad_core::Foreground) on the
//!   thread-mode executor that hands snapshots to the HID writer and feeds
//!   the [`watchdog`].
//!
//! The embassy USB device task runs next to the foreground loop and answers
//! control requests through [`PadRequestHandler`].
//!
//! # Modules
//!
//! - [`config`]: pins, rates and USB identity
//! - [`input`]: ADC converter and interrupt glue ([`RpConverter`])
//! - [`output`]: USB HID output ([`UsbHidOutput`], [`PadRequestHandler`])
//! - [`watchdog`]: hardware watchdog ([`HwWatchdog`])
//!
//! # Features
//!
//! - **`dev-panic`** (default): Use `panic-probe` for development (prints panic info via RTT)
//! - **`prod-panic`**: Use `panic-reset` for production (silent watchdog reset)
//! - **`buttons-18`** (default): 18 button report, 7 bytes
//! - **`buttons-16`**: 16 button report, 6 bytes
//!
//! # Re-exports
//!
//! This crate re-exports the public items of [`ogpad_core`] it builds on.

#![no_std]

// Ensure mutually exclusive report layouts
#[cfg(all(feature = "buttons-16", feature = "buttons-18"))]
compile_error!("Cannot enable both `buttons-16` and `buttons-18` features - they define conflicting HID descriptors");

// Re-export core types for convenience
pub use ogpad_core::{
    Acquisition, ClassRequest, Foreground, HidAdapter, OutputError, OutputSink, Report,
    ReportLayout, ReportStore, ShiftLines, Watchdog,
};

pub mod config;
pub mod input;
pub mod output;
pub mod watchdog;

pub use input::{install, on_adc_irq, pin_faults, PadAcquisition, RpConverter};
pub use output::{configure_usb_hid, LinkHandler, LinkState, PadRequestHandler, UsbHidOutput};
pub use watchdog::HwWatchdog;
