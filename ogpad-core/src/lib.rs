//! Platform-agnostic input acquisition and report assembly for the
//! Open Game Pad.
//!
//! This crate provides the core of the pad without any chip-specific
//! dependencies. It can be used both in embedded `no_std` environments and
//! on host for testing.
//!
//! # Overview
//!
//! - [`report`]: the input [`Report`], its wire layouts and HID descriptors
//! - [`mux`]: the analog/digital [`MuxCounter`]
//! - [`acquire`]: the conversion-complete tick handler ([`Acquisition`])
//! - [`store`]: the shared report cell ([`ReportStore`])
//! - [`hid`]: HID class request handling ([`HidAdapter`])
//! - [`output`]: transport sink trait ([`OutputSink`])
//! - [`service`]: foreground loop ([`Foreground`], [`Watchdog`])
//! - [`descriptor`]: a small HID report descriptor parser
//!
//! # Data flow
//!
//! ```text
//! ADC irq -> Acquisition -> ReportStore -> Foreground -> OutputSink (USB)
//!                                     \-> HidAdapter  (GET_REPORT)
//! ```
//!
//! Every tick toggles the clock line that shifts the button chain and steps
//! the external analog multiplexer, stores one axis sample, samples one
//! serial bit, and starts the next conversion. When a whole chain has been
//! clocked in, the bits are folded into the button mask.
//!
//! # Example
//!
//! ```rust
//! use ogpad_core::{HidAdapter, ClassRequest, ReportLayout, ReportStore};
//!
//! static STORE: ReportStore = ReportStore::new();
//!
//! let hid = HidAdapter::new(&STORE, ReportLayout::Buttons18);
//! let mut buf = [0u8; 8];
//! assert_eq!(hid.handle(ClassRequest::GetReport, &mut buf), 7);
//! ```
//!
//! # Features
//!
//! - **`std`**: Enable standard library support (for host testing)
//! - **`defmt`**: Enable defmt formatting (for embedded logging)

#![cfg_attr(not(feature = "std"), no_std)]

#[cfg(feature = "std")]
extern crate std;

pub mod acquire;
pub mod descriptor;
pub mod hid;
pub mod mux;
pub mod output;
pub mod report;
pub mod service;
pub mod store;

// Re-export main types at crate root
pub use acquire::{Acquisition, AnalogConverter, PendingBits, ShiftLines};
pub use descriptor::{DescriptorError, Field, Fields};
pub use hid::{
    idle_ms_from_rate, idle_rate_from_ms, ClassRequest, HidAdapter, IDLE_INDEFINITE_MS, IDLE_UNIT_MS,
};
pub use mux::{Advance, MuxCounter};
pub use output::{OutputError, OutputSink};
pub use report::{axis_from_raw, Axis, Report, ReportLayout, AXIS_COUNT, MAX_REPORT_LEN};
pub use service::{Foreground, Serviced, Watchdog};
pub use store::ReportStore;
