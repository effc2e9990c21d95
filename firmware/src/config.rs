//! Build-time configuration: pins, rates, USB identity.
//!
//! # Hardware Configuration
//!
//! | Function       | GPIO | Description |
//! |----------------|------|-------------|
//! | Clock out      | 2    | Shift-register clock, also steps the analog multiplexer |
//! | Serial in      | 3    | Serial data of the last shift register in the chain |
//! | Analog in      | 26   | ADC0, output of the analog multiplexer |

use embassy_time::Duration;
use ogpad_core::ReportLayout;

/// Report layout announced to the host.
#[cfg(not(feature = "buttons-16"))]
pub const LAYOUT: ReportLayout = ReportLayout::Buttons18;

/// Report layout announced to the host.
#[cfg(feature = "buttons-16")]
pub const LAYOUT: ReportLayout = ReportLayout::Buttons16;

/// ADC input channel wired to the multiplexer output (GPIO 26).
pub const ANALOG_CHANNEL: u8 = 0;

/// ADC clock (fixed by the RP2040 clock tree).
pub const ADC_CLOCK_HZ: u32 = 48_000_000;

/// Conversion rate, which is also the tick rate of the acquisition engine.
/// One 18 button cycle takes 18 ticks, so the buttons refresh at ~1.1 kHz.
pub const ADC_SAMPLE_RATE_HZ: u32 = 20_000;

/// Watchdog period. The foreground loop feeds it every iteration.
pub const WATCHDOG_PERIOD: Duration = Duration::from_millis(1000);

/// Upper bound for one interrupt endpoint write.
pub const WRITE_TIMEOUT: Duration = Duration::from_millis(20);

/// HID interrupt endpoint polling interval.
pub const POLL_MS: u8 = 1;

/// pid.codes test VID/PID.
pub const USB_VID: u16 = 0x1209;
pub const USB_PID: u16 = 0x0001;
pub const USB_MANUFACTURER: &str = "Open Game Pad";
pub const USB_PRODUCT: &str = "Open Game Pad";
pub const USB_SERIAL: &str = "001";
pub const USB_MAX_POWER_MA: u16 = 100;
