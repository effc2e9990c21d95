//! HID class request handling on top of the shared report.

use portable_atomic::{AtomicU8, Ordering};

use crate::report::ReportLayout;
use crate::store::ReportStore;

/// bRequest codes of the HID class requests the pad answers.
pub const HID_REQ_GET_REPORT: u8 = 0x01;
pub const HID_REQ_GET_IDLE: u8 = 0x02;
pub const HID_REQ_SET_IDLE: u8 = 0x0A;

/// Milliseconds per idle rate unit.
pub const IDLE_UNIT_MS: u32 = 4;

/// A decoded class request.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ClassRequest {
    GetReport,
    GetIdle,
    /// New idle rate in 4 ms units, 0 meaning "only on change".
    SetIdle(u8),
    /// Any other bRequest. Answered with an empty response.
    Other(u8),
}

impl ClassRequest {
    /// Decode a class request from its setup packet fields.
    #[must_use]
    pub const fn from_setup(b_request: u8, w_value: u16) -> Self {
        match b_request {
            HID_REQ_GET_REPORT => Self::GetReport,
            HID_REQ_GET_IDLE => Self::GetIdle,
            HID_REQ_SET_IDLE => Self::SetIdle((w_value >> 8) as u8),
            other => Self::Other(other),
        }
    }
}

/// Duration the USB stack uses for an indefinite idle period (rate 0).
pub const IDLE_INDEFINITE_MS: u32 = u32::MAX;

/// Idle rate in 4 ms units from a duration in milliseconds.
///
/// [`IDLE_INDEFINITE_MS`] maps back to rate 0; other durations saturate at
/// 255.
#[inline]
#[must_use]
pub const fn idle_rate_from_ms(ms: u32) -> u8 {
    if ms == IDLE_INDEFINITE_MS {
        return 0;
    }
    let units = ms / IDLE_UNIT_MS;
    if units > u8::MAX as u32 {
        u8::MAX
    } else {
        units as u8
    }
}

/// Duration in milliseconds of an idle rate. Rate 0 is reported as 0 ms.
#[inline]
#[must_use]
pub const fn idle_ms_from_rate(rate: u8) -> u32 {
    rate as u32 * IDLE_UNIT_MS
}

/// Transport adapter: answers class requests from local state.
///
/// The idle rate is stored for later GET_IDLE queries only. Periodic
/// retransmission is the USB stack's business.
pub struct HidAdapter<'a> {
    store: &'a ReportStore,
    layout: ReportLayout,
    idle_rate: AtomicU8,
}

impl<'a> HidAdapter<'a> {
    #[must_use]
    pub const fn new(store: &'a ReportStore, layout: ReportLayout) -> Self {
        Self {
            store,
            layout,
            idle_rate: AtomicU8::new(0),
        }
    }

    #[inline]
    #[must_use]
    pub const fn layout(&self) -> ReportLayout {
        self.layout
    }

    #[inline]
    #[must_use]
    pub fn idle_rate(&self) -> u8 {
        self.idle_rate.load(Ordering::Relaxed)
    }

    /// Answer `request`, writing any response into `buf`.
    ///
    /// Returns the response length. Zero means "nothing to send": either the
    /// request carries no data stage, is unsupported, or `buf` cannot hold
    /// the whole response.
    pub fn handle(&self, request: ClassRequest, buf: &mut [u8]) -> usize {
        match request {
            ClassRequest::GetReport => self.get_report(buf),
            ClassRequest::GetIdle => match buf.first_mut() {
                Some(byte) => {
                    *byte = self.idle_rate();
                    1
                }
                None => 0,
            },
            ClassRequest::SetIdle(rate) => {
                self.idle_rate.store(rate, Ordering::Relaxed);
                0
            }
            ClassRequest::Other(_) => 0,
        }
    }

    /// Write the current report snapshot into `buf`.
    pub fn get_report(&self, buf: &mut [u8]) -> usize {
        let report = self.store.snapshot();
        self.layout.write(&report, buf).unwrap_or(0)
    }
}
