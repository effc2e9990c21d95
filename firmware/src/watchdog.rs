//! Hardware watchdog behind the core [`Watchdog`] trait.

use embassy_rp::watchdog::Watchdog as RpWatchdog;
use ogpad_core::Watchdog;

use crate::config::WATCHDOG_PERIOD;

/// RP2040 watchdog, armed on construction.
///
/// If it is not fed within [`WATCHDOG_PERIOD`] the chip resets.
pub struct HwWatchdog {
    inner: RpWatchdog,
}

impl HwWatchdog {
    /// Arm the watchdog. From here on the caller must feed it.
    pub fn start(mut inner: RpWatchdog) -> Self {
        inner.start(WATCHDOG_PERIOD);
        Self { inner }
    }
}

impl Watchdog for HwWatchdog {
    #[inline]
    fn feed(&mut self) {
        self.inner.feed();
    }
}
