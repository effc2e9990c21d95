//! Shared report cell between the acquisition interrupt and the foreground.

use core::cell::Cell;

use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use embassy_sync::blocking_mutex::Mutex;

use crate::report::Report;

/// Single-producer, single-consumer report cell.
///
/// The acquisition engine is the only writer and does all writes of one tick
/// inside a single critical section. Readers copy the whole report inside a
/// critical section as well, so a snapshot always equals the state at some
/// tick boundary and never mixes a half-updated tick with a stale mask.
///
/// On a single-core target the critical section masks interrupts for the
/// duration of one `Report` copy.
pub struct ReportStore {
    report: Mutex<CriticalSectionRawMutex, Cell<Report>>,
}

impl ReportStore {
    /// Create a store holding a neutral report. Usable in a `static`.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            report: Mutex::new(Cell::new(Report::neutral())),
        }
    }

    /// Copy the current report.
    #[must_use]
    pub fn snapshot(&self) -> Report {
        self.report.lock(Cell::get)
    }

    /// Mutate the report in place within one critical section.
    pub(crate) fn update<R>(&self, f: impl FnOnce(&mut Report) -> R) -> R {
        self.report.lock(|cell| {
            let mut report = cell.get();
            let ret = f(&mut report);
            cell.set(report);
            ret
        })
    }
}

impl Default for ReportStore {
    fn default() -> Self {
        Self::new()
    }
}
