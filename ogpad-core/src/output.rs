//! Output sink trait and error types.

use core::future::Future;

/// Error type for output operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum OutputError {
    /// USB/communication I/O error.
    Io,
    /// Device not ready (e.g., USB not configured).
    NotReady,
    /// Endpoint did not accept the report in time.
    Busy,
}

/// Async trait for report sinks.
///
/// Abstracts the USB transmit path so the foreground loop can be driven
/// against a mock on the host.
///
/// # `no_std` Compatibility
///
/// All implementations must be `#![no_std]` compatible with no heap allocation.
pub trait OutputSink {
    /// Send one serialized report. `report` is always exactly one report
    /// long.
    ///
    /// Implementations must complete in bounded time.
    fn send(&mut self, report: &[u8]) -> impl Future<Output = Result<(), OutputError>>;

    /// Check if the transport can accept a report now.
    fn is_ready(&self) -> bool;
}
