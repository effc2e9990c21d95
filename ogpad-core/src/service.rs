//! Foreground service loop: transport servicing and watchdog feeding.

use crate::output::{OutputError, OutputSink};
use crate::report::ReportLayout;
use crate::store::ReportStore;

/// Liveness watchdog. If it is not fed within its period the hardware
/// resets the device; that reset is the only failure path of the pad.
pub trait Watchdog {
    fn feed(&mut self);
}

/// Outcome of one transport servicing step.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Serviced {
    /// A report of this many bytes was handed to the transport.
    Sent(usize),
    /// The transport was not ready; nothing was sent.
    NotReady,
}

/// The foreground half of the pad.
///
/// Each iteration services the transport and then feeds the watchdog. The
/// watchdog is fed whatever the transport did, so only a stalled loop (or a
/// stalled acquisition that wedges it) leads to a reset.
pub struct Foreground<'a, W, S> {
    store: &'a ReportStore,
    layout: ReportLayout,
    watchdog: W,
    sink: S,
}

impl<'a, W: Watchdog, S: OutputSink> Foreground<'a, W, S> {
    pub fn new(store: &'a ReportStore, layout: ReportLayout, watchdog: W, sink: S) -> Self {
        Self {
            store,
            layout,
            watchdog,
            sink,
        }
    }

    /// One loop iteration: service the transport, then feed the watchdog.
    pub async fn poll_once(&mut self) -> Result<Serviced, OutputError> {
        let result = self.service_transport().await;
        self.feed_watchdog();
        result
    }

    /// Hand the current snapshot to the transport if it is ready.
    pub async fn service_transport(&mut self) -> Result<Serviced, OutputError> {
        if !self.sink.is_ready() {
            return Ok(Serviced::NotReady);
        }

        let report = self.store.snapshot();
        let (buf, len) = self.layout.to_bytes(&report);
        self.sink.send(&buf[..len]).await?;
        Ok(Serviced::Sent(len))
    }

    #[inline]
    pub fn feed_watchdog(&mut self) {
        self.watchdog.feed();
    }

    /// Get a reference to the output sink.
    pub fn sink(&self) -> &S {
        &self.sink
    }

    /// Get a mutable reference to the output sink.
    pub fn sink_mut(&mut self) -> &mut S {
        &mut self.sink
    }

    /// Get a reference to the watchdog.
    pub fn watchdog(&self) -> &W {
        &self.watchdog
    }
}
