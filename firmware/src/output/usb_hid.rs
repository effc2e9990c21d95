//! USB HID game pad output implementation.

use defmt::{debug, info};
use embassy_rp::peripherals::USB;
use embassy_rp::usb::Driver;
use embassy_time::with_timeout;
use embassy_usb::class::hid::{HidSubclass, HidBootProtocol, HidWriter, ReportId, RequestHandler, State};
use embassy_usb::control::OutResponse;
use embassy_usb::driver::EndpointError;
use embassy_usb::{Builder, Handler};
use ogpad_core::{idle_ms_from_rate, idle_rate_from_ms, ClassRequest, HidAdapter, OutputError, OutputSink};
use portable_atomic::{AtomicBool, Ordering};

use crate::config::{POLL_MS, WRITE_TIMEOUT};

/// Interrupt endpoint buffer size, one full-speed packet of up to 8 bytes.
pub const HID_PACKET_SIZE: usize = 8;

type UsbDriver<'d> = Driver<'d, USB>;

/// Whether the host has configured the device.
///
/// Written by [`LinkHandler`] from the USB task, read by the foreground as
/// the transport's "ready to send" signal.
pub struct LinkState {
    configured: AtomicBool,
}

impl LinkState {
    #[must_use]
    pub const fn new() -> Self {
        Self {
            configured: AtomicBool::new(false),
        }
    }

    #[inline]
    #[must_use]
    pub fn is_configured(&self) -> bool {
        self.configured.load(Ordering::Relaxed)
    }

    fn set_configured(&self, configured: bool) {
        self.configured.store(configured, Ordering::Relaxed);
    }
}

impl Default for LinkState {
    fn default() -> Self {
        Self::new()
    }
}

/// USB device state handler feeding [`LinkState`].
pub struct LinkHandler<'a> {
    link: &'a LinkState,
}

impl<'a> LinkHandler<'a> {
    pub fn new(link: &'a LinkState) -> Self {
        Self { link }
    }
}

impl Handler for LinkHandler<'_> {
    fn enabled(&mut self, enabled: bool) {
        self.link.set_configured(false);
        info!("USB device {}", if enabled { "enabled" } else { "disabled" });
    }

    fn reset(&mut self) {
        self.link.set_configured(false);
        debug!("USB bus reset");
    }

    fn addressed(&mut self, addr: u8) {
        self.link.set_configured(false);
        debug!("USB address set to {}", addr);
    }

    fn configured(&mut self, configured: bool) {
        self.link.set_configured(configured);
        if configured {
            info!("USB configured, sending reports");
        } else {
            info!("USB no longer configured");
        }
    }
}

/// HID class request handler backed by the shared [`HidAdapter`].
///
/// embassy-usb decodes GET_IDLE/SET_IDLE into milliseconds, with an
/// indefinite idle (rate 0) as `u32::MAX`. The adapter keeps the 4 ms unit
/// byte the host sent.
pub struct PadRequestHandler<'a> {
    hid: &'a HidAdapter<'a>,
}

impl<'a> PadRequestHandler<'a> {
    pub fn new(hid: &'a HidAdapter<'a>) -> Self {
        Self { hid }
    }
}

impl RequestHandler for PadRequestHandler<'_> {
    fn get_report(&mut self, _id: ReportId, buf: &mut [u8]) -> Option<usize> {
        match self.hid.handle(ClassRequest::GetReport, buf) {
            0 => None,
            len => Some(len),
        }
    }

    fn set_report(&mut self, _id: ReportId, _data: &[u8]) -> OutResponse {
        // No output reports are declared; accept and drop.
        OutResponse::Accepted
    }

    fn set_idle_ms(&mut self, _id: Option<ReportId>, duration_ms: u32) {
        let rate = idle_rate_from_ms(duration_ms);
        self.hid.handle(ClassRequest::SetIdle(rate), &mut []);
        debug!("Idle rate set to {}", rate);
    }

    fn get_idle_ms(&mut self, _id: Option<ReportId>) -> Option<u32> {
        let mut rate = [0u8; 1];
        match self.hid.handle(ClassRequest::GetIdle, &mut rate) {
            0 => None,
            _ => Some(idle_ms_from_rate(rate[0])),
        }
    }
}

/// USB HID game pad output.
///
/// Wraps an embassy-usb HID writer. Every write is bounded by
/// [`WRITE_TIMEOUT`] so the foreground loop never waits on a host that
/// stopped polling.
pub struct UsbHidOutput<'d> {
    writer: HidWriter<'d, UsbDriver<'d>, HID_PACKET_SIZE>,
    link: &'d LinkState,
}

impl<'d> UsbHidOutput<'d> {
    /// Create a new USB HID output from the given HID writer.
    pub fn new(writer: HidWriter<'d, UsbDriver<'d>, HID_PACKET_SIZE>, link: &'d LinkState) -> Self {
        Self { writer, link }
    }
}

impl OutputSink for UsbHidOutput<'_> {
    async fn send(&mut self, report: &[u8]) -> Result<(), OutputError> {
        match with_timeout(WRITE_TIMEOUT, self.writer.write(report)).await {
            Ok(Ok(())) => Ok(()),
            Ok(Err(EndpointError::Disabled)) => Err(OutputError::NotReady),
            Ok(Err(_)) => Err(OutputError::Io),
            Err(_) => Err(OutputError::Busy),
        }
    }

    fn is_ready(&self) -> bool {
        self.link.is_configured()
    }
}

/// Configure the USB HID class in the USB builder.
///
/// The report descriptor is taken from the adapter's layout, so the bytes
/// on the wire and the descriptor always agree. Returns the HID writer for
/// use by the application.
pub fn configure_usb_hid<'d>(
    builder: &mut Builder<'d, UsbDriver<'d>>,
    state: &'d mut State<'d>,
    request_handler: &'d mut PadRequestHandler<'d>,
) -> HidWriter<'d, UsbDriver<'d>, HID_PACKET_SIZE> {
    let report_descriptor = request_handler.hid.layout().descriptor();
    let config = embassy_usb::class::hid::Config {
        report_descriptor,
        request_handler: Some(request_handler),
        poll_ms: POLL_MS,
        max_packet_size: HID_PACKET_SIZE as u16,
        hid_subclass: HidSubclass::No,
        hid_boot_protocol: HidBootProtocol::None,
    };

    HidWriter::new(builder, state, config)
}
