#![no_std]
#![no_main]

use defmt::{info, trace, warn};
use defmt_rtt as _;
use embassy_executor::Spawner;
use embassy_futures::yield_now;
use embassy_rp::adc::{Adc, Channel, Config as AdcConfig};
use embassy_rp::bind_interrupts;
use embassy_rp::gpio::{Input, Level, Output, Pull};
use embassy_rp::interrupt;
use embassy_rp::peripherals::USB;
use embassy_rp::usb::Driver;
use embassy_rp::watchdog::Watchdog;
use embassy_usb::class::hid::State;
use embassy_usb::{Builder, Config as UsbConfig};
use ogpad::config::{
    ADC_SAMPLE_RATE_HZ, LAYOUT, USB_MANUFACTURER, USB_MAX_POWER_MA, USB_PID, USB_PRODUCT,
    USB_SERIAL, USB_VID,
};
use ogpad::{
    configure_usb_hid, Acquisition, Foreground, HidAdapter, HwWatchdog, LinkHandler, LinkState,
    PadRequestHandler, ReportStore, RpConverter, ShiftLines, UsbHidOutput,
};
use static_cell::StaticCell;

#[cfg(feature = "dev-panic")]
use panic_probe as _;
#[cfg(feature = "prod-panic")]
use panic_reset as _;

bind_interrupts!(struct Irqs {
    USBCTRL_IRQ => embassy_rp::usb::InterruptHandler<USB>;
});

/// The one report of the pad, written by the ADC interrupt.
static REPORT: ReportStore = ReportStore::new();

/// Class request state (idle rate) next to the report it serves.
static HID: HidAdapter<'static> = HidAdapter::new(&REPORT, LAYOUT);

/// Host configuration state, the transport's readiness signal.
static LINK: LinkState = LinkState::new();

/// USB device configuration buffer.
static CONFIG_DESCRIPTOR: StaticCell<[u8; 256]> = StaticCell::new();
static BOS_DESCRIPTOR: StaticCell<[u8; 256]> = StaticCell::new();
static MSOS_DESCRIPTOR: StaticCell<[u8; 256]> = StaticCell::new();
static CONTROL_BUF: StaticCell<[u8; 64]> = StaticCell::new();

/// HID state.
static HID_STATE: StaticCell<State> = StaticCell::new();
static REQUEST_HANDLER: StaticCell<PadRequestHandler<'static>> = StaticCell::new();
static LINK_HANDLER: StaticCell<LinkHandler<'static>> = StaticCell::new();

#[interrupt]
unsafe fn ADC_IRQ_FIFO() {
    ogpad::on_adc_irq();
}

#[embassy_executor::main]
async fn main(spawner: Spawner) {
    info!("Open Game Pad starting ({} buttons)...", LAYOUT.button_count());

    let p = embassy_rp::init(embassy_rp::config::Config::default());

    // --- Watchdog ---
    let watchdog = HwWatchdog::start(Watchdog::new(p.WATCHDOG));

    // --- Acquisition ---
    let lines = ShiftLines {
        clock: Output::new(p.PIN_2, Level::Low),
        serial: Input::new(p.PIN_3, Pull::None),
    };
    let adc = Adc::new_blocking(p.ADC, AdcConfig::default());
    let channel = Channel::new_pin(p.PIN_26, Pull::None);
    let converter = RpConverter::new(adc, channel, ADC_SAMPLE_RATE_HZ);
    ogpad::install(Acquisition::new(lines, converter, &REPORT, LAYOUT));

    // --- USB Setup ---
    let usb_driver = Driver::new(p.USB, Irqs);

    let mut usb_config = UsbConfig::new(USB_VID, USB_PID);
    usb_config.manufacturer = Some(USB_MANUFACTURER);
    usb_config.product = Some(USB_PRODUCT);
    usb_config.serial_number = Some(USB_SERIAL);
    usb_config.max_power = USB_MAX_POWER_MA;
    usb_config.max_packet_size_0 = 64;

    let config_descriptor = CONFIG_DESCRIPTOR.init([0; 256]);
    let bos_descriptor = BOS_DESCRIPTOR.init([0; 256]);
    let msos_descriptor = MSOS_DESCRIPTOR.init([0; 256]);
    let control_buf = CONTROL_BUF.init([0; 64]);

    let mut builder = Builder::new(
        usb_driver,
        usb_config,
        config_descriptor,
        bos_descriptor,
        msos_descriptor,
        control_buf,
    );
    builder.handler(LINK_HANDLER.init(LinkHandler::new(&LINK)));

    // Configure HID class
    let hid_state = HID_STATE.init(State::new());
    let request_handler = REQUEST_HANDLER.init(PadRequestHandler::new(&HID));
    let hid_writer = configure_usb_hid(&mut builder, hid_state, request_handler);

    // Build the USB device
    let usb_device = builder.build();
    spawner.spawn(usb_task(usb_device).unwrap());

    let output = UsbHidOutput::new(hid_writer, &LINK);
    let mut foreground = Foreground::new(&REPORT, LAYOUT, watchdog, output);

    info!("Open Game Pad initialized, acquiring...");

    let mut pin_faults = 0;
    loop {
        if let Err(e) = foreground.poll_once().await {
            trace!("Report not sent: {:?}", e);
        }
        let faults = ogpad::pin_faults();
        if faults != pin_faults {
            warn!("Shift line faults: {}", faults);
            pin_faults = faults;
        }
        // Let the USB task run between iterations.
        yield_now().await;
    }
}

/// USB device task - runs the USB stack.
#[embassy_executor::task]
async fn usb_task(mut device: embassy_usb::UsbDevice<'static, Driver<'static, USB>>) {
    device.run().await;
}
