pub mod usb_hid;

pub use usb_hid::{configure_usb_hid, LinkHandler, LinkState, PadRequestHandler, UsbHidOutput};
