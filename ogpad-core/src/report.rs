//! The HID input report, its wire layouts and their report descriptors.

/// Number of analog axes carried in every report.
pub const AXIS_COUNT: usize = 4;

/// Largest wire length of any [`ReportLayout`].
pub const MAX_REPORT_LEN: usize = 7;

/// Logical range of an axis as declared in the descriptors.
pub const AXIS_MIN: i8 = -127;
pub const AXIS_MAX: i8 = 127;

/// Axis slot order, shared by the report and the analog multiplexer.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[repr(u8)]
pub enum Axis {
    LeftX = 0,
    LeftY = 1,
    RightX = 2,
    RightY = 3,
}

impl Axis {
    pub const ALL: [Axis; AXIS_COUNT] = [Axis::LeftX, Axis::LeftY, Axis::RightX, Axis::RightY];

    #[inline]
    #[must_use]
    pub const fn index(self) -> usize {
        self as usize
    }
}

/// Convert a top-justified 8 bit conversion result (0..255, midpoint 128)
/// into a centered axis value.
///
/// ```
/// use ogpad_core::report::axis_from_raw;
///
/// assert_eq!(axis_from_raw(128), 0);
/// assert_eq!(axis_from_raw(255), 127);
/// assert_eq!(axis_from_raw(0), -127);
/// ```
#[inline]
#[must_use]
pub const fn axis_from_raw(raw: u8) -> i8 {
    let centered = raw as i16 - 128;
    if centered < AXIS_MIN as i16 {
        AXIS_MIN
    } else {
        centered as i8
    }
}

/// Latest known input state of the pad.
///
/// Bit *i* of `button_mask` is button *i*. The two joystick buttons that do
/// not fit the 16 bit mask live in the low bits of `aux_buttons`.
#[derive(Clone, Copy, Default, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Report {
    pub button_mask: u16,
    pub aux_buttons: u8,
    pub axes: [i8; AXIS_COUNT],
}

impl Report {
    /// Report with no buttons pressed and all axes centered.
    #[must_use]
    pub const fn neutral() -> Self {
        Self {
            button_mask: 0,
            aux_buttons: 0,
            axes: [0; AXIS_COUNT],
        }
    }

    /// Buttons as one word: `aux_buttons` above the 16 bit mask.
    #[inline]
    #[must_use]
    pub const fn button_word(&self) -> u32 {
        ((self.aux_buttons as u32) << 16) | self.button_mask as u32
    }

    /// Whether button `index` is pressed. Indices 16 and up address
    /// `aux_buttons`.
    #[inline]
    #[must_use]
    pub const fn is_pressed(&self, index: u8) -> bool {
        index < 24 && self.button_word() & (1 << index) != 0
    }

    #[inline]
    #[must_use]
    pub const fn axis(&self, axis: Axis) -> i8 {
        self.axes[axis.index()]
    }

    /// Fold a completed shift cycle into the button state.
    ///
    /// `word` holds `bits` button states, button *i* at bit *i*. Only the
    /// positions covered by the cycle are replaced; buttons outside the
    /// cycle window keep their previous state.
    pub(crate) fn fold_buttons(&mut self, word: u32, bits: u8) {
        let window = cycle_window(bits);
        let combined = (self.button_word() & !window) | (word & window);
        self.button_mask = combined as u16;
        self.aux_buttons = (combined >> 16) as u8;
    }
}

/// Bit window covered by a shift cycle of `bits` positions.
#[inline]
pub(crate) const fn cycle_window(bits: u8) -> u32 {
    if bits >= 24 {
        0x00FF_FFFF
    } else {
        (1u32 << bits) - 1
    }
}

/// Wire layout of the report, fixed at enumeration time.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ReportLayout {
    /// 16 buttons followed by the four axes, 6 bytes.
    Buttons16,
    /// 16 buttons, 2 joystick buttons, 6 padding bits, then the four axes,
    /// 7 bytes.
    #[default]
    Buttons18,
}

impl ReportLayout {
    /// Number of buttons, equal to the length of the shift chain.
    #[inline]
    #[must_use]
    pub const fn button_count(self) -> u8 {
        match self {
            Self::Buttons16 => 16,
            Self::Buttons18 => 18,
        }
    }

    /// Exact size of one report on the wire.
    #[inline]
    #[must_use]
    pub const fn report_len(self) -> usize {
        self.button_bytes() + AXIS_COUNT
    }

    #[inline]
    const fn button_bytes(self) -> usize {
        (self.button_count() as usize).div_ceil(8)
    }

    /// HID report descriptor matching [`Self::write`] field for field.
    #[must_use]
    pub const fn descriptor(self) -> &'static [u8] {
        match self {
            Self::Buttons16 => DESCRIPTOR_16,
            Self::Buttons18 => DESCRIPTOR_18,
        }
    }

    /// Serialize `report` into `buf`.
    ///
    /// Returns the number of bytes written, or `None` if `buf` cannot hold a
    /// whole report. Buttons beyond [`Self::button_count`] are not sent.
    pub fn write(self, report: &Report, buf: &mut [u8]) -> Option<usize> {
        let len = self.report_len();
        let out = buf.get_mut(..len)?;

        let buttons = report.button_word() & cycle_window(self.button_count());
        let button_bytes = self.button_bytes();
        for (i, byte) in out[..button_bytes].iter_mut().enumerate() {
            *byte = (buttons >> (i * 8)) as u8;
        }
        for (byte, axis) in out[button_bytes..].iter_mut().zip(report.axes) {
            *byte = axis as u8;
        }

        Some(len)
    }

    /// Serialize into a fixed buffer, returning it with the valid length.
    #[must_use]
    pub fn to_bytes(self, report: &Report) -> ([u8; MAX_REPORT_LEN], usize) {
        let mut buf = [0u8; MAX_REPORT_LEN];
        let len = self.write(report, &mut buf).unwrap_or(0);
        (buf, len)
    }
}

/// 16 button game pad, four signed 8 bit axes.
const DESCRIPTOR_16: &[u8] = &[
    0x05, 0x01, // Usage Page (Generic Desktop)
    0x09, 0x05, // Usage (Game Pad)
    0xA1, 0x01, // Collection (Application)
    //
    // --- Buttons (16) ---
    0x05, 0x09, //   Usage Page (Button)
    0x19, 0x01, //   Usage Minimum (Button 1)
    0x29, 0x10, //   Usage Maximum (Button 16)
    0x15, 0x00, //   Logical Minimum (0)
    0x25, 0x01, //   Logical Maximum (1)
    0x75, 0x01, //   Report Size (1)
    0x95, 0x10, //   Report Count (16)
    0x81, 0x02, //   Input (Data, Variable, Absolute)
    //
    // --- Axes ---
    0x05, 0x01, //   Usage Page (Generic Desktop)
    0x09, 0x30, //   Usage (X)
    0x09, 0x31, //   Usage (Y)
    0x09, 0x32, //   Usage (Z)
    0x09, 0x33, //   Usage (Rx)
    0x15, 0x81, //   Logical Minimum (-127)
    0x25, 0x7F, //   Logical Maximum (127)
    0x75, 0x08, //   Report Size (8)
    0x95, 0x04, //   Report Count (4)
    0x81, 0x02, //   Input (Data, Variable, Absolute)
    //
    0xC0, // End Collection
];

/// 18 button game pad (16 chain buttons plus two stick buttons), padded to
/// a byte boundary, four signed 8 bit axes.
const DESCRIPTOR_18: &[u8] = &[
    0x05, 0x01, // Usage Page (Generic Desktop)
    0x09, 0x05, // Usage (Game Pad)
    0xA1, 0x01, // Collection (Application)
    //
    // --- Buttons (18) ---
    0x05, 0x09, //   Usage Page (Button)
    0x19, 0x01, //   Usage Minimum (Button 1)
    0x29, 0x12, //   Usage Maximum (Button 18)
    0x15, 0x00, //   Logical Minimum (0)
    0x25, 0x01, //   Logical Maximum (1)
    0x75, 0x01, //   Report Size (1)
    0x95, 0x12, //   Report Count (18)
    0x81, 0x02, //   Input (Data, Variable, Absolute)
    //
    // --- Padding ---
    0x75, 0x01, //   Report Size (1)
    0x95, 0x06, //   Report Count (6)
    0x81, 0x03, //   Input (Constant, Variable, Absolute)
    //
    // --- Axes ---
    0x05, 0x01, //   Usage Page (Generic Desktop)
    0x09, 0x30, //   Usage (X)
    0x09, 0x31, //   Usage (Y)
    0x09, 0x32, //   Usage (Z)
    0x09, 0x33, //   Usage (Rx)
    0x15, 0x81, //   Logical Minimum (-127)
    0x25, 0x7F, //   Logical Maximum (127)
    0x75, 0x08, //   Report Size (8)
    0x95, 0x04, //   Report Count (4)
    0x81, 0x02, //   Input (Data, Variable, Absolute)
    //
    0xC0, // End Collection
];
