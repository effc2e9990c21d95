//! Minimal HID report descriptor parser.
//!
//! Understands the short items used by game pad descriptors and produces the
//! list of input fields with their bit positions. This is enough to decode a
//! serialized report the way a host's generic HID driver would.

use heapless::Vec;

/// Maximum number of input fields tracked per descriptor.
pub const MAX_FIELDS: usize = 32;

/// Maximum number of local usages collected before a main item.
const MAX_USAGES: usize = 8;

/// Error type for descriptor parsing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum DescriptorError {
    /// Item header announces more data than the descriptor holds.
    Truncated,
    /// Long items are not supported.
    LongItem,
    /// More fields or usages than the fixed capacity.
    TooManyFields,
    /// End Collection without a matching Collection.
    Unbalanced,
    /// Field wider than 32 bits.
    FieldTooWide,
    /// Input item with a Report Size of zero.
    ZeroWidth,
    /// More than 255 nested collections.
    TooDeep,
}

/// One input value in the report.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Field {
    pub usage_page: u16,
    /// Usage ID, or 0 for constant padding.
    pub usage: u16,
    pub bit_offset: u16,
    pub bit_size: u8,
    pub logical_min: i32,
    pub logical_max: i32,
    pub constant: bool,
}

impl Field {
    /// Whether the logical range requires sign extension.
    #[inline]
    #[must_use]
    pub const fn is_signed(&self) -> bool {
        self.logical_min < 0
    }

    /// Decode this field from a serialized report (little-endian bit order).
    ///
    /// Returns `None` if the report is too short or the field is wider
    /// than 32 bits. A zero-width field decodes as 0.
    #[must_use]
    pub fn extract(&self, report: &[u8]) -> Option<i32> {
        if self.bit_size > 32 {
            return None;
        }
        if self.bit_size == 0 {
            return Some(0);
        }

        let mut raw: u32 = 0;
        for i in 0..self.bit_size as usize {
            let bit = self.bit_offset as usize + i;
            let byte = *report.get(bit / 8)?;
            if byte & (1 << (bit % 8)) != 0 {
                raw |= 1 << i;
            }
        }

        if self.is_signed() && self.bit_size < 32 && raw & (1 << (self.bit_size - 1)) != 0 {
            raw |= !0u32 << self.bit_size;
        }
        Some(raw as i32)
    }
}

/// Parsed input fields of a descriptor.
#[derive(Clone, Debug, Default)]
pub struct Fields {
    fields: Vec<Field, MAX_FIELDS>,
    input_bits: u16,
}

impl Fields {
    #[inline]
    #[must_use]
    pub fn iter(&self) -> core::slice::Iter<'_, Field> {
        self.fields.iter()
    }

    /// Total width of all input items, padding included.
    #[inline]
    #[must_use]
    pub const fn input_bits(&self) -> u16 {
        self.input_bits
    }

    /// Find the data field for a usage.
    #[must_use]
    pub fn find(&self, usage_page: u16, usage: u16) -> Option<&Field> {
        self.fields
            .iter()
            .find(|f| !f.constant && f.usage_page == usage_page && f.usage == usage)
    }
}

#[derive(Clone, Copy, Default)]
struct Globals {
    usage_page: u16,
    logical_min: i32,
    logical_max: i32,
    report_size: u32,
    report_count: u16,
}

#[derive(Default)]
struct Locals {
    usages: Vec<u16, MAX_USAGES>,
    usage_min: Option<u16>,
    usage_max: Option<u16>,
}

impl Locals {
    /// Usage for the `index`-th value of the next main item.
    fn usage(&self, index: u16) -> u16 {
        if let (Some(min), Some(max)) = (self.usage_min, self.usage_max) {
            return min.saturating_add(index).min(max);
        }
        match self.usages.get(index as usize) {
            Some(&u) => u,
            // HID repeats the last usage for the remaining values.
            None => self.usages.last().copied().unwrap_or(0),
        }
    }
}

fn unsigned(data: &[u8]) -> u32 {
    data.iter()
        .rev()
        .fold(0u32, |acc, &b| (acc << 8) | u32::from(b))
}

fn signed(data: &[u8]) -> i32 {
    match data.len() {
        0 => 0,
        1 => i32::from(data[0] as i8),
        2 => i32::from(i16::from_le_bytes([data[0], data[1]])),
        _ => unsigned(data) as i32,
    }
}

const ITEM_MAIN: u8 = 0;
const ITEM_GLOBAL: u8 = 1;
const ITEM_LOCAL: u8 = 2;

const MAIN_INPUT: u8 = 0x8;
const MAIN_COLLECTION: u8 = 0xA;
const MAIN_END_COLLECTION: u8 = 0xC;

const GLOBAL_USAGE_PAGE: u8 = 0x0;
const GLOBAL_LOGICAL_MIN: u8 = 0x1;
const GLOBAL_LOGICAL_MAX: u8 = 0x2;
const GLOBAL_REPORT_SIZE: u8 = 0x7;
const GLOBAL_REPORT_COUNT: u8 = 0x9;

const LOCAL_USAGE: u8 = 0x0;
const LOCAL_USAGE_MIN: u8 = 0x1;
const LOCAL_USAGE_MAX: u8 = 0x2;

/// Parse the input fields of a report descriptor.
pub fn parse(descriptor: &[u8]) -> Result<Fields, DescriptorError> {
    let mut out = Fields::default();
    let mut globals = Globals::default();
    let mut locals = Locals::default();
    let mut depth: u8 = 0;
    let mut pos = 0;

    while pos < descriptor.len() {
        let prefix = descriptor[pos];
        if prefix == 0xFE {
            return Err(DescriptorError::LongItem);
        }
        let size = match prefix & 0x03 {
            3 => 4,
            n => n as usize,
        };
        let kind = (prefix >> 2) & 0x03;
        let tag = prefix >> 4;
        let data = descriptor
            .get(pos + 1..pos + 1 + size)
            .ok_or(DescriptorError::Truncated)?;
        pos += 1 + size;

        match kind {
            ITEM_MAIN => {
                match tag {
                    MAIN_INPUT => {
                        let constant = data.first().is_some_and(|flags| flags & 0x01 != 0);
                        let bit_size = match globals.report_size {
                            0 => return Err(DescriptorError::ZeroWidth),
                            n @ 1..=32 => n as u8,
                            _ => return Err(DescriptorError::FieldTooWide),
                        };
                        for i in 0..globals.report_count {
                            let field = Field {
                                usage_page: globals.usage_page,
                                usage: if constant { 0 } else { locals.usage(i) },
                                bit_offset: out.input_bits,
                                bit_size,
                                logical_min: globals.logical_min,
                                logical_max: globals.logical_max,
                                constant,
                            };
                            out.fields
                                .push(field)
                                .map_err(|_| DescriptorError::TooManyFields)?;
                            out.input_bits += u16::from(bit_size);
                        }
                    }
                    MAIN_COLLECTION => {
                        depth = depth.checked_add(1).ok_or(DescriptorError::TooDeep)?;
                    }
                    MAIN_END_COLLECTION => {
                        depth = depth.checked_sub(1).ok_or(DescriptorError::Unbalanced)?;
                    }
                    _ => {}
                }
                locals = Locals::default();
            }
            ITEM_GLOBAL => match tag {
                GLOBAL_USAGE_PAGE => globals.usage_page = unsigned(data) as u16,
                GLOBAL_LOGICAL_MIN => globals.logical_min = signed(data),
                GLOBAL_LOGICAL_MAX => globals.logical_max = signed(data),
                GLOBAL_REPORT_SIZE => globals.report_size = unsigned(data),
                GLOBAL_REPORT_COUNT => globals.report_count = unsigned(data) as u16,
                _ => {}
            },
            ITEM_LOCAL => match tag {
                LOCAL_USAGE => locals
                    .usages
                    .push(unsigned(data) as u16)
                    .map_err(|_| DescriptorError::TooManyFields)?,
                LOCAL_USAGE_MIN => locals.usage_min = Some(unsigned(data) as u16),
                LOCAL_USAGE_MAX => locals.usage_max = Some(unsigned(data) as u16),
                _ => {}
            },
            _ => {}
        }
    }

    if depth != 0 {
        return Err(DescriptorError::Unbalanced);
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    extern crate std;

    use super::*;
    use crate::report::{Axis, Report, ReportLayout};

    const PAGE_DESKTOP: u16 = 0x01;
    const PAGE_BUTTON: u16 = 0x09;
    const AXIS_USAGES: [u16; 4] = [0x30, 0x31, 0x32, 0x33];

    fn decode(layout: ReportLayout, report: &Report) -> Report {
        let fields = parse(layout.descriptor()).unwrap();
        let (bytes, len) = layout.to_bytes(report);
        let bytes = &bytes[..len];

        let mut decoded = Report::neutral();
        for button in 0..layout.button_count() {
            let field = fields.find(PAGE_BUTTON, u16::from(button) + 1).unwrap();
            assert_eq!(field.bit_size, 1);
            if field.extract(bytes).unwrap() != 0 {
                let word = decoded.button_word() | (1 << button);
                decoded.button_mask = word as u16;
                decoded.aux_buttons = (word >> 16) as u8;
            }
        }
        for axis in Axis::ALL {
            let field = fields
                .find(PAGE_DESKTOP, AXIS_USAGES[axis.index()])
                .unwrap();
            assert_eq!((field.logical_min, field.logical_max), (-127, 127));
            decoded.axes[axis.index()] = field.extract(bytes).unwrap() as i8;
        }
        decoded
    }

    #[test]
    fn test_descriptor_width_matches_report_len() {
        for layout in [ReportLayout::Buttons16, ReportLayout::Buttons18] {
            let fields = parse(layout.descriptor()).unwrap();
            assert_eq!(usize::from(fields.input_bits()), layout.report_len() * 8);
        }
    }

    #[test]
    fn test_report_round_trips_through_descriptor() {
        let report = Report {
            button_mask: 0b101,
            aux_buttons: 0,
            axes: [10, -20, 30, -40],
        };
        for layout in [ReportLayout::Buttons16, ReportLayout::Buttons18] {
            assert_eq!(decode(layout, &report), report);
        }
    }

    #[test]
    fn test_aux_buttons_round_trip_in_18_button_layout() {
        let report = Report {
            button_mask: 0x8001,
            aux_buttons: 0b10,
            axes: [-127, 127, 0, -1],
        };
        assert_eq!(decode(ReportLayout::Buttons18, &report), report);
    }

    #[test]
    fn test_padding_is_constant() {
        let fields = parse(ReportLayout::Buttons18.descriptor()).unwrap();
        let padding: u16 = fields
            .iter()
            .filter(|f| f.constant)
            .map(|f| u16::from(f.bit_size))
            .sum();
        assert_eq!(padding, 6);
    }

    #[test]
    fn test_truncated_descriptor() {
        assert_eq!(parse(&[0x05]).unwrap_err(), DescriptorError::Truncated);
    }

    #[test]
    fn test_unbalanced_collection() {
        assert_eq!(parse(&[0xA1, 0x01]).unwrap_err(), DescriptorError::Unbalanced);
        assert_eq!(parse(&[0xC0]).unwrap_err(), DescriptorError::Unbalanced);
    }

    #[test]
    fn test_zero_report_size_is_rejected() {
        // Logical Min (-1), Report Size (0), Report Count (1), Input (Data,Var,Abs)
        let desc = [0x15, 0xFF, 0x75, 0x00, 0x95, 0x01, 0x81, 0x02];
        assert_eq!(parse(&desc).unwrap_err(), DescriptorError::ZeroWidth);
    }

    #[test]
    fn test_report_size_beyond_u8_is_too_wide() {
        // Report Size (256) as a two byte item
        let desc = [0x76, 0x00, 0x01, 0x95, 0x01, 0x81, 0x02];
        assert_eq!(parse(&desc).unwrap_err(), DescriptorError::FieldTooWide);

        let desc = [0x75, 0x21, 0x95, 0x01, 0x81, 0x02];
        assert_eq!(parse(&desc).unwrap_err(), DescriptorError::FieldTooWide);
    }

    #[test]
    fn test_collection_nesting_limit() {
        let mut desc = std::vec::Vec::new();
        for _ in 0..256 {
            desc.extend_from_slice(&[0xA1, 0x00]);
        }
        assert_eq!(parse(&desc).unwrap_err(), DescriptorError::TooDeep);
    }

    #[test]
    fn test_extract_degenerate_widths() {
        let mut field = Field {
            usage_page: PAGE_DESKTOP,
            usage: 0x30,
            bit_offset: 0,
            bit_size: 0,
            logical_min: -1,
            logical_max: 0,
            constant: false,
        };
        assert_eq!(field.extract(&[0xFF]), Some(0));

        field.bit_size = 40;
        assert_eq!(field.extract(&[0xFF; 8]), None);
    }

    #[test]
    fn test_sign_extension() {
        let field = Field {
            usage_page: PAGE_DESKTOP,
            usage: 0x30,
            bit_offset: 4,
            bit_size: 8,
            logical_min: -127,
            logical_max: 127,
            constant: false,
        };
        // -2 = 0xFE straddling two bytes at bit offset 4
        assert_eq!(field.extract(&[0xE0, 0x0F]), Some(-2));
        assert_eq!(field.extract(&[0xE0]), None);
    }
}
