//! HID report-descriptor size walker.
//!
//! The report descriptor (a data blob) and the in-memory report buffers
//! describe the same byte layouts by two independent routes. This module
//! walks the descriptor's items and totals the bits declared for each
//! report direction, so the two representations can be checked against
//! each other instead of trusting duplicated literals.
//!
//! ## HID Report Descriptor structure
//!
//! A descriptor is a sequence of short items. Each item starts with a
//! prefix byte: bits 0-1 encode the payload size (0, 1, 2 or 4 bytes),
//! bits 2-3 the item type, bits 4-7 the tag. The only state tracked here
//! is the pair of global items that size a field group:
//! - Report Size: bits per field
//! - Report Count: number of fields
//! which a main item (Input / Output / Feature) then consumes.
//!
//! ## Limitations
//!
//! Report IDs, push/pop and long items are not handled - the keyboard
//! descriptor uses none of them.

/// Total declared payload per report direction, in bits.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct ReportSizes {
    pub input_bits: u32,
    pub output_bits: u32,
    pub feature_bits: u32,
}

impl ReportSizes {
    /// Input report size rounded up to whole bytes.
    pub fn input_bytes(&self) -> usize {
        (self.input_bits as usize + 7) / 8
    }

    /// Output report size rounded up to whole bytes.
    pub fn output_bytes(&self) -> usize {
        (self.output_bits as usize + 7) / 8
    }

    /// Feature report size rounded up to whole bytes.
    pub fn feature_bytes(&self) -> usize {
        (self.feature_bits as usize + 7) / 8
    }
}

// Item prefix constants: tag and type bits with the size bits masked off.
const ITEM_SIZE_MASK: u8 = 0x03;
const ITEM_TAG_MASK: u8 = 0xFC;
const ITEM_LONG: u8 = 0xFE;

const GLOBAL_REPORT_SIZE: u8 = 0x74;
const GLOBAL_REPORT_COUNT: u8 = 0x94;
const MAIN_INPUT: u8 = 0x80;
const MAIN_OUTPUT: u8 = 0x90;
const MAIN_FEATURE: u8 = 0xB0;

/// Walk `descriptor` and total the bits declared for each direction.
///
/// Returns `None` on a malformed descriptor (truncated item payload or a
/// long item, which this walker does not support).
pub fn parse_report_sizes(descriptor: &[u8]) -> Option<ReportSizes> {
    let mut sizes = ReportSizes::default();
    let mut report_size: u32 = 0;
    let mut report_count: u32 = 0;

    let mut i = 0;
    while i < descriptor.len() {
        let prefix = descriptor[i];
        if prefix == ITEM_LONG {
            return None;
        }

        let payload_len = match prefix & ITEM_SIZE_MASK {
            3 => 4,
            n => n as usize,
        };
        i += 1;
        if i + payload_len > descriptor.len() {
            return None;
        }

        let mut value: u32 = 0;
        for (shift, &byte) in descriptor[i..i + payload_len].iter().enumerate() {
            value |= (byte as u32) << (8 * shift);
        }
        i += payload_len;

        match prefix & ITEM_TAG_MASK {
            GLOBAL_REPORT_SIZE => report_size = value,
            GLOBAL_REPORT_COUNT => report_count = value,
            MAIN_INPUT => sizes.input_bits += report_size * report_count,
            MAIN_OUTPUT => sizes.output_bits += report_size * report_count,
            MAIN_FEATURE => sizes.feature_bits += report_size * report_count,
            _ => {}
        }
    }

    Some(sizes)
}
