//! Test-only library interface for hogkbd.
//!
//! This module re-exports the pure logic modules that can be tested
//! on the host (no embedded hardware required).
//!
//! Usage: `cargo test`
//!
//! Note: The embedded binary uses main.rs with #![no_std] and #![no_main].
//! This lib.rs provides a separate entry point for host-based testing.

#![cfg_attr(not(test), no_std)]

// ═══════════════════════════════════════════════════════════════════════════
// Module re-exports
// ═══════════════════════════════════════════════════════════════════════════

pub mod hid {
    pub mod keyboard {
        pub use crate::hid_keyboard_impl::*;
    }
    pub mod report_map {
        pub use crate::hid_report_map_impl::*;
    }
    pub mod store {
        pub use crate::hid_store_impl::*;
    }

    pub use keyboard::{InputReport, INPUT_REPORT_SIZE, REPORT_DESCRIPTOR};
    pub use store::{DeliveryPlan, ReportKind, ReportStore, FEATURE_REPORT_SIZE, OUTPUT_REPORT_SIZE};
}

pub mod ring_buffer {
    pub use crate::ring_buffer_impl::*;
}

pub mod error {
    pub use crate::error_impl::*;
}

pub mod config {
    pub use crate::config_impl::*;
}

// Internal module paths for the actual implementations
#[path = "config.rs"]
mod config_impl;
#[path = "error.rs"]
mod error_impl;
#[path = "hid/keyboard.rs"]
mod hid_keyboard_impl;
#[path = "hid/report_map.rs"]
mod hid_report_map_impl;
#[path = "hid/store.rs"]
mod hid_store_impl;
#[path = "ring_buffer.rs"]
mod ring_buffer_impl;

// ═══════════════════════════════════════════════════════════════════════════
// Unit Tests
// ═══════════════════════════════════════════════════════════════════════════

#[cfg(test)]
mod tests {
    use super::error::Error;
    use super::hid::report_map::parse_report_sizes;
    use super::hid::*;
    use super::ring_buffer::RingBuffer;

    // ════════════════════════════════════════════════════════════════════════
    // Ring Buffer Tests
    // ════════════════════════════════════════════════════════════════════════

    #[test]
    fn ring_starts_empty() {
        let mut ring: RingBuffer<8> = RingBuffer::new();
        let (producer, consumer) = ring.split();
        assert!(consumer.is_empty());
        assert_eq!(consumer.used(), 0);
        assert_eq!(producer.space_available(), 8);
        assert_eq!(producer.dropped(), 0);
    }

    #[test]
    fn ring_put_then_get_preserves_bytes_and_order() {
        let mut ring: RingBuffer<8> = RingBuffer::new();
        let (mut producer, mut consumer) = ring.split();

        assert_eq!(producer.put(&[1, 2, 3]), 3);
        assert!(!consumer.is_empty());

        let mut out = [0u8; 8];
        assert_eq!(consumer.get(&mut out), 3);
        assert_eq!(&out[..3], &[1, 2, 3]);
        assert!(consumer.is_empty());
    }

    #[test]
    fn ring_get_on_empty_returns_zero() {
        let mut ring: RingBuffer<8> = RingBuffer::new();
        let (_producer, mut consumer) = ring.split();
        let mut out = [0u8; 4];
        assert_eq!(consumer.get(&mut out), 0);
    }

    #[test]
    fn ring_partial_get_leaves_remainder() {
        let mut ring: RingBuffer<8> = RingBuffer::new();
        let (mut producer, mut consumer) = ring.split();
        producer.put(&[10, 20, 30, 40]);

        let mut out = [0u8; 2];
        assert_eq!(consumer.get(&mut out), 2);
        assert_eq!(out, [10, 20]);
        assert_eq!(consumer.used(), 2);

        assert_eq!(consumer.get(&mut out), 2);
        assert_eq!(out, [30, 40]);
        assert!(consumer.is_empty());
    }

    #[test]
    fn ring_overflow_truncates_and_counts_drops() {
        let mut ring: RingBuffer<256> = RingBuffer::new();
        let (mut producer, consumer) = ring.split();

        let data = [0xAAu8; 300];
        assert_eq!(producer.put(&data), 256);
        assert_eq!(producer.dropped(), 44);
        assert_eq!(producer.space_available(), 0);
        assert_eq!(consumer.used(), 256);
    }

    #[test]
    fn ring_space_plus_used_equals_capacity() {
        let mut ring: RingBuffer<16> = RingBuffer::new();
        let (mut producer, mut consumer) = ring.split();
        let mut out = [0u8; 16];

        for step in 0..40 {
            let wrote = producer.put(&[step as u8; 5]);
            assert!(wrote <= 5);
            assert_eq!(producer.space_available() + consumer.used(), 16);

            let read = consumer.get(&mut out[..3]);
            assert!(read <= 3);
            assert_eq!(producer.space_available() + consumer.used(), 16);
        }
    }

    #[test]
    fn ring_wraparound_keeps_fifo_order() {
        let mut ring: RingBuffer<8> = RingBuffer::new();
        let (mut producer, mut consumer) = ring.split();

        // Drive the counters far past the capacity so the indices wrap many
        // times, checking that every byte comes back in sequence.
        let mut next_in: u8 = 0;
        let mut next_out: u8 = 0;
        let mut out = [0u8; 8];

        for _ in 0..100 {
            let chunk = [
                next_in,
                next_in.wrapping_add(1),
                next_in.wrapping_add(2),
                next_in.wrapping_add(3),
                next_in.wrapping_add(4),
            ];
            let wrote = producer.put(&chunk);
            next_in = next_in.wrapping_add(wrote as u8);

            let read = consumer.get(&mut out);
            for &byte in &out[..read] {
                assert_eq!(byte, next_out);
                next_out = next_out.wrapping_add(1);
            }
        }
        assert_eq!(producer.dropped() as usize, 0);
    }

    #[test]
    fn ring_consumer_sees_prefix_of_produced_bytes_under_overflow() {
        let mut ring: RingBuffer<8> = RingBuffer::new();
        let (mut producer, mut consumer) = ring.split();

        // 12 bytes offered, 8 fit - the ring must keep the first 8 in order
        // and drop the tail, never reordering or duplicating.
        let data: [u8; 12] = [1, 2, 3, 4, 5, 6, 7, 8, 9, 10, 11, 12];
        assert_eq!(producer.put(&data), 8);
        assert_eq!(producer.dropped(), 4);

        let mut out = [0u8; 12];
        assert_eq!(consumer.get(&mut out), 8);
        assert_eq!(&out[..8], &data[..8]);
    }

    #[test]
    fn ring_capacity_is_constant() {
        let ring: RingBuffer<64> = RingBuffer::new();
        assert_eq!(ring.capacity(), 64);
    }

    // ════════════════════════════════════════════════════════════════════════
    // Input Report Tests
    // ════════════════════════════════════════════════════════════════════════

    #[test]
    fn input_report_empty() {
        let report = InputReport::empty();
        assert!(report.is_empty());
        assert_eq!(report.to_bytes(), [0u8; 8]);
    }

    #[test]
    fn input_report_byte_layout() {
        let report = InputReport {
            modifier: 0x02,
            reserved: 0,
            keycodes: [0x04, 0x05, 0, 0, 0, 0],
        };
        assert_eq!(report.to_bytes(), [0x02, 0x00, 0x04, 0x05, 0, 0, 0, 0]);
        assert!(!report.is_empty());
    }

    #[test]
    fn input_report_from_bytes_roundtrip() {
        let bytes = [0xFF, 0x00, 0x04, 0x05, 0x06, 0x07, 0x08, 0x09];
        let report = InputReport::from_bytes(&bytes).unwrap();
        assert_eq!(report.modifier, 0xFF);
        assert_eq!(report.keycodes, [0x04, 0x05, 0x06, 0x07, 0x08, 0x09]);
        assert_eq!(report.to_bytes(), bytes);
    }

    #[test]
    fn input_report_from_short_bytes_fails() {
        assert!(InputReport::from_bytes(&[]).is_none());
        assert!(InputReport::from_bytes(&[0x02]).is_none());
        assert!(InputReport::from_bytes(&[0; 7]).is_none());
    }

    #[test]
    fn input_report_modifier_only_is_not_empty() {
        let mut report = InputReport::empty();
        report.modifier = 0x01; // Left Ctrl
        assert!(!report.is_empty());
    }

    // ════════════════════════════════════════════════════════════════════════
    // Descriptor / struct duality
    // ════════════════════════════════════════════════════════════════════════

    #[test]
    fn descriptor_sizes_match_report_buffers() {
        let sizes = parse_report_sizes(REPORT_DESCRIPTOR).expect("descriptor must parse");

        // The input report struct and the descriptor must describe the same
        // 8 bytes: 8 modifier bits + 1 reserved byte + 6 key codes.
        assert_eq!(sizes.input_bytes(), INPUT_REPORT_SIZE);

        // The vendor feature report is exactly the store's buffer.
        assert_eq!(sizes.feature_bytes(), FEATURE_REPORT_SIZE);

        // The descriptor declares one LED byte (5 bits + 3 padding); the
        // store's output buffer is a larger fixed attribute capacity.
        assert_eq!(sizes.output_bytes(), 1);
        assert!(sizes.output_bytes() <= OUTPUT_REPORT_SIZE);
    }

    #[test]
    fn descriptor_walker_rejects_truncated_items() {
        // A two-byte-payload item with only one byte present.
        assert!(parse_report_sizes(&[0x06, 0x01]).is_none());
    }

    #[test]
    fn descriptor_walker_handles_empty_descriptor() {
        let sizes = parse_report_sizes(&[]).unwrap();
        assert_eq!(sizes.input_bits, 0);
        assert_eq!(sizes.output_bits, 0);
        assert_eq!(sizes.feature_bits, 0);
    }

    // ════════════════════════════════════════════════════════════════════════
    // Report Store Tests
    // ════════════════════════════════════════════════════════════════════════

    #[test]
    fn store_reports_start_zeroed() {
        let store = ReportStore::new();
        let mut buf = [0xFFu8; OUTPUT_REPORT_SIZE];
        assert_eq!(store.read(ReportKind::Output, 0, &mut buf), Ok(20));
        assert_eq!(buf, [0u8; OUTPUT_REPORT_SIZE]);
        assert_eq!(store.control_point(), 0);
    }

    #[test]
    fn store_write_past_bound_fails_and_leaves_buffer_unchanged() {
        let store = ReportStore::new();
        store.write(ReportKind::Output, 0, &[0x11; 20]).unwrap();

        // offset 18 + len 5 exceeds the 20-byte output report.
        let err = store.write(ReportKind::Output, 18, &[0xEE; 5]);
        assert_eq!(err, Err(Error::InvalidOffset));

        let mut buf = [0u8; 20];
        store.read(ReportKind::Output, 0, &mut buf).unwrap();
        assert_eq!(buf, [0x11; 20]);
    }

    #[test]
    fn store_full_width_output_write_reads_back() {
        let store = ReportStore::new();
        let mut data = [0u8; 20];
        for (i, byte) in data.iter_mut().enumerate() {
            *byte = i as u8;
        }
        assert_eq!(store.write(ReportKind::Output, 0, &data), Ok(20));

        let mut buf = [0u8; 20];
        assert_eq!(store.read(ReportKind::Output, 0, &mut buf), Ok(20));
        assert_eq!(buf, data);
    }

    #[test]
    fn store_offset_write_lands_in_place() {
        let store = ReportStore::new();
        store.write(ReportKind::Output, 18, &[0xAB, 0xCD]).unwrap();

        let mut buf = [0u8; 20];
        store.read(ReportKind::Output, 0, &mut buf).unwrap();
        assert_eq!(buf[18], 0xAB);
        assert_eq!(buf[19], 0xCD);
        assert_eq!(&buf[..18], &[0u8; 18]);
    }

    #[test]
    fn store_offset_read_returns_tail() {
        let store = ReportStore::new();
        store.write(ReportKind::Feature, 0, &[0x12, 0x34]).unwrap();

        let mut buf = [0u8; 4];
        assert_eq!(store.read(ReportKind::Feature, 1, &mut buf), Ok(1));
        assert_eq!(buf[0], 0x34);
    }

    #[test]
    fn store_read_past_bound_fails() {
        let store = ReportStore::new();
        let mut buf = [0u8; 4];
        assert_eq!(
            store.read(ReportKind::Feature, 3, &mut buf),
            Err(Error::InvalidOffset)
        );
        // Reading exactly at the end is a valid empty read.
        assert_eq!(store.read(ReportKind::Feature, 2, &mut buf), Ok(0));
    }

    #[test]
    fn store_feature_report_roundtrip() {
        let store = ReportStore::new();
        assert_eq!(store.write(ReportKind::Feature, 0, &[0xDE, 0xAD]), Ok(2));
        let mut buf = [0u8; 2];
        store.read(ReportKind::Feature, 0, &mut buf).unwrap();
        assert_eq!(buf, [0xDE, 0xAD]);
    }

    #[test]
    fn store_input_write_goes_through_report_struct() {
        let store = ReportStore::new();
        let bytes = [0x02, 0x00, 0x04, 0, 0, 0, 0, 0];
        assert_eq!(store.write(ReportKind::Input, 0, &bytes), Ok(8));

        let mut buf = [0u8; 8];
        store.read(ReportKind::Input, 0, &mut buf).unwrap();
        assert_eq!(buf, bytes);
    }

    #[test]
    fn store_control_point_stores_value() {
        let store = ReportStore::new();
        store.set_control_point(0x01);
        assert_eq!(store.control_point(), 0x01);
    }

    // ════════════════════════════════════════════════════════════════════════
    // Fan-out gating
    // ════════════════════════════════════════════════════════════════════════

    #[test]
    fn set_input_key_with_notifications_disabled_skips_ble() {
        let store = ReportStore::new();
        let plan = store.set_input_key(0x04);
        assert_eq!(plan.ble, None);
    }

    #[test]
    fn set_input_key_with_notifications_enabled_delivers_once() {
        let store = ReportStore::new();
        store.set_notify_enabled(true);

        let plan = store.set_input_key(0x04);
        assert_eq!(plan.ble, Some([0x00, 0x00, 0x04, 0, 0, 0, 0, 0]));

        // Disabling again stops delivery but keeps the report bytes.
        store.set_notify_enabled(false);
        let plan = store.set_input_key(0x05);
        assert_eq!(plan.ble, None);

        let mut buf = [0u8; 8];
        store.read(ReportKind::Input, 0, &mut buf).unwrap();
        assert_eq!(buf[2], 0x05);
    }

    #[test]
    fn set_input_key_preserves_modifier_byte() {
        let store = ReportStore::new();
        store
            .write(ReportKind::Input, 0, &[0x02, 0, 0, 0, 0, 0, 0, 0])
            .unwrap();
        store.set_notify_enabled(true);

        let plan = store.set_input_key(0x04);
        assert_eq!(plan.ble, Some([0x02, 0x00, 0x04, 0, 0, 0, 0, 0]));
    }

    #[test]
    fn usb_token_gates_second_write_until_completion() {
        let store = ReportStore::new();

        // First update acquires the in-flight token.
        let first = store.set_input_key(0x04);
        assert!(first.usb.is_some());
        assert_eq!(store.usb_dropped(), 0);

        // Second update while the write is still in flight is dropped.
        let second = store.set_input_key(0x05);
        assert_eq!(second.usb, None);
        assert_eq!(store.usb_dropped(), 1);

        // Completion releases the token; the next update goes through with
        // the freshest bytes.
        store.usb_write_complete();
        let third = store.set_input_key(0x06);
        assert_eq!(third.usb, Some([0x00, 0x00, 0x06, 0, 0, 0, 0, 0]));
    }

    #[test]
    fn usb_token_released_even_after_failed_write() {
        let store = ReportStore::new();

        let plan = store.set_input_key(0x04);
        assert!(plan.usb.is_some());

        // The transport must release the token on its error path too;
        // model that contract here.
        store.usb_write_complete();
        assert!(store.set_input_key(0x00).usb.is_some());
    }

    #[test]
    fn key_release_is_delivered_like_a_press() {
        let store = ReportStore::new();
        store.set_notify_enabled(true);

        store.set_input_key(0x04);
        store.usb_write_complete();

        let release = store.set_input_key(0x00);
        assert_eq!(release.ble, Some([0u8; 8]));
        assert_eq!(release.usb, Some([0u8; 8]));
    }
}
