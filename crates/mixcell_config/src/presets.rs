//! Built-in device layouts.
//!
//! The presets are structurally valid but not hardware-accurate: they
//! produce deterministic, well-formed images for development and tests.

use crate::types::{DeviceLayout, DeviceMeta, MatrixLayout, ReservedRange};

impl DeviceLayout {
    /// A 2048-bit device with two 6-bit routing matrices.
    ///
    /// Each matrix has 64 nets with net 0 tied low and net 63 tied high.
    /// Bits 960..1024 are unused padding and the top 64 bits hold the
    /// device id and trim values.
    pub fn slg46620_like() -> Self {
        let matrix = |base| MatrixLayout {
            base,
            words: 160,
            selector_bits: 6,
            nets: 64,
            gnd_net: Some(0),
            vdd_net: Some(63),
        };
        Self {
            device: DeviceMeta {
                name: "slg46620-like".to_string(),
                bitstream_len: 2048,
            },
            matrices: vec![matrix(0), matrix(1024)],
            reserved: vec![ReservedRange {
                start: 1984,
                len: 64,
                reason: "device id and trim".to_string(),
            }],
        }
    }

    /// A single-matrix device of `len` bits with 1-bit selectors.
    ///
    /// Every bit is a selector word and the matrix has two nets and no
    /// constant nets, so each word holds one configuration bit.
    pub fn tiny(len: u32) -> Self {
        Self {
            device: DeviceMeta {
                name: format!("tiny{len}"),
                bitstream_len: len,
            },
            matrices: vec![MatrixLayout {
                base: 0,
                words: len,
                selector_bits: 1,
                nets: 2,
                gnd_net: None,
                vdd_net: None,
            }],
            reserved: Vec::new(),
        }
    }
}
