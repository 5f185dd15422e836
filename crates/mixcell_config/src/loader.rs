//! Layout file loading and validation.

use crate::error::ConfigError;
use crate::types::DeviceLayout;
use std::path::Path;

/// Widest selector word a matrix may declare.
pub const MAX_SELECTOR_BITS: u32 = 16;

/// Loads and validates a device layout from a TOML file.
pub fn load_layout(path: &Path) -> Result<DeviceLayout, ConfigError> {
    let content = std::fs::read_to_string(path)?;
    load_layout_from_str(&content)
}

/// Parses and validates a device layout from a TOML string.
pub fn load_layout_from_str(content: &str) -> Result<DeviceLayout, ConfigError> {
    let layout: DeviceLayout =
        toml::from_str(content).map_err(|e| ConfigError::Parse(e.to_string()))?;
    validate_layout(&layout)?;
    Ok(layout)
}

/// Checks that a layout is internally consistent.
///
/// Every matrix region and reserved range must fit inside the image,
/// matrix regions must not overlap each other, and each matrix's net space
/// must be addressable by its selector width.
pub fn validate_layout(layout: &DeviceLayout) -> Result<(), ConfigError> {
    if layout.device.name.is_empty() {
        return Err(ConfigError::Missing("device.name".to_string()));
    }
    let len = layout.device.bitstream_len;
    if len == 0 {
        return Err(ConfigError::Invalid(
            "bitstream_len must be non-zero".to_string(),
        ));
    }

    for (i, m) in layout.matrices.iter().enumerate() {
        if m.selector_bits == 0 || m.selector_bits > MAX_SELECTOR_BITS {
            return Err(ConfigError::Invalid(format!(
                "matrix {i}: selector_bits {} not in 1..={MAX_SELECTOR_BITS}",
                m.selector_bits
            )));
        }
        if m.nets == 0 || u64::from(m.nets) > m.selector_capacity() {
            return Err(ConfigError::Invalid(format!(
                "matrix {i}: {} nets cannot be addressed by {}-bit selectors",
                m.nets, m.selector_bits
            )));
        }
        let region_end = u64::from(m.base) + u64::from(m.words) * u64::from(m.selector_bits);
        if region_end > u64::from(len) {
            return Err(ConfigError::Invalid(format!(
                "matrix {i}: region ends at bit {region_end}, past the {len}-bit image"
            )));
        }
        for (name, net) in [("gnd_net", m.gnd_net), ("vdd_net", m.vdd_net)] {
            if let Some(net) = net {
                if net >= m.nets {
                    return Err(ConfigError::Invalid(format!(
                        "matrix {i}: {name} {net} is outside its {} nets",
                        m.nets
                    )));
                }
            }
        }
        if m.gnd_net.is_some() && m.gnd_net == m.vdd_net {
            return Err(ConfigError::Invalid(format!(
                "matrix {i}: gnd_net and vdd_net are the same net"
            )));
        }
        for (j, other) in layout.matrices.iter().enumerate().take(i) {
            let (a, b) = (m.region(), other.region());
            if !a.is_empty() && !b.is_empty() && a.start < b.end && b.start < a.end {
                return Err(ConfigError::Invalid(format!(
                    "matrix {i} region {a:?} overlaps matrix {j} region {b:?}"
                )));
            }
        }
    }

    for r in &layout.reserved {
        if u64::from(r.start) + u64::from(r.len) > u64::from(len) {
            return Err(ConfigError::Invalid(format!(
                "reserved range at bit {} ({} bits) is past the {len}-bit image",
                r.start, r.len
            )));
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    const TWO_MATRIX: &str = r#"
[device]
name = "demo"
bitstream_len = 256

[[matrix]]
base = 0
words = 16
selector_bits = 6
nets = 48
gnd_net = 0
vdd_net = 47

[[matrix]]
base = 128
words = 16
selector_bits = 6
nets = 48
gnd_net = 0
vdd_net = 47

[[reserved]]
start = 240
len = 16
reason = "device id"
"#;

    #[test]
    fn parse_two_matrix_layout() {
        let layout = load_layout_from_str(TWO_MATRIX).unwrap();
        assert_eq!(layout.device.name, "demo");
        assert_eq!(layout.bitstream_len(), 256);
        assert_eq!(layout.matrices.len(), 2);
        assert_eq!(layout.matrices[1].region(), 128..224);
        assert_eq!(layout.reserved[0].reason, "device id");
    }

    #[test]
    fn optional_constant_nets_default_to_none() {
        let toml = r#"
[device]
name = "bare"
bitstream_len = 8

[[matrix]]
base = 0
words = 8
selector_bits = 1
nets = 2
"#;
        let layout = load_layout_from_str(toml).unwrap();
        assert_eq!(layout.matrices[0].gnd_net, None);
        assert!(layout.reserved.is_empty());
    }

    #[test]
    fn empty_name_errors() {
        let toml = TWO_MATRIX.replace("name = \"demo\"", "name = \"\"");
        let err = load_layout_from_str(&toml).unwrap_err();
        assert!(matches!(err, ConfigError::Missing(_)));
    }

    #[test]
    fn region_past_image_errors() {
        let toml = TWO_MATRIX.replace("bitstream_len = 256", "bitstream_len = 200");
        let err = load_layout_from_str(&toml).unwrap_err();
        assert!(matches!(err, ConfigError::Invalid(_)));
    }

    #[test]
    fn overlapping_matrices_error() {
        let toml = TWO_MATRIX.replace("base = 128", "base = 90");
        let err = load_layout_from_str(&toml).unwrap_err();
        match err {
            ConfigError::Invalid(msg) => assert!(msg.contains("overlaps")),
            other => panic!("expected ValidationError, got {other:?}"),
        }
    }

    #[test]
    fn too_many_nets_errors() {
        let toml = TWO_MATRIX.replacen("nets = 48", "nets = 65", 1);
        let err = load_layout_from_str(&toml).unwrap_err();
        assert!(matches!(err, ConfigError::Invalid(_)));
    }

    #[test]
    fn same_constant_nets_error() {
        let toml = TWO_MATRIX.replacen("vdd_net = 47", "vdd_net = 0", 1);
        let err = load_layout_from_str(&toml).unwrap_err();
        assert!(matches!(err, ConfigError::Invalid(_)));
    }

    #[test]
    fn invalid_toml_errors() {
        let err = load_layout_from_str("not [valid").unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
    }

    #[test]
    fn io_error_from_missing_file() {
        let err = load_layout(Path::new("/nonexistent/layout.toml")).unwrap_err();
        assert!(matches!(err, ConfigError::Io(_)));
    }
}
