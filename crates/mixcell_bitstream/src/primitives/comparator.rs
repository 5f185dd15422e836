//! Analog comparators against an internal voltage reference.

use super::{placement, PrimitiveKind};
use crate::address::EntityAddress;
use crate::bits::BitArray;
use crate::entity::{BitstreamEntity, InputBindings};
use crate::error::{ConfigurationError, SerializationError};
use serde::{Deserialize, Serialize};

static INPUTS: [&str; 1] = ["IN"];
static OUTPUTS: [&str; 1] = ["OUT"];

/// Highest valid reference code; codes above it are reserved.
pub const MAX_VREF_CODE: u8 = 26;

const ENABLE: u32 = 0;
const HYSTERESIS: u32 = 1;
const GAIN: u32 = 3;
const VREF: u32 = 5;
const VREF_BITS: u32 = 5;

/// Input hysteresis.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Hysteresis {
    /// No hysteresis.
    None,
    /// 25 mV.
    Mv25,
    /// 50 mV.
    Mv50,
    /// 200 mV.
    Mv200,
}

/// Attenuation applied to the input before comparison.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Gain {
    /// Unity.
    X1,
    /// One half.
    Half,
    /// One third.
    Third,
    /// One quarter.
    Quarter,
}

macro_rules! two_bit_enum {
    ($ty:ident, [$($variant:ident),* $(,)?]) => {
        impl $ty {
            const ALL: [Self; 4] = [$(Self::$variant),*];

            fn bits(self) -> u32 {
                self as u32
            }

            fn from_bits(bits: u32) -> Self {
                Self::ALL[(bits & 0b11) as usize]
            }
        }
    };
}

two_bit_enum!(Hysteresis, [None, Mv25, Mv50, Mv200]);
two_bit_enum!(Gain, [X1, Half, Third, Quarter]);

/// Compares `IN` against a reference of `50 * (code + 1)` millivolts.
///
/// State bits: enable, 2-bit hysteresis, 2-bit gain, 5-bit reference code.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Comparator {
    address: EntityAddress,
    /// Whether the comparator is powered.
    pub enabled: bool,
    /// Input hysteresis.
    pub hysteresis: Hysteresis,
    /// Input gain.
    pub gain: Gain,
    vref_code: u8,
    inputs: InputBindings,
}

impl Comparator {
    /// Creates a disabled comparator with a 50 mV reference.
    pub fn new(address: EntityAddress) -> Self {
        Self {
            address,
            enabled: false,
            hysteresis: Hysteresis::None,
            gain: Gain::X1,
            vref_code: 0,
            inputs: InputBindings::new(INPUTS.len()),
        }
    }

    /// The raw reference code.
    pub fn vref_code(&self) -> u8 {
        self.vref_code
    }

    /// The reference voltage in millivolts.
    pub fn vref_mv(&self) -> u32 {
        50 * (u32::from(self.vref_code) + 1)
    }

    /// Sets the reference code (0 to [`MAX_VREF_CODE`]).
    pub fn set_vref_code(&mut self, code: u8) -> Result<(), ConfigurationError> {
        if code > MAX_VREF_CODE {
            return Err(ConfigurationError::InvalidParameter(format!(
                "vref code {code} exceeds {MAX_VREF_CODE}"
            )));
        }
        self.vref_code = code;
        Ok(())
    }
}

impl BitstreamEntity for Comparator {
    entity_accessors!();

    fn kind(&self) -> PrimitiveKind {
        PrimitiveKind::Comparator
    }

    fn input_ports(&self) -> &'static [&'static str] {
        &INPUTS
    }

    fn output_ports(&self) -> &'static [&'static str] {
        &OUTPUTS
    }

    fn state_len(&self) -> u32 {
        VREF + VREF_BITS
    }

    fn encode_state(&self, state: &mut BitArray) {
        state.set(ENABLE, self.enabled);
        state.write_field(HYSTERESIS, 2, self.hysteresis.bits());
        state.write_field(GAIN, 2, self.gain.bits());
        state.write_field(VREF, VREF_BITS, u32::from(self.vref_code));
    }

    fn decode_state(&mut self, state: &BitArray) -> Result<(), SerializationError> {
        let code = state.read_field(VREF, VREF_BITS);
        if code > u32::from(MAX_VREF_CODE) {
            return Err(SerializationError::InvalidField {
                field: "vref",
                value: code,
            });
        }
        self.enabled = state.get(ENABLE);
        self.hysteresis = Hysteresis::from_bits(state.read_field(HYSTERESIS, 2));
        self.gain = Gain::from_bits(state.read_field(GAIN, 2));
        self.vref_code = code as u8;
        Ok(())
    }

    fn description(&self) -> String {
        format!(
            "{} [{}, vref {}mV]",
            placement("ACMP", self.address),
            if self.enabled { "on" } else { "off" },
            self.vref_mv()
        )
    }
}
