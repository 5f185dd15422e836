//! The common contract of every bitstream entity.
//!
//! An entity owns a contiguous range of configuration bits inside its
//! routing matrix: one selector word per input port, in port order,
//! followed by the primitive's own state bits. [`BitstreamEntity`] supplies
//! the shared save/load machinery; a primitive only describes its ports and
//! how its state maps onto its state bits.
//!
//! Inputs never hold references to their producers. They hold an
//! [`InputSource`], which names a producer by arena handle and is resolved
//! to a net through a [`NetResolver`] (normally the owning
//! [`DeviceModel`](crate::device::DeviceModel)) at save time.

use crate::address::{EntityAddress, NetAddress, PortRef};
use crate::bits::BitArray;
use crate::error::{EntityError, SerializationError, WiringError};
use crate::primitives::PrimitiveKind;
use mixcell_common::MatrixId;
use mixcell_config::{DeviceLayout, MatrixLayout};
use serde::{Deserialize, Serialize};
use std::any::Any;
use std::fmt;
use std::ops::Range;

/// What drives one input port.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum InputSource {
    /// Nothing. Saving fails unless the port has a default level.
    Unconnected,
    /// A constant logic level, routed from the matrix's gnd or vdd net.
    Constant(bool),
    /// An output port of another entity.
    Port(PortRef),
    /// A raw net, as decoded from an image whose driver is not known.
    Net(NetAddress),
}

impl fmt::Display for InputSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Unconnected => f.write_str("unconnected"),
            Self::Constant(false) => f.write_str("gnd"),
            Self::Constant(true) => f.write_str("vdd"),
            Self::Port(port) => write!(f, "{port}"),
            Self::Net(net) => write!(f, "net {net}"),
        }
    }
}

impl InputSource {
    /// Rewrites a raw net that is one of `matrix`'s constant nets as the
    /// matching [`InputSource::Constant`], which is how such a net decodes.
    pub fn canonical(self, matrix_id: MatrixId, matrix: &MatrixLayout) -> Self {
        match self {
            Self::Net(net) if net.matrix == matrix_id => matrix
                .constant_level(net.net)
                .map_or(self, Self::Constant),
            other => other,
        }
    }
}

/// The input sources of one entity, indexed like its input ports.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InputBindings {
    sources: Vec<InputSource>,
}

impl InputBindings {
    /// Creates `count` unconnected bindings.
    pub fn new(count: usize) -> Self {
        Self {
            sources: vec![InputSource::Unconnected; count],
        }
    }

    /// Returns the number of bindings.
    pub fn len(&self) -> usize {
        self.sources.len()
    }

    /// Returns `true` if there are no bindings.
    pub fn is_empty(&self) -> bool {
        self.sources.is_empty()
    }

    /// Returns the source bound to input `index`.
    pub fn get(&self, index: usize) -> Option<InputSource> {
        self.sources.get(index).copied()
    }

    /// Rebinds input `index`. Out-of-range indices are ignored.
    pub fn set(&mut self, index: usize, source: InputSource) {
        if let Some(slot) = self.sources.get_mut(index) {
            *slot = source;
        }
    }

    /// Iterates over the sources in port order.
    pub fn iter(&self) -> impl Iterator<Item = InputSource> + '_ {
        self.sources.iter().copied()
    }

    /// Iterates mutably over the sources in port order.
    pub fn iter_mut(&mut self) -> impl Iterator<Item = &mut InputSource> {
        self.sources.iter_mut()
    }
}

/// Maps a producer's output port to the net it drives.
pub trait NetResolver {
    /// The layout the nets live in.
    fn layout(&self) -> &DeviceLayout;

    /// Returns the net driven by `port`.
    fn resolve(&self, port: PortRef) -> Result<NetAddress, WiringError>;
}

/// A primitive occupying configuration bits of the device.
///
/// The bit layout of an entity's reserved range is fixed: input selector
/// `k` is the `k`-th selector word (`selector_bits` wide, least significant
/// bit first) and the [`state_len`](Self::state_len) state bits follow the
/// last selector.
pub trait BitstreamEntity: fmt::Debug + Send + Sync {
    /// Which primitive this is.
    fn kind(&self) -> PrimitiveKind;

    /// Where the entity is placed.
    fn address(&self) -> EntityAddress;

    /// The matrix the entity's outputs drive nets in.
    fn output_matrix(&self) -> MatrixId {
        self.address().matrix
    }

    /// Input port names, in selector order.
    fn input_ports(&self) -> &'static [&'static str];

    /// Output port names; output `i` drives net `oword + i`.
    fn output_ports(&self) -> &'static [&'static str];

    /// The level an input assumes when left unconnected, if it has one.
    fn input_default(&self, _index: usize) -> Option<bool> {
        None
    }

    /// Number of state bits following the selectors.
    fn state_len(&self) -> u32 {
        0
    }

    /// Writes the logical state into `state`, which is `state_len` bits long.
    fn encode_state(&self, _state: &mut BitArray) {}

    /// Reads the logical state from `state`, which is `state_len` bits long.
    ///
    /// Must leave `self` untouched when it returns an error.
    fn decode_state(&mut self, _state: &BitArray) -> Result<(), SerializationError> {
        Ok(())
    }

    /// The entity's input bindings.
    fn bindings(&self) -> &InputBindings;

    /// The entity's input bindings, mutably.
    fn bindings_mut(&mut self) -> &mut InputBindings;

    /// A short human-readable summary of type, placement, and state.
    fn description(&self) -> String;

    /// Upcasts for downcasting to the concrete primitive.
    fn as_any(&self) -> &dyn Any;

    /// Upcasts for downcasting to the concrete primitive, mutably.
    fn as_any_mut(&mut self) -> &mut dyn Any;

    /// Number of configuration bits the entity reserves in `matrix`.
    fn config_len(&self, matrix: &MatrixLayout) -> u32 {
        self.input_ports().len() as u32 * matrix.selector_bits + self.state_len()
    }

    /// The image bits the entity reserves, or `None` if it reserves none,
    /// its matrix is unknown, or its range is not a 32-bit offset.
    fn config_range(&self, layout: &DeviceLayout) -> Option<Range<u32>> {
        let matrix = layout.matrix(self.address().matrix)?;
        let len = self.config_len(matrix);
        if len == 0 {
            return None;
        }
        let start = window_start(matrix, self.address(), len).ok()?;
        Some(start..start + len)
    }

    /// Index of the input port called `name`.
    fn input_index(&self, name: &str) -> Option<usize> {
        self.input_ports().iter().position(|p| *p == name)
    }

    /// Index of the output port called `name`.
    fn output_index(&self, name: &str) -> Option<usize> {
        self.output_ports().iter().position(|p| *p == name)
    }

    /// The source bound to input `name`.
    fn input(&self, name: &str) -> Option<InputSource> {
        self.bindings().get(self.input_index(name)?)
    }

    /// Binds input `name` to `source`. The last binding wins.
    ///
    /// A constant equal to the port's default level is stored as
    /// [`InputSource::Unconnected`], which saves to the same bits.
    fn set_input(&mut self, name: &str, source: InputSource) -> Result<(), WiringError> {
        let index = self
            .input_index(name)
            .ok_or_else(|| WiringError::UnknownInputPort(name.to_string()))?;
        let source = match (source, self.input_default(index)) {
            (InputSource::Constant(level), Some(default)) if level == default => {
                InputSource::Unconnected
            }
            _ => source,
        };
        self.bindings_mut().set(index, source);
        Ok(())
    }

    /// Serializes the entity into a window of [`config_len`](Self::config_len) bits.
    fn encode(&self, resolver: &dyn NetResolver) -> Result<BitArray, EntityError> {
        let matrix_id = self.address().matrix;
        let matrix = resolver
            .layout()
            .matrix(matrix_id)
            .ok_or(WiringError::UnknownMatrix(matrix_id))?;
        let width = matrix.selector_bits;
        let mut window = BitArray::new(self.config_len(matrix));

        for (k, &port) in self.input_ports().iter().enumerate() {
            let source = self.bindings().get(k).unwrap_or(InputSource::Unconnected);
            let net = selector_value(
                port,
                source,
                self.input_default(k),
                matrix_id,
                matrix,
                resolver,
            )?;
            window.write_field(k as u32 * width, width, net);
        }

        let mut state = BitArray::new(self.state_len());
        self.encode_state(&mut state);
        window.splice(self.input_ports().len() as u32 * width, &state);
        Ok(window)
    }

    /// Restores inputs and state from a window of
    /// [`config_len`](Self::config_len) bits.
    ///
    /// Nothing is modified unless every selector and the state decode.
    fn decode(&mut self, matrix: &MatrixLayout, window: &BitArray) -> Result<(), EntityError> {
        let expected = self.config_len(matrix);
        if window.len() != expected {
            return Err(SerializationError::Length {
                expected,
                actual: window.len(),
            }
            .into());
        }
        let matrix_id = self.address().matrix;
        let width = matrix.selector_bits;
        let ports = self.input_ports();

        let mut sources = Vec::with_capacity(ports.len());
        for (k, &port) in ports.iter().enumerate() {
            let value = window.read_field(k as u32 * width, width);
            sources.push(decode_selector(
                port,
                value,
                self.input_default(k),
                matrix_id,
                matrix,
            )?);
        }
        let state_start = ports.len() as u32 * width;
        self.decode_state(&window.slice(state_start..expected))?;

        for (slot, source) in self.bindings_mut().iter_mut().zip(sources) {
            *slot = source;
        }
        Ok(())
    }

    /// Serializes the entity into its reserved range of `image`.
    ///
    /// Bits outside the range are untouched, and on error `image` is not
    /// modified at all.
    fn save(&self, image: &mut BitArray, resolver: &dyn NetResolver) -> Result<(), EntityError> {
        let window = self.encode(resolver)?;
        if window.is_empty() {
            return Ok(());
        }
        let matrix_id = self.address().matrix;
        let matrix = resolver
            .layout()
            .matrix(matrix_id)
            .ok_or(WiringError::UnknownMatrix(matrix_id))?;
        let start = window_start(matrix, self.address(), window.len())?;
        check_fits(image, start, window.len())?;
        image.splice(start, &window);
        Ok(())
    }

    /// Restores the entity from its reserved range of `image`.
    fn load(&mut self, image: &BitArray, layout: &DeviceLayout) -> Result<(), EntityError> {
        let matrix_id = self.address().matrix;
        let matrix = layout
            .matrix(matrix_id)
            .ok_or(WiringError::UnknownMatrix(matrix_id))?;
        let len = self.config_len(matrix);
        let start = window_start(matrix, self.address(), len)?;
        check_fits(image, start, len)?;
        self.decode(matrix, &image.slice(start..start + len))
    }
}

/// First image bit of an entity's window of `len` bits.
fn window_start(
    matrix: &MatrixLayout,
    address: EntityAddress,
    len: u32,
) -> Result<u32, SerializationError> {
    matrix
        .word_offset(address.ibase)
        .filter(|start| start.checked_add(len).is_some())
        .ok_or(SerializationError::AddressOverflow {
            ibase: address.ibase,
        })
}

fn check_fits(image: &BitArray, start: u32, len: u32) -> Result<(), SerializationError> {
    if u64::from(start) + u64::from(len) > u64::from(image.len()) {
        return Err(SerializationError::Length {
            expected: start.saturating_add(len),
            actual: image.len(),
        });
    }
    Ok(())
}

/// Computes the selector value for one input.
fn selector_value(
    port: &'static str,
    source: InputSource,
    default: Option<bool>,
    matrix_id: MatrixId,
    matrix: &MatrixLayout,
    resolver: &dyn NetResolver,
) -> Result<u32, WiringError> {
    let constant = |level: bool| {
        matrix
            .constant_net(level)
            .ok_or(WiringError::NoConstantNet {
                port,
                level,
                matrix: matrix_id,
            })
    };
    let net = match source {
        InputSource::Unconnected => match default {
            Some(level) => constant(level)?,
            None => return Err(WiringError::Unconnected(port)),
        },
        InputSource::Constant(level) => constant(level)?,
        InputSource::Port(producer) => same_matrix(port, resolver.resolve(producer)?, matrix_id)?,
        InputSource::Net(net) => same_matrix(port, net, matrix_id)?,
    };
    if u64::from(net) >= matrix.selector_capacity() {
        return Err(WiringError::SelectorOverflow {
            port,
            net,
            width: matrix.selector_bits,
        });
    }
    if net >= matrix.nets {
        return Err(WiringError::UnknownNet {
            port,
            net: NetAddress::new(matrix_id, net),
        });
    }
    Ok(net)
}

fn same_matrix(port: &'static str, net: NetAddress, matrix: MatrixId) -> Result<u32, WiringError> {
    if net.matrix != matrix {
        return Err(WiringError::CrossMatrix {
            port,
            source_net: net,
            matrix,
        });
    }
    Ok(net.net)
}

/// Interprets one selector value read from an image.
fn decode_selector(
    port: &'static str,
    value: u32,
    default: Option<bool>,
    matrix_id: MatrixId,
    matrix: &MatrixLayout,
) -> Result<InputSource, SerializationError> {
    if value >= matrix.nets {
        return Err(SerializationError::InvalidSelector {
            port,
            value,
            nets: matrix.nets,
        });
    }
    Ok(match matrix.constant_level(value) {
        Some(level) if default == Some(level) => InputSource::Unconnected,
        Some(level) => InputSource::Constant(level),
        None => InputSource::Net(NetAddress::new(matrix_id, value)),
    })
}
