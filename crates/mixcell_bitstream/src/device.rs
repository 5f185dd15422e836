//! The device model: sole owner of the configuration image and its entities.
//!
//! Entities live in an arena and are addressed by [`EntityId`]. Adding an
//! entity checks its reservation against every other entity and the
//! device's reserved ranges, and its outputs against every other driver,
//! so two entities can never claim the same bit or drive the same net.
//!
//! Saving serializes each entity into its own window in parallel, then
//! splices the windows into the image only if all of them succeeded.

use crate::address::{EntityAddress, NetAddress, PortRef};
use crate::bits::BitArray;
use crate::entity::{BitstreamEntity, InputSource, NetResolver};
use crate::error::{
    ConfigurationError, EntityError, EntityFailure, ModelError, SerializationError, WiringError,
};
use crate::primitives::PrimitiveKind;
use mixcell_common::{ContentHash, EntityId, InternalError, MatrixId, MixResult};
use mixcell_config::{validate_layout, ConfigError, DeviceLayout};
use mixcell_diagnostics::{Category, Diagnostic, DiagnosticCode, DiagnosticSink};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::ops::Range;

/// Whether an entity's logical state is reflected in the image.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CommitState {
    /// Changed since the last successful save or load.
    Unsaved,
    /// Matches the image as of the last successful save or load.
    Committed,
}

/// A serializable snapshot of one entity, for reports.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EntitySummary {
    /// The entity's handle.
    pub id: EntityId,
    /// Its primitive kind.
    pub kind: PrimitiveKind,
    /// Its description.
    pub description: String,
    /// Its placement.
    pub address: EntityAddress,
    /// The image bits it reserves.
    pub config_bits: Option<Range<u32>>,
    /// Each input port with its source, in port order.
    pub inputs: Vec<(String, String)>,
    /// Each output port with the net it drives.
    pub outputs: Vec<(String, NetAddress)>,
    /// Whether its state is in the image.
    pub state: CommitState,
}

struct Slot {
    entity: Box<dyn BitstreamEntity>,
    state: CommitState,
}

/// Owns a configuration image, the entities placed in it, and the
/// net-to-driver index used to resolve and relink wiring.
pub struct DeviceModel {
    layout: DeviceLayout,
    image: BitArray,
    slots: Vec<Slot>,
    /// Start bit of each reservation, mapped to its end and owner.
    claims: BTreeMap<u32, (u32, EntityId)>,
    drivers: BTreeMap<NetAddress, PortRef>,
}

impl DeviceModel {
    /// Creates an empty model with an all-zero image.
    pub fn new(layout: DeviceLayout) -> Result<Self, ConfigError> {
        validate_layout(&layout)?;
        let image = BitArray::new(layout.bitstream_len());
        Ok(Self {
            layout,
            image,
            slots: Vec::new(),
            claims: BTreeMap::new(),
            drivers: BTreeMap::new(),
        })
    }

    /// The device layout.
    pub fn layout(&self) -> &DeviceLayout {
        &self.layout
    }

    /// The configuration image.
    pub fn image(&self) -> &BitArray {
        &self.image
    }

    /// The configuration image, mutably. Edits are not reflected in any
    /// entity until the next [`load`](Self::load).
    pub fn image_mut(&mut self) -> &mut BitArray {
        &mut self.image
    }

    /// Content hash of the image.
    pub fn image_hash(&self) -> ContentHash {
        self.image.content_hash()
    }

    /// Number of entities.
    pub fn len(&self) -> usize {
        self.slots.len()
    }

    /// Returns `true` if the model holds no entities.
    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    /// Adds an entity at the address it was built with.
    pub fn add(&mut self, entity: impl BitstreamEntity + 'static) -> Result<EntityId, ConfigurationError> {
        self.add_boxed(Box::new(entity))
    }

    /// Adds an already boxed entity.
    pub fn add_boxed(&mut self, entity: Box<dyn BitstreamEntity>) -> Result<EntityId, ConfigurationError> {
        let address = entity.address();
        let matrix = self
            .layout
            .matrix(address.matrix)
            .ok_or(ConfigurationError::UnknownMatrix(address.matrix))?;

        let len = entity.config_len(matrix);
        let bits = if len > 0 {
            let start = u64::from(matrix.base)
                + u64::from(address.ibase) * u64::from(matrix.selector_bits);
            let end = start + u64::from(len);
            let region = matrix.region();
            if start < u64::from(region.start) || end > u64::from(region.end) {
                return Err(ConfigurationError::OutsideMatrix {
                    matrix: address.matrix,
                    bits: clamp(start)..clamp(end),
                    region,
                });
            }
            let bits = start as u32..end as u32;
            self.check_free(&bits)?;
            Some(bits)
        } else {
            None
        };

        let outputs = self.output_nets(entity.as_ref())?;
        for &net in &outputs {
            self.check_drivable(net)?;
        }

        let id = EntityId::from_raw(self.slots.len() as u32);
        if let Some(bits) = bits {
            self.claims.insert(bits.start, (bits.end, id));
        }
        for (i, net) in outputs.into_iter().enumerate() {
            self.drivers.insert(net, PortRef::new(id, i as u32));
        }
        self.slots.push(Slot {
            entity,
            state: CommitState::Unsaved,
        });
        Ok(id)
    }

    /// Builds an entity at the first free address in `matrix` and adds it.
    ///
    /// `build` is called once at a scratch address to learn the entity's
    /// size and output count, then again at the chosen address.
    pub fn place<E, F>(&mut self, matrix: MatrixId, build: F) -> Result<EntityId, ConfigurationError>
    where
        E: BitstreamEntity + 'static,
        F: Fn(EntityAddress) -> Result<E, ConfigurationError>,
    {
        let probe = build(EntityAddress {
            matrix,
            ibase: 0,
            oword: 0,
        })?;
        let layout = self
            .layout
            .matrix(matrix)
            .ok_or(ConfigurationError::UnknownMatrix(matrix))?;
        let address = self.allocate(
            matrix,
            probe.config_len(layout),
            probe.output_matrix(),
            probe.output_ports().len() as u32,
        )?;
        self.add(build(address)?)
    }

    /// Finds the first free selector run able to hold `config_len` bits in
    /// `matrix`, and the first run of `outputs` drivable nets in
    /// `output_matrix`.
    pub fn allocate(
        &self,
        matrix: MatrixId,
        config_len: u32,
        output_matrix: MatrixId,
        outputs: u32,
    ) -> Result<EntityAddress, ConfigurationError> {
        let exhausted = ConfigurationError::Exhausted {
            matrix,
            bits: config_len,
            outputs,
        };
        let m = self
            .layout
            .matrix(matrix)
            .ok_or(ConfigurationError::UnknownMatrix(matrix))?;
        let om = self
            .layout
            .matrix(output_matrix)
            .ok_or(ConfigurationError::UnknownMatrix(output_matrix))?;

        let ibase = if config_len == 0 {
            0
        } else {
            let words = config_len.div_ceil(m.selector_bits);
            let last = m.words.checked_sub(words).ok_or_else(|| exhausted.clone())?;
            (0..=last)
                .find(|&w| {
                    m.word_offset(w)
                        .and_then(|start| Some(start..start.checked_add(config_len)?))
                        .is_some_and(|bits| self.check_free(&bits).is_ok())
                })
                .ok_or_else(|| exhausted.clone())?
        };

        let oword = if outputs == 0 {
            0
        } else {
            let last = om.nets.checked_sub(outputs).ok_or_else(|| exhausted.clone())?;
            (0..=last)
                .find(|&first| {
                    (first..first + outputs)
                        .all(|n| self.check_drivable(NetAddress::new(output_matrix, n)).is_ok())
                })
                .ok_or(exhausted)?
        };

        Ok(EntityAddress {
            matrix,
            ibase,
            oword,
        })
    }

    /// Looks up an entity.
    pub fn entity(&self, id: EntityId) -> Option<&dyn BitstreamEntity> {
        self.slots.get(id.index()).map(|s| s.entity.as_ref())
    }

    /// Looks up an entity for modification and marks it unsaved.
    pub fn entity_mut(&mut self, id: EntityId) -> Option<&mut dyn BitstreamEntity> {
        let slot = self.slots.get_mut(id.index())?;
        slot.state = CommitState::Unsaved;
        Some(slot.entity.as_mut())
    }

    /// Looks up an entity as its concrete primitive type.
    pub fn get<T: BitstreamEntity + 'static>(&self, id: EntityId) -> Option<&T> {
        self.entity(id)?.as_any().downcast_ref()
    }

    /// Looks up an entity as its concrete primitive type for modification,
    /// and marks it unsaved.
    pub fn get_mut<T: BitstreamEntity + 'static>(&mut self, id: EntityId) -> Option<&mut T> {
        self.entity_mut(id)?.as_any_mut().downcast_mut()
    }

    /// Iterates over all entities in creation order.
    pub fn entities(&self) -> impl Iterator<Item = (EntityId, &dyn BitstreamEntity)> + '_ {
        self.slots
            .iter()
            .enumerate()
            .map(|(i, s)| (EntityId::from_raw(i as u32), s.entity.as_ref()))
    }

    /// Whether an entity's state is in the image.
    pub fn commit_state(&self, id: EntityId) -> Option<CommitState> {
        self.slots.get(id.index()).map(|s| s.state)
    }

    /// The image bits an entity reserves.
    pub fn reserved_range(&self, id: EntityId) -> Option<Range<u32>> {
        self.entity(id)?.config_range(&self.layout)
    }

    /// The entity driving `net`, if any.
    pub fn driver(&self, net: NetAddress) -> Option<PortRef> {
        self.drivers.get(&net).copied()
    }

    /// Image bits claimed by no entity and no device reservation.
    pub fn unclaimed(&self) -> Vec<Range<u32>> {
        let mut taken: Vec<Range<u32>> = self
            .claims
            .iter()
            .map(|(&start, &(end, _))| start..end)
            .chain(self.layout.reserved.iter().map(|r| r.range()))
            .filter(|r| !r.is_empty())
            .collect();
        taken.sort_by_key(|r| r.start);

        let mut free = Vec::new();
        let mut cursor = 0;
        for r in taken {
            if r.start > cursor {
                free.push(cursor..r.start);
            }
            cursor = cursor.max(r.end);
        }
        if cursor < self.image.len() {
            free.push(cursor..self.image.len());
        }
        free
    }

    /// Binds `consumer`'s input `input` to `source` and marks it unsaved.
    ///
    /// A raw net naming one of the consumer's constant nets is stored as
    /// the matching constant, so the binding reads back the same after a
    /// save and load.
    pub fn set_input(
        &mut self,
        consumer: EntityId,
        input: &str,
        source: InputSource,
    ) -> Result<(), WiringError> {
        let slot = self
            .slots
            .get_mut(consumer.index())
            .ok_or(WiringError::UnknownEntity(consumer))?;
        let matrix_id = slot.entity.address().matrix;
        let source = match self.layout.matrix(matrix_id) {
            Some(matrix) => source.canonical(matrix_id, matrix),
            None => source,
        };
        slot.entity.set_input(input, source)?;
        slot.state = CommitState::Unsaved;
        Ok(())
    }

    /// Wires `producer`'s output `output` to `consumer`'s input `input`.
    pub fn connect(
        &mut self,
        producer: EntityId,
        output: &str,
        consumer: EntityId,
        input: &str,
    ) -> Result<(), WiringError> {
        let index = self
            .entity(producer)
            .ok_or(WiringError::UnknownEntity(producer))?
            .output_index(output)
            .ok_or_else(|| WiringError::UnknownOutputPort(output.to_string()))?;
        self.set_input(
            consumer,
            input,
            InputSource::Port(PortRef::new(producer, index as u32)),
        )
    }

    /// Saves one entity into the image.
    pub fn save_entity(&mut self, id: EntityId) -> Result<(), EntityFailure> {
        let window = self.encode_slot(id)?;
        if let Some((start, window)) = window {
            self.image.splice(start, &window);
        }
        if let Some(slot) = self.slots.get_mut(id.index()) {
            slot.state = CommitState::Committed;
        }
        Ok(())
    }

    /// Saves every entity into the image.
    ///
    /// Each failure is reported to `sink`. If any entity fails, the image is
    /// left exactly as it was and every failure is returned.
    pub fn save(&mut self, sink: &DiagnosticSink) -> Result<(), ModelError> {
        let results: Vec<_> = (0..self.slots.len())
            .into_par_iter()
            .map(|i| self.encode_slot(EntityId::from_raw(i as u32)))
            .collect();

        let mut windows = Vec::with_capacity(results.len());
        let mut failures = Vec::new();
        for result in results {
            match result {
                Ok(window) => windows.push(window),
                Err(failure) => failures.push(failure),
            }
        }
        if !failures.is_empty() {
            sink.extend(failures.iter().map(failure_diagnostic));
            return Err(ModelError { failures });
        }

        for (start, window) in windows.into_iter().flatten() {
            self.image.splice(start, &window);
        }
        for slot in &mut self.slots {
            slot.state = CommitState::Committed;
        }
        Ok(())
    }

    /// Loads every entity from the image.
    ///
    /// Inputs come back as [`InputSource::Net`] or constants; call
    /// [`relink`](Self::relink) to turn nets back into port references.
    /// Failing entities keep their previous state and are reported to
    /// `sink`; the rest are loaded regardless.
    pub fn load(&mut self, sink: &DiagnosticSink) -> Result<(), ModelError> {
        let layout = &self.layout;
        let image = &self.image;
        let mut failures = Vec::new();
        for (i, slot) in self.slots.iter_mut().enumerate() {
            match slot.entity.load(image, layout) {
                Ok(()) => slot.state = CommitState::Committed,
                Err(error) => failures.push(EntityFailure {
                    entity: EntityId::from_raw(i as u32),
                    description: slot.entity.description(),
                    error,
                }),
            }
        }
        sink.extend(failures.iter().map(failure_diagnostic));
        if failures.is_empty() {
            Ok(())
        } else {
            Err(ModelError { failures })
        }
    }

    /// Rewrites every [`InputSource::Net`] binding whose net has a known
    /// driver into a [`InputSource::Port`] reference. Nets without a driver
    /// are left as they are and reported to `sink` as warnings.
    ///
    /// Returns the number of bindings rewritten.
    pub fn relink(&mut self, sink: &DiagnosticSink) -> usize {
        let drivers = &self.drivers;
        let mut relinked = 0;
        for (i, slot) in self.slots.iter_mut().enumerate() {
            let ports = slot.entity.input_ports();
            let description = slot.entity.description();
            for (k, source) in slot.entity.bindings_mut().iter_mut().enumerate() {
                let InputSource::Net(net) = *source else {
                    continue;
                };
                match drivers.get(&net) {
                    Some(&port) => {
                        *source = InputSource::Port(port);
                        relinked += 1;
                    }
                    None => sink.emit(
                        Diagnostic::warning(
                            DiagnosticCode::new(Category::Warning, 301),
                            format!(
                                "input `{}` reads net {net}, which no entity drives",
                                ports.get(k).copied().unwrap_or("?")
                            ),
                        )
                        .at_entity(EntityId::from_raw(i as u32), description.clone()),
                    ),
                }
            }
        }
        relinked
    }

    /// Replaces the image, then loads and relinks every entity.
    pub fn load_image(&mut self, image: BitArray, sink: &DiagnosticSink) -> Result<(), ModelError> {
        if image.len() != self.layout.bitstream_len() {
            let failures = self
                .entities()
                .map(|(id, e)| EntityFailure {
                    entity: id,
                    description: e.description(),
                    error: SerializationError::Length {
                        expected: self.layout.bitstream_len(),
                        actual: image.len(),
                    }
                    .into(),
                })
                .collect::<Vec<_>>();
            sink.extend(failures.iter().map(failure_diagnostic));
            return Err(ModelError { failures });
        }
        self.image = image;
        let loaded = self.load(sink);
        self.relink(sink);
        loaded
    }

    /// Re-derives every reservation and output net from the entities and
    /// checks them against the model's indexes.
    pub fn verify(&self) -> MixResult<()> {
        let mut ranges: Vec<(Range<u32>, EntityId)> = Vec::new();
        for (id, entity) in self.entities() {
            if let Some(range) = entity.config_range(&self.layout) {
                if range.end > self.image.len() {
                    return Err(InternalError::OutOfImage(id));
                }
                if self.claims.get(&range.start) != Some(&(range.end, id)) {
                    return Err(InternalError::StaleIndex {
                        entity: id,
                        detail: format!("reservation {range:?} is not indexed"),
                    });
                }
                ranges.push((range, id));
            }
            let address = entity.address();
            for i in 0..entity.output_ports().len() as u32 {
                let net = NetAddress::new(entity.output_matrix(), address.oword.saturating_add(i));
                if self.drivers.get(&net) != Some(&PortRef::new(id, i)) {
                    return Err(InternalError::StaleIndex {
                        entity: id,
                        detail: format!("net {net} is not indexed to output {i}"),
                    });
                }
            }
        }
        ranges.sort_by_key(|(r, _)| r.start);
        for pair in ranges.windows(2) {
            let ((a, first), (b, second)) = (&pair[0], &pair[1]);
            if b.start < a.end {
                return Err(InternalError::OverlappingClaims {
                    first: *first,
                    second: *second,
                });
            }
        }
        Ok(())
    }

    /// Snapshots every entity in creation order.
    pub fn summaries(&self) -> Vec<EntitySummary> {
        self.entities()
            .map(|(id, e)| {
                let inputs = e
                    .input_ports()
                    .iter()
                    .zip(e.bindings().iter())
                    .map(|(name, source)| (name.to_string(), source.to_string()))
                    .collect();
                let address = e.address();
                let outputs = e
                    .output_ports()
                    .iter()
                    .enumerate()
                    .map(|(i, name)| {
                        (
                            name.to_string(),
                            NetAddress::new(e.output_matrix(), address.oword.saturating_add(i as u32)),
                        )
                    })
                    .collect();
                EntitySummary {
                    id,
                    kind: e.kind(),
                    description: e.description(),
                    address,
                    config_bits: e.config_range(&self.layout),
                    inputs,
                    outputs,
                    state: self.slots[id.index()].state,
                }
            })
            .collect()
    }

    fn encode_slot(&self, id: EntityId) -> Result<Option<(u32, BitArray)>, EntityFailure> {
        let entity = self.entity(id).ok_or_else(|| EntityFailure {
            entity: id,
            description: String::new(),
            error: WiringError::UnknownEntity(id).into(),
        })?;
        let fail = |error: EntityError| EntityFailure {
            entity: id,
            description: entity.description(),
            error,
        };
        let window = entity.encode(self).map_err(fail)?;
        Ok(entity
            .config_range(&self.layout)
            .map(|range| (range.start, window)))
    }

    fn check_free(&self, bits: &Range<u32>) -> Result<(), ConfigurationError> {
        if let Some((&start, &(end, other))) = self.claims.range(..bits.end).next_back() {
            if end > bits.start {
                return Err(ConfigurationError::Overlap {
                    bits: bits.clone(),
                    other,
                    other_bits: start..end,
                });
            }
        }
        if let Some(r) = self.layout.reserved_overlap(bits) {
            return Err(ConfigurationError::Reserved {
                bits: bits.clone(),
                reason: r.reason.clone(),
            });
        }
        Ok(())
    }

    fn output_nets(&self, entity: &dyn BitstreamEntity) -> Result<Vec<NetAddress>, ConfigurationError> {
        let matrix = entity.output_matrix();
        let m = self
            .layout
            .matrix(matrix)
            .ok_or(ConfigurationError::UnknownMatrix(matrix))?;
        let oword = entity.address().oword;
        (0..entity.output_ports().len() as u32)
            .map(|i| {
                let net = NetAddress::new(matrix, oword.saturating_add(i));
                if net.net >= m.nets {
                    return Err(ConfigurationError::OutputOutOfRange { net, nets: m.nets });
                }
                Ok(net)
            })
            .collect()
    }

    fn check_drivable(&self, net: NetAddress) -> Result<(), ConfigurationError> {
        let m = self
            .layout
            .matrix(net.matrix)
            .ok_or(ConfigurationError::UnknownMatrix(net.matrix))?;
        if net.net >= m.nets {
            return Err(ConfigurationError::OutputOutOfRange { net, nets: m.nets });
        }
        if m.constant_level(net.net).is_some() {
            return Err(ConfigurationError::ConstantOutput(net));
        }
        if let Some(driver) = self.drivers.get(&net) {
            return Err(ConfigurationError::OutputCollision {
                net,
                driver: driver.entity,
            });
        }
        Ok(())
    }
}

impl NetResolver for DeviceModel {
    fn layout(&self) -> &DeviceLayout {
        &self.layout
    }

    fn resolve(&self, port: PortRef) -> Result<NetAddress, WiringError> {
        let producer = self
            .entity(port.entity)
            .ok_or(WiringError::UnknownEntity(port.entity))?;
        if port.output as usize >= producer.output_ports().len() {
            return Err(WiringError::UnknownOutputIndex {
                entity: port.entity,
                output: port.output,
            });
        }
        Ok(NetAddress::new(
            producer.output_matrix(),
            producer.address().oword.saturating_add(port.output),
        ))
    }
}

impl std::fmt::Debug for DeviceModel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DeviceModel")
            .field("device", &self.layout.device.name)
            .field("entities", &self.slots.len())
            .field("image_bits", &self.image.len())
            .finish()
    }
}

fn clamp(bit: u64) -> u32 {
    u32::try_from(bit).unwrap_or(u32::MAX)
}

fn failure_diagnostic(failure: &EntityFailure) -> Diagnostic {
    Diagnostic::error(failure.error.code(), failure.error.to_string())
        .at_entity(failure.entity, failure.description.clone())
}
