//! End-to-end tests of the device model: placement, wiring, whole-device
//! save and load, relinking, and image encodings.

use mixcell_bitstream::image::{from_bytes, parse_text, to_bytes, write_text};
use mixcell_bitstream::primitives::{
    Comparator, Counter, CrossConnection, Direction, Divider, Flipflop, Gain, Hysteresis,
    InputPin, Inverter, IoBuffer, Lut, Mux, Oscillator, Pull, ResetMode,
};
use mixcell_bitstream::{
    BitArray, BitstreamEntity, CommitState, DeviceModel, EntityAddress, EntityError, InputSource,
    NetAddress, PortRef, SerializationError, WiringError,
};
use mixcell_common::{EntityId, MatrixId};
use mixcell_config::{load_layout_from_str, DeviceLayout};
use mixcell_diagnostics::{DiagnosticSink, Severity};
use std::fmt::Debug;

struct Ids {
    pin: EntityId,
    pin2: EntityId,
    inv: EntityId,
    lut: EntityId,
    ff: EntityId,
    cnt: EntityId,
    mux: EntityId,
    acmp: EntityId,
    iob: EntityId,
    osc: EntityId,
    xconn: EntityId,
    inv_m1: EntityId,
}

/// Places one of every primitive. When `configure` is set, also wires
/// them together and sets non-default state.
fn build(configure: bool) -> (DeviceModel, Ids) {
    let mut m = DeviceModel::new(DeviceLayout::slg46620_like()).unwrap();
    let ids = Ids {
        pin: m.add(InputPin::new(EntityAddress::new(0, 0, 1))).unwrap(),
        pin2: m.add(InputPin::new(EntityAddress::new(0, 0, 2))).unwrap(),
        inv: m.add(Inverter::new(EntityAddress::new(0, 0, 3))).unwrap(),
        lut: m.add(Lut::new(EntityAddress::new(0, 1, 4), 3).unwrap()).unwrap(),
        ff: m.add(Flipflop::new(EntityAddress::new(0, 6, 5))).unwrap(),
        cnt: m.add(Counter::new(EntityAddress::new(0, 10, 6), 14).unwrap()).unwrap(),
        mux: m.add(Mux::new(EntityAddress::new(0, 15, 7), 4).unwrap()).unwrap(),
        acmp: m.add(Comparator::new(EntityAddress::new(0, 21, 8))).unwrap(),
        iob: m.add(IoBuffer::new(EntityAddress::new(0, 24, 9))).unwrap(),
        osc: m.add(Oscillator::new(EntityAddress::new(0, 27, 10))).unwrap(),
        xconn: m
            .add(CrossConnection::new(EntityAddress::new(0, 28, 1), MatrixId::from_raw(1)).unwrap())
            .unwrap(),
        inv_m1: m.add(Inverter::new(EntityAddress::new(1, 0, 2))).unwrap(),
    };
    if !configure {
        return (m, ids);
    }

    m.connect(ids.pin, "OUT", ids.inv, "IN").unwrap();

    m.connect(ids.inv, "OUT", ids.lut, "IN0").unwrap();
    m.connect(ids.pin2, "OUT", ids.lut, "IN1").unwrap();
    m.set_input(ids.lut, "IN2", InputSource::Constant(true)).unwrap();
    m.get_mut::<Lut>(ids.lut).unwrap().set_truth_table(0x96);

    m.connect(ids.lut, "OUT", ids.ff, "D").unwrap();
    m.connect(ids.osc, "OUT", ids.ff, "CLK").unwrap();
    m.set_input(ids.ff, "nRST", InputSource::Constant(false)).unwrap();
    let ff = m.get_mut::<Flipflop>(ids.ff).unwrap();
    ff.has_reset = true;
    ff.init = true;

    m.connect(ids.osc, "OUT", ids.cnt, "CLK").unwrap();
    let cnt = m.get_mut::<Counter>(ids.cnt).unwrap();
    cnt.set_reload(1000).unwrap();
    cnt.set_reset_mode(ResetMode::FallingEdge);

    m.connect(ids.pin, "OUT", ids.mux, "IN0").unwrap();
    m.connect(ids.pin2, "OUT", ids.mux, "IN1").unwrap();
    m.connect(ids.inv, "OUT", ids.mux, "IN2").unwrap();
    m.connect(ids.ff, "Q", ids.mux, "IN3").unwrap();
    m.connect(ids.cnt, "OUT", ids.mux, "SEL0").unwrap();
    m.set_input(ids.mux, "SEL1", InputSource::Constant(false)).unwrap();

    m.connect(ids.pin2, "OUT", ids.acmp, "IN").unwrap();
    let acmp = m.get_mut::<Comparator>(ids.acmp).unwrap();
    acmp.enabled = true;
    acmp.hysteresis = Hysteresis::Mv50;
    acmp.gain = Gain::Half;
    acmp.set_vref_code(12).unwrap();

    m.connect(ids.mux, "OUT", ids.iob, "IN").unwrap();
    m.connect(ids.acmp, "OUT", ids.iob, "OE").unwrap();
    let iob = m.get_mut::<IoBuffer>(ids.iob).unwrap();
    iob.direction = Direction::Output;
    iob.pull = Pull::Up;
    iob.double_drive = true;

    let osc = m.get_mut::<Oscillator>(ids.osc).unwrap();
    osc.enabled = true;
    osc.divider = Divider::Div8;

    m.connect(ids.iob, "OUT", ids.xconn, "IN").unwrap();
    m.connect(ids.xconn, "OUT", ids.inv_m1, "IN").unwrap();

    (m, ids)
}

fn assert_same<T: BitstreamEntity + PartialEq + Debug + 'static>(
    a: &DeviceModel,
    b: &DeviceModel,
    id: EntityId,
) {
    let left = a.get::<T>(id).expect("entity of expected type");
    let right = b.get::<T>(id).expect("entity of expected type");
    assert_eq!(left, right, "entity {id} differs after round trip");
}

#[test]
fn unconnected_inverter_fails_to_save() {
    let mut model = DeviceModel::new(DeviceLayout::tiny(64)).unwrap();
    let inv = model.add(Inverter::new(EntityAddress::new(0, 4, 0))).unwrap();
    assert_eq!(model.reserved_range(inv), Some(4..5));

    model.set_input(inv, "IN", InputSource::Unconnected).unwrap();
    let sink = DiagnosticSink::new();
    let err = model.save(&sink).unwrap_err();

    assert_eq!(err.failures.len(), 1);
    assert_eq!(err.failures[0].entity, inv);
    assert_eq!(
        err.failures[0].error,
        EntityError::Wiring(WiringError::Unconnected("IN"))
    );
    assert_eq!(model.image(), &BitArray::new(64));
    assert_eq!(model.commit_state(inv), Some(CommitState::Unsaved));

    let diags = sink.take_all();
    assert_eq!(diags.len(), 1);
    assert_eq!(diags[0].code.to_string(), "R106");
    assert_eq!(diags[0].location.as_ref().unwrap().entity, inv);
}

#[test]
fn dangling_producer_fails_to_save() {
    let mut model = DeviceModel::new(DeviceLayout::tiny(64)).unwrap();
    let inv = model.add(Inverter::new(EntityAddress::new(0, 4, 0))).unwrap();
    let ghost = EntityId::from_raw(42);
    model
        .set_input(inv, "IN", InputSource::Port(PortRef::new(ghost, 0)))
        .unwrap();
    let err = model.save(&DiagnosticSink::new()).unwrap_err();
    assert_eq!(
        err.failures[0].error,
        EntityError::Wiring(WiringError::UnknownEntity(ghost))
    );
}

#[test]
fn selector_encodes_producer_net() {
    let mut model = DeviceModel::new(DeviceLayout::slg46620_like()).unwrap();
    let a = model.add(InputPin::new(EntityAddress::new(0, 0, 10))).unwrap();
    let b = model.add(Inverter::new(EntityAddress::new(0, 4, 11))).unwrap();
    model.connect(a, "OUT", b, "IN").unwrap();
    model.save(&DiagnosticSink::new()).unwrap();

    assert_eq!(model.image().read_field(24, 6), 10);
    assert_eq!(model.image().count_ones(), 2);

    let mut fresh = DeviceModel::new(DeviceLayout::slg46620_like()).unwrap();
    let a2 = fresh.add(InputPin::new(EntityAddress::new(0, 0, 10))).unwrap();
    let b2 = fresh.add(Inverter::new(EntityAddress::new(0, 4, 11))).unwrap();
    let sink = DiagnosticSink::new();
    fresh.load_image(model.image().clone(), &sink).unwrap();

    assert_eq!(
        fresh.entity(b2).unwrap().input("IN"),
        Some(InputSource::Port(PortRef::new(a2, 0)))
    );
    assert!(sink.diagnostics().is_empty());
}

#[test]
fn last_connection_wins() {
    let mut model = DeviceModel::new(DeviceLayout::slg46620_like()).unwrap();
    let a = model.add(InputPin::new(EntityAddress::new(0, 0, 10))).unwrap();
    let c = model.add(InputPin::new(EntityAddress::new(0, 0, 20))).unwrap();
    let b = model.add(Inverter::new(EntityAddress::new(0, 4, 11))).unwrap();
    model.connect(a, "OUT", b, "IN").unwrap();
    model.connect(c, "OUT", b, "IN").unwrap();
    model.save(&DiagnosticSink::new()).unwrap();
    assert_eq!(model.image().read_field(24, 6), 20);
}

#[test]
fn every_primitive_round_trips() {
    let (mut original, ids) = build(true);
    original.save(&DiagnosticSink::new()).unwrap();

    let (mut loaded, _) = build(false);
    let sink = DiagnosticSink::new();
    loaded
        .load_image(original.image().clone(), &sink)
        .unwrap();
    assert!(sink.diagnostics().is_empty());

    assert_same::<InputPin>(&original, &loaded, ids.pin);
    assert_same::<InputPin>(&original, &loaded, ids.pin2);
    assert_same::<Inverter>(&original, &loaded, ids.inv);
    assert_same::<Lut>(&original, &loaded, ids.lut);
    assert_same::<Flipflop>(&original, &loaded, ids.ff);
    assert_same::<Counter>(&original, &loaded, ids.cnt);
    assert_same::<Mux>(&original, &loaded, ids.mux);
    assert_same::<Comparator>(&original, &loaded, ids.acmp);
    assert_same::<IoBuffer>(&original, &loaded, ids.iob);
    assert_same::<Oscillator>(&original, &loaded, ids.osc);
    assert_same::<CrossConnection>(&original, &loaded, ids.xconn);
    assert_same::<Inverter>(&original, &loaded, ids.inv_m1);

    for (id, _) in loaded.entities() {
        assert_eq!(loaded.commit_state(id), Some(CommitState::Committed));
    }
}

#[test]
fn save_after_load_reproduces_image() {
    let (mut original, _) = build(true);
    original.save(&DiagnosticSink::new()).unwrap();

    let (mut loaded, _) = build(false);
    let sink = DiagnosticSink::new();
    loaded.load_image(original.image().clone(), &sink).unwrap();
    loaded.image_mut().splice(0, &BitArray::new(2048));
    loaded.save(&sink).unwrap();

    assert_eq!(loaded.image(), original.image());
}

#[test]
fn constant_net_bindings_round_trip() {
    let fresh = || {
        let mut m = DeviceModel::new(DeviceLayout::slg46620_like()).unwrap();
        let inv = m.add(Inverter::new(EntityAddress::new(0, 4, 1))).unwrap();
        let ff = m.add(Flipflop::new(EntityAddress::new(0, 8, 2))).unwrap();
        (m, inv, ff)
    };
    let gnd = InputSource::Net(NetAddress::new(MatrixId::from_raw(0), 0));
    let vdd = InputSource::Net(NetAddress::new(MatrixId::from_raw(0), 63));

    let (mut model, inv, ff) = fresh();
    model.set_input(inv, "IN", gnd).unwrap();
    model.set_input(ff, "D", vdd).unwrap();
    model.set_input(ff, "CLK", gnd).unwrap();
    model.set_input(ff, "nRST", vdd).unwrap();
    assert_eq!(
        model.entity(inv).unwrap().input("IN"),
        Some(InputSource::Constant(false))
    );
    assert_eq!(
        model.entity(ff).unwrap().input("nRST"),
        Some(InputSource::Unconnected)
    );
    model.save(&DiagnosticSink::new()).unwrap();

    let (mut loaded, _, _) = fresh();
    loaded
        .load_image(model.image().clone(), &DiagnosticSink::new())
        .unwrap();
    assert_same::<Inverter>(&model, &loaded, inv);
    assert_same::<Flipflop>(&model, &loaded, ff);
}

#[test]
fn construction_is_reproducible() {
    let (mut a, _) = build(true);
    let (mut b, _) = build(true);
    a.save(&DiagnosticSink::new()).unwrap();
    b.save(&DiagnosticSink::new()).unwrap();
    assert_eq!(a.image_hash(), b.image_hash());
    assert_ne!(a.image_hash(), BitArray::new(2048).content_hash());
}

#[test]
fn reservations_are_disjoint() {
    let (model, _) = build(true);
    model.verify().unwrap();
    let mut ranges: Vec<_> = model
        .entities()
        .filter_map(|(id, _)| model.reserved_range(id))
        .collect();
    ranges.sort_by_key(|r| r.start);
    for pair in ranges.windows(2) {
        assert!(pair[0].end <= pair[1].start, "{:?} overlaps {:?}", pair[0], pair[1]);
    }
    let claimed: u32 = ranges.iter().map(|r| r.end - r.start).sum();
    let free: u32 = model.unclaimed().iter().map(|r| r.end - r.start).sum();
    assert_eq!(claimed + free + 64, 2048);
}

#[test]
fn config_len_and_ports_do_not_depend_on_state() {
    let (configured, ids) = build(true);
    let (blank, _) = build(false);
    let matrix = &configured.layout().matrices[0];
    for id in [ids.lut, ids.ff, ids.cnt, ids.acmp, ids.iob, ids.osc] {
        let a = configured.entity(id).unwrap();
        let b = blank.entity(id).unwrap();
        assert_eq!(a.config_len(matrix), b.config_len(matrix));
        assert_eq!(a.input_ports(), b.input_ports());
        assert_eq!(a.output_ports(), b.output_ports());
    }
}

#[test]
fn failed_save_leaves_image_untouched() {
    let (mut model, ids) = build(true);
    model.save(&DiagnosticSink::new()).unwrap();
    let before = model.image().clone();

    model.get_mut::<Lut>(ids.lut).unwrap().set_truth_table(0x01);
    model.set_input(ids.inv, "IN", InputSource::Unconnected).unwrap();
    model.set_input(ids.iob, "IN", InputSource::Unconnected).unwrap();

    let sink = DiagnosticSink::new();
    let err = model.save(&sink).unwrap_err();
    let failed: Vec<_> = err.failures.iter().map(|f| f.entity).collect();
    assert_eq!(failed, vec![ids.inv, ids.iob]);
    assert_eq!(sink.error_count(), 2);
    assert_eq!(model.image(), &before);

    model.connect(ids.pin, "OUT", ids.inv, "IN").unwrap();
    model.connect(ids.mux, "OUT", ids.iob, "IN").unwrap();
    model.save(&sink).unwrap();
    let lut_bits = model.reserved_range(ids.lut).unwrap();
    let changed = model.image().diff(&before);
    assert_eq!(changed.len(), (0x96u32 ^ 0x01).count_ones() as usize);
    assert!(changed.iter().all(|bit| lut_bits.contains(bit)));
}

#[test]
fn cross_matrix_wiring_rejected() {
    let (mut model, ids) = build(true);
    model.connect(ids.pin, "OUT", ids.inv_m1, "IN").unwrap();
    let err = model.save(&DiagnosticSink::new()).unwrap_err();
    assert!(matches!(
        err.failures[0].error,
        EntityError::Wiring(WiringError::CrossMatrix { port: "IN", .. })
    ));
}

#[test]
fn invalid_field_fails_only_that_entity() {
    let (mut original, ids) = build(true);
    original.save(&DiagnosticSink::new()).unwrap();
    let mut image = original.image().clone();
    // io buffer state starts after its two selectors; pull lives at +2
    let pull = original.reserved_range(ids.iob).unwrap().start + 12 + 2;
    image.write_field(pull, 2, 0b11);

    let (mut loaded, _) = build(false);
    let before = loaded.get::<IoBuffer>(ids.iob).unwrap().clone();
    let sink = DiagnosticSink::new();
    let err = loaded.load_image(image, &sink).unwrap_err();

    assert_eq!(err.failures.len(), 1);
    assert_eq!(err.failures[0].entity, ids.iob);
    assert_eq!(
        err.failures[0].error,
        EntityError::Serialization(SerializationError::InvalidField {
            field: "pull",
            value: 3
        })
    );
    assert_eq!(loaded.get::<IoBuffer>(ids.iob).unwrap(), &before);
    assert_eq!(loaded.commit_state(ids.iob), Some(CommitState::Unsaved));
    assert_same::<Lut>(&original, &loaded, ids.lut);
    assert_eq!(sink.count(Severity::Error), 1);
}

#[test]
fn invalid_selector_fails_load() {
    let layout = load_layout_from_str(
        r#"
[device]
name = "narrow"
bitstream_len = 32

[[matrix]]
base = 0
words = 8
selector_bits = 4
nets = 10
gnd_net = 0
vdd_net = 9
"#,
    )
    .unwrap();
    let mut model = DeviceModel::new(layout).unwrap();
    let inv = model.add(Inverter::new(EntityAddress::new(0, 2, 3))).unwrap();
    model.image_mut().write_field(8, 4, 12);
    let err = model.load(&DiagnosticSink::new()).unwrap_err();
    assert_eq!(
        err.failures[0].error,
        EntityError::Serialization(SerializationError::InvalidSelector {
            port: "IN",
            value: 12,
            nets: 10
        })
    );
    assert_eq!(model.entity(inv).unwrap().input("IN"), Some(InputSource::Unconnected));
}

#[test]
fn undriven_net_stays_raw_with_warning() {
    let mut model = DeviceModel::new(DeviceLayout::slg46620_like()).unwrap();
    let inv = model.add(Inverter::new(EntityAddress::new(0, 4, 11))).unwrap();
    model.image_mut().write_field(24, 6, 30);

    let sink = DiagnosticSink::new();
    model.load(&sink).unwrap();
    assert_eq!(model.relink(&sink), 0);

    let net = NetAddress::new(MatrixId::from_raw(0), 30);
    assert_eq!(model.entity(inv).unwrap().input("IN"), Some(InputSource::Net(net)));
    let diags = sink.take_all();
    assert_eq!(diags.len(), 1);
    assert_eq!(diags[0].severity, Severity::Warning);
    assert_eq!(diags[0].code.to_string(), "W301");

    // a raw net saves back to the same selector
    model.save(&sink).unwrap();
    assert_eq!(model.image().read_field(24, 6), 30);
}

#[test]
fn save_preserves_unclaimed_bits() {
    let (mut model, _) = build(true);
    let free = model.unclaimed();
    let bit = free.last().unwrap().end - 1;
    model.image_mut().set(bit, true);
    model.image_mut().set(2047, true);
    model.save(&DiagnosticSink::new()).unwrap();
    assert!(model.image().get(bit));
    assert!(model.image().get(2047));
}

#[test]
fn wrong_length_image_rejected() {
    let (mut model, _) = build(false);
    let sink = DiagnosticSink::new();
    let err = model.load_image(BitArray::new(100), &sink).unwrap_err();
    assert_eq!(err.failures.len(), model.len());
    assert_eq!(model.image().len(), 2048);

    let diags = sink.take_all();
    assert_eq!(diags.len(), model.len());
    assert!(diags.iter().all(|d| d.code.to_string() == "S203"));
    assert_eq!(
        diags[2].location.as_ref().map(|l| l.entity),
        Some(EntityId::from_raw(2))
    );
}

#[test]
fn text_and_byte_images_load() {
    let (mut original, ids) = build(true);
    original.save(&DiagnosticSink::new()).unwrap();

    let text = write_text(original.image());
    let from_text = parse_text(&text, 2048).unwrap();
    let bytes = to_bytes(original.image());
    assert_eq!(bytes.len(), 256);
    let decoded = from_bytes(&bytes, 2048).unwrap();
    assert_eq!(from_text, decoded);

    let (mut loaded, _) = build(false);
    loaded.load_image(from_text, &DiagnosticSink::new()).unwrap();
    assert_same::<Counter>(&original, &loaded, ids.cnt);
    assert_same::<Comparator>(&original, &loaded, ids.acmp);
}
