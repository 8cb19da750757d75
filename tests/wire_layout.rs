use mapattic::{
    codec::SeqDelta,
    delta::{
        envelope::{DeltaEnvelope, ElementDelta, RelationDelta, WayDelta},
        wire::{FULL_MARKER, WIRE_FORMAT_VERSION, WireError},
    },
    element::MemberRef,
    types::{ElementKind, Timestamp},
    versioned::Versioned,
};

fn small_way_delta() -> WayDelta {
    WayDelta {
        id: 5,
        full: false,
        nodes: SeqDelta {
            removed: vec![2],
            added: vec![(2, 99)],
        },
        geometry: SeqDelta {
            removed: vec![],
            added: vec![],
        },
    }
}

#[test]
fn way_delta_exact_layout() {
    let mut bytes = Vec::new();
    small_way_delta().encode(&mut bytes).unwrap();

    let mut expected = vec![WIRE_FORMAT_VERSION, 1];
    expected.extend_from_slice(&5u64.to_le_bytes()); // id
    expected.extend_from_slice(&1u32.to_le_bytes()); // nodes removed count
    expected.extend_from_slice(&1u32.to_le_bytes()); // nodes added count
    expected.extend_from_slice(&0u32.to_le_bytes()); // geometry removed count
    expected.extend_from_slice(&0u32.to_le_bytes()); // geometry added count
    expected.extend_from_slice(&2u32.to_le_bytes()); // removed position
    expected.extend_from_slice(&2u32.to_le_bytes()); // added position
    expected.extend_from_slice(&99u64.to_le_bytes()); // added node ref

    assert_eq!(bytes, expected);
    assert_eq!(WayDelta::decode(&bytes).unwrap(), small_way_delta());
}

#[test]
fn full_marker_sits_after_the_id() {
    let delta = WayDelta {
        id: 7,
        full: true,
        nodes: SeqDelta {
            removed: vec![],
            added: vec![(0, 1), (1, 2)],
        },
        geometry: SeqDelta {
            removed: vec![],
            added: vec![],
        },
    };

    let mut bytes = Vec::new();
    delta.encode(&mut bytes).unwrap();
    assert_eq!(&bytes[10..14], &FULL_MARKER.to_le_bytes());
    assert_eq!(WayDelta::decode(&bytes).unwrap(), delta);
}

#[test]
fn relation_delta_roundtrips() {
    let delta = RelationDelta {
        id: 31,
        full: false,
        members: SeqDelta {
            removed: vec![0, 1],
            added: vec![(
                0,
                MemberRef {
                    kind: ElementKind::Way,
                    id: 400,
                    role: 3,
                },
            )],
        },
    };

    let mut bytes = Vec::new();
    delta.encode(&mut bytes).unwrap();
    // 2 header bytes + id + two counts + two positions + one 16-byte pair.
    assert_eq!(bytes.len(), 2 + 8 + 8 + 8 + 16);
    assert_eq!(RelationDelta::decode(&bytes).unwrap(), delta);
}

#[test]
fn element_decode_dispatches_on_kind_tag() {
    let way = ElementDelta::Way(small_way_delta());
    let mut bytes = Vec::new();
    way.encode(&mut bytes).unwrap();
    assert_eq!(ElementDelta::decode(&bytes).unwrap(), way);

    let relation = ElementDelta::Relation(RelationDelta {
        id: 9,
        full: true,
        members: SeqDelta {
            removed: vec![],
            added: vec![],
        },
    });
    bytes.clear();
    relation.encode(&mut bytes).unwrap();
    assert_eq!(ElementDelta::decode(&bytes).unwrap(), relation);
}

#[test]
fn unknown_kind_tag_is_rejected() {
    let mut bytes = Vec::new();
    small_way_delta().encode(&mut bytes).unwrap();
    bytes[1] = 9;
    assert_eq!(ElementDelta::decode(&bytes), Err(WireError::UnknownKind(9)));
}

#[test]
fn unsupported_version_is_rejected() {
    let mut bytes = Vec::new();
    small_way_delta().encode(&mut bytes).unwrap();
    bytes[0] = WIRE_FORMAT_VERSION + 1;
    assert!(matches!(
        ElementDelta::decode(&bytes),
        Err(WireError::UnsupportedVersion(_))
    ));
}

#[test]
fn truncated_buffers_are_rejected_at_every_length() {
    let mut bytes = Vec::new();
    small_way_delta().encode(&mut bytes).unwrap();

    for len in 0..bytes.len() {
        let err = WayDelta::decode(&bytes[..len]);
        assert!(
            matches!(err, Err(WireError::Truncated { .. })),
            "length {len} decoded to {err:?}"
        );
    }
}

#[test]
fn hostile_count_does_not_allocate() {
    // Counts promising more records than the buffer holds must fail before
    // any allocation sized from them.
    let mut bytes = Vec::new();
    small_way_delta().encode(&mut bytes).unwrap();
    bytes[10..14].copy_from_slice(&0xfff_ffffu32.to_le_bytes());
    assert!(matches!(
        WayDelta::decode(&bytes),
        Err(WireError::Truncated { .. })
    ));
}

#[test]
fn oversized_role_is_rejected() {
    let delta = RelationDelta {
        id: 31,
        full: false,
        members: SeqDelta {
            removed: vec![],
            added: vec![(
                0,
                MemberRef {
                    kind: ElementKind::Node,
                    id: 1,
                    role: 1 << 24,
                },
            )],
        },
    };

    let mut bytes = Vec::new();
    assert_eq!(
        delta.encode(&mut bytes),
        Err(WireError::RoleOverflow(1 << 24))
    );
}

#[test]
fn versioned_wrapper_appends_five_timestamp_bytes() {
    let entry = Versioned::new(
        ElementDelta::Way(small_way_delta()),
        Timestamp::new(0x12_3456_789a),
    );

    let mut bytes = Vec::new();
    entry.encode(&mut bytes).unwrap();

    let mut value_bytes = Vec::new();
    entry.value.encode(&mut value_bytes).unwrap();
    assert_eq!(bytes.len(), value_bytes.len() + Timestamp::WIRE_LEN);
    assert_eq!(&bytes[bytes.len() - 5..], &[0x9a, 0x78, 0x56, 0x34, 0x12]);

    assert_eq!(Versioned::decode(&bytes).unwrap(), entry);
}

#[test]
fn timestamp_is_forty_bits_wide() {
    assert_eq!(Timestamp::new((1 << 40) | 123), Timestamp::new(123));
    assert_eq!(Timestamp::NOW.get(), (1 << 40) - 1);
    assert!(Timestamp::ZERO < Timestamp::new(1));
    assert!(Timestamp::new((1 << 40) - 2) < Timestamp::NOW);

    let mut bytes = Vec::new();
    Timestamp::NOW.encode_into(&mut bytes);
    assert_eq!(bytes, vec![0xff; 5]);
    assert_eq!(Timestamp::from_wire([0xff; 5]), Timestamp::NOW);
}
