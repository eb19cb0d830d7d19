use bsonic::{
    array_from_bin, binary_size, check_key, encode_into, from_bin, to_bin, DbRef, Document,
    EncodeOptions, Error, ObjectId, Value,
};

fn plain() -> EncodeOptions {
    EncodeOptions::default()
}

#[test]
fn end_to_end_int_and_string() {
    let mut doc = Document::new();
    doc.insert("a", 1);
    doc.insert("b", "hi");

    let bin = to_bin(&doc, &plain()).unwrap();
    assert_eq!(
        bintext::hex::encode(&bin),
        "16000000106100010000000262000300000068690000"
    );

    // The length field counts itself and the trailing NUL.
    assert_eq!(bin.len(), 0x16);
    assert_eq!(bin.len(), binary_size(&doc, false).unwrap());

    assert_eq!(from_bin(&bin).unwrap(), Value::Document(doc));
}

#[test]
fn minimal_int_document_bytes() {
    // {a: 1} is exactly 12 bytes: header, one int32 element, trailing NUL.
    let mut doc = Document::new();
    doc.insert("a", 1);
    let bin = to_bin(&doc, &plain()).unwrap();
    assert_eq!(bin, [12, 0, 0, 0, 0x10, b'a', 0, 1, 0, 0, 0, 0]);
    assert_eq!(from_bin(&bin).unwrap(), Value::Document(doc));

    // The same element with the length declared one byte long is malformed.
    let padded = [13, 0, 0, 0, 0x10, b'a', 0, 1, 0, 0, 0, 0, 0];
    assert!(from_bin(&padded).is_err());
}

#[test]
fn empty_document() {
    let doc = Document::new();
    let bin = to_bin(&doc, &plain()).unwrap();
    assert_eq!(bin, [5, 0, 0, 0, 0]);
    assert_eq!(from_bin(&bin).unwrap(), Value::Document(doc));
}

#[test]
fn array_element_names_are_positions() {
    let mut doc = Document::new();
    doc.insert(
        "arr",
        vec![Value::Int32(10), Value::from("x"), Value::Bool(true)],
    );

    let bin = to_bin(&doc, &plain()).unwrap();
    assert_eq!(bin.len(), binary_size(&doc, false).unwrap());
    assert_eq!(
        bintext::hex::encode(&bin),
        "230000000461727200190000001030000a000000023100020000007800083200010000"
    );

    let back = from_bin(&bin).unwrap();
    assert_eq!(back, Value::Document(doc));
}

#[test]
fn top_level_array_mode() {
    // An array document on its own: element names "0" and "1".
    let mut doc = Document::new();
    doc.insert("a", vec![Value::Int32(7), Value::from("y")]);
    let bin = to_bin(&doc, &plain()).unwrap();

    // Slice the nested array document back out and decode it in array mode.
    let inner = &bin[7..bin.len() - 1];
    let items = array_from_bin(inner).unwrap();
    assert_eq!(items, vec![Value::Int32(7), Value::from("y")]);
}

#[test]
fn encode_into_offset() {
    let mut doc = Document::new();
    doc.insert("a", 1);
    let size = binary_size(&doc, false).unwrap();

    let mut buf = vec![0xAAu8; size + 7];
    let next = encode_into(&mut buf, 7, &doc, &plain()).unwrap();
    assert_eq!(next, size + 7);
    assert!(buf[..7].iter().all(|&b| b == 0xAA));
    assert_eq!(from_bin(&buf[7..]).unwrap(), Value::Document(doc));
}

#[test]
fn encode_into_short_buffer() {
    let mut doc = Document::new();
    doc.insert("a", "some longer content");
    let mut buf = [0u8; 8];
    match encode_into(&mut buf, 0, &doc, &plain()) {
        Err(Error::BufferTooSmall { .. }) => {}
        other => panic!("unexpected: {:?}", other),
    }
}

#[test]
fn key_validation() {
    assert!(check_key("ok").is_ok());
    match check_key("$bad") {
        Err(Error::InvalidFieldName { key, reason }) => {
            assert_eq!(key, "$bad");
            assert_eq!(reason, "must not start with '$'");
        }
        other => panic!("unexpected: {:?}", other),
    }
    match check_key("has.dot") {
        Err(Error::InvalidFieldName { reason, .. }) => {
            assert_eq!(reason, "must not contain '.'");
        }
        other => panic!("unexpected: {:?}", other),
    }

    let options = EncodeOptions {
        validate_keys: true,
        allow_code: false,
    };
    let mut doc = Document::new();
    doc.insert("ok", 1);
    assert!(to_bin(&doc, &options).is_ok());

    doc.insert("$bad", 2);
    match to_bin(&doc, &options) {
        Err(Error::InvalidFieldName { .. }) => {}
        other => panic!("unexpected: {:?}", other),
    }
    // Validation off: the same document encodes.
    assert!(to_bin(&doc, &plain()).is_ok());
}

#[test]
fn key_with_nul_always_rejected() {
    let mut doc = Document::new();
    doc.insert("a\0b", 1);
    match to_bin(&doc, &plain()) {
        Err(Error::InvalidFieldName { reason, .. }) => {
            assert_eq!(reason, "must not contain a NUL byte");
        }
        other => panic!("unexpected: {:?}", other),
    }
}

#[test]
fn empty_key_is_fine() {
    let mut doc = Document::new();
    doc.insert("", 5);
    let bin = to_bin(&doc, &plain()).unwrap();
    assert_eq!(from_bin(&bin).unwrap(), Value::Document(doc));
}

#[test]
fn dbref_roundtrip() {
    let oid = ObjectId::parse_str("4d88e15b60f486e428412dc9").unwrap();
    let mut doc = Document::new();
    doc.insert("link", DbRef::new("items", oid).with_db("shop"));

    let bin = to_bin(&doc, &plain()).unwrap();
    assert_eq!(bin.len(), binary_size(&doc, false).unwrap());
    assert_eq!(from_bin(&bin).unwrap(), Value::Document(doc));
}

#[test]
fn dbref_detected_at_root() {
    let mut doc = Document::new();
    doc.insert("$ref", "items");
    doc.insert("$id", 42);
    let bin = to_bin(&doc, &plain()).unwrap();

    match from_bin(&bin).unwrap() {
        Value::DbRef(dbref) => {
            assert_eq!(dbref.namespace, "items");
            assert_eq!(dbref.id, Value::Int32(42));
            assert_eq!(dbref.db, None);
        }
        other => panic!("expected a DbRef, got {:?}", other),
    }
}

#[test]
fn dbref_with_extra_field_stays_a_document() {
    let mut doc = Document::new();
    doc.insert("$ref", "items");
    doc.insert("$id", 42);
    doc.insert("note", "not a reference");
    let bin = to_bin(&doc, &plain()).unwrap();

    match from_bin(&bin).unwrap() {
        Value::Document(back) => assert_eq!(back, doc),
        other => panic!("expected a document, got {:?}", other),
    }
}

#[test]
fn dbref_with_non_string_ref_stays_a_document() {
    let mut doc = Document::new();
    doc.insert("$ref", 1);
    doc.insert("$id", 2);
    let bin = to_bin(&doc, &plain()).unwrap();
    match from_bin(&bin).unwrap() {
        Value::Document(back) => assert_eq!(back, doc),
        other => panic!("expected a document, got {:?}", other),
    }
}

#[test]
fn unicode_strings() {
    let mut doc = Document::new();
    doc.insert("greeting", "héllo wörld ✓");
    let bin = to_bin(&doc, &plain()).unwrap();
    assert_eq!(bin.len(), binary_size(&doc, false).unwrap());
    assert_eq!(from_bin(&bin).unwrap(), Value::Document(doc));
}

#[test]
fn insertion_order_survives_the_wire() {
    let mut doc = Document::new();
    for key in &["zeta", "alpha", "mu", "beta"] {
        doc.insert(*key, 1);
    }
    let bin = to_bin(&doc, &plain()).unwrap();
    let back = from_bin(&bin).unwrap();
    let keys: Vec<String> = match back {
        Value::Document(d) => d.into_iter().map(|(k, _)| k).collect(),
        other => panic!("unexpected: {:?}", other),
    };
    assert_eq!(keys, ["zeta", "alpha", "mu", "beta"]);
}
