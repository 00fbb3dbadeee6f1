//! Whole-document scenarios exercising the reader, writer, filter
//! pipeline, and security handler together, the way a caller actually
//! uses this crate rather than one module in isolation. Fixtures are
//! built in-memory via `Writer`/`Document::load_mem`, the same way
//! `src/reader/tests.rs` builds its own — there are no checked-in
//! binary PDF files in this workspace.
use pdfcore::{dictionary, Dictionary, Document, Object, Permissions, SaveOptionsBuilder, Writer};

/// Scenario 1: a minimal Catalog -> Pages -> Page document written and
/// read back over a classical (non-stream) cross-reference table.
#[test]
fn minimal_document_resolves_catalog_and_page() {
    let mut writer = Writer::new();
    let pages_id = writer.pages_id();

    let page = dictionary! {
        "Type" => "Page",
        "Parent" => Object::Reference(pages_id),
        "MediaBox" => Object::Array(vec![
            Object::Integer(0),
            Object::Integer(0),
            Object::Integer(612),
            Object::Integer(792),
        ]),
    };
    let page_id = writer.document_mut().add_object(page);
    writer.add_page(page_id).unwrap();

    let mut bytes = Vec::new();
    writer.write(&mut bytes).unwrap();

    let doc = Document::load_mem(&bytes).unwrap();
    let root_id = doc.trailer.get(b"Root").unwrap().as_reference().unwrap();
    let catalog = doc.get_dict(root_id).unwrap();
    assert!(catalog.type_is(b"Catalog"));

    let pages_ref = catalog.get(b"Pages").unwrap().as_reference().unwrap();
    let pages = doc.get_dict(pages_ref).unwrap();
    assert_eq!(pages.get(b"Count").unwrap().as_i64().unwrap(), 1);

    let kids = pages.get(b"Kids").unwrap().as_array().unwrap();
    assert_eq!(kids.len(), 1);
    let page_ref = kids[0].as_reference().unwrap();
    let page = doc.get_dict(page_ref).unwrap();
    assert!(page.type_is(b"Page"));

    let media_box = page.get(b"MediaBox").unwrap().as_array().unwrap();
    let values: Vec<i64> = media_box.iter().map(|o| o.as_i64().unwrap()).collect();
    assert_eq!(values, vec![0, 0, 612, 792]);
}

/// Scenario 2: RC4-128 (R=3) round trip. Authenticating with the empty
/// user password and with the owner password must recover the same
/// file key, with the owner granted every permission bit.
#[test]
fn rc4_128_r3_user_and_owner_recover_the_same_key() {
    let mut writer = Writer::new();
    writer.encrypt("", "owner", 3, Permissions::PRINT | Permissions::MODIFY);
    let mut bytes = Vec::new();
    writer.write(&mut bytes).unwrap();

    let mut user_doc = Document::load_mem(&bytes).unwrap();
    let user_permissions = user_doc.authenticate("").unwrap();
    assert_eq!(user_permissions, Permissions::PRINT | Permissions::MODIFY);

    let mut owner_doc = Document::load_mem(&bytes).unwrap();
    let owner_permissions = owner_doc.authenticate("owner").unwrap();
    assert_eq!(owner_permissions, Permissions::owner());

    assert_eq!(
        user_doc.encryption_state.as_ref().unwrap().file_key,
        owner_doc.encryption_state.as_ref().unwrap().file_key
    );
}

/// Scenario 3: AES-256 (R=6), P=-4, EncryptMetadata=true. Authenticating
/// the user password recovers exactly P; tampering the dictionary's `/P`
/// after the fact trips the `/Perms` integrity check and authentication
/// fails even with the right password.
#[test]
fn aes_256_r6_detects_tampered_permissions() {
    let mut writer = Writer::new();
    writer.encrypt("u", "o", 6, Permissions::from_bits_truncate(-4));
    let mut bytes = Vec::new();
    writer.write(&mut bytes).unwrap();

    let mut doc = Document::load_mem(&bytes).unwrap();
    let permissions = doc.authenticate("u").unwrap();
    assert_eq!(permissions.bits(), -4);

    let mut tampered_doc = Document::load_mem(&bytes).unwrap();
    let encrypt_id = tampered_doc.trailer.get(b"Encrypt").unwrap().as_reference().unwrap();
    tampered_doc
        .get_object_mut(encrypt_id)
        .unwrap()
        .as_dict_mut()
        .unwrap()
        .set("P", -1i64);

    let mut tampered_bytes = Vec::new();
    Writer::from_document(tampered_doc).write(&mut tampered_bytes).unwrap();

    let mut reloaded = Document::load_mem(&tampered_bytes).unwrap();
    assert!(reloaded.authenticate("u").is_err());
}

/// Scenario 4: a Flate-compressed stream using the PNG-Up predictor
/// decodes back to the exact row-major ramp it was built from.
#[test]
fn flate_png_up_predictor_round_trips() {
    let ramp: Vec<u8> = (0..16u8).collect(); // 4x4, one byte per sample
    let dict = dictionary! {
        "Filter" => "FlateDecode",
        "DecodeParms" => dictionary! {
            "Predictor" => 12i64,
            "Colors" => 1i64,
            "BitsPerComponent" => 8i64,
            "Columns" => 4i64,
        },
    };

    let encoded = pdfcore::filters::encode_stream(&dict, &ramp).unwrap();
    let decoded = pdfcore::filters::decode_stream(&dict, &encoded, None).unwrap();
    assert_eq!(decoded, ramp);
}

/// Scenario 5: an object packed into a `/Type /ObjStm` container via
/// the xref-stream save path resolves to its parsed dictionary, and a
/// reference to an object number that was never written resolves to
/// `Null` rather than failing.
#[test]
fn object_stream_indirection_resolves_and_tolerates_missing_objects() {
    let mut writer = Writer::new();
    writer
        .document_mut()
        .add_object(dictionary! { "Type" => "Marker", "Value" => 42i64 });

    let mut bytes = Vec::new();
    writer
        .write_with_options(&mut bytes, SaveOptionsBuilder::new().use_object_streams(true).build())
        .unwrap();

    let doc = Document::load_mem(&bytes).unwrap();
    let marker = doc
        .iter_objects()
        .find_map(|(_, obj)| obj.as_dict().ok().filter(|d| d.type_is(b"Marker")))
        .expect("packed object should resolve from its object stream");
    assert_eq!(marker.get(b"Value").unwrap().as_i64().unwrap(), 42);

    let (_, missing) = doc.dereference(&Object::Reference((9999, 0))).unwrap();
    assert!(missing.is_null());
}

/// Scenario 6: a CCITT Group 4 (pure 2-D MMR) bitmap round trips
/// bit-for-bit through encode then decode.
#[test]
fn ccitt_group4_round_trips() {
    let mut bitmap = vec![0xFFu8; 16]; // first 8 rows: all-white (per BlackIs1=false)
    bitmap.extend(std::iter::repeat(0x00u8).take(16)); // last 8 rows: all-black
    let dict: Dictionary = dictionary! {
        "K" => -1i64,
        "Columns" => 16i64,
        "Rows" => 16i64,
        "BlackIs1" => false,
        "EndOfBlock" => true,
    };

    let encoded = pdfcore::filters::encode_stream(
        &dictionary! { "Filter" => "CCITTFaxDecode", "DecodeParms" => dict.clone() },
        &bitmap,
    )
    .unwrap();
    let decoded = pdfcore::filters::decode_stream(
        &dictionary! { "Filter" => "CCITTFaxDecode", "DecodeParms" => dict },
        &encoded,
        None,
    )
    .unwrap();
    assert_eq!(decoded, bitmap);
}
