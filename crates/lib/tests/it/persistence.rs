use kvdoc::{Document, codec::CodecError};

use crate::helpers::sync_into;

fn populated() -> Document {
    let mut doc = Document::new();
    doc.put_text("title", "Notes").unwrap();
    doc.put_text("user.name", "Ada").unwrap();
    doc.put_double("user.score", 1.5).unwrap();
    doc.put_bool("user.admin", false).unwrap();
    doc.put_counter("views", 1).unwrap();
    doc.inc_counter("views", 41).unwrap();
    doc.put_timestamp("updated", 1_704_067_200_000).unwrap();
    doc.create_list("tags").unwrap();
    doc.append_text("tags", "one").unwrap();
    doc.append_int("tags", 2).unwrap();
    doc.splice_text("title", 5, 0, " & todos").unwrap();
    doc
}

#[test]
fn load_restores_values_and_history() {
    let original = populated();
    let loaded = Document::load(&original.save().unwrap()).unwrap();

    assert_eq!(loaded.num_changes(), original.num_changes());
    assert_eq!(loaded.heads(), original.heads());
    assert_eq!(loaded.to_json_value(), original.to_json_value());
    assert_eq!(loaded.get_text("title").unwrap().as_deref(), Some("Notes & todos"));
    assert_eq!(loaded.get_counter("views").unwrap(), Some(42));
    assert_eq!(loaded.get_timestamp("updated").unwrap(), Some(1_704_067_200_000));
    assert_eq!(loaded.get_text("tags[0]").unwrap().as_deref(), Some("one"));
}

#[test]
fn saving_a_loaded_document_is_byte_identical() {
    let blob = populated().save().unwrap();
    let loaded = Document::load(&blob).unwrap();
    assert_eq!(loaded.save().unwrap(), blob);
}

#[test]
fn sync_continues_after_reload() {
    let mut original = populated();
    let mut reloaded = Document::load(&original.save().unwrap()).unwrap();

    reloaded.put_text("user.name", "Ada L.").unwrap();
    original.inc_counter("views", 8).unwrap();

    assert!(sync_into(&reloaded, &mut original).is_complete());
    assert!(sync_into(&original, &mut reloaded).is_complete());
    for doc in [&original, &reloaded] {
        assert_eq!(doc.get_text("user.name").unwrap().as_deref(), Some("Ada L."));
        assert_eq!(doc.get_counter("views").unwrap(), Some(50));
    }
}

#[test]
fn corrupt_blobs_are_rejected() {
    let blob = populated().save().unwrap();

    let mut flipped = blob.clone();
    let middle = blob.len() / 2;
    flipped[middle] ^= 0x01;
    let err = Document::load(&flipped).unwrap_err();
    assert!(err.is_corrupt_blob(), "{err}");

    let err = Document::load(&blob[..blob.len() - 3]).unwrap_err();
    assert!(err.is_corrupt_blob());

    let err = Document::load(b"").unwrap_err();
    assert!(matches!(err, kvdoc::Error::Codec(CodecError::Truncated { .. })));

    let mut extended = blob.clone();
    extended.push(0);
    assert!(Document::load(&extended).unwrap_err().is_corrupt_blob());
}

#[test]
fn unsupported_version_is_named() {
    let mut blob = Document::new().save().unwrap();
    blob[5] = 2;
    let err = Document::load(&blob).unwrap_err();
    assert!(matches!(
        err,
        kvdoc::Error::Codec(CodecError::UnsupportedVersion {
            found: 2,
            supported: 1
        })
    ));
}
