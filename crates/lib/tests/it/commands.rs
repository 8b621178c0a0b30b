use kvdoc::{
    Change,
    commands::{CommandError, Keyspace, MemoryHost, Reply},
};

use crate::helpers::{bulk, run};

fn keyspace_with(key: &str) -> (Keyspace, MemoryHost) {
    let mut keyspace = Keyspace::new();
    let mut host = MemoryHost::new();
    run(&mut keyspace, &mut host, &["AM.NEW", key]);
    (keyspace, host)
}

#[test]
fn put_and_get_text() {
    let (mut ks, mut host) = keyspace_with("doc");
    assert_eq!(run(&mut ks, &mut host, &["AM.PUTTEXT", "doc", "greeting", "hello"]), Reply::Ok);
    assert_eq!(
        run(&mut ks, &mut host, &["AM.GETTEXT", "doc", "greeting"]),
        bulk("hello")
    );
}

#[test]
fn splice_text_command() {
    let (mut ks, mut host) = keyspace_with("doc");
    run(&mut ks, &mut host, &["PUTTEXT", "doc", "t", "Hello World"]);
    run(&mut ks, &mut host, &["SPLICETEXT", "doc", "t", "6", "5", "Rust"]);
    assert_eq!(run(&mut ks, &mut host, &["GETTEXT", "doc", "t"]), bulk("Hello Rust"));

    let err = ks
        .execute(&mut host, &["SPLICETEXT", "doc", "t", "-1", "0", "x"])
        .unwrap_err();
    assert!(matches!(err, CommandError::InvalidArgument { .. }));
}

#[test]
fn counter_commands() {
    let (mut ks, mut host) = keyspace_with("doc");
    run(&mut ks, &mut host, &["PUTCOUNTER", "doc", "v", "10"]);
    run(&mut ks, &mut host, &["INCCOUNTER", "doc", "v", "5"]);
    run(&mut ks, &mut host, &["INCCOUNTER", "doc", "v", "-2"]);
    assert_eq!(run(&mut ks, &mut host, &["GETCOUNTER", "doc", "v"]), Reply::Integer(13));
}

#[test]
fn list_commands() {
    let (mut ks, mut host) = keyspace_with("doc");
    run(&mut ks, &mut host, &["CREATELIST", "doc", "items"]);
    run(&mut ks, &mut host, &["APPENDTEXT", "doc", "items", "a"]);
    run(&mut ks, &mut host, &["APPENDTEXT", "doc", "items", "b"]);
    run(&mut ks, &mut host, &["APPENDINT", "doc", "items", "3"]);
    run(&mut ks, &mut host, &["APPENDDOUBLE", "doc", "items", "0.5"]);
    run(&mut ks, &mut host, &["APPENDBOOL", "doc", "items", "false"]);
    assert_eq!(run(&mut ks, &mut host, &["LISTLEN", "doc", "items"]), Reply::Integer(5));
    assert_eq!(run(&mut ks, &mut host, &["GETTEXT", "doc", "items[0]"]), bulk("a"));
    assert_eq!(run(&mut ks, &mut host, &["GETDOUBLE", "doc", "items[3]"]), Reply::Double(0.5));
    assert_eq!(run(&mut ks, &mut host, &["LISTLEN", "doc", "nope"]), Reply::Null);
    assert_eq!(run(&mut ks, &mut host, &["MAPLEN", "doc", "$"]), Reply::Integer(1));
}

#[test]
fn scalar_commands() {
    let (mut ks, mut host) = keyspace_with("doc");
    run(&mut ks, &mut host, &["PUTINT", "doc", "i", "-4"]);
    run(&mut ks, &mut host, &["PUTDOUBLE", "doc", "d", "2.5"]);
    run(&mut ks, &mut host, &["PUTBOOL", "doc", "b", "true"]);
    run(&mut ks, &mut host, &["PUTTIMESTAMP", "doc", "t", "1704067200000"]);
    assert_eq!(run(&mut ks, &mut host, &["GETINT", "doc", "i"]), Reply::Integer(-4));
    assert_eq!(run(&mut ks, &mut host, &["GETDOUBLE", "doc", "d"]), Reply::Double(2.5));
    assert_eq!(run(&mut ks, &mut host, &["GETBOOL", "doc", "b"]), Reply::Integer(1));
    assert_eq!(
        run(&mut ks, &mut host, &["GETTIMESTAMP", "doc", "t"]),
        Reply::Integer(1_704_067_200_000)
    );

    let err = ks.execute(&mut host, &["PUTINT", "doc", "i", "four"]).unwrap_err();
    assert!(err.is_usage_error());
    let err = ks.execute(&mut host, &["GETTEXT", "doc", "i"]).unwrap_err();
    assert!(err.engine_error().is_some_and(|e| e.is_type_error()));
}

#[test]
fn putdiff_command() {
    let (mut ks, mut host) = keyspace_with("doc");
    run(&mut ks, &mut host, &["PUTTEXT", "doc", "body", "a\nb\n"]);
    run(&mut ks, &mut host, &["PUTDIFF", "doc", "body", "@@ -2 +2 @@\n-b\n+B\n"]);
    assert_eq!(run(&mut ks, &mut host, &["GETTEXT", "doc", "body"]), bulk("a\nB\n"));

    let err = ks
        .execute(&mut host, &["PUTDIFF", "doc", "body", "@@ -2 +2 @@\n-b\n+B\n"])
        .unwrap_err();
    assert!(err.engine_error().is_some_and(|e| e.is_malformed_diff()));
}

#[test]
fn change_published_on_one_replica_applies_on_another() {
    let (mut one, mut host_one) = keyspace_with("a");
    let (mut two, mut host_two) = keyspace_with("a");
    host_one.drain();

    run(&mut one, &mut host_one, &["PUTTEXT", "a", "t", "x"]);
    let (_, messages) = host_one.drain();
    assert_eq!(messages.len(), 1);
    let (channel, payload) = &messages[0];
    assert_eq!(channel, "changes:a");

    assert_eq!(
        two.execute(&mut host_two, &[b"APPLY".as_slice(), b"a".as_slice(), payload.as_slice()]).unwrap(),
        Reply::Ok
    );
    assert_eq!(run(&mut two, &mut host_two, &["GETTEXT", "a", "t"]), bulk("x"));
    assert_eq!(run(&mut two, &mut host_two, &["NUMCHANGES", "a"]), Reply::Integer(1));
}

#[test]
fn apply_does_not_publish_and_reports_rejections() {
    let (mut one, mut host_one) = keyspace_with("k");
    run(&mut one, &mut host_one, &["PUTINT", "k", "n", "1"]);
    run(&mut one, &mut host_one, &["PUTINT", "k", "n", "2"]);
    let Reply::Array(changes) = run(&mut one, &mut host_one, &["CHANGES", "k"]) else {
        panic!("CHANGES must reply with an array");
    };
    let records: Vec<Vec<u8>> = changes
        .into_iter()
        .map(|reply| match reply {
            Reply::Binary(bytes) => bytes,
            other => panic!("unexpected {other:?}"),
        })
        .collect();

    let (mut two, mut host_two) = keyspace_with("k");
    host_two.drain();
    let err = two
        .execute(
            &mut host_two,
            &[b"APPLY".to_vec(), b"k".to_vec(), records[1].clone(), records[0].clone()],
        )
        .unwrap_err();
    assert!(matches!(
        err,
        CommandError::ApplyRejected {
            rejected: 1,
            total: 2,
            ..
        }
    ));
    assert_eq!(run(&mut two, &mut host_two, &["GETINT", "k", "n"]), Reply::Integer(1));
    let (events, messages) = host_two.drain();
    assert!(messages.is_empty());
    assert_eq!(events, vec![("am.apply".to_string(), "k".to_string())]);
}

#[test]
fn changes_since_known_hashes() {
    let (mut ks, mut host) = keyspace_with("k");
    run(&mut ks, &mut host, &["PUTINT", "k", "a", "1"]);
    run(&mut ks, &mut host, &["PUTINT", "k", "b", "2"]);
    let first = ks.document("k").unwrap().all_changes().next().unwrap().hash();

    let reply = run(&mut ks, &mut host, &["CHANGES", "k", first.to_hex().as_str()]);
    let Reply::Array(items) = reply else {
        panic!("expected array");
    };
    assert_eq!(items.len(), 1);
    let Reply::Binary(bytes) = &items[0] else {
        panic!("expected binary");
    };
    let change = Change::from_bytes(bytes.clone()).unwrap();
    assert_eq!(change.deps(), &[first]);

    let err = ks.execute(&mut host, &["CHANGES", "k", "zz"]).unwrap_err();
    assert!(err.is_usage_error());
}

#[test]
fn save_and_load_commands() {
    let (mut ks, mut host) = keyspace_with("src");
    run(&mut ks, &mut host, &["PUTTEXT", "src", "t", "persisted"]);
    let Reply::Binary(blob) = run(&mut ks, &mut host, &["SAVE", "src"]) else {
        panic!("SAVE must reply with binary");
    };
    host.drain();

    assert_eq!(
        ks.execute(&mut host, &[b"LOAD".as_slice(), b"copy".as_slice(), blob.as_slice()]).unwrap(),
        Reply::Ok
    );
    assert_eq!(run(&mut ks, &mut host, &["GETTEXT", "copy", "t"]), bulk("persisted"));
    let (events, messages) = host.drain();
    assert_eq!(events, vec![("am.load".to_string(), "copy".to_string())]);
    assert!(messages.is_empty());

    let err = ks
        .execute(&mut host, &[b"LOAD".as_slice(), b"bad".as_slice(), b"KVDOC".as_slice()])
        .unwrap_err();
    assert!(err.engine_error().is_some_and(|e| e.is_corrupt_blob()));
    assert!(ks.document("bad").is_none());
}

#[test]
fn json_commands() {
    let mut ks = Keyspace::new();
    let mut host = MemoryHost::new();
    run(&mut ks, &mut host, &["FROMJSON", "j", r#"{"b": [1, "two"], "a": 1.5}"#]);
    assert_eq!(
        run(&mut ks, &mut host, &["TOJSON", "j"]),
        bulk(r#"{"a":1.5,"b":[1,"two"]}"#)
    );
    let Reply::Bulk(pretty) = run(&mut ks, &mut host, &["TOJSON", "j", "pretty"]) else {
        panic!("expected bulk");
    };
    assert!(pretty.contains("\n  \"a\": 1.5"));
    assert_eq!(run(&mut ks, &mut host, &["NUMCHANGES", "j"]), Reply::Integer(1));
}

#[test]
fn shadow_index_follows_mutations() {
    let mut ks = Keyspace::new();
    let mut host = MemoryHost::new();
    run(&mut ks, &mut host, &["INDEX.CONFIGURE", "article:*", "title"]);
    run(&mut ks, &mut host, &["NEW", "article:1"]);
    run(&mut ks, &mut host, &["PUTTEXT", "article:1", "title", "Hi"]);

    let shadow = host.shadow("article:1").unwrap();
    assert_eq!(shadow.get("title").map(String::as_str), Some("Hi"));

    run(&mut ks, &mut host, &["PUTTEXT", "article:1", "body", "ignored"]);
    let shadow = host.shadow("article:1").unwrap();
    assert!(!shadow.contains_key("body"));
    assert_eq!(shadow.len(), 1);

    run(&mut ks, &mut host, &["NEW", "other:1"]);
    run(&mut ks, &mut host, &["PUTTEXT", "other:1", "title", "Nope"]);
    assert!(host.shadow("other:1").is_none());
}

#[test]
fn replayed_documents_need_reindex() {
    let (mut src, mut src_host) = keyspace_with("post:1");
    run(&mut src, &mut src_host, &["PUTTEXT", "post:1", "title", "Loaded"]);
    let Reply::Binary(blob) = run(&mut src, &mut src_host, &["SAVE", "post:1"]) else {
        panic!("SAVE must reply with binary");
    };

    let mut ks = Keyspace::new();
    let mut host = MemoryHost::new();
    run(&mut ks, &mut host, &["INDEX.CONFIGURE", "post:*", "title"]);
    ks.execute(&mut host, &[b"LOAD".as_slice(), b"post:1".as_slice(), blob.as_slice()]).unwrap();
    assert!(host.shadow("post:1").is_none());

    assert_eq!(run(&mut ks, &mut host, &["INDEX.REINDEX", "post:1"]), Reply::Integer(1));
    assert_eq!(
        host.shadow("post:1").and_then(|s| s.get("title")).map(String::as_str),
        Some("Loaded")
    );

    run(&mut ks, &mut host, &["INDEX.DISABLE", "post:*"]);
    assert_eq!(run(&mut ks, &mut host, &["INDEX.REINDEX", "post:1"]), Reply::Integer(0));
}

#[test]
fn missing_keys_are_errors() {
    let mut ks = Keyspace::new();
    let mut host = MemoryHost::new();
    for argv in [
        vec!["PUTTEXT", "ghost", "a", "b"],
        vec!["GETINT", "ghost", "a"],
        vec!["SAVE", "ghost"],
        vec!["NUMCHANGES", "ghost"],
        vec!["INDEX.REINDEX", "ghost"],
    ] {
        let err = ks.execute(&mut host, argv.as_slice()).unwrap_err();
        assert!(matches!(err, CommandError::NoSuchKey { .. }), "{argv:?}");
    }
}

#[test]
fn write_commands_are_replicated_as_received() {
    let (mut ks, mut host) = keyspace_with("doc");
    run(&mut ks, &mut host, &["am.PutText", "doc", "t", "hi"]);
    run(&mut ks, &mut host, &["GETTEXT", "doc", "t"]);
    assert!(ks.execute(&mut host, &["PUTINT", "doc", "n", "x"]).is_err());

    let replicated = host.take_replicated();
    assert_eq!(
        replicated,
        vec![
            ("am.new".to_string(), vec![b"doc".to_vec()]),
            (
                "am.puttext".to_string(),
                vec![b"doc".to_vec(), b"t".to_vec(), b"hi".to_vec()]
            ),
        ]
    );

    let Reply::Binary(blob) = run(&mut ks, &mut host, &["SAVE", "doc"]) else {
        panic!("SAVE must reply with binary");
    };
    let (mut other, mut other_host) = keyspace_with("doc");
    other_host.take_replicated();
    let change = ks.document("doc").unwrap().all_changes().next().unwrap().clone();
    for _ in 0..2 {
        other
            .execute(&mut other_host, &[b"APPLY".as_slice(), b"doc".as_slice(), change.bytes()])
            .unwrap();
    }
    other
        .execute(&mut other_host, &[b"LOAD".as_slice(), b"copy".as_slice(), blob.as_slice()])
        .unwrap();
    let names: Vec<String> = other_host
        .take_replicated()
        .into_iter()
        .map(|(command, _)| command)
        .collect();
    assert_eq!(names, vec!["am.apply", "am.load"]);
}
