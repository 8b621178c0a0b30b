use kvdoc::{Document, text::Splice};

use crate::helpers::sync_both;

#[test]
fn splice_replaces_a_range() {
    let mut doc = Document::new();
    doc.put_text("t", "Hello World").unwrap();
    doc.splice_text("t", 6, 5, "Rust").unwrap();
    assert_eq!(doc.get_text("t").unwrap().as_deref(), Some("Hello Rust"));

    doc.splice_text("t", 0, 0, ">> ").unwrap();
    doc.splice_text("t", 13, 0, "!").unwrap();
    assert_eq!(doc.get_text("t").unwrap().as_deref(), Some(">> Hello Rust!"));
}

#[test]
fn splice_counts_characters_not_bytes() {
    let mut doc = Document::new();
    doc.put_text("t", "héllo wörld").unwrap();
    doc.splice_text("t", 6, 5, "wereld").unwrap();
    assert_eq!(doc.get_text("t").unwrap().as_deref(), Some("héllo wereld"));
}

#[test]
fn splice_out_of_range_is_rejected() {
    let mut doc = Document::new();
    doc.put_text("t", "abc").unwrap();
    assert!(doc.splice_text("t", 10, 0, "x").unwrap_err().is_out_of_range());
    assert!(doc.splice_text("t", 2, 2, "").unwrap_err().is_out_of_range());
    assert_eq!(doc.num_changes(), 1);
}

#[test]
fn splice_needs_text() {
    let mut doc = Document::new();
    doc.put_int("n", 1).unwrap();
    assert!(doc.splice_text("n", 0, 0, "x").unwrap_err().is_type_error());
    assert!(doc.splice_text("missing", 0, 0, "x").unwrap_err().is_not_found());
}

#[test]
fn inverse_splice_restores_text() {
    let mut doc = Document::new();
    doc.put_text("t", "the quick brown fox").unwrap();
    let splice = Splice::new(4, 5, "slow");
    let removed: String = "the quick brown fox".chars().skip(4).take(5).collect();

    doc.splice_text("t", splice.pos, splice.del, &splice.insert).unwrap();
    assert_eq!(doc.get_text("t").unwrap().as_deref(), Some("the slow brown fox"));

    let undo = splice.inverse(&removed);
    doc.splice_text("t", undo.pos, undo.del, &undo.insert).unwrap();
    assert_eq!(doc.get_text("t").unwrap().as_deref(), Some("the quick brown fox"));
}

#[test]
fn diff_replaces_lines() {
    let mut doc = Document::new();
    doc.put_text("doc", "line one\nline two\nline three\n").unwrap();
    let diff = "\
--- a/doc
+++ b/doc
@@ -1,3 +1,3 @@
 line one
-line two
+line 2
 line three
";
    doc.put_diff("doc", diff).unwrap();
    assert_eq!(
        doc.get_text("doc").unwrap().as_deref(),
        Some("line one\nline 2\nline three\n")
    );
}

#[test]
fn diff_inserts_and_deletes() {
    let mut doc = Document::new();
    doc.put_text("doc", "a\nb\nc\n").unwrap();
    doc.put_diff("doc", "@@ -1,2 +1,3 @@\n a\n+inserted\n b\n").unwrap();
    assert_eq!(doc.get_text("doc").unwrap().as_deref(), Some("a\ninserted\nb\nc\n"));

    doc.put_diff("doc", "@@ -3,2 +3,1 @@\n b\n-c\n").unwrap();
    assert_eq!(doc.get_text("doc").unwrap().as_deref(), Some("a\ninserted\nb\n"));
}

#[test]
fn diff_with_several_hunks() {
    let mut doc = Document::new();
    let original: String = (1..=10).map(|n| format!("{n}\n")).collect();
    doc.put_text("doc", &original).unwrap();
    let diff = "@@ -2 +2 @@\n-2\n+two\n@@ -9,2 +9,3 @@\n 9\n+nine and a half\n 10\n";
    doc.put_diff("doc", diff).unwrap();
    let expected = original
        .replace("\n2\n", "\ntwo\n")
        .replace("9\n10\n", "9\nnine and a half\n10\n");
    assert_eq!(doc.get_text("doc").unwrap(), Some(expected));
}

#[test]
fn malformed_diffs_change_nothing() {
    let mut doc = Document::new();
    doc.put_text("doc", "a\nb\n").unwrap();
    for diff in [
        "@@ nonsense @@\n-a\n",
        "@@ -1 +1 @@\n*a\n",
        "@@ -1 +1 @@\n-x\n+y\n",
    ] {
        let err = doc.put_diff("doc", diff).unwrap_err();
        assert!(err.is_malformed_diff(), "{diff:?} gave {err}");
    }
    assert_eq!(doc.num_changes(), 1);
    assert_eq!(doc.get_text("doc").unwrap().as_deref(), Some("a\nb\n"));
}

#[test]
fn diff_on_single_line_text_without_newline() {
    let mut doc = Document::new();
    doc.put_text("content", "Hello World").unwrap();
    let diff = "--- a/content\n+++ b/content\n@@ -1 +1 @@\n-Hello World\n+Hello Rust\n";
    doc.put_diff("content", diff).unwrap();
    assert_eq!(doc.get_text("content").unwrap().as_deref(), Some("Hello Rust"));
}

#[test]
fn diff_appends_after_unterminated_last_line() {
    let mut doc = Document::new();
    doc.put_text("doc", "a\nb").unwrap();
    doc.put_diff("doc", "@@ -2 +2,2 @@\n b\n+c\n").unwrap();
    assert_eq!(doc.get_text("doc").unwrap().as_deref(), Some("a\nb\nc"));
}

#[test]
fn diff_inserts_a_line() {
    let mut doc = Document::new();
    doc.put_text("doc", "Line 1\nLine 3\n").unwrap();
    let diff = "--- a/doc\n+++ b/doc\n@@ -1,2 +1,3 @@\n Line 1\n+Line 2\n Line 3\n";
    doc.put_diff("doc", diff).unwrap();
    assert_eq!(
        doc.get_text("doc").unwrap().as_deref(),
        Some("Line 1\nLine 2\nLine 3\n")
    );
}

#[test]
fn diff_deletes_a_line() {
    let mut doc = Document::new();
    doc.put_text("doc", "Line 1\nLine 2\nLine 3\n").unwrap();
    let diff = "--- a/doc\n+++ b/doc\n@@ -1,3 +1,2 @@\n Line 1\n-Line 2\n Line 3\n";
    doc.put_diff("doc", diff).unwrap();
    assert_eq!(doc.get_text("doc").unwrap().as_deref(), Some("Line 1\nLine 3\n"));
}

#[test]
fn diff_keeps_carriage_returns() {
    let mut doc = Document::new();
    doc.put_text("doc", "a\r\nb\r\n").unwrap();
    doc.put_diff("doc", "@@ -1 +1 @@\n-a\r\n+c\r\n").unwrap();
    assert_eq!(doc.get_text("doc").unwrap().as_deref(), Some("c\r\nb\r\n"));
}

#[test]
fn diff_range_past_any_text_is_rejected() {
    let mut doc = Document::new();
    doc.put_text("t", "a\nb\n").unwrap();
    for diff in [
        "@@ -18446744073709551615,2 +1,2 @@\n a\n b\n",
        "@@ -18446744073709551615,0 +1 @@\n+x\n",
    ] {
        let err = doc.put_diff("t", diff).unwrap_err();
        assert!(err.is_malformed_diff(), "{diff:?} gave {err}");
    }
    assert_eq!(doc.get_text("t").unwrap().as_deref(), Some("a\nb\n"));
}

#[test]
fn concurrent_splices_keep_both_edits() {
    let mut a = Document::new();
    a.put_text("t", "Hello World").unwrap();
    let mut b = Document::new();
    sync_both(&mut a, &mut b);

    a.splice_text("t", 0, 5, "Howdy").unwrap();
    b.splice_text("t", 11, 0, "!").unwrap();
    sync_both(&mut a, &mut b);

    let merged = a.get_text("t").unwrap();
    assert_eq!(merged.as_deref(), Some("Howdy World!"));
    assert_eq!(b.get_text("t").unwrap(), merged);
}

#[test]
fn concurrent_inserts_at_same_position_converge() {
    let mut a = Document::new();
    a.put_text("t", "ac").unwrap();
    let mut b = Document::new();
    sync_both(&mut a, &mut b);

    a.splice_text("t", 1, 0, "X").unwrap();
    b.splice_text("t", 1, 0, "Y").unwrap();
    sync_both(&mut a, &mut b);

    let merged = a.get_text("t").unwrap().unwrap();
    assert_eq!(Some(merged.clone()), b.get_text("t").unwrap());
    assert!(merged == "aXYc" || merged == "aYXc", "{merged}");
}
