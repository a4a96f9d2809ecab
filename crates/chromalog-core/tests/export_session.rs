//! Export collection scenarios driven the way the connection drives them:
//! raw chunks through the assembler, every produced line through the
//! session state machine.

use chromalog_core::protocol::{
    ExportOptions, ExportResult, ExportSession, LineAssembler,
};
use pretty_assertions::assert_eq;

/// Replay wire chunks through assembler + session and resolve the outcome.
fn replay(chunks: &[&[u8]], mut session: ExportSession) -> ExportResult {
    let mut asm = LineAssembler::new();
    for chunk in chunks {
        asm.feed(chunk);
        for line in asm.poll() {
            if session.offer(&line) {
                return session.into_result();
            }
        }
    }
    // Chunks exhausted without an end marker: the deadline path
    session.into_result()
}

#[test]
fn complete_block_over_awkward_chunk_splits() {
    let result = replay(
        &[b"CSV_ST", b"ART\n1,2", b",3\n4,5,6\nCSV", b"_END\n"],
        ExportSession::new(),
    );
    assert_eq!(
        result,
        ExportResult::Complete(vec!["1,2,3".to_string(), "4,5,6".to_string()])
    );
    assert!(result.is_complete());
}

#[test]
fn data_mentioning_end_marker_does_not_terminate() {
    let result = replay(
        &[b"CSV_START\nsome CSV_END marker\nCSV_END\n"],
        ExportSession::new(),
    );
    assert_eq!(
        result,
        ExportResult::Complete(vec!["some CSV_END marker".to_string()])
    );
}

#[test]
fn missing_end_marker_yields_partial() {
    let result = replay(&[b"CSV_START\n1,2,3\n"], ExportSession::new());
    assert_eq!(result, ExportResult::Partial(vec!["1,2,3".to_string()]));
    assert_eq!(result.lines(), ["1,2,3".to_string()]);
}

#[test]
fn silence_yields_empty() {
    let result = replay(&[], ExportSession::new());
    assert_eq!(result, ExportResult::Empty);
    assert!(result.lines().is_empty());
}

#[test]
fn chatter_without_start_marker_yields_empty() {
    let result = replay(
        &[b"ESP32-LOGGER_READY\nERROR:CSV_NOT_FOUND\n"],
        ExportSession::new(),
    );
    assert_eq!(result, ExportResult::Empty);
}

#[test]
fn unterminated_trailing_fragment_is_not_a_line() {
    // "4,5,6" never gets its newline; only the terminated row counts
    let result = replay(&[b"CSV_START\n1,2,3\n4,5,6"], ExportSession::new());
    assert_eq!(result, ExportResult::Partial(vec!["1,2,3".to_string()]));
}

#[test]
fn filtered_session_drops_status_lines_but_keeps_markers() {
    let result = replay(
        &[b"CSV_START\nOK:DATA_SAVED\n10:00,5,AABBCC,Pressed\nERROR:CSV_WRITE_FAIL\nCSV_END\n"],
        ExportSession::with_options(ExportOptions::filtered()),
    );
    assert_eq!(
        result,
        ExportResult::Complete(vec!["10:00,5,AABBCC,Pressed".to_string()])
    );
}

#[test]
fn into_lines_surrenders_collected_rows() {
    let result = replay(
        &[b"CSV_START\na\nb\nCSV_END\n"],
        ExportSession::new(),
    );
    assert_eq!(result.into_lines(), vec!["a".to_string(), "b".to_string()]);
}

#[test]
fn result_serializes_with_tagged_outcome() {
    let complete = ExportResult::Complete(vec!["a,b".to_string()]);
    let json = serde_json::to_value(&complete).unwrap();
    assert_eq!(json["outcome"], "complete");
    assert_eq!(json["lines"][0], "a,b");

    let empty = serde_json::to_value(ExportResult::Empty).unwrap();
    assert_eq!(empty["outcome"], "empty");
}
