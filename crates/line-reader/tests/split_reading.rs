//! Integration tests for reading on-disk files through splits.

use split_reader_line::config::{BUFFER_SIZE_KEY, QUOTE_MODE_KEY};
use split_reader_line::{
    plan_splits, FileSplit, JobConfig, LineRecordReader, RecordReader, ReaderError, TaskContext,
};
use std::path::Path;
use std::sync::mpsc;
use std::thread;
use tempfile::TempDir;

fn write_file(dir: &TempDir, name: &str, contents: &[u8]) -> std::path::PathBuf {
    let path = dir.path().join(name);
    std::fs::write(&path, contents).unwrap();
    path
}

fn read_split(split: &FileSplit, ctx: &TaskContext) -> Vec<(u64, String)> {
    let mut reader = LineRecordReader::new();
    reader.initialize(split, ctx).unwrap();
    let records = reader
        .records()
        .map(|r| {
            let (offset, value) = r.unwrap();
            (offset, value.text)
        })
        .collect();
    reader.close().unwrap();
    records
}

fn whole_file(path: &Path) -> FileSplit {
    let len = std::fs::metadata(path).unwrap().len();
    FileSplit::whole(path, len)
}

#[test]
fn test_every_line_becomes_one_record_in_order() {
    let dir = TempDir::new().unwrap();
    let lines: Vec<String> = (0..250).map(|i| format!("{i},name-{i},{}\n", i * 7)).collect();
    let path = write_file(&dir, "rows.csv", lines.concat().as_bytes());

    let records = read_split(&whole_file(&path), &TaskContext::default());

    assert_eq!(records.len(), lines.len());
    let mut expected_offset = 0u64;
    for ((offset, text), line) in records.iter().zip(&lines) {
        assert_eq!(*offset, expected_offset);
        assert_eq!(text, line);
        expected_offset += line.len() as u64;
    }
}

#[test]
fn test_concatenated_records_reproduce_input() {
    let dir = TempDir::new().unwrap();
    let contents = "id,text\r\n1,\"multi\nline\"\n\n2,café\nlast";
    let path = write_file(&dir, "mixed.csv", contents.as_bytes());

    let records = read_split(&whole_file(&path), &TaskContext::default());
    let joined: String = records.iter().map(|(_, text)| text.as_str()).collect();

    assert_eq!(joined, contents);
    assert_eq!(records.last().unwrap().1, "last");
    // Empty lines are records too.
    assert!(records.iter().any(|(_, text)| text == "\n"));
}

#[test]
fn test_documented_examples() {
    let dir = TempDir::new().unwrap();

    let terminated = write_file(&dir, "a.csv", b"a,b\nc,d\n");
    let split = FileSplit::new(&terminated, 0, 8).unwrap();
    assert_eq!(
        read_split(&split, &TaskContext::default()),
        vec![(0, "a,b\n".to_string()), (4, "c,d\n".to_string())]
    );

    let unterminated = write_file(&dir, "b.csv", b"a,b\nc,d");
    let split = FileSplit::new(&unterminated, 0, 7).unwrap();
    assert_eq!(
        read_split(&split, &TaskContext::default()),
        vec![(0, "a,b\n".to_string()), (4, "c,d".to_string())]
    );
}

#[test]
fn test_keys_are_byte_offsets_for_multibyte_text() {
    let dir = TempDir::new().unwrap();
    let path = write_file(&dir, "utf8.txt", "héllo\nwörld\n".as_bytes());

    let records = read_split(&whole_file(&path), &TaskContext::default());

    // "héllo\n" is 7 bytes but 6 characters.
    assert_eq!(records[1].0, 7);
    assert_eq!(records[1].1, "wörld\n");
}

#[test]
fn test_invalid_utf8_still_yields_records() {
    let dir = TempDir::new().unwrap();
    let path = write_file(&dir, "bin.dat", b"ok\n\xfe\xff\nend\n");

    let records = read_split(&whole_file(&path), &TaskContext::default());

    assert_eq!(records.len(), 3);
    assert_eq!(records[1], (3, "\u{FFFD}\u{FFFD}\n".to_string()));
    assert_eq!(records[2].0, 6);
}

#[test]
fn test_planned_splits_with_straddling_records() {
    let dir = TempDir::new().unwrap();
    let path = write_file(&dir, "s.csv", b"aaaa\nbb\ncccccc\n");
    let splits = plan_splits(&path, 15, 6).unwrap();
    assert_eq!(splits.len(), 3);

    let ctx = TaskContext::default();
    let per_split: Vec<_> = splits.iter().map(|s| read_split(s, &ctx)).collect();

    // [0, 6): "aaaa\n" then "bb\n" starts at 5 < 6 and straddles to 8.
    assert_eq!(
        per_split[0],
        vec![(0, "aaaa\n".to_string()), (5, "bb\n".to_string())]
    );
    // [6, 12): starts mid-line without realigning, then "cccccc\n" straddles.
    assert_eq!(
        per_split[1],
        vec![(6, "b\n".to_string()), (8, "cccccc\n".to_string())]
    );
    // [12, 15): tail of the last line.
    assert_eq!(per_split[2], vec![(12, "cc\n".to_string())]);
}

#[test]
fn test_quote_handling_both_modes() {
    let dir = TempDir::new().unwrap();
    let contents = b"1,\"first\nsecond\"\n2,plain\n";
    let path = write_file(&dir, "q.csv", contents);
    let split = whole_file(&path);

    let naive = read_split(&split, &TaskContext::default());
    assert_eq!(
        naive,
        vec![
            (0, "1,\"first\n".to_string()),
            (9, "second\"\n".to_string()),
            (17, "2,plain\n".to_string()),
        ]
    );

    let quote_aware = TaskContext::new(
        JobConfig::new()
            .with(QUOTE_MODE_KEY, "quote-aware")
            .with(BUFFER_SIZE_KEY, "3"),
    );
    assert_eq!(
        read_split(&split, &quote_aware),
        vec![
            (0, "1,\"first\nsecond\"\n".to_string()),
            (17, "2,plain\n".to_string()),
        ]
    );
}

#[test]
fn test_config_loaded_from_yaml_file() {
    let dir = TempDir::new().unwrap();
    let config_path = write_file(
        &dir,
        "job.yaml",
        b"split_reader:\n  quote_mode: quote-aware\n  quote_char: \"'\"\n",
    );
    let data = write_file(&dir, "q.csv", b"'a\nb'\nc\n");

    let ctx = TaskContext::new(JobConfig::from_file(&config_path).unwrap());
    let records = read_split(&whole_file(&data), &ctx);

    assert_eq!(
        records,
        vec![(0, "'a\nb'\n".to_string()), (6, "c\n".to_string())]
    );
}

#[test]
fn test_invalid_config_fails_initialize() {
    let dir = TempDir::new().unwrap();
    let path = write_file(&dir, "a.csv", b"a\n");
    let ctx = TaskContext::new(JobConfig::new().with(BUFFER_SIZE_KEY, "-1"));

    let mut reader = LineRecordReader::new();
    let err = reader.initialize(&whole_file(&path), &ctx).unwrap_err();
    assert!(matches!(err, ReaderError::Config(_)));
}

#[test]
fn test_missing_file_fails_initialize() {
    let dir = TempDir::new().unwrap();
    let split = FileSplit::new(dir.path().join("absent.csv"), 0, 10).unwrap();

    let mut reader = LineRecordReader::new();
    let err = reader.initialize(&split, &TaskContext::default()).unwrap_err();
    assert!(matches!(err, ReaderError::Open { .. }));
    assert!(err.to_string().contains("absent.csv"));
}

#[test]
fn test_close_from_another_thread() {
    let dir = TempDir::new().unwrap();
    let path = write_file(&dir, "t.csv", b"one\ntwo\nthree\n");

    let mut reader = LineRecordReader::new();
    reader
        .initialize(&whole_file(&path), &TaskContext::default())
        .unwrap();
    assert!(reader.advance().unwrap());

    let closer = reader.closer();
    let (tx, rx) = mpsc::channel();
    let handles: Vec<_> = (0..4)
        .map(|_| {
            let closer = closer.clone();
            let tx = tx.clone();
            thread::spawn(move || tx.send(closer.close()).unwrap())
        })
        .collect();
    for handle in handles {
        handle.join().unwrap();
    }
    drop(tx);

    // Exactly one of the concurrent closes released the stream.
    let released: Vec<bool> = rx.iter().collect();
    assert_eq!(released.iter().filter(|r| **r).count(), 1);

    assert!(reader.is_closed());
    assert_eq!(reader.current_value().unwrap().text, "one\n");
    assert!(matches!(reader.advance(), Err(ReaderError::Closed)));
    reader.close().unwrap();
}
