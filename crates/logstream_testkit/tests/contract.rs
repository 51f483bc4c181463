//! Contract tests shared by every stream variant.

use logstream_storage::{
    BasicOutputStream, CacheConfig, CompressOutcome, CompressedStream, Cursors, LogStream,
    MappedStream, MmapConfig, Operation, StreamError, TruncatableOutputStream,
};
use logstream_testkit::prelude::*;
use proptest::prelude::*;

const MAPPING_LEN: u64 = 4096;

/// Opens one stream of each file-backed variant in `dir`.
fn both_variants(dir: &TempStreamDir) -> Vec<(&'static str, LogStream)> {
    vec![
        (
            "cached.log",
            LogStream::open_cached(&dir.path("cached.log"), &CacheConfig::default()).unwrap(),
        ),
        (
            "mapped.log",
            LogStream::open_mapped(
                &dir.path("mapped.log"),
                &MmapConfig::new().mapping_len(MAPPING_LEN),
            )
            .unwrap(),
        ),
    ]
}

#[test]
fn open_initializes_exactly_one_backing() {
    let dir = TempStreamDir::new();
    for (_, stream) in both_variants(&dir) {
        match &stream {
            LogStream::Cached(s) => assert!(s.is_open()),
            LogStream::Mapped(s) => {
                assert!(s.is_open());
                assert!(s.cursors().is_some());
            }
        }
    }
}

#[test]
fn close_after_clean_run_succeeds_and_is_idempotent() {
    let dir = TempStreamDir::new();
    for (name, mut stream) in both_variants(&dir) {
        stream.write(&payload(300, 1)).unwrap();
        stream.flush().unwrap();
        stream.sync().unwrap();
        stream.close().unwrap_or_else(|e| panic!("{name}: {e}"));
        stream.close().unwrap_or_else(|e| panic!("{name}: second close: {e}"));
    }
}

#[test]
fn round_trip_leaves_exact_bytes() {
    let dir = TempStreamDir::new();
    let data = payload(1000, 7);
    for (name, mut stream) in both_variants(&dir) {
        stream.write(&data).unwrap();
        stream.sync().unwrap();
        stream.close().unwrap();

        assert_eq!(dir.read(name), data, "{name}");
        assert_eq!(dir.file_len(name), data.len() as u64, "{name}");
    }
}

#[test]
fn truncate_then_write_has_exact_length() {
    let dir = TempStreamDir::new();
    for (name, mut stream) in both_variants(&dir) {
        stream.write(&payload(500, 3)).unwrap();
        stream.sync().unwrap();
        stream.truncate(200).unwrap();
        stream.write(&payload(50, 9)).unwrap();
        stream.sync().unwrap();
        stream.close().unwrap();

        let mut expected = payload(500, 3);
        expected.truncate(200);
        expected.extend_from_slice(&payload(50, 9));
        assert_eq!(dir.file_len(name), 250, "{name}");
        assert_eq!(dir.read(name), expected, "{name}");
    }
}

#[test]
fn rewind_and_overwrite_keeps_furthest_end() {
    let dir = TempStreamDir::new();
    for (name, mut stream) in both_variants(&dir) {
        stream.write(&[1; 100]).unwrap();
        stream.seek(30).unwrap();
        stream.write(&[2; 10]).unwrap();
        stream.close().unwrap();

        let data = dir.read(name);
        assert_eq!(data.len(), 100, "{name}");
        assert!(data[30..40].iter().all(|b| *b == 2), "{name}");
        assert!(data[40..].iter().all(|b| *b == 1), "{name}");
    }
}

#[test]
fn mapped_end_of_file_after_rewrite() {
    let dir = TempStreamDir::new();
    for (n, k, n2) in [(100u64, 50u64, 20usize), (100, 90, 40), (10, 0, 10)] {
        let mut stream = dir.mapped("eof.log", MAPPING_LEN);
        stream.write(&vec![0xaa; n as usize]).unwrap();
        stream.seek(k).unwrap();
        stream.write(&vec![0xbb; n2]).unwrap();

        let cursors = stream.cursors().unwrap();
        assert_eq!(cursors.end_of_file, n.max(k + n2 as u64));
        stream.close().unwrap();
    }
}

#[test]
fn mapped_scenario_from_open_to_sync() {
    let dir = TempStreamDir::new();
    let mut stream = dir.mapped("scenario.log", 4096);
    stream.write(&payload(100, 0)).unwrap();
    stream.seek(50).unwrap();
    stream.write(&payload(20, 1)).unwrap();
    stream.sync().unwrap();

    assert_eq!(
        stream.cursors(),
        Some(Cursors {
            write: 70,
            synced: 70,
            end_of_file: 100
        })
    );
}

#[test]
fn mapped_second_sync_changes_nothing() {
    let dir = TempStreamDir::new();
    let mut stream = dir.mapped("sync.log", 4096);
    stream.write(&payload(64, 2)).unwrap();
    stream.sync().unwrap();
    let before = stream.cursors().unwrap();
    stream.sync().unwrap();
    assert_eq!(stream.cursors().unwrap(), before);
}

#[test]
fn cached_failed_resize_does_not_reposition() {
    let dir = TempStreamDir::new();
    let mut stream = dir.cached("resize.log");
    stream.write(b"0123456789").unwrap();

    let err = stream.truncate(u64::MAX).unwrap_err();
    assert!(matches!(err, StreamError::Truncate(_)));
    assert_eq!(err.operation(), Operation::Truncate);

    stream.write(b"X").unwrap();
    stream.close().unwrap();
    assert_eq!(dir.read("resize.log"), b"0123456789X");
}

#[test]
fn compressed_leftover_without_failure_flag_is_an_error() {
    let mut compressor = ScriptedCompressor::with_script([CompressOutcome {
        unconsumed: 5,
        failed: false,
    }]);
    let mut stream = CompressedStream::with_compressor(&mut compressor);

    let err = stream.write(&payload(32, 4)).unwrap_err();
    assert_eq!(err.operation(), Operation::Write);
    assert!(matches!(
        err,
        StreamError::Compression {
            unconsumed: 5,
            failed: false
        }
    ));

    // The next write gets a fresh chance; there is no retry of the old one.
    stream.write(b"next").unwrap();
    assert_eq!(compressor.calls().len(), 2);
}

#[test]
fn compressed_partial_consumption_is_atomic_failure() {
    let mut compressor = CollectingCompressor::with_limit(8);
    let mut stream = CompressedStream::with_compressor(&mut compressor);

    stream.write(b"12345").unwrap();
    assert!(stream.write(b"6789").is_err());
}

#[test]
fn never_opened_streams_close_cleanly() {
    let mut mapped = MappedStream::new();
    mapped.close().unwrap();
    mapped.close().unwrap();

    let mut cached = logstream_storage::CachedStream::new();
    cached.close().unwrap();
}

/// Applies `ops` to both `stream` and `model`, checking they agree on
/// which operations fail.
fn run_against_model(
    stream: &mut dyn TruncatableOutputStream,
    model: &mut StreamModel,
    ops: &[StreamOp],
) -> Result<(), TestCaseError> {
    for op in ops {
        let expected_ok = model.apply(op);
        let result = op.apply(stream);
        prop_assert_eq!(result.is_ok(), expected_ok, "op {:?}: {:?}", op, result);
    }
    Ok(())
}

proptest! {
    #![proptest_config(PropTestConfig::quick().to_proptest_config())]

    #[test]
    fn mapped_matches_model(ops in op_sequence_strategy(MAPPING_LEN, 300, 40)) {
        let dir = TempStreamDir::new();
        let mut stream = dir.mapped("model.log", MAPPING_LEN);
        let mut model = StreamModel::new(ModelKind::Mapped { mapping_len: MAPPING_LEN });

        prop_assert_eq!(stream.cursors(), Some(model.cursors()));

        for op in &ops {
            let expected_ok = model.apply(op);
            let result = op.apply(&mut stream);
            prop_assert_eq!(result.is_ok(), expected_ok, "op {:?}: {:?}", op, result);

            let c = stream.cursors().unwrap();
            prop_assert!(c.synced <= c.write);
            prop_assert!(c.write <= MAPPING_LEN);
            prop_assert!(c.end_of_file >= c.write);
            prop_assert_eq!(c, model.cursors());
        }

        stream.close().unwrap();
        prop_assert_eq!(dir.read("model.log"), model.contents().to_vec());
    }

    #[test]
    fn cached_matches_model(ops in op_sequence_strategy(MAPPING_LEN, 300, 40)) {
        let dir = TempStreamDir::new();
        let mut stream = dir.cached_with("model.log", &CacheConfig::new().buffer_size(64));
        let mut model = StreamModel::new(ModelKind::Cached);

        run_against_model(&mut stream, &mut model, &ops)?;

        stream.close().unwrap();
        prop_assert_eq!(dir.read("model.log"), model.contents().to_vec());
    }
}
