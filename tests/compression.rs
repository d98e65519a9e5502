mod common;

use anyhow::Result;
use common::{id_tags_table, mixed_table, shard_files};
use tfrecords_table::io::compression::detect_file_compression;
use tfrecords_table::{
    Compression, CompressionType, DecodeOptions, EncodeOptions, ErrorKind, decode,
    detect_compression, encode,
};

#[test]
fn magic_bytes() {
    assert_eq!(detect_compression(b"\x1f\x8b\x08\x00rest"), CompressionType::Gzip);
    assert_eq!(detect_compression(b"\x78\x9crest"), CompressionType::Zlib);
    assert_eq!(detect_compression(b"\x00\x01rest"), CompressionType::None);
    assert_eq!(detect_compression(b"PK"), CompressionType::None);
}

#[cfg(feature = "compression-gzip")]
#[test]
fn every_codec_round_trips() -> Result<()> {
    for (compression, ext) in [
        (Compression::none(), ".tfrecords"),
        (Compression::zlib(6), ".tfrecords.zlib"),
        (Compression::gzip(9), ".tfrecords.gz"),
    ] {
        let tmp = tempfile::tempdir()?;
        let summary = encode(
            &mixed_table(10),
            tmp.path().to_str().unwrap(),
            &EncodeOptions::default().with_compression(compression),
        )?;
        assert!(summary.shards.iter().all(|s| s.file_name.ends_with(ext)));

        let files = shard_files(tmp.path());
        assert_eq!(detect_file_compression(&files[0])?, compression.kind);

        let back = decode(&[tmp.path().to_str().unwrap()], &DecodeOptions::default())?;
        assert_eq!(back.num_rows(), 10, "codec {}", compression.kind.name());
    }
    Ok(())
}

#[cfg(feature = "compression-gzip")]
#[test]
fn fixed_codec_overrides_detection() -> Result<()> {
    let tmp = tempfile::tempdir()?;
    encode(
        &id_tags_table(),
        tmp.path().to_str().unwrap(),
        &EncodeOptions::default().with_compression(Compression::gzip(1)),
    )?;

    let back = decode(
        &[tmp.path().to_str().unwrap()],
        &DecodeOptions::default().with_compression(CompressionType::Gzip),
    )?;
    assert_eq!(back.num_rows(), 2);

    // Reading gzip bytes as plain records fails the frame checksum.
    let err = decode(
        &[tmp.path().to_str().unwrap()],
        &DecodeOptions::default().with_compression(CompressionType::None),
    )
    .unwrap_err();
    assert_eq!(err.kind, ErrorKind::MalformedRecord);
    Ok(())
}

#[test]
fn corrupted_file_is_malformed() -> Result<()> {
    let tmp = tempfile::tempdir()?;
    let summary = encode(
        &mixed_table(3),
        tmp.path().to_str().unwrap(),
        &EncodeOptions::default().with_compression(Compression::none()),
    )?;
    let path = &summary.shards[0].location;

    let mut bytes = std::fs::read(path)?;
    bytes[14] ^= 0x55;
    std::fs::write(path, &bytes)?;

    let err = decode(&[path.as_str()], &DecodeOptions::default()).unwrap_err();
    assert_eq!(err.kind, ErrorKind::MalformedRecord);
    assert_eq!(err.source.as_deref(), Some(path.as_str()));
    Ok(())
}

#[test]
fn truncated_file_is_malformed() -> Result<()> {
    let tmp = tempfile::tempdir()?;
    let summary = encode(
        &mixed_table(3),
        tmp.path().to_str().unwrap(),
        &EncodeOptions::default().with_compression(Compression::none()),
    )?;
    let path = &summary.shards[0].location;
    let bytes = std::fs::read(path)?;
    std::fs::write(path, &bytes[..bytes.len() - 3])?;

    let err = decode(&[path.as_str()], &DecodeOptions::default()).unwrap_err();
    assert_eq!(err.kind, ErrorKind::MalformedRecord);
    Ok(())
}

#[test]
fn garbage_payload_is_malformed() -> Result<()> {
    let tmp = tempfile::tempdir()?;
    let path = tmp.path().join("junk.tfrecords");
    let mut w = tfrecords_table::io::tfrecord::TfRecordWriter::new(Vec::new());
    w.write_record(&[0xff, 0xff, 0xff])?;
    std::fs::write(&path, w.into_inner())?;

    let err = decode(&[path.to_str().unwrap()], &DecodeOptions::default()).unwrap_err();
    assert_eq!(err.kind, ErrorKind::MalformedRecord);
    Ok(())
}

#[test]
fn missing_source_is_io_failure() {
    let err = decode(&["/no/such/folder/part-00000.tfrecords"], &DecodeOptions::default())
        .unwrap_err();
    assert_eq!(err.kind, ErrorKind::IoFailure);
}
