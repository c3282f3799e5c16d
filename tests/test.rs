//! Integration tests for sqlfs

use std::io::SeekFrom;

use sqlfs::{DataKind, FsConfig, FsError, ModeKind, OpenMode, SqlFs};

fn write_bytes(fs: &SqlFs, name: &str, bytes: &[u8]) {
    let mut f = fs.open(name, "wb".parse().unwrap()).unwrap();
    f.write(bytes).unwrap();
    f.close().unwrap();
}

fn read_bytes(fs: &SqlFs, name: &str) -> Vec<u8> {
    let mut f = fs.open(name, "rb".parse().unwrap()).unwrap();
    let content = f.read(None).unwrap().into_binary().unwrap();
    f.close().unwrap();
    content
}

fn read_text(fs: &SqlFs, name: &str) -> String {
    let mut f = fs.open(name, "rt".parse().unwrap()).unwrap();
    let content = f.read(None).unwrap().into_text().unwrap();
    f.close().unwrap();
    content
}

#[test]
fn truncate_then_close_yields_zero_length_file() {
    let fs = SqlFs::in_memory().unwrap();
    let f = fs.open("empty.txt", "w".parse().unwrap()).unwrap();
    f.close().unwrap();

    assert!(fs.exists("empty.txt").unwrap());
    assert_eq!(fs.size("empty.txt").unwrap(), Some(0));
    assert_eq!(read_bytes(&fs, "empty.txt"), Vec::<u8>::new());
}

#[test]
fn byte_sequences_round_trip_around_chunk_boundaries() {
    let fs = SqlFs::in_memory().unwrap();
    let chunk = FsConfig::default().max_chunk_size;

    for len in [0, 1, chunk - 1, chunk, chunk + 1, 3 * chunk, 4 * chunk + 5] {
        let bytes: Vec<u8> = (0..len).map(|i| (i % 251) as u8).collect();
        write_bytes(&fs, "blob", &bytes);
        assert_eq!(read_bytes(&fs, "blob"), bytes, "length {}", len);
    }
}

#[test]
fn chunk_count_matches_the_configured_chunk_size() {
    let fs = SqlFs::in_memory_with_config(FsConfig {
        max_chunk_size: 12,
        ..FsConfig::default()
    })
    .unwrap();

    let bytes: Vec<u8> = (0..72).map(|i| i as u8).collect();
    write_bytes(&fs, "blob", &bytes);

    assert_eq!(read_bytes(&fs, "blob"), bytes);
    assert_eq!(fs.chunk_count("blob").unwrap(), 6);
    assert_eq!(fs.size("blob").unwrap(), Some(72));
}

#[test]
fn rewrite_inside_a_single_chunk() {
    let fs = SqlFs::in_memory().unwrap();
    let mut f = fs.open("f", "w".parse().unwrap()).unwrap();
    f.write("abcdef").unwrap();
    f.seek(SeekFrom::Start(1)).unwrap();
    f.write("ghi").unwrap();
    f.close().unwrap();
    assert_eq!(read_text(&fs, "f"), "aghief");

    let mut f = fs.open("f", "w".parse().unwrap()).unwrap();
    f.write("abcdef").unwrap();
    f.seek(SeekFrom::Start(0)).unwrap();
    f.write("ghijkl").unwrap();
    f.close().unwrap();
    assert_eq!(read_text(&fs, "f"), "ghijkl");
}

#[test]
fn rewrite_extending_past_the_old_end() {
    let fs = SqlFs::in_memory().unwrap();
    let mut f = fs.open("f", "w".parse().unwrap()).unwrap();
    f.write("abcdef").unwrap();
    f.seek(SeekFrom::Start(1)).unwrap();
    f.write("ghijklmnop").unwrap();
    f.close().unwrap();
    assert_eq!(read_text(&fs, "f"), "aghijklmnop");
}

#[test]
fn rewrite_spanning_chunks_extends_past_the_end() {
    let fs = SqlFs::in_memory_with_config(FsConfig {
        max_chunk_size: 4,
        ..FsConfig::default()
    })
    .unwrap();
    write_bytes(&fs, "f", b"abcdefgh");

    let mut f = fs.open("f", OpenMode::new(ModeKind::ReadWrite, DataKind::Binary)).unwrap();
    f.seek(SeekFrom::Start(6)).unwrap();
    f.write(b"XYZW").unwrap(); // runs two bytes past the old end
    f.close().unwrap();

    assert_eq!(read_bytes(&fs, "f"), b"abcdefXYZW");
}

#[test]
fn append_seek_past_end_pads_with_zeros() {
    let fs = SqlFs::in_memory().unwrap();
    write_bytes(&fs, "f", b"abc");

    let mut f = fs
        .open("f", OpenMode::new(ModeKind::Append, DataKind::Binary))
        .unwrap();
    assert_eq!(f.tell().unwrap(), 3);
    f.seek(SeekFrom::Start(8)).unwrap();
    f.write(b"xy").unwrap();
    f.close().unwrap();

    assert_eq!(read_bytes(&fs, "f"), b"abc\x00\x00\x00\x00\x00xy");
}

#[test]
fn append_resumes_at_the_end_of_the_file() {
    let fs = SqlFs::in_memory().unwrap();

    let mut f = fs.open("log", "a".parse().unwrap()).unwrap();
    f.write("one\n").unwrap();
    assert_eq!(f.tell().unwrap(), 4);
    f.close().unwrap();

    let mut f = fs.open("log", "a".parse().unwrap()).unwrap();
    f.write("two\n").unwrap();
    f.close().unwrap();

    assert_eq!(read_text(&fs, "log"), "one\ntwo\n");
}

#[test]
fn line_iteration_yields_terminated_lines_and_the_tail() {
    let fs = SqlFs::in_memory().unwrap();
    write_bytes(&fs, "foobar.txt", b"abc\ndef\nghi");

    let mut f = fs.open("foobar.txt", "r".parse().unwrap()).unwrap();
    let first = f.read_line().unwrap().unwrap();
    assert_eq!(first.as_text(), Some("abc\n"));
    f.close().unwrap();

    let mut f = fs.open("foobar.txt", "rb".parse().unwrap()).unwrap();
    let first = f.read_line().unwrap().unwrap();
    assert_eq!(first.into_binary().unwrap(), b"abc\n");
    f.close().unwrap();

    let mut f = fs.open("foobar.txt", "r".parse().unwrap()).unwrap();
    let lines: Vec<String> = f
        .read_lines()
        .unwrap()
        .into_iter()
        .map(|line| line.into_text().unwrap())
        .collect();
    assert_eq!(lines, vec!["abc\n", "def\n", "ghi"]);
    f.close().unwrap();
}

#[test]
fn line_iteration_restarts_after_a_seek() {
    let fs = SqlFs::in_memory().unwrap();
    write_bytes(&fs, "f", b"abc\ndef\nghi");

    let mut f = fs.open("f", "r".parse().unwrap()).unwrap();
    let first_pass = f.read_lines().unwrap();
    f.seek(SeekFrom::Start(0)).unwrap();
    let second_pass = f.read_lines().unwrap();
    assert_eq!(first_pass, second_pass);
    assert_eq!(first_pass.len(), 3);
}

#[test]
fn concatenated_lines_equal_the_bulk_read() {
    let fs = SqlFs::in_memory_with_config(FsConfig {
        max_chunk_size: 5,
        ..FsConfig::default()
    })
    .unwrap();
    write_bytes(&fs, "f", b"first line\nsecond\n\nlong tail without newline");

    let mut f = fs.open("f", "r".parse().unwrap()).unwrap();
    let joined: String = f
        .read_lines()
        .unwrap()
        .into_iter()
        .map(|line| line.into_text().unwrap())
        .collect();
    f.seek(SeekFrom::Start(0)).unwrap();
    let bulk = f.read(None).unwrap().into_text().unwrap();
    assert_eq!(joined, bulk);
}

#[test]
fn text_reads_count_characters_not_bytes() {
    let fs = SqlFs::in_memory().unwrap();
    let content = "The name is Ondřej";

    let mut f = fs.open("foobar.txt", "w".parse().unwrap()).unwrap();
    assert_eq!(f.write(content).unwrap(), content.chars().count());
    f.close().unwrap();

    let mut f = fs.open("foobar.txt", "rt".parse().unwrap()).unwrap();
    assert_eq!(f.read(None).unwrap().as_text(), Some(content));
    f.close().unwrap();

    let mut f = fs.open("foobar.txt", "r".parse().unwrap()).unwrap();
    assert_eq!(f.read(Some(3)).unwrap().as_text(), Some("The"));
    assert_eq!(f.read(Some(0)).unwrap().as_text(), Some(""));
    f.close().unwrap();

    assert_eq!(read_bytes(&fs, "foobar.txt"), content.as_bytes());
}

#[test]
fn partial_text_reads_never_split_a_code_point() {
    let fs = SqlFs::in_memory().unwrap();
    let mut f = fs.open("f", "w".parse().unwrap()).unwrap();
    f.write("héllo").unwrap(); // 5 characters, 6 bytes
    f.close().unwrap();

    let mut f = fs.open("f", "r".parse().unwrap()).unwrap();
    assert_eq!(f.read(Some(2)).unwrap().as_text(), Some("hé"));
    assert_eq!(f.tell().unwrap(), 3); // cursor advanced by encoded bytes
    assert_eq!(f.read(None).unwrap().as_text(), Some("llo"));
}

#[test]
fn oversized_reads_return_the_remainder() {
    let fs = SqlFs::in_memory().unwrap();
    write_bytes(&fs, "f", b"abc");

    let mut f = fs.open("f", "rb".parse().unwrap()).unwrap();
    assert_eq!(f.read(Some(100)).unwrap().into_binary().unwrap(), b"abc");
    assert!(f.read(None).unwrap().is_empty());
    assert!(f.read(Some(10)).unwrap().is_empty());
}

#[test]
fn unknown_mode_token_is_rejected() {
    assert!(matches!(
        "x".parse::<OpenMode>(),
        Err(FsError::NotSupportedMode(token)) if token == "x"
    ));
    assert!(matches!("wb+".parse::<OpenMode>(), Err(FsError::NotSupportedMode(_))));
}

#[test]
fn opening_a_missing_file_for_reading_fails() {
    let fs = SqlFs::in_memory().unwrap();
    assert!(matches!(
        fs.open("nope", "r".parse().unwrap()),
        Err(FsError::NotFound(name)) if name == "nope"
    ));
    assert!(matches!(
        fs.open("nope", "rb".parse().unwrap()),
        Err(FsError::NotFound(_))
    ));
}

#[test]
fn payload_kind_must_match_the_handle() {
    let fs = SqlFs::in_memory().unwrap();

    let mut f = fs.open("f", "wb".parse().unwrap()).unwrap();
    assert!(matches!(f.write("text"), Err(FsError::TypeMismatch { .. })));
    f.close().unwrap();

    let mut f = fs.open("f", "w".parse().unwrap()).unwrap();
    assert!(matches!(f.write(b"bytes"), Err(FsError::TypeMismatch { .. })));
    f.close().unwrap();
}

#[test]
fn writes_on_a_read_handle_are_rejected() {
    let fs = SqlFs::in_memory().unwrap();
    write_bytes(&fs, "f", b"abc");

    let mut f = fs.open("f", "r".parse().unwrap()).unwrap();
    assert!(matches!(f.write("more"), Err(FsError::ReadOnly)));
}

#[test]
fn only_start_relative_seeks_are_supported() {
    let fs = SqlFs::in_memory().unwrap();
    write_bytes(&fs, "f", b"abc");

    let mut f = fs.open("f", "rb".parse().unwrap()).unwrap();
    assert!(matches!(f.seek(SeekFrom::End(0)), Err(FsError::SeekUnsupported)));
    assert!(matches!(f.seek(SeekFrom::Current(1)), Err(FsError::SeekUnsupported)));
    assert_eq!(f.seek(SeekFrom::Start(1)).unwrap(), 1);
    assert_eq!(f.read(None).unwrap().into_binary().unwrap(), b"bc");
}

#[test]
fn interior_rewrite_of_a_multi_chunk_file_fails_fast() {
    let fs = SqlFs::in_memory_with_config(FsConfig {
        max_chunk_size: 12,
        ..FsConfig::default()
    })
    .unwrap();
    write_bytes(&fs, "f", &[b'x'; 36]);

    let mut f = fs
        .open("f", OpenMode::new(ModeKind::ReadWrite, DataKind::Binary))
        .unwrap();
    f.seek(SeekFrom::Start(5)).unwrap();
    f.write(b"abc").unwrap();
    assert!(matches!(f.flush(), Err(FsError::UnsupportedRewrite)));

    // the persisted layout is untouched by the failed flush
    drop(f);
    assert_eq!(read_bytes(&fs, "f"), vec![b'x'; 36]);
    assert_eq!(fs.chunk_count("f").unwrap(), 3);
}

#[test]
fn malformed_text_surfaces_a_codec_error() {
    let fs = SqlFs::in_memory().unwrap();
    write_bytes(&fs, "f", &[0xff, 0xfe, 0x41]);

    let mut f = fs.open("f", "r".parse().unwrap()).unwrap();
    assert!(matches!(f.read(None), Err(FsError::Codec(_))));
}

#[test]
fn read_write_mode_creates_missing_files() {
    let fs = SqlFs::in_memory().unwrap();
    let mut f = fs.open("f", "r+".parse().unwrap()).unwrap();
    f.write("abc").unwrap();
    f.seek(SeekFrom::Start(0)).unwrap();
    assert_eq!(f.read(None).unwrap().as_text(), Some("abc"));
    f.close().unwrap();
}

#[test]
fn contents_survive_reopening_the_database() {
    let dir = tempfile::tempdir().unwrap();
    let db = dir.path().join("fs.db");

    let fs = SqlFs::open_path(&db).unwrap();
    let mut f = fs.open("kept.txt", "w".parse().unwrap()).unwrap();
    f.write("still here\n").unwrap();
    f.close().unwrap();
    fs.close().unwrap();

    let fs = SqlFs::open_path(&db).unwrap();
    assert_eq!(read_text(&fs, "kept.txt"), "still here\n");
    assert_eq!(fs.size("missing").unwrap(), None);
    fs.close().unwrap();
}

#[test]
fn dropped_handles_flush_their_buffer() {
    let fs = SqlFs::in_memory().unwrap();
    {
        let mut f = fs.open("f", "w".parse().unwrap()).unwrap();
        f.write("buffered").unwrap();
        // dropped without close
    }
    assert_eq!(read_text(&fs, "f"), "buffered");
}
