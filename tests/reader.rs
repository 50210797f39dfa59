mod helpers;

use std::io::Read;

use helpers::TestReader;
use newline_stream::{IoExt, NewlineConverter, NewlineType, ReadExt, Reader};

fn read_all<R: Read>(mut r: R) -> Vec<u8> {
    let mut out = Vec::new();
    r.read_to_end(&mut out).unwrap();
    out
}

#[test]
fn crlf_split_across_readers() {
    for target in NewlineType::ALL {
        let readers = vec![b"foo\r".as_ref(), b"\nbar".as_ref()].into_iter();
        let test_reader = TestReader::new(readers);
        let nr = target.wrap_reader_with_buffer_size(test_reader, 3);
        assert_eq!(read_all(nr), target.normalize(b"foo\r\nbar"), "{target}");
    }
}

#[test]
fn crlf_split_across_three_readers() {
    let readers = vec![b"\r".as_ref(), b"".as_ref(), b"\n".as_ref()].into_iter();
    let test_reader = TestReader::new(readers);
    let nr = NewlineType::Lf.wrap_reader_with_buffer_size(test_reader, 3);
    assert_eq!(read_all(nr), b"\n".to_vec());
}

#[test]
fn lone_lf_in_first_reader_converted_to_crlf() {
    let readers = vec![b"line1\n".as_ref(), b"line2".as_ref()].into_iter();
    let test_reader = TestReader::new(readers);
    let nr = NewlineType::CrLf.wrap_reader_with_buffer_size(test_reader, 4);
    assert_eq!(read_all(nr), b"line1\r\nline2".to_vec());
}

#[test]
fn multiple_crs_and_crlf_mixed_across_boundaries() {
    let readers = vec![b"\r".as_ref(), b"\r\n".as_ref()].into_iter();
    let test_reader = TestReader::new(readers);
    let nr = NewlineType::CrLf.wrap_reader_with_buffer_size(test_reader, 2);
    assert_eq!(read_all(nr), b"\r\n\r\n".to_vec());
}

#[test]
fn trailing_cr_at_eof_is_a_boundary() {
    let readers = vec![b"foo\r".as_ref()].into_iter();
    let test_reader = TestReader::new(readers);
    let nr = NewlineType::Lf.wrap_reader_with_buffer_size(test_reader, 4);
    assert_eq!(read_all(nr), b"foo\n".to_vec());
}

#[test]
fn tiny_buffer_and_tiny_reads() {
    let input = &b"a\r\nbb\rccc\n\r\r\n"[..];
    let mut nr = Reader::new(input, NewlineType::CrLf, 1);
    let mut out = Vec::new();
    let mut byte = [0u8; 1];
    loop {
        match nr.read(&mut byte).unwrap() {
            0 => break,
            n => out.extend_from_slice(&byte[..n]),
        }
    }
    assert_eq!(out, b"a\r\nbb\r\nccc\r\n\r\n\r\n".to_vec());
}

#[test]
fn empty_input() {
    let nr = (&b""[..]).convert_newlines(NewlineType::CrLf);
    assert!(read_all(nr).is_empty());
}

#[test]
fn with_converter_keeps_listeners() {
    let mut converter = NewlineConverter::new(NewlineType::Cr);
    let id = converter.connect_target_changed(|_| {});
    let mut nr = Reader::with_converter(&b"a\nb"[..], converter, 16);
    assert_eq!(nr.converter().target(), NewlineType::Cr);
    assert!(nr.converter_mut().disconnect(id));
    assert_eq!(read_all(&mut nr), b"a\rb".to_vec());
    assert!(nr.into_inner().is_empty());
}
