#![allow(dead_code)]

use std::io::{self, Read};

use newline_stream::{ConvertFlags, ConvertStatus, Error, NewlineConverter, NewlineType};

pub struct TestReader<R, I> {
    readers: I,
    current: Option<R>,
}

impl<R: Read, I: Iterator<Item = R>> TestReader<R, I> {
    pub fn new(mut readers: I) -> TestReader<R, I> {
        let current = readers.next();
        TestReader { readers, current }
    }
}

impl<R: Read, I: Iterator<Item = R>> Read for TestReader<R, I> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        loop {
            match self.current {
                Some(ref mut r) => {
                    let n = r.read(buf)?;
                    if n > 0 {
                        return Ok(n);
                    }
                }
                None => return Ok(0),
            }
            self.current = self.readers.next();
        }
    }
}

/// Convert `input` as one complete stream, re-presenting whatever a call did
/// not consume, with an output buffer of `memory` bytes.
pub fn convert_with_memory(target: NewlineType, input: &[u8], memory: usize) -> Vec<u8> {
    let mut converter = NewlineConverter::new(target);
    let mut out = vec![0u8; memory];
    let mut output = Vec::new();
    let mut read_pos = 0;
    loop {
        let result = converter
            .convert(&input[read_pos..], &mut out, ConvertFlags::INPUT_AT_END)
            .unwrap();
        assert!(
            result.bytes_read() > 0
                || result.bytes_written() > 0
                || result.status() == ConvertStatus::Finished,
            "no progress at offset {read_pos}"
        );
        read_pos += result.bytes_read();
        output.extend_from_slice(&out[..result.bytes_written()]);
        if result.status() == ConvertStatus::Finished {
            return output;
        }
    }
}

/// Convert a stream delivered in `chunks`, carrying unconsumed bytes over to
/// the next chunk. Every chunk but the last ends with `between` flags.
pub fn convert_chunks(
    target: NewlineType,
    chunks: &[&[u8]],
    memory: usize,
    between: ConvertFlags,
) -> Vec<u8> {
    let mut converter = NewlineConverter::new(target);
    let mut out = vec![0u8; memory];
    let mut pending = Vec::new();
    let mut output = Vec::new();

    for (i, chunk) in chunks.iter().enumerate() {
        pending.extend_from_slice(chunk);
        let last = i + 1 == chunks.len();
        let flags = if last {
            ConvertFlags::INPUT_AT_END
        } else {
            between
        };
        loop {
            match converter.convert(&pending, &mut out, flags) {
                Ok(result) => {
                    pending.drain(..result.bytes_read());
                    output.extend_from_slice(&out[..result.bytes_written()]);
                    if result.status() != ConvertStatus::Converted
                        || (!last && pending.is_empty())
                    {
                        break;
                    }
                }
                Err(Error::AmbiguousStreamState) if !last => break,
                Err(err) => panic!("unexpected error: {err}"),
            }
        }
    }
    output
}
