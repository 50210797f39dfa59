//! The `io` module provides wrappers for standard I/O `Read` and `Write`
//! traits to perform newline conversion on-the-fly.

use std::io::{Read, Write};

use crate::{ConvertFlags, ConvertStatus, Error, NewlineConverter, NewlineType};

/// Default size of the internal input buffer of the I/O wrappers.
pub const DEFAULT_BUF_SIZE: usize = 8192;

// A held-back CR occupies one byte, at least one more must fit next to it.
const MIN_BUF_SIZE: usize = 2;

/// Input buffer shared by the readers and writers.
///
/// Holds bytes the converter has not consumed yet at `input[pos..len]`.
pub(crate) struct InputBuffer {
    buf: Box<[u8]>,
    pos: usize,
    len: usize,
}

impl InputBuffer {
    pub(crate) fn new(buf_size: usize) -> Self {
        Self {
            buf: vec![0; buf_size.max(MIN_BUF_SIZE)].into_boxed_slice(),
            pos: 0,
            len: 0,
        }
    }

    pub(crate) fn pending(&self) -> &[u8] {
        &self.buf[self.pos..self.len]
    }

    pub(crate) fn is_empty(&self) -> bool {
        self.pos == self.len
    }

    pub(crate) fn is_full(&self) -> bool {
        self.len == self.buf.len()
    }

    pub(crate) fn consume(&mut self, n: usize) {
        self.pos += n;
    }

    /// Move the unconsumed bytes to the front and return the free space
    /// behind them.
    pub(crate) fn spare_mut(&mut self) -> &mut [u8] {
        if self.pos > 0 {
            self.buf.copy_within(self.pos..self.len, 0);
            self.len -= self.pos;
            self.pos = 0;
        }
        &mut self.buf[self.len..]
    }

    pub(crate) fn fill(&mut self, n: usize) {
        self.len += n;
    }

    /// Copy as much of `source` as fits, returning the number of bytes taken.
    pub(crate) fn extend_from(&mut self, source: &[u8]) -> usize {
        let spare = self.spare_mut();
        let bytes_now = source.len().min(spare.len());
        spare[..bytes_now].copy_from_slice(&source[..bytes_now]);
        self.fill(bytes_now);
        bytes_now
    }
}

pub(crate) fn output_size_for(buf_size: usize) -> usize {
    buf_size.max(MIN_BUF_SIZE) * 2
}

/// A `std::io::Read` wrapper and implementation that converts newlines on-the-fly.
pub struct Reader<R> {
    inner: R,
    converter: NewlineConverter,
    input: InputBuffer,
    output_buf: Box<[u8]>,
    output_pos: usize,
    output_size: usize,
    end_of_stream: bool,
    finished: bool,
}

impl<R: Read> Reader<R> {
    pub fn new(reader: R, target: NewlineType, buf_size: usize) -> Self {
        Self::with_converter(reader, NewlineConverter::new(target), buf_size)
    }

    pub fn with_converter(reader: R, converter: NewlineConverter, buf_size: usize) -> Self {
        Self {
            inner: reader,
            converter,
            input: InputBuffer::new(buf_size),
            output_buf: vec![0; output_size_for(buf_size)].into_boxed_slice(),
            output_pos: 0,
            output_size: 0,
            end_of_stream: false,
            finished: false,
        }
    }

    fn fill_buf(&mut self) -> std::io::Result<()> {
        self.output_pos = 0;
        self.output_size = 0;

        let mut starved = self.input.is_empty();
        while !self.finished {
            if starved && !self.end_of_stream {
                let bytes_read = self.inner.read(self.input.spare_mut())?;
                self.input.fill(bytes_read);
                self.end_of_stream = bytes_read == 0;
            }

            let flags = if self.end_of_stream {
                ConvertFlags::INPUT_AT_END
            } else {
                ConvertFlags::NONE
            };

            match self
                .converter
                .convert(self.input.pending(), &mut self.output_buf, flags)
            {
                Ok(result) => {
                    self.input.consume(result.bytes_read());
                    self.output_size = result.bytes_written();
                    self.finished = result.status() == ConvertStatus::Finished;
                    if self.output_size > 0 {
                        break;
                    }
                    starved = self.input.is_empty();
                }
                Err(Error::AmbiguousStreamState) => starved = true,
                Err(err) => return Err(std::io::Error::other(err)),
            }
        }
        Ok(())
    }

    pub fn converter(&self) -> &NewlineConverter {
        &self.converter
    }

    pub fn converter_mut(&mut self) -> &mut NewlineConverter {
        &mut self.converter
    }

    pub fn into_inner(self) -> R {
        self.inner
    }
}

impl<R: Read> Read for Reader<R> {
    fn read(&mut self, buf: &mut [u8]) -> std::io::Result<usize> {
        if buf.is_empty() {
            return Ok(0);
        }
        if self.output_pos >= self.output_size {
            self.fill_buf()?;
        }
        if self.output_size == 0 {
            return Ok(0);
        }

        let bytes_now = buf.len().min(self.output_size - self.output_pos);
        buf[..bytes_now]
            .copy_from_slice(&self.output_buf[self.output_pos..self.output_pos + bytes_now]);
        self.output_pos += bytes_now;
        Ok(bytes_now)
    }
}

/// A `std::io::Write` wrapper and implementation that converts newlines on-the-fly.
pub struct Writer<W> {
    inner: W,
    converter: NewlineConverter,
    input: InputBuffer,
    output_buf: Box<[u8]>,
}

impl<W: Write> Writer<W> {
    pub fn new(inner: W, target: NewlineType, buf_size: usize) -> Self {
        Self::with_converter(inner, NewlineConverter::new(target), buf_size)
    }

    pub fn with_converter(inner: W, converter: NewlineConverter, buf_size: usize) -> Self {
        Self {
            inner,
            converter,
            input: InputBuffer::new(buf_size),
            output_buf: vec![0; output_size_for(buf_size)].into_boxed_slice(),
        }
    }

    /// Convert staged input and write the result to the inner writer until
    /// the converter needs more input or the staged input is gone.
    fn drain(&mut self, flags: ConvertFlags) -> std::io::Result<()> {
        loop {
            match self
                .converter
                .convert(self.input.pending(), &mut self.output_buf, flags)
            {
                Ok(result) => {
                    self.input.consume(result.bytes_read());
                    self.inner
                        .write_all(&self.output_buf[..result.bytes_written()])?;
                    if result.status() != ConvertStatus::Converted || self.input.is_empty() {
                        return Ok(());
                    }
                }
                Err(Error::AmbiguousStreamState) => return Ok(()),
                Err(err) => return Err(std::io::Error::other(err)),
            }
        }
    }

    /// Convert whatever is left as the end of the stream and return the
    /// inner writer.
    pub fn finish(self) -> std::io::Result<W> {
        let mut this = self;
        this.drain(ConvertFlags::INPUT_AT_END)?;
        Ok(this.inner)
    }

    pub fn converter(&self) -> &NewlineConverter {
        &self.converter
    }

    pub fn converter_mut(&mut self) -> &mut NewlineConverter {
        &mut self.converter
    }
}

impl<W: Write> Write for Writer<W> {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        let mut source_buf = buf;
        let mut total_bytes = 0;

        while !source_buf.is_empty() {
            let bytes_now = self.input.extend_from(source_buf);
            total_bytes += bytes_now;
            source_buf = &source_buf[bytes_now..];

            if !self.input.is_full() {
                // Not enough data yet to process a full chunk.
                break;
            }
            self.drain(ConvertFlags::NONE)?;
        }
        Ok(total_bytes)
    }

    fn flush(&mut self) -> std::io::Result<()> {
        // Flushing is not necessarily the end of the stream, a CR written now
        // still pairs with an LF written later.
        self.drain(ConvertFlags::FLUSH)?;
        self.inner.flush()
    }
}

/// Extension trait to provide convenient constructors on [`NewlineType`] for
/// `std::io::Read` and `std::io::Write`.
pub trait IoExt
where
    Self: Sized,
{
    /// Wrap a reader with a newline-converting `Reader`.
    fn wrap_reader<R: Read>(self, reader: R) -> Reader<R> {
        self.wrap_reader_with_buffer_size(reader, DEFAULT_BUF_SIZE)
    }

    /// Wrap a reader with a newline-converting `Reader` and specify the internal buffer size.
    fn wrap_reader_with_buffer_size<R: Read>(self, reader: R, buf_size: usize) -> Reader<R>;

    /// Wrap a writer with a newline-converting `Writer`.
    fn wrap_writer<W: Write>(self, writer: W) -> Writer<W> {
        self.wrap_writer_with_buffer_size(writer, DEFAULT_BUF_SIZE)
    }

    /// Wrap a writer with a newline-converting `Writer` and specify the internal buffer size.
    fn wrap_writer_with_buffer_size<W: Write>(self, writer: W, buf_size: usize) -> Writer<W>;
}

impl IoExt for NewlineType {
    fn wrap_reader_with_buffer_size<R: Read>(self, reader: R, buf_size: usize) -> Reader<R> {
        Reader::new(reader, self, buf_size)
    }

    fn wrap_writer_with_buffer_size<W: Write>(self, writer: W, buf_size: usize) -> Writer<W> {
        Writer::new(writer, self, buf_size)
    }
}

/// Extension trait to provide convenient methods on `std::io::Read`.
pub trait ReadExt {
    /// Wrap the reader with a newline-converting `Reader`.
    fn convert_newlines(self, target: NewlineType) -> Reader<Self>
    where
        Self: Sized;
}

impl<R: Read> ReadExt for R {
    fn convert_newlines(self, target: NewlineType) -> Reader<Self>
    where
        Self: Sized,
    {
        target.wrap_reader(self)
    }
}

/// Extension trait to provide convenient methods on `std::io::Write`.
pub trait WriteExt {
    /// Wrap the writer with a newline-converting `Writer`.
    fn convert_newlines(self, target: NewlineType) -> Writer<Self>
    where
        Self: Sized;
}

impl<W: Write> WriteExt for W {
    fn convert_newlines(self, target: NewlineType) -> Writer<Self>
    where
        Self: Sized,
    {
        target.wrap_writer(self)
    }
}
