use std::{
    pin::Pin,
    task::{Context, Poll},
};

use crate::{
    wrappers::io::{output_size_for, InputBuffer},
    ConvertFlags, ConvertStatus, Error, NewlineConverter,
};

pub trait AsyncReadCompat {
    fn poll_read(
        self: Pin<&mut Self>,
        cx: &mut Context<'_>,
        buf: &mut [u8],
    ) -> Poll<std::io::Result<usize>>;
}

pub struct ReadBuffer {
    converter: NewlineConverter,
    input: InputBuffer,
    output_buf: Box<[u8]>,
    output_pos: usize,
    output_size: usize,
    starved: bool,
    end_of_stream: bool,
    finished: bool,
}

impl ReadBuffer {
    #[must_use]
    pub fn new(converter: NewlineConverter, buf_size: usize) -> Self {
        Self {
            converter,
            input: InputBuffer::new(buf_size),
            output_buf: vec![0; output_size_for(buf_size)].into_boxed_slice(),
            output_pos: 0,
            output_size: 0,
            starved: true,
            end_of_stream: false,
            finished: false,
        }
    }

    pub fn converter(&self) -> &NewlineConverter {
        &self.converter
    }

    pub fn converter_mut(&mut self) -> &mut NewlineConverter {
        &mut self.converter
    }

    pub fn poll_read<R: AsyncReadCompat>(
        &mut self,
        cx: &mut Context<'_>,
        inner: Pin<&mut R>,
        buf: &mut [u8],
    ) -> Poll<std::io::Result<usize>> {
        if buf.is_empty() {
            return Poll::Ready(Ok(0));
        }

        if self.output_pos >= self.output_size {
            match self.poll_fill_buf(cx, inner) {
                Poll::Ready(Ok(())) => {}
                Poll::Ready(Err(e)) => return Poll::Ready(Err(e)),
                Poll::Pending => return Poll::Pending,
            }
        }

        if self.output_size == 0 {
            return Poll::Ready(Ok(0));
        }

        let bytes_now = buf.len().min(self.output_size - self.output_pos);
        buf[..bytes_now]
            .copy_from_slice(&self.output_buf[self.output_pos..self.output_pos + bytes_now]);
        self.output_pos += bytes_now;
        Poll::Ready(Ok(bytes_now))
    }

    pub fn poll_fill_buf<R: AsyncReadCompat>(
        &mut self,
        cx: &mut Context<'_>,
        mut inner: Pin<&mut R>,
    ) -> Poll<std::io::Result<()>> {
        self.output_pos = 0;
        self.output_size = 0;

        while !self.finished {
            if self.starved && !self.end_of_stream {
                // `starved` stays set while pending so the read is retried
                // on the next poll.
                let bytes_read = match inner.as_mut().poll_read(cx, self.input.spare_mut()) {
                    Poll::Ready(Ok(n)) => n,
                    Poll::Ready(Err(e)) => return Poll::Ready(Err(e)),
                    Poll::Pending => return Poll::Pending,
                };
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
                    self.starved = self.input.is_empty();
                    if self.output_size > 0 {
                        break;
                    }
                }
                Err(Error::AmbiguousStreamState) => self.starved = true,
                Err(err) => return Poll::Ready(Err(std::io::Error::other(err))),
            }
        }
        Poll::Ready(Ok(()))
    }
}

pub trait AsyncWriteCompat {
    fn poll_write(
        self: Pin<&mut Self>,
        cx: &mut Context<'_>,
        buf: &[u8],
    ) -> Poll<std::io::Result<usize>>;

    fn poll_flush(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<std::io::Result<()>>;

    fn poll_finish(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<std::io::Result<()>>;
}

pub struct WriteBuffer {
    converter: NewlineConverter,
    input: InputBuffer,
    output_buf: Box<[u8]>,
    output_pos: usize,
    output_size: usize,
    stream_state: State,
}

pub enum State {
    Writing,
    Finishing,
    Finished,
}

impl WriteBuffer {
    #[must_use]
    pub fn new(converter: NewlineConverter, buf_size: usize) -> Self {
        Self {
            converter,
            input: InputBuffer::new(buf_size),
            output_buf: vec![0; output_size_for(buf_size)].into_boxed_slice(),
            output_pos: 0,
            output_size: 0,
            stream_state: State::Writing,
        }
    }

    pub fn converter(&self) -> &NewlineConverter {
        &self.converter
    }

    pub fn converter_mut(&mut self) -> &mut NewlineConverter {
        &mut self.converter
    }

    /// Convert staged input into the (empty) output buffer.
    ///
    /// Returns `false` when the converter cannot make progress with `flags`.
    fn convert_staged(&mut self, flags: ConvertFlags) -> std::io::Result<bool> {
        self.output_pos = 0;
        self.output_size = 0;
        match self
            .converter
            .convert(self.input.pending(), &mut self.output_buf, flags)
        {
            Ok(result) => {
                self.input.consume(result.bytes_read());
                self.output_size = result.bytes_written();
                Ok(self.output_size > 0
                    || (result.status() == ConvertStatus::Converted && !self.input.is_empty()))
            }
            Err(Error::AmbiguousStreamState) => Ok(false),
            Err(err) => Err(std::io::Error::other(err)),
        }
    }

    fn poll_write_output<W: AsyncWriteCompat>(
        &mut self,
        cx: &mut Context<'_>,
        mut inner: Pin<&mut W>,
    ) -> Poll<std::io::Result<()>> {
        while self.output_pos < self.output_size {
            match inner
                .as_mut()
                .poll_write(cx, &self.output_buf[self.output_pos..self.output_size])
            {
                Poll::Ready(Ok(0)) => {
                    return Poll::Ready(Err(std::io::ErrorKind::WriteZero.into()));
                }
                Poll::Ready(Ok(n)) => self.output_pos += n,
                Poll::Ready(Err(e)) => return Poll::Ready(Err(e)),
                Poll::Pending => return Poll::Pending,
            }
        }
        Poll::Ready(Ok(()))
    }

    pub fn poll_write<W: AsyncWriteCompat>(
        &mut self,
        cx: &mut Context<'_>,
        mut inner: Pin<&mut W>,
        buf: &[u8],
    ) -> Poll<std::io::Result<usize>> {
        loop {
            // Converted output from an earlier call must go out before more
            // input is accepted.
            match self.poll_write_output(cx, inner.as_mut()) {
                Poll::Ready(Ok(())) => {}
                Poll::Ready(Err(e)) => return Poll::Ready(Err(e)),
                Poll::Pending => return Poll::Pending,
            }

            if !self.input.is_full() {
                return Poll::Ready(Ok(self.input.extend_from(buf)));
            }

            // Input is full: convert it and write it out before accepting
            // more.
            self.convert_staged(ConvertFlags::NONE)?;
        }
    }

    pub fn poll_flush<W: AsyncWriteCompat>(
        &mut self,
        cx: &mut Context<'_>,
        mut inner: Pin<&mut W>,
        finish: bool,
    ) -> Poll<std::io::Result<()>> {
        let flags = if finish {
            ConvertFlags::INPUT_AT_END
        } else {
            ConvertFlags::FLUSH
        };

        loop {
            match self.poll_write_output(cx, inner.as_mut()) {
                Poll::Ready(Ok(())) => {}
                Poll::Ready(Err(e)) => return Poll::Ready(Err(e)),
                Poll::Pending => return Poll::Pending,
            }

            if !self.convert_staged(flags)? {
                break;
            }
        }

        inner.poll_flush(cx)
    }

    pub fn poll_finish<W: AsyncWriteCompat>(
        &mut self,
        cx: &mut Context<'_>,
        mut inner: Pin<&mut W>,
    ) -> Poll<std::io::Result<()>> {
        if let State::Writing = self.stream_state {
            match self.poll_flush(cx, inner.as_mut(), true) {
                Poll::Ready(Ok(())) => {}
                other => return other,
            }
            self.stream_state = State::Finishing;
        }

        if let State::Finishing = self.stream_state {
            match inner.poll_finish(cx) {
                Poll::Ready(Ok(())) => {
                    self.stream_state = State::Finished;
                }
                other => return other,
            }
        }

        Poll::Ready(Ok(()))
    }
}
