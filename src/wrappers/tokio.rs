use std::{
    future::Future,
    pin::{pin, Pin},
    task::{Context, Poll},
};

use pin_project_lite::pin_project;
use tokio::io::{AsyncRead, AsyncWrite};

use crate::{
    wrappers::{
        async_core::{AsyncReadCompat, AsyncWriteCompat, ReadBuffer, WriteBuffer},
        io::DEFAULT_BUF_SIZE,
    },
    NewlineConverter, NewlineType,
};

pin_project! {
    /// A `tokio::io::AsyncRead` wrapper that converts newlines on-the-fly.
    pub struct AsyncReader<R> {
        #[pin]
        reader: R,
        buf: ReadBuffer,
    }
}

impl<R> AsyncReader<R> {
    pub fn new(reader: R, target: NewlineType, buf_size: usize) -> Self {
        Self::with_converter(reader, NewlineConverter::new(target), buf_size)
    }

    pub fn with_converter(reader: R, converter: NewlineConverter, buf_size: usize) -> Self {
        Self {
            reader,
            buf: ReadBuffer::new(converter, buf_size),
        }
    }

    pub fn converter(&self) -> &NewlineConverter {
        self.buf.converter()
    }

    pub fn converter_mut(self: Pin<&mut Self>) -> &mut NewlineConverter {
        self.project().buf.converter_mut()
    }

    pub fn into_inner(self) -> R {
        self.reader
    }
}

struct TokioReader<R: AsyncRead>(R);

impl<R: AsyncRead + Unpin> AsyncReadCompat for TokioReader<R> {
    fn poll_read(
        self: Pin<&mut Self>,
        cx: &mut Context<'_>,
        buf: &mut [u8],
    ) -> Poll<std::io::Result<usize>> {
        let this = self.get_mut();
        let mut read_buf = tokio::io::ReadBuf::new(buf);
        match Pin::new(&mut this.0).poll_read(cx, &mut read_buf) {
            Poll::Ready(Ok(())) => Poll::Ready(Ok(read_buf.filled().len())),
            Poll::Ready(Err(e)) => Poll::Ready(Err(e)),
            Poll::Pending => Poll::Pending,
        }
    }
}

impl<R: AsyncRead> AsyncRead for AsyncReader<R> {
    fn poll_read(
        self: Pin<&mut Self>,
        cx: &mut Context<'_>,
        buf: &mut tokio::io::ReadBuf<'_>,
    ) -> Poll<std::io::Result<()>> {
        let this = self.project();
        let reader = pin!(TokioReader(this.reader));
        match this.buf.poll_read(cx, reader, buf.initialize_unfilled()) {
            Poll::Ready(Ok(n)) => {
                buf.advance(n);
                Poll::Ready(Ok(()))
            }
            Poll::Ready(Err(e)) => Poll::Ready(Err(e)),
            Poll::Pending => Poll::Pending,
        }
    }
}

pin_project! {
    /// A `tokio::io::AsyncWrite` wrapper that converts newlines on-the-fly.
    ///
    /// `poll_shutdown` ends the converted stream before shutting down the
    /// inner writer.
    pub struct AsyncWriter<W> {
        #[pin]
        writer: W,
        buf: WriteBuffer,
    }
}

impl<W> AsyncWriter<W> {
    pub fn new(writer: W, target: NewlineType, buf_size: usize) -> Self {
        Self::with_converter(writer, NewlineConverter::new(target), buf_size)
    }

    pub fn with_converter(writer: W, converter: NewlineConverter, buf_size: usize) -> Self {
        Self {
            writer,
            buf: WriteBuffer::new(converter, buf_size),
        }
    }

    pub fn converter(&self) -> &NewlineConverter {
        self.buf.converter()
    }

    pub fn converter_mut(self: Pin<&mut Self>) -> &mut NewlineConverter {
        self.project().buf.converter_mut()
    }
}

impl<W: AsyncWrite + Unpin> AsyncWriter<W> {
    /// Convert whatever is left as the end of the stream and resolve to the
    /// inner writer, without shutting it down.
    pub fn finish(self) -> impl Future<Output = std::io::Result<W>> {
        Finisher {
            writer: Some(self.writer),
            buf: self.buf,
        }
    }
}

struct Finisher<W> {
    writer: Option<W>,
    buf: WriteBuffer,
}

impl<W: AsyncWrite + Unpin> Future for Finisher<W> {
    type Output = std::io::Result<W>;

    fn poll(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        let this = self.get_mut();

        let Some(writer) = this.writer.as_mut() else {
            panic!("polled after completion");
        };

        let writer = pin!(TokioWriter(writer));
        match this.buf.poll_flush(cx, writer, true) {
            Poll::Ready(Ok(())) => {}
            Poll::Ready(Err(e)) => return Poll::Ready(Err(e)),
            Poll::Pending => return Poll::Pending,
        }

        Poll::Ready(
            this.writer
                .take()
                .ok_or_else(|| std::io::Error::other("writer already taken")),
        )
    }
}

struct TokioWriter<W: AsyncWrite>(W);

impl<W: AsyncWrite + Unpin> AsyncWriteCompat for TokioWriter<W> {
    fn poll_write(
        self: Pin<&mut Self>,
        cx: &mut Context<'_>,
        buf: &[u8],
    ) -> Poll<std::io::Result<usize>> {
        let this = self.get_mut();
        Pin::new(&mut this.0).poll_write(cx, buf)
    }

    fn poll_flush(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<std::io::Result<()>> {
        let this = self.get_mut();
        Pin::new(&mut this.0).poll_flush(cx)
    }

    fn poll_finish(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<std::io::Result<()>> {
        let this = self.get_mut();
        Pin::new(&mut this.0).poll_shutdown(cx)
    }
}

impl<W: AsyncWrite> AsyncWrite for AsyncWriter<W> {
    fn poll_write(
        self: Pin<&mut Self>,
        cx: &mut Context<'_>,
        buf: &[u8],
    ) -> Poll<std::result::Result<usize, std::io::Error>> {
        let this = self.project();
        let writer = pin!(TokioWriter(this.writer));
        this.buf.poll_write(cx, writer, buf)
    }

    fn poll_flush(
        self: Pin<&mut Self>,
        cx: &mut Context<'_>,
    ) -> Poll<std::result::Result<(), std::io::Error>> {
        let this = self.project();
        let writer = pin!(TokioWriter(this.writer));
        this.buf.poll_flush(cx, writer, false)
    }

    fn poll_shutdown(
        self: Pin<&mut Self>,
        cx: &mut Context<'_>,
    ) -> Poll<std::result::Result<(), std::io::Error>> {
        let this = self.project();
        let writer = pin!(TokioWriter(this.writer));
        this.buf.poll_finish(cx, writer)
    }
}

/// Extension trait to provide convenient constructors on [`NewlineType`] for
/// `tokio::io::AsyncRead` and `tokio::io::AsyncWrite`.
pub trait TokioExt
where
    Self: Sized,
{
    fn wrap_async_reader<R: AsyncRead>(self, reader: R) -> AsyncReader<R> {
        self.wrap_async_reader_with_buffer_size(reader, DEFAULT_BUF_SIZE)
    }

    fn wrap_async_reader_with_buffer_size<R: AsyncRead>(
        self,
        reader: R,
        buf_size: usize,
    ) -> AsyncReader<R>;

    fn wrap_async_writer<W: AsyncWrite>(self, writer: W) -> AsyncWriter<W> {
        self.wrap_async_writer_with_buffer_size(writer, DEFAULT_BUF_SIZE)
    }

    fn wrap_async_writer_with_buffer_size<W: AsyncWrite>(
        self,
        writer: W,
        buf_size: usize,
    ) -> AsyncWriter<W>;
}

impl TokioExt for NewlineType {
    fn wrap_async_reader_with_buffer_size<R: AsyncRead>(
        self,
        reader: R,
        buf_size: usize,
    ) -> AsyncReader<R> {
        AsyncReader::new(reader, self, buf_size)
    }

    fn wrap_async_writer_with_buffer_size<W: AsyncWrite>(
        self,
        writer: W,
        buf_size: usize,
    ) -> AsyncWriter<W> {
        AsyncWriter::new(writer, self, buf_size)
    }
}

pub trait TokioAsyncReadExt {
    fn convert_newlines(self, target: NewlineType) -> AsyncReader<Self>
    where
        Self: Sized;
}

impl<R: AsyncRead> TokioAsyncReadExt for R {
    fn convert_newlines(self, target: NewlineType) -> AsyncReader<Self>
    where
        Self: Sized,
    {
        target.wrap_async_reader(self)
    }
}

pub trait TokioAsyncWriteExt {
    fn convert_newlines(self, target: NewlineType) -> AsyncWriter<Self>
    where
        Self: Sized;
}

impl<W: AsyncWrite> TokioAsyncWriteExt for W {
    fn convert_newlines(self, target: NewlineType) -> AsyncWriter<Self>
    where
        Self: Sized,
    {
        target.wrap_async_writer(self)
    }
}
