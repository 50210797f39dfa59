#![doc = include_str!("../README.md")]

pub mod boundary;
mod converter;
pub mod document;
mod types;
mod wrappers;

pub use converter::{
    ConvertFlags, ConvertResult, ConvertStatus, ListenerId, NewlineConverter, MIN_OUTPUT_SIZE,
};
pub use types::{Error, NewlineType, Result, CR, LF};
pub use wrappers::io::{IoExt, ReadExt, Reader, WriteExt, Writer, DEFAULT_BUF_SIZE};

#[cfg(feature = "futures-io")]
pub mod futures_io {
    pub use crate::wrappers::futures_io::{
        AsyncReader, AsyncWriter, FuturesIoAsyncReadExt, FuturesIoAsyncWriteExt, FuturesIoExt,
    };
}

#[cfg(feature = "futures-io")]
pub use wrappers::futures_io::FuturesIoExt;

#[cfg(feature = "tokio")]
pub mod tokio {
    pub use crate::wrappers::tokio::{
        AsyncReader, AsyncWriter, TokioAsyncReadExt, TokioAsyncWriteExt, TokioExt,
    };
}

#[cfg(feature = "tokio")]
pub use wrappers::tokio::TokioExt;
