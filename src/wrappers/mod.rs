pub mod io;

#[cfg(any(feature = "futures-io", feature = "tokio"))]
pub mod async_core;

#[cfg(feature = "futures-io")]
pub mod futures_io;

#[cfg(feature = "tokio")]
pub mod tokio;
