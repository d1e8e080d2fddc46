//! Upstream payload documents and the sources they are polled from.
//!
//! [`FileSource`] watches a JSON file. A fetch layer in front of the
//! upstream service would implement [`DataSource`] the same way.

mod file;
mod payload;

pub use file::FileSource;
pub use payload::PayloadDocument;

use std::fmt::Debug;

use crate::error::Result;

/// Somewhere payload documents can be polled from.
///
/// # Example
///
/// ```no_run
/// use fieldwatch::{DataSource, FileSource};
///
/// let mut source = FileSource::new("payload.json");
/// match source.poll() {
///     Ok(Some(document)) => println!("{} series", document.series_count()),
///     Ok(None) => println!("unchanged"),
///     Err(e) => eprintln!("{}: {}", source.description(), e),
/// }
/// ```
pub trait DataSource: Send + Debug {
    /// Fetch the next document without blocking.
    ///
    /// `Ok(None)` means nothing new since the previous call. An error is
    /// reported once per broken version of the input.
    fn poll(&mut self) -> Result<Option<PayloadDocument>>;

    /// Where documents come from, for log and status lines.
    fn description(&self) -> &str;
}
