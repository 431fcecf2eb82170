//! Path-based wrappers around [`load_image`] and [`store_image`].

use std::fs::File;
use std::io::{BufReader, BufWriter};
use std::path::Path;

use tbmem_error::Result;
use tbmem_store::MemoryStore;
use tbmem_types::AddressRange;
use tracing::debug;

use crate::codec::{LoadSummary, StoreSummary, load_image, store_image};
use crate::format::ImageFormat;

/// Load the image file at `path` into `store`.
pub fn load_file(
    store: &mut MemoryStore,
    path: &Path,
    format: ImageFormat,
    range: &AddressRange,
) -> Result<LoadSummary> {
    debug!(path = %path.display(), %format, "opening memory image");
    let file = File::open(path).map_err(|err| store.alerter().fail(err.into()))?;
    load_image(store, BufReader::new(file), format, range)
}

/// Write `store` within `range` to the image file at `path`, replacing it.
///
/// The range is checked before the file is created, so a rejected call
/// leaves any existing file untouched.
pub fn store_file(
    store: &MemoryStore,
    path: &Path,
    format: ImageFormat,
    range: &AddressRange,
) -> Result<StoreSummary> {
    store
        .policy()
        .ascending_range("store", range)
        .map_err(|err| store.alerter().fail(err))?;
    debug!(path = %path.display(), %format, "creating memory image");
    let file = File::create(path).map_err(|err| store.alerter().fail(err.into()))?;
    store_image(store, BufWriter::new(file), format, range)
}
