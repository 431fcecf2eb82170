//! Sparse tri-state memory model for hardware verification test benches.
//!
//! [`Memory`] is the shareable entry point: a [`MemoryStore`] behind a
//! mutex, so each operation (including a whole image load or store) runs
//! with exclusive access to the store. Use the component crates directly
//! for single-owner access.
//!
//! ```
//! use tbmem::{ImageFormat, LogicVector, Memory, MemoryConfig};
//!
//! let memory = Memory::new(MemoryConfig::new(16, 8)?)?;
//! memory.write(&LogicVector::from_u64(0x10, 16), &LogicVector::from_u64(0xA5, 8))?;
//!
//! let mut image = Vec::new();
//! memory.store(&mut image, ImageFormat::Hex, None)?;
//! assert_eq!(String::from_utf8(image).unwrap(), "@0010\nA5\n");
//! # Ok::<(), tbmem::MemoryError>(())
//! ```

use std::io::{BufRead, Write};
use std::path::Path;
use std::sync::Arc;

use parking_lot::Mutex;

pub use tbmem_alert::{AlertLevel, AlertLog, AlertLogId, AlertSink, AlertSummary, Alerter};
pub use tbmem_error::{ErrorKind, MemoryError, Result};
pub use tbmem_image::{ImageFormat, LoadSummary, StoreSummary};
pub use tbmem_store::{AddressMapper, MemoryStore, ValidationPolicy};
pub use tbmem_types::{AddressRange, Logic, LogicVector, MemoryConfig, WordCell};

/// A memory store guarded for shared use across threads.
#[derive(Debug, Default)]
pub struct Memory {
    inner: Mutex<MemoryStore>,
}

impl Memory {
    /// Create a configured memory reporting to the global alert log.
    pub fn new(config: MemoryConfig) -> Result<Self> {
        MemoryStore::new(config).map(Self::from_store)
    }

    /// A memory that rejects every operation until configured.
    #[must_use]
    pub fn unconfigured() -> Self {
        Self::default()
    }

    /// Create a memory registered as `name` under the root of `log`.
    pub fn named(name: &str, config: MemoryConfig, log: &Arc<AlertLog>) -> Result<Self> {
        let id = log.find_or_create_id(name, AlertLogId::ROOT);
        let store = MemoryStore::unconfigured()
            .with_alert_sink(Arc::clone(log) as Arc<dyn AlertSink>)
            .with_alert_id(id);
        let memory = Self::from_store(store);
        memory.configure(config)?;
        Ok(memory)
    }

    #[must_use]
    pub fn from_store(store: MemoryStore) -> Self {
        Self {
            inner: Mutex::new(store),
        }
    }

    #[must_use]
    pub fn into_store(self) -> MemoryStore {
        self.inner.into_inner()
    }

    /// Run `f` with exclusive access to the store.
    pub fn with_store<T>(&self, f: impl FnOnce(&mut MemoryStore) -> T) -> T {
        f(&mut self.inner.lock())
    }

    // --- Configuration ---

    /// Set the widths; a configured memory is deallocated first.
    pub fn configure(&self, config: MemoryConfig) -> Result<()> {
        self.inner.lock().configure(config)
    }

    #[must_use]
    pub fn config(&self) -> Option<MemoryConfig> {
        self.inner.lock().config()
    }

    #[must_use]
    pub fn is_configured(&self) -> bool {
        self.inner.lock().is_configured()
    }

    #[must_use]
    pub fn alert_id(&self) -> AlertLogId {
        self.inner.lock().alert_id()
    }

    pub fn set_alert_id(&self, id: AlertLogId) {
        self.inner.lock().set_alert_id(id);
    }

    // --- Word operations ---

    pub fn write(&self, address: &LogicVector, data: &LogicVector) -> Result<()> {
        self.inner.lock().write(address, data)
    }

    pub fn read(&self, address: &LogicVector) -> Result<LogicVector> {
        self.inner.lock().read(address)
    }

    #[must_use]
    pub fn read_or_uninitialized(&self, address: &LogicVector) -> LogicVector {
        self.inner.lock().read_or_uninitialized(address)
    }

    /// Forget every written word, keeping the widths.
    pub fn erase(&self) {
        self.inner.lock().erase();
    }

    /// Forget every written word and the widths.
    pub fn deallocate(&self) {
        self.inner.lock().deallocate();
    }

    // --- Images ---

    /// Load an image. `range` defaults to the whole address space.
    pub fn load<R: BufRead>(
        &self,
        reader: R,
        format: ImageFormat,
        range: Option<&AddressRange>,
    ) -> Result<LoadSummary> {
        let mut store = self.inner.lock();
        let range = resolve_range(&store, range);
        tbmem_image::load_image(&mut store, reader, format, &range)
    }

    /// Store an image. `range` defaults to the whole address space.
    pub fn store<W: Write>(
        &self,
        writer: W,
        format: ImageFormat,
        range: Option<&AddressRange>,
    ) -> Result<StoreSummary> {
        let store = self.inner.lock();
        let range = resolve_range(&store, range);
        tbmem_image::store_image(&store, writer, format, &range)
    }

    pub fn load_file(
        &self,
        path: impl AsRef<Path>,
        format: ImageFormat,
        range: Option<&AddressRange>,
    ) -> Result<LoadSummary> {
        let mut store = self.inner.lock();
        let range = resolve_range(&store, range);
        tbmem_image::load_file(&mut store, path.as_ref(), format, &range)
    }

    pub fn store_file(
        &self,
        path: impl AsRef<Path>,
        format: ImageFormat,
        range: Option<&AddressRange>,
    ) -> Result<StoreSummary> {
        let store = self.inner.lock();
        let range = resolve_range(&store, range);
        tbmem_image::store_file(&store, path.as_ref(), format, &range)
    }
}

fn resolve_range(store: &MemoryStore, range: Option<&AddressRange>) -> AddressRange {
    range
        .cloned()
        .unwrap_or_else(|| AddressRange::full(store.address_width().unwrap_or(0)))
}
