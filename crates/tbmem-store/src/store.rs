//! Sparse word store with lazily allocated blocks.
//!
//! The store keeps an index of `block_count` optional blocks. A block of
//! `2^block_width` [`WordCell`]s is allocated on the first write that lands
//! in it and never before; reads of unallocated blocks resolve as
//! `Unwritten` without allocating.
//!
//! All failures are reported to the store's [`Alerter`] at `Failure` level
//! and returned as `Err`; nothing is mutated by a failing call.

use std::sync::Arc;

use tbmem_alert::{AlertLogId, AlertSink, Alerter};
use tbmem_error::{MemoryError, Result};
use tbmem_types::{LogicVector, MemoryConfig, WordCell};
use tracing::{debug, info};

use crate::address::AddressMapper;
use crate::validate::ValidationPolicy;

type Block = Box<[WordCell]>;

/// Configured state: widths plus the block-index array.
#[derive(Debug)]
struct Geometry {
    config: MemoryConfig,
    mapper: AddressMapper,
    blocks: Vec<Option<Block>>,
}

impl Geometry {
    fn new(config: MemoryConfig) -> Self {
        Self {
            config,
            mapper: AddressMapper::new(&config),
            blocks: vec![None; config.block_count()],
        }
    }
}

// ---------------------------------------------------------------------------
// MemoryStore
// ---------------------------------------------------------------------------

/// A word-addressable memory whose words are `Unwritten`, `Unknown` or a
/// known value.
#[derive(Debug, Default)]
pub struct MemoryStore {
    geometry: Option<Geometry>,
    alerter: Alerter,
}

impl MemoryStore {
    /// Create and configure a store reporting to the global alert log.
    pub fn new(config: MemoryConfig) -> Result<Self> {
        let mut store = Self::unconfigured();
        store.configure(config)?;
        Ok(store)
    }

    /// A store that rejects every word operation until configured.
    #[must_use]
    pub fn unconfigured() -> Self {
        Self::default()
    }

    /// Report to `sink` instead of the global alert log.
    #[must_use]
    pub fn with_alert_sink(mut self, sink: Arc<dyn AlertSink>) -> Self {
        self.alerter.set_sink(sink);
        self
    }

    /// Report under `id` instead of the root identity.
    #[must_use]
    pub fn with_alert_id(mut self, id: AlertLogId) -> Self {
        self.alerter.set_id(id);
        self
    }

    // --- Configuration ---

    /// Set the address and data widths.
    ///
    /// A store that is already configured is deallocated first, so all
    /// previously written words are lost.
    pub fn configure(&mut self, config: MemoryConfig) -> Result<()> {
        config.validate().map_err(|err| self.alerter.fail(err))?;
        if self.geometry.is_some() {
            self.deallocate();
        }
        let geometry = Geometry::new(config);
        info!(
            address_width = config.address_width,
            data_width = config.data_width,
            block_width = geometry.mapper.block_width(),
            block_count = geometry.blocks.len(),
            alert_id = self.alerter.id().get(),
            "memory configured"
        );
        self.geometry = Some(geometry);
        Ok(())
    }

    #[inline]
    #[must_use]
    pub fn is_configured(&self) -> bool {
        self.geometry.is_some()
    }

    #[inline]
    #[must_use]
    pub fn config(&self) -> Option<MemoryConfig> {
        self.geometry.as_ref().map(|g| g.config)
    }

    /// Configured address width; `None` when unconfigured.
    #[must_use]
    pub fn address_width(&self) -> Option<usize> {
        self.config().map(|c| c.address_width)
    }

    /// Configured data width; 1 when unconfigured.
    #[must_use]
    pub fn data_width(&self) -> usize {
        self.config().map_or(1, |c| c.data_width)
    }

    /// Configured block width; 0 when unconfigured.
    #[must_use]
    pub fn block_width(&self) -> usize {
        self.config().map_or(0, |c| c.block_width())
    }

    /// Length of the block-index array; 0 when unconfigured.
    #[must_use]
    pub fn block_count(&self) -> usize {
        self.geometry.as_ref().map_or(0, |g| g.blocks.len())
    }

    /// Number of blocks holding storage.
    #[must_use]
    pub fn allocated_blocks(&self) -> usize {
        self.geometry
            .as_ref()
            .map_or(0, |g| g.blocks.iter().filter(|b| b.is_some()).count())
    }

    #[must_use]
    pub fn mapper(&self) -> Option<AddressMapper> {
        self.geometry.as_ref().map(|g| g.mapper)
    }

    #[must_use]
    pub fn policy(&self) -> ValidationPolicy {
        ValidationPolicy::new(self.config())
    }

    // --- Alerting ---

    #[inline]
    #[must_use]
    pub fn alert_id(&self) -> AlertLogId {
        self.alerter.id()
    }

    pub fn set_alert_id(&mut self, id: AlertLogId) {
        self.alerter.set_id(id);
    }

    #[inline]
    #[must_use]
    pub fn alerter(&self) -> &Alerter {
        &self.alerter
    }

    // --- Word operations ---

    /// Store `data` at `address`.
    ///
    /// Data with any indeterminate bit is stored as `Unknown`. A write to an
    /// address with an indeterminate bit is dropped (not an error).
    pub fn write(&mut self, address: &LogicVector, data: &LogicVector) -> Result<()> {
        let policy = self.policy();
        policy
            .address("write", address)
            .and_then(|_| policy.data("write", data))
            .map_err(|err| self.alerter.fail(err))?;

        let Some(addr) = address.to_u64() else {
            debug!(address = %address, "write to indeterminate address ignored");
            return Ok(());
        };
        let Some(geometry) = self.geometry.as_mut() else {
            return Err(self.alerter.fail(MemoryError::NotConfigured { operation: "write" }));
        };

        let (block_index, word_index) = geometry.mapper.split(addr);
        let block_size = geometry.config.block_size();
        let block = geometry.blocks[block_index].get_or_insert_with(|| {
            debug!(block_index, block_size, "allocating memory block");
            vec![WordCell::Unwritten; block_size].into_boxed_slice()
        });
        block[word_index] = WordCell::from_data(data);
        Ok(())
    }

    /// Read the word at `address`.
    ///
    /// Unwritten words read as all-`U`, unknown words and indeterminate
    /// addresses as all-`X`.
    pub fn read(&self, address: &LogicVector) -> Result<LogicVector> {
        let config = self
            .policy()
            .address("read", address)
            .map_err(|err| self.alerter.fail(err))?;

        let Some(addr) = address.to_u64() else {
            return Ok(LogicVector::unknown(config.data_width));
        };
        let cell = self
            .mapper()
            .map_or(WordCell::Unwritten, |m| {
                let (block, word) = m.split(addr);
                self.cell(block, word)
            });
        Ok(cell.to_vector(config.data_width))
    }

    /// [`MemoryStore::read`], resolving failures to an all-`U` word of the
    /// current data width. The failure is still reported.
    #[must_use]
    pub fn read_or_uninitialized(&self, address: &LogicVector) -> LogicVector {
        self.read(address)
            .unwrap_or_else(|_| LogicVector::uninitialized(self.data_width()))
    }

    /// Release every block; widths and the block-index array are kept.
    pub fn erase(&mut self) {
        if let Some(geometry) = self.geometry.as_mut() {
            let released = geometry.blocks.iter().filter(|b| b.is_some()).count();
            geometry.blocks.iter_mut().for_each(|b| *b = None);
            debug!(released, "memory erased");
        }
    }

    /// Erase, then drop the block-index array and forget the widths.
    pub fn deallocate(&mut self) {
        self.erase();
        if self.geometry.take().is_some() {
            info!(alert_id = self.alerter.id().get(), "memory deallocated");
        }
    }

    // --- Block access ---

    /// Whether block `block` holds storage.
    #[must_use]
    pub fn is_block_allocated(&self, block: usize) -> bool {
        self.geometry
            .as_ref()
            .and_then(|g| g.blocks.get(block))
            .is_some_and(Option::is_some)
    }

    /// Copy of the cell at (`block`, `word`); `Unwritten` when the block is
    /// unallocated or either index is out of bounds.
    #[must_use]
    pub fn cell(&self, block: usize, word: usize) -> WordCell {
        self.geometry
            .as_ref()
            .and_then(|g| g.blocks.get(block))
            .and_then(Option::as_ref)
            .and_then(|b| b.get(word))
            .copied()
            .unwrap_or_default()
    }
}
