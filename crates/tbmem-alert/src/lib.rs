//! Alert reporting for memory models.
//!
//! Stores never print or panic on bad input; they report through an
//! [`AlertSink`] under an [`AlertLogId`] and return the error to the caller.
//!
//! - **Identities:** [`AlertLog`] keeps a parent/child tree of named ids
//!   rooted at [`AlertLogId::ROOT`], so a test bench can tell which memory
//!   instance raised an alert.
//! - **Counting:** every report bumps a per-id, per-level counter; the
//!   end-of-test [`AlertSummary`] serializes the tree with its counts.
//! - **Logging:** every report is also emitted as a `tracing` event.

use std::fmt;
use std::sync::{Arc, LazyLock};

use parking_lot::Mutex;
use serde::Serialize;
use tbmem_error::MemoryError;
use tracing::{error, warn};

pub use tbmem_error::AlertLevel;

// ---------------------------------------------------------------------------
// AlertLogId
// ---------------------------------------------------------------------------

/// Opaque handle naming the source of an alert.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[repr(transparent)]
pub struct AlertLogId(u32);

impl AlertLogId {
    /// The process-wide root identity.
    pub const ROOT: Self = Self(0);

    #[inline]
    #[must_use]
    pub const fn get(self) -> u32 {
        self.0
    }
}

impl Default for AlertLogId {
    fn default() -> Self {
        Self::ROOT
    }
}

impl fmt::Display for AlertLogId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

// ---------------------------------------------------------------------------
// AlertSink
// ---------------------------------------------------------------------------

/// Receiver of alerts raised by memory operations.
///
/// Implementations must not call back into the reporting store.
pub trait AlertSink: Send + Sync {
    fn report(&self, id: AlertLogId, message: &str, level: AlertLevel);
}

// ---------------------------------------------------------------------------
// AlertLog
// ---------------------------------------------------------------------------

const ROOT_NAME: &str = "Default";

static GLOBAL_ALERT_LOG: LazyLock<Arc<AlertLog>> = LazyLock::new(|| Arc::new(AlertLog::new()));

#[derive(Debug)]
struct AlertEntry {
    name: String,
    parent: Option<AlertLogId>,
    counts: [u64; AlertLevel::ALL.len()],
}

impl AlertEntry {
    fn new(name: &str, parent: Option<AlertLogId>) -> Self {
        Self {
            name: name.to_owned(),
            parent,
            counts: [0; AlertLevel::ALL.len()],
        }
    }
}

const fn level_slot(level: AlertLevel) -> usize {
    match level {
        AlertLevel::Warning => 0,
        AlertLevel::Failure => 1,
    }
}

/// Registry of alert identities with per-level counters.
#[derive(Debug)]
pub struct AlertLog {
    entries: Mutex<Vec<AlertEntry>>,
}

impl AlertLog {
    /// Create a log holding only the root identity.
    #[must_use]
    pub fn new() -> Self {
        Self {
            entries: Mutex::new(vec![AlertEntry::new(ROOT_NAME, None)]),
        }
    }

    /// The process-wide log every store reports to by default.
    #[must_use]
    pub fn global() -> Arc<Self> {
        Arc::clone(&GLOBAL_ALERT_LOG)
    }

    /// Return the id named `name` under `parent`, creating it if needed.
    ///
    /// An unknown `parent` is replaced by the root.
    pub fn find_or_create_id(&self, name: &str, parent: AlertLogId) -> AlertLogId {
        let mut entries = self.entries.lock();
        let parent = if (parent.0 as usize) < entries.len() {
            parent
        } else {
            AlertLogId::ROOT
        };
        if let Some(pos) = entries
            .iter()
            .position(|e| e.parent == Some(parent) && e.name == name)
        {
            return AlertLogId(u32::try_from(pos).unwrap_or(u32::MAX));
        }
        let id = AlertLogId(u32::try_from(entries.len()).unwrap_or(u32::MAX));
        entries.push(AlertEntry::new(name, Some(parent)));
        id
    }

    #[must_use]
    pub fn name(&self, id: AlertLogId) -> Option<String> {
        self.entries
            .lock()
            .get(id.0 as usize)
            .map(|e| e.name.clone())
    }

    #[must_use]
    pub fn parent(&self, id: AlertLogId) -> Option<AlertLogId> {
        self.entries.lock().get(id.0 as usize).and_then(|e| e.parent)
    }

    /// Alerts of `level` reported directly under `id`.
    #[must_use]
    pub fn count(&self, id: AlertLogId, level: AlertLevel) -> u64 {
        self.entries
            .lock()
            .get(id.0 as usize)
            .map_or(0, |e| e.counts[level_slot(level)])
    }

    /// Alerts of `level` across every identity.
    #[must_use]
    pub fn total(&self, level: AlertLevel) -> u64 {
        self.entries
            .lock()
            .iter()
            .map(|e| e.counts[level_slot(level)])
            .sum()
    }

    /// Reset every counter, keeping the identities.
    pub fn clear_counts(&self) {
        for entry in self.entries.lock().iter_mut() {
            entry.counts = [0; AlertLevel::ALL.len()];
        }
    }

    /// Snapshot of the identity tree and its counters.
    #[must_use]
    pub fn summary(&self) -> AlertSummary {
        let entries = self.entries.lock();
        build_summary(&entries, AlertLogId::ROOT)
    }
}

impl Default for AlertLog {
    fn default() -> Self {
        Self::new()
    }
}

impl AlertSink for AlertLog {
    fn report(&self, id: AlertLogId, message: &str, level: AlertLevel) {
        let name = {
            let mut entries = self.entries.lock();
            let slot = if (id.0 as usize) < entries.len() {
                id.0 as usize
            } else {
                0
            };
            entries[slot].counts[level_slot(level)] += 1;
            entries[slot].name.clone()
        };
        match level {
            AlertLevel::Warning => warn!(alert_id = id.0, source = %name, "{message}"),
            AlertLevel::Failure => error!(alert_id = id.0, source = %name, "{message}"),
        }
    }
}

fn build_summary(entries: &[AlertEntry], id: AlertLogId) -> AlertSummary {
    let entry = &entries[id.0 as usize];
    let children = entries
        .iter()
        .enumerate()
        .filter(|(_, e)| e.parent == Some(id))
        .map(|(pos, _)| build_summary(entries, AlertLogId(u32::try_from(pos).unwrap_or(0))))
        .collect();
    AlertSummary {
        name: entry.name.clone(),
        warnings: entry.counts[level_slot(AlertLevel::Warning)],
        failures: entry.counts[level_slot(AlertLevel::Failure)],
        children,
    }
}

// ---------------------------------------------------------------------------
// AlertSummary
// ---------------------------------------------------------------------------

/// Alert counts for one identity and its descendants.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AlertSummary {
    pub name: String,
    pub warnings: u64,
    pub failures: u64,
    pub children: Vec<AlertSummary>,
}

impl AlertSummary {
    /// Counts summed over this node and all descendants: `(warnings, failures)`.
    #[must_use]
    pub fn totals(&self) -> (u64, u64) {
        self.children
            .iter()
            .map(Self::totals)
            .fold((self.warnings, self.failures), |(w, f), (cw, cf)| {
                (w + cw, f + cf)
            })
    }

    /// Whether no failure was reported anywhere in the tree.
    #[must_use]
    pub fn passed(&self) -> bool {
        self.totals().1 == 0
    }

    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }
}

// ---------------------------------------------------------------------------
// Alerter
// ---------------------------------------------------------------------------

/// The alerting identity a store owns: a sink plus the id it reports under.
#[derive(Clone)]
pub struct Alerter {
    sink: Arc<dyn AlertSink>,
    id: AlertLogId,
}

impl Alerter {
    #[must_use]
    pub fn new(sink: Arc<dyn AlertSink>, id: AlertLogId) -> Self {
        Self { sink, id }
    }

    #[inline]
    #[must_use]
    pub fn id(&self) -> AlertLogId {
        self.id
    }

    pub fn set_id(&mut self, id: AlertLogId) {
        self.id = id;
    }

    pub fn set_sink(&mut self, sink: Arc<dyn AlertSink>) {
        self.sink = sink;
    }

    /// Report `err` at its own level.
    pub fn report(&self, err: &MemoryError) {
        self.sink.report(self.id, &err.to_string(), err.level());
    }

    /// Report `err` and hand it back for propagation.
    #[must_use]
    pub fn fail(&self, err: MemoryError) -> MemoryError {
        self.report(&err);
        err
    }
}

impl Default for Alerter {
    /// Root identity of the global log.
    fn default() -> Self {
        Self::new(AlertLog::global(), AlertLogId::ROOT)
    }
}

impl fmt::Debug for Alerter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Alerter").field("id", &self.id).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_root_identity() {
        let log = AlertLog::new();
        assert_eq!(log.name(AlertLogId::ROOT).as_deref(), Some("Default"));
        assert_eq!(log.parent(AlertLogId::ROOT), None);
        assert_eq!(AlertLogId::default(), AlertLogId::ROOT);
    }

    #[test]
    fn test_find_or_create_is_idempotent() {
        let log = AlertLog::new();
        let a = log.find_or_create_id("ram", AlertLogId::ROOT);
        let b = log.find_or_create_id("ram", AlertLogId::ROOT);
        assert_eq!(a, b);
        let nested = log.find_or_create_id("ram", a);
        assert_ne!(nested, a);
        assert_eq!(log.parent(nested), Some(a));
    }

    #[test]
    fn test_unknown_parent_falls_back_to_root() {
        let log = AlertLog::new();
        let id = log.find_or_create_id("rom", AlertLogId(99));
        assert_eq!(log.parent(id), Some(AlertLogId::ROOT));
    }

    #[test]
    fn test_report_counts_per_level() {
        let log = AlertLog::new();
        let id = log.find_or_create_id("ram", AlertLogId::ROOT);
        log.report(id, "first", AlertLevel::Warning);
        log.report(id, "second", AlertLevel::Warning);
        log.report(id, "third", AlertLevel::Failure);
        assert_eq!(log.count(id, AlertLevel::Warning), 2);
        assert_eq!(log.count(id, AlertLevel::Failure), 1);
        assert_eq!(log.count(AlertLogId::ROOT, AlertLevel::Warning), 0);
        assert_eq!(log.total(AlertLevel::Warning), 2);

        log.clear_counts();
        assert_eq!(log.total(AlertLevel::Failure), 0);
    }

    #[test]
    fn test_summary_tree() {
        let log = AlertLog::new();
        let ram = log.find_or_create_id("ram", AlertLogId::ROOT);
        let rom = log.find_or_create_id("rom", AlertLogId::ROOT);
        log.report(ram, "w", AlertLevel::Warning);
        log.report(rom, "f", AlertLevel::Failure);

        let summary = log.summary();
        assert_eq!(summary.name, "Default");
        assert_eq!(summary.children.len(), 2);
        assert_eq!(summary.totals(), (1, 1));
        assert!(!summary.passed());

        let json = summary.to_json().unwrap();
        assert!(json.contains("\"ram\""));
        assert!(json.contains("\"failures\": 1"));
    }

    #[test]
    fn test_alerter_fail_reports_and_returns() {
        let log = Arc::new(AlertLog::new());
        let id = log.find_or_create_id("ram", AlertLogId::ROOT);
        let alerter = Alerter::new(log.clone(), id);

        let err = alerter.fail(MemoryError::NotConfigured { operation: "read" });
        assert!(matches!(err, MemoryError::NotConfigured { .. }));
        assert_eq!(log.count(id, AlertLevel::Failure), 1);

        alerter.report(&MemoryError::UnrecognizedToken {
            line: 1,
            item: 1,
            text: "?".to_owned(),
        });
        assert_eq!(log.count(id, AlertLevel::Warning), 1);
    }
}
