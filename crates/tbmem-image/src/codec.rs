//! Image load and store against a [`MemoryStore`].
//!
//! Loading drives [`MemoryStore::write`] from the tokens of a text source;
//! it is purely additive and has no rollback, so a fatal token error leaves
//! the words written before it in place. Storing walks allocated blocks in
//! ascending order and emits one `@address` line per contiguous run of
//! known words.

use std::io::{BufRead, Write};

use tbmem_alert::Alerter;
use tbmem_error::{MemoryError, Result};
use tbmem_store::MemoryStore;
use tbmem_types::{AddressRange, LogicVector, WordCell};
use tracing::{debug, info, info_span};

use crate::format::ImageFormat;
use crate::scanner::{LineCursor, TokenFault, Tokenizer, read_hex_token};

const ADDRESS_MARKER: char = '@';

/// Counters from one [`load_image`] call.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LoadSummary {
    /// Data tokens written to the store.
    pub words: usize,
    /// Address markers accepted.
    pub markers: usize,
    /// Warnings reported (out-of-range cursor events, skipped text).
    pub warnings: usize,
    /// Lines read, including blank and comment lines.
    pub lines: usize,
}

/// Counters from one [`store_image`] call.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StoreSummary {
    /// Data lines written.
    pub words: usize,
    /// Address marker lines written, one per run.
    pub markers: usize,
}

/// Bounds and direction of a load.
#[derive(Debug, Clone, Copy)]
struct Window {
    low: u64,
    high: u64,
    descending: bool,
}

impl Window {
    fn new(start: u64, end: u64) -> Self {
        if start <= end {
            Self {
                low: start,
                high: end,
                descending: false,
            }
        } else {
            Self {
                low: end,
                high: start,
                descending: true,
            }
        }
    }

    fn contains(&self, address: u64) -> bool {
        (self.low..=self.high).contains(&address)
    }

    /// Cursor after one data token, or `None` if it would leave the window.
    fn step(&self, cursor: u64) -> Option<u64> {
        let next = if self.descending {
            cursor.checked_sub(1)
        } else {
            cursor.checked_add(1)
        };
        next.filter(|a| self.contains(*a))
    }
}

/// Where the next data token is written.
#[derive(Debug, Clone)]
enum Cursor {
    Known(u64),
    /// Set by a marker with indeterminate digits; writes through it are
    /// dropped by the store.
    Indeterminate(LogicVector),
}

fn emit<W: Write>(writer: &mut W, alerter: &Alerter, line: &str) -> Result<()> {
    writeln!(writer, "{line}").map_err(|err| alerter.fail(err.into()))
}

fn hex_address(address: u64, width: usize) -> String {
    if width == 0 {
        return "0".to_owned();
    }
    LogicVector::from_u64(address, width).to_hex_string()
}

fn address_fault(fault: TokenFault, width: usize) -> String {
    let digits = width.div_ceil(4).max(1);
    match fault {
        TokenFault::Empty => format!("address length 0, expected {digits} hex digits"),
        TokenFault::Short { symbols, .. } => {
            format!("address has {symbols} hex digits, expected {digits}")
        }
        TokenFault::Overwide { .. } => format!("address does not fit in {width} bits"),
    }
}

/// Cursor positions past either end of the address space.
fn signed_hex(address: i128) -> String {
    if address < 0 {
        format!("-{:X}", address.unsigned_abs())
    } else {
        format!("{address:X}")
    }
}

// ---------------------------------------------------------------------------
// Load
// ---------------------------------------------------------------------------

/// Populate `store` from an image.
///
/// The first data word goes to `range.start`; the cursor then moves toward
/// `range.end` (downward when `start > end`). Markers and cursor moves that
/// fall outside the range are discarded with a warning, as is text matching
/// neither grammar. Zero-length addresses and undecodable data tokens abort
/// the load.
pub fn load_image<R: BufRead>(
    store: &mut MemoryStore,
    reader: R,
    format: ImageFormat,
    range: &AddressRange,
) -> Result<LoadSummary> {
    let alerter = store.alerter().clone();
    let policy = store.policy();
    let (start, end) = policy
        .range("load", range)
        .map_err(|err| alerter.fail(err))?;
    let config = policy
        .configured("load")
        .map_err(|err| alerter.fail(err))?;
    let (address_width, data_width) = (config.address_width, config.data_width);

    let window = Window::new(start, end);
    let span = info_span!(
        "image_load",
        %format,
        start = %range.start.to_hex_string(),
        end = %range.end.to_hex_string()
    );
    let _guard = span.enter();

    let mut summary = LoadSummary::default();
    let mut cursor = Cursor::Known(start);
    // Set when an advance past the window was discarded; reported once data
    // arrives for the address it would have produced.
    let mut overrun: Option<i128> = None;
    let mut tokenizer = Tokenizer::new();

    let warn = |summary: &mut LoadSummary, err: MemoryError| {
        summary.warnings += 1;
        alerter.report(&err);
    };

    for (index, line) in reader.lines().enumerate() {
        let text = line.map_err(|err| alerter.fail(err.into()))?;
        let line_no = index + 1;
        summary.lines = line_no;
        let mut line = LineCursor::new(&text);
        let mut item = 0;

        while !tokenizer.skip_blank(&mut line) {
            item += 1;
            let Some(next) = line.peek() else { break };

            if line.eat(ADDRESS_MARKER) {
                let address = read_hex_token(&mut line, address_width)
                    .map(|(address, _)| address)
                    .map_err(|fault| {
                        alerter.fail(MemoryError::malformed(
                            line_no,
                            item,
                            address_fault(fault, address_width),
                        ))
                    })?;
                match address.to_u64() {
                    Some(a) if !window.contains(a) => warn(
                        &mut summary,
                        MemoryError::OutOfRange {
                            address: hex_address(a, address_width),
                            low: hex_address(window.low, address_width),
                            high: hex_address(window.high, address_width),
                            line: line_no,
                        },
                    ),
                    Some(a) => {
                        cursor = Cursor::Known(a);
                        overrun = None;
                        summary.markers += 1;
                    }
                    None => {
                        debug!(line = line_no, address = %address, "indeterminate address marker");
                        cursor = Cursor::Indeterminate(address);
                        overrun = None;
                        summary.markers += 1;
                    }
                }
            } else if format.is_data_start(next) {
                let (data, _) = format.read_token(&mut line, data_width).map_err(|fault| {
                    alerter.fail(MemoryError::malformed(
                        line_no,
                        item,
                        format!("cannot decode {format} data as a {data_width}-bit word: {fault}"),
                    ))
                })?;
                if let Some(skipped) = overrun {
                    warn(
                        &mut summary,
                        MemoryError::OutOfRange {
                            address: signed_hex(skipped),
                            low: hex_address(window.low, address_width),
                            high: hex_address(window.high, address_width),
                            line: line_no,
                        },
                    );
                }
                match cursor {
                    Cursor::Known(a) => {
                        store.write(&LogicVector::from_u64(a, address_width), &data)?;
                        match window.step(a) {
                            Some(next) => cursor = Cursor::Known(next),
                            None => {
                                let a = i128::from(a);
                                overrun = Some(if window.descending { a - 1 } else { a + 1 });
                            }
                        }
                    }
                    Cursor::Indeterminate(ref address) => store.write(address, &data)?,
                }
                summary.words += 1;
            } else {
                let skipped = line.skip_item();
                warn(
                    &mut summary,
                    MemoryError::UnrecognizedToken {
                        line: line_no,
                        item,
                        text: skipped.to_owned(),
                    },
                );
            }
        }
    }

    info!(
        words = summary.words,
        markers = summary.markers,
        warnings = summary.warnings,
        lines = summary.lines,
        "image loaded"
    );
    Ok(summary)
}

// ---------------------------------------------------------------------------
// Store
// ---------------------------------------------------------------------------

/// Write the known words of `store` within `range` as an image.
///
/// `range.start` must not exceed `range.end`. Unallocated blocks are skipped
/// and `Unknown`/`Unwritten` words are omitted; each maximal run of known
/// words within a block is preceded by one `@address` line.
pub fn store_image<W: Write>(
    store: &MemoryStore,
    mut writer: W,
    format: ImageFormat,
    range: &AddressRange,
) -> Result<StoreSummary> {
    let alerter = store.alerter();
    let policy = store.policy();
    let (start, end) = policy
        .ascending_range("store", range)
        .map_err(|err| alerter.fail(err))?;
    let (Some(config), Some(mapper)) = (store.config(), store.mapper()) else {
        return Err(alerter.fail(MemoryError::NotConfigured { operation: "store" }));
    };

    let span = info_span!(
        "image_store",
        %format,
        start = %range.start.to_hex_string(),
        end = %range.end.to_hex_string()
    );
    let _guard = span.enter();

    let (start_block, start_word) = mapper.split(start);
    let (end_block, end_word) = mapper.split(end);
    let last_word = config.block_size() - 1;
    let mut summary = StoreSummary::default();

    for block in start_block..=end_block {
        if !store.is_block_allocated(block) {
            continue;
        }
        let first = if block == start_block { start_word } else { 0 };
        let last = if block == end_block { end_word } else { last_word };
        let mut run_open = false;

        for word in first..=last {
            match store.cell(block, word) {
                WordCell::Value(value) => {
                    if !run_open {
                        let address = hex_address(mapper.join(block, word), config.address_width);
                        emit(&mut writer, alerter, &format!("{ADDRESS_MARKER}{address}"))?;
                        summary.markers += 1;
                        run_open = true;
                    }
                    emit(&mut writer, alerter, &format.render(value, config.data_width))?;
                    summary.words += 1;
                }
                WordCell::Unknown | WordCell::Unwritten => run_open = false,
            }
        }
    }
    writer.flush().map_err(|err| alerter.fail(err.into()))?;

    info!(
        words = summary.words,
        markers = summary.markers,
        "image stored"
    );
    Ok(summary)
}
