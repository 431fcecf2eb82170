//! Behavioral properties of the shared memory model, exercised through the
//! [`Memory`] entry point.

use std::io::Cursor;
use std::sync::Arc;

use proptest::prelude::*;
use tbmem::{
    AddressRange, AlertLevel, AlertLog, ErrorKind, ImageFormat, Logic, LogicVector, Memory,
    MemoryConfig,
};

// ─── Helpers ─────────────────────────────────────────────────────────────

fn memory(address_width: usize, data_width: usize) -> (Memory, Arc<AlertLog>) {
    let log = Arc::new(AlertLog::new());
    let config = MemoryConfig::new(address_width, data_width).unwrap();
    let memory = Memory::named("ram", config, &log).unwrap();
    (memory, log)
}

fn word(value: u64, width: usize) -> LogicVector {
    LogicVector::from_u64(value, width)
}

fn image(memory: &Memory, range: &AddressRange) -> String {
    let mut out = Vec::new();
    memory.store(&mut out, ImageFormat::Hex, Some(range)).unwrap();
    String::from_utf8(out).unwrap()
}

// ─── Word semantics ──────────────────────────────────────────────────────

#[test]
fn unwritten_words_read_uninitialized() {
    let (memory, _) = memory(12, 8);
    for a in [0_u64, 1, 1023, 1024, 4095] {
        assert!(memory.read(&word(a, 12)).unwrap().is_all(Logic::Uninitialized));
    }
}

#[test]
fn width_mismatch_fails_without_mutation() {
    let (memory, log) = memory(8, 8);
    memory.write(&word(5, 8), &word(0x11, 8)).unwrap();

    let err = memory.write(&word(5, 9), &word(0x22, 8)).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::WidthMismatch);
    let err = memory.write(&word(5, 8), &word(0x22, 7)).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::WidthMismatch);
    let err = memory.read(&word(5, 7)).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::WidthMismatch);

    assert_eq!(memory.read(&word(5, 8)).unwrap(), word(0x11, 8));
    assert_eq!(log.count(memory.alert_id(), AlertLevel::Failure), 3);
}

#[test]
fn indeterminate_address_is_a_no_op_write_and_unknown_read() {
    let (memory, log) = memory(4, 8);
    for a in 0..16 {
        memory.write(&word(a, 4), &word(a, 8)).unwrap();
    }
    let address: LogicVector = "10X1".parse().unwrap();

    memory.write(&address, &word(0xFF, 8)).unwrap();
    for a in 0..16 {
        assert_eq!(memory.read(&word(a, 4)).unwrap(), word(a, 8));
    }
    assert!(memory.read(&address).unwrap().is_all(Logic::Unknown));
    assert_eq!(log.summary().totals(), (0, 0));
}

#[test]
fn one_unknown_bit_collapses_the_word() {
    let (memory, _) = memory(8, 8);
    let data: LogicVector = "1010Z101".parse().unwrap();
    memory.write(&word(3, 8), &data).unwrap();
    assert!(memory.read(&word(3, 8)).unwrap().is_all(Logic::Unknown));
}

#[test]
fn weak_levels_store_as_known_bits() {
    let (memory, _) = memory(8, 4);
    memory.write(&word(3, 8), &"HL1L".parse().unwrap()).unwrap();
    assert_eq!(memory.read(&word(3, 8)).unwrap(), word(0b1010, 4));
}

#[test]
fn erase_keeps_widths_and_deallocate_forgets_them() {
    let (memory, _) = memory(8, 8);
    memory.write(&word(7, 8), &word(0x77, 8)).unwrap();

    memory.erase();
    assert!(memory.read(&word(7, 8)).unwrap().is_all(Logic::Uninitialized));
    memory.write(&word(7, 8), &word(0x78, 8)).unwrap();
    assert_eq!(memory.read(&word(7, 8)).unwrap(), word(0x78, 8));

    memory.deallocate();
    assert!(!memory.is_configured());
    assert_eq!(
        memory.write(&word(7, 8), &word(0x79, 8)).unwrap_err().kind(),
        ErrorKind::NotConfigured
    );
    assert_eq!(memory.read(&word(7, 8)).unwrap_err().kind(), ErrorKind::NotConfigured);
    assert!(memory.read_or_uninitialized(&word(7, 8)).is_all(Logic::Uninitialized));

    memory.configure(MemoryConfig::new(8, 8).unwrap()).unwrap();
    assert!(memory.read(&word(7, 8)).unwrap().is_all(Logic::Uninitialized));
}

#[test]
fn reconfigure_changes_widths_and_drops_contents() {
    let (memory, _) = memory(8, 8);
    memory.write(&word(1, 8), &word(1, 8)).unwrap();
    memory.configure(MemoryConfig::new(16, 32).unwrap()).unwrap();
    assert_eq!(memory.config(), Some(MemoryConfig::new(16, 32).unwrap()));
    assert!(memory.read(&word(1, 16)).unwrap().is_all(Logic::Uninitialized));
    assert_eq!(memory.read(&word(1, 8)).unwrap_err().kind(), ErrorKind::WidthMismatch);
}

// ─── Images ──────────────────────────────────────────────────────────────

#[test]
fn sparse_image_emits_one_marker_per_run() {
    let (memory, _) = memory(8, 8);
    for (a, v) in [(0x10, 0xA), (0x11, 0xB), (0x12, 0xC), (0x14, 0xD)] {
        memory.write(&word(a, 8), &word(v, 8)).unwrap();
    }
    let text = image(&memory, &AddressRange::from_u64(0x10, 0x14, 8));
    assert_eq!(text, "@10\n0A\n0B\n0C\n@14\n0D\n");
    assert_eq!(text.lines().filter(|l| l.starts_with('@')).count(), 2);
}

#[test]
fn descending_load_walks_down_within_reversed_bounds() {
    let (memory, log) = memory(8, 8);
    let source = "01 02 03\n@08\n04\n@15 05 06\n";
    let summary = memory
        .load(
            Cursor::new(source),
            ImageFormat::Hex,
            Some(&AddressRange::from_u64(0x20, 0x10, 8)),
        )
        .unwrap();

    assert_eq!(summary.words, 6);
    assert_eq!(summary.markers, 1);
    assert_eq!(summary.warnings, 1, "@08 lies below the window");
    for (a, v) in [(0x20, 1), (0x1F, 2), (0x1E, 3), (0x1D, 4), (0x15, 5), (0x14, 6)] {
        assert_eq!(memory.read(&word(a, 8)).unwrap(), word(v, 8), "address {a:#x}");
    }
    assert!(memory.read(&word(0x08, 8)).unwrap().is_all(Logic::Uninitialized));
    assert_eq!(log.count(memory.alert_id(), AlertLevel::Warning), 1);
}

#[test]
fn descending_store_range_writes_nothing() {
    let (memory, log) = memory(8, 8);
    memory.write(&word(0x10, 8), &word(1, 8)).unwrap();
    let mut out = Vec::new();
    let err = memory
        .store(
            &mut out,
            ImageFormat::Hex,
            Some(&AddressRange::from_u64(0x20, 0x10, 8)),
        )
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::OrderingViolation);
    assert!(out.is_empty());
    assert_eq!(log.count(memory.alert_id(), AlertLevel::Failure), 1);
}

#[test]
fn fatal_load_keeps_words_written_before_the_error() {
    let (memory, _) = memory(8, 8);
    let err = memory
        .load(Cursor::new("11 22\n@\n33\n"), ImageFormat::Hex, None)
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::MalformedToken);
    assert_eq!(memory.read(&word(0, 8)).unwrap(), word(0x11, 8));
    assert_eq!(memory.read(&word(1, 8)).unwrap(), word(0x22, 8));
    assert!(memory.read(&word(2, 8)).unwrap().is_all(Logic::Uninitialized));
}

#[test]
fn image_files_round_trip_through_disk() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("boot.mem");
    let (source, _) = memory(16, 12);
    for a in [0_u64, 0x3FF, 0x400, 0xFFFF] {
        source.write(&word(a, 16), &word(a & 0xFFF, 12)).unwrap();
    }
    let stored = source.store_file(&path, ImageFormat::Hex, None).unwrap();
    assert_eq!((stored.words, stored.markers), (4, 4));

    let (target, _) = memory(16, 12);
    target.load_file(&path, ImageFormat::Hex, None).unwrap();
    for a in [0_u64, 0x3FF, 0x400, 0xFFFF] {
        assert_eq!(target.read(&word(a, 16)).unwrap(), word(a & 0xFFF, 12));
    }
}

#[test]
fn alert_summary_serializes_per_memory_counts() {
    let log = Arc::new(AlertLog::new());
    let config = MemoryConfig::new(8, 8).unwrap();
    let rom = Memory::named("rom", config, &log).unwrap();
    let ram = Memory::named("ram", config, &log).unwrap();

    rom.load(Cursor::new("00 ?? 01\n"), ImageFormat::Hex, None).unwrap();
    assert!(ram.read(&word(0, 4)).is_err());

    let summary = log.summary();
    assert!(!summary.passed());
    assert_eq!(summary.totals(), (1, 1));

    let json: serde_json::Value = serde_json::from_str(&summary.to_json().unwrap()).unwrap();
    let children = json["children"].as_array().unwrap();
    assert_eq!(children.len(), 2);
    assert_eq!(children[0]["name"], "rom");
    assert_eq!(children[0]["warnings"], 1);
    assert_eq!(children[1]["name"], "ram");
    assert_eq!(children[1]["failures"], 1);
}

// ─── Round trip ──────────────────────────────────────────────────────────

proptest! {
    #[test]
    fn store_then_load_reproduces_reads(
        start in 0_u64..4000,
        values in prop::collection::vec(0_u64..=0x3FF, 1..80),
        binary in any::<bool>(),
    ) {
        let format = if binary { ImageFormat::Binary } else { ImageFormat::Hex };
        let end = (start + values.len() as u64 - 1).min(0xFFF);
        let (source, _) = memory(12, 10);
        for (a, v) in (start..=end).zip(&values) {
            source.write(&word(a, 12), &word(*v, 10)).unwrap();
        }

        let range = AddressRange::from_u64(start, end, 12);
        let mut text = Vec::new();
        source.store(&mut text, format, Some(&range)).unwrap();

        let (target, log) = memory(12, 10);
        target.load(Cursor::new(text), format, None).unwrap();
        for a in start..=end {
            prop_assert_eq!(target.read(&word(a, 12)).unwrap(), source.read(&word(a, 12)).unwrap());
        }
        prop_assert_eq!(log.summary().totals(), (0, 0));
    }

    #[test]
    fn mismatched_widths_never_mutate(
        address_width in 0_usize..=20,
        data_width in 1_usize..=20,
        address in 0_u64..256,
    ) {
        let (memory, _) = memory(8, 8);
        memory.write(&word(address, 8), &word(0x5A, 8)).unwrap();

        let write = memory.write(&word(address, address_width), &word(0x33, data_width));
        prop_assert_eq!(write.is_ok(), address_width == 8 && data_width == 8);
        if address_width != 8 {
            prop_assert_eq!(
                memory.read(&word(address, address_width)).unwrap_err().kind(),
                ErrorKind::WidthMismatch
            );
        }
        let expected = if write.is_ok() { 0x33 } else { 0x5A };
        prop_assert_eq!(memory.read(&word(address, 8)).unwrap(), word(expected, 8));
    }
}
