use std::sync::Arc;

use sonide::instruments::{AllocError, NumberingError};
use sonide::{check_name, InsNo, InstrDef, NamedInstrTable};

fn def() -> Arc<InstrDef> {
    Arc::new(InstrDef::default())
}

#[test]
fn compiler_name_gate() {
    // The compiler consults check_name before any insertion attempt.
    assert!(check_name("pluck_2"));
    assert!(check_name("1"));
    assert!(!check_name("1abc"));
    assert!(!check_name("pluck 2"));
}

#[test]
fn duplicate_registration_returns_name() {
    let mut table = NamedInstrTable::new();
    let first = def();
    table.allocate("voice".into(), first.clone(), None).unwrap();

    // The failed insertion hands the name back and leaves the first
    // definition in place.
    match table.allocate("voice".into(), def(), None) {
        Err(AllocError::Duplicate { name }) => assert_eq!(name, "voice"),
        other => panic!("expected duplicate error, got {other:?}"),
    }
    assert!(Arc::ptr_eq(table.def_by_name("voice").unwrap(), &first));
}

#[test]
fn numbering_after_numbered_instruments() {
    let mut table = NamedInstrTable::new();
    table.register_numbered(InsNo(1), def()).unwrap();
    table.register_numbered(InsNo(4), def()).unwrap();
    table.allocate("kick".into(), def(), None).unwrap();
    table.allocate("snare".into(), def(), None).unwrap();

    let dense = table.assign_numbers().unwrap();
    // Names number contiguously after the highest numbered instrument.
    assert!(dense[5].is_some());
    assert!(dense[6].is_some());
    assert_eq!(table.find("kick"), Some(InsNo(5)));
    assert_eq!(table.find("snare"), Some(InsNo(6)));
}

#[test]
fn pinned_numbers_and_conflicts() {
    let mut table = NamedInstrTable::new();
    table.allocate("lead".into(), def(), Some(InsNo(9))).unwrap();
    table.allocate("pad".into(), def(), None).unwrap();
    table.assign_numbers().unwrap();
    assert_eq!(table.find("lead"), Some(InsNo(9)));
    assert_eq!(table.find("pad"), Some(InsNo(1)));

    let mut table = NamedInstrTable::new();
    table.allocate("a".into(), def(), Some(InsNo(3))).unwrap();
    table.allocate("b".into(), def(), Some(InsNo(3))).unwrap();
    assert!(matches!(
        table.assign_numbers(),
        Err(NumberingError::PinConflict { number: InsNo(3), .. })
    ));
}

#[test]
fn numbering_runs_once_per_compilation() {
    let mut table = NamedInstrTable::new();
    table.allocate("only".into(), def(), None).unwrap();
    table.assign_numbers().unwrap();
    assert_eq!(
        table.assign_numbers().unwrap_err(),
        NumberingError::AlreadyAssigned
    );

    // reset() re-arms the pass.
    table.reset();
    table.allocate("only".into(), def(), None).unwrap();
    table.assign_numbers().unwrap();
    assert_eq!(table.find("only"), Some(InsNo(1)));
}
