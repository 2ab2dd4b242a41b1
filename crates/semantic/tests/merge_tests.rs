// Copyright (c) 2025 woxQAQ
//
// Licensed under the MIT License or Apache License 2.0
// See LICENSE files for details

//! Symbol merge properties

use std::collections::BTreeSet;

use sqlscope_grammar::{NodeId, SqlParser};
use sqlscope_ir::{Dialect, Interval};
use sqlscope_semantic::{SymbolClass, SymbolEntryId, SymbolId, SymbolTable};

fn node() -> NodeId {
    SqlParser::new(Dialect::Standard).parse("x").unwrap().root()
}

/// A table with three symbols holding `sizes[i]` entries each
fn setup(sizes: [usize; 3]) -> (SymbolTable, Vec<SymbolId>) {
    let mut table = SymbolTable::new();
    let mut symbols = Vec::new();
    let mut offset = 0;
    for size in sizes {
        let entries: Vec<SymbolEntryId> = (0..size)
            .map(|_| {
                offset += 2;
                table.add_entry(node(), Interval::new(offset, offset + 1), "n", "n")
            })
            .collect();
        let mut symbol = table.symbol_for(entries[0]);
        for entry in &entries[1..] {
            symbol = table.merge_entries(entries[0], *entry).unwrap();
        }
        symbols.push(symbol);
    }
    (table, symbols)
}

fn entry_set(table: &SymbolTable, symbol: SymbolId) -> BTreeSet<SymbolEntryId> {
    table.symbol(symbol).entries().clone()
}

#[test]
fn test_merge_is_union_of_entry_sets() {
    let (mut table, s) = setup([2, 3, 1]);
    let expected: BTreeSet<_> = entry_set(&table, s[0]).union(&entry_set(&table, s[1])).copied().collect();
    let merged = table.merge(s[0], s[1]).unwrap();
    assert_eq!(entry_set(&table, merged), expected);
    for entry in &expected {
        assert_eq!(table.symbol_of(*entry), Some(merged));
    }
}

#[test]
fn test_merge_is_commutative() {
    let (mut left, a) = setup([2, 3, 1]);
    let (mut right, b) = setup([2, 3, 1]);
    let ab = left.merge(a[0], a[1]).unwrap();
    let ba = right.merge(b[1], b[0]).unwrap();
    assert_eq!(entry_set(&left, ab), entry_set(&right, ba));
}

#[test]
fn test_merge_is_associative() {
    let (mut left, a) = setup([1, 2, 3]);
    let (mut right, b) = setup([1, 2, 3]);

    let ab = left.merge(a[0], a[1]).unwrap();
    let ab_c = left.merge(ab, a[2]).unwrap();

    let bc = right.merge(b[1], b[2]).unwrap();
    let a_bc = right.merge(b[0], bc).unwrap();

    assert_eq!(entry_set(&left, ab_c), entry_set(&right, a_bc));
    assert_eq!(left.symbols().count(), 1);
    assert_eq!(right.symbols().count(), 1);
}

#[test]
fn test_merge_keeps_single_class() {
    let (mut table, s) = setup([1, 1, 1]);
    let first = *table.symbol(s[0]).entries().iter().next().unwrap();
    table.set_symbol_class(first, SymbolClass::Table).unwrap();
    let merged = table.merge(s[1], s[0]).unwrap();
    assert_eq!(table.symbol(merged).class(), SymbolClass::Table);
    // every entry of the merged symbol now reports the class
    let third = *table.symbol(s[2]).entries().iter().next().unwrap();
    let merged = table.merge(merged, s[2]).unwrap();
    assert_eq!(table.class_of(third), SymbolClass::Table);
    assert_eq!(table.symbol(merged).entries().len(), 3);
}
