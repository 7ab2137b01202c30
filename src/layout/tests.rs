use super::*;
use crate::types::column::ColumnDescriptor;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

fn dict(columns: Vec<ColumnDescriptor>) -> Dictionary {
    Dictionary::new(columns).unwrap()
}

fn random_dictionary(rng: &mut StdRng, n: usize) -> Dictionary {
    let columns = (0..n)
        .map(|i| {
            let name = format!("v{}", i);
            match rng.random_range(0..5) {
                0 => ColumnDescriptor::numeric(name),
                1 => ColumnDescriptor::date(name),
                2 => ColumnDescriptor::datetime(name),
                3 => ColumnDescriptor::time(name),
                _ => ColumnDescriptor::string(name, rng.random_range(1..40)),
            }
        })
        .collect();
    dict(columns)
}

#[test]
fn test_numeric_then_string_layout() {
    // --- ARRANGE ---
    let d = dict(vec![
        ColumnDescriptor::numeric("x"),
        ColumnDescriptor::string("s", 3),
    ]);

    // --- ACT ---
    let layout = RowLayout::build(&d, &ColumnSelection::All, ByteOrder::Little);

    // --- ASSERT ---
    assert_eq!(layout.row_size(), 16);
    assert_eq!(
        layout.bucket(Bucket::Numeric).spans,
        vec![Span { start: 0, end: 8 }]
    );
    assert_eq!(
        layout.bucket(Bucket::String).spans,
        vec![Span { start: 8, end: 16 }]
    );
    assert!(layout.bucket(Bucket::Datetime).is_empty());
    assert!(layout.bucket(Bucket::Time).is_empty());
}

#[test]
fn test_ten_byte_string_rounds_up_to_two_words() {
    let d = dict(vec![
        ColumnDescriptor::numeric("x"),
        ColumnDescriptor::string("s", 10),
    ]);
    let layout = RowLayout::build(&d, &ColumnSelection::All, ByteOrder::Little);
    assert_eq!(layout.row_size(), 24);
    assert_eq!(
        layout.bucket(Bucket::String).spans,
        vec![Span { start: 8, end: 24 }]
    );
}

#[test]
fn test_adjacent_columns_merge_into_one_span() {
    let d = dict(vec![
        ColumnDescriptor::numeric("a"),
        ColumnDescriptor::numeric("b"),
        ColumnDescriptor::date("d"),
        ColumnDescriptor::numeric("c"),
        ColumnDescriptor::datetime("e"),
        ColumnDescriptor::date("f"),
    ]);
    let layout = RowLayout::build(&d, &ColumnSelection::All, ByteOrder::Little);

    assert_eq!(
        layout.bucket(Bucket::Numeric).spans,
        vec![Span { start: 0, end: 16 }, Span { start: 24, end: 32 }]
    );
    // Dates and datetimes share a bucket, so `e` and `f` merge.
    assert_eq!(
        layout.bucket(Bucket::Datetime).spans,
        vec![Span { start: 16, end: 24 }, Span { start: 32, end: 48 }]
    );
    assert_eq!(layout.bucket(Bucket::Datetime).packed_offsets, vec![0, 8, 16]);
}

#[test]
fn test_inactive_columns_still_advance_offsets() {
    let d = dict(vec![
        ColumnDescriptor::numeric("a"),
        ColumnDescriptor::string("skip", 20),
        ColumnDescriptor::numeric("b"),
    ]);
    let layout = RowLayout::build(&d, &ColumnSelection::names(["a", "b"]), ByteOrder::Little);

    assert_eq!(layout.row_size(), 40);
    assert_eq!(layout.placements()[2].offset, 32);
    assert!(!layout.placements()[1].active);
    // The skipped string breaks contiguity.
    assert_eq!(
        layout.bucket(Bucket::Numeric).spans,
        vec![Span { start: 0, end: 8 }, Span { start: 32, end: 40 }]
    );
    assert!(layout.bucket(Bucket::String).is_empty());
}

#[test]
fn test_selection_order_unknown_and_duplicate_names() {
    let d = dict(vec![
        ColumnDescriptor::numeric("a"),
        ColumnDescriptor::string("s", 8),
        ColumnDescriptor::time("t"),
    ]);
    let layout = RowLayout::build(
        &d,
        &ColumnSelection::names(["t", "missing", "a", "t"]),
        ByteOrder::Little,
    );

    let order: Vec<usize> = layout.outputs().iter().map(|o| o.column).collect();
    assert_eq!(order, vec![2, 0]);
    assert_eq!(layout.outputs()[0].bucket, Bucket::Time);
    assert_eq!(layout.outputs()[1].bucket, Bucket::Numeric);
}

#[test]
fn test_empty_selection_yields_empty_buckets() {
    let d = dict(vec![ColumnDescriptor::numeric("a")]);
    let layout = RowLayout::build(&d, &ColumnSelection::names(["zzz"]), ByteOrder::Big);

    assert_eq!(layout.row_size(), 8);
    assert!(layout.outputs().is_empty());
    for bucket in Bucket::ALL {
        assert!(layout.bucket(bucket).spans.is_empty());
    }
}

#[test]
fn test_build_is_deterministic() {
    let mut rng = StdRng::seed_from_u64(7);
    let d = random_dictionary(&mut rng, 30);
    let a = RowLayout::build(&d, &ColumnSelection::All, ByteOrder::Little);
    let b = RowLayout::build(&d, &ColumnSelection::All, ByteOrder::Little);
    assert_eq!(a.describe().unwrap(), b.describe().unwrap());
}

#[test]
fn test_spans_partition_active_bytes_and_are_maximal() {
    let mut rng = StdRng::seed_from_u64(0x5A5_CA5E);

    for _ in 0..200 {
        // --- ARRANGE ---
        let n = rng.random_range(0..25);
        let d = random_dictionary(&mut rng, n);
        let names: Vec<String> = d
            .names()
            .filter(|_| rng.random_bool(0.6))
            .map(String::from)
            .collect();

        // --- ACT ---
        let layout = RowLayout::build(&d, &ColumnSelection::Names(names), ByteOrder::Little);

        // --- ASSERT ---
        // Offsets are the running sum of widths.
        let mut expected_offset = 0;
        for (p, c) in layout.placements().iter().zip(d.columns()) {
            assert_eq!(p.offset, expected_offset);
            assert_eq!(p.width, c.byte_width());
            expected_offset += p.width;
        }
        assert_eq!(layout.row_size(), d.row_size());

        let mut owner = vec![None; layout.row_size()];
        for bucket in Bucket::ALL {
            let b = layout.bucket(bucket);

            // Spans cover exactly the bytes of the bucket's active columns.
            let mut from_columns = vec![false; layout.row_size()];
            for &idx in &b.columns {
                let p = layout.placements()[idx];
                assert!(p.active);
                assert_eq!(Bucket::classify(d.column(idx).unwrap()), bucket);
                from_columns[p.offset..p.offset + p.width].fill(true);
            }
            let mut from_spans = vec![false; layout.row_size()];
            for s in &b.spans {
                assert!(!s.is_empty());
                for byte in s.range() {
                    assert!(owner[byte].is_none(), "spans overlap at byte {}", byte);
                    owner[byte] = Some(bucket);
                    from_spans[byte] = true;
                }
            }
            assert_eq!(from_columns, from_spans);

            // Maximality: consecutive spans are never adjacent.
            for pair in b.spans.windows(2) {
                assert!(pair[0].end < pair[1].start);
            }
            assert_eq!(b.packed_len(), b.columns.iter().map(|&i| d.columns()[i].byte_width()).sum::<usize>());
        }

        // Inactive columns are never covered.
        for p in layout.placements().iter().filter(|p| !p.active) {
            assert!(owner[p.offset..p.offset + p.width].iter().all(Option::is_none));
        }
    }
}

#[test]
fn test_byte_order_release_codes() {
    assert_eq!(ByteOrder::from_release_code(0).unwrap(), ByteOrder::Little);
    assert_eq!(ByteOrder::from_release_code(1).unwrap(), ByteOrder::Big);
    assert!(ByteOrder::from_release_code(2).is_err());
}
