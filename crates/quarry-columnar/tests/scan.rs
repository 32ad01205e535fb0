use pretty_assertions::assert_eq;
use quarry_columnar::{BatchCursor, ColumnBatch, RowIdAdapter, RowIdSet, ValueAccessor};
use quarry_types::{Date, TypeDescriptor, TypeId, TypedValue};

fn build_columns() -> Vec<ColumnBatch> {
    let ids = ColumnBatch::from_native(TypeDescriptor::fixed(TypeId::Long, false), vec![1i64, 2, 3, 4, 5])
        .unwrap();
    let names = ColumnBatch::from_values(
        TypeDescriptor::char(6, true),
        &[
            TypedValue::char_borrowed(b"alpha"),
            TypedValue::Null(TypeId::Char),
            TypedValue::char_borrowed(b"gamma"),
            TypedValue::char_borrowed(b"delta"),
            TypedValue::char_borrowed(b"eps"),
        ],
    )
    .unwrap();
    let dates = ColumnBatch::from_native(
        TypeDescriptor::fixed(TypeId::Date, false),
        (0..5).map(Date::from_days_since_epoch).collect::<Vec<_>>(),
    )
    .unwrap();
    vec![ids, names, dates]
}

fn collect_rows<'a>(cursor: &mut dyn ValueAccessor<'a>) -> Vec<Vec<TypedValue<'a>>> {
    let mut rows = Vec::new();
    cursor.begin_iteration();
    while cursor.advance() {
        rows.push(
            (0..cursor.num_columns())
                .map(|attr| cursor.value(attr).unwrap())
                .collect(),
        );
    }
    rows
}

#[test]
fn cursor_rows_match_batch_values() {
    let columns = build_columns();
    let mut cursor = BatchCursor::new(&columns).unwrap();
    let rows = collect_rows(&mut cursor);
    assert_eq!(rows.len(), 5);
    for (row_idx, row) in rows.iter().enumerate() {
        for (attr, value) in row.iter().enumerate() {
            assert_eq!(Some(value.clone()), columns[attr].value(row_idx));
        }
    }
    assert_eq!(rows[1][1], TypedValue::Null(TypeId::Char));
}

#[test]
fn filtered_cursor_sees_only_selected_rows() {
    let columns = build_columns();
    let mut cursor = BatchCursor::new(&columns).unwrap();
    let filter = RowIdSet::from_row_ids(5, [0, 2, 4]).unwrap();
    let mut filtered = RowIdAdapter::new(&mut cursor, &filter).unwrap();
    let rows = collect_rows(&mut filtered);
    let ids: Vec<TypedValue<'_>> = rows.iter().map(|row| row[0].clone()).collect();
    assert_eq!(ids, vec![TypedValue::Long(1), TypedValue::Long(3), TypedValue::Long(5)]);
    assert_eq!(rows[2][1], TypedValue::char_borrowed(b"eps"));
}
