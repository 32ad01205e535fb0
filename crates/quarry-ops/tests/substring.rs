use pretty_assertions::assert_eq;
use quarry_columnar::{BatchCursor, ColumnBatch, RowIdSet};
use quarry_ops::{OperationCatalog, OperationError};
use quarry_types::{ScalarLiteral, TypeDescriptor, TypeId, TypedValue};

fn substring_of_hello(start: i64, length: Option<i64>) -> TypedValue<'static> {
    let catalog = OperationCatalog::default();
    let mut statics = vec![ScalarLiteral::long(start)];
    statics.extend(length.map(ScalarLiteral::long));
    let operator = catalog
        .make_operator("Substring", &[TypeDescriptor::varchar(5, false)], &statics)
        .unwrap();
    operator
        .as_unary()
        .unwrap()
        .apply_to_value(&TypedValue::varchar_borrowed(b"hello"))
        .unwrap()
}

#[test]
fn start_is_one_based_and_clamped() {
    assert_eq!(substring_of_hello(1, Some(3)), TypedValue::char_borrowed(b"hel"));
    assert_eq!(substring_of_hello(4, Some(10)), TypedValue::char_borrowed(b"lo"));
    assert_eq!(substring_of_hello(2, None), TypedValue::char_borrowed(b"ello"));
}

#[test]
fn start_past_the_end_is_empty_not_an_error() {
    let out = substring_of_hello(10, Some(2));
    assert_eq!(out, TypedValue::char_borrowed(b""));
    assert_eq!(out.logical_bytes(), Some(&b""[..]));
}

#[test]
fn non_positive_start_and_length_have_distinct_diagnostics() {
    let catalog = OperationCatalog::default();
    let input = TypeDescriptor::char(8, false);

    let bad_start = catalog
        .can_apply_to("substr", &[input], &[ScalarLiteral::long(0), ScalarLiteral::long(2)])
        .unwrap_err();
    let bad_length = catalog
        .can_apply_to("substr", &[input], &[ScalarLiteral::long(1), ScalarLiteral::long(-1)])
        .unwrap_err();

    assert!(matches!(bad_start, OperationError::Rejected { .. }));
    assert!(matches!(bad_length, OperationError::Rejected { .. }));
    assert_eq!(bad_start.message(), "The start position must be greater than 0");
    assert_eq!(bad_length.message(), "The substring length must be greater than 0");

    assert!(matches!(
        catalog.make_operator("substr", &[input], &[ScalarLiteral::long(0)]),
        Err(OperationError::Contract { operation: "Substring", .. })
    ));
}

#[test]
fn arity_and_operand_kind_are_checked() {
    let catalog = OperationCatalog::default();
    let text = TypeDescriptor::varchar(8, false);
    let long = TypeDescriptor::fixed(TypeId::Long, false);

    for (args, statics) in [
        (vec![long], vec![ScalarLiteral::long(1)]),
        (vec![text], vec![]),
        (
            vec![text],
            vec![ScalarLiteral::long(1), ScalarLiteral::long(1), ScalarLiteral::long(1)],
        ),
        (vec![text, text], vec![ScalarLiteral::long(1)]),
    ] {
        assert!(matches!(
            catalog.can_apply_to("Substring", &args, &statics),
            Err(OperationError::NoMatchingSignature { .. })
        ));
    }

    assert_eq!(
        catalog
            .result_type("Substring", &[text], &[ScalarLiteral::int(3), ScalarLiteral::int(4)])
            .unwrap(),
        TypeDescriptor::char(4, false)
    );
}

#[test]
fn batch_substring_keeps_nulls_and_pads_short_results() {
    let catalog = OperationCatalog::default();
    let input = ColumnBatch::from_values(
        TypeDescriptor::char(6, true),
        &[
            TypedValue::char_borrowed(b"quarry"),
            TypedValue::Null(TypeId::Char),
            TypedValue::char_borrowed(b"ab"),
        ],
    )
    .unwrap();

    let bound = catalog
        .bind(
            "Substring",
            &[input.descriptor()],
            &[ScalarLiteral::long(2), ScalarLiteral::long(3)],
        )
        .unwrap();
    assert_eq!(bound.result_type, TypeDescriptor::char(3, true));

    let out = bound.operator.as_unary().unwrap().apply_to_batch(&input).unwrap();
    assert_eq!(out.bytes().unwrap().get(0), Some(&b"uar"[..]));
    assert_eq!(out.bytes().unwrap().get(2), Some(&b"b\0\0"[..]));
    assert_eq!(
        out.iter().collect::<Vec<_>>(),
        vec![
            TypedValue::char_borrowed(b"uar"),
            TypedValue::Null(TypeId::Char),
            TypedValue::char_borrowed(b"b"),
        ]
    );
}

#[test]
fn unterminated_slots_are_not_over_read() {
    let catalog = OperationCatalog::default();
    let input = ColumnBatch::from_values(
        TypeDescriptor::char(3, false),
        &[TypedValue::char_borrowed(b"abc"), TypedValue::char_borrowed(b"xyz")],
    )
    .unwrap();
    let operator = catalog
        .make_operator("Substring", &[input.descriptor()], &[ScalarLiteral::long(2)])
        .unwrap();
    let out = operator.apply_to_columns(std::slice::from_ref(&input)).unwrap();
    assert_eq!(out.descriptor(), TypeDescriptor::char(2, false));
    assert_eq!(
        out.iter().collect::<Vec<_>>(),
        vec![TypedValue::char_borrowed(b"bc"), TypedValue::char_borrowed(b"yz")]
    );
}

#[test]
fn filtered_cursor_substring_visits_selected_rows() {
    let catalog = OperationCatalog::default();
    let columns = vec![ColumnBatch::from_values(
        TypeDescriptor::varchar(4, false),
        &[
            TypedValue::varchar_borrowed(b"one"),
            TypedValue::varchar_borrowed(b"two"),
            TypedValue::varchar_borrowed(b"four"),
        ],
    )
    .unwrap()];
    let operator = catalog
        .make_operator(
            "substr",
            &[columns[0].descriptor()],
            &[ScalarLiteral::long(1), ScalarLiteral::long(2)],
        )
        .unwrap();

    let mut cursor = BatchCursor::new(&columns).unwrap();
    let filter = RowIdSet::from_row_ids(3, [0, 2]).unwrap();
    let out = operator
        .as_unary()
        .unwrap()
        .apply_to_cursor(&mut cursor, 0, Some(&filter))
        .unwrap();
    assert_eq!(
        out.iter().collect::<Vec<_>>(),
        vec![TypedValue::char_borrowed(b"on"), TypedValue::char_borrowed(b"fo")]
    );
}
