use pretty_assertions::assert_eq;
use quarry_columnar::ColumnBatch;
use quarry_ops::{
    iter_operation_specs, lookup_operation, BatchOperand, ExecError, OperationCatalog,
    OperationError, OperationId,
};
use quarry_types::{
    Date, Datetime, DatetimeInterval, TypeDescriptor, TypeId, TypedValue, YearMonthInterval,
};

fn fixed(type_id: TypeId, nullable: bool) -> &'static TypeDescriptor {
    TypeDescriptor::fixed(type_id, nullable)
}

#[test]
fn numeric_results_follow_the_promotion_lattice() {
    use TypeId::{Double, Float, Int, Long};

    let catalog = OperationCatalog::default();
    let cases = [
        (Int, Int, Int),
        (Int, Long, Long),
        (Long, Int, Long),
        (Int, Float, Float),
        (Long, Float, Double),
        (Float, Long, Double),
        (Long, Double, Double),
        (Float, Double, Double),
        (Double, Double, Double),
    ];
    for op in ["+", "-", "*", "/", "%"] {
        for (left, right, expected) in cases {
            assert_eq!(
                catalog
                    .result_type(op, &[fixed(left, false), fixed(right, false)], &[])
                    .unwrap(),
                fixed(expected, false),
                "{op}({left}, {right})"
            );
        }
    }

    let nullable = catalog
        .result_type("Add", &[fixed(Int, false), fixed(Double, true)], &[])
        .unwrap();
    assert_eq!(nullable, fixed(Double, true));
    let again = catalog
        .result_type("Add", &[fixed(Int, false), fixed(Double, true)], &[])
        .unwrap();
    assert!(std::ptr::eq(nullable, again));
}

#[test]
fn batch_arithmetic_propagates_nulls() {
    let catalog = OperationCatalog::default();
    let left = ColumnBatch::from_values(
        fixed(TypeId::Int, true),
        &[TypedValue::Int(1), TypedValue::Null(TypeId::Int), TypedValue::Int(3)],
    )
    .unwrap();
    let right =
        ColumnBatch::from_native(fixed(TypeId::Double, false), vec![0.5f64, 1.0, 2.0]).unwrap();

    let bound = catalog
        .bind("Add", &[left.descriptor(), right.descriptor()], &[])
        .unwrap();
    let out = bound
        .operator
        .as_binary()
        .unwrap()
        .apply_to_batches(BatchOperand::Column(&left), BatchOperand::Column(&right))
        .unwrap();

    assert_eq!(out.descriptor(), fixed(TypeId::Double, true));
    assert_eq!(
        out.iter().collect::<Vec<_>>(),
        vec![
            TypedValue::Double(1.5),
            TypedValue::Null(TypeId::Double),
            TypedValue::Double(5.0),
        ]
    );
}

#[test]
fn integer_division_by_zero_aborts_the_whole_batch() {
    let catalog = OperationCatalog::default();
    let left = ColumnBatch::from_native(fixed(TypeId::Long, false), vec![10i64, 20, 30]).unwrap();
    let right = ColumnBatch::from_native(fixed(TypeId::Int, false), vec![2i32, 0, 5]).unwrap();

    let divide = catalog
        .make_operator("/", &[left.descriptor(), right.descriptor()], &[])
        .unwrap();
    let err = divide
        .as_binary()
        .unwrap()
        .apply_to_batches(BatchOperand::Column(&left), BatchOperand::Column(&right))
        .unwrap_err();
    assert_eq!(err, ExecError::DivisionByZero { operation: "Divide" });

    let modulo = catalog
        .make_operator("%", &[left.descriptor(), right.descriptor()], &[])
        .unwrap();
    assert_eq!(
        modulo.apply_to_columns(&[left, right]).unwrap_err(),
        ExecError::DivisionByZero { operation: "Modulo" }
    );
}

#[test]
fn float_division_by_zero_is_not_a_fault() {
    let catalog = OperationCatalog::default();
    let divide = catalog
        .make_operator("/", &[fixed(TypeId::Float, false), fixed(TypeId::Int, false)], &[])
        .unwrap();
    let out = divide
        .as_binary()
        .unwrap()
        .apply_to_values(&TypedValue::Float(1.0), &TypedValue::Int(0))
        .unwrap();
    assert_eq!(out, TypedValue::Float(f32::INFINITY));
}

#[test]
fn integer_overflow_wraps() {
    let catalog = OperationCatalog::default();
    let int = fixed(TypeId::Int, false);
    let add = catalog.make_operator("+", &[int, int], &[]).unwrap();
    let out = add
        .as_binary()
        .unwrap()
        .apply_to_values(&TypedValue::Int(i32::MAX), &TypedValue::Int(1))
        .unwrap();
    assert_eq!(out, TypedValue::Int(i32::MIN));
}

#[test]
fn static_operands_broadcast_over_the_column() {
    let catalog = OperationCatalog::default();
    let column = ColumnBatch::from_native(fixed(TypeId::Long, false), vec![1i64, 2, 3]).unwrap();

    let times = catalog
        .make_operator("*", &[fixed(TypeId::Long, false), fixed(TypeId::Int, false)], &[])
        .unwrap();
    let ten = TypedValue::Int(10);
    let out = times
        .as_binary()
        .unwrap()
        .apply_to_batches(BatchOperand::Column(&column), BatchOperand::Static(&ten))
        .unwrap();
    assert_eq!(out.native::<i64>().unwrap(), &[10i64, 20, 30][..]);

    let minus = catalog
        .make_operator("-", &[fixed(TypeId::Int, true), fixed(TypeId::Long, false)], &[])
        .unwrap();
    let null = TypedValue::Null(TypeId::Int);
    let out = minus
        .as_binary()
        .unwrap()
        .apply_to_batches(BatchOperand::Static(&null), BatchOperand::Column(&column))
        .unwrap();
    assert_eq!(out.null_count(), 3);
}

#[test]
fn batch_shape_errors() {
    let catalog = OperationCatalog::default();
    let long = fixed(TypeId::Long, false);
    let add = catalog.make_operator("+", &[long, long], &[]).unwrap();
    let add = add.as_binary().unwrap();

    let three = ColumnBatch::from_native(long, vec![1i64, 2, 3]).unwrap();
    let two = ColumnBatch::from_native(long, vec![1i64, 2]).unwrap();
    assert_eq!(
        add.apply_to_batches(BatchOperand::Column(&three), BatchOperand::Column(&two))
            .unwrap_err(),
        ExecError::LengthMismatch { left: 3, right: 2 }
    );

    let one = TypedValue::Long(1);
    assert_eq!(
        add.apply_to_batches(BatchOperand::Static(&one), BatchOperand::Static(&one))
            .unwrap_err(),
        ExecError::NoColumnOperand
    );

    let doubles = ColumnBatch::from_native(fixed(TypeId::Double, false), vec![1.0f64]).unwrap();
    assert!(matches!(
        add.apply_to_batches(BatchOperand::Column(&doubles), BatchOperand::Static(&one)),
        Err(ExecError::TypeMismatch { .. })
    ));
}

#[test]
fn subtracting_dates_is_rejected_with_its_own_message() {
    let catalog = OperationCatalog::default();
    let date = fixed(TypeId::Date, false);

    match catalog.can_apply_to("-", &[date, date], &[]) {
        Err(OperationError::Rejected { operation, message }) => {
            assert_eq!(operation, "Subtract");
            assert!(message.contains("Date"), "{message}");
        }
        other => panic!("expected a rejection, got {other:?}"),
    }
    assert!(matches!(
        catalog.result_type("-", &[date, date], &[]),
        Err(OperationError::Contract { operation: "Subtract", .. })
    ));
    assert!(matches!(
        catalog.bind("-", &[date, date], &[]),
        Err(OperationError::Rejected { .. })
    ));
}

#[test]
fn unsupported_pairs_have_no_signature() {
    let catalog = OperationCatalog::default();
    let date = fixed(TypeId::Date, false);
    let int = fixed(TypeId::Int, false);
    let interval = fixed(TypeId::DatetimeInterval, false);
    let text = TypeDescriptor::char(3, false);

    for (op, args) in [
        ("+", vec![date, date]),
        ("%", vec![interval, int]),
        ("/", vec![int, interval]),
        ("*", vec![text, int]),
        ("+", vec![int]),
    ] {
        assert!(
            matches!(
                catalog.can_apply_to(op, &args, &[]),
                Err(OperationError::NoMatchingSignature { .. })
            ),
            "{op} {args:?}"
        );
    }
}

#[test]
fn arithmetic_signatures_are_the_functor_pairs() {
    let catalog = OperationCatalog::default();
    let signatures: Vec<String> = catalog
        .signatures("Add")
        .unwrap()
        .iter()
        .map(|s| s.to_string())
        .collect();
    assert!(signatures.contains(&"Add(Int, Double)".to_string()));
    assert!(signatures.contains(&"Add(Date, YearMonthInterval)".to_string()));
    assert!(!signatures.contains(&"Add(Date, DatetimeInterval)".to_string()));

    for signature in catalog.signatures("Subtract").unwrap() {
        let args: Vec<&'static TypeDescriptor> = signature
            .argument_type_ids
            .iter()
            .map(|&type_id| fixed(type_id, false))
            .collect();
        catalog.can_apply_to("Subtract", &args, &[]).unwrap();
    }
}

#[test]
fn date_and_interval_arithmetic() {
    let catalog = OperationCatalog::default();
    let apply = |op: &str, left: TypedValue<'static>, right: TypedValue<'static>| {
        let operator = catalog
            .make_operator(
                op,
                &[fixed(left.type_id(), false), fixed(right.type_id(), false)],
                &[],
            )
            .unwrap();
        operator
            .as_binary()
            .unwrap()
            .apply_to_values(&left, &right)
            .unwrap()
    };

    let jan31 = Date::from_ymd(2024, 1, 31).unwrap();
    assert_eq!(
        apply(
            "+",
            TypedValue::Date(jan31),
            TypedValue::YearMonthInterval(YearMonthInterval::from_months(1))
        ),
        TypedValue::Date(Date::from_ymd(2024, 2, 29).unwrap())
    );

    let epoch = Datetime::from_micros_since_epoch(0);
    let day_and_a_micro = DatetimeInterval::from_micros(86_400_000_001);
    let later = apply(
        "+",
        TypedValue::Datetime(epoch),
        TypedValue::DatetimeInterval(day_and_a_micro),
    );
    assert_eq!(later.to_string(), "1970-01-02 00:00:00.000001");
    assert_eq!(
        apply("-", later, TypedValue::Datetime(epoch)),
        TypedValue::DatetimeInterval(day_and_a_micro)
    );

    assert_eq!(
        apply(
            "*",
            TypedValue::Double(2.5),
            TypedValue::YearMonthInterval(YearMonthInterval::from_months(2))
        ),
        TypedValue::YearMonthInterval(YearMonthInterval::from_months(5))
    );
    assert_eq!(
        apply(
            "/",
            TypedValue::DatetimeInterval(DatetimeInterval::from_micros(9)),
            TypedValue::Int(2)
        ),
        TypedValue::DatetimeInterval(DatetimeInterval::from_micros(4))
    );

    assert_eq!(
        catalog
            .result_type(
                "-",
                &[fixed(TypeId::Datetime, true), fixed(TypeId::Datetime, false)],
                &[]
            )
            .unwrap(),
        fixed(TypeId::DatetimeInterval, true)
    );
}

#[test]
fn calendar_overflow_is_reported() {
    let catalog = OperationCatalog::default();
    let add = catalog
        .make_operator(
            "+",
            &[fixed(TypeId::Date, false), fixed(TypeId::YearMonthInterval, false)],
            &[],
        )
        .unwrap();
    let err = add
        .as_binary()
        .unwrap()
        .apply_to_values(
            &TypedValue::Date(Date::from_days_since_epoch(i32::MAX)),
            &TypedValue::YearMonthInterval(YearMonthInterval::from_months(1)),
        )
        .unwrap_err();
    assert_eq!(
        err,
        ExecError::OutOfRange {
            operation: "Add",
            type_id: TypeId::Date,
        }
    );
}

#[test]
fn operations_are_found_by_name_or_symbol() {
    assert_eq!(lookup_operation("  add ").unwrap().id(), OperationId::Add);
    assert_eq!(lookup_operation("+").unwrap().id(), OperationId::Add);
    assert_eq!(lookup_operation("%").unwrap().id(), OperationId::Modulo);
    assert_eq!(lookup_operation("SUBSTR").unwrap().id(), OperationId::Substring);
    assert_eq!(lookup_operation("Neg").unwrap().id(), OperationId::Negate);
    assert!(lookup_operation("concat").is_none());
    assert_eq!(iter_operation_specs().count(), 14);
}
