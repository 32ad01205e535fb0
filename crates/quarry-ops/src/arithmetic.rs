//! Binary arithmetic: Add, Subtract, Multiply, Divide and Modulo.
//!
//! Functors live in a table keyed by `(operation, left kind, right kind)`, populated once at
//! first use. Numeric pairs are the full cross product over Int/Long/Float/Double with the
//! result kind given by [`least_common_supertype`]; date and interval pairs are listed
//! explicitly.

use std::marker::PhantomData;
use std::sync::{Arc, OnceLock};

use ahash::AHashMap;
use chrono::{Months, NaiveDate, NaiveDateTime};
use quarry_types::dispatch::{invoke_on_numeric_type_id, NumericVisitor};
use quarry_types::{
    least_common_supertype, Date, Datetime, DatetimeInterval, NativeValue, NumericNative,
    ScalarLiteral, TypeDescriptor, TypeId, YearMonthInterval, NUMERIC_TYPE_IDS,
};

use crate::error::{ExecError, ExecResult, OperationError, OperationResult};
use crate::functor::{
    AddKernel, ArithmeticKernel, BinaryFunctor, DivideKernel, FnBinaryFunctor, ModuloKernel,
    MultiplyKernel, NumericBinaryFunctor, SubtractKernel,
};
use crate::operation::{
    describe_arguments, ensure_applicable, Operation, OperationId, OperationSignature,
    OperationSpec,
};
use crate::operator::{make_binary_operator, UncheckedBinaryOperator, UncheckedOperator};

type BinaryFactory = Arc<
    dyn Fn(bool, bool, &'static TypeDescriptor) -> Arc<dyn UncheckedBinaryOperator> + Send + Sync,
>;

#[derive(Clone)]
pub(crate) struct BinaryFunctorEntry {
    pub(crate) result: TypeId,
    factory: BinaryFactory,
}

impl BinaryFunctorEntry {
    fn new<F: BinaryFunctor>(functor: F) -> Self {
        Self {
            result: F::Output::TYPE_ID,
            factory: Arc::new(move |left_nullable, right_nullable, result| {
                make_binary_operator(functor.clone(), left_nullable, right_nullable, result)
            }),
        }
    }

    pub(crate) fn make(
        &self,
        left_nullable: bool,
        right_nullable: bool,
        result: &'static TypeDescriptor,
    ) -> Arc<dyn UncheckedBinaryOperator> {
        (self.factory)(left_nullable, right_nullable, result)
    }
}

#[derive(Default)]
pub(crate) struct BinaryFunctorTable {
    entries: AHashMap<(OperationId, TypeId, TypeId), BinaryFunctorEntry>,
}

impl BinaryFunctorTable {
    fn register<F: BinaryFunctor>(&mut self, operation: OperationId, functor: F) {
        let key = (operation, F::Left::TYPE_ID, F::Right::TYPE_ID);
        self.entries.insert(key, BinaryFunctorEntry::new(functor));
    }

    pub(crate) fn get(
        &self,
        operation: OperationId,
        left: TypeId,
        right: TypeId,
    ) -> Option<&BinaryFunctorEntry> {
        self.entries.get(&(operation, left, right))
    }

    pub(crate) fn signatures(&self, operation: OperationId) -> Vec<OperationSignature> {
        let mut pairs: Vec<(TypeId, TypeId)> = self
            .entries
            .keys()
            .filter(|(op, _, _)| *op == operation)
            .map(|(_, left, right)| (*left, *right))
            .collect();
        pairs.sort_unstable();
        pairs
            .into_iter()
            .map(|(left, right)| OperationSignature::new(operation, vec![left, right], Vec::new()))
            .collect()
    }

    pub(crate) fn len(&self) -> usize {
        self.entries.len()
    }
}

pub(crate) fn binary_functors() -> &'static BinaryFunctorTable {
    static TABLE: OnceLock<BinaryFunctorTable> = OnceLock::new();
    TABLE.get_or_init(|| {
        let mut table = BinaryFunctorTable::default();
        register_numeric_cross_product::<AddKernel>(&mut table);
        register_numeric_cross_product::<SubtractKernel>(&mut table);
        register_numeric_cross_product::<MultiplyKernel>(&mut table);
        register_numeric_cross_product::<DivideKernel>(&mut table);
        register_numeric_cross_product::<ModuloKernel>(&mut table);
        register_date_arithmetic(&mut table);
        register_interval_scaling(&mut table);
        log::debug!("registered {} binary arithmetic functors", table.len());
        table
    })
}

fn register_numeric_cross_product<K: ArithmeticKernel>(table: &mut BinaryFunctorTable) {
    for left in NUMERIC_TYPE_IDS {
        invoke_on_numeric_type_id(
            left,
            LeftStage::<K> {
                table: &mut *table,
                kernel: PhantomData,
            },
        );
    }
}

struct LeftStage<'t, K> {
    table: &'t mut BinaryFunctorTable,
    kernel: PhantomData<K>,
}

impl<K: ArithmeticKernel> NumericVisitor for LeftStage<'_, K> {
    type Output = ();

    fn visit<L: NumericNative>(self) {
        for right in NUMERIC_TYPE_IDS {
            invoke_on_numeric_type_id(
                right,
                RightStage::<K, L> {
                    table: &mut *self.table,
                    marker: PhantomData,
                },
            );
        }
    }
}

struct RightStage<'t, K, L> {
    table: &'t mut BinaryFunctorTable,
    marker: PhantomData<(K, L)>,
}

impl<K: ArithmeticKernel, L: NumericNative> NumericVisitor for RightStage<'_, K, L> {
    type Output = ();

    fn visit<R: NumericNative>(self) {
        let Some(result) = least_common_supertype(L::TYPE_ID, R::TYPE_ID) else {
            return;
        };
        invoke_on_numeric_type_id(
            result,
            ResultStage::<K, L, R> {
                table: self.table,
                marker: PhantomData,
            },
        );
    }
}

struct ResultStage<'t, K, L, R> {
    table: &'t mut BinaryFunctorTable,
    marker: PhantomData<(K, L, R)>,
}

impl<K: ArithmeticKernel, L: NumericNative, R: NumericNative> NumericVisitor
    for ResultStage<'_, K, L, R>
{
    type Output = ();

    fn visit<O: NumericNative>(self) {
        self.table
            .register(K::OPERATION, NumericBinaryFunctor::<K, L, R, O>::new());
    }
}

fn out_of_range(operation: OperationId, type_id: TypeId) -> ExecError {
    ExecError::OutOfRange {
        operation: operation.name(),
        type_id,
    }
}

fn shift_months(date: NaiveDate, months: i64) -> Option<NaiveDate> {
    let magnitude = Months::new(u32::try_from(months.unsigned_abs()).ok()?);
    if months >= 0 {
        date.checked_add_months(magnitude)
    } else {
        date.checked_sub_months(magnitude)
    }
}

fn shift_date(operation: OperationId, date: Date, months: Option<i64>) -> ExecResult<Date> {
    months
        .and_then(|months| shift_months(date.to_naive()?, months))
        .map(Date::from_naive)
        .ok_or_else(|| out_of_range(operation, TypeId::Date))
}

fn shift_datetime_months(
    operation: OperationId,
    datetime: Datetime,
    months: Option<i64>,
) -> ExecResult<Datetime> {
    months
        .and_then(|months| {
            let naive = datetime.to_naive()?;
            let date = shift_months(naive.date(), months)?;
            Datetime::from_naive(NaiveDateTime::new(date, naive.time()))
        })
        .ok_or_else(|| out_of_range(operation, TypeId::Datetime))
}

fn shift_datetime_micros(
    operation: OperationId,
    datetime: Datetime,
    micros: Option<i64>,
) -> ExecResult<Datetime> {
    micros
        .and_then(|micros| datetime.micros_since_epoch().checked_add(micros))
        .map(Datetime::from_micros_since_epoch)
        .ok_or_else(|| out_of_range(operation, TypeId::Datetime))
}

fn add_date_months(date: Date, interval: YearMonthInterval) -> ExecResult<Date> {
    shift_date(OperationId::Add, date, Some(interval.months()))
}

fn add_months_date(interval: YearMonthInterval, date: Date) -> ExecResult<Date> {
    add_date_months(date, interval)
}

fn subtract_date_months(date: Date, interval: YearMonthInterval) -> ExecResult<Date> {
    shift_date(OperationId::Subtract, date, interval.months().checked_neg())
}

fn add_datetime_micros(datetime: Datetime, interval: DatetimeInterval) -> ExecResult<Datetime> {
    shift_datetime_micros(OperationId::Add, datetime, Some(interval.micros()))
}

fn add_micros_datetime(interval: DatetimeInterval, datetime: Datetime) -> ExecResult<Datetime> {
    add_datetime_micros(datetime, interval)
}

fn subtract_datetime_micros(datetime: Datetime, interval: DatetimeInterval) -> ExecResult<Datetime> {
    shift_datetime_micros(OperationId::Subtract, datetime, interval.micros().checked_neg())
}

fn add_datetime_months(datetime: Datetime, interval: YearMonthInterval) -> ExecResult<Datetime> {
    shift_datetime_months(OperationId::Add, datetime, Some(interval.months()))
}

fn add_months_datetime(interval: YearMonthInterval, datetime: Datetime) -> ExecResult<Datetime> {
    add_datetime_months(datetime, interval)
}

fn subtract_datetime_months(
    datetime: Datetime,
    interval: YearMonthInterval,
) -> ExecResult<Datetime> {
    shift_datetime_months(OperationId::Subtract, datetime, interval.months().checked_neg())
}

fn subtract_datetimes(left: Datetime, right: Datetime) -> ExecResult<DatetimeInterval> {
    left.micros_since_epoch()
        .checked_sub(right.micros_since_epoch())
        .map(DatetimeInterval::from_micros)
        .ok_or_else(|| out_of_range(OperationId::Subtract, TypeId::DatetimeInterval))
}

fn add_day_time(left: DatetimeInterval, right: DatetimeInterval) -> ExecResult<DatetimeInterval> {
    Ok(DatetimeInterval::from_micros(
        left.micros().wrapping_add(right.micros()),
    ))
}

fn subtract_day_time(
    left: DatetimeInterval,
    right: DatetimeInterval,
) -> ExecResult<DatetimeInterval> {
    Ok(DatetimeInterval::from_micros(
        left.micros().wrapping_sub(right.micros()),
    ))
}

fn add_year_month(
    left: YearMonthInterval,
    right: YearMonthInterval,
) -> ExecResult<YearMonthInterval> {
    Ok(YearMonthInterval::from_months(
        left.months().wrapping_add(right.months()),
    ))
}

fn subtract_year_month(
    left: YearMonthInterval,
    right: YearMonthInterval,
) -> ExecResult<YearMonthInterval> {
    Ok(YearMonthInterval::from_months(
        left.months().wrapping_sub(right.months()),
    ))
}

fn register_date_arithmetic(table: &mut BinaryFunctorTable) {
    use OperationId::{Add, Subtract};

    table.register(Add, FnBinaryFunctor::new("Add", add_date_months));
    table.register(Add, FnBinaryFunctor::new("Add", add_months_date));
    table.register(Add, FnBinaryFunctor::new("Add", add_datetime_micros));
    table.register(Add, FnBinaryFunctor::new("Add", add_datetime_months));
    table.register(Add, FnBinaryFunctor::new("Add", add_micros_datetime));
    table.register(Add, FnBinaryFunctor::new("Add", add_months_datetime));
    table.register(Add, FnBinaryFunctor::new("Add", add_day_time));
    table.register(Add, FnBinaryFunctor::new("Add", add_year_month));

    table.register(Subtract, FnBinaryFunctor::new("Subtract", subtract_date_months));
    table.register(Subtract, FnBinaryFunctor::new("Subtract", subtract_datetime_micros));
    table.register(Subtract, FnBinaryFunctor::new("Subtract", subtract_datetime_months));
    table.register(Subtract, FnBinaryFunctor::new("Subtract", subtract_datetimes));
    table.register(Subtract, FnBinaryFunctor::new("Subtract", subtract_day_time));
    table.register(Subtract, FnBinaryFunctor::new("Subtract", subtract_year_month));
}

/// Interval natives scale by a count of their base unit.
trait IntervalNative: NativeValue {
    fn ticks(self) -> i64;
    fn from_ticks(ticks: i64) -> Self;
}

impl IntervalNative for DatetimeInterval {
    fn ticks(self) -> i64 {
        self.micros()
    }

    fn from_ticks(ticks: i64) -> Self {
        DatetimeInterval::from_micros(ticks)
    }
}

impl IntervalNative for YearMonthInterval {
    fn ticks(self) -> i64 {
        self.months()
    }

    fn from_ticks(ticks: i64) -> Self {
        YearMonthInterval::from_months(ticks)
    }
}

fn scale_interval<I: IntervalNative, N: NumericNative>(interval: I, factor: N) -> ExecResult<I> {
    let ticks = if N::IS_INTEGRAL {
        interval.ticks().wrapping_mul(factor.to_i64())
    } else {
        (interval.ticks() as f64 * factor.to_f64()) as i64
    };
    Ok(I::from_ticks(ticks))
}

fn scale_interval_by_left<N: NumericNative, I: IntervalNative>(
    factor: N,
    interval: I,
) -> ExecResult<I> {
    scale_interval(interval, factor)
}

fn divide_interval<I: IntervalNative, N: NumericNative>(interval: I, divisor: N) -> ExecResult<I> {
    if !N::IS_INTEGRAL {
        return Ok(I::from_ticks(
            (interval.ticks() as f64 / divisor.to_f64()) as i64,
        ));
    }
    match divisor.to_i64() {
        0 => Err(ExecError::DivisionByZero {
            operation: OperationId::Divide.name(),
        }),
        divisor => Ok(I::from_ticks(interval.ticks().wrapping_div(divisor))),
    }
}

/// Interval × numeric keeps the interval kind, whichever side it is on; interval ÷ numeric
/// only with the interval on the left.
struct IntervalScaleStage<'t, I> {
    table: &'t mut BinaryFunctorTable,
    interval: PhantomData<I>,
}

impl<I: IntervalNative> NumericVisitor for IntervalScaleStage<'_, I> {
    type Output = ();

    fn visit<N: NumericNative>(self) {
        self.table.register(
            OperationId::Multiply,
            FnBinaryFunctor::<I, N, I>::new("Multiply", scale_interval::<I, N>),
        );
        self.table.register(
            OperationId::Multiply,
            FnBinaryFunctor::<N, I, I>::new("Multiply", scale_interval_by_left::<N, I>),
        );
        self.table.register(
            OperationId::Divide,
            FnBinaryFunctor::<I, N, I>::new("Divide", divide_interval::<I, N>),
        );
    }
}

fn register_interval_scaling(table: &mut BinaryFunctorTable) {
    for numeric in NUMERIC_TYPE_IDS {
        invoke_on_numeric_type_id(
            numeric,
            IntervalScaleStage::<DatetimeInterval> {
                table: &mut *table,
                interval: PhantomData,
            },
        );
        invoke_on_numeric_type_id(
            numeric,
            IntervalScaleStage::<YearMonthInterval> {
                table: &mut *table,
                interval: PhantomData,
            },
        );
    }
}

type BoundOperands = (
    &'static TypeDescriptor,
    &'static TypeDescriptor,
    &'static BinaryFunctorEntry,
);

/// One of the five binary arithmetic operations.
pub struct ArithmeticOperation {
    id: OperationId,
}

impl ArithmeticOperation {
    fn operands(
        &self,
        arguments: &[&'static TypeDescriptor],
        static_arguments: &[ScalarLiteral],
    ) -> OperationResult<BoundOperands> {
        let no_match = || OperationError::NoMatchingSignature {
            operation: self.id.name(),
            arguments: describe_arguments(arguments, static_arguments),
        };
        let &[left, right] = arguments else {
            return Err(no_match());
        };
        if !static_arguments.is_empty() {
            return Err(no_match());
        }
        if self.id == OperationId::Subtract
            && left.type_id() == TypeId::Date
            && right.type_id() == TypeId::Date
        {
            return Err(OperationError::Rejected {
                operation: self.id.name(),
                message: "subtracting one Date from another is not supported".to_string(),
            });
        }
        let entry = binary_functors()
            .get(self.id, left.type_id(), right.type_id())
            .ok_or_else(no_match)?;
        Ok((left, right, entry))
    }
}

impl Operation for ArithmeticOperation {
    fn id(&self) -> OperationId {
        self.id
    }

    fn signatures(&self) -> Vec<OperationSignature> {
        binary_functors().signatures(self.id)
    }

    fn can_apply_to(
        &self,
        arguments: &[&'static TypeDescriptor],
        static_arguments: &[ScalarLiteral],
    ) -> OperationResult<()> {
        self.operands(arguments, static_arguments).map(|_| ())
    }

    fn result_type(
        &self,
        arguments: &[&'static TypeDescriptor],
        static_arguments: &[ScalarLiteral],
    ) -> OperationResult<&'static TypeDescriptor> {
        ensure_applicable(self, arguments, static_arguments)?;
        let (left, right, entry) = self.operands(arguments, static_arguments)?;
        Ok(TypeDescriptor::fixed(
            entry.result,
            left.is_nullable() || right.is_nullable(),
        ))
    }

    fn make_operator(
        &self,
        arguments: &[&'static TypeDescriptor],
        static_arguments: &[ScalarLiteral],
    ) -> OperationResult<UncheckedOperator> {
        let result = self.result_type(arguments, static_arguments)?;
        let (left, right, entry) = self.operands(arguments, static_arguments)?;
        log::trace!("binding {} for ({left}, {right}) -> {result}", self.id);
        Ok(UncheckedOperator::Binary(entry.make(
            left.is_nullable(),
            right.is_nullable(),
            result,
        )))
    }
}

inventory::submit! {
    OperationSpec {
        operation: &ArithmeticOperation { id: OperationId::Add },
    }
}

inventory::submit! {
    OperationSpec {
        operation: &ArithmeticOperation { id: OperationId::Subtract },
    }
}

inventory::submit! {
    OperationSpec {
        operation: &ArithmeticOperation { id: OperationId::Multiply },
    }
}

inventory::submit! {
    OperationSpec {
        operation: &ArithmeticOperation { id: OperationId::Divide },
    }
}

inventory::submit! {
    OperationSpec {
        operation: &ArithmeticOperation { id: OperationId::Modulo },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn numeric_cross_product_is_complete() {
        let table = binary_functors();
        for op in [
            OperationId::Add,
            OperationId::Subtract,
            OperationId::Multiply,
            OperationId::Divide,
            OperationId::Modulo,
        ] {
            for left in NUMERIC_TYPE_IDS {
                for right in NUMERIC_TYPE_IDS {
                    let entry = table.get(op, left, right).unwrap();
                    assert_eq!(Some(entry.result), least_common_supertype(left, right));
                }
            }
        }
    }

    #[test]
    fn interval_scaling_uses_the_interval_side() {
        let table = binary_functors();
        assert_eq!(
            table
                .get(OperationId::Multiply, TypeId::Double, TypeId::YearMonthInterval)
                .unwrap()
                .result,
            TypeId::YearMonthInterval
        );
        assert!(table
            .get(OperationId::Divide, TypeId::Int, TypeId::DatetimeInterval)
            .is_none());
        assert!(table
            .get(OperationId::Modulo, TypeId::DatetimeInterval, TypeId::Int)
            .is_none());
    }

    #[test]
    fn month_arithmetic_clamps_to_month_end() {
        let jan31 = Date::from_ymd(2023, 1, 31).unwrap();
        let feb = add_date_months(jan31, YearMonthInterval::from_months(1)).unwrap();
        assert_eq!(feb, Date::from_ymd(2023, 2, 28).unwrap());
        let back = subtract_date_months(feb, YearMonthInterval::from_months(13)).unwrap();
        assert_eq!(back, Date::from_ymd(2022, 1, 28).unwrap());
    }

    #[test]
    fn interval_division_by_integer_zero_faults() {
        assert_eq!(
            divide_interval(DatetimeInterval::from_micros(10), 0i32),
            Err(ExecError::DivisionByZero { operation: "Divide" })
        );
        assert_eq!(
            divide_interval(YearMonthInterval::from_months(12), 4i64).unwrap(),
            YearMonthInterval::from_months(3)
        );
        assert_eq!(
            scale_interval(DatetimeInterval::from_micros(10), 1.5f64).unwrap(),
            DatetimeInterval::from_micros(15)
        );
    }
}
