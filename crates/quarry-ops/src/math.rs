//! Unary numeric functions: Negate, Abs, Sqrt, Exp, Log, Ceil, Floor and Round.

use std::sync::{Arc, OnceLock};

use ahash::AHashMap;
use quarry_types::dispatch::{invoke_on_numeric_type_id, NumericVisitor};
use quarry_types::{
    DatetimeInterval, NativeValue, NumericNative, ScalarLiteral, TypeDescriptor, TypeId,
    YearMonthInterval, NUMERIC_TYPE_IDS,
};

use crate::error::{OperationError, OperationResult};
use crate::functor::{FnUnaryFunctor, UnaryFunctor};
use crate::operation::{
    describe_arguments, ensure_applicable, Operation, OperationId, OperationSignature,
    OperationSpec,
};
use crate::operator::{make_unary_operator, UncheckedOperator, UncheckedUnaryOperator};

type UnaryFactory =
    Arc<dyn Fn(bool, &'static TypeDescriptor) -> Arc<dyn UncheckedUnaryOperator> + Send + Sync>;

struct UnaryFunctorEntry {
    result: TypeId,
    factory: UnaryFactory,
}

#[derive(Default)]
struct UnaryFunctorTable {
    entries: AHashMap<(OperationId, TypeId), UnaryFunctorEntry>,
}

impl UnaryFunctorTable {
    fn register<F: UnaryFunctor>(&mut self, operation: OperationId, functor: F) {
        let entry = UnaryFunctorEntry {
            result: F::Output::TYPE_ID,
            factory: Arc::new(move |input_nullable, result| {
                make_unary_operator(functor.clone(), input_nullable, result)
            }),
        };
        self.entries.insert((operation, F::Input::TYPE_ID), entry);
    }
}

fn unary_functors() -> &'static UnaryFunctorTable {
    static TABLE: OnceLock<UnaryFunctorTable> = OnceLock::new();
    TABLE.get_or_init(|| {
        let mut table = UnaryFunctorTable::default();
        for numeric in NUMERIC_TYPE_IDS {
            invoke_on_numeric_type_id(
                numeric,
                SignStage { table: &mut table },
            );
        }
        table.register(
            OperationId::Negate,
            FnUnaryFunctor::<DatetimeInterval, DatetimeInterval>::new("Negate", |interval| {
                DatetimeInterval::from_micros(interval.micros().wrapping_neg())
            }),
        );
        table.register(
            OperationId::Negate,
            FnUnaryFunctor::<YearMonthInterval, YearMonthInterval>::new("Negate", |interval| {
                YearMonthInterval::from_months(interval.months().wrapping_neg())
            }),
        );
        register_float_functions(&mut table);
        log::debug!("registered {} unary math functors", table.entries.len());
        table
    })
}

/// Abs and Negate over every numeric kind.
struct SignStage<'t> {
    table: &'t mut UnaryFunctorTable,
}

impl NumericVisitor for SignStage<'_> {
    type Output = ();

    fn visit<N: NumericNative>(self) {
        self.table.register(
            OperationId::Abs,
            FnUnaryFunctor::<N, N>::new("Abs", N::abs_wrapping),
        );
        self.table.register(
            OperationId::Negate,
            FnUnaryFunctor::<N, N>::new("Negate", N::neg_wrapping),
        );
    }
}

macro_rules! register_float_functions {
    ($table:expr, $float:ty) => {{
        $table.register(
            OperationId::Sqrt,
            FnUnaryFunctor::<$float, $float>::new("Sqrt", <$float>::sqrt),
        );
        $table.register(
            OperationId::Exp,
            FnUnaryFunctor::<$float, $float>::new("Exp", <$float>::exp),
        );
        $table.register(
            OperationId::Log,
            FnUnaryFunctor::<$float, $float>::new("Log", <$float>::ln),
        );
        $table.register(
            OperationId::Ceil,
            FnUnaryFunctor::<$float, $float>::new("Ceil", <$float>::ceil),
        );
        $table.register(
            OperationId::Floor,
            FnUnaryFunctor::<$float, $float>::new("Floor", <$float>::floor),
        );
        // Half away from zero; saturates at the Long bounds.
        $table.register(
            OperationId::Round,
            FnUnaryFunctor::<$float, i64>::new("Round", |value| value.round() as i64),
        );
    }};
}

fn register_float_functions(table: &mut UnaryFunctorTable) {
    register_float_functions!(table, f32);
    register_float_functions!(table, f64);
}

/// A single-operand math function.
pub struct MathOperation {
    id: OperationId,
}

impl MathOperation {
    fn operand(
        &self,
        arguments: &[&'static TypeDescriptor],
        static_arguments: &[ScalarLiteral],
    ) -> OperationResult<(&'static TypeDescriptor, &'static UnaryFunctorEntry)> {
        let no_match = || OperationError::NoMatchingSignature {
            operation: self.id.name(),
            arguments: describe_arguments(arguments, static_arguments),
        };
        let &[input] = arguments else {
            return Err(no_match());
        };
        if !static_arguments.is_empty() {
            return Err(no_match());
        }
        let entry = unary_functors()
            .entries
            .get(&(self.id, input.type_id()))
            .ok_or_else(no_match)?;
        Ok((input, entry))
    }
}

impl Operation for MathOperation {
    fn id(&self) -> OperationId {
        self.id
    }

    fn signatures(&self) -> Vec<OperationSignature> {
        let mut inputs: Vec<TypeId> = unary_functors()
            .entries
            .keys()
            .filter(|(op, _)| *op == self.id)
            .map(|(_, input)| *input)
            .collect();
        inputs.sort_unstable();
        inputs
            .into_iter()
            .map(|input| OperationSignature::new(self.id, vec![input], Vec::new()))
            .collect()
    }

    fn can_apply_to(
        &self,
        arguments: &[&'static TypeDescriptor],
        static_arguments: &[ScalarLiteral],
    ) -> OperationResult<()> {
        self.operand(arguments, static_arguments).map(|_| ())
    }

    fn result_type(
        &self,
        arguments: &[&'static TypeDescriptor],
        static_arguments: &[ScalarLiteral],
    ) -> OperationResult<&'static TypeDescriptor> {
        ensure_applicable(self, arguments, static_arguments)?;
        let (input, entry) = self.operand(arguments, static_arguments)?;
        Ok(TypeDescriptor::fixed(entry.result, input.is_nullable()))
    }

    fn make_operator(
        &self,
        arguments: &[&'static TypeDescriptor],
        static_arguments: &[ScalarLiteral],
    ) -> OperationResult<UncheckedOperator> {
        let result = self.result_type(arguments, static_arguments)?;
        let (input, entry) = self.operand(arguments, static_arguments)?;
        log::trace!("binding {} for ({input}) -> {result}", self.id);
        Ok(UncheckedOperator::Unary((entry.factory)(
            input.is_nullable(),
            result,
        )))
    }
}

inventory::submit! {
    OperationSpec {
        operation: &MathOperation { id: OperationId::Negate },
    }
}

inventory::submit! {
    OperationSpec {
        operation: &MathOperation { id: OperationId::Abs },
    }
}

inventory::submit! {
    OperationSpec {
        operation: &MathOperation { id: OperationId::Sqrt },
    }
}

inventory::submit! {
    OperationSpec {
        operation: &MathOperation { id: OperationId::Exp },
    }
}

inventory::submit! {
    OperationSpec {
        operation: &MathOperation { id: OperationId::Log },
    }
}

inventory::submit! {
    OperationSpec {
        operation: &MathOperation { id: OperationId::Ceil },
    }
}

inventory::submit! {
    OperationSpec {
        operation: &MathOperation { id: OperationId::Floor },
    }
}

inventory::submit! {
    OperationSpec {
        operation: &MathOperation { id: OperationId::Round },
    }
}
