//! `Substring(string; start[, length])` over Char and VarChar inputs.
//!
//! `start` is 1-based. The result is always a Char whose declared length is the longest
//! substring the input type could yield, so every output slot has the same width.

use quarry_types::{ScalarLiteral, TypeDescriptor, TypeId, TypedValue};

use crate::error::{OperationError, OperationResult};
use crate::operation::{
    describe_arguments, ensure_applicable, Operation, OperationId, OperationSignature,
    OperationSpec,
};
use crate::operator::{make_substring_operator, UncheckedOperator};

const START_MUST_BE_POSITIVE: &str = "The start position must be greater than 0";
const LENGTH_MUST_BE_POSITIVE: &str = "The substring length must be greater than 0";

pub struct SubstringOperation;

/// Static arguments after validation.
struct SubstringWindow {
    input: &'static TypeDescriptor,
    /// 0-based byte offset.
    start: usize,
    /// `usize::MAX` when the length was omitted.
    length: usize,
}

impl SubstringWindow {
    fn result_type(&self) -> &'static TypeDescriptor {
        let available = self.input.maximum_byte_length().saturating_sub(self.start);
        TypeDescriptor::char(available.min(self.length), self.input.is_nullable())
    }
}

impl SubstringOperation {
    fn reject(message: &str) -> OperationError {
        OperationError::Rejected {
            operation: OperationId::Substring.name(),
            message: message.to_string(),
        }
    }

    fn window(
        arguments: &[&'static TypeDescriptor],
        static_arguments: &[ScalarLiteral],
    ) -> OperationResult<SubstringWindow> {
        let no_match = || OperationError::NoMatchingSignature {
            operation: OperationId::Substring.name(),
            arguments: describe_arguments(arguments, static_arguments),
        };
        let &[input] = arguments else {
            return Err(no_match());
        };
        if !matches!(input.type_id(), TypeId::Char | TypeId::VarChar) {
            return Err(no_match());
        }
        let (start, length) = match static_arguments {
            [start] => (start, None),
            [start, length] => (start, Some(length)),
            _ => return Err(no_match()),
        };

        let start = match static_position(start).ok_or_else(no_match)?? {
            Some(start) if start > 0 => start,
            _ => return Err(Self::reject(START_MUST_BE_POSITIVE)),
        };
        let length = match length {
            None => usize::MAX,
            Some(length) => match static_position(length).ok_or_else(no_match)?? {
                Some(length) if length > 0 => usize::try_from(length).unwrap_or(usize::MAX),
                _ => return Err(Self::reject(LENGTH_MUST_BE_POSITIVE)),
            },
        };

        Ok(SubstringWindow {
            input,
            start: usize::try_from(start - 1).unwrap_or(usize::MAX),
            length,
        })
    }
}

/// Decode an Int or Long static argument; `None` inside is a NULL literal. The outer `None`
/// means the literal is some other kind.
fn static_position(literal: &ScalarLiteral) -> Option<OperationResult<Option<i64>>> {
    if !matches!(literal.type_id, TypeId::Int | TypeId::Long) {
        return None;
    }
    let value = match literal.to_value() {
        Ok(value) => value,
        Err(err) => return Some(Err(err.into())),
    };
    Some(Ok(match value {
        TypedValue::Int(v) => Some(i64::from(v)),
        TypedValue::Long(v) => Some(v),
        _ => None,
    }))
}

impl Operation for SubstringOperation {
    fn id(&self) -> OperationId {
        OperationId::Substring
    }

    fn signatures(&self) -> Vec<OperationSignature> {
        [TypeId::Char, TypeId::VarChar]
            .into_iter()
            .flat_map(|input| {
                [
                    OperationSignature::new(
                        OperationId::Substring,
                        vec![input],
                        vec![TypeId::Long, TypeId::Long],
                    ),
                    OperationSignature::new(
                        OperationId::Substring,
                        vec![input],
                        vec![TypeId::Long],
                    ),
                ]
            })
            .collect()
    }

    fn can_apply_to(
        &self,
        arguments: &[&'static TypeDescriptor],
        static_arguments: &[ScalarLiteral],
    ) -> OperationResult<()> {
        Self::window(arguments, static_arguments).map(|_| ())
    }

    fn result_type(
        &self,
        arguments: &[&'static TypeDescriptor],
        static_arguments: &[ScalarLiteral],
    ) -> OperationResult<&'static TypeDescriptor> {
        ensure_applicable(self, arguments, static_arguments)?;
        Ok(Self::window(arguments, static_arguments)?.result_type())
    }

    fn make_operator(
        &self,
        arguments: &[&'static TypeDescriptor],
        static_arguments: &[ScalarLiteral],
    ) -> OperationResult<UncheckedOperator> {
        ensure_applicable(self, arguments, static_arguments)?;
        let window = Self::window(arguments, static_arguments)?;
        let result = window.result_type();
        log::trace!(
            "binding Substring for ({}) at offset {} -> {result}",
            window.input,
            window.start
        );
        Ok(UncheckedOperator::Unary(make_substring_operator(
            window.start,
            window.input,
            result,
        )))
    }
}

inventory::submit! {
    OperationSpec {
        operation: &SubstringOperation,
    }
}
