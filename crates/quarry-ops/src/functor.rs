//! Per-row transformations bound to concrete native types.

use std::marker::PhantomData;

use quarry_types::{NativeValue, NumericNative};

use crate::error::{ExecError, ExecResult};
use crate::operation::OperationId;

pub trait UnaryFunctor: Clone + Send + Sync + 'static {
    type Input: NativeValue;
    type Output: NativeValue;

    fn name(&self) -> &'static str;

    fn apply(&self, input: Self::Input) -> ExecResult<Self::Output>;
}

pub trait BinaryFunctor: Clone + Send + Sync + 'static {
    type Left: NativeValue;
    type Right: NativeValue;
    type Output: NativeValue;

    fn name(&self) -> &'static str;

    fn apply(&self, left: Self::Left, right: Self::Right) -> ExecResult<Self::Output>;
}

/// A numeric operator applied to two values already converted to a common native.
pub trait ArithmeticKernel: Send + Sync + 'static {
    const OPERATION: OperationId;

    /// `None` signals an integer division or remainder by zero.
    fn apply<N: NumericNative>(left: N, right: N) -> Option<N>;
}

pub struct AddKernel;
pub struct SubtractKernel;
pub struct MultiplyKernel;
pub struct DivideKernel;
pub struct ModuloKernel;

impl ArithmeticKernel for AddKernel {
    const OPERATION: OperationId = OperationId::Add;

    #[inline]
    fn apply<N: NumericNative>(left: N, right: N) -> Option<N> {
        Some(left.add_wrapping(right))
    }
}

impl ArithmeticKernel for SubtractKernel {
    const OPERATION: OperationId = OperationId::Subtract;

    #[inline]
    fn apply<N: NumericNative>(left: N, right: N) -> Option<N> {
        Some(left.sub_wrapping(right))
    }
}

impl ArithmeticKernel for MultiplyKernel {
    const OPERATION: OperationId = OperationId::Multiply;

    #[inline]
    fn apply<N: NumericNative>(left: N, right: N) -> Option<N> {
        Some(left.mul_wrapping(right))
    }
}

impl ArithmeticKernel for DivideKernel {
    const OPERATION: OperationId = OperationId::Divide;

    #[inline]
    fn apply<N: NumericNative>(left: N, right: N) -> Option<N> {
        left.div_checked(right)
    }
}

impl ArithmeticKernel for ModuloKernel {
    const OPERATION: OperationId = OperationId::Modulo;

    #[inline]
    fn apply<N: NumericNative>(left: N, right: N) -> Option<N> {
        left.rem_checked(right)
    }
}

/// `K` over `(L, R)`, computed in the unified result native `O`.
pub struct NumericBinaryFunctor<K, L, R, O>(PhantomData<fn() -> (K, L, R, O)>);

impl<K, L, R, O> NumericBinaryFunctor<K, L, R, O> {
    pub fn new() -> Self {
        Self(PhantomData)
    }
}

impl<K, L, R, O> Default for NumericBinaryFunctor<K, L, R, O> {
    fn default() -> Self {
        Self::new()
    }
}

impl<K, L, R, O> Clone for NumericBinaryFunctor<K, L, R, O> {
    fn clone(&self) -> Self {
        Self::new()
    }
}

impl<K, L, R, O> BinaryFunctor for NumericBinaryFunctor<K, L, R, O>
where
    K: ArithmeticKernel,
    L: NumericNative,
    R: NumericNative,
    O: NumericNative,
{
    type Left = L;
    type Right = R;
    type Output = O;

    fn name(&self) -> &'static str {
        K::OPERATION.name()
    }

    #[inline]
    fn apply(&self, left: L, right: R) -> ExecResult<O> {
        K::apply(O::cast_from(left), O::cast_from(right)).ok_or(ExecError::DivisionByZero {
            operation: K::OPERATION.name(),
        })
    }
}

/// A functor backed by a plain function.
pub struct FnBinaryFunctor<L, R, O> {
    name: &'static str,
    f: fn(L, R) -> ExecResult<O>,
}

impl<L, R, O> FnBinaryFunctor<L, R, O> {
    pub const fn new(name: &'static str, f: fn(L, R) -> ExecResult<O>) -> Self {
        Self { name, f }
    }
}

impl<L, R, O> Clone for FnBinaryFunctor<L, R, O> {
    fn clone(&self) -> Self {
        Self {
            name: self.name,
            f: self.f,
        }
    }
}

impl<L: NativeValue, R: NativeValue, O: NativeValue> BinaryFunctor for FnBinaryFunctor<L, R, O> {
    type Left = L;
    type Right = R;
    type Output = O;

    fn name(&self) -> &'static str {
        self.name
    }

    #[inline]
    fn apply(&self, left: L, right: R) -> ExecResult<O> {
        (self.f)(left, right)
    }
}

/// An infallible unary functor backed by a plain function.
pub struct FnUnaryFunctor<I, O> {
    name: &'static str,
    f: fn(I) -> O,
}

impl<I, O> FnUnaryFunctor<I, O> {
    pub const fn new(name: &'static str, f: fn(I) -> O) -> Self {
        Self { name, f }
    }
}

impl<I, O> Clone for FnUnaryFunctor<I, O> {
    fn clone(&self) -> Self {
        Self {
            name: self.name,
            f: self.f,
        }
    }
}

impl<I: NativeValue, O: NativeValue> UnaryFunctor for FnUnaryFunctor<I, O> {
    type Input = I;
    type Output = O;

    fn name(&self) -> &'static str {
        self.name
    }

    #[inline]
    fn apply(&self, input: I) -> ExecResult<O> {
        Ok((self.f)(input))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn numeric_functor_computes_in_the_result_type() {
        let add = NumericBinaryFunctor::<AddKernel, i32, f32, f32>::new();
        assert_eq!(add.apply(2, 0.5).unwrap(), 2.5f32);

        let mul = NumericBinaryFunctor::<MultiplyKernel, i32, i32, i32>::new();
        assert_eq!(mul.apply(i32::MAX, 2).unwrap(), -2);
        assert_eq!(mul.name(), "Multiply");
    }

    #[test]
    fn integer_division_by_zero_faults() {
        let div = NumericBinaryFunctor::<DivideKernel, i64, i32, i64>::new();
        assert_eq!(
            div.apply(1, 0),
            Err(ExecError::DivisionByZero { operation: "Divide" })
        );
        let rem = NumericBinaryFunctor::<ModuloKernel, i32, i32, i32>::new();
        assert_eq!(rem.apply(7, -3).unwrap(), 1);

        let fdiv = NumericBinaryFunctor::<DivideKernel, f64, i32, f64>::new();
        assert!(fdiv.apply(1.0, 0).unwrap().is_infinite());
    }
}
