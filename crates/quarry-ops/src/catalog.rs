//! Name-based entry point for planners: validation, result types and memoized operators.

use std::sync::atomic::{AtomicBool, Ordering};

use smallvec::SmallVec;

use quarry_types::{ScalarLiteral, TypeDescriptor};

use crate::error::{OperationError, OperationResult};
use crate::operation::{lookup_operation, Operation, OperationId, OperationSignature};
use crate::operator::UncheckedOperator;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct CatalogOptions {
    /// Reuse operators built for an identical (operation, operand types, static arguments)
    /// request.
    pub memoize_operators: bool,
    /// Requests beyond this many distinct keys are built fresh every time.
    pub max_cached_operators: usize,
}

impl Default for CatalogOptions {
    fn default() -> Self {
        Self {
            memoize_operators: true,
            max_cached_operators: 4096,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Hash)]
struct OperatorKey {
    operation: OperationId,
    arguments: SmallVec<[&'static TypeDescriptor; 2]>,
    static_arguments: SmallVec<[ScalarLiteral; 2]>,
}

#[cfg(all(feature = "parallel", not(target_arch = "wasm32")))]
#[derive(Default)]
struct OperatorCache {
    operators: dashmap::DashMap<OperatorKey, UncheckedOperator, ahash::RandomState>,
}

#[cfg(all(feature = "parallel", not(target_arch = "wasm32")))]
impl OperatorCache {
    fn get(&self, key: &OperatorKey) -> Option<UncheckedOperator> {
        self.operators.get(key).map(|entry| entry.value().clone())
    }

    fn insert(&self, key: OperatorKey, operator: UncheckedOperator) {
        self.operators.insert(key, operator);
    }

    fn len(&self) -> usize {
        self.operators.len()
    }

    fn clear(&self) {
        self.operators.clear();
    }
}

#[cfg(not(all(feature = "parallel", not(target_arch = "wasm32"))))]
#[derive(Default)]
struct OperatorCache {
    operators: std::sync::Mutex<ahash::AHashMap<OperatorKey, UncheckedOperator>>,
}

#[cfg(not(all(feature = "parallel", not(target_arch = "wasm32"))))]
impl OperatorCache {
    fn lock(&self) -> std::sync::MutexGuard<'_, ahash::AHashMap<OperatorKey, UncheckedOperator>> {
        self.operators
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
    }

    fn get(&self, key: &OperatorKey) -> Option<UncheckedOperator> {
        self.lock().get(key).cloned()
    }

    fn insert(&self, key: OperatorKey, operator: UncheckedOperator) {
        self.lock().insert(key, operator);
    }

    fn len(&self) -> usize {
        self.lock().len()
    }

    fn clear(&self) {
        self.lock().clear();
    }
}

/// An operator together with the descriptor of the values it produces.
#[derive(Clone, Debug)]
pub struct BoundOperator {
    pub operator: UncheckedOperator,
    pub result_type: &'static TypeDescriptor,
}

/// Resolves operations by name and builds operators for them.
///
/// The cache is purely an optimization: an operator is a function of its bound inputs only, so
/// a cached and a freshly built operator behave identically. The catalog is safe to share
/// between threads.
#[derive(Default)]
pub struct OperationCatalog {
    options: CatalogOptions,
    cache: OperatorCache,
    warned_full: AtomicBool,
}

impl OperationCatalog {
    pub fn new(options: CatalogOptions) -> Self {
        Self {
            options,
            cache: OperatorCache::default(),
            warned_full: AtomicBool::new(false),
        }
    }

    pub fn options(&self) -> CatalogOptions {
        self.options
    }

    pub fn lookup(&self, name: &str) -> OperationResult<&'static dyn Operation> {
        lookup_operation(name).ok_or_else(|| OperationError::UnknownOperation(name.to_string()))
    }

    pub fn signatures(&self, name: &str) -> OperationResult<Vec<OperationSignature>> {
        Ok(self.lookup(name)?.signatures())
    }

    pub fn can_apply_to(
        &self,
        name: &str,
        arguments: &[&'static TypeDescriptor],
        static_arguments: &[ScalarLiteral],
    ) -> OperationResult<()> {
        self.lookup(name)?.can_apply_to(arguments, static_arguments)
    }

    pub fn result_type(
        &self,
        name: &str,
        arguments: &[&'static TypeDescriptor],
        static_arguments: &[ScalarLiteral],
    ) -> OperationResult<&'static TypeDescriptor> {
        self.lookup(name)?.result_type(arguments, static_arguments)
    }

    pub fn make_operator(
        &self,
        name: &str,
        arguments: &[&'static TypeDescriptor],
        static_arguments: &[ScalarLiteral],
    ) -> OperationResult<UncheckedOperator> {
        let operation = self.lookup(name)?;
        self.make_operator_for(operation, arguments, static_arguments)
    }

    /// Validate, compute the result type, and build the operator in one step.
    ///
    /// Unlike calling [`Operation::result_type`] directly, a rejected request surfaces the
    /// validation error itself rather than a contract violation.
    pub fn bind(
        &self,
        name: &str,
        arguments: &[&'static TypeDescriptor],
        static_arguments: &[ScalarLiteral],
    ) -> OperationResult<BoundOperator> {
        let operation = self.lookup(name)?;
        operation.can_apply_to(arguments, static_arguments)?;
        let result_type = operation.result_type(arguments, static_arguments)?;
        let operator = self.make_operator_for(operation, arguments, static_arguments)?;
        Ok(BoundOperator {
            operator,
            result_type,
        })
    }

    pub fn cached_operators(&self) -> usize {
        self.cache.len()
    }

    pub fn clear_cache(&self) {
        self.cache.clear();
        self.warned_full.store(false, Ordering::Relaxed);
    }

    fn make_operator_for(
        &self,
        operation: &'static dyn Operation,
        arguments: &[&'static TypeDescriptor],
        static_arguments: &[ScalarLiteral],
    ) -> OperationResult<UncheckedOperator> {
        if !self.options.memoize_operators {
            return operation.make_operator(arguments, static_arguments);
        }

        let key = OperatorKey {
            operation: operation.id(),
            arguments: arguments.iter().copied().collect(),
            static_arguments: static_arguments.iter().cloned().collect(),
        };
        if let Some(operator) = self.cache.get(&key) {
            return Ok(operator);
        }

        let operator = operation.make_operator(arguments, static_arguments)?;
        if self.cache.len() < self.options.max_cached_operators {
            self.cache.insert(key, operator.clone());
        } else if !self.warned_full.swap(true, Ordering::Relaxed) {
            log::warn!(
                "operator cache is full ({} entries); further operators are not memoized",
                self.options.max_cached_operators
            );
        }
        Ok(operator)
    }
}
