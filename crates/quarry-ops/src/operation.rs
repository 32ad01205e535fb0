use std::fmt;
use std::sync::OnceLock;

use ahash::AHashMap;
use quarry_types::{ScalarLiteral, TypeDescriptor, TypeId};

use crate::error::{OperationError, OperationResult};
use crate::operator::UncheckedOperator;

/// Every operation the catalog knows about.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum OperationId {
    Add,
    Subtract,
    Multiply,
    Divide,
    Modulo,
    Negate,
    Abs,
    Sqrt,
    Exp,
    Log,
    Ceil,
    Floor,
    Round,
    Substring,
}

impl OperationId {
    pub const fn name(self) -> &'static str {
        match self {
            OperationId::Add => "Add",
            OperationId::Subtract => "Subtract",
            OperationId::Multiply => "Multiply",
            OperationId::Divide => "Divide",
            OperationId::Modulo => "Modulo",
            OperationId::Negate => "Negate",
            OperationId::Abs => "Abs",
            OperationId::Sqrt => "Sqrt",
            OperationId::Exp => "Exp",
            OperationId::Log => "Log",
            OperationId::Ceil => "Ceil",
            OperationId::Floor => "Floor",
            OperationId::Round => "Round",
            OperationId::Substring => "Substring",
        }
    }

    pub const fn short_name(self) -> &'static str {
        match self {
            OperationId::Add => "+",
            OperationId::Subtract => "-",
            OperationId::Multiply => "*",
            OperationId::Divide => "/",
            OperationId::Modulo => "%",
            OperationId::Negate => "neg",
            OperationId::Abs => "abs",
            OperationId::Sqrt => "sqrt",
            OperationId::Exp => "exp",
            OperationId::Log => "log",
            OperationId::Ceil => "ceil",
            OperationId::Floor => "floor",
            OperationId::Round => "round",
            OperationId::Substring => "substr",
        }
    }
}

impl fmt::Display for OperationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// One accepted combination of operand kinds and static-argument kinds.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct OperationSignature {
    pub operation: OperationId,
    pub argument_type_ids: Vec<TypeId>,
    pub static_argument_type_ids: Vec<TypeId>,
}

impl OperationSignature {
    pub fn new(
        operation: OperationId,
        argument_type_ids: Vec<TypeId>,
        static_argument_type_ids: Vec<TypeId>,
    ) -> Self {
        Self {
            operation,
            argument_type_ids,
            static_argument_type_ids,
        }
    }
}

impl fmt::Display for OperationSignature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}(", self.operation)?;
        for (idx, type_id) in self.argument_type_ids.iter().enumerate() {
            if idx > 0 {
                f.write_str(", ")?;
            }
            write!(f, "{type_id}")?;
        }
        if !self.static_argument_type_ids.is_empty() {
            f.write_str("; ")?;
            for (idx, type_id) in self.static_argument_type_ids.iter().enumerate() {
                if idx > 0 {
                    f.write_str(", ")?;
                }
                write!(f, "{type_id}")?;
            }
        }
        f.write_str(")")
    }
}

/// An operation that can be validated and bound against concrete operand types.
///
/// `arguments` are the descriptors of the row-varying operands; `static_arguments` are
/// constants fixed for the whole expression.
pub trait Operation: Send + Sync + 'static {
    fn id(&self) -> OperationId;

    fn name(&self) -> &'static str {
        self.id().name()
    }

    fn short_name(&self) -> &'static str {
        self.id().short_name()
    }

    fn signatures(&self) -> Vec<OperationSignature>;

    /// `Ok` when the request binds; otherwise the reason it is rejected.
    fn can_apply_to(
        &self,
        arguments: &[&'static TypeDescriptor],
        static_arguments: &[ScalarLiteral],
    ) -> OperationResult<()>;

    /// Result descriptor of a request `can_apply_to` accepts.
    fn result_type(
        &self,
        arguments: &[&'static TypeDescriptor],
        static_arguments: &[ScalarLiteral],
    ) -> OperationResult<&'static TypeDescriptor>;

    /// Bind the static arguments into a reusable operator.
    fn make_operator(
        &self,
        arguments: &[&'static TypeDescriptor],
        static_arguments: &[ScalarLiteral],
    ) -> OperationResult<UncheckedOperator>;
}

/// Runs `can_apply_to`, reporting a failure as a contract violation.
pub(crate) fn ensure_applicable(
    operation: &dyn Operation,
    arguments: &[&'static TypeDescriptor],
    static_arguments: &[ScalarLiteral],
) -> OperationResult<()> {
    operation
        .can_apply_to(arguments, static_arguments)
        .map_err(|err| OperationError::Contract {
            operation: operation.name(),
            message: err.message(),
        })
}

pub(crate) fn describe_arguments(
    arguments: &[&'static TypeDescriptor],
    static_arguments: &[ScalarLiteral],
) -> String {
    let mut parts: Vec<String> = arguments.iter().map(|d| d.to_string()).collect();
    parts.extend(
        static_arguments
            .iter()
            .map(|literal| format!("static {}", literal.type_id)),
    );
    parts.join(", ")
}

/// Registration record collected through [`inventory`].
pub struct OperationSpec {
    pub operation: &'static dyn Operation,
}

inventory::collect!(OperationSpec);

/// Iterate all [`OperationSpec`] registrations collected via [`inventory`].
pub fn iter_operation_specs() -> impl Iterator<Item = &'static OperationSpec> {
    inventory::iter::<OperationSpec>.into_iter()
}

fn registry() -> &'static AHashMap<String, &'static dyn Operation> {
    static REGISTRY: OnceLock<AHashMap<String, &'static dyn Operation>> = OnceLock::new();
    REGISTRY.get_or_init(|| {
        let mut map = AHashMap::new();
        for spec in inventory::iter::<OperationSpec> {
            map.insert(spec.operation.name().to_ascii_uppercase(), spec.operation);
            map.insert(
                spec.operation.short_name().to_ascii_uppercase(),
                spec.operation,
            );
        }
        log::debug!("registered {} operation names", map.len());
        map
    })
}

/// Case-insensitive lookup by name (`Add`) or short name (`+`).
pub fn lookup_operation(name: &str) -> Option<&'static dyn Operation> {
    registry().get(&name.trim().to_ascii_uppercase()).copied()
}

pub fn lookup_operation_id(id: OperationId) -> Option<&'static dyn Operation> {
    lookup_operation(id.name())
}
