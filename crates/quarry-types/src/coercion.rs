//! Safe-coercion lattice derived from a short list of direct promotion edges.

use std::collections::{HashMap, HashSet};
use std::hash::Hash;
use std::sync::OnceLock;

use crate::descriptor::TypeDescriptor;
use crate::type_id::{SuperTypeId, NUMERIC_TYPE_IDS};
use crate::TypeId;

/// Reflexive transitive closure of a directed edge list.
#[derive(Debug, Clone)]
pub struct TransitiveClosure<T> {
    pairs: HashSet<(T, T)>,
}

impl<T: Copy + Eq + Hash> TransitiveClosure<T> {
    /// Semi-naive fixpoint: every round joins only the pairs derived in the previous round with
    /// the direct edges, and stops once a round produces nothing new.
    ///
    /// Reflexive pairs are seeded for every node named by an edge rather than derived, so a
    /// round trip `a -> b -> a` never stands in for `a -> a`.
    pub fn from_edges(edges: &[(T, T)]) -> Self {
        let mut successors: HashMap<T, Vec<T>> = HashMap::new();
        let mut pairs = HashSet::new();
        for &(source, target) in edges {
            successors.entry(source).or_default().push(target);
            pairs.insert((source, source));
            pairs.insert((target, target));
        }

        let mut frontier: Vec<(T, T)> = edges
            .iter()
            .copied()
            .filter(|edge| pairs.insert(*edge))
            .collect();
        while !frontier.is_empty() {
            let mut next = Vec::new();
            for &(from, via) in &frontier {
                let Some(targets) = successors.get(&via) else {
                    continue;
                };
                for &to in targets {
                    if pairs.insert((from, to)) {
                        next.push((from, to));
                    }
                }
            }
            frontier = next;
        }
        Self { pairs }
    }

    #[inline]
    pub fn contains(&self, from: T, to: T) -> bool {
        self.pairs.contains(&(from, to))
    }

    pub fn len(&self) -> usize {
        self.pairs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pairs.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (T, T)> + '_ {
        self.pairs.iter().copied()
    }
}

/// Nodes of the numeric lattice. `Bool` takes part in promotion but is not a [`TypeId`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum NumericKind {
    Bool,
    Int,
    Long,
    Float,
    Double,
}

impl NumericKind {
    pub fn from_type_id(type_id: TypeId) -> Option<Self> {
        match type_id {
            TypeId::Int => Some(NumericKind::Int),
            TypeId::Long => Some(NumericKind::Long),
            TypeId::Float => Some(NumericKind::Float),
            TypeId::Double => Some(NumericKind::Double),
            _ => None,
        }
    }
}

/// Direct lossless promotions. Everything else in the lattice is derived.
pub const SAFE_NUMERIC_COERCIONS: [(NumericKind, NumericKind); 5] = [
    (NumericKind::Bool, NumericKind::Int),
    (NumericKind::Int, NumericKind::Float),
    (NumericKind::Int, NumericKind::Long),
    (NumericKind::Float, NumericKind::Double),
    (NumericKind::Long, NumericKind::Double),
];

pub fn numeric_lattice() -> &'static TransitiveClosure<NumericKind> {
    static LATTICE: OnceLock<TransitiveClosure<NumericKind>> = OnceLock::new();
    LATTICE.get_or_init(|| {
        let closure = TransitiveClosure::from_edges(&SAFE_NUMERIC_COERCIONS);
        log::debug!(
            "numeric coercion lattice: {} direct edges, {} derived pairs",
            SAFE_NUMERIC_COERCIONS.len(),
            closure.len()
        );
        closure
    })
}

/// Kind-level safe coercion, ignoring nullability and string lengths.
pub fn is_safely_coercible_from(source: TypeId, target: TypeId) -> bool {
    if source == target || source == TypeId::Null {
        return true;
    }
    match (NumericKind::from_type_id(source), NumericKind::from_type_id(target)) {
        (Some(from), Some(to)) => numeric_lattice().contains(from, to),
        _ => {
            source.super_type() == SuperTypeId::AsciiString
                && target.super_type() == SuperTypeId::AsciiString
        }
    }
}

/// Kind-level coercion allowing lossy conversions within a super-category.
pub fn is_coercible_from(source: TypeId, target: TypeId) -> bool {
    source == target
        || source == TypeId::Null
        || (source.super_type() == target.super_type() && source.super_type() != SuperTypeId::Other)
}

/// The smallest numeric kind both operands promote to safely.
///
/// `None` when either side is not numeric. `Long` and `Float` meet at `Double`.
pub fn least_common_supertype(a: TypeId, b: TypeId) -> Option<TypeId> {
    let candidates: Vec<TypeId> = NUMERIC_TYPE_IDS
        .iter()
        .copied()
        .filter(|target| {
            a.is_numeric()
                && b.is_numeric()
                && is_safely_coercible_from(a, *target)
                && is_safely_coercible_from(b, *target)
        })
        .collect();
    candidates.iter().copied().find(|least| {
        candidates
            .iter()
            .all(|other| is_safely_coercible_from(*least, *other))
    })
}

fn null_coercible(source: &TypeDescriptor, target: &TypeDescriptor) -> bool {
    if source.type_id() == TypeId::Null {
        return target.is_nullable();
    }
    !source.is_nullable() || target.is_nullable()
}

fn lengths_fit(source: &TypeDescriptor, target: &TypeDescriptor) -> bool {
    match (source.length(), target.length()) {
        (Some(from), Some(to)) => from <= to,
        _ => true,
    }
}

impl TypeDescriptor {
    /// Lossless coercion from `source` into this type, including the null check.
    pub fn is_safely_coercible_from(&self, source: &TypeDescriptor) -> bool {
        null_coercible(source, self)
            && is_safely_coercible_from(source.type_id(), self.type_id())
            && lengths_fit(source, self)
    }

    /// Possibly lossy coercion from `source` into this type, including the null check.
    pub fn is_coercible_from(&self, source: &TypeDescriptor) -> bool {
        null_coercible(source, self) && self.is_coercible_from_non_null(source)
    }

    /// Like [`Self::is_coercible_from`] for a source the caller has proven holds no NULLs.
    pub fn is_coercible_from_non_null(&self, source: &TypeDescriptor) -> bool {
        if source.type_id() == TypeId::Null {
            return self.is_nullable();
        }
        is_coercible_from(source.type_id(), self.type_id())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use proptest::prelude::*;

    fn naive_closure(nodes: u8, edges: &[(u8, u8)]) -> HashSet<(u8, u8)> {
        let n = usize::from(nodes);
        let mut reach = vec![vec![false; n]; n];
        let mut present = vec![false; n];
        for &(a, b) in edges {
            reach[usize::from(a)][usize::from(b)] = true;
            present[usize::from(a)] = true;
            present[usize::from(b)] = true;
        }
        for (i, row) in reach.iter_mut().enumerate() {
            row[i] = present[i];
        }
        for k in 0..n {
            for i in 0..n {
                for j in 0..n {
                    if reach[i][k] && reach[k][j] {
                        reach[i][j] = true;
                    }
                }
            }
        }
        let mut pairs = HashSet::new();
        for i in 0..n {
            for j in 0..n {
                if reach[i][j] {
                    pairs.insert((i as u8, j as u8));
                }
            }
        }
        pairs
    }

    proptest! {
        #[test]
        fn semi_naive_matches_floyd_warshall(edges in prop::collection::vec((0u8..8, 0u8..8), 0..20)) {
            let closure = TransitiveClosure::from_edges(&edges);
            let expected = naive_closure(8, &edges);
            let actual: HashSet<(u8, u8)> = closure.iter().collect();
            prop_assert_eq!(actual, expected);
        }
    }

    #[test]
    fn lattice_is_reflexive_and_transitive() {
        let lattice = numeric_lattice();
        let kinds = [
            NumericKind::Bool,
            NumericKind::Int,
            NumericKind::Long,
            NumericKind::Float,
            NumericKind::Double,
        ];
        for a in kinds {
            assert!(lattice.contains(a, a));
            for b in kinds {
                for c in kinds {
                    if lattice.contains(a, b) && lattice.contains(b, c) {
                        assert!(lattice.contains(a, c), "{a:?} -> {b:?} -> {c:?}");
                    }
                }
            }
        }
        assert!(lattice.contains(NumericKind::Bool, NumericKind::Double));
        assert!(!lattice.contains(NumericKind::Long, NumericKind::Float));
        assert!(!lattice.contains(NumericKind::Double, NumericKind::Int));
    }

    #[test]
    fn self_loops_do_not_add_pairs() {
        let closure = TransitiveClosure::from_edges(&[(1u8, 1u8), (1, 2)]);
        let mut pairs: Vec<_> = closure.iter().collect();
        pairs.sort_unstable();
        assert_eq!(pairs, vec![(1, 1), (1, 2), (2, 2)]);
    }

    #[test]
    fn least_common_supertype_follows_promotion() {
        use TypeId::*;
        assert_eq!(least_common_supertype(Int, Long), Some(Long));
        assert_eq!(least_common_supertype(Int, Float), Some(Float));
        assert_eq!(least_common_supertype(Float, Double), Some(Double));
        assert_eq!(least_common_supertype(Long, Float), Some(Double));
        assert_eq!(least_common_supertype(Int, Int), Some(Int));
        assert_eq!(least_common_supertype(Int, Date), None);
    }

    #[test]
    fn null_coercibility() {
        let int = TypeDescriptor::fixed(TypeId::Int, false);
        let long = TypeDescriptor::fixed(TypeId::Long, false);
        assert!(long.is_safely_coercible_from(int));
        assert!(!long.is_safely_coercible_from(int.nullable_version()));
        assert!(long.nullable_version().is_safely_coercible_from(int.nullable_version()));
        assert!(!long.is_coercible_from(int.nullable_version()));
        assert!(long.is_coercible_from_non_null(int.nullable_version()));

        let null = TypeDescriptor::null();
        assert!(int.nullable_version().is_safely_coercible_from(null));
        assert!(!int.is_coercible_from(null));
        assert!(!int.is_coercible_from_non_null(null));
    }

    #[test]
    fn lossy_numeric_and_string_rules() {
        let int = TypeDescriptor::fixed(TypeId::Int, false);
        let double = TypeDescriptor::fixed(TypeId::Double, false);
        assert!(!int.is_safely_coercible_from(double));
        assert!(int.is_coercible_from(double));

        let short = TypeDescriptor::varchar(4, false);
        let long = TypeDescriptor::char(10, false);
        assert!(long.is_safely_coercible_from(short));
        assert!(!short.is_safely_coercible_from(long));
        assert!(short.is_coercible_from(long));

        let date = TypeDescriptor::fixed(TypeId::Date, false);
        assert!(!date.is_coercible_from(int));
        assert!(date.is_safely_coercible_from(date));
    }
}
