use pretty_assertions::assert_eq;
use proptest::prelude::*;
use quarry_types::coercion::is_safely_coercible_from;
use quarry_types::{descriptor_for, least_common_supertype, TypeDescriptor, TypeId, NUMERIC_TYPE_IDS};

fn descriptor(type_id: TypeId, nullable: bool, length: usize) -> &'static TypeDescriptor {
    let length = type_id.is_parameterized().then_some(length);
    descriptor_for(type_id, nullable, length).unwrap()
}

fn any_type_id() -> impl Strategy<Value = TypeId> {
    (0usize..quarry_types::NUM_TYPE_IDS).prop_map(|ordinal| TypeId::from_ordinal(ordinal).unwrap())
}

proptest! {
    #[test]
    fn every_descriptor_is_safely_coercible_from_itself(
        type_id in any_type_id(),
        nullable in any::<bool>(),
        length in 0usize..64,
    ) {
        let d = descriptor(type_id, nullable, length);
        prop_assert!(d.is_safely_coercible_from(d));
        prop_assert!(d.is_coercible_from(d));
    }

    #[test]
    fn safe_coercion_is_transitive(a in any_type_id(), b in any_type_id(), c in any_type_id()) {
        if is_safely_coercible_from(a, b) && is_safely_coercible_from(b, c) {
            prop_assert!(is_safely_coercible_from(a, c));
        }
    }

    #[test]
    fn lookups_are_stable(type_id in any_type_id(), nullable in any::<bool>(), length in 0usize..64) {
        let first = descriptor(type_id, nullable, length);
        let second = descriptor(type_id, nullable, length);
        prop_assert!(std::ptr::eq(first, second));
        prop_assert_eq!(first.spec().resolve().unwrap(), second);
    }
}

#[test]
fn numeric_supertype_is_an_upper_bound_and_least() {
    for a in NUMERIC_TYPE_IDS {
        for b in NUMERIC_TYPE_IDS {
            let lub = least_common_supertype(a, b).unwrap();
            assert!(is_safely_coercible_from(a, lub));
            assert!(is_safely_coercible_from(b, lub));
            for other in NUMERIC_TYPE_IDS {
                if is_safely_coercible_from(a, other) && is_safely_coercible_from(b, other) {
                    assert!(is_safely_coercible_from(lub, other), "{a} {b} {lub} {other}");
                }
            }
        }
    }
}

#[test]
fn promotion_table() {
    use TypeId::*;
    let expected = [
        [Int, Long, Float, Double],
        [Long, Long, Double, Double],
        [Float, Double, Float, Double],
        [Double, Double, Double, Double],
    ];
    for (i, a) in NUMERIC_TYPE_IDS.iter().enumerate() {
        for (j, b) in NUMERIC_TYPE_IDS.iter().enumerate() {
            assert_eq!(least_common_supertype(*a, *b), Some(expected[i][j]));
        }
    }
}
