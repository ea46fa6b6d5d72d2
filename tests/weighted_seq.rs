use pretty_assertions::assert_eq;
use proptest::prelude::*;
use relative_osbtree::search::halve;
use relative_osbtree::weight::Additive;
use relative_osbtree::{Error, Record, WeightedSeq, WeightedValue};

type Seq = WeightedSeq<u32, Additive<u32>>;

fn seq(weights: &[u32]) -> Seq {
    weights.iter().copied().map(WeightedValue::from_weight).collect()
}

fn pairs(seq: &Seq) -> Vec<(u32, u32)> {
    seq.iter().map(|record| (record.value, record.weight)).collect()
}

#[test]
fn dependencies_follow_predecessors() {
    let seq = seq(&[4, 0, 9, 1]);
    let records: Vec<_> = seq.iter().cloned().collect();
    assert_eq!(
        records,
        [
            Record { value: 4, weight: 4, dependency: 0 },
            Record { value: 0, weight: 0, dependency: 4 },
            Record { value: 9, weight: 9, dependency: 4 },
            Record { value: 1, weight: 1, dependency: 13 },
        ]
    );
    assert_eq!(seq.total(), 14);
}

#[test]
fn sorted_insert_keeps_strict_order() {
    // Keep non-zero weights so dependencies strictly increase.
    let mut seq = seq(&[2, 2, 2]);
    let index = seq
        .insert_by(WeightedValue::from_weight(3), |record, _| record.dependency >= 4)
        .unwrap();
    assert_eq!(index, 2);
    assert_eq!(seq[3].dependency, 7);

    let error = seq
        .insert_by(WeightedValue::from_weight(0), |_, _| true)
        .unwrap_err();
    assert_eq!(error, Error::OrderViolation { index: 0 });
    assert_eq!(seq.len(), 4);
}

#[test]
fn sorted_insert_rejects_tie_with_empty_predecessor() {
    let mut seq = seq(&[3, 0, 4]);
    let before = seq.clone();
    let error = seq
        .insert_by(WeightedValue::from_weight(5), |_, index| index >= 2)
        .unwrap_err();
    assert_eq!(error, Error::OrderViolation { index: 2 });
    assert_eq!(seq, before);
}

#[test]
fn split_agrees_with_halve() {
    let weights = [3, 1, 4, 1, 5, 9, 2];
    let mut left = seq(&weights);
    let (right, start) = left.split();
    let (expected_left, expected_right) = halve(&weights);

    assert_eq!(left.iter().map(|r| r.weight).collect::<Vec<_>>(), expected_left);
    assert_eq!(right.iter().map(|r| r.weight).collect::<Vec<_>>(), expected_right);
    assert_eq!(start, expected_left.iter().sum::<u32>());
}

proptest! {
    /// Splitting and concatenating again reproduces the original pairs and dependencies.
    #[test]
    fn split_then_concatenate_round_trips(weights in proptest::collection::vec(0u32..1_000, 2..128)) {
        let original = seq(&weights);
        let mut left = original.clone();
        let (right, start) = left.split();

        prop_assert_eq!(left.len() + right.len(), original.len());
        prop_assert!(!left.is_empty() && !right.is_empty());
        prop_assert_eq!(start, left.total());

        let mut joined = left.clone();
        joined.extend(right.iter().map(|record| WeightedValue::new(record.value, record.weight)));
        prop_assert_eq!(pairs(&joined), pairs(&original));
        prop_assert_eq!(joined, original);
    }

    /// `extract_initial_dependency` undoes a shift of the whole sequence.
    #[test]
    fn rebasing_is_reversible(weights in proptest::collection::vec(-1_000i64..1_000, 1..64), base in -1_000i64..1_000) {
        let original: WeightedSeq<i64, Additive<i64>> = weights.iter().copied().map(WeightedValue::from_weight).collect();
        let mut shifted = original.clone();
        shifted.subtract_all(&-base);

        prop_assert_eq!(shifted.get(0).map(|record| record.dependency), Some(base));
        prop_assert_eq!(shifted.extract_initial_dependency(), base);
        prop_assert_eq!(shifted, original);
    }
}
