//! Proptest helpers for chunking properties.

use proptest::{
    collection::vec,
    prelude::{Strategy, any},
    sample::Index,
    test_runner::{Config as ProptestConfig, RngAlgorithm, TestRng, TestRunner},
};

/// Test runner with a fixed seed so failures reproduce across runs.
#[must_use]
pub fn deterministic_runner(cases: u32) -> TestRunner {
    let config = ProptestConfig {
        cases,
        ..ProptestConfig::default()
    };
    let rng = TestRng::deterministic_rng(RngAlgorithm::ChaCha);
    TestRunner::new_with_rng(config, rng)
}

/// Up to `max_splits` arbitrary split positions.
pub fn split_points_strategy(max_splits: usize) -> impl Strategy<Value = Vec<Index>> {
    vec(any::<Index>(), 0..=max_splits)
}

/// Cut `body` at the given positions. Duplicate and boundary positions are
/// ignored, so every chunk is non-empty.
#[must_use]
pub fn chunked(body: &[u8], splits: &[Index]) -> Vec<Vec<u8>> {
    if body.is_empty() {
        return Vec::new();
    }
    let mut cuts: Vec<usize> = splits.iter().map(|index| index.index(body.len())).collect();
    cuts.retain(|&cut| cut > 0);
    cuts.sort_unstable();
    cuts.dedup();
    cuts.push(body.len());

    let mut start = 0;
    cuts.into_iter()
        .map(|end| {
            let chunk = body[start..end].to_vec();
            start = end;
            chunk
        })
        .collect()
}
