//! Common test utilities and helpers

#![allow(dead_code)] // Test utilities may not all be used in every test file

pub mod builders;
pub mod mock_helpers;

use framestream::data::LinearTransformation;
use std::time::Duration;

/// Upper bound for waiting on a background producer
pub fn test_timeout() -> Duration {
    Duration::from_secs(5)
}

/// Assert two transforms are approximately equal
pub fn assert_transform_eq(a: &LinearTransformation, b: &LinearTransformation, epsilon: f32) {
    assert!(
        a.abs_diff_eq(b, epsilon),
        "Expected {:?} to be approximately equal to {:?} (epsilon: {})",
        a.matrix(),
        b.matrix(),
        epsilon
    );
}
