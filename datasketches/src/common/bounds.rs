// Licensed to the Apache Software Foundation (ASF) under one
// or more contributor license agreements.  See the NOTICE file
// distributed with this work for additional information
// regarding copyright ownership.  The ASF licenses this file
// to you under the Apache License, Version 2.0 (the
// "License"); you may not use this file except in compliance
// with the License.  You may obtain a copy of the License at
//
//   http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing,
// software distributed under the License is distributed on an
// "AS IS" BASIS, WITHOUT WARRANTIES OR CONDITIONS OF ANY
// KIND, either express or implied.  See the License for the
// specific language governing permissions and limitations
// under the License.

//! Normal-approximation confidence bounds for theta-sketch cardinality estimates.
//!
//! A theta sketch's estimate is `numValidEntries / theta`. Its relative standard
//! error follows the usual Bernoulli-sampling approximation; the bounds widen
//! the estimate by `numStdDev` multiples of that error, the same shape as the
//! ICON/HIP bound functions used elsewhere in this crate's sketch families.

use crate::common::NumStdDev;

/// The point estimate of distinct count given `theta` and the number of valid
/// (non-dirty, below-theta) retained entries.
pub fn estimate(theta: f64, num_valid_entries: u64) -> f64 {
    if theta <= 0.0 {
        return 0.0;
    }
    num_valid_entries as f64 / theta
}

fn relative_standard_error(theta: f64, num_valid_entries: u64) -> f64 {
    if num_valid_entries == 0 || theta <= 0.0 {
        return 0.0;
    }
    ((1.0 / theta - 1.0) / num_valid_entries as f64).sqrt()
}

/// Lower confidence bound, never below the number of entries actually retained.
pub fn lower_bound(num_std_dev: NumStdDev, theta: f64, num_valid_entries: u64) -> f64 {
    if theta >= 1.0 || num_valid_entries == 0 {
        return num_valid_entries as f64;
    }
    let eps = num_std_dev.as_u8() as f64 * relative_standard_error(theta, num_valid_entries);
    let result = estimate(theta, num_valid_entries) / (1.0 + eps);
    result.max(num_valid_entries as f64)
}

/// Upper confidence bound.
pub fn upper_bound(num_std_dev: NumStdDev, theta: f64, num_valid_entries: u64) -> f64 {
    if theta >= 1.0 || num_valid_entries == 0 {
        return num_valid_entries as f64;
    }
    let eps = num_std_dev.as_u8() as f64 * relative_standard_error(theta, num_valid_entries);
    if eps >= 1.0 {
        return f64::INFINITY;
    }
    estimate(theta, num_valid_entries) / (1.0 - eps)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_exact_mode_bounds_equal_count() {
        assert_eq!(lower_bound(NumStdDev::Two, 1.0, 42), 42.0);
        assert_eq!(upper_bound(NumStdDev::Two, 1.0, 42), 42.0);
        assert_eq!(estimate(1.0, 42), 42.0);
    }

    #[test]
    fn test_empty_bounds_are_zero() {
        assert_eq!(lower_bound(NumStdDev::One, 0.1, 0), 0.0);
        assert_eq!(upper_bound(NumStdDev::One, 0.1, 0), 0.0);
    }

    #[test]
    fn test_bounds_bracket_estimate() {
        let theta = 0.01;
        let n = 500;
        let est = estimate(theta, n);
        let lb = lower_bound(NumStdDev::Two, theta, n);
        let ub = upper_bound(NumStdDev::Two, theta, n);
        assert!(lb <= est);
        assert!(ub >= est);
    }

    #[test]
    fn test_wider_interval_for_more_std_dev() {
        let theta = 0.02;
        let n = 200;
        let lb1 = lower_bound(NumStdDev::One, theta, n);
        let lb3 = lower_bound(NumStdDev::Three, theta, n);
        let ub1 = upper_bound(NumStdDev::One, theta, n);
        let ub3 = upper_bound(NumStdDev::Three, theta, n);
        assert!(lb3 <= lb1);
        assert!(ub3 >= ub1);
    }
}
