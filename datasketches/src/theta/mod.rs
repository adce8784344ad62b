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

//! Theta sketches: cardinality estimation with mergeable set operations.

mod a_not_b;
mod bit_pack;
mod compact;
mod hash_table;
mod intersection;
mod serialization;
mod sketch;
mod union;
mod view;

pub use a_not_b::{a_not_b, ThetaANotB};
pub use compact::CompactThetaSketch;
pub use intersection::ThetaIntersection;
pub use serialization::DEFAULT_UPDATE_SEED;
pub use sketch::{ThetaSketch, ThetaSketchBuilder, UpdateOutcome};
pub use union::ThetaUnion;
pub use view::ThetaSketchView;

/// `Long.MAX_VALUE`: the `thetaLong` value representing theta = 1.0.
pub(super) const MAX_THETA: u64 = i64::MAX as u64;

pub(super) fn theta_as_f64(theta_long: u64) -> f64 {
    theta_long as f64 / MAX_THETA as f64
}
