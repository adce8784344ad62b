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

//! The narrow capability set that set operations need from either an update
//! sketch or a compact sketch, so they can take either without caring which.

/// Anything that can stand in as an input to Union, Intersection, or A-not-B.
///
/// This plays the role a `Sketch` base class would play in an
/// inheritance-based design; here it is a plain trait over two concrete,
/// unrelated types (`ThetaSketch` and `CompactThetaSketch`) rather than a
/// shared supertype, so each keeps its own tagged-variant representation.
pub trait ThetaSketchView {
    fn is_empty(&self) -> bool;
    fn is_ordered(&self) -> bool;
    fn num_retained(&self) -> usize;
    fn theta_long(&self) -> u64;
    fn seed_hash(&self) -> u16;

    /// A fresh, forward-only cursor over the valid hashes (those with
    /// `0 < h < thetaLong`). A new iterator must be created on every call;
    /// none of them may be cached or shared.
    fn iter_hashes(&self) -> Box<dyn Iterator<Item = u64> + '_>;
}
