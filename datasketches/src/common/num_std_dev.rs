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

use crate::error::Error;

/// The width of the confidence interval used by a sketch's bounds estimators,
/// expressed in number of standard deviations.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum NumStdDev {
    /// 1 standard deviation, roughly 68.3% confidence.
    One,
    /// 2 standard deviations, roughly 95.4% confidence.
    Two,
    /// 3 standard deviations, roughly 99.7% confidence.
    Three,
}

impl NumStdDev {
    /// Returns the number of standard deviations as a plain integer (1, 2, or 3).
    pub fn as_u8(self) -> u8 {
        match self {
            NumStdDev::One => 1,
            NumStdDev::Two => 2,
            NumStdDev::Three => 3,
        }
    }
}

impl TryFrom<u8> for NumStdDev {
    type Error = Error;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            1 => Ok(NumStdDev::One),
            2 => Ok(NumStdDev::Two),
            3 => Ok(NumStdDev::Three),
            other => Err(Error::invalid_num_std_dev(other)),
        }
    }
}
