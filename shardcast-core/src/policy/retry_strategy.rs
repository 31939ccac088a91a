// Copyright 2015-2020 Shardcast contributors.
//
// Licensed under the Apache License, Version 2.0 (the "License"); you may not
// use this file except in compliance with the License. You may obtain a copy of
// the License at http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS, WITHOUT
// WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied. See the
// License for the specific language governing permissions and limitations under
// the License.

use std::time::Duration;

/// Timing policy consumed by selective retry.
///
/// Attempt `n` of a sub-request is given `timeout_for(n)` to produce a
/// response before its still-unanswered partitioned ids are re-dispatched.
/// Once the strategy stops returning a timeout, those ids are given up on
/// and their failure is surfaced through the response stream.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetryStrategy {
    /// Deadline for the first attempt.
    pub initial_timeout: Duration,

    /// Each subsequent attempt waits this factor longer than the previous
    /// one.
    pub backoff_multiplier: u32,

    /// Number of timed attempts before the remaining ids are abandoned.
    pub max_attempts: usize,
}

impl RetryStrategy {
    /// The deadline for the given attempt, or `None` when the strategy
    /// denies further attempts.
    pub fn timeout_for(&self, attempt: usize) -> Option<Duration> {
        if attempt >= self.max_attempts {
            return None;
        }
        Some(self.initial_timeout * self.backoff_multiplier.pow(attempt as u32))
    }
}

impl Default for RetryStrategy {
    fn default() -> Self {
        RetryStrategy {
            initial_timeout: Duration::from_millis(250),
            backoff_multiplier: 2,
            max_attempts: 3,
        }
    }
}
