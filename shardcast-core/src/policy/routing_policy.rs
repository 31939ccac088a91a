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

/// Governs the retry discipline of a fan-out and how responses covering the
/// same partitioned ids are treated.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RoutingPolicy {
    /// When true (and a retry strategy is supplied, and the fan-out spans
    /// more than one node), partitioned ids whose responses are still
    /// outstanding after a per-id timeout are re-dispatched individually to
    /// alternate replicas.
    ///
    /// Default: false.
    pub selective_retry: bool,

    /// When false, a response that only covers partitioned ids already
    /// answered by an earlier response is dropped instead of delivered.
    ///
    /// Default: false.
    pub duplicates_ok: bool,
}
