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

use crate::balancer::Capabilities;
use crate::policy::{RetryStrategy, RoutingPolicy};

/// `SendPolicy` encapsulates the per-request parameters of the send
/// operations. The default value routes one copy of each id with no
/// retries.
///
/// The policy is copied into the dispatch when a send begins; mutating it
/// afterwards has no effect on requests already in flight.
#[derive(Debug, Clone, Default)]
pub struct SendPolicy {
    /// Fan each id out to up to this many distinct replicas instead of one.
    /// Takes precedence over `cluster_id` when both are set.
    pub replica_count: Option<usize>,

    /// Restrict routing to the nodes of one cluster.
    pub cluster_id: Option<u32>,

    /// Maximum number of times a failed sub-request is re-routed to an
    /// alternate replica. Zero disables whole-sub-request retry. Ignored
    /// when a fan-out runs under selective retry, where re-dispatch is
    /// driven entirely by the retry strategy.
    pub max_retries: usize,

    /// Constraints forwarded to the load balancer.
    pub capabilities: Capabilities,

    /// Retry discipline and duplicate handling.
    pub routing: RoutingPolicy,

    /// Timing policy for selective retry. Ignored unless
    /// `routing.selective_retry` is set.
    pub retry_strategy: Option<RetryStrategy>,
}
