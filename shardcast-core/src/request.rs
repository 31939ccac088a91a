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

use std::collections::HashSet;
use std::sync::Arc;

use crate::balancer::PartitionedId;
use crate::cluster::Node;
use crate::codec::Codec;
use crate::errors::Result;

/// Builds the request payload for one node and the subset of partitioned
/// ids routed to it. Invoked once per sub-request, including sub-requests
/// rebuilt for a retry against a different node.
pub type RequestBuilder<K, P> =
    Arc<dyn Fn(&Node, &HashSet<K>) -> Result<P> + Send + Sync>;

/// Builds the request payload for one node from partition numbers rather
/// than partitioned ids, for the replica- and partition-addressed sends.
pub type PartitionRequestBuilder<P> =
    Arc<dyn Fn(&Node, &HashSet<u32>) -> Result<P> + Send + Sync>;

/// One per-node sub-request of a fan-out.
///
/// Immutable after construction. The attempt counter starts at zero and is
/// bumped on each rebuilt copy when a retry re-routes the covered ids.
pub struct PartitionedRequest<K, P, R> {
    node: Arc<Node>,
    ids: HashSet<K>,
    payload: P,
    codec: Arc<dyn Codec<P, R>>,
    attempt: usize,
}

impl<K: PartitionedId, P, R> PartitionedRequest<K, P, R> {
    pub(crate) fn new(
        node: Arc<Node>,
        ids: HashSet<K>,
        payload: P,
        codec: Arc<dyn Codec<P, R>>,
        attempt: usize,
    ) -> Self {
        PartitionedRequest {
            node,
            ids,
            payload,
            codec,
            attempt,
        }
    }

    /// The node this sub-request is addressed to.
    pub fn node(&self) -> &Arc<Node> {
        &self.node
    }

    /// The partitioned ids this sub-request covers.
    pub fn ids(&self) -> &HashSet<K> {
        &self.ids
    }

    /// The built request payload.
    pub fn payload(&self) -> &P {
        &self.payload
    }

    /// The codec the transport should use for this sub-request.
    pub fn codec(&self) -> &dyn Codec<P, R> {
        &*self.codec
    }

    /// Zero-based retry attempt this sub-request belongs to.
    pub fn attempt(&self) -> usize {
        self.attempt
    }
}
