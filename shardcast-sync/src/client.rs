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

use futures::executor::block_on;

use shardcast_core::{
    ClientPolicy, Codec, Endpoint, LoadBalancerFactory, PartitionRequestBuilder, PartitionedId,
    RequestBuilder, ResponseStream, Result, SendPolicy, Transport,
};

/// Blocking facade over [`shardcast_core::Client`].
///
/// Send operations still spawn their sub-request tasks on the selected
/// async runtime; this adapter only removes the `await` from the caller's
/// side. Responses are consumed with the blocking `Iterator` impl on
/// `&ResponseStream`.
pub struct Client<K, P, R> {
    inner: shardcast_core::Client<K, P, R>,
}

impl<K, P, R> Client<K, P, R>
where
    K: PartitionedId,
    P: Send + Sync + 'static,
    R: Send + 'static,
{
    /// Creates a blocking client over the given collaborators.
    pub fn new(
        factory: Arc<dyn LoadBalancerFactory<K>>,
        transport: Arc<dyn Transport<K, P, R>>,
        codec: Arc<dyn Codec<P, R>>,
        policy: ClientPolicy,
    ) -> Self {
        Client {
            inner: shardcast_core::Client::new(factory, transport, codec, policy),
        }
    }

    /// Applies a membership snapshot.
    pub fn update_load_balancer(&self, endpoints: &HashSet<Endpoint>) {
        self.inner.update_load_balancer(endpoints);
    }

    /// True when a usable load balancer is installed.
    pub fn is_connected(&self) -> bool {
        self.inner.is_connected()
    }

    /// See [`shardcast_core::Client::send`].
    pub fn send(
        &self,
        ids: HashSet<K>,
        policy: &SendPolicy,
        build: RequestBuilder<K, P>,
    ) -> Result<ResponseStream<R>> {
        self.inner.send(ids, policy, build)
    }

    /// See [`shardcast_core::Client::send_uniform`].
    pub fn send_uniform(
        &self,
        ids: HashSet<K>,
        policy: &SendPolicy,
        request: P,
    ) -> Result<ResponseStream<R>>
    where
        P: Clone,
    {
        self.inner.send_uniform(ids, policy, request)
    }

    /// Sends to the node holding a single id and blocks for its response.
    pub fn send_single(&self, id: K, policy: &SendPolicy, request: P) -> Result<R>
    where
        P: Clone,
    {
        block_on(self.inner.send_single(id, policy, request))
    }

    /// See [`shardcast_core::Client::send_to_replicas`].
    pub fn send_to_replicas(
        &self,
        id: &K,
        policy: &SendPolicy,
        request: P,
    ) -> Result<ResponseStream<R>>
    where
        P: Clone,
    {
        self.inner.send_to_replicas(id, policy, request)
    }

    /// See [`shardcast_core::Client::send_to_one_replica`].
    pub fn send_to_one_replica(
        &self,
        id: &K,
        policy: &SendPolicy,
        build: PartitionRequestBuilder<P>,
    ) -> Result<ResponseStream<R>> {
        self.inner.send_to_one_replica(id, policy, build)
    }

    /// See [`shardcast_core::Client::send_to_partitions`].
    pub fn send_to_partitions(
        &self,
        id: &K,
        partitions: &[u32],
        policy: &SendPolicy,
        build: PartitionRequestBuilder<P>,
    ) -> Result<ResponseStream<R>> {
        self.inner.send_to_partitions(id, partitions, policy, build)
    }

    /// Sends and folds the responses through `fold`, blocking inside the
    /// aggregator while it drains the stream.
    pub fn aggregate<A, F>(
        &self,
        ids: HashSet<K>,
        policy: &SendPolicy,
        build: RequestBuilder<K, P>,
        fold: F,
    ) -> Result<A>
    where
        F: FnOnce(&ResponseStream<R>) -> Result<A>,
    {
        let stream = self.inner.send(ids, policy, build)?;
        fold(&stream)
    }
}
