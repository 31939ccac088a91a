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

use std::collections::{HashMap, HashSet};
use std::future::Future;
use std::sync::Arc;

use crate::balancer::{LoadBalancerFactory, PartitionedId};
use crate::cluster::{BalancerCache, Endpoint, Node};
use crate::codec::Codec;
use crate::dispatch::selective::SelectiveRetry;
use crate::dispatch::Dispatch;
use crate::errors::{Error, Result};
use crate::policy::{ClientPolicy, SendPolicy};
use crate::request::{PartitionRequestBuilder, PartitionedRequest, RequestBuilder};
use crate::response::ResponseStream;
use crate::routing;
use crate::routing::consistency;
use crate::transport::Transport;

use shardcast_rt as rt;

/// Fans requests out to the nodes holding a set of partitioned ids and
/// streams their responses back.
///
/// The client is thread-safe; share one instance per cluster. It becomes
/// usable once the membership subsystem delivers the first endpoint
/// snapshot through [`update_load_balancer`](Self::update_load_balancer).
///
/// Send operations must run inside an async runtime: sub-requests are
/// driven by spawned tasks.
pub struct Client<K, P, R> {
    cache: BalancerCache<K>,
    transport: Arc<dyn Transport<K, P, R>>,
    codec: Arc<dyn Codec<P, R>>,
    policy: ClientPolicy,
}

impl<K, P, R> Client<K, P, R>
where
    K: PartitionedId,
    P: Send + Sync + 'static,
    R: Send + 'static,
{
    /// Creates a client over the given collaborators. No connection is
    /// attempted here; routing works as soon as a membership snapshot has
    /// been applied.
    pub fn new(
        factory: Arc<dyn LoadBalancerFactory<K>>,
        transport: Arc<dyn Transport<K, P, R>>,
        codec: Arc<dyn Codec<P, R>>,
        policy: ClientPolicy,
    ) -> Self {
        Client {
            cache: BalancerCache::new(factory),
            transport,
            codec,
            policy,
        }
    }

    /// Applies a membership snapshot. Called by the cluster-membership
    /// subsystem whenever the endpoint set changes.
    pub fn update_load_balancer(&self, endpoints: &HashSet<Endpoint>) {
        self.cache.update(endpoints);
    }

    /// True when a usable load balancer is installed.
    pub fn is_connected(&self) -> bool {
        self.cache.is_connected()
    }

    /// Sends to every node holding one of `ids`, building one request per
    /// node via `build`. This is the primary operation; the other sends
    /// specialize it.
    ///
    /// Returns a stream delivering exactly one result per dispatched
    /// sub-request, in completion order.
    pub fn send(
        &self,
        ids: HashSet<K>,
        policy: &SendPolicy,
        build: RequestBuilder<K, P>,
    ) -> Result<ResponseStream<R>> {
        let balancer = self.cache.read()?;
        let assignments = match (policy.replica_count, policy.cluster_id) {
            (Some(replicas), _) => routing::route_ids_replicated(
                &*balancer,
                &ids,
                replicas,
                &policy.capabilities,
            )?,
            (None, Some(cluster_id)) => routing::route_ids_in_cluster(
                &*balancer,
                &ids,
                cluster_id,
                &policy.capabilities,
            )?,
            (None, None) => routing::route_ids(&*balancer, &ids, &policy.capabilities)?,
        };

        let (stream, sink) =
            ResponseStream::new(assignments.len(), self.policy.response_queue_size);
        let selective = if assignments.len() > 1 && policy.routing.selective_retry {
            policy
                .retry_strategy
                .as_ref()
                .map(|strategy| SelectiveRetry::new(strategy.clone(), policy.routing.duplicates_ok))
        } else {
            None
        };
        let dispatch = Dispatch::new(
            balancer,
            self.transport.clone(),
            build,
            self.codec.clone(),
            policy.capabilities,
            policy.max_retries,
            sink,
            selective,
        );
        for (node, subset) in assignments {
            dispatch.submit(node, subset, 0);
        }
        Ok(stream)
    }

    /// Sends one fixed request to every node holding one of `ids`.
    pub fn send_uniform(
        &self,
        ids: HashSet<K>,
        policy: &SendPolicy,
        request: P,
    ) -> Result<ResponseStream<R>>
    where
        P: Clone,
    {
        let build: RequestBuilder<K, P> = Arc::new(move |_node, _ids| Ok(request.clone()));
        self.send(ids, policy, build)
    }

    /// Sends to the node holding a single id and resolves with its one
    /// response.
    pub async fn send_single(&self, id: K, policy: &SendPolicy, request: P) -> Result<R>
    where
        P: Clone,
    {
        let mut ids = HashSet::new();
        ids.insert(id);
        let stream = self.send_uniform(ids, policy, request)?;
        match stream.next().await {
            Some(result) => result,
            None => Err(Error::Cancelled),
        }
    }

    /// Sends the same request to every replica of `id`, with per-node
    /// retry.
    pub fn send_to_replicas(
        &self,
        id: &K,
        policy: &SendPolicy,
        request: P,
    ) -> Result<ResponseStream<R>>
    where
        P: Clone,
    {
        let balancer = self.cache.read()?;
        let replicas = balancer.nodes_for_partitioned_id(id, &policy.capabilities);
        if replicas.is_empty() {
            return Err(Error::NoNodesAvailable(
                "no replicas hold the partitioned id".to_string(),
            ));
        }
        let mut assignments: HashMap<Arc<Node>, HashSet<K>> = HashMap::new();
        for node in replicas {
            let mut subset = HashSet::new();
            subset.insert(id.clone());
            assignments.insert(node, subset);
        }

        let (stream, sink) =
            ResponseStream::new(assignments.len(), self.policy.response_queue_size);
        let build: RequestBuilder<K, P> = Arc::new(move |_node, _ids| Ok(request.clone()));
        let dispatch = Dispatch::new(
            balancer,
            self.transport.clone(),
            build,
            self.codec.clone(),
            policy.capabilities,
            policy.max_retries,
            sink,
            None,
        );
        for (node, subset) in assignments {
            dispatch.submit(node, subset, 0);
        }
        Ok(stream)
    }

    /// Sends to the nodes holding one whole replica of `id`, one
    /// sub-request per node covering that node's share of the partitions.
    ///
    /// A balancer that hands the same partition to several nodes is
    /// repaired first so each partition is requested exactly once.
    pub fn send_to_one_replica(
        &self,
        id: &K,
        policy: &SendPolicy,
        build: PartitionRequestBuilder<P>,
    ) -> Result<ResponseStream<R>> {
        let balancer = self.cache.read()?;
        let assignments = consistency::repair_partition_map_default(
            balancer.nodes_for_one_replica(id, &policy.capabilities),
        );
        if assignments.is_empty() {
            return Err(Error::NoNodesAvailable(
                "no replica is available for the partitioned id".to_string(),
            ));
        }
        self.dispatch_partitions(id, assignments, build)
    }

    /// Sends to the nodes holding the given partitions of `id`.
    pub fn send_to_partitions(
        &self,
        id: &K,
        partitions: &[u32],
        policy: &SendPolicy,
        build: PartitionRequestBuilder<P>,
    ) -> Result<ResponseStream<R>> {
        let balancer = self.cache.read()?;
        let assignments = consistency::repair_partition_map_default(
            balancer.nodes_for_partitions(id, partitions, &policy.capabilities),
        );
        if assignments.is_empty() {
            return Err(Error::NoNodesAvailable(
                "no node holds the requested partitions".to_string(),
            ));
        }
        self.dispatch_partitions(id, assignments, build)
    }

    /// Sends via [`send`](Self::send) and folds the stream through the
    /// caller's aggregator.
    pub async fn aggregate<A, F, Fut>(
        &self,
        ids: HashSet<K>,
        policy: &SendPolicy,
        build: RequestBuilder<K, P>,
        fold: F,
    ) -> Result<A>
    where
        F: FnOnce(ResponseStream<R>) -> Fut,
        Fut: Future<Output = Result<A>>,
    {
        let stream = self.send(ids, policy, build)?;
        fold(stream).await
    }

    // Fixed-size fan-out addressed by partition numbers: one sub-request
    // per node, no retry.
    fn dispatch_partitions(
        &self,
        id: &K,
        assignments: HashMap<Arc<Node>, HashSet<u32>>,
        build: PartitionRequestBuilder<P>,
    ) -> Result<ResponseStream<R>> {
        let (stream, sink) =
            ResponseStream::new(assignments.len(), self.policy.response_queue_size);
        for (node, partitions) in assignments {
            let sink = sink.clone();
            match build(&node, &partitions) {
                Ok(payload) => {
                    let mut ids = HashSet::new();
                    ids.insert(id.clone());
                    let request =
                        PartitionedRequest::new(node, ids, payload, self.codec.clone(), 0);
                    let transport = self.transport.clone();
                    rt::spawn(async move {
                        let result = transport.send_request(&request).await;
                        sink.push(result).await;
                        sink.complete();
                    });
                }
                Err(err) => {
                    warn!("failed to build a request for node {}: {}", node, err);
                    rt::spawn(async move {
                        sink.push(Err(err)).await;
                        sink.complete();
                    });
                }
            }
        }
        Ok(stream)
    }
}
