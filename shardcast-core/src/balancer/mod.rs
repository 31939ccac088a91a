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

//! The load-balancer contract the dispatch core routes through.
//!
//! A load balancer is built once per membership snapshot and treated as
//! immutable afterwards; how it hashes partitioned ids onto nodes is
//! entirely its own business.

use std::collections::{HashMap, HashSet};
use std::hash::Hash;
use std::sync::Arc;

use crate::cluster::{Endpoint, Node};
use crate::errors::InvalidClusterError;

/// Marker trait for the user-defined partition key type.
///
/// The core only needs to clone keys and place them in sets and map keys;
/// any such type qualifies automatically.
pub trait PartitionedId: Clone + Eq + Hash + Send + Sync + 'static {}

impl<T: Clone + Eq + Hash + Send + Sync + 'static> PartitionedId for T {}

/// Opaque constraints narrowing which nodes may serve a request.
///
/// Both tags are forwarded to the load balancer untouched; the core never
/// interprets them.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Capabilities {
    /// Constraint that must hold for the duration of one request.
    pub capability: Option<u64>,
    /// Constraint that must hold for the lifetime of the session.
    pub persistent: Option<u64>,
}

/// Maps partitioned ids (and partition numbers) onto cluster nodes.
///
/// Absence speaks: `next_node` returning `None` or a bulk method leaving an
/// id uncovered means no node is currently able to serve it, and the router
/// turns that into a `NoNodesAvailable` failure. Balancers are free to be
/// non-deterministic between calls.
pub trait LoadBalancer<K>: Send + Sync
where
    K: PartitionedId,
{
    /// Picks a node for a single partitioned id.
    fn next_node(&self, id: &K, caps: &Capabilities) -> Option<Arc<Node>>;

    /// Distributes the partitions of one replica of `id` over the nodes
    /// holding them. Keys are partition numbers, not partitioned ids.
    fn nodes_for_one_replica(
        &self,
        id: &K,
        caps: &Capabilities,
    ) -> HashMap<Arc<Node>, HashSet<u32>>;

    /// Every node holding a replica of `id`.
    fn nodes_for_partitioned_id(&self, id: &K, caps: &Capabilities) -> HashSet<Arc<Node>>;

    /// The nodes holding the given partition numbers of `id`.
    fn nodes_for_partitions(
        &self,
        id: &K,
        partitions: &[u32],
        caps: &Capabilities,
    ) -> HashMap<Arc<Node>, HashSet<u32>>;

    /// Places each id on up to `replica_count` distinct replicas, subject
    /// to availability.
    fn nodes_for_ids_in_n_replicas(
        &self,
        ids: &HashSet<K>,
        replica_count: usize,
        caps: &Capabilities,
    ) -> HashMap<Arc<Node>, HashSet<K>>;

    /// Places the ids using only nodes belonging to the given cluster.
    fn nodes_for_ids_in_one_cluster(
        &self,
        ids: &HashSet<K>,
        cluster_id: u32,
        caps: &Capabilities,
    ) -> HashMap<Arc<Node>, HashSet<K>>;
}

/// Builds a load balancer from a membership snapshot.
pub trait LoadBalancerFactory<K>: Send + Sync
where
    K: PartitionedId,
{
    /// Assembles a balancer over the given endpoints, or explains why the
    /// set does not form a usable cluster.
    fn new_load_balancer(
        &self,
        endpoints: &HashSet<Endpoint>,
    ) -> std::result::Result<Arc<dyn LoadBalancer<K>>, InvalidClusterError>;
}
