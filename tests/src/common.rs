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

#![allow(dead_code)]

use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;

use shardcast::{
    Capabilities, Client, ClientPolicy, Codec, Endpoint, Error, InvalidClusterError,
    LoadBalancer, LoadBalancerFactory, Node, PartitionedRequest, RequestBuilder, Result,
    Transport,
};

pub fn node(name: &str) -> Arc<Node> {
    Arc::new(Node::new(name, format!("{}.example.com:9000", name)))
}

pub fn endpoints(nodes: &[&Arc<Node>]) -> HashSet<Endpoint> {
    nodes
        .iter()
        .map(|node| Endpoint::new((*node).clone(), true))
        .collect()
}

pub fn ids(values: &[u64]) -> HashSet<u64> {
    values.iter().copied().collect()
}

#[derive(Clone, Debug, PartialEq)]
pub struct Ping(pub String);

#[derive(Clone, Debug, PartialEq)]
pub struct Pong {
    pub node: String,
    pub ids: Vec<u64>,
}

pub struct PlainCodec;

impl Codec<Ping, Pong> for PlainCodec {
    fn encode(&self, payload: &Ping) -> Result<Vec<u8>> {
        Ok(payload.0.clone().into_bytes())
    }

    fn decode(&self, bytes: &[u8]) -> Result<Pong> {
        Ok(Pong {
            node: String::from_utf8_lossy(bytes).into_owned(),
            ids: vec![],
        })
    }
}

/// Walks each id's replica list round-robin, so a retry that asks again
/// for the same id is handed the next replica.
pub struct RotatingBalancer {
    replicas: HashMap<u64, Vec<Arc<Node>>>,
    cursors: HashMap<u64, AtomicUsize>,
    partition_map: HashMap<Arc<Node>, HashSet<u32>>,
}

impl RotatingBalancer {
    pub fn new(replicas: Vec<(u64, Vec<Arc<Node>>)>) -> Self {
        let cursors = replicas
            .iter()
            .map(|(id, _)| (*id, AtomicUsize::new(0)))
            .collect();
        RotatingBalancer {
            replicas: replicas.into_iter().collect(),
            cursors,
            partition_map: HashMap::new(),
        }
    }

    pub fn with_partition_map(mut self, map: Vec<(Arc<Node>, Vec<u32>)>) -> Self {
        self.partition_map = map
            .into_iter()
            .map(|(node, parts)| (node, parts.into_iter().collect()))
            .collect();
        self
    }
}

impl LoadBalancer<u64> for RotatingBalancer {
    fn next_node(&self, id: &u64, _caps: &Capabilities) -> Option<Arc<Node>> {
        let replicas = self.replicas.get(id)?;
        let cursor = self.cursors.get(id)?.fetch_add(1, Ordering::SeqCst);
        replicas.get(cursor % replicas.len()).cloned()
    }

    fn nodes_for_one_replica(
        &self,
        _id: &u64,
        _caps: &Capabilities,
    ) -> HashMap<Arc<Node>, HashSet<u32>> {
        self.partition_map.clone()
    }

    fn nodes_for_partitioned_id(&self, id: &u64, _caps: &Capabilities) -> HashSet<Arc<Node>> {
        self.replicas
            .get(id)
            .map(|nodes| nodes.iter().cloned().collect())
            .unwrap_or_default()
    }

    fn nodes_for_partitions(
        &self,
        _id: &u64,
        partitions: &[u32],
        _caps: &Capabilities,
    ) -> HashMap<Arc<Node>, HashSet<u32>> {
        let wanted: HashSet<u32> = partitions.iter().copied().collect();
        self.partition_map
            .iter()
            .filter_map(|(node, held)| {
                let subset: HashSet<u32> = held.intersection(&wanted).copied().collect();
                if subset.is_empty() {
                    None
                } else {
                    Some((node.clone(), subset))
                }
            })
            .collect()
    }

    fn nodes_for_ids_in_n_replicas(
        &self,
        ids: &HashSet<u64>,
        replica_count: usize,
        _caps: &Capabilities,
    ) -> HashMap<Arc<Node>, HashSet<u64>> {
        let mut assignments: HashMap<Arc<Node>, HashSet<u64>> = HashMap::new();
        for id in ids {
            if let Some(replicas) = self.replicas.get(id) {
                for node in replicas.iter().take(replica_count) {
                    assignments.entry(node.clone()).or_default().insert(*id);
                }
            }
        }
        assignments
    }

    fn nodes_for_ids_in_one_cluster(
        &self,
        ids: &HashSet<u64>,
        _cluster_id: u32,
        caps: &Capabilities,
    ) -> HashMap<Arc<Node>, HashSet<u64>> {
        self.nodes_for_ids_in_n_replicas(ids, 1, caps)
    }
}

/// Hands out a pre-built balancer, ignoring the endpoint snapshot.
pub struct FixedFactory(pub Arc<RotatingBalancer>);

impl LoadBalancerFactory<u64> for FixedFactory {
    fn new_load_balancer(
        &self,
        _endpoints: &HashSet<Endpoint>,
    ) -> std::result::Result<Arc<dyn LoadBalancer<u64>>, InvalidClusterError> {
        Ok(self.0.clone())
    }
}

/// Places every id on one node derived from the endpoint snapshot, so
/// membership swaps are observable from routing.
pub struct AnyNodeBalancer(pub Arc<Node>);

impl LoadBalancer<u64> for AnyNodeBalancer {
    fn next_node(&self, _id: &u64, _caps: &Capabilities) -> Option<Arc<Node>> {
        Some(self.0.clone())
    }

    fn nodes_for_one_replica(
        &self,
        _id: &u64,
        _caps: &Capabilities,
    ) -> HashMap<Arc<Node>, HashSet<u32>> {
        HashMap::new()
    }

    fn nodes_for_partitioned_id(&self, _id: &u64, _caps: &Capabilities) -> HashSet<Arc<Node>> {
        let mut nodes = HashSet::new();
        nodes.insert(self.0.clone());
        nodes
    }

    fn nodes_for_partitions(
        &self,
        _id: &u64,
        _partitions: &[u32],
        _caps: &Capabilities,
    ) -> HashMap<Arc<Node>, HashSet<u32>> {
        HashMap::new()
    }

    fn nodes_for_ids_in_n_replicas(
        &self,
        ids: &HashSet<u64>,
        _replica_count: usize,
        _caps: &Capabilities,
    ) -> HashMap<Arc<Node>, HashSet<u64>> {
        let mut assignments = HashMap::new();
        assignments.insert(self.0.clone(), ids.clone());
        assignments
    }

    fn nodes_for_ids_in_one_cluster(
        &self,
        ids: &HashSet<u64>,
        _cluster_id: u32,
        caps: &Capabilities,
    ) -> HashMap<Arc<Node>, HashSet<u64>> {
        self.nodes_for_ids_in_n_replicas(ids, 1, caps)
    }
}

/// Builds an [`AnyNodeBalancer`] over the lexicographically first endpoint.
pub struct FirstEndpointFactory;

impl LoadBalancerFactory<u64> for FirstEndpointFactory {
    fn new_load_balancer(
        &self,
        endpoints: &HashSet<Endpoint>,
    ) -> std::result::Result<Arc<dyn LoadBalancer<u64>>, InvalidClusterError> {
        let mut nodes: Vec<Arc<Node>> = endpoints.iter().map(|e| e.node().clone()).collect();
        nodes.sort_by(|a, b| a.name().cmp(b.name()));
        match nodes.into_iter().next() {
            Some(node) => Ok(Arc::new(AnyNodeBalancer(node))),
            None => Err(InvalidClusterError::new("no endpoints")),
        }
    }
}

/// Rejects every snapshot.
pub struct RejectingFactory;

impl LoadBalancerFactory<u64> for RejectingFactory {
    fn new_load_balancer(
        &self,
        _endpoints: &HashSet<Endpoint>,
    ) -> std::result::Result<Arc<dyn LoadBalancer<u64>>, InvalidClusterError> {
        Err(InvalidClusterError::new("endpoints span two clusters"))
    }
}

#[derive(Clone)]
pub enum Behavior {
    Respond,
    Fail { retriable: bool },
    Stall(Duration),
}

/// Scriptable stand-in for the wire layer. Responds with the node name and
/// the sorted id set of each sub-request, and records every call.
pub struct MockTransport {
    behaviors: Mutex<HashMap<String, Behavior>>,
    calls: Mutex<Vec<(String, Vec<u64>, usize)>>,
}

impl MockTransport {
    pub fn new() -> Self {
        MockTransport {
            behaviors: Mutex::new(HashMap::new()),
            calls: Mutex::new(Vec::new()),
        }
    }

    pub fn set(&self, node: &str, behavior: Behavior) {
        self.behaviors
            .lock()
            .unwrap()
            .insert(node.to_string(), behavior);
    }

    pub fn calls(&self) -> Vec<(String, Vec<u64>, usize)> {
        self.calls.lock().unwrap().clone()
    }

    pub fn calls_to(&self, node: &str) -> usize {
        self.calls
            .lock()
            .unwrap()
            .iter()
            .filter(|(name, _, _)| name == node)
            .count()
    }
}

#[async_trait]
impl Transport<u64, Ping, Pong> for MockTransport {
    async fn send_request(&self, request: &PartitionedRequest<u64, Ping, Pong>) -> Result<Pong> {
        let mut covered: Vec<u64> = request.ids().iter().copied().collect();
        covered.sort_unstable();
        let name = request.node().name().to_string();
        self.calls
            .lock()
            .unwrap()
            .push((name.clone(), covered.clone(), request.attempt()));
        let behavior = self
            .behaviors
            .lock()
            .unwrap()
            .get(&name)
            .cloned()
            .unwrap_or(Behavior::Respond);
        match behavior {
            Behavior::Respond => Ok(Pong {
                node: name,
                ids: covered,
            }),
            Behavior::Fail { retriable } => {
                Err(Error::transport(request.node(), "injected failure", retriable))
            }
            Behavior::Stall(delay) => {
                shardcast_rt::sleep(delay).await;
                Ok(Pong {
                    node: name,
                    ids: covered,
                })
            }
        }
    }
}

/// A client over a fixed balancer and the given transport, already
/// "connected" via a dummy endpoint snapshot.
pub fn connected_client(
    balancer: RotatingBalancer,
    transport: Arc<MockTransport>,
) -> Client<u64, Ping, Pong> {
    let client = Client::new(
        Arc::new(FixedFactory(Arc::new(balancer))),
        transport,
        Arc::new(PlainCodec),
        ClientPolicy::default(),
    );
    let seed = node("seed");
    client.update_load_balancer(&endpoints(&[&seed]));
    client
}

/// A builder producing a labeled payload per node.
pub fn ping_builder(label: &str) -> RequestBuilder<u64, Ping> {
    let label = label.to_string();
    Arc::new(move |node, subset| {
        let mut covered: Vec<u64> = subset.iter().copied().collect();
        covered.sort_unstable();
        Ok(Ping(format!("{}/{}/{:?}", label, node.name(), covered)))
    })
}

/// Drains a stream to completion.
pub async fn collect(stream: &shardcast::ResponseStream<Pong>) -> Vec<Result<Pong>> {
    let mut results = Vec::new();
    while let Some(result) = stream.next().await {
        results.push(result);
    }
    results
}
