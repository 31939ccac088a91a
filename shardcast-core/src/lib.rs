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

#![warn(missing_docs)]
#![warn(clippy::all)]
#![allow(
    clippy::module_name_repetitions,
    clippy::must_use_candidate,
    clippy::missing_errors_doc,
    clippy::needless_pass_by_value
)]

//! Client-side dispatch core for partitioned RPC clusters.
//!
//! Given a request addressed to a set of partitioned ids, the client asks a
//! pluggable load balancer which nodes hold them, fans one sub-request out
//! per node, and hands back a [`ResponseStream`] that multiplexes the
//! responses as they complete. Failed sub-requests are transparently
//! re-routed to alternate replicas, and selective retry can re-dispatch
//! individual ids whose answers are late.
//!
//! The wire transport, the membership subsystem, and the load-balancing
//! policy are collaborators behind traits; this crate is only the routing,
//! fan-out, streaming and retry machinery between them.
//!
//! # Example
//!
//! ```rust,no_run
//! use std::collections::{HashMap, HashSet};
//! use std::sync::Arc;
//!
//! use async_trait::async_trait;
//! use shardcast_core::{
//!     Capabilities, Client, ClientPolicy, Codec, Endpoint, Error, InvalidClusterError,
//!     LoadBalancer, LoadBalancerFactory, Node, PartitionedRequest, Result, SendPolicy,
//!     Transport,
//! };
//!
//! // Places every id on the only node of the cluster.
//! struct SingleNode(Arc<Node>);
//!
//! impl LoadBalancer<u64> for SingleNode {
//!     fn next_node(&self, _id: &u64, _caps: &Capabilities) -> Option<Arc<Node>> {
//!         Some(self.0.clone())
//!     }
//!
//!     fn nodes_for_one_replica(
//!         &self,
//!         _id: &u64,
//!         _caps: &Capabilities,
//!     ) -> HashMap<Arc<Node>, HashSet<u32>> {
//!         HashMap::new()
//!     }
//!
//!     fn nodes_for_partitioned_id(&self, _id: &u64, _caps: &Capabilities) -> HashSet<Arc<Node>> {
//!         let mut nodes = HashSet::new();
//!         nodes.insert(self.0.clone());
//!         nodes
//!     }
//!
//!     fn nodes_for_partitions(
//!         &self,
//!         _id: &u64,
//!         _partitions: &[u32],
//!         _caps: &Capabilities,
//!     ) -> HashMap<Arc<Node>, HashSet<u32>> {
//!         HashMap::new()
//!     }
//!
//!     fn nodes_for_ids_in_n_replicas(
//!         &self,
//!         ids: &HashSet<u64>,
//!         _replica_count: usize,
//!         _caps: &Capabilities,
//!     ) -> HashMap<Arc<Node>, HashSet<u64>> {
//!         let mut assignments = HashMap::new();
//!         assignments.insert(self.0.clone(), ids.clone());
//!         assignments
//!     }
//!
//!     fn nodes_for_ids_in_one_cluster(
//!         &self,
//!         ids: &HashSet<u64>,
//!         _cluster_id: u32,
//!         _caps: &Capabilities,
//!     ) -> HashMap<Arc<Node>, HashSet<u64>> {
//!         let mut assignments = HashMap::new();
//!         assignments.insert(self.0.clone(), ids.clone());
//!         assignments
//!     }
//! }
//!
//! struct SingleNodeFactory;
//!
//! impl LoadBalancerFactory<u64> for SingleNodeFactory {
//!     fn new_load_balancer(
//!         &self,
//!         endpoints: &HashSet<Endpoint>,
//!     ) -> std::result::Result<Arc<dyn LoadBalancer<u64>>, InvalidClusterError> {
//!         let endpoint = endpoints
//!             .iter()
//!             .next()
//!             .ok_or_else(|| InvalidClusterError::new("no endpoints"))?;
//!         Ok(Arc::new(SingleNode(endpoint.node().clone())))
//!     }
//! }
//!
//! struct Utf8Codec;
//!
//! impl Codec<String, String> for Utf8Codec {
//!     fn encode(&self, payload: &String) -> Result<Vec<u8>> {
//!         Ok(payload.clone().into_bytes())
//!     }
//!
//!     fn decode(&self, bytes: &[u8]) -> Result<String> {
//!         String::from_utf8(bytes.to_vec()).map_err(|err| Error::Codec(err.to_string()))
//!     }
//! }
//!
//! // Stand-in for a real wire transport.
//! struct Loopback;
//!
//! #[async_trait]
//! impl Transport<u64, String, String> for Loopback {
//!     async fn send_request(
//!         &self,
//!         request: &PartitionedRequest<u64, String, String>,
//!     ) -> Result<String> {
//!         let bytes = request.codec().encode(request.payload())?;
//!         request.codec().decode(&bytes)
//!     }
//! }
//!
//! # async fn run() -> Result<()> {
//! let client = Client::new(
//!     Arc::new(SingleNodeFactory),
//!     Arc::new(Loopback),
//!     Arc::new(Utf8Codec),
//!     ClientPolicy::default(),
//! );
//!
//! // Delivered by the cluster-membership subsystem in a real deployment.
//! let mut endpoints = HashSet::new();
//! endpoints.insert(Endpoint::new(Arc::new(Node::new("n1", "10.0.0.1:9000")), true));
//! client.update_load_balancer(&endpoints);
//!
//! let ids: HashSet<u64> = [1, 2, 3].iter().copied().collect();
//! let stream = client.send_uniform(ids, &SendPolicy::default(), "ping".to_string())?;
//! while let Some(response) = stream.next().await {
//!     println!("{}", response?);
//! }
//! # Ok(())
//! # }
//! ```

#[macro_use]
extern crate log;
#[macro_use]
extern crate lazy_static;

pub use balancer::{Capabilities, LoadBalancer, LoadBalancerFactory, PartitionedId};
pub use client::Client;
pub use cluster::{BalancerCache, Endpoint, Node};
pub use codec::Codec;
pub use errors::{Error, InvalidClusterError, Result};
pub use policy::{ClientPolicy, RetryStrategy, RoutingPolicy, SendPolicy};
pub use request::{PartitionRequestBuilder, PartitionedRequest, RequestBuilder};
pub use response::ResponseStream;
pub use transport::Transport;

pub mod balancer;
mod client;
pub mod cluster;
mod codec;
mod dispatch;
pub mod errors;
pub mod policy;
mod request;
mod response;
pub mod routing;
mod transport;
