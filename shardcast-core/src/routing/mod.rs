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

//! Turns a set of partitioned ids into per-node assignments.
//!
//! All routing here is purely functional over what the load balancer
//! reports within one call; the balancer itself is free to answer
//! differently next time.

pub mod consistency;

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use crate::balancer::{Capabilities, LoadBalancer, PartitionedId};
use crate::cluster::Node;
use crate::errors::{Error, Result};

/// Routes each id to the node the balancer picks for it.
///
/// The result is a partition of `ids`: every id appears under exactly one
/// node.
pub fn route_ids<K: PartitionedId>(
    balancer: &dyn LoadBalancer<K>,
    ids: &HashSet<K>,
    caps: &Capabilities,
) -> Result<HashMap<Arc<Node>, HashSet<K>>> {
    let mut assignments: HashMap<Arc<Node>, HashSet<K>> = HashMap::new();
    for id in ids {
        match balancer.next_node(id, caps) {
            Some(node) => {
                assignments.entry(node).or_default().insert(id.clone());
            }
            None => {
                return Err(Error::NoNodesAvailable(
                    "no node can serve one of the partitioned ids".to_string(),
                ))
            }
        }
    }
    Ok(assignments)
}

/// Routes each id to up to `replica_count` distinct replicas.
pub fn route_ids_replicated<K: PartitionedId>(
    balancer: &dyn LoadBalancer<K>,
    ids: &HashSet<K>,
    replica_count: usize,
    caps: &Capabilities,
) -> Result<HashMap<Arc<Node>, HashSet<K>>> {
    let assignments = balancer.nodes_for_ids_in_n_replicas(ids, replica_count, caps);
    ensure_coverage(ids, &assignments)?;
    Ok(assignments)
}

/// Routes the ids using only nodes of the given cluster.
pub fn route_ids_in_cluster<K: PartitionedId>(
    balancer: &dyn LoadBalancer<K>,
    ids: &HashSet<K>,
    cluster_id: u32,
    caps: &Capabilities,
) -> Result<HashMap<Arc<Node>, HashSet<K>>> {
    let assignments = balancer.nodes_for_ids_in_one_cluster(ids, cluster_id, caps);
    ensure_coverage(ids, &assignments)?;
    Ok(assignments)
}

/// Routes each id to a node outside `excluded`, asking the balancer up to
/// `max_attempts` times per id before giving up.
///
/// Used when re-dispatching ids whose previous nodes failed or stalled.
pub fn route_ids_excluding<K: PartitionedId>(
    balancer: &dyn LoadBalancer<K>,
    ids: &HashSet<K>,
    excluded: &HashSet<Arc<Node>>,
    max_attempts: usize,
    caps: &Capabilities,
) -> Result<HashMap<Arc<Node>, HashSet<K>>> {
    if max_attempts == 0 {
        return Err(Error::InvalidArgument(
            "max_attempts must be positive".to_string(),
        ));
    }

    let mut assignments: HashMap<Arc<Node>, HashSet<K>> = HashMap::new();
    for id in ids {
        let mut placed = false;
        for _ in 0..max_attempts {
            match balancer.next_node(id, caps) {
                Some(node) if !excluded.contains(&node) => {
                    assignments.entry(node).or_default().insert(id.clone());
                    placed = true;
                    break;
                }
                Some(_) => {}
                None => break,
            }
        }
        if !placed {
            return Err(Error::NoNodesAvailable(format!(
                "no replacement node outside the {} excluded node(s)",
                excluded.len()
            )));
        }
    }
    Ok(assignments)
}

// Every requested id must be covered by at least one node.
fn ensure_coverage<K: PartitionedId>(
    ids: &HashSet<K>,
    assignments: &HashMap<Arc<Node>, HashSet<K>>,
) -> Result<()> {
    let covered = ids
        .iter()
        .all(|id| assignments.values().any(|subset| subset.contains(id)));
    if covered {
        Ok(())
    } else {
        Err(Error::NoNodesAvailable(
            "one or more partitioned ids could not be placed on any node".to_string(),
        ))
    }
}
