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

//! Repair of partition maps where a balancer assigned the same partition
//! to more than one node.

use std::collections::{BTreeMap, HashMap, HashSet};
use std::sync::{Arc, Mutex, PoisonError};

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::cluster::Node;

lazy_static! {
    static ref REPAIR_RNG: Mutex<StdRng> = Mutex::new(StdRng::from_entropy());
}

/// Rewrites a partition assignment so that every partition belongs to
/// exactly one node.
///
/// Conflicting partitions are logged and handed to one of their claimants
/// picked uniformly at random. The union of partitions is preserved.
pub fn repair_partition_map(
    assignments: HashMap<Arc<Node>, HashSet<u32>>,
    rng: &mut impl Rng,
) -> HashMap<Arc<Node>, HashSet<u32>> {
    let mut claimants: BTreeMap<u32, Vec<Arc<Node>>> = BTreeMap::new();
    for (node, partitions) in &assignments {
        for partition in partitions {
            claimants.entry(*partition).or_default().push(node.clone());
        }
    }

    let mut repaired: HashMap<Arc<Node>, HashSet<u32>> = HashMap::new();
    for (partition, mut candidates) in claimants {
        let owner = if candidates.len() == 1 {
            candidates.swap_remove(0)
        } else {
            // Candidate order out of a HashMap is arbitrary; sort so that a
            // seeded generator yields a reproducible pick.
            candidates.sort_by(|a, b| a.name().cmp(b.name()));
            warn!(
                "partition {} claimed by {} nodes; keeping one of them",
                partition,
                candidates.len()
            );
            let pick = rng.gen_range(0..candidates.len());
            candidates.swap_remove(pick)
        };
        repaired.entry(owner).or_default().insert(partition);
    }
    repaired
}

/// [`repair_partition_map`] with the process-wide generator.
pub fn repair_partition_map_default(
    assignments: HashMap<Arc<Node>, HashSet<u32>>,
) -> HashMap<Arc<Node>, HashSet<u32>> {
    let mut rng = REPAIR_RNG.lock().unwrap_or_else(PoisonError::into_inner);
    repair_partition_map(assignments, &mut *rng)
}
