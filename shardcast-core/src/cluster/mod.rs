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

//! Cluster-facing state: node identities and the load-balancer cell that
//! membership updates swap in and out.

pub mod node;

pub use self::node::{Endpoint, Node};

use std::collections::HashSet;
use std::sync::Arc;

use arc_swap::ArcSwap;

use crate::balancer::{LoadBalancer, LoadBalancerFactory, PartitionedId};
use crate::errors::{Error, Result};

// The cell is replaced wholesale on every membership change; readers only
// ever observe one of these three states.
enum BalancerCell<K> {
    Absent,
    Invalid(crate::errors::InvalidClusterError),
    Valid(Arc<dyn LoadBalancer<K>>),
}

/// Holds the load balancer built from the most recent membership snapshot.
///
/// Updates replace the whole cell atomically; a send that starts after an
/// update has been published observes the balancer built from that snapshot
/// or a later one. A rejected snapshot is remembered and its error is
/// returned from every read until the next successful update.
pub struct BalancerCache<K> {
    factory: Arc<dyn LoadBalancerFactory<K>>,
    cell: ArcSwap<BalancerCell<K>>,
}

impl<K: PartitionedId> BalancerCache<K> {
    /// Creates an empty cache; reads fail with `NotConnected` until the
    /// first successful update.
    pub fn new(factory: Arc<dyn LoadBalancerFactory<K>>) -> Self {
        BalancerCache {
            factory,
            cell: ArcSwap::from_pointee(BalancerCell::Absent),
        }
    }

    /// Rebuilds the load balancer from a membership snapshot.
    ///
    /// An empty snapshot disconnects the client. A snapshot the factory
    /// rejects parks the rejection in the cell so subsequent sends report
    /// it instead of silently using a stale balancer.
    pub fn update(&self, endpoints: &HashSet<Endpoint>) {
        let next = if endpoints.is_empty() {
            info!("membership reported no endpoints; marking client as disconnected");
            BalancerCell::Absent
        } else {
            match self.factory.new_load_balancer(endpoints) {
                Ok(balancer) => {
                    debug!("installed load balancer over {} endpoints", endpoints.len());
                    BalancerCell::Valid(balancer)
                }
                Err(err) => {
                    error!("membership snapshot rejected: {}", err);
                    BalancerCell::Invalid(err)
                }
            }
        };
        self.cell.store(Arc::new(next));
    }

    /// Returns the current load balancer.
    pub fn read(&self) -> Result<Arc<dyn LoadBalancer<K>>> {
        let cell = self.cell.load();
        match &**cell {
            BalancerCell::Absent => Err(Error::NotConnected),
            BalancerCell::Invalid(err) => Err(Error::InvalidCluster(err.clone())),
            BalancerCell::Valid(balancer) => Ok(balancer.clone()),
        }
    }

    /// True when a usable load balancer is installed.
    pub fn is_connected(&self) -> bool {
        matches!(&**self.cell.load(), BalancerCell::Valid(_))
    }
}
