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
use std::sync::{Arc, Mutex, PoisonError};

use crate::balancer::PartitionedId;
use crate::cluster::Node;
use crate::policy::RetryStrategy;

// Where one partitioned id stands within a selective-retry fan-out.
enum IdState {
    // Waiting for the first covering response.
    Awaiting,
    // Re-dispatched; the value is the current attempt.
    Retrying(usize),
    // A covering response (or terminal failure) has been delivered.
    Satisfied,
    // The retry strategy gave up; one failure result was delivered.
    Exhausted,
}

struct State<K> {
    ids: HashMap<K, IdState>,
    contacted: HashMap<K, HashSet<Arc<Node>>>,
}

/// Book-keeping for selective retry: which ids are still unanswered and
/// which nodes have already been asked about each of them.
pub(crate) struct SelectiveRetry<K> {
    strategy: RetryStrategy,
    duplicates_ok: bool,
    state: Mutex<State<K>>,
}

impl<K: PartitionedId> SelectiveRetry<K> {
    pub(crate) fn new(strategy: RetryStrategy, duplicates_ok: bool) -> Self {
        SelectiveRetry {
            strategy,
            duplicates_ok,
            state: Mutex::new(State {
                ids: HashMap::new(),
                contacted: HashMap::new(),
            }),
        }
    }

    pub(crate) fn strategy(&self) -> &RetryStrategy {
        &self.strategy
    }

    pub(crate) fn duplicates_ok(&self) -> bool {
        self.duplicates_ok
    }

    // Registers a sub-request: its ids are outstanding and its node has
    // now been contacted about each of them.
    pub(crate) fn note_contacted(&self, node: &Arc<Node>, ids: &HashSet<K>) {
        let mut state = self.lock();
        for id in ids {
            state.ids.entry(id.clone()).or_insert(IdState::Awaiting);
            state
                .contacted
                .entry(id.clone())
                .or_default()
                .insert(node.clone());
        }
    }

    // Marks the covered ids as answered. Returns true when the response
    // answered at least one id that was still outstanding; false means it
    // was a duplicate.
    pub(crate) fn settle(&self, ids: &HashSet<K>) -> bool {
        let mut state = self.lock();
        let fresh = ids.iter().any(|id| {
            matches!(
                state.ids.get(id),
                None | Some(IdState::Awaiting) | Some(IdState::Retrying(_))
            )
        });
        for id in ids {
            state.ids.insert(id.clone(), IdState::Satisfied);
        }
        fresh
    }

    // The subset of `ids` that has not been answered or given up on.
    pub(crate) fn still_outstanding(&self, ids: &HashSet<K>) -> HashSet<K> {
        let state = self.lock();
        ids.iter()
            .filter(|id| {
                matches!(
                    state.ids.get(*id),
                    Some(IdState::Awaiting) | Some(IdState::Retrying(_))
                )
            })
            .cloned()
            .collect()
    }

    // Every node already contacted about any of `ids`; a retry must look
    // elsewhere.
    pub(crate) fn contacted_nodes(&self, ids: &HashSet<K>) -> HashSet<Arc<Node>> {
        let state = self.lock();
        let mut nodes = HashSet::new();
        for id in ids {
            if let Some(contacted) = state.contacted.get(id) {
                nodes.extend(contacted.iter().cloned());
            }
        }
        nodes
    }

    pub(crate) fn mark_retrying(&self, ids: &HashSet<K>, attempt: usize) {
        let mut state = self.lock();
        for id in ids {
            state.ids.insert(id.clone(), IdState::Retrying(attempt));
        }
    }

    pub(crate) fn mark_exhausted(&self, ids: &HashSet<K>) {
        let mut state = self.lock();
        for id in ids {
            state.ids.insert(id.clone(), IdState::Exhausted);
        }
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, State<K>> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
