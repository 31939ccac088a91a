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

//! Per-fan-out orchestration: builds sub-requests, drives them through the
//! transport, re-routes failures, and feeds the response stream.

pub(crate) mod selective;

use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;

use futures::future::{BoxFuture, FutureExt};

use crate::balancer::{Capabilities, LoadBalancer, PartitionedId};
use crate::cluster::Node;
use crate::codec::Codec;
use crate::errors::{Error, Result};
use crate::request::{PartitionedRequest, RequestBuilder};
use crate::response::ResponseSink;
use crate::routing;
use crate::transport::Transport;

use self::selective::SelectiveRetry;

use shardcast_rt as rt;

// How many times the balancer is consulted per id when looking for a
// replacement node during a retry.
pub(crate) const MAX_REROUTE_ATTEMPTS: usize = 3;

struct Inner<K, P, R> {
    balancer: Arc<dyn LoadBalancer<K>>,
    transport: Arc<dyn Transport<K, P, R>>,
    builder: RequestBuilder<K, P>,
    codec: Arc<dyn Codec<P, R>>,
    capabilities: Capabilities,
    max_retries: usize,
    sink: ResponseSink<R>,
    selective: Option<SelectiveRetry<K>>,
}

/// Shared context of one fan-out. Cheap to clone; every spawned
/// sub-request task and watchdog hangs on to one.
pub(crate) struct Dispatch<K, P, R> {
    inner: Arc<Inner<K, P, R>>,
}

impl<K, P, R> Clone for Dispatch<K, P, R> {
    fn clone(&self) -> Self {
        Dispatch {
            inner: self.inner.clone(),
        }
    }
}

impl<K, P, R> Dispatch<K, P, R>
where
    K: PartitionedId,
    P: Send + Sync + 'static,
    R: Send + 'static,
{
    #[allow(clippy::too_many_arguments)]
    pub(crate) fn new(
        balancer: Arc<dyn LoadBalancer<K>>,
        transport: Arc<dyn Transport<K, P, R>>,
        builder: RequestBuilder<K, P>,
        codec: Arc<dyn Codec<P, R>>,
        capabilities: Capabilities,
        max_retries: usize,
        sink: ResponseSink<R>,
        selective: Option<SelectiveRetry<K>>,
    ) -> Self {
        Dispatch {
            inner: Arc::new(Inner {
                balancer,
                transport,
                builder,
                codec,
                capabilities,
                max_retries,
                sink,
                selective,
            }),
        }
    }

    /// Builds and publishes one sub-request. A payload that fails to build
    /// still produces a result; the stream never under-delivers.
    pub(crate) fn submit(&self, node: Arc<Node>, ids: HashSet<K>, attempt: usize) {
        match (self.inner.builder)(&node, &ids) {
            Ok(payload) => {
                let request = PartitionedRequest::new(
                    node.clone(),
                    ids,
                    payload,
                    self.inner.codec.clone(),
                    attempt,
                );
                if let Some(selective) = &self.inner.selective {
                    selective.note_contacted(&node, request.ids());
                    if let Some(wait) = selective.strategy().timeout_for(attempt) {
                        let watchdog = self.clone();
                        let watched = request.ids().clone();
                        rt::spawn(async move {
                            rt::sleep(wait).await;
                            watchdog.on_watchdog(watched, attempt, wait).await;
                        });
                    }
                }
                rt::spawn(self.run(request));
            }
            Err(err) => {
                warn!("failed to build a request for node {}: {}", node, err);
                let sink = self.inner.sink.clone();
                rt::spawn(async move {
                    sink.push(Err(err)).await;
                    sink.complete();
                });
            }
        }
    }

    // One sub-request from submission to its result entering the stream.
    // Boxed so a retry can recursively publish replacement sub-requests.
    //
    // Whole-sub-request retry belongs to the plain discipline only. A
    // selective fan-out re-dispatches exclusively through its watchdogs,
    // which exclude every contacted node; under it a transport failure is
    // a terminal result for the ids it covers.
    fn run(&self, request: PartitionedRequest<K, P, R>) -> BoxFuture<'static, ()> {
        let this = self.clone();
        async move {
            match this.inner.transport.send_request(&request).await {
                Ok(response) => this.deliver(request.ids(), Ok(response)).await,
                Err(err)
                    if err.is_retriable()
                        && request.attempt() < this.inner.max_retries
                        && this.inner.selective.is_none() =>
                {
                    debug!(
                        "sub-request to {} failed on attempt {}: {}",
                        request.node(),
                        request.attempt(),
                        err
                    );
                    if this.reroute(&request).is_err() {
                        // Rerouting failed too; surface the original
                        // failure rather than the routing one.
                        this.deliver(request.ids(), Err(err)).await;
                    }
                }
                Err(err) => this.deliver(request.ids(), Err(err)).await,
            }
        }
        .boxed()
    }

    // Moves the failed sub-request's ids to replacement nodes. The failed
    // slot is reused by one replacement; any further replacements are
    // accounted for before they are published.
    fn reroute(&self, failed: &PartitionedRequest<K, P, R>) -> Result<()> {
        let mut excluded = HashSet::new();
        excluded.insert(failed.node().clone());
        let assignments = routing::route_ids_excluding(
            &*self.inner.balancer,
            failed.ids(),
            &excluded,
            MAX_REROUTE_ATTEMPTS,
            &self.inner.capabilities,
        )?;
        if assignments.len() > 1 {
            self.inner.sink.extend(assignments.len() - 1);
        }
        warn!(
            "re-dispatching {} partitioned id(s) away from {} across {} node(s)",
            failed.ids().len(),
            failed.node(),
            assignments.len()
        );
        for (node, ids) in assignments {
            self.submit(node, ids, failed.attempt() + 1);
        }
        Ok(())
    }

    // Terminal step of a sub-request. Under selective retry, responses that
    // only cover already-answered ids are dropped unless duplicates are
    // allowed.
    async fn deliver(&self, ids: &HashSet<K>, result: Result<R>) {
        if let Some(selective) = &self.inner.selective {
            let fresh = selective.settle(ids);
            if fresh || selective.duplicates_ok() {
                self.inner.sink.push(result).await;
            } else {
                debug!("dropping response covering only already-answered ids");
            }
        } else {
            self.inner.sink.push(result).await;
        }
        self.inner.sink.complete();
    }

    // Fires when a sub-request's per-attempt deadline elapses. Ids that
    // are still unanswered are re-dispatched to replicas that have not been
    // contacted yet, or given up on once the strategy denies another
    // attempt.
    async fn on_watchdog(&self, ids: HashSet<K>, attempt: usize, waited: Duration) {
        let selective = match &self.inner.selective {
            Some(selective) => selective,
            None => return,
        };
        let remaining = selective.still_outstanding(&ids);
        if remaining.is_empty() {
            return;
        }
        if selective.strategy().timeout_for(attempt + 1).is_some() {
            let excluded = selective.contacted_nodes(&remaining);
            match routing::route_ids_excluding(
                &*self.inner.balancer,
                &remaining,
                &excluded,
                MAX_REROUTE_ATTEMPTS,
                &self.inner.capabilities,
            ) {
                Ok(assignments) => {
                    selective.mark_retrying(&remaining, attempt + 1);
                    warn!(
                        "{} id(s) unanswered after {:?}; re-dispatching to {} node(s)",
                        remaining.len(),
                        waited,
                        assignments.len()
                    );
                    self.inner.sink.extend(assignments.len());
                    for (node, subset) in assignments {
                        self.submit(node, subset, attempt + 1);
                    }
                }
                Err(err) => {
                    warn!(
                        "no replacement replicas for {} unanswered id(s): {}",
                        remaining.len(),
                        err
                    );
                    selective.mark_exhausted(&remaining);
                    self.inner.sink.push(Err(err)).await;
                }
            }
        } else {
            warn!(
                "{} id(s) unanswered after {:?} and the retry strategy is exhausted",
                remaining.len(),
                waited
            );
            selective.mark_exhausted(&remaining);
            self.inner.sink.push(Err(Error::Timeout(waited))).await;
        }
    }
}
