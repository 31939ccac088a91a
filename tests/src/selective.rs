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

use std::sync::Arc;
use std::time::Duration;

use crate::src::common::{
    collect, connected_client, ids, node, ping_builder, Behavior, MockTransport,
    RotatingBalancer,
};
use shardcast::{Error, RetryStrategy, SendPolicy};

fn selective_policy(initial_ms: u64, max_attempts: usize, duplicates_ok: bool) -> SendPolicy {
    let mut policy = SendPolicy::default();
    policy.routing.selective_retry = true;
    policy.routing.duplicates_ok = duplicates_ok;
    policy.retry_strategy = Some(RetryStrategy {
        initial_timeout: Duration::from_millis(initial_ms),
        backoff_multiplier: 2,
        max_attempts,
    });
    policy
}

#[shardcast_macro::test]
async fn unanswered_ids_are_redispatched_and_the_late_duplicate_is_dropped() {
    let _ = env_logger::try_init();

    let (n1, n2, n3) = (node("n1"), node("n2"), node("n3"));
    let transport = Arc::new(MockTransport::new());
    transport.set("n2", Behavior::Stall(Duration::from_millis(400)));
    let client = connected_client(
        RotatingBalancer::new(vec![
            (1, vec![n1]),
            (2, vec![n2, n3]),
        ]),
        transport.clone(),
    );

    let policy = selective_policy(60, 2, false);
    let stream = client
        .send(ids(&[1, 2]), &policy, ping_builder("selective"))
        .unwrap();
    let results = collect(&stream).await;

    // n1 answers id 1; id 2 stalls on n2, is re-dispatched to n3, and the
    // eventual slow answer from n2 only covers an already-answered id.
    assert_eq!(results.len(), 2);
    let mut answered_by: Vec<(String, Vec<u64>)> = results
        .iter()
        .map(|r| {
            let pong = r.as_ref().unwrap();
            (pong.node.clone(), pong.ids.clone())
        })
        .collect();
    answered_by.sort();
    assert_eq!(
        answered_by,
        vec![
            ("n1".to_string(), vec![1]),
            ("n3".to_string(), vec![2]),
        ]
    );
    assert_eq!(transport.calls_to("n2"), 1);
    assert_eq!(transport.calls_to("n3"), 1);
}

#[shardcast_macro::test]
async fn late_duplicates_are_delivered_when_allowed() {
    let _ = env_logger::try_init();

    let (n2, n3) = (node("n2"), node("n3"));
    let transport = Arc::new(MockTransport::new());
    transport.set("n2", Behavior::Stall(Duration::from_millis(300)));
    let client = connected_client(
        RotatingBalancer::new(vec![(2, vec![n2, n3]), (1, vec![node("n1")])]),
        transport.clone(),
    );

    let policy = selective_policy(50, 2, true);
    let stream = client
        .send(ids(&[1, 2]), &policy, ping_builder("dups"))
        .unwrap();
    let results = collect(&stream).await;

    // Fast answer for id 1, retried answer from n3, and the late answer
    // from n2 is kept because duplicates are allowed.
    assert_eq!(results.len(), 3);
    let covering_two = results
        .iter()
        .filter(|r| r.as_ref().map(|pong| pong.ids == vec![2]).unwrap_or(false))
        .count();
    assert_eq!(covering_two, 2);
}

#[shardcast_macro::test]
async fn exhausted_retry_strategy_surfaces_a_timeout() {
    let _ = env_logger::try_init();

    let (n1, n2) = (node("n1"), node("n2"));
    let transport = Arc::new(MockTransport::new());
    transport.set("n2", Behavior::Stall(Duration::from_millis(300)));
    let client = connected_client(
        RotatingBalancer::new(vec![(1, vec![n1]), (9, vec![n2])]),
        transport.clone(),
    );

    // One timed attempt only: the first deadline already exhausts the
    // strategy for id 9.
    let policy = selective_policy(40, 1, false);
    let stream = client
        .send(ids(&[1, 9]), &policy, ping_builder("exhaust"))
        .unwrap();
    let results = collect(&stream).await;

    assert_eq!(results.len(), 2);
    assert!(results.iter().any(|r| r.is_ok()));
    assert!(results
        .iter()
        .any(|r| matches!(r, Err(Error::Timeout(_)))));
    // The stalled node was never asked twice.
    assert_eq!(transport.calls_to("n2"), 1);
}

#[shardcast_macro::test]
async fn missing_replacement_replicas_surface_no_nodes_available() {
    let _ = env_logger::try_init();

    let (n1, n2) = (node("n1"), node("n2"));
    let transport = Arc::new(MockTransport::new());
    transport.set("n2", Behavior::Stall(Duration::from_millis(300)));
    let client = connected_client(
        RotatingBalancer::new(vec![(1, vec![n1]), (9, vec![n2])]),
        transport.clone(),
    );

    // The strategy would allow another attempt, but id 9 has no replica
    // other than the stalled one.
    let policy = selective_policy(40, 3, false);
    let stream = client
        .send(ids(&[1, 9]), &policy, ping_builder("isolated"))
        .unwrap();
    let results = collect(&stream).await;

    assert_eq!(results.len(), 2);
    assert!(results
        .iter()
        .any(|r| matches!(r, Err(Error::NoNodesAvailable(_)))));
    assert_eq!(transport.calls_to("n2"), 1);
}

#[shardcast_macro::test]
async fn transport_failures_are_not_rerouted_under_selective_retry() {
    let _ = env_logger::try_init();

    let (n1, n2, n3) = (node("n1"), node("n2"), node("n3"));
    let transport = Arc::new(MockTransport::new());
    transport.set("n2", Behavior::Fail { retriable: true });
    let client = connected_client(
        RotatingBalancer::new(vec![
            (1, vec![n1]),
            (2, vec![n2, n3]),
        ]),
        transport.clone(),
    );

    // A retry budget is set, but the fan-out runs under selective retry:
    // the two disciplines never combine, so the retriable failure is a
    // terminal result for id 2 and nothing is re-routed to n3.
    let mut policy = selective_policy(60, 2, false);
    policy.max_retries = 2;
    let stream = client
        .send(ids(&[1, 2]), &policy, ping_builder("exclusive"))
        .unwrap();
    let results = collect(&stream).await;

    assert_eq!(results.len(), 2);
    assert!(results
        .iter()
        .any(|r| r.as_ref().map(|pong| pong.node == "n1").unwrap_or(false)));
    assert!(results
        .iter()
        .any(|r| matches!(r, Err(Error::Transport { .. }))));
    assert_eq!(transport.calls_to("n2"), 1);
    assert_eq!(transport.calls_to("n3"), 0);
}

#[shardcast_macro::test]
async fn single_node_fan_out_stays_on_the_plain_discipline() {
    let _ = env_logger::try_init();

    let n1 = node("n1");
    let transport = Arc::new(MockTransport::new());
    transport.set("n1", Behavior::Stall(Duration::from_millis(150)));
    let client = connected_client(
        RotatingBalancer::new(vec![(1, vec![n1.clone()]), (2, vec![n1])]),
        transport.clone(),
    );

    // Selective retry requires a fan-out wider than one node; here the
    // slow answer is simply delivered once it arrives.
    let policy = selective_policy(30, 3, false);
    let stream = client
        .send(ids(&[1, 2]), &policy, ping_builder("narrow"))
        .unwrap();
    let results = collect(&stream).await;

    assert_eq!(results.len(), 1);
    assert!(results[0].is_ok());
    assert_eq!(transport.calls_to("n1"), 1);
}
