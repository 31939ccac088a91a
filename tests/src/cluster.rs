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

use std::collections::HashSet;
use std::sync::Arc;

use crate::src::common::{
    collect, endpoints, ids, node, FirstEndpointFactory, MockTransport, Ping, PlainCodec,
    RejectingFactory,
};
use shardcast::{Client, ClientPolicy, Error, SendPolicy};

fn membership_client(transport: Arc<MockTransport>) -> Client<u64, Ping, crate::src::common::Pong> {
    Client::new(
        Arc::new(FirstEndpointFactory),
        transport,
        Arc::new(PlainCodec),
        ClientPolicy::default(),
    )
}

#[shardcast_macro::test]
async fn sending_before_the_first_snapshot_is_not_connected() {
    let _ = env_logger::try_init();

    let client = membership_client(Arc::new(MockTransport::new()));
    assert!(!client.is_connected());
    let result = client.send_uniform(ids(&[1]), &SendPolicy::default(), Ping("ping".into()));
    assert!(matches!(result, Err(Error::NotConnected)));
}

#[shardcast_macro::test]
async fn membership_updates_reroute_subsequent_sends() {
    let _ = env_logger::try_init();

    let transport = Arc::new(MockTransport::new());
    let client = membership_client(transport.clone());

    let (n1, n2) = (node("n1"), node("n2"));
    client.update_load_balancer(&endpoints(&[&n1]));
    assert!(client.is_connected());

    let stream = client
        .send_uniform(ids(&[1]), &SendPolicy::default(), Ping("ping".into()))
        .unwrap();
    let results = collect(&stream).await;
    assert_eq!(results[0].as_ref().unwrap().node, "n1");

    // A send that begins after the swap observes the new balancer.
    client.update_load_balancer(&endpoints(&[&n2]));
    let stream = client
        .send_uniform(ids(&[1]), &SendPolicy::default(), Ping("ping".into()))
        .unwrap();
    let results = collect(&stream).await;
    assert_eq!(results[0].as_ref().unwrap().node, "n2");
}

#[shardcast_macro::test]
async fn an_empty_snapshot_disconnects_the_client() {
    let _ = env_logger::try_init();

    let client = membership_client(Arc::new(MockTransport::new()));
    let n1 = node("n1");
    client.update_load_balancer(&endpoints(&[&n1]));
    assert!(client.is_connected());

    client.update_load_balancer(&HashSet::new());
    assert!(!client.is_connected());
    let result = client.send_uniform(ids(&[1]), &SendPolicy::default(), Ping("ping".into()));
    assert!(matches!(result, Err(Error::NotConnected)));
}

#[shardcast_macro::test]
async fn a_rejected_snapshot_fails_every_send_until_replaced() {
    let _ = env_logger::try_init();

    let client: Client<u64, Ping, crate::src::common::Pong> = Client::new(
        Arc::new(RejectingFactory),
        Arc::new(MockTransport::new()),
        Arc::new(PlainCodec),
        ClientPolicy::default(),
    );
    let n1 = node("n1");
    client.update_load_balancer(&endpoints(&[&n1]));

    for _ in 0..2 {
        match client.send_uniform(ids(&[1]), &SendPolicy::default(), Ping("ping".into())) {
            Err(Error::InvalidCluster(err)) => {
                assert_eq!(err.message, "endpoints span two clusters");
            }
            other => panic!("expected the cached cluster error, got {:?}", other.is_ok()),
        }
    }
}
