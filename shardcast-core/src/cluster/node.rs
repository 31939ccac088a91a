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

use std::fmt;
use std::hash::{Hash, Hasher};
use std::result::Result as StdResult;
use std::sync::Arc;

/// A cluster node: an identity plus the address the transport dials.
///
/// The dispatch core only ever compares, hashes and displays nodes; what a
/// name or address means is up to the membership subsystem and the
/// transport.
#[derive(Debug, Clone)]
pub struct Node {
    name: String,
    address: String,
}

impl Node {
    /// Creates a node from its identity and address.
    pub fn new(name: impl Into<String>, address: impl Into<String>) -> Self {
        Node {
            name: name.into(),
            address: address.into(),
        }
    }

    /// Returns the node name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the node address.
    pub fn address(&self) -> &str {
        &self.address
    }
}

impl Hash for Node {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.name.hash(state);
    }
}

impl PartialEq for Node {
    fn eq(&self, other: &Node) -> bool {
        self.name == other.name
    }
}

impl Eq for Node {}

impl fmt::Display for Node {
    fn fmt(&self, f: &mut fmt::Formatter) -> StdResult<(), fmt::Error> {
        format!("{}: {}", self.name, self.address).fmt(f)
    }
}

/// A node as reported by the cluster-membership subsystem, together with
/// whether it is currently able to serve requests.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Endpoint {
    node: Arc<Node>,
    can_serve: bool,
}

impl Endpoint {
    /// Creates an endpoint for the given node.
    pub fn new(node: Arc<Node>, can_serve: bool) -> Self {
        Endpoint { node, can_serve }
    }

    /// The node this endpoint describes.
    pub fn node(&self) -> &Arc<Node> {
        &self.node
    }

    /// True when the membership subsystem reports the node as live.
    pub fn can_serve_requests(&self) -> bool {
        self.can_serve
    }
}
