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

//! Error and Result types for the shardcast client.
//!
//! Precondition violations surface synchronously from the send calls;
//! per-sub-request failures never do. They are delivered through the
//! response stream as `Err` results instead.

use std::time::Duration;

use crate::cluster::Node;

/// Result type used throughout the crate.
pub type Result<T> = std::result::Result<T, Error>;

/// An endpoint set that could not be assembled into a load balancer.
///
/// The membership cache holds on to this error and returns it from every
/// send attempt until the next successful membership update.
#[derive(Debug, Clone, thiserror::Error)]
#[error("invalid cluster: {message}")]
pub struct InvalidClusterError {
    /// Description of why the endpoint set was rejected.
    pub message: String,
}

impl InvalidClusterError {
    /// Creates a new invalid-cluster error with the given description.
    pub fn new(message: impl Into<String>) -> Self {
        InvalidClusterError {
            message: message.into(),
        }
    }
}

/// The error type for all client operations.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// No load balancer has been installed yet; the client has not seen a
    /// usable membership snapshot.
    #[error("client is not connected to a cluster")]
    NotConnected,

    /// The most recent membership snapshot did not form a valid cluster.
    #[error(transparent)]
    InvalidCluster(#[from] InvalidClusterError),

    /// The router could not place one or more partitioned ids on a node.
    #[error("no nodes available: {0}")]
    NoNodesAvailable(String),

    /// A caller-supplied argument was out of range.
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// A sub-request failed inside the transport. Retriable failures are
    /// eligible for re-routing to an alternate replica.
    #[error("request to node `{node}` failed: {message}")]
    Transport {
        /// Name of the node the sub-request was addressed to.
        node: String,
        /// Transport-supplied failure description.
        message: String,
        /// Whether the transport considers the failure safe to retry
        /// against a different replica.
        retriable: bool,
    },

    /// Request or response bytes could not be converted.
    #[error("codec error: {0}")]
    Codec(String),

    /// The response stream was closed before this result was consumed.
    #[error("response stream was cancelled")]
    Cancelled,

    /// A consumer-side or retry deadline elapsed.
    #[error("timed out after {0:?}")]
    Timeout(Duration),
}

impl Error {
    /// Builds a transport failure for the given node.
    pub fn transport(node: &Node, message: impl Into<String>, retriable: bool) -> Self {
        Error::Transport {
            node: node.name().to_string(),
            message: message.into(),
            retriable,
        }
    }

    /// True when the failure may be retried against an alternate replica.
    pub fn is_retriable(&self) -> bool {
        matches!(
            self,
            Error::Transport {
                retriable: true,
                ..
            }
        )
    }
}
