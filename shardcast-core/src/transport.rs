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

use async_trait::async_trait;

use crate::errors::Result;
use crate::request::PartitionedRequest;

/// The wire layer the dispatch core hands sub-requests to.
///
/// One call resolves exactly once per sub-request, successfully or not;
/// the core never re-polls a sub-request. Failures the transport reports
/// with `Error::Transport { retriable: true, .. }` are eligible for
/// re-routing to an alternate replica.
#[async_trait]
pub trait Transport<K, P, R>: Send + Sync {
    /// Sends one sub-request and resolves with its response.
    async fn send_request(&self, request: &PartitionedRequest<K, P, R>) -> Result<R>;
}
