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

/// `ClientPolicy` encapsulates parameters that apply to every request a
/// client instance dispatches.
#[derive(Debug, Clone)]
pub struct ClientPolicy {
    /// Capacity of the per-send response queue. Producers await when the
    /// queue is full, so a slow consumer back-pressures the transport
    /// callbacks rather than dropping results. `None` means unbounded.
    ///
    /// Default: 1024.
    pub response_queue_size: Option<usize>,
}

impl Default for ClientPolicy {
    fn default() -> Self {
        ClientPolicy {
            response_queue_size: Some(1024),
        }
    }
}
