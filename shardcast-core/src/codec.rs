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

use crate::errors::Result;

/// Converts request payloads and response bytes at the transport boundary.
///
/// The dispatch core never invokes the codec itself; it threads one through
/// each sub-request so the transport has it at hand, including on
/// sub-requests rebuilt for a retry.
pub trait Codec<P, R>: Send + Sync {
    /// Encodes a request payload into wire bytes.
    fn encode(&self, payload: &P) -> Result<Vec<u8>>;

    /// Decodes a response from wire bytes.
    fn decode(&self, bytes: &[u8]) -> Result<R>;
}
