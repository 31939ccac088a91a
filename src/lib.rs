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

//! Client-side dispatch core for partitioned RPC clusters.
//!
//! The `async` feature (on by default) exposes the asynchronous client
//! from `shardcast-core`; the `sync` feature adds a blocking adapter under
//! [`sync`]. Exactly one of the `rt-tokio` / `rt-async-std` features
//! selects the runtime the sub-request tasks run on.

#[cfg(feature = "async")]
pub use shardcast_core::*;

/// Blocking adapter over the asynchronous client.
#[cfg(feature = "sync")]
pub mod sync {
    pub use shardcast_sync::Client;
}
