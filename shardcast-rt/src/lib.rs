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

//! Uniform surface over the supported async runtimes. The rest of the
//! workspace imports `spawn`, `sleep`, `timeout` and `time` from here and
//! stays runtime-agnostic.

#[cfg(not(any(feature = "rt-tokio", feature = "rt-async-std")))]
compile_error!("Please select a runtime from ['rt-tokio', 'rt-async-std']");

#[cfg(all(feature = "rt-tokio", feature = "rt-async-std"))]
compile_error!("Please select only one runtime");

#[cfg(all(feature = "rt-tokio", not(feature = "rt-async-std")))]
pub use tokio::{
    self, task, task::spawn, task::yield_now, time, time::sleep, time::timeout,
};

#[cfg(all(feature = "rt-async-std", not(feature = "rt-tokio")))]
pub use async_std::{
    self, future::timeout, task, task::sleep, task::spawn, task::yield_now,
};

#[cfg(all(feature = "rt-async-std", not(feature = "rt-tokio")))]
pub use std::time;
