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

//! Policy types encapsulate optional parameters for the send operations.

mod client_policy;
mod retry_strategy;
mod routing_policy;
mod send_policy;

pub use self::client_policy::ClientPolicy;
pub use self::retry_strategy::RetryStrategy;
pub use self::routing_policy::RoutingPolicy;
pub use self::send_policy::SendPolicy;
