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

use std::sync::atomic::{AtomicBool, AtomicIsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_channel::{bounded, unbounded, Receiver, Sender};

use crate::errors::{Error, Result};

struct Shared<R> {
    // Sub-requests still expected to complete. Retries may grow this
    // before they publish additional sub-requests.
    outstanding: AtomicIsize,
    active: AtomicBool,
    sender: Sender<Result<R>>,
}

/// Streams the results of one fan-out back to the caller.
///
/// Sub-request completions arrive from many transport tasks and are handed
/// to the single consumer in completion order. The stream ends once every
/// expected sub-request has completed, or earlier when it is closed.
pub struct ResponseStream<R> {
    shared: Arc<Shared<R>>,
    receiver: Receiver<Result<R>>,
}

/// Producer handle held by the dispatch machinery.
///
/// `extend` must be called before the additional sub-requests it accounts
/// for are published, so the stream can never observe completion while
/// results are still owed.
pub(crate) struct ResponseSink<R> {
    shared: Arc<Shared<R>>,
}

impl<R> Clone for ResponseSink<R> {
    fn clone(&self) -> Self {
        ResponseSink {
            shared: self.shared.clone(),
        }
    }
}

impl<R> ResponseStream<R> {
    pub(crate) fn new(expected: usize, queue_size: Option<usize>) -> (Self, ResponseSink<R>) {
        let (sender, receiver) = match queue_size {
            Some(capacity) => bounded(capacity.max(1)),
            None => unbounded(),
        };
        if expected == 0 {
            // Nothing will ever be produced; drain immediately.
            sender.close();
        }
        let shared = Arc::new(Shared {
            outstanding: AtomicIsize::new(expected as isize),
            active: AtomicBool::new(true),
            sender,
        });
        let stream = ResponseStream {
            shared: shared.clone(),
            receiver,
        };
        (stream, ResponseSink { shared })
    }

    /// Returns the next result, or `None` when every expected sub-request
    /// has completed or the stream was closed.
    pub async fn next(&self) -> Option<Result<R>> {
        self.receiver.recv().await.ok()
    }

    /// Like [`next`](Self::next), but gives up after `wait`.
    ///
    /// `Ok(None)` means the stream has ended; `Err(Timeout)` means no
    /// result arrived in time.
    pub async fn next_timeout(&self, wait: Duration) -> Result<Option<R>> {
        match shardcast_rt::timeout(wait, self.receiver.recv()).await {
            Ok(Ok(result)) => result.map(Some),
            Ok(Err(_)) => Ok(None),
            Err(_) => Err(Error::Timeout(wait)),
        }
    }

    /// Returns the next result, blocking the current thread.
    pub fn next_blocking(&self) -> Option<Result<R>> {
        self.receiver.recv_blocking().ok()
    }

    /// Stops the stream. Results still in flight are dropped when they
    /// arrive; in-flight sub-requests are not rescinded from the
    /// transport. Closing twice is harmless.
    pub fn close(&self) {
        self.shared.sender.close();
        self.shared.active.store(false, Ordering::Relaxed);
    }

    /// False once the stream has been closed.
    pub fn is_active(&self) -> bool {
        self.shared.active.load(Ordering::Relaxed)
    }

    /// Number of sub-requests that have not completed yet.
    pub fn outstanding(&self) -> usize {
        self.shared.outstanding.load(Ordering::SeqCst).max(0) as usize
    }

    /// Adapts the stream to a `futures::Stream`.
    pub fn to_stream<'a>(&'a self) -> impl futures::Stream<Item = Result<R>> + Unpin + 'a {
        Box::pin(futures::stream::unfold(
            self.receiver.clone(),
            |recv| async move {
                match recv.recv().await {
                    Ok(result) => Some((result, recv)),
                    Err(_) => None,
                }
            },
        ))
    }
}

impl<'a, R> Iterator for &'a ResponseStream<R> {
    type Item = Result<R>;

    fn next(&mut self) -> Option<Result<R>> {
        self.receiver.recv_blocking().ok()
    }
}

impl<R> ResponseSink<R> {
    /// Delivers one result. Results pushed after the stream was closed are
    /// dropped.
    pub(crate) async fn push(&self, result: Result<R>) {
        if self.shared.sender.send(result).await.is_err() {
            debug!("response arrived after its stream was closed; dropping");
        }
    }

    /// Accounts for `additional` sub-requests about to be published.
    pub(crate) fn extend(&self, additional: usize) {
        self.shared
            .outstanding
            .fetch_add(additional as isize, Ordering::SeqCst);
    }

    /// Marks one sub-request as complete; the last completion ends the
    /// stream.
    pub(crate) fn complete(&self) {
        if self.shared.outstanding.fetch_sub(1, Ordering::SeqCst) == 1 {
            self.shared.sender.close();
        }
    }
}
