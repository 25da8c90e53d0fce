//! Settle-once result handles decoupled from their producer.
//!
//! [`deferred`] returns a [`Settler`] that the producer keeps and a
//! [`Deferred`] future that the consumer awaits. Settling consumes the
//! settler, so a handle can only ever be settled once. Dropping the settler
//! without settling resolves the future to [`RecognizerError::Closed`].

use std::future::Future;
use std::pin::Pin;
use std::task::{Context, Poll};

use tokio::sync::oneshot;

use crate::RecognizerError;

/// Creates a connected settler/future pair.
pub fn deferred<T>() -> (Settler<T>, Deferred<T>) {
    let (tx, rx) = oneshot::channel();
    (Settler { tx }, Deferred { rx })
}

/// Producer half of a [`Deferred`].
#[derive(Debug)]
pub struct Settler<T> {
    tx: oneshot::Sender<Result<T, RecognizerError>>,
}

impl<T> Settler<T> {
    /// Settles successfully. Returns `false` if the consumer is gone.
    pub fn resolve(self, value: T) -> bool {
        self.settle(Ok(value))
    }

    /// Settles with a failure. Returns `false` if the consumer is gone.
    pub fn reject(self, err: RecognizerError) -> bool {
        self.settle(Err(err))
    }

    pub fn settle(self, outcome: Result<T, RecognizerError>) -> bool {
        self.tx.send(outcome).is_ok()
    }

    /// Returns `true` once the consumer has dropped its future.
    pub fn is_abandoned(&self) -> bool {
        self.tx.is_closed()
    }
}

/// Consumer half: resolves to whatever the [`Settler`] settles with.
#[derive(Debug)]
pub struct Deferred<T> {
    rx: oneshot::Receiver<Result<T, RecognizerError>>,
}

impl<T> Deferred<T> {
    /// An already-rejected handle.
    pub fn rejected(err: RecognizerError) -> Self {
        let (settler, deferred) = deferred();
        settler.reject(err);
        deferred
    }

    /// An already-resolved handle.
    pub fn resolved(value: T) -> Self {
        let (settler, deferred) = deferred();
        settler.resolve(value);
        deferred
    }
}

impl<T> Future for Deferred<T> {
    type Output = Result<T, RecognizerError>;

    fn poll(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        Pin::new(&mut self.get_mut().rx)
            .poll(cx)
            .map(|r| r.unwrap_or(Err(RecognizerError::Closed)))
    }
}
