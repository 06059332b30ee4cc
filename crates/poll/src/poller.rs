//! Generic polling engine.
//!
//! A [`Poller`] is a factory: every [`Poller::start`] call spawns an
//! independent loop that awaits a request, delivers its result, sleeps for
//! the configured delay and repeats until its [`PollHandle`] is cancelled.

use std::future::Future;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use futures_util::FutureExt;
use futures_util::future::BoxFuture;
use tokio_util::sync::CancellationToken;
use tracing::trace;

/// Issues one request of a polling loop.
pub type RequestFn<T> = Box<dyn FnMut() -> BoxFuture<'static, T> + Send>;

/// Receives each result of a polling loop.
pub type ResultFn<T> = Box<dyn FnMut(T) + Send>;

/// The request/result pair driving one polling loop.
pub struct PollRequest<T> {
    request: RequestFn<T>,
    on_result: ResultFn<T>,
}

impl<T: Send + 'static> PollRequest<T> {
    pub fn new<R, Fut, O>(mut request: R, on_result: O) -> Self
    where
        R: FnMut() -> Fut + Send + 'static,
        Fut: Future<Output = T> + Send + 'static,
        O: FnMut(T) + Send + 'static,
    {
        Self {
            request: Box::new(move || request().boxed()),
            on_result: Box::new(on_result),
        }
    }
}

type BuildFn<A, T> = dyn Fn(A) -> PollRequest<T> + Send + Sync;

/// Factory of independent, cancellable polling loops.
pub struct Poller<A, T> {
    build: Arc<BuildFn<A, T>>,
    delay: Duration,
}

impl<A, T> Clone for Poller<A, T> {
    fn clone(&self) -> Self {
        Self {
            build: Arc::clone(&self.build),
            delay: self.delay,
        }
    }
}

impl<A, T: Send + 'static> Poller<A, T> {
    /// Creates a poller. `build` turns the arguments of each
    /// [`start`](Self::start) call into the request/result pair of that loop.
    pub fn new<F>(build: F, delay: Duration) -> Self
    where
        F: Fn(A) -> PollRequest<T> + Send + Sync + 'static,
    {
        Self {
            build: Arc::new(build),
            delay,
        }
    }

    /// Delay between the end of one request and the start of the next.
    pub fn delay(&self) -> Duration {
        self.delay
    }

    /// Starts a new polling loop. The first request is issued immediately.
    ///
    /// Must be called from within a tokio runtime.
    pub fn start(&self, args: A) -> PollHandle {
        PollHandle::spawn((self.build)(args), self.delay)
    }
}

/// Starts a one-off polling loop without keeping a factory around.
pub fn poll_every<T, R, Fut, O>(delay: Duration, request: R, on_result: O) -> PollHandle
where
    T: Send + 'static,
    R: FnMut() -> Fut + Send + 'static,
    Fut: Future<Output = T> + Send + 'static,
    O: FnMut(T) + Send + 'static,
{
    PollHandle::spawn(PollRequest::new(request, on_result), delay)
}

/// Cancellation shared by a loop and its handle.
///
/// Delivery and cancellation both run under `delivery`, so once
/// [`PollHandle::cancel`] returns no result of the loop can be delivered.
#[derive(Debug, Default)]
struct LoopControl {
    cancel: CancellationToken,
    delivery: Mutex<()>,
}

impl LoopControl {
    fn lock(&self) -> MutexGuard<'_, ()> {
        self.delivery.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn cancel(&self) {
        let _delivery = self.lock();
        self.cancel.cancel();
    }
}

/// Stops a polling loop when cancelled or dropped.
///
/// A request already in flight runs to completion, but its result is
/// discarded and nothing is rescheduled.
///
/// `cancel` waits for a delivery in progress to finish, so a result
/// callback must not cancel its own loop.
#[must_use = "dropping a PollHandle stops its polling loop"]
#[derive(Debug)]
pub struct PollHandle {
    control: Arc<LoopControl>,
}

impl PollHandle {
    fn spawn<T: Send + 'static>(request: PollRequest<T>, delay: Duration) -> Self {
        let control = Arc::new(LoopControl::default());
        tokio::spawn(poll_loop(request, delay, Arc::clone(&control)));
        Self { control }
    }

    /// Stops the loop. No result is delivered after this returns.
    pub fn cancel(&self) {
        self.control.cancel();
    }

    pub fn is_cancelled(&self) -> bool {
        self.control.cancel.is_cancelled()
    }
}

impl Drop for PollHandle {
    fn drop(&mut self) {
        self.control.cancel();
    }
}

async fn poll_loop<T>(mut req: PollRequest<T>, delay: Duration, control: Arc<LoopControl>) {
    loop {
        if control.cancel.is_cancelled() {
            break;
        }

        let value = (req.request)().await;

        {
            let _delivery = control.lock();
            if control.cancel.is_cancelled() {
                break;
            }
            (req.on_result)(value);
        }

        tokio::select! {
            _ = control.cancel.cancelled() => break,
            _ = tokio::time::sleep(delay) => {}
        }
    }
    trace!("poll loop stopped");
}
