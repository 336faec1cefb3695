//! Single-consumer dispatch queue.
//!
//! Connection threads never touch host state. They [`DispatchQueue::submit`]
//! a request and block on a private reply channel while the single
//! [`HostLoop`] consumer executes jobs one at a time in arrival order. A
//! handler that panics still produces a failure reply, and the loop carries on
//! with the next job.

use std::any::Any;
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::mpsc::{self, Receiver, RecvTimeoutError, Sender, SyncSender, TryRecvError};
use std::time::{Duration, Instant};

use tracing::{debug, info, warn};

use conduit_protocol::{CommandRequest, Reply};

use super::errors::DispatchError;
use super::registry::CommandRegistry;
use super::sanitize::sanitize;

pub(crate) const QUEUE_TARGET: &str = concat!(env!("CARGO_PKG_NAME"), "::dispatch");

#[derive(Debug)]
enum Message {
    Run(Job),
    Stop,
}

#[derive(Debug)]
struct Job {
    request: CommandRequest,
    reply: SyncSender<Reply>,
    enqueued: Instant,
}

/// Counters shared between the queue producers and the host loop.
#[derive(Debug, Default)]
pub struct QueueStats {
    submitted: AtomicU64,
    completed: AtomicU64,
    panicked: AtomicU64,
}

impl QueueStats {
    /// Jobs accepted onto the queue.
    pub fn submitted(&self) -> u64 {
        self.submitted.load(Ordering::SeqCst)
    }

    /// Jobs the host loop has finished, successfully or not.
    pub fn completed(&self) -> u64 {
        self.completed.load(Ordering::SeqCst)
    }

    /// Jobs whose handler panicked.
    pub fn panicked(&self) -> u64 {
        self.panicked.load(Ordering::SeqCst)
    }

    /// Jobs accepted but not yet finished.
    pub fn pending(&self) -> u64 {
        self.submitted().saturating_sub(self.completed())
    }
}

/// Producer side of the dispatch queue. Cheap to clone.
#[derive(Debug, Clone)]
pub struct DispatchQueue {
    sender: Sender<Message>,
    stats: Arc<QueueStats>,
    command_timeout: Duration,
}

/// Consumer side of the dispatch queue; owned by the host thread.
#[derive(Debug)]
pub struct HostLoop {
    receiver: Receiver<Message>,
    stats: Arc<QueueStats>,
}

/// Outcome of a finished [`HostLoop::run`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct LoopSummary {
    /// Jobs executed before the loop stopped.
    pub executed: u64,
    /// Jobs still queued at shutdown and answered with a failure.
    pub rejected: u64,
}

/// Result of a non-blocking [`HostLoop::drain_pending`] pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PumpStatus {
    /// The queue is empty; call again on the next host tick.
    Idle {
        /// Jobs executed during this pass.
        executed: u64,
    },
    /// A stop was requested; call [`HostLoop::finish`] next.
    Stopped {
        /// Jobs executed during this pass.
        executed: u64,
    },
}

/// Creates a connected producer/consumer pair.
///
/// `command_timeout` bounds how long a submitter waits for its reply.
pub fn dispatch_queue(command_timeout: Duration) -> (DispatchQueue, HostLoop) {
    let (sender, receiver) = mpsc::channel();
    let stats = Arc::new(QueueStats::default());
    (
        DispatchQueue {
            sender,
            stats: Arc::clone(&stats),
            command_timeout,
        },
        HostLoop { receiver, stats },
    )
}

impl DispatchQueue {
    /// Enqueues a request and blocks until the host loop replies.
    ///
    /// Never fails: a stopped loop, a dropped job, or a timeout all become
    /// `HostExecutionFailure` replies.
    pub fn submit(&self, request: CommandRequest) -> Reply {
        let command = request.command.clone();
        let (reply_tx, reply_rx) = mpsc::sync_channel(1);
        let job = Job {
            request,
            reply: reply_tx,
            enqueued: Instant::now(),
        };
        if self.sender.send(Message::Run(job)).is_err() {
            debug!(
                target: QUEUE_TARGET,
                command = %command,
                "host loop gone; rejecting submission"
            );
            return failure(&DispatchError::HostUnavailable);
        }
        self.stats.submitted.fetch_add(1, Ordering::SeqCst);
        match reply_rx.recv_timeout(self.command_timeout) {
            Ok(reply) => reply,
            Err(RecvTimeoutError::Timeout) => {
                warn!(
                    target: QUEUE_TARGET,
                    command = %command,
                    timeout_secs = self.command_timeout.as_secs_f64(),
                    "command timed out waiting for the host loop"
                );
                failure(&DispatchError::host(format!(
                    "command '{command}' did not complete within {:.1}s",
                    self.command_timeout.as_secs_f64()
                )))
            }
            Err(RecvTimeoutError::Disconnected) => failure(&DispatchError::HostUnavailable),
        }
    }

    /// Asks the host loop to stop after the jobs already queued ahead of it.
    ///
    /// Returns `false` when the loop has already gone away.
    pub fn request_stop(&self) -> bool {
        self.sender.send(Message::Stop).is_ok()
    }

    /// Shared queue counters.
    pub fn stats(&self) -> Arc<QueueStats> {
        Arc::clone(&self.stats)
    }
}

impl HostLoop {
    /// Executes jobs until a stop is requested or every producer is dropped.
    ///
    /// Blocks the calling thread, which becomes the host thread.
    pub fn run<H>(self, registry: &CommandRegistry<H>, host: &mut H) -> LoopSummary {
        info!(target: QUEUE_TARGET, commands = registry.len(), "host loop running");
        debug!(
            target: QUEUE_TARGET,
            names = ?registry.names().collect::<Vec<_>>(),
            "registered commands"
        );
        let mut executed = 0;
        while let Ok(Message::Run(job)) = self.receiver.recv() {
            self.execute(registry, host, job);
            executed += 1;
        }
        let rejected = self.finish();
        info!(target: QUEUE_TARGET, executed, rejected, "host loop stopped");
        LoopSummary { executed, rejected }
    }

    /// Executes every job queued right now without blocking.
    ///
    /// For hosts that own their event loop and poll the queue once per tick.
    pub fn drain_pending<H>(&self, registry: &CommandRegistry<H>, host: &mut H) -> PumpStatus {
        let mut executed = 0;
        loop {
            match self.receiver.try_recv() {
                Ok(Message::Run(job)) => {
                    self.execute(registry, host, job);
                    executed += 1;
                }
                Ok(Message::Stop) | Err(TryRecvError::Disconnected) => {
                    return PumpStatus::Stopped { executed };
                }
                Err(TryRecvError::Empty) => return PumpStatus::Idle { executed },
            }
        }
    }

    /// Answers every job still queued with a failure and closes the queue.
    ///
    /// Returns the number of rejected jobs.
    pub fn finish(self) -> u64 {
        let mut rejected = 0;
        while let Ok(message) = self.receiver.try_recv() {
            if let Message::Run(job) = message {
                self.complete(job, failure(&DispatchError::HostUnavailable));
                rejected += 1;
            }
        }
        rejected
    }

    fn execute<H>(&self, registry: &CommandRegistry<H>, host: &mut H, job: Job) {
        let command = job.request.command.as_str();
        let waited = job.enqueued.elapsed();
        let started = Instant::now();
        let outcome = panic::catch_unwind(AssertUnwindSafe(|| {
            registry.invoke(host, command, &job.request.args)
        }));
        let reply = match outcome {
            Ok(Ok(value)) => Reply::Success(sanitize(value)),
            Ok(Err(error)) => {
                warn!(
                    target: QUEUE_TARGET,
                    command,
                    kind = %error.kind(),
                    error = %error,
                    "command failed"
                );
                failure(&error)
            }
            Err(payload) => {
                self.stats.panicked.fetch_add(1, Ordering::SeqCst);
                let error = DispatchError::Panicked {
                    command: command.to_owned(),
                    message: panic_message(payload.as_ref()),
                };
                warn!(target: QUEUE_TARGET, command, error = %error, "handler panicked");
                failure(&error)
            }
        };
        debug!(
            target: QUEUE_TARGET,
            command,
            queued_ms = u64::try_from(waited.as_millis()).unwrap_or(u64::MAX),
            elapsed_ms = u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX),
            "command executed"
        );
        self.complete(job, reply);
    }

    fn complete(&self, job: Job, reply: Reply) {
        self.stats.completed.fetch_add(1, Ordering::SeqCst);
        if job.reply.send(reply).is_err() {
            debug!(
                target: QUEUE_TARGET,
                command = %job.request.command,
                "submitter stopped waiting; reply dropped"
            );
        }
    }
}

fn failure(error: &DispatchError) -> Reply {
    Reply::Failure(error.to_reply())
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    payload
        .downcast_ref::<&str>()
        .map(|message| (*message).to_owned())
        .or_else(|| payload.downcast_ref::<String>().cloned())
        .unwrap_or_else(|| "non-string panic payload".to_owned())
}
