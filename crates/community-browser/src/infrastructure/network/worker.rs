//! A lazily started background thread that answers requests one at a time.
//!
//! The foreground loop owns a [`BackgroundWorker`] and talks to it through two
//! `std::sync::mpsc` channels: requests go in, responses come out, and the
//! foreground side only ever does non-blocking receives.  The thread is spawned
//! on the first [`submit`](BackgroundWorker::submit), processes requests in
//! FIFO order, and never has more than one handler call running.
//!
//! # Shutdown
//!
//! [`shutdown`](BackgroundWorker::shutdown) raises the stop flag, closes the
//! request channel, joins the thread, and discards any responses that were
//! not consumed yet.  A handler call that is already running completes; the
//! requests still queued behind it are dropped without being answered.

use std::collections::VecDeque;
use std::sync::{
    atomic::{AtomicBool, Ordering},
    mpsc, Arc,
};
use std::thread::JoinHandle;

use tracing::{debug, info, warn};

type Handler<Req, Resp> = Arc<dyn Fn(Req) -> Resp + Send + Sync>;

/// Thread plus channel pair for one worker.
pub struct BackgroundWorker<Req, Resp> {
    name: &'static str,
    handler: Handler<Req, Resp>,
    /// Builds the answer for a request the thread could not accept.
    reject: fn(Req, &str) -> Resp,
    requests: Option<mpsc::Sender<Req>>,
    responses: Option<mpsc::Receiver<Resp>>,
    rejected: VecDeque<Resp>,
    stop: Arc<AtomicBool>,
    thread: Option<JoinHandle<()>>,
}

impl<Req, Resp> BackgroundWorker<Req, Resp>
where
    Req: Send + 'static,
    Resp: Send + 'static,
{
    /// Creates an idle worker.  No thread exists until the first request.
    pub fn new<F>(name: &'static str, handler: F, reject: fn(Req, &str) -> Resp) -> Self
    where
        F: Fn(Req) -> Resp + Send + Sync + 'static,
    {
        Self {
            name,
            handler: Arc::new(handler),
            reject,
            requests: None,
            responses: None,
            rejected: VecDeque::new(),
            stop: Arc::new(AtomicBool::new(false)),
            thread: None,
        }
    }

    /// `true` once the thread has been spawned and not yet shut down.
    pub fn is_running(&self) -> bool {
        self.thread.is_some()
    }

    /// Enqueues `request`, starting the thread if it is not running.
    ///
    /// A request that cannot be handed to the thread is answered immediately
    /// through the `reject` constructor, so every request gets a response.
    pub fn submit(&mut self, request: Req) {
        if self.requests.is_none() {
            if let Err(e) = self.spawn() {
                warn!("{}: could not start worker thread: {e}", self.name);
                self.rejected.push_back((self.reject)(request, "worker_unavailable"));
                return;
            }
        }

        let Some(sender) = self.requests.as_ref() else {
            self.rejected.push_back((self.reject)(request, "worker_unavailable"));
            return;
        };
        if let Err(mpsc::SendError(request)) = sender.send(request) {
            warn!("{}: worker thread exited; rejecting request", self.name);
            self.rejected.push_back((self.reject)(request, "worker_unavailable"));
        }
    }

    /// Non-blocking pop of the oldest response.
    pub fn try_recv(&mut self) -> Option<Resp> {
        if let Some(response) = self.rejected.pop_front() {
            return Some(response);
        }
        self.responses.as_ref()?.try_recv().ok()
    }

    /// Raises the stop flag without waiting.  Requests not yet started will
    /// be skipped by the thread.
    pub fn signal_stop(&self) {
        self.stop.store(true, Ordering::SeqCst);
    }

    /// Stops and joins the thread, then drops both queues.
    pub fn shutdown(&mut self) {
        self.signal_stop();
        self.requests = None;
        if let Some(thread) = self.thread.take() {
            if thread.join().is_err() {
                warn!("{}: worker thread panicked", self.name);
            }
            info!("{} stopped", self.name);
        }
        self.responses = None;
        self.rejected.clear();
    }

    fn spawn(&mut self) -> std::io::Result<()> {
        let (request_tx, request_rx) = mpsc::channel::<Req>();
        let (response_tx, response_rx) = mpsc::channel::<Resp>();
        let stop = Arc::new(AtomicBool::new(false));
        let handler = Arc::clone(&self.handler);
        let name = self.name;

        let thread = std::thread::Builder::new()
            .name(name.to_string())
            .spawn({
                let stop = Arc::clone(&stop);
                move || worker_loop(name, request_rx, response_tx, handler, stop)
            })?;

        info!("{name} started");
        self.requests = Some(request_tx);
        self.responses = Some(response_rx);
        self.stop = stop;
        self.thread = Some(thread);
        Ok(())
    }
}

impl<Req, Resp> Drop for BackgroundWorker<Req, Resp> {
    fn drop(&mut self) {
        self.stop.store(true, Ordering::SeqCst);
        self.requests = None;
        if let Some(thread) = self.thread.take() {
            let _ = thread.join();
        }
    }
}

/// Body of the worker thread.  Exits when the request channel closes or the
/// stop flag is raised.
fn worker_loop<Req, Resp>(
    name: &'static str,
    requests: mpsc::Receiver<Req>,
    responses: mpsc::Sender<Resp>,
    handler: Handler<Req, Resp>,
    stop: Arc<AtomicBool>,
) {
    for request in requests.iter() {
        if stop.load(Ordering::SeqCst) {
            debug!("{name}: stop requested; dropping queued work");
            break;
        }
        let response = handler(request);
        if responses.send(response).is_err() {
            break;
        }
    }
}
