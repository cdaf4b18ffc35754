use crate::error::{BusError, PipelineError};
use crate::events::{Event, EventType};
use async_trait::async_trait;
use std::collections::{BinaryHeap, HashMap};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::Notify;
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

/// A subscriber invoked by the dispatch loop. Handlers for the same event run
/// as independently spawned tasks; completion order is not guaranteed and
/// handlers must not assume mutual exclusion over shared per-symbol state.
#[async_trait]
pub trait EventHandler: Send + Sync {
    fn name(&self) -> &'static str;
    async fn handle(&self, event: Event) -> Result<(), PipelineError>;
}

struct BusInner {
    // Unbounded by design: no admission control. Sustained overload grows
    // memory without limit; a bounded queue with drop-oldest-low-priority is
    // the hardening path if that ever bites.
    queue: Mutex<BinaryHeap<Event>>,
    notify: Notify,
    handlers: Mutex<HashMap<EventType, Vec<Arc<dyn EventHandler>>>>,
    running: AtomicBool,
    tasks: Mutex<Vec<JoinHandle<()>>>,
    loop_handle: Mutex<Option<JoinHandle<()>>>,
    drain_timeout: Duration,
}

/// Priority event bus: single dispatch loop, fan-out to registered handlers.
///
/// Dispatch order is strict (priority desc, then FIFO by timestamp); handler
/// completion order is not. A panic or error inside one handler is caught and
/// logged, and never affects the loop or sibling handlers.
#[derive(Clone)]
pub struct EventBus {
    inner: Arc<BusInner>,
}

impl EventBus {
    pub fn new(drain_timeout: Duration) -> Self {
        Self {
            inner: Arc::new(BusInner {
                queue: Mutex::new(BinaryHeap::new()),
                notify: Notify::new(),
                handlers: Mutex::new(HashMap::new()),
                running: AtomicBool::new(false),
                tasks: Mutex::new(Vec::new()),
                loop_handle: Mutex::new(None),
                drain_timeout,
            }),
        }
    }

    /// Register a handler for an event type. Handlers are dispatched in
    /// registration order.
    pub fn register_handler(&self, event_type: EventType, handler: Arc<dyn EventHandler>) {
        info!(
            "Registered handler '{}' for event type: {}",
            handler.name(),
            event_type
        );
        let mut handlers = self.inner.handlers.lock().unwrap();
        handlers.entry(event_type).or_default().push(handler);
    }

    /// Enqueue an event. Never blocks the publisher.
    pub fn publish(&self, event: Event) {
        debug!(
            "Publishing event: {} from {} (priority {})",
            event.event_type(),
            event.source,
            event.priority
        );
        self.inner.queue.lock().unwrap().push(event);
        self.inner.notify.notify_one();
    }

    pub fn queue_len(&self) -> usize {
        self.inner.queue.lock().unwrap().len()
    }

    /// Start the dispatch loop.
    pub fn start(&self) -> Result<(), BusError> {
        if self.inner.running.swap(true, Ordering::SeqCst) {
            return Err(BusError::AlreadyRunning);
        }
        info!("Starting event bus...");
        let inner = self.inner.clone();
        let handle = tokio::spawn(async move {
            Self::dispatch_loop(inner).await;
        });
        *self.inner.loop_handle.lock().unwrap() = Some(handle);
        Ok(())
    }

    /// Stop the dispatch loop and wait for in-flight handler tasks, bounded
    /// by the drain timeout. Tasks still running at the deadline are
    /// abandoned and logged as leaks.
    pub async fn stop(&self) -> Result<(), BusError> {
        if !self.inner.running.swap(false, Ordering::SeqCst) {
            return Err(BusError::NotRunning);
        }
        info!("Stopping event bus...");
        self.inner.notify.notify_one();

        let loop_handle = self.inner.loop_handle.lock().unwrap().take();
        if let Some(handle) = loop_handle {
            let _ = handle.await;
        }

        let tasks: Vec<JoinHandle<()>> = std::mem::take(&mut *self.inner.tasks.lock().unwrap());
        let deadline = tokio::time::Instant::now() + self.inner.drain_timeout;
        let mut abandoned = 0usize;
        for task in tasks {
            if tokio::time::timeout_at(deadline, task).await.is_err() {
                abandoned += 1;
            }
        }

        if abandoned > 0 {
            warn!(
                "Event bus drain leaked {} handler task(s) after {}s",
                abandoned,
                self.inner.drain_timeout.as_secs()
            );
            return Err(BusError::DrainTimeout {
                timeout_secs: self.inner.drain_timeout.as_secs(),
                outstanding: abandoned,
            });
        }

        info!("Event bus stopped");
        Ok(())
    }

    async fn dispatch_loop(inner: Arc<BusInner>) {
        info!("Event dispatch loop started");
        loop {
            let event = inner.queue.lock().unwrap().pop();
            let event = match event {
                Some(event) => event,
                None => {
                    if !inner.running.load(Ordering::SeqCst) {
                        break;
                    }
                    inner.notify.notified().await;
                    continue;
                }
            };

            if !inner.running.load(Ordering::SeqCst) {
                // stop() was called while events were still queued; queued
                // events are dropped (no durability guarantee).
                break;
            }

            let event_type = event.event_type();
            debug!("Processing event: {} from {}", event_type, event.source);

            let handlers: Vec<Arc<dyn EventHandler>> = inner
                .handlers
                .lock()
                .unwrap()
                .get(&event_type)
                .cloned()
                .unwrap_or_default();

            if handlers.is_empty() {
                warn!("No handlers registered for event type: {}", event_type);
                continue;
            }

            for handler in handlers {
                let ev = event.clone();
                let task = tokio::spawn(async move {
                    let name = handler.name();
                    if let Err(e) = handler.handle(ev).await {
                        error!("Error in event handler '{}': {}", name, e);
                    }
                });
                let mut tasks = inner.tasks.lock().unwrap();
                tasks.retain(|t| !t.is_finished());
                tasks.push(task);
            }
        }
        info!("Event dispatch loop terminated");
    }
}
