//! Unit tests for the EventBus - priority dispatch, fan-out, failure
//! isolation, and graceful drain.

#[cfg(test)]
mod bus_tests {
    use crate::bus::{EventBus, EventHandler};
    use crate::error::{BusError, PipelineError};
    use crate::events::{Event, EventPayload, EventPriority, EventType};
    use async_trait::async_trait;
    use chrono::{TimeZone, Utc};
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::{Arc, Mutex};
    use std::time::Duration;

    struct RecordingHandler {
        seen: Arc<Mutex<Vec<String>>>,
    }

    #[async_trait]
    impl EventHandler for RecordingHandler {
        fn name(&self) -> &'static str {
            "recording_handler"
        }

        async fn handle(&self, event: Event) -> Result<(), PipelineError> {
            if let EventPayload::StatusUpdate { message, .. } = &event.payload {
                self.seen.lock().unwrap().push(message.clone());
            }
            Ok(())
        }
    }

    struct FailingHandler;

    #[async_trait]
    impl EventHandler for FailingHandler {
        fn name(&self) -> &'static str {
            "failing_handler"
        }

        async fn handle(&self, event: Event) -> Result<(), PipelineError> {
            Err(PipelineError::UnexpectedPayload {
                handler: "failing_handler".to_string(),
                got: event.event_type().to_string(),
            })
        }
    }

    struct SlowHandler {
        completed: Arc<AtomicUsize>,
    }

    #[async_trait]
    impl EventHandler for SlowHandler {
        fn name(&self) -> &'static str {
            "slow_handler"
        }

        async fn handle(&self, _event: Event) -> Result<(), PipelineError> {
            tokio::time::sleep(Duration::from_millis(50)).await;
            self.completed.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }
    }

    struct StuckHandler;

    #[async_trait]
    impl EventHandler for StuckHandler {
        fn name(&self) -> &'static str {
            "stuck_handler"
        }

        async fn handle(&self, _event: Event) -> Result<(), PipelineError> {
            tokio::time::sleep(Duration::from_secs(60)).await;
            Ok(())
        }
    }

    fn status(message: &str, priority: EventPriority, secs: i64) -> Event {
        Event {
            payload: EventPayload::StatusUpdate {
                status: "test".to_string(),
                message: message.to_string(),
            },
            priority,
            timestamp: Utc.timestamp_opt(secs, 0).unwrap(),
            source: "test".to_string(),
        }
    }

    // The bus guarantees dispatch (spawn) order, not completion order. These
    // handlers never suspend and the test runtime is single-threaded, so the
    // spawned tasks complete in spawn order and the recorded sequence is the
    // dispatch sequence. Revisit if this test ever moves to a multi-thread
    // runtime.
    #[tokio::test]
    async fn test_dispatch_respects_priority_order() {
        let bus = EventBus::new(Duration::from_secs(5));
        let seen = Arc::new(Mutex::new(Vec::new()));
        bus.register_handler(
            EventType::StatusUpdate,
            Arc::new(RecordingHandler { seen: seen.clone() }),
        );

        // Enqueue before starting so all events are queued together.
        bus.publish(status("low", EventPriority::Low, 1));
        bus.publish(status("critical", EventPriority::Critical, 4));
        bus.publish(status("medium-late", EventPriority::Medium, 3));
        bus.publish(status("medium-early", EventPriority::Medium, 2));

        bus.start().unwrap();
        tokio::time::sleep(Duration::from_millis(100)).await;
        bus.stop().await.unwrap();

        let seen = seen.lock().unwrap();
        assert_eq!(
            *seen,
            vec!["critical", "medium-early", "medium-late", "low"]
        );
    }

    #[tokio::test]
    async fn test_multiple_handlers_fan_out() {
        let bus = EventBus::new(Duration::from_secs(5));
        let seen_a = Arc::new(Mutex::new(Vec::new()));
        let seen_b = Arc::new(Mutex::new(Vec::new()));
        bus.register_handler(
            EventType::StatusUpdate,
            Arc::new(RecordingHandler { seen: seen_a.clone() }),
        );
        bus.register_handler(
            EventType::StatusUpdate,
            Arc::new(RecordingHandler { seen: seen_b.clone() }),
        );

        bus.start().unwrap();
        bus.publish(status("hello", EventPriority::Medium, 1));
        tokio::time::sleep(Duration::from_millis(100)).await;
        bus.stop().await.unwrap();

        assert_eq!(*seen_a.lock().unwrap(), vec!["hello"]);
        assert_eq!(*seen_b.lock().unwrap(), vec!["hello"]);
    }

    #[tokio::test]
    async fn test_handler_failure_does_not_affect_siblings() {
        let bus = EventBus::new(Duration::from_secs(5));
        let seen = Arc::new(Mutex::new(Vec::new()));
        bus.register_handler(EventType::StatusUpdate, Arc::new(FailingHandler));
        bus.register_handler(
            EventType::StatusUpdate,
            Arc::new(RecordingHandler { seen: seen.clone() }),
        );

        bus.start().unwrap();
        bus.publish(status("survives", EventPriority::High, 1));
        tokio::time::sleep(Duration::from_millis(100)).await;
        bus.stop().await.unwrap();

        assert_eq!(*seen.lock().unwrap(), vec!["survives"]);
    }

    #[tokio::test]
    async fn test_event_without_handlers_is_dropped() {
        let bus = EventBus::new(Duration::from_secs(5));
        let seen = Arc::new(Mutex::new(Vec::new()));
        bus.register_handler(
            EventType::StatusUpdate,
            Arc::new(RecordingHandler { seen: seen.clone() }),
        );

        bus.start().unwrap();
        // No handler registered for price updates; dropped, not fatal.
        bus.publish(Event::price_update("QQQ", 450.0, 1_000_000.0, 0.0, "test"));
        bus.publish(status("after", EventPriority::Medium, 1));
        tokio::time::sleep(Duration::from_millis(100)).await;
        bus.stop().await.unwrap();

        assert_eq!(*seen.lock().unwrap(), vec!["after"]);
    }

    #[tokio::test]
    async fn test_stop_waits_for_in_flight_handlers() {
        let bus = EventBus::new(Duration::from_secs(5));
        let completed = Arc::new(AtomicUsize::new(0));
        bus.register_handler(
            EventType::StatusUpdate,
            Arc::new(SlowHandler {
                completed: completed.clone(),
            }),
        );

        bus.start().unwrap();
        bus.publish(status("slow", EventPriority::Medium, 1));
        // Give the dispatch loop time to spawn the handler task.
        tokio::time::sleep(Duration::from_millis(10)).await;
        bus.stop().await.unwrap();

        assert_eq!(completed.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_stop_abandons_handlers_past_the_drain_timeout() {
        let bus = EventBus::new(Duration::from_millis(50));
        bus.register_handler(EventType::StatusUpdate, Arc::new(StuckHandler));

        bus.start().unwrap();
        bus.publish(status("stuck", EventPriority::Medium, 1));
        // Give the dispatch loop time to spawn the handler task.
        tokio::time::sleep(Duration::from_millis(10)).await;

        // The handler sleeps far past the drain deadline; stop() must give
        // up and report the abandoned task instead of hanging.
        let result = bus.stop().await;
        match result {
            Err(BusError::DrainTimeout { outstanding, .. }) => {
                assert_eq!(outstanding, 1);
            }
            other => panic!("expected DrainTimeout, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_start_twice_fails() {
        let bus = EventBus::new(Duration::from_secs(5));
        bus.start().unwrap();
        assert!(bus.start().is_err());
        bus.stop().await.unwrap();
    }

    #[tokio::test]
    async fn test_stop_without_start_fails() {
        let bus = EventBus::new(Duration::from_secs(5));
        assert!(bus.stop().await.is_err());
    }

    #[tokio::test]
    async fn test_queue_len_reflects_pending_events() {
        let bus = EventBus::new(Duration::from_secs(5));
        assert_eq!(bus.queue_len(), 0);
        bus.publish(status("a", EventPriority::Low, 1));
        bus.publish(status("b", EventPriority::Low, 2));
        assert_eq!(bus.queue_len(), 2);
    }
}
