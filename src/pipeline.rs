//! Event handlers that tie the pipeline together: feature producers feed the
//! signal engine, which feeds the gates, which feed the notification sink.
//!
//! Every handler catches its own failures; a malformed or unexpected payload
//! drops the event for that handler only.

use crate::analysis::sentiment::SentimentAggregator;
use crate::analysis::technical::TechnicalAnalyzer;
use crate::bus::{EventBus, EventHandler};
use crate::config::AppConfig;
use crate::data::store::{ActiveTrade, PricePoint, SymbolStore};
use crate::engine::rate_limiter::SignalRateLimiter;
use crate::engine::signal_engine::SignalEngine;
use crate::engine::trade_formatter::TradeFormatter;
use crate::events::{Event, EventPayload, EventPriority, EventType};
use crate::feeds::NotificationSink;
use async_trait::async_trait;
use chrono::Utc;
use std::sync::Arc;
use tracing::{debug, info};

use crate::error::PipelineError;

fn unexpected(handler: &'static str, event: &Event) -> PipelineError {
    PipelineError::UnexpectedPayload {
        handler: handler.to_string(),
        got: event.event_type().to_string(),
    }
}

/// Updates the rolling price window, runs technical analysis, and publishes
/// a trading-signal trigger when something significant shows up.
pub struct PriceUpdateHandler {
    store: SymbolStore,
    analyzer: TechnicalAnalyzer,
    bus: EventBus,
}

impl PriceUpdateHandler {
    pub fn new(store: SymbolStore, analyzer: TechnicalAnalyzer, bus: EventBus) -> Self {
        Self {
            store,
            analyzer,
            bus,
        }
    }
}

#[async_trait]
impl EventHandler for PriceUpdateHandler {
    fn name(&self) -> &'static str {
        "price_update_handler"
    }

    async fn handle(&self, event: Event) -> Result<(), PipelineError> {
        let (symbol, price, volume) = match &event.payload {
            EventPayload::PriceUpdate {
                symbol,
                price,
                volume,
                ..
            } => (symbol.clone(), *price, *volume),
            _ => return Err(unexpected("price_update_handler", &event)),
        };

        self.store.record_price(
            &symbol,
            PricePoint {
                price,
                volume,
                timestamp: event.timestamp,
            },
        );

        let history = self.store.price_history(&symbol);
        let snapshot = match self.analyzer.analyze(&symbol, &history) {
            Ok(snapshot) => snapshot,
            Err(e) => {
                debug!("Skipping analysis for {}: {}", symbol, e);
                return Ok(());
            }
        };

        if !self.analyzer.is_significant(&snapshot) {
            return Ok(());
        }

        let sentiment = self.store.latest_sentiment(&symbol);
        info!("Significant technical signal for {}; publishing trigger", symbol);
        self.bus.publish(Event::new(
            EventPayload::TradingSignal {
                symbol,
                technical: snapshot,
                sentiment,
            },
            EventPriority::High,
            "price_update_handler",
        ));

        Ok(())
    }
}

/// Folds incoming articles into the per-symbol sentiment history and
/// republishes the refreshed summary.
pub struct NewsUpdateHandler {
    store: SymbolStore,
    aggregator: SentimentAggregator,
    bus: EventBus,
}

impl NewsUpdateHandler {
    pub fn new(store: SymbolStore, aggregator: SentimentAggregator, bus: EventBus) -> Self {
        Self {
            store,
            aggregator,
            bus,
        }
    }
}

#[async_trait]
impl EventHandler for NewsUpdateHandler {
    fn name(&self) -> &'static str {
        "news_update_handler"
    }

    async fn handle(&self, event: Event) -> Result<(), PipelineError> {
        let (symbol, article) = match &event.payload {
            EventPayload::NewsUpdate { symbol, article } => (symbol.clone(), article.clone()),
            _ => return Err(unexpected("news_update_handler", &event)),
        };

        self.store.record_article(&symbol, article);
        let summary = self.aggregator.summarize(&self.store.article_history(&symbol));
        debug!(
            "Updated sentiment for {}: {:.2} ({} articles)",
            symbol, summary.overall_score, summary.article_count
        );

        self.bus.publish(Event::new(
            EventPayload::SentimentUpdate { symbol, summary },
            EventPriority::Medium,
            "news_update_handler",
        ));

        Ok(())
    }
}

/// Stores the latest sentiment summary for use by later triggers.
pub struct SentimentUpdateHandler {
    store: SymbolStore,
}

impl SentimentUpdateHandler {
    pub fn new(store: SymbolStore) -> Self {
        Self { store }
    }
}

#[async_trait]
impl EventHandler for SentimentUpdateHandler {
    fn name(&self) -> &'static str {
        "sentiment_update_handler"
    }

    async fn handle(&self, event: Event) -> Result<(), PipelineError> {
        match &event.payload {
            EventPayload::SentimentUpdate { symbol, summary } => {
                self.store.set_sentiment(symbol, summary.clone());
                Ok(())
            }
            _ => Err(unexpected("sentiment_update_handler", &event)),
        }
    }
}

/// Runs the engine on trading-signal triggers and pushes accepted signals
/// through the cooldown and concurrency gates to the sink.
pub struct TradingSignalHandler {
    store: SymbolStore,
    engine: SignalEngine,
    limiter: SignalRateLimiter,
    formatter: TradeFormatter,
    sink: Arc<dyn NotificationSink>,
    max_concurrent_trades: usize,
}

impl TradingSignalHandler {
    pub fn new(
        store: SymbolStore,
        engine: SignalEngine,
        limiter: SignalRateLimiter,
        sink: Arc<dyn NotificationSink>,
        max_concurrent_trades: usize,
    ) -> Self {
        Self {
            store,
            engine,
            limiter,
            formatter: TradeFormatter,
            sink,
            max_concurrent_trades,
        }
    }
}

#[async_trait]
impl EventHandler for TradingSignalHandler {
    fn name(&self) -> &'static str {
        "trading_signal_handler"
    }

    async fn handle(&self, event: Event) -> Result<(), PipelineError> {
        let (symbol, technical, sentiment) = match &event.payload {
            EventPayload::TradingSignal {
                symbol,
                technical,
                sentiment,
            } => (symbol.clone(), technical, sentiment.as_ref()),
            _ => return Err(unexpected("trading_signal_handler", &event)),
        };

        let now = Utc::now();
        if !self.limiter.allow(&symbol, now) {
            return Ok(());
        }

        if self.store.has_active_trade(&symbol) {
            info!("Skipping {}: trade already open", symbol);
            return Ok(());
        }
        if self.store.active_trade_count() >= self.max_concurrent_trades {
            info!(
                "Skipping {}: at max concurrent trades ({})",
                symbol, self.max_concurrent_trades
            );
            return Ok(());
        }

        let signals = self.engine.generate(&symbol, sentiment, technical);
        for signal in signals {
            let trade = ActiveTrade {
                signal_id: signal.id.clone(),
                opened_at: now,
            };
            if !self
                .store
                .try_open_trade(&symbol, trade, self.max_concurrent_trades)
            {
                info!("Skipping {}: trade slot no longer available", symbol);
                continue;
            }

            let formatted = self.formatter.format(&signal);
            self.sink.send_signal(&formatted).await;
            self.limiter.record(&symbol, now);
            info!(
                "Emitted {} {} signal for {} (confidence {:.2})",
                signal.direction, signal.option_type, symbol, signal.confidence
            );
        }

        Ok(())
    }
}

/// Forwards status events to the notification sink.
pub struct StatusUpdateHandler {
    sink: Arc<dyn NotificationSink>,
}

impl StatusUpdateHandler {
    pub fn new(sink: Arc<dyn NotificationSink>) -> Self {
        Self { sink }
    }
}

#[async_trait]
impl EventHandler for StatusUpdateHandler {
    fn name(&self) -> &'static str {
        "status_update_handler"
    }

    async fn handle(&self, event: Event) -> Result<(), PipelineError> {
        match &event.payload {
            EventPayload::StatusUpdate { status, message } => {
                self.sink.send_status(status, message).await;
                Ok(())
            }
            _ => Err(unexpected("status_update_handler", &event)),
        }
    }
}

/// Wire every pipeline handler onto the bus.
pub fn register_pipeline(
    bus: &EventBus,
    store: &SymbolStore,
    config: &AppConfig,
    sink: Arc<dyn NotificationSink>,
) {
    let analyzer = TechnicalAnalyzer::new(config.box_method.clone(), config.timeframes.clone());
    let aggregator = SentimentAggregator::new(config.sentiment_keywords.clone());
    let engine = SignalEngine::new(config.engine.clone(), config.box_method.clone());
    let limiter = SignalRateLimiter::new(config.engine.min_signal_interval_secs);

    bus.register_handler(
        EventType::PriceUpdate,
        Arc::new(PriceUpdateHandler::new(store.clone(), analyzer, bus.clone())),
    );
    bus.register_handler(
        EventType::NewsUpdate,
        Arc::new(NewsUpdateHandler::new(store.clone(), aggregator, bus.clone())),
    );
    bus.register_handler(
        EventType::SentimentUpdate,
        Arc::new(SentimentUpdateHandler::new(store.clone())),
    );
    bus.register_handler(
        EventType::TradingSignal,
        Arc::new(TradingSignalHandler::new(
            store.clone(),
            engine,
            limiter,
            sink.clone(),
            config.engine.max_concurrent_trades,
        )),
    );
    bus.register_handler(EventType::StatusUpdate, Arc::new(StatusUpdateHandler::new(sink)));
}
