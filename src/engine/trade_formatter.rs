//! Pure transform from an accepted Signal to a notification payload.

use crate::engine::signal_engine::{Direction, Signal};
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct FormattedSignal {
    pub signal: Signal,
    pub summary: String,
    pub details: String,
    pub confidence_pct: String,
}

pub struct TradeFormatter;

impl TradeFormatter {
    pub fn format(&self, signal: &Signal) -> FormattedSignal {
        let confidence_pct = format!("{:.1}%", signal.confidence * 100.0);
        let summary = Self::create_summary(signal, &confidence_pct);
        let details = Self::create_details(signal);

        FormattedSignal {
            signal: signal.clone(),
            summary,
            details,
            confidence_pct,
        }
    }

    fn create_summary(signal: &Signal, confidence_pct: &str) -> String {
        let (direction_text, emoji) = match signal.direction {
            Direction::Bullish => ("BULLISH", "🚀"),
            Direction::Bearish => ("BEARISH", "🐻"),
        };
        let option_type = signal.option_type.to_string().to_uppercase();

        let mut summary = format!(
            "{emoji} {direction_text} {} {option_type} OPPORTUNITY {emoji}\n\
             Confidence: {confidence_pct} {}\n\
             Time: {}\n\
             Entry: ${:.2}",
            signal.symbol,
            Self::confidence_stars(signal.confidence),
            signal.timestamp.format("%Y-%m-%d %H:%M:%S"),
            signal.entry_price,
        );

        if let Some(stop) = signal.stop_loss {
            summary.push_str(&format!("\nStop Loss: ${:.2}", stop));
        }
        if !signal.take_profits.is_empty() {
            let targets: Vec<String> = signal
                .take_profits
                .iter()
                .map(|tp| format!("${:.2}", tp))
                .collect();
            summary.push_str(&format!("\nProfit Targets: {}", targets.join(" / ")));
        }
        if let Some(size) = signal.position_size {
            summary.push_str(&format!("\nPosition Size: {} contracts", size));
        }

        summary
    }

    fn create_details(signal: &Signal) -> String {
        let mut technical_section = String::from("TECHNICAL ANALYSIS:\n");
        for (timeframe, data) in &signal.technical.timeframes {
            technical_section.push_str(&format!(
                "- {}: Bull: {}, Bear: {}, Neutral: {}\n",
                timeframe.to_uppercase(),
                data.bullish_signals,
                data.bearish_signals,
                data.neutral_signals
            ));
        }
        if let Some(pattern) = &signal.technical.box_pattern {
            technical_section.push_str(&format!(
                "- BOX: ${:.2} - ${:.2}, breakout {} at ${:.2}\n",
                pattern.bottom, pattern.top, pattern.direction, pattern.breakout_price
            ));
        }

        let mut sentiment_section = String::from("SENTIMENT ANALYSIS:\n");
        if let Some(sentiment) = &signal.sentiment {
            sentiment_section.push_str(&format!(
                "- Overall Score: {:.2}\n- Sentiment: {}\n- Article Count: {}\n",
                sentiment.overall_score,
                sentiment.label.to_uppercase(),
                sentiment.article_count
            ));
            if !sentiment.keyword_matches.is_empty() {
                sentiment_section.push_str("- Top Keywords:\n");
                let mut keywords: Vec<_> = sentiment.keyword_matches.iter().collect();
                keywords.sort_by(|a, b| b.1.cmp(a.1).then_with(|| a.0.cmp(b.0)));
                for (keyword, count) in keywords.into_iter().take(5) {
                    sentiment_section.push_str(&format!("  • {}: {} mentions\n", keyword, count));
                }
            }
        } else {
            sentiment_section.push_str("- No sentiment data\n");
        }

        format!("{}\n{}", technical_section, sentiment_section)
    }

    fn confidence_stars(confidence: f64) -> &'static str {
        if confidence >= 0.9 {
            "⭐⭐⭐⭐⭐"
        } else if confidence >= 0.8 {
            "⭐⭐⭐⭐"
        } else if confidence >= 0.7 {
            "⭐⭐⭐"
        } else if confidence >= 0.6 {
            "⭐⭐"
        } else {
            "⭐"
        }
    }
}
