//! Sentiment feature producer: folds per-symbol article history into a
//! summary the signal engine can score.

use crate::events::{NewsArticle, SentimentSummary};
use std::collections::HashMap;

pub struct SentimentAggregator {
    keywords: Vec<String>,
}

impl SentimentAggregator {
    pub fn new(keywords: Vec<String>) -> Self {
        Self { keywords }
    }

    /// Summarize the rolling article history. An empty history yields a
    /// neutral summary rather than an error; a transient news outage must
    /// not raise into the dispatch loop.
    pub fn summarize(&self, articles: &[NewsArticle]) -> SentimentSummary {
        if articles.is_empty() {
            return SentimentSummary {
                overall_score: 0.0,
                label: "neutral".to_string(),
                article_count: 0,
                keyword_matches: HashMap::new(),
            };
        }

        let mean: f64 =
            articles.iter().map(|a| a.sentiment).sum::<f64>() / articles.len() as f64;
        let overall_score = mean.clamp(-1.0, 1.0);

        let label = if overall_score > 0.05 {
            "positive"
        } else if overall_score < -0.05 {
            "negative"
        } else {
            "neutral"
        };

        let mut keyword_matches = HashMap::new();
        for keyword in &self.keywords {
            let needle = keyword.to_lowercase();
            let count = articles
                .iter()
                .filter(|a| a.headline.to_lowercase().contains(&needle))
                .count();
            if count > 0 {
                keyword_matches.insert(keyword.clone(), count);
            }
        }

        SentimentSummary {
            overall_score,
            label: label.to_string(),
            article_count: articles.len(),
            keyword_matches,
        }
    }
}
