//! Unit tests for configuration loading and defaults.

#[cfg(test)]
mod config_tests {
    use crate::config::AppConfig;

    #[test]
    fn test_default_configuration_matches_documented_values() {
        let config = AppConfig::default();

        assert_eq!(config.history_limit, 100);
        assert_eq!(config.symbols, vec!["QQQ".to_string(), "SPY".to_string()]);
        assert_eq!(config.timeframes, vec!["1h", "4h", "1d"]);

        assert_eq!(config.box_method.box_size_threshold, 0.02);
        assert_eq!(config.box_method.min_consolidation_candles, 5);
        assert_eq!(config.box_method.volume_multiplier, 1.3);
        assert_eq!(config.box_method.retest_tolerance, 0.005);
        assert_eq!(config.box_method.stop_loss_tolerance, 0.0035);
        assert_eq!(config.box_method.risk_reward_ratios, vec![2.0, 3.0, 4.0]);

        assert_eq!(config.engine.sentiment_weight, 0.4);
        assert_eq!(config.engine.technical_weight, 0.6);
        assert_eq!(config.engine.signal_threshold, 0.7);
        assert_eq!(config.engine.min_signal_interval_secs, 3600);
        assert_eq!(config.engine.max_concurrent_trades, 2);
    }

    #[test]
    fn test_partial_yaml_uses_defaults_for_missing_fields() {
        let yaml = r#"
symbols:
  - AAPL
engine:
  signal_threshold: 0.8
"#;
        let config: AppConfig = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(config.symbols, vec!["AAPL".to_string()]);
        assert_eq!(config.engine.signal_threshold, 0.8);
        // Untouched sections keep their defaults.
        assert_eq!(config.engine.sentiment_weight, 0.4);
        assert_eq!(config.box_method.box_size_threshold, 0.02);
        assert_eq!(config.history_limit, 100);
    }

    #[test]
    fn test_box_section_overrides() {
        let yaml = r#"
box:
  box_size_threshold: 0.03
  risk_reward_ratios: [1.5, 2.5]
"#;
        let config: AppConfig = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(config.box_method.box_size_threshold, 0.03);
        assert_eq!(config.box_method.risk_reward_ratios, vec![1.5, 2.5]);
        assert_eq!(config.box_method.min_consolidation_candles, 5);
    }

    #[test]
    fn test_load_missing_file_is_an_error() {
        let result = AppConfig::load_from("/nonexistent/config.yaml");
        assert!(result.is_err());
    }
}
