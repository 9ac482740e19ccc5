use log::{info, warn, error, debug, trace, LevelFilter};
use serde_json::{json, Value};
use std::collections::HashMap;
use std::time::{SystemTime, UNIX_EPOCH};

use crate::config::LoggingConfig;
use crate::error::{ErrorSeverity, ExplorerError};

/// Structured logging context for the explorer API
pub struct LogContext {
    pub component: String,
    pub operation: String,
    pub metadata: HashMap<String, Value>,
}

impl LogContext {
    pub fn new(component: &str, operation: &str) -> Self {
        Self {
            component: component.to_string(),
            operation: operation.to_string(),
            metadata: HashMap::new(),
        }
    }

    pub fn with_metadata(mut self, key: &str, value: Value) -> Self {
        self.metadata.insert(key.to_string(), value);
        self
    }

    pub fn with_address(self, address: &str) -> Self {
        self.with_metadata("address", json!(address))
    }

    pub fn with_address_count(self, count: usize) -> Self {
        self.with_metadata("address_count", json!(count))
    }

    pub fn with_txid(self, txid: &str) -> Self {
        self.with_metadata("txid", json!(txid))
    }

    pub fn with_height(self, height: i64) -> Self {
        self.with_metadata("height", json!(height))
    }

    pub fn with_duration_ms(self, duration_ms: u64) -> Self {
        self.with_metadata("duration_ms", json!(duration_ms))
    }

    pub fn with_error_code(self, error_code: Option<i64>) -> Self {
        self.with_metadata("error_code", json!(error_code))
    }

    fn format_message(&self, level: &str, message: &str) -> String {
        let timestamp = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap_or_default()
            .as_secs();

        let mut log_entry = json!({
            "timestamp": timestamp,
            "level": level,
            "component": self.component,
            "operation": self.operation,
            "message": message,
        });

        for (key, value) in &self.metadata {
            log_entry[key] = value.clone();
        }

        log_entry.to_string()
    }

    pub fn info(&self, message: &str) {
        info!("{}", self.format_message("INFO", message));
    }

    pub fn warn(&self, message: &str) {
        warn!("{}", self.format_message("WARN", message));
    }

    pub fn error(&self, message: &str) {
        error!("{}", self.format_message("ERROR", message));
    }

    pub fn debug(&self, message: &str) {
        debug!("{}", self.format_message("DEBUG", message));
    }

    pub fn trace(&self, message: &str) {
        trace!("{}", self.format_message("TRACE", message));
    }
}

/// Times one operation and logs its outcome
pub struct PerformanceMonitor {
    pub start_time: SystemTime,
    operation: String,
    metadata: HashMap<String, Value>,
}

impl PerformanceMonitor {
    pub fn new(operation: &str) -> Self {
        Self {
            start_time: SystemTime::now(),
            operation: operation.to_string(),
            metadata: HashMap::new(),
        }
    }

    pub fn with_metadata(mut self, key: &str, value: Value) -> Self {
        self.metadata.insert(key.to_string(), value);
        self
    }

    fn elapsed_ms(&self) -> u64 {
        SystemTime::now()
            .duration_since(self.start_time)
            .unwrap_or_default()
            .as_millis() as u64
    }

    pub fn finish_with_result<T, E>(self, result: &Result<T, E>) -> u64
    where
        E: std::fmt::Display,
    {
        let duration = self.elapsed_ms();

        let mut context = LogContext::new("performance", &self.operation)
            .with_duration_ms(duration);

        for (key, value) in self.metadata {
            context = context.with_metadata(&key, value);
        }

        match result {
            Ok(_) => {
                context.debug(&format!("Operation completed successfully in {}ms", duration));
            }
            Err(e) => {
                context = context.with_metadata("error", json!(e.to_string()));
                context.warn(&format!("Operation failed after {}ms: {}", duration, e));
            }
        }

        duration
    }
}

/// Error logging utilities
pub struct ErrorLogger;

impl ErrorLogger {
    pub fn log_error(error: &ExplorerError, context: Option<LogContext>) {
        let severity = error.severity();

        let log_context = context
            .unwrap_or_else(|| LogContext::new("error", "unknown"))
            .with_metadata("error_type", json!(format!("{:?}", error)))
            .with_metadata("severity", json!(format!("{:?}", severity)))
            .with_error_code(error.code());

        let message = format!("Request failed: {}", error);

        match severity {
            ErrorSeverity::Critical | ErrorSeverity::High => log_context.error(&message),
            ErrorSeverity::Medium => log_context.warn(&message),
            ErrorSeverity::Low => log_context.debug(&message),
        }
    }
}

/// Request-level metrics emitted as structured log lines
pub struct MetricsLogger;

impl MetricsLogger {
    pub fn log_index_call(method: &str, duration_ms: u64, success: bool) {
        let context = LogContext::new("metrics", "index_call")
            .with_metadata("method", json!(method))
            .with_duration_ms(duration_ms)
            .with_metadata("success", json!(success));

        if success {
            context.debug(&format!("Index call {} completed in {}ms", method, duration_ms));
        } else {
            context.warn(&format!("Index call {} failed after {}ms", method, duration_ms));
        }
    }

    pub fn log_utxo_listing(address_count: usize, returned: usize, skipped: usize) {
        let context = LogContext::new("metrics", "utxo_listing")
            .with_address_count(address_count)
            .with_metadata("returned", json!(returned))
            .with_metadata("skipped", json!(skipped));

        if skipped > 0 {
            context.warn(&format!("Skipped {} incomplete unspent output records", skipped));
        } else {
            context.debug(&format!("Listed {} unspent outputs", returned));
        }
    }

    pub fn log_history_page(
        address_count: usize,
        total_items: u64,
        entries: usize,
        distinct: usize,
        duration_ms: u64,
    ) {
        let context = LogContext::new("metrics", "history_page")
            .with_address_count(address_count)
            .with_metadata("total_items", json!(total_items))
            .with_metadata("entries", json!(entries))
            .with_metadata("distinct", json!(distinct))
            .with_duration_ms(duration_ms);

        context.debug(&format!(
            "History page built: {} entries, {} distinct transactions, {} total",
            entries, distinct, total_items
        ));
    }

    pub fn log_chain_height(previous: i64, current: i64) {
        let context = LogContext::new("metrics", "chain_height")
            .with_height(current)
            .with_metadata("previous_height", json!(previous));

        if current < previous {
            context.warn(&format!("Chain height moved backwards from {} to {}", previous, current));
        } else {
            context.debug(&format!("Chain height is {}", current));
        }
    }
}

fn level_filter(level: &str) -> LevelFilter {
    match level {
        "error" => LevelFilter::Error,
        "warn" => LevelFilter::Warn,
        "debug" => LevelFilter::Debug,
        "trace" => LevelFilter::Trace,
        _ => LevelFilter::Info,
    }
}

/// Initialize structured logging for the application. `RUST_LOG` takes precedence over the config level.
pub fn init_logging(config: &LoggingConfig) -> Result<(), Box<dyn std::error::Error>> {
    let json_format = config.format == "json";

    let mut builder = env_logger::Builder::new();
    builder.filter_level(level_filter(&config.level));
    if let Ok(spec) = std::env::var("RUST_LOG") {
        builder.parse_filters(&spec);
    }

    builder
        .format(move |buf, record| {
            use std::io::Write;

            let line = record.args().to_string();
            if let Ok(json_value) = serde_json::from_str::<Value>(&line) {
                if json_format {
                    writeln!(buf, "{}", json_value)
                } else {
                    writeln!(buf, "{}", serde_json::to_string_pretty(&json_value)?)
                }
            } else if json_format {
                let entry = json!({
                    "timestamp": chrono::Utc::now().to_rfc3339(),
                    "level": record.level().to_string(),
                    "target": record.target(),
                    "message": line,
                });
                writeln!(buf, "{}", entry)
            } else {
                writeln!(
                    buf,
                    "{} [{}] {}: {}",
                    chrono::Utc::now().format("%Y-%m-%d %H:%M:%S%.3f"),
                    record.level(),
                    record.target(),
                    line
                )
            }
        })
        .try_init()?;

    info!("Structured logging initialized");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::IndexError;
    use serde_json::json;

    #[test]
    fn test_log_context_creation() {
        let context = LogContext::new("test_component", "test_operation");
        assert_eq!(context.component, "test_component");
        assert_eq!(context.operation, "test_operation");
        assert!(context.metadata.is_empty());
    }

    #[test]
    fn test_log_context_with_metadata() {
        let context = LogContext::new("test", "test")
            .with_address("znExample")
            .with_txid("t1")
            .with_height(42);

        assert_eq!(context.metadata.get("address"), Some(&json!("znExample")));
        assert_eq!(context.metadata.get("txid"), Some(&json!("t1")));
        assert_eq!(context.metadata.get("height"), Some(&json!(42)));
    }

    #[test]
    fn test_log_context_format_message() {
        let context = LogContext::new("test", "test")
            .with_metadata("key", json!("value"));

        let message = context.format_message("INFO", "test message");

        let parsed: Value = serde_json::from_str(&message).expect("Should be valid JSON");
        assert_eq!(parsed["level"], "INFO");
        assert_eq!(parsed["component"], "test");
        assert_eq!(parsed["message"], "test message");
        assert_eq!(parsed["key"], "value");
    }

    #[test]
    fn test_performance_monitor_with_result() {
        let monitor = PerformanceMonitor::new("test_operation")
            .with_metadata("test_key", json!("test_value"));
        assert_eq!(monitor.metadata.get("test_key"), Some(&json!("test_value")));

        let result: Result<(), String> = Err("boom".to_string());
        let duration = monitor.finish_with_result(&result);
        assert!(duration < 60_000);
    }

    #[test]
    fn test_error_and_metrics_logging() {
        // These should not panic
        let error = ExplorerError::IndexQueryFailed(IndexError::Connection("refused".to_string()));
        ErrorLogger::log_error(&error, Some(LogContext::new("test", "error_test")));
        ErrorLogger::log_error(&ExplorerError::MissingAddress, None);

        MetricsLogger::log_index_call("getaddresssummary", 12, true);
        MetricsLogger::log_utxo_listing(2, 5, 1);
        MetricsLogger::log_history_page(2, 10, 3, 2, 40);
        MetricsLogger::log_chain_height(100, 99);
    }

    #[test]
    fn test_level_filter() {
        assert_eq!(level_filter("debug"), LevelFilter::Debug);
        assert_eq!(level_filter("error"), LevelFilter::Error);
        assert_eq!(level_filter("info"), LevelFilter::Info);
        assert_eq!(level_filter("bogus"), LevelFilter::Info);
    }
}
