//! Behavior-gated diagnostics.
//!
//! Each [`Logger`] is bound to a [`LoggingBehavior`]. Entries are only emitted when that
//! behavior is part of the process-wide enabled set, and are forwarded to the `log`
//! facade plus an optional user handler.

use chrono::{DateTime, Utc};
use std::collections::HashSet;
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, LazyLock, RwLock};

static ENABLED_BEHAVIORS: LazyLock<RwLock<HashSet<LoggingBehavior>>> =
    LazyLock::new(|| RwLock::new(HashSet::from([LoggingBehavior::DeveloperErrors])));
static USER_LOG_HANDLER: LazyLock<RwLock<Option<LogHandler>>> =
    LazyLock::new(|| RwLock::new(None));
static SERIAL_NUMBER: AtomicU64 = AtomicU64::new(1);

pub type LogHandler = Arc<dyn Fn(&LogEntry) + Send + Sync + 'static>;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum LoggingBehavior {
    AccessTokens,
    AppEvents,
    CacheErrors,
    DeveloperErrors,
    GraphApiDebugInfo,
    GraphApiDebugWarning,
    Informational,
    NetworkRequests,
    UiControlErrors,
}

impl LoggingBehavior {
    pub fn as_str(self) -> &'static str {
        match self {
            LoggingBehavior::AccessTokens => "include_access_tokens",
            LoggingBehavior::AppEvents => "app_events",
            LoggingBehavior::CacheErrors => "cache_errors",
            LoggingBehavior::DeveloperErrors => "developer_errors",
            LoggingBehavior::GraphApiDebugInfo => "graph_api_debug_info",
            LoggingBehavior::GraphApiDebugWarning => "graph_api_debug_warning",
            LoggingBehavior::Informational => "informational",
            LoggingBehavior::NetworkRequests => "network_requests",
            LoggingBehavior::UiControlErrors => "ui_control_errors",
        }
    }

    fn level(self) -> log::Level {
        match self {
            LoggingBehavior::DeveloperErrors
            | LoggingBehavior::CacheErrors
            | LoggingBehavior::UiControlErrors => log::Level::Warn,
            LoggingBehavior::GraphApiDebugWarning => log::Level::Warn,
            LoggingBehavior::NetworkRequests | LoggingBehavior::GraphApiDebugInfo => {
                log::Level::Debug
            }
            _ => log::Level::Info,
        }
    }
}

impl fmt::Display for LoggingBehavior {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single emitted diagnostic, as handed to the user log handler.
#[derive(Clone, Debug)]
pub struct LogEntry {
    pub behavior: LoggingBehavior,
    pub serial_number: u64,
    pub timestamp: DateTime<Utc>,
    pub message: String,
}

#[derive(Clone)]
pub struct Logger {
    inner: Arc<LoggerInner>,
}

struct LoggerInner {
    behavior: LoggingBehavior,
    contents: RwLock<String>,
}

impl Logger {
    pub fn new(behavior: LoggingBehavior) -> Self {
        Self {
            inner: Arc::new(LoggerInner {
                behavior,
                contents: RwLock::new(String::new()),
            }),
        }
    }

    pub fn developer_errors() -> Self {
        Self::new(LoggingBehavior::DeveloperErrors)
    }

    pub fn behavior(&self) -> LoggingBehavior {
        self.inner.behavior
    }

    pub fn is_active(&self) -> bool {
        is_behavior_enabled(self.inner.behavior)
    }

    /// Emits `message` immediately if the logger's behavior is enabled.
    pub fn log_entry(&self, message: impl Into<String>) {
        if !self.is_active() {
            return;
        }
        emit(self.inner.behavior, message.into());
    }

    /// Buffers `fragment` until [`Logger::flush`] is called.
    pub fn append(&self, fragment: impl AsRef<str>) {
        if !self.is_active() {
            return;
        }
        self.inner.contents.write().unwrap().push_str(fragment.as_ref());
    }

    pub fn append_key_value(&self, key: &str, value: impl fmt::Display) {
        self.append(format!("  {key:<10}:\t{value}\n"));
    }

    pub fn contents(&self) -> String {
        self.inner.contents.read().unwrap().clone()
    }

    pub fn flush(&self) {
        let contents = std::mem::take(&mut *self.inner.contents.write().unwrap());
        if !contents.is_empty() {
            self.log_entry(contents);
        }
    }
}

impl fmt::Debug for Logger {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Logger")
            .field("behavior", &self.inner.behavior)
            .finish()
    }
}

fn emit(behavior: LoggingBehavior, message: String) {
    let entry = LogEntry {
        behavior,
        serial_number: SERIAL_NUMBER.fetch_add(1, Ordering::SeqCst),
        timestamp: Utc::now(),
        message,
    };

    log::log!(
        target: "facebook_rs_sdk",
        behavior.level(),
        "FBSDKLog [{}] #{}: {}",
        entry.behavior,
        entry.serial_number,
        entry.message
    );

    let handler = USER_LOG_HANDLER.read().unwrap().clone();
    if let Some(handler) = handler {
        handler(&entry);
    }
}

pub fn is_behavior_enabled(behavior: LoggingBehavior) -> bool {
    ENABLED_BEHAVIORS.read().unwrap().contains(&behavior)
}

pub fn set_logging_behaviors<I>(behaviors: I)
where
    I: IntoIterator<Item = LoggingBehavior>,
{
    *ENABLED_BEHAVIORS.write().unwrap() = behaviors.into_iter().collect();
}

pub fn enable_logging_behavior(behavior: LoggingBehavior) {
    ENABLED_BEHAVIORS.write().unwrap().insert(behavior);
}

pub fn disable_logging_behavior(behavior: LoggingBehavior) {
    ENABLED_BEHAVIORS.write().unwrap().remove(&behavior);
}

pub fn set_user_log_handler<F>(handler: Option<F>)
where
    F: Fn(&LogEntry) + Send + Sync + 'static,
{
    *USER_LOG_HANDLER.write().unwrap() = handler.map(|f| Arc::new(f) as LogHandler);
}
