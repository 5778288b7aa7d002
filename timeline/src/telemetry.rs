use std::{fmt, path::PathBuf, sync::Arc};

use anyhow::Result;
use serde_json::Value;
use shared_event_bus::{EventPublisher, EventRecord};
use shared_logging::{JsonLogger, LogLevel, LogRecord};
use tokio::runtime::{Handle, Runtime};

/// Builder configuring telemetry for the timeline store.
pub struct TimelineTelemetryBuilder {
    component: String,
    log_path: Option<PathBuf>,
    event_publisher: Option<Arc<dyn EventPublisher>>,
}

impl TimelineTelemetryBuilder {
    /// Creates a builder for the named component.
    #[must_use]
    pub fn new(component: impl Into<String>) -> Self {
        Self {
            component: component.into(),
            log_path: None,
            event_publisher: None,
        }
    }

    /// Sets the JSON-lines log path.
    #[must_use]
    pub fn log_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.log_path = Some(path.into());
        self
    }

    /// Assigns the event publisher carrying invalidation notifications.
    #[must_use]
    pub fn event_publisher(mut self, publisher: Arc<dyn EventPublisher>) -> Self {
        self.event_publisher = Some(publisher);
        self
    }

    /// Finalizes the builder.
    pub fn build(self) -> Result<TimelineTelemetry> {
        TimelineTelemetry::new(self.component, self.log_path, self.event_publisher)
    }
}

/// Telemetry handle for timeline mutations. Cheap to clone; logging and
/// event publication are best-effort and never fail the caller.
#[derive(Clone)]
pub struct TimelineTelemetry {
    inner: Arc<TelemetryInner>,
}

impl fmt::Debug for TimelineTelemetry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TimelineTelemetry")
            .field("component", &self.inner.component)
            .finish()
    }
}

struct TelemetryInner {
    component: String,
    logger: Option<JsonLogger>,
    event: Option<EventHandle>,
}

struct EventHandle {
    runtime: Runtime,
    publisher: Arc<dyn EventPublisher>,
}

impl EventHandle {
    fn new(publisher: Arc<dyn EventPublisher>) -> Result<Self> {
        Ok(Self {
            runtime: Runtime::new()?,
            publisher,
        })
    }

    fn publish(&self, record: EventRecord) -> Result<()> {
        if let Ok(handle) = Handle::try_current() {
            let publisher = Arc::clone(&self.publisher);
            handle.spawn(async move {
                if let Err(err) = publisher.publish(record).await {
                    eprintln!("timeline event publish failed: {err:?}");
                }
            });
            Ok(())
        } else {
            self.runtime.block_on(self.publisher.publish(record))
        }
    }
}

impl TimelineTelemetry {
    fn new(
        component: impl Into<String>,
        log_path: Option<PathBuf>,
        event_publisher: Option<Arc<dyn EventPublisher>>,
    ) -> Result<Self> {
        let logger = match log_path {
            Some(path) => Some(JsonLogger::new(path)?),
            None => None,
        };
        let event = match event_publisher {
            Some(publisher) => Some(EventHandle::new(publisher)?),
            None => None,
        };
        Ok(Self {
            inner: Arc::new(TelemetryInner {
                component: component.into(),
                logger,
                event,
            }),
        })
    }

    /// Builder entry point.
    #[must_use]
    pub fn builder(component: impl Into<String>) -> TimelineTelemetryBuilder {
        TimelineTelemetryBuilder::new(component)
    }

    /// Writes one structured log record.
    pub fn log(&self, level: LogLevel, message: &str, fields: Value) -> Result<()> {
        if let Some(logger) = &self.inner.logger {
            logger.record(
                &LogRecord::new(self.inner.component.clone(), level, message)
                    .with_fields(fields),
            )?;
        }
        Ok(())
    }

    /// Publishes one event on the bus.
    pub fn event(&self, kind: &str, payload: Value) -> Result<()> {
        if let Some(event) = &self.inner.event {
            event.publish(EventRecord::new(self.inner.component.clone(), kind, payload))?;
        }
        Ok(())
    }
}
