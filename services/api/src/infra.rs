use chrono::NaiveDate;
use metrics_exporter_prometheus::PrometheusHandle;
use outpass::config::CalendarConfig;
use outpass::workflows::outpass::{InMemoryOutpassRepository, OutpassService, WorkweekCalendar};
use std::sync::atomic::AtomicBool;
use std::sync::Arc;

pub(crate) type ApiService = OutpassService<InMemoryOutpassRepository, WorkweekCalendar>;

#[derive(Clone)]
pub(crate) struct AppState {
    pub(crate) readiness: Arc<AtomicBool>,
    pub(crate) metrics: Arc<PrometheusHandle>,
}

/// In-memory engine wired to the configured holiday calendar.
pub(crate) fn build_service(calendar: &CalendarConfig) -> Arc<ApiService> {
    let repository = Arc::new(InMemoryOutpassRepository::default());
    let calendar = Arc::new(WorkweekCalendar::from_config(calendar));
    Arc::new(OutpassService::new(repository, calendar))
}

pub(crate) fn parse_date(raw: &str) -> Result<NaiveDate, String> {
    NaiveDate::parse_from_str(raw.trim(), "%Y-%m-%d")
        .map_err(|err| format!("failed to parse '{raw}' as YYYY-MM-DD ({err})"))
}
