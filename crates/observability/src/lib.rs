use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use once_cell::sync::OnceCell;
use serde::Serialize;
use tracing_subscriber::EnvFilter;

static TRACING_INIT: OnceCell<()> = OnceCell::new();

#[derive(Debug, Default)]
pub struct AppMetrics {
    turns_total: AtomicU64,
    rejected_submissions_total: AtomicU64,
    analyses_total: AtomicU64,
    general_fallback_total: AtomicU64,
    total_latency_millis: AtomicU64,
}

#[derive(Debug, Clone, Serialize)]
pub struct MetricsSnapshot {
    pub turns_total: u64,
    pub rejected_submissions_total: u64,
    pub analyses_total: u64,
    pub general_fallback_total: u64,
    pub avg_turn_latency_millis: f64,
}

impl AppMetrics {
    pub fn shared() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn inc_turn(&self) {
        self.turns_total.fetch_add(1, Ordering::Relaxed);
    }

    pub fn inc_rejected_submission(&self) {
        self.rejected_submissions_total
            .fetch_add(1, Ordering::Relaxed);
    }

    pub fn inc_analysis(&self) {
        self.analyses_total.fetch_add(1, Ordering::Relaxed);
    }

    pub fn inc_general_fallback(&self) {
        self.general_fallback_total.fetch_add(1, Ordering::Relaxed);
    }

    pub fn observe_turn_latency(&self, duration: Duration) {
        self.total_latency_millis
            .fetch_add(duration.as_millis() as u64, Ordering::Relaxed);
    }

    pub fn snapshot(&self) -> MetricsSnapshot {
        let turns = self.turns_total.load(Ordering::Relaxed);
        let latency = self.total_latency_millis.load(Ordering::Relaxed);

        MetricsSnapshot {
            turns_total: turns,
            rejected_submissions_total: self.rejected_submissions_total.load(Ordering::Relaxed),
            analyses_total: self.analyses_total.load(Ordering::Relaxed),
            general_fallback_total: self.general_fallback_total.load(Ordering::Relaxed),
            avg_turn_latency_millis: if turns == 0 {
                0.0
            } else {
                latency as f64 / turns as f64
            },
        }
    }
}

pub fn init_tracing(service_name: &str) {
    TRACING_INIT.get_or_init(|| {
        let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::new(format!(
                "{}=info,mentor_api=info,mentor_agents=info",
                service_name
            ))
        });

        tracing_subscriber::fmt()
            .json()
            .with_env_filter(filter)
            .with_current_span(true)
            .with_span_list(true)
            .init();
    });
}
