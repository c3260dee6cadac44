use crate::keys::RetryPolicy;
use clap::Parser;
use std::net::SocketAddr;
use std::time::Duration;

/// Largest page a caller may request, matching the request contracts.
pub const MAX_PAGE_LIMIT: usize = 30;

/// Tunables of the ledger service.
#[derive(Debug, Clone)]
pub struct ServiceConfig {
    pub max_page_limit: usize,
    pub retry: RetryPolicy,
    /// bcrypt work factor for stored passwords.
    pub password_cost: u32,
    /// Backend pages one filtered request may scan; `None` scans to the end.
    pub scan_page_budget: Option<usize>,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            max_page_limit: MAX_PAGE_LIMIT,
            retry: RetryPolicy::default(),
            password_cost: bcrypt::DEFAULT_COST,
            scan_page_budget: None,
        }
    }
}

/// Server configuration, read from flags or the environment.
#[derive(Debug, Clone, Parser)]
#[command(name = "feeledger")]
#[command(about = "School fee ledger HTTP service")]
pub struct AppConfig {
    #[arg(long, env = "FEELEDGER_BIND_ADDR", default_value = "127.0.0.1:8080")]
    pub bind_addr: SocketAddr,

    /// Items per backend page of the in-memory store.
    #[arg(long, env = "FEELEDGER_STORE_PAGE_SIZE", default_value_t = 1000)]
    pub store_page_size: usize,

    #[arg(long, env = "FEELEDGER_MAX_PAGE_LIMIT", default_value_t = MAX_PAGE_LIMIT)]
    pub max_page_limit: usize,

    #[arg(long, env = "FEELEDGER_KEY_RETRY_ATTEMPTS", default_value_t = 8)]
    pub key_retry_attempts: u32,

    #[arg(long, env = "FEELEDGER_KEY_RETRY_BACKOFF_MS", default_value_t = 5)]
    pub key_retry_backoff_ms: u64,

    #[arg(long, env = "FEELEDGER_KEY_RETRY_MAX_BACKOFF_MS", default_value_t = 250)]
    pub key_retry_max_backoff_ms: u64,

    #[arg(long, env = "FEELEDGER_PASSWORD_COST", default_value_t = bcrypt::DEFAULT_COST)]
    pub password_cost: u32,

    /// 0 disables the budget.
    #[arg(long, env = "FEELEDGER_SCAN_PAGE_BUDGET", default_value_t = 0)]
    pub scan_page_budget: usize,
}

impl AppConfig {
    pub fn service_config(&self) -> ServiceConfig {
        ServiceConfig {
            max_page_limit: self.max_page_limit,
            retry: RetryPolicy {
                max_attempts: self.key_retry_attempts,
                initial_backoff: Duration::from_millis(self.key_retry_backoff_ms),
                max_backoff: Duration::from_millis(self.key_retry_max_backoff_ms),
            },
            password_cost: self.password_cost,
            scan_page_budget: (self.scan_page_budget > 0).then_some(self.scan_page_budget),
        }
    }
}
