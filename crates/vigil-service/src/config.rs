//! Service-layer configuration.

/// Tunables for the domain services.
#[derive(Debug, Clone)]
pub struct ServiceConfig {
    /// Daily write limit applied when a tenant's quota row is
    /// materialized on first use (default: 500).
    pub default_daily_write_limit: i64,
    /// Rolling window over which write usage is summed, in hours
    /// (default: 24).
    pub usage_window_hours: i64,
    /// Invite lifetime in seconds (default: 604_800 = 7 days).
    pub invite_lifetime_secs: u64,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            default_daily_write_limit: 500,
            usage_window_hours: 24,
            invite_lifetime_secs: 604_800,
        }
    }
}
