/// Back-office configuration for the orchestration core.
///
/// Controls validation bounds, campaign resolution policy, message texts, and
/// logging output. Embedders override fields with struct-update syntax over
/// `Default`.
#[derive(Debug, Clone)]
pub struct BackofficeConfig {
    /// Upper bound on inquiry description length, in characters.
    pub inquiry_description_max_chars: usize,
    /// Minimum number of characters in a card number.
    pub min_card_number_len: usize,
    /// Minimum number of characters in a card verification code.
    pub min_cvv_len: usize,
    /// Length of a newly purchased policy's term.
    pub policy_term_years: u32,
    /// When more than one campaign strategy applies, fail instead of picking
    /// the first registered one.
    pub strict_campaign_resolution: bool,
    /// Body used by email campaigns that carry no description.
    pub default_campaign_message: String,
    /// Signature placed at the end of customer-facing reminders.
    pub notification_sender_name: String,
    /// Number of rendered lines the audit listener retains in memory.
    pub audit_trail_capacity: usize,
    pub telemetry: TelemetryConfig,
}

impl Default for BackofficeConfig {
    fn default() -> Self {
        Self {
            inquiry_description_max_chars: 1000,
            min_card_number_len: 13,
            min_cvv_len: 3,
            policy_term_years: 1,
            strict_campaign_resolution: true,
            default_campaign_message: "Thank you for being our valued customer!".to_string(),
            notification_sender_name: "HealthInsure Team".to_string(),
            audit_trail_capacity: 1024,
            telemetry: TelemetryConfig::default(),
        }
    }
}

/// Logging configuration consumed by [`init_tracing`](crate::telemetry::init_tracing).
#[derive(Debug, Clone)]
pub struct TelemetryConfig {
    /// Filter directive used when `RUST_LOG` is unset.
    pub default_directive: String,
    /// Emit JSON lines instead of human-readable output.
    pub json: bool,
}

impl Default for TelemetryConfig {
    fn default() -> Self {
        Self {
            default_directive: "info".to_string(),
            json: false,
        }
    }
}
