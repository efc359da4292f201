//! Interpretation of the liveness API response.

use chrono::{DateTime, Utc};
use serde_json::{Number, Value};
use std::fmt;

/// Placeholder shown when the response carries no probability.
pub const NOT_AVAILABLE: &str = "N/A";

/// Headline liveness probability.
#[derive(Debug, Clone, PartialEq)]
pub enum Probability {
    /// Numeric `liveness.probability` as sent by the API.
    Reported(Number),
    /// Field absent or not a number.
    NotAvailable,
}

impl Probability {
    /// Extracts `liveness.probability` from a response body.
    ///
    /// A missing or non-numeric field is not an error; it yields
    /// [`Probability::NotAvailable`].
    pub fn from_body(body: &Value) -> Self {
        match body.pointer("/liveness/probability") {
            Some(Value::Number(n)) => Probability::Reported(n.clone()),
            _ => Probability::NotAvailable,
        }
    }

    /// The probability as a float, if reported.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Probability::Reported(n) => n.as_f64(),
            Probability::NotAvailable => None,
        }
    }
}

impl fmt::Display for Probability {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Probability::Reported(n) => write!(f, "{n}"),
            Probability::NotAvailable => f.write_str(NOT_AVAILABLE),
        }
    }
}

/// A parsed response, kept whole for raw display.
#[derive(Debug, Clone, PartialEq)]
pub struct LivenessOutcome {
    status: u16,
    body: Value,
    probability: Probability,
    received_at: DateTime<Utc>,
}

impl LivenessOutcome {
    /// Parses the probability out of `body` and stamps the receive time.
    pub fn new(status: u16, body: Value) -> Self {
        let probability = Probability::from_body(&body);
        Self {
            status,
            body,
            probability,
            received_at: Utc::now(),
        }
    }

    /// HTTP status the body arrived with.
    pub fn status(&self) -> u16 {
        self.status
    }

    /// Headline probability, or `N/A`.
    pub fn probability(&self) -> &Probability {
        &self.probability
    }

    /// When the response was received.
    pub fn received_at(&self) -> DateTime<Utc> {
        self.received_at
    }

    /// Body pretty-printed with two-space indentation.
    pub fn pretty_body(&self) -> String {
        serde_json::to_string_pretty(&self.body).unwrap_or_else(|_| self.body.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_probability_present() {
        let outcome = LivenessOutcome::new(200, json!({"liveness": {"probability": 87}}));
        assert_eq!(outcome.probability().to_string(), "87");
        assert_eq!(outcome.probability().as_f64(), Some(87.0));
    }

    #[test]
    fn test_fractional_probability_kept_verbatim() {
        let outcome = LivenessOutcome::new(200, json!({"liveness": {"probability": 93.25}}));
        assert_eq!(outcome.probability().to_string(), "93.25");
    }

    #[test]
    fn test_zero_probability_is_reported() {
        // Zero is a present, numeric value and is shown as such
        let outcome = LivenessOutcome::new(200, json!({"liveness": {"probability": 0}}));
        assert_eq!(outcome.probability().to_string(), "0");
        assert_eq!(outcome.probability().as_f64(), Some(0.0));
        assert_ne!(outcome.probability(), &Probability::NotAvailable);
    }

    #[test]
    fn test_probability_missing() {
        let outcome = LivenessOutcome::new(200, json!({"status": "ok"}));
        assert_eq!(outcome.probability(), &Probability::NotAvailable);
        assert_eq!(outcome.probability().to_string(), NOT_AVAILABLE);
    }

    #[test]
    fn test_probability_wrong_type() {
        let body = json!({"liveness": {"probability": "high"}});
        assert_eq!(Probability::from_body(&body), Probability::NotAvailable);
        assert_eq!(Probability::from_body(&json!([1, 2])), Probability::NotAvailable);
    }

    #[test]
    fn test_pretty_body() {
        let outcome = LivenessOutcome::new(200, json!({"status": "ok"}));
        assert_eq!(outcome.pretty_body(), "{\n  \"status\": \"ok\"\n}");
    }
}
