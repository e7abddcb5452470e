//! Hardware signature gating policy.
//!
//! A call must carry an `X-Hardware-Signature` when its method and path match a
//! rule and either:
//! - the rule has no threshold (critical endpoint, always signed), or
//! - the resolved body amount is at or above the rule's threshold.
//!
//! The table is plain data so it can be loaded from configuration and varied
//! in tests. [`GatingPolicy::default`] carries the production table.
//!
//! # Missing amounts
//!
//! A sensitive endpoint called without a numeric `amount`/`value`/`total` is
//! signed by default ([`MissingAmount::Require`]). Rules may opt into
//! [`MissingAmount::Allow`], which treats an absent amount as zero. A present
//! but non-numeric amount is always signed.

use crate::amount::{resolve_amount, ResolvedAmount};
use crate::error::{GatewayError, GatewayResult};
use crate::request::{ApiRequest, Method};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

/// Amount at or above which sensitive endpoints require a signature.
pub const DEFAULT_HIGH_VALUE_THRESHOLD: Decimal = dec!(200000);

/// Endpoints gated by amount.
const SENSITIVE_PATTERNS: [&str; 3] = ["/withdraw", "/execute_large_trade", "/brokerage/trade"];

/// Endpoints that always require a signature.
const CRITICAL_PATTERNS: [&str; 1] = ["/risk/kill-switch"];

/// Handling of threshold rules when the body carries no amount field.
///
/// A field that is present but not numeric always requires a signature.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MissingAmount {
    /// Require a signature.
    #[default]
    Require,
    /// Treat an absent amount as zero (never gated unless the threshold is zero).
    Allow,
}

/// One gating rule.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PolicyRule {
    /// Substring matched against the request path.
    pub pattern: String,
    /// Methods the rule applies to.
    #[serde(default = "default_methods")]
    pub methods: Vec<Method>,
    /// Amount at or above which a signature is required. `None` = always required.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub threshold: Option<Decimal>,
    #[serde(default)]
    pub on_missing_amount: MissingAmount,
}

fn default_methods() -> Vec<Method> {
    vec![Method::Post]
}

impl PolicyRule {
    /// Rule requiring a signature on every matching call.
    pub fn always(pattern: impl Into<String>) -> Self {
        Self {
            pattern: pattern.into(),
            methods: default_methods(),
            threshold: None,
            on_missing_amount: MissingAmount::Require,
        }
    }

    /// Rule requiring a signature at or above `threshold`.
    pub fn threshold(pattern: impl Into<String>, threshold: Decimal) -> Self {
        Self {
            pattern: pattern.into(),
            methods: default_methods(),
            threshold: Some(threshold),
            on_missing_amount: MissingAmount::Require,
        }
    }

    #[must_use]
    pub fn with_methods(mut self, methods: Vec<Method>) -> Self {
        self.methods = methods;
        self
    }

    #[must_use]
    pub fn with_missing_amount(mut self, on_missing_amount: MissingAmount) -> Self {
        self.on_missing_amount = on_missing_amount;
        self
    }

    pub fn matches(&self, method: Method, path: &str) -> bool {
        self.methods.contains(&method) && path.contains(&self.pattern)
    }
}

/// Why a call needs a signature.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GateReason {
    /// Endpoint is always signed.
    Critical,
    /// Amount reached the threshold.
    HighValue { threshold: Decimal },
    /// Sensitive endpoint without a usable amount.
    AmountMissing { threshold: Decimal },
}

impl GateReason {
    /// Short label for logs and metrics.
    pub fn label(&self) -> &'static str {
        match self {
            GateReason::Critical => "critical",
            GateReason::HighValue { .. } => "high_value",
            GateReason::AmountMissing { .. } => "amount_missing",
        }
    }

    pub fn threshold(&self) -> Option<Decimal> {
        match self {
            GateReason::Critical => None,
            GateReason::HighValue { threshold } | GateReason::AmountMissing { threshold } => {
                Some(*threshold)
            }
        }
    }
}

/// Details of a required signature.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GateRequirement {
    pub reason: GateReason,
    /// Request path, passed to the signer as `endpoint`.
    pub endpoint: String,
    /// Resolved amount, if the body carried one.
    pub amount: Option<Decimal>,
}

/// Result of evaluating a request against the policy.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GateDecision {
    Open,
    Required(GateRequirement),
}

impl GateDecision {
    pub fn is_required(&self) -> bool {
        matches!(self, GateDecision::Required(_))
    }

    pub fn label(&self) -> &'static str {
        match self {
            GateDecision::Open => "open",
            GateDecision::Required(req) => req.reason.label(),
        }
    }
}

/// Ordered set of gating rules.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GatingPolicy {
    #[serde(default)]
    pub rules: Vec<PolicyRule>,
}

impl Default for GatingPolicy {
    fn default() -> Self {
        let mut rules: Vec<PolicyRule> = SENSITIVE_PATTERNS
            .iter()
            .map(|p| PolicyRule::threshold(*p, DEFAULT_HIGH_VALUE_THRESHOLD))
            .collect();
        rules.extend(CRITICAL_PATTERNS.iter().map(|p| PolicyRule::always(*p)));
        Self { rules }
    }
}

impl GatingPolicy {
    pub fn new(rules: Vec<PolicyRule>) -> Self {
        Self { rules }
    }

    /// Policy that never gates.
    pub fn disabled() -> Self {
        Self { rules: Vec::new() }
    }

    /// Check the rule table for configuration mistakes.
    pub fn validate(&self) -> GatewayResult<()> {
        for (idx, rule) in self.rules.iter().enumerate() {
            if rule.pattern.trim().is_empty() {
                return Err(GatewayError::InvalidConfig(format!(
                    "policy rule {idx}: empty pattern"
                )));
            }
            if rule.methods.is_empty() {
                return Err(GatewayError::InvalidConfig(format!(
                    "policy rule {idx} ({}): no methods",
                    rule.pattern
                )));
            }
            if let Some(threshold) = rule.threshold {
                if threshold.is_sign_negative() {
                    return Err(GatewayError::InvalidConfig(format!(
                        "policy rule {idx} ({}): negative threshold {threshold}",
                        rule.pattern
                    )));
                }
            }
        }
        Ok(())
    }

    /// Decide whether `request` needs a hardware signature.
    ///
    /// A matching always-rule wins over any threshold rule.
    pub fn evaluate(&self, request: &ApiRequest) -> GateDecision {
        let amount = resolve_amount(request.body.as_ref());
        let mut reason: Option<GateReason> = None;

        for rule in &self.rules {
            if !rule.matches(request.method, &request.path) {
                continue;
            }

            let Some(threshold) = rule.threshold else {
                reason = Some(GateReason::Critical);
                break;
            };

            if reason.is_some() {
                continue;
            }

            reason = match (&amount, rule.on_missing_amount) {
                (ResolvedAmount::Value(v), _) if *v >= threshold => {
                    Some(GateReason::HighValue { threshold })
                }
                (ResolvedAmount::Value(_), _) => None,
                (ResolvedAmount::Missing, MissingAmount::Allow) => {
                    (Decimal::ZERO >= threshold).then_some(GateReason::HighValue { threshold })
                }
                _ => Some(GateReason::AmountMissing { threshold }),
            };
        }

        match reason {
            Some(reason) => GateDecision::Required(GateRequirement {
                reason,
                endpoint: request.path.clone(),
                amount: amount.value(),
            }),
            None => GateDecision::Open,
        }
    }
}
