use std::fmt::{Debug, Display, Formatter};

use serde::{Deserialize, Serialize};

pub const REPORT_KEY: &str = "variance-report";
pub const ACTIVE_REPORT_KEY: &str = "active-variance-report";

#[derive(Debug)]
pub struct PoolInitializationError(pub String);

impl Display for PoolInitializationError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.pad(&self.0)
    }
}

/// Fixed keg formats with a known expected pour yield.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum KegSize {
    #[serde(rename = "1/6BBL")]
    SixthBarrel,
    #[serde(rename = "1/4BBL")]
    QuarterBarrel,
    #[serde(rename = "1/2BBL")]
    HalfBarrel,
    #[serde(rename = "PONY")]
    Pony,
    #[serde(rename = "CORNELIUS")]
    Cornelius,
}

impl KegSize {
    pub fn as_str(&self) -> &'static str {
        match self {
            KegSize::SixthBarrel => "1/6BBL",
            KegSize::QuarterBarrel => "1/4BBL",
            KegSize::HalfBarrel => "1/2BBL",
            KegSize::Pony => "PONY",
            KegSize::Cornelius => "CORNELIUS",
        }
    }

    pub fn parse(raw: &str) -> Option<KegSize> {
        match raw {
            "1/6BBL" => Some(KegSize::SixthBarrel),
            "1/4BBL" => Some(KegSize::QuarterBarrel),
            "1/2BBL" => Some(KegSize::HalfBarrel),
            "PONY" => Some(KegSize::Pony),
            "CORNELIUS" => Some(KegSize::Cornelius),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum VarianceStatus {
    Normal,
    Warning,
    Critical,
}

impl VarianceStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            VarianceStatus::Normal => "NORMAL",
            VarianceStatus::Warning => "WARNING",
            VarianceStatus::Critical => "CRITICAL",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum DeliveryStatus {
    Pending,
    Accepted,
    Rejected,
    Cancelled,
}

impl DeliveryStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            DeliveryStatus::Pending => "PENDING",
            DeliveryStatus::Accepted => "ACCEPTED",
            DeliveryStatus::Rejected => "REJECTED",
            DeliveryStatus::Cancelled => "CANCELLED",
        }
    }

    pub fn parse(raw: &str) -> Option<DeliveryStatus> {
        match raw {
            "PENDING" => Some(DeliveryStatus::Pending),
            "ACCEPTED" => Some(DeliveryStatus::Accepted),
            "REJECTED" => Some(DeliveryStatus::Rejected),
            "CANCELLED" => Some(DeliveryStatus::Cancelled),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Low,
    Medium,
    High,
    Critical,
}

impl Severity {
    pub fn as_str(&self) -> &'static str {
        match self {
            Severity::Low => "low",
            Severity::Medium => "medium",
            Severity::High => "high",
            Severity::Critical => "critical",
        }
    }
}

/// Controls only the reporting threshold, not the severity bands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Sensitivity {
    Low,
    Medium,
    High,
}

impl Sensitivity {
    pub fn parse(raw: &str) -> Option<Sensitivity> {
        match raw {
            "low" => Some(Sensitivity::Low),
            "medium" => Some(Sensitivity::Medium),
            "high" => Some(Sensitivity::High),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AlertStatus {
    New,
    Investigating,
    Resolved,
    FalsePositive,
}

impl AlertStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            AlertStatus::New => "new",
            AlertStatus::Investigating => "investigating",
            AlertStatus::Resolved => "resolved",
            AlertStatus::FalsePositive => "false_positive",
        }
    }

    pub fn parse(raw: &str) -> Option<AlertStatus> {
        match raw {
            "new" => Some(AlertStatus::New),
            "investigating" => Some(AlertStatus::Investigating),
            "resolved" => Some(AlertStatus::Resolved),
            "false_positive" => Some(AlertStatus::FalsePositive),
            _ => None,
        }
    }

    /// `resolved` and `false_positive` are terminal.
    pub fn can_transition_to(&self, next: AlertStatus) -> bool {
        match self {
            AlertStatus::New => next != AlertStatus::New,
            AlertStatus::Investigating => {
                matches!(next, AlertStatus::Resolved | AlertStatus::FalsePositive)
            }
            AlertStatus::Resolved | AlertStatus::FalsePositive => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn keg_size_round_trips_through_str() {
        for size in [
            KegSize::SixthBarrel,
            KegSize::QuarterBarrel,
            KegSize::HalfBarrel,
            KegSize::Pony,
            KegSize::Cornelius,
        ] {
            assert_eq!(KegSize::parse(size.as_str()), Some(size));
        }
        assert_eq!(KegSize::parse("1/3BBL"), None);
    }

    #[test]
    fn alert_status_transitions() {
        assert!(AlertStatus::New.can_transition_to(AlertStatus::Investigating));
        assert!(AlertStatus::New.can_transition_to(AlertStatus::Resolved));
        assert!(AlertStatus::Investigating.can_transition_to(AlertStatus::FalsePositive));
        assert!(!AlertStatus::Investigating.can_transition_to(AlertStatus::New));
        assert!(!AlertStatus::Resolved.can_transition_to(AlertStatus::Investigating));
        assert!(!AlertStatus::FalsePositive.can_transition_to(AlertStatus::Resolved));
    }
}
