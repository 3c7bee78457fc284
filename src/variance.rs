//! Variance detection over keg and delivery metrics.
//!
//! Everything in this module is pure: the route layer fetches an
//! [`OpsSnapshot`] from Postgres and hands it over, the analyzer compares
//! each metric against a fixed baseline and classifies the deviation.

use serde::Serialize;

use crate::types::{KegSize, Sensitivity, Severity, VarianceStatus};

/// Expected pour yield in pints for each keg format.
pub fn expected_pints(size: KegSize) -> i32 {
    match size {
        KegSize::SixthBarrel => 41,
        KegSize::QuarterBarrel => 74,
        KegSize::HalfBarrel => 124,
        KegSize::Pony => 53,
        KegSize::Cornelius => 37,
    }
}

/// Per-keg status from the absolute pint variance (expected minus sold).
pub fn keg_variance_status(variance: i32) -> VarianceStatus {
    match variance.abs() {
        0..=3 => VarianceStatus::Normal,
        4..=8 => VarianceStatus::Warning,
        _ => VarianceStatus::Critical,
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Evaluation {
    pub variance: f64,
    pub variance_percentage: f64,
    pub severity: Severity,
    pub confidence: f64,
}

fn severity_for(pct_abs: f64) -> Severity {
    if pct_abs >= 50.0 {
        Severity::Critical
    } else if pct_abs >= 25.0 {
        Severity::High
    } else if pct_abs >= 10.0 {
        Severity::Medium
    } else {
        Severity::Low
    }
}

fn reporting_threshold(sensitivity: Sensitivity) -> f64 {
    match sensitivity {
        Sensitivity::Low => 25.0,
        Sensitivity::Medium => 15.0,
        Sensitivity::High => 10.0,
    }
}

/// Compares a metric against its baseline. Returns `None` when the deviation
/// stays under the sensitivity's reporting threshold (or the baseline is
/// non-positive, which would make the percentage meaningless).
pub fn evaluate(
    current: f64,
    expected: f64,
    data_points: usize,
    sensitivity: Sensitivity,
) -> Option<Evaluation> {
    if expected <= 0.0 {
        return None;
    }

    let variance = current - expected;
    let variance_percentage = (variance / expected) * 100.0;
    let pct_abs = variance_percentage.abs();

    if pct_abs < reporting_threshold(sensitivity) {
        return None;
    }

    let magnitude_confidence = (pct_abs / 50.0).min(1.0);
    let sample_confidence = (data_points as f64 / 100.0).min(1.0);

    Some(Evaluation {
        variance,
        variance_percentage,
        severity: severity_for(pct_abs),
        confidence: (magnitude_confidence + sample_confidence) / 2.0,
    })
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum MetricCategory {
    InventoryStatus,
    KegLifecycle,
    DeliveryTiming,
    DeliveryVolume,
    ProductMix,
    QualityReturns,
}

impl MetricCategory {
    pub fn as_str(&self) -> &'static str {
        match self {
            MetricCategory::InventoryStatus => "inventory_status",
            MetricCategory::KegLifecycle => "keg_lifecycle",
            MetricCategory::DeliveryTiming => "delivery_timing",
            MetricCategory::DeliveryVolume => "delivery_volume",
            MetricCategory::ProductMix => "product_mix",
            MetricCategory::QualityReturns => "quality_returns",
        }
    }
}

/// Aggregates over the reporting window, fetched in one round trip.
#[derive(Debug, Clone, Default, Serialize)]
pub struct OpsSnapshot {
    pub window_days: i64,
    pub active_kegs: i64,
    pub flagged_kegs: i64,
    pub emptied_kegs: i64,
    pub avg_lifecycle_days: Option<f64>,
    pub deliveries: i64,
    pub accepted_deliveries: i64,
    pub rejected_deliveries: i64,
    pub avg_acceptance_lag_hours: Option<f64>,
    pub distinct_styles: i64,
    pub scans: i64,
}

#[derive(Debug, Clone, Serialize)]
pub struct VarianceFinding {
    pub category: MetricCategory,
    pub severity: Severity,
    pub current_value: f64,
    pub expected_value: f64,
    pub variance: f64,
    pub variance_percentage: f64,
    pub confidence: f64,
    pub recommendations: Vec<String>,
}

const EXPECTED_FLAGGED_SHARE_PCT: f64 = 10.0;
const EXPECTED_LIFECYCLE_DAYS: f64 = 21.0;
const EXPECTED_ACCEPTANCE_LAG_HOURS: f64 = 24.0;
const EXPECTED_DELIVERIES_PER_30D: f64 = 40.0;
const EXPECTED_DISTINCT_STYLES: f64 = 8.0;
const EXPECTED_REJECTION_RATE_PCT: f64 = 5.0;

fn recommendations_for(category: MetricCategory, severity: Severity) -> Vec<String> {
    let mut out: Vec<String> = match category {
        MetricCategory::InventoryStatus => vec![
            "Audit kegs flagged WARNING or CRITICAL against tap-room pour logs".into(),
            "Re-scan flagged kegs to confirm the current holder is accurate".into(),
        ],
        MetricCategory::KegLifecycle => vec![
            "Review slow-moving styles and rotate stock toward faster taps".into(),
            "Check for kegs sitting unscanned at a single holder".into(),
        ],
        MetricCategory::DeliveryTiming => vec![
            "Follow up with restaurant managers on pending deliveries".into(),
            "Verify drivers are recording handoff scans at drop-off".into(),
        ],
        MetricCategory::DeliveryVolume => vec![
            "Compare scheduled routes against the delivery records for the window".into(),
            "Confirm seasonal demand assumptions with the brewery".into(),
        ],
        MetricCategory::ProductMix => vec![
            "Review the active style list against the brewery's planned lineup".into(),
        ],
        MetricCategory::QualityReturns => vec![
            "Inspect rejected deliveries for damaged or mislabelled kegs".into(),
            "Collect rejection notes from restaurant managers".into(),
        ],
    };

    if severity >= Severity::High {
        out.push("Escalate to the brewery operations lead for manual review".into());
    }

    out
}

fn finding(
    category: MetricCategory,
    current: f64,
    expected: f64,
    data_points: usize,
    sensitivity: Sensitivity,
) -> Option<VarianceFinding> {
    evaluate(current, expected, data_points, sensitivity).map(|eval| VarianceFinding {
        category,
        severity: eval.severity,
        current_value: current,
        expected_value: expected,
        variance: eval.variance,
        variance_percentage: eval.variance_percentage,
        confidence: eval.confidence,
        recommendations: recommendations_for(category, eval.severity),
    })
}

/// Runs every metric category against the snapshot. Categories without any
/// underlying records are skipped rather than reported as zero-deviation.
/// Results come back sorted by severity, then deviation magnitude.
pub fn analyze_snapshot(snapshot: &OpsSnapshot, sensitivity: Sensitivity) -> Vec<VarianceFinding> {
    let mut findings = Vec::new();

    if snapshot.active_kegs > 0 {
        let flagged_share = snapshot.flagged_kegs as f64 / snapshot.active_kegs as f64 * 100.0;
        findings.extend(finding(
            MetricCategory::InventoryStatus,
            flagged_share,
            EXPECTED_FLAGGED_SHARE_PCT,
            snapshot.active_kegs as usize,
            sensitivity,
        ));

        findings.extend(finding(
            MetricCategory::ProductMix,
            snapshot.distinct_styles as f64,
            EXPECTED_DISTINCT_STYLES,
            snapshot.active_kegs as usize,
            sensitivity,
        ));
    }

    if let Some(lifecycle) = snapshot.avg_lifecycle_days {
        findings.extend(finding(
            MetricCategory::KegLifecycle,
            lifecycle,
            EXPECTED_LIFECYCLE_DAYS,
            snapshot.emptied_kegs as usize,
            sensitivity,
        ));
    }

    if let Some(lag) = snapshot.avg_acceptance_lag_hours {
        findings.extend(finding(
            MetricCategory::DeliveryTiming,
            lag,
            EXPECTED_ACCEPTANCE_LAG_HOURS,
            snapshot.accepted_deliveries as usize,
            sensitivity,
        ));
    }

    if snapshot.window_days > 0 {
        let expected_volume = EXPECTED_DELIVERIES_PER_30D * snapshot.window_days as f64 / 30.0;
        findings.extend(finding(
            MetricCategory::DeliveryVolume,
            snapshot.deliveries as f64,
            expected_volume,
            snapshot.deliveries as usize,
            sensitivity,
        ));
    }

    let resolved = snapshot.accepted_deliveries + snapshot.rejected_deliveries;
    if resolved > 0 {
        let rejection_rate = snapshot.rejected_deliveries as f64 / resolved as f64 * 100.0;
        findings.extend(finding(
            MetricCategory::QualityReturns,
            rejection_rate,
            EXPECTED_REJECTION_RATE_PCT,
            resolved as usize,
            sensitivity,
        ));
    }

    findings.sort_by(|a, b| {
        b.severity.cmp(&a.severity).then(
            b.variance_percentage
                .abs()
                .total_cmp(&a.variance_percentage.abs()),
        )
    });

    findings
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn expected_pints_lookup() {
        assert_eq!(expected_pints(KegSize::SixthBarrel), 41);
        assert_eq!(expected_pints(KegSize::QuarterBarrel), 74);
        assert_eq!(expected_pints(KegSize::HalfBarrel), 124);
        assert_eq!(expected_pints(KegSize::Pony), 53);
        assert_eq!(expected_pints(KegSize::Cornelius), 37);
    }

    #[test]
    fn keg_status_boundaries() {
        assert_eq!(keg_variance_status(0), VarianceStatus::Normal);
        assert_eq!(keg_variance_status(3), VarianceStatus::Normal);
        assert_eq!(keg_variance_status(-3), VarianceStatus::Normal);
        assert_eq!(keg_variance_status(4), VarianceStatus::Warning);
        assert_eq!(keg_variance_status(8), VarianceStatus::Warning);
        assert_eq!(keg_variance_status(-8), VarianceStatus::Warning);
        assert_eq!(keg_variance_status(9), VarianceStatus::Critical);
        assert_eq!(keg_variance_status(-42), VarianceStatus::Critical);
    }

    #[test]
    fn evaluate_computes_percentage_and_severity() {
        let eval = evaluate(150.0, 100.0, 100, Sensitivity::Medium).unwrap();
        assert_eq!(eval.variance, 50.0);
        assert_eq!(eval.variance_percentage, 50.0);
        assert_eq!(eval.severity, Severity::Critical);
        // magnitude saturates at 1.0, sample is 1.0 at 100 points
        assert_eq!(eval.confidence, 1.0);
    }

    #[test]
    fn evaluate_severity_bands_are_monotonic() {
        let severities: Vec<Severity> = [10.0, 25.0, 50.0, 80.0]
            .iter()
            .map(|pct| {
                evaluate(100.0 + pct, 100.0, 50, Sensitivity::High)
                    .unwrap()
                    .severity
            })
            .collect();
        assert_eq!(
            severities,
            vec![
                Severity::Medium,
                Severity::High,
                Severity::Critical,
                Severity::Critical
            ]
        );
    }

    #[test]
    fn evaluate_handles_negative_deviation() {
        let eval = evaluate(70.0, 100.0, 20, Sensitivity::Medium).unwrap();
        assert_eq!(eval.variance, -30.0);
        assert_eq!(eval.variance_percentage, -30.0);
        assert_eq!(eval.severity, Severity::High);
    }

    #[test]
    fn sensitivity_gates_reporting_only() {
        // 12% deviation: under the low (25) and medium (15) thresholds,
        // above the high (10) threshold.
        assert!(evaluate(112.0, 100.0, 10, Sensitivity::Low).is_none());
        assert!(evaluate(112.0, 100.0, 10, Sensitivity::Medium).is_none());
        let eval = evaluate(112.0, 100.0, 10, Sensitivity::High).unwrap();
        assert_eq!(eval.severity, Severity::Medium);
    }

    #[test]
    fn evaluate_rejects_non_positive_baseline() {
        assert!(evaluate(10.0, 0.0, 10, Sensitivity::High).is_none());
        assert!(evaluate(10.0, -5.0, 10, Sensitivity::High).is_none());
    }

    #[test]
    fn confidence_blends_magnitude_and_sample_size() {
        // 20% deviation with 40 data points: (0.4 + 0.4) / 2
        let eval = evaluate(120.0, 100.0, 40, Sensitivity::Medium).unwrap();
        assert!((eval.confidence - 0.4).abs() < 1e-9);
    }

    fn busy_snapshot() -> OpsSnapshot {
        OpsSnapshot {
            window_days: 30,
            active_kegs: 50,
            flagged_kegs: 20,
            emptied_kegs: 12,
            avg_lifecycle_days: Some(35.0),
            deliveries: 41,
            accepted_deliveries: 30,
            rejected_deliveries: 10,
            avg_acceptance_lag_hours: Some(25.0),
            distinct_styles: 8,
            scans: 200,
        }
    }

    #[test]
    fn analyzer_reports_deviating_categories_only() {
        let findings = analyze_snapshot(&busy_snapshot(), Sensitivity::Medium);
        let categories: Vec<MetricCategory> = findings.iter().map(|f| f.category).collect();

        // flagged share 40% vs 10% and rejection rate 25% vs 5% blow past
        // every band; delivery volume 41 vs 40 and lag 25h vs 24h stay quiet.
        assert!(categories.contains(&MetricCategory::InventoryStatus));
        assert!(categories.contains(&MetricCategory::QualityReturns));
        assert!(categories.contains(&MetricCategory::KegLifecycle));
        assert!(!categories.contains(&MetricCategory::DeliveryVolume));
        assert!(!categories.contains(&MetricCategory::DeliveryTiming));
        assert!(!categories.contains(&MetricCategory::ProductMix));
    }

    #[test]
    fn analyzer_sorts_by_severity_then_magnitude() {
        let findings = analyze_snapshot(&busy_snapshot(), Sensitivity::Medium);
        for pair in findings.windows(2) {
            let ordered = pair[0].severity > pair[1].severity
                || (pair[0].severity == pair[1].severity
                    && pair[0].variance_percentage.abs() >= pair[1].variance_percentage.abs());
            assert!(ordered);
        }
    }

    #[test]
    fn analyzer_skips_empty_categories() {
        let snapshot = OpsSnapshot {
            window_days: 30,
            ..OpsSnapshot::default()
        };
        let findings = analyze_snapshot(&snapshot, Sensitivity::High);
        // only delivery volume has a defined baseline with zero records
        assert_eq!(findings.len(), 1);
        assert_eq!(findings[0].category, MetricCategory::DeliveryVolume);
        assert_eq!(findings[0].current_value, 0.0);
    }

    #[test]
    fn high_severity_findings_carry_escalation_advice() {
        let findings = analyze_snapshot(&busy_snapshot(), Sensitivity::Medium);
        let inventory = findings
            .iter()
            .find(|f| f.category == MetricCategory::InventoryStatus)
            .unwrap();
        assert!(inventory.severity >= Severity::High);
        assert!(inventory
            .recommendations
            .iter()
            .any(|r| r.contains("Escalate")));
    }
}
