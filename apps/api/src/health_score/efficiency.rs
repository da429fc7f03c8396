//! Efficiency pillar (25 points): work-to-revenue conversion.
//!
//! Mirrors the cash flow bucket structure over unbilled work: DRI (days
//! ready to invoice) instead of DIO, unbilled item count instead of
//! overdue count, unbilled value instead of overdue amount.

use chrono::NaiveDate;

use super::inputs::{
    Effort, HealthScoreInputs, PillarBreakdown, PillarResult, Priority, Recommendation,
    RecommendationMetrics, ScoreComponent, Timeframe,
};
use super::round1;

pub struct EfficiencyCalculator;

fn dri_points(dri: f64) -> f64 {
    if dri <= 0.0 {
        15.0
    } else if dri <= 7.0 {
        12.0
    } else if dri <= 15.0 {
        8.0
    } else if dri <= 30.0 {
        3.0
    } else {
        0.0
    }
}

fn volume_points(unbilled_count: u32) -> f64 {
    match unbilled_count {
        0 => 5.0,
        1..=2 => 3.0,
        3..=4 => 1.0,
        _ => 0.0,
    }
}

fn amount_points(unbilled_value: f64) -> f64 {
    if unbilled_value == 0.0 {
        5.0
    } else if unbilled_value <= 3000.0 {
        3.0
    } else if unbilled_value <= 6000.0 {
        1.0
    } else {
        0.0
    }
}

impl EfficiencyCalculator {
    pub fn calculate(&self, inputs: &HealthScoreInputs, _today: NaiveDate) -> PillarResult {
        let unbilled_value = inputs.dashboard.unbilled_value;
        let unbilled_count = inputs.dashboard.unbilled_count;
        let average_dri = inputs.dashboard.average_dri.unwrap_or(0.0);

        let dri_score = round1(dri_points(average_dri));
        let volume_score = round1(volume_points(unbilled_count));
        let amount_score = round1(amount_points(unbilled_value));

        let score = round1(dri_score + volume_score + amount_score);

        let components = vec![
            ScoreComponent {
                label: "DRI (Days Ready to Invoice)".to_string(),
                value: format!("{average_dri:.1} days"),
                percentage: None,
                points: dri_score,
                max_points: 15.0,
                formula: "0 days=Excellent (15), ≤7=Good (12), ≤15=Fair (8), ≤30=Poor (3), >30=Critical (0)".to_string(),
            },
            ScoreComponent {
                label: "Volume Efficiency (Unbilled Count)".to_string(),
                value: format!("{unbilled_count} items"),
                percentage: None,
                points: volume_score,
                max_points: 5.0,
                formula: "0 items=Excellent (5), 1-2=Good (3), 3-4=Fair (1), 5+=Poor (0)".to_string(),
            },
            ScoreComponent {
                label: "Absolute Amount Control".to_string(),
                value: format!("€{unbilled_value:.0}"),
                percentage: None,
                points: amount_score,
                max_points: 5.0,
                formula: "€0=Excellent (5), €1-3k=Good (3), €3-6k=Fair (1), €6k+=Poor (0)".to_string(),
            },
        ];

        let recommendations = self.recommendations(
            average_dri,
            unbilled_count,
            unbilled_value,
            dri_score,
            volume_score,
            amount_score,
        );

        PillarResult {
            score,
            breakdown: PillarBreakdown {
                title: "Efficiency Health - Work-to-Revenue Conversion (25 points)".to_string(),
                score,
                max_score: 25.0,
                components,
                penalties: vec![],
            },
            recommendations,
        }
    }

    fn recommendations(
        &self,
        average_dri: f64,
        unbilled_count: u32,
        unbilled_value: f64,
        dri_score: f64,
        volume_score: f64,
        amount_score: f64,
    ) -> Vec<Recommendation> {
        let mut recommendations = Vec::new();

        let dri_points_to_gain = (15.0 - dri_score).max(0.1);
        recommendations.push(Recommendation {
            id: "reduce-dri",
            priority: if dri_points_to_gain >= 7.0 {
                Priority::High
            } else if dri_points_to_gain >= 3.0 {
                Priority::Medium
            } else {
                Priority::Low
            },
            impact: round1(dri_points_to_gain),
            effort: if unbilled_value > 5000.0 {
                Effort::High
            } else {
                Effort::Medium
            },
            timeframe: Timeframe::Weekly,
            title: "Reduce Days Ready to Invoice (DRI)".to_string(),
            description: if average_dri > 0.0 {
                format!("Reduce DRI from {average_dri:.1} days to 0 days for maximum efficiency")
            } else {
                "Maintain excellent DRI at 0 days".to_string()
            },
            action_items: if average_dri > 0.0 {
                vec![
                    "Invoice ready work immediately (same day)".to_string(),
                    "Review unbilled work daily".to_string(),
                    "Create invoicing calendar reminders".to_string(),
                ]
            } else {
                vec![
                    "Maintain immediate invoicing practices".to_string(),
                    "Monitor unbilled work daily".to_string(),
                ]
            },
            metrics: RecommendationMetrics {
                current: format!("{average_dri:.1} days average"),
                target: "0 days (Excellent)".to_string(),
                points_to_gain: round1(dri_points_to_gain),
            },
        });

        let volume_points_to_gain = (5.0 - volume_score).max(0.1);
        recommendations.push(Recommendation {
            id: "reduce-unbilled-volume",
            priority: if volume_points_to_gain >= 3.0 {
                Priority::High
            } else if volume_points_to_gain >= 2.0 {
                Priority::Medium
            } else {
                Priority::Low
            },
            impact: round1(volume_points_to_gain),
            effort: if unbilled_count > 5 {
                Effort::High
            } else {
                Effort::Medium
            },
            timeframe: Timeframe::Weekly,
            title: "Reduce Unbilled Item Volume".to_string(),
            description: if unbilled_count > 0 {
                format!("Reduce unbilled items from {unbilled_count} to 0 for maximum efficiency")
            } else {
                "Maintain zero unbilled items".to_string()
            },
            action_items: if unbilled_count > 0 {
                vec![
                    "Clear all ready-to-invoice items immediately".to_string(),
                    "Create client-specific invoicing schedules".to_string(),
                ]
            } else {
                vec!["Continue daily monitoring".to_string()]
            },
            metrics: RecommendationMetrics {
                current: format!("{unbilled_count} unbilled items"),
                target: "0 items (Excellent)".to_string(),
                points_to_gain: round1(volume_points_to_gain),
            },
        });

        let amount_points_to_gain = (5.0 - amount_score).max(0.1);
        recommendations.push(Recommendation {
            id: "reduce-unbilled-amount",
            priority: if amount_points_to_gain >= 3.0 {
                Priority::High
            } else if amount_points_to_gain >= 2.0 {
                Priority::Medium
            } else {
                Priority::Low
            },
            impact: round1(amount_points_to_gain),
            effort: if unbilled_value > 6000.0 {
                Effort::High
            } else {
                Effort::Medium
            },
            timeframe: Timeframe::Weekly,
            title: "Reduce Unbilled Value".to_string(),
            description: if unbilled_value > 0.0 {
                format!("Reduce unbilled value from €{unbilled_value:.0} to €0 for maximum efficiency")
            } else {
                "Maintain zero unbilled value".to_string()
            },
            action_items: if unbilled_value > 0.0 {
                vec![
                    "Prioritize high-value unbilled items".to_string(),
                    "Review unbilled work by value daily".to_string(),
                ]
            } else {
                vec!["Continue daily value monitoring".to_string()]
            },
            metrics: RecommendationMetrics {
                current: format!("€{unbilled_value:.0} unbilled"),
                target: "€0 (Excellent)".to_string(),
                points_to_gain: round1(amount_points_to_gain),
            },
        });

        super::engine::sort_and_cap(recommendations)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::health_score::inputs::DashboardMetrics;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn calc(dashboard: DashboardMetrics) -> PillarResult {
        let inputs = HealthScoreInputs {
            dashboard,
            ..Default::default()
        };
        EfficiencyCalculator.calculate(&inputs, date(2025, 9, 17))
    }

    #[test]
    fn test_everything_invoiced_scores_full() {
        let result = calc(DashboardMetrics::default());
        assert_eq!(result.score, 25.0);
    }

    #[test]
    fn test_dri_mirrors_dio_thresholds() {
        assert_eq!(dri_points(0.0), 15.0);
        assert_eq!(dri_points(5.0), 12.0);
        assert_eq!(dri_points(10.0), 8.0);
        assert_eq!(dri_points(20.0), 3.0);
        assert_eq!(dri_points(45.0), 0.0);
    }

    #[test]
    fn test_backlog_degrades_score() {
        let result = calc(DashboardMetrics {
            unbilled_value: 4000.0,
            unbilled_count: 3,
            average_dri: Some(12.0),
            ..Default::default()
        });
        // 8 (DRI) + 1 (volume) + 1 (amount)
        assert_eq!(result.score, 10.0);
    }

    #[test]
    fn test_missing_dri_defaults_to_zero_days() {
        let result = calc(DashboardMetrics {
            unbilled_count: 1,
            unbilled_value: 100.0,
            average_dri: None,
            ..Default::default()
        });
        // 15 (no DRI data) + 3 + 3
        assert_eq!(result.score, 21.0);
    }

    #[test]
    fn test_score_within_bounds() {
        let result = calc(DashboardMetrics {
            unbilled_value: 50_000.0,
            unbilled_count: 40,
            average_dri: Some(120.0),
            ..Default::default()
        });
        assert_eq!(result.score, 0.0);
    }
}
