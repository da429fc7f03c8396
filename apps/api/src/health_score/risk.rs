//! Risk pillar (25 points): business continuity.
//!
//! Starts from the full 25 and subtracts penalties: client revenue
//! concentration, period-over-period continuity trends, deviation from
//! the configured working rhythm, and overdue VAT processing.

use chrono::{Datelike, Days, NaiveDate};

use super::inputs::{
    Effort, HealthScoreInputs, PenaltyLine, PillarBreakdown, PillarResult, Priority,
    Recommendation, RecommendationMetrics, Timeframe,
};
use super::round1;
use crate::targets::schedule::daily_hours_target;

pub struct RiskCalculator;

/// Weekly rhythm estimate: a rolling 30-day window spans 30/7 weeks.
const WEEKS_PER_WINDOW: f64 = 4.29;

fn concentration_penalty(top_client_share: f64) -> f64 {
    if top_client_share >= 80.0 {
        9.0
    } else if top_client_share >= 60.0 {
        6.0
    } else if top_client_share >= 40.0 {
        3.0
    } else {
        0.0
    }
}

fn revenue_stability_penalty(current: f64, previous: f64) -> f64 {
    if previous <= 0.0 {
        return 1.5; // no baseline
    }
    let growth = current / previous;
    if growth >= 1.0 {
        0.0
    } else if growth >= 0.9 {
        0.5
    } else if growth >= 0.8 {
        1.5
    } else {
        3.0
    }
}

fn concentration_trend_penalty(current_share: f64, previous_share: f64) -> f64 {
    if previous_share <= 0.0 {
        return 0.5; // no baseline
    }
    let change = current_share - previous_share;
    if change <= 0.0 {
        0.0
    } else if change <= 5.0 {
        0.5
    } else if change <= 10.0 {
        1.25
    } else {
        2.5
    }
}

fn consistency_trend_penalty(
    current_daily: f64,
    previous_daily: f64,
    target_daily: f64,
) -> f64 {
    if previous_daily <= 0.0 || target_daily <= 0.0 {
        return 0.5; // no baseline
    }
    let current_deviation = (current_daily - target_daily).abs() / target_daily;
    let previous_deviation = (previous_daily - target_daily).abs() / target_daily;
    let change = current_deviation - previous_deviation;
    if change <= 0.0 {
        0.0
    } else if change <= 0.1 {
        0.5
    } else if change <= 0.2 {
        1.25
    } else {
        2.5
    }
}

/// The VAT deadline for `today` is the last day of the previous quarter.
fn vat_deadline(today: NaiveDate) -> NaiveDate {
    let quarter_start_month = ((today.month() - 1) / 3) * 3 + 1;
    NaiveDate::from_ymd_opt(today.year(), quarter_start_month, 1)
        .expect("quarter start is valid")
        - Days::new(1)
}

fn vat_penalty(last_processed: Option<NaiveDate>, today: NaiveDate) -> (f64, i64) {
    let deadline = vat_deadline(today);
    let processed_in_time = last_processed.map(|d| d >= deadline).unwrap_or(false);
    if processed_in_time {
        return (0.0, 0);
    }

    let days_overdue = (today - deadline).num_days();
    if days_overdue > 21 {
        (5.0, days_overdue)
    } else if days_overdue > 0 {
        (2.0, days_overdue)
    } else {
        (0.0, days_overdue)
    }
}

impl RiskCalculator {
    pub fn calculate(&self, inputs: &HealthScoreInputs, today: NaiveDate) -> PillarResult {
        let client_rolling = inputs
            .client_revenue
            .as_ref()
            .and_then(|c| c.rolling.as_ref());
        let top_client_share = client_rolling.map(|w| w.current.top_client_share).unwrap_or(0.0);
        let previous_share = client_rolling.map(|w| w.previous.top_client_share).unwrap_or(0.0);

        let client_risk = round1(concentration_penalty(top_client_share));

        let targets = inputs.profit_targets.as_ref();
        let default_schedule = vec![1, 2, 3, 4, 5];
        let working_days = targets
            .map(|t| t.target_working_days.as_slice())
            .filter(|d| !d.is_empty())
            .unwrap_or(&default_schedule);
        let target_days_per_week = working_days.len() as f64;
        let target_daily_hours = match targets {
            Some(t) if t.monthly_hours_target > 0.0 => {
                daily_hours_target(t.monthly_hours_target, working_days, today)
            }
            _ => 8.0,
        };

        let rolling = inputs.time_stats.rolling_30_days.as_ref();
        let current_revenue = rolling.map(|w| w.current.billable_revenue).unwrap_or(0.0);
        let previous_revenue = rolling.map(|w| w.previous.billable_revenue).unwrap_or(0.0);
        let current_daily = rolling.map(|w| w.current.daily_hours).unwrap_or(0.0);
        let previous_daily = rolling.map(|w| w.previous.daily_hours).unwrap_or(0.0);
        let distinct_working_days = rolling.map(|w| w.current.distinct_working_days).unwrap_or(0);

        let revenue_stability = revenue_stability_penalty(current_revenue, previous_revenue);
        let concentration_trend = concentration_trend_penalty(top_client_share, previous_share);
        let consistency_trend =
            consistency_trend_penalty(current_daily, previous_daily, target_daily_hours);
        let continuity_risk = round1(revenue_stability + concentration_trend + consistency_trend);

        // Daily consistency: deviation from the configured working rhythm.
        let estimated_days_per_week = if distinct_working_days > 0 {
            distinct_working_days as f64 / WEEKS_PER_WINDOW
        } else {
            target_days_per_week
        };
        let days_deviation =
            (estimated_days_per_week - target_days_per_week).abs() / target_days_per_week;
        let days_risk = round1((days_deviation * 4.0).min(4.0));

        let hours_deviation = if target_daily_hours > 0.0 {
            (current_daily - target_daily_hours).abs() / target_daily_hours
        } else {
            0.0
        };
        let hours_risk = round1((hours_deviation * 4.0).min(4.0));
        let consistency_risk = round1(days_risk + hours_risk);

        let last_vat = targets.and_then(|t| t.last_vat_processed_on);
        let (vat_points, vat_days_overdue) = vat_penalty(last_vat, today);

        let total_penalty = round1(client_risk + continuity_risk + consistency_risk + vat_points);
        let score = round1((25.0 - total_penalty).max(0.0));

        let mut penalties = vec![
            PenaltyLine {
                label: "Client Concentration Risk".to_string(),
                points: client_risk,
                detail: format!("Top client share {top_client_share:.1}% of rolling 30-day revenue (max -9)"),
            },
            PenaltyLine {
                label: "Business Continuity Risk".to_string(),
                points: continuity_risk,
                detail: format!(
                    "Revenue stability -{revenue_stability}, concentration trend -{concentration_trend}, consistency trend -{consistency_trend} (max -8)"
                ),
            },
            PenaltyLine {
                label: "Daily Consistency Risk".to_string(),
                points: consistency_risk,
                detail: format!(
                    "{estimated_days_per_week:.1} days/week vs {target_days_per_week:.0} target, {current_daily:.1}h/day vs {target_daily_hours:.1}h target (max -8)"
                ),
            },
        ];
        if vat_points > 0.0 {
            penalties.push(PenaltyLine {
                label: "VAT Processing".to_string(),
                points: vat_points,
                detail: format!("VAT processing is {vat_days_overdue} days overdue"),
            });
        }

        let recommendations = self.recommendations(
            inputs,
            client_risk,
            continuity_risk,
            consistency_risk,
            vat_points,
            vat_days_overdue,
            top_client_share,
        );

        PillarResult {
            score,
            breakdown: PillarBreakdown {
                title: "Risk Management - Business Continuity (25 points)".to_string(),
                score,
                max_score: 25.0,
                components: vec![],
                penalties,
            },
            recommendations,
        }
    }

    #[allow(clippy::too_many_arguments)]
    fn recommendations(
        &self,
        inputs: &HealthScoreInputs,
        client_risk: f64,
        continuity_risk: f64,
        consistency_risk: f64,
        vat_points: f64,
        vat_days_overdue: i64,
        top_client_share: f64,
    ) -> Vec<Recommendation> {
        let mut recommendations = Vec::new();

        let top_client_name = inputs
            .client_revenue
            .as_ref()
            .and_then(|c| c.top_client.as_ref())
            .map(|c| c.name.clone());

        recommendations.push(Recommendation {
            id: "diversify-client-portfolio",
            priority: if client_risk >= 6.0 {
                Priority::High
            } else if client_risk >= 3.0 {
                Priority::Medium
            } else {
                Priority::Low
            },
            impact: round1(client_risk.max(0.1)),
            effort: Effort::High,
            timeframe: Timeframe::Quarterly,
            title: "Diversify Client Portfolio".to_string(),
            description: match &top_client_name {
                Some(name) if top_client_share >= 40.0 => format!(
                    "Reduce dependency on {name} ({top_client_share:.1}% of revenue) by expanding the client base"
                ),
                _ => "Keep the client base diversified to protect revenue".to_string(),
            },
            action_items: vec![
                "Acquire new clients across different industries".to_string(),
                "Target <20% revenue share per client".to_string(),
                "Develop multiple revenue streams and partnerships".to_string(),
            ],
            metrics: RecommendationMetrics {
                current: format!("Top client at {top_client_share:.1}% of revenue"),
                target: "Diversified client base (<40% per client)".to_string(),
                points_to_gain: round1(client_risk.max(0.1)),
            },
        });

        recommendations.push(Recommendation {
            id: "stabilize-revenue-trend",
            priority: if continuity_risk >= 4.0 {
                Priority::High
            } else if continuity_risk >= 2.0 {
                Priority::Medium
            } else {
                Priority::Low
            },
            impact: round1(continuity_risk.max(0.1)),
            effort: Effort::Medium,
            timeframe: Timeframe::Monthly,
            title: "Stabilize Period-over-Period Revenue".to_string(),
            description: "Keep billable revenue at or above the previous 30-day window".to_string(),
            action_items: vec![
                "Review the pipeline for the coming 30 days".to_string(),
                "Balance work intake to avoid feast-famine cycles".to_string(),
            ],
            metrics: RecommendationMetrics {
                current: format!("-{continuity_risk:.1} pts continuity penalties"),
                target: "Stable or growing 30-day revenue".to_string(),
                points_to_gain: round1(continuity_risk.max(0.1)),
            },
        });

        recommendations.push(Recommendation {
            id: "restore-working-rhythm",
            priority: if consistency_risk >= 4.0 {
                Priority::Medium
            } else {
                Priority::Low
            },
            impact: round1(consistency_risk.max(0.1)),
            effort: Effort::Medium,
            timeframe: Timeframe::Weekly,
            title: "Restore Working Rhythm".to_string(),
            description: "Match tracked days per week and hours per day to the configured schedule"
                .to_string(),
            action_items: vec![
                "Plan working days at the start of each week".to_string(),
                "Track time daily so rhythm deviations surface early".to_string(),
            ],
            metrics: RecommendationMetrics {
                current: format!("-{consistency_risk:.1} pts rhythm deviation"),
                target: "Days and hours on target schedule".to_string(),
                points_to_gain: round1(consistency_risk.max(0.1)),
            },
        });

        if vat_points > 0.0 {
            recommendations.push(Recommendation {
                id: "process-vat-return",
                priority: if vat_points >= 5.0 {
                    Priority::High
                } else {
                    Priority::Medium
                },
                impact: round1(vat_points),
                effort: Effort::Low,
                timeframe: Timeframe::Immediate,
                title: "Process Overdue VAT Return".to_string(),
                description: format!(
                    "The quarterly VAT return is {vat_days_overdue} days past the deadline"
                ),
                action_items: vec![
                    "Complete the BTW return for the previous quarter".to_string(),
                    "Record the processing date to clear the penalty".to_string(),
                ],
                metrics: RecommendationMetrics {
                    current: format!("{vat_days_overdue} days overdue"),
                    target: "VAT processed before the quarter deadline".to_string(),
                    points_to_gain: round1(vat_points),
                },
            });
        }

        super::engine::sort_and_cap(recommendations)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::health_score::inputs::{
        ClientRevenueSnapshot, ClientShareWindow, RollingWindow, TargetsSnapshot, TimeStats,
        WindowPair,
    };

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn targets() -> TargetsSnapshot {
        TargetsSnapshot {
            monthly_revenue_target: 10_000.0,
            monthly_hours_target: 120.0,
            target_hourly_rate: 85.0,
            target_billable_ratio: 90.0,
            target_working_days: vec![1, 2, 3, 4, 5],
            setup_completed: true,
            last_vat_processed_on: Some(date(2025, 9, 1)),
            ..Default::default()
        }
    }

    #[test]
    fn test_concentration_buckets() {
        assert_eq!(concentration_penalty(85.0), 9.0);
        assert_eq!(concentration_penalty(70.0), 6.0);
        assert_eq!(concentration_penalty(50.0), 3.0);
        assert_eq!(concentration_penalty(30.0), 0.0);
    }

    #[test]
    fn test_revenue_stability_tiers() {
        assert_eq!(revenue_stability_penalty(1100.0, 1000.0), 0.0);
        assert_eq!(revenue_stability_penalty(950.0, 1000.0), 0.5);
        assert_eq!(revenue_stability_penalty(850.0, 1000.0), 1.5);
        assert_eq!(revenue_stability_penalty(500.0, 1000.0), 3.0);
        assert_eq!(revenue_stability_penalty(500.0, 0.0), 1.5);
    }

    #[test]
    fn test_concentration_trend_tiers() {
        assert_eq!(concentration_trend_penalty(40.0, 45.0), 0.0);
        assert_eq!(concentration_trend_penalty(48.0, 45.0), 0.5);
        assert_eq!(concentration_trend_penalty(53.0, 45.0), 1.25);
        assert_eq!(concentration_trend_penalty(60.0, 45.0), 2.5);
        assert_eq!(concentration_trend_penalty(60.0, 0.0), 0.5);
    }

    #[test]
    fn test_vat_deadline_is_last_day_of_previous_quarter() {
        assert_eq!(vat_deadline(date(2025, 8, 6)), date(2025, 6, 30));
        assert_eq!(vat_deadline(date(2025, 1, 15)), date(2024, 12, 31));
        assert_eq!(vat_deadline(date(2025, 12, 1)), date(2025, 9, 30));
    }

    #[test]
    fn test_vat_penalty_tiers() {
        let today = date(2025, 7, 10); // deadline June 30, 10 days overdue
        assert_eq!(vat_penalty(Some(date(2025, 7, 5)), today).0, 0.0);
        assert_eq!(vat_penalty(Some(date(2025, 6, 1)), today).0, 2.0);
        assert_eq!(vat_penalty(None, today).0, 2.0);

        let later = date(2025, 7, 25); // 25 days overdue
        assert_eq!(vat_penalty(Some(date(2025, 6, 1)), later).0, 5.0);
    }

    #[test]
    fn test_on_target_rhythm_keeps_most_points() {
        // September 2025 has 22 Mon-Fri working days; 120h/month ≈ 5.45h/day.
        let daily = 120.0 / 22.0;
        let window = RollingWindow {
            billable_revenue: 8000.0,
            distinct_working_days: 21, // 21 / 4.29 ≈ 4.9 days/week
            total_hours: 120.0,
            daily_hours: daily,
            billable_hours: 110.0,
            non_billable_hours: 10.0,
            unbilled_hours: 0.0,
            unbilled_value: 0.0,
        };
        let inputs = HealthScoreInputs {
            time_stats: TimeStats {
                rolling_30_days: Some(WindowPair {
                    current: window,
                    previous: window,
                }),
                ..Default::default()
            },
            profit_targets: Some(targets()),
            client_revenue: Some(ClientRevenueSnapshot {
                top_client: None,
                rolling: Some(WindowPair {
                    current: ClientShareWindow {
                        top_client_share: 25.0,
                        total_revenue: 8000.0,
                    },
                    previous: ClientShareWindow {
                        top_client_share: 25.0,
                        total_revenue: 8000.0,
                    },
                }),
            }),
            ..Default::default()
        };

        let result = RiskCalculator.calculate(&inputs, date(2025, 9, 17));
        assert!(result.score >= 23.0, "score was {}", result.score);
    }

    #[test]
    fn test_no_data_still_yields_bounded_score() {
        let result = RiskCalculator.calculate(&HealthScoreInputs::default(), date(2025, 8, 6));
        assert!(result.score >= 0.0 && result.score <= 25.0);
    }

    #[test]
    fn test_heavy_concentration_costs_nine_points() {
        let inputs = HealthScoreInputs {
            client_revenue: Some(ClientRevenueSnapshot {
                top_client: None,
                rolling: Some(WindowPair {
                    current: ClientShareWindow {
                        top_client_share: 90.0,
                        total_revenue: 5000.0,
                    },
                    previous: ClientShareWindow {
                        top_client_share: 90.0,
                        total_revenue: 5000.0,
                    },
                }),
            }),
            ..Default::default()
        };
        let result = RiskCalculator.calculate(&inputs, date(2025, 8, 6));
        let concentration = result
            .breakdown
            .penalties
            .iter()
            .find(|p| p.label.contains("Concentration"))
            .unwrap();
        assert_eq!(concentration.points, 9.0);
    }
}
