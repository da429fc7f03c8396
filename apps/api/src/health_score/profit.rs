//! Profit pillar (25 points): revenue driver analysis.
//!
//! Two optional revenue streams: time-based (hours × rate) and
//! subscription (users × fee). Component scores are computed per
//! enabled stream and redistributed so that a single-stream business is
//! not punished for the stream it never configured:
//!
//! - hybrid: subscribers 6 + sub pricing 6 + mix 3 + pricing
//!   efficiency 4 + rate optimization 3 + sub effectiveness 3 +
//!   time utilization 15 would exceed 25, but single-stream gating
//!   keeps the realized total at 25.
//! - time-only: pricing efficiency scales 4 → 10, time utilization
//!   keeps its 15.
//! - saas-only: subscription components scale 6→8, 6→8, 3→5, 3→4.
//!
//! Critically weak drivers subtract flat penalties afterwards.

use chrono::NaiveDate;

use super::inputs::{
    Effort, HealthScoreInputs, PenaltyLine, PillarBreakdown, PillarResult, Priority,
    Recommendation, RecommendationMetrics, ScoreComponent, TargetsSnapshot, Timeframe,
};
use super::round1;
use crate::targets::schedule::daily_hours_target;

pub struct ProfitCalculator;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BusinessModel {
    TimeOnly,
    SaasOnly,
    Hybrid,
}

impl BusinessModel {
    fn detect(subscription_enabled: bool, time_based_enabled: bool) -> Self {
        match (subscription_enabled, time_based_enabled) {
            (true, true) => BusinessModel::Hybrid,
            (true, false) => BusinessModel::SaasOnly,
            _ => BusinessModel::TimeOnly,
        }
    }
}

/// Time-based targets must be configured before the pillar (and the
/// dashboard as a whole) can be computed.
pub fn targets_configured(targets: Option<&TargetsSnapshot>) -> bool {
    matches!(
        targets,
        Some(t) if t.setup_completed && t.monthly_hours_target > 0.0 && t.target_hourly_rate > 0.0
    )
}

#[derive(Debug, Clone, Copy, Default)]
struct BaseScores {
    subscriber: f64,
    subscription_pricing: f64,
    revenue_mix: f64,
    pricing_efficiency: f64,
    rate_optimization: f64,
    subscription_effectiveness: f64,
}

#[derive(Debug, Clone, Copy)]
struct RedistributedScores {
    subscriber: f64,
    subscription_pricing: f64,
    revenue_mix: f64,
    pricing_efficiency: f64,
    rate_optimization: f64,
    subscription_effectiveness: f64,
    time_utilization: f64,
    model: BusinessModel,
}

fn redistribute(
    subscription_enabled: bool,
    time_based_enabled: bool,
    base: BaseScores,
    time_utilization: f64,
) -> RedistributedScores {
    let model = BusinessModel::detect(subscription_enabled, time_based_enabled);

    let mut scores = RedistributedScores {
        subscriber: base.subscriber,
        subscription_pricing: base.subscription_pricing,
        revenue_mix: base.revenue_mix,
        pricing_efficiency: base.pricing_efficiency,
        rate_optimization: base.rate_optimization,
        subscription_effectiveness: base.subscription_effectiveness,
        time_utilization,
        model,
    };

    match model {
        BusinessModel::TimeOnly => {
            scores.subscriber = 0.0;
            scores.subscription_pricing = 0.0;
            scores.revenue_mix = 0.0;
            scores.subscription_effectiveness = 0.0;
            scores.rate_optimization = 0.0;
            // Hourly rate value carries the freed points: 4 → 10.
            scores.pricing_efficiency = base.pricing_efficiency * (10.0 / 4.0);
        }
        BusinessModel::SaasOnly => {
            scores.pricing_efficiency = 0.0;
            scores.rate_optimization = 0.0;
            scores.time_utilization = 0.0;
            scores.subscriber = base.subscriber * (8.0 / 6.0);
            scores.subscription_pricing = base.subscription_pricing * (8.0 / 6.0);
            scores.revenue_mix = base.revenue_mix * (5.0 / 3.0);
            scores.subscription_effectiveness = base.subscription_effectiveness * (4.0 / 3.0);
        }
        BusinessModel::Hybrid => {}
    }

    scores
}

struct TimeUtilization {
    hours_score: f64,
    billable_score: f64,
    consistency_score: f64,
    total: f64,
    hours_achievement: f64,
    actual_billable_ratio: f64,
    daily_consistency_ratio: f64,
}

/// Time utilization (15 pts): hours progress 6, billable ratio 6,
/// daily consistency 3, all against the rolling 30-day window.
fn time_utilization(
    inputs: &HealthScoreInputs,
    targets: &TargetsSnapshot,
    today: NaiveDate,
) -> TimeUtilization {
    let rolling = inputs
        .time_stats
        .rolling_30_days
        .as_ref()
        .map(|w| w.current)
        .unwrap_or_default();

    let monthly_target = targets.monthly_hours_target;
    let hours_achievement = if monthly_target > 0.0 {
        rolling.total_hours / monthly_target
    } else {
        0.0
    };
    let hours_score = (hours_achievement * 6.0).min(6.0);

    let target_billable_ratio = if targets.target_billable_ratio > 0.0 {
        targets.target_billable_ratio
    } else {
        90.0
    };
    let actual_billable_ratio = if rolling.total_hours > 0.0 {
        (rolling.billable_hours / rolling.total_hours) * 100.0
    } else {
        0.0
    };
    let billable_achievement = actual_billable_ratio / target_billable_ratio;
    let billable_score = (billable_achievement * 6.0).min(6.0);

    let default_schedule = vec![1, 2, 3, 4, 5];
    let working_days = if targets.target_working_days.is_empty() {
        &default_schedule
    } else {
        &targets.target_working_days
    };
    let daily_target = daily_hours_target(monthly_target, working_days, today);
    let daily_consistency_ratio = if daily_target > 0.0 {
        rolling.daily_hours / daily_target
    } else {
        0.0
    };
    let consistency_score = (daily_consistency_ratio * 3.0).min(3.0);

    TimeUtilization {
        hours_score,
        billable_score,
        consistency_score,
        total: (hours_score + billable_score + consistency_score).min(15.0),
        hours_achievement,
        actual_billable_ratio,
        daily_consistency_ratio,
    }
}

impl ProfitCalculator {
    pub fn calculate(&self, inputs: &HealthScoreInputs, today: NaiveDate) -> PillarResult {
        let Some(targets) = inputs.profit_targets.as_ref().filter(|_| {
            targets_configured(inputs.profit_targets.as_ref())
        }) else {
            return PillarResult {
                score: 0.0,
                breakdown: PillarBreakdown {
                    title: "Profit Health (25 points)".to_string(),
                    score: 0.0,
                    max_score: 25.0,
                    components: vec![],
                    penalties: vec![PenaltyLine {
                        label: "Targets Not Configured".to_string(),
                        points: 0.0,
                        detail: "Time-based profit targets (hours and hourly rate) must be configured".to_string(),
                    }],
                },
                recommendations: vec![],
            };
        };

        let subscription_enabled =
            targets.target_monthly_active_users > 0.0 && targets.target_avg_subscription_fee > 0.0;
        let time_based_enabled =
            targets.monthly_hours_target > 0.0 && targets.target_hourly_rate > 0.0;

        let subscription = inputs.time_stats.subscription.unwrap_or_default();
        let rolling = inputs
            .time_stats
            .rolling_30_days
            .as_ref()
            .map(|w| w.current)
            .unwrap_or_default();

        let mut base = BaseScores::default();
        let mut user_growth_performance = 0.0;
        let mut pricing_performance = 0.0;
        let mut current_mrr = 0.0;

        if subscription_enabled {
            user_growth_performance =
                (subscription.monthly_active_users / targets.target_monthly_active_users).min(1.2);
            base.subscriber = (user_growth_performance * 6.0).min(6.0);

            pricing_performance =
                (subscription.average_subscription_fee / targets.target_avg_subscription_fee)
                    .min(1.5);
            base.subscription_pricing = (pricing_performance * 6.0).min(6.0);

            current_mrr = subscription.monthly_active_users * subscription.average_subscription_fee;
        }

        let time_revenue = rolling.billable_revenue;
        let realized_rate = if rolling.billable_hours > 0.0 {
            time_revenue / rolling.billable_hours
        } else {
            0.0
        };
        let mut rate_performance = 0.0;

        if time_based_enabled {
            rate_performance = (realized_rate / targets.target_hourly_rate).min(1.5);
            base.pricing_efficiency = (rate_performance * 4.0).min(4.0);

            if targets.monthly_revenue_target > 0.0 {
                base.rate_optimization =
                    ((time_revenue / targets.monthly_revenue_target) * 3.0).min(3.0);
            }
        }

        let total_revenue = time_revenue + current_mrr;
        let subscription_weight = if total_revenue > 0.0 {
            current_mrr / total_revenue
        } else {
            0.0
        };
        let mix_optimization = (1.0 - (subscription_weight - 0.3).abs()).max(0.0);
        if subscription_enabled && time_based_enabled {
            base.revenue_mix = (mix_optimization * 3.0).min(3.0);
        }

        if subscription_enabled && targets.monthly_revenue_target > 0.0 {
            base.subscription_effectiveness =
                ((current_mrr / targets.monthly_revenue_target) * 3.0).min(3.0);
        }

        let utilization = time_utilization(inputs, targets, today);
        let scores = redistribute(
            subscription_enabled,
            time_based_enabled,
            base,
            utilization.total,
        );

        let driver_score = scores.subscriber
            + scores.subscription_pricing
            + scores.revenue_mix
            + scores.pricing_efficiency
            + scores.rate_optimization
            + scores.subscription_effectiveness
            + scores.time_utilization;

        // Flat penalties for critically weak drivers of enabled streams.
        let mut penalty_lines = Vec::new();
        let mut penalties = 0.0;
        if subscription_enabled {
            if user_growth_performance < 0.5 && subscription.monthly_active_users < 5.0 {
                penalties += 2.0;
                penalty_lines.push(PenaltyLine {
                    label: "Weak Subscriber Growth".to_string(),
                    points: 2.0,
                    detail: format!(
                        "{:.0} active users against a target of {:.0}",
                        subscription.monthly_active_users, targets.target_monthly_active_users
                    ),
                });
            }
            if pricing_performance < 0.7 && subscription.average_subscription_fee < 20.0 {
                penalties += 2.0;
                penalty_lines.push(PenaltyLine {
                    label: "Weak Subscription Pricing".to_string(),
                    points: 2.0,
                    detail: format!(
                        "€{:.2} average fee against a target of €{:.2}",
                        subscription.average_subscription_fee, targets.target_avg_subscription_fee
                    ),
                });
            }
        }
        if time_based_enabled && rate_performance < 0.7 && realized_rate < 50.0 {
            penalties += 2.0;
            penalty_lines.push(PenaltyLine {
                label: "Weak Hourly Rate Value".to_string(),
                points: 2.0,
                detail: format!(
                    "€{realized_rate:.2}/hr realized against a target of €{:.2}/hr",
                    targets.target_hourly_rate
                ),
            });
        }
        if subscription_enabled
            && time_based_enabled
            && mix_optimization < 0.5
            && total_revenue > 0.0
        {
            penalties += 1.0;
            penalty_lines.push(PenaltyLine {
                label: "Unbalanced Revenue Mix".to_string(),
                points: 1.0,
                detail: format!(
                    "Subscription share {:.0}% against a 30% optimum",
                    subscription_weight * 100.0
                ),
            });
        }

        let score = round1((driver_score - penalties).clamp(0.0, 25.0));

        let components = self.components(
            &scores,
            targets,
            realized_rate,
            time_revenue,
            current_mrr,
            subscription_weight,
            &subscription,
            &utilization,
            rolling.total_hours,
        );

        let recommendations = self.recommendations(
            targets,
            &scores,
            realized_rate,
            rate_performance,
            &utilization,
            subscription_enabled,
            &subscription,
        );

        PillarResult {
            score,
            breakdown: PillarBreakdown {
                title: "Profit Health - Revenue Drivers (25 points)".to_string(),
                score,
                max_score: 25.0,
                components,
                penalties: penalty_lines,
            },
            recommendations,
        }
    }

    #[allow(clippy::too_many_arguments)]
    fn components(
        &self,
        scores: &RedistributedScores,
        targets: &TargetsSnapshot,
        realized_rate: f64,
        time_revenue: f64,
        current_mrr: f64,
        subscription_weight: f64,
        subscription: &super::inputs::SubscriptionStats,
        utilization: &TimeUtilization,
        total_hours: f64,
    ) -> Vec<ScoreComponent> {
        let mut components = Vec::new();

        match scores.model {
            BusinessModel::TimeOnly | BusinessModel::Hybrid => {
                let rate_max = if scores.model == BusinessModel::TimeOnly {
                    10.0
                } else {
                    4.0
                };
                components.push(ScoreComponent {
                    label: "Hourly Rate Value".to_string(),
                    value: format!(
                        "€{realized_rate:.2}/hr realized vs €{:.2}/hr target",
                        targets.target_hourly_rate
                    ),
                    percentage: Some(format!(
                        "{:.1}%",
                        if targets.target_hourly_rate > 0.0 {
                            realized_rate / targets.target_hourly_rate * 100.0
                        } else {
                            0.0
                        }
                    )),
                    points: round1(scores.pricing_efficiency),
                    max_points: rate_max,
                    formula: format!(
                        "min(€{realized_rate:.2} ÷ €{:.2}, 1.5) scaled to {rate_max} pts",
                        targets.target_hourly_rate
                    ),
                });

                components.push(ScoreComponent {
                    label: "Hours Progress".to_string(),
                    value: format!(
                        "{total_hours:.1}h / {:.0}h rolling 30-day target",
                        targets.monthly_hours_target
                    ),
                    percentage: Some(format!("{:.1}%", utilization.hours_achievement * 100.0)),
                    points: round1(utilization.hours_score),
                    max_points: 6.0,
                    formula: format!(
                        "({total_hours:.1} ÷ {:.0}) × 6 = {:.1} pts",
                        targets.monthly_hours_target,
                        utilization.hours_score
                    ),
                });

                components.push(ScoreComponent {
                    label: "Billable Ratio".to_string(),
                    value: format!(
                        "{:.1}% billable vs {:.0}% target",
                        utilization.actual_billable_ratio, targets.target_billable_ratio
                    ),
                    percentage: Some(format!("{:.1}%", utilization.actual_billable_ratio)),
                    points: round1(utilization.billable_score),
                    max_points: 6.0,
                    formula: format!(
                        "({:.1}% ÷ {:.0}%) × 6 = {:.1} pts",
                        utilization.actual_billable_ratio,
                        targets.target_billable_ratio,
                        utilization.billable_score
                    ),
                });

                components.push(ScoreComponent {
                    label: "Daily Consistency".to_string(),
                    value: format!("{:.0}% of daily hours target", utilization.daily_consistency_ratio * 100.0),
                    percentage: Some(format!("{:.0}%", (utilization.daily_consistency_ratio * 100.0).min(100.0))),
                    points: round1(utilization.consistency_score),
                    max_points: 3.0,
                    formula: format!(
                        "{:.0}% × 3 = {:.1} pts",
                        (utilization.daily_consistency_ratio * 100.0).min(100.0),
                        utilization.consistency_score
                    ),
                });
            }
            BusinessModel::SaasOnly => {}
        }

        if matches!(scores.model, BusinessModel::SaasOnly | BusinessModel::Hybrid) {
            let (sub_max, fee_max) = if scores.model == BusinessModel::SaasOnly {
                (8.0, 8.0)
            } else {
                (6.0, 6.0)
            };
            components.push(ScoreComponent {
                label: "Subscriber Growth".to_string(),
                value: format!(
                    "{:.0} users vs {:.0} target",
                    subscription.monthly_active_users, targets.target_monthly_active_users
                ),
                percentage: None,
                points: round1(scores.subscriber),
                max_points: sub_max,
                formula: format!(
                    "min({:.0} ÷ {:.0}, 1.2) scaled to {sub_max} pts",
                    subscription.monthly_active_users, targets.target_monthly_active_users
                ),
            });
            components.push(ScoreComponent {
                label: "Subscription Pricing".to_string(),
                value: format!(
                    "€{:.2} average fee vs €{:.2} target",
                    subscription.average_subscription_fee, targets.target_avg_subscription_fee
                ),
                percentage: None,
                points: round1(scores.subscription_pricing),
                max_points: fee_max,
                formula: format!(
                    "min(€{:.2} ÷ €{:.2}, 1.5) scaled to {fee_max} pts",
                    subscription.average_subscription_fee, targets.target_avg_subscription_fee
                ),
            });
            components.push(ScoreComponent {
                label: "MRR Contribution".to_string(),
                value: format!("€{current_mrr:.0} MRR"),
                percentage: None,
                points: round1(scores.subscription_effectiveness),
                max_points: if scores.model == BusinessModel::SaasOnly { 4.0 } else { 3.0 },
                formula: format!(
                    "€{current_mrr:.0} ÷ €{:.0} revenue target",
                    targets.monthly_revenue_target
                ),
            });
        }

        if scores.model == BusinessModel::Hybrid {
            components.push(ScoreComponent {
                label: "Revenue Mix".to_string(),
                value: format!("{:.0}% subscription share", subscription_weight * 100.0),
                percentage: Some(format!("{:.0}%", subscription_weight * 100.0)),
                points: round1(scores.revenue_mix),
                max_points: 3.0,
                formula: "1 - |share - 30%| scaled to 3 pts".to_string(),
            });
            components.push(ScoreComponent {
                label: "Rate Optimization".to_string(),
                value: format!("€{time_revenue:.0} time revenue"),
                percentage: None,
                points: round1(scores.rate_optimization),
                max_points: 3.0,
                formula: format!(
                    "€{time_revenue:.0} ÷ €{:.0} revenue target × 3",
                    targets.monthly_revenue_target
                ),
            });
        }

        components
    }

    #[allow(clippy::too_many_arguments)]
    fn recommendations(
        &self,
        targets: &TargetsSnapshot,
        scores: &RedistributedScores,
        realized_rate: f64,
        rate_performance: f64,
        utilization: &TimeUtilization,
        subscription_enabled: bool,
        subscription: &super::inputs::SubscriptionStats,
    ) -> Vec<Recommendation> {
        let mut recommendations = Vec::new();

        if scores.model != BusinessModel::SaasOnly {
            let rate_max = if scores.model == BusinessModel::TimeOnly {
                10.0
            } else {
                4.0
            };
            let rate_points = (rate_max - scores.pricing_efficiency).max(0.1);
            recommendations.push(Recommendation {
                id: "raise-realized-rate",
                priority: if rate_points >= rate_max / 2.0 {
                    Priority::High
                } else if rate_points >= rate_max / 4.0 {
                    Priority::Medium
                } else {
                    Priority::Low
                },
                impact: round1(rate_points),
                effort: Effort::Medium,
                timeframe: Timeframe::Monthly,
                title: "Raise Realized Hourly Rate".to_string(),
                description: if rate_performance < 1.0 {
                    format!(
                        "Lift the realized rate from €{realized_rate:.2}/hr to the €{:.2}/hr target",
                        targets.target_hourly_rate
                    )
                } else {
                    "Maintain the realized rate at or above target".to_string()
                },
                action_items: vec![
                    "Review rates on the lowest-priced engagements".to_string(),
                    "Shift hours toward higher-rate clients".to_string(),
                    "Reprice new work at the target rate".to_string(),
                ],
                metrics: RecommendationMetrics {
                    current: format!("€{realized_rate:.2}/hr realized"),
                    target: format!("€{:.2}/hr target", targets.target_hourly_rate),
                    points_to_gain: round1(rate_points),
                },
            });

            let hours_points = (6.0 - utilization.hours_score).max(0.1);
            recommendations.push(Recommendation {
                id: "hit-hours-target",
                priority: if hours_points >= 3.0 {
                    Priority::High
                } else if hours_points >= 1.5 {
                    Priority::Medium
                } else {
                    Priority::Low
                },
                impact: round1(hours_points),
                effort: Effort::Medium,
                timeframe: Timeframe::Weekly,
                title: "Close the Hours Gap".to_string(),
                description: format!(
                    "Tracked hours sit at {:.0}% of the {:.0}h monthly target",
                    utilization.hours_achievement * 100.0,
                    targets.monthly_hours_target
                ),
                action_items: vec![
                    "Plan billable blocks at the start of each week".to_string(),
                    "Track all worked time, including small tasks".to_string(),
                ],
                metrics: RecommendationMetrics {
                    current: format!("{:.0}% of hours target", utilization.hours_achievement * 100.0),
                    target: "100% of monthly hours target".to_string(),
                    points_to_gain: round1(hours_points),
                },
            });

            let billable_points = (6.0 - utilization.billable_score).max(0.1);
            recommendations.push(Recommendation {
                id: "improve-billable-ratio",
                priority: if billable_points >= 3.0 {
                    Priority::Medium
                } else {
                    Priority::Low
                },
                impact: round1(billable_points),
                effort: Effort::Low,
                timeframe: Timeframe::Weekly,
                title: "Improve Billable Ratio".to_string(),
                description: format!(
                    "{:.1}% of tracked hours are billable against a {:.0}% target",
                    utilization.actual_billable_ratio, targets.target_billable_ratio
                ),
                action_items: vec![
                    "Cap non-billable admin time per week".to_string(),
                    "Delegate or batch administrative work".to_string(),
                ],
                metrics: RecommendationMetrics {
                    current: format!("{:.1}% billable", utilization.actual_billable_ratio),
                    target: format!("{:.0}% billable", targets.target_billable_ratio),
                    points_to_gain: round1(billable_points),
                },
            });
        }

        if subscription_enabled {
            let sub_max = if scores.model == BusinessModel::SaasOnly { 8.0 } else { 6.0 };
            let sub_points = (sub_max - scores.subscriber).max(0.1);
            recommendations.push(Recommendation {
                id: "grow-subscriber-base",
                priority: if sub_points >= sub_max / 2.0 {
                    Priority::Medium
                } else {
                    Priority::Low
                },
                impact: round1(sub_points),
                effort: Effort::High,
                timeframe: Timeframe::Monthly,
                title: "Grow Subscriber Base".to_string(),
                description: format!(
                    "Grow from {:.0} to {:.0} active subscribers",
                    subscription.monthly_active_users, targets.target_monthly_active_users
                ),
                action_items: vec![
                    "Focus on user acquisition and retention".to_string(),
                    "Improve onboarding for trial users".to_string(),
                ],
                metrics: RecommendationMetrics {
                    current: format!("{:.0} subscribers", subscription.monthly_active_users),
                    target: format!("{:.0} subscribers", targets.target_monthly_active_users),
                    points_to_gain: round1(sub_points),
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
        RollingWindow, SubscriptionStats, TimeStats, WindowPair,
    };

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn time_targets() -> TargetsSnapshot {
        TargetsSnapshot {
            monthly_revenue_target: 10_000.0,
            monthly_hours_target: 120.0,
            target_hourly_rate: 85.0,
            target_billable_ratio: 90.0,
            target_working_days: vec![1, 2, 3, 4, 5],
            setup_completed: true,
            ..Default::default()
        }
    }

    fn on_target_window() -> RollingWindow {
        // September 2025 has 22 scheduled working days; 120h ≈ 5.45h/day.
        RollingWindow {
            billable_revenue: 110.0 * 85.0,
            distinct_working_days: 22,
            total_hours: 120.0,
            daily_hours: 120.0 / 22.0,
            billable_hours: 110.0,
            non_billable_hours: 10.0,
            unbilled_hours: 0.0,
            unbilled_value: 0.0,
        }
    }

    fn inputs_time_only(window: RollingWindow) -> HealthScoreInputs {
        HealthScoreInputs {
            time_stats: TimeStats {
                rolling_30_days: Some(WindowPair {
                    current: window,
                    previous: window,
                }),
                ..Default::default()
            },
            profit_targets: Some(time_targets()),
            ..Default::default()
        }
    }

    #[test]
    fn test_targets_configured_gate() {
        assert!(!targets_configured(None));
        let mut t = time_targets();
        assert!(targets_configured(Some(&t)));
        t.setup_completed = false;
        assert!(!targets_configured(Some(&t)));
        t.setup_completed = true;
        t.monthly_hours_target = 0.0;
        assert!(!targets_configured(Some(&t)));
    }

    #[test]
    fn test_time_only_on_target_scores_full_25() {
        let result = ProfitCalculator.calculate(&inputs_time_only(on_target_window()), date(2025, 9, 17));
        assert_eq!(result.score, 25.0);
        assert!(result.breakdown.penalties.is_empty());
    }

    #[test]
    fn test_unconfigured_targets_score_zero() {
        let result = ProfitCalculator.calculate(&HealthScoreInputs::default(), date(2025, 9, 17));
        assert_eq!(result.score, 0.0);
    }

    #[test]
    fn test_time_only_redistribution_scales_rate_points() {
        let base = BaseScores {
            pricing_efficiency: 4.0,
            rate_optimization: 3.0,
            ..Default::default()
        };
        let scores = redistribute(false, true, base, 15.0);
        assert_eq!(scores.model, BusinessModel::TimeOnly);
        assert_eq!(scores.pricing_efficiency, 10.0);
        assert_eq!(scores.rate_optimization, 0.0);
        assert_eq!(scores.time_utilization, 15.0);
    }

    #[test]
    fn test_saas_only_redistribution() {
        let base = BaseScores {
            subscriber: 6.0,
            subscription_pricing: 6.0,
            revenue_mix: 3.0,
            subscription_effectiveness: 3.0,
            ..Default::default()
        };
        let scores = redistribute(true, false, base, 15.0);
        assert_eq!(scores.model, BusinessModel::SaasOnly);
        assert_eq!(scores.subscriber, 8.0);
        assert_eq!(scores.subscription_pricing, 8.0);
        assert_eq!(scores.revenue_mix, 5.0);
        assert_eq!(scores.subscription_effectiveness, 4.0);
        assert_eq!(scores.time_utilization, 0.0);
    }

    #[test]
    fn test_weak_hourly_rate_penalized() {
        let mut window = on_target_window();
        // 110 billable hours at €40/hr: performance 0.47, rate below €50.
        window.billable_revenue = 110.0 * 40.0;
        let result = ProfitCalculator.calculate(&inputs_time_only(window), date(2025, 9, 17));
        assert!(result
            .breakdown
            .penalties
            .iter()
            .any(|p| p.label == "Weak Hourly Rate Value" && p.points == 2.0));
    }

    #[test]
    fn test_hybrid_mix_at_optimum_scores_mix_points() {
        let mut inputs = inputs_time_only(on_target_window());
        let mut targets = time_targets();
        targets.target_monthly_active_users = 10.0;
        targets.target_avg_subscription_fee = 25.0;
        inputs.profit_targets = Some(targets);
        // MRR such that subscription share ≈ 30% of total revenue.
        let time_revenue = 110.0 * 85.0;
        let mrr = time_revenue * 0.3 / 0.7;
        inputs.time_stats.subscription = Some(SubscriptionStats {
            monthly_active_users: mrr / 25.0,
            average_subscription_fee: 25.0,
        });

        let result = ProfitCalculator.calculate(&inputs, date(2025, 9, 17));
        let mix = result
            .breakdown
            .components
            .iter()
            .find(|c| c.label == "Revenue Mix")
            .unwrap();
        assert!(mix.points > 2.9, "mix points were {}", mix.points);
    }

    #[test]
    fn test_no_tracked_hours_scores_zero_drivers() {
        let result =
            ProfitCalculator.calculate(&inputs_time_only(RollingWindow::default()), date(2025, 9, 17));
        // All drivers are zero; the weak-rate penalty fires but the
        // floor keeps the pillar at 0.
        assert_eq!(result.score, 0.0);
    }

    #[test]
    fn test_overshooting_hours_caps_at_component_max() {
        let mut window = on_target_window();
        window.total_hours = 200.0;
        window.billable_hours = 190.0;
        window.billable_revenue = 190.0 * 85.0;
        window.daily_hours = 9.0;
        let result = ProfitCalculator.calculate(&inputs_time_only(window), date(2025, 9, 17));
        assert!(result.score <= 25.0);
    }
}
