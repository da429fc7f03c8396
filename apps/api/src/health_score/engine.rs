//! Business health score engine.
//!
//! A pure input → transform → output flow: the four pillar calculators
//! (profit, cash flow, efficiency, risk) each contribute 0-25 points,
//! and the engine rolls their results into a 0-100 score with
//! breakdowns, recommendations, and cross-pillar insights. Deterministic
//! for a fixed input snapshot and date; no I/O.

use chrono::NaiveDate;
use thiserror::Error;

use super::cashflow::CashFlowCalculator;
use super::efficiency::EfficiencyCalculator;
use super::inputs::{
    HealthScoreInputs, HealthScoreOutputs, Insights, PillarBreakdowns, PillarRecommendations,
    PillarScores, Priority, Recommendation, Timeframe,
};
use super::profit::{targets_configured, ProfitCalculator};
use super::risk::RiskCalculator;

#[derive(Debug, Error, PartialEq)]
pub enum HealthScoreError {
    #[error("Time-based profit targets (hours and hourly rate) must be configured to use the dashboard")]
    TargetsNotConfigured,
}

pub struct HealthScoreEngine {
    cashflow: CashFlowCalculator,
    efficiency: EfficiencyCalculator,
    risk: RiskCalculator,
    profit: ProfitCalculator,
}

impl Default for HealthScoreEngine {
    fn default() -> Self {
        HealthScoreEngine {
            cashflow: CashFlowCalculator,
            efficiency: EfficiencyCalculator,
            risk: RiskCalculator,
            profit: ProfitCalculator,
        }
    }
}

impl HealthScoreEngine {
    pub fn process(
        &self,
        inputs: &HealthScoreInputs,
        today: NaiveDate,
    ) -> Result<HealthScoreOutputs, HealthScoreError> {
        if !targets_configured(inputs.profit_targets.as_ref()) {
            return Err(HealthScoreError::TargetsNotConfigured);
        }

        let profit = self.profit.calculate(inputs, today);
        let cashflow = self.cashflow.calculate(inputs, today);
        let efficiency = self.efficiency.calculate(inputs, today);
        let risk = self.risk.calculate(inputs, today);

        let total = profit.score + cashflow.score + efficiency.score + risk.score;
        let insights = generate_insights(&[
            &profit.recommendations,
            &cashflow.recommendations,
            &efficiency.recommendations,
            &risk.recommendations,
        ]);

        Ok(HealthScoreOutputs {
            scores: PillarScores {
                profit: profit.score,
                cashflow: cashflow.score,
                efficiency: efficiency.score,
                risk: risk.score,
                total,
                total_rounded: total.round() as i64,
            },
            breakdown: PillarBreakdowns {
                profit: profit.breakdown,
                cashflow: cashflow.breakdown,
                efficiency: efficiency.breakdown,
                risk: risk.breakdown,
            },
            recommendations: PillarRecommendations {
                profit: profit.recommendations,
                cashflow: cashflow.recommendations,
                efficiency: efficiency.recommendations,
                risk: risk.recommendations,
            },
            insights,
        })
    }
}

/// Sorts recommendations by priority weight and impact, keeping the top 5.
pub(crate) fn sort_and_cap(mut recommendations: Vec<Recommendation>) -> Vec<Recommendation> {
    recommendations.sort_by(|a, b| {
        let score_a = a.priority.weight() * 10.0 + a.impact;
        let score_b = b.priority.weight() * 10.0 + b.impact;
        score_b.partial_cmp(&score_a).unwrap_or(std::cmp::Ordering::Equal)
    });
    recommendations.truncate(5);
    recommendations
}

fn generate_insights(pillar_recommendations: &[&Vec<Recommendation>]) -> Insights {
    let all: Vec<&Recommendation> = pillar_recommendations
        .iter()
        .flat_map(|recs| recs.iter())
        .collect();

    let mut top_priorities: Vec<&Recommendation> = all
        .iter()
        .copied()
        .filter(|r| r.priority == Priority::High)
        .collect();
    top_priorities.sort_by(|a, b| b.impact.partial_cmp(&a.impact).unwrap_or(std::cmp::Ordering::Equal));

    let mut quick_wins: Vec<&Recommendation> = all
        .iter()
        .copied()
        .filter(|r| r.effort == super::inputs::Effort::Low && r.impact >= 3.0)
        .collect();
    quick_wins.sort_by(|a, b| b.impact.partial_cmp(&a.impact).unwrap_or(std::cmp::Ordering::Equal));

    let mut long_term: Vec<&Recommendation> = all
        .iter()
        .copied()
        .filter(|r| r.timeframe == Timeframe::Monthly)
        .collect();
    long_term.sort_by(|a, b| b.impact.partial_cmp(&a.impact).unwrap_or(std::cmp::Ordering::Equal));

    Insights {
        top_priorities: top_priorities.iter().take(3).map(|r| r.title.clone()).collect(),
        quick_wins: quick_wins.iter().take(3).map(|r| r.title.clone()).collect(),
        long_term_goals: long_term.iter().take(3).map(|r| r.title.clone()).collect(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::health_score::inputs::{
        DashboardMetrics, RollingWindow, TargetsSnapshot, TimeStats, WindowPair,
    };

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn configured_targets() -> TargetsSnapshot {
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

    fn healthy_inputs() -> HealthScoreInputs {
        let window = RollingWindow {
            billable_revenue: 110.0 * 85.0,
            distinct_working_days: 22,
            total_hours: 120.0,
            daily_hours: 120.0 / 22.0,
            billable_hours: 110.0,
            non_billable_hours: 10.0,
            unbilled_hours: 0.0,
            unbilled_value: 0.0,
        };
        HealthScoreInputs {
            dashboard: DashboardMetrics {
                measured_dio: Some(0.0),
                last_recurring_registration: Some(date(2025, 9, 10)),
                ..Default::default()
            },
            time_stats: TimeStats {
                rolling_30_days: Some(WindowPair {
                    current: window,
                    previous: window,
                }),
                ..Default::default()
            },
            profit_targets: Some(configured_targets()),
            ..Default::default()
        }
    }

    #[test]
    fn test_unconfigured_targets_is_an_error() {
        let engine = HealthScoreEngine::default();
        let result = engine.process(&HealthScoreInputs::default(), date(2025, 9, 17));
        assert_eq!(result.unwrap_err(), HealthScoreError::TargetsNotConfigured);
    }

    #[test]
    fn test_deterministic_for_fixed_inputs() {
        let engine = HealthScoreEngine::default();
        let inputs = healthy_inputs();
        let today = date(2025, 9, 17);

        let a = engine.process(&inputs, today).unwrap();
        let b = engine.process(&inputs, today).unwrap();

        assert_eq!(
            serde_json::to_value(&a).unwrap(),
            serde_json::to_value(&b).unwrap()
        );
    }

    #[test]
    fn test_total_is_sum_of_pillars() {
        let engine = HealthScoreEngine::default();
        let outputs = engine.process(&healthy_inputs(), date(2025, 9, 17)).unwrap();
        let s = &outputs.scores;
        assert!((s.total - (s.profit + s.cashflow + s.efficiency + s.risk)).abs() < 1e-9);
        assert_eq!(s.total_rounded, s.total.round() as i64);
    }

    #[test]
    fn test_all_pillars_within_bounds() {
        let engine = HealthScoreEngine::default();

        // A healthy snapshot and a completely empty one (apart from the
        // mandatory targets) must both stay within the pillar ranges.
        let mut empty = HealthScoreInputs {
            profit_targets: Some(configured_targets()),
            ..Default::default()
        };
        empty.dashboard.overdue_amount = 100_000.0;
        empty.dashboard.overdue_count = 50;

        for inputs in [healthy_inputs(), empty] {
            let outputs = engine.process(&inputs, date(2025, 9, 17)).unwrap();
            for score in [
                outputs.scores.profit,
                outputs.scores.cashflow,
                outputs.scores.efficiency,
                outputs.scores.risk,
            ] {
                assert!((0.0..=25.0).contains(&score), "score out of range: {score}");
            }
            assert!(outputs.scores.total <= 100.0);
        }
    }

    #[test]
    fn test_healthy_snapshot_scores_high() {
        let engine = HealthScoreEngine::default();
        let outputs = engine.process(&healthy_inputs(), date(2025, 9, 17)).unwrap();
        assert!(
            outputs.scores.total_rounded >= 90,
            "expected ≥90, got {}",
            outputs.scores.total_rounded
        );
    }

    #[test]
    fn test_missing_optional_sections_default_to_zero() {
        // No rolling windows, no client revenue, no subscription data:
        // the engine must still produce a bounded result.
        let inputs = HealthScoreInputs {
            profit_targets: Some(configured_targets()),
            ..Default::default()
        };
        let outputs = HealthScoreEngine::default()
            .process(&inputs, date(2025, 9, 17))
            .unwrap();
        assert!(outputs.scores.total >= 0.0);
        assert_eq!(outputs.scores.profit, 0.0);
    }

    #[test]
    fn test_sort_and_cap_orders_by_priority_then_impact() {
        use crate::health_score::inputs::{Effort, RecommendationMetrics};

        let rec = |id: &'static str, priority: Priority, impact: f64| Recommendation {
            id,
            priority,
            impact,
            effort: Effort::Low,
            timeframe: Timeframe::Weekly,
            title: id.to_string(),
            description: String::new(),
            action_items: vec![],
            metrics: RecommendationMetrics {
                current: String::new(),
                target: String::new(),
                points_to_gain: impact,
            },
        };

        let sorted = sort_and_cap(vec![
            rec("low-big", Priority::Low, 9.0),
            rec("high-small", Priority::High, 1.0),
            rec("medium", Priority::Medium, 5.0),
        ]);
        assert_eq!(sorted[0].id, "high-small");
        assert_eq!(sorted[1].id, "medium");
        assert_eq!(sorted[2].id, "low-big");
    }
}
