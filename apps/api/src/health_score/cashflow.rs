//! Cash flow pillar (25 points): payment collection focus.
//!
//! Scores how quickly and completely invoiced work gets paid, entirely
//! independent of revenue volume: collection speed (DIO), overdue
//! invoice count, and overdue amount, minus a penalty when recurring
//! expenses have not been kept up to date.

use chrono::NaiveDate;

use super::inputs::{
    Effort, HealthScoreInputs, PenaltyLine, PillarBreakdown, PillarResult, Priority,
    Recommendation, RecommendationMetrics, ScoreComponent, Timeframe,
};
use super::round1;

pub struct CashFlowCalculator;

/// Estimates days-invoice-overdue from overdue totals when no measured
/// value is available. Calibrated against observed payment patterns:
/// small average amounts are usually recent, large ones long overdue.
pub fn estimate_dio(overdue_amount: f64, overdue_count: u32) -> f64 {
    if overdue_amount <= 0.0 || overdue_count == 0 {
        return 0.0;
    }

    let avg_per_invoice = overdue_amount / overdue_count.max(1) as f64;
    if avg_per_invoice <= 500.0 {
        15.0 + (avg_per_invoice / 500.0) * 15.0 // 15-30 days
    } else if avg_per_invoice <= 1500.0 {
        30.0 + ((avg_per_invoice - 500.0) / 1000.0) * 15.0 // 30-45 days
    } else {
        (45.0 + ((avg_per_invoice - 1500.0) / 1000.0) * 10.0).min(60.0) // 45-60 days max
    }
}

fn dio_points(dio: f64) -> f64 {
    if dio <= 0.0 {
        15.0
    } else if dio <= 7.0 {
        12.0
    } else if dio <= 15.0 {
        8.0
    } else if dio <= 30.0 {
        3.0
    } else {
        0.0
    }
}

fn volume_points(overdue_count: u32) -> f64 {
    match overdue_count {
        0 => 5.0,
        1..=2 => 3.0,
        3..=4 => 1.0,
        _ => 0.0,
    }
}

fn amount_points(overdue_amount: f64) -> f64 {
    if overdue_amount == 0.0 {
        5.0
    } else if overdue_amount <= 3000.0 {
        3.0
    } else if overdue_amount <= 6000.0 {
        1.0
    } else {
        0.0
    }
}

struct RecurringPenalty {
    points: f64,
    detail: String,
    /// Missed occurrences when the penalty comes from due postings.
    missed_count: usize,
    missed_amount: f64,
}

/// Recurring expense coverage penalty: due-but-unposted occurrences
/// weigh by count/amount; with nothing due, a stale registration date
/// still costs points (missing date is treated as 35 days stale).
fn recurring_penalty(inputs: &HealthScoreInputs, today: NaiveDate) -> Option<RecurringPenalty> {
    let due = inputs.dashboard.recurring_due.as_ref();

    if let Some(due) = due.filter(|d| d.total_count > 0) {
        let points = if due.total_count >= 5 || due.total_amount >= 2500.0 {
            5.0
        } else if due.total_count >= 3 || due.total_amount >= 1500.0 {
            3.5
        } else {
            2.0
        };

        let oldest = due.templates.iter().map(|t| t.next_occurrence_date).min();
        let newest = due.templates.iter().map(|t| t.last_occurrence_date).max();
        let span = match (oldest, newest) {
            (Some(a), Some(b)) if a != b => format!(" covering {a} → {b}"),
            (Some(a), _) => format!(" covering {a}"),
            _ => String::new(),
        };

        return Some(RecurringPenalty {
            points,
            detail: format!(
                "{} missed recurring expense{} (€{:.0} outstanding){}",
                due.total_count,
                if due.total_count == 1 { "" } else { "s" },
                due.total_amount,
                span
            ),
            missed_count: due.total_count,
            missed_amount: due.total_amount,
        });
    }

    let days_stale = inputs
        .dashboard
        .last_recurring_registration
        .map(|d| (today - d).num_days())
        .unwrap_or(35);

    let points = if days_stale > 60 {
        5.0
    } else if days_stale > 35 {
        3.5
    } else if days_stale > 21 {
        2.0
    } else {
        return None;
    };

    Some(RecurringPenalty {
        points,
        detail: format!(
            "Last recurring expense registration was {days_stale} days ago (target: record within 21 days)"
        ),
        missed_count: 0,
        missed_amount: 0.0,
    })
}

impl CashFlowCalculator {
    pub fn calculate(&self, inputs: &HealthScoreInputs, today: NaiveDate) -> PillarResult {
        let overdue_amount = inputs.dashboard.overdue_amount;
        let overdue_count = inputs.dashboard.overdue_count;
        let dio = inputs
            .dashboard
            .measured_dio
            .unwrap_or_else(|| estimate_dio(overdue_amount, overdue_count));
        let payment_terms = inputs.dashboard.average_payment_terms.unwrap_or(30.0);

        let dio_score = round1(dio_points(dio));
        let volume_score = round1(volume_points(overdue_count));
        let amount_score = round1(amount_points(overdue_amount));

        let penalty = recurring_penalty(inputs, today);
        let penalty_points = penalty.as_ref().map(|p| p.points).unwrap_or(0.0);

        let score = round1((dio_score + volume_score + amount_score - penalty_points).max(0.0));

        let components = vec![
            ScoreComponent {
                label: "Collection Speed (DIO)".to_string(),
                value: format!("{dio:.1} days overdue"),
                percentage: None,
                points: dio_score,
                max_points: 15.0,
                formula: "0 days=Excellent (15), ≤7=Good (12), ≤15=Fair (8), ≤30=Poor (3), >30=Critical (0)".to_string(),
            },
            ScoreComponent {
                label: "Volume Efficiency".to_string(),
                value: format!("{overdue_count} overdue invoices"),
                percentage: None,
                points: volume_score,
                max_points: 5.0,
                formula: "0=Excellent (5), 1-2=Good (3), 3-4=Fair (1), 5+=Poor (0)".to_string(),
            },
            ScoreComponent {
                label: "Absolute Amount Control".to_string(),
                value: format!("€{overdue_amount:.0} outstanding"),
                percentage: None,
                points: amount_score,
                max_points: 5.0,
                formula: "€0=Excellent (5), €1-3k=Good (3), €3-6k=Fair (1), €6k+=Poor (0)".to_string(),
            },
        ];

        let penalties = penalty
            .as_ref()
            .map(|p| {
                vec![PenaltyLine {
                    label: "Recurring Expense Coverage".to_string(),
                    points: p.points,
                    detail: p.detail.clone(),
                }]
            })
            .unwrap_or_default();

        let recommendations = self.recommendations(
            dio,
            overdue_count,
            overdue_amount,
            payment_terms,
            dio_score,
            volume_score,
            amount_score,
            penalty.as_ref(),
        );

        PillarResult {
            score,
            breakdown: PillarBreakdown {
                title: "Cash Flow Health - Collection Focus (25 points)".to_string(),
                score,
                max_score: 25.0,
                components,
                penalties,
            },
            recommendations,
        }
    }

    #[allow(clippy::too_many_arguments)]
    fn recommendations(
        &self,
        dio: f64,
        overdue_count: u32,
        overdue_amount: f64,
        payment_terms: f64,
        dio_score: f64,
        volume_score: f64,
        amount_score: f64,
        penalty: Option<&RecurringPenalty>,
    ) -> Vec<Recommendation> {
        let mut recommendations = Vec::new();

        let speed_gap = dio.max(0.0);
        let speed_points = (15.0 - dio_score).max(0.1);
        recommendations.push(Recommendation {
            id: "reduce-dio",
            priority: if speed_points >= 5.0 {
                Priority::High
            } else if speed_points >= 2.0 {
                Priority::Medium
            } else {
                Priority::Low
            },
            impact: round1(speed_points),
            effort: if speed_gap <= 7.0 {
                Effort::Low
            } else if speed_gap <= 15.0 {
                Effort::Medium
            } else {
                Effort::High
            },
            timeframe: Timeframe::Immediate,
            title: "Reduce Days Invoice Overdue (DIO)".to_string(),
            description: if speed_gap > 0.0 {
                format!(
                    "Reduce DIO from {dio:.1} days overdue to 0 days (paid within {payment_terms:.0}-day terms)"
                )
            } else {
                "Maintain excellent payment timing (invoices paid within terms)".to_string()
            },
            action_items: if speed_gap > 0.0 {
                vec![
                    format!("Collect payments {:.0} days faster to get to 0 days overdue", speed_gap.ceil()),
                    "Implement proactive reminders: 3 days before due date, on due date, 3 days after".to_string(),
                    "Offer early payment incentive (e.g. 2% discount for payment within terms)".to_string(),
                ]
            } else {
                vec![
                    "Continue proactive payment reminders before due dates".to_string(),
                    "Monitor weekly to catch any degradation early".to_string(),
                ]
            },
            metrics: RecommendationMetrics {
                current: format!("{dio:.1} days overdue ({payment_terms:.0}-day terms)"),
                target: "0 days overdue (paid within terms)".to_string(),
                points_to_gain: round1(speed_points),
            },
        });

        let volume_points_to_gain = (5.0 - volume_score).max(0.1);
        recommendations.push(Recommendation {
            id: "clear-overdue-invoices",
            priority: if volume_points_to_gain >= 3.0 {
                Priority::High
            } else if volume_points_to_gain >= 1.5 {
                Priority::Medium
            } else {
                Priority::Low
            },
            impact: round1(volume_points_to_gain),
            effort: if overdue_count <= 2 {
                Effort::Low
            } else if overdue_count <= 4 {
                Effort::Medium
            } else {
                Effort::High
            },
            timeframe: Timeframe::Weekly,
            title: if overdue_count == 0 {
                "Maintain Zero Overdue Invoices".to_string()
            } else {
                "Clear Overdue Invoices".to_string()
            },
            description: if overdue_count > 0 {
                format!(
                    "Clear {overdue_count} overdue invoice{} to reach target of 0",
                    if overdue_count == 1 { "" } else { "s" }
                )
            } else {
                "Maintain excellent status with 0 overdue invoices".to_string()
            },
            action_items: if overdue_count > 0 {
                vec![
                    "Prioritize the oldest overdue invoices first".to_string(),
                    "Create a systematic collection schedule".to_string(),
                    "Invoice work regularly to prevent backlogs".to_string(),
                ]
            } else {
                vec![
                    "Send payment reminders before invoice due dates".to_string(),
                    "Invoice work weekly or bi-weekly".to_string(),
                ]
            },
            metrics: RecommendationMetrics {
                current: format!("{overdue_count} overdue invoices"),
                target: "0 overdue invoices (Excellent)".to_string(),
                points_to_gain: round1(volume_points_to_gain),
            },
        });

        let amount_points_to_gain = (5.0 - amount_score).max(0.1);
        recommendations.push(Recommendation {
            id: "collect-outstanding-amounts",
            priority: if amount_points_to_gain >= 3.0 {
                Priority::High
            } else if amount_points_to_gain >= 1.5 {
                Priority::Medium
            } else {
                Priority::Low
            },
            impact: round1(amount_points_to_gain),
            effort: if overdue_amount == 0.0 {
                Effort::Low
            } else if overdue_amount <= 3000.0 {
                Effort::Medium
            } else {
                Effort::High
            },
            timeframe: Timeframe::Monthly,
            title: if overdue_amount == 0.0 {
                "Maintain Zero Outstanding Balance".to_string()
            } else {
                "Clear Outstanding Amounts".to_string()
            },
            description: if overdue_amount > 0.0 {
                format!("Collect all €{overdue_amount:.0} outstanding to reach €0")
            } else {
                "Maintain excellent status with €0 outstanding".to_string()
            },
            action_items: if overdue_amount > 0.0 {
                vec![
                    "Focus on the largest invoices first".to_string(),
                    if overdue_amount > 3000.0 {
                        "For amounts >€3,000, consider offering payment plans".to_string()
                    } else {
                        "Implement weekly follow-up calls for outstanding amounts".to_string()
                    },
                    "Set collection milestones to systematically reduce the balance".to_string(),
                ]
            } else {
                vec![
                    "Send payment reminders before all invoice due dates".to_string(),
                    "Monitor daily to catch new overdue amounts immediately".to_string(),
                ]
            },
            metrics: RecommendationMetrics {
                current: format!("€{overdue_amount:.0} outstanding"),
                target: "€0 outstanding (Excellent)".to_string(),
                points_to_gain: round1(amount_points_to_gain),
            },
        });

        if let Some(p) = penalty {
            recommendations.push(Recommendation {
                id: "catch-up-recurring-expenses",
                priority: if p.points >= 5.0 {
                    Priority::High
                } else if p.points >= 3.5 {
                    Priority::Medium
                } else {
                    Priority::Low
                },
                impact: round1(p.points),
                effort: if p.missed_count <= 2 {
                    Effort::Low
                } else if p.missed_count <= 4 {
                    Effort::Medium
                } else {
                    Effort::High
                },
                timeframe: if p.points >= 5.0 {
                    Timeframe::Weekly
                } else {
                    Timeframe::Monthly
                },
                title: if p.missed_count > 0 {
                    format!(
                        "Record {} missed recurring expense{}",
                        p.missed_count,
                        if p.missed_count == 1 { "" } else { "s" }
                    )
                } else {
                    "Review recurring expense registrations".to_string()
                },
                description: if p.missed_count > 0 {
                    format!(
                        "Missing {} recurring expense{} (~€{:.0}) is reducing cash flow visibility.",
                        p.missed_count,
                        if p.missed_count == 1 { "" } else { "s" },
                        p.missed_amount
                    )
                } else {
                    "Recurring expenses have not been registered recently, which hides predictable outflows.".to_string()
                },
                action_items: vec![
                    "Use the recurring expenses due list to post each occurrence with the correct date".to_string(),
                    "Schedule a monthly recurring expense review".to_string(),
                ],
                metrics: RecommendationMetrics {
                    current: p.detail.clone(),
                    target: "All recurring expenses recorded on or before due date".to_string(),
                    points_to_gain: round1(p.points),
                },
            });
        }

        super::engine::sort_and_cap(recommendations)
    }
}
