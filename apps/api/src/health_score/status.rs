//! Health status bands over the rounded total score.

use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum HealthStatus {
    Excellent,
    Good,
    Warning,
    Critical,
}

impl HealthStatus {
    pub fn threshold(self) -> i64 {
        match self {
            HealthStatus::Excellent => 85,
            HealthStatus::Good => 70,
            HealthStatus::Warning => 50,
            HealthStatus::Critical => 0,
        }
    }

    pub fn message(self) -> &'static str {
        match self {
            HealthStatus::Excellent => "Crushing your targets! Keep it up!",
            HealthStatus::Good => "Strong performance this month",
            HealthStatus::Warning => "Room for improvement - you got this!",
            HealthStatus::Critical => "Let's turn this around together!",
        }
    }
}

pub fn status_for_score(score: i64) -> HealthStatus {
    if score >= HealthStatus::Excellent.threshold() {
        HealthStatus::Excellent
    } else if score >= HealthStatus::Good.threshold() {
        HealthStatus::Good
    } else if score >= HealthStatus::Warning.threshold() {
        HealthStatus::Warning
    } else {
        HealthStatus::Critical
    }
}

#[derive(Debug, Clone, Copy, Serialize)]
pub struct Milestone {
    pub target: i64,
    pub points_needed: i64,
    /// Progress from the previous band floor toward the target, 0-100.
    pub progress: f64,
    pub status: HealthStatus,
}

/// Progress toward the next status band; `None` once the score is
/// already excellent.
pub fn next_milestone(score: i64) -> Option<Milestone> {
    if score >= 85 {
        return None;
    }

    let milestones = [50, 70, 85];
    let target = *milestones.iter().find(|&&level| level > score)?;
    let base = match target {
        50 => 0,
        70 => 50,
        _ => 70,
    };
    let range = (target - base) as f64;
    let progress = (((score - base) as f64 / range) * 100.0).clamp(0.0, 100.0);

    Some(Milestone {
        target,
        points_needed: target - score,
        progress,
        status: status_for_score(target),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_bands() {
        assert_eq!(status_for_score(100), HealthStatus::Excellent);
        assert_eq!(status_for_score(85), HealthStatus::Excellent);
        assert_eq!(status_for_score(84), HealthStatus::Good);
        assert_eq!(status_for_score(70), HealthStatus::Good);
        assert_eq!(status_for_score(69), HealthStatus::Warning);
        assert_eq!(status_for_score(50), HealthStatus::Warning);
        assert_eq!(status_for_score(49), HealthStatus::Critical);
        assert_eq!(status_for_score(0), HealthStatus::Critical);
    }

    #[test]
    fn test_no_milestone_when_excellent() {
        assert!(next_milestone(85).is_none());
        assert!(next_milestone(97).is_none());
    }

    #[test]
    fn test_milestone_targets_and_progress() {
        let m = next_milestone(40).unwrap();
        assert_eq!(m.target, 50);
        assert_eq!(m.points_needed, 10);
        assert!((m.progress - 80.0).abs() < 1e-9);

        let m = next_milestone(60).unwrap();
        assert_eq!(m.target, 70);
        assert_eq!(m.status, HealthStatus::Good);

        let m = next_milestone(75).unwrap();
        assert_eq!(m.target, 85);
        assert_eq!(m.status, HealthStatus::Excellent);
    }
}
