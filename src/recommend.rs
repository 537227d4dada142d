//! Action items derived from normalized risk contributions.

use crate::models::{NormalizedMetrics, RiskLevel};

pub const IMMEDIATE_INTERVENTION: &str = "Immediate intervention required";
pub const LOW_ATTENDANCE: &str = "Low attendance detected - Contact student";
pub const POOR_PERFORMANCE: &str = "Poor academic performance - Offer tutoring";
pub const LOW_LIBRARY_USAGE: &str = "Low library usage - Encourage resource access";
pub const INACTIVE_STUDENT: &str = "Student inactive - Send reminder email";
pub const PERFORMING_WELL: &str = "Student is performing well - Continue monitoring";

const ATTENDANCE_TRIGGER: f64 = 50.0;
const PERFORMANCE_TRIGGER: f64 = 60.0;
const LIBRARY_TRIGGER: f64 = 60.0;
const LAST_LOGIN_TRIGGER: f64 = 50.0;

#[derive(Debug, Clone, Copy, Default)]
pub struct RecommendationGenerator;

impl RecommendationGenerator {
    pub fn new() -> Self {
        RecommendationGenerator
    }

    /// Build the ordered recommendation list. Never empty.
    ///
    /// The chatbot contribution does not drive any rule.
    pub fn recommend(&self, metrics: &NormalizedMetrics, risk_level: RiskLevel) -> Vec<String> {
        let mut recommendations = Vec::new();

        if risk_level == RiskLevel::High {
            recommendations.push(IMMEDIATE_INTERVENTION.to_string());
        }
        if metrics.attendance_metric > ATTENDANCE_TRIGGER {
            recommendations.push(LOW_ATTENDANCE.to_string());
        }
        if metrics.performance_metric > PERFORMANCE_TRIGGER {
            recommendations.push(POOR_PERFORMANCE.to_string());
        }
        if metrics.library_metric > LIBRARY_TRIGGER {
            recommendations.push(LOW_LIBRARY_USAGE.to_string());
        }
        if metrics.last_login_metric > LAST_LOGIN_TRIGGER {
            recommendations.push(INACTIVE_STUDENT.to_string());
        }

        if recommendations.is_empty() {
            recommendations.push(PERFORMING_WELL.to_string());
        }

        recommendations
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn metrics(attendance: f64, performance: f64, library: f64, chatbot: f64, login: f64) -> NormalizedMetrics {
        NormalizedMetrics {
            attendance_metric: attendance,
            performance_metric: performance,
            library_metric: library,
            chatbot_metric: chatbot,
            last_login_metric: login,
        }
    }

    #[test]
    fn quiet_metrics_yield_monitoring_only() {
        let recommendations =
            RecommendationGenerator::new().recommend(&metrics(50.0, 60.0, 60.0, 100.0, 50.0), RiskLevel::Medium);
        assert_eq!(recommendations, vec![PERFORMING_WELL.to_string()]);
    }

    #[test]
    fn high_risk_leads_with_intervention_in_rule_order() {
        let recommendations =
            RecommendationGenerator::new().recommend(&metrics(100.0, 100.0, 100.0, 100.0, 100.0), RiskLevel::High);
        assert_eq!(
            recommendations,
            vec![
                IMMEDIATE_INTERVENTION.to_string(),
                LOW_ATTENDANCE.to_string(),
                POOR_PERFORMANCE.to_string(),
                LOW_LIBRARY_USAGE.to_string(),
                INACTIVE_STUDENT.to_string(),
            ]
        );
    }

    #[test]
    fn rules_fire_independently() {
        let recommendations =
            RecommendationGenerator::new().recommend(&metrics(10.0, 10.0, 84.0, 0.0, 55.0), RiskLevel::Low);
        assert_eq!(
            recommendations,
            vec![LOW_LIBRARY_USAGE.to_string(), INACTIVE_STUDENT.to_string()]
        );
    }

    #[test]
    fn high_risk_alone_is_not_reported_as_performing_well() {
        let recommendations =
            RecommendationGenerator::new().recommend(&metrics(0.0, 0.0, 0.0, 0.0, 0.0), RiskLevel::High);
        assert_eq!(recommendations, vec![IMMEDIATE_INTERVENTION.to_string()]);
    }
}
