use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

use super::returns::KeyMetrics;
use crate::types::{Multiple, Rate};

const PROJECT_IRR_GOOD: Rate = dec!(0.08);
const PROJECT_IRR_MARGINAL: Rate = dec!(0.06);
const EQUITY_IRR_GOOD: Rate = dec!(0.12);
const EQUITY_IRR_MARGINAL: Rate = dec!(0.09);
const DSCR_GOOD: Multiple = dec!(1.30);
const DSCR_MARGINAL: Multiple = dec!(1.20);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Rating {
    Good,
    Marginal,
    Poor,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Recommendation {
    Recommend,
    Review,
    DoNotProceed,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetricAssessment {
    pub rating: Rating,
    pub message: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OverallAssessment {
    pub recommendation: Recommendation,
    pub message: String,
}

/// Go / no-go screen over the headline metrics.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Assessment {
    pub project_irr: MetricAssessment,
    pub equity_irr: MetricAssessment,
    pub dscr: MetricAssessment,
    pub overall: OverallAssessment,
}

fn rate(value: Decimal, good: Decimal, marginal: Decimal) -> Rating {
    if value >= good {
        Rating::Good
    } else if value >= marginal {
        Rating::Marginal
    } else {
        Rating::Poor
    }
}

fn pct(value: Rate) -> String {
    format!("{}%", (value * dec!(100)).normalize())
}

fn irr_assessment(value: Rate, good: Rate, marginal: Rate) -> MetricAssessment {
    let rating = rate(value, good, marginal);
    let message = match rating {
        Rating::Good => format!("GOOD - Exceeds {} threshold", pct(good)),
        Rating::Marginal => format!("MARGINAL - Between {}-{}", pct(marginal), pct(good)),
        Rating::Poor => format!("POOR - Below {}", pct(marginal)),
    };
    MetricAssessment { rating, message }
}

fn dscr_assessment(min_dscr: Option<Multiple>) -> MetricAssessment {
    // No debt service means no coverage to speak of; treated as failing the screen.
    let rating = min_dscr.map_or(Rating::Poor, |d| rate(d, DSCR_GOOD, DSCR_MARGINAL));
    let message = match (rating, min_dscr) {
        (_, None) => "POOR - No debt service to cover".to_string(),
        (Rating::Good, _) => format!("GOOD - Exceeds {DSCR_GOOD}x threshold"),
        (Rating::Marginal, _) => format!("MARGINAL - Between {DSCR_MARGINAL}-{DSCR_GOOD}x"),
        (Rating::Poor, _) => format!("POOR - Below {DSCR_MARGINAL}x"),
    };
    MetricAssessment { rating, message }
}

/// Classify the metrics against fixed lender/investor thresholds.
pub fn assess(metrics: &KeyMetrics) -> Assessment {
    let project_irr = irr_assessment(metrics.project_irr, PROJECT_IRR_GOOD, PROJECT_IRR_MARGINAL);
    let equity_irr = irr_assessment(metrics.equity_irr, EQUITY_IRR_GOOD, EQUITY_IRR_MARGINAL);
    let dscr = dscr_assessment(metrics.min_dscr);

    let ratings = [project_irr.rating, equity_irr.rating, dscr.rating];
    let overall = if ratings.iter().all(|r| *r == Rating::Good) {
        OverallAssessment {
            recommendation: Recommendation::Recommend,
            message: "RECOMMEND - Proceed to detailed financing".into(),
        }
    } else if ratings.iter().all(|r| *r != Rating::Poor) {
        OverallAssessment {
            recommendation: Recommendation::Review,
            message: "REVIEW - May be viable with optimization".into(),
        }
    } else {
        OverallAssessment {
            recommendation: Recommendation::DoNotProceed,
            message: "DO NOT PROCEED - Economics not viable".into(),
        }
    };

    Assessment {
        project_irr,
        equity_irr,
        dscr,
        overall,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn metrics(project_irr: Rate, equity_irr: Rate, min_dscr: Option<Multiple>) -> KeyMetrics {
        KeyMetrics {
            project_irr,
            equity_irr,
            lcoe: dec!(40),
            min_dscr,
            avg_dscr: min_dscr,
            project_npv: Decimal::ZERO,
            ppa_price: dec!(65),
            equity_payback_years: None,
            project_payback_years: None,
        }
    }

    #[test]
    fn test_all_good_recommends() {
        let a = assess(&metrics(dec!(0.09), dec!(0.15), Some(dec!(1.35))));
        assert_eq!(a.overall.recommendation, Recommendation::Recommend);
        assert_eq!(a.project_irr.message, "GOOD - Exceeds 8% threshold");
    }

    #[test]
    fn test_thresholds_are_inclusive() {
        let a = assess(&metrics(dec!(0.08), dec!(0.12), Some(dec!(1.30))));
        assert_eq!(a.project_irr.rating, Rating::Good);
        assert_eq!(a.equity_irr.rating, Rating::Good);
        assert_eq!(a.dscr.rating, Rating::Good);
    }

    #[test]
    fn test_marginal_means_review() {
        let a = assess(&metrics(dec!(0.07), dec!(0.15), Some(dec!(1.25))));
        assert_eq!(a.project_irr.rating, Rating::Marginal);
        assert_eq!(a.project_irr.message, "MARGINAL - Between 6%-8%");
        assert_eq!(a.overall.recommendation, Recommendation::Review);
    }

    #[test]
    fn test_any_poor_blocks() {
        let a = assess(&metrics(dec!(0.09), dec!(0.05), Some(dec!(1.35))));
        assert_eq!(a.equity_irr.rating, Rating::Poor);
        assert_eq!(a.overall.recommendation, Recommendation::DoNotProceed);
    }

    #[test]
    fn test_missing_dscr_is_poor() {
        let a = assess(&metrics(dec!(0.09), dec!(0.15), None));
        assert_eq!(a.dscr.rating, Rating::Poor);
        assert_eq!(a.overall.recommendation, Recommendation::DoNotProceed);
    }
}
