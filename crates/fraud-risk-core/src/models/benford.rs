//! Benford's Law first-digit analysis over a company's reported figures.
//!
//! Leading digits of every non-zero fact value are pooled across all
//! available periods and compared to the expected frequency
//! log10(1 + 1/d). The headline measure is the total absolute deviation in
//! percentage points; a chi-squared statistic is reported alongside it.
//!
//! The law is asymptotic, so small samples yield insufficient data rather
//! than a confident-looking deviation.

use rust_decimal::{Decimal, MathematicalOps};
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::config::BenfordConfig;
use crate::facts::PeriodFacts;
use crate::types::{ModelResult, NativeScore, RiskLevel};

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

/// First significant digit of a value, ignoring sign.
pub fn first_digit(val: Decimal) -> Option<u32> {
    if val.is_zero() {
        return None;
    }
    val.abs()
        .to_string()
        .chars()
        .find(|ch| ch.is_ascii_digit() && *ch != '0')
        .and_then(|ch| ch.to_digit(10))
}

/// Expected first-digit frequency under Benford's Law.
pub fn expected_frequency(d: u32) -> Decimal {
    (Decimal::ONE + Decimal::ONE / Decimal::from(d)).log10()
}

/// Chi-squared critical values for 8 degrees of freedom.
fn chi_squared_critical(alpha: Decimal) -> Decimal {
    if alpha <= dec!(0.01) {
        dec!(20.090)
    } else if alpha <= dec!(0.05) {
        dec!(15.507)
    } else if alpha <= dec!(0.10) {
        dec!(13.362)
    } else {
        dec!(11.030)
    }
}

// ---------------------------------------------------------------------------
// Output
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DigitFrequency {
    pub digit: u32,
    pub observed_count: u32,
    pub observed_pct: Decimal,
    pub expected_pct: Decimal,
    pub deviation: Decimal,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DigitConformity {
    Normal,
    Marginal,
    Anomaly,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BenfordDetail {
    pub digit_frequencies: Vec<DigitFrequency>,
    pub sample_size: usize,
    /// Sum over digits of |observed - expected|, in percentage points.
    pub total_deviation_pct: Decimal,
    pub mean_absolute_deviation: Decimal,
    pub chi_squared: Decimal,
    pub critical_value: Decimal,
    pub conforms: bool,
    pub conformity: DigitConformity,
    pub suspicious: bool,
}

fn classify(deviation: Decimal, config: &BenfordConfig) -> (DigitConformity, RiskLevel) {
    if deviation < config.low_deviation_pct {
        (DigitConformity::Normal, RiskLevel::Low)
    } else if deviation > config.high_deviation_pct {
        (DigitConformity::Anomaly, RiskLevel::High)
    } else {
        (DigitConformity::Marginal, RiskLevel::Moderate)
    }
}

// ---------------------------------------------------------------------------
// Public API
// ---------------------------------------------------------------------------

/// Leading-digit analysis of raw values. Zero values are skipped.
pub fn analyze_values(values: &[Decimal], config: &BenfordConfig) -> ModelResult<BenfordDetail> {
    let digits: Vec<u32> = values.iter().filter_map(|v| first_digit(*v)).collect();
    let sample_size = digits.len();
    if sample_size < config.min_sample {
        return ModelResult::insufficient(
            format!(
                "Only {sample_size} non-zero values; Benford analysis needs at least {}",
                config.min_sample
            ),
            vec![],
        );
    }

    let n = Decimal::from(sample_size as u64);
    let hundred = dec!(100);
    let mut frequencies = Vec::with_capacity(9);
    let (mut chi_sq, mut total_abs_dev) = (Decimal::ZERO, Decimal::ZERO);

    for d in 1u32..=9 {
        let count = digits.iter().filter(|&&x| x == d).count() as u32;
        let p = expected_frequency(d);
        let observed_pct = Decimal::from(count) / n * hundred;
        let expected_pct = p * hundred;
        let deviation = observed_pct - expected_pct;
        let expected_count = p * n;
        let diff = Decimal::from(count) - expected_count;
        chi_sq += diff * diff / expected_count;
        total_abs_dev += deviation.abs();
        frequencies.push(DigitFrequency {
            digit: d,
            observed_count: count,
            observed_pct,
            expected_pct,
            deviation,
        });
    }

    let critical_value = chi_squared_critical(config.significance_level);
    let (conformity, level) = classify(total_abs_dev, config);
    let suspicious = level == RiskLevel::High;

    ModelResult::scored(
        NativeScore::Percentage {
            value: total_abs_dev,
        },
        level,
        BenfordDetail {
            digit_frequencies: frequencies,
            sample_size,
            total_deviation_pct: total_abs_dev,
            mean_absolute_deviation: total_abs_dev / dec!(9) / hundred,
            chi_squared: chi_sq,
            critical_value,
            conforms: chi_sq < critical_value,
            conformity,
            suspicious,
        },
        vec![],
    )
}

/// Pool every reported fact value across the given periods and analyse it.
pub fn calculate_benford(periods: &[PeriodFacts], config: &BenfordConfig) -> ModelResult<BenfordDetail> {
    let values: Vec<Decimal> = periods
        .iter()
        .flat_map(|pf| pf.facts.iter().map(|(_, v)| v))
        .collect();
    let result = analyze_values(&values, config);
    if let Some(s) = result.as_scored() {
        debug!(
            sample = s.detail.sample_size,
            deviation = %s.detail.total_deviation_pct,
            "benford scored"
        );
    }
    result
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::facts::Concept;
    use crate::models::test_support::annual;

    /// Counts proportional to the Benford distribution over 1000 values.
    fn benford_data() -> Vec<Decimal> {
        let counts = [301u32, 176, 125, 97, 79, 67, 58, 51, 46];
        counts
            .iter()
            .enumerate()
            .flat_map(|(i, &c)| {
                let leading = Decimal::from(i as u32 + 1);
                (0..c).map(move |k| leading * dec!(1000) + Decimal::from(k % 900))
            })
            .collect()
    }

    fn uniform_data() -> Vec<Decimal> {
        (1u32..=9)
            .flat_map(|d| std::iter::repeat(Decimal::from(d) * dec!(100)).take(50))
            .collect()
    }

    #[test]
    fn test_first_digit_extraction() {
        assert_eq!(first_digit(dec!(12345)), Some(1));
        assert_eq!(first_digit(dec!(-987)), Some(9));
        assert_eq!(first_digit(dec!(0.00421)), Some(4));
        assert_eq!(first_digit(Decimal::ZERO), None);
    }

    #[test]
    fn test_expected_frequencies_sum_to_one() {
        let total: Decimal = (1..=9).map(expected_frequency).sum();
        assert!((total - Decimal::ONE).abs() < dec!(0.000001), "sum = {total}");
        assert!((expected_frequency(1) - dec!(0.30103)).abs() < dec!(0.00001));
    }

    #[test]
    fn test_benford_data_near_zero_deviation() {
        let r = analyze_values(&benford_data(), &BenfordConfig::default());
        let d = r.detail().unwrap();
        assert_eq!(d.sample_size, 1000);
        assert!(d.total_deviation_pct < dec!(1), "deviation = {}", d.total_deviation_pct);
        assert!(d.conforms);
        assert!(!d.suspicious);
        assert_eq!(r.risk_level(), Some(RiskLevel::Low));
    }

    #[test]
    fn test_uniform_data_materially_worse() {
        let cfg = BenfordConfig::default();
        let benford = analyze_values(&benford_data(), &cfg);
        let uniform = analyze_values(&uniform_data(), &cfg);
        let b = benford.detail().unwrap().total_deviation_pct;
        let u = uniform.detail().unwrap().total_deviation_pct;
        assert!(u > b + dec!(40), "uniform {u} vs benford {b}");
        assert!(uniform.detail().unwrap().suspicious);
        assert!(!uniform.detail().unwrap().conforms);
        assert_eq!(uniform.risk_level(), Some(RiskLevel::High));
    }

    #[test]
    fn test_small_sample_insufficient() {
        let values: Vec<Decimal> = (1..=29).map(Decimal::from).collect();
        let r = analyze_values(&values, &BenfordConfig::default());
        assert!(r.insufficiency().unwrap().reason.contains("29"));
    }

    #[test]
    fn test_zeros_do_not_count_toward_sample() {
        let mut values: Vec<Decimal> = (1..=20).map(Decimal::from).collect();
        values.extend(std::iter::repeat(Decimal::ZERO).take(20));
        assert!(!analyze_values(&values, &BenfordConfig::default()).is_scored());
    }

    #[test]
    fn test_suspicious_derived_from_level() {
        let cfg = BenfordConfig::default();
        assert_eq!(classify(dec!(10), &cfg).1, RiskLevel::Low);
        assert_eq!(classify(dec!(25), &cfg).1, RiskLevel::Moderate);
        assert_eq!(classify(dec!(45), &cfg).1, RiskLevel::Moderate);
        assert_eq!(classify(dec!(45.01), &cfg).1, RiskLevel::High);
    }

    #[test]
    fn test_pools_across_periods() {
        let values: Vec<(Concept, Decimal)> = Concept::ALL
            .iter()
            .take(16)
            .enumerate()
            .map(|(i, c)| (*c, Decimal::from(i as u32 + 1) * dec!(137)))
            .collect();
        let periods = vec![annual(2019, &values), annual(2020, &values)];
        let r = calculate_benford(&periods, &BenfordConfig::default());
        assert_eq!(r.detail().unwrap().sample_size, 32);
    }
}
