//! Multi-probe reward aggregation policy.

use std::fmt;
use std::str::FromStr;

/// How per-probe scores of one instance collapse into a single reward.
///
/// - [`MinMax`](RewardType::MinMax): the worst-served probe decides the
///   reward. A placement only scores well if it helps every probe.
/// - [`MeanSum`](RewardType::MeanSum): the mean over probes. Softer, and
///   always at least the `MinMax` value for the same scores.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum RewardType {
    /// Minimum over probes.
    #[default]
    MinMax,
    /// Mean over probes.
    MeanSum,
}

impl RewardType {
    /// Configuration name (`"minmax"` or `"meansum"`).
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::MinMax => "minmax",
            Self::MeanSum => "meansum",
        }
    }

    /// Collapse per-probe scores. Returns `None` for an empty slice.
    ///
    /// Both policies are independent of the order of `scores`.
    pub fn aggregate(&self, scores: &[f64]) -> Option<f64> {
        if scores.is_empty() {
            return None;
        }
        let value = match self {
            Self::MinMax => scores.iter().copied().fold(f64::INFINITY, f64::min),
            Self::MeanSum => scores.iter().sum::<f64>() / scores.len() as f64,
        };
        Some(value)
    }
}

impl fmt::Display for RewardType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A reward type name that is neither `"minmax"` nor `"meansum"`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ParseRewardTypeError {
    /// The rejected input.
    pub value: String,
}

impl fmt::Display for ParseRewardTypeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "unknown reward type '{}': expected 'minmax' or 'meansum'",
            self.value
        )
    }
}

impl std::error::Error for ParseRewardTypeError {}

impl FromStr for RewardType {
    type Err = ParseRewardTypeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "minmax" => Ok(Self::MinMax),
            "meansum" => Ok(Self::MeanSum),
            _ => Err(ParseRewardTypeError {
                value: s.to_string(),
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn two_probe_example() {
        let scores = [0.4, 0.9];
        assert_eq!(RewardType::MinMax.aggregate(&scores), Some(0.4));
        let mean = RewardType::MeanSum.aggregate(&scores).unwrap();
        assert!((mean - 0.65).abs() < 1e-12, "mean = {mean}");
    }

    #[test]
    fn empty_scores_have_no_aggregate() {
        assert_eq!(RewardType::MinMax.aggregate(&[]), None);
        assert_eq!(RewardType::MeanSum.aggregate(&[]), None);
    }

    #[test]
    fn parses_known_names_only() {
        assert_eq!("minmax".parse::<RewardType>(), Ok(RewardType::MinMax));
        assert_eq!("MeanSum".parse::<RewardType>(), Ok(RewardType::MeanSum));
        let err = "maxmin".parse::<RewardType>().unwrap_err();
        assert_eq!(err.value, "maxmin");
        assert!(err.to_string().contains("maxmin"));
    }

    #[test]
    fn display_matches_config_name() {
        for rt in [RewardType::MinMax, RewardType::MeanSum] {
            assert_eq!(rt.to_string().parse::<RewardType>(), Ok(rt));
        }
    }

    proptest! {
        #[test]
        fn minmax_never_exceeds_meansum(scores in prop::collection::vec(-1e3f64..1e3, 1..12)) {
            let min = RewardType::MinMax.aggregate(&scores).unwrap();
            let mean = RewardType::MeanSum.aggregate(&scores).unwrap();
            prop_assert!(min <= mean + 1e-9, "min {} > mean {}", min, mean);
        }

        #[test]
        fn aggregation_ignores_probe_order(
            scores in prop::collection::vec(-1e3f64..1e3, 1..12),
            seed in any::<u64>(),
        ) {
            let mut shuffled = scores.clone();
            // Deterministic rotation + reversal keyed on the seed.
            let k = (seed as usize) % shuffled.len();
            shuffled.rotate_left(k);
            if seed % 2 == 0 {
                shuffled.reverse();
            }
            for rt in [RewardType::MinMax, RewardType::MeanSum] {
                let a = rt.aggregate(&scores).unwrap();
                let b = rt.aggregate(&shuffled).unwrap();
                prop_assert!((a - b).abs() < 1e-9, "{}: {} vs {}", rt, a, b);
            }
        }
    }
}
