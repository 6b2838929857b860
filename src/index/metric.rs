// file: src/index/metric.rs
// description: similarity metrics, all oriented so that higher is better

use crate::error::{Result, SearchError};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Metric {
    #[default]
    Cosine,
    Dot,
    /// Reported as negative Euclidean distance.
    L2,
}

impl Metric {
    /// Scores `a` against `b`. `norm_b` is the precomputed L2 norm of `b`
    /// and is only consulted for cosine.
    pub fn score(self, a: &[f32], norm_a: f32, b: &[f32], norm_b: f32) -> f32 {
        match self {
            Metric::Cosine => {
                if norm_a == 0.0 || norm_b == 0.0 {
                    return 0.0;
                }
                (dot(a, b) / (norm_a * norm_b)).clamp(-1.0, 1.0)
            }
            Metric::Dot => dot(a, b),
            Metric::L2 => -a
                .iter()
                .zip(b)
                .map(|(x, y)| (x - y) * (x - y))
                .sum::<f32>()
                .sqrt(),
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Metric::Cosine => "cosine",
            Metric::Dot => "dot",
            Metric::L2 => "l2",
        }
    }
}

impl fmt::Display for Metric {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Metric {
    type Err = SearchError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "cosine" => Ok(Metric::Cosine),
            "dot" | "dot_product" => Ok(Metric::Dot),
            "l2" | "euclidean" => Ok(Metric::L2),
            other => Err(SearchError::Config(format!("Unknown metric: {}", other))),
        }
    }
}

pub fn dot(a: &[f32], b: &[f32]) -> f32 {
    a.iter().zip(b).map(|(x, y)| x * y).sum()
}

pub fn l2_norm(v: &[f32]) -> f32 {
    dot(v, v).sqrt()
}

/// Scales `v` to unit length in place; zero vectors are left untouched.
pub fn normalize(v: &mut [f32]) {
    let norm = l2_norm(v);
    if norm > 0.0 {
        v.iter_mut().for_each(|x| *x /= norm);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn score(metric: Metric, a: &[f32], b: &[f32]) -> f32 {
        metric.score(a, l2_norm(a), b, l2_norm(b))
    }

    #[test]
    fn test_cosine_range() {
        assert!((score(Metric::Cosine, &[1.0, 0.0], &[2.0, 0.0]) - 1.0).abs() < 1e-6);
        assert!((score(Metric::Cosine, &[1.0, 0.0], &[-3.0, 0.0]) + 1.0).abs() < 1e-6);
        assert!(score(Metric::Cosine, &[1.0, 0.0], &[0.0, 5.0]).abs() < 1e-6);
        assert_eq!(score(Metric::Cosine, &[0.0, 0.0], &[1.0, 0.0]), 0.0);
    }

    #[test]
    fn test_dot_and_l2() {
        assert_eq!(score(Metric::Dot, &[1.0, 2.0], &[3.0, 4.0]), 11.0);
        assert_eq!(score(Metric::L2, &[0.0, 0.0], &[3.0, 4.0]), -5.0);
        assert!(score(Metric::L2, &[1.0, 1.0], &[1.0, 1.0]).abs() < 1e-6);
    }

    #[test]
    fn test_normalize() {
        let mut v = vec![3.0, 4.0];
        normalize(&mut v);
        assert!((l2_norm(&v) - 1.0).abs() < 1e-6);

        let mut zero = vec![0.0, 0.0];
        normalize(&mut zero);
        assert_eq!(zero, vec![0.0, 0.0]);
    }

    #[test]
    fn test_parse_metric() {
        assert_eq!("Cosine".parse::<Metric>().unwrap(), Metric::Cosine);
        assert_eq!("euclidean".parse::<Metric>().unwrap(), Metric::L2);
        assert!("hamming".parse::<Metric>().is_err());
        assert_eq!(Metric::Dot.to_string(), "dot");
    }
}
