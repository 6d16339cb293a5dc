//! Density-estimation kernels.

use serde::{Deserialize, Serialize};

/// Weighting of photons inside the gather radius.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum Filter {
    /// Every photon counts fully.
    Uniform,
    /// Weight falls off linearly with distance, reaching zero at `k * r`.
    Cone { k: f32 },
}

impl Default for Filter {
    fn default() -> Self {
        Filter::Uniform
    }
}

impl Filter {
    /// Weight of a photon at `distance` from the query point for gather
    /// radius `radius`.
    pub fn weight(&self, distance: f32, radius: f32) -> f32 {
        match *self {
            Filter::Uniform => 1.0,
            Filter::Cone { k } => {
                if radius <= 0.0 {
                    1.0
                } else {
                    (1.0 - distance / (k * radius)).max(0.0)
                }
            }
        }
    }

    /// Normalization of the kernel over the gather disc.
    pub fn k_term(&self) -> f32 {
        match *self {
            Filter::Uniform => 1.0,
            Filter::Cone { k } => 1.0 - 2.0 / (3.0 * k),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_uniform_filter() {
        let f = Filter::Uniform;
        assert_eq!(f.weight(0.3, 1.0), 1.0);
        assert_eq!(f.k_term(), 1.0);
    }

    #[test]
    fn test_cone_filter() {
        let f = Filter::Cone { k: 1.0 };
        assert_eq!(f.weight(0.0, 2.0), 1.0);
        assert!((f.weight(1.0, 2.0) - 0.5).abs() < 1e-6);
        assert_eq!(f.weight(2.0, 2.0), 0.0);
        assert!((f.k_term() - 1.0 / 3.0).abs() < 1e-6);
    }

    #[test]
    fn test_cone_filter_integrates_to_one() {
        // integral of the weight over the disc divided by k_term * pi * r^2
        let f = Filter::Cone { k: 1.5 };
        let r = 1.0;
        let steps = 20_000;
        let dr = r / steps as f32;
        let integral: f32 = (0..steps)
            .map(|i| {
                let d = (i as f32 + 0.5) * dr;
                f.weight(d, r) * 2.0 * std::f32::consts::PI * d * dr
            })
            .sum();
        let norm = f.k_term() * std::f32::consts::PI * r * r;
        assert!((integral / norm - 1.0).abs() < 1e-3);
    }

    #[test]
    fn test_filter_serde_tag() {
        let json = serde_json::to_string(&Filter::Cone { k: 2.0 }).unwrap();
        assert_eq!(json, r#"{"kind":"cone","k":2.0}"#);
        let back: Filter = serde_json::from_str(r#"{"kind":"uniform"}"#).unwrap();
        assert_eq!(back, Filter::Uniform);
    }
}
