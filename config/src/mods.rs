use serde::{Deserialize, Serialize};

use std::fmt;
use std::str::FromStr;

use crate::CliError;

/// Enhancer type of the input signal; selects the signal scaling
/// and the built-in binding model.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Etype {
    #[default]
    Hg38H3K27ac,
    Atac,
    P300,
}

impl Etype {
    pub const VALUES: [&'static str; 3] = ["hg38H3K27ac", "ATAC", "p300"];

    pub fn as_str(&self) -> &'static str {
        match self {
            Etype::Hg38H3K27ac => "hg38H3K27ac",
            Etype::Atac => "ATAC",
            Etype::P300 => "p300",
        }
    }

    /// built-in logistic model for this enhancer type
    pub fn coefficients(&self) -> ModelCoefficients {
        match self {
            Etype::Hg38H3K27ac => ModelCoefficients {
                intercept: -5.0,
                signal: 3.0,
                motif: 4.0,
                interaction: 2.0,
            },
            Etype::Atac => ModelCoefficients {
                intercept: -5.5,
                signal: 3.5,
                motif: 4.0,
                interaction: 2.0,
            },
            Etype::P300 => ModelCoefficients {
                intercept: -5.2,
                signal: 3.2,
                motif: 4.2,
                interaction: 1.8,
            },
        }
    }
}

impl FromStr for Etype {
    type Err = CliError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "hg38h3k27ac" | "h3k27ac" => Ok(Etype::Hg38H3K27ac),
            "atac" => Ok(Etype::Atac),
            "p300" => Ok(Etype::P300),
            _ => Err(CliError::InvalidInput(format!(
                "unknown enhancer type '{}', expected one of: {}",
                s,
                Etype::VALUES.join(", ")
            ))),
        }
    }
}

impl fmt::Display for Etype {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Coefficients of the logistic binding model:
/// `intercept + signal*s + motif*m + interaction*s*m`
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ModelCoefficients {
    pub intercept: f64,
    pub signal: f64,
    pub motif: f64,
    pub interaction: f64,
}

impl ModelCoefficients {
    #[inline(always)]
    pub fn logit(&self, signal: f64, motif: f64) -> f64 {
        self.intercept + self.signal * signal + self.motif * motif + self.interaction * signal * motif
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_etype_parse_aliases() {
        assert_eq!("hg38H3K27ac".parse::<Etype>().unwrap(), Etype::Hg38H3K27ac);
        assert_eq!("H3K27ac".parse::<Etype>().unwrap(), Etype::Hg38H3K27ac);
        assert_eq!("atac".parse::<Etype>().unwrap(), Etype::Atac);
        assert_eq!("P300".parse::<Etype>().unwrap(), Etype::P300);
    }

    #[test]
    fn test_etype_parse_unknown() {
        let err = "dnase".parse::<Etype>().unwrap_err();
        assert!(err.to_string().contains("hg38H3K27ac, ATAC, p300"));
    }

    #[test]
    fn test_etype_display_roundtrip() {
        for etype in [Etype::Hg38H3K27ac, Etype::Atac, Etype::P300] {
            assert_eq!(etype.to_string().parse::<Etype>().unwrap(), etype);
        }
    }

    #[test]
    fn test_coefficients_increase_with_evidence() {
        let model = Etype::default().coefficients();
        assert!(model.logit(1.0, 1.0) > model.logit(0.5, 0.5));
        assert!(model.logit(0.5, 0.5) > model.logit(0.0, 0.0));
        assert_eq!(model.logit(0.0, 0.0), model.intercept);
    }
}
