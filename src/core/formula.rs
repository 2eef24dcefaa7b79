//! Catalog of per-minute pricing curves.

use crate::core::error::{EstimatorError, EstimatorResult};
use serde::{Deserialize, Serialize};
use std::fmt::Display;
use std::str::FromStr;

/// Lowest per-minute rate the logarithmic curve may quote.
pub const MIN_LOG_RATE: f64 = 0.005;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FormulaId {
    Hyperbolic,
    Power,
    Logarithmic,
}

impl FormulaId {
    pub const ALL: [FormulaId; 3] = [
        FormulaId::Hyperbolic,
        FormulaId::Power,
        FormulaId::Logarithmic,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            FormulaId::Hyperbolic => "hyperbolic",
            FormulaId::Power => "power",
            FormulaId::Logarithmic => "logarithmic",
        }
    }

    /// Registry entry for this curve.
    pub fn spec(&self) -> &'static FormulaSpec {
        match self {
            FormulaId::Hyperbolic => &FORMULAS[0],
            FormulaId::Power => &FORMULAS[1],
            FormulaId::Logarithmic => &FORMULAS[2],
        }
    }
}

impl Display for FormulaId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for FormulaId {
    type Err = EstimatorError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "hyperbolic" => Ok(FormulaId::Hyperbolic),
            "power" => Ok(FormulaId::Power),
            "logarithmic" => Ok(FormulaId::Logarithmic),
            _ => Err(EstimatorError::UnknownFormula(s.to_string())),
        }
    }
}

/// Which of the two shape coefficients a value applies to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Param {
    A,
    B,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ParamBounds {
    pub min: f64,
    pub max: f64,
    pub default: f64,
    pub step: f64,
}

impl ParamBounds {
    pub fn contains(&self, value: f64) -> bool {
        value >= self.min && value <= self.max
    }

    pub fn clamp(&self, value: f64) -> f64 {
        value.clamp(self.min, self.max)
    }
}

pub type RateFn = fn(f64, f64, f64) -> f64;

/// A named closed-form curve mapping duration in minutes to a per-minute rate.
#[derive(Debug)]
pub struct FormulaSpec {
    pub id: FormulaId,
    pub name: &'static str,
    pub equation: &'static str,
    pub rate: RateFn,
    pub a: ParamBounds,
    pub b: ParamBounds,
}

impl FormulaSpec {
    pub fn bounds(&self, param: Param) -> &ParamBounds {
        match param {
            Param::A => &self.a,
            Param::B => &self.b,
        }
    }

    pub fn rate(&self, minutes: f64, a: f64, b: f64) -> f64 {
        (self.rate)(minutes, a, b)
    }
}

fn hyperbolic_rate(x: f64, a: f64, b: f64) -> f64 {
    a / (1.0 + b * x)
}

fn power_rate(x: f64, a: f64, b: f64) -> f64 {
    if x == 0.0 {
        return a;
    }
    a * x.powf(-b)
}

fn logarithmic_rate(x: f64, a: f64, b: f64) -> f64 {
    if x == 0.0 {
        return a;
    }
    (a - b * x.ln()).max(MIN_LOG_RATE)
}

static FORMULAS: [FormulaSpec; 3] = [
    FormulaSpec {
        id: FormulaId::Hyperbolic,
        name: "Hyperbolic",
        equation: "A / (1 + B·x)",
        rate: hyperbolic_rate,
        a: ParamBounds {
            min: 0.01,
            max: 1.0,
            default: 0.10,
            step: 0.005,
        },
        b: ParamBounds {
            min: 0.0001,
            max: 0.01,
            default: 0.001,
            step: 0.0001,
        },
    },
    FormulaSpec {
        id: FormulaId::Power,
        name: "Power law",
        equation: "A · x^(-B)",
        rate: power_rate,
        a: ParamBounds {
            min: 0.01,
            max: 1.0,
            default: 0.25,
            step: 0.005,
        },
        b: ParamBounds {
            min: 0.0,
            max: 0.9,
            default: 0.3,
            step: 0.01,
        },
    },
    FormulaSpec {
        id: FormulaId::Logarithmic,
        name: "Logarithmic",
        equation: "max(A - B·ln(x), 0.005)",
        rate: logarithmic_rate,
        a: ParamBounds {
            min: 0.01,
            max: 1.0,
            default: 0.20,
            step: 0.005,
        },
        b: ParamBounds {
            min: 0.0,
            max: 0.1,
            default: 0.02,
            step: 0.001,
        },
    },
];

/// Resolves a formula identifier such as `"power"`.
pub fn lookup(id: &str) -> EstimatorResult<&'static FormulaSpec> {
    id.parse::<FormulaId>().map(|id| id.spec())
}

/// Every registered formula in display order.
pub fn all() -> &'static [FormulaSpec] {
    &FORMULAS
}
