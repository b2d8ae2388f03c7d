//! spec — immutable model descriptors.
//!
//! A [`ModelSpec`] names everything needed to fit a model: which variance
//! recursion ([`GarchVariant`]), its order ([`ModelOrder`]), the innovation
//! law ([`DistributionKind`]), and whether a constant mean is estimated
//! ([`MeanSpec`]). Variants form a closed enum; every behavior that differs
//! per variant is selected by exhaustive matching.
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::volatility::errors::{VolError, VolResult};

/// Conditional-variance recursion family.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum GarchVariant {
    /// σ²_t = ω + Σ α_i ε²_{t−i} + Σ β_j σ²_{t−j}
    SGarch,
    /// σ²_t = ω + Σ (α_i + γ_i 𝟙[ε_{t−i} < 0]) ε²_{t−i} + Σ β_j σ²_{t−j}
    GjrGarch,
    /// ln σ²_t = ω + Σ [α_i (|z_{t−i}| − E|z|) + γ_i z_{t−i}] + Σ β_j ln σ²_{t−j}
    EGarch,
    /// σ_t = ω + Σ (α⁺_i ε⁺_{t−i} + α⁻_i ε⁻_{t−i}) + Σ β_j σ_{t−j}
    TGarch,
}

impl GarchVariant {
    pub const ALL: [GarchVariant; 4] =
        [GarchVariant::SGarch, GarchVariant::GjrGarch, GarchVariant::EGarch, GarchVariant::TGarch];

    /// Model family name as it appears in result tables.
    pub fn model_name(self) -> &'static str {
        match self {
            GarchVariant::SGarch => "sGARCH",
            GarchVariant::GjrGarch => "gjrGARCH",
            GarchVariant::EGarch => "eGARCH",
            GarchVariant::TGarch => "fGARCH",
        }
    }

    /// Submodel label for variants expressed inside a wider family.
    pub fn submodel(self) -> Option<&'static str> {
        match self {
            GarchVariant::TGarch => Some("TGARCH"),
            _ => None,
        }
    }

    /// Whether the variant carries a `gamma` block.
    pub fn has_asymmetry(self) -> bool {
        !matches!(self, GarchVariant::SGarch)
    }
}

impl fmt::Display for GarchVariant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.submodel() {
            Some(sub) => write!(f, "{}({})", self.model_name(), sub),
            None => f.write_str(self.model_name()),
        }
    }
}

impl FromStr for GarchVariant {
    type Err = VolError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "sgarch" | "garch" => Ok(GarchVariant::SGarch),
            "gjrgarch" | "gjr-garch" | "gjr" => Ok(GarchVariant::GjrGarch),
            "egarch" => Ok(GarchVariant::EGarch),
            "tgarch" | "fgarch(tgarch)" => Ok(GarchVariant::TGarch),
            _ => Err(VolError::InvalidParameters { reason: format!("unknown variant '{s}'") }),
        }
    }
}

/// Lag orders: `p` variance lags (β), `q` shock lags (α, γ).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ModelOrder {
    pub p: usize,
    pub q: usize,
}

impl ModelOrder {
    /// Largest order accepted per lag block.
    pub const MAX_LAG: usize = 10;

    /// Errors
    /// ------
    /// - `VolError::InvalidOrder` when `q == 0` or either order exceeds
    ///   [`ModelOrder::MAX_LAG`].
    pub fn new(p: usize, q: usize) -> VolResult<Self> {
        if q == 0 {
            return Err(VolError::InvalidOrder { p, q, reason: "q must be at least 1" });
        }
        if p > Self::MAX_LAG || q > Self::MAX_LAG {
            return Err(VolError::InvalidOrder { p, q, reason: "orders above 10 are not supported" });
        }
        Ok(ModelOrder { p, q })
    }

    /// Number of lagged entries the recursion reads.
    pub fn max_lag(&self) -> usize {
        self.p.max(self.q)
    }
}

impl Default for ModelOrder {
    fn default() -> Self {
        ModelOrder { p: 1, q: 1 }
    }
}

/// Standardized innovation law.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DistributionKind {
    Normal,
    StudentT,
    SkewStudentT,
}

impl DistributionKind {
    /// Short code used in result tables.
    pub fn code(self) -> &'static str {
        match self {
            DistributionKind::Normal => "norm",
            DistributionKind::StudentT => "std",
            DistributionKind::SkewStudentT => "sstd",
        }
    }

    /// Number of estimated shape parameters.
    pub fn n_shape(self) -> usize {
        match self {
            DistributionKind::Normal => 0,
            DistributionKind::StudentT => 1,
            DistributionKind::SkewStudentT => 2,
        }
    }
}

impl FromStr for DistributionKind {
    type Err = VolError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "norm" | "normal" => Ok(DistributionKind::Normal),
            "std" | "student-t" | "t" => Ok(DistributionKind::StudentT),
            "sstd" | "skew-t" | "skewed-t" => Ok(DistributionKind::SkewStudentT),
            _ => Err(VolError::InvalidParameters { reason: format!("unknown distribution '{s}'") }),
        }
    }
}

/// Conditional mean specification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum MeanSpec {
    /// ε_t = r_t.
    Zero,
    /// ε_t = r_t − μ with μ estimated.
    #[default]
    Constant,
}

/// Immutable model descriptor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ModelSpec {
    pub variant: GarchVariant,
    pub order: ModelOrder,
    pub distribution: DistributionKind,
    pub mean: MeanSpec,
}

impl ModelSpec {
    pub fn new(
        variant: GarchVariant, order: ModelOrder, distribution: DistributionKind, mean: MeanSpec,
    ) -> Self {
        ModelSpec { variant, order, distribution, mean }
    }

    /// Order (1, 1) with a constant mean.
    pub fn garch11(variant: GarchVariant, distribution: DistributionKind) -> Self {
        ModelSpec::new(variant, ModelOrder::default(), distribution, MeanSpec::Constant)
    }

    pub fn submodel(&self) -> Option<&'static str> {
        self.variant.submodel()
    }

    /// Length of the `gamma` block.
    pub fn n_gamma(&self) -> usize {
        if self.variant.has_asymmetry() {
            self.order.q
        } else {
            0
        }
    }

    /// Total number of estimated parameters `k`.
    pub fn n_params(&self) -> usize {
        let mean = usize::from(self.mean == MeanSpec::Constant);
        mean + 1 + self.order.q + self.n_gamma() + self.order.p + self.distribution.n_shape()
    }

    /// Parameter names in canonical order.
    pub fn param_names(&self) -> Vec<String> {
        let mut names = Vec::with_capacity(self.n_params());
        if self.mean == MeanSpec::Constant {
            names.push("mu".to_string());
        }
        names.push("omega".to_string());
        names.extend((1..=self.order.q).map(|i| format!("alpha{i}")));
        names.extend((1..=self.n_gamma()).map(|i| format!("gamma{i}")));
        names.extend((1..=self.order.p).map(|j| format!("beta{j}")));
        match self.distribution {
            DistributionKind::Normal => {}
            DistributionKind::StudentT => names.push("shape".to_string()),
            DistributionKind::SkewStudentT => {
                names.push("shape".to_string());
                names.push("skew".to_string());
            }
        }
        names
    }
}

impl fmt::Display for ModelSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}({},{})-{}",
            self.variant,
            self.order.p,
            self.order.q,
            self.distribution.code()
        )
    }
}
