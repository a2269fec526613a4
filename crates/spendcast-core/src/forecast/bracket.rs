//! Income brackets used to bucket category insights

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// One of five fixed, half-open income ranges
///
/// A value on a boundary belongs to the higher bracket. The persisted form is
/// the `"<low>-<high>"` label, e.g. `"1000000-2000000"` or `"10000000-inf"`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(into = "String", try_from = "String")]
pub enum IncomeBracket {
    /// [0, 1,000,000)
    UnderOneMillion,
    /// [1,000,000, 2,000,000)
    OneToTwoMillion,
    /// [2,000,000, 5,000,000)
    TwoToFiveMillion,
    /// [5,000,000, 10,000,000)
    FiveToTenMillion,
    /// [10,000,000, inf)
    TenMillionPlus,
}

impl IncomeBracket {
    pub const ALL: [IncomeBracket; 5] = [
        Self::UnderOneMillion,
        Self::OneToTwoMillion,
        Self::TwoToFiveMillion,
        Self::FiveToTenMillion,
        Self::TenMillionPlus,
    ];

    /// Find the bracket containing `value`
    ///
    /// Returns `None` for negative or NaN values.
    pub fn classify(value: f64) -> Option<Self> {
        Self::ALL.into_iter().find(|bracket| bracket.contains(value))
    }

    /// Inclusive lower bound and exclusive upper bound (`None` = unbounded)
    pub fn bounds(&self) -> (f64, Option<f64>) {
        match self {
            Self::UnderOneMillion => (0.0, Some(1_000_000.0)),
            Self::OneToTwoMillion => (1_000_000.0, Some(2_000_000.0)),
            Self::TwoToFiveMillion => (2_000_000.0, Some(5_000_000.0)),
            Self::FiveToTenMillion => (5_000_000.0, Some(10_000_000.0)),
            Self::TenMillionPlus => (10_000_000.0, None),
        }
    }

    pub fn contains(&self, value: f64) -> bool {
        let (low, high) = self.bounds();
        value >= low && high.map_or(true, |high| value < high)
    }

    pub fn label(&self) -> &'static str {
        match self {
            Self::UnderOneMillion => "0-1000000",
            Self::OneToTwoMillion => "1000000-2000000",
            Self::TwoToFiveMillion => "2000000-5000000",
            Self::FiveToTenMillion => "5000000-10000000",
            Self::TenMillionPlus => "10000000-inf",
        }
    }
}

impl fmt::Display for IncomeBracket {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.label())
    }
}

impl FromStr for IncomeBracket {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|bracket| bracket.label() == s)
            .ok_or_else(|| format!("Unknown income bracket: {}", s))
    }
}

impl From<IncomeBracket> for String {
    fn from(bracket: IncomeBracket) -> Self {
        bracket.label().to_string()
    }
}

impl TryFrom<String> for IncomeBracket {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}
