use serde::Serialize;
use std::{fmt, str::FromStr};

/// Implements `as_str`, `FromStr` and `Display` over the table spelling of
/// each variant.
macro_rules! impl_table_enum {
    ($type:ident, $what:expr, { $($variant:ident => $name:literal),+ $(,)? }) => {
        impl $type {
            pub const ALL: &'static [$type] = &[$($type::$variant),+];

            pub fn as_str(&self) -> &'static str {
                match self {
                    $($type::$variant => $name),+
                }
            }
        }

        impl FromStr for $type {
            type Err = String;
            fn from_str(s: &str) -> Result<Self, Self::Err> {
                match s.trim().to_ascii_lowercase().as_str() {
                    $($name => Ok($type::$variant),)+
                    other => Err(format!("Unknown {}: '{}'", $what, other)),
                }
            }
        }

        impl fmt::Display for $type {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.as_str())
            }
        }
    };
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Phenotype {
    UltrarapidMetabolizer,
    RapidMetabolizer,
    NormalMetabolizer,
    IntermediateMetabolizer,
    PoorMetabolizer,
    IncreasedFunction,
    NormalFunction,
    DecreasedFunction,
    PoorFunction,
    Indeterminate,
}

impl_table_enum!(Phenotype, "phenotype", {
    UltrarapidMetabolizer => "ultrarapid_metabolizer",
    RapidMetabolizer => "rapid_metabolizer",
    NormalMetabolizer => "normal_metabolizer",
    IntermediateMetabolizer => "intermediate_metabolizer",
    PoorMetabolizer => "poor_metabolizer",
    IncreasedFunction => "increased_function",
    NormalFunction => "normal_function",
    DecreasedFunction => "decreased_function",
    PoorFunction => "poor_function",
    Indeterminate => "indeterminate",
});

impl Phenotype {
    pub fn label(&self) -> &'static str {
        match self {
            Self::UltrarapidMetabolizer => "Ultrarapid Metabolizer",
            Self::RapidMetabolizer => "Rapid Metabolizer",
            Self::NormalMetabolizer => "Normal Metabolizer",
            Self::IntermediateMetabolizer => "Intermediate Metabolizer",
            Self::PoorMetabolizer => "Poor Metabolizer",
            Self::IncreasedFunction => "Increased Function",
            Self::NormalFunction => "Normal Function",
            Self::DecreasedFunction => "Decreased Function",
            Self::PoorFunction => "Poor Function",
            Self::Indeterminate => "Indeterminate",
        }
    }

    /// Lowest-activity classes, for which dose reductions are most severe.
    pub fn is_poor(&self) -> bool {
        matches!(self, Self::PoorMetabolizer | Self::PoorFunction)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum AlleleFunction {
    IncreasedFunction,
    NormalFunction,
    DecreasedFunction,
    NoFunction,
    UncertainFunction,
}

impl_table_enum!(AlleleFunction, "allele function", {
    IncreasedFunction => "increased_function",
    NormalFunction => "normal_function",
    DecreasedFunction => "decreased_function",
    NoFunction => "no_function",
    UncertainFunction => "uncertain_function",
});

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Action {
    StandardDose,
    ReduceDose,
    Avoid,
    AvoidOrSevereReduction,
    ConsiderAlternative,
}

impl_table_enum!(Action, "dosing action", {
    StandardDose => "standard_dose",
    ReduceDose => "reduce_dose",
    Avoid => "avoid",
    AvoidOrSevereReduction => "avoid_or_severe_reduction",
    ConsiderAlternative => "consider_alternative",
});

/// Why a rule departs from standard dosing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Mechanism {
    Toxicity,
    Efficacy,
    None,
}

impl_table_enum!(Mechanism, "mechanism", {
    Toxicity => "toxicity",
    Efficacy => "efficacy",
    None => "none",
});
