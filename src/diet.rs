//! Diet and energy recommendation.
//!
//! Pure arithmetic over body metrics — independent of the extraction and
//! classification pipeline. Activity, goal, and sex are closed enums with
//! exhaustive matching; unrecognized input fails at parse time instead of
//! silently falling into a default branch.

use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DietError {
    #[error("Invalid {parameter}: {value:?}")]
    InvalidParameter { parameter: String, value: String },
}

/// Macro to generate enum with as_str + std::str::FromStr pattern
macro_rules! str_enum {
    ($name:ident { $($variant:ident => $s:literal),+ $(,)? }) => {
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
        #[serde(rename_all = "snake_case")]
        pub enum $name {
            $($variant),+
        }

        impl $name {
            pub fn as_str(&self) -> &'static str {
                match self {
                    $(Self::$variant => $s),+
                }
            }
        }

        impl std::str::FromStr for $name {
            type Err = DietError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                match s {
                    $($s => Ok(Self::$variant)),+,
                    _ => Err(DietError::InvalidParameter {
                        parameter: stringify!($name).into(),
                        value: s.into(),
                    }),
                }
            }
        }
    };
}

str_enum!(Sex {
    Male => "male",
    Female => "female",
});

str_enum!(ActivityLevel {
    Low => "low",
    Medium => "medium",
    High => "high",
});

str_enum!(Goal {
    Cutting => "cutting",
    Bulking => "bulking",
    Maintaining => "maintaining",
});

impl ActivityLevel {
    /// Activity factor: 1.2 sedentary, 1.55 moderately active, 1.9 very active.
    pub fn multiplier(&self) -> f64 {
        match self {
            ActivityLevel::Low => 1.2,
            ActivityLevel::Medium => 1.55,
            ActivityLevel::High => 1.9,
        }
    }
}

/// Basal metabolic rate (Harris-Benedict), kcal/day.
pub fn basal_metabolic_rate(sex: Sex, weight_kg: f64, height_cm: f64, age_years: f64) -> f64 {
    match sex {
        Sex::Male => 66.0 + 13.7 * weight_kg + 5.0 * height_cm - 6.8 * age_years,
        Sex::Female => 655.0 + 9.6 * weight_kg + 1.8 * height_cm - 4.7 * age_years,
    }
}

/// Total daily energy expenditure: BMR scaled by the activity factor.
pub fn total_daily_energy_expenditure(
    sex: Sex,
    activity: ActivityLevel,
    weight_kg: f64,
    height_cm: f64,
    age_years: f64,
) -> f64 {
    basal_metabolic_rate(sex, weight_kg, height_cm, age_years) * activity.multiplier()
}

/// Daily energy target and macronutrient split.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DietPlan {
    pub energy_kcal: f64,
    pub carbs_g: f64,
    pub protein_g: f64,
    pub fats_g: f64,
}

impl DietPlan {
    /// Round every component to two decimals for display.
    pub fn rounded(&self) -> DietPlan {
        fn r2(v: f64) -> f64 {
            (v * 100.0).round() / 100.0
        }
        DietPlan {
            energy_kcal: r2(self.energy_kcal),
            carbs_g: r2(self.carbs_g),
            protein_g: r2(self.protein_g),
            fats_g: r2(self.fats_g),
        }
    }
}

/// Daily nutrition targets for a goal.
///
/// Energy: cutting −300 kcal, bulking +400 kcal, maintaining unchanged.
/// Split: 50% carbs / 25% protein / 25% fat at 4, 4, and 9 kcal per gram.
pub fn recommend(tdee: f64, goal: Goal) -> DietPlan {
    let energy = match goal {
        Goal::Cutting => tdee - 300.0,
        Goal::Bulking => tdee + 400.0,
        Goal::Maintaining => tdee,
    };

    DietPlan {
        energy_kcal: energy,
        carbs_g: (energy * 0.5) / 4.0,
        protein_g: (energy * 0.25) / 4.0,
        fats_g: (energy * 0.25) / 9.0,
    }
}
