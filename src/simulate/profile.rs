use serde::{Deserialize, Serialize};

use crate::error::{BillingError, Result};
use crate::ledger::Category;
use crate::money::Money;

/// Longest base delay a profile may ask for.
const MAX_DELAY_DAYS: f64 = 3650.0;

/// How readily an account category pays, before debt-size adjustment.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PaymentProfile {
    /// Chance that a billing period is paid at all.
    pub probability: f64,
    /// Days after the period start before payments begin.
    pub delay_days: f64,
}

impl PaymentProfile {
    pub fn individual() -> Self {
        Self {
            probability: 0.9,
            delay_days: 10.0,
        }
    }

    pub fn team() -> Self {
        Self {
            probability: 0.7,
            delay_days: 20.0,
        }
    }

    pub fn unit() -> Self {
        Self {
            probability: 0.6,
            delay_days: 25.0,
        }
    }

    pub fn sector() -> Self {
        Self {
            probability: 0.5,
            delay_days: 30.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Profiles {
    #[serde(default = "PaymentProfile::individual")]
    pub individual: PaymentProfile,
    #[serde(default = "PaymentProfile::team")]
    pub team: PaymentProfile,
    #[serde(default = "PaymentProfile::unit")]
    pub unit: PaymentProfile,
    #[serde(default = "PaymentProfile::sector")]
    pub sector: PaymentProfile,
}

impl Default for Profiles {
    fn default() -> Self {
        Self {
            individual: PaymentProfile::individual(),
            team: PaymentProfile::team(),
            unit: PaymentProfile::unit(),
            sector: PaymentProfile::sector(),
        }
    }
}

impl Profiles {
    pub fn for_category(&self, category: Category) -> PaymentProfile {
        match category {
            Category::Individual => self.individual,
            Category::Team => self.team,
            Category::Unit => self.unit,
            Category::Sector => self.sector,
        }
    }
}

/// The `[simulator]` section of config.toml.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SimulatorSettings {
    #[serde(default = "default_high_debt")]
    pub high_debt_threshold: Money,
    #[serde(default = "default_low_debt")]
    pub low_debt_threshold: Money,
    #[serde(default)]
    pub profiles: Profiles,
}

fn default_high_debt() -> Money {
    Money::from_cents(5_000)
}

fn default_low_debt() -> Money {
    Money::from_cents(1_000)
}

impl Default for SimulatorSettings {
    fn default() -> Self {
        Self {
            high_debt_threshold: default_high_debt(),
            low_debt_threshold: default_low_debt(),
            profiles: Profiles::default(),
        }
    }
}

impl SimulatorSettings {
    /// Reject values that cannot describe a payment pattern.
    pub fn validate(&self) -> Result<()> {
        let low = self.low_debt_threshold;
        let high = self.high_debt_threshold;
        if low.is_negative() || high < low {
            return Err(BillingError::InvalidSetting(format!(
                "simulator thresholds: low {low} must be between 0 and high {high}"
            )));
        }
        for category in Category::ALL {
            let profile = self.profiles.for_category(category);
            if !(0.0..=1.0).contains(&profile.probability) {
                return Err(BillingError::InvalidSetting(format!(
                    "simulator.profiles.{category}.probability = {} (expected 0 to 1)",
                    profile.probability
                )));
            }
            if !(0.0..=MAX_DELAY_DAYS).contains(&profile.delay_days) {
                return Err(BillingError::InvalidSetting(format!(
                    "simulator.profiles.{category}.delay_days = {} (expected 0 to {MAX_DELAY_DAYS})",
                    profile.delay_days
                )));
            }
        }
        Ok(())
    }

    /// Category profile adjusted for the size of the period's charge.
    ///
    /// Large debts are paid less often and later; small ones more often
    /// and sooner.
    pub fn profile_for(&self, category: Category, total_charge: Money) -> PaymentProfile {
        let mut profile = self.profiles.for_category(category);
        if total_charge > self.high_debt_threshold {
            profile.probability *= 0.8;
            profile.delay_days += 10.0;
        } else if total_charge < self.low_debt_threshold {
            profile.probability *= 1.2;
            profile.delay_days -= 5.0;
        }
        profile
    }
}
