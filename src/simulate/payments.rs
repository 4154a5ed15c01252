use chrono::{DateTime, Duration, Utc};
use rand::Rng;
use serde::Serialize;

use crate::ledger::{Category, Event};
use crate::money::Money;
use crate::simulate::profile::SimulatorSettings;

/// Share of paying periods settled with one full payment.
const FULL_PAYMENT_SHARE: f64 = 0.7;
/// Chance that an unpaid period still sees one late partial payment.
const LATE_PAYMENT_CHANCE: f64 = 0.3;

/// A simulated payment, not yet attached to an account.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Payment {
    pub amount: Money,
    pub timestamp: DateTime<Utc>,
}

impl Payment {
    pub fn into_event(self) -> Event {
        Event::payment(self.amount, self.timestamp)
    }
}

/// `start` moved by a fractional number of days, or `None` past chrono's range.
fn after_days(start: DateTime<Utc>, days: f64) -> Option<DateTime<Utc>> {
    let offset = Duration::try_milliseconds((days * 86_400_000.0).round() as i64)?;
    start.checked_add_signed(offset)
}

/// Synthesizes believable payment histories for demo data.
#[derive(Debug, Clone, Default)]
pub struct PaymentSimulator {
    settings: SimulatorSettings,
}

impl PaymentSimulator {
    pub fn new(settings: SimulatorSettings) -> Self {
        Self { settings }
    }

    /// Payments made against one billing period's `total_charge`, sorted
    /// by timestamp. Amounts are never negative and never add up to more
    /// than the charge.
    pub fn generate<R: Rng>(
        &self,
        category: Category,
        total_charge: Money,
        period_start: DateTime<Utc>,
        rng: &mut R,
    ) -> Vec<Payment> {
        let mut payments = Vec::new();
        if !total_charge.is_positive() {
            return payments;
        }

        let profile = self.settings.profile_for(category, total_charge);

        if rng.gen::<f64>() < profile.probability {
            if rng.gen::<f64>() < FULL_PAYMENT_SHARE {
                let offset = profile.delay_days + rng.gen_range(0.0..10.0);
                if let Some(timestamp) = after_days(period_start, offset) {
                    payments.push(Payment {
                        amount: total_charge,
                        timestamp,
                    });
                }
            } else {
                let count: usize = rng.gen_range(2..=4);
                let mut remaining = total_charge;
                for i in 0..count {
                    if !remaining.is_positive() {
                        break;
                    }
                    let amount = if i == count - 1 {
                        remaining
                    } else {
                        remaining
                            .scale(rng.gen_range(0.3..0.7))
                            .clamp(Money::ZERO, remaining)
                    };
                    let offset = profile.delay_days + 7.0 * i as f64 + rng.gen_range(0.0..5.0);
                    remaining -= amount;
                    if !amount.is_positive() {
                        continue;
                    }
                    if let Some(timestamp) = after_days(period_start, offset) {
                        payments.push(Payment { amount, timestamp });
                    }
                }
            }
        } else if rng.gen::<f64>() < LATE_PAYMENT_CHANCE {
            let amount = total_charge
                .scale(rng.gen_range(0.5..0.8))
                .clamp(Money::ZERO, total_charge);
            if let Some(timestamp) = after_days(period_start, rng.gen_range(60.0..90.0)) {
                payments.push(Payment { amount, timestamp });
            }
        }

        payments.sort_by_key(|p| p.timestamp);
        payments
    }
}

/// Generate payments with the default category profiles.
pub fn generate_payments<R: Rng>(
    category: Category,
    total_charge: Money,
    period_start: DateTime<Utc>,
    rng: &mut R,
) -> Vec<Payment> {
    PaymentSimulator::default().generate(category, total_charge, period_start, rng)
}
