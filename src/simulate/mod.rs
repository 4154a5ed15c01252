pub mod payments;
pub mod profile;
pub mod seed;

pub use payments::{generate_payments, Payment, PaymentSimulator};
pub use profile::{PaymentProfile, Profiles, SimulatorSettings};
pub use seed::{seed, SeedOptions, SeedReport};
