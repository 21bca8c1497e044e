mod jurisdiction;
mod kyc_cap;
mod ofac;

pub use jurisdiction::JurisdictionRule;
pub use kyc_cap::KycCapRule;
pub use ofac::OfacRule;
