pub mod api;
pub mod bus;
pub mod config;
pub mod domain;
pub mod observability;
pub mod policy;
pub mod rules;
pub mod sim;
pub mod state;
pub mod streamer;

pub use config::Config;
pub use domain::{Decision, Evidence, Policy, TxEvent};
pub use rules::{Rule, RuleSet};
pub use state::RollingView;
