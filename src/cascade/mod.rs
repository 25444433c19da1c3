//! Protocol alert cascade.
//!
//! A static, ordered rule table ([`rules::RULES`]) evaluated by a single
//! interpreter ([`engine::evaluate`]). Adding or re-tuning a protocol band
//! is a table edit; precedence and double-count exclusions live in the
//! table where they can be read and tested rule by rule.

pub mod engine;
pub mod messages;
pub mod rules;

pub use engine::{evaluate, evaluate_rules, CascadeReport};
pub use messages::MessageTemplates;
pub use rules::{Counting, Parameter, Rule, RuleContext, RULES};
