// Reward, discount and community alert policy for the AgroAI platform.
// All calculators are pure: they never touch the chain, the network or a clock.

pub mod alerts;
pub mod discounts;
pub mod token_rewards;

pub use alerts::{evaluate_community_alert, AlertDecision};
pub use discounts::{calculate_discount, DiscountDecision, DiscountError};
pub use token_rewards::{calculate_token_reward, Confidence, RewardDecision, RewardError};
