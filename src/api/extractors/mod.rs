/*
 * Responsibility
 * - handler 向けの extractor 群
 *   - principal: gate が extensions に入れた Principal を受け取る
 *   - body: JSON / form のどちらでも受け付ける body
 *   - decision: consent 判断の DecisionCommand
 */
pub mod body;
pub mod decision;
pub mod principal;

pub use body::{FormOrJson, SubmissionMode};
pub use decision::{DecisionCommand, DecisionOutcome};
pub use principal::{MaybePrincipal, PrincipalExtractor};
