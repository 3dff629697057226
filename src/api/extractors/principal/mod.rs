/*!
 * Principal extractor
 *
 * Responsibility:
 * - 認証済みリクエストの Principal を handler に提供する
 * - Principal の生成は middleware (session gate / bearer gate) の責務
 *
 * Public API:
 * - PrincipalExtractor (必須: 無ければ 401)
 * - MaybePrincipal (任意: login/auth 系ページ用)
 */

mod core;

pub use self::core::{MaybePrincipal, PrincipalExtractor};
