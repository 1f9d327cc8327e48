// handlers/mod.rs - Three handler tiers, by access level:
// Public (no auth) -> Protected (valid JWT) -> Elevated (valid JWT + role guard)
pub mod elevated;
pub mod protected;
pub mod public;
