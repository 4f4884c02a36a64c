// Handlers are split by who may call them:
// public (no token) and protected (JWT under /api, rate limited).
// Role checks for writes live in the protected handlers themselves.

pub mod protected;
pub mod public;
