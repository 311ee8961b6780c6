//! Bearer-token identity, scope checks and request quotas.
//!
//! - **token**: signs and verifies HS256 bearer tokens into a [`Principal`]
//! - **scope**: method → required scope table and the satisfaction rule
//! - **rate_limit**: fixed-window request counting per subject and endpoint class

mod rate_limit;
mod scope;
mod token;


pub use rate_limit::{EndpointClass, RateDecision, RateLimiter, RateWindow, UNAUTHENTICATED};
pub use scope::{Scope, required_scope};
pub use token::{DEFAULT_TIER, IssuedToken, Principal, TokenError, TokenIssuer};
