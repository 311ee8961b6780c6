use std::sync::Arc;

use axum::http::HeaderMap;
use axum::http::header::AUTHORIZATION;

use crate::auth::{EndpointClass, Principal, RateDecision, RateLimiter, TokenIssuer, required_scope};
use crate::rpc::RpcError;

/// What the stages know about the request so far.
#[derive(Debug)]
pub struct GateContext<'a> {
    pub headers: &'a HeaderMap,
    pub method: &'a str,
    pub principal: Option<Principal>,
    pub rate: Option<RateDecision>,
}

impl<'a> GateContext<'a> {
    pub fn new(headers: &'a HeaderMap, method: &'a str) -> Self {
        Self {
            headers,
            method,
            principal: None,
            rate: None,
        }
    }

    pub fn subject(&self) -> Option<&str> {
        self.principal.as_ref().map(|p| p.subject_id.as_str())
    }
}

/// One step of the request gate. `Ok` lets the request continue to the next
/// stage, `Err` ends it with that error.
pub trait Interceptor: Send + Sync {
    fn name(&self) -> &'static str;

    fn intercept(&self, ctx: &mut GateContext<'_>) -> Result<(), RpcError>;
}

/// Interceptors run in order, stopping at the first rejection.
pub struct Pipeline {
    stages: Vec<Box<dyn Interceptor>>,
}

impl Pipeline {
    pub fn new(stages: Vec<Box<dyn Interceptor>>) -> Self {
        Self { stages }
    }

    /// authenticate → authorize → rate-limit
    pub fn standard(issuer: Arc<TokenIssuer>, limiter: Arc<RateLimiter>) -> Self {
        Self::new(vec![
            Box::new(Authenticate { issuer }),
            Box::new(Authorize),
            Box::new(RateLimit { limiter }),
        ])
    }

    /// Run every stage; on rejection yields the stage name and its error.
    pub fn run(&self, ctx: &mut GateContext<'_>) -> Result<(), (&'static str, RpcError)> {
        for stage in &self.stages {
            stage.intercept(ctx).map_err(|e| (stage.name(), e))?;
        }
        Ok(())
    }

    pub fn stage_names(&self) -> Vec<&'static str> {
        self.stages.iter().map(|s| s.name()).collect()
    }
}

/// Bearer token from the `Authorization` header.
pub fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    let value = headers.get(AUTHORIZATION)?.to_str().ok()?;
    let (scheme, token) = value.split_once(' ')?;
    let token = token.trim();
    (scheme.eq_ignore_ascii_case("bearer") && !token.is_empty()).then_some(token)
}

pub struct Authenticate {
    pub issuer: Arc<TokenIssuer>,
}

impl Interceptor for Authenticate {
    fn name(&self) -> &'static str {
        "authenticate"
    }

    fn intercept(&self, ctx: &mut GateContext<'_>) -> Result<(), RpcError> {
        let token = bearer_token(ctx.headers).ok_or(RpcError::Unauthorized)?;
        let principal = self
            .issuer
            .verify(token)
            .map_err(|_| RpcError::Unauthorized)?;
        ctx.principal = Some(principal);
        Ok(())
    }
}

pub struct Authorize;

impl Interceptor for Authorize {
    fn name(&self) -> &'static str {
        "authorize"
    }

    fn intercept(&self, ctx: &mut GateContext<'_>) -> Result<(), RpcError> {
        let Some(scope) = required_scope(ctx.method) else {
            return Ok(());
        };
        match &ctx.principal {
            Some(principal) if principal.has_scope(scope) => Ok(()),
            Some(_) => Err(RpcError::Forbidden {
                required_scope: scope.as_str().to_string(),
            }),
            None => Err(RpcError::Unauthorized),
        }
    }
}

pub struct RateLimit {
    pub limiter: Arc<RateLimiter>,
}

impl Interceptor for RateLimit {
    fn name(&self) -> &'static str {
        "rate_limit"
    }

    fn intercept(&self, ctx: &mut GateContext<'_>) -> Result<(), RpcError> {
        let class = EndpointClass::for_method(ctx.method);
        let decision = self.limiter.is_allowed(ctx.subject(), class);
        ctx.rate = Some(decision);

        if decision.allowed {
            Ok(())
        } else {
            Err(RpcError::RateLimited {
                retry_after: decision.retry_after_secs(self.limiter.now()),
                reset_at: decision.reset_at,
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use axum::http::HeaderValue;

    use super::*;

    #[test]
    fn bearer_token_accepts_any_scheme_case() {
        let mut headers = HeaderMap::new();
        headers.insert(AUTHORIZATION, HeaderValue::from_static("bearer abc.def"));
        assert_eq!(bearer_token(&headers), Some("abc.def"));

        headers.insert(AUTHORIZATION, HeaderValue::from_static("Bearer xyz"));
        assert_eq!(bearer_token(&headers), Some("xyz"));
    }

    #[test]
    fn bearer_token_rejects_other_schemes() {
        let mut headers = HeaderMap::new();
        assert_eq!(bearer_token(&headers), None);

        headers.insert(AUTHORIZATION, HeaderValue::from_static("Basic dXNlcjpwdw=="));
        assert_eq!(bearer_token(&headers), None);

        headers.insert(AUTHORIZATION, HeaderValue::from_static("Bearer "));
        assert_eq!(bearer_token(&headers), None);
    }

    #[test]
    fn authorize_without_principal_is_unauthorized() {
        let headers = HeaderMap::new();
        let mut ctx = GateContext::new(&headers, "tools/call");

        assert_eq!(Authorize.intercept(&mut ctx), Err(RpcError::Unauthorized));
    }

    #[test]
    fn authorize_lets_open_methods_through() {
        let headers = HeaderMap::new();
        let mut ctx = GateContext::new(&headers, "tools/list");

        assert_eq!(Authorize.intercept(&mut ctx), Ok(()));
    }

    #[test]
    fn stages_compose_into_a_custom_pipeline() {
        use crate::api::{Authorize, Pipeline, RateLimit};
        use crate::clock::system_clock;
        use crate::config::RateLimitSettings;

        let limits = RateLimitSettings {
            unauthenticated_limit: 1,
            ..RateLimitSettings::default()
        };
        let limiter = Arc::new(RateLimiter::new(limits, system_clock()));
        let pipeline = Pipeline::new(vec![Box::new(Authorize), Box::new(RateLimit { limiter })]);
        assert_eq!(pipeline.stage_names(), vec!["authorize", "rate_limit"]);

        let headers = HeaderMap::new();
        let mut first = GateContext::new(&headers, "tools/list");
        assert!(pipeline.run(&mut first).is_ok());

        let mut second = GateContext::new(&headers, "tools/list");
        let (stage, error) = pipeline.run(&mut second).unwrap_err();
        assert_eq!(stage, "rate_limit");
        assert!(matches!(error, RpcError::RateLimited { .. }));
    }
}
