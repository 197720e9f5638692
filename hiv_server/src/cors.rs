//! Cross-origin policy.
//!
//! The policy is an explicit value built once at startup and handed to
//! [`crate::build_router`]. The default admits any origin, method and
//! header with credentials. Browsers refuse a literal `*` on credentialed
//! responses, so "any" is served by echoing the request's own `Origin`,
//! method and headers back.

use axum::http::HeaderValue;
use tower_http::cors::{AllowHeaders, AllowMethods, AllowOrigin, CorsLayer};

use crate::error::ServerError;

/// Which origins may call the service.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AllowedOrigins {
    /// Every origin
    Any,
    /// Only these exact origins
    List(Vec<HeaderValue>),
}

/// Cross-origin configuration for the router.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CorsPolicy {
    pub origins: AllowedOrigins,
    pub allow_credentials: bool,
}

impl Default for CorsPolicy {
    fn default() -> Self {
        Self::permissive()
    }
}

impl CorsPolicy {
    /// Any origin, any method, any header, credentials allowed.
    pub fn permissive() -> Self {
        Self {
            origins: AllowedOrigins::Any,
            allow_credentials: true,
        }
    }

    /// Restricts the policy to the given origins.
    ///
    /// An empty list, or one containing `*`, keeps [`AllowedOrigins::Any`].
    pub fn with_origins<I, S>(mut self, origins: I) -> Result<Self, ServerError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let origins: Vec<S> = origins.into_iter().collect();
        if origins.iter().any(|o| o.as_ref() == "*") {
            self.origins = AllowedOrigins::Any;
            return Ok(self);
        }

        let parsed = origins
            .iter()
            .map(|o| {
                HeaderValue::from_str(o.as_ref())
                    .map_err(|_| ServerError::InvalidOrigin(o.as_ref().to_string()))
            })
            .collect::<Result<Vec<_>, _>>()?;

        if !parsed.is_empty() {
            self.origins = AllowedOrigins::List(parsed);
        }
        Ok(self)
    }

    pub fn with_credentials(mut self, allow: bool) -> Self {
        self.allow_credentials = allow;
        self
    }

    /// Builds the tower layer enforcing this policy.
    pub fn layer(&self) -> CorsLayer {
        let origin = match (&self.origins, self.allow_credentials) {
            (AllowedOrigins::Any, true) => AllowOrigin::mirror_request(),
            (AllowedOrigins::Any, false) => AllowOrigin::any(),
            (AllowedOrigins::List(list), _) => AllowOrigin::list(list.iter().cloned()),
        };

        let (methods, headers) = if self.allow_credentials {
            (AllowMethods::mirror_request(), AllowHeaders::mirror_request())
        } else {
            (AllowMethods::any(), AllowHeaders::any())
        };

        CorsLayer::new()
            .allow_origin(origin)
            .allow_methods(methods)
            .allow_headers(headers)
            .allow_credentials(self.allow_credentials)
    }
}
