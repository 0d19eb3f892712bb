//! Per-resource access policies.

use axum::{
    extract::{Request, State},
    http::Method,
    middleware::Next,
    response::{IntoResponse, Response},
};
use lms_common::{AppError, AppResult};
use lms_db::entities::user;

const NOT_AUTHENTICATED: &str = "Authentication credentials were not provided.";
const NOT_PERMITTED: &str = "You do not have permission to perform this action.";

/// Permission rule selected per resource router.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Policy {
    /// Staff may do anything, everyone else may only read.
    StaffOrReadOnly,
    /// Every request needs a logged-in caller.
    Authenticated,
    /// Anyone may read, writes need a logged-in caller.
    AuthenticatedOrReadOnly,
}

impl Policy {
    /// Whether `caller` may use `method` on a resource under this policy.
    #[must_use]
    pub fn allows(self, caller: Option<&user::Model>, method: &Method) -> bool {
        self.check(caller, method).is_ok()
    }

    /// Like [`Self::allows`], with the error a denied request gets.
    ///
    /// Anonymous callers denied by a rule that wants a login get 401;
    /// everything else denied gets 403.
    pub fn check(self, caller: Option<&user::Model>, method: &Method) -> AppResult<()> {
        let read_only = is_safe(method);

        match (self, caller) {
            (Self::StaffOrReadOnly, Some(user)) if user.is_staff => Ok(()),
            (Self::StaffOrReadOnly, _) if read_only => Ok(()),
            (Self::StaffOrReadOnly, _) => Err(AppError::Forbidden(NOT_PERMITTED.to_string())),
            (Self::Authenticated | Self::AuthenticatedOrReadOnly, Some(_)) => Ok(()),
            (Self::AuthenticatedOrReadOnly, None) if read_only => Ok(()),
            (_, None) => Err(AppError::Unauthorized(NOT_AUTHENTICATED.to_string())),
        }
    }
}

fn is_safe(method: &Method) -> bool {
    matches!(*method, Method::GET | Method::HEAD | Method::OPTIONS)
}

/// Reject the request unless the router's policy allows it.
///
/// Runs after [`crate::middleware::auth_middleware`] has attached the caller.
pub async fn enforce_policy(State(policy): State<Policy>, req: Request, next: Next) -> Response {
    let decision = policy.check(req.extensions().get::<user::Model>(), req.method());

    if let Err(e) = decision {
        tracing::debug!(?policy, method = %req.method(), uri = %req.uri(), "Request denied by policy");
        return e.into_response();
    }

    next.run(req).await
}
