//! Access decisions for protected views.
//!
//! `route_decision` is a total, side-effect-free function; the caller that
//! owns navigation interprets the decision. Nothing here renders or
//! redirects.

use crate::models::Role;

use super::SessionState;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RouteDecision {
    /// Session still resolving: show a loading placeholder, render nothing
    /// protected.
    Loading,
    /// No credential: send the caller to the login view.
    RedirectToLogin,
    /// Authenticated but lacking the required role: send the caller to
    /// their default view.
    RedirectToHome,
    Allow,
}

/// Decide whether a view may render, in rule order: resolving first, then
/// credential presence, then role.
pub fn route_decision(state: &SessionState, required_role: Option<Role>) -> RouteDecision {
    if state.resolving {
        return RouteDecision::Loading;
    }
    if state.token.is_none() {
        return RouteDecision::RedirectToLogin;
    }
    if let Some(required) = required_role {
        match state.identity.as_ref() {
            Some(identity) if identity.role == required => {}
            _ => return RouteDecision::RedirectToHome,
        }
    }
    RouteDecision::Allow
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Identity;

    fn resolving() -> SessionState {
        SessionState {
            token: Some("t".into()),
            identity: None,
            resolving: true,
        }
    }

    fn anonymous() -> SessionState {
        SessionState::default()
    }

    fn authenticated(role: Role) -> SessionState {
        SessionState {
            token: Some("t".into()),
            identity: Some(Identity {
                id: "1".into(),
                name: "Test".into(),
                email: "a@b.com".into(),
                role,
            }),
            resolving: false,
        }
    }

    #[test]
    fn test_resolving_always_loads() {
        assert_eq!(route_decision(&resolving(), None), RouteDecision::Loading);
        assert_eq!(
            route_decision(&resolving(), Some(Role::Admin)),
            RouteDecision::Loading
        );
    }

    #[test]
    fn test_anonymous_redirects_to_login() {
        assert_eq!(
            route_decision(&anonymous(), None),
            RouteDecision::RedirectToLogin
        );
        assert_eq!(
            route_decision(&anonymous(), Some(Role::User)),
            RouteDecision::RedirectToLogin
        );
    }

    #[test]
    fn test_authenticated_without_role_requirement_allows() {
        assert_eq!(
            route_decision(&authenticated(Role::User), None),
            RouteDecision::Allow
        );
        assert_eq!(
            route_decision(&authenticated(Role::Admin), None),
            RouteDecision::Allow
        );
    }

    #[test]
    fn test_role_match_allows_mismatch_redirects_home() {
        assert_eq!(
            route_decision(&authenticated(Role::Admin), Some(Role::Admin)),
            RouteDecision::Allow
        );
        assert_eq!(
            route_decision(&authenticated(Role::User), Some(Role::Admin)),
            RouteDecision::RedirectToHome
        );
        assert_eq!(
            route_decision(&authenticated(Role::Admin), Some(Role::User)),
            RouteDecision::RedirectToHome
        );
    }
}
