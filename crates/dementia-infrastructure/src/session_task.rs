//! Request-scoped session publishing (spec §4.3 step 4, "Publish").
//!
//! The middleware resolves a [`SessionId`] once per call and makes it
//! available to the tool handler without threading it through every
//! function signature, the same way the reference workspace publishes
//! request-scoped context to handlers that don't carry it as an explicit
//! parameter.

use dementia_domain::value_objects::SessionId;

tokio::task_local! {
    static CURRENT_SESSION: SessionId;
}

/// Run `f` with `session` published as the current request's session id.
pub async fn scope<F, Fut, T>(session: SessionId, f: F) -> T
where
    F: FnOnce() -> Fut,
    Fut: std::future::Future<Output = T>,
{
    CURRENT_SESSION.scope(session, f()).await
}

/// The session id published by the innermost enclosing [`scope`], if any.
///
/// Returns `None` rather than panicking when called outside a scope, since
/// background tasks (the cleanup sweep) legitimately run without one.
pub fn current() -> Option<SessionId> {
    CURRENT_SESSION.try_with(|id| id.clone()).ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn current_is_none_outside_a_scope() {
        assert!(current().is_none());
    }

    #[tokio::test]
    async fn current_returns_the_published_session_inside_a_scope() {
        let id = SessionId::new("s1");
        let observed = scope(id.clone(), || async { current() }).await;
        assert_eq!(observed, Some(id));
    }
}
