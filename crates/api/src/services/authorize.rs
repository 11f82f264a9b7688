//! Authorization policy for acting on behalf of a patient.
//!
//! Callers may name a subject (`platform_user`) to act on. Only an actor
//! with the admin role may act on someone other than themselves; everyone
//! else is pinned to their own identity.

/// The verified identity of the caller, resolved upstream of this service.
#[derive(Debug, Clone, Default)]
pub struct Actor {
    /// Caller's platform identity, absent when auth is disabled.
    pub id: Option<String>,
    /// Roles granted by the identity provider.
    pub roles: Vec<String>,
}

impl Actor {
    #[must_use]
    pub fn is_admin(&self) -> bool {
        self.roles.iter().any(|role| role == "admin")
    }
}

/// Resolve the subject an actor is allowed to act on.
///
/// Admins act on the requested subject (falling back to themselves);
/// everyone else acts on themselves regardless of what was requested. With
/// auth disabled the actor has no identity and the request passes through.
#[must_use]
pub fn effective_subject(actor: &Actor, requested: Option<&str>) -> Option<String> {
    if actor.is_admin() {
        requested
            .map(str::to_owned)
            .or_else(|| actor.id.clone())
    } else {
        actor
            .id
            .clone()
            .or_else(|| requested.map(str::to_owned))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn admin() -> Actor {
        Actor {
            id: Some("admin-1".to_owned()),
            roles: vec!["admin".to_owned()],
        }
    }

    fn patient() -> Actor {
        Actor {
            id: Some("patient-1".to_owned()),
            roles: vec!["patient".to_owned()],
        }
    }

    #[test]
    fn test_admin_may_act_on_requested_subject() {
        assert_eq!(
            effective_subject(&admin(), Some("patient-9")),
            Some("patient-9".to_owned())
        );
    }

    #[test]
    fn test_admin_defaults_to_self() {
        assert_eq!(effective_subject(&admin(), None), Some("admin-1".to_owned()));
    }

    #[test]
    fn test_non_admin_is_pinned_to_self() {
        assert_eq!(
            effective_subject(&patient(), Some("patient-9")),
            Some("patient-1".to_owned())
        );
    }

    #[test]
    fn test_anonymous_actor_passes_request_through() {
        // Auth disabled: no identity to pin to
        let actor = Actor::default();
        assert_eq!(
            effective_subject(&actor, Some("patient-9")),
            Some("patient-9".to_owned())
        );
        assert_eq!(effective_subject(&actor, None), None);
    }
}
