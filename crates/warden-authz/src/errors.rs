use thiserror::Error;

#[derive(Debug, Error)]
pub enum AuthzError {
    #[error("unauthorized: no identity context for request")]
    Unauthorized,
    #[error("policy does not allow {permission}")]
    PolicyNotAuthorized { permission: String },
    #[error("forbidden: project {actual} is outside caller project {expected}")]
    Forbidden { expected: String, actual: String },
    #[error("malformed permission: {0:?}")]
    MalformedPermission(String),
    #[error("invalid project id: {0}")]
    InvalidProjectId(String),
}

impl AuthzError {
    pub fn policy_not_authorized(permission: impl Into<String>) -> Self {
        AuthzError::PolicyNotAuthorized {
            permission: permission.into(),
        }
    }

    /// True for both plain denial and cross-project access. Hosts that only
    /// distinguish "not authenticated" from "not allowed" map both to the
    /// same response.
    pub fn is_forbidden(&self) -> bool {
        matches!(
            self,
            AuthzError::PolicyNotAuthorized { .. } | AuthzError::Forbidden { .. }
        )
    }

    pub fn is_unauthenticated(&self) -> bool {
        matches!(self, AuthzError::Unauthorized)
    }
}

impl From<warden_common::Error> for AuthzError {
    fn from(err: warden_common::Error) -> Self {
        match err {
            warden_common::Error::InvalidId(raw) => AuthzError::InvalidProjectId(raw),
            other => AuthzError::InvalidProjectId(other.to_string()),
        }
    }
}

pub type AuthzResult<T> = Result<T, AuthzError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_display_variants() {
        let errors = vec![
            AuthzError::Unauthorized,
            AuthzError::policy_not_authorized("svc.res.act"),
            AuthzError::Forbidden {
                expected: "a".to_string(),
                actual: "b".to_string(),
            },
            AuthzError::MalformedPermission("only.two".to_string()),
            AuthzError::InvalidProjectId("nope".to_string()),
        ];

        for error in errors {
            let rendered = error.to_string();
            assert!(!rendered.is_empty());
        }
    }

    #[test]
    fn denial_message_names_permission() {
        let err = AuthzError::policy_not_authorized("service.resource.other");
        assert!(err.to_string().contains("service.resource.other"));
    }

    #[test]
    fn forbidden_classification() {
        assert!(AuthzError::policy_not_authorized("a.b.c").is_forbidden());
        assert!(
            AuthzError::Forbidden {
                expected: "a".to_string(),
                actual: "b".to_string(),
            }
            .is_forbidden()
        );
        assert!(!AuthzError::Unauthorized.is_forbidden());
        assert!(AuthzError::Unauthorized.is_unauthenticated());
        assert!(!AuthzError::MalformedPermission(String::new()).is_forbidden());
    }

    #[test]
    fn common_id_error_converts() {
        let err: AuthzError = warden_common::Error::InvalidId("xyz".to_string()).into();
        assert!(matches!(err, AuthzError::InvalidProjectId(raw) if raw == "xyz"));
    }
}
