//! Shared-secret check for the admin (reindex) routes

use subtle::ConstantTimeEq;

/// Holds the configured admin secret. Without one, nothing is authorized.
pub struct AdminAuth {
    secret: Option<String>,
}

impl AdminAuth {
    pub fn new(secret: Option<String>) -> Self {
        Self {
            secret: secret.filter(|s| !s.is_empty()),
        }
    }

    pub fn is_configured(&self) -> bool {
        self.secret.is_some()
    }

    /// Constant-time comparison of `candidate` against the configured secret
    pub fn verify(&self, candidate: Option<&str>) -> bool {
        match (&self.secret, candidate) {
            (Some(secret), Some(candidate)) => {
                secret.as_bytes().ct_eq(candidate.as_bytes()).into()
            }
            _ => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_verify() {
        let auth = AdminAuth::new(Some("open-sesame".to_string()));
        assert!(auth.is_configured());
        assert!(auth.verify(Some("open-sesame")));
        assert!(!auth.verify(Some("open-sesam")));
        assert!(!auth.verify(Some("")));
        assert!(!auth.verify(None));
    }

    #[test]
    fn test_unconfigured_rejects_everything() {
        for auth in [AdminAuth::new(None), AdminAuth::new(Some(String::new()))] {
            assert!(!auth.is_configured());
            assert!(!auth.verify(Some("")));
            assert!(!auth.verify(None));
        }
    }
}
