use serde::{Deserialize, Serialize};

/// Strength of an authorization decision, weakest first.
///
/// `Full` is only produced when the action segment matched through a `*`
/// entry, so a caller holding both `svc.res.act` and `svc.res.*` resolves to
/// `Full` for `svc.res.act`.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize,
)]
#[serde(rename_all = "snake_case")]
pub enum Grant {
    #[default]
    Deny,
    Regular,
    Full,
}

impl Grant {
    pub fn as_str(self) -> &'static str {
        match self {
            Grant::Deny => "deny",
            Grant::Regular => "regular",
            Grant::Full => "full",
        }
    }

    pub fn is_allowed(self) -> bool {
        self > Grant::Deny
    }
}

impl std::fmt::Display for Grant {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::Grant;

    #[test]
    fn grant_ordering() {
        assert!(Grant::Deny < Grant::Regular);
        assert!(Grant::Regular < Grant::Full);
        assert_eq!(Grant::Deny.max(Grant::Full), Grant::Full);
        assert_eq!(Grant::default(), Grant::Deny);
    }

    #[test]
    fn grant_allowed() {
        assert!(!Grant::Deny.is_allowed());
        assert!(Grant::Regular.is_allowed());
        assert!(Grant::Full.is_allowed());
    }

    #[test]
    fn grant_display() {
        assert_eq!(Grant::Regular.to_string(), "regular");
        assert_eq!(Grant::Full.as_str(), "full");
    }
}
