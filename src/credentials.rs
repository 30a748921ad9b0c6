use std::fmt;

/// An opaque Gemini API key.
#[derive(Clone, PartialEq, Eq, Hash)]
pub struct Credential(String);

impl Credential {
    pub fn new(key: impl Into<String>) -> Self {
        Self(key.into())
    }

    pub fn expose(&self) -> &str {
        &self.0
    }

    /// Short prefix safe to put in logs.
    pub fn preview(&self) -> String {
        let prefix: String = self.0.chars().take(6).collect();
        format!("{}...", prefix)
    }
}

impl fmt::Debug for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Credential({})", self.preview())
    }
}

/// Picks the key for a call: a user-entered value wins over the env default.
#[derive(Debug, Clone, Default)]
pub struct CredentialProvider {
    default_key: Option<String>,
}

impl CredentialProvider {
    pub fn new(default_key: Option<String>) -> Self {
        Self { default_key }
    }

    pub fn resolve(&self, user_supplied: Option<&str>) -> Option<Credential> {
        user_supplied
            .map(str::trim)
            .filter(|k| !k.is_empty())
            .or_else(|| self.default_key.as_deref().map(str::trim).filter(|k| !k.is_empty()))
            .map(Credential::new)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn user_key_wins_over_default() {
        let provider = CredentialProvider::new(Some("env-key".into()));
        assert_eq!(provider.resolve(Some("user-key")).unwrap().expose(), "user-key");
        assert_eq!(provider.resolve(None).unwrap().expose(), "env-key");
    }

    #[test]
    fn blank_values_count_as_absent() {
        let provider = CredentialProvider::new(Some("   ".into()));
        assert!(provider.resolve(Some("")).is_none());
        assert!(provider.resolve(None).is_none());
        let provider = CredentialProvider::new(Some("env-key".into()));
        assert_eq!(provider.resolve(Some("  ")).unwrap().expose(), "env-key");
    }

    #[test]
    fn debug_output_is_redacted() {
        let key = Credential::new("AIzaSyVerySecretValue");
        assert_eq!(format!("{:?}", key), "Credential(AIzaSy...)");
    }
}
