use std::env;

/// Which sources may supply the credential.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CredentialStrategy {
    /// User override, then remembered key, then environment.
    #[default]
    UserThenEnvironment,
    /// Only the environment default; user-supplied keys are ignored.
    EnvironmentOnly,
}

/// Credential sources for outgoing requests. Passed explicitly to the
/// request layer; nothing here reads global state after construction.
#[derive(Clone, Default, PartialEq, Eq)]
pub struct Credentials {
    pub strategy: CredentialStrategy,
    pub user_override: Option<String>,
    pub remembered: Option<String>,
    pub environment_default: Option<String>,
}

impl Credentials {
    pub fn new(strategy: CredentialStrategy) -> Self {
        Self {
            strategy,
            ..Self::default()
        }
    }

    /// Captures `GEMINI_API_KEY`, falling back to `GOOGLE_API_KEY`.
    pub fn from_environment(strategy: CredentialStrategy) -> Self {
        Self {
            strategy,
            environment_default: non_empty_env("GEMINI_API_KEY")
                .or_else(|| non_empty_env("GOOGLE_API_KEY")),
            ..Self::default()
        }
    }

    pub fn with_override(mut self, credential: Option<String>) -> Self {
        self.user_override = clean(credential);
        self
    }

    pub fn with_remembered(mut self, credential: Option<String>) -> Self {
        self.remembered = clean(credential);
        self
    }

    pub fn with_environment_default(mut self, credential: Option<String>) -> Self {
        self.environment_default = clean(credential);
        self
    }

    pub fn set_override(&mut self, credential: Option<String>) {
        self.user_override = clean(credential);
    }

    /// Clears the override and the remembered key.
    pub fn forget_user_keys(&mut self) {
        self.user_override = None;
        self.remembered = None;
    }

    pub fn accepts_user_keys(&self) -> bool {
        self.strategy == CredentialStrategy::UserThenEnvironment
    }

    pub fn resolve(&self) -> Option<&str> {
        let user = match self.strategy {
            CredentialStrategy::UserThenEnvironment => self
                .user_override
                .as_deref()
                .or(self.remembered.as_deref()),
            CredentialStrategy::EnvironmentOnly => None,
        };
        user.or(self.environment_default.as_deref())
    }

    /// Short label naming where the resolved credential came from.
    pub fn source_label(&self) -> &'static str {
        if self.accepts_user_keys() {
            if self.user_override.is_some() {
                return "override";
            }
            if self.remembered.is_some() {
                return "remembered";
            }
        }
        if self.environment_default.is_some() {
            return "environment";
        }
        "none"
    }
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials")
            .field("strategy", &self.strategy)
            .field("source", &self.source_label())
            .finish()
    }
}

fn clean(credential: Option<String>) -> Option<String> {
    credential
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
}

fn non_empty_env(key: &str) -> Option<String> {
    env::var(key)
        .ok()
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
}
