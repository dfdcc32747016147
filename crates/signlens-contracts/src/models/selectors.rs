use super::registry::{ModelRegistry, ModelSpec, ModelVariant};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModelSelection {
    pub model: ModelSpec,
    pub requested: Option<String>,
    pub fallback_reason: Option<String>,
}

#[derive(Debug, Clone)]
pub struct ModelSelector {
    pub registry: ModelRegistry,
}

impl ModelSelector {
    pub fn new(registry: Option<ModelRegistry>) -> Self {
        Self {
            registry: registry.unwrap_or_else(|| ModelRegistry::new(None)),
        }
    }

    /// Resolves a variant to a concrete model.
    ///
    /// A requested name that is registered under a different variant is
    /// ignored with a fallback reason. An unregistered name is used as-is and
    /// inherits the variant default's settings, so newly released models can
    /// be tried without a registry change.
    pub fn select(
        &self,
        variant: ModelVariant,
        requested: Option<&str>,
    ) -> Result<ModelSelection, String> {
        let Some(default) = self.registry.default_for(variant).cloned() else {
            return Err(format!("No models registered for variant '{variant}'."));
        };
        let Some(requested_value) = requested.map(str::trim).filter(|value| !value.is_empty())
        else {
            return Ok(ModelSelection {
                model: default,
                requested: None,
                fallback_reason: None,
            });
        };

        match self.registry.get(requested_value) {
            Some(model) if model.variant == variant => Ok(ModelSelection {
                model: model.clone(),
                requested: Some(requested_value.to_string()),
                fallback_reason: None,
            }),
            Some(_) => Ok(ModelSelection {
                fallback_reason: Some(format!(
                    "Requested model '{requested_value}' is not a {variant} model; using {}.",
                    default.name
                )),
                model: default,
                requested: Some(requested_value.to_string()),
            }),
            None => Ok(ModelSelection {
                model: ModelSpec {
                    name: requested_value.to_string(),
                    ..default
                },
                requested: Some(requested_value.to_string()),
                fallback_reason: None,
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use indexmap::IndexMap;

    use super::*;

    #[test]
    fn no_request_uses_variant_default() {
        let selection = ModelSelector::new(None)
            .select(ModelVariant::Fast, None)
            .unwrap();
        assert_eq!(selection.model.name, "gemini-2.5-flash");
        assert!(selection.fallback_reason.is_none());
    }

    #[test]
    fn cross_variant_request_falls_back_with_reason() {
        let selection = ModelSelector::new(None)
            .select(ModelVariant::Fast, Some("gemini-2.5-pro"))
            .unwrap();
        assert_eq!(selection.model.name, "gemini-2.5-flash");
        assert_eq!(
            selection.fallback_reason.as_deref(),
            Some("Requested model 'gemini-2.5-pro' is not a fast model; using gemini-2.5-flash.")
        );
    }

    #[test]
    fn unregistered_request_inherits_variant_settings() {
        let selection = ModelSelector::new(None)
            .select(ModelVariant::Deep, Some("gemini-next-pro"))
            .unwrap();
        assert_eq!(selection.model.name, "gemini-next-pro");
        assert_eq!(selection.model.thinking_budget, Some(32_768));
        assert_eq!(selection.requested.as_deref(), Some("gemini-next-pro"));
    }

    #[test]
    fn empty_registry_is_an_error() {
        let err = ModelSelector::new(Some(ModelRegistry::new(Some(IndexMap::new()))))
            .select(ModelVariant::Deep, None)
            .err()
            .unwrap_or_default();
        assert_eq!(err, "No models registered for variant 'deep'.");
    }
}
