use std::fmt;
use std::str::FromStr;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// Latency/cost tier requested by the user. The engine passes the resolved
/// model name through; no local behavior differs between variants.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ModelVariant {
    #[default]
    Fast,
    Deep,
}

impl ModelVariant {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Fast => "fast",
            Self::Deep => "deep",
        }
    }

    pub fn other(self) -> Self {
        match self {
            Self::Fast => Self::Deep,
            Self::Deep => Self::Fast,
        }
    }
}

impl fmt::Display for ModelVariant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ModelVariant {
    type Err = String;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "fast" | "flash" => Ok(Self::Fast),
            "deep" | "pro" | "reasoning" => Ok(Self::Deep),
            other => Err(format!("Unknown model variant '{other}' (expected fast or deep).")),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModelSpec {
    pub name: String,
    pub variant: ModelVariant,
    pub thinking_budget: Option<u32>,
}

#[derive(Debug, Clone)]
pub struct ModelRegistry {
    models: IndexMap<String, ModelSpec>,
}

impl ModelRegistry {
    pub fn new(models: Option<IndexMap<String, ModelSpec>>) -> Self {
        Self {
            models: models.unwrap_or_else(default_models),
        }
    }

    pub fn get(&self, name: &str) -> Option<&ModelSpec> {
        self.models.get(name)
    }

    /// First registered model for `variant`; registration order is preference order.
    pub fn default_for(&self, variant: ModelVariant) -> Option<&ModelSpec> {
        self.models.values().find(|model| model.variant == variant)
    }
}

fn default_models() -> IndexMap<String, ModelSpec> {
    let mut map = IndexMap::new();

    let mut insert = |name: &str, variant: ModelVariant, thinking_budget: Option<u32>| {
        map.insert(
            name.to_string(),
            ModelSpec {
                name: name.to_string(),
                variant,
                thinking_budget,
            },
        );
    };

    insert("gemini-2.5-flash", ModelVariant::Fast, None);
    insert("gemini-2.5-pro", ModelVariant::Deep, Some(32_768));
    insert("gemini-2.0-flash", ModelVariant::Fast, None);
    insert("gemini-3-pro-preview", ModelVariant::Deep, Some(32_768));

    map
}
