//! Static catalog of selectable models.

use serde::Serialize;

/// Identifier used when a registry is ever empty.
pub const FALLBACK_MODEL_ID: &str = "Llama-3.2-1B-Instruct-Q4_K_M";

/// What a model has been tuned or chosen for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Specialization {
    General,
    Therapy,
    Wellness,
}

impl Specialization {
    /// Human-readable label for selection menus.
    pub fn label(&self) -> &'static str {
        match self {
            Specialization::General => "General Purpose",
            Specialization::Therapy => "Therapy Focused",
            Specialization::Wellness => "Wellness Optimized",
        }
    }
}

/// Where a model's weights are published.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ArtifactSource {
    /// HuggingFace repository, e.g. `Qwen/Qwen2.5-1.5B-Instruct-GGUF`.
    pub repo: &'static str,
    /// Weight file inside the repository.
    pub file: &'static str,
}

impl ArtifactSource {
    /// Download URL of the weight file.
    pub fn url(&self) -> String {
        format!(
            "https://huggingface.co/{}/resolve/main/{}",
            self.repo, self.file
        )
    }
}

/// Model registry entry.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ModelDescriptor {
    /// Identifier, unique within a registry.
    pub id: &'static str,
    /// Display name of the model.
    pub name: &'static str,
    /// Approximate download size.
    pub size: &'static str,
    pub description: &'static str,
    pub specialization: Specialization,
    pub recommended: bool,
    pub artifact: ArtifactSource,
}

static BUILTIN_MODELS: &[ModelDescriptor] = &[
    ModelDescriptor {
        id: "Llama-3.2-1B-Instruct-Q4_K_M",
        name: "Llama 3.2 1B (Lightweight)",
        size: "0.8GB",
        description: "Fast and efficient for quick conversations",
        specialization: Specialization::Wellness,
        recommended: true,
        artifact: ArtifactSource {
            repo: "bartowski/Llama-3.2-1B-Instruct-GGUF",
            file: "Llama-3.2-1B-Instruct-Q4_K_M.gguf",
        },
    },
    ModelDescriptor {
        id: "Llama-3.2-3B-Instruct-Q4_K_M",
        name: "Llama 3.2 3B (Balanced)",
        size: "2.0GB",
        description: "Great balance of performance and capability",
        specialization: Specialization::Wellness,
        recommended: true,
        artifact: ArtifactSource {
            repo: "bartowski/Llama-3.2-3B-Instruct-GGUF",
            file: "Llama-3.2-3B-Instruct-Q4_K_M.gguf",
        },
    },
    ModelDescriptor {
        id: "gemma-2-2b-it-Q4_K_M",
        name: "Gemma 2 2B",
        size: "1.7GB",
        description: "Google's efficient model with strong reasoning",
        specialization: Specialization::General,
        recommended: false,
        artifact: ArtifactSource {
            repo: "bartowski/gemma-2-2b-it-GGUF",
            file: "gemma-2-2b-it-Q4_K_M.gguf",
        },
    },
    ModelDescriptor {
        id: "Qwen2.5-1.5B-Instruct-Q4_K_M",
        name: "Qwen 2.5 1.5B",
        size: "1.1GB",
        description: "Excellent for therapeutic conversations",
        specialization: Specialization::Therapy,
        recommended: true,
        artifact: ArtifactSource {
            repo: "Qwen/Qwen2.5-1.5B-Instruct-GGUF",
            file: "qwen2.5-1.5b-instruct-q4_k_m.gguf",
        },
    },
];

static FALLBACK_MODEL: ModelDescriptor = ModelDescriptor {
    id: FALLBACK_MODEL_ID,
    name: "Llama 3.2 1B (Lightweight)",
    size: "0.8GB",
    description: "Fast and efficient for quick conversations",
    specialization: Specialization::Wellness,
    recommended: true,
    artifact: ArtifactSource {
        repo: "bartowski/Llama-3.2-1B-Instruct-GGUF",
        file: "Llama-3.2-1B-Instruct-Q4_K_M.gguf",
    },
};

/// Lookup over a compile-time model table.
#[derive(Debug, Clone, Copy)]
pub struct ModelRegistry {
    models: &'static [ModelDescriptor],
}

impl ModelRegistry {
    /// Registry over an arbitrary static table.
    pub const fn new(models: &'static [ModelDescriptor]) -> Self {
        Self { models }
    }

    /// The catalog shipped with RAI.
    pub const fn builtin() -> Self {
        Self::new(BUILTIN_MODELS)
    }

    pub fn list_available(&self) -> &'static [ModelDescriptor] {
        self.models
    }

    pub fn get_by_id(&self, id: &str) -> Option<&'static ModelDescriptor> {
        self.models.iter().find(|m| m.id == id)
    }

    pub fn contains(&self, id: &str) -> bool {
        self.get_by_id(id).is_some()
    }

    pub fn is_empty(&self) -> bool {
        self.models.is_empty()
    }

    /// First recommended entry, else the first entry, else the built-in fallback.
    pub fn get_recommended_or_first(&self) -> &'static ModelDescriptor {
        self.models
            .iter()
            .find(|m| m.recommended)
            .or_else(|| self.models.first())
            .unwrap_or(&FALLBACK_MODEL)
    }
}

impl Default for ModelRegistry {
    fn default() -> Self {
        Self::builtin()
    }
}
