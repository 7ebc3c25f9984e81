// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Adapter registry: maps language identifiers to driver constructors.
//!
//! Populated once at startup; treat it as init-once configuration.

use crate::{
    AdapterContext, AdapterError, DebugAdapter, DebugpyAdapter, DelveAdapter, JsDebugAdapter,
    LldbAdapter,
};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;

/// Languages with a known adapter driver.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Language {
    Python,
    Javascript,
    Typescript,
    Go,
    Rust,
    C,
    Cpp,
}

relay_core::simple_display! {
    Language {
        Python => "python",
        Javascript => "javascript",
        Typescript => "typescript",
        Go => "go",
        Rust => "rust",
        C => "c",
        Cpp => "cpp",
    }
}

impl Language {
    pub fn all() -> &'static [Language] {
        use Language::*;
        &[Python, Javascript, Typescript, Go, Rust, C, Cpp]
    }

    /// Parse a client-supplied language tag, case-insensitively.
    pub fn parse(s: &str) -> Option<Language> {
        use Language::*;
        match s.to_ascii_lowercase().as_str() {
            "python" => Some(Python),
            "javascript" => Some(Javascript),
            "typescript" => Some(Typescript),
            "go" => Some(Go),
            "rust" => Some(Rust),
            "c" => Some(C),
            "cpp" | "c++" => Some(Cpp),
            _ => None,
        }
    }
}

/// Constructor for one driver variant.
pub type AdapterFactory = Arc<dyn Fn(AdapterContext) -> Arc<dyn DebugAdapter> + Send + Sync>;

/// Language → driver constructor map.
pub struct AdapterRegistry {
    factories: HashMap<Language, AdapterFactory>,
}

impl AdapterRegistry {
    pub fn new() -> Self {
        Self { factories: HashMap::new() }
    }

    /// Registry with every built-in driver variant registered.
    pub fn with_defaults() -> Self {
        let mut registry = Self::new();

        registry.register(Language::Python, Arc::new(|ctx| {
            Arc::new(DebugpyAdapter::new(&ctx)) as Arc<dyn DebugAdapter>
        }));

        for language in [Language::Javascript, Language::Typescript] {
            registry.register(language, Arc::new(|ctx| {
                Arc::new(JsDebugAdapter::new(&ctx)) as Arc<dyn DebugAdapter>
            }));
        }

        registry.register(Language::Go, Arc::new(|ctx| {
            Arc::new(DelveAdapter::new(&ctx)) as Arc<dyn DebugAdapter>
        }));

        for language in [Language::Rust, Language::C, Language::Cpp] {
            registry.register(language, Arc::new(|ctx| {
                Arc::new(LldbAdapter::new(&ctx)) as Arc<dyn DebugAdapter>
            }));
        }

        registry
    }

    pub fn register(&mut self, language: Language, factory: AdapterFactory) {
        self.factories.insert(language, factory);
    }

    /// Construct a driver for the language, failing unknown or unregistered
    /// languages with `UNSUPPORTED_LANGUAGE`.
    pub fn create(
        &self,
        language: &str,
        ctx: AdapterContext,
    ) -> Result<Arc<dyn DebugAdapter>, AdapterError> {
        let parsed = Language::parse(language).ok_or_else(|| self.unsupported(language))?;
        let factory = self.factories.get(&parsed).ok_or_else(|| self.unsupported(language))?;
        Ok(factory(ctx))
    }

    pub fn is_supported(&self, language: &str) -> bool {
        Language::parse(language).is_some_and(|l| self.factories.contains_key(&l))
    }

    /// Registered language tags, sorted.
    pub fn supported(&self) -> Vec<String> {
        let mut tags: Vec<String> = self.factories.keys().map(Language::to_string).collect();
        tags.sort();
        tags
    }

    fn unsupported(&self, language: &str) -> AdapterError {
        AdapterError::UnsupportedLanguage {
            language: language.to_string(),
            supported: self.supported(),
        }
    }
}

impl Default for AdapterRegistry {
    fn default() -> Self {
        Self::with_defaults()
    }
}

#[cfg(test)]
#[path = "registry_tests.rs"]
mod tests;
