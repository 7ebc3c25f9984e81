// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use crate::fake::FakeAdapterRecorder;
use crate::{AdapterContext, AdapterSettings};
use relay_core::SessionId;
use std::sync::Arc;

fn test_context() -> AdapterContext {
    AdapterContext {
        session_id: SessionId::from_string("sess-registry"),
        output_callback: Arc::new(|_, _| {}),
        event_callback: Arc::new(|_, _| {}),
        settings: AdapterSettings::default(),
    }
}

#[yare::parameterized(
    python     = { "python", Some(Language::Python) },
    javascript = { "javascript", Some(Language::Javascript) },
    typescript = { "typescript", Some(Language::Typescript) },
    go         = { "go", Some(Language::Go) },
    rust       = { "rust", Some(Language::Rust) },
    c          = { "c", Some(Language::C) },
    cpp        = { "cpp", Some(Language::Cpp) },
    cpp_alias  = { "c++", Some(Language::Cpp) },
    mixed_case = { "Python", Some(Language::Python) },
    unknown    = { "cobol", None },
)]
fn language_parse(tag: &str, expected: Option<Language>) {
    assert_eq!(Language::parse(tag), expected);
}

#[test]
fn defaults_cover_every_language() {
    let registry = AdapterRegistry::with_defaults();
    for language in Language::all() {
        assert!(
            registry.is_supported(&language.to_string()),
            "no default driver for {language}"
        );
    }
}

#[test]
fn create_constructs_the_registered_driver() {
    let recorder = FakeAdapterRecorder::new();
    let registry = recorder.registry();

    let adapter = registry.create("python", test_context()).expect("create failed");
    assert_eq!(adapter.language(), Language::Python);
    assert_eq!(recorder.created_count(), 1);
    assert!(recorder.last().is_some());
}

#[test]
fn unknown_language_is_unsupported() {
    let registry = AdapterRegistry::with_defaults();
    let err = registry.create("cobol", test_context()).expect_err("expected failure");
    assert_eq!(err.code(), "UNSUPPORTED_LANGUAGE");
    assert!(err.to_string().contains("cobol"));
    assert!(err.to_string().contains("python"));
}

#[test]
fn known_language_without_driver_is_unsupported() {
    let registry = AdapterRegistry::new();
    let err = registry.create("python", test_context()).expect_err("expected failure");
    assert_eq!(err.code(), "UNSUPPORTED_LANGUAGE");
    assert!(!registry.is_supported("python"));
}

#[test]
fn supported_lists_sorted_tags() {
    let registry = AdapterRegistry::with_defaults();
    let supported = registry.supported();
    let mut sorted = supported.clone();
    sorted.sort();
    assert_eq!(supported, sorted);
    assert_eq!(supported.len(), Language::all().len());
}
