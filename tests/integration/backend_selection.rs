//! Integration tests for backend kind selection

use crate::integration::test_utils::{keyed_providers, profile_json, RecordingResolver, ScriptedBackend};
use prompter::assembler::PromptAssembler;
use prompter::docs::StaticDocs;
use prompter::error::PrompterError;
use prompter::profile::Profile;
use prompter::provider::{ModelProvider, ProviderFactory, ProviderType};
use std::sync::Arc;

fn assemble(
    profile: Profile,
    resolver: &RecordingResolver,
) -> Result<PromptAssembler, PrompterError> {
    let docs = Arc::new(StaticDocs::default());
    PromptAssembler::from_profile(profile, &keyed_providers(), resolver, docs.clone(), docs, None)
}

fn resolver() -> RecordingResolver {
    RecordingResolver::new(Arc::new(ScriptedBackend::new("any")))
}

#[test]
fn test_gemini_selector_picks_gemini_variant() {
    let resolver = resolver();
    let profile = Profile::from_json(&profile_json("gemini-1.5-flash"), "").unwrap();
    assemble(profile, &resolver).unwrap();

    let requested = resolver.requested();
    assert_eq!(requested.len(), 1);
    assert_eq!(requested[0].provider_type(), ProviderType::Gemini);
    match &requested[0] {
        ModelProvider::Gemini { model, api_key, .. } => {
            assert_eq!(model, "gemini-1.5-flash");
            assert_eq!(api_key, "gemini-test-key");
        }
        other => panic!("expected Gemini, got {:?}", other),
    }
}

#[test]
fn test_gpt_selector_picks_openai_variant() {
    let resolver = resolver();
    let profile = Profile::from_json(&profile_json("gpt-4o-mini"), "").unwrap();
    assemble(profile, &resolver).unwrap();

    let requested = resolver.requested();
    assert!(matches!(
        &requested[0],
        ModelProvider::OpenAI { model, api_key, .. }
            if model == "gpt-4o-mini" && api_key == "openai-test-key"
    ));
}

#[test]
fn test_explicit_provider_overrides_inference() {
    let resolver = resolver();
    let mut profile = Profile::from_json(&profile_json("gpt-compatible-proxy"), "").unwrap();
    profile.provider = Some("gemini".to_string());
    assemble(profile, &resolver).unwrap();

    assert_eq!(resolver.requested()[0].provider_type(), ProviderType::Gemini);
}

#[test]
fn test_unknown_selector_fails_construction() {
    let resolver = resolver();
    let profile = Profile::from_json(&profile_json("claude-3-opus"), "").unwrap();

    match assemble(profile, &resolver) {
        Err(PrompterError::UnknownModel(model)) => assert_eq!(model, "claude-3-opus"),
        Err(other) => panic!("unexpected error: {}", other),
        Ok(_) => panic!("unknown selector must fail"),
    }
    assert!(resolver.requested().is_empty());
}

#[test]
fn test_unknown_explicit_provider_fails_construction() {
    let resolver = resolver();
    let mut profile = Profile::from_json(&profile_json("gpt-4"), "").unwrap();
    profile.provider = Some("Gemini".to_string());

    let err = assemble(profile, &resolver).err().unwrap();
    assert!(matches!(err, PrompterError::UnknownProviderType(ref p) if p == "Gemini"));
    assert!(err.is_fatal_config());
}

#[test]
fn test_factory_builds_http_clients() {
    let gemini = ProviderFactory::create_client(&ModelProvider::Gemini {
        model: "gemini-1.5-flash".to_string(),
        api_key: "k".to_string(),
        base_url: None,
        embedding_model: None,
    })
    .unwrap();
    assert_eq!(gemini.provider_name(), "gemini");
    assert_eq!(gemini.model_name(), "gemini-1.5-flash");

    let openai = ProviderFactory::create_client(&ModelProvider::OpenAI {
        model: "gpt-4o-mini".to_string(),
        api_key: "k".to_string(),
        base_url: Some("http://localhost:8080/v1".to_string()),
        embedding_model: None,
    })
    .unwrap();
    assert_eq!(openai.provider_name(), "openai");
    assert_eq!(openai.model_name(), "gpt-4o-mini");
}
