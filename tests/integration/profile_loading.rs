//! Integration tests for profile files, example references and the saved copy

use crate::integration::test_utils::{profile_json, write_profile};
use prompter::error::{PrompterError, StorageError};
use prompter::profile::{ExampleSetRef, Profile, ProfileStore, LAST_PROFILE_FILE};
use prompter::prompt::PromptKind;
use tempfile::TempDir;

#[test]
fn test_load_profile_and_resolve_example_file() {
    let dir = TempDir::new().unwrap();
    let profile = Profile::load(&write_profile(dir.path(), "gpt-4o-mini")).unwrap();

    assert_eq!(profile.name, "andy");
    assert!(profile.template(PromptKind::GoalSelect).contains("$GOAL_TYPE"));
    assert!(matches!(profile.conversation_examples, ExampleSetRef::Path(_)));

    let convo = profile
        .resolve_examples(&profile.conversation_examples)
        .unwrap();
    assert_eq!(convo.len(), 3);
    let coding = profile.resolve_examples(&profile.coding_examples).unwrap();
    assert_eq!(coding.len(), 1);
}

#[test]
fn test_missing_profile_file() {
    let dir = TempDir::new().unwrap();
    let err = Profile::load(&dir.path().join("nobody.json")).unwrap_err();
    assert!(matches!(
        err,
        PrompterError::StorageError(StorageError::NotFound(_))
    ));
}

#[test]
fn test_malformed_example_file() {
    let dir = TempDir::new().unwrap();
    let path = write_profile(dir.path(), "gpt-4o-mini");
    std::fs::write(dir.path().join("examples").join("conversation.json"), "{not json").unwrap();

    let profile = Profile::load(&path).unwrap();
    let err = profile
        .resolve_examples(&profile.conversation_examples)
        .unwrap_err();
    assert!(matches!(err, PrompterError::Serialization(_)));
}

#[test]
fn test_saved_copy_preserves_profile() {
    let dir = TempDir::new().unwrap();
    let profile = Profile::from_json(&profile_json("gemini-pro"), dir.path()).unwrap();
    let store = ProfileStore::new(dir.path().join("bots"));

    let path = store.persist(&profile).unwrap();
    assert!(path.ends_with(format!("andy/{}", LAST_PROFILE_FILE)));

    let reloaded = Profile::load(&path).unwrap();
    assert_eq!(reloaded.name, profile.name);
    assert_eq!(reloaded.model, "gemini-pro");
    assert_eq!(reloaded.goal_select, profile.goal_select);
    assert_eq!(reloaded.coding_examples, profile.coding_examples);
}

#[test]
fn test_saved_copy_overwrites_previous() {
    let dir = TempDir::new().unwrap();
    let store = ProfileStore::new(dir.path());
    let mut profile = Profile::from_json(&profile_json("gpt-4"), "").unwrap();
    store.persist(&profile).unwrap();

    profile.model = "gpt-4o".to_string();
    let path = store.persist(&profile).unwrap();
    let content = std::fs::read_to_string(path).unwrap();
    assert!(content.contains("\"gpt-4o\""));
    assert!(!content.contains("\"gpt-4\""));
}
