//! Integration tests for the full profile → resolve → dispatch pipeline

use crate::integration::test_utils::{keyed_providers, write_profile, RecordingResolver, ScriptedBackend};
use prompter::assembler::{PromptAssembler, GOAL_REQUEST};
use prompter::docs::StaticDocs;
use prompter::error::PrompterError;
use prompter::example_store::LoadPhase;
use prompter::profile::{Profile, ProfileStore};
use prompter::prompt::{GoalContext, GoalType, HistoryEntry};
use prompter::provider::{ChatMessage, MessageRole};
use std::sync::Arc;
use tempfile::TempDir;

fn build(
    dir: &TempDir,
    backend: Arc<ScriptedBackend>,
    select_num: usize,
) -> PromptAssembler {
    let profile = Profile::load(&write_profile(dir.path(), "gpt-4o-mini")).unwrap();
    let docs = Arc::new(StaticDocs::new(
        "Health: 20/20",
        "!goToPlayer: go to a player",
        "skills.collectBlock(bot, type, num)",
    ));
    let store = ProfileStore::new(dir.path().join("bots"));
    PromptAssembler::from_profile(
        profile,
        &keyed_providers(),
        &RecordingResolver::new(backend),
        docs.clone(),
        docs,
        Some(&store),
    )
    .unwrap()
    .with_select_num(select_num)
}

#[tokio::test]
async fn test_conversation_round_trip() {
    let dir = TempDir::new().unwrap();
    let backend = Arc::new(ScriptedBackend::new("gpt-4o-mini").reply("Sure! !attack('zombie')"));
    let assembler = build(&dir, backend.clone(), 1);

    assembler.init_examples().await.unwrap();
    assert_eq!(assembler.convo_examples().phase(), LoadPhase::Loaded);

    let messages = vec![ChatMessage::user("steve: can you kill the zombie")];
    let reply = assembler.prompt_convo(&messages).await.unwrap();
    assert_eq!(reply, "Sure! !attack('zombie')");

    let requests = backend.requests();
    assert_eq!(requests.len(), 1);
    let system = &requests[0][0];
    assert_eq!(system.role, MessageRole::System);
    assert!(system.content.starts_with("You are andy, a Minecraft bot.\nHealth: 20/20\n"));
    assert!(system.content.contains("!goToPlayer: go to a player"));
    assert!(system.content.contains(
        "Examples of how to respond:\nExample 1:\nUser input: zZZn98: kill that zombie"
    ));
    assert!(!system.content.contains("Example 2:"));
    assert_eq!(&requests[0][1..], &messages[..]);

    let copy = dir.path().join("bots").join("andy").join("last_profile.json");
    assert!(copy.exists());
}

#[tokio::test]
async fn test_coding_uses_inline_coding_examples() {
    let dir = TempDir::new().unwrap();
    let backend = Arc::new(ScriptedBackend::new("gpt-4o-mini"));
    let assembler = build(&dir, backend.clone(), 2);
    assembler.init_examples().await.unwrap();

    assembler
        .prompt_coding(&[ChatMessage::user("steve: get some wood")])
        .await
        .unwrap();

    let system = &backend.requests()[0][0].content;
    assert!(system.contains("skills.collectBlock(bot, type, num)"));
    assert!(system.contains("User input: greg: collect 10 wood"));
}

#[tokio::test]
async fn test_examples_required_before_conversation() {
    let dir = TempDir::new().unwrap();
    let backend = Arc::new(ScriptedBackend::new("gpt-4o-mini"));
    let assembler = build(&dir, backend.clone(), 2);

    let err = assembler
        .prompt_convo(&[ChatMessage::user("steve: hi")])
        .await
        .unwrap_err();
    assert!(matches!(err, PrompterError::ExamplesNotLoaded(_)));
    assert!(backend.requests().is_empty());
}

#[tokio::test]
async fn test_embeddings_computed_once_per_example() {
    let dir = TempDir::new().unwrap();
    let backend = Arc::new(ScriptedBackend::new("gpt-4o-mini").with_embeddings());
    let assembler = build(&dir, backend.clone(), 2);

    assembler.init_examples().await.unwrap();
    // three conversation examples and one coding example
    assert_eq!(backend.embed_calls(), 4);

    // second init leaves both stores as they were
    assembler.init_examples().await.unwrap();
    assert_eq!(backend.embed_calls(), 4);

    assembler
        .prompt_convo(&[ChatMessage::user("steve: hello")])
        .await
        .unwrap();
    assert_eq!(backend.embed_calls(), 5);

    // a conversation with no user turns has nothing to embed
    assembler
        .prompt_convo(&[ChatMessage::system("andy joined the game")])
        .await
        .unwrap();
    assert_eq!(backend.embed_calls(), 5);
}

#[tokio::test]
async fn test_memory_saving_sends_empty_transcript() {
    let dir = TempDir::new().unwrap();
    let backend = Arc::new(ScriptedBackend::new("gpt-4o-mini").reply("Steve wants wood."));
    let assembler = build(&dir, backend.clone(), 2);

    let to_summarize = vec![
        ChatMessage::user("steve: bring me wood"),
        ChatMessage::assistant("On it!"),
    ];
    let reply = assembler
        .prompt_mem_saving(None, &to_summarize)
        .await
        .unwrap();
    assert_eq!(reply, "Steve wants wood.");

    let request = &backend.requests()[0];
    assert_eq!(request.len(), 1);
    assert_eq!(
        request[0].content,
        "You are andy. Old memory: None.\nSummarize:\nUser input: steve: bring me wood\nYour output:\nOn it!"
    );
}

#[tokio::test]
async fn test_goal_selection_round_trip() {
    let dir = TempDir::new().unwrap();
    let backend = Arc::new(ScriptedBackend::new("gpt-4o-mini").reply("!goal('iron_pickaxe')"));
    let assembler = build(&dir, backend.clone(), 2);

    let history = vec![
        HistoryEntry::new("steve", "nice house"),
        HistoryEntry::new("andy", "thanks"),
    ];
    let buildings = vec!["wall".to_string(), "roof".to_string()];
    let reply = assembler
        .prompt_goal(&GoalContext {
            history: &history,
            prev_goal: Some("house"),
            prev_success: Some(false),
            prev_goal_type: Some(GoalType::Building),
            buildings: &buildings,
        })
        .await
        .unwrap();
    assert_eq!(reply, "!goal('iron_pickaxe')");

    let request = &backend.requests()[0];
    assert_eq!(
        request[0].content,
        "You are andy. Last goal: building a house, you have not succeeded. Built: wall, roof\nsteve: nice house\nandy: thanks"
    );
    assert_eq!(request[1..], [ChatMessage::user(GOAL_REQUEST)]);
}

#[tokio::test]
async fn test_backend_failure_propagates_unchanged() {
    let dir = TempDir::new().unwrap();
    let backend = Arc::new(
        ScriptedBackend::new("gpt-4o-mini")
            .fail(PrompterError::ProviderRateLimit("slow down".to_string())),
    );
    let assembler = build(&dir, backend.clone(), 2);

    let err = assembler
        .prompt_mem_saving(Some("old"), &[])
        .await
        .unwrap_err();
    assert!(matches!(err, PrompterError::ProviderRateLimit(msg) if msg == "slow down"));
    assert_eq!(backend.requests().len(), 1);
}

#[tokio::test]
async fn test_concurrent_prompts_share_one_assembler() {
    let dir = TempDir::new().unwrap();
    let backend = Arc::new(ScriptedBackend::new("gpt-4o-mini"));
    let assembler = Arc::new(build(&dir, backend.clone(), 2));
    assembler.init_examples().await.unwrap();

    let mut handles = Vec::new();
    for i in 0..8 {
        let assembler = Arc::clone(&assembler);
        handles.push(tokio::spawn(async move {
            let messages = vec![ChatMessage::user(format!("player{}: hello", i))];
            assembler.prompt_convo(&messages).await
        }));
    }
    for handle in handles {
        assert_eq!(handle.await.unwrap().unwrap(), "scripted reply");
    }

    let requests = backend.requests();
    assert_eq!(requests.len(), 8);
    let first_system = &requests[0][0].content;
    assert!(requests.iter().all(|r| r[0].content.starts_with("You are andy")));
    assert!(first_system.contains("Examples of how to respond:"));
}
