//! Property-based tests for resolution identity, idempotence and exact tokens

use prompter::docs::StaticDocs;
use prompter::prompt::{ConversationContext, GoalContext, PromptResolver};
use proptest::prelude::*;
use std::sync::Arc;

fn resolver() -> PromptResolver {
    let docs = Arc::new(StaticDocs::new("hp: 20", "!stats", "skills.craft()"));
    PromptResolver::new("andy", docs.clone(), docs)
}

fn block_on<F: std::future::Future>(future: F) -> F::Output {
    tokio::runtime::Builder::new_current_thread()
        .build()
        .unwrap()
        .block_on(future)
}

/// A template where `$` is never followed by an uppercase letter or
/// underscore resolves to itself with no warnings.
#[test]
fn test_no_placeholder_identity_property() {
    let mut runner = proptest::test_runner::TestRunner::default();
    let r = resolver();

    runner
        .run(&"([a-zA-Z0-9 .,:!?\n]|\\$[0-9a-z ]){0,120}", |template| {
            let resolved = block_on(r.resolve(&template, &ConversationContext::default())).unwrap();
            prop_assert_eq!(&resolved.text, &template);
            prop_assert!(resolved.unresolved.is_empty());

            let goal = r.resolve_goal(&template, &GoalContext::default());
            prop_assert_eq!(&goal.text, &template);
            Ok(())
        })
        .unwrap();
}

/// Resolving the same template with the same context twice gives the same
/// result, including for unknown tokens.
#[test]
fn test_resolution_idempotence_property() {
    let mut runner = proptest::test_runner::TestRunner::default();
    let r = resolver();
    let pieces = prop::collection::vec(
        prop_oneof![
            Just("$NAME".to_string()),
            Just("$STATS".to_string()),
            Just("$MEMORY".to_string()),
            Just("$GOAL".to_string()),
            Just("$GOAL_TYPE".to_string()),
            Just("$FOO_BAR".to_string()),
            "[a-z ]{0,12}",
        ],
        0..12,
    );

    runner
        .run(&(pieces, proptest::option::of("[a-z ]{0,20}")), |(pieces, memory)| {
            let template = pieces.concat();
            let ctx = ConversationContext::default().with_memory(memory.as_deref());

            let first = block_on(r.resolve(&template, &ctx)).unwrap();
            let second = block_on(r.resolve(&template, &ctx)).unwrap();
            prop_assert_eq!(&first, &second);

            let goal_ctx = GoalContext {
                prev_goal: memory.as_deref(),
                ..Default::default()
            };
            prop_assert_eq!(
                r.resolve_goal(&template, &goal_ctx),
                r.resolve_goal(&template, &goal_ctx)
            );
            Ok(())
        })
        .unwrap();
}

/// `$GOAL` is never substituted into the front of `$GOAL_TYPE`.
#[test]
fn test_goal_type_exact_token_property() {
    let mut runner = proptest::test_runner::TestRunner::default();
    let r = resolver();

    runner
        .run(&"[a-z_]{1,16}", |goal| {
            let ctx = GoalContext {
                prev_goal: Some(goal.as_str()),
                ..Default::default()
            };
            let resolved = r.resolve_goal("$GOAL_TYPE|$GOAL", &ctx);
            prop_assert_eq!(resolved.text, format!("$GOAL_TYPE|{}", goal));
            prop_assert_eq!(resolved.unresolved, vec!["$GOAL_TYPE".to_string()]);
            Ok(())
        })
        .unwrap();
}
