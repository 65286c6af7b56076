//! Prompt assembly: template selection, resolution and dispatch.
//!
//! A [`PromptAssembler`] owns one profile, one backend client and the two
//! example stores for the lifetime of an agent. Every operation picks a
//! template, builds its context bundle, resolves it and sends the result to
//! the backend, returning the reply text untouched.

use crate::config::ProvidersConfig;
use crate::docs::{CommandDocsProvider, SkillDocsProvider};
use crate::error::PrompterError;
use crate::example_store::ExampleStore;
use crate::profile::{Profile, ProfileStore};
use crate::prompt::{ConversationContext, GoalContext, PromptKind, PromptResolver};
use crate::provider::{
    send_request, ChatMessage, CompletionOptions, ModelProviderClient, ProviderClientResolver,
};
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Synthetic user turn sent with every goal-selection prompt.
pub const GOAL_REQUEST: &str = "Output your next goal.";

pub struct PromptAssembler {
    profile: Profile,
    client: Arc<dyn ModelProviderClient>,
    resolver: PromptResolver,
    convo_examples: ExampleStore,
    coding_examples: ExampleStore,
    options: CompletionOptions,
}

impl PromptAssembler {
    /// Assemble from already-built collaborators.
    pub fn new(
        profile: Profile,
        client: Arc<dyn ModelProviderClient>,
        commands: Arc<dyn CommandDocsProvider>,
        skills: Arc<dyn SkillDocsProvider>,
    ) -> Self {
        let resolver = PromptResolver::new(profile.name.clone(), commands, skills);
        Self {
            convo_examples: ExampleStore::new("conversation_examples", Arc::clone(&client)),
            coding_examples: ExampleStore::new("coding_examples", Arc::clone(&client)),
            profile,
            client,
            resolver,
            options: CompletionOptions::default(),
        }
    }

    /// Build the assembler a profile describes.
    ///
    /// The profile copy is saved first when a store is given; a failed save is
    /// logged and otherwise ignored. A model name that selects no known backend
    /// is fatal.
    pub fn from_profile(
        profile: Profile,
        providers: &ProvidersConfig,
        client_resolver: &dyn ProviderClientResolver,
        commands: Arc<dyn CommandDocsProvider>,
        skills: Arc<dyn SkillDocsProvider>,
        profile_store: Option<&ProfileStore>,
    ) -> Result<Self, PrompterError> {
        if let Some(store) = profile_store {
            match store.persist(&profile) {
                Ok(path) => info!(path = %path.display(), "Copy profile saved"),
                Err(e) => warn!(
                    profile = %profile.name,
                    error = %e,
                    "Failed to save profile copy"
                ),
            }
        }

        let provider_type = profile.backend_type()?;
        let provider_config = providers.for_type(provider_type);
        let model_provider = provider_config.to_model_provider(provider_type, &profile.model)?;
        let client = client_resolver.create_provider_client(&model_provider)?;

        info!(
            profile = %profile.name,
            provider = %provider_type,
            model = %profile.model,
            "Prompt assembler ready"
        );

        Ok(Self::new(profile, client, commands, skills)
            .with_options(provider_config.default_options.clone()))
    }

    pub fn with_options(mut self, options: CompletionOptions) -> Self {
        self.options = options;
        self
    }

    /// Number of examples placed in conversation and coding prompts.
    pub fn with_select_num(mut self, select_num: usize) -> Self {
        self.convo_examples = self.convo_examples.with_select_num(select_num);
        self.coding_examples = self.coding_examples.with_select_num(select_num);
        self
    }

    pub fn name(&self) -> &str {
        &self.profile.name
    }

    pub fn profile(&self) -> &Profile {
        &self.profile
    }

    pub fn client(&self) -> &Arc<dyn ModelProviderClient> {
        &self.client
    }

    pub fn convo_examples(&self) -> &ExampleStore {
        &self.convo_examples
    }

    pub fn coding_examples(&self) -> &ExampleStore {
        &self.coding_examples
    }

    /// Load both example sets. Must complete before conversation or coding
    /// prompts that use `$EXAMPLES`.
    pub async fn init_examples(&self) -> Result<(), PrompterError> {
        info!(profile = %self.profile.name, "Loading examples");
        let convo = self
            .profile
            .resolve_examples(&self.profile.conversation_examples)?;
        self.convo_examples.load(convo).await?;
        let coding = self.profile.resolve_examples(&self.profile.coding_examples)?;
        self.coding_examples.load(coding).await?;
        info!(profile = %self.profile.name, "Examples loaded");
        Ok(())
    }

    /// Conversational reply to `messages`.
    pub async fn prompt_convo(&self, messages: &[ChatMessage]) -> Result<String, PrompterError> {
        let ctx = ConversationContext::new(messages).with_examples(&self.convo_examples);
        let system_prompt = self.resolve(PromptKind::Conversing, &ctx).await?;
        self.dispatch(messages, &system_prompt).await
    }

    /// Coding-task reply to `messages`.
    pub async fn prompt_coding(&self, messages: &[ChatMessage]) -> Result<String, PrompterError> {
        let ctx = ConversationContext::new(messages).with_examples(&self.coding_examples);
        let system_prompt = self.resolve(PromptKind::Coding, &ctx).await?;
        self.dispatch(messages, &system_prompt).await
    }

    /// Consolidate `prev_memory` with `to_summarize` into a new memory.
    pub async fn prompt_mem_saving(
        &self,
        prev_memory: Option<&str>,
        to_summarize: &[ChatMessage],
    ) -> Result<String, PrompterError> {
        let ctx = ConversationContext::default()
            .with_memory(prev_memory)
            .with_to_summarize(to_summarize);
        let system_prompt = self.resolve(PromptKind::SavingMemory, &ctx).await?;
        self.dispatch(&[], &system_prompt).await
    }

    /// Ask the model for the next goal.
    pub async fn prompt_goal(&self, ctx: &GoalContext<'_>) -> Result<String, PrompterError> {
        let resolved = self
            .resolver
            .resolve_goal(self.profile.template(PromptKind::GoalSelect), ctx);
        self.dispatch(&[ChatMessage::user(GOAL_REQUEST)], &resolved.text)
            .await
    }

    async fn resolve(
        &self,
        kind: PromptKind,
        ctx: &ConversationContext<'_>,
    ) -> Result<String, PrompterError> {
        let resolved = self.resolver.resolve(self.profile.template(kind), ctx).await?;
        debug!(
            kind = %kind,
            len = resolved.text.len(),
            unresolved = resolved.unresolved.len(),
            "Resolved prompt"
        );
        Ok(resolved.into_text())
    }

    async fn dispatch(
        &self,
        turns: &[ChatMessage],
        system_prompt: &str,
    ) -> Result<String, PrompterError> {
        send_request(self.client.as_ref(), turns, system_prompt, self.options.clone()).await
    }
}
