//! Few-shot example selection.
//!
//! An [`ExampleStore`] holds one example set. It is loaded exactly once; after
//! that it is read-only and may be shared by any number of concurrent
//! resolutions. Relevance is scored with provider embeddings when the backend
//! has them, and with word overlap otherwise.

use crate::error::PrompterError;
use crate::prompt::text::stringify_turns;
use crate::provider::{ChatMessage, Embedding, MessageRole, ModelProviderClient};
use futures::future::try_join_all;
use parking_lot::RwLock;
use std::collections::HashSet;
use std::sync::Arc;
use tracing::{debug, info};

/// Number of examples placed in a prompt unless configured otherwise.
pub const DEFAULT_SELECT_NUM: usize = 2;

/// One example conversation.
pub type Example = Vec<ChatMessage>;

/// Observable lifecycle of a store
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadPhase {
    Unloaded,
    Loading,
    Loaded,
}

enum LoadState {
    Unloaded,
    Loading,
    Loaded(Arc<LoadedExamples>),
}

struct LoadedExamples {
    examples: Vec<Example>,
    ranking: Ranking,
}

enum Ranking {
    /// `None` for examples with no user text; they score 0.
    Embeddings(Vec<Option<Embedding>>),
    WordOverlap(Vec<HashSet<String>>),
}

pub struct ExampleStore {
    name: String,
    client: Arc<dyn ModelProviderClient>,
    select_num: usize,
    state: RwLock<LoadState>,
}

impl ExampleStore {
    pub fn new(name: impl Into<String>, client: Arc<dyn ModelProviderClient>) -> Self {
        Self {
            name: name.into(),
            client,
            select_num: DEFAULT_SELECT_NUM,
            state: RwLock::new(LoadState::Unloaded),
        }
    }

    pub fn with_select_num(mut self, select_num: usize) -> Self {
        self.select_num = select_num;
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn phase(&self) -> LoadPhase {
        match &*self.state.read() {
            LoadState::Unloaded => LoadPhase::Unloaded,
            LoadState::Loading => LoadPhase::Loading,
            LoadState::Loaded(_) => LoadPhase::Loaded,
        }
    }

    /// Populate the store. Loading a loaded store is a no-op; loading while
    /// another load is in flight fails. A failed or cancelled load returns to
    /// `Unloaded`.
    pub async fn load(&self, examples: Vec<Example>) -> Result<(), PrompterError> {
        {
            let mut state = self.state.write();
            match &*state {
                LoadState::Loaded(_) => {
                    debug!(example_set = %self.name, "Example set already loaded");
                    return Ok(());
                }
                LoadState::Loading => {
                    return Err(PrompterError::ExamplesLoading(self.name.clone()));
                }
                LoadState::Unloaded => {}
            }
            *state = LoadState::Loading;
        }
        let pending = PendingLoad {
            state: &self.state,
            done: false,
        };

        let count = examples.len();
        let loaded = self.index(examples).await?;
        info!(
            example_set = %self.name,
            examples = count,
            embeddings = matches!(loaded.ranking, Ranking::Embeddings(_)),
            "Examples loaded"
        );
        pending.finish(loaded);
        Ok(())
    }

    async fn index(&self, examples: Vec<Example>) -> Result<LoadedExamples, PrompterError> {
        let texts: Vec<String> = examples.iter().map(|e| user_text(e)).collect();

        // The first non-empty text decides embedding support; empty texts are never embedded.
        let ranking = match texts.iter().position(|t| !t.is_empty()) {
            None => Ranking::WordOverlap(texts.iter().map(|t| word_set(t)).collect()),
            Some(first) => match self.client.embed(&texts[first]).await {
                Ok(first_embedding) => {
                    let mut embeddings = try_join_all(texts.iter().enumerate().map(
                        |(i, text)| async move {
                            if i == first || text.is_empty() {
                                Ok(None)
                            } else {
                                self.client.embed(text).await.map(Some)
                            }
                        },
                    ))
                    .await?;
                    embeddings[first] = Some(first_embedding);
                    Ranking::Embeddings(embeddings)
                }
                Err(PrompterError::EmbeddingsUnsupported(provider)) => {
                    debug!(
                        example_set = %self.name,
                        provider = %provider,
                        "Embeddings unavailable, ranking examples by word overlap"
                    );
                    Ranking::WordOverlap(texts.iter().map(|t| word_set(t)).collect())
                }
                Err(e) => return Err(e),
            },
        };

        Ok(LoadedExamples { examples, ranking })
    }

    fn loaded(&self) -> Result<Arc<LoadedExamples>, PrompterError> {
        match &*self.state.read() {
            LoadState::Loaded(loaded) => Ok(Arc::clone(loaded)),
            _ => Err(PrompterError::ExamplesNotLoaded(self.name.clone())),
        }
    }

    /// The most relevant examples for a conversation, best first.
    pub async fn select_relevant(&self, turns: &[ChatMessage]) -> Result<Vec<Example>, PrompterError> {
        let loaded = self.loaded()?;
        let query = user_text(turns);

        let scores: Vec<f32> = match &loaded.ranking {
            Ranking::Embeddings(_) if query.is_empty() => vec![0.0; loaded.examples.len()],
            Ranking::Embeddings(embeddings) => {
                let query_embedding = self.client.embed(&query).await?;
                embeddings
                    .iter()
                    .map(|e| {
                        e.as_ref()
                            .map_or(0.0, |e| cosine_similarity(&query_embedding, e))
                    })
                    .collect()
            }
            Ranking::WordOverlap(sets) => {
                let query_words = word_set(&query);
                sets.iter().map(|s| jaccard(&query_words, s)).collect()
            }
        };

        let mut order: Vec<usize> = (0..loaded.examples.len()).collect();
        // stable: equal scores keep example-set order
        order.sort_by(|&a, &b| scores[b].total_cmp(&scores[a]));

        Ok(order
            .into_iter()
            .take(self.select_num)
            .map(|i| loaded.examples[i].clone())
            .collect())
    }

    /// Render the most relevant examples as a prompt section.
    pub async fn create_example_message(
        &self,
        turns: &[ChatMessage],
    ) -> Result<String, PrompterError> {
        let selected = self.select_relevant(turns).await?;
        debug!(
            example_set = %self.name,
            selected = selected.len(),
            "Selected examples"
        );

        let mut msg = String::from("Examples of how to respond:\n");
        for (i, example) in selected.iter().enumerate() {
            msg.push_str(&format!("Example {}:\n{}\n\n", i + 1, stringify_turns(example)));
        }
        Ok(msg)
    }
}

/// Resets the store to `Unloaded` unless the load completes.
struct PendingLoad<'a> {
    state: &'a RwLock<LoadState>,
    done: bool,
}

impl PendingLoad<'_> {
    fn finish(mut self, loaded: LoadedExamples) {
        *self.state.write() = LoadState::Loaded(Arc::new(loaded));
        self.done = true;
    }
}

impl Drop for PendingLoad<'_> {
    fn drop(&mut self) {
        if !self.done {
            *self.state.write() = LoadState::Unloaded;
        }
    }
}

/// User-side text of a conversation with any `speaker:` prefix stripped.
///
/// A prefix is text before the first colon that contains no whitespace.
fn user_text(turns: &[ChatMessage]) -> String {
    let mut text = String::new();
    for turn in turns.iter().filter(|t| t.role == MessageRole::User) {
        let content = match turn.content.split_once(':') {
            Some((speaker, rest))
                if !speaker.is_empty() && !speaker.contains(char::is_whitespace) =>
            {
                rest
            }
            _ => turn.content.as_str(),
        };
        text.push_str(content.trim());
        text.push('\n');
    }
    text.trim().to_string()
}

fn word_set(text: &str) -> HashSet<String> {
    text.split(|c: char| !c.is_alphanumeric())
        .filter(|w| !w.is_empty())
        .map(|w| w.to_lowercase())
        .collect()
}

fn jaccard(a: &HashSet<String>, b: &HashSet<String>) -> f32 {
    let union = a.union(b).count();
    if union == 0 {
        return 0.0;
    }
    a.intersection(b).count() as f32 / union as f32
}

fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    let dot: f32 = a.iter().zip(b).map(|(x, y)| x * y).sum();
    let norm_a = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let norm_b = b.iter().map(|x| x * x).sum::<f32>().sqrt();
    if norm_a == 0.0 || norm_b == 0.0 {
        0.0
    } else {
        dot / (norm_a * norm_b)
    }
}
