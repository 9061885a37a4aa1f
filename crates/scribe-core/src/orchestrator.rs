//! Generation orchestrator
//!
//! Sequences the required content call and the optional style call as an
//! explicit state machine:
//!
//! ```text
//! Idle -> ContentPending -> ContentReady -> StylePending -> Done
//!              |                                  |
//!              v                                  +-- (style failure) --> Done, no style
//!            Failed
//! ```
//!
//! `Failed` is terminal and only reachable from `ContentPending`. A style
//! failure never leaves the happy path; it lands in `Done` with
//! `writing_style = None`.

use crate::config::{duration_ms, GenerationConfig};
use crate::error::GenerationError;
use crate::generation::{GenerationRequest, GenerationService};
use crate::prompt::PromptComposer;
use crate::types::ComposedPrompt;
use std::sync::Arc;
use std::time::Duration;

/// Discriminant of [`GenerationState`], used for the transition table
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum GenerationPhase {
    /// Nothing issued yet
    Idle,
    /// Content call in flight
    ContentPending,
    /// Content received
    ContentReady,
    /// Style call in flight
    StylePending,
    /// Finished, content available
    Done,
    /// Content stage failed
    Failed,
}

impl GenerationPhase {
    /// Check if no further transition is possible
    #[inline]
    #[must_use]
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Done | Self::Failed)
    }
}

/// Transitions permitted out of a phase
#[must_use]
pub fn allowed_transitions(from: GenerationPhase) -> &'static [GenerationPhase] {
    use self::GenerationPhase::*;
    match from {
        Idle => &[ContentPending],
        ContentPending => &[ContentReady, Failed],
        ContentReady => &[StylePending],
        StylePending => &[Done],
        Done | Failed => &[],
    }
}

/// Validate a phase transition
///
/// # Errors
/// `GenerationError::Internal` naming both phases when the edge does not exist
pub fn validate_transition(
    from: GenerationPhase,
    to: GenerationPhase,
) -> Result<(), GenerationError> {
    if allowed_transitions(from).contains(&to) {
        Ok(())
    } else {
        Err(GenerationError::Internal(format!(
            "illegal generation transition {from:?} -> {to:?}"
        )))
    }
}

/// Tagged generation state
#[derive(Debug, Clone, PartialEq)]
pub enum GenerationState {
    /// Nothing issued yet
    Idle,
    /// Content call in flight
    ContentPending,
    /// Content received
    ContentReady {
        /// Trimmed copy
        content: String,
    },
    /// Style call in flight
    StylePending {
        /// Trimmed copy
        content: String,
    },
    /// Finished
    Done {
        /// Trimmed copy
        content: String,
        /// Style description, `None` when the style stage degraded
        writing_style: Option<String>,
    },
    /// Content stage failed
    Failed {
        /// Why the content call failed
        error: GenerationError,
    },
}

impl GenerationState {
    /// Discriminant of this state
    #[must_use]
    pub fn phase(&self) -> GenerationPhase {
        match self {
            Self::Idle => GenerationPhase::Idle,
            Self::ContentPending => GenerationPhase::ContentPending,
            Self::ContentReady { .. } => GenerationPhase::ContentReady,
            Self::StylePending { .. } => GenerationPhase::StylePending,
            Self::Done { .. } => GenerationPhase::Done,
            Self::Failed { .. } => GenerationPhase::Failed,
        }
    }
}

/// Completed run: terminal state plus the path taken to reach it
#[derive(Debug, Clone, PartialEq)]
pub struct GenerationRun {
    /// Terminal state (`Done` or `Failed`)
    pub state: GenerationState,
    /// Every phase visited, starting with `Idle`
    pub history: Vec<GenerationPhase>,
}

impl GenerationRun {
    /// Content and style, or the content-stage error
    ///
    /// # Errors
    /// The `GenerationError` that moved the run to `Failed`
    pub fn into_output(self) -> Result<GenerationOutput, GenerationError> {
        match self.state {
            GenerationState::Done {
                content,
                writing_style,
            } => Ok(GenerationOutput {
                content,
                writing_style,
            }),
            GenerationState::Failed { error } => Err(error),
            other => Err(GenerationError::Internal(format!(
                "run ended in non-terminal phase {:?}",
                other.phase()
            ))),
        }
    }
}

/// Output of a successful run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GenerationOutput {
    /// Generated copy
    pub content: String,
    /// Style description
    pub writing_style: Option<String>,
}

/// Call parameters for both stages
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GenerationParams {
    /// Content call temperature
    pub temperature: f32,
    /// Content call output ceiling
    pub max_output_tokens: u32,
    /// Style call output ceiling
    pub style_max_tokens: u32,
    /// Content call budget
    pub content_timeout: Duration,
    /// Style call budget
    pub style_timeout: Duration,
}

impl From<&GenerationConfig> for GenerationParams {
    fn from(config: &GenerationConfig) -> Self {
        Self {
            temperature: config.temperature,
            max_output_tokens: config.max_output_tokens,
            style_max_tokens: config.style_max_tokens,
            content_timeout: config.content_timeout(),
            style_timeout: config.style_timeout(),
        }
    }
}

impl Default for GenerationParams {
    fn default() -> Self {
        Self::from(&GenerationConfig::default())
    }
}

/// Style call temperature; descriptions should be steady, not creative
const STYLE_TEMPERATURE: f32 = 0.2;

/// Drives one request through the two generation stages
#[derive(Clone)]
pub struct GenerationOrchestrator {
    service: Arc<dyn GenerationService>,
    params: GenerationParams,
}

impl GenerationOrchestrator {
    /// Create orchestrator
    #[inline]
    #[must_use]
    pub fn new(service: Arc<dyn GenerationService>, params: GenerationParams) -> Self {
        Self { service, params }
    }

    /// Call parameters in force
    #[inline]
    #[must_use]
    pub fn params(&self) -> &GenerationParams {
        &self.params
    }

    /// Run the state machine to a terminal state
    ///
    /// Every transition is checked against [`allowed_transitions`].
    pub async fn run(&self, prompt: &ComposedPrompt) -> GenerationRun {
        let mut state = GenerationState::Idle;
        let mut history = vec![GenerationPhase::Idle];

        while !state.phase().is_terminal() {
            let from = state.phase();
            let next = self.step(state, prompt).await;

            if let Err(e) = validate_transition(from, next.phase()) {
                tracing::error!(error = %e, "generation run left its transition table");
                history.push(GenerationPhase::Failed);
                return GenerationRun {
                    state: GenerationState::Failed { error: e },
                    history,
                };
            }

            history.push(next.phase());
            state = next;
        }

        GenerationRun { state, history }
    }

    async fn step(&self, state: GenerationState, prompt: &ComposedPrompt) -> GenerationState {
        match state {
            GenerationState::Idle => GenerationState::ContentPending,
            GenerationState::ContentPending => match self.request_content(prompt).await {
                Ok(content) => GenerationState::ContentReady { content },
                Err(error) => {
                    tracing::error!(error = %error, "content stage failed");
                    GenerationState::Failed { error }
                }
            },
            GenerationState::ContentReady { content } => GenerationState::StylePending { content },
            GenerationState::StylePending { content } => {
                let writing_style = match self.request_style(&content).await {
                    Ok(style) => Some(style),
                    Err(e) => {
                        tracing::warn!(error = %e, "style stage failed, continuing without it");
                        None
                    }
                };
                GenerationState::Done {
                    content,
                    writing_style,
                }
            }
            terminal @ (GenerationState::Done { .. } | GenerationState::Failed { .. }) => terminal,
        }
    }

    async fn request_content(&self, prompt: &ComposedPrompt) -> Result<String, GenerationError> {
        let request = GenerationRequest::from_prompt(
            prompt,
            self.params.temperature,
            self.params.max_output_tokens,
        );
        tracing::debug!(
            system_chars = request.system_prompt.len(),
            user_chars = request.user_prompt.len(),
            "requesting content"
        );

        let text = bounded(
            self.params.content_timeout,
            self.service.generate_content(request),
        )
        .await?;
        non_empty(text)
    }

    async fn request_style(&self, content: &str) -> Result<String, GenerationError> {
        let prompt = PromptComposer::compose_style_analysis(content);
        let request = GenerationRequest::from_prompt(
            &prompt,
            STYLE_TEMPERATURE,
            self.params.style_max_tokens,
        );

        let text = bounded(self.params.style_timeout, self.service.describe_style(request)).await?;
        non_empty(text)
    }
}

impl std::fmt::Debug for GenerationOrchestrator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GenerationOrchestrator")
            .field("params", &self.params)
            .finish_non_exhaustive()
    }
}

pub(crate) async fn bounded<F>(budget: Duration, call: F) -> Result<String, GenerationError>
where
    F: std::future::Future<Output = Result<String, GenerationError>>,
{
    match tokio::time::timeout(budget, call).await {
        Ok(result) => result,
        Err(_) => Err(GenerationError::Timeout {
            after_ms: duration_ms(budget),
        }),
    }
}

pub(crate) fn non_empty(text: String) -> Result<String, GenerationError> {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        Err(GenerationError::EmptyOutput)
    } else {
        Ok(trimmed.to_string())
    }
}
