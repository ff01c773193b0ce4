#![warn(missing_docs)]
//! Completion addon for `quill-core`.
//!
//! The core's text view produces a [`CompletionContext`] when the caret
//! moves or text changes; this crate turns those snapshots into candidate
//! lists. Completors register with a [`Trigger`] (explicit trigger
//! characters plus an optional key binding); identifier-class input
//! activates any completor automatically. Suggestion runs execute off the
//! UI thread through a deferred runner so fast typing does not pile up
//! work, and results come back over a channel the host polls each frame.
//!
//! ```rust
//! use quill_completion::{
//!     CompletionCandidate, CompletionEngine, Completor, Trigger,
//! };
//! use quill_core::CompletionContext;
//! use std::sync::Arc;
//!
//! struct Keywords;
//!
//! impl Completor for Keywords {
//!     fn trigger(&self) -> Trigger {
//!         Trigger::default()
//!     }
//!
//!     fn suggest(&self, ctx: &CompletionContext) -> Vec<CompletionCandidate> {
//!         ["fn", "for", "false"]
//!             .iter()
//!             .filter(|kw| kw.starts_with(&ctx.prefix))
//!             .map(|kw| CompletionCandidate {
//!                 label: kw.to_string(),
//!                 insert_text: kw.to_string(),
//!                 ..CompletionCandidate::default()
//!             })
//!             .collect()
//!     }
//! }
//!
//! let mut engine = CompletionEngine::new();
//! engine.add_completor(Arc::new(Keywords)).unwrap();
//!
//! let ctx = CompletionContext {
//!     prefix: "f".to_string(),
//!     input: "f".to_string(),
//!     rune_index: 1,
//!     ..CompletionContext::default()
//! };
//! engine.on_text(&ctx);
//! assert!(engine.is_active());
//! ```

use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;

use quill_core::{is_symbol_char, CompletionContext};

mod runner;
mod session;

pub use runner::DeferredRunner;

use session::Session;

/// Errors returned when registering completors.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum CompletionError {
    /// Two completors registered the same key binding.
    #[error("duplicated key binding")]
    DuplicateKeyBinding,
}

/// A key chord that activates a completor explicitly.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct KeyBinding {
    /// Key name, e.g. `"Space"`.
    pub name: String,
    /// Modifier bits, host-defined.
    pub modifiers: u32,
}

/// What starts (and sustains) a completion for one completor.
#[derive(Debug, Clone, Default)]
pub struct Trigger {
    /// Explicit trigger characters (e.g. `"."`, `"::"`). Identifier-class
    /// input triggers regardless.
    pub characters: Vec<String>,
    /// Optional key binding that activates the completor directly.
    pub key_binding: Option<KeyBinding>,
}

impl Trigger {
    /// Whether `input` activates this trigger, and how.
    fn activate_on_input(&self, input: &str) -> Option<TriggerKind> {
        if self.characters.iter().any(|c| c == input) {
            return Some(TriggerKind::Character);
        }
        if input.chars().next().is_some_and(is_symbol_char) {
            return Some(TriggerKind::Auto);
        }
        None
    }

    /// Whether `binding` activates this trigger.
    fn activate_on_key(&self, binding: &KeyBinding) -> bool {
        self.key_binding.as_ref() == Some(binding)
    }
}

/// How a session was started.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TriggerKind {
    /// Identifier-class input.
    Auto,
    /// An explicit trigger character.
    Character,
    /// A registered key binding.
    Key,
}

/// One completion suggestion.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompletionCandidate {
    /// Label shown in the candidate list.
    pub label: String,
    /// Text inserted on confirmation.
    pub insert_text: String,
    /// Secondary description (type signature, documentation line).
    pub description: String,
    /// Candidate kind tag ("function", "keyword", ...).
    pub kind: String,
}

/// A source of completion candidates.
///
/// Completors run on a background thread; implementations must be cheap to
/// share and free of interior references into the editor.
pub trait Completor: Send + Sync {
    /// The trigger this completor registers.
    fn trigger(&self) -> Trigger;

    /// Produce candidates for the given context.
    fn suggest(&self, ctx: &CompletionContext) -> Vec<CompletionCandidate>;
}

/// Schedules completors, tracks the active session and collects candidates.
pub struct CompletionEngine {
    completors: Vec<Arc<dyn Completor>>,
    runner: DeferredRunner<CompletionCandidate>,
    session: Option<Session>,
    candidates: Vec<CompletionCandidate>,
}

impl CompletionEngine {
    /// Create an engine that runs completors without delay.
    pub fn new() -> Self {
        Self::with_delay(Duration::ZERO)
    }

    /// Create an engine that waits out `delay` after the last keystroke
    /// before running a completor.
    pub fn with_delay(delay: Duration) -> Self {
        Self {
            completors: Vec::new(),
            runner: DeferredRunner::new(delay),
            session: None,
            candidates: Vec::new(),
        }
    }

    /// Change the quiet period applied after each keystroke.
    pub fn set_delay(&mut self, delay: Duration) {
        self.runner.set_delay(delay);
    }

    /// Register a completor. Registering a second completor with the same
    /// key binding fails.
    pub fn add_completor(&mut self, completor: Arc<dyn Completor>) -> Result<(), CompletionError> {
        if let Some(binding) = completor.trigger().key_binding {
            let duplicate = self
                .completors
                .iter()
                .any(|existing| existing.trigger().key_binding.as_ref() == Some(&binding));
            if duplicate {
                return Err(CompletionError::DuplicateKeyBinding);
            }
        }
        self.completors.push(completor);
        Ok(())
    }

    /// Feed a keystroke context. Starts a session when a trigger activates,
    /// sustains the current one otherwise; empty input cancels.
    pub fn on_text(&mut self, ctx: &CompletionContext) {
        if ctx.input.is_empty() {
            self.cancel();
            return;
        }

        if self.session.as_ref().is_none_or(|s| !s.is_valid()) {
            let activated = self.completors.iter().enumerate().find_map(|(idx, c)| {
                c.trigger().activate_on_input(&ctx.input).map(|kind| (idx, kind))
            });
            let Some((idx, kind)) = activated else {
                return;
            };
            self.session = Some(Session::new(idx, kind));
        }

        let Some(session) = self.session.as_mut() else {
            return;
        };
        let trigger = self.completors[session.completor].trigger();
        session.update(&trigger, ctx);
        if !session.is_valid() {
            return;
        }

        let completor = Arc::clone(&self.completors[session.completor]);
        let ctx = session.context().clone();
        self.runner.run(move || completor.suggest(&ctx));
    }

    /// Activate the completor registered for `binding`, canceling any
    /// current session, and run it without delay.
    pub fn on_key(&mut self, binding: &KeyBinding, ctx: &CompletionContext) {
        self.cancel();

        let Some(idx) = self
            .completors
            .iter()
            .position(|c| c.trigger().activate_on_key(binding))
        else {
            return;
        };

        let mut session = Session::new(idx, TriggerKind::Key);
        let trigger = self.completors[idx].trigger();
        session.update(&trigger, ctx);
        self.session = Some(session);

        let completor = Arc::clone(&self.completors[idx]);
        let ctx = ctx.clone();
        self.runner.run_now(move || completor.suggest(&ctx));
    }

    /// Collect any finished suggestion run into the candidate list. An
    /// empty result cancels the session. Returns the current candidates.
    pub fn poll_candidates(&mut self) -> &[CompletionCandidate] {
        if let Some(items) = self.runner.try_recv() {
            self.candidates = items;
            if self.candidates.is_empty() {
                self.cancel();
            }
        }
        &self.candidates
    }

    /// Whether a session is active.
    pub fn is_active(&self) -> bool {
        self.session.as_ref().is_some_and(|s| s.is_valid())
    }

    /// How the active session was triggered, if one is active.
    pub fn session_kind(&self) -> Option<TriggerKind> {
        self.session
            .as_ref()
            .filter(|s| s.is_valid())
            .map(|s| s.kind)
    }

    /// Text typed since the active session was triggered.
    pub fn session_text(&self) -> Option<&str> {
        self.session
            .as_ref()
            .filter(|s| s.is_valid())
            .map(|s| s.buffered_text())
    }

    /// Confirm candidate `index`, ending the session. Returns the candidate
    /// and the rune range of the session input the host should replace with
    /// the candidate's `insert_text`.
    pub fn confirm(&mut self, index: usize) -> Option<(CompletionCandidate, (usize, usize))> {
        let session = self.session.as_ref()?;
        let range = session.prefix_range();
        let candidate = self.candidates.get(index)?.clone();
        self.cancel();
        Some((candidate, range))
    }

    /// Cancel the session and drop the collected candidates.
    pub fn cancel(&mut self) {
        if let Some(session) = self.session.as_mut() {
            session.invalidate();
        }
        self.session = None;
        self.candidates.clear();
    }
}

impl Default for CompletionEngine {
    fn default() -> Self {
        Self::new()
    }
}
