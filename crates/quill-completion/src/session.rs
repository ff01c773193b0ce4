//! Completion session state.
//!
//! A session starts when a trigger activates and dies when the completion is
//! canceled or confirmed. While alive it tracks the context of the latest
//! keystroke, the text buffered since activation, and the prefix range to
//! replace on confirmation.

use crate::{Trigger, TriggerKind};
use quill_core::{is_symbol_char, CompletionContext};

/// One in-flight completion interaction.
#[derive(Debug)]
pub(crate) struct Session {
    /// Index of the activated completor in the engine's registry.
    pub completor: usize,
    pub kind: TriggerKind,
    ctx: CompletionContext,
    canceled: bool,
    /// Runes typed since the session started.
    buffer: String,
    /// Rune range of the input since activation, replaced on confirm.
    prefix_start: Option<usize>,
    prefix_end: usize,
}

impl Session {
    pub fn new(completor: usize, kind: TriggerKind) -> Self {
        Self {
            completor,
            kind,
            ctx: CompletionContext::default(),
            canceled: false,
            buffer: String::new(),
            prefix_start: None,
            prefix_end: 0,
        }
    }

    /// Fold the latest keystroke context into the session. Input outside the
    /// trigger's character set invalidates the session.
    pub fn update(&mut self, trigger: &Trigger, ctx: &CompletionContext) {
        if self.canceled {
            return;
        }

        if !ctx.input.is_empty() {
            let in_characters = trigger.characters.iter().any(|c| c == &ctx.input);
            let symbol_input = ctx.input.chars().next().is_some_and(is_symbol_char);
            if !in_characters && !symbol_input {
                self.invalidate();
                return;
            }
        }

        if self.prefix_start.is_none() {
            let input_runes = ctx.input.chars().count();
            self.prefix_start = Some(ctx.rune_index.saturating_sub(input_runes));
        }
        self.prefix_end = ctx.rune_index;
        self.buffer.push_str(&ctx.input);
        self.ctx = ctx.clone();
    }

    pub fn invalidate(&mut self) {
        self.canceled = true;
    }

    pub fn is_valid(&self) -> bool {
        !self.canceled
    }

    /// The latest context folded into the session.
    pub fn context(&self) -> &CompletionContext {
        &self.ctx
    }

    /// Text buffered since the session was triggered.
    pub fn buffered_text(&self) -> &str {
        &self.buffer
    }

    /// Rune range of the session's input, replaced when a candidate is
    /// confirmed.
    pub fn prefix_range(&self) -> (usize, usize) {
        (self.prefix_start.unwrap_or(self.prefix_end), self.prefix_end)
    }
}
