//! Well-formedness construction.
//!
//! Single left-to-right pass over the token stream with an explicit
//! open-element stack (never language recursion, so markup nesting depth
//! cannot exhaust the call stack).
//!
//! Invariants:
//! - The stack mirrors the ancestor chain of the insertion point at every
//!   step; popping an entry always emits its end tag.
//! - The output stream is fully balanced: every start tag is closed, stray
//!   end tags are dropped, stream end closes everything left open.
//! - Auto-close never pops more entries than strictly necessary (the
//!   innermost eligible ancestor wins).
//!
//! Injector offerings happen on principal tokens (the queued token being
//! processed); structurally synthesized end tags bypass the chain, which
//! bounds injector-driven re-processing. A trail journal of stack
//! operations makes injector rollback (replace/rewind) exact.

use crate::config::Config;
use crate::context::RunContext;
use crate::diagnostics::{DiagnosticKind, Severity};
use crate::pipeline::injector::{Action, Injector, StackView};
use crate::schema::{ContentModel, ElementDef};
use crate::token::Token;
use std::collections::VecDeque;

pub const MAX_INJECTORS: usize = 32;

struct Queued {
    token: Token,
    /// Bitmask of injector indices that must not be offered this token.
    skip: u32,
}

struct Entry<'m> {
    name: String,
    line: u32,
    def: &'m ElementDef,
}

enum TrailOp<'m> {
    /// A stack push caused by the output token at `at`.
    Pushed { at: usize },
    /// A stack pop whose end tag sits in the output at `at`.
    Popped { at: usize, entry: Entry<'m> },
}

impl TrailOp<'_> {
    fn at(&self) -> usize {
        match self {
            TrailOp::Pushed { at } => *at,
            TrailOp::Popped { at, .. } => *at,
        }
    }
}

fn mask_through(index: usize) -> u32 {
    ((1u64 << (index + 1).min(32)) - 1) as u32
}

enum Decision {
    AutoClose,
    Accept,
    Reject,
}

struct Pass<'m, 'i, 'c> {
    model: &'m ContentModel,
    root_def: &'m ElementDef,
    injectors: &'i mut [Box<dyn Injector>],
    active: Vec<bool>,
    ctx: &'c mut RunContext,
    queue: VecDeque<Queued>,
    out: Vec<Token>,
    stack: Vec<Entry<'m>>,
    trail: Vec<TrailOp<'m>>,
    rewind_budget: usize,
}

impl<'m> Pass<'m, '_, '_> {
    fn drain(&mut self) {
        while let Some(queued) = self.queue.pop_front() {
            match queued.token {
                token @ Token::Start { .. } => self.handle_start(token, queued.skip),
                token @ Token::Empty { .. } => self.handle_empty(token, queued.skip),
                token @ Token::End { .. } => self.handle_end(token, queued.skip),
                token => self.emit(token, queued.skip),
            }
        }
    }

    /// Append a principal token and run the injector chain on it.
    fn emit(&mut self, token: Token, skip: u32) {
        let at = self.out.len();
        #[cfg(any(test, feature = "debug-stats"))]
        log::trace!(target: "sanitize.well_formed", "emit {token:?}");
        self.out.push(token);
        self.offer(at, skip);
    }

    /// Pop the top entry, synthesizing its end tag (no injector offering).
    fn pop_close(&mut self, line_override: Option<u32>, diag: Option<DiagnosticKind>) {
        let Some(entry) = self.stack.pop() else {
            return;
        };
        if let Some(kind) = diag {
            self.ctx
                .diagnostics
                .send(Severity::Notice, kind, entry.name.clone(), entry.line);
        }
        let end = Token::End {
            name: entry.name.clone(),
            line: line_override.unwrap_or(entry.line),
        };
        self.trail.push(TrailOp::Popped {
            at: self.out.len(),
            entry,
        });
        self.out.push(end);
    }

    /// Undo trail operations at or past `target` and hand back the removed
    /// output suffix.
    fn rollback_to(&mut self, target: usize) -> Vec<Token> {
        while self.trail.last().is_some_and(|op| op.at() >= target) {
            match self.trail.pop() {
                Some(TrailOp::Pushed { .. }) => {
                    self.stack.pop();
                }
                Some(TrailOp::Popped { entry, .. }) => {
                    self.stack.push(entry);
                }
                None => break,
            }
        }
        self.out.split_off(target)
    }

    fn requeue_front(&mut self, tokens: Vec<Token>, skip: u32) {
        for token in tokens.into_iter().rev() {
            self.queue.push_front(Queued { token, skip });
        }
    }

    fn offer(&mut self, at: usize, skip: u32) {
        if self.injectors.is_empty() {
            return;
        }
        for i in 0..self.injectors.len() {
            if !self.active[i] || skip & (1u32 << i.min(31)) != 0 {
                continue;
            }
            debug_assert!(at < self.out.len());
            let action = {
                let names: Vec<&str> = self.stack.iter().map(|e| e.name.as_str()).collect();
                let view = StackView::new(&names);
                self.injectors[i].handle(&self.out[at], &view)
            };
            let mask = mask_through(i) | skip;
            match action {
                Action::Keep => {}
                Action::Replace(tokens) => {
                    let _ = self.rollback_to(at);
                    self.requeue_front(tokens, mask);
                    return;
                }
                Action::InsertBefore(mut tokens) => {
                    let mut removed = self.rollback_to(at);
                    tokens.append(&mut removed);
                    self.requeue_front(tokens, mask);
                    return;
                }
                Action::InsertAfter(tokens) => {
                    self.requeue_front(tokens, mask);
                }
                Action::Rewind(n) => {
                    if n == 0 {
                        continue;
                    }
                    let target = (at + 1).saturating_sub(n);
                    let count = at + 1 - target;
                    if self.rewind_budget < count {
                        self.ctx.diagnostics.send(
                            Severity::Warning,
                            DiagnosticKind::RewindBudgetExhausted,
                            self.injectors[i].name(),
                            0,
                        );
                        continue;
                    }
                    self.rewind_budget -= count;
                    let removed = self.rollback_to(target);
                    self.requeue_front(removed, mask);
                    return;
                }
            }
        }
    }

    /// Offer a token that was dropped before emission (stray end tags).
    /// Injectors may still inject around the position; keep/rewind are
    /// meaningless for a token that is not in the output.
    fn offer_phantom(&mut self, token: &Token, skip: u32) {
        if self.injectors.is_empty() {
            return;
        }
        for i in 0..self.injectors.len() {
            if !self.active[i] || skip & (1u32 << i.min(31)) != 0 {
                continue;
            }
            let action = {
                let names: Vec<&str> = self.stack.iter().map(|e| e.name.as_str()).collect();
                let view = StackView::new(&names);
                self.injectors[i].handle(token, &view)
            };
            let mask = mask_through(i) | skip;
            match action {
                Action::Keep | Action::Rewind(_) => {}
                Action::Replace(tokens) | Action::InsertBefore(tokens) => {
                    self.requeue_front(tokens, mask);
                    return;
                }
                Action::InsertAfter(tokens) => {
                    self.requeue_front(tokens, mask);
                }
            }
        }
    }

    fn decide(&self, name: &str) -> Decision {
        match self.stack.last() {
            Some(top) => {
                if top.def.auto_close.contains(name) {
                    Decision::AutoClose
                } else if top.def.child_def.accepts_structurally(name, self.model) {
                    Decision::Accept
                } else {
                    Decision::Reject
                }
            }
            None => {
                if self
                    .root_def
                    .child_def
                    .accepts_structurally(name, self.model)
                {
                    Decision::Accept
                } else {
                    Decision::Reject
                }
            }
        }
    }

    fn handle_start(&mut self, token: Token, skip: u32) {
        let Token::Start { name, attrs, line } = token else {
            return;
        };
        let Some(def) = self.model.element(&name) else {
            // Injectors may insert names the model does not know.
            self.ctx
                .diagnostics
                .send(Severity::Warning, DiagnosticKind::TagDropped, name, line);
            return;
        };
        if def.child_def.is_empty() {
            self.place_empty(Token::Empty { name, attrs, line }, skip);
            return;
        }
        loop {
            match self.decide(&name) {
                Decision::AutoClose => {
                    self.pop_close(None, Some(DiagnosticKind::ElementAutoClosed));
                }
                Decision::Accept => {
                    self.trail.push(TrailOp::Pushed { at: self.out.len() });
                    self.stack.push(Entry {
                        name: name.clone(),
                        line,
                        def,
                    });
                    self.emit(Token::Start { name, attrs, line }, skip);
                    return;
                }
                Decision::Reject => {
                    if def.standalone {
                        self.trail.push(TrailOp::Pushed { at: self.out.len() });
                        self.stack.push(Entry {
                            name: name.clone(),
                            line,
                            def,
                        });
                        self.emit(Token::Start { name, attrs, line }, skip);
                        return;
                    }
                    self.ctx
                        .diagnostics
                        .send(Severity::Warning, DiagnosticKind::TagDropped, name, line);
                    return;
                }
            }
        }
    }

    fn handle_empty(&mut self, token: Token, skip: u32) {
        let Token::Empty { name, attrs, line } = token else {
            return;
        };
        let Some(def) = self.model.element(&name) else {
            self.ctx
                .diagnostics
                .send(Severity::Warning, DiagnosticKind::TagDropped, name, line);
            return;
        };
        if !def.child_def.is_empty() {
            // A self-closed element with real content model expands to an
            // explicit start/end pair.
            self.requeue_front(
                vec![
                    Token::Start {
                        name: name.clone(),
                        attrs,
                        line,
                    },
                    Token::End { name, line },
                ],
                skip,
            );
            return;
        }
        self.place_empty(Token::Empty { name, attrs, line }, skip);
    }

    fn place_empty(&mut self, token: Token, skip: u32) {
        let Some(name) = token.tag_name().map(str::to_string) else {
            return;
        };
        let standalone = self
            .model
            .element(&name)
            .is_some_and(|def| def.standalone);
        loop {
            match self.decide(&name) {
                Decision::AutoClose => {
                    self.pop_close(None, Some(DiagnosticKind::ElementAutoClosed));
                }
                Decision::Accept => {
                    self.emit(token, skip);
                    return;
                }
                Decision::Reject => {
                    if standalone {
                        self.emit(token, skip);
                        return;
                    }
                    self.ctx.diagnostics.send(
                        Severity::Warning,
                        DiagnosticKind::TagDropped,
                        name,
                        token.line(),
                    );
                    return;
                }
            }
        }
    }

    fn handle_end(&mut self, token: Token, skip: u32) {
        let Token::End { name, line } = token else {
            return;
        };
        match self.stack.iter().rposition(|entry| entry.name == name) {
            Some(index) => {
                // Long carry-over: everything above the match is unclosed
                // and closes implicitly here.
                while self.stack.len() > index + 1 {
                    self.pop_close(None, Some(DiagnosticKind::ElementAutoClosed));
                }
                let entry = match self.stack.pop() {
                    Some(entry) => entry,
                    None => return,
                };
                let at = self.out.len();
                self.trail.push(TrailOp::Popped { at, entry });
                self.out.push(Token::End { name, line });
                self.offer(at, skip);
            }
            None => {
                self.ctx.diagnostics.send(
                    Severity::Notice,
                    DiagnosticKind::StrayEndTag,
                    name.clone(),
                    line,
                );
                self.offer_phantom(&Token::End { name, line }, skip);
            }
        }
    }
}

pub fn run(
    tokens: Vec<Token>,
    model: &ContentModel,
    config: &Config,
    root_def: &ElementDef,
    injectors: &mut [Box<dyn Injector>],
    ctx: &mut RunContext,
) -> Vec<Token> {
    debug_assert!(injectors.len() <= MAX_INJECTORS);
    let mut active = vec![false; injectors.len()];
    for (i, injector) in injectors.iter_mut().enumerate() {
        match injector.check_needed(model, config) {
            None => active[i] = true,
            Some(message) => ctx.diagnostics.send(
                Severity::Warning,
                DiagnosticKind::InjectorDisabled,
                format!("{}: {message}", injector.name()),
                0,
            ),
        }
    }

    let rewind_budget = tokens.len().max(16);
    let queue: VecDeque<Queued> = tokens
        .into_iter()
        .map(|token| Queued { token, skip: 0 })
        .collect();
    let mut pass = Pass {
        model,
        root_def,
        injectors,
        active,
        ctx,
        queue,
        out: Vec::new(),
        stack: Vec::new(),
        trail: Vec::new(),
        rewind_budget,
    };

    pass.drain();

    // Stream end: give every injector its flush window, then close what is
    // still open, innermost first.
    for i in 0..pass.injectors.len() {
        if !pass.active[i] {
            continue;
        }
        let flushed = pass.injectors[i].flush();
        if flushed.is_empty() {
            continue;
        }
        let mask = mask_through(i);
        for token in flushed {
            pass.queue.push_back(Queued { token, skip: mask });
        }
        pass.drain();
    }

    while !pass.stack.is_empty() {
        pass.pop_close(None, Some(DiagnosticKind::UnclosedElementClosed));
        pass.drain();
    }

    pass.out
}
