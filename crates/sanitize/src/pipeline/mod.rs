//! The document-normalization pipeline.
//!
//! Fixed pass order: foreign-element removal → well-formedness construction
//! → nesting enforcement (over the arborized tree) → attribute validation.
//! A `Pipeline` is a pure function of its token input and the immutable
//! model/config it was built against; everything mutable is scoped to the
//! per-run [`RunContext`].

mod fix_nesting;
pub mod injector;
mod node;
mod remove_foreign;
mod validate_attributes;
mod well_formed;

pub use injector::{Action, Injector, MergeAdjacentText, RemoveEmptyInlines, StackView};
pub use node::{Node, arborize, flatten};
pub use well_formed::MAX_INJECTORS;

use crate::config::{Config, ConfigError};
use crate::context::RunContext;
use crate::schema::{ContentModel, ElementDef};
use crate::token::Token;

pub struct Pipeline<'m> {
    model: &'m ContentModel,
    config: &'m Config,
    root_def: &'m ElementDef,
    injectors: Vec<Box<dyn Injector>>,
}

impl<'m> Pipeline<'m> {
    /// Validate the setup and build a runnable pipeline. This is the only
    /// place a sanitization run can fail; `run` itself is total.
    pub fn new(
        model: &'m ContentModel,
        config: &'m Config,
        injectors: Vec<Box<dyn Injector>>,
    ) -> Result<Self, ConfigError> {
        let root_def = model
            .element(&config.root_element)
            .ok_or_else(|| ConfigError::UnknownRootElement(config.root_element.clone()))?;
        if injectors.len() > MAX_INJECTORS {
            return Err(ConfigError::TooManyInjectors {
                max: MAX_INJECTORS,
                got: injectors.len(),
            });
        }
        Ok(Self {
            model,
            config,
            root_def,
            injectors,
        })
    }

    pub fn run(&mut self, tokens: Vec<Token>, ctx: &mut RunContext) -> Vec<Token> {
        let tokens = remove_foreign::run(tokens, self.model, self.config, ctx);
        let tokens = well_formed::run(
            tokens,
            self.model,
            self.config,
            self.root_def,
            &mut self.injectors,
            ctx,
        );
        let nodes = arborize(tokens);
        let nodes = fix_nesting::run(nodes, self.model, self.config, self.root_def, ctx);
        let tokens = flatten(nodes);
        validate_attributes::run(tokens, self.model, self.config, ctx)
    }
}
