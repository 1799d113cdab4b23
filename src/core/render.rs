//! Substitution engine — turns a template and a context into copy.
//!
//! Placeholders resolve deterministically against the [`Context`];
//! alternation groups pick one option uniformly at random on every
//! call. A placeholder missing from the context is emitted as its
//! original token text so unconfigured pages stay visibly debuggable.

use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use tracing::debug;

use crate::core::grammar::{Template, TemplateSegment};
use crate::schema::context::Context;

/// Render a template string with thread-local randomness.
pub fn render(template: &str, context: &Context) -> String {
    render_with(template, context, &mut rand::thread_rng())
}

/// Render a template string with a caller-provided random source.
pub fn render_with<R: Rng + ?Sized>(template: &str, context: &Context, rng: &mut R) -> String {
    Template::parse(template).render(context, rng)
}

impl Template {
    /// Render in a single left-to-right pass. Each token is visited
    /// once and chosen alternatives are emitted verbatim.
    pub fn render<R: Rng + ?Sized>(&self, context: &Context, rng: &mut R) -> String {
        let mut out = String::new();
        for segment in &self.segments {
            match segment {
                TemplateSegment::Literal(text) => out.push_str(text),
                TemplateSegment::Placeholder { raw, name, .. } => match context.get(name) {
                    Some(value) => out.push_str(value),
                    None => {
                        debug!(placeholder = %name, "unresolved placeholder left in output");
                        out.push_str(raw);
                    }
                },
                TemplateSegment::Alternation { raw, options } => match options.choose(rng) {
                    Some(choice) => out.push_str(choice),
                    None => out.push_str(raw),
                },
            }
        }
        out
    }
}

/// A renderer that owns its random source. Seed it for reproducible
/// output in tests and previews.
#[derive(Debug, Clone)]
pub struct Renderer {
    rng: StdRng,
}

impl Renderer {
    pub fn seeded(seed: u64) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
        }
    }

    pub fn from_entropy() -> Self {
        Self {
            rng: StdRng::from_entropy(),
        }
    }

    pub fn render(&mut self, template: &str, context: &Context) -> String {
        render_with(template, context, &mut self.rng)
    }

    pub fn render_template(&mut self, template: &Template, context: &Context) -> String {
        template.render(context, &mut self.rng)
    }

    pub fn rng_mut(&mut self) -> &mut StdRng {
        &mut self.rng
    }
}

impl Default for Renderer {
    fn default() -> Self {
        Self::from_entropy()
    }
}
