/// Variant sets and copy-block libraries loaded from RON.
use rand::Rng;
use rustc_hash::FxHashMap;
use serde::Deserialize;
use std::path::Path;
use std::time::Duration;
use thiserror::Error;
use tracing::warn;

use crate::core::grammar::Template;
use crate::core::rotator::{Clock, Rotator, RotatorBuilder};
use crate::schema::context::Context;

#[derive(Debug, Error)]
pub enum VariantError {
    #[error("variant set must contain at least one template")]
    Empty,
    #[error("copy block '{0}' has no variants")]
    EmptyBlock(String),
    #[error("copy block not found: {0}")]
    BlockNotFound(String),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("RON deserialization error: {0}")]
    Ron(#[from] ron::error::SpannedError),
}

/// An ordered, non-empty list of templates shown in rotation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VariantSet {
    templates: Vec<Template>,
}

impl VariantSet {
    pub fn new(templates: Vec<Template>) -> Result<Self, VariantError> {
        if templates.is_empty() {
            return Err(VariantError::Empty);
        }
        Ok(Self { templates })
    }

    pub fn from_strs<I, S>(variants: I) -> Result<Self, VariantError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self::new(
            variants
                .into_iter()
                .map(|v| Template::parse(v.as_ref()))
                .collect(),
        )
    }

    pub fn len(&self) -> usize {
        self.templates.len()
    }

    /// Always false: construction rejects empty lists.
    pub fn is_empty(&self) -> bool {
        self.templates.is_empty()
    }

    /// The template at `index mod len`.
    pub fn get(&self, index: usize) -> &Template {
        &self.templates[index % self.templates.len()]
    }

    /// A single-variant set never rotates.
    pub fn rotates(&self) -> bool {
        self.templates.len() > 1
    }

    pub fn iter(&self) -> impl Iterator<Item = &Template> {
        self.templates.iter()
    }
}

/// A named piece of page copy (hero headline, call to action, ...).
#[derive(Debug, Clone)]
pub struct CopyBlock {
    pub name: String,
    pub variants: VariantSet,
    pub interval: Option<Duration>,
    pub resolve: bool,
}

impl CopyBlock {
    /// Rotator preconfigured with this block's variants and timing.
    pub fn rotator(&self, context: Context) -> RotatorBuilder {
        let mut builder = Rotator::builder()
            .variants(self.variants.clone())
            .resolve(self.resolve)
            .context(context);
        if let Some(interval) = self.interval {
            builder = builder.interval(interval);
        }
        builder
    }
}

/// A set of named copy blocks.
#[derive(Debug, Clone, Default)]
pub struct SpintextLibrary {
    pub blocks: FxHashMap<String, CopyBlock>,
}

// RON shape differs from the internal types, same as the grammar files.

#[derive(Debug, Deserialize)]
#[serde(rename = "Block")]
struct RonBlock {
    #[serde(default)]
    interval_ms: Option<u64>,
    #[serde(default = "default_resolve")]
    resolve: bool,
    variants: Vec<String>,
}

fn default_resolve() -> bool {
    true
}

impl SpintextLibrary {
    /// Load a library from a RON file.
    pub fn load_from_ron(path: &Path) -> Result<SpintextLibrary, VariantError> {
        let contents = std::fs::read_to_string(path)?;
        Self::parse_ron(&contents)
    }

    /// Parse a library from a RON string.
    pub fn parse_ron(input: &str) -> Result<SpintextLibrary, VariantError> {
        let raw: FxHashMap<String, RonBlock> = ron::from_str(input)?;
        let mut blocks = FxHashMap::default();

        for (name, ron_block) in raw {
            let variants = VariantSet::from_strs(&ron_block.variants)
                .map_err(|_| VariantError::EmptyBlock(name.clone()))?;
            let interval = ron_block
                .interval_ms
                .filter(|ms| *ms > 0)
                .map(Duration::from_millis);
            blocks.insert(
                name.clone(),
                CopyBlock {
                    name,
                    variants,
                    interval,
                    resolve: ron_block.resolve,
                },
            );
        }

        Ok(SpintextLibrary { blocks })
    }

    /// Merge another library into this one. Blocks from `other`
    /// override blocks in `self` with the same name.
    pub fn merge(&mut self, other: SpintextLibrary) {
        for (name, block) in other.blocks {
            if self.blocks.contains_key(&name) {
                warn!(block = %name, "copy block overridden by later library");
            }
            self.blocks.insert(name, block);
        }
    }

    pub fn get(&self, name: &str) -> Result<&CopyBlock, VariantError> {
        self.blocks
            .get(name)
            .ok_or_else(|| VariantError::BlockNotFound(name.to_string()))
    }

    /// Block names in sorted order.
    pub fn block_names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.blocks.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    /// Render one block for a static page load: one variant picked at
    /// random, then rendered against the context.
    pub fn render_block<R: Rng + ?Sized>(
        &self,
        name: &str,
        context: &Context,
        rng: &mut R,
    ) -> Result<String, VariantError> {
        let block = self.get(name)?;
        let template = block.variants.get(rng.gen_range(0..block.variants.len()));
        Ok(if block.resolve {
            template.render(context, rng)
        } else {
            template.source()
        })
    }

    /// Render every block, in name order so seeded output is stable.
    pub fn render_page<R: Rng + ?Sized>(
        &self,
        context: &Context,
        rng: &mut R,
    ) -> Vec<(String, String)> {
        let mut page = Vec::with_capacity(self.blocks.len());
        for name in self.block_names() {
            if let Ok(text) = self.render_block(name, context, rng) {
                page.push((name.to_string(), text));
            }
        }
        page
    }

    /// Rotator for a block, driven by a caller-supplied clock.
    pub fn rotator_with_clock<C: Clock>(
        &self,
        name: &str,
        context: Context,
        clock: C,
    ) -> Result<RotatorBuilder<C>, VariantError> {
        Ok(self.get(name)?.rotator(context).clock(clock))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    const LIBRARY: &str = r#"{
        "hero_headline": Block(
            interval_ms: Some(4000),
            variants: [
                "{Rent|Hire} a {keyword} in {location(city_name)}",
                "{location(city_name)} {keyword} rentals",
            ],
        ),
        "cta": Block(
            variants: ["{Call|Contact} us today"],
        ),
        "debug_banner": Block(
            resolve: false,
            variants: ["{Call|Contact} {city_name}"],
        ),
    }"#;

    #[test]
    fn variant_set_rejects_empty() {
        assert!(matches!(
            VariantSet::from_strs(Vec::<String>::new()),
            Err(VariantError::Empty)
        ));
    }

    #[test]
    fn variant_set_wraps_index() {
        let set = VariantSet::from_strs(["a", "b", "c"]).unwrap();
        assert_eq!(set.get(0).source(), "a");
        assert_eq!(set.get(4).source(), "b");
        assert!(set.rotates());
        assert!(!VariantSet::from_strs(["only"]).unwrap().rotates());
    }

    #[test]
    fn parse_library() {
        let lib = SpintextLibrary::parse_ron(LIBRARY).unwrap();
        assert_eq!(lib.block_names(), vec!["cta", "debug_banner", "hero_headline"]);

        let hero = lib.get("hero_headline").unwrap();
        assert_eq!(hero.variants.len(), 2);
        assert_eq!(hero.interval, Some(Duration::from_millis(4000)));
        assert!(hero.resolve);

        let cta = lib.get("cta").unwrap();
        assert_eq!(cta.interval, None);
        assert!(!lib.get("debug_banner").unwrap().resolve);
    }

    #[test]
    fn empty_block_is_error() {
        let input = r#"{ "broken": Block(variants: []) }"#;
        assert!(matches!(
            SpintextLibrary::parse_ron(input),
            Err(VariantError::EmptyBlock(name)) if name == "broken"
        ));
    }

    #[test]
    fn missing_block_is_error() {
        let lib = SpintextLibrary::parse_ron(LIBRARY).unwrap();
        let mut rng = StdRng::seed_from_u64(1);
        assert!(matches!(
            lib.render_block("footer", &Context::new(), &mut rng),
            Err(VariantError::BlockNotFound(_))
        ));
    }

    #[test]
    fn render_block_resolves_and_raw_mode_does_not() {
        let lib = SpintextLibrary::parse_ron(LIBRARY).unwrap();
        let ctx = Context::new().with("city_name", "Austin").with("keyword", "walker");
        let mut rng = StdRng::seed_from_u64(9);

        let hero = lib.render_block("hero_headline", &ctx, &mut rng).unwrap();
        assert!(hero.contains("Austin"));
        assert!(hero.contains("walker"));

        let raw = lib.render_block("debug_banner", &ctx, &mut rng).unwrap();
        assert_eq!(raw, "{Call|Contact} {city_name}");
    }

    #[test]
    fn render_page_is_ordered() {
        let lib = SpintextLibrary::parse_ron(LIBRARY).unwrap();
        let mut rng = StdRng::seed_from_u64(2);
        let page = lib.render_page(&Context::new(), &mut rng);
        let names: Vec<&str> = page.iter().map(|(n, _)| n.as_str()).collect();
        assert_eq!(names, vec!["cta", "debug_banner", "hero_headline"]);
    }

    #[test]
    fn merge_precedence() {
        let mut base = SpintextLibrary::parse_ron(LIBRARY).unwrap();
        let overrides =
            SpintextLibrary::parse_ron(r#"{ "cta": Block(variants: ["Book online"]) }"#).unwrap();
        base.merge(overrides);

        assert_eq!(base.get("cta").unwrap().variants.get(0).source(), "Book online");
        assert!(base.get("hero_headline").is_ok());
    }
}
