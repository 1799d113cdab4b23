//! WASM bindings for spintext — powers the marketing site's copy blocks.

use std::time::Duration;
use wasm_bindgen::prelude::*;

use spintext::core::rotator::{ManualClock, Rotator};
use spintext::core::variants::{SpintextLibrary, VariantSet};
use spintext::schema::location::Location;
use spintext::{Context, Renderer};

// ---------------------------------------------------------------------------
// Embedded site data — compiled into the WASM binary
// ---------------------------------------------------------------------------
mod data {
    pub const SITE_COPY: &str = include_str!("../../site_data/copy.ron");
    pub const LOCATIONS: &str = include_str!("../../site_data/locations.ron");
}

// ---------------------------------------------------------------------------
// JSON helper types for communication across the WASM boundary
// ---------------------------------------------------------------------------
#[derive(serde::Serialize)]
struct LocationInfo {
    slug: String,
    city_name: String,
    region_name: String,
    state_code: String,
}

#[derive(serde::Serialize)]
struct RenderedBlock {
    name: String,
    text: String,
}

fn page_time(now_ms: f64) -> Duration {
    if now_ms > 0.0 {
        Duration::try_from_secs_f64(now_ms / 1000.0).unwrap_or(Duration::MAX)
    } else {
        Duration::ZERO
    }
}

fn parse_context(context_json: &str) -> Result<Context, JsError> {
    if context_json.trim().is_empty() {
        return Ok(Context::new());
    }
    serde_json::from_str(context_json).map_err(|e| JsError::new(&format!("Invalid context JSON: {e}")))
}

/// Render a template once with browser randomness.
#[wasm_bindgen]
pub fn render(template: &str, context_json: &str) -> Result<String, JsError> {
    Ok(spintext::render(template, &parse_context(context_json)?))
}

/// Render a template `count` times from a fixed seed. Returns a JSON array.
#[wasm_bindgen]
pub fn render_seeded(
    template: &str,
    context_json: &str,
    seed: u64,
    count: usize,
) -> Result<String, JsError> {
    let ctx = parse_context(context_json)?;
    let mut renderer = Renderer::seeded(seed);
    let outputs: Vec<String> = (0..count).map(|_| renderer.render(template, &ctx)).collect();
    serde_json::to_string(&outputs).map_err(|e| JsError::new(&format!("Serialization error: {e}")))
}

// ---------------------------------------------------------------------------
// SiteCopy — the embedded copy library and service-area list
// ---------------------------------------------------------------------------
#[wasm_bindgen]
pub struct SiteCopy {
    library: SpintextLibrary,
    locations: Vec<Location>,
    renderer: Renderer,
}

#[wasm_bindgen]
impl SiteCopy {
    #[wasm_bindgen(constructor)]
    pub fn new(seed: Option<u64>) -> Result<SiteCopy, JsError> {
        let library = SpintextLibrary::parse_ron(data::SITE_COPY)
            .map_err(|e| JsError::new(&format!("Copy library error: {e}")))?;
        let locations = Location::parse_ron(data::LOCATIONS)
            .map_err(|e| JsError::new(&format!("Locations error: {e}")))?;
        let renderer = match seed {
            Some(seed) => Renderer::seeded(seed),
            None => Renderer::from_entropy(),
        };
        Ok(SiteCopy {
            library,
            locations,
            renderer,
        })
    }

    /// JSON array of service-area locations.
    pub fn locations(&self) -> Result<String, JsError> {
        let infos: Vec<LocationInfo> = self
            .locations
            .iter()
            .map(|l| LocationInfo {
                slug: l.slug.clone(),
                city_name: l.city_name.clone(),
                region_name: l.region_name.clone(),
                state_code: l.state_code.clone(),
            })
            .collect();
        serde_json::to_string(&infos).map_err(|e| JsError::new(&format!("Serialization error: {e}")))
    }

    /// Render every copy block for a location page. Returns a JSON array
    /// of `{name, text}` objects.
    pub fn render_page(&mut self, slug: &str, keyword: Option<String>) -> Result<String, JsError> {
        let ctx = self.location_context(slug, keyword.as_deref())?;
        let blocks: Vec<RenderedBlock> = self
            .library
            .render_page(&ctx, self.renderer.rng_mut())
            .into_iter()
            .map(|(name, text)| RenderedBlock { name, text })
            .collect();
        serde_json::to_string(&blocks).map_err(|e| JsError::new(&format!("Serialization error: {e}")))
    }

    /// Rotator for one block of a location page.
    pub fn rotator(
        &self,
        block: &str,
        slug: &str,
        keyword: Option<String>,
        now_ms: f64,
    ) -> Result<WasmRotator, JsError> {
        let ctx = self.location_context(slug, keyword.as_deref())?;
        let clock = ManualClock::new();
        clock.set(page_time(now_ms));
        let rotator = self
            .library
            .rotator_with_clock(block, ctx, clock.clone())
            .map_err(|e| JsError::new(&e.to_string()))?
            .build();
        Ok(WasmRotator { rotator, clock })
    }
}

impl SiteCopy {
    fn location_context(&self, slug: &str, keyword: Option<&str>) -> Result<Context, JsError> {
        let location = Location::find_by_slug(&self.locations, slug)
            .ok_or_else(|| JsError::new(&format!("Unknown location: {slug}")))?;
        Ok(Context::for_location(location, keyword))
    }
}

// ---------------------------------------------------------------------------
// WasmRotator — driven by a single setInterval on the JS side
// ---------------------------------------------------------------------------
#[wasm_bindgen]
pub struct WasmRotator {
    rotator: Rotator<ManualClock>,
    clock: ManualClock,
}

#[wasm_bindgen]
impl WasmRotator {
    /// Build from a JSON array of templates, starting at page time
    /// `now_ms`. `interval_ms` of 0 disables rotation; `resolve: false`
    /// shows raw template text.
    #[wasm_bindgen(constructor)]
    pub fn new(
        variants_json: &str,
        interval_ms: u32,
        context_json: &str,
        resolve: bool,
        now_ms: f64,
    ) -> Result<WasmRotator, JsError> {
        let variants: Vec<String> = serde_json::from_str(variants_json)
            .map_err(|e| JsError::new(&format!("Invalid variants JSON: {e}")))?;
        let clock = ManualClock::new();
        clock.set(page_time(now_ms));
        let mut builder = Rotator::builder()
            .interval(Duration::from_millis(u64::from(interval_ms)))
            .resolve(resolve)
            .context(parse_context(context_json)?)
            .clock(clock.clone());
        if let Ok(set) = VariantSet::from_strs(&variants) {
            builder = builder.variants(set);
        }
        Ok(WasmRotator {
            rotator: builder.build(),
            clock,
        })
    }

    pub fn current(&self) -> String {
        self.rotator.current().to_string()
    }

    /// Feed the page clock (`performance.now()` milliseconds) and fire the
    /// tick if due. Returns whether the text changed.
    pub fn advance_to(&mut self, now_ms: f64) -> bool {
        self.clock.set(page_time(now_ms));
        self.rotator.poll()
    }

    /// Fire the timer now, regardless of the page clock.
    pub fn tick(&mut self) -> bool {
        self.rotator.tick()
    }

    /// Page-clock time of the pending tick, or `undefined` when none is scheduled.
    pub fn next_due_ms(&self) -> Option<f64> {
        self.rotator
            .next_due()
            .map(|due| due.as_secs_f64() * 1000.0)
    }

    pub fn dispose(&mut self) {
        self.rotator.dispose();
    }
}
