use serde::{Deserialize, Serialize};
use std::path::Path;
use thiserror::Error;

use super::context::Context;

#[derive(Debug, Error)]
pub enum LocationError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("RON deserialization error: {0}")]
    Ron(#[from] ron::error::SpannedError),
    #[error("duplicate location slug: {0}")]
    DuplicateSlug(String),
}

/// A service area with its own landing page (`/locations/austin-tx`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Location {
    pub city_name: String,
    pub region_name: String,
    pub state_code: String,
    /// URL slug; derived from city and state when left empty.
    #[serde(default)]
    pub slug: String,
    #[serde(default)]
    pub phone: Option<String>,
}

impl Location {
    pub fn new(city_name: &str, region_name: &str, state_code: &str) -> Self {
        Self {
            city_name: city_name.to_string(),
            region_name: region_name.to_string(),
            state_code: state_code.to_string(),
            slug: slugify(&format!("{} {}", city_name, state_code)),
            phone: None,
        }
    }

    pub fn with_phone(mut self, phone: &str) -> Self {
        self.phone = Some(phone.to_string());
        self
    }

    /// Placeholder values for this location's page.
    pub fn context(&self) -> Context {
        let mut ctx = Context::new()
            .with("city_name", self.city_name.as_str())
            .with("region_name", self.region_name.as_str())
            .with("state_code", self.state_code.as_str())
            .with("slug", self.slug.as_str());
        if let Some(ref phone) = self.phone {
            ctx.insert("phone", phone.as_str());
        }
        ctx
    }

    /// Load a list of locations from a RON file.
    pub fn load_all_from_ron(path: &Path) -> Result<Vec<Location>, LocationError> {
        let contents = std::fs::read_to_string(path)?;
        Self::parse_ron(&contents)
    }

    /// Parse a list of locations, filling in missing slugs and
    /// rejecting duplicates.
    pub fn parse_ron(input: &str) -> Result<Vec<Location>, LocationError> {
        let mut locations: Vec<Location> = ron::from_str(input)?;
        let mut seen = std::collections::HashSet::new();
        for location in &mut locations {
            if location.slug.is_empty() {
                location.slug =
                    slugify(&format!("{} {}", location.city_name, location.state_code));
            }
            if !seen.insert(location.slug.clone()) {
                return Err(LocationError::DuplicateSlug(location.slug.clone()));
            }
        }
        Ok(locations)
    }

    pub fn find_by_slug<'a>(locations: &'a [Location], slug: &str) -> Option<&'a Location> {
        locations.iter().find(|l| l.slug == slug)
    }
}

/// Lowercase, ASCII alphanumerics joined by single hyphens.
pub fn slugify(input: &str) -> String {
    let mut slug = String::with_capacity(input.len());
    for word in input
        .split(|c: char| !c.is_ascii_alphanumeric())
        .filter(|w| !w.is_empty())
    {
        if !slug.is_empty() {
            slug.push('-');
        }
        slug.push_str(&word.to_ascii_lowercase());
    }
    slug
}
