mod category;
mod sources;

use std::borrow::Cow;

use itertools::Itertools;

pub use self::{
    category::{Category, CategoryGroup, Class},
    sources::SourceDefinition,
};
use crate::settings::{Country, Language};

/// Bumped whenever a source ID is renamed or removed, since that changes entity IDs.
pub const CATALOG_VERSION: u32 = 1;

/// Source definitions as seen by a single country pipeline.
///
/// Classification uses every known definition, so that a known source showing up
/// in an unexpected country still lands in its category. Individual sensors are
/// only created for the country's own source list.
#[derive(Clone, Debug)]
pub struct SourceCatalog {
    country: Country,
    definitions: &'static [SourceDefinition],
    sources: Vec<&'static SourceDefinition>,
}

impl SourceCatalog {
    #[must_use]
    pub fn for_country(country: Country) -> Self {
        let definitions = sources::SOURCES;
        let sources = sources::country_sources(country)
            .iter()
            .filter_map(|id| definitions.iter().find(|definition| definition.id == *id))
            .collect();
        Self { country, definitions, sources }
    }

    #[must_use]
    pub const fn country(&self) -> Country {
        self.country
    }

    /// Sources that get an individual sensor in this country.
    pub fn sources(&self) -> impl Iterator<Item = &'static SourceDefinition> + '_ {
        self.sources.iter().copied()
    }

    /// Find the definition by its canonical ID or any of its aliases.
    #[must_use]
    pub fn lookup(&self, id: &str) -> Option<&'static SourceDefinition> {
        self.definitions.iter().find(|definition| definition.matches(id))
    }

    /// Canonical source ID of a raw upstream identifier: slugified, with aliases resolved.
    #[must_use]
    pub fn canonical_id(&self, identifier: &str) -> String {
        let slug = slugify(identifier);
        match self.lookup(&slug) {
            Some(definition) => definition.id.to_owned(),
            None => slug,
        }
    }

    /// Category of the source, unknown sources are [`Category::Other`].
    #[must_use]
    pub fn category(&self, id: &str) -> Category {
        self.lookup(id).map_or(Category::Other, |definition| definition.category)
    }

    #[must_use]
    pub fn is_recognized(&self, id: &str) -> bool {
        self.lookup(id).is_some()
    }

    /// Load, prices, trading and similar series that must not count as generation.
    #[must_use]
    pub fn is_non_generation(&self, id: &str) -> bool {
        !self.is_recognized(id)
            && sources::NON_GENERATION.iter().any(|prefix| id.starts_with(prefix))
    }

    /// Display name in the language, falling back to English and then to the humanised ID.
    #[must_use]
    pub fn display_name(&self, id: &str, language: Language) -> Cow<'static, str> {
        self.lookup(id)
            .and_then(|definition| definition.name(language))
            .map_or_else(|| Cow::Owned(humanize(id)), Cow::Borrowed)
    }
}

/// Turn an upstream series name into an identifier.
///
/// Lower-cased, spaces, slashes and dashes become underscores, parentheses and commas are dropped.
#[must_use]
pub fn slugify(name: &str) -> String {
    let mut slug = String::with_capacity(name.len());
    for c in name.trim().chars().flat_map(char::to_lowercase) {
        match c {
            ' ' | '/' | '-' | '_' => {
                if !slug.is_empty() && !slug.ends_with('_') {
                    slug.push('_');
                }
            }
            '(' | ')' | ',' => {}
            _ => slug.push(c),
        }
    }
    if slug.ends_with('_') {
        slug.pop();
    }
    slug
}

/// `hydro_run_of_river` → `Hydro Run Of River`.
#[must_use]
pub fn humanize(id: &str) -> String {
    id.split('_')
        .filter(|word| !word.is_empty())
        .map(|word| {
            let mut chars = word.chars();
            chars.next().map_or_else(String::new, |first| {
                first.to_uppercase().chain(chars).collect::<String>()
            })
        })
        .join(" ")
}
