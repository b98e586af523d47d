//! Terminal summary of a search.

use std::fmt;

use tracing::warn;

use crate::data_models::{Facet, ProductHit, SearchOutcome, SearchResponse};

const SHOWN_SKILLS: usize = 3;
const SHOWN_FACET_VALUES: usize = 5;

/// Human-readable listing of products, suggestions and facets.
///
/// Products are numbered across every outcome given, so the pages of a
/// paginated search read as one list. Facets come from the first product
/// response only, since later pages repeat them.
pub struct Summary<'a>(pub &'a [SearchOutcome]);

impl fmt::Display for Summary<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let responses: Vec<&SearchResponse> =
            self.0.iter().filter_map(|o| o.as_ref().ok()).collect();

        writeln!(f, "===== SEARCH RESULTS =====")?;
        writeln!(f)?;
        for err in self.0.iter().filter_map(|o| o.as_ref().err()) {
            writeln!(f, "! {err}")?;
        }

        let products: Vec<&ProductHit> = responses.iter().flat_map(|r| r.products()).collect();
        if products.is_empty() {
            writeln!(f, "No product results found.")?;
        } else {
            let total = responses
                .iter()
                .find(|r| r.products().next().is_some())
                .and_then(|r| r.pagination.total_elements)
                .unwrap_or(products.len() as u64);
            writeln!(f, "Found {total} products matching your query")?;
            writeln!(f)?;
            for (i, product) in products.iter().enumerate() {
                write_product(f, i + 1, product)?;
            }
        }

        let suggestions: Vec<_> = responses.iter().flat_map(|r| r.suggestions()).collect();
        if !suggestions.is_empty() {
            writeln!(f)?;
            writeln!(f, "===== SEARCH SUGGESTIONS =====")?;
            writeln!(f)?;
            for (i, suggestion) in suggestions.iter().enumerate() {
                writeln!(f, "{}. {}", i + 1, suggestion.name)?;
            }
        }

        let facets: Vec<&Facet> = responses
            .iter()
            .find(|r| r.products().next().is_some())
            .map(|r| r.facets.iter().filter(|facet| !facet.values.is_empty()).collect())
            .unwrap_or_default();
        if !facets.is_empty() {
            writeln!(f)?;
            writeln!(f, "===== AVAILABLE FILTERS =====")?;
            writeln!(f)?;
            for facet in facets {
                write_facet(f, facet)?;
            }
        }
        Ok(())
    }
}

/// Product hits of every decodable outcome, in order. Undecodable positions
/// are logged and skipped.
pub fn product_hits(outcomes: &[SearchOutcome]) -> Vec<&ProductHit> {
    outcomes
        .iter()
        .filter_map(|outcome| match outcome {
            Ok(response) => Some(response),
            Err(err) => {
                warn!("skipping undecodable result: {err}");
                None
            }
        })
        .flat_map(|response| response.products())
        .collect()
}

fn write_product(f: &mut fmt::Formatter<'_>, n: usize, p: &ProductHit) -> fmt::Result {
    writeln!(f, "{n}. {}", p.name)?;
    writeln!(f, "   Type: {}", p.product_type)?;
    writeln!(f, "   URL: {}", p.url)?;
    if p.is_course_free {
        writeln!(f, "   FREE COURSE")?;
    }
    if p.is_part_of_coursera_plus {
        writeln!(f, "   Included in Coursera Plus")?;
    }
    if let Some(rating) = p.avg_product_rating.filter(|r| *r > 0.0) {
        writeln!(f, "   Rating: {rating} ({} reviews)", p.num_product_ratings)?;
    }
    if !p.partners.is_empty() {
        writeln!(f, "   Partners: {}", p.partners.join(", "))?;
    }
    if !p.skills.is_empty() {
        let shown = &p.skills[..p.skills.len().min(SHOWN_SKILLS)];
        writeln!(f, "   Skills: {}", shown.join(", "))?;
        if p.skills.len() > SHOWN_SKILLS {
            writeln!(f, "           + {} more", p.skills.len() - SHOWN_SKILLS)?;
        }
    }
    if let Some(tagline) = p.tagline.as_deref().filter(|t| !t.is_empty()) {
        writeln!(f, "   Tagline: {tagline}")?;
    }
    writeln!(f)
}

fn write_facet(f: &mut fmt::Formatter<'_>, facet: &Facet) -> fmt::Result {
    writeln!(f, "{}:", facet.name_display.as_deref().unwrap_or(&facet.name))?;
    for value in facet.values.iter().take(SHOWN_FACET_VALUES) {
        let label = value.value_display.as_deref().unwrap_or(&value.value);
        writeln!(f, "  - {label} ({})", value.count)?;
    }
    if facet.values.len() > SHOWN_FACET_VALUES {
        writeln!(f, "  + {} more options", facet.values.len() - SHOWN_FACET_VALUES)?;
    }
    writeln!(f)
}
