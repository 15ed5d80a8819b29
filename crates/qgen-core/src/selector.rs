//! Weighted verb and template selection.

use crate::error::{Error, Result};
use crate::template::{AllowedVerbs, QueryTemplateDocument, Template, VerbTemplates};
use rand::seq::IndexedRandom;
use rand::Rng;

/// The verb with no generator support.
pub const UNSUPPORTED_VERB: &str = "insert";

/// Document verbs present in the allowed set, in document order.
pub fn allowed_queries<'a>(
    document: &'a QueryTemplateDocument,
    allowed: &AllowedVerbs,
) -> Vec<(&'a str, &'a VerbTemplates)> {
    document
        .verbs()
        .filter(|(verb, _)| allowed.contains(verb))
        .collect()
}

/// Draw a verb proportionally to its weight, then one of its templates uniformly.
///
/// Each allowed verb is repeated `weight` times in the draw population.
pub fn pick_query<'a, R: Rng>(
    document: &'a QueryTemplateDocument,
    allowed: &AllowedVerbs,
    rng: &mut R,
) -> Result<(&'a str, &'a Template)> {
    let queries = allowed_queries(document, allowed);
    if queries.is_empty() {
        return Err(Error::NoAllowedQueries);
    }

    let population: Vec<usize> = queries
        .iter()
        .enumerate()
        .flat_map(|(i, (_, entry))| std::iter::repeat(i).take(entry.weight as usize))
        .collect();
    let (verb, entry) = population
        .choose(rng)
        .map(|&i| queries[i])
        .ok_or(Error::NoAllowedQueries)?;

    if verb.eq_ignore_ascii_case(UNSUPPORTED_VERB) {
        return Err(Error::UnsupportedVerb(verb.to_string()));
    }

    let template = entry
        .templates
        .choose(rng)
        .ok_or(Error::NoAllowedQueries)?;
    Ok((verb, template))
}
