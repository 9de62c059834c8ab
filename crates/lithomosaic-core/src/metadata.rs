//! Metadata inference for raw source records

use crate::error::MosaicError;
use crate::lithology::LithologyClassifier;
use crate::models::{NormalizedUnit, RawRecord, SourceBatch, UnitMetadata};
use crate::ontology::TimeSpanOntology;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::sync::OnceLock;

/// Map-unit code prefixes used by USGS geologic maps
const USGS_CODE_PREFIXES: &[(&str, &str)] = &[
    ("Cz", "cenozoic"),
    ("Q", "quaternary"),
    ("T", "tertiary"),
    ("N", "neogene"),
    ("Pe", "paleogene"),
    ("Mz", "mesozoic"),
    ("K", "cretaceous"),
    ("J", "jurassic"),
    ("Tr", "triassic"),
    ("Pz", "paleozoic"),
    ("P", "permian"),
    ("C", "carboniferous"),
    ("M", "mississippian"),
    ("D", "devonian"),
    ("S", "silurian"),
    ("O", "ordovician"),
    ("pC", "precambrian"),
    ("Z", "late proterozoic"),
    ("Y", "middle proterozoic"),
    ("Y3", "late middle proterozoic"),
    ("Y2", "middle middle proterozoic"),
];

fn formation_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"(?:[A-Z]\w+ )+\s?(?:[Ff]ormation|[Tt]errane)").expect("formation pattern")
    })
}

fn grouping_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"(?i)franciscan\s+complex|great\s+valley\s+sequence")
            .expect("grouping pattern")
    })
}

/// Proper-noun run ending in "Formation" or "Terrane", title-cased
pub fn formation_from_text(text: &str) -> Option<String> {
    formation_pattern().find(text).map(|m| title_case(m.as_str()))
}

/// Regional rock grouping named in the text, title-cased
pub fn grouping_from_text(text: &str) -> Option<String> {
    grouping_pattern().find(text).map(|m| title_case(m.as_str()))
}

/// Span implied by a lithology alone
pub fn span_from_lithology(lithology: &str) -> Option<String> {
    match lithology {
        "artificial" | "water" => Some("present".to_string()),
        _ => None,
    }
}

/// Span from the leading letter of a short map-unit code
///
/// Codes longer than four characters do not follow the convention.
pub fn span_from_code(code: &str) -> Option<String> {
    let code = code.trim();
    if code.is_empty() || code.chars().count() > 4 {
        return None;
    }
    let span = match code.chars().next()? {
        'K' => "cretaceous",
        'T' => "tertiary",
        'Q' => "quaternary",
        'J' => "jurassic",
        _ => "present",
    };
    Some(span.to_string())
}

/// Span from a USGS map-unit code prefix; the longest matching prefix wins
pub fn span_from_usgs_code(code: &str) -> Option<String> {
    let code = code.trim();
    USGS_CODE_PREFIXES
        .iter()
        .filter(|(prefix, _)| code.starts_with(prefix))
        .max_by_key(|(prefix, _)| prefix.len())
        .map(|(_, span)| span.to_string())
}

fn title_case(text: &str) -> String {
    let mut result = String::with_capacity(text.len());
    let mut at_word_start = true;
    for c in text.chars() {
        if c.is_alphabetic() {
            if at_word_start {
                result.extend(c.to_uppercase());
            } else {
                result.extend(c.to_lowercase());
            }
            at_word_start = false;
        } else {
            result.push(c);
            at_word_start = true;
        }
    }
    result
}

/// Which map-unit code convention infers spans from codes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum CodeConvention {
    /// Single leading letter on codes of up to four characters
    #[default]
    Simple,
    /// USGS age-symbol prefixes
    Usgs,
}

/// Counts from normalizing one source
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NormalizationStats {
    pub records: usize,
    pub empty_units: usize,
    pub ontology_misses: usize,
}

/// Fills missing unit metadata from titles, descriptions and codes
#[derive(Clone, Copy)]
pub struct MetadataNormalizer {
    ontology: &'static TimeSpanOntology,
    classifier: &'static LithologyClassifier,
    code_convention: CodeConvention,
}

impl Default for MetadataNormalizer {
    fn default() -> Self {
        Self::new()
    }
}

impl MetadataNormalizer {
    pub fn new() -> Self {
        Self {
            ontology: TimeSpanOntology::global(),
            classifier: LithologyClassifier::global(),
            code_convention: CodeConvention::Simple,
        }
    }

    pub fn with_code_convention(mut self, convention: CodeConvention) -> Self {
        self.code_convention = convention;
        self
    }

    pub fn code_convention(&self) -> CodeConvention {
        self.code_convention
    }

    /// Fill blank fields in place without touching fields that have values.
    ///
    /// Returns the ontology misses met along the way. They are not fatal;
    /// the affected fields simply stay empty.
    pub fn infer(&self, metadata: &mut UnitMetadata) -> Vec<MosaicError> {
        let mut misses = Vec::new();

        if metadata.lithology.is_none() {
            metadata.lithology = metadata
                .title
                .as_deref()
                .and_then(|t| self.classifier.lithology(t))
                .or_else(|| {
                    metadata
                        .description
                        .as_deref()
                        .and_then(|d| self.classifier.lithology(d))
                });
            if metadata.lithology.is_none() {
                if let Some(text) = metadata.title.as_ref().or(metadata.description.as_ref()) {
                    misses.push(MosaicError::OntologyMiss { text: text.clone() });
                }
            }
        }

        if metadata.span.is_none() {
            metadata.span = metadata
                .title
                .as_deref()
                .and_then(|t| self.ontology.span_from_text(t))
                .or_else(|| metadata.lithology.as_deref().and_then(span_from_lithology))
                .or_else(|| metadata.code.as_deref().and_then(|c| self.span_from_code(c)));
        }

        if let Some(span) = metadata.span.clone() {
            if metadata.controlled_span.is_none() {
                metadata.controlled_span = self.ontology.controlled_span(&span);
                if metadata.controlled_span.is_none() {
                    misses.push(MosaicError::OntologyMiss { text: span.clone() });
                }
            }

            if metadata.min_age.is_none() || metadata.max_age.is_none() {
                let mut ages = self.ontology.ages(&span);
                if !ages.is_resolved() {
                    if let Some(controlled) = metadata.controlled_span.as_deref() {
                        ages = self.ontology.ages(controlled);
                    }
                }
                if ages.is_resolved() {
                    metadata.min_age = metadata.min_age.or(ages.min);
                    metadata.max_age = metadata.max_age.or(ages.max);
                    metadata.est_age = metadata.est_age.or(ages.est);
                } else {
                    misses.push(MosaicError::OntologyMiss { text: span });
                }
            }
        }

        if metadata.formation.is_none() {
            metadata.formation = metadata.title.as_deref().and_then(formation_from_text);
        }

        if metadata.grouping.is_none() {
            metadata.grouping = metadata
                .title
                .as_deref()
                .and_then(grouping_from_text)
                .or_else(|| metadata.description.as_deref().and_then(grouping_from_text));
        }

        if metadata.rock_type.is_none() {
            metadata.rock_type = metadata
                .lithology
                .as_deref()
                .and_then(|l| self.classifier.rock_type(l));
        }

        misses
    }

    /// Normalize one raw record into a unit
    pub fn normalize_record(&self, record: RawRecord) -> (NormalizedUnit, Vec<MosaicError>) {
        let mut metadata = UnitMetadata::from_attributes(&record.attributes);
        let misses = self.infer(&mut metadata);
        (NormalizedUnit::new(record.feature_id, record.geometry, metadata), misses)
    }

    /// Normalize every record of a source into a batch at the given priority
    pub fn normalize(
        &self,
        source_id: &str,
        priority: usize,
        records: Vec<RawRecord>,
    ) -> (SourceBatch, NormalizationStats) {
        let mut stats = NormalizationStats { records: records.len(), ..Default::default() };
        let mut units = Vec::with_capacity(records.len());

        for record in records {
            let (unit, misses) = self.normalize_record(record);
            for miss in &misses {
                tracing::debug!(source = source_id, feature = %unit.feature_id, "{}", miss);
            }
            stats.ontology_misses += misses.len();
            if unit.metadata.is_empty_unit() {
                stats.empty_units += 1;
            }
            units.push(unit);
        }

        if stats.empty_units > 0 {
            tracing::warn!(
                source = source_id,
                count = stats.empty_units,
                "Source has units without a code"
            );
        }

        tracing::info!(
            source = source_id,
            records = stats.records,
            misses = stats.ontology_misses,
            "Normalized source metadata"
        );

        (SourceBatch::new(source_id, priority, units), stats)
    }

    fn span_from_code(&self, code: &str) -> Option<String> {
        match self.code_convention {
            CodeConvention::Simple => span_from_code(code),
            CodeConvention::Usgs => span_from_usgs_code(code),
        }
    }
}
