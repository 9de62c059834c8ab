//! Geologic time-span ontology
//!
//! A closed table of named intervals plus derived early/middle/late
//! sub-spans, with free-text lookup of ages and controlled span names.

mod table;

use crate::models::span::{Ages, TimeSpan};
use regex::{Regex, RegexBuilder};
use std::collections::HashMap;
use std::sync::OnceLock;

/// Words that qualify a span as a part of its parent
const QUALIFIERS: &[&str] = &["early", "middle", "late", "lower", "upper"];

/// Controlled-vocabulary synonyms applied before lookup
const SYNONYMS: &[(&str, &str)] = &[("present", "holocene")];

fn parenthetical_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"\([^)]*\)").expect("parenthetical pattern"))
}

fn whitespace_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"\s+").expect("whitespace pattern"))
}

/// Splits "X to Y", "X - Y", "X and Y", "X or Y", "X and/or Y"
fn compound_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"^(.+?)(?:\s+(?:to|and/or|and-or|and|or)\s+|\s*-\s*)(.+)$")
            .expect("compound span pattern")
    })
}

/// "early to late", "lower to upper" and friends
fn qualifier_range_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(
            r"\b(?:early|middle|late|lower|upper)\s+to\s+(?:early|middle|late|lower|upper)\b",
        )
        .expect("qualifier range pattern")
    })
}

fn leading_qualifier_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"\b(?:early|middle|late|lower|upper)\s+").expect("leading qualifier pattern")
    })
}

/// Hierarchical lookup of named geologic time spans
///
/// Built once per process; see [`TimeSpanOntology::global`].
pub struct TimeSpanOntology {
    /// Explicit spans in table order, followed by synthesized sub-spans
    spans: Vec<TimeSpan>,
    index: HashMap<String, usize>,
    explicit_count: usize,
    mention_pattern: Regex,
}

impl TimeSpanOntology {
    /// The process-wide ontology
    pub fn global() -> &'static TimeSpanOntology {
        static ONTOLOGY: OnceLock<TimeSpanOntology> = OnceLock::new();
        ONTOLOGY.get_or_init(TimeSpanOntology::build)
    }

    fn build() -> Self {
        let mut spans: Vec<TimeSpan> = table::SPANS_MA
            .iter()
            .map(|(name, start, end)| TimeSpan::from_ma(*name, *start, *end))
            .collect();
        let explicit_count = spans.len();

        let mut index: HashMap<String, usize> = HashMap::new();
        for (i, span) in spans.iter().enumerate() {
            index.entry(span.name.clone()).or_insert(i);
        }

        // Sub-spans by thirds; explicit entries always win
        for i in 0..explicit_count {
            let parent = spans[i].clone();
            let third = parent.duration() / 3.0;
            let derived = [
                ("late", parent.end_age + third, parent.end_age),
                ("upper", parent.end_age + third, parent.end_age),
                ("early", parent.start_age, parent.start_age - third),
                ("lower", parent.start_age, parent.start_age - third),
                ("middle", parent.start_age - third / 2.0, parent.end_age + third / 2.0),
            ];
            for (qualifier, start, end) in derived {
                let name = format!("{} {}", qualifier, parent.name);
                if !index.contains_key(&name) {
                    index.insert(name.clone(), spans.len());
                    spans.push(TimeSpan::new(name, start, end));
                }
            }
        }

        let mut names: Vec<&str> = spans.iter().map(|s| s.name.as_str()).collect();
        names.sort_by(|a, b| b.len().cmp(&a.len()).then_with(|| a.cmp(b)));
        let alternatives: Vec<String> = names.iter().map(|n| regex::escape(n)).collect();
        let mention_pattern = RegexBuilder::new(&format!(r"\b(?:{})\b", alternatives.join("|")))
            .size_limit(1 << 24)
            .build()
            .expect("span mention pattern");

        tracing::debug!(
            explicit = explicit_count,
            total = spans.len(),
            "Built time span ontology"
        );

        Self {
            spans,
            index,
            explicit_count,
            mention_pattern,
        }
    }

    /// Number of known spans, synthesized ones included
    pub fn len(&self) -> usize {
        self.spans.len()
    }

    pub fn is_empty(&self) -> bool {
        self.spans.is_empty()
    }

    /// All spans, explicit ones first in table order
    pub fn iter(&self) -> impl Iterator<Item = &TimeSpan> {
        self.spans.iter()
    }

    /// Spans from the fixed table, without synthesized sub-spans
    pub fn explicit_spans(&self) -> &[TimeSpan] {
        &self.spans[..self.explicit_count]
    }

    /// Exact lookup by name, case-insensitive
    pub fn lookup(&self, name: &str) -> Option<&TimeSpan> {
        self.index
            .get(name.trim().to_lowercase().as_str())
            .map(|&i| &self.spans[i])
    }

    pub fn contains(&self, name: &str) -> bool {
        self.lookup(name).is_some()
    }

    /// Whether `name` comes from the fixed table rather than synthesis
    pub fn is_explicit(&self, name: &str) -> bool {
        self.index
            .get(name.trim().to_lowercase().as_str())
            .is_some_and(|&i| i < self.explicit_count)
    }

    /// Smallest explicit span strictly containing `name`
    pub fn parent(&self, name: &str) -> Option<&TimeSpan> {
        let child = self.lookup(name)?;
        self.smallest_covering(child.end_age, child.start_age, |candidate| {
            candidate.name != child.name && candidate.duration() > child.duration()
        })
    }

    /// Chain of parents from the immediate parent up to the root
    pub fn ancestors(&self, name: &str) -> Vec<&TimeSpan> {
        let mut chain = Vec::new();
        let mut current = self.parent(name);
        while let Some(span) = current {
            chain.push(span);
            current = self.parent(&span.name);
        }
        chain
    }

    /// Leftmost span name mentioned in free text, longest name first
    pub fn span_from_text(&self, text: &str) -> Option<String> {
        let lowered = text.to_lowercase();
        self.mention_pattern.find(&lowered).map(|m| m.as_str().to_string())
    }

    /// Resolve free text into an age range.
    ///
    /// Handles single names, compound ranges ("Devonian - Silurian",
    /// "Pliocene and Miocene", "Lower - Middle Silurian") and
    /// semicolon-separated alternatives, of which the first that fully
    /// resolves is used.
    pub fn ages(&self, text: &str) -> Ages {
        if text.contains(';') {
            return text
                .split(';')
                .map(|piece| self.ages(piece))
                .find(Ages::is_resolved)
                .unwrap_or_default();
        }

        let key = normalize(text);
        if key.is_empty() {
            return Ages::unresolved();
        }

        if let Some(span) = self.lookup(&key) {
            return span.ages();
        }

        if let Some((first, second)) = split_compound(&key) {
            if let (Some(a), Some(b)) = (self.lookup(&first), self.lookup(&second)) {
                let min = a.end_age.min(b.end_age);
                let max = a.start_age.max(b.start_age);
                return Ages::from_bounds(min, max);
            }
        }

        tracing::trace!(text, "No ages for span text");
        Ages::unresolved()
    }

    /// Map free text onto a name from the fixed table
    pub fn controlled_span(&self, text: &str) -> Option<String> {
        let key = normalize(text);
        if key.is_empty() {
            return None;
        }

        if let Some((_, target)) = SYNONYMS.iter().find(|(from, _)| *from == key) {
            if self.is_explicit(target) {
                return Some(target.to_string());
            }
        }

        if self.is_explicit(&key) {
            return Some(key);
        }

        let collapsed = tidy(&qualifier_range_pattern().replace_all(&key, ""));
        if self.is_explicit(&collapsed) {
            return Some(collapsed);
        }

        let lowered = tidy(&key.replace("early ", "lower "));
        if self.is_explicit(&lowered) {
            return Some(lowered);
        }

        let uppered = tidy(&key.replace("late ", "upper "));
        if self.is_explicit(&uppered) {
            return Some(uppered);
        }

        let swapped = tidy(&lowered.replace("late ", "upper "));
        if self.is_explicit(&swapped) {
            return Some(swapped);
        }

        let bare = tidy(&leading_qualifier_pattern().replace_all(&key, ""));
        if self.is_explicit(&bare) {
            return Some(bare);
        }

        let (first, second) = split_compound(&key)?;
        let a = self.lookup(&self.controlled_span(&first)?)?;
        let b = self.lookup(&self.controlled_span(&second)?)?;
        let younger = a.end_age.min(b.end_age);
        let older = a.start_age.max(b.start_age);
        self.smallest_covering(younger, older, |_| true)
            .map(|span| span.name.clone())
    }

    /// Smallest explicit span covering `[min, max]`, earliest start on ties
    fn smallest_covering<F>(&self, min: f64, max: f64, accept: F) -> Option<&TimeSpan>
    where
        F: Fn(&TimeSpan) -> bool,
    {
        self.explicit_spans()
            .iter()
            .filter(|span| span.covers(min, max) && accept(*span))
            .min_by(|a, b| {
                a.duration()
                    .total_cmp(&b.duration())
                    .then_with(|| a.start_age.total_cmp(&b.start_age))
            })
    }
}

/// Lowercase and strip the decorations map legends put around span names
fn normalize(text: &str) -> String {
    let lowered = text.to_lowercase().replace("undivided", "");
    let stripped = parenthetical_pattern().replace_all(&lowered, "");
    let unquestioned = stripped.replace("?-", " -").replace('?', "");
    tidy(&unquestioned)
}

/// Collapse whitespace and trim dangling dashes
fn tidy(text: &str) -> String {
    let collapsed = whitespace_pattern().replace_all(text, " ");
    collapsed
        .trim_matches(|c: char| c == '-' || c.is_whitespace())
        .to_string()
}

/// Split compound span text into its two halves.
///
/// A bare qualifier half borrows its span from the other half, so
/// "lower - middle silurian" reads as "lower silurian" and "middle silurian".
fn split_compound(key: &str) -> Option<(String, String)> {
    let captures = compound_pattern().captures(key)?;
    let mut first = tidy(captures.get(1)?.as_str());
    let mut second = tidy(captures.get(2)?.as_str());
    if first.is_empty() || second.is_empty() {
        return None;
    }

    if QUALIFIERS.contains(&first.as_str()) {
        if let Some(base) = base_span(&second) {
            first = format!("{} {}", first, base);
        }
    } else if QUALIFIERS.contains(&second.as_str()) {
        if let Some(base) = base_span(&first) {
            second = format!("{} {}", second, base);
        }
    }

    Some((first, second))
}

/// The span a qualified name refers to, "upper ordovician" -> "ordovician"
fn base_span(text: &str) -> Option<&str> {
    let (head, rest) = text.split_once(' ')?;
    if QUALIFIERS.contains(&head) && !rest.is_empty() {
        Some(rest)
    } else {
        Some(text)
    }
}
