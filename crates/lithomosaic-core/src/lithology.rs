//! Free-text lithology classification

use crate::models::metadata::RockType;
use regex::Regex;
use std::sync::OnceLock;

/// Specific rock names. Within a shared prefix the longer term comes first,
/// so "mudstone" is found before "mud" and "basaltic andesite" before "basalt".
const HIGH_PRIORITY_TERMS: &[&str] = &[
    "agglomerate",
    "alluvium",
    r"alluvial[\s-]fan",
    "andesite",
    "andesitic",
    "ankaramite",
    "aplite",
    "arkose",
    r"basaltic\s+andesite",
    "basaltic",
    "basalt",
    "basanite",
    "benmoreite",
    "calcerenite",
    "chert",
    "claystone",
    "clay",
    "conglomerate",
    "dacite",
    "diabase",
    "dolerite",
    "dolomite",
    "dolostone",
    "fanglomerate",
    "gabbro",
    "gneissic",
    "gneiss",
    "granitic",
    "granitoid",
    "granite",
    "granodiorite",
    "gravel",
    "graywacke",
    "greenstone",
    "hawaiite",
    "icelandite",
    "keratophyre",
    "limestone",
    "listwanite",
    "listvenite",
    "listvanite",
    "listwaenite",
    "marble",
    "m(?:e|\u{e9}|e\u{301})lange",
    "microdiorite",
    "monzodiorite",
    "monzogranite",
    "moraine",
    "mudstone",
    "mugearite",
    "mylonite",
    "orthogneiss",
    "paragneiss",
    "pegmatite",
    "pelit(?:e|ic)",
    "peridotite",
    "picrobasalt",
    "picrite",
    r"plutonic\s+rock",
    "pyroxenite",
    r"quartz(?:-lithic)?\s+arenite",
    r"quartz\s+diorite",
    r"quartz\s+keratophyre",
    r"quartz\s+latite",
    r"quartz\s+monzonite",
    "quartzite",
    "rhyodacite",
    "rhyolite",
    "rhyolitic",
    "sandstone",
    "schist",
    r"sedimentary\s+breccia",
    "serpentinite",
    "serpentine",
    "shale",
    r"silica[\s-]carbonate",
    "siltstone",
    r"surficial\s+deposit",
    "syenite",
    "talus",
    r"tectonic\s+breccia",
    "tephrite",
    "till",
    "tonalite",
    "trachyte",
    "tuff",
    r"volcanoclastic\s+breccia",
];

/// Broad or ambiguous terms, used only when no specific term matches
const LOW_PRIORITY_TERMS: &[&str] = &[
    "arenaceous",
    "artificial",
    "breccia",
    r"carbonate\s+rock",
    "colluvium",
    "landslide",
    "levee",
    "mud",
    "sand",
    "silt",
    r"unconsolidated\s+material",
    "water",
    "metasedimentary",
    "sedimentary",
    "volcanic",
    "fill",
];

/// Matched term -> canonical lithology
const SYNONYMS: &[(&str, &str)] = &[
    ("alluvial-fan", "alluvial fan"),
    ("andesitic", "andesite"),
    ("arenaceous", "sand"),
    ("basaltic", "basalt"),
    ("dolostone", "dolomite"),
    ("dolerite", "diabase"),
    ("fanglomerate", "alluvial fan"),
    ("fill", "artificial"),
    ("gneissic", "gneiss"),
    ("granitic", "granite"),
    ("listwanite", "silica-carbonate"),
    ("listvenite", "silica-carbonate"),
    ("listvanite", "silica-carbonate"),
    ("listwaenite", "silica-carbonate"),
    ("metasedimentary", "metasedimentary rock"),
    ("m\u{e9}lange", "melange"),
    ("me\u{301}lange", "melange"),
    ("orthogneiss", "gneiss"),
    ("paragneiss", "gneiss"),
    ("pelitic", "pelite"),
    ("picrobasalt", "picrite"),
    ("quartz-lithic arenite", "quartz arenite"),
    ("rhyolitic", "rhyolite"),
    ("sedimentary", "sedimentary rock"),
    ("serpentine", "serpentinite"),
    ("silica carbonate", "silica-carbonate"),
    ("surficial deposit", "surficial deposits"),
    ("volcanic", "volcanic rock"),
];

const IGNEOUS: &[&str] = &[
    "agglomerate",
    "andesite",
    "aplite",
    "basalt",
    "basaltic andesite",
    "basanite",
    "benmoreite",
    "dacite",
    "diabase",
    "gabbro",
    "granite",
    "granitoid",
    "granodiorite",
    "hawaiite",
    "icelandite",
    "keratophyre",
    "microdiorite",
    "monzodiorite",
    "monzogranite",
    "mugearite",
    "pegmatite",
    "peridotite",
    "picrite",
    "plutonic rock",
    "pyroxenite",
    "quartz diorite",
    "quartz keratophyre",
    "quartz latite",
    "quartz monzonite",
    "rhyodacite",
    "rhyolite",
    "syenite",
    "tephrite",
    "tonalite",
    "trachyte",
    "tuff",
    "volcanic rock",
    "volcanoclastic breccia",
];

const METAMORPHIC: &[&str] = &[
    "gneiss",
    "greenstone",
    "marble",
    "mylonite",
    "quartzite",
    "schist",
    "serpentinite",
    "silica-carbonate",
    "metasedimentary rock",
];

const SEDIMENTARY: &[&str] = &[
    "arkose",
    "carbonate rock",
    "calcerenite",
    "chert",
    "clay",
    "claystone",
    "conglomerate",
    "dolomite",
    "graywacke",
    "limestone",
    "mudstone",
    "pelite",
    "quartz arenite",
    "sandstone",
    "shale",
    "siltstone",
    "sedimentary rock",
];

fn whitespace_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"\s+").expect("whitespace pattern"))
}

/// Two-tier keyword classifier for rock composition
pub struct LithologyClassifier {
    high_priority: Regex,
    low_priority: Regex,
}

impl LithologyClassifier {
    /// The process-wide classifier
    pub fn global() -> &'static LithologyClassifier {
        static CLASSIFIER: OnceLock<LithologyClassifier> = OnceLock::new();
        CLASSIFIER.get_or_init(|| LithologyClassifier {
            high_priority: alternation(HIGH_PRIORITY_TERMS),
            low_priority: alternation(LOW_PRIORITY_TERMS),
        })
    }

    /// Canonical lithology named in free text, if any
    pub fn lithology(&self, text: &str) -> Option<String> {
        let found = self
            .high_priority
            .find(text)
            .or_else(|| self.low_priority.find(text))?;

        let term = whitespace_pattern()
            .replace_all(&found.as_str().to_lowercase(), " ")
            .into_owned();

        let canonical = SYNONYMS
            .iter()
            .find(|(from, _)| *from == term)
            .map(|(_, to)| to.to_string())
            .unwrap_or(term);

        Some(canonical)
    }

    /// Rock type of a canonical lithology; `None` for deposits and non-rocks
    pub fn rock_type(&self, lithology: &str) -> Option<RockType> {
        let lithology = lithology.trim().to_lowercase();
        let lithology = lithology.as_str();
        if IGNEOUS.contains(&lithology) {
            Some(RockType::Igneous)
        } else if METAMORPHIC.contains(&lithology) {
            Some(RockType::Metamorphic)
        } else if SEDIMENTARY.contains(&lithology) {
            Some(RockType::Sedimentary)
        } else {
            None
        }
    }
}

fn alternation(terms: &[&str]) -> Regex {
    Regex::new(&format!("(?i)(?:{})", terms.join("|"))).expect("lithology term pattern")
}
