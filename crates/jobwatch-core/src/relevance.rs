//! Keyword-based relevance scoring for listings.

use serde::{Deserialize, Serialize};

use crate::extract::short_field;
use crate::ListingRecord;

const FOCUS_WEIGHT: i32 = 10;
const LEADERSHIP_WEIGHT: i32 = 6;
const RESEARCH_WEIGHT: i32 = 4;
const NEGATIVE_WEIGHT: i32 = -12;

const RESEARCH_TERMS: &[&str] = &["forschung", "entwicklung", "r&d", "research", "development"];
const IRRELEVANT_TERMS: &[&str] = &[
    "vorstandsassistenz",
    "management assistant",
    "assistant",
    "assistenz",
    "sekretariat",
    "insurance",
    "versicherung",
];
const SUMMARY_KEYS: &[&str] = &["kurzbeschreibung"];
/// Both employer keys are scored; listings may carry one, the other or both.
const SCORED_KEYS: &[&str] = &["kurzbeschreibung", "arbeitgeber", "arbeitgeberName"];

const DEFAULT_FOCUS: &[&str] = &[
    "thermoanalyse", "thermophysik", "thermal analysis", "thermophysical",
    "dsc", "tga", "lfa", "dilatometrie", "dilatometer", "sta", "dma", "tma",
    "wärmeleitfähigkeit", "thermal conductivity", "diffusivität", "diffusivity",
    "kalorimetrie", "calorimetry", "cp", "wärmekapazität", "heat capacity",
    "materialcharakterisierung", "material characterization",
    "analytik", "instrumentierung", "messgerät", "labor",
    "werkstoff", "werkstoffe", "polymer", "keramik", "metall",
    "f&e", "verfahrenstechnik", "physik", "physics",
];
const DEFAULT_LEADERSHIP: &[&str] = &[
    "laborleiter", "teamleiter", "gruppenleiter", "abteilungsleiter",
    "leiter", "head", "lead", "director", "manager", "principal",
];
const DEFAULT_NEGATIVE: &[&str] = &[
    "insurance", "versicherung",
    "assistant", "assistenz", "sekretariat",
    "office", "backoffice", "reception", "empfang",
    "vorstandsassistenz", "management assistant",
];

/// Keyword lists driving [`KeywordProfile::score`]. Matching is a
/// lowercase substring test.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct KeywordProfile {
    #[serde(default)]
    pub focus: Vec<String>,
    #[serde(default)]
    pub leadership: Vec<String>,
    #[serde(default)]
    pub negative: Vec<String>,
}

impl Default for KeywordProfile {
    fn default() -> Self {
        let owned = |words: &[&str]| -> Vec<String> { words.iter().map(|w| w.to_string()).collect() };
        Self {
            focus: owned(DEFAULT_FOCUS),
            leadership: owned(DEFAULT_LEADERSHIP),
            negative: owned(DEFAULT_NEGATIVE),
        }
    }
}

fn count_hits<S: AsRef<str>>(haystack: &str, needles: &[S]) -> i32 {
    needles
        .iter()
        .filter(|needle| {
            let needle = needle.as_ref().trim().to_lowercase();
            !needle.is_empty() && haystack.contains(&needle)
        })
        .count() as i32
}

fn summary_text(item: &ListingRecord) -> String {
    format!("{} {}", item.title(), short_field(item.fields(), SUMMARY_KEYS)).to_lowercase()
}

impl KeywordProfile {
    pub fn score(&self, item: &ListingRecord) -> i32 {
        let mut text = item.title();
        for key in SCORED_KEYS {
            text.push(' ');
            text.push_str(&short_field(item.fields(), &[*key]));
        }
        let text = text.to_lowercase();

        count_hits(&text, &self.focus) * FOCUS_WEIGHT
            + count_hits(&text, &self.leadership) * LEADERSHIP_WEIGHT
            + count_hits(&text, RESEARCH_TERMS) * RESEARCH_WEIGHT
            + count_hits(&text, &self.negative) * NEGATIVE_WEIGHT
    }

    pub fn looks_leadership(&self, item: &ListingRecord) -> bool {
        count_hits(&summary_text(item), &self.leadership) > 0
    }
}

/// Assistant, secretarial and insurance postings.
pub fn is_probably_irrelevant(item: &ListingRecord) -> bool {
    count_hits(&summary_text(item), IRRELEVANT_TERMS) > 0
}

/// Split a free-form keyword list on newlines and commas.
pub fn parse_keywords(text: &str) -> Vec<String> {
    text.lines()
        .flat_map(|line| line.split(','))
        .map(str::trim)
        .filter(|word| !word.is_empty())
        .map(ToString::to_string)
        .collect()
}
