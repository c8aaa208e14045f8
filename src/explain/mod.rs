//! Risk explanation: per-feature impact attribution, display labels and
//! risk-reduction suggestions

pub mod engine;
pub mod labels;
pub mod suggestions;

pub use engine::{
    impact_percentages, rank_by_impact, Explainer, Explanation, ExplanationSettings,
    PROFILE_STRONG_NOTE,
};
pub use labels::{display_label, strip_pipeline_prefixes, title_case};
pub use suggestions::{SuggestionRule, SuggestionTable, FALLBACK_SUGGESTION};
