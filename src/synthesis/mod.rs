//! Pure synthesizers: blueprint in, actor-shaped data out.
//!
//! Nothing here touches storage or logs; problems are reported in the return
//! values so the assembler decides what to surface.

pub mod health;
pub mod inference;
pub mod progression;
pub mod track;
pub mod weapons;

pub use health::{
    default_quality, merge_health_parts, AnatomyHealthSynthesizer, HealthPart, HealthSynthesis,
    MaterialFallback,
};
pub use inference::{explicit_parts, normalize_parts, KeywordPartInference, NoInference, PartInference};
pub use progression::{
    ProgressionPatch, ProgressionPatchBuilder, ProgressionSection, CANONICAL_RESISTANCES,
    CATEGORIES,
};
pub use track::{EntryInput, NodeInput, TrackNode};
pub use weapons::{NaturalWeaponRecord, NaturalWeaponSynthesizer};
