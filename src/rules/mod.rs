//! Rule collaborators consulted during compilation: material formulas, the
//! rank curve and the ability catalog.

pub mod abilities;
pub mod loader;
pub mod materials;
pub mod rank;

pub use abilities::{AbilityCatalog, AbilityDefinition, StaticAbilityCatalog};
pub use materials::{MaterialError, MaterialFormulas, MaterialProfile, MaterialTable};
pub use rank::{RankCurve, ThresholdRankCurve};
