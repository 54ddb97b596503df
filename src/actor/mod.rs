//! Actor side of the pipeline: state views, patches, persistence and the
//! assembler that ties blueprint synthesis to a concrete actor.

pub mod abilities;
pub mod assembler;
pub mod patch;
pub mod state;
pub mod store;

pub use abilities::{merge_abilities, AbilityMerge};
pub use assembler::{
    is_placeholder_name, ActorPatchAssembler, AssembleOptions, Assembly, BlueprintSource,
};
pub use patch::ActorPatch;
pub use state::ActorState;
pub use store::{ActorStore, JsonFileActorStore, MemoryActorStore};
