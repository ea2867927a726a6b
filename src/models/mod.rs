pub mod escrowmodel;
pub mod jobmodel;
pub mod profilemodel;
pub mod reputationmodel;

use crate::ledger::types::{ChainObject, MoveObjectContent};

/// Typed decode of one chain object. Returns `None` when the object is not the
/// expected Move struct; individual malformed fields degrade to defaults.
pub trait FromMoveObject: Sized {
    fn from_move_object(content: &MoveObjectContent) -> Option<Self>;

    fn from_chain_object(object: &ChainObject) -> Option<Self> {
        object.content().and_then(Self::from_move_object)
    }
}

/// True when `type_name` names `struct_name`, either directly
/// (`0xpkg::job::Job`) or as a type argument (`0x2::dynamic_field::Field<address, 0xpkg::reputation::Reputation>`).
pub fn type_matches(type_name: &str, struct_name: &str) -> bool {
    let suffix = format!("::{}", struct_name);
    type_name
        .split(|c| c == '<' || c == '>' || c == ',')
        .any(|part| part.trim().ends_with(&suffix))
}
