//! Persona records and their assembly.

mod assembler;
pub(crate) mod record;

pub use assembler::{PersonaAssembler, PersonaGenerator};
pub use record::{PersonaRecord, FLAT_COLUMNS, MAX_AGE, MIN_WORKING_AGE};
