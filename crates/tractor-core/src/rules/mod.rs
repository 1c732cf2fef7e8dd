//! Trump-relative rules: card ordering, play decomposition and follow legality.
//!
//! - `trump`: display and functional orderings for a trump designation.
//! - `format`: splitting a same-suit play into singles, pairs and tractors.
//! - `legality`: deciding whether a proposed play may follow a lead.
//! - `error`: rule violations and desynchronized-state failures.

pub mod error;
pub mod format;
pub mod legality;
pub mod trump;

pub use error::{InconsistentState, InvalidPlay, PlayError};
pub use format::{FormatResolver, FormatShape, FormatSuit, Tractor, TrickFormat};
pub use legality::LegalityResolver;
pub use trump::{FunctionalSuit, TrumpDesignation, TrumpOrdering, TrumpSuit};
