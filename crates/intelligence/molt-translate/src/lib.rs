//! # molt-translate
//!
//! Rule-based translation between English instructions and MoltLang tokens.
//!
//! ```text
//! "Search database for user with ID 12345, return profile as dictionary"
//!        │
//!        ▼  Detector        cues with text offsets
//!        ▼  SemanticGrouper operations paired with their source/params/returns
//!        ▼  flatten         wire order
//!        ▼  FallbackEngine  implied tokens
//!        │
//! [OP:search][SRC:db][PARAM:key=12345][RET:dict]
//! ```
//!
//! The pipeline is deterministic and never fails on unrecognised text; it
//! degrades to a shorter sequence with lower confidence.

pub mod detector;
pub mod fallback;
pub mod grouper;
pub mod phrases;
pub mod translator;

pub use detector::{DetectedCue, Detector};
pub use fallback::{FallbackEngine, FallbackRule};
pub use grouper::{Grouping, OperationGroup, SemanticGrouper, DEFAULT_RETURN_LOOKAHEAD};
pub use translator::Translator;
