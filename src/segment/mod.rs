//! Document segmentation
//!
//! Turns the flat text of an agreement into a DOCUMENT → ARTICLE → SECTION
//! tree.
//!
//! # Pipeline
//!
//! - **Line classification** ([`classify`]): Article headings, separators,
//!   and a pure Section pattern test
//! - **Structure building** ([`StructureBuilder`]): one forward pass, an
//!   open-node stack, duplicate/decoy heading resolution by minimum offset
//! - **Export** ([`flatten`]): storage rows keyed by citation
//!
//! Nothing in this module fails on malformed input. Irregularities come back
//! as [`StructuralAnomaly`] values next to the tree.
//!
//! # Example
//!
//! ```
//! use covenant::segment::{RawLine, StructureBuilder};
//!
//! let text = "ARTICLE I\nDEFINITIONS\nSection 1. Terms.\nAs used herein...\n";
//! let seg = StructureBuilder::new().build(&RawLine::split(text));
//!
//! let article = seg.root.article("I").unwrap();
//! assert_eq!(article.title, "DEFINITIONS");
//! assert_eq!(article.children[0].citation.as_deref(), Some("Article I, Section 1"));
//! ```

mod anomaly;
mod builder;
mod classify;
mod node;
pub mod numerals;
mod rows;

pub use anomaly::{AnomalyKind, StructuralAnomaly};
pub use builder::{Segment, Segmentation, StructureBuilder};
pub use classify::{
    article_numeral, classify, is_separator, match_section, section_marker, BoundaryMarker,
    MarkerKind, RawLine, SectionMatch, SectionPattern, LOOKAHEAD_WINDOW,
};
pub use node::{DocumentNode, NodeKind};
pub use rows::{flatten, StructureRow};
