//! Backward coverability search.
//!
//! The driver computes, round by round, the minimal graphs from which an error
//! graph can be covered. It stops when a round adds nothing new, or earlier on
//! one of the soft stops reported by [`CompletionStatus`].
//!
//! # Citations
//! - Backward reachability for WSTS: Abdulla et al., "Algorithmic analysis of programs with well quasi-ordered domains" (2000)
//! - Coverability for graph transformation: Bertrand et al., "Adaptive dynamic networks as well-structured transition systems" (2012)

pub mod analysis;

pub use analysis::{
    AnalysisConfig, AnalysisOutcome, BackwardAnalysis, BackwardAnalysisBuilder, CompletionStatus,
};
