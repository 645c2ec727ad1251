//! Pure nutrition domain logic: the food catalog, detection fusion, meal
//! scoring, spike prediction and weekly gap analysis. Nothing here touches
//! the database or the network.

pub mod catalog;
pub mod fusion;
pub mod gaps;
pub mod heuristics;
pub mod spike;
pub mod synonyms;
