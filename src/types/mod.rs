pub mod error;
pub mod persona;

pub use error::{PersonaError, Result};
pub use persona::{
    Classification, ComplexityReport, Origin, RepoRef, RepoSummary, UserProfile,
};
