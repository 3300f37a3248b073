//! Data model for diagnostic sessions

pub mod member;
pub mod module;
pub mod payload;
pub mod prediction;

pub use member::Member;
pub use module::{FieldKind, FieldSpec, Module, ModuleCatalog, ModuleKind};
pub use payload::{RawForm, SubmissionPayload};
pub use prediction::{Direction, FactorExplanation, PredictionResult};
