//! DTZ "Schreiben" letter correction.
//!
//! # Data Flow
//! ```text
//! JSON body
//!     → validation.rs (text / prompt / type present, word count ≥ minimum)
//!     → prompt.rs (examiner instructions + user letter)
//!     → upstream complete_json::<CorrectionReport>
//!     → types.rs (CorrectionResponse: echo input, report, missing points)
//! ```

pub mod prompt;
pub mod types;
pub mod validation;

pub use types::{CorrectionReport, CorrectionRequest, CorrectionResponse, LetterType};
pub use validation::validate_correction;
