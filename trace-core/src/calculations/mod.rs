//! Valuation calculations.
//!
//! Client-side previews of the depreciation the backend applies, plus the
//! form state that decides between the computed and a manually entered value.

pub mod common;
pub mod depreciation;
pub mod valuation;

pub use depreciation::{
    DepreciationError, DepreciationInput, DepreciationResult, DepreciationSchedule,
    depreciated_value,
};
pub use valuation::ValuationForm;
