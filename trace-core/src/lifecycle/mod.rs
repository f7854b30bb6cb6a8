//! Device lifecycle: which status changes are offered, what they need, and
//! what they are expected to produce.

mod actions;
mod confirmation;
mod return_flow;

pub use actions::{ActionError, ActionRequest, DeviceAction, is_permitted, permitted_actions};
pub use confirmation::{Confirmation, IrreversibleOperation};
pub use return_flow::{next_status_for, return_preview};
