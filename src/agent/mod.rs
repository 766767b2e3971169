//! Learning agents for the tutoring decision loop
//!
//! Two independent agents share responsibility for each round's action:
//!
//! - **ValueAgent**: tabular difficulty selector with epsilon-greedy
//!   exploration over a discretized state key
//! - **PolicyAgent**: preference-weight topic selector with an
//!   advantage-scaled, ratio-clipped update
//!
//! The agents never reference each other; the coordinator moves data
//! between them through explicit arguments and return values, so each
//! stays independently testable.

pub mod policy;
pub mod state_key;
pub mod value;

pub use policy::PolicyAgent;
pub use state_key::StateKey;
pub use value::ValueAgent;
