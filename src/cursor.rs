//! Pointer-following cursor: affordance matching and the follower state machine.

pub mod affordance;
pub mod machine;
