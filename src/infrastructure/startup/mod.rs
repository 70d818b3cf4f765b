//! Startup resilience for store dependencies

mod guard;

pub use guard::{
    AttemptFailure, GuardState, StartupGuard, StartupObserver, StartupPolicy, TracingObserver,
};
