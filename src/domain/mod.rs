//! Domain controllers.
//!
//! Each protocol domain gets a facade over a shared [`DomainController`]
//! that turns method calls into command frames and fans domain events
//! out to registered handlers.
//!
//! # Modules
//!
//! | Module | Description |
//! |--------|-------------|
//! | `controller` | `DomainController` base: `call`, `on`, `off`, `events` |
//! | `debugger` | Execution control and breakpoints |
//! | `runtime` | Evaluation and remote objects |
//! | `console` | Console messages |
//! | `profiler` | CPU sampling |
//! | `heap_profiler` | Heap snapshots and allocation tracking |
//! | `schema` | Domain introspection |
//! | `registry` | `Controllers` composition root |
//! | `types` | Typed params and results |

// ============================================================================
// Submodules
// ============================================================================

/// Domain controller base.
pub mod controller;

/// Console domain.
pub mod console;

/// Debugger domain.
pub mod debugger;

/// HeapProfiler domain.
pub mod heap_profiler;

/// Profiler domain.
pub mod profiler;

/// Controller registry.
pub mod registry;

/// Runtime domain.
pub mod runtime;

/// Schema domain.
pub mod schema;

/// Typed params and results.
pub mod types;

// ============================================================================
// Re-exports
// ============================================================================

pub use console::Console;
pub use controller::{DomainController, EventHandler, EventStream};
pub use debugger::Debugger;
pub use heap_profiler::HeapProfiler;
pub use profiler::Profiler;
pub use registry::Controllers;
pub use runtime::Runtime;
pub use schema::Schema;
pub use types::{
    BreakpointSet, DomainsResult, EvaluateOptions, EvaluateResult, ExceptionDetails, Location,
    PauseOnExceptions, PropertiesResult, PropertyDescriptor, RemoteObject, SchemaDomain,
    ScriptSource,
};
