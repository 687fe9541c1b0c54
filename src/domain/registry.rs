//! Controller registry.
//!
//! [`Controllers`] is the composition root: it builds one facade per
//! builtin domain over a single shared [`Transport`] and hands out
//! generic controllers for any other catalogue domain. Nothing here is
//! global; create as many registries as there are sockets.

// ============================================================================
// Imports
// ============================================================================

use std::sync::Arc;

use tracing::warn;

use crate::error::Result;
use crate::protocol::Catalogue;
use crate::transport::{Transport, TransportConfig};

use super::{Console, Debugger, DomainController, HeapProfiler, Profiler, Runtime, Schema};

// ============================================================================
// Controllers
// ============================================================================

/// One controller per domain, all sharing one transport.
///
/// # Example
///
/// ```no_run
/// use devtools_mux::{Controllers, TransportConfig};
///
/// # async fn example() -> devtools_mux::Result<()> {
/// let controllers = Controllers::connect("ws://127.0.0.1:9229/session", TransportConfig::default()).await?;
/// controllers.wait_ready().await?;
///
/// controllers.runtime().enable().await?;
/// controllers.debugger().enable().await?;
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct Controllers {
    transport: Transport,
    catalogue: Arc<Catalogue>,
    debugger: Debugger,
    runtime: Runtime,
    console: Console,
    profiler: Profiler,
    heap_profiler: HeapProfiler,
    schema: Schema,
}

impl Controllers {
    /// Builds the builtin facades over `transport`.
    #[must_use]
    pub fn new(transport: Transport) -> Self {
        Self::with_catalogue(transport, Catalogue::builtin())
    }

    /// Builds the builtin facades, validating against `catalogue`.
    ///
    /// Domains registered on `catalogue` are reachable via
    /// [`controller`](Self::controller).
    #[must_use]
    pub fn with_catalogue(transport: Transport, catalogue: Catalogue) -> Self {
        let catalogue = Arc::new(catalogue);
        let make = |domain: &str| {
            DomainController::with_catalogue(transport.clone(), domain, Arc::clone(&catalogue))
        };

        Self {
            debugger: Debugger::from_controller(make(Debugger::DOMAIN)),
            runtime: Runtime::from_controller(make(Runtime::DOMAIN)),
            console: Console::from_controller(make(Console::DOMAIN)),
            profiler: Profiler::from_controller(make(Profiler::DOMAIN)),
            heap_profiler: HeapProfiler::from_controller(make(HeapProfiler::DOMAIN)),
            schema: Schema::from_controller(make(Schema::DOMAIN)),
            transport,
            catalogue,
        }
    }

    /// Connects a new transport and builds the registry over it.
    ///
    /// # Errors
    ///
    /// Returns whatever [`Transport::connect`] returns.
    pub async fn connect(address: &str, config: TransportConfig) -> Result<Self> {
        let transport = Transport::new(config);
        transport.connect(address).await?;
        Ok(Self::new(transport))
    }

    /// Waits for the peer's handshake event.
    ///
    /// # Errors
    ///
    /// See [`Transport::wait_ready`].
    pub async fn wait_ready(&self) -> Result<()> {
        self.transport.wait_ready().await
    }

    /// Returns a controller for any domain.
    ///
    /// Builtin domains return their facade's controller so handlers are
    /// shared. Other names get a fresh controller; unknown ones are
    /// logged.
    #[must_use]
    pub fn controller(&self, domain: &str) -> DomainController {
        match domain {
            Debugger::DOMAIN => (*self.debugger).clone(),
            Runtime::DOMAIN => (*self.runtime).clone(),
            Console::DOMAIN => (*self.console).clone(),
            Profiler::DOMAIN => (*self.profiler).clone(),
            HeapProfiler::DOMAIN => (*self.heap_profiler).clone(),
            Schema::DOMAIN => (*self.schema).clone(),
            other => {
                if self.catalogue.domain(other).is_none() {
                    warn!(domain = other, "Domain not in catalogue");
                }
                DomainController::with_catalogue(
                    self.transport.clone(),
                    other,
                    Arc::clone(&self.catalogue),
                )
            }
        }
    }

    /// Returns the shared transport.
    #[inline]
    #[must_use]
    pub fn transport(&self) -> &Transport {
        &self.transport
    }

    /// Returns the catalogue.
    #[inline]
    #[must_use]
    pub fn catalogue(&self) -> &Catalogue {
        &self.catalogue
    }

    /// Debugger facade.
    #[inline]
    #[must_use]
    pub fn debugger(&self) -> &Debugger {
        &self.debugger
    }

    /// Runtime facade.
    #[inline]
    #[must_use]
    pub fn runtime(&self) -> &Runtime {
        &self.runtime
    }

    /// Console facade.
    #[inline]
    #[must_use]
    pub fn console(&self) -> &Console {
        &self.console
    }

    /// Profiler facade.
    #[inline]
    #[must_use]
    pub fn profiler(&self) -> &Profiler {
        &self.profiler
    }

    /// HeapProfiler facade.
    #[inline]
    #[must_use]
    pub fn heap_profiler(&self) -> &HeapProfiler {
        &self.heap_profiler
    }

    /// Schema facade.
    #[inline]
    #[must_use]
    pub fn schema(&self) -> &Schema {
        &self.schema
    }
}

// ============================================================================
// Tests
// ============================================================================
