//! Domain catalogue.
//!
//! Lists, per domain, the command and event names the facades know about.
//! Command groups exist for documentation and validation only; nothing
//! dispatches on them and sending an unlisted command is not prevented.
//!
//! # Builtin Domains
//!
//! | Domain | Command groups |
//! |--------|----------------|
//! | `Debugger` | lifecycle, execution, breakpoints, exceptions, inspection |
//! | `Runtime` | lifecycle, evaluation, objects, startup |
//! | `Console` | lifecycle, messages |
//! | `Profiler` | lifecycle, sampling, coverage |
//! | `HeapProfiler` | lifecycle, snapshots, tracking, sampling |
//! | `Schema` | introspection |

// ============================================================================
// Imports
// ============================================================================

use rustc_hash::FxHashMap;

// ============================================================================
// Builtin Tables
// ============================================================================

type GroupTable = &'static [(&'static str, &'static [&'static str])];

const DEBUGGER_COMMANDS: GroupTable = &[
    ("lifecycle", &["enable", "disable"]),
    (
        "execution",
        &[
            "pause",
            "resume",
            "stepOver",
            "stepInto",
            "stepOut",
            "continueToLocation",
            "setSkipAllPauses",
        ],
    ),
    (
        "breakpoints",
        &[
            "setBreakpointByUrl",
            "setBreakpoint",
            "removeBreakpoint",
            "setBreakpointsActive",
            "getPossibleBreakpoints",
        ],
    ),
    ("exceptions", &["setPauseOnExceptions"]),
    (
        "inspection",
        &["getScriptSource", "evaluateOnCallFrame", "setVariableValue"],
    ),
];

const DEBUGGER_EVENTS: &[&str] = &[
    "paused",
    "resumed",
    "scriptParsed",
    "scriptFailedToParse",
    "breakpointResolved",
];

const RUNTIME_COMMANDS: GroupTable = &[
    ("lifecycle", &["enable", "disable"]),
    (
        "evaluation",
        &["evaluate", "callFunctionOn", "compileScript", "runScript", "awaitPromise"],
    ),
    ("objects", &["getProperties", "releaseObject", "releaseObjectGroup"]),
    ("startup", &["runIfWaitingForDebugger"]),
];

const RUNTIME_EVENTS: &[&str] = &[
    "consoleAPICalled",
    "exceptionThrown",
    "exceptionRevoked",
    "executionContextCreated",
    "executionContextDestroyed",
    "executionContextsCleared",
];

const CONSOLE_COMMANDS: GroupTable = &[
    ("lifecycle", &["enable", "disable"]),
    ("messages", &["clearMessages"]),
];

const CONSOLE_EVENTS: &[&str] = &["messageAdded"];

const PROFILER_COMMANDS: GroupTable = &[
    ("lifecycle", &["enable", "disable"]),
    ("sampling", &["start", "stop", "setSamplingInterval"]),
    (
        "coverage",
        &["startPreciseCoverage", "stopPreciseCoverage", "takePreciseCoverage"],
    ),
];

const PROFILER_EVENTS: &[&str] = &["consoleProfileStarted", "consoleProfileFinished"];

const HEAP_PROFILER_COMMANDS: GroupTable = &[
    ("lifecycle", &["enable", "disable"]),
    (
        "snapshots",
        &["takeHeapSnapshot", "collectGarbage", "getObjectByHeapObjectId"],
    ),
    ("tracking", &["startTrackingHeapObjects", "stopTrackingHeapObjects"]),
    ("sampling", &["startSampling", "stopSampling"]),
];

const HEAP_PROFILER_EVENTS: &[&str] = &[
    "addHeapSnapshotChunk",
    "reportHeapSnapshotProgress",
    "heapStatsUpdate",
    "lastSeenObjectId",
    "resetProfiles",
];

const SCHEMA_COMMANDS: GroupTable = &[("introspection", &["getDomains"])];

// ============================================================================
// DomainSpec
// ============================================================================

/// Named group of commands within a domain.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandGroup {
    /// Group name, e.g. `execution`.
    pub name: String,
    /// Command names without the domain prefix.
    pub commands: Vec<String>,
}

/// Commands and events of one domain.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DomainSpec {
    name: String,
    groups: Vec<CommandGroup>,
    events: Vec<String>,
}

impl DomainSpec {
    /// Creates an empty domain description.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            groups: Vec::new(),
            events: Vec::new(),
        }
    }

    /// Adds a command group.
    #[must_use]
    pub fn with_group<S: AsRef<str>>(mut self, name: impl Into<String>, commands: &[S]) -> Self {
        self.groups.push(CommandGroup {
            name: name.into(),
            commands: commands.iter().map(|c| c.as_ref().to_string()).collect(),
        });
        self
    }

    /// Adds event names.
    #[must_use]
    pub fn with_events<S: AsRef<str>>(mut self, events: &[S]) -> Self {
        self.events
            .extend(events.iter().map(|e| e.as_ref().to_string()));
        self
    }

    fn from_tables(name: &str, commands: GroupTable, events: &[&str]) -> Self {
        commands
            .iter()
            .fold(Self::new(name), |spec, (group, names)| spec.with_group(*group, *names))
            .with_events(events)
    }

    /// Domain name.
    #[inline]
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Command groups in declaration order.
    #[inline]
    #[must_use]
    pub fn groups(&self) -> &[CommandGroup] {
        &self.groups
    }

    /// All command names across groups.
    pub fn commands(&self) -> impl Iterator<Item = &str> {
        self.groups
            .iter()
            .flat_map(|g| g.commands.iter().map(String::as_str))
    }

    /// All event names.
    pub fn events(&self) -> impl Iterator<Item = &str> {
        self.events.iter().map(String::as_str)
    }

    /// Returns the commands of one group.
    #[must_use]
    pub fn group(&self, name: &str) -> Option<&CommandGroup> {
        self.groups.iter().find(|g| g.name == name)
    }

    /// Returns `true` if `command` (without prefix) is listed.
    #[must_use]
    pub fn has_command(&self, command: &str) -> bool {
        self.commands().any(|c| c == command)
    }

    /// Returns `true` if `event` (without prefix) is listed.
    #[must_use]
    pub fn has_event(&self, event: &str) -> bool {
        self.events().any(|e| e == event)
    }
}

// ============================================================================
// Catalogue
// ============================================================================

/// Advisory registry of domain vocabularies.
///
/// New domains can be registered without touching the transport or bus.
#[derive(Debug, Clone, Default)]
pub struct Catalogue {
    domains: FxHashMap<String, DomainSpec>,
}

impl Catalogue {
    /// Creates an empty catalogue.
    #[must_use]
    pub fn empty() -> Self {
        Self::default()
    }

    /// Creates a catalogue with the six builtin domains.
    #[must_use]
    pub fn builtin() -> Self {
        let mut catalogue = Self::empty();
        for spec in [
            DomainSpec::from_tables("Debugger", DEBUGGER_COMMANDS, DEBUGGER_EVENTS),
            DomainSpec::from_tables("Runtime", RUNTIME_COMMANDS, RUNTIME_EVENTS),
            DomainSpec::from_tables("Console", CONSOLE_COMMANDS, CONSOLE_EVENTS),
            DomainSpec::from_tables("Profiler", PROFILER_COMMANDS, PROFILER_EVENTS),
            DomainSpec::from_tables("HeapProfiler", HEAP_PROFILER_COMMANDS, HEAP_PROFILER_EVENTS),
            DomainSpec::from_tables("Schema", SCHEMA_COMMANDS, &[]),
        ] {
            catalogue.register(spec);
        }
        catalogue
    }

    /// Adds or replaces a domain, returning the previous description.
    pub fn register(&mut self, spec: DomainSpec) -> Option<DomainSpec> {
        self.domains.insert(spec.name.clone(), spec)
    }

    /// Looks up a domain.
    #[must_use]
    pub fn domain(&self, name: &str) -> Option<&DomainSpec> {
        self.domains.get(name)
    }

    /// Domain names, sorted.
    #[must_use]
    pub fn domain_names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.domains.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    /// Returns `true` if `domain` lists `command`.
    #[must_use]
    pub fn is_valid_command(&self, domain: &str, command: &str) -> bool {
        self.domain(domain).is_some_and(|d| d.has_command(command))
    }

    /// Returns `true` if `domain` lists `event`.
    #[must_use]
    pub fn is_valid_event(&self, domain: &str, event: &str) -> bool {
        self.domain(domain).is_some_and(|d| d.has_event(event))
    }

    /// Validates a full `<Domain>.<command>` method name.
    #[must_use]
    pub fn is_valid_method(&self, method: &str) -> bool {
        method
            .split_once('.')
            .is_some_and(|(domain, command)| self.is_valid_command(domain, command))
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builtin_domains() {
        let catalogue = Catalogue::builtin();
        assert_eq!(
            catalogue.domain_names(),
            vec!["Console", "Debugger", "HeapProfiler", "Profiler", "Runtime", "Schema"]
        );
    }

    #[test]
    fn test_command_validation() {
        let catalogue = Catalogue::builtin();
        assert!(catalogue.is_valid_command("Debugger", "pause"));
        assert!(catalogue.is_valid_command("Runtime", "getProperties"));
        assert!(!catalogue.is_valid_command("Debugger", "explode"));
        assert!(!catalogue.is_valid_command("Nope", "pause"));
        assert!(catalogue.is_valid_method("Schema.getDomains"));
        assert!(!catalogue.is_valid_method("Schema"));
    }

    #[test]
    fn test_event_validation() {
        let catalogue = Catalogue::builtin();
        assert!(catalogue.is_valid_event("Debugger", "paused"));
        assert!(catalogue.is_valid_event("Console", "messageAdded"));
        assert!(!catalogue.is_valid_event("Debugger", "pause"));
        assert!(!catalogue.is_valid_event("Schema", "anything"));
    }

    #[test]
    fn test_groups_are_documentation() {
        let catalogue = Catalogue::builtin();
        let debugger = catalogue.domain("Debugger").expect("builtin");
        let execution = debugger.group("execution").expect("group");
        assert!(execution.commands.iter().any(|c| c == "stepOver"));
        assert!(debugger.group("breakpoints").expect("group").commands.len() >= 3);
        assert!(debugger.group("missing").is_none());
    }

    #[test]
    fn test_register_new_domain() {
        let mut catalogue = Catalogue::builtin();
        let previous = catalogue.register(
            DomainSpec::new("Network")
                .with_group("lifecycle", &["enable", "disable"])
                .with_events(&["requestWillBeSent"]),
        );

        assert!(previous.is_none());
        assert!(catalogue.is_valid_command("Network", "enable"));
        assert!(catalogue.is_valid_event("Network", "requestWillBeSent"));
    }

    #[test]
    fn test_register_replaces() {
        let mut catalogue = Catalogue::builtin();
        let previous = catalogue.register(DomainSpec::new("Schema"));
        assert!(previous.is_some_and(|p| p.has_command("getDomains")));
        assert!(!catalogue.is_valid_command("Schema", "getDomains"));
    }
}
