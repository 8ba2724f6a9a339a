//! Protocol layer configuration.

/// What happens to the dispatcher thread when its supervisor is dropped.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ShutdownPolicy {
    /// Leave the thread running until process exit
    #[default]
    Detach,
    /// Signal shutdown and wait for the thread. Blocks until the bridge
    /// delivers another event or closes.
    Join,
}

/// Session configuration.
#[derive(Debug, Clone)]
pub struct CollabConfig {
    /// Name given to the dispatcher OS thread
    pub dispatcher_thread_name: String,
    /// Echo decode diagnostics to the host console
    pub echo_diagnostics: bool,
    /// Prefix for echoed diagnostics
    pub diagnostic_prefix: String,
    /// Queue length above which a warning is logged (None = never warn).
    /// The queue stays unbounded either way.
    pub queue_high_water: Option<usize>,
    /// Dispatcher lifecycle on drop
    pub shutdown_policy: ShutdownPolicy,
}

impl Default for CollabConfig {
    fn default() -> Self {
        Self {
            dispatcher_thread_name: "collabedit-inbound".to_string(),
            echo_diagnostics: true,
            diagnostic_prefix: "info: ".to_string(),
            queue_high_water: Some(10_000),
            shutdown_policy: ShutdownPolicy::Detach,
        }
    }
}
