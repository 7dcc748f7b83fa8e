//! Events that trigger link state transitions

/// Events that can trigger link state transitions
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum LinkEvent {
    /// A `get` or `set` command was parsed and accepted
    CommandAccepted,
    /// Time since the last accepted command exceeded the timeout
    DeadlineElapsed,
}
