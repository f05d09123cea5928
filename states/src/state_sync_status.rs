#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum StateSyncStatus {
    /// Registered, never computed.
    #[default]
    BeforeInit,
    Dirty,
    Clean,
}
