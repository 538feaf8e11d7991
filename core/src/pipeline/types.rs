use std::fmt;

/// Lifecycle of an `AuthenticatedCipher`.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Default)]
pub enum Lifecycle {
    #[default]
    Uninitialised,
    Initialised,
    Finished,
}

impl fmt::Display for Lifecycle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Lifecycle::Uninitialised => "uninitialised",
            Lifecycle::Initialised => "initialised",
            Lifecycle::Finished => "finished",
        };
        f.write_str(name)
    }
}
