use thiserror::Error;

/// Raised when a dotted key does not name anything on an Input or Output
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BindingError {
    #[error("{kind} has no control \"{key}\"")]
    UnknownControl { kind: &'static str, key: String },

    #[error("{kind} control \"{control}\" has no component \"{component}\"")]
    UnknownComponent {
        kind: &'static str,
        control: String,
        component: String,
    },

    #[error("{kind} control \"{control}\" needs a component (e.g. \"{control}.x\")")]
    MissingComponent { kind: &'static str, control: String },

    #[error("{kind} control \"{control}\" does not take a component")]
    UnexpectedComponent { kind: &'static str, control: String },
}
