/// Errors of a [`crate::DelegateFactory`]
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum DelegateError {
    /// The delegate was already set, a deferred binding can only be patched once
    #[error("The delegate of '{0}' was already set")]
    AlreadySet(&'static str),
    /// The delegate was accessed before the graph finished initializing
    #[error("The delegate of '{0}' was accessed before it was set")]
    NotSet(&'static str),
}
