use super::error::ExpansionResult;

/// Types that can be frozen against further modification.
///
/// Once locked, every mutating operation fails with
/// [`ExpansionError::ModificationNotAllowed`](super::ExpansionError::ModificationNotAllowed).
/// There is no unlock.
pub trait Lockable {
    fn lock(&mut self);

    fn is_locked(&self) -> bool;

    /// ## Errors
    /// Returns `ModificationNotAllowed` when locked.
    fn ensure_mutable(&self) -> ExpansionResult<()>;
}
