use glam::Vec2;

/// Read-only view of the casting entity.
pub trait OwnerOracle {
    /// World position of the owner.
    fn position(&self) -> Vec2;

    /// Whether the owner can still act. A disabled or destroyed owner ends
    /// the cast through cleanup on the next tick.
    fn is_active(&self) -> bool {
        true
    }
}
