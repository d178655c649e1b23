/// Locomotion lock of the casting entity.
pub trait MovementLock {
    fn set_locked(&mut self, locked: bool);
}
