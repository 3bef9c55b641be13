use bevy_ecs::prelude::Component;

use super::{ComponentKind, EngineComponent};

/// Hit points. `current` stays within `0..=max`.
#[derive(Component, Clone, Copy, Debug, PartialEq, Eq)]
pub struct Life {
    pub max: i32,
    pub current: i32,
}

impl Life {
    pub fn new(max: i32) -> Self {
        let max = max.max(1);
        Self { max, current: max }
    }

    pub fn is_dead(&self) -> bool {
        self.current <= 0
    }

    /// Subtract `amount` (clamped at zero). Returns the previous value.
    pub fn damage(&mut self, amount: i32) -> i32 {
        let previous = self.current;
        self.current = (self.current - amount.max(0)).max(0);
        previous
    }

    /// Add `amount` (clamped at `max`). Returns the previous value.
    pub fn heal(&mut self, amount: i32) -> i32 {
        let previous = self.current;
        self.current = (self.current + amount.max(0)).min(self.max);
        previous
    }
}

impl EngineComponent for Life {
    const KIND: ComponentKind = ComponentKind::Life;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn damage_and_heal_clamp() {
        let mut life = Life::new(10);
        assert_eq!(life.damage(4), 10);
        assert_eq!(life.current, 6);
        life.damage(100);
        assert_eq!(life.current, 0);
        assert!(life.is_dead());
        life.heal(50);
        assert_eq!(life.current, 10);
    }

    #[test]
    fn negative_amounts_do_nothing() {
        let mut life = Life::new(5);
        life.damage(-3);
        life.heal(-3);
        assert_eq!(life.current, 5);
    }
}
