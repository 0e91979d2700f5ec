//! Circular overlap tests and the collision phase of a tick

use super::entity::Entity;
use super::game::Game;

/// Whether the circles of `a` and `b` touch or overlap
#[inline]
pub fn are_overlapping(a: &Entity, b: &Entity) -> bool {
    let reach = (f64::from(a.size()) + f64::from(b.size())) / 2.0;
    a.distance_to_entity(b) <= reach
}

impl Game {
    /// Let every overlapping pair react to each other.
    ///
    /// Pairs where neither side has collision strategies are skipped, and so
    /// are pairs with an entity that was already disposed when the pair came
    /// up. In an overlapping pair `a` reacts first, then `b`; a side disposed
    /// by then no longer reacts.
    pub(crate) fn run_collisions(&self) {
        self.0.entities.for_each_tuple(|a, b| {
            if !a.has_collision_strategies() && !b.has_collision_strategies() {
                return;
            }
            if a.is_disposed() || b.is_disposed() {
                return;
            }
            if !are_overlapping(a, b) {
                return;
            }
            a.on_collision(b);
            b.on_collision(a);
            for entity in [a, b] {
                if entity.is_disposed() {
                    self.unlink(entity);
                }
            }
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::IdSource;

    fn at(ids: &IdSource, x: f64, y: f64, size: u32) -> Entity {
        let entity = Entity::new(ids);
        entity.set_position(x, y);
        entity.set_size(size).unwrap();
        entity
    }

    #[test]
    fn test_touching_circles_overlap() {
        let ids = IdSource::new();
        let a = at(&ids, 0.0, 0.0, 10);
        assert!(are_overlapping(&a, &at(&ids, 5.0, 0.0, 10)));
        assert!(are_overlapping(&a, &at(&ids, 10.0, 0.0, 10)));
        assert!(!are_overlapping(&a, &at(&ids, 10.5, 0.0, 10)));
        assert!(are_overlapping(&a, &at(&ids, 0.0, 7.0, 4)));
        assert!(!are_overlapping(&a, &at(&ids, 0.0, 7.5, 4)));
    }
}
