//! Lazy read-only queries over entities
//!
//! An [`EntityStream`] is a source of elements plus a stack of decorations
//! (filters, type narrowing). Nothing is evaluated until a terminal operation
//! such as [`EntityStream::count`] walks the source.

use std::collections::HashSet;

use glam::DVec2;

use super::entity::{Entity, EntityType};
use crate::error::CoreError;

type Source<'a, T> = Box<dyn Fn(&mut dyn FnMut(&T)) + 'a>;

pub struct EntityStream<'a, T = Entity> {
    source: Source<'a, T>,
}

impl<'a, T: EntityType> EntityStream<'a, T> {
    /// A stream that feeds every element of `source` to the visitor it is given
    pub fn new(source: impl Fn(&mut dyn FnMut(&T)) + 'a) -> Self {
        Self {
            source: Box::new(source),
        }
    }

    /// Stream over a fixed list of elements
    pub fn of(elements: Vec<T>) -> Self {
        Self::new(move |action| elements.iter().for_each(|e| action(e)))
    }

    // --- Decorations ---

    pub fn filter(self, predicate: impl Fn(&T) -> bool + 'a) -> Self {
        let parent = self.source;
        Self::new(move |action: &mut dyn FnMut(&T)| {
            parent(&mut |element: &T| {
                if predicate(element) {
                    action(element);
                }
            })
        })
    }

    /// Narrow to the elements that are a `K`
    pub fn of_type<K: EntityType>(self) -> EntityStream<'a, K> {
        let parent = self.source;
        EntityStream::new(move |action: &mut dyn FnMut(&K)| {
            parent(&mut |element: &T| {
                if let Some(typed) = K::from_entity(element.as_entity()) {
                    action(&typed);
                }
            })
        })
    }

    pub fn without(self, excluded: &Entity) -> Self {
        let excluded = excluded.clone();
        self.filter(move |element| *element.as_entity() != excluded)
    }

    /// Elements whose centre lies within `radius` of the point
    pub fn within_radius_of_point(self, x: f64, y: f64, radius: f64) -> Result<Self, CoreError> {
        if radius < 0.0 || radius.is_nan() {
            return Err(CoreError::NegativeRadius { radius });
        }
        let centre = DVec2::new(x, y);
        Ok(self.filter(move |element| element.as_entity().position().distance(centre) <= radius))
    }

    pub fn within_radius_of_entity(self, entity: &Entity, radius: f64) -> Result<Self, CoreError> {
        self.within_radius_of_point(entity.x(), entity.y(), radius)
    }

    // --- Terminal operations ---

    pub fn for_each(&self, mut action: impl FnMut(&T)) {
        (self.source)(&mut action);
    }

    /// Run `action` on the first element only, if there is one
    pub fn for_first(&self, action: impl FnOnce(&T)) {
        let mut action = Some(action);
        self.for_each(|element| {
            if let Some(action) = action.take() {
                action(element);
            }
        });
    }

    pub fn first(&self) -> Option<T> {
        let mut first = None;
        self.for_first(|element| first = Some(element.clone()));
        first
    }

    pub fn count(&self) -> usize {
        let mut count = 0;
        self.for_each(|_| count += 1);
        count
    }

    /// True for an empty stream. Visits every element.
    pub fn is_true_for_all(&self, condition: impl Fn(&T) -> bool) -> bool {
        let mut all = true;
        self.for_each(|element| all &= condition(element));
        all
    }

    /// False for an empty stream. Visits every element.
    pub fn is_true_for_any(&self, condition: impl Fn(&T) -> bool) -> bool {
        let mut any = false;
        self.for_each(|element| any |= condition(element));
        any
    }

    /// Combine every element into `initial`, in visit order. The elements are
    /// gathered first, so `combine` runs after the visit has ended.
    pub fn fold<A>(&self, initial: A, combine: impl FnMut(A, &T) -> A) -> A {
        self.create_list().iter().fold(initial, combine)
    }

    /// Map every element with `transform` and merge the results into
    /// `initial` with `combine(value, accumulated)`
    pub fn accumulate<A>(
        &self,
        mut transform: impl FnMut(&T) -> A,
        mut combine: impl FnMut(A, A) -> A,
        initial: A,
    ) -> A {
        self.fold(initial, |acc, element| combine(transform(element), acc))
    }

    pub fn create_list(&self) -> Vec<T> {
        let mut list = Vec::new();
        self.for_each(|element| list.push(element.clone()));
        list
    }

    pub fn create_set(&self) -> HashSet<T> {
        let mut set = HashSet::new();
        self.for_each(|element| {
            set.insert(element.clone());
        });
        set
    }
}
