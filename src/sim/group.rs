//! Reentrant-safe element groups
//!
//! A [`Group`] may be added to and removed from while it is being iterated,
//! including from inside the iteration callback itself. Structural changes
//! requested during an iteration are queued and applied in submission order
//! once the outermost iteration returns. Nested iteration sees the contents
//! as they were when the outermost iteration started.

use std::cell::{Cell, RefCell};
use std::collections::VecDeque;
use std::fmt;

enum Pending<E> {
    Add(E),
    Remove(E),
}

/// Ordered multiset with deferred mutation during iteration
pub struct Group<E> {
    items: RefCell<Vec<E>>,
    pending: RefCell<VecDeque<Pending<E>>>,
    depth: Cell<usize>,
}

struct IterationGuard<'a> {
    depth: &'a Cell<usize>,
}

impl Drop for IterationGuard<'_> {
    fn drop(&mut self) {
        self.depth.set(self.depth.get() - 1);
    }
}

impl<E> Group<E> {
    pub fn new() -> Self {
        Self {
            items: RefCell::new(Vec::new()),
            pending: RefCell::new(VecDeque::new()),
            depth: Cell::new(0),
        }
    }

    /// Number of elements currently contained (queued changes excluded)
    pub fn len(&self) -> usize {
        self.items.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.borrow().is_empty()
    }

    /// Whether at least one iteration over this group is running
    pub fn is_iterating(&self) -> bool {
        self.depth.get() > 0
    }

    /// Number of queued mutations waiting for the iteration to end
    pub fn pending_len(&self) -> usize {
        self.pending.borrow().len()
    }

    fn enter(&self) -> IterationGuard<'_> {
        self.depth.set(self.depth.get() + 1);
        IterationGuard { depth: &self.depth }
    }
}

impl<E: Clone + PartialEq> Group<E> {
    /// Append an element, or queue the append while iterating
    pub fn add(&self, element: E) {
        if self.is_iterating() {
            self.pending.borrow_mut().push_back(Pending::Add(element));
        } else {
            self.items.borrow_mut().push(element);
        }
    }

    /// Remove the first occurrence of an element, or queue the removal while
    /// iterating. Removing an absent element does nothing.
    pub fn remove(&self, element: &E) {
        if self.is_iterating() {
            self.pending
                .borrow_mut()
                .push_back(Pending::Remove(element.clone()));
        } else {
            remove_first(&mut self.items.borrow_mut(), element);
        }
    }

    pub fn contains(&self, element: &E) -> bool {
        self.items.borrow().contains(element)
    }

    /// Whether `element` is contained once the queued changes are applied
    pub fn will_contain(&self, element: &E) -> bool {
        let mut count = self.count(element);
        for change in self.pending.borrow().iter() {
            match change {
                Pending::Add(e) if e == element => count += 1,
                Pending::Remove(e) if e == element => count = count.saturating_sub(1),
                _ => {}
            }
        }
        count > 0
    }

    /// Number of occurrences of `element`
    pub fn count(&self, element: &E) -> usize {
        self.items.borrow().iter().filter(|e| *e == element).count()
    }

    /// Copy of the current contents
    pub fn snapshot(&self) -> Vec<E> {
        self.items.borrow().clone()
    }

    /// Visit every element once, in insertion order
    pub fn for_each(&self, mut action: impl FnMut(&E)) {
        {
            let _iteration = self.enter();
            let items = self.items.borrow();
            for element in items.iter() {
                action(element);
            }
        }
        self.flush();
    }

    /// Visit every unordered pair of distinct positions once.
    ///
    /// For `n` elements this makes exactly `n * (n - 1) / 2` calls.
    pub fn for_each_tuple(&self, mut action: impl FnMut(&E, &E)) {
        {
            let _iteration = self.enter();
            let items = self.items.borrow();
            for (i, first) in items.iter().enumerate() {
                for second in &items[i + 1..] {
                    action(first, second);
                }
            }
        }
        self.flush();
    }

    /// First element satisfying `predicate`
    pub fn get_first_match(&self, mut predicate: impl FnMut(&E) -> bool) -> Option<E> {
        let found = {
            let _iteration = self.enter();
            let items = self.items.borrow();
            items.iter().find(|e| predicate(e)).cloned()
        };
        self.flush();
        found
    }

    /// All elements satisfying `predicate`, in order
    pub fn get_all_matches(&self, mut predicate: impl FnMut(&E) -> bool) -> Vec<E> {
        let found = {
            let _iteration = self.enter();
            let items = self.items.borrow();
            items.iter().filter(|e| predicate(e)).cloned().collect()
        };
        self.flush();
        found
    }

    fn flush(&self) {
        if self.is_iterating() {
            return;
        }
        let mut pending = self.pending.borrow_mut();
        if pending.is_empty() {
            return;
        }
        let mut items = self.items.borrow_mut();
        for change in pending.drain(..) {
            match change {
                Pending::Add(element) => items.push(element),
                Pending::Remove(element) => remove_first(&mut items, &element),
            }
        }
    }
}

fn remove_first<E: PartialEq>(items: &mut Vec<E>, element: &E) {
    if let Some(index) = items.iter().position(|e| e == element) {
        items.remove(index);
    }
}

impl<E> Default for Group<E> {
    fn default() -> Self {
        Self::new()
    }
}

impl<E: fmt::Debug> fmt::Debug for Group<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.items.borrow().iter()).finish()
    }
}
