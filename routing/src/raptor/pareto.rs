/// Defines the criteria of a Pareto set. `dominates` must be a strict partial order: irreflexive,
/// asymmetric and transitive.
pub trait ParetoComparator<T> {
    /// `a` is at least as good as `b` in every criterion and better in at least one
    fn dominates(&self, a: &T, b: &T) -> bool;

    /// `a` and `b` have the same value in every criterion. Only one of them is kept.
    fn equal_criteria(&self, _a: &T, _b: &T) -> bool {
        false
    }

    /// Among elements with equal criteria, `a` replaces `b`. Must be a strict total order on such
    /// elements if the content of the set should not depend on insertion order.
    fn prefer(&self, _a: &T, _b: &T) -> bool {
        false
    }
}

/// A set of mutually non-dominated elements
#[derive(Debug, Clone)]
pub struct ParetoSet<T, C> {
    elements: Vec<T>,
    comparator: C,
}

impl<T, C: ParetoComparator<T>> ParetoSet<T, C> {
    pub fn new(comparator: C) -> Self {
        Self { elements: Vec::new(), comparator }
    }

    /// Returns false, and leaves the set unchanged, if `element` is dominated by (or no better
    /// than an equal) element of the set. Otherwise all elements it dominates are dropped.
    pub fn add(&mut self, element: T) -> bool {
        let mut replaced = None;

        for (i, existing) in self.elements.iter().enumerate() {
            debug_assert!(
                !(self.comparator.dominates(existing, &element) && self.comparator.dominates(&element, existing)),
                "Dominance must be asymmetric"
            );

            if self.comparator.dominates(existing, &element) {
                return false;
            }
            if self.comparator.equal_criteria(existing, &element) {
                if !self.comparator.prefer(&element, existing) {
                    return false;
                }
                replaced = Some(i);
            }
        }

        if let Some(i) = replaced {
            self.elements.swap_remove(i);
        }
        let comparator = &self.comparator;
        self.elements.retain(|existing| !comparator.dominates(&element, existing));
        self.elements.push(element);
        true
    }

    /// True if `element` would not be added
    pub fn rejects(&self, element: &T) -> bool {
        self.elements.iter().any(|existing| {
            self.comparator.dominates(existing, element)
                || (self.comparator.equal_criteria(existing, element) && !self.comparator.prefer(element, existing))
        })
    }

    pub fn iter(&self) -> impl Iterator<Item = &T> {
        self.elements.iter()
    }

    pub fn len(&self) -> usize {
        self.elements.len()
    }

    pub fn is_empty(&self) -> bool {
        self.elements.is_empty()
    }

    pub fn clear(&mut self) {
        self.elements.clear();
    }

    /// Updates every element in place. The caller is responsible for the result still being
    /// non-dominated, or re-adding the elements otherwise.
    pub fn update_all(&mut self, f: impl FnMut(&mut T)) {
        self.elements.iter_mut().for_each(f);
    }

    pub fn into_vec(self) -> Vec<T> {
        self.elements
    }
}

impl<T, C: ParetoComparator<T>> Extend<T> for ParetoSet<T, C> {
    fn extend<I: IntoIterator<Item = T>>(&mut self, iter: I) {
        for element in iter {
            self.add(element);
        }
    }
}
