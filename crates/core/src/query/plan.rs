use std::cmp::Ordering;

type Predicate<T> = Box<dyn Fn(&T) -> bool + Send + Sync>;
type Comparator<T> = Box<dyn Fn(&T, &T) -> Ordering + Send + Sync>;

/// Sort direction applied by a [`QueryPlan`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Direction {
    #[default]
    Ascending,
    Descending,
}

/// Filter, ordering and direction applied to a snapshot.
///
/// Sorting is stable, so elements with equal keys keep snapshot order in
/// both directions. Without a sort key, `Descending` reverses the snapshot.
pub struct QueryPlan<T> {
    predicate: Option<Predicate<T>>,
    comparator: Option<Comparator<T>>,
    direction: Direction,
}

impl<T> Default for QueryPlan<T> {
    fn default() -> Self {
        Self {
            predicate: None,
            comparator: None,
            direction: Direction::Ascending,
        }
    }
}

impl<T> std::fmt::Debug for QueryPlan<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("QueryPlan")
            .field("filtered", &self.predicate.is_some())
            .field("ordered", &self.comparator.is_some())
            .field("direction", &self.direction)
            .finish()
    }
}

impl<T> QueryPlan<T> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Keeps only elements matching `predicate`. Calling it again combines
    /// both predicates with a logical AND.
    pub fn filter<P>(mut self, predicate: P) -> Self
    where
        P: Fn(&T) -> bool + Send + Sync + 'static,
        T: 'static,
    {
        self.predicate = Some(match self.predicate.take() {
            Some(existing) => Box::new(move |item: &T| existing(item) && predicate(item)),
            None => Box::new(predicate),
        });
        self
    }

    /// Orders elements by the key returned from `key`.
    pub fn order_by<K, F>(mut self, key: F) -> Self
    where
        F: Fn(&T) -> K + Send + Sync + 'static,
        K: Ord,
    {
        self.comparator = Some(Box::new(move |a: &T, b: &T| key(a).cmp(&key(b))));
        self
    }

    pub fn direction(mut self, direction: Direction) -> Self {
        self.direction = direction;
        self
    }

    pub fn descending(self) -> Self {
        self.direction(Direction::Descending)
    }

    pub fn is_filtered(&self) -> bool {
        self.predicate.is_some()
    }

    /// Applies the plan to a snapshot.
    pub fn apply(&self, mut items: Vec<T>) -> Vec<T> {
        if let Some(predicate) = &self.predicate {
            items.retain(|item| predicate(item));
        }

        match (&self.comparator, self.direction) {
            (Some(cmp), Direction::Ascending) => items.sort_by(|a, b| cmp(a, b)),
            (Some(cmp), Direction::Descending) => items.sort_by(|a, b| cmp(b, a)),
            (None, Direction::Descending) => items.reverse(),
            (None, Direction::Ascending) => {}
        }

        items
    }

    /// First element of the planned sequence.
    pub fn first(&self, items: Vec<T>) -> Option<T> {
        self.apply(items).into_iter().next()
    }

    /// Last element of the planned sequence.
    pub fn last(&self, items: Vec<T>) -> Option<T> {
        self.apply(items).pop()
    }
}
