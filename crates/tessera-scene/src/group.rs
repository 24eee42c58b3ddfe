/// An ordered collection of drawables rendered together.
#[derive(Debug)]
pub struct DrawableGroup<D> {
    items: Vec<D>,
}

impl<D> DrawableGroup<D> {
    pub fn new() -> Self {
        Self { items: Vec::new() }
    }

    /// Append a drawable; draw order is insertion order.
    pub fn add(&mut self, drawable: D) {
        self.items.push(drawable);
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, D> {
        self.items.iter()
    }

    pub fn iter_mut(&mut self) -> std::slice::IterMut<'_, D> {
        self.items.iter_mut()
    }

    /// Keep only the drawables matching the predicate.
    pub fn retain(&mut self, keep: impl FnMut(&D) -> bool) {
        self.items.retain(keep);
    }
}

impl<D> Default for DrawableGroup<D> {
    fn default() -> Self {
        Self::new()
    }
}

impl<'a, D> IntoIterator for &'a DrawableGroup<D> {
    type Item = &'a D;
    type IntoIter = std::slice::Iter<'a, D>;

    fn into_iter(self) -> Self::IntoIter {
        self.items.iter()
    }
}
