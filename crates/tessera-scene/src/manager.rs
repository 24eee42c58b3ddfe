use crate::graph::SceneGraph;

/// Index of a scene graph owned by a [`SceneManager`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SceneId(pub usize);

/// Owns every scene graph (e.g. the render scene and a semantic scene).
pub struct SceneManager<D> {
    graphs: Vec<SceneGraph<D>>,
}

impl<D> SceneManager<D> {
    pub fn new() -> Self {
        Self { graphs: Vec::new() }
    }

    /// Create a new, empty scene graph and return its id.
    pub fn init_scene_graph(&mut self) -> SceneId {
        self.graphs.push(SceneGraph::new());
        SceneId(self.graphs.len() - 1)
    }

    /// Scene graph by id, `None` if it was never created.
    pub fn scene_graph(&self, id: SceneId) -> Option<&SceneGraph<D>> {
        self.graphs.get(id.0)
    }

    pub fn scene_graph_mut(&mut self, id: SceneId) -> Option<&mut SceneGraph<D>> {
        self.graphs.get_mut(id.0)
    }

    pub fn len(&self) -> usize {
        self.graphs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.graphs.is_empty()
    }
}

impl<D> Default for SceneManager<D> {
    fn default() -> Self {
        Self::new()
    }
}
