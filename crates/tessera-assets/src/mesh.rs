use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::ops::Range;

use glam::{Mat4, Vec3};
use tessera_core::Aabb;

/// How the index buffer of a mesh is assembled into primitives.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MeshTopology {
    Points,
    Lines,
    Triangles,
}

/// A contiguous index range of a tiled mesh, with its own bounds.
#[derive(Debug, Clone, PartialEq)]
pub struct MeshTile {
    pub index_range: Range<usize>,
    pub bounds: Aabb,
}

/// A loaded mesh asset (renderer-agnostic). One entry per draw call.
#[derive(Debug, Clone)]
pub struct MeshAsset {
    pub name: String,
    pub topology: MeshTopology,
    pub positions: Vec<[f32; 3]>,
    pub normals: Vec<[f32; 3]>,
    pub tex_coords: Option<Vec<[f32; 2]>>,
    pub colors: Option<Vec<[f32; 4]>>,
    /// Per-vertex semantic object ids (instance meshes)
    pub object_ids: Option<Vec<u32>>,
    pub indices: Vec<u32>,
    /// Sub-ranges drawn as separate drawables (height fields)
    pub tiles: Vec<MeshTile>,
    local_bounds: Aabb,
}

impl MeshAsset {
    /// Create a mesh and compute its local bounds from `positions`.
    pub fn new(
        name: impl Into<String>,
        topology: MeshTopology,
        positions: Vec<[f32; 3]>,
        indices: Vec<u32>,
    ) -> Self {
        let local_bounds = Aabb::from_points(positions.iter().copied().map(Vec3::from));
        Self {
            name: name.into(),
            topology,
            positions,
            normals: Vec::new(),
            tex_coords: None,
            colors: None,
            object_ids: None,
            indices,
            tiles: Vec::new(),
            local_bounds,
        }
    }

    /// Attach per-vertex normals.
    pub fn with_normals(mut self, normals: Vec<[f32; 3]>) -> Self {
        self.normals = normals;
        self
    }

    /// Attach per-vertex texture coordinates.
    pub fn with_tex_coords(mut self, tex_coords: Vec<[f32; 2]>) -> Self {
        self.tex_coords = Some(tex_coords);
        self
    }

    /// Attach per-vertex RGBA colors.
    pub fn with_colors(mut self, colors: Vec<[f32; 4]>) -> Self {
        self.colors = Some(colors);
        self
    }

    /// Attach per-vertex semantic object ids.
    pub fn with_object_ids(mut self, object_ids: Vec<u32>) -> Self {
        self.object_ids = Some(object_ids);
        self
    }

    /// Partition the index buffer into independently bounded tiles.
    pub fn with_tiles(mut self, tiles: Vec<MeshTile>) -> Self {
        self.tiles = tiles;
        self
    }

    /// Bounding box of all vertex positions in mesh-local space.
    pub fn local_bounds(&self) -> Aabb {
        self.local_bounds
    }

    pub fn vertex_count(&self) -> usize {
        self.positions.len()
    }

    pub fn index_count(&self) -> usize {
        self.indices.len()
    }

    /// Whether the mesh has anything to draw: vertices, at least one
    /// primitive, and finite bounds.
    pub fn has_geometry(&self) -> bool {
        self.vertex_count() > 0 && self.index_count() > 0 && !self.local_bounds().is_empty()
    }

    pub fn is_triangles(&self) -> bool {
        self.topology == MeshTopology::Triangles
    }

    /// Positions and triangle indices, transformed into the given frame.
    ///
    /// Non-triangle meshes carry positions but no indices.
    pub fn collision_data(&self, transform: &Mat4) -> CollisionMeshData {
        CollisionMeshData {
            positions: self
                .positions
                .iter()
                .map(|p| transform.transform_point3(Vec3::from(*p)))
                .collect(),
            indices: if self.is_triangles() {
                self.indices.clone()
            } else {
                Vec::new()
            },
        }
    }

    /// Split a triangle mesh into one mesh per object id.
    ///
    /// A triangle belongs to the object of its first vertex. Returns an
    /// empty list for meshes without object ids. Parts are ordered by id.
    pub fn split_by_object_id(&self) -> Vec<(u32, MeshAsset)> {
        let Some(ids) = &self.object_ids else {
            return Vec::new();
        };

        #[derive(Default)]
        struct Part {
            remap: HashMap<u32, u32>,
            source: Vec<u32>,
            indices: Vec<u32>,
        }

        let mut parts: BTreeMap<u32, Part> = BTreeMap::new();
        let corners = match self.topology {
            MeshTopology::Triangles => 3,
            MeshTopology::Lines => 2,
            MeshTopology::Points => 1,
        };
        for prim in self.indices.chunks_exact(corners) {
            let Some(&object) = ids.get(prim[0] as usize) else {
                continue;
            };
            let part = parts.entry(object).or_default();
            for &v in prim {
                let local = match part.remap.get(&v) {
                    Some(&local) => local,
                    None => {
                        let local = part.source.len() as u32;
                        part.source.push(v);
                        part.remap.insert(v, local);
                        local
                    }
                };
                part.indices.push(local);
            }
        }

        parts
            .into_iter()
            .map(|(object, part)| {
                let pick = |i: &u32| *i as usize;
                let positions = part.source.iter().map(|i| self.positions[pick(i)]).collect();
                let mut mesh = MeshAsset::new(
                    format!("{}_{object}", self.name),
                    self.topology,
                    positions,
                    part.indices,
                );
                if self.normals.len() == self.positions.len() {
                    mesh.normals = part.source.iter().map(|i| self.normals[pick(i)]).collect();
                }
                if let Some(tc) = &self.tex_coords {
                    mesh.tex_coords = Some(part.source.iter().map(|i| tc[pick(i)]).collect());
                }
                if let Some(colors) = &self.colors {
                    mesh.colors = Some(part.source.iter().map(|i| colors[pick(i)]).collect());
                }
                mesh.object_ids = Some(vec![object; part.source.len()]);
                (object, mesh)
            })
            .collect()
    }

    /// Line-list mesh of the unique edges of this mesh's triangles.
    pub fn wireframe(&self) -> MeshAsset {
        if !self.is_triangles() {
            return self.clone();
        }
        let mut edges = BTreeSet::new();
        for tri in self.indices.chunks_exact(3) {
            for (a, b) in [(tri[0], tri[1]), (tri[1], tri[2]), (tri[2], tri[0])] {
                edges.insert((a.min(b), a.max(b)));
            }
        }
        let indices = edges.into_iter().flat_map(|(a, b)| [a, b]).collect();
        MeshAsset::new(
            format!("{}_wireframe", self.name),
            MeshTopology::Lines,
            self.positions.clone(),
            indices,
        )
    }
}

/// Indices 0..count, for meshes imported without an index buffer.
pub fn sequential_indices(count: usize) -> Vec<u32> {
    (0..count as u32).collect()
}

/// World-space geometry used for collision and navigation.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CollisionMeshData {
    pub positions: Vec<Vec3>,
    pub indices: Vec<u32>,
}

impl CollisionMeshData {
    pub fn vertex_count(&self) -> usize {
        self.positions.len()
    }
}

/// One flattened vertex/index buffer for a whole asset hierarchy.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MeshData {
    pub vbo: Vec<Vec3>,
    pub ibo: Vec<u32>,
}

impl MeshData {
    /// Append a mesh's geometry transformed into the joined frame.
    pub fn append(&mut self, mesh: &MeshAsset, transform: &Mat4) {
        let base = self.vbo.len() as u32;
        self.vbo.extend(
            mesh.positions
                .iter()
                .map(|p| transform.transform_point3(Vec3::from(*p))),
        );
        if mesh.is_triangles() {
            self.ibo.extend(mesh.indices.iter().map(|i| base + i));
        }
    }
}

/// Raw triangle soup produced by a path finder, visualized as a wireframe.
#[derive(Debug, Clone, Default)]
pub struct NavMeshGeometry {
    pub vertices: Vec<[f32; 3]>,
    pub indices: Vec<u32>,
}

impl NavMeshGeometry {
    /// Whether there is not even one triangle to draw.
    pub fn is_empty(&self) -> bool {
        self.vertices.is_empty() || self.indices.len() < 3
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn quad_with_two_objects() -> MeshAsset {
        MeshAsset::new(
            "quad",
            MeshTopology::Triangles,
            vec![[0.0, 0.0, 0.0], [1.0, 0.0, 0.0], [1.0, 1.0, 0.0], [0.0, 1.0, 0.0]],
            vec![0, 1, 2, 2, 3, 0],
        )
        .with_object_ids(vec![7, 7, 9, 9])
    }

    #[test]
    fn test_local_bounds_cover_positions() {
        let mesh = quad_with_two_objects();
        assert_eq!(mesh.local_bounds().min, Vec3::ZERO);
        assert_eq!(mesh.local_bounds().max, Vec3::new(1.0, 1.0, 0.0));
    }

    #[test]
    fn test_has_geometry_needs_vertices_and_primitives() {
        assert!(quad_with_two_objects().has_geometry());
        let no_vertices = MeshAsset::new("void", MeshTopology::Triangles, Vec::new(), Vec::new());
        assert!(!no_vertices.has_geometry());
        let no_indices = MeshAsset::new("cloud", MeshTopology::Points, vec![[0.0; 3]], Vec::new());
        assert!(!no_indices.has_geometry());
    }

    #[test]
    fn test_split_groups_triangles_by_first_vertex_object() {
        let parts = quad_with_two_objects().split_by_object_id();
        assert_eq!(parts.len(), 2);
        assert_eq!(parts[0].0, 7);
        assert_eq!(parts[1].0, 9);
        assert_eq!(parts[0].1.index_count(), 3);
        assert_eq!(parts[0].1.vertex_count(), 3);
        // second triangle starts at vertex 2 (object 9) and reuses vertex 0
        assert_eq!(parts[1].1.vertex_count(), 3);
        assert_eq!(parts[1].1.object_ids.as_deref(), Some(&[9, 9, 9][..]));
    }

    #[test]
    fn test_split_without_object_ids_is_empty() {
        let mut mesh = quad_with_two_objects();
        mesh.object_ids = None;
        assert!(mesh.split_by_object_id().is_empty());
    }

    #[test]
    fn test_wireframe_dedups_shared_edges() {
        let wire = quad_with_two_objects().wireframe();
        assert_eq!(wire.topology, MeshTopology::Lines);
        // 4 outer edges plus the shared diagonal
        assert_eq!(wire.index_count(), 10);
    }

    #[test]
    fn test_mesh_data_offsets_indices() {
        let mesh = quad_with_two_objects();
        let mut joined = MeshData::default();
        joined.append(&mesh, &Mat4::IDENTITY);
        joined.append(&mesh, &Mat4::from_translation(Vec3::X));
        assert_eq!(joined.vbo.len(), 8);
        assert_eq!(joined.ibo[6], 4);
        assert_eq!(joined.vbo[4], Vec3::new(1.0, 0.0, 0.0));
    }
}
