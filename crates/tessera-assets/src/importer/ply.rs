use std::collections::HashMap;
use std::path::Path;

use tracing::debug;

use super::{AssetImporter, ImportedScene};
use crate::error::AssetError;
use crate::mesh::{sequential_indices, MeshAsset, MeshTopology};

/// Instance mesh importer for ASCII PLY files.
///
/// Reads positions, normals, colors and per-vertex `object_id`; faces are
/// fan-triangulated. A file without faces becomes a point cloud.
pub struct PlyImporter;

impl AssetImporter for PlyImporter {
    fn name(&self) -> &str {
        "ply"
    }

    fn import(&mut self, path: &Path) -> Result<ImportedScene, AssetError> {
        if !path.exists() {
            return Err(AssetError::NotFound(path.to_path_buf()));
        }
        let text = std::fs::read_to_string(path)
            .map_err(|e| AssetError::Io(path.to_path_buf(), e))?;
        let name = path
            .file_stem()
            .and_then(|s| s.to_str())
            .unwrap_or("ply")
            .to_string();
        let mesh = parse_ply(&name, &text)
            .map_err(|reason| AssetError::ImportFailed(path.to_path_buf(), reason))?;
        debug!(
            "PLY '{}': {} vertices, {} indices",
            path.display(),
            mesh.vertex_count(),
            mesh.index_count()
        );
        Ok(ImportedScene::single_mesh(mesh))
    }
}

enum Property {
    Scalar(String),
    List(String),
}

struct Element {
    name: String,
    count: usize,
    properties: Vec<Property>,
}

#[derive(Default)]
struct Row {
    scalars: HashMap<String, f64>,
    lists: HashMap<String, Vec<f64>>,
}

/// Parse the text of an ASCII PLY file into a mesh.
pub fn parse_ply(name: &str, text: &str) -> Result<MeshAsset, String> {
    let mut lines = text.lines().map(str::trim).filter(|l| !l.is_empty());

    if lines.next() != Some("ply") {
        return Err("missing 'ply' magic".into());
    }

    let mut elements: Vec<Element> = Vec::new();
    loop {
        let line = lines.next().ok_or("header is not terminated")?;
        let mut words = line.split_whitespace();
        match words.next() {
            Some("format") => {
                if words.next() != Some("ascii") {
                    return Err("only ascii PLY is supported".into());
                }
            }
            Some("element") => {
                let name = words.next().ok_or("element without a name")?;
                let count = words
                    .next()
                    .and_then(|c| c.parse().ok())
                    .ok_or_else(|| format!("element '{name}' without a count"))?;
                elements.push(Element {
                    name: name.to_string(),
                    count,
                    properties: Vec::new(),
                });
            }
            Some("property") => {
                let element = elements.last_mut().ok_or("property before any element")?;
                let rest: Vec<&str> = words.collect();
                let property = match rest.as_slice() {
                    ["list", _, _, name] => Property::List(name.to_string()),
                    [_, name] => Property::Scalar(name.to_string()),
                    _ => return Err(format!("bad property line '{line}'")),
                };
                element.properties.push(property);
            }
            Some("end_header") => break,
            _ => {}
        }
    }

    let mut positions = Vec::new();
    let mut normals = Vec::new();
    let mut colors = Vec::new();
    let mut object_ids = Vec::new();
    let mut indices = Vec::new();

    for element in &elements {
        for _ in 0..element.count {
            let line = lines
                .next()
                .ok_or_else(|| format!("file ends inside element '{}'", element.name))?;
            let row = parse_row(&element.properties, line)?;
            match element.name.as_str() {
                "vertex" => {
                    let get = |k: &str| row.scalars.get(k).copied();
                    let (Some(x), Some(y), Some(z)) = (get("x"), get("y"), get("z")) else {
                        return Err("vertex without x/y/z".into());
                    };
                    positions.push([x as f32, y as f32, z as f32]);
                    if let (Some(nx), Some(ny), Some(nz)) = (get("nx"), get("ny"), get("nz")) {
                        normals.push([nx as f32, ny as f32, nz as f32]);
                    }
                    if let (Some(r), Some(g), Some(b)) = (get("red"), get("green"), get("blue")) {
                        let a = get("alpha").unwrap_or(255.0);
                        colors.push([
                            (r / 255.0) as f32,
                            (g / 255.0) as f32,
                            (b / 255.0) as f32,
                            (a / 255.0) as f32,
                        ]);
                    }
                    if let Some(id) = get("object_id").or_else(|| get("objectId")) {
                        object_ids.push(id as u32);
                    }
                }
                "face" => {
                    let Some(corners) = row
                        .lists
                        .get("vertex_indices")
                        .or_else(|| row.lists.get("vertex_index"))
                    else {
                        return Err("face without vertex_indices".into());
                    };
                    for i in 1..corners.len().saturating_sub(1) {
                        indices.extend([corners[0] as u32, corners[i] as u32, corners[i + 1] as u32]);
                    }
                }
                _ => {}
            }
        }
    }

    if let Some(&bad) = indices.iter().find(|&&i| i as usize >= positions.len()) {
        return Err(format!("face index {bad} out of {} vertices", positions.len()));
    }

    let vertex_count = positions.len();
    let has_faces = elements.iter().any(|e| e.name == "face" && e.count > 0);
    let mut mesh = if has_faces {
        MeshAsset::new(name, MeshTopology::Triangles, positions, indices)
    } else {
        MeshAsset::new(name, MeshTopology::Points, positions, sequential_indices(vertex_count))
    };
    if normals.len() == vertex_count {
        mesh = mesh.with_normals(normals);
    }
    if colors.len() == vertex_count {
        mesh = mesh.with_colors(colors);
    }
    if object_ids.len() == vertex_count && vertex_count > 0 {
        mesh = mesh.with_object_ids(object_ids);
    }
    Ok(mesh)
}

fn parse_row(properties: &[Property], line: &str) -> Result<Row, String> {
    let mut tokens = line.split_whitespace();
    let mut next = || -> Result<f64, String> {
        let token = tokens.next().ok_or_else(|| format!("short row '{line}'"))?;
        token
            .parse::<f64>()
            .map_err(|_| format!("bad number '{token}'"))
    };
    let mut row = Row::default();
    for property in properties {
        match property {
            Property::Scalar(name) => {
                row.scalars.insert(name.clone(), next()?);
            }
            Property::List(name) => {
                let count = next()? as usize;
                let items = (0..count).map(|_| next()).collect::<Result<Vec<_>, _>>()?;
                row.lists.insert(name.clone(), items);
            }
        }
    }
    Ok(row)
}
