//! Wavefront OBJ import.
//!
//! Only the geometry subset needed for collision hulls is understood:
//! `v` positions, `f` faces (fan-triangulated, with optional texture and
//! normal references, negative indices allowed), and `o`/`g` statements
//! that split a file into several meshes. Everything else is ignored.

use crate::error::AssetError;
use mazerun_core::Vec3;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use tracing::debug;

/// One triangulated mesh.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct SourceMesh {
    /// Vertex positions referenced by this mesh.
    pub positions: Vec<Vec3>,
    /// Triangle list, three indices per triangle into `positions`.
    pub indices: Vec<u32>,
}

impl SourceMesh {
    /// Number of triangles.
    pub fn num_triangles(&self) -> usize {
        self.indices.len() / 3
    }
}

/// All meshes imported from one file.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct SourceObject {
    /// Meshes in file order.
    pub meshes: Vec<SourceMesh>,
}

/// Result of importing a batch of asset files, one object per file.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ImportedAssets {
    /// Objects in the order their paths were given.
    pub objects: Vec<SourceObject>,
}

impl ImportedAssets {
    /// Import each path as one object.
    ///
    /// # Errors
    ///
    /// Returns [`AssetError::Io`] if a file cannot be read,
    /// [`AssetError::Parse`] on malformed geometry statements, and
    /// [`AssetError::Empty`] if a file has no faces.
    pub fn import_from_disk<P: AsRef<Path>>(paths: &[P]) -> Result<Self, AssetError> {
        let objects = paths
            .iter()
            .map(|p| {
                let path = p.as_ref();
                let text = std::fs::read_to_string(path).map_err(|source| AssetError::Io {
                    path: path.to_path_buf(),
                    source,
                })?;
                let object = parse_obj(&text, path)?;
                debug!(
                    path = %path.display(),
                    meshes = object.meshes.len(),
                    "imported collision asset"
                );
                Ok(object)
            })
            .collect::<Result<Vec<_>, AssetError>>()?;
        Ok(Self { objects })
    }
}

/// Accumulates one mesh, remapping file-global vertex indices to
/// mesh-local ones.
#[derive(Default)]
struct MeshBuilder {
    remap: HashMap<usize, u32>,
    mesh: SourceMesh,
}

impl MeshBuilder {
    fn local_index(&mut self, global: usize, positions: &[Vec3]) -> u32 {
        let mesh = &mut self.mesh;
        *self.remap.entry(global).or_insert_with(|| {
            mesh.positions.push(positions[global]);
            (mesh.positions.len() - 1) as u32
        })
    }

    fn finish(self, out: &mut Vec<SourceMesh>) {
        if !self.mesh.indices.is_empty() {
            out.push(self.mesh);
        }
    }
}

/// Parse OBJ text. `path` is used only for error messages.
pub fn parse_obj(text: &str, path: &Path) -> Result<SourceObject, AssetError> {
    let err = |line: usize, reason: String| AssetError::Parse {
        path: PathBuf::from(path),
        line,
        reason,
    };

    let mut positions: Vec<Vec3> = Vec::new();
    let mut meshes = Vec::new();
    let mut current = MeshBuilder::default();

    for (lineno, raw) in text.lines().enumerate() {
        let lineno = lineno + 1;
        let line = raw.split('#').next().unwrap_or("").trim();
        let mut tokens = line.split_whitespace();
        let Some(keyword) = tokens.next() else {
            continue;
        };

        match keyword {
            "v" => {
                let mut xyz = [0.0f32; 3];
                for c in &mut xyz {
                    let tok = tokens
                        .next()
                        .ok_or_else(|| err(lineno, "vertex needs three coordinates".into()))?;
                    *c = tok
                        .parse()
                        .map_err(|_| err(lineno, format!("bad coordinate '{tok}'")))?;
                }
                positions.push(Vec3::new(xyz[0], xyz[1], xyz[2]));
            }
            "f" => {
                let mut corners = Vec::with_capacity(4);
                for tok in tokens {
                    let global = resolve_index(tok, positions.len())
                        .ok_or_else(|| err(lineno, format!("bad face index '{tok}'")))?;
                    corners.push(current.local_index(global, &positions));
                }
                if corners.len() < 3 {
                    return Err(err(lineno, "face needs at least three vertices".into()));
                }
                for i in 1..corners.len() - 1 {
                    current
                        .mesh
                        .indices
                        .extend_from_slice(&[corners[0], corners[i], corners[i + 1]]);
                }
            }
            "o" | "g" => {
                std::mem::take(&mut current).finish(&mut meshes);
            }
            _ => {}
        }
    }
    current.finish(&mut meshes);

    if meshes.is_empty() {
        return Err(AssetError::Empty {
            path: PathBuf::from(path),
        });
    }
    Ok(SourceObject { meshes })
}

/// Resolve a face corner like `3`, `3/1`, `3//2` or `-1` to a zero-based
/// vertex index, given the number of vertices seen so far.
fn resolve_index(tok: &str, seen: usize) -> Option<usize> {
    let idx: i64 = tok.split('/').next()?.parse().ok()?;
    let resolved = match idx {
        0 => return None,
        i if i > 0 => i - 1,
        i => seen as i64 + i,
    };
    (0..seen as i64)
        .contains(&resolved)
        .then_some(resolved as usize)
}
