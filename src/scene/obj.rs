/// Wavefront OBJ/MTL loading.
///
/// The subset understood here: `v`, `vt`, `vn`, triangular `f` in all
/// four index forms, `o` for multi-mesh files, `mtllib` and `usemtl`.
/// Indices are 1-based. Texture paths in an MTL are resolved relative
/// to the MTL file unless they begin with `/`.
use crate::error::LoadError;
use crate::rendering::texture::Texture;
use crate::scene::{Face, Mesh};
use glam::{Vec2, Vec3};
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Load an OBJ file as a single mesh. Files with several `o` sections
/// are merged; the mesh takes the file's base name.
pub fn load_mesh_file(path: &Path) -> Result<Mesh, LoadError> {
    let doc = parse_obj_file(path)?;
    let merged: Vec<RawFace> = doc
        .sections
        .into_iter()
        .flat_map(|s| s.faces)
        .collect();
    Ok(build_mesh(
        &file_stem(path),
        &doc.vertices,
        &doc.normals,
        &merged,
    ))
}

/// Load an OBJ file as one mesh per `o` section. A file without `o`
/// directives yields a single mesh named after the file.
pub fn load_meshes_file(path: &Path) -> Result<Vec<Mesh>, LoadError> {
    let doc = parse_obj_file(path)?;
    let stem = file_stem(path);
    Ok(doc
        .sections
        .into_iter()
        .filter(|s| !s.faces.is_empty())
        .map(|s| {
            let name = if s.name.is_empty() { stem.clone() } else { s.name };
            build_mesh(&name, &doc.vertices, &doc.normals, &s.faces)
        })
        .collect())
}

fn file_stem(path: &Path) -> String {
    path.file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default()
}

/// A face as parsed, with indices into the file-global tables.
#[derive(Debug)]
struct RawFace {
    indices: [usize; 3],
    uvs: [Vec2; 3],
    normals: Option<[usize; 3]>,
    texture: Option<Arc<Texture>>,
}

#[derive(Debug)]
struct Section {
    name: String,
    faces: Vec<RawFace>,
}

#[derive(Debug)]
struct ObjDocument {
    vertices: Vec<Vec3>,
    normals: Vec<Vec3>,
    sections: Vec<Section>,
}

fn parse_err(line: usize, message: impl Into<String>) -> LoadError {
    LoadError::MeshParse {
        line,
        message: message.into(),
    }
}

fn parse_obj_file(path: &Path) -> Result<ObjDocument, LoadError> {
    let text =
        fs::read_to_string(path).map_err(|err| LoadError::Io(path.to_path_buf(), err))?;
    let dir = path.parent().unwrap_or_else(|| Path::new("."));
    parse_obj(&text, dir)
}

fn parse_obj(text: &str, dir: &Path) -> Result<ObjDocument, LoadError> {
    let mut vertices: Vec<Vec3> = Vec::new();
    let mut tex_coords: Vec<Vec2> = Vec::new();
    let mut normals: Vec<Vec3> = Vec::new();
    let mut sections = vec![Section {
        name: String::new(),
        faces: Vec::new(),
    }];

    let mut materials: HashMap<String, Option<Arc<Texture>>> = HashMap::new();
    let mut current_texture: Option<Arc<Texture>> = None;

    for (index, raw_line) in text.lines().enumerate() {
        let line_no = index + 1;
        let line = raw_line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }

        let (directive, rest) = match line.split_once(char::is_whitespace) {
            Some((d, r)) => (d, r.trim()),
            None => (line, ""),
        };

        match directive {
            "v" => vertices.push(parse_vec3(rest, line_no)?),
            "vt" => tex_coords.push(parse_vec2(rest, line_no)?),
            "vn" => normals.push(parse_vec3(rest, line_no)?),
            "o" => {
                // Drop the implicit unnamed section if it is still empty.
                if sections.len() == 1
                    && sections[0].name.is_empty()
                    && sections[0].faces.is_empty()
                {
                    sections.clear();
                }
                sections.push(Section {
                    name: rest.to_string(),
                    faces: Vec::new(),
                });
            }
            "mtllib" => {
                let mtl_path = dir.join(rest);
                eprintln!("[INFO] loading material library: {}", mtl_path.display());
                load_mtl_file(&mtl_path, &mut materials)?;
            }
            "usemtl" => match materials.get(rest) {
                Some(texture) => current_texture = texture.clone(),
                None => {
                    return Err(LoadError::MissingMaterial {
                        name: rest.to_string(),
                        line: line_no,
                    })
                }
            },
            "f" => {
                let face = parse_face(
                    rest,
                    line_no,
                    &vertices,
                    &tex_coords,
                    &normals,
                    current_texture.clone(),
                )?;
                sections.last_mut().unwrap().faces.push(face);
            }
            _ => {} // s, g and friends are ignored
        }
    }

    Ok(ObjDocument {
        vertices,
        normals,
        sections,
    })
}

fn parse_floats(rest: &str, count: usize, line: usize) -> Result<Vec<f32>, LoadError> {
    let values: Vec<f32> = rest
        .split_whitespace()
        .map(|t| t.parse::<f32>())
        .collect::<Result<_, _>>()
        .map_err(|_| parse_err(line, format!("invalid number in '{}'", rest)))?;
    if values.len() < count {
        return Err(parse_err(
            line,
            format!("expected {} components, got {}", count, values.len()),
        ));
    }
    Ok(values)
}

fn parse_vec3(rest: &str, line: usize) -> Result<Vec3, LoadError> {
    let v = parse_floats(rest, 3, line)?;
    Ok(Vec3::new(v[0], v[1], v[2]))
}

fn parse_vec2(rest: &str, line: usize) -> Result<Vec2, LoadError> {
    let v = parse_floats(rest, 2, line)?;
    Ok(Vec2::new(v[0], v[1]))
}

/// 1-based index into a table of `len` entries.
fn parse_index(token: &str, len: usize, line: usize) -> Result<usize, LoadError> {
    let value: i64 = token
        .parse()
        .map_err(|_| parse_err(line, format!("invalid index '{}'", token)))?;
    if value < 1 || value as usize > len {
        return Err(parse_err(line, format!("index {} out of range", value)));
    }
    Ok(value as usize - 1)
}

fn parse_face(
    rest: &str,
    line: usize,
    vertices: &[Vec3],
    tex_coords: &[Vec2],
    normals: &[Vec3],
    texture: Option<Arc<Texture>>,
) -> Result<RawFace, LoadError> {
    let tokens: Vec<&str> = rest.split_whitespace().collect();
    if tokens.len() != 3 {
        return Err(LoadError::MeshNotTriangulated { line });
    }

    let mut indices = [0usize; 3];
    let mut uvs = [Vec2::ZERO; 3];
    let mut normal_indices = [None; 3];

    for (i, token) in tokens.iter().enumerate() {
        let parts: Vec<&str> = token.split('/').collect();
        match parts.as_slice() {
            // f a b c
            &[a] => indices[i] = parse_index(a, vertices.len(), line)?,
            // f a/t b/t c/t
            &[a, t] => {
                indices[i] = parse_index(a, vertices.len(), line)?;
                uvs[i] = tex_coords[parse_index(t, tex_coords.len(), line)?];
            }
            // f a//n b//n c//n
            &[a, "", n] => {
                indices[i] = parse_index(a, vertices.len(), line)?;
                normal_indices[i] = Some(parse_index(n, normals.len(), line)?);
            }
            // f a/t/n b/t/n c/t/n
            &[a, t, n] => {
                indices[i] = parse_index(a, vertices.len(), line)?;
                uvs[i] = tex_coords[parse_index(t, tex_coords.len(), line)?];
                normal_indices[i] = Some(parse_index(n, normals.len(), line)?);
            }
            _ => return Err(parse_err(line, format!("malformed face vertex '{}'", token))),
        }
    }

    let face_normals = match normal_indices {
        [Some(a), Some(b), Some(c)] => Some([a, b, c]),
        _ => None,
    };

    Ok(RawFace {
        indices,
        uvs,
        normals: face_normals,
        texture,
    })
}

/// Parse an MTL file and resolve its diffuse textures, adding an entry
/// per material. Texture files are decoded once and shared.
fn load_mtl_file(
    path: &Path,
    materials: &mut HashMap<String, Option<Arc<Texture>>>,
) -> Result<(), LoadError> {
    let text =
        fs::read_to_string(path).map_err(|err| LoadError::Io(path.to_path_buf(), err))?;
    let dir = path.parent().unwrap_or_else(|| Path::new("."));

    let mut declared: Vec<(String, Option<String>)> = Vec::new();

    for (index, raw_line) in text.lines().enumerate() {
        let line_no = index + 1;
        let line = raw_line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }

        if let Some(name) = line.strip_prefix("newmtl ") {
            declared.push((name.trim().to_string(), None));
        } else if let Some(map_kd) = line.strip_prefix("map_Kd ") {
            match declared.last_mut() {
                Some(entry) => entry.1 = Some(map_kd.trim().to_string()),
                None => return Err(parse_err(line_no, "map_Kd before newmtl")),
            }
        }
    }

    let mut texture_cache: HashMap<PathBuf, Arc<Texture>> = HashMap::new();

    for (name, map_kd) in declared {
        let texture = match map_kd {
            None => None,
            Some(map_kd) => {
                // Relative to the MTL file unless the path is absolute.
                let texture_path = if map_kd.starts_with('/') {
                    PathBuf::from(&map_kd)
                } else {
                    dir.join(&map_kd)
                };

                let texture = match texture_cache.get(&texture_path) {
                    Some(t) => t.clone(),
                    None => {
                        eprintln!("[INFO] loading texture: {}", texture_path.display());
                        let t = Arc::new(Texture::load(&texture_path)?);
                        texture_cache.insert(texture_path, t.clone());
                        t
                    }
                };
                Some(texture)
            }
        };
        materials.insert(name, texture);
    }

    Ok(())
}

/// Re-index a section's faces against compacted vertex/normal tables
/// holding only what the section uses.
fn build_mesh(name: &str, vertices: &[Vec3], normals: &[Vec3], raw_faces: &[RawFace]) -> Mesh {
    let mut vertex_map: HashMap<usize, usize> = HashMap::new();
    let mut normal_map: HashMap<usize, usize> = HashMap::new();
    let mut local_vertices: Vec<Vec3> = Vec::new();
    let mut local_normals: Vec<Vec3> = Vec::new();

    let mut faces = Vec::with_capacity(raw_faces.len());
    for raw in raw_faces {
        let [a, b, c] = raw.indices.map(|global| {
            *vertex_map.entry(global).or_insert_with(|| {
                local_vertices.push(vertices[global]);
                local_vertices.len() - 1
            })
        });

        let face_normals = raw.normals.map(|idx| {
            idx.map(|global| {
                *normal_map.entry(global).or_insert_with(|| {
                    local_normals.push(normals[global]);
                    local_normals.len() - 1
                })
            })
        });

        faces.push(Face {
            a,
            b,
            c,
            uvs: raw.uvs,
            normals: face_normals,
            texture: raw.texture.clone(),
        });
    }

    Mesh::new(name.to_string(), local_vertices, local_normals, faces)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(text: &str) -> Result<ObjDocument, LoadError> {
        parse_obj(text, Path::new("."))
    }

    #[test]
    fn parses_positions_only_faces() {
        let doc = parse("v 0 0 0\nv 1 0 0\nv 0 1 0\nf 1 2 3\n").unwrap();
        assert_eq!(doc.vertices.len(), 3);
        assert_eq!(doc.sections[0].faces.len(), 1);
        assert_eq!(doc.sections[0].faces[0].indices, [0, 1, 2]);
    }

    #[test]
    fn rejects_quads() {
        let err = parse("v 0 0 0\nv 1 0 0\nv 0 1 0\nv 1 1 0\nf 1 2 3 4\n").unwrap_err();
        match err {
            LoadError::MeshNotTriangulated { line } => assert_eq!(line, 5),
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn reports_the_failing_line() {
        let err = parse("v 0 0 0\nv abc 0 0\n").unwrap_err();
        match err {
            LoadError::MeshParse { line, .. } => assert_eq!(line, 2),
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn index_out_of_range_fails() {
        let err = parse("v 0 0 0\nf 1 2 3\n").unwrap_err();
        assert!(matches!(err, LoadError::MeshParse { line: 2, .. }));
    }

    #[test]
    fn unknown_material_fails() {
        let err = parse("v 0 0 0\nusemtl shiny\n").unwrap_err();
        match err {
            LoadError::MissingMaterial { name, line } => {
                assert_eq!(name, "shiny");
                assert_eq!(line, 2);
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn splits_meshes_on_object_directives() {
        let doc = parse(
            "o first\nv 0 0 0\nv 1 0 0\nv 0 1 0\nf 1 2 3\no second\nv 2 0 0\nf 2 3 4\n",
        )
        .unwrap();
        assert_eq!(doc.sections.len(), 2);
        assert_eq!(doc.sections[0].name, "first");
        assert_eq!(doc.sections[1].name, "second");
        assert_eq!(doc.sections[1].faces[0].indices, [1, 2, 3]);
    }
}
