/// Load-time error taxonomy.
/// The render core itself never fails once a scene is constructed;
/// everything here surfaces while reading meshes, materials, textures
/// or scene manifests and aborts the session with a diagnostic.
use std::fmt;
use std::path::PathBuf;

#[derive(Debug)]
pub enum LoadError {
    /// File could not be opened or read.
    Io(PathBuf, std::io::Error),
    /// An OBJ face directive had more (or fewer) than three vertices.
    MeshNotTriangulated { line: usize },
    /// Malformed OBJ/MTL directive. `line` is 1-based within the file.
    MeshParse { line: usize, message: String },
    /// A `usemtl` named a material the library never declared.
    MissingMaterial { name: String, line: usize },
    /// Texture image could not be decoded.
    TextureLoad(PathBuf, image::ImageError),
    /// Scene manifest was not valid JSON (or did not match the schema).
    SceneParse(serde_json::Error),
    /// A scene object referenced a mesh id with no matching entry.
    UnknownMeshId(String),
    /// File extension is neither .obj nor .json.
    UnsupportedFormat(String),
}

impl fmt::Display for LoadError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LoadError::Io(path, err) => write!(f, "{}: {}", path.display(), err),
            LoadError::MeshNotTriangulated { line } => {
                write!(f, "line {}: mesh is not triangulated", line)
            }
            LoadError::MeshParse { line, message } => write!(f, "line {}: {}", line, message),
            LoadError::MissingMaterial { name, line } => {
                write!(f, "line {}: unknown material: {}", line, name)
            }
            LoadError::TextureLoad(path, err) => {
                write!(f, "failed to decode texture {}: {}", path.display(), err)
            }
            LoadError::SceneParse(err) => write!(f, "failed to read scene manifest: {}", err),
            LoadError::UnknownMeshId(id) => write!(f, "mesh id not found: {}", id),
            LoadError::UnsupportedFormat(ext) => write!(f, "unsupported file format: {}", ext),
        }
    }
}

impl std::error::Error for LoadError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            LoadError::Io(_, err) => Some(err),
            LoadError::TextureLoad(_, err) => Some(err),
            LoadError::SceneParse(err) => Some(err),
            _ => None,
        }
    }
}
