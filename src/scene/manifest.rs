/// JSON scene manifests: a list of mesh entries (OBJ file plus an
/// optional texture override) and a list of placed objects referencing
/// them by id. All file paths are relative to the manifest.
use crate::error::LoadError;
use crate::rendering::texture::Texture;
use crate::scene::{obj, Mesh, Object, Scene};
use serde::Deserialize;
use std::collections::HashMap;
use std::fs;
use std::path::Path;
use std::sync::Arc;

#[derive(Deserialize)]
struct SceneData {
    #[serde(default)]
    meshes: Vec<SceneMeshData>,
    #[serde(default)]
    objects: Vec<SceneObjectData>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct SceneMeshData {
    id: String,
    obj_file: String,
    #[serde(default)]
    texture: String,
    #[serde(default)]
    texture_scale: f32,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct SceneObjectData {
    #[serde(rename = "meshID")]
    mesh_id: String,
    position: [f32; 3],
    /// Degrees in the file; converted to radians on load.
    rotation: [f32; 3],
    scale: [f32; 3],
}

pub fn load_scene_file(path: &Path) -> Result<Scene, LoadError> {
    let text = fs::read_to_string(path).map_err(|err| LoadError::Io(path.to_path_buf(), err))?;
    let data: SceneData = serde_json::from_str(&text).map_err(LoadError::SceneParse)?;

    let root = path.parent().unwrap_or_else(|| Path::new("."));
    let mut meshes: HashMap<String, Arc<Mesh>> = HashMap::new();

    for entry in &data.meshes {
        let mut mesh = obj::load_mesh_file(&root.join(&entry.obj_file))?;

        // A manifest texture overrides whatever the OBJ materials set;
        // an empty entry leaves the faces on their material texture or
        // the default face color.
        if !entry.texture.is_empty() {
            let mut texture = Texture::load(&root.join(&entry.texture))?;
            if entry.texture_scale != 0.0 {
                texture.set_scale(entry.texture_scale);
            }
            let texture = Arc::new(texture);
            for face in mesh.faces.iter_mut() {
                face.texture = Some(texture.clone());
            }
        }

        meshes.insert(entry.id.clone(), Arc::new(mesh));
    }

    let mut objects = Vec::with_capacity(data.objects.len());
    for entry in &data.objects {
        let mesh = meshes
            .get(&entry.mesh_id)
            .ok_or_else(|| LoadError::UnknownMeshId(entry.mesh_id.clone()))?;

        if entry.scale == [0.0; 3] {
            eprintln!("[WARN] object scale is zero: {}", entry.mesh_id);
        }

        let mut object = Object::new(mesh.clone());
        object.translation = entry.position.into();
        object.rotation = glam::Vec3::new(
            entry.rotation[0].to_radians(),
            entry.rotation[1].to_radians(),
            entry.rotation[2].to_radians(),
        );
        object.scale = entry.scale.into();
        objects.push(object);
    }

    Ok(Scene::new(objects))
}
