//! glTF/GLB import into the scene arena.

use super::{Geometry, GeometryBinding, ImageData, Material, MeshVertex, Node, Scene};
use anyhow::{Context, Result};
use glam::Mat4;
use std::path::Path;

pub fn load_gltf(path: &Path) -> Result<Scene> {
    let (doc, buffers, images) = gltf::import(path)
        .with_context(|| format!("failed to import glTF '{}'", path.display()))?;

    let mut scene = Scene::default();

    // Image indices are kept aligned with the document; unsupported formats
    // become 1x1 white so material references stay valid.
    for (i, image) in images.iter().enumerate() {
        let rgba = match image.format {
            gltf::image::Format::R8G8B8A8 => image.pixels.clone(),
            gltf::image::Format::R8G8B8 => image
                .pixels
                .chunks_exact(3)
                .flat_map(|c| [c[0], c[1], c[2], 255])
                .collect(),
            gltf::image::Format::R8 => image.pixels.iter().flat_map(|v| [*v, *v, *v, 255]).collect(),
            other => {
                log::warn!("image {} has unsupported format {:?}", i, other);
                scene.images.push(ImageData {
                    width: 1,
                    height: 1,
                    rgba: vec![255; 4],
                });
                continue;
            }
        };
        scene.images.push(ImageData {
            width: image.width,
            height: image.height,
            rgba,
        });
    }

    for material in doc.materials() {
        let pbr = material.pbr_metallic_roughness();
        scene.materials.push(Material {
            name: material.name().map(str::to_owned),
            is_transparent: material.alpha_mode() != gltf::material::AlphaMode::Opaque,
            base_color: pbr.base_color_factor(),
            base_color_texture: pbr
                .base_color_texture()
                .map(|info| info.texture().source().index()),
        });
    }
    let default_material = scene.materials.len();
    scene.materials.push(Material::default());

    let mut mesh_bindings: Vec<Vec<GeometryBinding>> = Vec::new();
    for mesh in doc.meshes() {
        let mut bindings = Vec::new();
        for prim in mesh.primitives() {
            if prim.mode() != gltf::mesh::Mode::Triangles {
                log::debug!("skipping non-triangle primitive in mesh {:?}", mesh.name());
                continue;
            }
            let reader = prim.reader(|b| buffers.get(b.index()).map(|bb| bb.0.as_slice()));
            let Some(positions) = reader.read_positions() else {
                continue;
            };
            let positions: Vec<[f32; 3]> = positions.collect();
            let normals: Vec<[f32; 3]> = reader
                .read_normals()
                .map(|n| n.collect())
                .unwrap_or_else(|| vec![[0.0, 1.0, 0.0]; positions.len()]);
            let uvs: Vec<[f32; 2]> = reader
                .read_tex_coords(0)
                .map(|t| t.into_f32().collect())
                .unwrap_or_else(|| vec![[0.0, 0.0]; positions.len()]);
            let indices: Vec<u32> = reader
                .read_indices()
                .map(|i| i.into_u32().collect())
                .unwrap_or_else(|| (0..positions.len() as u32).collect());

            let vertices = positions
                .iter()
                .enumerate()
                .map(|(i, p)| MeshVertex {
                    position: *p,
                    normal: normals.get(i).copied().unwrap_or([0.0, 1.0, 0.0]),
                    uv: uvs.get(i).copied().unwrap_or([0.0, 0.0]),
                })
                .collect();

            let geometry = scene.add_geometry(Geometry { vertices, indices });
            bindings.push(GeometryBinding {
                geometry,
                material: prim.material().index().unwrap_or(default_material),
            });
        }
        mesh_bindings.push(bindings);
    }

    // Node indices in the arena match the document's node indices.
    for node in doc.nodes() {
        let matrix = Mat4::from_cols_array_2d(&node.transform().matrix());
        scene.nodes.push(Node {
            name: node.name().map(str::to_owned),
            transform: (matrix != Mat4::IDENTITY).then_some(matrix),
            bindings: node
                .mesh()
                .and_then(|m| mesh_bindings.get(m.index()).cloned())
                .unwrap_or_default(),
            children: node.children().map(|c| c.index()).collect(),
        });
    }

    let roots = doc.default_scene().or_else(|| doc.scenes().next());
    scene.roots = match roots {
        Some(s) => s.nodes().map(|n| n.index()).collect(),
        None => Vec::new(),
    };

    log::info!(
        "loaded '{}': {} nodes, {} geometries, {} materials, {} images",
        path.display(),
        scene.nodes.len(),
        scene.geometries.len(),
        scene.materials.len(),
        scene.images.len()
    );

    Ok(scene)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_file_is_an_error() {
        let err = load_gltf(Path::new("does/not/exist.glb")).unwrap_err();
        assert!(err.to_string().contains("does/not/exist.glb"));
    }
}
