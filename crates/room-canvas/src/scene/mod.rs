//! CPU-side scene graph: an arena of nodes referencing shared geometry and materials.

pub mod gltf;

use glam::{Mat4, Vec3};

pub type NodeId = usize;

#[repr(C)]
#[derive(Copy, Clone, Debug, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct MeshVertex {
    pub position: [f32; 3],
    pub normal: [f32; 3],
    pub uv: [f32; 2],
}

const _: [(); 32] = [(); core::mem::size_of::<MeshVertex>()];

#[derive(Clone, Debug, Default)]
pub struct Geometry {
    pub vertices: Vec<MeshVertex>,
    pub indices: Vec<u32>,
}

#[derive(Clone, Debug, PartialEq)]
pub struct Material {
    pub name: Option<String>,
    pub is_transparent: bool,
    pub base_color: [f32; 4],
    /// Index into [`Scene::images`], used as a baked light map.
    pub base_color_texture: Option<usize>,
}

impl Default for Material {
    fn default() -> Self {
        Self {
            name: None,
            is_transparent: false,
            base_color: [1.0; 4],
            base_color_texture: None,
        }
    }
}

#[derive(Clone, Debug)]
pub struct ImageData {
    pub width: u32,
    pub height: u32,
    pub rgba: Vec<u8>,
}

/// A drawable: geometry rendered with one material.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct GeometryBinding {
    pub geometry: usize,
    pub material: usize,
}

#[derive(Clone, Debug, Default)]
pub struct Node {
    pub name: Option<String>,
    /// Local transform; `None` means identity.
    pub transform: Option<Mat4>,
    pub bindings: Vec<GeometryBinding>,
    pub children: Vec<NodeId>,
}

#[derive(Clone, Debug, Default)]
pub struct Scene {
    pub nodes: Vec<Node>,
    pub roots: Vec<NodeId>,
    pub geometries: Vec<Geometry>,
    pub materials: Vec<Material>,
    pub images: Vec<ImageData>,
}

impl Scene {
    pub fn add_node(&mut self, node: Node) -> NodeId {
        self.nodes.push(node);
        self.nodes.len() - 1
    }

    pub fn add_child(&mut self, parent: NodeId, node: Node) -> NodeId {
        let id = self.add_node(node);
        self.nodes[parent].children.push(id);
        id
    }

    pub fn add_geometry(&mut self, geometry: Geometry) -> usize {
        self.geometries.push(geometry);
        self.geometries.len() - 1
    }

    pub fn add_material(&mut self, material: Material) -> usize {
        self.materials.push(material);
        self.materials.len() - 1
    }

    /// World-space bounds of all geometry, if any.
    pub fn bounds(&self) -> Option<(Vec3, Vec3)> {
        let mut min = Vec3::splat(f32::INFINITY);
        let mut max = Vec3::splat(f32::NEG_INFINITY);
        let mut stack: Vec<(NodeId, Mat4)> =
            self.roots.iter().map(|r| (*r, Mat4::IDENTITY)).collect();

        while let Some((id, parent)) = stack.pop() {
            let Some(node) = self.nodes.get(id) else {
                continue;
            };
            let world = parent * node.transform.unwrap_or(Mat4::IDENTITY);
            for b in &node.bindings {
                if let Some(g) = self.geometries.get(b.geometry) {
                    for v in &g.vertices {
                        let p = world.transform_point3(Vec3::from(v.position));
                        min = min.min(p);
                        max = max.max(p);
                    }
                }
            }
            stack.extend(node.children.iter().map(|c| (*c, world)));
        }

        (min.x <= max.x).then_some((min, max))
    }
}

/// Extracts the numeric ID from names such as `asset_42` or `room.asset_7_floor`.
pub fn parse_asset_id(name: &str) -> Option<u32> {
    let start = name.find("asset_")? + "asset_".len();
    let digits: String = name[start..]
        .chars()
        .take_while(|c| c.is_ascii_digit())
        .collect();
    digits.parse().ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn triangle() -> Geometry {
        let v = |x: f32, z: f32| MeshVertex {
            position: [x, 0.0, z],
            normal: [0.0, 1.0, 0.0],
            uv: [0.0, 0.0],
        };
        Geometry {
            vertices: vec![v(0.0, 0.0), v(1.0, 0.0), v(0.0, 1.0)],
            indices: vec![0, 1, 2],
        }
    }

    #[test]
    fn parses_asset_ids() {
        assert_eq!(parse_asset_id("asset_42"), Some(42));
        assert_eq!(parse_asset_id("room.asset_7_floor"), Some(7));
        assert_eq!(parse_asset_id("asset_"), None);
        assert_eq!(parse_asset_id("wall"), None);
    }

    #[test]
    fn bounds_include_transforms() {
        let mut scene = Scene::default();
        let g = scene.add_geometry(triangle());
        let m = scene.add_material(Material::default());
        let root = scene.add_node(Node {
            transform: Some(Mat4::from_translation(Vec3::new(10.0, 0.0, 0.0))),
            ..Node::default()
        });
        scene.roots.push(root);
        scene.add_child(
            root,
            Node {
                bindings: vec![GeometryBinding {
                    geometry: g,
                    material: m,
                }],
                ..Node::default()
            },
        );

        let (min, max) = scene.bounds().unwrap();
        assert_eq!(min, Vec3::new(10.0, 0.0, 0.0));
        assert_eq!(max, Vec3::new(11.0, 0.0, 1.0));
    }

    #[test]
    fn empty_scene_has_no_bounds() {
        assert!(Scene::default().bounds().is_none());
    }
}
