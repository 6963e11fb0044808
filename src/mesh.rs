//! Triangle mesh construction from chunk heightfields.
//!
//! The outer ring of a chunk tile overlaps the neighbouring chunk. Those cells
//! become *border* vertices: they take part in normal accumulation so shading
//! is continuous across chunk seams, but they are never emitted.

use glam::{Vec2, Vec3};
use tracing::debug;

use crate::curve::HeightCurve;
use crate::tilemap::Tilemap;

/// Where a heightfield cell ends up in the mesh buffers.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum VertexSlot {
    /// Index into the emitted vertex buffer.
    Interior(u32),
    /// Index into the border vertex list (not emitted).
    Border(u32),
}

/// Mesh buffers for one chunk.
#[derive(Clone, Debug, Default)]
pub struct MeshData {
    pub vertices: Vec<Vec3>,
    pub uvs: Vec<Vec2>,
    /// Interior triangles, three vertex indices each
    pub triangles: Vec<u32>,
    pub normals: Vec<Vec3>,
    border_vertices: Vec<Vec3>,
    border_triangles: Vec<[VertexSlot; 3]>,
}

impl MeshData {
    fn with_capacity(width: usize, height: usize) -> Self {
        let interior = width.saturating_sub(2) * height.saturating_sub(2);
        Self {
            vertices: Vec::with_capacity(interior),
            uvs: Vec::with_capacity(interior),
            triangles: Vec::with_capacity(interior * 6),
            normals: Vec::new(),
            border_vertices: Vec::with_capacity(width * height - interior),
            border_triangles: Vec::new(),
        }
    }

    pub fn vertex_count(&self) -> usize {
        self.vertices.len()
    }

    pub fn triangle_count(&self) -> usize {
        self.triangles.len() / 3
    }

    /// Border vertices kept for seam normals.
    pub fn border_vertices(&self) -> &[Vec3] {
        &self.border_vertices
    }

    pub fn border_triangle_count(&self) -> usize {
        self.border_triangles.len()
    }

    fn position(&self, slot: VertexSlot) -> Vec3 {
        match slot {
            VertexSlot::Interior(i) => self.vertices[i as usize],
            VertexSlot::Border(i) => self.border_vertices[i as usize],
        }
    }

    fn add_triangle(&mut self, a: VertexSlot, b: VertexSlot, c: VertexSlot) {
        match (a, b, c) {
            (VertexSlot::Interior(a), VertexSlot::Interior(b), VertexSlot::Interior(c)) => {
                self.triangles.extend_from_slice(&[a, b, c]);
            }
            _ => self.border_triangles.push([a, b, c]),
        }
    }

    /// Accumulate face normals of every triangle, interior or border, into the
    /// interior vertices they touch, then normalize.
    fn calculate_normals(&mut self) {
        let mut normals = vec![Vec3::ZERO; self.vertices.len()];

        for tri in self.triangles.chunks_exact(3) {
            let slots = [
                VertexSlot::Interior(tri[0]),
                VertexSlot::Interior(tri[1]),
                VertexSlot::Interior(tri[2]),
            ];
            let normal = self.face_normal(slots);
            for &i in tri {
                normals[i as usize] += normal;
            }
        }

        for &slots in &self.border_triangles {
            let normal = self.face_normal(slots);
            for slot in slots {
                if let VertexSlot::Interior(i) = slot {
                    normals[i as usize] += normal;
                }
            }
        }

        self.normals = normals
            .into_iter()
            .map(|n| n.try_normalize().unwrap_or(Vec3::Y))
            .collect();
    }

    /// Un-normalized face normal, so larger faces weigh more.
    fn face_normal(&self, [a, b, c]: [VertexSlot; 3]) -> Vec3 {
        let pa = self.position(a);
        let pb = self.position(b);
        let pc = self.position(c);
        (pb - pa).cross(pc - pa)
    }
}

/// Assign a slot to every cell in row-major order.
fn assign_slots(width: usize, height: usize) -> Tilemap<VertexSlot> {
    let mut slots = Tilemap::new_with(width, height, VertexSlot::Interior(0));
    let mut interior = 0u32;
    let mut border = 0u32;

    for y in 0..height {
        for x in 0..width {
            let is_border = x == 0 || y == 0 || x == width - 1 || y == height - 1;
            let slot = if is_border {
                border += 1;
                VertexSlot::Border(border - 1)
            } else {
                interior += 1;
                VertexSlot::Interior(interior - 1)
            };
            slots.set(x, y, slot);
        }
    }

    slots
}

/// Build the mesh for one chunk heightfield.
///
/// Vertex `(i, j)` sits at `(i / lod, curve(h) * height_multiplier, j / lod)`.
/// Each 2x2 block of cells yields two triangles with upward-facing winding.
/// For an `N x N` field this emits `(N-2)^2` vertices and `2(N-3)^2` triangles.
pub fn build_terrain_mesh(
    heightfield: &Tilemap<f32>,
    height_multiplier: f32,
    curve: &dyn HeightCurve,
    lod: usize,
) -> MeshData {
    let width = heightfield.width;
    let height = heightfield.height;
    let lod = lod.max(1) as f32;
    let uv_width = width as f32 / lod;
    let uv_height = height as f32 / lod;

    let slots = assign_slots(width, height);
    let mut mesh = MeshData::with_capacity(width, height);

    for (i, j, &h) in heightfield.iter() {
        let x = i as f32 / lod;
        let z = j as f32 / lod;
        let y = curve.evaluate(h) * height_multiplier;
        let position = Vec3::new(x, y, z);

        match *slots.get(i, j) {
            VertexSlot::Interior(_) => {
                mesh.vertices.push(position);
                mesh.uvs.push(Vec2::new(x / uv_width, z / uv_height));
            }
            VertexSlot::Border(_) => mesh.border_vertices.push(position),
        }
    }

    for j in 0..height.saturating_sub(1) {
        for i in 0..width.saturating_sub(1) {
            let a = *slots.get(i, j);
            let b = *slots.get(i, j + 1);
            let c = *slots.get(i + 1, j + 1);
            let d = *slots.get(i + 1, j);
            mesh.add_triangle(a, b, c);
            mesh.add_triangle(c, d, a);
        }
    }

    mesh.calculate_normals();

    debug!(
        vertices = mesh.vertex_count(),
        triangles = mesh.triangle_count(),
        border_triangles = mesh.border_triangle_count(),
        "built terrain mesh"
    );

    mesh
}
