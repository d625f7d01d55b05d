// mesh.rs — 内翻球体网格（相机位于球内，纹理贴在内表面）

use std::f32::consts::PI;

pub const SPHERE_RADIUS: f32 = 500.0;
pub const WIDTH_SEGMENTS: usize = 60;
pub const HEIGHT_SEGMENTS: usize = 40;

#[repr(C)]
#[derive(Debug, Copy, Clone, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct SphereVertex {
    pub position: [f32; 3],
    pub uv: [f32; 2],
}

impl SphereVertex {
    const ATTRIBS: [wgpu::VertexAttribute; 2] = wgpu::vertex_attr_array![0 => Float32x3, 1 => Float32x2];

    pub fn layout() -> wgpu::VertexBufferLayout<'static> {
        wgpu::VertexBufferLayout {
            array_stride: std::mem::size_of::<SphereVertex>() as wgpu::BufferAddress,
            step_mode: wgpu::VertexStepMode::Vertex,
            attributes: &Self::ATTRIBS,
        }
    }
}

#[derive(Debug, Clone)]
pub struct SphereMesh {
    pub vertices: Vec<SphereVertex>,
    pub indices: Vec<u32>,
}

impl SphereMesh {
    pub fn panorama() -> Self {
        build_inverted_sphere(SPHERE_RADIUS, WIDTH_SEGMENTS, HEIGHT_SEGMENTS)
    }
}

/// UV sphere mirrored on X, so triangles wind counter-clockwise when seen
/// from the center and the equirectangular image reads left-to-right.
///
/// Rows run from the north pole (v = 0, image top) to the south pole. The
/// degenerate triangles touching each pole are skipped.
pub fn build_inverted_sphere(radius: f32, width_segments: usize, height_segments: usize) -> SphereMesh {
    let width_segments = width_segments.max(3);
    let height_segments = height_segments.max(2);
    let row = width_segments + 1;

    let mut vertices = Vec::with_capacity(row * (height_segments + 1));
    let mut indices = Vec::with_capacity(width_segments * height_segments * 6);

    for iy in 0..=height_segments {
        let v = iy as f32 / height_segments as f32;
        let theta = v * PI;
        let y = radius * theta.cos();
        let sin_t = theta.sin();

        for ix in 0..=width_segments {
            let u = ix as f32 / width_segments as f32;
            let phi = u * 2.0 * PI;

            vertices.push(SphereVertex {
                position: [radius * phi.cos() * sin_t, y, radius * phi.sin() * sin_t],
                uv: [u, v],
            });
        }
    }

    for iy in 0..height_segments {
        for ix in 0..width_segments {
            let a = (iy * row + ix + 1) as u32;
            let b = (iy * row + ix) as u32;
            let c = ((iy + 1) * row + ix) as u32;
            let d = ((iy + 1) * row + ix + 1) as u32;

            if iy != 0 {
                indices.extend_from_slice(&[a, b, d]);
            }
            if iy != height_segments - 1 {
                indices.extend_from_slice(&[b, c, d]);
            }
        }
    }

    SphereMesh { vertices, indices }
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::Vec3;

    #[test]
    fn vertex_and_index_counts() {
        let mesh = SphereMesh::panorama();
        assert_eq!(mesh.vertices.len(), 61 * 41);
        // 两极各少一排三角形
        assert_eq!(mesh.indices.len(), (60 * 40 * 2 - 2 * 60) * 3);
        assert!(mesh.indices.iter().all(|&i| (i as usize) < mesh.vertices.len()));
    }

    #[test]
    fn every_vertex_lies_on_the_sphere() {
        let mesh = SphereMesh::panorama();
        for v in &mesh.vertices {
            let r = Vec3::from(v.position).length();
            assert!((r - SPHERE_RADIUS).abs() < 1e-2, "radius {r}");
            assert!((0.0..=1.0).contains(&v.uv[0]) && (0.0..=1.0).contains(&v.uv[1]));
        }
    }

    #[test]
    fn triangles_face_the_center() {
        let mesh = SphereMesh::panorama();
        for tri in mesh.indices.chunks_exact(3) {
            let [a, b, c] = [tri[0], tri[1], tri[2]].map(|i| Vec3::from(mesh.vertices[i as usize].position));
            let normal = (b - a).cross(c - a);
            let centroid = (a + b + c) / 3.0;
            assert!(normal.dot(centroid) < 0.0, "outward-facing triangle {tri:?}");
        }
    }

    #[test]
    fn top_row_is_north_pole() {
        let mesh = build_inverted_sphere(1.0, 8, 4);
        assert!((mesh.vertices[0].position[1] - 1.0).abs() < 1e-6);
        assert_eq!(mesh.vertices[0].uv[1], 0.0);
        let last = mesh.vertices.last().unwrap();
        assert!((last.position[1] + 1.0).abs() < 1e-6);
    }
}
