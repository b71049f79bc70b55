//! Wavefront OBJ output.

use std::fmt::Write;

use turtle_kernel::turtle_kernel_mesh::MeshExport;

/// Render a mesh as OBJ text.
///
/// Faces become `f` records. Edges not on any face become `l` records so
/// open polylines survive the export.
pub fn write_obj(mesh: &MeshExport) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "# turtle mesh export");
    for [x, y, z] in &mesh.vertices {
        let _ = writeln!(out, "v {x} {y} {z}");
    }

    let mut on_face = std::collections::HashSet::new();
    for face in &mesh.faces {
        let n = face.len();
        for i in 0..n {
            let (a, b) = (face[i], face[(i + 1) % n]);
            on_face.insert([a.min(b), a.max(b)]);
        }
    }
    for [a, b] in &mesh.edges {
        if !on_face.contains(&[*a, *b]) {
            let _ = writeln!(out, "l {} {}", a + 1, b + 1);
        }
    }

    for face in &mesh.faces {
        out.push('f');
        for i in face {
            let _ = write!(out, " {}", i + 1);
        }
        out.push('\n');
    }
    out
}
