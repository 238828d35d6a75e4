//! Triangulated surfaces
use crate::analytics::solid_angle;
use crate::geometry::Vect3;
use crate::types::{BemError, BemResult};
use std::collections::HashMap;
use std::f64::consts::PI;

/// A mesh vertex
///
/// The index is the position of the vertex unknown (P1 degree of freedom) in the global system.
#[derive(Debug, Clone)]
pub struct Vertex {
    position: Vect3,
    index: usize,
}

impl Vertex {
    /// Create a vertex
    pub fn new(position: Vect3, index: usize) -> Self {
        Self { position, index }
    }
    /// Coordinates of the vertex
    pub fn position(&self) -> &Vect3 {
        &self.position
    }
    /// Global index of the vertex
    pub fn index(&self) -> usize {
        self.index
    }
}

/// A flat triangle of a mesh
#[derive(Debug, Clone)]
pub struct Triangle {
    vertices: [usize; 3],
    points: [Vect3; 3],
    normal: Vect3,
    area: f64,
    index: usize,
}

impl Triangle {
    /// Mesh-local indices of the three vertices
    pub fn vertices(&self) -> &[usize; 3] {
        &self.vertices
    }
    /// Coordinates of the three vertices
    pub fn points(&self) -> &[Vect3; 3] {
        &self.points
    }
    /// Unit normal, oriented by the vertex ordering
    pub fn normal(&self) -> &Vect3 {
        &self.normal
    }
    /// Area
    pub fn area(&self) -> f64 {
        self.area
    }
    /// Global index of the triangle (P0 degree of freedom)
    pub fn index(&self) -> usize {
        self.index
    }
    /// Centroid
    pub fn centroid(&self) -> Vect3 {
        (self.points[0] + self.points[1] + self.points[2]) / 3.0
    }
    /// Whether the mesh-local vertex is a corner of this triangle
    pub fn contains(&self, vertex: usize) -> bool {
        self.vertices.contains(&vertex)
    }

    /// Vector joining the two corners opposite to `vertex`, taken in cyclic order.
    ///
    /// For a triangle `(V, A, B)` this is `A - B`.
    pub fn opposite_edge(&self, vertex: usize) -> Option<Vect3> {
        self.vertices
            .iter()
            .position(|v| *v == vertex)
            .map(|k| self.points[(k + 1) % 3] - self.points[(k + 2) % 3])
    }

    /// Barycentric coordinates of a point of the triangle plane
    pub fn barycentric(&self, x: &Vect3) -> Vect3 {
        let twice_area = 2.0 * self.area;
        let [p0, p1, p2] = self.points;
        Vect3::new(
            (p1 - *x).cross(&(p2 - *x)).dot(&self.normal) / twice_area,
            (p2 - *x).cross(&(p0 - *x)).dot(&self.normal) / twice_area,
            (p0 - *x).cross(&(p1 - *x)).dot(&self.normal) / twice_area,
        )
    }
}

/// A closed, oriented triangulated surface
#[derive(Debug, Clone)]
pub struct Mesh {
    name: String,
    vertices: Vec<Vertex>,
    triangles: Vec<Triangle>,
    vertex_triangles: Vec<Vec<usize>>,
    outermost: bool,
    current_barrier: bool,
}

impl Mesh {
    /// Name of the mesh
    pub fn name(&self) -> &str {
        &self.name
    }
    /// Vertices of the mesh
    pub fn vertices(&self) -> &[Vertex] {
        &self.vertices
    }
    /// Triangles of the mesh
    pub fn triangles(&self) -> &[Triangle] {
        &self.triangles
    }
    /// Triangles adjacent to a mesh-local vertex
    pub fn vertex_triangles(&self, vertex: usize) -> impl Iterator<Item = &Triangle> + '_ {
        self.vertex_triangles[vertex]
            .iter()
            .map(|t| &self.triangles[*t])
    }
    /// Whether the mesh bounds the part of the conductor it belongs to
    pub fn outermost(&self) -> bool {
        self.outermost
    }
    /// Whether no current flows through the mesh, in which case its triangles carry no unknown
    pub fn current_barrier(&self) -> bool {
        self.current_barrier
    }
    /// Mark the mesh as outermost
    pub fn set_outermost(&mut self, outermost: bool) {
        self.outermost = outermost;
    }
    /// Mark the mesh as a current barrier
    pub fn set_current_barrier(&mut self, current_barrier: bool) {
        self.current_barrier = current_barrier;
    }
    /// Global index of the first triangle
    pub fn first_triangle_index(&self) -> Option<usize> {
        self.triangles.first().map(|t| t.index)
    }
    /// Global index of the first vertex
    pub fn first_vertex_index(&self) -> Option<usize> {
        self.vertices.first().map(|v| v.index)
    }
    /// Total area
    pub fn area(&self) -> f64 {
        self.triangles.iter().map(|t| t.area).sum()
    }

    /// Solid angle subtended by the mesh at `x`
    pub fn solid_angle(&self, x: &Vect3) -> f64 {
        self.triangles
            .iter()
            .map(|t| solid_angle(x, t.points()))
            .sum()
    }

    /// Whether the closed mesh encloses `x`
    pub fn contains_point(&self, x: &Vect3) -> bool {
        self.solid_angle(x).abs() > 2.0 * PI
    }

    /// Number the vertices contiguously from `first`
    pub(crate) fn set_vertex_indices(&mut self, first: usize) {
        for (i, v) in self.vertices.iter_mut().enumerate() {
            v.index = first + i;
        }
    }

    /// Number the triangles contiguously from `first`
    pub(crate) fn set_triangle_indices(&mut self, first: usize) {
        for (i, t) in self.triangles.iter_mut().enumerate() {
            t.index = first + i;
        }
    }
}

impl PartialEq for Mesh {
    fn eq(&self, other: &Self) -> bool {
        std::ptr::eq(self, other)
    }
}

/// Builder for a mesh
///
/// Points and triangles are given user ids; triangles refer to points by id.
pub struct MeshBuilder {
    name: String,
    points: Vec<Vect3>,
    point_ids_to_indices: HashMap<usize, usize>,
    cells: Vec<[usize; 3]>,
}

impl MeshBuilder {
    /// Create a builder
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            points: vec![],
            point_ids_to_indices: HashMap::new(),
            cells: vec![],
        }
    }

    /// Create a builder with storage reserved for the given numbers of points and triangles
    pub fn new_with_capacity(name: &str, npoints: usize, ncells: usize) -> Self {
        Self {
            name: name.to_string(),
            points: Vec::with_capacity(npoints),
            point_ids_to_indices: HashMap::with_capacity(npoints),
            cells: Vec::with_capacity(ncells),
        }
    }

    /// Add a point
    pub fn add_point(&mut self, id: usize, data: [f64; 3]) {
        self.point_ids_to_indices.insert(id, self.points.len());
        self.points.push(Vect3(data));
    }

    /// Add a triangle given the ids of its points
    pub fn add_cell(&mut self, cell_data: [usize; 3]) {
        self.cells.push(cell_data);
    }

    /// Build the mesh
    ///
    /// Vertices are numbered `0..nvertices` and triangles follow them, until a geometry renumbers
    /// them.
    pub fn create_mesh(self) -> BemResult<Mesh> {
        let nvertices = self.points.len();
        let mut vertex_triangles = vec![vec![]; nvertices];
        let mut triangles = Vec::with_capacity(self.cells.len());

        for (cell_index, cell) in self.cells.iter().enumerate() {
            let mut vertices = [0; 3];
            for (local, id) in cell.iter().enumerate() {
                vertices[local] = *self.point_ids_to_indices.get(id).ok_or_else(|| {
                    BemError::GeometryInconsistency(format!(
                        "triangle {cell_index} of mesh \"{}\" uses unknown point {id}",
                        self.name
                    ))
                })?;
            }
            let points = vertices.map(|v| self.points[v]);
            let cross = (points[1] - points[0]).cross(&(points[2] - points[0]));
            let twice_area = cross.norm();
            if twice_area == 0.0 {
                return Err(BemError::GeometryInconsistency(format!(
                    "triangle {cell_index} of mesh \"{}\" is degenerate",
                    self.name
                )));
            }
            for v in vertices {
                vertex_triangles[v].push(cell_index);
            }
            triangles.push(Triangle {
                vertices,
                points,
                normal: cross / twice_area,
                area: twice_area / 2.0,
                index: nvertices + cell_index,
            });
        }

        let vertices = self
            .points
            .into_iter()
            .enumerate()
            .map(|(index, position)| Vertex { position, index })
            .collect();

        Ok(Mesh {
            name: self.name,
            vertices,
            triangles,
            vertex_triangles,
            outermost: false,
            current_barrier: false,
        })
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use approx::assert_relative_eq;

    fn tetrahedron() -> Mesh {
        let mut b = MeshBuilder::new("tetra");
        b.add_point(10, [0.0, 0.0, 0.0]);
        b.add_point(11, [1.0, 0.0, 0.0]);
        b.add_point(12, [0.0, 1.0, 0.0]);
        b.add_point(13, [0.0, 0.0, 1.0]);
        b.add_cell([10, 12, 11]);
        b.add_cell([10, 11, 13]);
        b.add_cell([10, 13, 12]);
        b.add_cell([11, 12, 13]);
        b.create_mesh().unwrap()
    }

    #[test]
    fn test_adjacency() {
        let mesh = tetrahedron();
        assert_eq!(mesh.vertices().len(), 4);
        for v in 0..4 {
            assert_eq!(mesh.vertex_triangles(v).count(), 3);
            assert!(mesh.vertex_triangles(v).all(|t| t.contains(v)));
        }
        assert_eq!(mesh.first_triangle_index(), Some(4));
    }

    #[test]
    fn test_opposite_edge() {
        let mesh = tetrahedron();
        let t = &mesh.triangles()[3];
        // Triangle (1, 2, 3): the edge opposite to vertex 2 runs from 3 to 1.
        let edge = t.opposite_edge(2).unwrap();
        assert_eq!(edge, mesh.vertices()[3].position - mesh.vertices()[1].position);
        assert!(t.opposite_edge(0).is_none());
    }

    #[test]
    fn test_contains_point() {
        let mesh = tetrahedron();
        assert!(mesh.contains_point(&Vect3::new(0.1, 0.1, 0.1)));
        assert!(!mesh.contains_point(&Vect3::new(1.0, 1.0, 1.0)));
        assert_relative_eq!(
            mesh.solid_angle(&Vect3::new(0.2, 0.2, 0.2)).abs(),
            4.0 * PI,
            max_relative = 1e-12
        );
    }

    #[test]
    fn test_barycentric() {
        let mesh = tetrahedron();
        let t = &mesh.triangles()[3];
        let b = t.barycentric(&t.centroid());
        for i in 0..3 {
            assert_relative_eq!(b[i], 1.0 / 3.0, max_relative = 1e-12);
        }
    }

    #[test]
    fn test_unknown_point() {
        let mut b = MeshBuilder::new("broken");
        b.add_point(0, [0.0, 0.0, 0.0]);
        b.add_cell([0, 1, 2]);
        assert!(matches!(
            b.create_mesh(),
            Err(BemError::GeometryInconsistency(_))
        ));
    }
}
