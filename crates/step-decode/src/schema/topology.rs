//! Topology entities: vertex, edge, loop and face bound.
//!
//! Each decoder follows its references all the way down, so an
//! [`EdgeLoop`] carries its edges, their vertices and their curves.

use super::geometry::{cartesian_point, curve, Curve, Point3};
use crate::decode::{self, EntityDecoder};

/// Decoded VERTEX_POINT entity.
#[derive(Debug, Clone, PartialEq)]
pub struct Vertex {
    /// Vertex position.
    pub point: Point3,
}

/// Decoded EDGE_CURVE entity.
#[derive(Debug, Clone, PartialEq)]
pub struct Edge {
    /// Start vertex.
    pub start: Vertex,
    /// End vertex.
    pub end: Vertex,
    /// Edge geometry.
    pub curve: Curve,
    /// Whether the curve direction matches the edge direction.
    pub same_sense: bool,
}

/// Decoded ORIENTED_EDGE entity.
#[derive(Debug, Clone, PartialEq)]
pub struct OrientedEdge {
    /// The underlying edge.
    pub edge: Edge,
    /// Orientation of the edge within its loop.
    pub orientation: bool,
}

impl OrientedEdge {
    /// First vertex when walking the loop.
    pub fn start(&self) -> &Vertex {
        if self.orientation {
            &self.edge.start
        } else {
            &self.edge.end
        }
    }

    /// Last vertex when walking the loop.
    pub fn end(&self) -> &Vertex {
        if self.orientation {
            &self.edge.end
        } else {
            &self.edge.start
        }
    }
}

/// Decoded EDGE_LOOP entity.
#[derive(Debug, Clone, PartialEq)]
pub struct EdgeLoop {
    /// Oriented edges forming the loop.
    pub edges: Vec<OrientedEdge>,
}

/// Decoded FACE_BOUND / FACE_OUTER_BOUND entity.
#[derive(Debug, Clone, PartialEq)]
pub struct FaceBound {
    /// The bounding loop.
    pub edge_loop: EdgeLoop,
    /// Whether the bound orientation matches the face orientation.
    pub orientation: bool,
    /// Whether this is an outer bound.
    pub is_outer: bool,
}

/// Decode a VERTEX_POINT entity.
pub fn vertex_point() -> EntityDecoder<Vertex> {
    decode::entity(
        "VERTEX_POINT",
        decode::attribute(1, decode::reference_to(cartesian_point())).map(|point| Vertex { point }),
    )
}

/// Decode an EDGE_CURVE entity.
///
/// STEP syntax: `EDGE_CURVE(name, start, end, curve, same_sense)`
pub fn edge_curve() -> EntityDecoder<Edge> {
    decode::entity(
        "EDGE_CURVE",
        decode::map4(
            |start, end, curve, same_sense| Edge {
                start,
                end,
                curve,
                same_sense,
            },
            decode::attribute(1, decode::reference_to(vertex_point())),
            decode::attribute(2, decode::reference_to(vertex_point())),
            decode::attribute(3, decode::reference_to(curve())),
            decode::attribute(4, decode::bool()),
        ),
    )
}

/// Decode an ORIENTED_EDGE entity.
///
/// STEP syntax: `ORIENTED_EDGE(name, *, *, edge_element, orientation)`.
/// The two vertex slots are always derived.
pub fn oriented_edge() -> EntityDecoder<OrientedEdge> {
    decode::entity(
        "ORIENTED_EDGE",
        decode::map4(
            |(), (), edge, orientation| OrientedEdge { edge, orientation },
            decode::attribute(1, decode::derived(())),
            decode::attribute(2, decode::derived(())),
            decode::attribute(3, decode::reference_to(edge_curve())),
            decode::attribute(4, decode::bool()),
        ),
    )
}

/// Decode an EDGE_LOOP entity.
pub fn edge_loop() -> EntityDecoder<EdgeLoop> {
    decode::entity(
        "EDGE_LOOP",
        decode::attribute(1, decode::list(decode::reference_to(oriented_edge())))
            .map(|edges| EdgeLoop { edges }),
    )
}

fn bound(type_name: &str, is_outer: bool) -> EntityDecoder<FaceBound> {
    decode::entity(
        type_name,
        decode::map2(
            move |edge_loop, orientation| FaceBound {
                edge_loop,
                orientation,
                is_outer,
            },
            decode::attribute(1, decode::reference_to(edge_loop())),
            decode::attribute(2, decode::bool()),
        ),
    )
}

/// Decode a FACE_OUTER_BOUND entity.
pub fn face_outer_bound() -> EntityDecoder<FaceBound> {
    bound("FACE_OUTER_BOUND", true)
}

/// Decode a FACE_BOUND or FACE_OUTER_BOUND entity.
pub fn face_bound() -> EntityDecoder<FaceBound> {
    decode::one_of(vec![bound("FACE_BOUND", false), face_outer_bound()])
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::decode::{all, file, single};
    use crate::error::StepError;

    /// A unit square in the XY plane, traversed counter-clockwise.
    const SQUARE: &str = "ISO-10303-21;
HEADER;
FILE_DESCRIPTION(('square'),'2;1');
ENDSEC;
DATA;
#1 = CARTESIAN_POINT('', (0.0, 0.0, 0.0));
#2 = CARTESIAN_POINT('', (1.0, 0.0, 0.0));
#3 = CARTESIAN_POINT('', (1.0, 1.0, 0.0));
#4 = CARTESIAN_POINT('', (0.0, 1.0, 0.0));
#11 = VERTEX_POINT('', #1);
#12 = VERTEX_POINT('', #2);
#13 = VERTEX_POINT('', #3);
#14 = VERTEX_POINT('', #4);
#20 = DIRECTION('', (1.0, 0.0, 0.0));
#21 = DIRECTION('', (0.0, 1.0, 0.0));
#22 = VECTOR('', #20, 1.0);
#23 = VECTOR('', #21, 1.0);
#31 = LINE('', #1, #22);
#32 = LINE('', #2, #23);
#33 = LINE('', #4, #22);
#34 = LINE('', #1, #23);
#41 = EDGE_CURVE('', #11, #12, #31, .T.);
#42 = EDGE_CURVE('', #12, #13, #32, .T.);
#43 = EDGE_CURVE('', #14, #13, #33, .T.);
#44 = EDGE_CURVE('', #11, #14, #34, .T.);
#51 = ORIENTED_EDGE('', *, *, #41, .T.);
#52 = ORIENTED_EDGE('', *, *, #42, .T.);
#53 = ORIENTED_EDGE('', *, *, #43, .F.);
#54 = ORIENTED_EDGE('', *, *, #44, .F.);
#60 = EDGE_LOOP('', (#51, #52, #53, #54));
#70 = FACE_OUTER_BOUND('', #60, .T.);
ENDSEC;
END-ISO-10303-21;
";

    #[test]
    fn test_vertices_in_id_order() {
        let vertices = file(&all(vertex_point()), SQUARE).unwrap();
        let xs: Vec<_> = vertices.iter().map(|v| (v.point.x, v.point.y)).collect();
        assert_eq!(xs, vec![(0.0, 0.0), (1.0, 0.0), (1.0, 1.0), (0.0, 1.0)]);
    }

    #[test]
    fn test_edge_loop_is_closed() {
        let edge_loop = file(&single(edge_loop()), SQUARE).unwrap();
        assert_eq!(edge_loop.edges.len(), 4);
        for (i, edge) in edge_loop.edges.iter().enumerate() {
            let next = &edge_loop.edges[(i + 1) % edge_loop.edges.len()];
            assert_eq!(edge.end(), next.start());
        }
        assert!(!edge_loop.edges[2].orientation);
        assert!(matches!(edge_loop.edges[0].edge.curve, Curve::Line(_)));
    }

    #[test]
    fn test_face_bound_accepts_outer_bound() {
        let bound = file(&single(face_bound()), SQUARE).unwrap();
        assert!(bound.is_outer);
        assert!(bound.orientation);
        assert_eq!(bound.edge_loop.edges.len(), 4);
    }

    #[test]
    fn test_face_bound_inner() {
        let text = SQUARE.replace("FACE_OUTER_BOUND", "FACE_BOUND");
        let bound = file(&single(face_bound()), &text).unwrap();
        assert!(!bound.is_outer);
        assert_eq!(
            file(&single(face_outer_bound()), &text),
            Err(StepError::DecodeFailure("No matching entities found".into()))
        );
    }

    #[test]
    fn test_oriented_edge_requires_derived_slots() {
        let text = SQUARE.replace(
            "#51 = ORIENTED_EDGE('', *, *, #41, .T.);",
            "#51 = ORIENTED_EDGE('', #11, *, #41, .T.);",
        );
        assert_eq!(
            file(&all(oriented_edge()), &text),
            Err(StepError::DecodeFailure("Expected derived".into()))
        );
    }

    #[test]
    fn test_edge_with_unsupported_curve() {
        let text = SQUARE.replace(
            "#31 = LINE('', #1, #22);",
            "#31 = B_SPLINE_CURVE_WITH_KNOTS('', 1, (#1, #2), .UNSPECIFIED., .F., .F., (2, 2), (0.0, 1.0), .UNSPECIFIED.);",
        );
        let err = file(&single(edge_loop()), &text).unwrap_err();
        assert_eq!(
            err,
            StepError::DecodeFailure(
                "Expected entity of type LINE, found B_SPLINE_CURVE_WITH_KNOTS | Expected entity of type CIRCLE, found B_SPLINE_CURVE_WITH_KNOTS".into()
            )
        );
    }
}
