//! Fundamental geometry entities: points, directions, placements and curves.

use nalgebra::{Unit, Vector3};

use crate::decode::{self, AttributeDecoder, EntityDecoder};

/// A point in 3D space.
pub type Point3 = nalgebra::Point3<f64>;

/// A 3D vector.
pub type Vec3 = Vector3<f64>;

/// A unit-length 3D vector.
pub type Dir3 = Unit<Vector3<f64>>;

/// Below this norm a DIRECTION is rejected.
const MIN_DIRECTION_NORM: f64 = 1e-15;

/// A list of exactly three reals.
fn coordinates(type_name: &'static str) -> AttributeDecoder<Vec3> {
    decode::list(decode::float()).and_then(move |coords: Vec<f64>| match coords[..] {
        [x, y, z] => decode::succeed(Vec3::new(x, y, z)),
        _ => decode::fail(format!(
            "{type_name} needs 3 coordinates, got {}",
            coords.len()
        )),
    })
}

/// Decode a CARTESIAN_POINT entity.
///
/// STEP syntax: `CARTESIAN_POINT(name, (x, y, z))`
pub fn cartesian_point() -> EntityDecoder<Point3> {
    decode::entity(
        "CARTESIAN_POINT",
        decode::attribute(1, coordinates("CARTESIAN_POINT")).map(Point3::from),
    )
}

/// Decode a DIRECTION entity, normalizing it.
///
/// STEP syntax: `DIRECTION(name, (x, y, z))`
pub fn direction() -> EntityDecoder<Dir3> {
    decode::entity(
        "DIRECTION",
        decode::attribute(1, coordinates("DIRECTION")).and_then(|v: Vec3| {
            match Unit::try_new(v, MIN_DIRECTION_NORM) {
                Some(dir) => decode::succeed(dir),
                None => decode::fail("zero-length direction"),
            }
        }),
    )
}

/// Decode a VECTOR entity into direction times magnitude.
///
/// STEP syntax: `VECTOR(name, direction, magnitude)`
pub fn vector() -> EntityDecoder<Vec3> {
    decode::entity(
        "VECTOR",
        decode::map2(
            |dir: Dir3, magnitude: f64| dir.into_inner() * magnitude,
            decode::attribute(1, decode::reference_to(direction())),
            decode::attribute(2, decode::float()),
        ),
    )
}

/// Axis placement data (origin + optional directions).
#[derive(Debug, Clone, PartialEq)]
pub struct AxisPlacement {
    /// Location point.
    pub location: Point3,
    /// Z-axis direction (normal).
    pub axis: Option<Dir3>,
    /// X-axis direction (reference).
    pub ref_direction: Option<Dir3>,
}

impl AxisPlacement {
    /// Z-axis direction, +Z when not given.
    pub fn z_axis(&self) -> Dir3 {
        self.axis.unwrap_or_else(Vec3::z_axis)
    }

    /// X-axis direction.
    ///
    /// The reference direction is projected onto the plane normal to
    /// [`AxisPlacement::z_axis`]. Without one, or if it is parallel to Z, an
    /// arbitrary perpendicular is picked.
    pub fn x_axis(&self) -> Dir3 {
        let z = self.z_axis();
        let projected = self
            .ref_direction
            .and_then(|x| Unit::try_new(x.into_inner() - x.dot(z.as_ref()) * z.as_ref(), 1e-12));
        projected.unwrap_or_else(|| {
            let arbitrary = if z.as_ref().x.abs() < 0.9 {
                Vec3::x()
            } else {
                Vec3::y()
            };
            Unit::new_normalize(arbitrary - arbitrary.dot(z.as_ref()) * z.as_ref())
        })
    }

    /// Y-axis direction (Z × X).
    pub fn y_axis(&self) -> Dir3 {
        Unit::new_normalize(self.z_axis().cross(self.x_axis().as_ref()))
    }
}

/// Decode an AXIS1_PLACEMENT entity (point + optional axis).
///
/// STEP syntax: `AXIS1_PLACEMENT(name, location, axis)`
pub fn axis1_placement() -> EntityDecoder<AxisPlacement> {
    decode::entity(
        "AXIS1_PLACEMENT",
        decode::map2(
            |location, axis| AxisPlacement {
                location,
                axis,
                ref_direction: None,
            },
            decode::attribute(1, decode::reference_to(cartesian_point())),
            decode::attribute(2, decode::optional(decode::reference_to(direction()))),
        ),
    )
}

/// Decode an AXIS2_PLACEMENT_3D entity (point + two optional directions).
///
/// STEP syntax: `AXIS2_PLACEMENT_3D(name, location, axis, ref_direction)`
pub fn axis2_placement_3d() -> EntityDecoder<AxisPlacement> {
    decode::entity(
        "AXIS2_PLACEMENT_3D",
        decode::map3(
            |location, axis, ref_direction| AxisPlacement {
                location,
                axis,
                ref_direction,
            },
            decode::attribute(1, decode::reference_to(cartesian_point())),
            decode::attribute(2, decode::optional(decode::reference_to(direction()))),
            decode::attribute(3, decode::optional(decode::reference_to(direction()))),
        ),
    )
}

/// Decode either kind of axis placement.
pub fn axis_placement() -> EntityDecoder<AxisPlacement> {
    decode::one_of(vec![axis1_placement(), axis2_placement_3d()])
}

/// An infinite line through `origin` along `direction`.
#[derive(Debug, Clone, PartialEq)]
pub struct Line {
    /// A point on the line.
    pub origin: Point3,
    /// Direction; its length is the parametrization speed.
    pub direction: Vec3,
}

/// A circle in the plane of its placement.
#[derive(Debug, Clone, PartialEq)]
pub struct Circle {
    /// Center point.
    pub center: Point3,
    /// Radius, always positive.
    pub radius: f64,
    /// In-plane X direction.
    pub x_dir: Dir3,
    /// In-plane Y direction.
    pub y_dir: Dir3,
    /// Plane normal.
    pub normal: Dir3,
}

/// A curve decoded from STEP.
#[derive(Debug, Clone, PartialEq)]
pub enum Curve {
    /// A LINE.
    Line(Line),
    /// A CIRCLE.
    Circle(Circle),
}

/// Decode a LINE entity.
///
/// STEP syntax: `LINE(name, point, vector)`
pub fn line() -> EntityDecoder<Line> {
    decode::entity(
        "LINE",
        decode::map2(
            |origin, direction| Line { origin, direction },
            decode::attribute(1, decode::reference_to(cartesian_point())),
            decode::attribute(2, decode::reference_to(vector())),
        ),
    )
}

/// Decode a CIRCLE entity.
///
/// STEP syntax: `CIRCLE(name, position, radius)`
pub fn circle() -> EntityDecoder<Circle> {
    let radius = decode::float().and_then(|radius: f64| {
        if radius > 0.0 {
            decode::succeed(radius)
        } else {
            decode::fail(format!("CIRCLE radius must be positive, got {radius}"))
        }
    });
    decode::entity(
        "CIRCLE",
        decode::map2(
            |placement: AxisPlacement, radius| Circle {
                center: placement.location,
                radius,
                x_dir: placement.x_axis(),
                y_dir: placement.y_axis(),
                normal: placement.z_axis(),
            },
            decode::attribute(1, decode::reference_to(axis_placement())),
            decode::attribute(2, radius),
        ),
    )
}

/// Decode any supported curve.
pub fn curve() -> EntityDecoder<Curve> {
    decode::one_of(vec![line().map(Curve::Line), circle().map(Curve::Circle)])
}
