//! Attribute value parsing
//!
//! Numeric lists, vectors and frame orientations as they appear in MJCF
//! attributes. All functions take the element and attribute names only to
//! build useful diagnostics.

use nalgebra::{Unit, UnitQuaternion, Vector3};

use crate::error::ModelError;

/// Unit for angles given in `euler`, `axisangle` and hinge `range`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AngleUnit {
    #[default]
    Degree,
    Radian,
}

impl AngleUnit {
    pub fn parse(value: &str) -> Result<Self, ModelError> {
        match value {
            "degree" => Ok(AngleUnit::Degree),
            "radian" => Ok(AngleUnit::Radian),
            other => Err(ModelError::invalid_attribute(
                "compiler",
                "angle",
                other,
                "expected 'degree' or 'radian'",
            )),
        }
    }

    /// Convert a value in this unit to radians
    pub fn to_radians(self, value: f32) -> f32 {
        match self {
            AngleUnit::Degree => value.to_radians(),
            AngleUnit::Radian => value,
        }
    }
}

/// Parse a whitespace-separated list of numbers
pub fn parse_floats(element: &str, attribute: &str, value: &str) -> Result<Vec<f32>, ModelError> {
    value
        .split_whitespace()
        .map(|token| {
            token.parse::<f32>().map_err(|_| {
                ModelError::invalid_attribute(element, attribute, value, format!("'{}' is not a number", token))
            })
        })
        .collect()
}

/// Parse exactly `N` numbers
pub fn parse_array<const N: usize>(
    element: &str,
    attribute: &str,
    value: &str,
) -> Result<[f32; N], ModelError> {
    let values = parse_floats(element, attribute, value)?;
    values.try_into().map_err(|v: Vec<f32>| {
        ModelError::invalid_attribute(
            element,
            attribute,
            value,
            format!("expected {} numbers, found {}", N, v.len()),
        )
    })
}

/// Parse between 1 and 3 numbers, padding the rest with zeros
pub fn parse_size(element: &str, value: &str) -> Result<[f32; 3], ModelError> {
    let values = parse_floats(element, "size", value)?;
    if values.is_empty() || values.len() > 3 {
        return Err(ModelError::invalid_attribute(
            element,
            "size",
            value,
            "expected 1 to 3 numbers",
        ));
    }
    let mut size = [0.0; 3];
    size[..values.len()].copy_from_slice(&values);
    Ok(size)
}

pub fn parse_vec3(element: &str, attribute: &str, value: &str) -> Result<Vector3<f32>, ModelError> {
    let [x, y, z] = parse_array::<3>(element, attribute, value)?;
    Ok(Vector3::new(x, y, z))
}

/// Normalize a direction, rejecting zero vectors
pub fn unit_vector(
    element: &str,
    attribute: &str,
    value: &str,
    v: Vector3<f32>,
) -> Result<Vector3<f32>, ModelError> {
    v.try_normalize(1e-9).ok_or_else(|| {
        ModelError::invalid_attribute(element, attribute, value, "direction has zero length")
    })
}

/// Rotation that takes +Z onto `dir` (a unit vector)
pub fn rotation_z_to(dir: &Vector3<f32>) -> UnitQuaternion<f32> {
    UnitQuaternion::rotation_between(&Vector3::z(), dir).unwrap_or_else(|| {
        // antiparallel: any half turn about an axis perpendicular to Z
        UnitQuaternion::from_axis_angle(&Vector3::x_axis(), std::f32::consts::PI)
    })
}

/// Raw orientation attributes of a frame-bearing element
#[derive(Debug, Default, Clone, Copy)]
pub struct OrientationAttrs<'a> {
    pub quat: Option<&'a str>,
    pub euler: Option<&'a str>,
    pub axisangle: Option<&'a str>,
    pub zaxis: Option<&'a str>,
}

impl OrientationAttrs<'_> {
    /// Resolve to a rotation. At most one specifier may be present;
    /// none means identity.
    pub fn resolve(&self, element: &str, angle: AngleUnit) -> Result<UnitQuaternion<f32>, ModelError> {
        let given = [self.quat, self.euler, self.axisangle, self.zaxis]
            .iter()
            .filter(|a| a.is_some())
            .count();
        if given > 1 {
            return Err(ModelError::Invalid(format!(
                "<{}> specifies more than one orientation",
                element
            )));
        }

        if let Some(value) = self.quat {
            let [w, x, y, z] = parse_array::<4>(element, "quat", value)?;
            let q = nalgebra::Quaternion::new(w, x, y, z);
            if q.norm() < 1e-9 {
                return Err(ModelError::invalid_attribute(element, "quat", value, "quaternion has zero norm"));
            }
            return Ok(UnitQuaternion::from_quaternion(q));
        }

        if let Some(value) = self.euler {
            let [a, b, c] = parse_array::<3>(element, "euler", value)?;
            // intrinsic x-y-z sequence
            let qx = UnitQuaternion::from_axis_angle(&Vector3::x_axis(), angle.to_radians(a));
            let qy = UnitQuaternion::from_axis_angle(&Vector3::y_axis(), angle.to_radians(b));
            let qz = UnitQuaternion::from_axis_angle(&Vector3::z_axis(), angle.to_radians(c));
            return Ok(qx * qy * qz);
        }

        if let Some(value) = self.axisangle {
            let [x, y, z, a] = parse_array::<4>(element, "axisangle", value)?;
            let axis = unit_vector(element, "axisangle", value, Vector3::new(x, y, z))?;
            return Ok(UnitQuaternion::from_axis_angle(
                &Unit::new_unchecked(axis),
                angle.to_radians(a),
            ));
        }

        if let Some(value) = self.zaxis {
            let dir = unit_vector(element, "zaxis", value, parse_vec3(element, "zaxis", value)?)?;
            return Ok(rotation_z_to(&dir));
        }

        Ok(UnitQuaternion::identity())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_floats() {
        assert_eq!(parse_floats("geom", "size", " 1 2.5\t-3 ").unwrap(), vec![1.0, 2.5, -3.0]);
        assert!(parse_floats("geom", "size", "1 x").is_err());
    }

    #[test]
    fn test_parse_array_wrong_count() {
        let err = parse_array::<3>("body", "pos", "1 2").unwrap_err();
        assert!(err.to_string().contains("expected 3 numbers, found 2"));
    }

    #[test]
    fn test_parse_size_pads() {
        assert_eq!(parse_size("geom", "0.1").unwrap(), [0.1, 0.0, 0.0]);
        assert!(parse_size("geom", "").is_err());
        assert!(parse_size("geom", "1 2 3 4").is_err());
    }

    #[test]
    fn test_euler_degrees() {
        let attrs = OrientationAttrs {
            euler: Some("0 0 90"),
            ..Default::default()
        };
        let q = attrs.resolve("body", AngleUnit::Degree).unwrap();
        let x = q * Vector3::x();
        assert!((x - Vector3::y()).norm() < 1e-5);
    }

    #[test]
    fn test_axisangle_radians() {
        let attrs = OrientationAttrs {
            axisangle: Some("1 0 0 3.14159265"),
            ..Default::default()
        };
        let q = attrs.resolve("geom", AngleUnit::Radian).unwrap();
        let z = q * Vector3::z();
        assert!((z + Vector3::z()).norm() < 1e-4);
    }

    #[test]
    fn test_quat_is_normalized() {
        let attrs = OrientationAttrs {
            quat: Some("2 0 0 0"),
            ..Default::default()
        };
        let q = attrs.resolve("body", AngleUnit::Degree).unwrap();
        assert!((q.angle()).abs() < 1e-6);
    }

    #[test]
    fn test_zaxis_antiparallel() {
        let q = rotation_z_to(&-Vector3::z());
        assert!((q * Vector3::z() + Vector3::z()).norm() < 1e-5);
    }

    #[test]
    fn test_two_orientations_rejected() {
        let attrs = OrientationAttrs {
            quat: Some("1 0 0 0"),
            euler: Some("0 0 0"),
            ..Default::default()
        };
        assert!(attrs.resolve("body", AngleUnit::Degree).is_err());
    }
}
