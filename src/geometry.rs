//! Cartesian quantities used by the truss model.
//!
//! The truss does not fix a unit system; lengths, forces and stiffnesses only
//! have to be consistent with each other (for instance mm, N and MPa).

use nalgebra::Vector3;

/// Define a three-component Cartesian quantity with conversions to and from
/// [`Vector3`].
macro_rules! cartesian {
    ($(#[$meta:meta])* $name:ident, $helper:ident, $what:literal) => {
        $(#[$meta])*
        #[derive(Clone, Copy, Debug, Default, PartialEq)]
        pub struct $name {
            #[doc = concat!("Global X component of the ", $what, ".")]
            pub x: f64,
            #[doc = concat!("Global Y component of the ", $what, ".")]
            pub y: f64,
            #[doc = concat!("Global Z component of the ", $what, ".")]
            pub z: f64,
        }

        impl $name {
            #[doc = concat!("Create a ", $what, " from its components.")]
            #[must_use]
            pub const fn new(x: f64, y: f64, z: f64) -> Self {
                Self { x, y, z }
            }

            /// Convert into an algebraic vector.
            #[must_use]
            pub fn to_vector(self) -> Vector3<f64> {
                Vector3::new(self.x, self.y, self.z)
            }
        }

        impl From<Vector3<f64>> for $name {
            fn from(value: Vector3<f64>) -> Self {
                Self::new(value.x, value.y, value.z)
            }
        }

        impl From<$name> for Vector3<f64> {
            fn from(value: $name) -> Self {
                value.to_vector()
            }
        }

        #[doc = concat!("Shorthand for [`", stringify!($name), "::new`].")]
        #[must_use]
        pub const fn $helper(x: f64, y: f64, z: f64) -> $name {
            $name::new(x, y, z)
        }
    };
}

cartesian!(
    /// Position of a joint.
    Point,
    point,
    "position"
);

cartesian!(
    /// Load applied at a joint.
    ///
    /// # Examples
    /// ```
    /// use thermx::force;
    ///
    /// let load = force(1.0, 0.0, -5.0);
    /// assert_eq!(load.z, -5.0);
    /// ```
    Force,
    force,
    "load"
);

cartesian!(
    /// Translation of a joint found by the analysis.
    Displacement,
    displacement,
    "translation"
);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn quantities_convert_through_vectors() {
        let origin = point(1.0, 2.0, 3.0);
        let vector: Vector3<f64> = origin.into();
        assert_eq!(vector, Vector3::new(1.0, 2.0, 3.0));
        assert_eq!(Point::from(vector), origin);
        assert_eq!(
            Displacement::from(Vector3::new(0.1, -0.2, 0.3)),
            displacement(0.1, -0.2, 0.3)
        );
    }

    #[test]
    fn loads_default_to_zero() {
        assert_eq!(Force::default(), force(0.0, 0.0, 0.0));
    }
}
