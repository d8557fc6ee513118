// sf-core/src/units.rs

use uom::si::f64::{
    Angle as UomAngle, DiffusionCoefficient as UomDiffusionCoefficient, Length as UomLength,
    Velocity as UomVelocity,
};

// Public canonical unit types (SI, f64)
pub type Angle = UomAngle;
/// Kinematic viscosity (m²/s); uom files it under diffusion coefficient.
pub type KinVisc = UomDiffusionCoefficient;
pub type Length = UomLength;
pub type Velocity = UomVelocity;

#[inline]
pub fn deg(v: f64) -> Angle {
    use uom::si::angle::degree;
    Angle::new::<degree>(v)
}

#[inline]
pub fn rad(v: f64) -> Angle {
    use uom::si::angle::radian;
    Angle::new::<radian>(v)
}

#[inline]
pub fn m(v: f64) -> Length {
    use uom::si::length::meter;
    Length::new::<meter>(v)
}

#[inline]
pub fn mps(v: f64) -> Velocity {
    use uom::si::velocity::meter_per_second;
    Velocity::new::<meter_per_second>(v)
}

#[inline]
pub fn m2ps(v: f64) -> KinVisc {
    use uom::si::diffusion_coefficient::square_meter_per_second;
    KinVisc::new::<square_meter_per_second>(v)
}

/// Degrees to radians.
#[inline]
pub fn deg_to_rad(v: f64) -> f64 {
    use uom::si::angle::radian;
    deg(v).get::<radian>()
}

/// Radians to degrees.
#[inline]
pub fn rad_to_deg(v: f64) -> f64 {
    use uom::si::angle::degree;
    rad(v).get::<degree>()
}

/// Chord Reynolds number `U c / nu`.
pub fn reynolds_number(speed: Velocity, chord: Length, nu: KinVisc) -> f64 {
    use uom::si::ratio::ratio;
    (speed * chord / nu).get::<ratio>()
}

/// Mach number `U / a`.
pub fn mach_number(speed: Velocity, speed_of_sound: Velocity) -> f64 {
    use uom::si::ratio::ratio;
    (speed / speed_of_sound).get::<ratio>()
}

pub mod constants {
    /// Kinematic viscosity of air at 15 °C (m²/s)
    pub const NU_AIR: f64 = 1.46e-5;
}
