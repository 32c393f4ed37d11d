//! Small value types for poses, rectangles and fields of view.
//!
//! Only the operations the frontend actually performs live here: pose
//! composition for origin calibration, yaw extraction for leveling, and
//! tangent/angle conversions for layer submission.

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Vector2f {
    pub x: f32,
    pub y: f32,
}

impl Vector2f {
    pub fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }

    pub fn length(self) -> f32 {
        (self.x * self.x + self.y * self.y).sqrt()
    }

    pub fn normalized(self) -> Self {
        let len = self.length();
        if len > 0.0 {
            Self::new(self.x / len, self.y / len)
        } else {
            self
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Vector3f {
    pub x: f32,
    pub y: f32,
    pub z: f32,
}

impl Vector3f {
    pub fn new(x: f32, y: f32, z: f32) -> Self {
        Self { x, y, z }
    }

    pub fn distance(self, other: Self) -> f32 {
        let dx = self.x - other.x;
        let dy = self.y - other.y;
        let dz = self.z - other.z;
        (dx * dx + dy * dy + dz * dz).sqrt()
    }
}

impl std::ops::Add for Vector3f {
    type Output = Vector3f;
    fn add(self, rhs: Vector3f) -> Vector3f {
        Vector3f::new(self.x + rhs.x, self.y + rhs.y, self.z + rhs.z)
    }
}

impl std::ops::Neg for Vector3f {
    type Output = Vector3f;
    fn neg(self) -> Vector3f {
        Vector3f::new(-self.x, -self.y, -self.z)
    }
}

/// Unit quaternion, `w` last.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Quatf {
    pub x: f32,
    pub y: f32,
    pub z: f32,
    pub w: f32,
}

impl Default for Quatf {
    fn default() -> Self {
        Self::IDENTITY
    }
}

impl Quatf {
    pub const IDENTITY: Quatf = Quatf {
        x: 0.0,
        y: 0.0,
        z: 0.0,
        w: 1.0,
    };

    pub fn new(x: f32, y: f32, z: f32, w: f32) -> Self {
        Self { x, y, z, w }
    }

    /// Rotation of `angle` radians around the Y axis.
    pub fn rotation_y(angle: f32) -> Self {
        let half = angle * 0.5;
        Self::new(0.0, half.sin(), 0.0, half.cos())
    }

    pub fn conjugate(self) -> Self {
        Self::new(-self.x, -self.y, -self.z, self.w)
    }

    pub fn normalized(self) -> Self {
        let len = (self.x * self.x + self.y * self.y + self.z * self.z + self.w * self.w).sqrt();
        if len > 0.0 {
            Self::new(self.x / len, self.y / len, self.z / len, self.w / len)
        } else {
            Self::IDENTITY
        }
    }

    /// Hamilton product; `self * rhs` applies `rhs` first.
    pub fn mul(self, rhs: Quatf) -> Quatf {
        Quatf::new(
            self.w * rhs.x + self.x * rhs.w + self.y * rhs.z - self.z * rhs.y,
            self.w * rhs.y - self.x * rhs.z + self.y * rhs.w + self.z * rhs.x,
            self.w * rhs.z + self.x * rhs.y - self.y * rhs.x + self.z * rhs.w,
            self.w * rhs.w - self.x * rhs.x - self.y * rhs.y - self.z * rhs.z,
        )
    }

    pub fn rotate(self, v: Vector3f) -> Vector3f {
        // q * (v, 0) * q^-1 expanded for unit quaternions.
        let u = Vector3f::new(self.x, self.y, self.z);
        let s = self.w;
        let dot_uv = u.x * v.x + u.y * v.y + u.z * v.z;
        let dot_uu = u.x * u.x + u.y * u.y + u.z * u.z;
        let cross = Vector3f::new(
            u.y * v.z - u.z * v.y,
            u.z * v.x - u.x * v.z,
            u.x * v.y - u.y * v.x,
        );
        Vector3f::new(
            2.0 * dot_uv * u.x + (s * s - dot_uu) * v.x + 2.0 * s * cross.x,
            2.0 * dot_uv * u.y + (s * s - dot_uu) * v.y + 2.0 * s * cross.y,
            2.0 * dot_uv * u.z + (s * s - dot_uu) * v.z + 2.0 * s * cross.z,
        )
    }

    /// Heading around the Y axis, discarding pitch and roll.
    pub fn yaw(self) -> f32 {
        let forward = self.rotate(Vector3f::new(0.0, 0.0, -1.0));
        (-forward.x).atan2(-forward.z)
    }
}

impl std::ops::Mul for Quatf {
    type Output = Quatf;
    fn mul(self, rhs: Quatf) -> Quatf {
        Quatf::mul(self, rhs)
    }
}

/// Rigid transform: rotate then translate.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Posef {
    pub orientation: Quatf,
    pub position: Vector3f,
}

impl Posef {
    pub const IDENTITY: Posef = Posef {
        orientation: Quatf::IDENTITY,
        position: Vector3f {
            x: 0.0,
            y: 0.0,
            z: 0.0,
        },
    };

    pub fn new(orientation: Quatf, position: Vector3f) -> Self {
        Self {
            orientation,
            position,
        }
    }

    /// Composition `self * rhs`: apply `rhs` within `self`'s frame.
    pub fn compose(self, rhs: Posef) -> Posef {
        Posef::new(
            self.orientation * rhs.orientation,
            self.position + self.orientation.rotate(rhs.position),
        )
    }

    pub fn inverse(self) -> Posef {
        let inv = self.orientation.conjugate();
        Posef::new(inv, -inv.rotate(self.position))
    }

    pub fn normalized(self) -> Posef {
        Posef::new(self.orientation.normalized(), self.position)
    }
}

impl std::ops::Mul for Posef {
    type Output = Posef;
    fn mul(self, rhs: Posef) -> Posef {
        self.compose(rhs)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Vector2i {
    pub x: i32,
    pub y: i32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Sizei {
    pub w: i32,
    pub h: i32,
}

impl Sizei {
    pub fn new(w: i32, h: i32) -> Self {
        Self { w, h }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Recti {
    pub pos: Vector2i,
    pub size: Sizei,
}

impl Recti {
    pub fn new(x: i32, y: i32, w: i32, h: i32) -> Self {
        Self {
            pos: Vector2i { x, y },
            size: Sizei { w, h },
        }
    }
}

/// Field of view expressed as view-space tangents, all positive for a
/// symmetric frustum.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct FovPort {
    pub up_tan: f32,
    pub down_tan: f32,
    pub left_tan: f32,
    pub right_tan: f32,
}

impl FovPort {
    pub fn new(up_tan: f32, down_tan: f32, left_tan: f32, right_tan: f32) -> Self {
        Self {
            up_tan,
            down_tan,
            left_tan,
            right_tan,
        }
    }

    /// Largest tangent magnitude over all four sides.
    pub fn max_side_tan(self) -> f32 {
        self.up_tan
            .abs()
            .max(self.down_tan.abs())
            .max(self.left_tan.abs())
            .max(self.right_tan.abs())
    }

    /// Recover the frustum from a row-major projection matrix.
    pub fn from_projection(m: &[[f32; 4]; 4]) -> Self {
        let xs = m[0][0];
        let xo = m[0][2];
        let ys = m[1][1];
        let yo = m[1][2];
        if xs == 0.0 || ys == 0.0 {
            return Self::default();
        }
        Self {
            left_tan: (1.0 + xo) / xs,
            right_tan: (1.0 - xo) / xs,
            up_tan: (1.0 + yo) / ys,
            down_tan: (1.0 - yo) / ys,
        }
    }

    /// Fold a canted eye orientation into the frustum so the combined
    /// volume is expressed against the straight-ahead axis.
    pub fn uncant(self, canting: Quatf) -> FovPort {
        let mut uncanted = self;

        // Frustum corners projected to the z=1 plane, rotated by the cant.
        let left_up = canting.rotate(Vector3f::new(-self.left_tan, self.up_tan, 1.0));
        let right_down = canting.rotate(Vector3f::new(self.right_tan, -self.down_tan, 1.0));

        // A corner rotated to grazing or negative z would explode the
        // tangents; leave those sides untouched.
        if left_up.z > 0.0 {
            let inv_z = 1.0 / left_up.z;
            uncanted.left_tan = -left_up.x * inv_z;
            uncanted.up_tan = left_up.y * inv_z;
        }
        if right_down.z > 0.0 {
            let inv_z = 1.0 / right_down.z;
            uncanted.right_tan = right_down.x * inv_z;
            uncanted.down_tan = -right_down.y * inv_z;
        }
        uncanted
    }

    /// Convert to signed angles in radians, target-runtime convention
    /// (left and down negative).
    pub fn to_angles(self) -> Fov {
        Fov {
            angle_left: -self.left_tan.atan(),
            angle_right: self.right_tan.atan(),
            angle_up: self.up_tan.atan(),
            angle_down: -self.down_tan.atan(),
        }
    }
}

/// Field of view in signed radians, as submitted to the target runtime.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Fov {
    pub angle_left: f32,
    pub angle_right: f32,
    pub angle_up: f32,
    pub angle_down: f32,
}

impl Fov {
    /// Flip the image vertically by exchanging the vertical angles.
    pub fn swap_vertical(&mut self) {
        std::mem::swap(&mut self.angle_up, &mut self.angle_down);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const EPS: f32 = 1e-4;

    #[test]
    fn yaw_of_pure_y_rotation() {
        let angle = 30f32.to_radians();
        let q = Quatf::rotation_y(angle);
        assert!((q.yaw() - angle).abs() < EPS);
    }

    #[test]
    fn yaw_ignores_pitch_and_roll() {
        let yaw = 1.1;
        let pitch = Quatf::new((0.3f32).sin() * 0.5, 0.0, 0.0, 1.0).normalized();
        let q = Quatf::rotation_y(yaw) * pitch;
        assert!((q.yaw() - yaw).abs() < 1e-3);
    }

    #[test]
    fn pose_compose_then_inverse_is_identity() {
        let p = Posef::new(Quatf::rotation_y(0.7), Vector3f::new(1.0, 2.0, -0.5));
        let id = p * p.inverse();
        assert!(id.position.distance(Vector3f::default()) < EPS);
        assert!((id.orientation.w.abs() - 1.0).abs() < EPS);
    }

    #[test]
    fn rotate_by_identity_is_noop() {
        let v = Vector3f::new(0.2, -1.0, 3.0);
        let r = Quatf::IDENTITY.rotate(v);
        assert!(v.distance(r) < EPS);
    }

    #[test]
    fn fov_from_projection_round_trips() {
        let fov = FovPort::new(1.1, 1.0, 0.9, 1.2);
        // Build the projection the same way the legacy SDK does.
        let xs = 2.0 / (fov.left_tan + fov.right_tan);
        let xo = (fov.left_tan - fov.right_tan) / (fov.left_tan + fov.right_tan);
        let ys = 2.0 / (fov.up_tan + fov.down_tan);
        let yo = (fov.up_tan - fov.down_tan) / (fov.up_tan + fov.down_tan);
        let mut m = [[0.0f32; 4]; 4];
        m[0][0] = xs;
        m[0][2] = xo;
        m[1][1] = ys;
        m[1][2] = yo;
        let back = FovPort::from_projection(&m);
        assert!((back.up_tan - fov.up_tan).abs() < EPS);
        assert!((back.down_tan - fov.down_tan).abs() < EPS);
        assert!((back.left_tan - fov.left_tan).abs() < EPS);
        assert!((back.right_tan - fov.right_tan).abs() < EPS);
    }

    #[test]
    fn max_side_tan_all_zero_is_zero() {
        assert_eq!(FovPort::default().max_side_tan(), 0.0);
    }

    #[test]
    fn uncant_with_identity_is_noop() {
        let fov = FovPort::new(1.2, 0.9, 1.0, 1.1);
        let out = fov.uncant(Quatf::IDENTITY);
        assert!((out.up_tan - fov.up_tan).abs() < EPS);
        assert!((out.down_tan - fov.down_tan).abs() < EPS);
        assert!((out.left_tan - fov.left_tan).abs() < EPS);
        assert!((out.right_tan - fov.right_tan).abs() < EPS);
    }

    #[test]
    fn uncant_folds_yaw_into_horizontal_tangents() {
        let cant = 0.2f32;
        let fov = FovPort::new(1.0, 1.0, 1.0, 1.0);
        let out = fov.uncant(Quatf::rotation_y(cant));
        let quarter = std::f32::consts::FRAC_PI_4;
        // A yaw cant shifts both horizontal half-angles by the cant.
        assert!((out.left_tan - (quarter - cant).tan()).abs() < 1e-4);
        assert!((out.right_tan - (quarter + cant).tan()).abs() < 1e-4);
    }
}
