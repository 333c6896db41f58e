use bevy::prelude::*;

/// Rigid transform in the session reference space.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Pose {
    matrix: Mat4,
}

impl Pose {
    pub const IDENTITY: Self = Self {
        matrix: Mat4::IDENTITY,
    };

    pub fn from_matrix(matrix: Mat4) -> Self {
        Self { matrix }
    }

    /// Build from a column-major 4x4 array, the layout XR runtimes report.
    pub fn from_cols_array(cols: &[f32; 16]) -> Self {
        Self::from_matrix(Mat4::from_cols_array(cols))
    }

    pub fn from_translation(translation: Vec3) -> Self {
        Self::from_matrix(Mat4::from_translation(translation))
    }

    pub fn from_rotation_translation(rotation: Quat, translation: Vec3) -> Self {
        Self::from_matrix(Mat4::from_rotation_translation(rotation, translation))
    }

    pub fn matrix(&self) -> Mat4 {
        self.matrix
    }

    pub fn translation(&self) -> Vec3 {
        self.matrix.w_axis.truncate()
    }

    pub fn rotation(&self) -> Quat {
        let (_, rotation, _) = self.matrix.to_scale_rotation_translation();
        rotation
    }

    /// Viewing direction of a viewer pose (-Z).
    pub fn forward(&self) -> Vec3 {
        self.matrix.transform_vector3(Vec3::NEG_Z).normalize_or_zero()
    }

    pub fn to_transform(&self) -> Transform {
        Transform::from_matrix(self.matrix)
    }
}

impl Default for Pose {
    fn default() -> Self {
        Self::IDENTITY
    }
}

/// Best surface estimate for the current frame.
///
/// Written only by the hit-test tracker; everything else reads it.
#[derive(Resource, Debug, Clone, Copy, Default, PartialEq)]
pub struct TrackedPose {
    pose: Option<Pose>,
}

impl TrackedPose {
    pub fn is_tracked(&self) -> bool {
        self.pose.is_some()
    }

    pub fn pose(&self) -> Option<Pose> {
        self.pose
    }

    pub(crate) fn set(&mut self, pose: Option<Pose>) {
        self.pose = pose;
    }
}
