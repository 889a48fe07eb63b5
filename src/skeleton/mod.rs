//! 骨骼系统：层级、绑定姿态、蒙皮矩阵

mod bone;
mod manager;

pub use bone::Bone;
pub use manager::BoneManager;

use glam::Vec3;

use crate::math::Rotation;

/// 单根骨骼的本地姿态
#[derive(Clone, Copy, Debug)]
pub struct PoseTransform {
    pub position: Vec3,
    pub rotation: Rotation,
    pub scale: Vec3,
    /// 禁用时该骨骼的世界矩阵直接沿用父骨骼（透传，不是单位矩阵）
    pub enabled: bool,
}

impl Default for PoseTransform {
    fn default() -> Self {
        Self {
            position: Vec3::ZERO,
            rotation: Rotation::IDENTITY,
            scale: Vec3::ONE,
            enabled: true,
        }
    }
}

/// 骨骼姿态的部分更新：None 的字段保持原值
#[derive(Clone, Copy, Debug, Default)]
pub struct BoneTransformUpdate {
    pub position: Option<Vec3>,
    pub rotation: Option<Rotation>,
    pub scale: Option<Vec3>,
    pub enabled: Option<bool>,
}

impl BoneTransformUpdate {
    pub fn position(position: Vec3) -> Self {
        Self {
            position: Some(position),
            ..Self::default()
        }
    }

    pub fn rotation(rotation: Rotation) -> Self {
        Self {
            rotation: Some(rotation),
            ..Self::default()
        }
    }
}
