//! 动画关键帧

use glam::Vec3;

use crate::math::Rotation;

/// 骨骼关键帧（时间单位：秒）
#[derive(Clone, Copy, Debug)]
pub struct BoneKeyframe {
    pub time: f32,
    pub translation: Vec3,
    pub rotation: Rotation,
    pub scale: Vec3,
}

impl BoneKeyframe {
    pub fn new(time: f32) -> Self {
        Self {
            time,
            translation: Vec3::ZERO,
            rotation: Rotation::IDENTITY,
            scale: Vec3::ONE,
        }
    }

    pub fn with_translation(time: f32, translation: Vec3) -> Self {
        Self {
            translation,
            ..Self::new(time)
        }
    }

    pub fn with_rotation(time: f32, rotation: Rotation) -> Self {
        Self {
            rotation,
            ..Self::new(time)
        }
    }
}

/// Morph 关键帧
#[derive(Clone, Copy, Debug)]
pub struct MorphKeyframe {
    pub time: f32,
    pub weight: f32,
}

impl MorphKeyframe {
    pub fn new(time: f32, weight: f32) -> Self {
        Self { time, weight }
    }
}
