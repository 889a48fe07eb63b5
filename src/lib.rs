//! MMD 动画核心 - 骨骼与 Morph 变形的运行时计算
//!
//! 提供 MMD/PMX 风格模型的每帧动画数据：
//! - 骨骼层级构建与逆绑定矩阵计算
//! - 蒙皮矩阵计算（平铺 f32 缓冲区，供 GPU 上传）
//! - 顶点 Morph / 骨骼 Morph 分类与加权混合
//! - 关键帧动画播放（线性插值）
//! - 姿态快照与恢复
//!
//! 不包含：模型文件解析、GPU 资源管理、IK、物理。

pub mod animation;
pub mod math;
pub mod model;
pub mod morph;
pub mod skeleton;

pub use animation::{AnimationClip, BoneKeyframe, ClipLibrary, ClipPlayer, MorphKeyframe, PlayerState};
pub use math::Rotation;
pub use model::{BoneDescriptor, MmdModel, ModelDescriptor, MorphDescriptor, MorphElement, PoseSnapshot};
pub use morph::{MorphCatalog, MorphManager, MorphWeight};
pub use skeleton::{Bone, BoneManager, BoneTransformUpdate, PoseTransform};

use thiserror::Error;

/// 加载期致命错误：层级或 Morph 数据不可用，模型无法构建
#[derive(Error, Debug)]
pub enum EngineError {
    #[error("model has no bones")]
    EmptySkeleton,

    #[error("bone {bone} references out-of-range parent {parent}")]
    InvalidParent { bone: usize, parent: i32 },

    #[error("bone hierarchy contains a cycle involving bone {0}")]
    HierarchyCycle(usize),

    #[error("morph '{morph}' targets vertex {vertex} outside vertex range {vertex_count}")]
    MorphVertexOutOfRange {
        morph: String,
        vertex: usize,
        vertex_count: usize,
    },

    #[error("morph '{morph}' targets bone {bone} outside bone range {bone_count}")]
    MorphBoneOutOfRange {
        morph: String,
        bone: usize,
        bone_count: usize,
    },
}

pub type Result<T> = std::result::Result<T, EngineError>;
