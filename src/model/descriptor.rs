//! 加载边界的输入数据
//!
//! 外部资产解析器产出的内存描述符。本核心假定数据已符合管线的
//! 坐标约定，唯一额外的翻转由 Morph 目录在构建时完成。

use glam::Vec3;

use crate::math::Rotation;

/// 骨骼描述
#[derive(Clone, Debug)]
pub struct BoneDescriptor {
    pub name: String,
    /// 模型空间的绑定位置
    pub bind_position: Vec3,
    /// 父骨骼索引，-1 表示根
    pub parent_index: i32,
}

impl BoneDescriptor {
    pub fn new(name: impl Into<String>, bind_position: Vec3, parent_index: i32) -> Self {
        Self {
            name: name.into(),
            bind_position,
            parent_index,
        }
    }
}

/// Morph 元素：一个目标（顶点或骨骼）上的偏移
#[derive(Clone, Debug)]
pub struct MorphElement {
    pub target_index: u32,
    pub position: Vec3,
    /// 仅骨骼 Morph 携带；欧拉角或四元数在目录构建时统一
    pub rotation: Option<Rotation>,
}

impl MorphElement {
    pub fn vertex(target_index: u32, position: Vec3) -> Self {
        Self {
            target_index,
            position,
            rotation: None,
        }
    }

    pub fn bone(target_index: u32, position: Vec3, rotation: Rotation) -> Self {
        Self {
            target_index,
            position,
            rotation: Some(rotation),
        }
    }
}

/// Morph 描述
#[derive(Clone, Debug)]
pub struct MorphDescriptor {
    pub name: String,
    /// 声明类型：1 = 顶点，2 = 骨骼，其余忽略
    pub morph_type: u8,
    pub elements: Vec<MorphElement>,
}

/// 完整模型描述
#[derive(Clone, Debug)]
pub struct ModelDescriptor {
    pub name: String,
    pub bones: Vec<BoneDescriptor>,
    pub morphs: Vec<MorphDescriptor>,
    pub vertex_count: usize,
}
