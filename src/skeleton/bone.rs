//! 骨骼节点

use glam::{Mat4, Vec3};

use crate::math::Rotation;

/// 骨骼节点（索引即其在骨骼数组中的位置，子骨骼列表由管理器维护）
#[derive(Clone, Debug)]
pub struct Bone {
    pub name: String,
    /// 父骨骼索引，-1 表示根骨骼
    pub parent_index: i32,
    /// 模型空间的初始位置（来自加载数据）
    pub initial_position: Vec3,
    /// 相对于父骨骼的绑定偏移（在 build 中计算）
    pub bind_offset: Vec3,
    /// 绑定本地旋转（观测数据中恒为单位旋转，保留字段以不排除非单位绑定）
    pub bind_rotation: Rotation,
    /// 逆绑定矩阵（在 build 中计算，之后不变）
    pub inverse_bind_matrix: Mat4,
}

impl Bone {
    pub fn new(name: String) -> Self {
        Self {
            name,
            parent_index: -1,
            initial_position: Vec3::ZERO,
            bind_offset: Vec3::ZERO,
            bind_rotation: Rotation::IDENTITY,
            inverse_bind_matrix: Mat4::IDENTITY,
        }
    }
}

impl Default for Bone {
    fn default() -> Self {
        Self::new(String::new())
    }
}
