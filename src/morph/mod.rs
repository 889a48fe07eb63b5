//! Morph 变形系统
//!
//! 顶点 Morph（类型 1）扰动顶点位置，骨骼 Morph（类型 2）扰动骨骼变换。
//! 坐标系转换在目录构建时一次性完成，运行期不再转换。

mod catalog;
mod manager;

pub use catalog::{MorphCatalog, DEFAULT_MAX_MORPH_SLOTS};
pub use manager::MorphManager;

use std::collections::HashMap;

use glam::Vec3;

/// 骨骼 Morph 偏移（构建时已完成坐标转换，旋转统一为 ZXY 欧拉角）
#[derive(Clone, Debug)]
pub struct BoneMorphOffset {
    pub bone_index: u32,
    pub translation: Vec3,
    pub rotation: Vec3,
}

/// 分类后的 Morph 数据，类型在构建时确定一次
#[derive(Clone, Debug)]
pub enum MorphKind {
    Vertex {
        /// 稠密缓冲区中的槽位；超出容量的 Morph 没有槽位，不参与打包
        slot: Option<usize>,
        /// 稀疏偏移：顶点索引 -> 位置增量（构建时已完成 Z 翻转）
        offsets: HashMap<u32, Vec3>,
    },
    Bone {
        offsets: Vec<BoneMorphOffset>,
    },
}

/// 目录中的一个 Morph
#[derive(Clone, Debug)]
pub struct Morph {
    pub name: String,
    pub kind: MorphKind,
}

/// Morph 权重状态
///
/// 禁用时有效贡献为零，但存量权重保留（供界面显示）。
#[derive(Clone, Copy, Debug)]
pub struct MorphWeight {
    pub weight: f32,
    pub enabled: bool,
}

impl MorphWeight {
    /// 有效贡献：启用时为权重，禁用时为 0
    pub fn effective(&self) -> f32 {
        if self.enabled {
            self.weight
        } else {
            0.0
        }
    }
}

impl Default for MorphWeight {
    fn default() -> Self {
        Self {
            weight: 0.0,
            enabled: true,
        }
    }
}
