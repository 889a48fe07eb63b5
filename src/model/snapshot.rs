//! 姿态快照
//!
//! 保存某一时刻的完整姿态与 Morph 权重表，用于混合或回滚。
//! 快照只对产生它的模型有意义。

use crate::morph::MorphWeight;
use crate::skeleton::PoseTransform;

/// 姿态 + 权重快照
#[derive(Clone, Debug)]
pub struct PoseSnapshot {
    pub poses: Vec<PoseTransform>,
    pub weights: Vec<MorphWeight>,
}
