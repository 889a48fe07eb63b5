//! 骨骼管理器
//!
//! 持有骨骼数组（按连续索引的 arena）、一次性构建的子骨骼邻接表、
//! 绑定姿态及其逆绑定矩阵，以及当前姿态。蒙皮矩阵按需重算，
//! 由脏标记控制节奏：任何姿态修改置位，消费方读取后清除。

use std::collections::HashMap;

use glam::Mat4;

use crate::math::{compose_trs, Rotation};
use crate::model::BoneDescriptor;
use crate::{EngineError, Result};

use super::{Bone, BoneTransformUpdate, PoseTransform};

/// 逆矩阵退化判定阈值
const SINGULAR_DET_EPS: f32 = 1e-8;

/// 骨骼管理器
pub struct BoneManager {
    bones: Vec<Bone>,
    name_to_index: HashMap<String, usize>,
    /// 子骨骼邻接表（与骨骼数组同长）
    children: Vec<Vec<usize>>,
    roots: Vec<usize>,
    bind_pose: Vec<PoseTransform>,
    pose: Vec<PoseTransform>,
    world_matrices: Vec<Mat4>,
    /// 平铺蒙皮矩阵缓冲区：bone_count * 16，列主序
    skinning_buffer: Vec<f32>,
    pose_dirty: bool,
}

impl BoneManager {
    /// 从加载数据构建骨骼层级
    ///
    /// 父索引越界、存在环、或者骨骼数为零都是致命配置错误。
    pub fn build(descriptors: &[BoneDescriptor]) -> Result<Self> {
        let bone_count = descriptors.len();
        if bone_count == 0 {
            return Err(EngineError::EmptySkeleton);
        }

        let mut bones: Vec<Bone> = Vec::with_capacity(bone_count);
        let mut name_to_index = HashMap::new();
        let mut children: Vec<Vec<usize>> = vec![Vec::new(); bone_count];
        let mut roots = Vec::new();

        for (i, desc) in descriptors.iter().enumerate() {
            let parent = desc.parent_index;
            if parent >= 0 {
                let p = parent as usize;
                if p >= bone_count {
                    return Err(EngineError::InvalidParent { bone: i, parent });
                }
                if p == i {
                    return Err(EngineError::HierarchyCycle(i));
                }
                children[p].push(i);
            } else {
                roots.push(i);
            }

            let mut bone = Bone::new(desc.name.clone());
            bone.parent_index = parent;
            bone.initial_position = desc.bind_position;
            name_to_index.insert(bone.name.clone(), i);
            bones.push(bone);
        }

        // 从根出发的可达性检查：不可达的骨骼必然处于环上
        let mut visited = vec![false; bone_count];
        let mut stack: Vec<usize> = roots.clone();
        while let Some(i) = stack.pop() {
            if visited[i] {
                continue;
            }
            visited[i] = true;
            stack.extend_from_slice(&children[i]);
        }
        if let Some(cyclic) = visited.iter().position(|v| !v) {
            return Err(EngineError::HierarchyCycle(cyclic));
        }

        // 绑定偏移 = 自身初始位置 - 父初始位置
        for i in 0..bone_count {
            let parent = bones[i].parent_index;
            bones[i].bind_offset = if parent >= 0 {
                bones[i].initial_position - bones[parent as usize].initial_position
            } else {
                bones[i].initial_position
            };
        }

        let bind_pose: Vec<PoseTransform> = bones
            .iter()
            .map(|b| PoseTransform {
                position: b.bind_offset,
                rotation: b.bind_rotation,
                ..PoseTransform::default()
            })
            .collect();

        let mut manager = Self {
            bones,
            name_to_index,
            children,
            roots,
            pose: bind_pose.clone(),
            bind_pose,
            world_matrices: vec![Mat4::IDENTITY; bone_count],
            skinning_buffer: vec![0.0; bone_count * 16],
            pose_dirty: false,
        };

        // 绑定世界矩阵一次性合成，随后求逆得到逆绑定矩阵
        manager.compute_world_matrices();
        for i in 0..bone_count {
            let bind_world = manager.world_matrices[i];
            manager.bones[i].inverse_bind_matrix = if bind_world.determinant().abs() < SINGULAR_DET_EPS {
                log::warn!(
                    "骨骼 '{}' 的绑定矩阵退化，逆绑定矩阵回退为单位矩阵",
                    manager.bones[i].name
                );
                Mat4::IDENTITY
            } else {
                bind_world.inverse()
            };
        }

        log::debug!(
            "骨骼层级构建完成: {} 根骨骼, {} 个根",
            bone_count,
            manager.roots.len()
        );
        Ok(manager)
    }

    pub fn bone_count(&self) -> usize {
        self.bones.len()
    }

    pub fn get_bone(&self, index: usize) -> Option<&Bone> {
        self.bones.get(index)
    }

    /// 通过名称查找骨骼
    pub fn find_bone_by_name(&self, name: &str) -> Option<usize> {
        self.name_to_index.get(name).copied()
    }

    /// 获取当前姿态
    pub fn get_bone_transform(&self, index: usize) -> Option<&PoseTransform> {
        self.pose.get(index)
    }

    /// 获取绑定姿态
    pub fn bind_transform(&self, index: usize) -> Option<&PoseTransform> {
        self.bind_pose.get(index)
    }

    /// 部分更新骨骼姿态；非法索引记录警告后忽略
    pub fn set_bone_transform(&mut self, index: usize, update: BoneTransformUpdate) {
        let Some(pose) = self.pose.get_mut(index) else {
            log::warn!("set_bone_transform: 骨骼索引 {} 越界，忽略", index);
            return;
        };
        if let Some(position) = update.position {
            pose.position = position;
        }
        if let Some(rotation) = update.rotation {
            pose.rotation = rotation;
        }
        if let Some(scale) = update.scale {
            pose.scale = scale;
        }
        if let Some(enabled) = update.enabled {
            pose.enabled = enabled;
        }
        self.pose_dirty = true;
    }

    /// 以绑定姿态为基准设置偏移（骨骼 Morph 专用）
    ///
    /// 位置与旋转都从绑定值出发，因此相同权重重复调用结果不变；
    /// 同一骨骼的多次调用彼此覆盖（后写胜出）。
    pub fn apply_bind_relative_offset(
        &mut self,
        index: usize,
        translation: glam::Vec3,
        rotation_euler: glam::Vec3,
    ) {
        let Some(bind) = self.bind_pose.get(index) else {
            log::warn!("apply_bind_relative_offset: 骨骼索引 {} 越界，忽略", index);
            return;
        };
        let base_euler = bind.rotation.to_euler_zxy();
        let position = bind.position + translation;
        let pose = &mut self.pose[index];
        pose.position = position;
        pose.rotation = Rotation::Euler(base_euler + rotation_euler);
        self.pose_dirty = true;
    }

    /// 重置为绑定姿态
    pub fn reset_pose(&mut self) {
        self.pose.copy_from_slice(&self.bind_pose);
        self.pose_dirty = true;
    }

    /// 姿态是否被修改过（由消费方清除）
    pub fn is_pose_dirty(&self) -> bool {
        self.pose_dirty
    }

    pub fn clear_pose_dirty(&mut self) {
        self.pose_dirty = false;
    }

    /// 快照用：整份姿态拷贝
    pub(crate) fn pose_vec(&self) -> Vec<PoseTransform> {
        self.pose.clone()
    }

    pub(crate) fn restore_pose(&mut self, poses: &[PoseTransform]) {
        if poses.len() != self.pose.len() {
            log::warn!(
                "快照骨骼数 {} 与模型骨骼数 {} 不一致，仅恢复公共前缀",
                poses.len(),
                self.pose.len()
            );
        }
        let n = poses.len().min(self.pose.len());
        self.pose[..n].copy_from_slice(&poses[..n]);
        self.pose_dirty = true;
    }

    /// 深度优先重算世界矩阵（显式栈，深度等于层级深度）
    ///
    /// 禁用骨骼的世界矩阵直接沿用父骨骼，子骨骼继承的也是这个透传值。
    pub fn compute_world_matrices(&mut self) {
        let mut stack: Vec<usize> = self.roots.clone();
        while let Some(i) = stack.pop() {
            let parent_world = match self.bones[i].parent_index {
                p if p >= 0 => self.world_matrices[p as usize],
                _ => Mat4::IDENTITY,
            };
            let pose = &self.pose[i];
            self.world_matrices[i] = if pose.enabled {
                parent_world * compose_trs(pose.position, &pose.rotation, pose.scale)
            } else {
                parent_world
            };
            stack.extend_from_slice(&self.children[i]);
        }
    }

    /// 重算蒙皮矩阵并返回平铺缓冲区
    ///
    /// skinning[i] = world[i] * inverse_bind[i]，每根骨骼 16 个 f32，列主序。
    /// 总是返回尺寸正确的缓冲区，不会失败。
    pub fn compute_skinning_matrices(&mut self) -> &[f32] {
        self.compute_world_matrices();
        for (i, bone) in self.bones.iter().enumerate() {
            let skinning = self.world_matrices[i] * bone.inverse_bind_matrix;
            self.skinning_buffer[i * 16..(i + 1) * 16].copy_from_slice(&skinning.to_cols_array());
        }
        &self.skinning_buffer
    }

    /// 读取上次计算的平铺缓冲区（不触发重算）
    pub fn skinning_buffer(&self) -> &[f32] {
        &self.skinning_buffer
    }

    pub fn world_matrix(&self, index: usize) -> Mat4 {
        self.world_matrices.get(index).copied().unwrap_or(Mat4::IDENTITY)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::Vec3;

    const EPS: f32 = 1e-5;

    fn chain3() -> Vec<BoneDescriptor> {
        vec![
            BoneDescriptor::new("root", Vec3::ZERO, -1),
            BoneDescriptor::new("spine", Vec3::new(0.0, 1.0, 0.0), 0),
            BoneDescriptor::new("head", Vec3::new(0.0, 2.0, 0.0), 1),
        ]
    }

    fn assert_identity(buffer: &[f32], bone: usize) {
        let m = &buffer[bone * 16..(bone + 1) * 16];
        let identity = Mat4::IDENTITY.to_cols_array();
        for i in 0..16 {
            assert!((m[i] - identity[i]).abs() < EPS, "bone {} elem {}", bone, i);
        }
    }

    #[test]
    fn test_bind_pose_skinning_is_identity() {
        let mut manager = BoneManager::build(&chain3()).unwrap();
        let buffer = manager.compute_skinning_matrices();
        assert_eq!(buffer.len(), 3 * 16);
        for bone in 0..3 {
            assert_identity(buffer, bone);
        }
    }

    #[test]
    fn test_empty_skeleton_rejected() {
        assert!(matches!(
            BoneManager::build(&[]),
            Err(EngineError::EmptySkeleton)
        ));
    }

    #[test]
    fn test_out_of_range_parent_rejected() {
        let descs = vec![BoneDescriptor::new("a", Vec3::ZERO, 7)];
        assert!(matches!(
            BoneManager::build(&descs),
            Err(EngineError::InvalidParent { bone: 0, parent: 7 })
        ));
    }

    #[test]
    fn test_cycle_rejected() {
        // 1 和 2 互为父子，无法从根到达
        let descs = vec![
            BoneDescriptor::new("root", Vec3::ZERO, -1),
            BoneDescriptor::new("a", Vec3::ZERO, 2),
            BoneDescriptor::new("b", Vec3::ZERO, 1),
        ];
        assert!(matches!(
            BoneManager::build(&descs),
            Err(EngineError::HierarchyCycle(_))
        ));
    }

    #[test]
    fn test_disabled_bone_passes_through_parent_world() {
        let mut manager = BoneManager::build(&chain3()).unwrap();
        manager.set_bone_transform(
            1,
            BoneTransformUpdate {
                enabled: Some(false),
                ..Default::default()
            },
        );
        manager.compute_world_matrices();
        let parent = manager.world_matrix(0);
        let disabled = manager.world_matrix(1);
        assert!((parent.to_cols_array()[12] - disabled.to_cols_array()[12]).abs() < EPS);
        assert!((parent.to_cols_array()[13] - disabled.to_cols_array()[13]).abs() < EPS);
        // 子骨骼继承的是透传值：head 的世界位置少了 spine 的一段
        let head = manager.world_matrix(2);
        assert!((head.to_cols_array()[13] - 1.0).abs() < EPS);
    }

    #[test]
    fn test_partial_update_keeps_other_fields() {
        let mut manager = BoneManager::build(&chain3()).unwrap();
        manager.set_bone_transform(1, BoneTransformUpdate::position(Vec3::new(1.0, 1.0, 0.0)));
        let pose = manager.get_bone_transform(1).unwrap();
        assert!((pose.position.x - 1.0).abs() < EPS);
        assert!(pose.enabled);
        assert!((pose.scale.x - 1.0).abs() < EPS);
        assert!(manager.is_pose_dirty());
    }

    #[test]
    fn test_dirty_flag_cleared_by_consumer_only() {
        let mut manager = BoneManager::build(&chain3()).unwrap();
        manager.set_bone_transform(0, BoneTransformUpdate::position(Vec3::X));
        assert!(manager.is_pose_dirty());
        manager.compute_skinning_matrices();
        // 计算不清除脏标记，由消费方决定
        assert!(manager.is_pose_dirty());
        manager.clear_pose_dirty();
        assert!(!manager.is_pose_dirty());
    }

    #[test]
    fn test_translated_pose_moves_skinning() {
        let mut manager = BoneManager::build(&chain3()).unwrap();
        let bind = manager.bind_transform(1).unwrap().position;
        manager.set_bone_transform(
            1,
            BoneTransformUpdate::position(bind + Vec3::new(0.5, 0.0, 0.0)),
        );
        let buffer = manager.compute_skinning_matrices();
        // 平移列（列主序第 12~14 位）反映偏移
        assert!((buffer[16 + 12] - 0.5).abs() < EPS);
        // root 未动，保持单位阵
        assert_identity(buffer, 0);
    }
}
