//! 运行时模型外观
//!
//! 持有骨骼管理器、Morph 管理器和片段播放器，对外暴露每帧 API：
//! 直接设置姿态/权重、播放控制、缓冲区计算、快照与恢复。
//!
//! 每帧典型顺序（由调用方驱动，核心不决定帧时机）：
//! 1. `advance(dt)` 或直接调用设置接口；
//! 2. `compute_morph_buffers()` —— 先把骨骼 Morph 折入姿态，再打包顶点缓冲；
//! 3. `compute_skinning_matrices()`；
//! 4. 消费缓冲区后 `clear_dirty()`。

use crate::animation::{ClipLibrary, ClipPlayer, PlayerState};
use crate::morph::{MorphCatalog, MorphManager, DEFAULT_MAX_MORPH_SLOTS};
use crate::skeleton::{BoneManager, BoneTransformUpdate, PoseTransform};
use crate::Result;

use super::{ModelDescriptor, PoseSnapshot};

/// 运行时模型
pub struct MmdModel {
    pub name: String,
    vertex_count: usize,
    bone_manager: BoneManager,
    morph_manager: MorphManager,
    player: ClipPlayer,
}

impl MmdModel {
    /// 用默认槽位容量构建
    pub fn new(descriptor: &ModelDescriptor) -> Result<Self> {
        Self::with_max_morph_slots(descriptor, DEFAULT_MAX_MORPH_SLOTS)
    }

    /// 构建模型，稠密缓冲区跨距由 `max_morph_slots` 固定
    pub fn with_max_morph_slots(
        descriptor: &ModelDescriptor,
        max_morph_slots: usize,
    ) -> Result<Self> {
        let bone_manager = BoneManager::build(&descriptor.bones)?;
        let catalog = MorphCatalog::build(
            &descriptor.morphs,
            descriptor.vertex_count,
            bone_manager.bone_count(),
            max_morph_slots,
        )?;
        let morph_manager = MorphManager::new(catalog, descriptor.vertex_count);

        log::debug!(
            "模型 '{}' 构建完成: {} 根骨骼, {} 个 Morph, {} 个顶点",
            descriptor.name,
            bone_manager.bone_count(),
            morph_manager.morph_count(),
            descriptor.vertex_count
        );

        Ok(Self {
            name: descriptor.name.clone(),
            vertex_count: descriptor.vertex_count,
            bone_manager,
            morph_manager,
            player: ClipPlayer::new(),
        })
    }

    pub fn vertex_count(&self) -> usize {
        self.vertex_count
    }

    pub fn bone_count(&self) -> usize {
        self.bone_manager.bone_count()
    }

    pub fn morph_count(&self) -> usize {
        self.morph_manager.morph_count()
    }

    pub fn bone_manager(&self) -> &BoneManager {
        &self.bone_manager
    }

    pub fn morph_manager(&self) -> &MorphManager {
        &self.morph_manager
    }

    // ========== 直接姿态/权重接口 ==========

    pub fn set_bone_transform(&mut self, index: usize, update: BoneTransformUpdate) {
        self.bone_manager.set_bone_transform(index, update);
    }

    pub fn get_bone_transform(&self, index: usize) -> Option<&PoseTransform> {
        self.bone_manager.get_bone_transform(index)
    }

    pub fn set_morph_weight(&mut self, index: usize, weight: f32, enabled: bool) {
        self.morph_manager.set_morph_weight(index, weight, enabled);
    }

    pub fn set_morph_enabled(&mut self, index: usize, enabled: bool) {
        self.morph_manager.set_morph_enabled(index, enabled);
    }

    pub fn get_morph_weight(&self, index: usize) -> Option<f32> {
        self.morph_manager.get_morph_weight(index)
    }

    pub fn find_bone_by_name(&self, name: &str) -> Option<usize> {
        self.bone_manager.find_bone_by_name(name)
    }

    pub fn find_morph_by_name(&self, name: &str) -> Option<usize> {
        self.morph_manager.find_morph_by_name(name)
    }

    /// 回到绑定姿态、权重清零
    pub fn reset(&mut self) {
        self.bone_manager.reset_pose();
        self.morph_manager.reset_all_weights();
    }

    // ========== 播放控制 ==========

    pub fn play(&mut self, library: &ClipLibrary, name: &str) {
        self.player.play(library, name);
    }

    pub fn pause(&mut self) {
        self.player.pause();
    }

    pub fn resume(&mut self) {
        self.player.resume();
    }

    pub fn stop(&mut self) {
        self.player.stop();
    }

    pub fn set_speed(&mut self, speed: f32) {
        self.player.set_speed(speed);
    }

    pub fn seek(&mut self, time: f32) {
        self.player.seek(time);
    }

    pub fn player_state(&self) -> PlayerState {
        self.player.state()
    }

    pub fn player_time(&self) -> f32 {
        self.player.time()
    }

    /// 推进播放器并把采样结果写入姿态与权重表
    ///
    /// 只在播放中采样；非循环片段结束的那一帧写入末尾姿态，
    /// 之后暂停/停止状态不再重复写入（避免无意义置脏）。
    pub fn advance(&mut self, dt: f32) {
        let was_playing = self.player.state() == PlayerState::Playing;
        self.player.advance(dt);
        let state = self.player.state();
        if state == PlayerState::Playing || (was_playing && state == PlayerState::Stopped) {
            self.player
                .apply(&mut self.bone_manager, &mut self.morph_manager);
        }
    }

    // ========== 缓冲区计算 ==========

    /// 计算蒙皮矩阵，返回 bone_count * 16 的平铺缓冲区（列主序）
    pub fn compute_skinning_matrices(&mut self) -> &[f32] {
        self.bone_manager.compute_skinning_matrices()
    }

    /// 折算 Morph 并返回 (槽位权重缓冲, 稠密顶点偏移缓冲)
    ///
    /// 先把骨骼 Morph 的加权偏移折入姿态（之后的蒙皮计算会反映它们），
    /// 再打包顶点 Morph 缓冲区。总是返回尺寸正确的缓冲区。
    pub fn compute_morph_buffers(&mut self) -> (&[f32], &[f32]) {
        self.morph_manager.apply_bone_morphs(&mut self.bone_manager);
        self.morph_manager.apply_vertex_morphs();
        (
            self.morph_manager.weight_buffer(),
            self.morph_manager.vertex_offset_buffer(),
        )
    }

    // ========== 脏标记 ==========

    /// 自上次清除以来姿态或权重是否被修改
    pub fn is_dirty(&self) -> bool {
        self.bone_manager.is_pose_dirty() || self.morph_manager.is_weights_dirty()
    }

    /// 由消费方在读取缓冲区后调用
    pub fn clear_dirty(&mut self) {
        self.bone_manager.clear_pose_dirty();
        self.morph_manager.clear_weights_dirty();
    }

    // ========== 快照 ==========

    /// 保存当前姿态与权重表
    pub fn create_snapshot(&self) -> PoseSnapshot {
        PoseSnapshot {
            poses: self.bone_manager.pose_vec(),
            weights: self.morph_manager.weights_vec(),
        }
    }

    /// 恢复到快照状态并置脏
    pub fn restore_from_snapshot(&mut self, snapshot: &PoseSnapshot) {
        self.bone_manager.restore_pose(&snapshot.poses);
        self.morph_manager.restore_weights(&snapshot.weights);
    }
}
