//! Morph 管理器
//!
//! 持有权重表和两块 GPU 打包缓冲区：
//! - 顶点偏移：vertex_count * max_morph_slots * 3 个 f32，
//!   地址为 (vertex * max_morph_slots + slot) * 3 + component；
//! - 槽位权重：max_morph_slots 个 vec4 槽（每槽 4 个 f32，权重在 .x）。
//! 缓冲区跨距在构建时固定，与实际 Morph 数无关，保证 GPU 寻址恒定。

use std::collections::HashMap;

use glam::Vec3;
use rayon::prelude::*;

use crate::skeleton::BoneManager;

use super::{MorphCatalog, MorphKind, MorphWeight};

/// Morph 管理器
pub struct MorphManager {
    catalog: MorphCatalog,
    weights: Vec<MorphWeight>,
    vertex_count: usize,
    /// 稠密顶点偏移缓冲区
    vertex_offset_buffer: Vec<f32>,
    /// 槽位权重缓冲区（vec4 跨距）
    weight_buffer: Vec<f32>,
    weights_dirty: bool,
}

impl MorphManager {
    pub fn new(catalog: MorphCatalog, vertex_count: usize) -> Self {
        let morph_count = catalog.morph_count();
        let slots = catalog.max_morph_slots();
        Self {
            catalog,
            weights: vec![MorphWeight::default(); morph_count],
            vertex_count,
            vertex_offset_buffer: vec![0.0; vertex_count * slots * 3],
            weight_buffer: vec![0.0; slots * 4],
            weights_dirty: false,
        }
    }

    pub fn catalog(&self) -> &MorphCatalog {
        &self.catalog
    }

    pub fn morph_count(&self) -> usize {
        self.weights.len()
    }

    pub fn vertex_count(&self) -> usize {
        self.vertex_count
    }

    pub fn find_morph_by_name(&self, name: &str) -> Option<usize> {
        self.catalog.find_by_name(name)
    }

    /// 设置权重与启用状态；权重收紧到 [0, 1]，非法索引记录警告后忽略
    pub fn set_morph_weight(&mut self, index: usize, weight: f32, enabled: bool) {
        let Some(entry) = self.weights.get_mut(index) else {
            log::warn!("set_morph_weight: Morph 索引 {} 越界，忽略", index);
            return;
        };
        entry.weight = weight.clamp(0.0, 1.0);
        entry.enabled = enabled;
        self.weights_dirty = true;
    }

    /// 单独切换启用状态，存量权重不变
    pub fn set_morph_enabled(&mut self, index: usize, enabled: bool) {
        let Some(entry) = self.weights.get_mut(index) else {
            log::warn!("set_morph_enabled: Morph 索引 {} 越界，忽略", index);
            return;
        };
        entry.enabled = enabled;
        self.weights_dirty = true;
    }

    /// 存量权重（与启用状态无关）
    pub fn get_morph_weight(&self, index: usize) -> Option<f32> {
        self.weights.get(index).map(|w| w.weight)
    }

    pub fn is_morph_enabled(&self, index: usize) -> Option<bool> {
        self.weights.get(index).map(|w| w.enabled)
    }

    /// 有效贡献：禁用时为 0
    pub fn effective_weight(&self, index: usize) -> f32 {
        self.weights.get(index).map(|w| w.effective()).unwrap_or(0.0)
    }

    /// 重置所有权重为 0（启用状态保留）
    pub fn reset_all_weights(&mut self) {
        for entry in &mut self.weights {
            entry.weight = 0.0;
        }
        self.weights_dirty = true;
    }

    pub fn is_weights_dirty(&self) -> bool {
        self.weights_dirty
    }

    pub fn clear_weights_dirty(&mut self) {
        self.weights_dirty = false;
    }

    /// 快照用：整份权重表拷贝
    pub(crate) fn weights_vec(&self) -> Vec<MorphWeight> {
        self.weights.clone()
    }

    pub(crate) fn restore_weights(&mut self, weights: &[MorphWeight]) {
        if weights.len() != self.weights.len() {
            log::warn!(
                "快照 Morph 数 {} 与模型 Morph 数 {} 不一致，仅恢复公共前缀",
                weights.len(),
                self.weights.len()
            );
        }
        let n = weights.len().min(self.weights.len());
        self.weights[..n].copy_from_slice(&weights[..n]);
        self.weights_dirty = true;
    }

    /// 把加权顶点偏移写入稠密缓冲区并刷新槽位权重缓冲区
    ///
    /// 按顶点切块并行打包（每顶点 slots * 3 个 f32）。
    /// 未使用的槽位保持为零。总是产出尺寸正确的缓冲区。
    pub fn apply_vertex_morphs(&mut self) {
        let slots = self.catalog.max_morph_slots();
        self.weight_buffer.iter_mut().for_each(|v| *v = 0.0);
        if slots == 0 {
            return;
        }

        // 收集活跃的顶点 Morph；权重缓冲区对所有有槽位的 Morph 都要写
        let mut active: Vec<(usize, f32, &HashMap<u32, Vec3>)> = Vec::new();
        for (index, morph) in self.catalog.iter().enumerate() {
            let MorphKind::Vertex { slot: Some(slot), offsets } = &morph.kind else {
                continue;
            };
            let weight = self.weights[index].effective();
            self.weight_buffer[slot * 4] = weight;
            if weight > 0.0 {
                active.push((*slot, weight, offsets));
            }
        }

        // 并行填充：每个顶点一个切块
        self.vertex_offset_buffer
            .par_chunks_mut(slots * 3)
            .enumerate()
            .for_each(|(vertex, chunk)| {
                chunk.fill(0.0);
                for &(slot, weight, offsets) in &active {
                    if let Some(delta) = offsets.get(&(vertex as u32)) {
                        let base = slot * 3;
                        chunk[base] = delta.x * weight;
                        chunk[base + 1] = delta.y * weight;
                        chunk[base + 2] = delta.z * weight;
                    }
                }
            });
    }

    /// 把加权骨骼偏移施加到骨骼姿态上
    ///
    /// 偏移以绑定姿态为基准（offset * weight 加在绑定值上），
    /// 相同权重重复调用结果相同。多个 Morph 命中同一骨骼时
    /// 按目录顺序后写胜出（既有行为，保留；需要叠加的调用方
    /// 走 `apply_bone_morphs_batch`）。权重为 0（含禁用）的 Morph
    /// 仍会把目标骨骼写回绑定值，保证贡献确实归零。
    pub fn apply_bone_morphs(&mut self, bone_manager: &mut BoneManager) {
        for (index, morph) in self.catalog.iter().enumerate() {
            let MorphKind::Bone { offsets } = &morph.kind else {
                continue;
            };
            let weight = self.weights[index].effective();
            for offset in offsets {
                bone_manager.apply_bind_relative_offset(
                    offset.bone_index as usize,
                    offset.translation * weight,
                    offset.rotation * weight,
                );
            }
        }
    }

    /// 批量入口：调用方已把多个 Morph 在同一骨骼上的偏移累加好
    ///
    /// map 为 骨骼索引 -> (位置偏移, 欧拉旋转偏移)，权重已折算在内，
    /// 同样以绑定姿态为基准施加。
    pub fn apply_bone_morphs_batch(
        &self,
        bone_manager: &mut BoneManager,
        accumulated: &HashMap<usize, (Vec3, Vec3)>,
    ) {
        for (&bone, &(translation, rotation)) in accumulated {
            bone_manager.apply_bind_relative_offset(bone, translation, rotation);
        }
    }

    /// 稠密顶点偏移缓冲区
    pub fn vertex_offset_buffer(&self) -> &[f32] {
        &self.vertex_offset_buffer
    }

    /// 槽位权重缓冲区（vec4 跨距）
    pub fn weight_buffer(&self) -> &[f32] {
        &self.weight_buffer
    }
}
