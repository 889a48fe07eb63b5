//! 片段播放器
//!
//! 三态状态机（Stopped / Playing / Paused），时间驱动采样，
//! 采样结果通过管理器的设置接口写入姿态与权重。

use std::sync::Arc;

use crate::morph::MorphManager;
use crate::skeleton::{BoneManager, BoneTransformUpdate};

use super::{AnimationClip, ClipLibrary};

/// 播放状态
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PlayerState {
    Stopped,
    Playing,
    Paused,
}

/// 片段播放器
pub struct ClipPlayer {
    clip: Option<Arc<AnimationClip>>,
    state: PlayerState,
    /// 当前时间（秒）
    time: f32,
    /// 播放速度倍率
    speed: f32,
}

impl ClipPlayer {
    pub fn new() -> Self {
        Self {
            clip: None,
            state: PlayerState::Stopped,
            time: 0.0,
            speed: 1.0,
        }
    }

    /// 从片段库按名播放；未知片段记录警告且不改变当前状态
    pub fn play(&mut self, library: &ClipLibrary, name: &str) {
        let Some(clip) = library.get(name) else {
            log::warn!("play: 片段库中没有 '{}'，忽略", name);
            return;
        };
        self.clip = Some(clip);
        self.time = 0.0;
        self.state = PlayerState::Playing;
    }

    pub fn pause(&mut self) {
        if self.state == PlayerState::Playing {
            self.state = PlayerState::Paused;
        }
    }

    pub fn resume(&mut self) {
        if self.state == PlayerState::Paused {
            self.state = PlayerState::Playing;
        }
    }

    /// 停止并清除片段，时间归零
    pub fn stop(&mut self) {
        self.state = PlayerState::Stopped;
        self.time = 0.0;
        self.clip = None;
    }

    pub fn set_speed(&mut self, speed: f32) {
        self.speed = speed.max(0.0);
    }

    pub fn seek(&mut self, time: f32) {
        self.time = time.max(0.0);
    }

    /// 推进时间
    ///
    /// 循环片段在 time >= duration 时按模回绕（与步长无关的连续循环）；
    /// 非循环片段收紧到 duration 并转入 Stopped（片段与末时间保留，
    /// 供尾帧姿态继续采样）。
    pub fn advance(&mut self, dt: f32) {
        if self.state != PlayerState::Playing {
            return;
        }
        let Some(clip) = self.clip.as_ref() else {
            return;
        };

        self.time += dt * self.speed;
        let duration = clip.duration;
        if duration <= 0.0 {
            self.time = 0.0;
            self.state = PlayerState::Stopped;
            return;
        }
        if self.time >= duration {
            if clip.looping {
                self.time %= duration;
            } else {
                self.time = duration;
                self.state = PlayerState::Stopped;
            }
        }
    }

    /// 按当前时间采样并写入管理器
    ///
    /// 轨道按名称解析到骨骼/Morph；解析不到的轨道保持惰性。
    /// Morph 轨道只改权重，启用状态保留。
    pub fn apply(&self, bone_manager: &mut BoneManager, morph_manager: &mut MorphManager) {
        let Some(clip) = self.clip.as_ref() else {
            return;
        };

        for (name, _) in clip.bone_tracks() {
            let Some(index) = bone_manager.find_bone_by_name(name) else {
                continue;
            };
            if let Some((translation, rotation, scale)) = clip.sample_bone_track(name, self.time) {
                bone_manager.set_bone_transform(
                    index,
                    BoneTransformUpdate {
                        position: Some(translation),
                        rotation: Some(rotation),
                        scale: Some(scale),
                        enabled: None,
                    },
                );
            }
        }

        for (name, _) in clip.morph_tracks() {
            let Some(index) = morph_manager.find_morph_by_name(name) else {
                continue;
            };
            if let Some(weight) = clip.sample_morph_track(name, self.time) {
                let enabled = morph_manager.is_morph_enabled(index).unwrap_or(true);
                morph_manager.set_morph_weight(index, weight, enabled);
            }
        }
    }

    pub fn state(&self) -> PlayerState {
        self.state
    }

    pub fn time(&self) -> f32 {
        self.time
    }

    pub fn speed(&self) -> f32 {
        self.speed
    }

    pub fn current_clip(&self) -> Option<&str> {
        self.clip.as_deref().map(|c| c.name.as_str())
    }
}

impl Default for ClipPlayer {
    fn default() -> Self {
        Self::new()
    }
}
