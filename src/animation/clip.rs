//! 动画片段
//!
//! 按名称组织的骨骼/Morph 轨道，每条轨道是按时间升序的关键帧数组。
//! 采样沿排序数组线性扫描找前后包围帧，再做线性插值；
//! 只有前帧（非循环片段尾部）时按全值保持。

use std::collections::HashMap;

use glam::Vec3;

use crate::math::Rotation;

use super::{BoneKeyframe, MorphKeyframe};

/// 动画片段
#[derive(Clone, Debug)]
pub struct AnimationClip {
    pub name: String,
    /// 片段时长（秒）
    pub duration: f32,
    pub looping: bool,
    bone_tracks: HashMap<String, Vec<BoneKeyframe>>,
    morph_tracks: HashMap<String, Vec<MorphKeyframe>>,
}

impl AnimationClip {
    pub fn new(name: impl Into<String>, duration: f32, looping: bool) -> Self {
        Self {
            name: name.into(),
            duration: duration.max(0.0),
            looping,
            bone_tracks: HashMap::new(),
            morph_tracks: HashMap::new(),
        }
    }

    /// 插入骨骼关键帧（轨道保持按时间排序）
    pub fn insert_bone_keyframe(&mut self, bone_name: &str, keyframe: BoneKeyframe) {
        let track = self.bone_tracks.entry(bone_name.to_string()).or_default();
        let at = track.partition_point(|k| k.time <= keyframe.time);
        track.insert(at, keyframe);
    }

    /// 插入 Morph 关键帧
    pub fn insert_morph_keyframe(&mut self, morph_name: &str, keyframe: MorphKeyframe) {
        let track = self.morph_tracks.entry(morph_name.to_string()).or_default();
        let at = track.partition_point(|k| k.time <= keyframe.time);
        track.insert(at, keyframe);
    }

    pub fn bone_tracks(&self) -> impl Iterator<Item = (&String, &Vec<BoneKeyframe>)> {
        self.bone_tracks.iter()
    }

    pub fn morph_tracks(&self) -> impl Iterator<Item = (&String, &Vec<MorphKeyframe>)> {
        self.morph_tracks.iter()
    }

    pub fn contains_bone_track(&self, name: &str) -> bool {
        self.bone_tracks.contains_key(name)
    }

    pub fn contains_morph_track(&self, name: &str) -> bool {
        self.morph_tracks.contains_key(name)
    }

    /// 采样骨骼轨道；空轨道返回 None（惰性通道）
    pub fn sample_bone_track(&self, name: &str, time: f32) -> Option<(Vec3, Rotation, Vec3)> {
        let track = self.bone_tracks.get(name)?;
        let (prev, next, t) = bracket(track, time, |k| k.time)?;
        Some((
            prev.translation.lerp(next.translation, t),
            lerp_rotation(&prev.rotation, &next.rotation, t),
            prev.scale.lerp(next.scale, t),
        ))
    }

    /// 采样 Morph 轨道；空轨道返回 None
    pub fn sample_morph_track(&self, name: &str, time: f32) -> Option<f32> {
        let track = self.morph_tracks.get(name)?;
        let (prev, next, t) = bracket(track, time, |k| k.time)?;
        Some(prev.weight + (next.weight - prev.weight) * t)
    }
}

/// 线性扫描找包围关键帧，返回 (前帧, 后帧, 插值因子)
///
/// 前后为同一帧（时间落在首帧前或末帧后）时因子为 0，即全值保持。
fn bracket<K>(track: &[K], time: f32, key_time: impl Fn(&K) -> f32) -> Option<(&K, &K, f32)> {
    if track.is_empty() {
        return None;
    }

    let mut prev_idx = 0;
    let mut next_idx = 0;
    for (i, key) in track.iter().enumerate() {
        if key_time(key) <= time {
            prev_idx = i;
        }
        if key_time(key) >= time {
            next_idx = i;
            break;
        }
        next_idx = i;
    }

    let prev = &track[prev_idx];
    let next = &track[next_idx];
    let prev_time = key_time(prev);
    let next_time = key_time(next);
    let t = if prev_idx == next_idx || next_time <= prev_time {
        0.0
    } else {
        (time - prev_time) / (next_time - prev_time)
    };
    Some((prev, next, t))
}

/// 旋转的线性插值：两端同为欧拉角时按分量插值，否则统一为四元数球面插值
fn lerp_rotation(prev: &Rotation, next: &Rotation, t: f32) -> Rotation {
    match (prev, next) {
        (Rotation::Euler(a), Rotation::Euler(b)) => Rotation::Euler(a.lerp(*b, t)),
        _ => Rotation::Quaternion(prev.to_quat().slerp(next.to_quat(), t)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const EPS: f32 = 1e-5;

    fn clip_with_track() -> AnimationClip {
        let mut clip = AnimationClip::new("walk", 2.0, true);
        clip.insert_bone_keyframe("arm", BoneKeyframe::with_translation(0.0, Vec3::ZERO));
        clip.insert_bone_keyframe(
            "arm",
            BoneKeyframe::with_translation(1.0, Vec3::new(2.0, 0.0, 0.0)),
        );
        clip.insert_morph_keyframe("smile", MorphKeyframe::new(0.0, 0.0));
        clip.insert_morph_keyframe("smile", MorphKeyframe::new(2.0, 1.0));
        clip
    }

    #[test]
    fn test_midpoint_interpolation() {
        let clip = clip_with_track();
        let (translation, _, _) = clip.sample_bone_track("arm", 0.5).unwrap();
        assert!((translation.x - 1.0).abs() < EPS);
        let weight = clip.sample_morph_track("smile", 1.0).unwrap();
        assert!((weight - 0.5).abs() < EPS);
    }

    #[test]
    fn test_tail_holds_last_keyframe() {
        let clip = clip_with_track();
        // 1.0 之后没有骨骼关键帧：保持末帧全值
        let (translation, _, _) = clip.sample_bone_track("arm", 1.8).unwrap();
        assert!((translation.x - 2.0).abs() < EPS);
    }

    #[test]
    fn test_before_first_keyframe_holds_first() {
        let mut clip = AnimationClip::new("c", 2.0, false);
        clip.insert_morph_keyframe("m", MorphKeyframe::new(1.0, 0.7));
        let weight = clip.sample_morph_track("m", 0.2).unwrap();
        assert!((weight - 0.7).abs() < EPS);
    }

    #[test]
    fn test_empty_track_is_inert() {
        let clip = clip_with_track();
        assert!(clip.sample_bone_track("leg", 0.5).is_none());
        assert!(clip.sample_morph_track("frown", 0.5).is_none());
    }

    #[test]
    fn test_coincident_keyframes_use_factor_zero() {
        let mut clip = AnimationClip::new("c", 1.0, false);
        clip.insert_morph_keyframe("m", MorphKeyframe::new(0.5, 0.2));
        clip.insert_morph_keyframe("m", MorphKeyframe::new(0.5, 0.9));
        // prev == next 时 t = 0，取前帧值，不产生 NaN
        let weight = clip.sample_morph_track("m", 0.5).unwrap();
        assert!(weight.is_finite());
    }

    #[test]
    fn test_keyframes_kept_sorted() {
        let mut clip = AnimationClip::new("c", 2.0, false);
        clip.insert_morph_keyframe("m", MorphKeyframe::new(1.5, 1.0));
        clip.insert_morph_keyframe("m", MorphKeyframe::new(0.5, 0.0));
        let weight = clip.sample_morph_track("m", 1.0).unwrap();
        assert!((weight - 0.5).abs() < EPS);
    }

    #[test]
    fn test_euler_rotation_lerps_componentwise() {
        let mut clip = AnimationClip::new("c", 1.0, false);
        clip.insert_bone_keyframe(
            "b",
            BoneKeyframe::with_rotation(0.0, Rotation::Euler(Vec3::ZERO)),
        );
        clip.insert_bone_keyframe(
            "b",
            BoneKeyframe::with_rotation(1.0, Rotation::Euler(Vec3::new(1.0, 0.0, 0.0))),
        );
        let (_, rotation, _) = clip.sample_bone_track("b", 0.25).unwrap();
        match rotation {
            Rotation::Euler(e) => assert!((e.x - 0.25).abs() < EPS),
            _ => panic!("expected euler rotation"),
        }
    }
}
