//! 片段库
//!
//! 调用方持有的显式片段注册表（不是进程级单例），按名称共享
//! `Arc<AnimationClip>` 给各模型的播放器。

use std::collections::HashMap;
use std::sync::Arc;

use super::AnimationClip;

/// 动画片段注册表
#[derive(Default)]
pub struct ClipLibrary {
    clips: HashMap<String, Arc<AnimationClip>>,
}

impl ClipLibrary {
    pub fn new() -> Self {
        Self::default()
    }

    /// 注册片段，按片段名索引；同名覆盖并返回旧片段
    pub fn insert(&mut self, clip: AnimationClip) -> Option<Arc<AnimationClip>> {
        self.clips.insert(clip.name.clone(), Arc::new(clip))
    }

    pub fn get(&self, name: &str) -> Option<Arc<AnimationClip>> {
        self.clips.get(name).cloned()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.clips.contains_key(name)
    }

    pub fn remove(&mut self, name: &str) -> Option<Arc<AnimationClip>> {
        self.clips.remove(name)
    }

    pub fn len(&self) -> usize {
        self.clips.len()
    }

    pub fn is_empty(&self) -> bool {
        self.clips.is_empty()
    }

    pub fn clip_names(&self) -> impl Iterator<Item = &String> {
        self.clips.keys()
    }
}
