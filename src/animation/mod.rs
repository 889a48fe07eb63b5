//! 关键帧动画系统
//!
//! 片段（clip）持有按名称索引的骨骼/Morph 轨道，播放器负责
//! 时间推进与采样写入。插值统一为线性，无样条平滑。

mod clip;
mod keyframe;
mod library;
mod player;

pub use clip::AnimationClip;
pub use keyframe::{BoneKeyframe, MorphKeyframe};
pub use library::ClipLibrary;
pub use player::{ClipPlayer, PlayerState};
