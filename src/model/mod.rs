//! 模型装配：加载边界数据结构与运行时外观

mod descriptor;
mod runtime;
mod snapshot;

pub use descriptor::{BoneDescriptor, ModelDescriptor, MorphDescriptor, MorphElement};
pub use runtime::MmdModel;
pub use snapshot::PoseSnapshot;
