//! Morph 目录：分类与坐标转换
//!
//! 按声明类型把源数据分为顶点 Morph 与骨骼 Morph，其余类型静默忽略
//! （向前兼容策略，不视为错误）。所有坐标转换只在这里发生一次：
//! - 位置偏移翻转 Z；
//! - 欧拉旋转偏移翻转 X、Y，保留 Z；
//! - 四元数旋转偏移翻转 Z、W，再按固定 ZXY 分解转为欧拉角。

use std::collections::HashMap;

use glam::Vec3;

use crate::math::{quat_to_euler_zxy, Rotation};
use crate::model::MorphDescriptor;
use crate::{EngineError, Result};

use super::{BoneMorphOffset, Morph, MorphKind};

/// 稠密缓冲区槽位数的默认值
pub const DEFAULT_MAX_MORPH_SLOTS: usize = 16;

const MORPH_TYPE_VERTEX: u8 = 1;
const MORPH_TYPE_BONE: u8 = 2;

/// 不可变 Morph 目录
pub struct MorphCatalog {
    morphs: Vec<Morph>,
    name_to_index: HashMap<String, usize>,
    max_morph_slots: usize,
    vertex_slot_count: usize,
}

impl MorphCatalog {
    /// 从加载数据构建目录
    ///
    /// 顶点/骨骼索引越界是致命配置错误。槽位按顶点 Morph 的目录顺序
    /// 依次分配；超过 `max_morph_slots` 的顶点 Morph 没有槽位。
    pub fn build(
        descriptors: &[MorphDescriptor],
        vertex_count: usize,
        bone_count: usize,
        max_morph_slots: usize,
    ) -> Result<Self> {
        let mut morphs = Vec::new();
        let mut name_to_index = HashMap::new();
        let mut next_slot = 0usize;

        for desc in descriptors {
            let kind = match desc.morph_type {
                MORPH_TYPE_VERTEX => {
                    let offsets = convert_vertex_offsets(desc, vertex_count)?;
                    let slot = if next_slot < max_morph_slots {
                        let s = next_slot;
                        next_slot += 1;
                        Some(s)
                    } else {
                        log::warn!(
                            "顶点 Morph '{}' 超出槽位容量 {}，不参与稠密打包",
                            desc.name,
                            max_morph_slots
                        );
                        None
                    };
                    MorphKind::Vertex { slot, offsets }
                }
                MORPH_TYPE_BONE => MorphKind::Bone {
                    offsets: convert_bone_offsets(desc, bone_count)?,
                },
                // 未识别类型静默忽略，不占 Morph 索引
                _ => continue,
            };

            let index = morphs.len();
            name_to_index.insert(desc.name.clone(), index);
            morphs.push(Morph {
                name: desc.name.clone(),
                kind,
            });
        }

        log::debug!(
            "Morph 目录构建完成: {} 个（{} 个顶点槽位 / 容量 {}）",
            morphs.len(),
            next_slot,
            max_morph_slots
        );

        Ok(Self {
            morphs,
            name_to_index,
            max_morph_slots,
            vertex_slot_count: next_slot,
        })
    }

    pub fn morph_count(&self) -> usize {
        self.morphs.len()
    }

    pub fn get(&self, index: usize) -> Option<&Morph> {
        self.morphs.get(index)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Morph> {
        self.morphs.iter()
    }

    pub fn find_by_name(&self, name: &str) -> Option<usize> {
        self.name_to_index.get(name).copied()
    }

    pub fn max_morph_slots(&self) -> usize {
        self.max_morph_slots
    }

    pub fn vertex_slot_count(&self) -> usize {
        self.vertex_slot_count
    }
}

fn convert_vertex_offsets(
    desc: &MorphDescriptor,
    vertex_count: usize,
) -> Result<HashMap<u32, Vec3>> {
    desc.elements
        .iter()
        .map(|element| {
            let vertex = element.target_index as usize;
            if vertex >= vertex_count {
                return Err(EngineError::MorphVertexOutOfRange {
                    morph: desc.name.clone(),
                    vertex,
                    vertex_count,
                });
            }
            let p = element.position;
            Ok((element.target_index, Vec3::new(p.x, p.y, -p.z)))
        })
        .collect()
}

fn convert_bone_offsets(desc: &MorphDescriptor, bone_count: usize) -> Result<Vec<BoneMorphOffset>> {
    desc.elements
        .iter()
        .map(|element| {
            let bone = element.target_index as usize;
            if bone >= bone_count {
                return Err(EngineError::MorphBoneOutOfRange {
                    morph: desc.name.clone(),
                    bone,
                    bone_count,
                });
            }
            let p = element.position;
            let rotation = match element.rotation {
                Some(Rotation::Euler(e)) => Vec3::new(-e.x, -e.y, e.z),
                Some(Rotation::Quaternion(q)) => {
                    let flipped = glam::Quat::from_xyzw(q.x, q.y, -q.z, -q.w);
                    quat_to_euler_zxy(flipped)
                }
                None => Vec3::ZERO,
            };
            Ok(BoneMorphOffset {
                bone_index: element.target_index,
                translation: Vec3::new(p.x, p.y, -p.z),
                rotation,
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::MorphElement;
    use glam::Quat;

    const EPS: f32 = 1e-5;

    fn vertex_morph(name: &str, elements: Vec<MorphElement>) -> MorphDescriptor {
        MorphDescriptor {
            name: name.to_string(),
            morph_type: MORPH_TYPE_VERTEX,
            elements,
        }
    }

    #[test]
    fn test_categorize_partitions_and_ignores_unknown() {
        let descs = vec![
            vertex_morph("smile", vec![MorphElement::vertex(0, Vec3::X)]),
            MorphDescriptor {
                name: "uv_morph".to_string(),
                morph_type: 3,
                elements: vec![],
            },
            MorphDescriptor {
                name: "lean".to_string(),
                morph_type: MORPH_TYPE_BONE,
                elements: vec![MorphElement::bone(0, Vec3::ZERO, Rotation::IDENTITY)],
            },
        ];
        let catalog = MorphCatalog::build(&descs, 4, 1, 8).unwrap();
        // 类型 3 被静默跳过，不占索引
        assert_eq!(catalog.morph_count(), 2);
        assert_eq!(catalog.find_by_name("smile"), Some(0));
        assert_eq!(catalog.find_by_name("lean"), Some(1));
        assert_eq!(catalog.find_by_name("uv_morph"), None);
    }

    #[test]
    fn test_vertex_offset_z_flipped() {
        let descs = vec![vertex_morph(
            "m",
            vec![MorphElement::vertex(1, Vec3::new(1.0, 2.0, 3.0))],
        )];
        let catalog = MorphCatalog::build(&descs, 4, 0, 8).unwrap();
        match &catalog.get(0).unwrap().kind {
            MorphKind::Vertex { offsets, .. } => {
                let delta = offsets.get(&1).unwrap();
                assert!((delta.z + 3.0).abs() < EPS);
                assert!((delta.x - 1.0).abs() < EPS);
            }
            _ => panic!("expected vertex morph"),
        }
    }

    #[test]
    fn test_euler_rotation_xy_flipped() {
        let descs = vec![MorphDescriptor {
            name: "m".to_string(),
            morph_type: MORPH_TYPE_BONE,
            elements: vec![MorphElement::bone(
                0,
                Vec3::ZERO,
                Rotation::Euler(Vec3::new(0.1, 0.2, 0.3)),
            )],
        }];
        let catalog = MorphCatalog::build(&descs, 0, 1, 8).unwrap();
        match &catalog.get(0).unwrap().kind {
            MorphKind::Bone { offsets } => {
                let r = offsets[0].rotation;
                assert!((r.x + 0.1).abs() < EPS);
                assert!((r.y + 0.2).abs() < EPS);
                assert!((r.z - 0.3).abs() < EPS);
            }
            _ => panic!("expected bone morph"),
        }
    }

    #[test]
    fn test_quaternion_rotation_zw_flipped_then_decomposed() {
        // 绕 Z 的四元数：翻转 z、w 后角度不变（同一旋转的另一表示）
        let q = Quat::from_rotation_z(0.4);
        let descs = vec![MorphDescriptor {
            name: "m".to_string(),
            morph_type: MORPH_TYPE_BONE,
            elements: vec![MorphElement::bone(0, Vec3::ZERO, Rotation::Quaternion(q))],
        }];
        let catalog = MorphCatalog::build(&descs, 0, 1, 8).unwrap();
        match &catalog.get(0).unwrap().kind {
            MorphKind::Bone { offsets } => {
                let r = offsets[0].rotation;
                assert!((r.z - 0.4).abs() < EPS);
                assert!(r.x.abs() < EPS);
            }
            _ => panic!("expected bone morph"),
        }
    }

    #[test]
    fn test_vertex_index_out_of_range_is_fatal() {
        let descs = vec![vertex_morph("m", vec![MorphElement::vertex(9, Vec3::X)])];
        assert!(matches!(
            MorphCatalog::build(&descs, 4, 0, 8),
            Err(EngineError::MorphVertexOutOfRange { vertex: 9, .. })
        ));
    }

    #[test]
    fn test_slot_overflow_gets_no_slot() {
        let descs = vec![
            vertex_morph("a", vec![]),
            vertex_morph("b", vec![]),
            vertex_morph("c", vec![]),
        ];
        let catalog = MorphCatalog::build(&descs, 4, 0, 2).unwrap();
        assert_eq!(catalog.vertex_slot_count(), 2);
        match &catalog.get(2).unwrap().kind {
            MorphKind::Vertex { slot, .. } => assert!(slot.is_none()),
            _ => panic!("expected vertex morph"),
        }
    }
}
