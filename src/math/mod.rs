//! 旋转表示与 ZXY 欧拉角互转
//!
//! MMD 管线中骨骼旋转可能以三分量欧拉角或四分量四元数出现。
//! 这里用带标签的枚举一次性固定表示方式，避免每次访问按长度猜测。

use glam::{Mat4, Quat, Vec3};

/// 骨骼旋转：欧拉角（弧度）或四元数，构建时确定，不再改变
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Rotation {
    /// ZXY 约定的欧拉角：先绕 Y，再绕 X，最后绕 Z
    Euler(Vec3),
    Quaternion(Quat),
}

impl Rotation {
    pub const IDENTITY: Rotation = Rotation::Euler(Vec3::ZERO);

    /// 转为旋转矩阵
    ///
    /// 欧拉分支的合成顺序固定为 Rz * Rx * Ry（先应用 Y，再 X，最后 Z）。
    pub fn to_matrix(&self) -> Mat4 {
        match *self {
            Rotation::Euler(e) => {
                Mat4::from_rotation_z(e.z) * Mat4::from_rotation_x(e.x) * Mat4::from_rotation_y(e.y)
            }
            Rotation::Quaternion(q) => Mat4::from_quat(q),
        }
    }

    /// 转为 ZXY 欧拉角（四元数分支走固定分解公式）
    pub fn to_euler_zxy(&self) -> Vec3 {
        match *self {
            Rotation::Euler(e) => e,
            Rotation::Quaternion(q) => quat_to_euler_zxy(q),
        }
    }

    /// 转为四元数
    pub fn to_quat(&self) -> Quat {
        match *self {
            Rotation::Euler(e) => euler_zxy_to_quat(e),
            Rotation::Quaternion(q) => q,
        }
    }
}

impl Default for Rotation {
    fn default() -> Self {
        Rotation::IDENTITY
    }
}

/// 四元数转 ZXY 欧拉角
///
/// 固定分解：sin_pitch = -r23；|sin_pitch| >= 1 时进入万向锁分支
/// （pitch = ±π/2, yaw = 0, roll = atan2(-r12, r11)），
/// 否则 pitch = asin(sin_pitch), yaw = atan2(r13, r33), roll = atan2(r21, r22)。
/// 后续 Morph 混合依赖这一角度约定，不可替换为其他分解。
pub fn quat_to_euler_zxy(q: Quat) -> Vec3 {
    let (x, y, z, w) = (q.x, q.y, q.z, q.w);

    let r11 = 1.0 - 2.0 * (y * y + z * z);
    let r12 = 2.0 * (x * y - w * z);
    let r13 = 2.0 * (x * z + w * y);
    let r21 = 2.0 * (x * y + w * z);
    let r22 = 1.0 - 2.0 * (x * x + z * z);
    let r23 = 2.0 * (y * z - w * x);
    let r33 = 1.0 - 2.0 * (x * x + y * y);

    let sin_pitch = -r23;
    if sin_pitch.abs() >= 1.0 {
        // 万向锁：俯仰 ±90°，偏航固定为 0
        Vec3::new(
            (std::f32::consts::FRAC_PI_2).copysign(sin_pitch),
            0.0,
            (-r12).atan2(r11),
        )
    } else {
        Vec3::new(sin_pitch.asin(), r13.atan2(r33), r21.atan2(r22))
    }
}

/// ZXY 欧拉角转四元数（与 `quat_to_euler_zxy` 互逆，万向锁除外）
pub fn euler_zxy_to_quat(e: Vec3) -> Quat {
    Quat::from_rotation_z(e.z) * Quat::from_rotation_x(e.x) * Quat::from_rotation_y(e.y)
}

/// 本地变换合成：T * R * S
pub fn compose_trs(translation: Vec3, rotation: &Rotation, scale: Vec3) -> Mat4 {
    Mat4::from_translation(translation) * rotation.to_matrix() * Mat4::from_scale(scale)
}
