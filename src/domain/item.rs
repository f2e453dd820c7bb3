// ==========================================
// 货物装箱与路径决策引擎 - 货物领域模型
// ==========================================
// 用途: 货物登记、状态推进、装箱快照
// 红线: 状态只能单向推进，不得回退
// ==========================================

use crate::domain::types::ItemStatus;
use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

/// 默认优先级
pub const DEFAULT_PRIORITY: i32 = 1;

// ==========================================
// Item - 货物
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Item {
    // ===== 主键 =====
    pub item_id: String,           // 货物ID
    pub tracking_id: String,       // 追踪号（唯一）

    // ===== 基础属性 =====
    pub description: String,       // 描述
    pub weight: f64,               // 重量
    pub length: f64,               // 长
    pub width: f64,                // 宽
    pub height: f64,               // 高
    pub destination: String,       // 目的地
    pub priority: i32,             // 优先级（默认 1）

    // ===== 状态 =====
    pub status: ItemStatus,
    pub registered_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

impl Item {
    /// 体积 = 长 × 宽 × 高
    pub fn volume(&self) -> f64 {
        self.length * self.width * self.height
    }

    /// 转换为装箱快照
    pub fn snapshot(&self) -> ItemSnapshot {
        ItemSnapshot {
            item_id: self.item_id.clone(),
            tracking_id: self.tracking_id.clone(),
            description: self.description.clone(),
            weight: self.weight,
            length: self.length,
            width: self.width,
            height: self.height,
            destination: self.destination.clone(),
        }
    }
}

// ==========================================
// ItemRegistration - 登记请求
// ==========================================
// 上游登记事件/调用传入的数据；尺寸合法性由上游保证
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ItemRegistration {
    #[serde(default)]
    pub tracking_id: Option<String>,
    #[serde(default)]
    pub description: String,
    pub weight: f64,
    pub length: f64,
    pub width: f64,
    pub height: f64,
    pub destination: String,
    #[serde(default)]
    pub priority: Option<i32>,
}

impl ItemRegistration {
    pub fn volume(&self) -> f64 {
        self.length * self.width * self.height
    }
}

// ==========================================
// ItemSnapshot - 装箱快照
// ==========================================
// 集装箱侧只关心这些字段（对应 container_item 表）
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ItemSnapshot {
    pub item_id: String,
    pub tracking_id: String,
    pub description: String,
    pub weight: f64,
    pub length: f64,
    pub width: f64,
    pub height: f64,
    pub destination: String,
}

impl ItemSnapshot {
    pub fn volume(&self) -> f64 {
        self.length * self.width * self.height
    }
}
