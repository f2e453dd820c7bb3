// ==========================================
// 货物装箱与路径决策引擎 - 集装箱领域模型
// ==========================================
// 红线: current_weight ≤ max_weight 且 current_volume ≤ max_volume
// 红线: DELIVERED 后不可变
// ==========================================

use crate::domain::capacity::CapacityConstraint;
use crate::domain::item::ItemSnapshot;
use crate::domain::types::ContainerStatus;
use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

// ==========================================
// ContainerItem - 箱内货物
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContainerItem {
    pub item_id: String,
    pub tracking_id: String,
    pub description: String,
    pub weight: f64,
    pub length: f64,
    pub width: f64,
    pub height: f64,
}

impl ContainerItem {
    pub fn volume(&self) -> f64 {
        self.length * self.width * self.height
    }
}

impl From<&ItemSnapshot> for ContainerItem {
    fn from(item: &ItemSnapshot) -> Self {
        Self {
            item_id: item.item_id.clone(),
            tracking_id: item.tracking_id.clone(),
            description: item.description.clone(),
            weight: item.weight,
            length: item.length,
            width: item.width,
            height: item.height,
        }
    }
}

// ==========================================
// Container - 集装箱
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Container {
    // ===== 主键 =====
    pub container_id: String,
    pub container_number: String,  // 箱号（唯一）
    pub destination: String,

    // ===== 容量参数 =====
    pub max_weight: f64,
    pub max_volume: f64,

    // ===== 实际使用（缺省视为 0）=====
    #[serde(default)]
    pub current_weight: f64,
    #[serde(default)]
    pub current_volume: f64,
    #[serde(default)]
    pub item_count: i32,

    // ===== 状态 =====
    pub status: ContainerStatus,
    #[serde(default)]
    pub items: Vec<ContainerItem>,   // 有序

    // ===== 时间戳 =====
    pub created_at: NaiveDateTime,
    pub closed_at: Option<NaiveDateTime>,
    pub dispatched_at: Option<NaiveDateTime>,
    pub delivered_at: Option<NaiveDateTime>,
}

impl Container {
    /// 新建集装箱（CREATED，装载量清零）
    pub fn new(
        container_id: String,
        container_number: String,
        destination: String,
        max_weight: f64,
        max_volume: f64,
        created_at: NaiveDateTime,
    ) -> Self {
        Self {
            container_id,
            container_number,
            destination,
            max_weight,
            max_volume,
            current_weight: 0.0,
            current_volume: 0.0,
            item_count: 0,
            status: ContainerStatus::Created,
            items: Vec::new(),
            created_at,
            closed_at: None,
            dispatched_at: None,
            delivered_at: None,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn contains_item(&self, item_id: &str) -> bool {
        self.items.iter().any(|i| i.item_id == item_id)
    }

    pub fn item_ids(&self) -> Vec<String> {
        self.items.iter().map(|i| i.item_id.clone()).collect()
    }

    /// 按箱内货物重算装载合计
    pub fn recompute_totals(&mut self) {
        self.current_weight = self.items.iter().map(|i| i.weight).sum();
        self.current_volume = self.items.iter().map(|i| i.volume()).sum();
        self.item_count = self.items.len() as i32;
    }
}

impl CapacityConstraint for Container {
    fn max_weight(&self) -> f64 {
        self.max_weight
    }

    fn max_volume(&self) -> f64 {
        self.max_volume
    }

    fn current_weight(&self) -> f64 {
        self.current_weight
    }

    fn current_volume(&self) -> f64 {
        self.current_volume
    }
}

// ==========================================
// ContainerSpec - 建箱请求
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContainerSpec {
    #[serde(default)]
    pub container_number: Option<String>,
    pub destination: String,
    pub max_weight: f64,
    pub max_volume: f64,
}
