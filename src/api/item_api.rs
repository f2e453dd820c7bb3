// ==========================================
// 货物装箱与路径决策引擎 - 货物 API
// ==========================================
// 职责: 货物登记、查询、状态推进、统计
// 红线: 状态推进只经由生命周期状态机；"读-改-写"在 commit_lock 内完成；
//       提交成功后才发布事件
// ==========================================

use std::sync::{Arc, Mutex, MutexGuard};

use serde::{Deserialize, Serialize};
use tracing::{info, warn};
use uuid::Uuid;

use crate::api::error::{ApiError, ApiResult};
use crate::api::now;
use crate::domain::error::LogisticsError;
use crate::domain::item::{Item, ItemRegistration, DEFAULT_PRIORITY};
use crate::domain::types::ItemStatus;
use crate::engine::events::{EntityKind, OptionalEventPublisher, StatusEvent};
use crate::engine::lifecycle::LifecycleEngine;
use crate::repository::item_repo::ItemRepository;

/// 各状态货物数量
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StatusCount {
    pub status: String,
    pub count: i64,
}

// ==========================================
// ItemApi - 货物 API
// ==========================================
pub struct ItemApi {
    item_repo: Arc<ItemRepository>,
    lifecycle: LifecycleEngine,
    events: OptionalEventPublisher,
    // 串行化"读-改-写"提交
    commit_lock: Mutex<()>,
}

impl ItemApi {
    pub fn new(item_repo: Arc<ItemRepository>, events: OptionalEventPublisher) -> Self {
        Self {
            item_repo,
            lifecycle: LifecycleEngine::new(),
            events,
            commit_lock: Mutex::new(()),
        }
    }

    fn lock_commit(&self) -> ApiResult<MutexGuard<'_, ()>> {
        self.commit_lock
            .lock()
            .map_err(|e| ApiError::InternalError(format!("提交锁获取失败: {}", e)))
    }

    // ==========================================
    // 登记
    // ==========================================

    /// 登记货物
    ///
    /// # 规则
    /// - 重量与三维尺寸必须为正数，目的地不可为空
    /// - 未提供追踪号时生成 `TRK-XXXXXXXX`
    /// - 提供的追踪号已存在 → Duplicate
    /// - 初始状态 REGISTERED，优先级默认 1
    pub fn register_item(&self, registration: ItemRegistration) -> ApiResult<Item> {
        validate_registration(&registration)?;

        let tracking_id = match registration.tracking_id.as_deref().map(str::trim) {
            Some(t) if !t.is_empty() => {
                if self.item_repo.exists_by_tracking_id(t)? {
                    return Err(LogisticsError::Duplicate(format!("tracking_id {}", t)).into());
                }
                t.to_string()
            }
            _ => generate_tracking_id(),
        };

        let ts = now();
        let item = Item {
            item_id: Uuid::new_v4().to_string(),
            tracking_id,
            description: registration.description,
            weight: registration.weight,
            length: registration.length,
            width: registration.width,
            height: registration.height,
            destination: registration.destination.trim().to_string(),
            priority: registration.priority.unwrap_or(DEFAULT_PRIORITY),
            status: ItemStatus::Registered,
            registered_at: ts,
            updated_at: ts,
        };

        self.item_repo.insert(&item)?;
        info!(
            item_id = %item.item_id,
            tracking_id = %item.tracking_id,
            destination = %item.destination,
            "货物已登记"
        );

        self.events.publish(
            StatusEvent::new(EntityKind::Item, &item.item_id, item.status)
                .with_tracking_id(&item.tracking_id)
                .with_metric("weight", item.weight)
                .with_metric("volume", item.volume())
                .at(ts),
        );
        Ok(item)
    }

    // ==========================================
    // 查询
    // ==========================================

    pub fn get_item(&self, item_id: &str) -> ApiResult<Item> {
        self.item_repo
            .find_by_id(item_id)?
            .ok_or_else(|| LogisticsError::not_found("Item", item_id).into())
    }

    pub fn get_item_by_tracking_id(&self, tracking_id: &str) -> ApiResult<Item> {
        self.item_repo
            .find_by_tracking_id(tracking_id)?
            .ok_or_else(|| LogisticsError::not_found("Item", tracking_id).into())
    }

    pub fn list_items_by_status(&self, status: ItemStatus) -> ApiResult<Vec<Item>> {
        Ok(self.item_repo.list_by_status(status)?)
    }

    pub fn list_items_by_destination(&self, destination: &str) -> ApiResult<Vec<Item>> {
        if destination.trim().is_empty() {
            return Err(ApiError::InvalidInput("目的地不能为空".to_string()));
        }
        Ok(self.item_repo.list_by_destination(destination.trim())?)
    }

    // ==========================================
    // 状态与明细更新
    // ==========================================

    /// 推进货物状态（只允许唯一合法后继）
    pub fn update_item_status(&self, item_id: &str, target: ItemStatus) -> ApiResult<Item> {
        let _guard = self.lock_commit()?;
        let mut item = self.get_item(item_id)?;
        let ts = now();
        let previous = self.lifecycle.transition_item(&mut item, target, ts)?;

        self.item_repo.update(&item)?;
        info!(item_id, from = %previous, to = %target, "货物状态已更新");

        self.events.publish(
            StatusEvent::new(EntityKind::Item, &item.item_id, item.status)
                .with_previous(previous)
                .with_tracking_id(&item.tracking_id)
                .at(ts),
        );
        Ok(item)
    }

    /// 修改描述性字段（状态、ID、追踪号不变）
    pub fn update_item_details(
        &self,
        item_id: &str,
        details: ItemRegistration,
    ) -> ApiResult<Item> {
        validate_registration(&details)?;
        let _guard = self.lock_commit()?;
        let mut item = self.get_item(item_id)?;

        item.description = details.description;
        item.weight = details.weight;
        item.length = details.length;
        item.width = details.width;
        item.height = details.height;
        item.destination = details.destination.trim().to_string();
        if let Some(priority) = details.priority {
            item.priority = priority;
        }
        item.updated_at = now();

        self.item_repo.update(&item)?;
        info!(item_id, "货物明细已更新");
        Ok(item)
    }

    /// 删除货物（连同其路径）
    ///
    /// # 错误
    /// - NotFound: 货物不存在
    /// - InvalidTransition(to=DELETED): 货物仍在集装箱中，需先移出
    pub fn delete_item(&self, item_id: &str) -> ApiResult<()> {
        let _guard = self.lock_commit()?;
        let item = self.get_item(item_id)?;

        if self.item_repo.delete_unplaced(item_id)? {
            info!(item_id, "货物已删除");
            return Ok(());
        }

        let container_id = self.item_repo.placed_container_id(item_id)?;
        warn!(item_id, container_id = ?container_id, "货物已装箱，拒绝删除");
        Err(LogisticsError::invalid_transition("Item", item.status, "DELETED").into())
    }

    // ==========================================
    // 统计
    // ==========================================

    pub fn item_counts_by_status(&self) -> ApiResult<Vec<StatusCount>> {
        Ok(self
            .item_repo
            .count_by_status()?
            .into_iter()
            .map(|(status, count)| StatusCount {
                status: status.to_string(),
                count,
            })
            .collect())
    }

    pub fn average_weight_by_destination(&self) -> ApiResult<Vec<(String, f64)>> {
        Ok(self.item_repo.average_weight_by_destination()?)
    }
}

fn validate_registration(registration: &ItemRegistration) -> ApiResult<()> {
    for (field, value) in [
        ("weight", registration.weight),
        ("length", registration.length),
        ("width", registration.width),
        ("height", registration.height),
    ] {
        if !value.is_finite() || value <= 0.0 {
            return Err(ApiError::InvalidInput(format!("{} 必须为正数: {}", field, value)));
        }
    }

    if registration.destination.trim().is_empty() {
        return Err(ApiError::InvalidInput("目的地不能为空".to_string()));
    }
    Ok(())
}

fn generate_tracking_id() -> String {
    let raw = Uuid::new_v4().simple().to_string();
    format!("TRK-{}", raw[..8].to_uppercase())
}

#[cfg(test)]
mod tests {
    use super::*;
    use rusqlite::Connection;
    use std::sync::Mutex;

    fn api() -> ItemApi {
        let conn = Arc::new(Mutex::new(Connection::open_in_memory().unwrap()));
        let repo = Arc::new(ItemRepository::from_connection(conn).unwrap());
        ItemApi::new(repo, OptionalEventPublisher::none())
    }

    fn registration(tracking_id: Option<&str>) -> ItemRegistration {
        ItemRegistration {
            tracking_id: tracking_id.map(str::to_string),
            description: "Books".to_string(),
            weight: 12.0,
            length: 1.0,
            width: 0.5,
            height: 0.5,
            destination: "Chicago".to_string(),
            priority: None,
        }
    }

    #[test]
    fn test_generated_tracking_id_format() {
        let id = generate_tracking_id();
        assert!(id.starts_with("TRK-"));
        assert_eq!(id.len(), 12);
        assert_eq!(id, id.to_uppercase());
    }

    #[test]
    fn test_register_defaults_and_duplicate_tracking_id() {
        let api = api();
        let item = api.register_item(registration(Some("TRK-FIXED"))).unwrap();
        assert_eq!(item.status, ItemStatus::Registered);
        assert_eq!(item.priority, DEFAULT_PRIORITY);

        let err = api.register_item(registration(Some("TRK-FIXED"))).unwrap_err();
        assert_eq!(err.error_code(), "ITEM_ALREADY_EXISTS");
    }

    #[test]
    fn test_register_rejects_non_positive_dimensions() {
        let api = api();
        let mut bad = registration(None);
        bad.height = 0.0;
        assert!(matches!(api.register_item(bad), Err(ApiError::InvalidInput(_))));
    }
}
