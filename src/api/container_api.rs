// ==========================================
// 货物装箱与路径决策引擎 - 集装箱 API
// ==========================================
// 职责: 集装箱创建、装箱/取出、状态推进、装箱决策、利用率统计
// 红线: 装箱候选只是建议，提交前在 commit_lock 内重新校验容量
// 红线: 策略每次调用时从配置读取并显式传入选择器
// ==========================================

use std::collections::BTreeMap;
use std::sync::{Arc, Mutex, MutexGuard};

use serde::{Deserialize, Serialize};
use tracing::{debug, info};
use uuid::Uuid;

use crate::api::error::{ApiError, ApiResult};
use crate::api::item_api::StatusCount;
use crate::api::now;
use crate::config::ConfigManager;
use crate::domain::capacity::CapacityConstraint;
use crate::domain::container::{Container, ContainerItem, ContainerSpec};
use crate::domain::error::LogisticsError;
use crate::domain::item::ItemSnapshot;
use crate::domain::types::ContainerStatus;
use crate::engine::container_optimizer::ContainerOptimizer;
use crate::engine::events::{EntityKind, OptionalEventPublisher, StatusEvent};
use crate::engine::lifecycle::LifecycleEngine;
use crate::engine::strategy::PlacementStrategy;
use crate::repository::container_repo::ContainerRepository;

/// 高利用率阈值（百分比）
pub const HIGH_UTILIZATION_PCT: f64 = 90.0;

const OPEN_STATUSES: [ContainerStatus; 2] = [ContainerStatus::Created, ContainerStatus::Loading];

/// 目的地平均利用率
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DestinationUtilization {
    pub destination: String,
    pub avg_weight_pct: f64,
    pub avg_volume_pct: f64,
    pub container_count: usize,
}

// ==========================================
// ContainerApi - 集装箱 API
// ==========================================
pub struct ContainerApi {
    container_repo: Arc<ContainerRepository>,
    config: Arc<ConfigManager>,
    optimizer: ContainerOptimizer,
    lifecycle: LifecycleEngine,
    events: OptionalEventPublisher,
    // 串行化"读-改-写"提交
    commit_lock: Mutex<()>,
}

impl ContainerApi {
    pub fn new(
        container_repo: Arc<ContainerRepository>,
        config: Arc<ConfigManager>,
        optimizer: ContainerOptimizer,
        events: OptionalEventPublisher,
    ) -> Self {
        Self {
            container_repo,
            config,
            optimizer,
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
    // 创建与查询
    // ==========================================

    /// 创建集装箱（未提供箱号时生成 `CNT-XXXXXXXX`）
    pub fn create_container(&self, spec: ContainerSpec) -> ApiResult<Container> {
        if !(spec.max_weight > 0.0) || !(spec.max_volume > 0.0) {
            return Err(ApiError::InvalidInput(format!(
                "容量上限必须为正数: max_weight={}, max_volume={}",
                spec.max_weight, spec.max_volume
            )));
        }
        if spec.destination.trim().is_empty() {
            return Err(ApiError::InvalidInput("目的地不能为空".to_string()));
        }

        let container_number = match spec.container_number.as_deref().map(str::trim) {
            Some(n) if !n.is_empty() => {
                if self.container_repo.exists_by_number(n)? {
                    return Err(
                        LogisticsError::Duplicate(format!("container_number {}", n)).into(),
                    );
                }
                n.to_string()
            }
            _ => generate_container_number(),
        };

        let container = Container::new(
            Uuid::new_v4().to_string(),
            container_number,
            spec.destination.trim().to_string(),
            spec.max_weight,
            spec.max_volume,
            now(),
        );
        self.container_repo.insert(&container)?;
        info!(
            container_id = %container.container_id,
            container_number = %container.container_number,
            destination = %container.destination,
            "集装箱已创建"
        );

        self.events.publish(
            StatusEvent::new(EntityKind::Container, &container.container_id, container.status)
                .with_metric("max_weight", container.max_weight)
                .with_metric("max_volume", container.max_volume)
                .at(container.created_at),
        );
        Ok(container)
    }

    pub fn get_container(&self, container_id: &str) -> ApiResult<Container> {
        self.container_repo
            .find_by_id(container_id)?
            .ok_or_else(|| LogisticsError::not_found("Container", container_id).into())
    }

    pub fn get_container_by_number(&self, container_number: &str) -> ApiResult<Container> {
        self.container_repo
            .find_by_number(container_number)?
            .ok_or_else(|| LogisticsError::not_found("Container", container_number).into())
    }

    pub fn list_containers_by_status(&self, status: ContainerStatus) -> ApiResult<Vec<Container>> {
        Ok(self.container_repo.list_by_statuses(&[status])?)
    }

    /// 指定目的地下仍可装货的集装箱（CREATED/LOADING）
    pub fn available_containers(&self, destination: &str) -> ApiResult<Vec<Container>> {
        Ok(self
            .container_repo
            .list_by_destination_and_statuses(destination.trim(), &OPEN_STATUSES)?)
    }

    // ==========================================
    // 装箱 / 取出
    // ==========================================

    /// 向指定集装箱装入货物
    ///
    /// # 错误
    /// - NotFound: 集装箱不存在
    /// - InvalidTransition: 集装箱不在 CREATED/LOADING
    /// - Duplicate: 货物已在任一集装箱内
    /// - CapacityExceeded: 超出重量或体积上限
    pub fn add_item_to_container(
        &self,
        container_id: &str,
        item: &ItemSnapshot,
    ) -> ApiResult<Container> {
        let _guard = self.lock_commit()?;
        let container = self.get_container(container_id)?;
        self.commit_add(container, item)
    }

    /// 从集装箱取出货物（状态不回退）
    pub fn remove_item_from_container(
        &self,
        container_id: &str,
        item_id: &str,
    ) -> ApiResult<ContainerItem> {
        let _guard = self.lock_commit()?;
        let mut container = self.get_container(container_id)?;
        let removed = self.lifecycle.remove_item(&mut container, item_id)?;

        self.container_repo.save(&container)?;
        info!(
            container_id,
            item_id,
            item_count = container.item_count,
            "货物已取出"
        );
        self.publish_container_event(&container, None);
        Ok(removed)
    }

    // 调用方须持有 commit_lock
    fn commit_add(&self, mut container: Container, item: &ItemSnapshot) -> ApiResult<Container> {
        if let Some(existing) = self.container_repo.find_container_id_of_item(&item.item_id)? {
            if existing != container.container_id {
                return Err(LogisticsError::Duplicate(format!(
                    "item {} already placed in container {}",
                    item.item_id, existing
                ))
                .into());
            }
        }

        let previous = container.status;
        self.lifecycle.add_item(&mut container, item, now())?;
        self.container_repo.save(&container)?;

        info!(
            container_id = %container.container_id,
            item_id = %item.item_id,
            current_weight = container.current_weight,
            current_volume = container.current_volume,
            "货物已装箱"
        );
        let previous = (previous != container.status).then_some(previous);
        self.publish_container_event(&container, previous);
        Ok(container)
    }

    // ==========================================
    // 状态推进
    // ==========================================

    /// 通用状态推进（守卫与时间戳同 close/dispatch/deliver）
    pub fn update_container_status(
        &self,
        container_id: &str,
        target: ContainerStatus,
    ) -> ApiResult<Container> {
        let _guard = self.lock_commit()?;
        let mut container = self.get_container(container_id)?;
        let previous = self
            .lifecycle
            .transition_container(&mut container, target, now())?;

        self.container_repo.save(&container)?;
        info!(container_id, from = %previous, to = %target, "集装箱状态已更新");
        self.publish_container_event(&container, Some(previous));
        Ok(container)
    }

    pub fn close_container(&self, container_id: &str) -> ApiResult<Container> {
        self.update_container_status(container_id, ContainerStatus::Closed)
    }

    pub fn dispatch_container(&self, container_id: &str) -> ApiResult<Container> {
        self.update_container_status(container_id, ContainerStatus::Dispatched)
    }

    pub fn mark_container_delivered(&self, container_id: &str) -> ApiResult<Container> {
        self.update_container_status(container_id, ContainerStatus::Delivered)
    }

    /// 删除集装箱（仅允许空箱）
    pub fn delete_container(&self, container_id: &str) -> ApiResult<()> {
        let _guard = self.lock_commit()?;
        let container = self.get_container(container_id)?;
        if !container.is_empty() {
            return Err(
                LogisticsError::invalid_transition("Container", container.status, "DELETED").into(),
            );
        }

        self.container_repo.delete(container_id)?;
        info!(container_id, "集装箱已删除");
        Ok(())
    }

    // ==========================================
    // 装箱决策
    // ==========================================

    /// 为货物挑选集装箱（只读建议）
    pub fn find_optimal_container_for_item(
        &self,
        item: &ItemSnapshot,
    ) -> ApiResult<Option<Container>> {
        let candidates = self.available_containers(&item.destination)?;
        let strategy = self.config.get_placement_strategy()?;
        Ok(self
            .optimizer
            .find_optimal_container(
                Some(candidates.as_slice()),
                item.weight,
                item.volume(),
                strategy,
            )
            .cloned())
    }

    /// 挑选并装入
    ///
    /// # 返回
    /// - `Some(container)`: 装入后的集装箱
    /// - `None`: 没有可装的集装箱（不视为错误）
    pub fn place_item(&self, item: &ItemSnapshot) -> ApiResult<Option<Container>> {
        let _guard = self.lock_commit()?;
        let Some(chosen) = self.find_optimal_container_for_item(item)? else {
            debug!(item_id = %item.item_id, destination = %item.destination, "无可用集装箱");
            return Ok(None);
        };

        // 提交时以最新状态重新校验
        let fresh = self.get_container(&chosen.container_id)?;
        if !fresh.admits(item.weight, item.volume()) {
            debug!(container_id = %fresh.container_id, "候选集装箱容量已变化，放弃装箱");
            return Ok(None);
        }
        self.commit_add(fresh, item).map(Some)
    }

    // ==========================================
    // 策略管理
    // ==========================================

    pub fn placement_strategy(&self) -> ApiResult<PlacementStrategy> {
        Ok(self.config.get_placement_strategy()?)
    }

    pub fn set_placement_strategy(&self, strategy: PlacementStrategy) -> ApiResult<()> {
        self.config.set_placement_strategy(strategy)?;
        info!(strategy = %strategy, "装箱策略已切换");
        Ok(())
    }

    // ==========================================
    // 统计
    // ==========================================

    pub fn container_counts_by_status(&self) -> ApiResult<Vec<StatusCount>> {
        Ok(self
            .container_repo
            .count_by_status()?
            .into_iter()
            .map(|(status, count)| StatusCount {
                status: status.to_string(),
                count,
            })
            .collect())
    }

    /// 重量或体积利用率超过 90% 的 LOADING/CLOSED 集装箱
    pub fn containers_with_high_utilization(&self) -> ApiResult<Vec<Container>> {
        Ok(self
            .container_repo
            .list_by_statuses(&[ContainerStatus::Loading, ContainerStatus::Closed])?
            .into_iter()
            .filter(|c| c.utilization().exceeds(HIGH_UTILIZATION_PCT))
            .collect())
    }

    /// 已封箱及之后状态的集装箱按目的地汇总平均利用率
    pub fn average_utilization_by_destination(&self) -> ApiResult<Vec<DestinationUtilization>> {
        let containers = self.container_repo.list_by_statuses(&[
            ContainerStatus::Closed,
            ContainerStatus::Dispatched,
            ContainerStatus::Delivered,
        ])?;

        let mut grouped: BTreeMap<String, (f64, f64, usize)> = BTreeMap::new();
        for container in &containers {
            let utilization = container.utilization();
            let entry = grouped
                .entry(container.destination.clone())
                .or_insert((0.0, 0.0, 0));
            entry.0 += utilization.weight_pct;
            entry.1 += utilization.volume_pct;
            entry.2 += 1;
        }

        Ok(grouped
            .into_iter()
            .map(|(destination, (weight_sum, volume_sum, count))| DestinationUtilization {
                destination,
                avg_weight_pct: weight_sum / count as f64,
                avg_volume_pct: volume_sum / count as f64,
                container_count: count,
            })
            .collect())
    }

    fn publish_container_event(&self, container: &Container, previous: Option<ContainerStatus>) {
        let mut event =
            StatusEvent::new(EntityKind::Container, &container.container_id, container.status)
                .with_metric("current_weight", container.current_weight)
                .with_metric("current_volume", container.current_volume)
                .with_metric("item_count", container.item_count as f64)
                .at(now());
        if let Some(previous) = previous {
            event = event.with_previous(previous);
        }
        self.events.publish(event);
    }
}

fn generate_container_number() -> String {
    let raw = Uuid::new_v4().simple().to_string();
    format!("CNT-{}", raw[..8].to_uppercase())
}
