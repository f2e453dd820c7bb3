// ==========================================
// 货物装箱与路径决策引擎 - 生命周期状态机
// ==========================================
// 货物:   REGISTERED → ROUTING → PROCESSING → CONTAINERIZED → SHIPPED
// 集装箱: CREATED → LOADING → CLOSED → DISPATCHED → DELIVERED
// 路径:   CREATED → IN_PROGRESS → COMPLETED（FAILED 仅外部干预）
// ==========================================
// 红线: 只允许唯一合法后继，自转换与回退均非法
// 红线: 只修改传入的实体，不写库、不发事件（由 API 层提交后发布）
// ==========================================

use crate::domain::capacity::CapacityConstraint;
use crate::domain::container::{Container, ContainerItem};
use crate::domain::error::{LogisticsError, LogisticsResult};
use crate::domain::item::{Item, ItemSnapshot};
use crate::domain::route::Route;
use crate::domain::types::{ContainerStatus, ItemStatus, RouteStatus, Station};
use chrono::NaiveDateTime;
use tracing::debug;

#[derive(Debug, Clone, Copy, Default)]
pub struct LifecycleEngine;

impl LifecycleEngine {
    pub fn new() -> Self {
        Self
    }

    // ==========================================
    // 货物
    // ==========================================

    /// 货物状态的唯一合法后继（终态返回 None）
    pub fn item_successor(status: ItemStatus) -> Option<ItemStatus> {
        match status {
            ItemStatus::Registered => Some(ItemStatus::Routing),
            ItemStatus::Routing => Some(ItemStatus::Processing),
            ItemStatus::Processing => Some(ItemStatus::Containerized),
            ItemStatus::Containerized => Some(ItemStatus::Shipped),
            ItemStatus::Shipped => None,
        }
    }

    /// 推进货物状态
    ///
    /// # 返回
    /// - `Ok(previous)`: 转换前的状态
    /// - `Err(InvalidTransition)`: target 不是唯一合法后继
    pub fn transition_item(
        &self,
        item: &mut Item,
        target: ItemStatus,
        now: NaiveDateTime,
    ) -> LogisticsResult<ItemStatus> {
        let previous = item.status;
        if Self::item_successor(previous) != Some(target) {
            return Err(LogisticsError::invalid_transition("Item", previous, target));
        }

        item.status = target;
        item.updated_at = now;
        debug!(item_id = %item.item_id, from = %previous, to = %target, "货物状态推进");
        Ok(previous)
    }

    // ==========================================
    // 集装箱
    // ==========================================

    pub fn container_successor(status: ContainerStatus) -> Option<ContainerStatus> {
        match status {
            ContainerStatus::Created => Some(ContainerStatus::Loading),
            ContainerStatus::Loading => Some(ContainerStatus::Closed),
            ContainerStatus::Closed => Some(ContainerStatus::Dispatched),
            ContainerStatus::Dispatched => Some(ContainerStatus::Delivered),
            ContainerStatus::Delivered => None,
        }
    }

    /// 推进集装箱状态（含守卫与时间戳）
    ///
    /// - CLOSED: 需要 LOADING 且箱内非空，记录 closed_at
    /// - DISPATCHED: 需要 CLOSED，记录 dispatched_at
    /// - DELIVERED: 需要 DISPATCHED，记录 delivered_at
    pub fn transition_container(
        &self,
        container: &mut Container,
        target: ContainerStatus,
        now: NaiveDateTime,
    ) -> LogisticsResult<ContainerStatus> {
        let previous = container.status;
        if Self::container_successor(previous) != Some(target) {
            return Err(LogisticsError::invalid_transition("Container", previous, target));
        }

        match target {
            ContainerStatus::Closed => {
                if container.is_empty() {
                    return Err(LogisticsError::invalid_transition("Container", previous, target));
                }
                container.closed_at = Some(now);
            }
            ContainerStatus::Dispatched => container.dispatched_at = Some(now),
            ContainerStatus::Delivered => container.delivered_at = Some(now),
            ContainerStatus::Created | ContainerStatus::Loading => {}
        }

        container.status = target;
        debug!(
            container_id = %container.container_id,
            from = %previous,
            to = %target,
            "集装箱状态推进"
        );
        Ok(previous)
    }

    pub fn close_container(
        &self,
        container: &mut Container,
        now: NaiveDateTime,
    ) -> LogisticsResult<ContainerStatus> {
        self.transition_container(container, ContainerStatus::Closed, now)
    }

    pub fn dispatch_container(
        &self,
        container: &mut Container,
        now: NaiveDateTime,
    ) -> LogisticsResult<ContainerStatus> {
        self.transition_container(container, ContainerStatus::Dispatched, now)
    }

    pub fn deliver_container(
        &self,
        container: &mut Container,
        now: NaiveDateTime,
    ) -> LogisticsResult<ContainerStatus> {
        self.transition_container(container, ContainerStatus::Delivered, now)
    }

    /// 装入货物
    ///
    /// # 错误
    /// - InvalidTransition: 集装箱不在 CREATED/LOADING
    /// - Duplicate: 货物已在箱内
    /// - CapacityExceeded: 装入后超重或超体积
    ///
    /// 首件货物装入时 CREATED → LOADING
    pub fn add_item(
        &self,
        container: &mut Container,
        item: &ItemSnapshot,
        now: NaiveDateTime,
    ) -> LogisticsResult<()> {
        if !container.status.accepts_items() {
            return Err(LogisticsError::invalid_transition(
                "Container",
                container.status,
                ContainerStatus::Loading,
            ));
        }

        if container.contains_item(&item.item_id) {
            return Err(LogisticsError::Duplicate(format!(
                "item {} already in container {}",
                item.item_id, container.container_id
            )));
        }

        let item_volume = item.volume();
        if !container.admits(item.weight, item_volume) {
            return Err(LogisticsError::CapacityExceeded {
                container_id: container.container_id.clone(),
                current_weight: container.current_weight,
                item_weight: item.weight,
                max_weight: container.max_weight,
                current_volume: container.current_volume,
                item_volume,
                max_volume: container.max_volume,
            });
        }

        container.items.push(ContainerItem::from(item));
        container.recompute_totals();

        if container.status == ContainerStatus::Created {
            self.transition_container(container, ContainerStatus::Loading, now)?;
        }
        Ok(())
    }

    /// 取出货物（状态保持不变，不回退到 CREATED）
    pub fn remove_item(
        &self,
        container: &mut Container,
        item_id: &str,
    ) -> LogisticsResult<ContainerItem> {
        if !container.status.accepts_items() {
            return Err(LogisticsError::invalid_transition(
                "Container",
                container.status,
                ContainerStatus::Loading,
            ));
        }

        let position = container
            .items
            .iter()
            .position(|i| i.item_id == item_id)
            .ok_or_else(|| LogisticsError::not_found("ContainerItem", item_id))?;

        let removed = container.items.remove(position);
        container.recompute_totals();
        Ok(removed)
    }

    // ==========================================
    // 路径
    // ==========================================

    /// 推进路径步骤
    ///
    /// # 错误
    /// - InvalidTransition: 路径已处于 COMPLETED/FAILED
    /// - InvalidRouteStep: 步骤不在序列中，或位置倒退
    ///
    /// 到达最后一步为 COMPLETED，否则 IN_PROGRESS
    pub fn advance_route(
        &self,
        route: &mut Route,
        step: Station,
        now: NaiveDateTime,
    ) -> LogisticsResult<RouteStatus> {
        if route.status.is_terminal() {
            return Err(LogisticsError::invalid_transition("Route", route.status, step));
        }

        let invalid_step = || LogisticsError::InvalidRouteStep {
            route_id: route.route_id.clone(),
            step: step.to_string(),
        };

        let target_idx = route.step_index(step).ok_or_else(invalid_step)?;
        let current_idx = route.current_step_index().unwrap_or(0);
        if target_idx < current_idx {
            return Err(invalid_step());
        }

        route.current_step = step;
        route.status = if route.is_final_step() {
            RouteStatus::Completed
        } else {
            RouteStatus::InProgress
        };
        route.updated_at = now;

        debug!(route_id = %route.route_id, step = %step, status = %route.status, "路径步骤推进");
        Ok(route.status)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn ts(h: u32, m: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2026, 3, 2)
            .unwrap()
            .and_hms_opt(h, m, 0)
            .unwrap()
    }

    fn item(id: &str) -> Item {
        Item {
            item_id: id.to_string(),
            tracking_id: format!("TRK-{}", id),
            description: "test".to_string(),
            weight: 10.0,
            length: 1.0,
            width: 1.0,
            height: 1.0,
            destination: "MIAMI".to_string(),
            priority: 1,
            status: ItemStatus::Registered,
            registered_at: ts(8, 0),
            updated_at: ts(8, 0),
        }
    }

    fn container(max_w: f64, max_v: f64) -> Container {
        Container::new(
            "C001".to_string(),
            "CNT-0001".to_string(),
            "MIAMI".to_string(),
            max_w,
            max_v,
            ts(7, 0),
        )
    }

    fn route() -> Route {
        Route {
            route_id: "R001".to_string(),
            item_id: "I001".to_string(),
            tracking_id: "TRK-I001".to_string(),
            steps: vec![Station::InboundDock, Station::ScannerStation, Station::SortingAreaA],
            current_step: Station::InboundDock,
            status: RouteStatus::Created,
            estimated_time_minutes: 20.0,
            estimated_completion_time: ts(8, 20),
            created_at: ts(8, 0),
            updated_at: ts(8, 0),
        }
    }

    #[test]
    fn test_item_skip_and_repeat_rejected() {
        let engine = LifecycleEngine::new();
        let mut i = item("I001");

        let err = engine
            .transition_item(&mut i, ItemStatus::Processing, ts(9, 0))
            .unwrap_err();
        assert_eq!(err.error_code(), "INVALID_STATUS_TRANSITION");

        assert_eq!(
            engine.transition_item(&mut i, ItemStatus::Routing, ts(9, 0)),
            Ok(ItemStatus::Registered)
        );
        assert_eq!(i.updated_at, ts(9, 0));

        assert!(
            engine.transition_item(&mut i, ItemStatus::Routing, ts(9, 1)).is_err(),
            "ROUTING → ROUTING 应被拒绝"
        );
    }

    #[test]
    fn test_item_full_chain_then_terminal() {
        let engine = LifecycleEngine::new();
        let mut i = item("I002");
        for target in &ItemStatus::ALL[1..] {
            engine.transition_item(&mut i, *target, ts(9, 0)).unwrap();
        }
        assert_eq!(i.status, ItemStatus::Shipped);
        for target in ItemStatus::ALL {
            assert!(engine.transition_item(&mut i, target, ts(9, 0)).is_err());
        }
    }

    #[test]
    fn test_close_requires_items() {
        let engine = LifecycleEngine::new();
        let mut c = container(100.0, 10.0);
        c.status = ContainerStatus::Loading;

        assert!(engine.close_container(&mut c, ts(10, 0)).is_err(), "空箱不可封箱");
        assert!(c.closed_at.is_none());

        engine.add_item(&mut c, &item("I003").snapshot(), ts(10, 0)).unwrap();
        engine.close_container(&mut c, ts(10, 5)).unwrap();
        assert_eq!(c.status, ContainerStatus::Closed);
        assert_eq!(c.closed_at, Some(ts(10, 5)));
    }

    #[test]
    fn test_add_item_moves_to_loading_and_checks_capacity() {
        let engine = LifecycleEngine::new();
        let mut c = container(15.0, 10.0);

        engine.add_item(&mut c, &item("I004").snapshot(), ts(10, 0)).unwrap();
        assert_eq!(c.status, ContainerStatus::Loading);
        assert_eq!(c.item_count, 1);
        assert_eq!(c.current_weight, 10.0);

        let dup = engine.add_item(&mut c, &item("I004").snapshot(), ts(10, 1));
        assert!(matches!(dup, Err(LogisticsError::Duplicate(_))));

        let full = engine.add_item(&mut c, &item("I005").snapshot(), ts(10, 2));
        assert_eq!(full.unwrap_err().error_code(), "CONTAINER_FULL");
        assert_eq!(c.item_count, 1, "失败的装箱不应改变集装箱");
    }

    #[test]
    fn test_remove_item_keeps_loading() {
        let engine = LifecycleEngine::new();
        let mut c = container(100.0, 10.0);
        engine.add_item(&mut c, &item("I006").snapshot(), ts(10, 0)).unwrap();

        let removed = engine.remove_item(&mut c, "I006").unwrap();
        assert_eq!(removed.item_id, "I006");
        assert_eq!(c.status, ContainerStatus::Loading);
        assert_eq!(c.current_weight, 0.0);
        assert_eq!(c.item_count, 0);

        assert!(matches!(
            engine.remove_item(&mut c, "I006"),
            Err(LogisticsError::NotFound { .. })
        ));
    }

    #[test]
    fn test_closed_container_rejects_items_and_dispatch_chain() {
        let engine = LifecycleEngine::new();
        let mut c = container(100.0, 10.0);
        engine.add_item(&mut c, &item("I007").snapshot(), ts(10, 0)).unwrap();
        engine.close_container(&mut c, ts(11, 0)).unwrap();

        assert!(engine.add_item(&mut c, &item("I008").snapshot(), ts(11, 1)).is_err());
        assert!(engine.deliver_container(&mut c, ts(11, 2)).is_err(), "不可跳过 DISPATCHED");

        engine.dispatch_container(&mut c, ts(12, 0)).unwrap();
        engine.deliver_container(&mut c, ts(18, 0)).unwrap();
        assert_eq!(c.dispatched_at, Some(ts(12, 0)));
        assert_eq!(c.delivered_at, Some(ts(18, 0)));
        assert!(engine.transition_container(&mut c, ContainerStatus::Delivered, ts(19, 0)).is_err());
    }

    #[test]
    fn test_route_advance_rules() {
        let engine = LifecycleEngine::new();
        let mut r = route();

        assert_eq!(
            engine.advance_route(&mut r, Station::ScannerStation, ts(8, 5)),
            Ok(RouteStatus::InProgress)
        );

        let back = engine.advance_route(&mut r, Station::InboundDock, ts(8, 6));
        assert!(matches!(back, Err(LogisticsError::InvalidRouteStep { .. })), "不可倒退");

        let unknown = engine.advance_route(&mut r, Station::PackagingArea, ts(8, 6));
        assert_eq!(unknown.unwrap_err().error_code(), "ROUTE_INVALID");

        assert_eq!(
            engine.advance_route(&mut r, Station::SortingAreaA, ts(8, 30)),
            Ok(RouteStatus::Completed)
        );
        assert!(r.is_delayed());

        let after = engine.advance_route(&mut r, Station::SortingAreaA, ts(8, 31));
        assert_eq!(after.unwrap_err().error_code(), "INVALID_STATUS_TRANSITION");
    }
}
