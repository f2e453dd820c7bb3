// ==========================================
// 货物装箱与路径决策引擎 - 路径 API
// ==========================================
// 职责: 路径创建与推进、设施状态管理、延误统计
// 说明: 设施负载只在内存中维护，重启后重新初始化
// 红线: 路径的"读-改-写"在 commit_lock 内完成，步骤位置只增不减
// ==========================================

use std::collections::BTreeMap;
use std::sync::{Arc, Mutex, MutexGuard};

use chrono::Duration;
use tracing::info;
use uuid::Uuid;

use crate::api::error::{ApiError, ApiResult};
use crate::api::now;
use crate::domain::error::LogisticsError;
use crate::domain::item::DEFAULT_PRIORITY;
use crate::domain::route::Route;
use crate::domain::types::{RouteStatus, Station};
use crate::engine::events::{EntityKind, OptionalEventPublisher, StatusEvent};
use crate::engine::facility::FacilityStatus;
use crate::engine::lifecycle::LifecycleEngine;
use crate::engine::route_planner::RoutePlanner;
use crate::repository::route_repo::RouteRepository;

// ==========================================
// RoutingApi - 路径 API
// ==========================================
pub struct RoutingApi {
    route_repo: Arc<RouteRepository>,
    planner: Arc<RoutePlanner>,
    lifecycle: LifecycleEngine,
    events: OptionalEventPublisher,
    // 串行化"读-改-写"提交
    commit_lock: Mutex<()>,
}

impl RoutingApi {
    pub fn new(
        route_repo: Arc<RouteRepository>,
        planner: Arc<RoutePlanner>,
        events: OptionalEventPublisher,
    ) -> Self {
        Self {
            route_repo,
            planner,
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

    pub fn planner(&self) -> &Arc<RoutePlanner> {
        &self.planner
    }

    // ==========================================
    // 路径创建
    // ==========================================

    /// 为货物创建路径
    ///
    /// # 规则
    /// - 同一货物只允许一条路径（重复 → Duplicate）
    /// - 预计完成时间 = 当前时间 + 预估分钟数（向下取整）
    /// - 当前步骤为序列首站，状态 CREATED
    pub fn create_route(
        &self,
        item_id: &str,
        tracking_id: &str,
        destination: Option<&str>,
        weight: f64,
        priority: Option<i32>,
    ) -> ApiResult<Route> {
        let _guard = self.lock_commit()?;
        if self.route_repo.find_by_item_id(item_id)?.is_some() {
            return Err(LogisticsError::Duplicate(format!("route for item {}", item_id)).into());
        }

        let priority = priority.unwrap_or(DEFAULT_PRIORITY);
        let steps = self
            .planner
            .find_optimal_path(item_id, destination, weight, priority);
        let estimated_time_minutes = self.planner.calculate_estimated_time(&steps);

        let first_step = *steps.first().ok_or_else(|| LogisticsError::InvalidRouteStep {
            route_id: String::new(),
            step: "<empty>".to_string(),
        })?;

        let ts = now();
        let route = Route {
            route_id: Uuid::new_v4().to_string(),
            item_id: item_id.to_string(),
            tracking_id: tracking_id.to_string(),
            current_step: first_step,
            steps,
            status: RouteStatus::Created,
            estimated_time_minutes,
            estimated_completion_time: ts + Duration::minutes(estimated_time_minutes.floor() as i64),
            created_at: ts,
            updated_at: ts,
        };

        self.route_repo.insert(&route)?;
        info!(
            route_id = %route.route_id,
            item_id,
            estimated_minutes = route.estimated_time_minutes,
            "路径已创建"
        );

        self.events.publish(
            StatusEvent::new(EntityKind::Route, &route.route_id, route.status)
                .with_tracking_id(&route.tracking_id)
                .with_metric("estimated_time_minutes", route.estimated_time_minutes)
                .at(ts),
        );
        Ok(route)
    }

    // ==========================================
    // 查询
    // ==========================================

    pub fn get_route(&self, route_id: &str) -> ApiResult<Route> {
        self.route_repo
            .find_by_id(route_id)?
            .ok_or_else(|| LogisticsError::not_found("Route", route_id).into())
    }

    pub fn get_route_by_item_id(&self, item_id: &str) -> ApiResult<Route> {
        self.route_repo
            .find_by_item_id(item_id)?
            .ok_or_else(|| LogisticsError::not_found("Route", item_id).into())
    }

    pub fn get_route_by_tracking_id(&self, tracking_id: &str) -> ApiResult<Route> {
        self.route_repo
            .find_by_tracking_id(tracking_id)?
            .ok_or_else(|| LogisticsError::not_found("Route", tracking_id).into())
    }

    pub fn list_routes_by_status(&self, status: RouteStatus) -> ApiResult<Vec<Route>> {
        Ok(self.route_repo.list_by_status(status)?)
    }

    // ==========================================
    // 路径推进
    // ==========================================

    /// 推进路径到指定步骤
    ///
    /// # 错误
    /// - NotFound: 路径不存在
    /// - InvalidRouteStep: 步骤不在序列中或倒退
    /// - InvalidTransition: 路径已是 COMPLETED/FAILED
    pub fn update_route_step(&self, route_id: &str, step: Station) -> ApiResult<Route> {
        let _guard = self.lock_commit()?;
        let mut route = self.get_route(route_id)?;
        let previous = route.status;
        let ts = now();
        self.lifecycle.advance_route(&mut route, step, ts)?;

        self.route_repo.update_progress(&route)?;
        info!(route_id, step = %step, status = %route.status, "路径步骤已更新");

        self.events.publish(
            StatusEvent::new(EntityKind::Route, &route.route_id, route.status)
                .with_previous(previous)
                .with_tracking_id(&route.tracking_id)
                .with_metric("progress_pct", route.progress_percentage())
                .at(ts),
        );
        Ok(route)
    }

    /// 按站点名称推进（未知名称 → InvalidRouteStep）
    pub fn update_route_step_named(&self, route_id: &str, step_name: &str) -> ApiResult<Route> {
        let step = step_name
            .parse::<Station>()
            .map_err(|_| LogisticsError::InvalidRouteStep {
                route_id: route_id.to_string(),
                step: step_name.to_string(),
            })?;
        self.update_route_step(route_id, step)
    }

    // ==========================================
    // 设施状态
    // ==========================================

    pub fn equipment_load_status(&self) -> BTreeMap<Station, i32> {
        self.planner.network().load_snapshot().into_iter().collect()
    }

    pub fn equipment_operational_status(&self) -> BTreeMap<Station, bool> {
        self.planner.network().operational_snapshot().into_iter().collect()
    }

    /// 设置设施运行状态（未知站点名 → NotFound）
    pub fn update_equipment_status(
        &self,
        station_name: &str,
        operational: bool,
    ) -> ApiResult<FacilityStatus> {
        let station = station_name
            .parse::<Station>()
            .map_err(|_| LogisticsError::not_found("Facility", station_name))?;

        let previous = self.planner.network().is_operational(station);
        self.planner.update_equipment_status(station, operational);

        let load = self.planner.network().load(station);
        self.events.publish(
            StatusEvent::new(EntityKind::Facility, station.as_str(), facility_status(operational))
                .with_previous(facility_status(previous))
                .with_metric("load", load as f64)
                .at(now()),
        );

        Ok(FacilityStatus {
            station,
            load,
            operational,
            nominal_minutes: station.nominal_minutes(),
        })
    }

    pub fn all_facilities(&self) -> Vec<FacilityStatus> {
        self.planner.network().all_facilities()
    }

    // ==========================================
    // 统计
    // ==========================================

    /// 已完成但晚于预计完成时间的路径
    pub fn delayed_routes(&self) -> ApiResult<Vec<Route>> {
        Ok(self.route_repo.list_delayed()?)
    }

    /// 按当前步骤汇总平均预估耗时（分钟）
    pub fn average_estimated_time_by_step(&self) -> ApiResult<BTreeMap<Station, f64>> {
        let mut grouped: BTreeMap<Station, (f64, usize)> = BTreeMap::new();
        for route in self.route_repo.list_all()? {
            let entry = grouped.entry(route.current_step).or_insert((0.0, 0));
            entry.0 += route.estimated_time_minutes;
            entry.1 += 1;
        }

        Ok(grouped
            .into_iter()
            .map(|(step, (sum, count))| (step, sum / count as f64))
            .collect())
    }
}

fn facility_status(operational: bool) -> &'static str {
    if operational {
        "OPERATIONAL"
    } else {
        "DOWN"
    }
}
