// ==========================================
// 货物装箱与路径决策引擎 - 入库编排 API
// ==========================================
// 流程: 登记货物 → 创建路径 → REGISTERED→ROUTING → 装箱决策并提交
// 说明: 找不到可装集装箱不是错误，container_id 为 None
// ==========================================

use std::path::Path;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::api::container_api::ContainerApi;
use crate::api::error::ApiResult;
use crate::api::item_api::ItemApi;
use crate::api::routing_api::RoutingApi;
use crate::domain::item::{Item, ItemRegistration};
use crate::domain::route::Route;
use crate::domain::types::ItemStatus;
use crate::importer::item_csv::{ItemCsvImporter, RowFailure};

/// 单件入库结果
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IntakeOutcome {
    pub item: Item,
    pub route: Route,
    pub container_id: Option<String>,
}

/// 批量入库报告
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct IntakeBatchReport {
    pub processed: Vec<IntakeOutcome>,
    pub failures: Vec<RowFailure>,
}

impl IntakeBatchReport {
    pub fn placed_count(&self) -> usize {
        self.processed
            .iter()
            .filter(|o| o.container_id.is_some())
            .count()
    }
}

// ==========================================
// IntakeApi - 入库编排
// ==========================================
pub struct IntakeApi {
    items: Arc<ItemApi>,
    routing: Arc<RoutingApi>,
    containers: Arc<ContainerApi>,
    importer: ItemCsvImporter,
}

impl IntakeApi {
    pub fn new(
        items: Arc<ItemApi>,
        routing: Arc<RoutingApi>,
        containers: Arc<ContainerApi>,
    ) -> Self {
        Self {
            items,
            routing,
            containers,
            importer: ItemCsvImporter::new(),
        }
    }

    /// 处理一次货物登记
    ///
    /// 各步骤分别提交，不构成整体事务: 后续步骤失败时，已完成的登记、
    /// 路径与状态推进保留在库中，错误原样返回。重试前应先按追踪号查询，
    /// 避免重复登记（同一追踪号会得到 Duplicate）
    pub fn process_registration(&self, registration: ItemRegistration) -> ApiResult<IntakeOutcome> {
        let item = self.items.register_item(registration)?;

        let route = self.routing.create_route(
            &item.item_id,
            &item.tracking_id,
            Some(item.destination.as_str()),
            item.weight,
            Some(item.priority),
        )?;

        let item = self
            .items
            .update_item_status(&item.item_id, ItemStatus::Routing)?;

        let container_id = self
            .containers
            .place_item(&item.snapshot())?
            .map(|c| c.container_id);

        info!(
            item_id = %item.item_id,
            route_id = %route.route_id,
            container_id = container_id.as_deref().unwrap_or("-"),
            "货物入库完成"
        );

        Ok(IntakeOutcome {
            item,
            route,
            container_id,
        })
    }

    /// 从 CSV 批量入库（单行失败不中断整批）
    ///
    /// failures 中的行可能已部分入库（见 `process_registration`），
    /// 失败原因包含出错步骤的错误信息
    pub fn import_csv(&self, path: &Path) -> ApiResult<IntakeBatchReport> {
        let parsed = self.importer.parse_file(path)?;
        let mut report = IntakeBatchReport {
            processed: Vec::with_capacity(parsed.rows.len()),
            failures: parsed.failures,
        };

        for (row, registration) in parsed.rows {
            match self.process_registration(registration) {
                Ok(outcome) => report.processed.push(outcome),
                Err(e) => {
                    warn!(row, error = %e, "CSV 行入库失败");
                    report.failures.push(RowFailure {
                        row,
                        reason: e.to_string(),
                    });
                }
            }
        }
        report.failures.sort_by_key(|f| f.row);

        info!(
            path = %path.display(),
            processed = report.processed.len(),
            placed = report.placed_count(),
            failures = report.failures.len(),
            "CSV 批量入库完成"
        );
        Ok(report)
    }
}
