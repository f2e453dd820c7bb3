// ==========================================
// 货物装箱与路径决策引擎 - 路径领域模型
// ==========================================
// 红线: current_step 必须属于 steps，且位置单调不减
// 红线: current_step == 最后一步 ⇔ COMPLETED
// ==========================================

use crate::domain::types::{RouteStatus, Station};
use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

// ==========================================
// Route - 货物路径
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Route {
    pub route_id: String,
    pub item_id: String,
    pub tracking_id: String,

    pub steps: Vec<Station>,         // 非空有序序列
    pub current_step: Station,
    pub status: RouteStatus,

    pub estimated_time_minutes: f64,
    pub estimated_completion_time: NaiveDateTime,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

impl Route {
    /// 当前步骤下标（不在序列中返回 None）
    pub fn current_step_index(&self) -> Option<usize> {
        self.step_index(self.current_step)
    }

    pub fn step_index(&self, step: Station) -> Option<usize> {
        self.steps.iter().position(|s| *s == step)
    }

    pub fn is_final_step(&self) -> bool {
        self.steps.last() == Some(&self.current_step)
    }

    /// 下一步骤（已在最后一步返回 None）
    pub fn next_step(&self) -> Option<Station> {
        let idx = self.current_step_index()?;
        self.steps.get(idx + 1).copied()
    }

    /// 进度百分比 (0-100)
    pub fn progress_percentage(&self) -> f64 {
        match self.current_step_index() {
            Some(idx) if !self.steps.is_empty() => {
                (idx + 1) as f64 / self.steps.len() as f64 * 100.0
            }
            _ => 0.0,
        }
    }

    /// 完成时间晚于预估完成时间
    pub fn is_delayed(&self) -> bool {
        self.status == RouteStatus::Completed && self.updated_at > self.estimated_completion_time
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

    fn sample_route(current: Station) -> Route {
        Route {
            route_id: "R001".to_string(),
            item_id: "I001".to_string(),
            tracking_id: "TRK-0001".to_string(),
            steps: vec![
                Station::InboundDock,
                Station::ScannerStation,
                Station::SortingAreaA,
                Station::PackagingArea,
            ],
            current_step: current,
            status: RouteStatus::Created,
            estimated_time_minutes: 30.0,
            estimated_completion_time: ts(8, 30),
            created_at: ts(8, 0),
            updated_at: ts(8, 0),
        }
    }

    #[test]
    fn test_next_step_and_progress() {
        let route = sample_route(Station::ScannerStation);
        assert_eq!(route.next_step(), Some(Station::SortingAreaA));
        assert_eq!(route.progress_percentage(), 50.0);
        assert!(!route.is_final_step());

        let last = sample_route(Station::PackagingArea);
        assert_eq!(last.next_step(), None);
        assert!(last.is_final_step());
    }

    #[test]
    fn test_is_delayed_only_for_completed() {
        let mut route = sample_route(Station::PackagingArea);
        route.updated_at = ts(9, 0);
        assert!(!route.is_delayed());

        route.status = RouteStatus::Completed;
        assert!(route.is_delayed());
    }
}
