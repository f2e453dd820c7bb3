// ==========================================
// 货物装箱与路径决策引擎 - 装箱协调器
// ==========================================
// 职责: 候选集合预过滤（容量约束）后委托启发式选择器
// 红线: 过滤后为空时不调用选择器，直接返回 None
// 红线: 只读，不修改任何集装箱
// ==========================================

use crate::domain::capacity::CapacityConstraint;
use crate::domain::container::Container;
use crate::engine::packing::{ContainerSelector, PackingAlgorithm};
use crate::engine::strategy::PlacementStrategy;
use std::sync::Arc;
use tracing::{debug, instrument};

// ==========================================
// ContainerOptimizer - Placement Coordinator
// ==========================================
pub struct ContainerOptimizer {
    selector: Arc<dyn ContainerSelector>,
}

impl ContainerOptimizer {
    pub fn new(selector: Arc<dyn ContainerSelector>) -> Self {
        Self { selector }
    }

    /// 为货物挑选集装箱
    ///
    /// # 参数
    /// - `candidates`: 候选集装箱（None 与空列表等价）
    /// - `item_weight` / `item_volume`: 货物重量与体积
    /// - `strategy`: 本次调用使用的启发式策略
    ///
    /// # 返回
    /// - `Some(container)`: 选中的候选（引用输入中的元素）
    /// - `None`: 无候选或全部容量不足
    #[instrument(skip(self, candidates), fields(strategy = %strategy))]
    pub fn find_optimal_container<'a>(
        &self,
        candidates: Option<&'a [Container]>,
        item_weight: f64,
        item_volume: f64,
        strategy: PlacementStrategy,
    ) -> Option<&'a Container> {
        let candidates = match candidates {
            Some(list) if !list.is_empty() => list,
            _ => {
                debug!("候选集装箱为空");
                return None;
            }
        };

        let admissible: Vec<&'a Container> = candidates
            .iter()
            .filter(|c| c.admits(item_weight, item_volume))
            .collect();

        if admissible.is_empty() {
            debug!(candidates = candidates.len(), "候选集装箱均容量不足");
            return None;
        }

        let chosen = self
            .selector
            .select(&admissible, item_weight, item_volume, strategy);

        if let Some(container) = chosen {
            debug!(
                container_id = %container.container_id,
                admissible = admissible.len(),
                "选中集装箱"
            );
        }
        chosen
    }

    /// 单箱可装判定（None 视为不可装）
    pub fn can_fit_in_container(
        container: Option<&Container>,
        item_weight: f64,
        item_volume: f64,
    ) -> bool {
        container
            .map(|c| c.admits(item_weight, item_volume))
            .unwrap_or(false)
    }
}

impl Default for ContainerOptimizer {
    fn default() -> Self {
        Self::new(Arc::new(PackingAlgorithm::new()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct CountingSelector {
        calls: AtomicUsize,
    }

    impl ContainerSelector for CountingSelector {
        fn select<'a>(
            &self,
            candidates: &[&'a Container],
            item_weight: f64,
            item_volume: f64,
            strategy: PlacementStrategy,
        ) -> Option<&'a Container> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            PackingAlgorithm::select_with(candidates, item_weight, item_volume, strategy)
        }
    }

    fn container(id: &str, max_w: f64, max_v: f64, cur_w: f64, cur_v: f64) -> Container {
        let created_at = NaiveDate::from_ymd_opt(2026, 3, 1)
            .unwrap()
            .and_hms_opt(8, 0, 0)
            .unwrap();
        let mut c = Container::new(
            id.to_string(),
            format!("CNT-{}", id),
            "CHICAGO".to_string(),
            max_w,
            max_v,
            created_at,
        );
        c.current_weight = cur_w;
        c.current_volume = cur_v;
        c
    }

    fn counting() -> (Arc<CountingSelector>, ContainerOptimizer) {
        let selector = Arc::new(CountingSelector {
            calls: AtomicUsize::new(0),
        });
        let optimizer = ContainerOptimizer::new(selector.clone());
        (selector, optimizer)
    }

    #[test]
    fn test_empty_or_absent_candidates_skip_selector() {
        let (selector, optimizer) = counting();

        assert!(optimizer
            .find_optimal_container(None, 1.0, 1.0, PlacementStrategy::BestFit)
            .is_none());
        assert!(optimizer
            .find_optimal_container(Some(&[][..]), 1.0, 1.0, PlacementStrategy::BestFit)
            .is_none());
        assert_eq!(selector.calls.load(Ordering::SeqCst), 0, "空候选不应调用选择器");
    }

    #[test]
    fn test_all_overweight_returns_none_without_selector() {
        let (selector, optimizer) = counting();
        let list = vec![container("A", 10.0, 10.0, 9.0, 0.0)];

        let chosen = optimizer.find_optimal_container(Some(list.as_slice()), 5.0, 1.0, PlacementStrategy::FirstFit);
        assert!(chosen.is_none());
        assert_eq!(selector.calls.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_filters_before_delegating() {
        let (selector, optimizer) = counting();
        let list = vec![
            container("FULL", 100.0, 10.0, 0.0, 9.9),
            container("OK", 100.0, 10.0, 0.0, 1.0),
        ];

        let chosen = optimizer.find_optimal_container(Some(list.as_slice()), 10.0, 2.0, PlacementStrategy::BestFit);
        assert_eq!(chosen.map(|c| c.container_id.as_str()), Some("OK"));
        assert_eq!(selector.calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_can_fit_in_container() {
        let c = container("A", 100.0, 10.0, 50.0, 5.0);
        assert!(ContainerOptimizer::can_fit_in_container(Some(&c), 50.0, 5.0));
        assert!(!ContainerOptimizer::can_fit_in_container(Some(&c), 50.1, 5.0));
        assert!(!ContainerOptimizer::can_fit_in_container(None, 0.0, 0.0));
    }
}
