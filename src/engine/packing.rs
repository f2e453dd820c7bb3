// ==========================================
// 货物装箱与路径决策引擎 - 装箱启发式选择器
// ==========================================
// 输入: 已过滤为可装的候选集合 + 货物重量/体积 + 策略
// 输出: 恰好一个集装箱，输入为空时返回 None
// 约束: 只读扫描 O(n)，不修改候选；并列时先遇到者胜出
// ==========================================

use crate::domain::capacity::CapacityConstraint;
use crate::domain::container::Container;
use crate::engine::strategy::PlacementStrategy;
use tracing::debug;

// ==========================================
// Trait: ContainerSelector
// ==========================================
// Placement Coordinator 通过此接口委托选择（测试可替换为计数桩）
pub trait ContainerSelector: Send + Sync {
    fn select<'a>(
        &self,
        candidates: &[&'a Container],
        item_weight: f64,
        item_volume: f64,
        strategy: PlacementStrategy,
    ) -> Option<&'a Container>;
}

// ==========================================
// PackingAlgorithm - 启发式选择器
// ==========================================
#[derive(Debug, Clone, Copy, Default)]
pub struct PackingAlgorithm;

impl PackingAlgorithm {
    pub fn new() -> Self {
        Self
    }

    /// 按策略选择（泛型版本，任意实现 CapacityConstraint 的资源均可）
    pub fn select_with<'a, C: CapacityConstraint>(
        candidates: &[&'a C],
        item_weight: f64,
        item_volume: f64,
        strategy: PlacementStrategy,
    ) -> Option<&'a C> {
        if candidates.is_empty() {
            return None;
        }

        debug!(
            strategy = strategy.as_str(),
            candidates = candidates.len(),
            item_weight,
            item_volume,
            "启发式选择集装箱"
        );

        let mut admissible = candidates
            .iter()
            .copied()
            .filter(|c| c.admits(item_weight, item_volume));

        match strategy {
            PlacementStrategy::FirstFit => admissible.next(),
            PlacementStrategy::BestFit => {
                min_by_score(admissible, |c| c.remaining_volume_after(item_volume))
            }
            PlacementStrategy::WorstFit => {
                min_by_score(admissible, |c| -c.remaining_volume_after(item_volume))
            }
            PlacementStrategy::WeightBalanced => min_by_score(admissible, |c| {
                (0.5 - c.weight_ratio_after(item_weight)).abs()
            }),
        }
    }
}

impl ContainerSelector for PackingAlgorithm {
    fn select<'a>(
        &self,
        candidates: &[&'a Container],
        item_weight: f64,
        item_volume: f64,
        strategy: PlacementStrategy,
    ) -> Option<&'a Container> {
        Self::select_with(candidates, item_weight, item_volume, strategy)
    }
}

/// 取得分最小者；严格小于才替换，保证并列时先遇到者胜出
fn min_by_score<'a, C, I, F>(candidates: I, score: F) -> Option<&'a C>
where
    C: 'a,
    I: Iterator<Item = &'a C>,
    F: Fn(&C) -> f64,
{
    let mut best: Option<(&'a C, f64)> = None;
    for candidate in candidates {
        let s = score(candidate);
        match best {
            Some((_, best_score)) if s >= best_score => {}
            _ => best = Some((candidate, s)),
        }
    }
    best.map(|(c, _)| c)
}
