// ==========================================
// 货物装箱与路径决策引擎 - 容量模型
// ==========================================
// 红线: 提交装箱后 current ≤ max（重量与体积同时满足）
// 用途: 可装判定、利用率计算，纯值逻辑无副作用
// ==========================================

use serde::{Deserialize, Serialize};

// ==========================================
// Utilization - 利用率（百分比）
// ==========================================
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Utilization {
    pub weight_pct: f64,
    pub volume_pct: f64,
}

impl Utilization {
    /// 重量或体积任一超过阈值（百分比）
    pub fn exceeds(&self, threshold_pct: f64) -> bool {
        self.weight_pct > threshold_pct || self.volume_pct > threshold_pct
    }
}

// ==========================================
// Trait: CapacityConstraint
// ==========================================
// 用途: Placement Coordinator / 启发式选择器的约束检查接口
pub trait CapacityConstraint {
    fn max_weight(&self) -> f64;
    fn max_volume(&self) -> f64;
    fn current_weight(&self) -> f64;
    fn current_volume(&self) -> f64;

    /// 检查是否可装入
    ///
    /// # 返回
    /// - `true`: 装入后重量、体积均不超过上限（恰好等于上限可装）
    /// - `false`: 任一超限
    fn admits(&self, item_weight: f64, item_volume: f64) -> bool {
        self.current_weight() + item_weight <= self.max_weight()
            && self.current_volume() + item_volume <= self.max_volume()
    }

    /// 装入后剩余体积
    fn remaining_volume_after(&self, item_volume: f64) -> f64 {
        self.max_volume() - (self.current_volume() + item_volume)
    }

    /// 装入后重量占比（0~1）
    fn weight_ratio_after(&self, item_weight: f64) -> f64 {
        let max_weight = self.max_weight();
        if max_weight <= 0.0 {
            return 0.0;
        }
        (self.current_weight() + item_weight) / max_weight
    }

    /// 当前利用率
    ///
    /// 上限为 0 时定义为 0（退化输入策略，不是错误）
    fn utilization(&self) -> Utilization {
        Utilization {
            weight_pct: percentage(self.current_weight(), self.max_weight()),
            volume_pct: percentage(self.current_volume(), self.max_volume()),
        }
    }
}

fn percentage(current: f64, max: f64) -> f64 {
    if max <= 0.0 || !max.is_finite() {
        return 0.0;
    }
    current / max * 100.0
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Bin {
        max_w: f64,
        max_v: f64,
        cur_w: f64,
        cur_v: f64,
    }

    impl CapacityConstraint for Bin {
        fn max_weight(&self) -> f64 {
            self.max_w
        }
        fn max_volume(&self) -> f64 {
            self.max_v
        }
        fn current_weight(&self) -> f64 {
            self.cur_w
        }
        fn current_volume(&self) -> f64 {
            self.cur_v
        }
    }

    #[test]
    fn test_admits_exact_boundary() {
        let bin = Bin { max_w: 100.0, max_v: 10.0, cur_w: 60.0, cur_v: 4.0 };

        assert!(bin.admits(40.0, 6.0), "恰好等于上限应可装");
        assert!(!bin.admits(40.1, 6.0), "重量超限应拒绝");
        assert!(!bin.admits(40.0, 6.1), "体积超限应拒绝");
    }

    #[test]
    fn test_utilization_zero_max_is_zero() {
        let bin = Bin { max_w: 0.0, max_v: 0.0, cur_w: 5.0, cur_v: 5.0 };
        let u = bin.utilization();
        assert_eq!(u.weight_pct, 0.0);
        assert_eq!(u.volume_pct, 0.0);
    }

    #[test]
    fn test_utilization_percentages() {
        let bin = Bin { max_w: 200.0, max_v: 8.0, cur_w: 50.0, cur_v: 6.0 };
        let u = bin.utilization();
        assert_eq!(u.weight_pct, 25.0);
        assert_eq!(u.volume_pct, 75.0);
        assert!(!u.exceeds(90.0));
    }
}
