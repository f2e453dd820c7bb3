// ==========================================
// 货物装箱与路径决策引擎 - 装箱策略定义
// ==========================================
// 用途：
// - 启发式选择器每次调用显式接收策略，不持有可变的共享配置；
// - 当前生效策略存放于 config_kv，由 API 层读取后传入。

use serde::{Deserialize, Serialize};

/// 装箱启发式策略
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PlacementStrategy {
    /// 装入后剩余体积最小
    BestFit,
    /// 输入顺序第一个可装
    FirstFit,
    /// 装入后剩余体积最大
    WorstFit,
    /// 装入后重量占比最接近 50%
    WeightBalanced,
}

impl PlacementStrategy {
    pub const ALL: [PlacementStrategy; 4] = [
        PlacementStrategy::BestFit,
        PlacementStrategy::FirstFit,
        PlacementStrategy::WorstFit,
        PlacementStrategy::WeightBalanced,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            PlacementStrategy::BestFit => "BEST_FIT",
            PlacementStrategy::FirstFit => "FIRST_FIT",
            PlacementStrategy::WorstFit => "WORST_FIT",
            PlacementStrategy::WeightBalanced => "WEIGHT_BALANCED",
        }
    }

    pub fn title_cn(&self) -> &'static str {
        match self {
            PlacementStrategy::BestFit => "最佳适配",
            PlacementStrategy::FirstFit => "首次适配",
            PlacementStrategy::WorstFit => "最差适配",
            PlacementStrategy::WeightBalanced => "重量均衡",
        }
    }
}

impl Default for PlacementStrategy {
    fn default() -> Self {
        PlacementStrategy::BestFit
    }
}

impl std::fmt::Display for PlacementStrategy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for PlacementStrategy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().replace('-', "_").as_str() {
            "best_fit" => Ok(PlacementStrategy::BestFit),
            "first_fit" => Ok(PlacementStrategy::FirstFit),
            "worst_fit" => Ok(PlacementStrategy::WorstFit),
            "weight_balanced" => Ok(PlacementStrategy::WeightBalanced),
            other => Err(format!("未知装箱策略: {}", other)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_accepts_both_spellings() {
        assert_eq!("BEST_FIT".parse(), Ok(PlacementStrategy::BestFit));
        assert_eq!("weight-balanced".parse(), Ok(PlacementStrategy::WeightBalanced));
        assert!("random_fit".parse::<PlacementStrategy>().is_err());
    }

    #[test]
    fn test_default_is_best_fit() {
        assert_eq!(PlacementStrategy::default(), PlacementStrategy::BestFit);
    }
}
