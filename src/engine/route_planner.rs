// ==========================================
// 货物装箱与路径决策引擎 - 路径规划器
// ==========================================
// 固定拓扑: INBOUND_DOCK → SCANNER_STATION → {SORTING_AREA_A | SORTING_AREA_B}
//           → PACKAGING_AREA → CONTAINER_LOADING → OUTBOUND_DOCK_{区域}
// 职责: 分拣站二选一（运行状态 + 负载滞回）、目的地区域解析、耗时估算
// 副作用: 每次规划后扰动共享设施负载
// ==========================================
// 已知不对称: 非分拣站停机只影响负载/耗时，不改变路径构成
// ==========================================

use crate::domain::types::{Region, Station};
use crate::engine::facility::FacilityNetwork;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{info, instrument};

// ==========================================
// RoutingConfig - 路径规划参数
// ==========================================
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RoutingConfig {
    /// 重货阈值（kg），超过则偏好 SORTING_AREA_B
    pub heavy_item_threshold: f64,
    /// 分拣站负载滞回带宽
    pub sorting_hysteresis: i32,
    /// 设施恢复运行后的负载
    pub recovered_station_load: i32,
}

impl Default for RoutingConfig {
    fn default() -> Self {
        Self {
            heavy_item_threshold: 20.0,
            sorting_hysteresis: 30,
            recovered_station_load: 20,
        }
    }
}

// 目的地 → 区域（大写精确匹配）
const DESTINATION_REGIONS: [(&str, Region); 11] = [
    ("NORTH", Region::North),
    ("SOUTH", Region::South),
    ("EAST", Region::East),
    ("WEST", Region::West),
    ("NEW YORK", Region::East),
    ("LOS ANGELES", Region::West),
    ("CHICAGO", Region::North),
    ("HOUSTON", Region::South),
    ("MIAMI", Region::South),
    ("SEATTLE", Region::West),
    ("BOSTON", Region::East),
];

// 子串匹配顺序
const REGION_KEYWORDS: [(&str, Region); 4] = [
    ("NORTH", Region::North),
    ("SOUTH", Region::South),
    ("EAST", Region::East),
    ("WEST", Region::West),
];

// ==========================================
// RoutePlanner - 路径规划器
// ==========================================
pub struct RoutePlanner {
    network: Arc<FacilityNetwork>,
    config: RoutingConfig,
}

impl RoutePlanner {
    pub fn new(network: Arc<FacilityNetwork>, config: RoutingConfig) -> Self {
        Self { network, config }
    }

    pub fn network(&self) -> &Arc<FacilityNetwork> {
        &self.network
    }

    pub fn config(&self) -> &RoutingConfig {
        &self.config
    }

    /// 规划货物路径
    ///
    /// # 参数
    /// - `destination`: 目的地（None 时默认南区）
    /// - `priority`: 仅记录，不影响路径
    ///
    /// # 返回
    /// - 有序站点序列（长度固定为 6）
    #[instrument(skip(self))]
    pub fn find_optimal_path(
        &self,
        item_id: &str,
        destination: Option<&str>,
        weight: f64,
        priority: i32,
    ) -> Vec<Station> {
        let mut path = Vec::with_capacity(6);

        // 1. 入库 + 扫描
        path.push(Station::InboundDock);
        path.push(Station::ScannerStation);

        // 2. 分拣站
        path.push(self.choose_sorting_area(weight));

        // 3. 包装 + 装箱
        path.push(Station::PackagingArea);
        path.push(Station::ContainerLoading);

        // 4. 出库口
        path.push(Self::resolve_region(destination).outbound_dock());

        // 5. 负载扰动
        self.network.record_route_usage(&path);

        info!(
            item_id,
            path = ?path.iter().map(Station::as_str).collect::<Vec<_>>(),
            "路径规划完成"
        );
        path
    }

    /// 分拣站选择
    ///
    /// A 停机选 B，B 停机选 A；否则重货偏好 B、轻货偏好 A，
    /// 偏好站负载超出另一站滞回带宽以上时改选另一站
    pub fn choose_sorting_area(&self, weight: f64) -> Station {
        if !self.network.is_operational(Station::SortingAreaA) {
            return Station::SortingAreaB;
        }
        if !self.network.is_operational(Station::SortingAreaB) {
            return Station::SortingAreaA;
        }

        let load_a = self.network.load(Station::SortingAreaA);
        let load_b = self.network.load(Station::SortingAreaB);
        let band = self.config.sorting_hysteresis;

        if weight > self.config.heavy_item_threshold {
            if load_b > load_a + band {
                Station::SortingAreaA
            } else {
                Station::SortingAreaB
            }
        } else if load_a > load_b + band {
            Station::SortingAreaB
        } else {
            Station::SortingAreaA
        }
    }

    /// 目的地区域解析: 精确匹配 → 关键字子串 → 默认 SOUTH
    pub fn resolve_region(destination: Option<&str>) -> Region {
        let Some(destination) = destination else {
            return Region::South;
        };
        let upper = destination.to_uppercase();

        if let Some((_, region)) = DESTINATION_REGIONS.iter().find(|(name, _)| *name == upper) {
            return *region;
        }

        REGION_KEYWORDS
            .iter()
            .find(|(keyword, _)| upper.contains(keyword))
            .map(|(_, region)| *region)
            .unwrap_or(Region::South)
    }

    /// 预估耗时（分钟）: Σ 额定时长 × (1 + 负载/100)
    pub fn calculate_estimated_time(&self, path: &[Station]) -> f64 {
        let loads = self.network.load_snapshot();
        path.iter()
            .map(|s| {
                let load = loads.get(s).copied().unwrap_or(0) as f64;
                s.nominal_minutes() * (1.0 + load / 100.0)
            })
            .sum()
    }

    /// 更新设施运行状态（停机负载 100，恢复负载取配置值）
    pub fn update_equipment_status(&self, station: Station, operational: bool) {
        self.network
            .set_operational(station, operational, self.config.recovered_station_load);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::facility::LoadRandomness;
    use std::collections::VecDeque;
    use std::sync::Mutex;

    /// 按脚本依次返回的随机源
    struct ScriptedRandomness {
        increments: Mutex<VecDeque<i32>>,
        decrements: Mutex<VecDeque<i32>>,
        picks: Mutex<VecDeque<usize>>,
    }

    impl ScriptedRandomness {
        fn new(inc: &[i32], dec: &[i32], picks: &[usize]) -> Self {
            Self {
                increments: Mutex::new(inc.iter().copied().collect()),
                decrements: Mutex::new(dec.iter().copied().collect()),
                picks: Mutex::new(picks.iter().copied().collect()),
            }
        }
    }

    impl LoadRandomness for ScriptedRandomness {
        fn increment(&self) -> i32 {
            self.increments.lock().unwrap().pop_front().unwrap_or(1)
        }
        fn decrement(&self) -> i32 {
            self.decrements.lock().unwrap().pop_front().unwrap_or(1)
        }
        fn pick_station(&self, _n: usize) -> usize {
            self.picks.lock().unwrap().pop_front().unwrap_or(0)
        }
        fn initial_load(&self) -> i32 {
            0
        }
    }

    fn planner_with_load(load: i32) -> RoutePlanner {
        let randomness = Arc::new(ScriptedRandomness::new(&[], &[], &[]));
        let network = Arc::new(FacilityNetwork::with_uniform_load(randomness, load));
        RoutePlanner::new(network, RoutingConfig::default())
    }

    #[test]
    fn test_destination_region_resolution() {
        assert_eq!(RoutePlanner::resolve_region(Some("New York")), Region::East);
        assert_eq!(RoutePlanner::resolve_region(Some("Some City West Annex")), Region::West);
        assert_eq!(RoutePlanner::resolve_region(Some("Atlantis")), Region::South);
        assert_eq!(RoutePlanner::resolve_region(None), Region::South);
        assert_eq!(RoutePlanner::resolve_region(Some("chicago")), Region::North);
        // 不去除首尾空白: 精确匹配失败，也不含区域关键字
        assert_eq!(RoutePlanner::resolve_region(Some(" New York ")), Region::South);
    }

    #[test]
    fn test_path_structure() {
        let planner = planner_with_load(10);
        let path = planner.find_optimal_path("I001", Some("New York"), 5.0, 1);

        assert_eq!(
            path,
            vec![
                Station::InboundDock,
                Station::ScannerStation,
                Station::SortingAreaA,
                Station::PackagingArea,
                Station::ContainerLoading,
                Station::OutboundDockEast,
            ]
        );
    }

    #[test]
    fn test_sorting_choice_by_weight_and_hysteresis() {
        let planner = planner_with_load(10);
        let network = planner.network().clone();

        // 负载相等: 重货 B，轻货 A
        assert_eq!(planner.choose_sorting_area(25.0), Station::SortingAreaB);
        assert_eq!(planner.choose_sorting_area(20.0), Station::SortingAreaA);

        // B 比 A 高出 31 → 重货改走 A
        network.set_load(Station::SortingAreaA, 10);
        network.set_load(Station::SortingAreaB, 41);
        assert_eq!(planner.choose_sorting_area(25.0), Station::SortingAreaA);

        // 恰好高出 30 仍在滞回带内
        network.set_load(Station::SortingAreaB, 40);
        assert_eq!(planner.choose_sorting_area(25.0), Station::SortingAreaB);

        // A 比 B 高出 31 → 轻货改走 B
        network.set_load(Station::SortingAreaA, 71);
        assert_eq!(planner.choose_sorting_area(5.0), Station::SortingAreaB);
    }

    #[test]
    fn test_disabled_sorting_station_never_used() {
        let planner = planner_with_load(10);
        planner.update_equipment_status(Station::SortingAreaB, false);

        for weight in [1.0, 19.0, 25.0, 500.0] {
            let path = planner.find_optimal_path("I002", Some("Boston"), weight, 1);
            assert!(path.contains(&Station::SortingAreaA), "应始终选择 A");
            assert!(!path.contains(&Station::SortingAreaB), "停机的 B 不应出现");
        }
    }

    #[test]
    fn test_both_sorting_stations_down_falls_back_to_b() {
        let planner = planner_with_load(10);
        planner.update_equipment_status(Station::SortingAreaA, false);
        planner.update_equipment_status(Station::SortingAreaB, false);

        for weight in [1.0, 25.0] {
            assert_eq!(planner.choose_sorting_area(weight), Station::SortingAreaB);
            let path = planner.find_optimal_path("I005", Some("Denver"), weight, 1);
            assert_eq!(path[2], Station::SortingAreaB);
            assert!(!path.contains(&Station::SortingAreaA));
        }
    }

    #[test]
    fn test_exact_load_after_planning() {
        // 6 个路径站点增量，随后两次衰减都选中 OUTBOUND_DOCK_NORTH(下标 6)
        let randomness = Arc::new(ScriptedRandomness::new(&[1, 2, 3, 1, 2, 3], &[4, 5], &[6, 6]));
        let network = Arc::new(FacilityNetwork::with_uniform_load(randomness, 50));
        let planner = RoutePlanner::new(network.clone(), RoutingConfig::default());

        let path = planner.find_optimal_path("I003", Some("Houston"), 5.0, 1);
        assert_eq!(path.last(), Some(&Station::OutboundDockSouth));

        assert_eq!(network.load(Station::InboundDock), 51);
        assert_eq!(network.load(Station::ScannerStation), 52);
        assert_eq!(network.load(Station::SortingAreaA), 53);
        assert_eq!(network.load(Station::PackagingArea), 51);
        assert_eq!(network.load(Station::ContainerLoading), 52);
        assert_eq!(network.load(Station::OutboundDockSouth), 53);
        assert_eq!(network.load(Station::OutboundDockNorth), 41);
        assert_eq!(network.load(Station::SortingAreaB), 50, "未经过且未被衰减");
    }

    #[test]
    fn test_estimated_time_scales_with_load_and_length() {
        let planner = planner_with_load(0);
        let short = [Station::InboundDock, Station::ScannerStation];
        let long = [Station::InboundDock, Station::ScannerStation, Station::PackagingArea];

        assert_eq!(planner.calculate_estimated_time(&short), 7.0);
        assert!(planner.calculate_estimated_time(&long) > planner.calculate_estimated_time(&short));

        planner.network().set_load(Station::PackagingArea, 100);
        assert_eq!(planner.calculate_estimated_time(&[Station::PackagingArea]), 30.0);
    }

    #[test]
    fn test_non_sorting_outage_only_affects_timing() {
        // 已知不对称: 出库口停机仍会被规划进路径
        let planner = planner_with_load(0);
        planner.update_equipment_status(Station::OutboundDockEast, false);

        let path = planner.find_optimal_path("I004", Some("New York"), 5.0, 1);
        assert_eq!(path.last(), Some(&Station::OutboundDockEast));
        assert!(planner.calculate_estimated_time(&[Station::OutboundDockEast]) >= 14.0 - 1e-9);
    }
}
