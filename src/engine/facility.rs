// ==========================================
// 货物装箱与路径决策引擎 - 设施网络模型
// ==========================================
// 职责: 固定站点集合的负载(0-100)与运行状态，跨路径规划请求共享
// 并发: 单把互斥锁保护整张站点表（站点数量固定且很少）
// 随机: 负载扰动通过 LoadRandomness 注入，测试可断言精确负载
// ==========================================

use crate::domain::types::Station;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};
use tracing::{debug, info, warn};

/// 负载上限
pub const MAX_LOAD: i32 = 100;

/// 每次规划扰动的随机站点数量
pub const AMBIENT_DECAY_PICKS: usize = 2;

// ==========================================
// Trait: LoadRandomness
// ==========================================
pub trait LoadRandomness: Send + Sync {
    /// 路径站点负载增量 [1,3]
    fn increment(&self) -> i32;

    /// 环境衰减量 [1,5]
    fn decrement(&self) -> i32;

    /// 均匀选择站点下标 [0,n)
    fn pick_station(&self, n: usize) -> usize;

    /// 启动时初始负载 [0,100)
    fn initial_load(&self) -> i32;
}

/// 基于 ChaCha8 的随机源（可指定种子复现）
pub struct SeededRandomness {
    rng: Mutex<ChaCha8Rng>,
}

impl SeededRandomness {
    pub fn from_seed(seed: u64) -> Self {
        Self {
            rng: Mutex::new(ChaCha8Rng::seed_from_u64(seed)),
        }
    }

    pub fn from_entropy() -> Self {
        Self {
            rng: Mutex::new(ChaCha8Rng::from_entropy()),
        }
    }

    fn rng(&self) -> MutexGuard<'_, ChaCha8Rng> {
        self.rng.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl LoadRandomness for SeededRandomness {
    fn increment(&self) -> i32 {
        self.rng().gen_range(1..=3)
    }

    fn decrement(&self) -> i32 {
        self.rng().gen_range(1..=5)
    }

    fn pick_station(&self, n: usize) -> usize {
        if n == 0 {
            return 0;
        }
        self.rng().gen_range(0..n)
    }

    fn initial_load(&self) -> i32 {
        self.rng().gen_range(0..MAX_LOAD)
    }
}

// ==========================================
// StationState / FacilityStatus
// ==========================================
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StationState {
    pub load: i32,
    pub operational: bool,
}

/// 设施状态视图（对外展示）
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FacilityStatus {
    pub station: Station,
    pub load: i32,
    pub operational: bool,
    pub nominal_minutes: f64,
}

// ==========================================
// FacilityNetwork - 共享设施状态
// ==========================================
pub struct FacilityNetwork {
    stations: Mutex<HashMap<Station, StationState>>,
    randomness: Arc<dyn LoadRandomness>,
}

impl FacilityNetwork {
    /// 按随机源生成初始负载，全部站点可运行
    pub fn new(randomness: Arc<dyn LoadRandomness>) -> Self {
        let stations = Station::ALL
            .iter()
            .map(|s| {
                let load = randomness.initial_load().clamp(0, MAX_LOAD);
                (*s, StationState { load, operational: true })
            })
            .collect();

        Self {
            stations: Mutex::new(stations),
            randomness,
        }
    }

    /// 全部站点使用同一初始负载
    pub fn with_uniform_load(randomness: Arc<dyn LoadRandomness>, load: i32) -> Self {
        let load = load.clamp(0, MAX_LOAD);
        let stations = Station::ALL
            .iter()
            .map(|s| (*s, StationState { load, operational: true }))
            .collect();

        Self {
            stations: Mutex::new(stations),
            randomness,
        }
    }

    // 站点表只做计数器更新，中毒后继续使用内部数据
    fn lock(&self) -> MutexGuard<'_, HashMap<Station, StationState>> {
        self.stations
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn state(&self, station: Station) -> StationState {
        self.lock()
            .get(&station)
            .copied()
            .unwrap_or(StationState { load: 0, operational: true })
    }

    pub fn load(&self, station: Station) -> i32 {
        self.state(station).load
    }

    pub fn is_operational(&self, station: Station) -> bool {
        self.state(station).operational
    }

    /// 直接设置负载（截断到 [0,100]）
    pub fn set_load(&self, station: Station, load: i32) {
        let mut stations = self.lock();
        let entry = stations
            .entry(station)
            .or_insert(StationState { load: 0, operational: true });
        entry.load = load.clamp(0, MAX_LOAD);
    }

    /// 规划路径经过的站点各自增加 [1,3] 负载，封顶 100
    pub fn apply_path_usage(&self, path: &[Station]) {
        let mut stations = self.lock();
        for station in path {
            let delta = self.randomness.increment();
            if let Some(state) = stations.get_mut(station) {
                state.load = (state.load + delta).min(MAX_LOAD);
            }
        }
    }

    /// 从全部站点中随机挑两个各减少 [1,5] 负载，下限 0
    pub fn apply_ambient_decay(&self) {
        let mut stations = self.lock();
        for _ in 0..AMBIENT_DECAY_PICKS {
            let idx = self.randomness.pick_station(Station::ALL.len());
            let Some(station) = Station::ALL.get(idx) else {
                continue;
            };
            let delta = self.randomness.decrement();
            if let Some(state) = stations.get_mut(station) {
                state.load = (state.load - delta).max(0);
            }
        }
    }

    /// 一次路径规划的完整负载扰动（路径增量 + 环境衰减）
    pub fn record_route_usage(&self, path: &[Station]) {
        self.apply_path_usage(path);
        self.apply_ambient_decay();
        debug!(stations = path.len(), "设施负载已更新");
    }

    /// 更新运行状态
    ///
    /// - 停机: 负载强制为 100
    /// - 恢复: 负载重置为 recovered_load
    pub fn set_operational(&self, station: Station, operational: bool, recovered_load: i32) {
        let mut stations = self.lock();
        let entry = stations
            .entry(station)
            .or_insert(StationState { load: 0, operational: true });
        entry.operational = operational;
        entry.load = if operational {
            recovered_load.clamp(0, MAX_LOAD)
        } else {
            MAX_LOAD
        };

        if operational {
            info!(station = %station, load = entry.load, "设施恢复运行");
        } else {
            warn!(station = %station, "设施停机");
        }
    }

    pub fn load_snapshot(&self) -> HashMap<Station, i32> {
        self.lock().iter().map(|(s, st)| (*s, st.load)).collect()
    }

    pub fn operational_snapshot(&self) -> HashMap<Station, bool> {
        self.lock().iter().map(|(s, st)| (*s, st.operational)).collect()
    }

    /// 全部设施（按设施清单顺序）
    pub fn all_facilities(&self) -> Vec<FacilityStatus> {
        let stations = self.lock();
        Station::ALL
            .iter()
            .map(|s| {
                let state = stations
                    .get(s)
                    .copied()
                    .unwrap_or(StationState { load: 0, operational: true });
                FacilityStatus {
                    station: *s,
                    load: state.load,
                    operational: state.operational,
                    nominal_minutes: s.nominal_minutes(),
                }
            })
            .collect()
    }
}
