// ==========================================
// 货物装箱与路径决策引擎 - 领域类型定义
// ==========================================
// 职责: 状态枚举、设施站点、出库区域
// 序列化格式: SCREAMING_SNAKE_CASE (与数据库一致)
// ==========================================

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

// ==========================================
// 货物状态 (Item Status)
// ==========================================
// 严格单向链: REGISTERED → ROUTING → PROCESSING → CONTAINERIZED → SHIPPED
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ItemStatus {
    Registered,    // 已登记
    Routing,       // 路径规划中
    Processing,    // 处理中
    Containerized, // 已装箱
    Shipped,       // 已发运（终态）
}

impl ItemStatus {
    pub const ALL: [ItemStatus; 5] = [
        ItemStatus::Registered,
        ItemStatus::Routing,
        ItemStatus::Processing,
        ItemStatus::Containerized,
        ItemStatus::Shipped,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ItemStatus::Registered => "REGISTERED",
            ItemStatus::Routing => "ROUTING",
            ItemStatus::Processing => "PROCESSING",
            ItemStatus::Containerized => "CONTAINERIZED",
            ItemStatus::Shipped => "SHIPPED",
        }
    }
}

impl fmt::Display for ItemStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ItemStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_uppercase().as_str() {
            "REGISTERED" => Ok(ItemStatus::Registered),
            "ROUTING" => Ok(ItemStatus::Routing),
            "PROCESSING" => Ok(ItemStatus::Processing),
            "CONTAINERIZED" => Ok(ItemStatus::Containerized),
            "SHIPPED" => Ok(ItemStatus::Shipped),
            other => Err(format!("未知货物状态: {}", other)),
        }
    }
}

// ==========================================
// 集装箱状态 (Container Status)
// ==========================================
// 严格单向链: CREATED → LOADING → CLOSED → DISPATCHED → DELIVERED
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ContainerStatus {
    Created,    // 新建
    Loading,    // 装载中
    Closed,     // 已封箱
    Dispatched, // 已发出
    Delivered,  // 已送达（终态，不可变）
}

impl ContainerStatus {
    pub const ALL: [ContainerStatus; 5] = [
        ContainerStatus::Created,
        ContainerStatus::Loading,
        ContainerStatus::Closed,
        ContainerStatus::Dispatched,
        ContainerStatus::Delivered,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ContainerStatus::Created => "CREATED",
            ContainerStatus::Loading => "LOADING",
            ContainerStatus::Closed => "CLOSED",
            ContainerStatus::Dispatched => "DISPATCHED",
            ContainerStatus::Delivered => "DELIVERED",
        }
    }

    /// 是否允许装入/取出货物
    pub fn accepts_items(&self) -> bool {
        matches!(self, ContainerStatus::Created | ContainerStatus::Loading)
    }
}

impl fmt::Display for ContainerStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ContainerStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_uppercase().as_str() {
            "CREATED" => Ok(ContainerStatus::Created),
            "LOADING" => Ok(ContainerStatus::Loading),
            "CLOSED" => Ok(ContainerStatus::Closed),
            "DISPATCHED" => Ok(ContainerStatus::Dispatched),
            "DELIVERED" => Ok(ContainerStatus::Delivered),
            other => Err(format!("未知集装箱状态: {}", other)),
        }
    }
}

// ==========================================
// 路径状态 (Route Status)
// ==========================================
// FAILED 仅能由外部干预进入，本引擎不产生
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RouteStatus {
    Created,    // 新建
    InProgress, // 执行中
    Completed,  // 已完成
    Failed,     // 失败
}

impl RouteStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            RouteStatus::Created => "CREATED",
            RouteStatus::InProgress => "IN_PROGRESS",
            RouteStatus::Completed => "COMPLETED",
            RouteStatus::Failed => "FAILED",
        }
    }

    /// 是否为终态
    pub fn is_terminal(&self) -> bool {
        matches!(self, RouteStatus::Completed | RouteStatus::Failed)
    }
}

impl fmt::Display for RouteStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for RouteStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_uppercase().as_str() {
            "CREATED" => Ok(RouteStatus::Created),
            "IN_PROGRESS" => Ok(RouteStatus::InProgress),
            "COMPLETED" => Ok(RouteStatus::Completed),
            "FAILED" => Ok(RouteStatus::Failed),
            other => Err(format!("未知路径状态: {}", other)),
        }
    }
}

// ==========================================
// 出库区域 (Region)
// ==========================================
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Region {
    North,
    South,
    East,
    West,
}

impl Region {
    pub fn as_str(&self) -> &'static str {
        match self {
            Region::North => "NORTH",
            Region::South => "SOUTH",
            Region::East => "EAST",
            Region::West => "WEST",
        }
    }

    /// 区域对应的出库站点
    pub fn outbound_dock(&self) -> Station {
        match self {
            Region::North => Station::OutboundDockNorth,
            Region::South => Station::OutboundDockSouth,
            Region::East => Station::OutboundDockEast,
            Region::West => Station::OutboundDockWest,
        }
    }
}

impl fmt::Display for Region {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ==========================================
// 设施站点 (Station)
// ==========================================
// 固定拓扑:
// INBOUND_DOCK → SCANNER_STATION → {SORTING_AREA_A | SORTING_AREA_B}
//   → PACKAGING_AREA → CONTAINER_LOADING → OUTBOUND_DOCK_{区域}
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Station {
    InboundDock,
    ScannerStation,
    SortingAreaA,
    SortingAreaB,
    PackagingArea,
    ContainerLoading,
    OutboundDockNorth,
    OutboundDockSouth,
    OutboundDockEast,
    OutboundDockWest,
}

impl Station {
    /// 全部设施（顺序即设施清单顺序）
    pub const ALL: [Station; 10] = [
        Station::InboundDock,
        Station::ScannerStation,
        Station::SortingAreaA,
        Station::SortingAreaB,
        Station::PackagingArea,
        Station::ContainerLoading,
        Station::OutboundDockNorth,
        Station::OutboundDockSouth,
        Station::OutboundDockEast,
        Station::OutboundDockWest,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Station::InboundDock => "INBOUND_DOCK",
            Station::ScannerStation => "SCANNER_STATION",
            Station::SortingAreaA => "SORTING_AREA_A",
            Station::SortingAreaB => "SORTING_AREA_B",
            Station::PackagingArea => "PACKAGING_AREA",
            Station::ContainerLoading => "CONTAINER_LOADING",
            Station::OutboundDockNorth => "OUTBOUND_DOCK_NORTH",
            Station::OutboundDockSouth => "OUTBOUND_DOCK_SOUTH",
            Station::OutboundDockEast => "OUTBOUND_DOCK_EAST",
            Station::OutboundDockWest => "OUTBOUND_DOCK_WEST",
        }
    }

    /// 额定处理时长（分钟）
    pub fn nominal_minutes(&self) -> f64 {
        match self {
            Station::InboundDock => 5.0,
            Station::ScannerStation => 2.0,
            Station::SortingAreaA => 8.0,
            Station::SortingAreaB => 10.0,
            Station::PackagingArea => 15.0,
            Station::ContainerLoading => 12.0,
            Station::OutboundDockNorth
            | Station::OutboundDockSouth
            | Station::OutboundDockEast
            | Station::OutboundDockWest => 7.0,
        }
    }

    pub fn is_sorting_area(&self) -> bool {
        matches!(self, Station::SortingAreaA | Station::SortingAreaB)
    }
}

impl fmt::Display for Station {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Station {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_uppercase();
        Station::ALL
            .iter()
            .copied()
            .find(|station| station.as_str() == normalized)
            .ok_or_else(|| format!("未知设施站点: {}", s))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_station_round_trip_names() {
        assert_eq!("sorting_area_b".parse::<Station>(), Ok(Station::SortingAreaB));
        assert_eq!(Station::OutboundDockWest.to_string(), "OUTBOUND_DOCK_WEST");
        assert!("LOADING_BAY".parse::<Station>().is_err());
    }

    #[test]
    fn test_region_outbound_dock() {
        assert_eq!(Region::East.outbound_dock(), Station::OutboundDockEast);
        assert_eq!(Region::South.outbound_dock(), Station::OutboundDockSouth);
    }

    #[test]
    fn test_container_accepts_items_only_while_open() {
        assert!(ContainerStatus::Created.accepts_items());
        assert!(ContainerStatus::Loading.accepts_items());
        assert!(!ContainerStatus::Closed.accepts_items());
        assert!(!ContainerStatus::Delivered.accepts_items());
    }
}
