// ==========================================
// 货物装箱与路径决策引擎 - 应用状态
// ==========================================
// 职责: 管理应用级别的共享状态和API实例
// 说明: 所有仓储共享同一个 SQLite 连接；设施负载仅驻留内存
// ==========================================

use std::sync::{Arc, Mutex};

use crate::api::{ContainerApi, IntakeApi, ItemApi, RoutingApi};
use crate::config::ConfigManager;
use crate::db::open_sqlite_connection;
use crate::engine::{
    ContainerOptimizer, FacilityNetwork, LoadRandomness, OptionalEventPublisher, RoutePlanner,
    SeededRandomness, StatusEventPublisher,
};
use crate::repository::{ContainerRepository, ItemRepository, RouteRepository};

/// 应用状态
///
/// 包含所有API实例和共享资源
pub struct AppState {
    /// 数据库路径
    pub db_path: String,

    pub item_api: Arc<ItemApi>,
    pub container_api: Arc<ContainerApi>,
    pub routing_api: Arc<RoutingApi>,
    pub intake_api: Arc<IntakeApi>,

    /// 配置管理器
    pub config_manager: Arc<ConfigManager>,

    /// 共享设施状态
    pub facility_network: Arc<FacilityNetwork>,
}

impl AppState {
    /// 创建新的AppState实例（不发布状态事件）
    ///
    /// # 参数
    /// - db_path: 数据库文件路径
    pub fn new(db_path: String) -> Result<Self, String> {
        Self::with_events(db_path, OptionalEventPublisher::none())
    }

    /// 创建带事件发布者的AppState实例
    pub fn with_publisher(
        db_path: String,
        publisher: Arc<dyn StatusEventPublisher>,
    ) -> Result<Self, String> {
        Self::with_events(db_path, OptionalEventPublisher::with_publisher(publisher))
    }

    fn with_events(db_path: String, events: OptionalEventPublisher) -> Result<Self, String> {
        tracing::info!("初始化AppState，数据库路径: {}", db_path);

        let conn = open_sqlite_connection(&db_path)
            .map_err(|e| format!("无法打开数据库连接: {}", e))?;
        let conn = Arc::new(Mutex::new(conn));

        // ==========================================
        // 初始化Repository层
        // ==========================================
        let item_repo = Arc::new(
            ItemRepository::from_connection(conn.clone())
                .map_err(|e| format!("无法创建ItemRepository: {}", e))?,
        );
        let container_repo = Arc::new(
            ContainerRepository::from_connection(conn.clone())
                .map_err(|e| format!("无法创建ContainerRepository: {}", e))?,
        );
        let route_repo = Arc::new(
            RouteRepository::from_connection(conn.clone())
                .map_err(|e| format!("无法创建RouteRepository: {}", e))?,
        );

        // ==========================================
        // 初始化Engine层
        // ==========================================
        let config_manager = Arc::new(
            ConfigManager::from_connection(conn)
                .map_err(|e| format!("无法创建ConfigManager: {}", e))?,
        );

        let randomness: Arc<dyn LoadRandomness> = match config_manager
            .get_facility_seed()
            .map_err(|e| format!("读取facility_seed失败: {}", e))?
        {
            Some(seed) => {
                tracing::info!(seed, "设施负载使用固定随机种子");
                Arc::new(SeededRandomness::from_seed(seed))
            }
            None => Arc::new(SeededRandomness::from_entropy()),
        };
        let facility_network = Arc::new(FacilityNetwork::new(randomness));

        let routing_config = config_manager
            .get_routing_config()
            .map_err(|e| format!("读取路径规划配置失败: {}", e))?;
        let planner = Arc::new(RoutePlanner::new(facility_network.clone(), routing_config));

        // ==========================================
        // 初始化API层
        // ==========================================
        let item_api = Arc::new(ItemApi::new(item_repo, events.clone()));
        let container_api = Arc::new(ContainerApi::new(
            container_repo,
            config_manager.clone(),
            ContainerOptimizer::default(),
            events.clone(),
        ));
        let routing_api = Arc::new(RoutingApi::new(route_repo, planner, events));
        let intake_api = Arc::new(IntakeApi::new(
            item_api.clone(),
            routing_api.clone(),
            container_api.clone(),
        ));

        tracing::info!("AppState初始化完成");

        Ok(Self {
            db_path,
            item_api,
            container_api,
            routing_api,
            intake_api,
            config_manager,
            facility_network,
        })
    }
}

/// 获取默认数据库路径
///
/// 优先级: FREIGHT_ROUTING_DB_PATH → 用户数据目录 → ./freight_routing.db
pub fn get_default_db_path() -> String {
    use std::path::PathBuf;

    if let Ok(path) = std::env::var("FREIGHT_ROUTING_DB_PATH") {
        let trimmed = path.trim();
        if !trimmed.is_empty() {
            return trimmed.to_string();
        }
    }

    let mut path = PathBuf::from("./freight_routing.db");

    if let Some(data_dir) = dirs::data_dir() {
        // 开发环境使用独立目录，避免污染生产数据
        #[cfg(debug_assertions)]
        let dir = data_dir.join("freight-routing-dev");

        #[cfg(not(debug_assertions))]
        let dir = data_dir.join("freight-routing");

        if std::fs::create_dir_all(&dir).is_ok() {
            path = dir.join("freight_routing.db");
        }
    }

    path.to_string_lossy().to_string()
}
