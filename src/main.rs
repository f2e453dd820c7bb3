// ==========================================
// 货物装箱与路径决策引擎 - 命令行入口
// ==========================================
// 用法:
//   freight-routing import <csv_path>   批量入库
//   freight-routing demo                演示一次完整入库流程
//   freight-routing facilities          打印设施负载与运行状态
// 数据库路径: FREIGHT_ROUTING_DB_PATH 或用户数据目录
// ==========================================

use std::path::Path;

use anyhow::{anyhow, Context, Result};
use freight_routing::app::{get_default_db_path, AppState};
use freight_routing::{logging, ContainerSpec, ItemRegistration, Station};

fn main() -> Result<()> {
    logging::init();

    let mut args = std::env::args().skip(1);
    let command = args.next().unwrap_or_else(|| "facilities".to_string());

    tracing::info!("{} v{}", freight_routing::APP_NAME, freight_routing::VERSION);
    let db_path = get_default_db_path();
    tracing::info!("使用数据库: {}", db_path);

    let state = AppState::new(db_path).map_err(|e| anyhow!(e))?;

    match command.as_str() {
        "import" => {
            let path = args.next().context("缺少 CSV 文件路径")?;
            run_import(&state, Path::new(&path))
        }
        "demo" => run_demo(&state),
        "facilities" => {
            print_facilities(&state);
            Ok(())
        }
        other => Err(anyhow!("未知命令: {} (可用: import / demo / facilities)", other)),
    }
}

fn run_import(state: &AppState, path: &Path) -> Result<()> {
    let report = state.intake_api.import_csv(path)?;

    println!(
        "processed={} placed={} failures={}",
        report.processed.len(),
        report.placed_count(),
        report.failures.len()
    );
    for failure in &report.failures {
        println!("  row {}: {}", failure.row, failure.reason);
    }
    Ok(())
}

fn run_demo(state: &AppState) -> Result<()> {
    for destination in ["New York", "Seattle"] {
        let container = state.container_api.create_container(ContainerSpec {
            container_number: None,
            destination: destination.to_string(),
            max_weight: 1_000.0,
            max_volume: 30.0,
        })?;
        println!("container {} -> {}", container.container_number, destination);
    }

    let outcome = state.intake_api.process_registration(ItemRegistration {
        tracking_id: None,
        description: "Demo parcel".to_string(),
        weight: 25.0,
        length: 1.2,
        width: 0.8,
        height: 0.6,
        destination: "New York".to_string(),
        priority: Some(2),
    })?;

    println!(
        "item {} route [{}] eta {:.1} min container {}",
        outcome.item.tracking_id,
        outcome
            .route
            .steps
            .iter()
            .map(Station::as_str)
            .collect::<Vec<_>>()
            .join(" -> "),
        outcome.route.estimated_time_minutes,
        outcome.container_id.as_deref().unwrap_or("-")
    );

    if let Some(next) = outcome.route.next_step() {
        let route = state
            .routing_api
            .update_route_step(&outcome.route.route_id, next)?;
        println!(
            "route {} at {} ({:.0}%)",
            route.route_id,
            route.current_step,
            route.progress_percentage()
        );
    }

    print_facilities(state);
    Ok(())
}

fn print_facilities(state: &AppState) {
    for facility in state.routing_api.all_facilities() {
        println!(
            "{:<22} load={:>3} operational={}",
            facility.station.as_str(),
            facility.load,
            facility.operational
        );
    }
}
