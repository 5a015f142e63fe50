//! # config 命令实现
//!
//! 管理持久化的会话参数文件。
//!
//! ## 功能
//! - `show`: 表格列出全部键、当前值与默认值（-121 标注为不限制）
//! - `set`: 校验并写入一个键
//! - `reset`: 恢复默认
//! - `pick-sector`: 由四个像素点计算扇区角度与半径并保存
//!
//! ## 依赖关系
//! - 使用 `cli/config.rs` 定义的参数
//! - 使用 `settings.rs`, `models/sector.rs`

use crate::cli::config::{ConfigArgs, ConfigCommands};
use crate::error::{Result, WaxsError};
use crate::models::SectorSelection;
use crate::settings::{SessionSettings, UNBOUNDED_SENTINEL};
use crate::utils::args::PointArg;
use crate::utils::output;

use std::path::Path;
use tabled::{Table, Tabled};

/// 设置表行
#[derive(Debug, Clone, Tabled)]
struct SettingRow {
    #[tabled(rename = "Key")]
    key: &'static str,
    #[tabled(rename = "Value")]
    value: String,
    #[tabled(rename = "Default")]
    default: &'static str,
}

/// 执行 config 命令
pub fn execute(args: ConfigArgs, settings_path: &Path) -> Result<()> {
    match args.command {
        ConfigCommands::Show => show(settings_path),
        ConfigCommands::Set { key, value } => {
            let mut settings = SessionSettings::load(settings_path)?;
            settings.set(&key, &value)?;
            settings.save(settings_path)?;
            output::print_success(&format!("{} = {}", key, value.trim()));
            Ok(())
        }
        ConfigCommands::Reset => {
            let mut settings = SessionSettings::load(settings_path)?;
            settings.reset();
            settings.save(settings_path)?;
            output::print_success(&format!(
                "Settings in {} reset to defaults",
                settings_path.display()
            ));
            Ok(())
        }
        ConfigCommands::PickSector { points } => {
            let sector = pick_sector(settings_path, &points)?;
            output::print_success(&format!(
                "Sector {}° → {}°, radii {} → {} px",
                sector.start_angle, sector.end_angle, sector.inner_radius, sector.outer_radius
            ));
            Ok(())
        }
    }
}

fn show(settings_path: &Path) -> Result<()> {
    let settings = SessionSettings::load(settings_path)?;
    let rows: Vec<SettingRow> = settings
        .entries()
        .map(|(key, value, default)| SettingRow {
            key,
            value: describe(value),
            default,
        })
        .collect();

    output::print_header(&format!("Settings ({})", settings_path.display()));
    println!("{}", Table::new(&rows));
    if !settings_path.exists() {
        output::print_info("File does not exist yet; showing defaults");
    }
    Ok(())
}

fn describe(value: &str) -> String {
    match value.trim().parse::<f64>() {
        Ok(v) if v == UNBOUNDED_SENTINEL => format!("{} (unbounded)", value),
        _ => value.to_string(),
    }
}

/// 以设置中的光束中心计算扇区并保存
fn pick_sector(settings_path: &Path, points: &[PointArg]) -> Result<SectorSelection> {
    let points: [PointArg; 4] = points.try_into().map_err(|_| {
        WaxsError::Validation(format!(
            "pick-sector needs exactly 4 points, got {}",
            points.len()
        ))
    })?;

    let mut settings = SessionSettings::load(settings_path)?;
    let geometry = settings.geometry();
    let sector = SectorSelection::from_points(
        (geometry.center_x, geometry.center_y),
        points.map(|p| p.as_tuple()),
    )?;
    settings.set_sector(&sector)?;
    settings.save(settings_path)?;
    Ok(sector)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pick_sector_saves_angles_and_radii() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("waxskit.json");
        let mut settings = SessionSettings::default();
        settings.set("x_Center", "100").unwrap();
        settings.set("y_Center", "100").unwrap();
        settings.save(&path).unwrap();

        let points = [
            PointArg(150.0, 100.0),
            PointArg(100.0, 150.0),
            PointArg(110.0, 100.0),
            PointArg(100.0, 180.0),
        ];
        let sector = pick_sector(&path, &points).unwrap();
        assert_eq!((sector.start_angle, sector.end_angle), (0.0, 90.0));
        assert_eq!((sector.inner_radius, sector.outer_radius), (10.0, 80.0));

        let reloaded = SessionSettings::load(&path).unwrap();
        let stored = reloaded.sector().unwrap();
        assert_eq!(stored.end_angle, 90.0);
        assert_eq!(stored.outer_radius, 80.0);
    }

    #[test]
    fn test_pick_sector_rejects_inverted_radii() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("waxskit.json");
        let points = [
            PointArg(10.0, 0.0),
            PointArg(0.0, 10.0),
            PointArg(50.0, 0.0),
            PointArg(5.0, 0.0),
        ];
        assert!(pick_sector(&path, &points).unwrap_err().is_validation());
        assert!(!path.exists());
    }

    #[test]
    fn test_describe_marks_sentinel() {
        assert_eq!(describe("-121"), "-121 (unbounded)");
        assert_eq!(describe("0.5"), "0.5");
    }
}
