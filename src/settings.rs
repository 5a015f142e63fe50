//! # 会话参数持久化
//!
//! 以扁平的 键 → 字符串 JSON 对象保存实验几何、阈值、色标、坐标范围和扇区参数。
//! 每次命令读取一次，转换为不可变的参数结构后传入计算核心。
//!
//! ## 约定
//! - 文件不存在时使用默认值
//! - 无法解析的数值回退到默认值并给出警告
//! - 坐标范围中的 -121 表示不限制，只在此处与 `Option` 互相转换
//!
//! ## 依赖关系
//! - 被 `commands/` 使用
//! - 构造 `models/geometry.rs`、`models/sector.rs` 中的参数结构
//! - 使用 `serde_json` 读写

use crate::error::{Result, WaxsError};
use crate::models::{AxisLimits, ColorRange, Geometry, MaskRange, SectorSelection};

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

/// 默认配置文件名
pub const DEFAULT_SETTINGS_FILE: &str = "waxskit.json";

/// 表示“不限制”的持久化值
pub const UNBOUNDED_SENTINEL: f64 = -121.0;

/// 所有键及默认值
pub static DEFAULTS: [(&str, &str); 20] = [
    ("Angle_incidence", "0.5"),
    ("x_Center", "0"),
    ("y_Center", "0"),
    ("distance", "300"),
    ("pixel_x", "73.2"),
    ("pixel_y", "73.2"),
    ("lamda", "1.24"),
    ("Qr_min", "-121"),
    ("Qr_max", "-121"),
    ("Qz_min", "-121"),
    ("Qz_max", "-121"),
    ("threshold_min", "0"),
    ("threshold_max", "1000000"),
    ("numbin", "500"),
    ("textbox_min", "0"),
    ("textbox_max", "800"),
    ("start_angle", "-180"),
    ("end_angle", "180"),
    ("inner_radius", "0"),
    ("outer_radius", "500"),
];

/// 持久化的会话参数
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SessionSettings {
    values: BTreeMap<String, String>,
}

impl Default for SessionSettings {
    fn default() -> Self {
        Self {
            values: DEFAULTS
                .iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect(),
        }
    }
}

impl SessionSettings {
    /// 读取配置文件，缺失的键补默认值
    pub fn load(path: &Path) -> Result<Self> {
        let mut settings = Self::default();
        if !path.exists() {
            log::debug!("{} not found, using defaults", path.display());
            return Ok(settings);
        }

        let content = fs::read_to_string(path).map_err(|e| WaxsError::FileReadError {
            path: path.display().to_string(),
            source: e,
        })?;
        let stored: BTreeMap<String, String> = serde_json::from_str(&content)?;

        for (key, value) in stored {
            if default_value(&key).is_some() {
                settings.values.insert(key, value);
            } else {
                log::warn!("ignoring unknown settings key '{}'", key);
            }
        }
        Ok(settings)
    }

    /// 写回配置文件
    pub fn save(&self, path: &Path) -> Result<()> {
        let content = serde_json::to_string_pretty(self)?;
        fs::write(path, content).map_err(|e| WaxsError::FileWriteError {
            path: path.display().to_string(),
            source: e,
        })
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.values.get(key).map(String::as_str)
    }

    /// 设置一个键，值必须是合法数值
    pub fn set(&mut self, key: &str, value: &str) -> Result<()> {
        if default_value(key).is_none() {
            return Err(WaxsError::Validation(format!(
                "unknown settings key '{}'",
                key
            )));
        }
        let parsed: f64 = value.trim().parse().map_err(|_| {
            WaxsError::Validation(format!("'{}' is not a number for key '{}'", value, key))
        })?;
        if !parsed.is_finite() {
            return Err(WaxsError::Validation(format!(
                "value for '{}' must be finite",
                key
            )));
        }
        if key == "numbin" && (parsed < 1.0 || parsed.fract() != 0.0) {
            return Err(WaxsError::Validation(
                "numbin must be a positive integer".to_string(),
            ));
        }
        self.values.insert(key.to_string(), value.trim().to_string());
        Ok(())
    }

    /// 全部恢复默认
    pub fn reset(&mut self) {
        *self = Self::default();
    }

    /// (键, 当前值, 默认值)
    pub fn entries(&self) -> impl Iterator<Item = (&'static str, &str, &'static str)> + '_ {
        DEFAULTS
            .iter()
            .map(move |&(key, default)| (key, self.get(key).unwrap_or(default), default))
    }

    /// 数值型参数，无法解析时回退默认值
    pub fn number(&self, key: &str) -> f64 {
        let fallback = default_value(key)
            .and_then(|v| v.parse().ok())
            .unwrap_or(0.0);
        match self.get(key).map(|v| v.trim().parse::<f64>()) {
            Some(Ok(v)) if v.is_finite() => v,
            Some(_) => {
                log::warn!(
                    "invalid value for '{}', falling back to {}",
                    key,
                    fallback
                );
                fallback
            }
            None => fallback,
        }
    }

    pub fn geometry(&self) -> Geometry {
        Geometry::default()
            .with_incidence_angle(self.number("Angle_incidence"))
            .with_center(self.number("x_Center"), self.number("y_Center"))
            .with_distance(self.number("distance"))
            .with_pixel_size(self.number("pixel_x"), self.number("pixel_y"))
            .with_wavelength(self.number("lamda"))
    }

    pub fn mask_range(&self) -> Result<MaskRange> {
        MaskRange::new(self.number("threshold_min"), self.number("threshold_max"))
    }

    pub fn color_range(&self) -> Result<ColorRange> {
        ColorRange::new(self.number("textbox_min"), self.number("textbox_max"))
    }

    pub fn axis_limits(&self) -> AxisLimits {
        AxisLimits {
            qr_min: bound_from_setting(self.number("Qr_min")),
            qr_max: bound_from_setting(self.number("Qr_max")),
            qz_min: bound_from_setting(self.number("Qz_min")),
            qz_max: bound_from_setting(self.number("Qz_max")),
        }
    }

    pub fn num_bins(&self) -> usize {
        let n = self.number("numbin");
        if n >= 1.0 {
            n as usize
        } else {
            log::warn!("numbin {} is not positive, falling back to 500", n);
            500
        }
    }

    /// 扇区参数，中心取光束中心
    pub fn sector(&self) -> Result<SectorSelection> {
        let geometry = self.geometry();
        SectorSelection::new(
            (geometry.center_x, geometry.center_y),
            (self.number("start_angle"), self.number("end_angle")),
            (self.number("inner_radius"), self.number("outer_radius")),
        )
    }

    /// 保存扇区的角度与半径
    pub fn set_sector(&mut self, sector: &SectorSelection) -> Result<()> {
        sector.validate()?;
        self.set("start_angle", &sector.start_angle.to_string())?;
        self.set("end_angle", &sector.end_angle.to_string())?;
        self.set("inner_radius", &sector.inner_radius.to_string())?;
        self.set("outer_radius", &sector.outer_radius.to_string())?;
        Ok(())
    }

    pub fn set_axis_limits(&mut self, limits: &AxisLimits) -> Result<()> {
        self.set("Qr_min", &bound_to_setting(limits.qr_min).to_string())?;
        self.set("Qr_max", &bound_to_setting(limits.qr_max).to_string())?;
        self.set("Qz_min", &bound_to_setting(limits.qz_min).to_string())?;
        self.set("Qz_max", &bound_to_setting(limits.qz_max).to_string())?;
        Ok(())
    }
}

fn default_value(key: &str) -> Option<&'static str> {
    DEFAULTS.iter().find(|(k, _)| *k == key).map(|(_, v)| *v)
}

pub fn bound_from_setting(value: f64) -> Option<f64> {
    if value == UNBOUNDED_SENTINEL {
        None
    } else {
        Some(value)
    }
}

pub fn bound_to_setting(bound: Option<f64>) -> f64 {
    bound.unwrap_or(UNBOUNDED_SENTINEL)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let settings = SessionSettings::default();
        let geometry = settings.geometry();
        assert_eq!(geometry, Geometry::default());
        assert_eq!(settings.num_bins(), 500);
        assert_eq!(settings.axis_limits(), AxisLimits::default());
        assert_eq!(settings.mask_range().unwrap(), MaskRange::default());
        assert_eq!(settings.color_range().unwrap(), ColorRange::default());
    }

    #[test]
    fn test_sentinel_round_trip() {
        let mut settings = SessionSettings::default();
        let limits = AxisLimits {
            qr_min: Some(-2.0),
            qz_max: Some(3.5),
            ..Default::default()
        };
        settings.set_axis_limits(&limits).unwrap();
        assert_eq!(settings.get("Qr_max"), Some("-121"));
        assert_eq!(settings.axis_limits(), limits);
    }

    #[test]
    fn test_invalid_value_falls_back_to_default() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("waxskit.json");
        fs::write(&path, r#"{"distance": "abc", "lamda": "1.54", "bogus": "1"}"#).unwrap();

        let settings = SessionSettings::load(&path).unwrap();
        assert_eq!(settings.geometry().distance, 300.0);
        assert_eq!(settings.geometry().wavelength, 1.54);
        assert_eq!(settings.get("bogus"), None);
    }

    #[test]
    fn test_save_load_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("waxskit.json");

        let mut settings = SessionSettings::default();
        settings.set("x_Center", "512.5").unwrap();
        settings.set("numbin", "250").unwrap();
        settings.save(&path).unwrap();

        let loaded = SessionSettings::load(&path).unwrap();
        assert_eq!(loaded, settings);
        assert_eq!(loaded.geometry().center_x, 512.5);
        assert_eq!(loaded.num_bins(), 250);
    }

    #[test]
    fn test_set_rejects_bad_input() {
        let mut settings = SessionSettings::default();
        assert!(settings.set("nope", "1").unwrap_err().is_validation());
        assert!(settings.set("distance", "far").is_err());
        assert!(settings.set("numbin", "2.5").is_err());
        assert!(settings.set("numbin", "0").is_err());
    }

    #[test]
    fn test_sector_uses_beam_center() {
        let mut settings = SessionSettings::default();
        settings.set("x_Center", "100").unwrap();
        settings.set("y_Center", "200").unwrap();
        let sector = settings.sector().unwrap();
        assert_eq!((sector.center_x, sector.center_y), (100.0, 200.0));
        assert_eq!((sector.start_angle, sector.end_angle), (-180.0, 180.0));

        settings.set("inner_radius", "600").unwrap();
        assert!(settings.sector().is_err());
    }
}
