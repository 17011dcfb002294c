// crates/md_lagrange/src/zone.rs

//! 区域
//!
//! 配置中的多边形以经纬度给出，装配时投影到网格坐标，此后所有判定都在
//! 网格坐标中完成。投放区、补充区与定向区各自独立编号（从 0 开始）。

use glam::DVec2;

use md_config::{ConfigError, ZoneConfig, ZoneKind};
use md_grid::{polygon, GeoCoord, GridCoord, GridProvider};

use crate::error::SimResult;

/// 网格坐标中的区域
#[derive(Debug, Clone)]
pub struct Zone {
    kind: ZoneKind,
    index: usize,
    name: String,
    polygon: Vec<DVec2>,
    lower: DVec2,
    upper: DVec2,
    depth_range: Option<[f64; 2]>,
}

impl Zone {
    /// 由配置投影到网格坐标；任一顶点位于网格外即为配置错误
    pub fn from_config(cfg: &ZoneConfig, index: usize, grid: &dyn GridProvider) -> SimResult<Self> {
        let mut polygon = Vec::with_capacity(cfg.polygon.len());
        for [lon, lat] in &cfg.polygon {
            let p = grid
                .geo_to_grid(&GeoCoord::new(*lon, *lat, None))
                .ok_or_else(|| ConfigError::invalid("zones.polygon", format!("[{lon}, {lat}]"), "区域顶点位于网格外"))?;
            polygon.push(p.horizontal());
        }
        Self::new(cfg.kind, index, cfg.name.clone(), polygon, cfg.depth_range)
    }

    /// 直接由网格坐标多边形构造
    pub fn new(
        kind: ZoneKind,
        index: usize,
        name: impl Into<String>,
        polygon: Vec<DVec2>,
        depth_range: Option<[f64; 2]>,
    ) -> SimResult<Self> {
        let (lower, upper) = polygon::bounds(&polygon)
            .ok_or_else(|| ConfigError::invalid("zones.polygon", polygon.len(), "多边形为空"))?;
        Ok(Self {
            kind,
            index,
            name: name.into(),
            polygon,
            lower,
            upper,
            depth_range,
        })
    }

    /// 用途
    pub fn kind(&self) -> ZoneKind {
        self.kind
    }

    /// 同类区域中的序号
    pub fn index(&self) -> usize {
        self.index
    }

    /// 名称
    pub fn name(&self) -> &str {
        &self.name
    }

    /// 网格坐标多边形
    pub fn polygon(&self) -> &[DVec2] {
        &self.polygon
    }

    /// 外包框 (min, max)
    pub fn bounds(&self) -> (DVec2, DVec2) {
        (self.lower, self.upper)
    }

    /// 深度范围 [min, max]
    pub fn depth_range(&self) -> Option<[f64; 2]> {
        self.depth_range
    }

    /// 网格面积（格点单位²）
    pub fn area(&self) -> f64 {
        polygon::area(&self.polygon)
    }

    /// 水平位置是否在区内
    pub fn contains(&self, p: &GridCoord) -> bool {
        polygon::contains(&self.polygon, p.horizontal())
    }

    /// 水平位置在区内，且深度（如有）落在深度范围内
    pub fn contains_at_depth(&self, p: &GridCoord, depth: Option<f64>) -> bool {
        if !self.contains(p) {
            return false;
        }
        match (self.depth_range, depth) {
            (Some([lo, hi]), Some(d)) => d >= lo && d <= hi,
            _ => true,
        }
    }
}

/// 按用途分组的区域集合
#[derive(Debug, Clone, Default)]
pub struct ZoneSet {
    release: Vec<Zone>,
    recruitment: Vec<Zone>,
    orientation: Vec<Zone>,
}

impl ZoneSet {
    /// 投影全部配置区域
    pub fn from_config(zones: &[ZoneConfig], grid: &dyn GridProvider) -> SimResult<Self> {
        let mut set = Self::default();
        for cfg in zones {
            let index = set.len(cfg.kind);
            let zone = Zone::from_config(cfg, index, grid)?;
            set.push(zone);
        }
        Ok(set)
    }

    /// 追加区域，序号按同类区域重新编排
    pub fn push(&mut self, mut zone: Zone) {
        let list = self.list_mut(zone.kind);
        zone.index = list.len();
        list.push(zone);
    }

    /// 某类区域
    pub fn zones(&self, kind: ZoneKind) -> &[Zone] {
        match kind {
            ZoneKind::Release => &self.release,
            ZoneKind::Recruitment => &self.recruitment,
            ZoneKind::Orientation => &self.orientation,
        }
    }

    fn list_mut(&mut self, kind: ZoneKind) -> &mut Vec<Zone> {
        match kind {
            ZoneKind::Release => &mut self.release,
            ZoneKind::Recruitment => &mut self.recruitment,
            ZoneKind::Orientation => &mut self.orientation,
        }
    }

    /// 某类区域数量
    pub fn len(&self, kind: ZoneKind) -> usize {
        self.zones(kind).len()
    }

    /// 是否没有任何区域
    pub fn is_empty(&self) -> bool {
        self.release.is_empty() && self.recruitment.is_empty() && self.orientation.is_empty()
    }

    /// 包含该点的第一个区域序号
    pub fn locate(&self, kind: ZoneKind, p: &GridCoord, depth: Option<f64>) -> Option<usize> {
        self.zones(kind)
            .iter()
            .position(|z| z.contains_at_depth(p, depth))
    }
}

/// 投放区输出编号：1..N，无区域为 0
pub fn release_zone_number(zone: Option<usize>) -> i32 {
    zone.map_or(0, |z| z as i32 + 1)
}

/// 补充区输出编号：-1..-M，无区域为 0
pub fn recruitment_zone_number(zone: Option<usize>) -> i32 {
    zone.map_or(0, |z| -(z as i32 + 1))
}

#[cfg(test)]
mod tests {
    use super::*;
    use md_grid::RectilinearBuilder;

    fn square(x0: f64, y0: f64, s: f64) -> Vec<DVec2> {
        vec![
            DVec2::new(x0, y0),
            DVec2::new(x0 + s, y0),
            DVec2::new(x0 + s, y0 + s),
            DVec2::new(x0, y0 + s),
        ]
    }

    #[test]
    fn test_zone_membership_and_depth() {
        let z = Zone::new(ZoneKind::Recruitment, 0, "r", square(2.0, 2.0, 3.0), Some([-20.0, -5.0])).unwrap();
        let p = GridCoord::new_3d(3.0, 3.0, 1.0);
        assert!(z.contains(&p));
        assert!(z.contains_at_depth(&p, Some(-10.0)));
        assert!(!z.contains_at_depth(&p, Some(-30.0)));
        assert!(z.contains_at_depth(&p, None));
        assert!(!z.contains(&GridCoord::new_2d(6.0, 3.0)));
        assert!((z.area() - 9.0).abs() < 1e-12);
    }

    #[test]
    fn test_zone_set_indexes_per_kind() {
        let mut set = ZoneSet::default();
        set.push(Zone::new(ZoneKind::Release, 9, "a", square(0.0, 0.0, 1.0), None).unwrap());
        set.push(Zone::new(ZoneKind::Recruitment, 9, "b", square(5.0, 5.0, 1.0), None).unwrap());
        set.push(Zone::new(ZoneKind::Release, 9, "c", square(2.0, 0.0, 1.0), None).unwrap());
        assert_eq!(set.len(ZoneKind::Release), 2);
        assert_eq!(set.zones(ZoneKind::Release)[1].index(), 1);
        assert_eq!(set.locate(ZoneKind::Release, &GridCoord::new_2d(2.5, 0.5), None), Some(1));
        assert_eq!(set.locate(ZoneKind::Recruitment, &GridCoord::new_2d(2.5, 0.5), None), None);
    }

    #[test]
    fn test_zone_from_lonlat() {
        let ds = RectilinearBuilder::new(10, 10).origin(0.0, 0.0).spacing(0.1, 0.1).build().unwrap();
        let cfg = ZoneConfig {
            kind: ZoneKind::Release,
            name: "box".into(),
            polygon: vec![[0.25, 0.25], [0.45, 0.25], [0.45, 0.45], [0.25, 0.45]],
            depth_range: None,
        };
        let z = Zone::from_config(&cfg, 0, &ds).unwrap();
        let (lo, hi) = z.bounds();
        assert!((lo.x - 2.5).abs() < 1e-8 && (hi.y - 4.5).abs() < 1e-8);

        let outside = ZoneConfig {
            polygon: vec![[5.0, 5.0], [6.0, 5.0], [6.0, 6.0]],
            ..cfg
        };
        assert!(Zone::from_config(&outside, 0, &ds).is_err());
    }

    #[test]
    fn test_output_numbers() {
        assert_eq!(release_zone_number(None), 0);
        assert_eq!(release_zone_number(Some(0)), 1);
        assert_eq!(recruitment_zone_number(Some(2)), -3);
    }
}
