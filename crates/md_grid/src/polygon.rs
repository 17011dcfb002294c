// crates/md_grid/src/polygon.rs

//! 多边形点包含测试（交叉数法）与包围盒

use glam::DVec2;

/// 判断点是否位于多边形内（含顶点）
///
/// 多边形首尾自动闭合。竖直边不参与计数；每条非竖直边按方向给出 0 或 ±2 的交叉贡献，
/// 恰落在顶点正下方时给出 ±1。
pub fn contains(polygon: &[DVec2], p: DVec2) -> bool {
    let n = polygon.len();
    if n < 3 {
        return false;
    }

    let mut crossings: i32 = 0;
    for k in 0..n {
        let a = polygon[k];
        let b = polygon[(k + 1) % n];
        if a == p {
            return true;
        }
        if a.x == b.x {
            continue;
        }

        let dx1 = p.x - a.x;
        let dx2 = b.x - p.x;
        let dxy = dx2 * (p.y - a.y) - dx1 * (b.y - p.y);

        let inc = if (dx1 == 0.0 && p.y >= a.y) || (dx2 == 0.0 && p.y >= b.y) {
            1
        } else if dx1 * dx2 > 0.0 && (b.x - a.x) * dxy >= 0.0 {
            2
        } else {
            0
        };

        if b.x > a.x {
            crossings += inc;
        } else {
            crossings -= inc;
        }
    }
    crossings != 0
}

/// 轴对齐包围盒 (min, max)
pub fn bounds(polygon: &[DVec2]) -> Option<(DVec2, DVec2)> {
    let first = *polygon.first()?;
    Some(polygon.iter().skip(1).fold((first, first), |(lo, hi), p| (lo.min(*p), hi.max(*p))))
}

/// 多边形面积（鞋带公式，取绝对值）
pub fn area(polygon: &[DVec2]) -> f64 {
    let n = polygon.len();
    if n < 3 {
        return 0.0;
    }
    let twice: f64 = (0..n)
        .map(|k| {
            let a = polygon[k];
            let b = polygon[(k + 1) % n];
            a.perp_dot(b)
        })
        .sum();
    0.5 * twice.abs()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn square() -> Vec<DVec2> {
        vec![
            DVec2::new(0.0, 0.0),
            DVec2::new(1.0, 0.0),
            DVec2::new(1.0, 1.0),
            DVec2::new(0.0, 1.0),
        ]
    }

    #[test]
    fn test_inside_and_outside() {
        let sq = square();
        assert!(contains(&sq, DVec2::new(0.5, 0.5)));
        assert!(!contains(&sq, DVec2::new(0.5, 2.0)));
        assert!(!contains(&sq, DVec2::new(-0.5, 0.5)));
        assert!(!contains(&sq, DVec2::new(1.5, 0.5)));
        assert!(!contains(&sq, DVec2::new(0.5, -0.1)));
    }

    #[test]
    fn test_vertex_counts_as_inside() {
        assert!(contains(&square(), DVec2::new(1.0, 1.0)));
    }

    #[test]
    fn test_orientation_independent() {
        let mut sq = square();
        sq.reverse();
        assert!(contains(&sq, DVec2::new(0.25, 0.75)));
        assert!(!contains(&sq, DVec2::new(2.0, 0.75)));
    }

    #[test]
    fn test_concave_polygon() {
        // U 形：凹口处不在内部
        let u = vec![
            DVec2::new(0.0, 0.0),
            DVec2::new(3.0, 0.0),
            DVec2::new(3.0, 3.0),
            DVec2::new(2.0, 3.0),
            DVec2::new(2.0, 1.0),
            DVec2::new(1.0, 1.0),
            DVec2::new(1.0, 3.0),
            DVec2::new(0.0, 3.0),
        ];
        assert!(contains(&u, DVec2::new(0.5, 2.0)));
        assert!(contains(&u, DVec2::new(2.5, 2.0)));
        assert!(!contains(&u, DVec2::new(1.5, 2.0)));
        assert!(contains(&u, DVec2::new(1.5, 0.5)));
    }

    #[test]
    fn test_bounds_and_area() {
        let (lo, hi) = bounds(&square()).unwrap();
        assert_eq!(lo, DVec2::ZERO);
        assert_eq!(hi, DVec2::ONE);
        assert!((area(&square()) - 1.0).abs() < 1e-12);
        assert!(bounds(&[]).is_none());
    }
}
