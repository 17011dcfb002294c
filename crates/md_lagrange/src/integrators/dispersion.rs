// crates/md_lagrange/src/integrators/dispersion.rs

//! 湍流扩散
//!
//! 水平方向采用 Monin-Obukhov 尺度的随机游走；垂向采用 Visser (1997)
//! 随机位移模型，含扩散系数梯度修正并在 `0` 与 `nz-1` 处镜面反射。
//! 逆向模拟中扩散项同样使用 `|dt|`。

use rand::Rng;

use md_grid::{Displacement, GridCoord, GridProvider};

use crate::rng::symmetric_unit;

/// 水平随机位移
///
/// `d = R·sqrt(2|dt|)·ε^(1/6)·L^(-1/3)`，`R ∈ [-1, 1)`，两个方向共用一次抽样。
pub fn horizontal_dispersion<R: Rng + ?Sized>(
    grid: &dyn GridProvider,
    p: &GridCoord,
    dt: f64,
    epsilon: f64,
    rng: &mut R,
) -> Displacement {
    let i = p.x.round() as isize;
    let j = p.y.round() as isize;
    let r = symmetric_unit(rng);
    let base = r * (2.0 * dt.abs()).sqrt() * epsilon.powf(1.0 / 6.0);
    let dx = base * grid.dxi(j, i).powf(-1.0 / 3.0);
    let dy = base * grid.deta(j, i).powf(-1.0 / 3.0);
    Displacement::new(dx, dy, p.z.map(|_| 0.0))
}

/// 垂向随机位移（网格索引单位），二维返回 `None`
///
/// `dz = K'|dt| + R·sqrt(6·K(z + ½K'|dt|)·|dt|)`，再除以层厚。
/// 扩散系数梯度由相邻半层的中心差分得到。场值无效时不做垂向扩散。
pub fn vertical_dispersion<R: Rng + ?Sized>(
    grid: &dyn GridProvider,
    field: &str,
    p: &GridCoord,
    time: f64,
    dt: f64,
    rng: &mut R,
) -> Option<f64> {
    let z = p.z?;
    let nz = grid.nz()?;
    let top = (nz - 1) as f64;
    let dt = dt.abs();

    let hz = grid.cell_thickness(p.x, p.y, z);
    let at = |zz: f64| grid.sample(field, &GridCoord::new_3d(p.x, p.y, zz.clamp(0.0, top)), time);

    let (lo, hi) = ((z - 0.5).max(0.0), (z + 0.5).min(top));
    let dk = if hi > lo { (at(hi) - at(lo)) / (hi - lo) / hz } else { 0.0 };
    let k = at(z + 0.5 * dk * dt / hz).max(0.0);

    let r = symmetric_unit(rng);
    let raw = (dk * dt + r * (6.0 * k * dt).sqrt()) / hz;
    if !raw.is_finite() {
        return Some(0.0);
    }
    Some(reflect_vertical(z, raw, nz))
}

/// 在 `0` 与 `nz-1` 处镜面反射垂向位移
///
/// 依据反射前的目标位置 `z + raw_dz` 判断。
pub fn reflect_vertical(z: f64, raw_dz: f64, nz: usize) -> f64 {
    let top = (nz - 1) as f64;
    let target = z + raw_dz;
    if target < 0.0 {
        -(2.0 * z + raw_dz)
    } else if target >= top {
        2.0 * (top - z) - raw_dz
    } else {
        raw_dz
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rng::particle_rng;
    use md_grid::{names, Dataset, RectilinearBuilder, Staggering};

    fn dataset_3d(kv: impl Fn(usize) -> f64 + Send + Sync + 'static) -> Dataset {
        let mut ds = RectilinearBuilder::new(8, 8)
            .layers(10)
            .depth(100.0)
            .records(0.0, 1000.0, 2)
            .field_fn(names::AKT, Staggering::W, move |_, k, _, _| kv(k))
            .build()
            .unwrap();
        ds.require(names::AKT).unwrap();
        ds.setup(0.0, false).unwrap();
        ds
    }

    #[test]
    fn test_reflection_at_zero() {
        let dz = reflect_vertical(0.3, -1.0, 10);
        assert!((0.3 + dz - 0.7).abs() < 1e-12);
    }

    #[test]
    fn test_reflection_at_top() {
        let dz = reflect_vertical(8.5, 1.0, 10);
        // 9.5 关于 9 镜像为 8.5
        assert!((8.5 + dz - 8.5).abs() < 1e-12);
        assert!((reflect_vertical(5.0, 1.0, 10) - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_horizontal_scaling() {
        let ds = RectilinearBuilder::new(8, 8).cell_size(1000.0).build().unwrap();
        let p = GridCoord::new_2d(3.0, 3.0);
        let mut a = particle_rng(3, 0);
        let mut b = particle_rng(3, 0);
        let r = symmetric_unit(&mut b);
        let d = horizontal_dispersion(&ds, &p, 3600.0, 1e-9, &mut a);
        let expected = r * (7200.0_f64).sqrt() * 1e-9_f64.powf(1.0 / 6.0) * 1000.0_f64.powf(-1.0 / 3.0);
        assert!((d.dx() - expected).abs() < 1e-12);
        assert!((d.dy() - expected).abs() < 1e-12);
        assert!(d.vertical.is_none());
    }

    #[test]
    fn test_horizontal_backward_uses_abs_dt() {
        let ds = RectilinearBuilder::new(8, 8).build().unwrap();
        let p = GridCoord::new_2d(3.0, 3.0);
        let f = horizontal_dispersion(&ds, &p, 100.0, 1e-6, &mut particle_rng(9, 2));
        let b = horizontal_dispersion(&ds, &p, -100.0, 1e-6, &mut particle_rng(9, 2));
        assert!((f.dx() - b.dx()).abs() < 1e-15);
    }

    #[test]
    fn test_vertical_2d_is_none() {
        let ds = RectilinearBuilder::new(8, 8).build().unwrap();
        let d = vertical_dispersion(&ds, names::AKT, &GridCoord::new_2d(3.0, 3.0), 0.0, 60.0, &mut particle_rng(1, 0));
        assert!(d.is_none());
    }

    #[test]
    fn test_vertical_zero_diffusivity_no_motion() {
        let ds = dataset_3d(|_| 0.0);
        let d = vertical_dispersion(&ds, names::AKT, &GridCoord::new_3d(3.0, 3.0, 4.0), 0.0, 60.0, &mut particle_rng(1, 0));
        assert!(d.unwrap().abs() < 1e-15);
    }

    #[test]
    fn test_vertical_drift_follows_gradient() {
        // w 层 k 上 K = 1e-4·k，即 z 处 K = 1e-4·(z + 0.5)，层厚 10 m
        let ds = dataset_3d(|k| 1e-4 * k as f64);
        let p = GridCoord::new_3d(3.0, 3.0, 4.0);
        let mut rng = particle_rng(5, 0);
        let r = symmetric_unit(&mut rng.clone());
        let dz = vertical_dispersion(&ds, names::AKT, &p, 0.0, 10.0, &mut rng).unwrap();

        let dk = 1e-5;
        let k = 1e-4 * (4.5 + 0.5 * dk * 10.0 / 10.0);
        let expected = (dk * 10.0 + r * (6.0 * k * 10.0_f64).sqrt()) / 10.0;
        assert!((dz - expected).abs() < 1e-12);
    }

    #[test]
    fn test_vertical_stays_in_column() {
        let ds = dataset_3d(|_| 1e-2);
        let mut rng = particle_rng(11, 0);
        for z in [0.05, 4.5, 8.95] {
            for _ in 0..200 {
                let dz = vertical_dispersion(&ds, names::AKT, &GridCoord::new_3d(3.0, 3.0, z), 0.0, 600.0, &mut rng).unwrap();
                let nz = z + dz;
                assert!((-1e-9..=9.0 + 1e-9).contains(&nz), "z={z} dz={dz}");
            }
        }
    }
}
