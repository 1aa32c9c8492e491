//! Unit tests for nav-core primitives.

#[cfg(test)]
mod ids {
    use crate::{CellId, ObjectId, RegionKey};

    #[test]
    fn region_masks_low_half() {
        assert_eq!(CellId(0x0001_0123).region(), RegionKey::new(0x0001_0000));
        assert_eq!(CellId(0xA9B4_0021).region().raw(), 0xA9B4_0000);
        assert_eq!(CellId(0xA9B4_0021).cell_index(), 0x21);
    }

    #[test]
    fn region_from_landblock() {
        assert_eq!(RegionKey::from_landblock(0xA9B4), RegionKey::new(0xA9B4_FFFF));
    }

    #[test]
    fn file_stem_is_upper_hex() {
        assert_eq!(RegionKey::new(0x00ab_0000).file_stem(), "00AB0000");
    }

    #[test]
    fn object_id_display_and_sentinel() {
        assert_eq!(ObjectId(7).to_string(), "ObjectId(7)");
        assert_eq!(ObjectId::default(), ObjectId::INVALID);
        assert_eq!(ObjectId::try_from(12usize).unwrap(), ObjectId(12));
    }
}

#[cfg(test)]
mod geo {
    use std::f32::consts::FRAC_PI_2;

    use crate::{CellId, Position, Vec3};

    #[test]
    fn planar_distance_ignores_height() {
        let a = Vec3::new(0.0, 0.0, 0.0);
        let b = Vec3::new(3.0, 4.0, 100.0);
        assert_eq!(a.distance_2d_squared(b), 25.0);
    }

    #[test]
    fn in_front_of_follows_heading() {
        let p = Position::new(CellId(0x0001_0001), Vec3::new(10.0, 10.0, 2.0));
        let north = p.in_front_of(3.0);
        assert!((north.pos.y - 13.0).abs() < 1e-5);
        assert!((north.pos.x - 10.0).abs() < 1e-5);

        let east = p.with_heading(FRAC_PI_2).in_front_of(3.0);
        assert!((east.pos.x - 13.0).abs() < 1e-5);
        assert_eq!(east.pos.z, 2.0);
        assert_eq!(east.cell, p.cell);
    }

    #[test]
    fn heading_to_roundtrips_in_front_of() {
        let p = Position::new(CellId(1), Vec3::ZERO);
        let h = p.heading_to(Vec3::new(5.0, 5.0, 0.0));
        let step = p.with_heading(h).in_front_of(2.0_f32.sqrt());
        assert!((step.pos.x - 1.0).abs() < 1e-5);
        assert!((step.pos.y - 1.0).abs() < 1e-5);
    }

    #[test]
    fn cross_product_right_handed() {
        let x = Vec3::new(1.0, 0.0, 0.0);
        let y = Vec3::new(0.0, 1.0, 0.0);
        assert_eq!(x.cross(y), Vec3::new(0.0, 0.0, 1.0));
    }
}

#[cfg(test)]
mod time {
    use crate::SimTime;

    #[test]
    fn arithmetic() {
        let t = SimTime(10.0);
        assert_eq!(t + 1.5, SimTime(11.5));
        assert_eq!(SimTime(12.0) - t, 2.0);
        assert_eq!(SimTime(12.0).since(t), 2.0);
        assert!(SimTime(1.0) < SimTime(2.0));
    }
}

#[cfg(test)]
mod rng {
    use crate::{AgentRng, ObjectId, SimRng};

    #[test]
    fn same_seed_same_stream() {
        let mut a = AgentRng::new(42, ObjectId(3));
        let mut b = AgentRng::new(42, ObjectId(3));
        for _ in 0..16 {
            assert_eq!(a.random::<u64>(), b.random::<u64>());
        }
    }

    #[test]
    fn agents_get_distinct_streams() {
        let mut a = AgentRng::new(42, ObjectId(3));
        let mut b = AgentRng::new(42, ObjectId(4));
        assert_ne!(a.random::<u64>(), b.random::<u64>());
    }

    #[test]
    fn child_rngs_are_deterministic() {
        let mut r1 = SimRng::new(9);
        let mut r2 = SimRng::new(9);
        let mut c1 = r1.child(1);
        let mut c2 = r2.child(1);
        assert_eq!(c1.gen_range(0..1000u32), c2.gen_range(0..1000u32));
    }
}

#[cfg(test)]
mod config {
    use crate::NavConfig;

    #[test]
    fn defaults_validate() {
        NavConfig::default().validate().unwrap();
    }

    #[test]
    fn rejects_zero_interval() {
        let cfg = NavConfig { move_interval_secs: 0.0, ..NavConfig::default() };
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn rejects_detour_ring_outside_radius() {
        let cfg = NavConfig {
            detour_radius: 3.0,
            detour_min_distance_sq: 10.0,
            ..NavConfig::default()
        };
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn rejects_nan_threshold() {
        let cfg = NavConfig { reach_distance_sq: f32::NAN, ..NavConfig::default() };
        assert!(cfg.validate().is_err());
    }
}
