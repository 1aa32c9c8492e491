//! Courtyard landblock geometry.
//!
//! A 40×40 walled courtyard joined to a 16×20 outer yard through a 4-unit
//! gate passage.  Every patch is tessellated on the same 2-unit grid so the
//! patches share edge vertices and weld into one connected surface.  The
//! walls are vertical and never walkable; they only shape the layout.

use nav_core::{CellId, Position, RegionKey, Vec3};
use nav_surface::{RegionGeometry, SurfaceResult};

pub const REGION: RegionKey = RegionKey::from_landblock(0xA9B4);

const GRID: f32 = 2.0;
const WALL_HEIGHT: f32 = 4.0;

/// Gate passage, centred on y = 20.
pub const GATE: (f32, f32) = (42.0, 20.0);

pub fn at(x: f32, y: f32) -> Position {
    Position::new(CellId(REGION.raw() | 0x0001), Vec3::new(x, y, 0.0))
}

pub fn build_courtyard() -> SurfaceResult<RegionGeometry> {
    let mut g = RegionGeometry::default();

    g.push_floor((0.0, 0.0), (40.0, 40.0), 0.0, GRID)?;   // courtyard
    g.push_floor((40.0, 18.0), (44.0, 22.0), 0.0, GRID)?; // gate passage
    g.push_floor((44.0, 10.0), (60.0, 30.0), 0.0, GRID)?; // outer yard

    wall(&mut g, (0.0, 0.0), (40.0, 0.0));
    wall(&mut g, (0.0, 40.0), (40.0, 40.0));
    wall(&mut g, (0.0, 0.0), (0.0, 40.0));
    wall(&mut g, (40.0, 0.0), (40.0, 18.0));
    wall(&mut g, (40.0, 22.0), (40.0, 40.0));
    Ok(g)
}

fn wall(g: &mut RegionGeometry, from: (f32, f32), to: (f32, f32)) {
    g.push_quad(
        Vec3::new(from.0, from.1, 0.0),
        Vec3::new(to.0, to.1, 0.0),
        Vec3::new(to.0, to.1, WALL_HEIGHT),
        Vec3::new(from.0, from.1, WALL_HEIGHT),
    );
}
