#![allow(dead_code)]

use polytess::{
    ContourOrientation, ContourPoint, Options, Tessellation, Tessellator,
};

pub fn points(pts: &[(f32, f32)]) -> Vec<ContourPoint<()>> {
    pts.iter().map(|&(x, y)| ContourPoint::from_xy(x, y)).collect()
}

/// Load every contour as given and tessellate.
pub fn tessellate(contours: &[&[(f32, f32)]], options: &Options) -> Tessellation<()> {
    let mut tess: Tessellator<()> = Tessellator::new();
    for contour in contours {
        tess.add_contour(ContourOrientation::Original, &points(contour))
            .unwrap();
    }
    tess.tessellate(options, None).unwrap()
}

pub fn triangle_area(out: &Tessellation<()>, tri: [u32; 3]) -> f32 {
    let a = out.positions[tri[0] as usize];
    let b = out.positions[tri[1] as usize];
    let c = out.positions[tri[2] as usize];
    ((b.x - a.x) * (c.y - a.y) - (b.y - a.y) * (c.x - a.x)).abs() * 0.5
}

/// Unsigned area covered by triangle output.
pub fn total_area(out: &Tessellation<()>) -> f32 {
    out.triangles().map(|t| triangle_area(out, t)).sum()
}

/// Unsigned area of one polygon element, fanned from its first vertex.
pub fn element_area(out: &Tessellation<()>, element: usize) -> f32 {
    let stride = out.stride();
    let chunk = &out.elements[element * stride..element * stride + out.poly_size];
    let mut area = 0.0;
    for i in 1..out.poly_size - 1 {
        if chunk[i + 1] == polytess::UNDEF {
            break;
        }
        area += triangle_area(out, [chunk[0], chunk[i], chunk[i + 1]]);
    }
    area
}

/// Perimeter of one boundary-contour range.
pub fn contour_perimeter(out: &Tessellation<()>, start: usize, count: usize) -> f32 {
    let mut len = 0.0;
    for i in 0..count {
        let a = out.positions[start + i];
        let b = out.positions[start + (i + 1) % count];
        len += a.distance(b);
    }
    len
}
