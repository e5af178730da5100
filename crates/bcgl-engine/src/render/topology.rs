//! Draw modes and their lowering onto GPU primitive topologies.
//!
//! The GPU has no line loops, triangle fans or quads. Loops and fans are
//! expanded to list indices per draw; quads are drawn as a triangle list over
//! indices generated when recording ends.

use super::backend::Primitive;

#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub enum DrawMode {
    Lines,
    LineLoop,
    LineStrip,
    Triangles,
    TriangleStrip,
    TriangleFan,
    Quads,
}

impl DrawMode {
    /// Topology the backend draws with.
    pub fn primitive(self) -> Primitive {
        match self {
            DrawMode::Lines | DrawMode::LineLoop => Primitive::LineList,
            DrawMode::LineStrip => Primitive::LineStrip,
            DrawMode::Triangles | DrawMode::TriangleFan | DrawMode::Quads => {
                Primitive::TriangleList
            }
            DrawMode::TriangleStrip => Primitive::TriangleStrip,
        }
    }

    /// Whether a draw must expand its element sequence on the CPU.
    #[inline]
    pub fn needs_expansion(self) -> bool {
        matches!(self, DrawMode::LineLoop | DrawMode::TriangleFan)
    }

    /// Expands a loop or fan element sequence into list indices.
    ///
    /// Other modes return the sequence unchanged.
    pub fn expand(self, seq: &[u16]) -> Vec<u16> {
        match self {
            DrawMode::LineLoop => line_loop_to_list(seq),
            DrawMode::TriangleFan => triangle_fan_to_list(seq),
            _ => seq.to_vec(),
        }
    }
}

/// `a b c` → `a b, b c, c a`.
pub fn line_loop_to_list(seq: &[u16]) -> Vec<u16> {
    if seq.len() < 2 {
        return Vec::new();
    }
    let mut out = Vec::with_capacity(seq.len() * 2);
    for (i, &a) in seq.iter().enumerate() {
        out.push(a);
        out.push(seq[(i + 1) % seq.len()]);
    }
    out
}

/// `a b c d` → `a b c, a c d`.
pub fn triangle_fan_to_list(seq: &[u16]) -> Vec<u16> {
    let Some((&hub, rim)) = seq.split_first() else {
        return Vec::new();
    };
    rim.windows(2).flat_map(|w| [hub, w[0], w[1]]).collect()
}

/// Indices generated at the end of a recording that appended none.
///
/// Every vertex is emitted in order; in `Quads` mode each fourth vertex
/// also closes its quad's second triangle, so `0 1 2 3` becomes
/// `0 1 2 0 2 3`.
pub fn auto_indices(mode: DrawMode, vertex_count: usize) -> impl Iterator<Item = usize> {
    (0..vertex_count).flat_map(move |i| {
        let (ix, n) = if mode == DrawMode::Quads && i % 4 == 3 {
            ([i - 3, i - 1, i], 3)
        } else {
            ([i, 0, 0], 1)
        };
        ix.into_iter().take(n)
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn quad_becomes_two_triangles() {
        let ix: Vec<usize> = auto_indices(DrawMode::Quads, 4).collect();
        assert_eq!(ix, [0, 1, 2, 0, 2, 3]);
    }

    #[test]
    fn two_quads_and_a_straggler() {
        let ix: Vec<usize> = auto_indices(DrawMode::Quads, 9).collect();
        assert_eq!(ix, [0, 1, 2, 0, 2, 3, 4, 5, 6, 4, 6, 7, 8]);
    }

    #[test]
    fn non_quad_modes_emit_sequentially() {
        let ix: Vec<usize> = auto_indices(DrawMode::Triangles, 4).collect();
        assert_eq!(ix, [0, 1, 2, 3]);
    }

    #[test]
    fn loop_closes_back_to_start() {
        assert_eq!(line_loop_to_list(&[5, 6, 7]), [5, 6, 6, 7, 7, 5]);
        assert!(line_loop_to_list(&[1]).is_empty());
    }

    #[test]
    fn fan_shares_first_vertex() {
        assert_eq!(triangle_fan_to_list(&[0, 1, 2, 3]), [0, 1, 2, 0, 2, 3]);
        assert!(triangle_fan_to_list(&[0, 1]).is_empty());
        assert!(triangle_fan_to_list(&[]).is_empty());
    }

    #[test]
    fn lowering_table() {
        assert_eq!(DrawMode::Quads.primitive(), Primitive::TriangleList);
        assert_eq!(DrawMode::LineLoop.primitive(), Primitive::LineList);
        assert!(DrawMode::TriangleFan.needs_expansion());
        assert!(!DrawMode::Quads.needs_expansion());
    }
}
