//! Block geometry as seen by the editor.
//!
//! Sizes depend on how the host renders blocks, so the editor asks a
//! [`BlockLayout`] rather than computing them itself.

use crate::model::block::Block;
use crate::model::math::Vector2;
use crate::model::port::PortDirection;

pub trait BlockLayout: Send + Sync {
    /// Rendered size of `block`.
    fn block_size(&self, block: &Block) -> Vector2;

    /// Anchor of a port relative to the block position, or `None` when the
    /// block has no such port.
    fn port_offset(&self, block: &Block, port_guid: &str) -> Option<Vector2>;
}

/// Rows of ports under a header: inputs on the left edge, outputs on the
/// right edge. A non-zero `custom_size` overrides the computed size.
#[derive(Clone, Debug, PartialEq)]
pub struct FixedBlockLayout {
    pub width: f32,
    pub header_height: f32,
    pub row_height: f32,
}

impl Default for FixedBlockLayout {
    fn default() -> Self {
        Self {
            width: 150.0,
            header_height: 30.0,
            row_height: 24.0,
        }
    }
}

impl BlockLayout for FixedBlockLayout {
    fn block_size(&self, block: &Block) -> Vector2 {
        if !block.custom_size.is_zero() {
            return block.custom_size;
        }
        let rows = block.input_ports().count().max(block.output_ports().count());
        Vector2::new(self.width, self.header_height + rows as f32 * self.row_height)
    }

    fn port_offset(&self, block: &Block, port_guid: &str) -> Option<Vector2> {
        let port = block.port(port_guid)?;
        let row = block
            .ports
            .iter()
            .filter(|p| p.direction == port.direction)
            .position(|p| p.guid() == port_guid)?;
        let y = self.header_height + (row as f32 + 0.5) * self.row_height;
        let x = match port.direction {
            PortDirection::Input => 0.0,
            PortDirection::Output => self.block_size(block).x,
        };
        Some(Vector2::new(x, y))
    }
}
