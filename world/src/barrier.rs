use shmup_core::{BarrierChunkSnapshot, BarrierView, Bounds, ChunkId, Vec2};

use crate::config::BarrierLayout;

#[derive(Clone, Copy, Debug)]
struct Chunk {
    id: ChunkId,
    position: Vec2,
    health: f32,
}

/// Result of damaging a chunk.
#[derive(Clone, Copy, Debug, PartialEq)]
pub(crate) enum ChunkDamage {
    /// The chunk survived with the remaining health.
    Damaged(f32),
    /// The chunk ran out of health and was removed.
    Destroyed,
}

/// Destructible chunks shielding the player.
#[derive(Clone, Debug, Default)]
pub(crate) struct Barriers {
    chunks: Vec<Chunk>,
}

impl Barriers {
    /// Spreads `count` barriers evenly along a line above the bottom edge.
    pub(crate) fn build(layout: &BarrierLayout, bounds: &Bounds) -> Self {
        let mut chunks = Vec::new();
        let size = layout.chunk_size;
        let spacing = bounds.width() / (layout.count as f32 + 1.0);
        let top = bounds.max().y - layout.bottom_margin;
        let half_width = layout.columns as f32 * size * 0.5;

        let mut next_id = 0;
        for barrier in 0..layout.count {
            let centre_x = bounds.min().x + spacing * (barrier as f32 + 1.0);
            for row in 0..layout.rows {
                for column in 0..layout.columns {
                    chunks.push(Chunk {
                        id: ChunkId::new(next_id),
                        position: Vec2::new(
                            centre_x - half_width + (column as f32 + 0.5) * size,
                            top + (row as f32 + 0.5) * size,
                        ),
                        health: layout.health,
                    });
                    next_id += 1;
                }
            }
        }
        Self { chunks }
    }

    pub(crate) fn len(&self) -> usize {
        self.chunks.len()
    }

    pub(crate) fn damage(&mut self, id: ChunkId, amount: f32) -> Option<ChunkDamage> {
        let index = self.chunks.iter().position(|chunk| chunk.id == id)?;
        let chunk = &mut self.chunks[index];
        chunk.health -= amount;
        if chunk.health <= 0.0 {
            let _ = self.chunks.remove(index);
            Some(ChunkDamage::Destroyed)
        } else {
            Some(ChunkDamage::Damaged(chunk.health))
        }
    }

    pub(crate) fn destroy(&mut self, id: ChunkId) -> bool {
        let before = self.chunks.len();
        self.chunks.retain(|chunk| chunk.id != id);
        self.chunks.len() != before
    }

    pub(crate) fn view(&self) -> BarrierView {
        BarrierView::from_snapshots(
            self.chunks
                .iter()
                .map(|chunk| BarrierChunkSnapshot {
                    id: chunk.id,
                    position: chunk.position,
                    health: chunk.health,
                })
                .collect(),
        )
    }
}
