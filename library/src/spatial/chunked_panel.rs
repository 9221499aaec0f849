//! Uniform-grid spatial index used for hit-testing blocks and wires.
//!
//! Every indexed instance is registered in each grid cell its normalized
//! rect overlaps. Queries only visit the cells covering the query area, so
//! the cost depends on the cells touched rather than the instance count.
//! Cells are created on first insert and are never evicted; queries never
//! create cells. Rects with non-finite coordinates are never indexed, and
//! an instance may span at most [`MAX_INSTANCE_CHUNKS`] cells.

use log::warn;
use std::collections::{HashMap, HashSet};
use std::hash::Hash;

use crate::model::math::{Rect, Vector2};
use crate::util::VecSetExt;

/// Upper bound on the number of cells a single instance registers in.
pub const MAX_INSTANCE_CHUNKS: u64 = 1 << 16;

/// Kind of entity an instance stands for.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ChunkTag {
    Block,
    Connector,
}

/// Grid coordinates of a cell.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ChunkPos {
    pub x: i32,
    pub y: i32,
}

#[derive(Clone, Debug)]
pub struct ChunkInstance<K> {
    pub rect: Rect,
    pub tag: ChunkTag,
    pub data: K,
    /// Cells this instance is currently registered in.
    pub parents: Vec<ChunkPos>,
}

#[derive(Clone, Debug)]
struct ChunkContainer<K> {
    children: Vec<K>,
}

impl<K> Default for ChunkContainer<K> {
    fn default() -> Self {
        Self { children: Vec::new() }
    }
}

#[derive(Clone, Debug)]
pub struct ChunkedPanel<K> {
    chunk_width: f32,
    chunk_height: f32,
    chunks: HashMap<ChunkPos, ChunkContainer<K>>,
    instances: HashMap<K, ChunkInstance<K>>,
}

impl<K: Copy + Eq + Hash + std::fmt::Debug> ChunkedPanel<K> {
    pub fn new(chunk_width: f32, chunk_height: f32) -> Self {
        Self {
            chunk_width,
            chunk_height,
            chunks: HashMap::new(),
            instances: HashMap::new(),
        }
    }

    pub fn chunk_size(&self) -> Vector2 {
        Vector2::new(self.chunk_width, self.chunk_height)
    }

    /// Number of cells ever created.
    pub fn chunk_count(&self) -> usize {
        self.chunks.len()
    }

    pub fn len(&self) -> usize {
        self.instances.len()
    }

    pub fn is_empty(&self) -> bool {
        self.instances.is_empty()
    }

    pub fn contains(&self, data: &K) -> bool {
        self.instances.contains_key(data)
    }

    pub fn instance(&self, data: &K) -> Option<&ChunkInstance<K>> {
        self.instances.get(data)
    }

    /// Drops every instance. Cells are dropped too.
    pub fn clear(&mut self) {
        self.chunks.clear();
        self.instances.clear();
    }

    fn point_chunk_pos(&self, x: f32, y: f32) -> ChunkPos {
        ChunkPos {
            x: (x / self.chunk_width).floor() as i32,
            y: (y / self.chunk_height).floor() as i32,
        }
    }

    /// First and last cell covered by the normalized `rect`, or `None` for
    /// a rect with non-finite coordinates.
    fn rect_chunk_bounds(&self, rect: &Rect) -> Option<(ChunkPos, ChunkPos)> {
        if ![rect.x, rect.y, rect.w, rect.h].iter().all(|v| v.is_finite()) {
            return None;
        }
        let start = self.point_chunk_pos(rect.left(), rect.top());
        let end = self.point_chunk_pos(rect.right(), rect.bottom());
        Some((start, end))
    }

    fn chunk_span(start: &ChunkPos, end: &ChunkPos) -> u64 {
        let w = (end.x as i64 - start.x as i64 + 1) as u64;
        let h = (end.y as i64 - start.y as i64 + 1) as u64;
        w.saturating_mul(h)
    }

    /// Cells an instance with `rect` registers in, or `None` when the rect
    /// cannot be indexed.
    fn instance_chunks(&self, rect: &Rect) -> Option<Vec<ChunkPos>> {
        let (start, end) = self.rect_chunk_bounds(rect)?;
        if Self::chunk_span(&start, &end) > MAX_INSTANCE_CHUNKS {
            return None;
        }
        let mut result = Vec::new();
        for x in start.x..=end.x {
            for y in start.y..=end.y {
                result.push(ChunkPos { x, y });
            }
        }
        Some(result)
    }

    /// Existing cells covered by `rect`, in x-major order. Large queries walk
    /// the allocated cells instead of the covered range.
    fn query_chunks(&self, rect: &Rect) -> Vec<ChunkPos> {
        let Some((start, end)) = self.rect_chunk_bounds(rect) else {
            return Vec::new();
        };
        if Self::chunk_span(&start, &end) > self.chunks.len() as u64 {
            let mut result: Vec<ChunkPos> = self
                .chunks
                .keys()
                .filter(|p| p.x >= start.x && p.x <= end.x && p.y >= start.y && p.y <= end.y)
                .copied()
                .collect();
            result.sort();
            return result;
        }
        let mut result = Vec::new();
        for x in start.x..=end.x {
            for y in start.y..=end.y {
                let pos = ChunkPos { x, y };
                if self.chunks.contains_key(&pos) {
                    result.push(pos);
                }
            }
        }
        result
    }

    fn attach(&mut self, pos: ChunkPos, data: K) {
        self.chunks.entry(pos).or_default().children.add_unique(data);
    }

    fn detach(&mut self, pos: &ChunkPos, data: &K) {
        if let Some(chunk) = self.chunks.get_mut(pos) {
            chunk.children.remove_value(data);
        }
    }

    /// Indexes `data` under `rect`. Adding a key that is already indexed
    /// logs a warning and changes nothing.
    pub fn add_instance(&mut self, data: K, rect: Rect, tag: ChunkTag) {
        if self.instances.contains_key(&data) {
            warn!("ChunkedPanel: instance {:?} is already indexed", data);
            return;
        }
        let Some(parents) = self.instance_chunks(&rect) else {
            warn!("ChunkedPanel: cannot index {:?} at {}", data, rect);
            return;
        };
        for pos in &parents {
            self.attach(*pos, data);
        }
        self.instances.insert(
            data,
            ChunkInstance {
                rect,
                tag,
                data,
                parents,
            },
        );
    }

    /// Unregisters `data` from every cell. Cells stay allocated.
    pub fn remove_instance(&mut self, data: &K) -> Option<ChunkInstance<K>> {
        let Some(mut instance) = self.instances.remove(data) else {
            warn!("ChunkedPanel: instance {:?} is not indexed", data);
            return None;
        };
        for pos in &instance.parents {
            self.detach(pos, data);
        }
        instance.parents.clear();
        Some(instance)
    }

    /// Moves `data` to `rect`, detaching from cells it left and attaching to
    /// cells it entered. Calling it again with the same rect is a no-op.
    pub fn update_instance(&mut self, data: &K, rect: Rect) {
        let Some(old_parents) = self.instances.get(data).map(|i| i.parents.clone()) else {
            warn!("ChunkedPanel: cannot update {:?}, it is not indexed", data);
            return;
        };
        let Some(covering) = self.instance_chunks(&rect) else {
            warn!("ChunkedPanel: cannot move {:?} to {}", data, rect);
            return;
        };
        let mut parents = Vec::with_capacity(covering.len());
        for pos in &old_parents {
            if covering.contains(pos) {
                parents.push(*pos);
            } else {
                self.detach(pos, data);
            }
        }
        for pos in covering {
            self.attach(pos, *data);
            parents.add_unique(pos);
        }
        if let Some(instance) = self.instances.get_mut(data) {
            instance.rect = rect;
            instance.parents = parents;
        }
    }

    /// Instances whose rect contains `point`, optionally filtered by tag.
    pub fn test_point_cast_tag(&self, point: Vector2, tag: Option<ChunkTag>) -> Vec<K> {
        if !(point.x.is_finite() && point.y.is_finite()) {
            return Vec::new();
        }
        let pos = self.point_chunk_pos(point.x, point.y);
        let Some(chunk) = self.chunks.get(&pos) else {
            return Vec::new();
        };
        chunk
            .children
            .iter()
            .filter_map(|k| self.instances.get(k))
            .filter(|i| tag.is_none_or(|t| i.tag == t) && i.rect.contains_point(point))
            .map(|i| i.data)
            .collect()
    }

    pub fn test_point_cast(&self, point: Vector2) -> Vec<K> {
        self.test_point_cast_tag(point, None)
    }

    /// Instances whose rect intersects `rect`, optionally filtered by tag.
    /// Each instance is reported once even when it spans several cells.
    pub fn test_rect_cast_tag(&self, rect: &Rect, tag: Option<ChunkTag>) -> Vec<K> {
        let mut seen = HashSet::new();
        let mut result = Vec::new();
        for pos in self.query_chunks(rect) {
            let Some(chunk) = self.chunks.get(&pos) else {
                continue;
            };
            for k in &chunk.children {
                if seen.contains(k) {
                    continue;
                }
                let Some(instance) = self.instances.get(k) else {
                    continue;
                };
                if tag.is_none_or(|t| instance.tag == t) && instance.rect.intersects(rect) {
                    seen.insert(*k);
                    result.push(*k);
                }
            }
        }
        result
    }

    pub fn test_rect_cast(&self, rect: &Rect) -> Vec<K> {
        self.test_rect_cast_tag(rect, None)
    }
}
