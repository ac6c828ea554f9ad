//! # BSP Tree
//!
//! Binary space partitioning tree over polygons, as used by the csg.js
//! boolean algorithm. Traversals are recursive; `stacker` grows the stack
//! for deep trees.

use config::constants::{STACKER_RED_ZONE_BYTES, STACKER_STACK_SIZE_BYTES};
use stacker::maybe_grow;

use super::plane::{Partition, Plane};
use super::polygon::Polygon;

/// A node in a BSP tree.
#[derive(Debug, Default)]
pub struct BspNode {
    plane: Option<Plane>,
    front: Option<Box<BspNode>>,
    back: Option<Box<BspNode>>,
    polygons: Vec<Polygon>,
}

impl BspNode {
    /// Builds a tree from polygons.
    pub fn new(polygons: Vec<Polygon>, epsilon: f64) -> Self {
        let mut node = Self::default();
        node.build(polygons, epsilon);
        node
    }

    /// Converts solid space to empty space and vice versa.
    pub fn invert(&mut self) {
        maybe_grow(STACKER_RED_ZONE_BYTES, STACKER_STACK_SIZE_BYTES, || {
            for polygon in &mut self.polygons {
                polygon.flip();
            }
            if let Some(plane) = &mut self.plane {
                plane.flip();
            }
            if let Some(front) = &mut self.front {
                front.invert();
            }
            if let Some(back) = &mut self.back {
                back.invert();
            }
            std::mem::swap(&mut self.front, &mut self.back);
        })
    }

    /// Removes the parts of `polygons` that lie inside this tree's solid.
    pub fn clip_polygons(&self, polygons: Vec<Polygon>, epsilon: f64) -> Vec<Polygon> {
        let Some(plane) = self.plane else {
            return polygons;
        };
        maybe_grow(STACKER_RED_ZONE_BYTES, STACKER_STACK_SIZE_BYTES, || {
            let mut partition = Partition::default();
            for polygon in polygons {
                plane.split_polygon(polygon, epsilon, &mut partition);
            }
            let Partition {
                coplanar_front,
                coplanar_back,
                mut front,
                mut back,
            } = partition;
            front.extend(coplanar_front);
            back.extend(coplanar_back);

            let mut kept = match &self.front {
                Some(node) => node.clip_polygons(front, epsilon),
                None => front,
            };
            if let Some(node) = &self.back {
                kept.extend(node.clip_polygons(back, epsilon));
            }
            kept
        })
    }

    /// Removes all polygons in this tree that are inside `other`.
    pub fn clip_to(&mut self, other: &BspNode, epsilon: f64) {
        maybe_grow(STACKER_RED_ZONE_BYTES, STACKER_STACK_SIZE_BYTES, || {
            let polygons = std::mem::take(&mut self.polygons);
            self.polygons = other.clip_polygons(polygons, epsilon);
            if let Some(front) = &mut self.front {
                front.clip_to(other, epsilon);
            }
            if let Some(back) = &mut self.back {
                back.clip_to(other, epsilon);
            }
        })
    }

    /// Collects every polygon in the tree.
    pub fn all_polygons(&self) -> Vec<Polygon> {
        let mut out = Vec::new();
        self.collect_into(&mut out);
        out
    }

    fn collect_into(&self, out: &mut Vec<Polygon>) {
        maybe_grow(STACKER_RED_ZONE_BYTES, STACKER_STACK_SIZE_BYTES, || {
            out.extend(self.polygons.iter().cloned());
            if let Some(front) = &self.front {
                front.collect_into(out);
            }
            if let Some(back) = &self.back {
                back.collect_into(out);
            }
        })
    }

    /// Inserts polygons into the tree, splitting them by existing planes.
    pub fn build(&mut self, polygons: Vec<Polygon>, epsilon: f64) {
        let Some(first) = polygons.first() else {
            return;
        };
        let plane = *self.plane.get_or_insert(first.plane);
        maybe_grow(STACKER_RED_ZONE_BYTES, STACKER_STACK_SIZE_BYTES, || {
            let mut partition = Partition::default();
            for polygon in polygons {
                plane.split_polygon(polygon, epsilon, &mut partition);
            }
            self.polygons.extend(partition.coplanar_front);
            self.polygons.extend(partition.coplanar_back);
            if !partition.front.is_empty() {
                self.front
                    .get_or_insert_with(Box::default)
                    .build(partition.front, epsilon);
            }
            if !partition.back.is_empty() {
                self.back
                    .get_or_insert_with(Box::default)
                    .build(partition.back, epsilon);
            }
        })
    }
}
