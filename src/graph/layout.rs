//! Grid placement for flow nodes.
//!
//! Nodes advance left to right with a fixed stride and wrap onto a new row
//! once they pass the horizontal bound. Recovery nodes sit directly below the
//! assessment that spawned them.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Position {
    pub x: f64,
    pub y: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LayoutConfig {
    pub origin_x: f64,
    pub origin_y: f64,
    pub x_stride: f64,
    pub y_stride: f64,
    pub max_x: f64,
    pub recovery_drop: f64,
}

impl Default for LayoutConfig {
    fn default() -> Self {
        Self {
            origin_x: 120.0,
            origin_y: 100.0,
            x_stride: 320.0,
            y_stride: 260.0,
            max_x: 1400.0,
            recovery_drop: 180.0,
        }
    }
}

/// Running placement cursor for one assembly pass.
#[derive(Debug, Clone)]
pub struct GridLayout {
    config: LayoutConfig,
    next_x: f64,
    next_y: f64,
}

impl GridLayout {
    pub fn new(config: LayoutConfig) -> Self {
        Self {
            next_x: config.origin_x,
            next_y: config.origin_y,
            config,
        }
    }

    /// Return the next slot and advance the cursor, wrapping to a new row
    /// when the stride would carry the cursor past the horizontal bound.
    pub fn advance(&mut self) -> Position {
        let position = Position {
            x: self.next_x,
            y: self.next_y,
        };
        self.next_x += self.config.x_stride;
        if self.next_x > self.config.max_x {
            self.next_x = self.config.origin_x;
            self.next_y += self.config.y_stride;
        }
        position
    }

    /// Slot for a recovery node, directly below its assessment.
    pub fn below(&self, anchor: Position) -> Position {
        Position {
            x: anchor.x,
            y: anchor.y + self.config.recovery_drop,
        }
    }
}
