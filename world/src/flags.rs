//! Bit values for the `*Flags` fields.

/// `Physics.flags`.
pub mod physics {
    pub const IS_TRAPEZOID: u32 = 1 << 0;
    /// Skip collisions with entities on the same team.
    pub const NO_OWN_TEAM_COLLISION: u32 = 1 << 1;
    /// Not clamped to the arena bounds.
    pub const CAN_ESCAPE_ARENA: u32 = 1 << 2;
}

/// `Position.flags`.
pub mod position {
    pub const ABSOLUTE_ROTATION: u32 = 1 << 0;
    /// Sent to every viewer regardless of field of view.
    pub const MINIMAP: u32 = 1 << 1;
}

/// `Style.flags`.
pub mod style {
    pub const VISIBLE: u32 = 1 << 0;
}

/// `Camera.flags`.
pub mod camera {
    pub const USES_CAMERA_COORDS: u32 = 1 << 0;
    pub const PLAYER_IS_DEAD: u32 = 1 << 1;
}
