/// Identifier the controller assigns to one continuous finger contact. Ids
/// are handed out from the lowest free value, so they also serve as
/// multi-touch slot indices.
pub type TrackId = u8;

/// One reported contact, with the configured axis transform already applied.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Contact {
    pub track_id: TrackId,
    pub x: u32,
    pub y: u32,
    /// Contact area as reported. No transform is applied to it.
    pub size: u32,
}

/// A width/height pair. Used for both the touch boundary and the coordinate
/// resolution.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Size {
    pub width: u32,
    pub height: u32,
}
