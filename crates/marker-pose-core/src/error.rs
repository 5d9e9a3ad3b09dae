/// Fatal configuration errors.
///
/// These are rejected before any frame is processed; the engine makes no
/// sense without a valid registry and intrinsics. Expected-empty outcomes
/// (unknown marker, degenerate corners, failed solve) are *not* errors and
/// stay `Option` throughout.
#[derive(thiserror::Error, Debug)]
pub enum ConfigError {
    #[error("focal lengths must be positive and finite (fx={fx}, fy={fy})")]
    InvalidFocalLength { fx: f64, fy: f64 },
    #[error("principal point must be finite (cx={cx}, cy={cy})")]
    InvalidPrincipalPoint { cx: f64, cy: f64 },
    #[error("marker registry is empty")]
    EmptyRegistry,
    #[error("marker {id} has non-positive edge length {edge_m} m")]
    InvalidEdgeLength { id: u32, edge_m: f64 },
    #[error("marker {id} has a non-finite world position")]
    InvalidWorldPosition { id: u32 },
    #[error("duplicate marker id {id}")]
    DuplicateMarkerId { id: u32 },
    #[error("failed to parse registry JSON: {0}")]
    RegistryParse(#[from] serde_json::Error),
}
