/// Error code registry for agrotile
///
/// Error codes are organized by category:
/// - 1000-1999: Configuration errors
/// - 2000-2999: Geometry errors
/// - 3000-3999: Tiling errors
/// - 4000-4999: Variable collection errors
/// - 5000-5999: Enrichment errors
/// - 6000-6999: Storage errors
/// - 7000-7999: Validation errors
/// - 9000-9999: Other errors
#[allow(dead_code)]
pub struct ErrorCode;

impl ErrorCode {
    // Configuration errors (1000-1999)
    pub const CONFIG_GENERIC: u16 = 1000;
    pub const CONFIG_NOT_FOUND: u16 = 1001;
    pub const CONFIG_INVALID_TOML: u16 = 1002;
    pub const CONFIG_INVALID_VALUE: u16 = 1005;

    // Geometry errors (2000-2999)
    pub const GEOMETRY_GENERIC: u16 = 2000;
    pub const GEOMETRY_EMPTY: u16 = 2001;
    pub const GEOMETRY_UNSUPPORTED: u16 = 2002;
    pub const GEOMETRY_NO_POLYGON: u16 = 2003;
    pub const GEOMETRY_INVALID_COORDINATES: u16 = 2004;
    pub const GEOMETRY_PARSE: u16 = 2005;

    // Tiling errors (3000-3999)
    pub const TILING_GENERIC: u16 = 3000;
    pub const TILING_EMPTY_PROJECTION: u16 = 3001;
    pub const TILING_INVALID_CELL_SIZE: u16 = 3002;

    // Variable collection errors (4000-4999)
    pub const COLLECTION_GENERIC: u16 = 4000;
    pub const COLLECTION_PROVIDER_SET: u16 = 4001;

    // Enrichment errors (5000-5999)
    pub const ENRICHMENT_GENERIC: u16 = 5000;
    pub const ENRICHMENT_SERVICE_FAILED: u16 = 5001;
    pub const ENRICHMENT_INVALID_RESPONSE: u16 = 5002;
    pub const ENRICHMENT_NO_INSIGHTS: u16 = 5003;

    // Storage errors (6000-6999)
    pub const STORAGE_GENERIC: u16 = 6000;
    pub const STORAGE_NOT_FOUND: u16 = 6004;
    pub const STORAGE_CONFLICT: u16 = 6009;

    // Validation errors (7000-7999)
    pub const VALIDATION_GENERIC: u16 = 7000;
    pub const VALIDATION_REQUIRED_FIELD: u16 = 7001;
    pub const VALIDATION_OUT_OF_RANGE: u16 = 7003;

    // Other errors (9000-9999)
    pub const OTHER_GENERIC: u16 = 9000;
}

/// Get a human-readable description for an error code
pub fn describe_error_code(code: u16) -> &'static str {
    match code {
        // Configuration errors
        1000 => "Generic configuration error",
        1001 => "Configuration file not found",
        1002 => "Invalid TOML syntax in configuration",
        1005 => "Invalid value in configuration",

        // Geometry errors
        2000 => "Generic geometry error",
        2001 => "Geometry is empty",
        2002 => "Unsupported geometry type",
        2003 => "No polygon could be derived from the input",
        2004 => "Invalid coordinates in geometry",
        2005 => "Failed to parse GeoJSON",

        // Tiling errors
        3000 => "Generic tiling error",
        3001 => "Polygon is empty after reprojection",
        3002 => "Invalid cell size",

        // Collection errors
        4000 => "Generic variable collection error",
        4001 => "Invalid provider set",

        // Enrichment errors
        5000 => "Generic enrichment error",
        5001 => "Recommendation service failed",
        5002 => "Recommendation service returned an invalid response",
        5003 => "Insight service returned no usable items",

        // Storage errors
        6000 => "Generic storage error",
        6004 => "Storage item not found",
        6009 => "Conflicting storage write",

        // Validation errors
        7000 => "Generic validation error",
        7001 => "Required field is missing",
        7003 => "Value is out of range",

        9000 => "Generic error",
        _ => "Unknown error code",
    }
}
