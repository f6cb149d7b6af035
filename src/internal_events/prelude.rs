pub mod error_stage {
    pub const RECEIVING: &str = "receiving";
    pub const PROCESSING: &str = "processing";
}

pub mod error_type {
    pub const CONVERSION_FAILED: &str = "conversion_failed";
    pub const PARSER_FAILED: &str = "parser_failed";
}
