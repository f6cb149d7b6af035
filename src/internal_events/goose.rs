use goose_parser::DecodeError;
use metrics::counter;

use super::{InternalEvent, error_stage, error_type};

#[derive(Debug)]
pub(crate) struct GooseApduMalformed<'a> {
    pub error: &'a DecodeError,
}

impl InternalEvent for GooseApduMalformed<'_> {
    fn emit(self) {
        warn!(
            message = "GOOSE APDU is malformed; using default protocol fields.",
            error = %self.error,
            error_code = "malformed_apdu",
            error_type = error_type::PARSER_FAILED,
            stage = error_stage::PROCESSING,
        );
        counter!(
            "component_errors_total",
            "error_code" => "malformed_apdu",
            "error_type" => error_type::PARSER_FAILED,
            "stage" => error_stage::PROCESSING,
        )
        .increment(1);
    }

    fn name(&self) -> Option<&'static str> {
        Some("GooseApduMalformed")
    }
}

#[derive(Debug)]
pub(crate) struct GooseFieldConversionError<'a> {
    pub field: &'static str,
    pub value: &'a str,
}

impl InternalEvent for GooseFieldConversionError<'_> {
    fn emit(self) {
        warn!(
            message = "Integer field does not fit in 64 bits; using default.",
            field = self.field,
            value = self.value,
            error_code = "integer_overflow",
            error_type = error_type::CONVERSION_FAILED,
            stage = error_stage::PROCESSING,
        );
        counter!(
            "component_errors_total",
            "error_code" => "integer_overflow",
            "error_type" => error_type::CONVERSION_FAILED,
            "stage" => error_stage::PROCESSING,
            "field" => self.field,
        )
        .increment(1);
    }

    fn name(&self) -> Option<&'static str> {
        Some("GooseFieldConversionError")
    }
}
