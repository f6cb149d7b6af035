mod prelude;

pub use self::prelude::{error_stage, error_type};

pub trait InternalEvent: Sized {
    fn emit(self);

    fn name(&self) -> Option<&'static str> {
        None
    }
}

pub fn emit(event: impl InternalEvent) {
    if let Some(name) = event.name() {
        trace!(message = "Emitting internal event.", event = name);
    }
    event.emit();
}

#[macro_export]
macro_rules! emit {
    ($event:expr) => {
        $crate::internal_events::emit($event)
    };
}

// Modules that require emit! macro so they need to be defined after the macro.
mod flow;
mod goose;

pub(crate) use self::flow::*;
pub(crate) use self::goose::*;
