// Domain logic: naming conventions, classification, synthesis, injection.

pub mod classify;
pub mod conventions;
pub mod injector;
pub mod synthesize;
